//! Messages kept in external bundle files instead of component blocks.
//!
//! A bundle path is decoded with a match expression that yields the `locale`,
//! optionally the `filename` (or `basekey`) and optionally a `base`. Named
//! groups win; without them the first group is the locale and the second the
//! filename. A bundle without a filename holds the whole locale value.
//! The namespace of a bundle comes from a dictionary keyed by the glob
//! pattern that found the file.

use std::collections::HashSet;
use std::ops::Range;
use std::path::{
    Path,
    PathBuf,
};

use futures::future::join_all;
use globset::{
    Glob,
    GlobMatcher,
};
use indexmap::IndexMap;
use regex::{
    Captures,
    Regex,
    RegexBuilder,
};
use thiserror::Error;

use crate::ir::{
    Message,
    MessageTree,
    merge_trees,
};
use crate::syntax::format::{
    FormatError,
    FormatOptions,
    to_json_pretty,
};
use crate::types::Locale;

/// Glob pattern → namespace label.
pub type NamespaceDictionary = IndexMap<String, String>;

/// Errors raised while reading, decoding and writing bundles.
#[derive(Error, Debug)]
pub enum BundleError {
    /// Bundle patterns were given without `bundle.match`.
    #[error("Bundle patterns require a match expression")]
    MissingPattern,

    /// The match expression is not a valid regex.
    #[error("Invalid match expression '{pattern}': {source}")]
    InvalidMatch {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A namespace dictionary key is not a valid glob.
    #[error("Invalid namespace pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// A bundle file could not be read or written.
    #[error("Failed to access bundle '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A bundle file does not parse.
    #[error("Invalid bundle '{}': {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
}

/// What a bundle path encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathInfo {
    /// Path as matched.
    pub path: PathBuf,
    /// Locale captured by the `locale` group.
    pub locale: Locale,
    /// Key the bundle is nested under; `None` for a whole-locale bundle.
    pub filename: Option<String>,
    /// Captured `base` group, if any.
    pub base: Option<String>,
    /// Byte range of the locale inside the path string.
    locale_range: Range<usize>,
}

impl PathInfo {
    /// The same path with the locale part replaced.
    #[must_use]
    pub fn with_locale(&self, locale: &str) -> PathBuf {
        let text = self.path.to_string_lossy();
        let before = text.get(..self.locale_range.start).unwrap_or_default();
        let after = text.get(self.locale_range.end..).unwrap_or_default();
        PathBuf::from(format!("{before}{locale}{after}"))
    }
}

/// Decodes bundle paths. Matching is case-insensitive.
#[derive(Debug, Clone)]
pub struct BundleMatcher {
    /// Compiled match expression.
    regex: Regex,
}

impl BundleMatcher {
    /// # Errors
    /// Returns [`BundleError::InvalidMatch`] when `pattern` does not compile.
    pub fn new(pattern: &str) -> Result<Self, BundleError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| BundleError::InvalidMatch { pattern: pattern.to_string(), source })?;
        Ok(Self { regex })
    }

    /// Returns `None` (and logs why) when `path` does not match or lacks a
    /// locale.
    #[must_use]
    pub fn path_info(&self, path: &Path) -> Option<PathInfo> {
        let text = path.to_string_lossy();
        let Some(captures) = self.regex.captures(&text) else {
            tracing::warn!(path = %path.display(), "Bundle path does not match");
            return None;
        };

        let Some(locale) = group(&captures, &["locale"], 1) else {
            tracing::warn!(path = %path.display(), "Bundle path has no locale");
            return None;
        };
        let filename = group(&captures, &["filename", "basekey"], 2)
            .map(|m| m.as_str().to_string())
            .filter(|filename| !filename.is_empty());
        let base = captures.name("base").map(|m| m.as_str().to_string());

        tracing::debug!(path = %path.display(), locale = locale.as_str(), ?filename, "Decoded bundle path");
        Some(PathInfo {
            path: path.to_path_buf(),
            locale: locale.as_str().to_string(),
            filename,
            base,
            locale_range: locale.range(),
        })
    }
}

/// A named group, falling back to the positional one.
fn group<'h>(captures: &Captures<'h>, names: &[&str], index: usize) -> Option<regex::Match<'h>> {
    names.iter().find_map(|name| captures.name(name)).or_else(|| captures.get(index))
}

/// Resolves the namespace of a bundle from its source pattern or its path.
#[derive(Debug, Clone, Default)]
pub struct NamespaceResolver {
    /// Pattern → namespace lookup as configured.
    dictionary: NamespaceDictionary,
    /// Compiled glob keys of `dictionary`, in configuration order.
    matchers: Vec<(GlobMatcher, String)>,
}

impl NamespaceResolver {
    /// # Errors
    /// Returns [`BundleError::InvalidGlob`] for a dictionary key that is not a glob.
    pub fn new(dictionary: NamespaceDictionary) -> Result<Self, BundleError> {
        let matchers = dictionary
            .iter()
            .map(|(pattern, namespace)| {
                Glob::new(pattern)
                    .map(|glob| (glob.compile_matcher(), namespace.clone()))
                    .map_err(|source| BundleError::InvalidGlob { pattern: pattern.clone(), source })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { dictionary, matchers })
    }

    /// Namespace for a bundle found by `pattern` at `path`; empty when none.
    #[must_use]
    pub fn namespace(&self, pattern: &str, path: &Path) -> String {
        self.dictionary
            .get(pattern)
            .or_else(|| {
                self.matchers.iter().find(|(matcher, _)| matcher.is_match(path)).map(|(_, ns)| ns)
            })
            .cloned()
            .unwrap_or_default()
    }
}

/// A bundle path together with the glob pattern that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleTarget {
    /// Glob the path was found by.
    pub pattern: String,
    /// Absolute bundle path.
    pub path: PathBuf,
}

/// A bundle read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleFile {
    /// Glob the bundle was found by.
    pub pattern: String,
    /// Absolute bundle path.
    pub path: PathBuf,
    /// Parsed bundle body.
    pub messages: Message,
}

/// One bundle file to write.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleWrite {
    /// Destination path.
    pub path: PathBuf,
    /// Locale of `messages`.
    pub locale: Locale,
    /// Body to write.
    pub messages: Message,
}

/// The canonical tree split into what stays embedded and what goes to
/// bundle files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BundleSplit {
    /// The full tree; bundled keys are not removed from it.
    pub embeddable: MessageTree,
    /// Bundle files taking their share of `embeddable`.
    pub external: Vec<BundleWrite>,
}

/// Keys a bundle is nested under: its namespace then its filename, empty parts skipped.
fn key_path(namespace: &str, filename: Option<&str>) -> Vec<String> {
    [Some(namespace), filename]
        .into_iter()
        .flatten()
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

/// Follows `keys` from `root`, skipping keys that are not present.
fn navigate<'a>(root: &'a Message, keys: &[String]) -> &'a Message {
    keys.iter().fold(root, |current, key| {
        current.as_node().and_then(|map| map.get(key)).unwrap_or(current)
    })
}

/// Whether every key of `keys` is present under `root`.
fn contains_all(root: &Message, keys: &[String]) -> bool {
    keys.iter()
        .try_fold(root, |current, key| current.as_node().and_then(|map| map.get(key)))
        .is_some()
}

/// Reads bundles into a canonical tree, each nested under
/// `[namespace, filename]` of its locale (either may be absent).
#[must_use]
pub fn merge_bundles(
    files: &[BundleFile],
    matcher: &BundleMatcher,
    namespaces: &NamespaceResolver,
) -> MessageTree {
    let mut sorted: Vec<&BundleFile> = files.iter().collect();
    sorted.sort_by(|a, b| a.path.cmp(&b.path));

    let mut tree = MessageTree::new();
    for file in sorted {
        let Some(info) = matcher.path_info(&file.path) else {
            continue;
        };
        let namespace = namespaces.namespace(&file.pattern, &file.path);
        let nested = file.messages.clone().nest_under(&key_path(&namespace, info.filename.as_deref()));
        merge_trees(&mut tree, IndexMap::from([(info.locale, nested)]));
    }
    tree
}

/// Splits `tree` into bundle writes for `targets`.
///
/// Besides the given targets, every namespace/filename combination present
/// under another locale gets a synthesized path for each locale of the tree
/// that has the combination but no bundle yet.
#[must_use]
pub fn split_bundles(
    tree: &MessageTree,
    targets: &[BundleTarget],
    matcher: &BundleMatcher,
    namespaces: &NamespaceResolver,
) -> BundleSplit {
    let mut external = Vec::new();
    let mut written: HashSet<PathBuf> = HashSet::new();
    let mut covered: HashSet<(Locale, Vec<String>)> = HashSet::new();
    let mut templates: Vec<(PathInfo, Vec<String>)> = Vec::new();

    for target in targets {
        let Some(info) = matcher.path_info(&target.path) else {
            continue;
        };
        let keys = key_path(&namespaces.namespace(&target.pattern, &target.path), info.filename.as_deref());
        let Some(root) = tree.get(&info.locale) else {
            tracing::warn!(path = %target.path.display(), locale = %info.locale, "No messages for bundle locale");
            continue;
        };

        if written.insert(info.path.clone()) {
            external.push(BundleWrite {
                path: info.path.clone(),
                locale: info.locale.clone(),
                messages: navigate(root, &keys).clone(),
            });
        }
        covered.insert((info.locale.clone(), keys.clone()));
        if !templates.iter().any(|(_, existing)| *existing == keys) {
            templates.push((info, keys));
        }
    }

    for (info, keys) in &templates {
        for (locale, root) in tree {
            if covered.contains(&(locale.clone(), keys.clone())) || !contains_all(root, keys) {
                continue;
            }
            let path = info.with_locale(locale);
            if !written.insert(path.clone()) {
                continue;
            }
            tracing::debug!(path = %path.display(), %locale, "Synthesized bundle path");
            external.push(BundleWrite {
                path,
                locale: locale.clone(),
                messages: navigate(root, keys).clone(),
            });
            covered.insert((locale.clone(), keys.clone()));
        }
    }

    BundleSplit { embeddable: tree.clone(), external }
}

/// Reads and parses one bundle as JSON.
async fn read_bundle(target: &BundleTarget) -> Result<BundleFile, BundleError> {
    let content = tokio::fs::read_to_string(&target.path)
        .await
        .map_err(|source| BundleError::Io { path: target.path.clone(), source })?;
    let messages = serde_json::from_str(&content).map_err(|e| BundleError::Format {
        path: target.path.clone(),
        source: FormatError::Json(e),
    })?;
    Ok(BundleFile { pattern: target.pattern.clone(), path: target.path.clone(), messages })
}

/// Reads every target concurrently. Results keep the order of `targets`.
///
/// # Errors
/// Fails on the first unreadable or invalid bundle.
pub async fn read_bundles(targets: &[BundleTarget]) -> Result<Vec<BundleFile>, BundleError> {
    join_all(targets.iter().map(read_bundle)).await.into_iter().collect()
}

/// Writes bundle files, creating parent directories.
///
/// # Errors
/// Fails on the first bundle that cannot be written.
pub async fn write_bundles(writes: &[BundleWrite], format: &FormatOptions) -> Result<(), BundleError> {
    for write in writes {
        let mut content = to_json_pretty(&write.messages, format.indent)
            .map_err(|source| BundleError::Format { path: write.path.clone(), source })?;
        if !content.ends_with(&format.eof) {
            content.push_str(&format.eof);
        }
        if let Some(parent) = write.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| BundleError::Io { path: parent.to_path_buf(), source })?;
        }
        tokio::fs::write(&write.path, content)
            .await
            .map_err(|source| BundleError::Io { path: write.path.clone(), source })?;
        tracing::debug!(path = %write.path.display(), "Wrote bundle");
    }
    Ok(())
}
