//! Discovery and loading of component and bundle files.
use std::path::{
    Path,
    PathBuf,
};

use globset::GlobBuilder;
use ignore::WalkBuilder;

use crate::bundle::BundleTarget;
use crate::config::FileMatcher;
use crate::indexer::types::{
    ComponentSource,
    IndexerError,
};

/// Finds and reads the component files below one directory.
#[derive(Debug, Clone)]
pub struct WorkspaceIndexer {
    /// Include/exclude decision per file.
    matcher: FileMatcher,
    /// Extra gitignore-style file.
    ignore_file: Option<PathBuf>,
}

impl WorkspaceIndexer {
    /// `matcher` decides which files under its workspace root are components.
    #[must_use]
    pub const fn new(matcher: FileMatcher, ignore_file: Option<PathBuf>) -> Self {
        Self { matcher, ignore_file }
    }

    /// Directory the walk starts from.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.matcher.workspace_root()
    }

    /// Lists component files, sorted by path.
    ///
    /// # Errors
    /// Fails when the ignore file cannot be used.
    pub fn find_component_files(&self) -> Result<Vec<PathBuf>, IndexerError> {
        let root = self.root();
        tracing::debug!(root = %root.display(), "Searching component files");

        let mut builder = walker(root);
        if let Some(ignore_file) = &self.ignore_file
            && let Some(err) = builder.add_ignore(ignore_file)
        {
            return Err(IndexerError::IgnoreFile {
                path: ignore_file.clone(),
                message: err.to_string(),
            });
        }

        let mut found_files = Vec::new();
        for result in builder.build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(?err, "Failed to read directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            if self.matcher.is_component_file(entry.path()) {
                found_files.push(entry.path().to_path_buf());
            }
        }

        found_files.sort();
        Ok(found_files)
    }

    /// Finds and reads every component file.
    ///
    /// # Errors
    /// Fails when discovery fails or a file cannot be read.
    pub async fn load_components(&self) -> Result<Vec<ComponentSource>, IndexerError> {
        let files = self.find_component_files()?;
        read_sources(&files).await
    }
}

/// Walker honoring the git ignore files, hidden files included.
fn walker(root: &Path) -> WalkBuilder {
    let mut builder = WalkBuilder::new(root);
    builder.hidden(false).git_ignore(true).git_global(true).git_exclude(true).follow_links(false);
    builder
}

/// Reads `paths` concurrently. The result is sorted by path.
///
/// # Errors
/// Fails on the first file that cannot be read.
pub async fn read_sources(paths: &[PathBuf]) -> Result<Vec<ComponentSource>, IndexerError> {
    let futures = paths.iter().map(|path| async move {
        tokio::fs::read_to_string(path)
            .await
            .map(|content| ComponentSource::new(path.clone(), content))
            .map_err(|source| IndexerError::Read { path: path.clone(), source })
    });

    let mut sources = futures::future::join_all(futures)
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;
    sources.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(sources)
}

/// Leading directories of `pattern` that contain no glob syntax.
fn literal_prefix(pattern: &str) -> PathBuf {
    let mut components: Vec<&str> = pattern.split('/').collect();
    components.pop();
    components
        .into_iter()
        .take_while(|component| !component.contains(['*', '?', '[', '{']))
        .collect()
}

/// Expands bundle globs relative to `root`.
///
/// `*` does not cross directory boundaries, `**` does. Paths are returned as
/// `root` joined with the match, sorted, one entry per path.
///
/// # Errors
/// Fails on an invalid glob.
pub fn expand_patterns(root: &Path, patterns: &[String]) -> Result<Vec<BundleTarget>, IndexerError> {
    let mut targets: Vec<BundleTarget> = Vec::new();

    for pattern in patterns {
        let matcher = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| IndexerError::InvalidPattern { pattern: pattern.clone(), source })?
            .compile_matcher();

        let start = root.join(literal_prefix(pattern));
        if !start.is_dir() {
            tracing::debug!(pattern = %pattern, start = %start.display(), "Nothing to expand");
            continue;
        }

        let mut matched = Vec::new();
        for entry in walker(&start).build().filter_map(Result::ok) {
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            if matcher.is_match(relative) {
                matched.push(entry.path().to_path_buf());
            }
        }
        matched.sort();
        tracing::debug!(pattern = %pattern, count = matched.len(), "Expanded bundle pattern");

        for path in matched {
            if !targets.iter().any(|target| target.path == path) {
                targets.push(BundleTarget { pattern: pattern.clone(), path });
            }
        }
    }

    Ok(targets)
}
