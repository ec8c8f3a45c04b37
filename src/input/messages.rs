//! The canonical message file: one JSON file, or one `<locale>.json` per locale.

use std::path::{
    Path,
    PathBuf,
};

use regex::{
    Regex,
    RegexBuilder,
};

use super::InputError;
use crate::ir::{
    Message,
    MessageTree,
};
use crate::syntax::format::{
    FormatOptions,
    to_json_pretty,
};

/// Locale of a per-locale file name when no expression is given.
pub const DEFAULT_LOCALE_MATCH: &str = r"^(?<locale>[\w-]+)\.json$";

/// Maps an I/O error on `path` to [`InputError::Io`].
fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> InputError + '_ {
    move |source| InputError::Io { path: path.to_path_buf(), source }
}

/// Compiles a case-insensitive locale match expression.
///
/// # Errors
/// Returns [`InputError::InvalidMatch`] when `pattern` does not compile.
pub fn locale_matcher(pattern: Option<&str>) -> Result<Regex, InputError> {
    let pattern = pattern.unwrap_or(DEFAULT_LOCALE_MATCH);
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| InputError::InvalidMatch { pattern: pattern.to_string(), source })
}

/// Locale encoded in `path`, from the `locale` group or the first group.
#[must_use]
pub fn locale_of(path: &Path, matcher: &Regex) -> Option<String> {
    let text = path.to_string_lossy();
    let captures = matcher.captures(&text)?;
    captures.name("locale").or_else(|| captures.get(1)).map(|m| m.as_str().to_string())
}

/// Reads `path` and parses it as JSON.
async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, InputError> {
    let content = tokio::fs::read_to_string(path).await.map_err(io_error(path))?;
    serde_json::from_str(&content).map_err(|source| InputError::Parse { path: path.to_path_buf(), source })
}

/// Reads a canonical tree from `path`.
///
/// A file must hold a locale-keyed object. For a directory, every file whose
/// name matches `matcher` contributes its content as one locale.
///
/// # Errors
/// Fails when a file cannot be read or is not valid JSON.
pub async fn read_messages(path: &Path, matcher: &Regex) -> Result<MessageTree, InputError> {
    let metadata = tokio::fs::metadata(path).await.map_err(io_error(path))?;
    if !metadata.is_dir() {
        return read_json(path).await;
    }

    let mut entries = tokio::fs::read_dir(path).await.map_err(io_error(path))?;
    let mut files: Vec<(String, PathBuf)> = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_error(path))? {
        let file_path = entry.path();
        let Some(name) = file_path.file_name().map(PathBuf::from) else {
            continue;
        };
        match locale_of(&name, matcher) {
            Some(locale) if file_path.is_file() => files.push((locale, file_path)),
            _ => tracing::debug!(path = %file_path.display(), "Skipping non-locale file"),
        }
    }
    files.sort_by(|a, b| a.1.cmp(&b.1));

    let mut tree = MessageTree::new();
    for (locale, file_path) in files {
        let message: Message = read_json(&file_path).await?;
        tree.insert(locale, message);
    }
    Ok(tree)
}

/// Pretty JSON of `value` ending with the configured end-of-file text.
fn render(value: &impl serde::Serialize, path: &Path, format: &FormatOptions) -> Result<String, InputError> {
    let mut content = to_json_pretty(value, format.indent)
        .map_err(|e| InputError::Serialize { path: path.to_path_buf(), message: e.to_string() })?;
    if !content.ends_with(&format.eof) {
        content.push_str(&format.eof);
    }
    Ok(content)
}

/// Writes `content`, creating parent directories first.
async fn write_file(path: &Path, content: String) -> Result<(), InputError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_error(parent))?;
    }
    tokio::fs::write(path, content).await.map_err(io_error(path))
}

/// Writes `tree` to `output`; with `split`, `output` is a directory receiving
/// one `<locale>.json` per locale. Returns the written paths.
///
/// # Errors
/// Fails when a file cannot be written.
pub async fn write_messages(
    tree: &MessageTree,
    output: &Path,
    split: bool,
    format: &FormatOptions,
) -> Result<Vec<PathBuf>, InputError> {
    if !split {
        write_file(output, render(tree, output, format)?).await?;
        return Ok(vec![output.to_path_buf()]);
    }

    let mut written = Vec::with_capacity(tree.len());
    for (locale, message) in tree {
        let path = output.join(format!("{locale}.json"));
        write_file(&path, render(message, &path, format)?).await?;
        written.push(path);
    }
    Ok(written)
}
