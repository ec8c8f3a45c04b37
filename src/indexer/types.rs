//! Indexer type definitions.

use std::path::PathBuf;

use thiserror::Error;

/// A component file read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSource {
    /// Absolute path.
    pub path: PathBuf,
    /// File text.
    pub content: String,
}

impl ComponentSource {
    /// Source for `path` with `content`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self { path: path.into(), content: content.into() }
    }
}

/// Errors discovering or reading component files.
#[derive(Error, Debug)]
pub enum IndexerError {
    /// An include or exclude pattern is not a glob.
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// The compiled globs could not be combined.
    #[error("Failed to build glob set: {0}")]
    GlobSetBuild(#[from] globset::Error),

    /// The configured ignore file could not be read.
    #[error("Failed to read ignore file '{}': {message}", path.display())]
    IgnoreFile { path: PathBuf, message: String },

    /// A component file could not be read.
    #[error("Failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
