//! Reading and writing the files that live outside component sources.

pub mod messages;
pub mod namespace;

use std::path::PathBuf;

use thiserror::Error;

/// Errors reading or writing message files.
#[derive(Error, Debug)]
pub enum InputError {
    /// A file could not be read or written.
    #[error("Failed to access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file is not valid JSON.
    #[error("Invalid JSON in '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A locale match expression is not a valid regex.
    #[error("Invalid match expression '{pattern}': {source}")]
    InvalidMatch {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Messages could not be serialized.
    #[error("Failed to serialize '{}': {message}", path.display())]
    Serialize { path: PathBuf, message: String },
}
