//! Sync settings read from `.sfc-locale.json`.

use std::path::PathBuf;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::reconcile::{
    HierarchyFallback,
    ReconcileOptions,
};
use crate::syntax::format::FormatOptions;
use crate::types::OnError;

/// One invalid field of the settings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "includePatterns[0]")
    pub field_path: String,
    /// What is wrong with the field.
    pub message: String,
}

impl ValidationError {
    /// Error for the field at `field_path`.
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

/// Errors loading the settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// One or more fields are invalid.
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    /// The settings file could not be read.
    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// The settings file is not valid JSON.
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Numbered list of `errors`, one per line.
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Contents of `.sfc-locale.json`. Every field is optional.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncSettings {
    /// Tag name of translatable blocks.
    pub block_type: String,

    /// Globs selecting component files, relative to the workspace root.
    pub include_patterns: Vec<String>,
    /// Globs removed from `include_patterns`.
    pub exclude_patterns: Vec<String>,

    /// Extra gitignore-style file applied while discovering components.
    pub ignore_file: Option<PathBuf>,

    /// Layout of written files and block bodies.
    pub format: FormatConfig,

    /// How a component's hierarchy is looked up when infusing.
    pub hierarchy_fallback: HierarchyFallback,

    /// Remove blocks whose locale disappeared from the canonical tree.
    pub allow_prune: bool,

    /// Whether one failing file stops the run.
    pub on_error: OnError,

    /// External bundle files.
    pub bundle: BundleConfig,
}

/// Output layout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormatConfig {
    /// Spaces per indentation level.
    pub indent: usize,
    /// Text appended after the last line.
    pub eof: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self { indent: 2, eof: "\n".to_string() }
    }
}

/// Where external bundles live and how their paths are read.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BundleConfig {
    /// Globs locating bundle files.
    pub patterns: Vec<String>,
    /// Expression decoding `locale`/`filename`/`base` from a bundle path.
    #[serde(rename = "match")]
    pub match_pattern: Option<String>,
    /// JSON file mapping bundle globs to namespaces.
    pub namespace_file: Option<PathBuf>,
}

impl SyncSettings {
    /// # Errors
    /// - Required field is empty
    /// - Invalid glob pattern or match expression
    /// - Indent out of range
    /// - Bundle patterns without a match expression
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.block_type.trim().is_empty() {
            errors.push(ValidationError::new(
                "blockType",
                "The block type cannot be empty. Example: \"i18n\"",
            ));
        }

        if self.include_patterns.is_empty() {
            errors.push(ValidationError::new(
                "includePatterns",
                "At least one pattern is required. Example: [\"**/*.vue\"]",
            ));
        }

        for (field, patterns) in [
            ("includePatterns", &self.include_patterns),
            ("excludePatterns", &self.exclude_patterns),
            ("bundle.patterns", &self.bundle.patterns),
        ] {
            for (index, pattern) in patterns.iter().enumerate() {
                if let Err(e) = globset::Glob::new(pattern) {
                    errors.push(ValidationError::new(
                        format!("{field}[{index}]"),
                        format!("Invalid glob pattern '{pattern}': {e}"),
                    ));
                }
            }
        }

        if !(1..=10).contains(&self.format.indent) {
            errors.push(ValidationError::new(
                "format.indent",
                format!("The indent must be between 1 and 10, got {}", self.format.indent),
            ));
        }

        if self.format.eof.is_empty() {
            errors.push(ValidationError::new(
                "format.eof",
                "The terminator cannot be empty. Example: \"\\n\"",
            ));
        }

        match &self.bundle.match_pattern {
            None if !self.bundle.patterns.is_empty() => {
                errors.push(ValidationError::new(
                    "bundle.match",
                    "A match expression is required when 'bundle.patterns' is set",
                ));
            }
            Some(pattern) => {
                if let Err(e) = regex::Regex::new(pattern) {
                    errors.push(ValidationError::new(
                        "bundle.match",
                        format!("Invalid match expression '{pattern}': {e}"),
                    ));
                }
            }
            None => {}
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// [`FormatOptions`] built from `format`.
    #[must_use]
    pub fn format_options(&self) -> FormatOptions {
        FormatOptions { indent: self.format.indent, eof: self.format.eof.clone() }
    }

    /// [`ReconcileOptions`] built from `hierarchyFallback` and `allowPrune`.
    #[must_use]
    pub const fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions { fallback: self.hierarchy_fallback, allow_prune: self.allow_prune }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            block_type: "i18n".to_string(),
            include_patterns: vec!["**/*.vue".to_string()],
            exclude_patterns: vec!["node_modules/**".to_string()],
            ignore_file: None,
            format: FormatConfig::default(),
            hierarchy_fallback: HierarchyFallback::default(),
            allow_prune: false,
            on_error: OnError::default(),
            bundle: BundleConfig::default(),
        }
    }
}
