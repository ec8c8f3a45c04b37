//! Holds the validated settings of one run.

use std::path::Path;

use super::{
    ConfigError,
    SyncSettings,
    loader,
};

/// Owns the [`SyncSettings`] used by a command.
#[derive(Default, Debug, Clone)]
pub struct ConfigManager {
    /// Settings of the last successful load.
    current_settings: SyncSettings,
}

impl ConfigManager {
    /// Manager holding default settings.
    #[must_use]
    pub fn new() -> Self {
        Self { current_settings: SyncSettings::default() }
    }

    /// Loads and validates the settings of `workspace_root`, falling back to
    /// defaults when there is no configuration file.
    ///
    /// # Errors
    /// - File read error
    /// - JSON parse error
    /// - Validation error
    pub fn load_settings(&mut self, workspace_root: Option<&Path>) -> Result<(), ConfigError> {
        let settings = match workspace_root {
            Some(root) => loader::load_from_workspace(root)?.unwrap_or_default(),
            None => SyncSettings::default(),
        };

        settings.validate().map_err(ConfigError::ValidationErrors)?;
        tracing::debug!(block_type = %settings.block_type, bundles = settings.bundle.patterns.len(), "Settings loaded");
        self.current_settings = settings;

        Ok(())
    }

    /// Settings currently in effect.
    #[must_use]
    pub const fn get_settings(&self) -> &SyncSettings {
        &self.current_settings
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;
    use crate::config::loader::CONFIG_FILE_NAME;

    #[rstest]
    fn test_load_settings_without_workspace() {
        let mut manager = ConfigManager::new();

        let result = manager.load_settings(None);

        assert!(result.is_ok());
        assert_eq!(manager.get_settings().block_type, "i18n");
    }

    #[rstest]
    fn test_load_settings_with_config_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            r#"{"allowPrune": true, "bundle": {"patterns": ["locales/**/*.json"], "match": "(?<locale>\\w+)/(?<filename>\\w+)\\.json$"}}"#,
        )
        .unwrap();

        let mut manager = ConfigManager::new();
        manager.load_settings(Some(temp_dir.path())).unwrap();

        assert!(manager.get_settings().allow_prune);
        assert_eq!(manager.get_settings().bundle.patterns, vec!["locales/**/*.json".to_string()]);
    }

    #[rstest]
    fn test_load_settings_rejects_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), r#"{"format": {"indent": 0}}"#).unwrap();

        let mut manager = ConfigManager::new();
        let result = manager.load_settings(Some(temp_dir.path()));

        assert!(matches!(result, Err(ConfigError::ValidationErrors(_))));
        assert_eq!(manager.get_settings().format.indent, 2);
    }
}
