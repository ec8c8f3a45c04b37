//! Workspace configuration (`.sfc-locale.json`).
mod loader;
mod manager;
mod matcher;
mod types;

pub use loader::CONFIG_FILE_NAME;
pub use manager::ConfigManager;
pub use matcher::{
    FileMatcher,
    MatcherError,
};
pub use types::{
    BundleConfig,
    ConfigError,
    FormatConfig,
    SyncSettings,
    ValidationError,
};
