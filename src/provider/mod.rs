//! Localization service providers.
//!
//! A provider is created by name from a [`ProviderRegistry`] with a
//! [`ProviderConfiguration`] read from `<provider>-conf.json` (or an explicit
//! `--conf` file). Every operation returns a boxed future so providers can be
//! held as trait objects.

pub mod local;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{
    Path,
    PathBuf,
};

use clap::ValueEnum;
use futures::future::BoxFuture;
use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::ir::{
    Message,
    MessageTree,
    flatten,
    unflatten,
};
use crate::types::Locale;

/// Errors of provider lookup, configuration and operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// No provider is registered under the name.
    #[error("Not found '{name}' provider")]
    NotFound { name: String },

    /// The configuration file is missing or invalid.
    #[error("Failed to load provider configuration '{}': {message}", path.display())]
    Load { path: PathBuf, message: String },

    /// The service rejected or failed an operation.
    #[error("Provider '{provider}' failed: {message}")]
    Operation { provider: String, message: String },
}

/// How [`LocaleServiceProvider::push`] receives messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PushMode {
    /// Pass file paths; the service reads the files.
    FilePath,
    /// Pass the parsed messages of each locale.
    #[default]
    LocaleMessage,
}

/// Shape of locale messages exchanged with a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Normalize {
    /// One level of dot-joined keys.
    Flat,
    /// Nested nodes, dot-joined keys expanded.
    Hierarchy,
}

impl Normalize {
    /// `message` reshaped; leaves are kept as they are.
    #[must_use]
    pub fn apply(self, message: &Message) -> Message {
        match self {
            Self::Flat => Message::Node(
                flatten(message, ".")
                    .into_iter()
                    .filter(|(key, _)| !key.is_empty())
                    .map(|(key, value)| (key, value.clone()))
                    .collect(),
            ),
            Self::Hierarchy => unflatten(message, "."),
        }
    }
}

/// Applies `normalize` to every locale; `None` keeps the tree as it is.
#[must_use]
pub fn normalize_tree(normalize: Option<Normalize>, tree: MessageTree) -> MessageTree {
    match normalize {
        Some(normalize) => {
            tree.into_iter().map(|(locale, message)| (locale, normalize.apply(&message))).collect()
        }
        None => tree,
    }
}

/// Contents of a provider configuration file.
///
/// ```json
/// { "provider": { "root": "./translations" }, "pushMode": "file-path" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfiguration {
    /// Provider-specific settings.
    pub provider: serde_json::Map<String, serde_json::Value>,
    /// How pushed messages are handed over.
    pub push_mode: PushMode,
}

impl ProviderConfiguration {
    /// String value of a `provider` field.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.provider.get(key).and_then(serde_json::Value::as_str)
    }
}

/// A locale message file handed to the service by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushFile {
    /// Locale of the file.
    pub locale: Locale,
    /// Path of the file.
    pub path: PathBuf,
}

/// What [`LocaleServiceProvider::push`] sends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushResource {
    /// Which of `files` or `messages` is set.
    pub mode: PushMode,
    /// Set in [`PushMode::FilePath`].
    pub files: Vec<PushFile>,
    /// Set in [`PushMode::LocaleMessage`].
    pub messages: MessageTree,
    /// Shape the service expects; `None` sends messages as read.
    pub normalize: Option<Normalize>,
}

/// What [`LocaleServiceProvider::pull`] fetches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullResource {
    /// Locales to pull; all locales when empty.
    pub locales: Vec<Locale>,
    /// Shape the pulled messages are returned in; `None` keeps the stored shape.
    pub normalize: Option<Normalize>,
}

/// Translation progress of one locale, in whole percent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationStatus {
    /// Locale measured.
    pub locale: Locale,
    /// Translated leaves over all leaves, `0..=100`.
    pub percentage: u32,
}

/// A locale message in a service-specific file format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLocaleMessage {
    /// Locale of `data`.
    pub locale: Locale,
    /// Format name such as `json`.
    pub format: String,
    /// File content in `format`.
    pub data: String,
}

/// Result of a provider operation.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// A localization service.
pub trait LocaleServiceProvider: Send + Sync {
    /// Name the provider is registered under.
    fn name(&self) -> &str;

    /// Uploads messages, merging them into what the service holds.
    fn push(&self, resource: PushResource, dry_run: bool) -> BoxFuture<'_, ProviderResult<()>>;

    /// Downloads the messages of the requested locales.
    fn pull(&self, resource: PullResource, dry_run: bool) -> BoxFuture<'_, ProviderResult<MessageTree>>;

    /// Translation progress per locale.
    fn status(&self, locales: Vec<Locale>) -> BoxFuture<'_, ProviderResult<Vec<TranslationStatus>>>;

    /// Replaces service messages with raw files.
    fn import(&self, messages: Vec<RawLocaleMessage>, dry_run: bool) -> BoxFuture<'_, ProviderResult<()>>;

    /// Raw files of the requested locales in `format`.
    fn export(
        &self,
        locales: Vec<Locale>,
        format: String,
        dry_run: bool,
    ) -> BoxFuture<'_, ProviderResult<Vec<RawLocaleMessage>>>;
}

/// Builds a provider from its configuration.
pub type ProviderFactory = fn(ProviderConfiguration) -> ProviderResult<Box<dyn LocaleServiceProvider>>;

/// Providers available by name.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    /// Factory per provider name.
    factories: BTreeMap<String, ProviderFactory>,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry").field("providers", &self.factories.keys()).finish()
    }
}

impl ProviderRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the providers shipped with this crate.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(local::PROVIDER_NAME, local::create);
        registry
    }

    /// Registers `factory` under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, factory: ProviderFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Creates the provider `name`.
    ///
    /// # Errors
    /// [`ProviderError::NotFound`] for an unknown name, or whatever the
    /// provider's factory rejects.
    pub fn create(
        &self,
        name: &str,
        configuration: ProviderConfiguration,
    ) -> ProviderResult<Box<dyn LocaleServiceProvider>> {
        let factory =
            self.factories.get(name).ok_or_else(|| ProviderError::NotFound { name: name.to_string() })?;
        tracing::debug!(provider = name, "Creating provider");
        factory(configuration)
    }
}

/// Configuration file of `provider`: `conf` when given, else
/// `<provider>-conf.json` in `dir`.
#[must_use]
pub fn configuration_path(provider: &str, conf: Option<&Path>, dir: &Path) -> PathBuf {
    conf.map_or_else(|| dir.join(format!("{provider}-conf.json")), |conf| dir.join(conf))
}

/// Loads a provider configuration; a missing file yields the default one.
///
/// # Errors
/// [`ProviderError::Load`] when the file exists but cannot be read or parsed.
pub async fn load_configuration(path: &Path) -> ProviderResult<ProviderConfiguration> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No provider configuration, using default");
            return Ok(ProviderConfiguration::default());
        }
        Err(e) => {
            return Err(ProviderError::Load { path: path.to_path_buf(), message: e.to_string() });
        }
    };

    serde_json::from_str(&content)
        .map_err(|e| ProviderError::Load { path: path.to_path_buf(), message: e.to_string() })
}
