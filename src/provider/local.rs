//! Directory-backed provider: the service is a directory of `<locale>.json`
//! files given by `provider.root`.

use std::collections::BTreeSet;
use std::path::{
    Path,
    PathBuf,
};

use futures::FutureExt;
use futures::future::BoxFuture;

use super::{
    LocaleServiceProvider,
    ProviderConfiguration,
    ProviderError,
    ProviderResult,
    PullResource,
    PushMode,
    PushResource,
    RawLocaleMessage,
    TranslationStatus,
    normalize_tree,
};
use crate::ir::{
    Message,
    MessageTree,
    deep_merge,
    message::format_path,
};
use crate::syntax::format::to_json_pretty;
use crate::types::Locale;

/// Name the provider is registered under.
pub const PROVIDER_NAME: &str = "local";

/// Only format stored, imported and exported.
const FORMAT: &str = "json";

/// Factory registered under [`PROVIDER_NAME`].
///
/// # Errors
/// Fails when the configuration has no `provider.root`.
pub fn create(configuration: ProviderConfiguration) -> ProviderResult<Box<dyn LocaleServiceProvider>> {
    let root = configuration
        .value("root")
        .ok_or_else(|| operation_error("`provider.root` is required"))?;
    Ok(Box::new(LocalProvider::new(root)))
}

/// [`ProviderError::Operation`] tagged with this provider.
fn operation_error(message: impl Into<String>) -> ProviderError {
    ProviderError::Operation { provider: PROVIDER_NAME.to_string(), message: message.into() }
}

/// Provider backed by `<root>/<locale>.json` files.
#[derive(Debug, Clone)]
pub struct LocalProvider {
    /// Store directory.
    root: PathBuf,
}

impl LocalProvider {
    /// Provider over the store at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store file of `locale`.
    fn locale_path(&self, locale: &str) -> PathBuf {
        self.root.join(format!("{locale}.{FORMAT}"))
    }

    /// Locales present in the store, sorted.
    async fn stored_locales(&self) -> ProviderResult<Vec<Locale>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(operation_error(e.to_string())),
        };

        let mut locales = BTreeSet::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| operation_error(e.to_string()))? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == FORMAT)
                && let Some(stem) = path.file_stem()
            {
                locales.insert(stem.to_string_lossy().into_owned());
            }
        }
        Ok(locales.into_iter().collect())
    }

    /// `locales`, or every stored locale when it is empty.
    async fn requested(&self, locales: Vec<Locale>) -> ProviderResult<Vec<Locale>> {
        if locales.is_empty() { self.stored_locales().await } else { Ok(locales) }
    }

    /// Stored text of `locale`; `None` when the file does not exist.
    async fn read_raw(&self, locale: &str) -> ProviderResult<Option<String>> {
        match tokio::fs::read_to_string(self.locale_path(locale)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(operation_error(e.to_string())),
        }
    }

    /// Parsed messages of `locale`.
    async fn read_locale(&self, locale: &str) -> ProviderResult<Option<Message>> {
        let Some(content) = self.read_raw(locale).await? else {
            return Ok(None);
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| operation_error(format!("{}: {e}", self.locale_path(locale).display())))
    }

    /// Writes `message` as the whole content of `locale`.
    async fn write_locale(&self, locale: &str, message: &Message, dry_run: bool) -> ProviderResult<()> {
        let path = self.locale_path(locale);
        if dry_run {
            tracing::info!(path = %path.display(), "Dry run, not writing");
            return Ok(());
        }
        let mut content = to_json_pretty(message, 2).map_err(|e| operation_error(e.to_string()))?;
        content.push('\n');
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| operation_error(e.to_string()))?;
        tokio::fs::write(&path, content).await.map_err(|e| operation_error(e.to_string()))
    }

    /// Parses a pushed file.
    async fn read_file(path: &Path) -> ProviderResult<Message> {
        let content =
            tokio::fs::read_to_string(path).await.map_err(|e| operation_error(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| operation_error(format!("{}: {e}", path.display())))
    }

    /// Deep-merges `message` into what is stored for `locale`.
    async fn upsert(&self, locale: &str, message: Message, dry_run: bool) -> ProviderResult<()> {
        let mut stored = self.read_locale(locale).await?.unwrap_or_else(Message::empty_node);
        deep_merge(&mut stored, message);
        self.write_locale(locale, &stored, dry_run).await
    }

    /// Stores a push in either mode, shaped by `resource.normalize`.
    async fn push_resource(&self, resource: PushResource, dry_run: bool) -> ProviderResult<()> {
        match resource.mode {
            PushMode::LocaleMessage => {
                for (locale, message) in normalize_tree(resource.normalize, resource.messages) {
                    self.upsert(&locale, message, dry_run).await?;
                }
            }
            PushMode::FilePath => {
                for file in resource.files {
                    let mut message = Self::read_file(&file.path).await?;
                    if let Some(normalize) = resource.normalize {
                        message = normalize.apply(&message);
                    }
                    self.upsert(&file.locale, message, dry_run).await?;
                }
            }
        }
        Ok(())
    }

    /// Messages of the requested locales; missing locales are skipped.
    async fn pull_locales(&self, locales: Vec<Locale>) -> ProviderResult<MessageTree> {
        let mut tree = MessageTree::new();
        for locale in self.requested(locales).await? {
            match self.read_locale(&locale).await? {
                Some(message) => {
                    tree.insert(locale, message);
                }
                None => tracing::warn!(%locale, "Locale not found in store"),
            }
        }
        Ok(tree)
    }

    /// [`Self::pull_locales`] reshaped by `resource.normalize`.
    async fn pull_resource(&self, resource: PullResource) -> ProviderResult<MessageTree> {
        let tree = self.pull_locales(resource.locales).await?;
        Ok(normalize_tree(resource.normalize, tree))
    }

    /// Progress of each locale against every key known to any locale.
    async fn translation_status(&self, locales: Vec<Locale>) -> ProviderResult<Vec<TranslationStatus>> {
        let all = self.pull_locales(Vec::new()).await?;
        let keys: BTreeSet<String> = all
            .values()
            .flat_map(Message::leaves)
            .map(|(path, _)| format_path(&path, "."))
            .collect();

        let mut statuses = Vec::new();
        for locale in self.requested(locales).await? {
            let translated: BTreeSet<String> = all
                .get(&locale)
                .map(|message| {
                    message
                        .leaves()
                        .into_iter()
                        .filter(|(_, value)| !value.is_blank())
                        .map(|(path, _)| format_path(&path, "."))
                        .collect()
                })
                .unwrap_or_default();
            statuses.push(TranslationStatus { percentage: percentage(translated.len(), keys.len()), locale });
        }
        Ok(statuses)
    }

    /// Replaces the stored content of each locale.
    async fn import_messages(&self, messages: Vec<RawLocaleMessage>, dry_run: bool) -> ProviderResult<()> {
        for raw in messages {
            if raw.format != FORMAT {
                return Err(operation_error(format!("Unsupported format '{}'", raw.format)));
            }
            let message: Message = serde_json::from_str(&raw.data)
                .map_err(|e| operation_error(format!("{}: {e}", raw.locale)))?;
            self.write_locale(&raw.locale, &message, dry_run).await?;
        }
        Ok(())
    }

    /// Raw stored text of the requested locales.
    async fn export_messages(&self, locales: Vec<Locale>, format: String) -> ProviderResult<Vec<RawLocaleMessage>> {
        if format != FORMAT {
            return Err(operation_error(format!("Unsupported format '{format}'")));
        }
        let mut exported = Vec::new();
        for locale in self.requested(locales).await? {
            if let Some(data) = self.read_raw(&locale).await? {
                exported.push(RawLocaleMessage { locale, format: format.clone(), data });
            }
        }
        Ok(exported)
    }
}

/// Whole percent of `translated` over `total`; an empty locale counts as complete.
fn percentage(translated: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    u32::try_from(translated.saturating_mul(100) / total).unwrap_or(100)
}

impl LocaleServiceProvider for LocalProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn push(&self, resource: PushResource, dry_run: bool) -> BoxFuture<'_, ProviderResult<()>> {
        self.push_resource(resource, dry_run).boxed()
    }

    fn pull(&self, resource: PullResource, _dry_run: bool) -> BoxFuture<'_, ProviderResult<MessageTree>> {
        self.pull_resource(resource).boxed()
    }

    fn status(&self, locales: Vec<Locale>) -> BoxFuture<'_, ProviderResult<Vec<TranslationStatus>>> {
        self.translation_status(locales).boxed()
    }

    fn import(&self, messages: Vec<RawLocaleMessage>, dry_run: bool) -> BoxFuture<'_, ProviderResult<()>> {
        self.import_messages(messages, dry_run).boxed()
    }

    fn export(
        &self,
        locales: Vec<Locale>,
        format: String,
        _dry_run: bool,
    ) -> BoxFuture<'_, ProviderResult<Vec<RawLocaleMessage>>> {
        self.export_messages(locales, format).boxed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::provider::{
        Normalize,
        PushFile,
    };
    use crate::test_utils::tree;

    /// Pull request for one locale.
    fn pull_only(locale: &str) -> PullResource {
        PullResource { locales: vec![locale.to_string()], ..PullResource::default() }
    }

    /// Store seeded with `files`.
    fn store(files: &[(&str, &str)]) -> (TempDir, LocalProvider) {
        let temp_dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(temp_dir.path().join(name), content).unwrap();
        }
        let provider = LocalProvider::new(temp_dir.path());
        (temp_dir, provider)
    }

    #[rstest]
    #[case::none(0, 4, 0)]
    #[case::half(2, 4, 50)]
    #[case::rounds_down(2, 3, 66)]
    #[case::all(3, 3, 100)]
    #[case::no_keys(0, 0, 100)]
    fn test_percentage(#[case] translated: usize, #[case] total: usize, #[case] expected: u32) {
        assert_eq!(percentage(translated, total), expected);
    }

    #[googletest::test]
    fn test_create_requires_root() {
        let result = create(ProviderConfiguration::default());

        assert!(matches!(result, Err(ProviderError::Operation { .. })));
    }

    #[tokio::test]
    async fn test_push_locale_messages_merges_into_store() {
        let (temp_dir, provider) = store(&[("en.json", r#"{"a": "A", "b": "B"}"#)]);
        let resource = PushResource {
            mode: PushMode::LocaleMessage,
            messages: tree(json!({"en": {"b": "B2"}, "ja": {"a": "あ"}})),
            ..PushResource::default()
        };

        provider.push(resource, false).await.unwrap();
        let pulled = provider.pull(PullResource::default(), false).await.unwrap();

        assert_eq!(pulled, tree(json!({"en": {"a": "A", "b": "B2"}, "ja": {"a": "あ"}})));
        assert!(temp_dir.path().join("ja.json").exists());
    }

    #[tokio::test]
    async fn test_push_file_path_mode() {
        let (temp_dir, provider) = store(&[]);
        let source = temp_dir.path().join("source-fr.txt");
        fs::write(&source, r#"{"hello": "bonjour"}"#).unwrap();
        let resource = PushResource {
            mode: PushMode::FilePath,
            files: vec![PushFile { locale: "fr".to_string(), path: source }],
            ..PushResource::default()
        };

        provider.push(resource, false).await.unwrap();

        let pulled = provider.pull(pull_only("fr"), false).await.unwrap();
        assert_eq!(pulled, tree(json!({"fr": {"hello": "bonjour"}})));
    }

    #[tokio::test]
    async fn test_push_flat_then_pull_hierarchy() {
        let (temp_dir, provider) = store(&[]);
        let resource = PushResource {
            messages: tree(json!({"en": {"greeting": {"hello": "Hello"}, "bye": "Bye"}})),
            normalize: Some(Normalize::Flat),
            ..PushResource::default()
        };

        provider.push(resource, false).await.unwrap();
        let stored: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(temp_dir.path().join("en.json")).unwrap()).unwrap();
        let pulled = provider
            .pull(PullResource { normalize: Some(Normalize::Hierarchy), ..PullResource::default() }, false)
            .await
            .unwrap();

        assert_eq!(stored, json!({"greeting.hello": "Hello", "bye": "Bye"}));
        assert_eq!(pulled, tree(json!({"en": {"greeting": {"hello": "Hello"}, "bye": "Bye"}})));
    }

    #[tokio::test]
    async fn test_push_dry_run_writes_nothing() {
        let (temp_dir, provider) = store(&[]);
        let resource = PushResource { messages: tree(json!({"en": {"a": "A"}})), ..PushResource::default() };

        provider.push(resource, true).await.unwrap();

        assert!(!temp_dir.path().join("en.json").exists());
    }

    #[tokio::test]
    async fn test_status_counts_blank_as_untranslated() {
        let (_temp_dir, provider) = store(&[
            ("en.json", r#"{"a": "A", "b": {"c": "C"}}"#),
            ("ja.json", r#"{"a": "あ", "b": {"c": ""}}"#),
        ]);

        let statuses = provider.status(Vec::new()).await.unwrap();

        assert_that!(
            statuses,
            elements_are![
                eq(&TranslationStatus { locale: "en".to_string(), percentage: 100 }),
                eq(&TranslationStatus { locale: "ja".to_string(), percentage: 50 })
            ]
        );
    }

    #[tokio::test]
    async fn test_export_and_import_raw_messages() {
        let (_temp_dir, provider) = store(&[("en.json", "{\"a\": \"A\"}")]);

        let exported = provider.export(Vec::new(), "json".to_string(), false).await.unwrap();
        let renamed: Vec<_> =
            exported.into_iter().map(|raw| RawLocaleMessage { locale: "de".to_string(), ..raw }).collect();
        provider.import(renamed, false).await.unwrap();

        let pulled = provider.pull(pull_only("de"), false).await.unwrap();
        assert_eq!(pulled, tree(json!({"de": {"a": "A"}})));
    }

    #[tokio::test]
    async fn test_export_unsupported_format() {
        let (_temp_dir, provider) = store(&[]);

        let result = provider.export(Vec::new(), "xliff".to_string(), false).await;

        assert!(matches!(result, Err(ProviderError::Operation { .. })));
    }
}
