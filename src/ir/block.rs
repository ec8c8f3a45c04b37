//! Normalized records of translatable blocks, as extracted from component files.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{
    Path,
    PathBuf,
};

use super::message::{
    Message,
    MessageTree,
};
use crate::types::Locale;

/// Serialization language of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockLang {
    /// `lang="json"` or no `lang`.
    #[default]
    Json,
    /// `lang="json5"`.
    Json5,
    /// `lang="yaml"`.
    Yaml,
    /// `lang="yml"`, kept apart from `yaml` so the attribute is written back unchanged.
    Yml,
}

impl BlockLang {
    /// Resolves the `lang` attribute. Missing, valueless or unknown languages
    /// fall back to JSON.
    #[must_use]
    pub fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some("json5") => Self::Json5,
            Some("yaml") => Self::Yaml,
            Some("yml") => Self::Yml,
            _ => Self::Json,
        }
    }

    /// Value written to the `lang` attribute.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Json5 => "json5",
            Self::Yaml => "yaml",
            Self::Yml => "yml",
        }
    }
}

impl fmt::Display for BlockLang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-memory form of one translatable block.
///
/// With an explicit `locale`, `messages` holds exactly that one key.
/// Without one, the keys of `messages` are the locales the block carries.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockRecord {
    /// Language the body is written in.
    pub lang: BlockLang,
    /// The `locale` attribute, when present.
    pub locale: Option<Locale>,
    /// Messages keyed by locale.
    pub messages: MessageTree,
    /// Set by reconciliation when pruning is allowed and the block went stale.
    pub pruned: bool,
}

impl BlockRecord {
    /// A block scoped to a single locale.
    #[must_use]
    pub fn for_locale(lang: BlockLang, locale: impl Into<Locale>, message: Message) -> Self {
        let locale = locale.into();
        let mut messages = MessageTree::new();
        messages.insert(locale.clone(), message);
        Self { lang, locale: Some(locale), messages, pruned: false }
    }

    /// A block whose top-level keys are locales.
    #[must_use]
    pub const fn multi_locale(lang: BlockLang, messages: MessageTree) -> Self {
        Self { lang, locale: None, messages, pruned: false }
    }

    /// Locales this block holds messages for.
    #[must_use]
    pub fn locales(&self) -> Vec<Locale> {
        self.locale.as_ref().map_or_else(|| self.messages.keys().cloned().collect(), |locale| vec![locale.clone()])
    }

    /// The value written back into the block body.
    #[must_use]
    pub fn content(&self) -> Message {
        match &self.locale {
            Some(locale) => self.messages.get(locale).cloned().unwrap_or_default(),
            None => Message::Node(self.messages.clone()),
        }
    }
}

/// Extraction result for one component file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMeta {
    /// Absolute path of the component.
    pub path: PathBuf,
    /// Key path into the canonical tree, ending in the component name.
    pub hierarchy: Vec<String>,
    /// Ordered by the byte offset of the block in the original source.
    pub blocks: Vec<BlockRecord>,
}

/// Extraction result for a whole directory tree. Rebuilt on every run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComponentMetaTable {
    /// Directory the hierarchies are relative to.
    pub base_path: PathBuf,
    /// Keyed by absolute file path; iteration is lexicographic by path.
    pub components: BTreeMap<PathBuf, FileMeta>,
}

impl ComponentMetaTable {
    /// Empty table rooted at `base_path`.
    #[must_use]
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into(), components: BTreeMap::new() }
    }

    /// Adds `meta`, replacing any entry for the same path.
    pub fn insert(&mut self, meta: FileMeta) {
        self.components.insert(meta.path.clone(), meta);
    }

    /// Entry for the component at `path`.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&FileMeta> {
        self.components.get(path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case::missing(None, BlockLang::Json)]
    #[case::json(Some("json"), BlockLang::Json)]
    #[case::json5(Some("json5"), BlockLang::Json5)]
    #[case::yaml(Some("yaml"), BlockLang::Yaml)]
    #[case::yml(Some("yml"), BlockLang::Yml)]
    #[case::unknown(Some("toml"), BlockLang::Json)]
    fn test_from_attr(#[case] value: Option<&str>, #[case] expected: BlockLang) {
        assert_eq!(BlockLang::from_attr(value), expected);
    }

    #[googletest::test]
    fn test_locales_of_explicit_block() {
        let record = BlockRecord::for_locale(BlockLang::Yaml, "ja", Message::from(json!({"ok": "OK"})));

        expect_that!(record.locales(), elements_are![eq("ja")]);
        expect_that!(record.content(), eq(&Message::from(json!({"ok": "OK"}))));
    }

    #[googletest::test]
    fn test_locales_of_multi_locale_block() {
        let messages: MessageTree =
            serde_json::from_value(json!({"en": {"a": "A"}, "ja": {"a": "あ"}})).unwrap();
        let record = BlockRecord::multi_locale(BlockLang::Json, messages);

        expect_that!(record.locales(), elements_are![eq("en"), eq("ja")]);
        expect_that!(record.content(), eq(&Message::from(json!({"en": {"a": "A"}, "ja": {"a": "あ"}}))));
    }
}
