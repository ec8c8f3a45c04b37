//! Extraction of translatable blocks into per-file records and the canonical tree.

use std::path::{
    Path,
    PathBuf,
};

use thiserror::Error;

use crate::hierarchy::{
    HierarchyError,
    resolve_hierarchy,
};
use crate::indexer::types::ComponentSource;
use crate::ir::{
    BlockLang,
    BlockRecord,
    ComponentMetaTable,
    FileMeta,
    Message,
    MessageTree,
    deep_merge,
    merge_trees,
};
use crate::syntax::format::{
    FormatError,
    parse_content,
};
use crate::syntax::{
    Descriptor,
    DescriptorProvider,
    SyntaxError,
};
use crate::types::OnError;

/// Errors extracting the blocks of one component file.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The file's blocks could not be located.
    #[error("Failed to read blocks of '{}': {source}", path.display())]
    Syntax {
        path: PathBuf,
        #[source]
        source: SyntaxError,
    },

    /// A block body does not parse in its language.
    #[error("Failed to parse block #{index} of '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        index: usize,
        #[source]
        source: FormatError,
    },

    /// A block without `locale` holds something other than a locale-keyed mapping.
    #[error("Block #{index} of '{}' has no locale attribute and is not a locale mapping", path.display())]
    NotLocaleMapping { path: PathBuf, index: usize },

    /// The file does not sit under the base directory.
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
}

impl ExtractError {
    /// The file the error belongs to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Syntax { path, .. }
            | Self::Parse { path, .. }
            | Self::NotLocaleMapping { path, .. }
            | Self::Hierarchy(HierarchyError::InvalidBase { path, .. }) => path,
        }
    }
}

/// Normalizes the translatable blocks of `descriptor`, in byte-offset order.
///
/// # Errors
/// Fails on the first block whose content does not parse.
pub fn extract_blocks(
    descriptor: &Descriptor,
    source: &str,
    path: &Path,
    block_type: &str,
) -> Result<Vec<BlockRecord>, ExtractError> {
    descriptor
        .translatable(block_type)
        .enumerate()
        .map(|(index, block)| {
            let lang = BlockLang::from_attr(block.lang());
            let value = parse_content(block.content_text(source), lang).map_err(|source| {
                ExtractError::Parse { path: path.to_path_buf(), index, source }
            })?;
            tracing::debug!(
                path = %path.display(),
                index,
                start = block.content.start,
                end = block.content.end,
                %lang,
                locale = ?block.locale(),
                "Extracted block"
            );

            match (block.locale(), value) {
                (Some(locale), value) => Ok(BlockRecord::for_locale(lang, locale, value)),
                (None, Message::Node(map)) => Ok(BlockRecord::multi_locale(lang, map)),
                (None, _) => Err(ExtractError::NotLocaleMapping { path: path.to_path_buf(), index }),
            }
        })
        .collect()
}

/// Extracts one component file.
///
/// # Errors
/// Fails when the file lies outside `base`, cannot be split into blocks, or a
/// block does not parse.
pub fn extract_file(
    base: &Path,
    source: &ComponentSource,
    provider: &dyn DescriptorProvider,
    block_type: &str,
) -> Result<FileMeta, ExtractError> {
    let hierarchy = resolve_hierarchy(base, &source.path)?;
    let descriptor = provider
        .parse(&source.content, &source.path)
        .map_err(|e| ExtractError::Syntax { path: source.path.clone(), source: e })?;
    let blocks = extract_blocks(&descriptor, &source.content, &source.path, block_type)?;

    Ok(FileMeta { path: source.path.clone(), hierarchy, blocks })
}

/// Result of extracting a set of files.
#[derive(Debug, Default)]
pub struct Squeezed {
    /// Extracted files keyed by path.
    pub table: ComponentMetaTable,
    /// Files skipped under [`OnError::Continue`].
    pub failures: Vec<ExtractError>,
}

/// Extracts every file in `sources` into a fresh [`ComponentMetaTable`].
///
/// # Errors
/// With [`OnError::Halt`] the first failing file aborts the run.
pub fn squeeze(
    base: &Path,
    sources: &[ComponentSource],
    provider: &dyn DescriptorProvider,
    block_type: &str,
    on_error: OnError,
) -> Result<Squeezed, ExtractError> {
    let mut squeezed = Squeezed { table: ComponentMetaTable::new(base), failures: Vec::new() };

    for source in sources {
        match extract_file(base, source, provider, block_type) {
            Ok(meta) => squeezed.table.insert(meta),
            Err(e) if on_error == OnError::Continue => {
                tracing::warn!(path = %source.path.display(), error = %e, "Skipping file");
                squeezed.failures.push(e);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(squeezed)
}

/// Merges the blocks of one file locale by locale, later blocks winning.
#[must_use]
pub fn merge_blocks(blocks: &[BlockRecord]) -> MessageTree {
    let mut merged = MessageTree::new();
    for block in blocks {
        for (locale, message) in &block.messages {
            match merged.get_mut(locale) {
                Some(existing) => deep_merge(existing, message.clone()),
                None => {
                    merged.insert(locale.clone(), message.clone());
                }
            }
        }
    }
    merged
}

/// Folds every file of `table` into one canonical tree, each file's messages
/// nested under its hierarchy.
#[must_use]
pub fn flatten_table(table: &ComponentMetaTable) -> MessageTree {
    let mut tree = MessageTree::new();
    for meta in table.components.values() {
        let nested = merge_blocks(&meta.blocks)
            .into_iter()
            .map(|(locale, message)| (locale, message.nest_under(&meta.hierarchy)))
            .collect();
        merge_trees(&mut tree, nested);
    }
    tree
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::test_utils::tree;
    use crate::syntax::sfc::SfcScanner;

    /// Base directory of the fixtures.
    const BASE: &str = "/p/src";

    /// Component source at `path`.
    fn source(path: &str, content: &str) -> ComponentSource {
        ComponentSource::new(path, content)
    }

    /// Squeezes `sources` into one tree.
    fn squeeze_all(sources: &[ComponentSource]) -> MessageTree {
        let squeezed = squeeze(Path::new(BASE), sources, &SfcScanner, "i18n", OnError::Halt).unwrap();
        flatten_table(&squeezed.table)
    }

    #[googletest::test]
    fn test_extract_file_records_blocks_in_order() {
        let file = source(
            "/p/src/components/Modal.vue",
            "<i18n locale=\"en\">{\"ok\": \"OK\"}</i18n>\n<template><p/></template>\n<i18n lang=\"yaml\">\nja:\n  ok: はい\n</i18n>\n",
        );

        let meta = extract_file(Path::new(BASE), &file, &SfcScanner, "i18n").unwrap();

        expect_that!(meta.hierarchy, elements_are![eq("components"), eq("Modal")]);
        expect_that!(meta.blocks, len(eq(2)));
        expect_that!(meta.blocks[0].locale, some(eq("en")));
        expect_that!(meta.blocks[0].lang, eq(BlockLang::Json));
        expect_that!(meta.blocks[1].locale, none());
        expect_that!(meta.blocks[1].lang, eq(BlockLang::Yaml));
        assert_eq!(meta.blocks[1].messages, tree(json!({"ja": {"ok": "はい"}})));
    }

    #[googletest::test]
    fn test_squeeze_nests_under_hierarchy() {
        let files = [
            source("/p/src/App.vue", "<i18n>{\"en\": {\"title\": \"App\"}}</i18n>"),
            source(
                "/p/src/components/Modal.vue",
                "<i18n>{\"en\": {\"ok\": \"OK\"}, \"ja\": {\"ok\": \"はい\"}}</i18n>",
            ),
        ];

        let tree_out = squeeze_all(&files);

        assert_eq!(
            tree_out,
            tree(json!({
                "en": {"App": {"title": "App"}, "components": {"Modal": {"ok": "OK"}}},
                "ja": {"components": {"Modal": {"ok": "はい"}}}
            }))
        );
    }

    #[googletest::test]
    fn test_later_block_wins_on_collision() {
        let files = [source(
            "/p/src/Counter.vue",
            "<i18n>{\"en\": {\"a\": 1}}</i18n>\n<i18n>{\"en\": {\"a\": 2, \"b\": 3}}</i18n>\n",
        )];

        let tree_out = squeeze_all(&files);

        assert_eq!(tree_out, tree(json!({"en": {"Counter": {"a": 2, "b": 3}}})));
    }

    #[googletest::test]
    fn test_squeeze_is_idempotent() {
        let files = [
            source("/p/src/A.vue", "<i18n locale=\"en\">{\"x\": \"X\"}</i18n>"),
            source("/p/src/b/B.vue", "<i18n lang=\"json5\">{en: {y: \"Y\"}}</i18n>"),
        ];

        expect_that!(squeeze_all(&files), eq(&squeeze_all(&files)));
    }

    #[rstest]
    #[case::blank("<i18n>\n\n</i18n>")]
    #[case::external_src("<i18n src=\"./en.json\"></i18n>")]
    #[case::no_block("<template><div/></template>")]
    fn test_files_without_messages_contribute_nothing(#[case] content: &str) {
        let files = [source("/p/src/Empty.vue", content)];

        assert_that!(squeeze_all(&files).is_empty(), eq(true));
    }

    #[googletest::test]
    fn test_parse_error_carries_path_and_index() {
        let file = source("/p/src/Bad.vue", "<i18n>{}</i18n><i18n>{oops</i18n>");

        let result = extract_file(Path::new(BASE), &file, &SfcScanner, "i18n");

        assert!(matches!(result, Err(ExtractError::Parse { index: 1, .. })));
    }

    #[googletest::test]
    fn test_non_mapping_without_locale_is_rejected() {
        let file = source("/p/src/List.vue", "<i18n>[\"a\"]</i18n>");

        let result = extract_file(Path::new(BASE), &file, &SfcScanner, "i18n");

        assert!(matches!(result, Err(ExtractError::NotLocaleMapping { index: 0, .. })));
    }

    #[googletest::test]
    fn test_continue_skips_failing_file() {
        let files = [
            source("/p/src/Bad.vue", "<i18n>{oops</i18n>"),
            source("/p/src/Good.vue", "<i18n locale=\"en\">{\"ok\": \"OK\"}</i18n>"),
        ];

        let squeezed =
            squeeze(Path::new(BASE), &files, &SfcScanner, "i18n", OnError::Continue).unwrap();

        expect_that!(squeezed.failures, len(eq(1)));
        expect_that!(squeezed.failures[0].path(), eq(Path::new("/p/src/Bad.vue")));
        expect_that!(squeezed.table.components.len(), eq(1));
    }

    #[googletest::test]
    fn test_halt_stops_on_failing_file() {
        let files = [source("/p/src/Bad.vue", "<i18n>{oops</i18n>")];

        let result = squeeze(Path::new(BASE), &files, &SfcScanner, "i18n", OnError::Halt);

        expect_that!(result.is_err(), eq(true));
    }

    #[googletest::test]
    fn test_file_outside_base_fails() {
        let file = source("/elsewhere/X.vue", "<i18n>{}</i18n>");

        let result = extract_file(Path::new(BASE), &file, &SfcScanner, "i18n");

        assert!(matches!(result, Err(ExtractError::Hierarchy(_))));
    }
}
