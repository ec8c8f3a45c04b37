//! Component file syntax: block descriptors and block content formats.

pub mod format;
pub mod json5;
pub mod sfc;

use std::fmt::Debug;
use std::path::Path;

use indexmap::IndexMap;
use thiserror::Error;

use crate::types::ByteSpan;

/// Errors locating the blocks of a component file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// No closing tag for a top-level block.
    #[error("Block <{tag}> opened at byte {offset} is never closed")]
    UnclosedBlock { tag: String, offset: usize },

    /// An HTML comment never ends.
    #[error("Comment opened at byte {offset} is never closed")]
    UnterminatedComment { offset: usize },

    /// An opening tag has no `>`.
    #[error("Tag opened at byte {offset} is never closed")]
    UnterminatedTag { offset: usize },
}

/// One top-level element of a component file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Element name, as written.
    pub tag: String,
    /// Attributes in source order. Valueless attributes map to `None`.
    pub attrs: IndexMap<String, Option<String>>,
    /// Text between the opening and the closing tag.
    pub content: ByteSpan,
    /// The opening tag, `<` through `>`.
    pub open_tag: ByteSpan,
    /// The whole element including its closing tag.
    pub element: ByteSpan,
}

impl Block {
    /// Value of attribute `name`; `None` when absent or valueless.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).and_then(Option::as_deref)
    }

    /// Whether attribute `name` is present, with or without a value.
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// The `lang` attribute.
    #[must_use]
    pub fn lang(&self) -> Option<&str> {
        self.attr("lang")
    }

    /// The `locale` attribute, ignoring an empty one.
    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.attr("locale").filter(|locale| !locale.is_empty())
    }

    /// Blocks loaded from an external `src` are passed through untouched.
    #[must_use]
    pub fn is_translatable(&self, block_type: &str) -> bool {
        self.tag == block_type && !self.has_attr("src")
    }

    /// Body text of the block inside `source`.
    #[must_use]
    pub fn content_text<'a>(&self, source: &'a str) -> &'a str {
        self.content.slice(source).unwrap_or_default()
    }
}

/// Every top-level block of one file, ordered by byte offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptor {
    /// Blocks in source order.
    pub blocks: Vec<Block>,
}

impl Descriptor {
    /// Descriptor over `blocks`, sorted by position.
    #[must_use]
    pub fn new(mut blocks: Vec<Block>) -> Self {
        blocks.sort_by_key(|block| block.element.start);
        Self { blocks }
    }

    /// Blocks holding messages.
    pub fn translatable<'a>(&'a self, block_type: &'a str) -> impl Iterator<Item = &'a Block> {
        self.blocks.iter().filter(move |block| block.is_translatable(block_type))
    }

    /// Every other block, left as is on write.
    pub fn opaque<'a>(&'a self, block_type: &'a str) -> impl Iterator<Item = &'a Block> {
        self.blocks.iter().filter(move |block| !block.is_translatable(block_type))
    }
}

/// Splits a component file into blocks.
///
/// Offsets must refer to the exact `source` passed in.
pub trait DescriptorProvider: Send + Sync + Debug {
    /// # Errors
    /// Returns an error when the block structure cannot be determined.
    fn parse(&self, source: &str, path: &Path) -> Result<Descriptor, SyntaxError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    /// Block with the given attributes starting at `start`.
    fn block(tag: &str, attrs: &[(&str, Option<&str>)], start: usize) -> Block {
        Block {
            tag: tag.to_string(),
            attrs: attrs.iter().map(|(k, v)| ((*k).to_string(), v.map(str::to_string))).collect(),
            content: ByteSpan::new(start + 1, start + 2),
            open_tag: ByteSpan::new(start, start + 1),
            element: ByteSpan::new(start, start + 3),
        }
    }

    #[rstest]
    #[case::plain(&[], true)]
    #[case::with_locale(&[("locale", Some("en"))], true)]
    #[case::external_src(&[("src", Some("./en.json"))], false)]
    #[case::valueless_src(&[("src", None)], false)]
    fn test_is_translatable(#[case] attrs: &[(&str, Option<&str>)], #[case] expected: bool) {
        assert_eq!(block("i18n", attrs, 0).is_translatable("i18n"), expected);
    }

    #[googletest::test]
    fn test_other_tags_are_opaque() {
        let descriptor = Descriptor::new(vec![
            block("script", &[], 10),
            block("i18n", &[], 0),
            block("template", &[], 5),
        ]);

        let translatable: Vec<_> = descriptor.translatable("i18n").map(|b| b.tag.clone()).collect();
        let opaque: Vec<_> = descriptor.opaque("i18n").map(|b| b.tag.clone()).collect();

        expect_that!(translatable, elements_are![eq("i18n")]);
        expect_that!(opaque, elements_are![eq("template"), eq("script")]);
    }

    #[googletest::test]
    fn test_empty_locale_is_ignored() {
        let block = block("i18n", &[("locale", Some("")), ("lang", Some("yaml"))], 0);

        expect_that!(block.locale(), none());
        assert_eq!(block.lang(), Some("yaml"));
    }
}
