//! Top-level block scanner for single-file components.
//!
//! Only the outermost elements are reported. Their inner markup is never
//! interpreted, except that nested `<template>` elements are balanced so the
//! outer template ends at the right closing tag.

use std::path::Path;

use indexmap::IndexMap;

use super::{
    Block,
    Descriptor,
    DescriptorProvider,
    SyntaxError,
};
use crate::types::ByteSpan;

/// Built-in [`DescriptorProvider`] for `.vue`-style component files.
#[derive(Debug, Clone, Copy, Default)]
pub struct SfcScanner;

impl DescriptorProvider for SfcScanner {
    fn parse(&self, source: &str, path: &Path) -> Result<Descriptor, SyntaxError> {
        let blocks = Scanner::new(source).scan()?;
        tracing::debug!(path = %path.display(), blocks = blocks.len(), "Scanned component");
        Ok(Descriptor::new(blocks))
    }
}

/// A parsed opening tag.
struct OpenTag {
    /// Lowercased element name.
    name: String,
    /// Attributes in source order.
    attrs: IndexMap<String, Option<String>>,
    /// Byte offset just past `>`.
    end: usize,
    /// Written as `<tag ... />`.
    self_closing: bool,
}

/// Byte-level reader of the top level of a component file.
struct Scanner<'a> {
    /// Original text.
    source: &'a str,
    /// `source` as bytes.
    bytes: &'a [u8],
    /// ASCII-lowercased copy; byte offsets are identical to `source`.
    lower: String,
}

impl<'a> Scanner<'a> {
    /// Scanner over `source`.
    fn new(source: &'a str) -> Self {
        Self { source, bytes: source.as_bytes(), lower: source.to_ascii_lowercase() }
    }

    /// Byte at `at`, if any.
    fn byte(&self, at: usize) -> Option<u8> {
        self.bytes.get(at).copied()
    }

    /// Case-insensitive search for `needle` from `from`.
    fn find(&self, needle: &str, from: usize) -> Option<usize> {
        self.lower.get(from..).and_then(|rest| rest.find(needle)).map(|i| i + from)
    }

    /// Case-insensitive prefix test at `at`.
    fn starts_with(&self, at: usize, prefix: &str) -> bool {
        self.lower.get(at..).is_some_and(|rest| rest.starts_with(prefix))
    }

    /// Every top-level element, in source order.
    fn scan(&self) -> Result<Vec<Block>, SyntaxError> {
        let mut blocks = Vec::new();
        let mut pos = 0;

        while let Some(lt) = self.find("<", pos) {
            if self.starts_with(lt, "<!--") {
                pos = self.skip_comment(lt)?;
                continue;
            }
            if self.starts_with(lt, "</") || self.starts_with(lt, "<!") || self.starts_with(lt, "<?")
            {
                // stray closing tags, doctypes and processing instructions
                pos = self.find(">", lt).map_or(self.bytes.len(), |gt| gt + 1);
                continue;
            }
            if !self.byte(lt + 1).is_some_and(|b| b.is_ascii_alphabetic()) {
                pos = lt + 1;
                continue;
            }

            let open = self.open_tag(lt)?;
            let block = if open.self_closing {
                Block {
                    tag: open.name,
                    attrs: open.attrs,
                    content: ByteSpan::new(open.end, open.end),
                    open_tag: ByteSpan::new(lt, open.end),
                    element: ByteSpan::new(lt, open.end),
                }
            } else {
                let (close_start, close_end) = self.close_tag(&open.name, open.end).ok_or_else(|| {
                    SyntaxError::UnclosedBlock { tag: open.name.clone(), offset: lt }
                })?;
                Block {
                    tag: open.name,
                    attrs: open.attrs,
                    content: ByteSpan::new(open.end, close_start),
                    open_tag: ByteSpan::new(lt, open.end),
                    element: ByteSpan::new(lt, close_end),
                }
            };
            pos = block.element.end;
            blocks.push(block);
        }

        Ok(blocks)
    }

    /// Offset just past the end of the comment opened at `lt`.
    fn skip_comment(&self, lt: usize) -> Result<usize, SyntaxError> {
        self.find("-->", lt + 4)
            .map(|end| end + 3)
            .ok_or(SyntaxError::UnterminatedComment { offset: lt })
    }

    /// Parses the opening tag starting at `lt`.
    fn open_tag(&self, lt: usize) -> Result<OpenTag, SyntaxError> {
        let unterminated = SyntaxError::UnterminatedTag { offset: lt };
        let mut pos = lt + 1;
        while self.byte(pos).is_some_and(is_name_byte) {
            pos += 1;
        }
        let name = self.source.get(lt + 1..pos).unwrap_or_default().to_ascii_lowercase();
        let mut attrs = IndexMap::new();

        loop {
            while self.byte(pos).is_some_and(|b| b.is_ascii_whitespace()) {
                pos += 1;
            }
            match self.byte(pos) {
                None => return Err(unterminated),
                Some(b'>') => {
                    return Ok(OpenTag { name, attrs, end: pos + 1, self_closing: false });
                }
                Some(b'/') if self.byte(pos + 1) == Some(b'>') => {
                    return Ok(OpenTag { name, attrs, end: pos + 2, self_closing: true });
                }
                Some(_) => {}
            }

            let name_start = pos;
            while self
                .byte(pos)
                .is_some_and(|b| !b.is_ascii_whitespace() && !matches!(b, b'=' | b'>' | b'/'))
            {
                pos += 1;
            }
            if pos == name_start {
                // lone '/' or '=' inside the tag
                pos += 1;
                continue;
            }
            let attr_name = self.source.get(name_start..pos).unwrap_or_default().to_string();

            let mut after = pos;
            while self.byte(after).is_some_and(|b| b.is_ascii_whitespace()) {
                after += 1;
            }
            if self.byte(after) != Some(b'=') {
                attrs.insert(attr_name, None);
                continue;
            }
            pos = after + 1;
            while self.byte(pos).is_some_and(|b| b.is_ascii_whitespace()) {
                pos += 1;
            }

            let value = match self.byte(pos) {
                None => return Err(unterminated),
                Some(quote @ (b'"' | b'\'')) => {
                    let value_start = pos + 1;
                    let close = self
                        .bytes
                        .get(value_start..)
                        .and_then(|rest| rest.iter().position(|&b| b == quote))
                        .map(|i| i + value_start)
                        .ok_or(SyntaxError::UnterminatedTag { offset: lt })?;
                    pos = close + 1;
                    self.source.get(value_start..close)
                }
                Some(_) => {
                    let value_start = pos;
                    while self.byte(pos).is_some_and(|b| !b.is_ascii_whitespace() && b != b'>') {
                        pos += 1;
                    }
                    self.source.get(value_start..pos)
                }
            };
            attrs.insert(attr_name, Some(value.unwrap_or_default().to_string()));
        }
    }

    /// Finds the closing tag for `name`, returning the offset of its `<` and
    /// the offset just past its `>`.
    fn close_tag(&self, name: &str, from: usize) -> Option<(usize, usize)> {
        let close = format!("</{name}");
        let open = format!("<{name}");
        let nests = name == "template";
        let mut depth = 0usize;
        let mut pos = from;

        loop {
            let lt = self.find("<", pos)?;
            if nests && self.starts_with(lt, "<!--") {
                pos = self.find("-->", lt + 4).map(|end| end + 3)?;
                continue;
            }
            if self.starts_with(lt, &close) && self.ends_name(lt + close.len()) {
                let gt = self.find(">", lt)?;
                if depth == 0 {
                    return Some((lt, gt + 1));
                }
                depth -= 1;
                pos = gt + 1;
                continue;
            }
            if nests && self.starts_with(lt, &open) && self.ends_name(lt + open.len()) {
                let gt = self.find(">", lt)?;
                if self.byte(gt.saturating_sub(1)) != Some(b'/') {
                    depth += 1;
                }
                pos = gt + 1;
                continue;
            }
            pos = lt + 1;
        }
    }

    /// Whether the element name ends at `at`.
    fn ends_name(&self, at: usize) -> bool {
        self.byte(at).is_none_or(|b| !is_name_byte(b))
    }
}

/// Bytes allowed in tag names.
const fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.')
}
