//! Writing reconciled block records back into component source text.
//!
//! Only the bodies of translatable blocks (and, when their `locale`/`lang`
//! changed, their opening tags) are regenerated. Every other byte of the
//! source is copied through unchanged.

use std::path::{
    Path,
    PathBuf,
};

use thiserror::Error;

use crate::hierarchy::resolve_hierarchy;
use crate::indexer::types::ComponentSource;
use crate::ir::{
    BlockLang,
    BlockRecord,
    FileMeta,
    MessageTree,
};
use crate::reconcile::{
    ReconcileOptions,
    ReconcileReport,
    reconcile_file,
};
use crate::squeeze::{
    ExtractError,
    extract_blocks,
};
use crate::syntax::format::{
    FormatError,
    FormatOptions,
    stringify_content,
};
use crate::syntax::{
    Block,
    Descriptor,
    DescriptorProvider,
};
use crate::types::OnError;

/// Errors rebuilding one component file.
#[derive(Error, Debug)]
pub enum InjectError {
    /// A block span does not fall on character boundaries of the source.
    #[error("Byte range {start}..{end} is not valid in the source text")]
    InvalidSpan { start: usize, end: usize },

    /// Fewer records than translatable blocks were supplied.
    #[error("Expected at least {expected} block records, got {found}")]
    MissingRecords { expected: usize, found: usize },

    /// A block body could not be serialized in its language.
    #[error("Failed to serialize block #{index}: {source}")]
    Serialize {
        index: usize,
        #[source]
        source: FormatError,
    },

    /// The current blocks could not be read back.
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Settings shared by every file of an infuse run.
#[derive(Debug, Clone)]
pub struct InfuseOptions {
    /// Tag name of the translatable blocks.
    pub block_type: String,
    /// Layout of rewritten block bodies.
    pub format: FormatOptions,
    /// How the canonical tree is matched to the blocks.
    pub reconcile: ReconcileOptions,
    /// Whether a failing file stops the run.
    pub on_error: OnError,
}

impl Default for InfuseOptions {
    fn default() -> Self {
        Self {
            block_type: "i18n".to_string(),
            format: FormatOptions::default(),
            reconcile: ReconcileOptions::default(),
            on_error: OnError::default(),
        }
    }
}

/// New text of one component file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfusedFile {
    /// Component file.
    pub path: PathBuf,
    /// Full new text.
    pub content: String,
    /// Whether `content` differs from what was read.
    pub changed: bool,
    /// Per-locale reconcile outcome of the file.
    pub report: ReconcileReport,
}

/// Result of infusing a set of files.
#[derive(Debug, Default)]
pub struct Infused {
    /// Files rebuilt, in input order.
    pub files: Vec<InfusedFile>,
    /// Files skipped under [`OnError::Continue`], with the reason.
    pub failures: Vec<(PathBuf, InjectError)>,
}

/// Checked `raw[start..end]`.
fn slice(raw: &str, start: usize, end: usize) -> Result<&str, InjectError> {
    raw.get(start..end).ok_or(InjectError::InvalidSpan { start, end })
}

/// Escapes an attribute value for a double-quoted attribute.
#[must_use]
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// Appends ` name="value"`, or ` name` for a bare attribute.
fn push_attr(out: &mut String, name: &str, value: Option<&str>) {
    out.push(' ');
    out.push_str(name);
    if let Some(value) = value {
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }
}

/// Opening tag for `record`, keeping the other attributes of `original`.
fn open_tag(block_type: &str, original: Option<&Block>, record: &BlockRecord) -> String {
    let mut tag = format!("<{block_type}");
    if let Some(original) = original {
        for (name, value) in &original.attrs {
            if name != "locale" && name != "lang" {
                push_attr(&mut tag, name, value.as_deref());
            }
        }
    }
    if let Some(locale) = &record.locale {
        push_attr(&mut tag, "locale", Some(locale));
    }
    if record.lang != BlockLang::Json {
        push_attr(&mut tag, "lang", Some(record.lang.as_str()));
    }
    tag.push('>');
    tag
}

/// Whether the original opening tag already says the right locale and lang.
fn keeps_open_tag(block: &Block, record: &BlockRecord) -> bool {
    record.locale.as_deref() == block.locale() && record.lang == BlockLang::from_attr(block.lang())
}

/// Block body of `record` in its own language.
fn serialize(record: &BlockRecord, index: usize, format: &FormatOptions) -> Result<String, InjectError> {
    stringify_content(&record.content(), record.lang, format)
        .map_err(|source| InjectError::Serialize { index, source })
}

/// Rebuilds `raw` with the translatable blocks of `descriptor` replaced by
/// `records`.
///
/// `records` pairs with the translatable blocks in order; records past the
/// last block are appended as new elements at the end of the file.
///
/// # Errors
/// Fails when a span does not fit `raw`, when there are fewer records than
/// translatable blocks, or when a record cannot be serialized.
pub fn inject(
    raw: &str,
    descriptor: &Descriptor,
    records: &[BlockRecord],
    block_type: &str,
    format: &FormatOptions,
) -> Result<String, InjectError> {
    let expected = descriptor.translatable(block_type).count();
    if records.len() < expected {
        return Err(InjectError::MissingRecords { expected, found: records.len() });
    }

    let mut out = String::with_capacity(raw.len());
    let mut cursor = 0;
    let mut index = 0;

    for block in &descriptor.blocks {
        if !block.is_translatable(block_type) {
            out.push_str(slice(raw, cursor, block.element.end)?);
            cursor = block.element.end;
            continue;
        }

        let Some(record) = records.get(index) else {
            return Err(InjectError::MissingRecords { expected, found: records.len() });
        };

        if record.pruned {
            out.push_str(slice(raw, cursor, block.element.start)?);
            cursor = block.element.end;
            if raw.get(cursor..).is_some_and(|rest| rest.starts_with('\n')) {
                cursor += 1;
            }
        } else if block.content.start == block.element.end {
            // self-closing element, expand it
            out.push_str(slice(raw, cursor, block.element.start)?);
            out.push_str(&open_tag(block_type, Some(block), record));
            out.push('\n');
            out.push_str(&serialize(record, index, format)?);
            out.push_str(&format!("</{block_type}>"));
            cursor = block.element.end;
        } else {
            if keeps_open_tag(block, record) {
                out.push_str(slice(raw, cursor, block.content.start)?);
            } else {
                out.push_str(slice(raw, cursor, block.open_tag.start)?);
                out.push_str(&open_tag(block_type, Some(block), record));
            }
            out.push('\n');
            out.push_str(&serialize(record, index, format)?);
            cursor = block.content.end;
        }
        index += 1;
    }

    out.push_str(slice(raw, cursor, raw.len())?);

    for (offset, record) in records.iter().enumerate().skip(index) {
        if record.pruned {
            continue;
        }
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&open_tag(block_type, None, record));
        out.push('\n');
        out.push_str(&serialize(record, offset, format)?);
        out.push_str(&format!("</{block_type}>\n"));
    }

    Ok(out)
}

/// Re-extracts `source`, reconciles it against `tree` and injects the result.
///
/// # Errors
/// Fails when the file cannot be extracted or the reconciled blocks cannot be
/// written back.
pub fn infuse_file(
    base: &Path,
    source: &ComponentSource,
    provider: &dyn DescriptorProvider,
    tree: &MessageTree,
    options: &InfuseOptions,
) -> Result<InfusedFile, InjectError> {
    let hierarchy = resolve_hierarchy(base, &source.path).map_err(ExtractError::from)?;
    let descriptor = provider
        .parse(&source.content, &source.path)
        .map_err(|e| ExtractError::Syntax { path: source.path.clone(), source: e })?;
    let blocks = extract_blocks(&descriptor, &source.content, &source.path, &options.block_type)?;

    let mut meta = FileMeta { path: source.path.clone(), hierarchy, blocks };
    let report = reconcile_file(&mut meta, tree, options.reconcile);
    let content =
        inject(&source.content, &descriptor, &meta.blocks, &options.block_type, &options.format)?;
    let changed = content != source.content;
    tracing::debug!(path = %source.path.display(), changed, "Infused file");

    Ok(InfusedFile { path: source.path.clone(), content, changed, report })
}

/// Infuses every file in `sources`. Files are independent; a failing file
/// never affects the output of the others.
///
/// # Errors
/// With [`OnError::Halt`] the first failing file aborts the run.
pub fn infuse(
    base: &Path,
    sources: &[ComponentSource],
    provider: &dyn DescriptorProvider,
    tree: &MessageTree,
    options: &InfuseOptions,
) -> Result<Infused, InjectError> {
    let mut infused = Infused::default();

    for source in sources {
        match infuse_file(base, source, provider, tree, options) {
            Ok(file) => infused.files.push(file),
            Err(e) if options.on_error == OnError::Continue => {
                tracing::warn!(path = %source.path.display(), error = %e, "Skipping file");
                infused.failures.push((source.path.clone(), e));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(infused)
}
