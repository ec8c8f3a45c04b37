//! `squeeze`: component blocks (and bundle files) → canonical message file.

use std::fmt;
use std::path::PathBuf;

use clap::Args;

use super::{
    CommandError,
    Context,
    Report,
};
use crate::bundle::{
    merge_bundles,
    read_bundles,
};
use crate::indexer::expand_patterns;
use crate::input::messages::write_messages;
use crate::ir::merge_trees;
use crate::squeeze::{
    flatten_table,
    squeeze,
};
use crate::syntax::sfc::SfcScanner;
use crate::types::Locale;

/// Arguments of `squeeze`.
#[derive(Debug, Clone, Args)]
pub struct SqueezeCommand {
    /// Directory of the components; the hierarchy of every file is relative to it
    #[arg(short, long, default_value = ".")]
    pub target: PathBuf,

    /// Output file, or directory with `--split`
    #[arg(short, long, default_value = "messages.json")]
    pub output: PathBuf,

    /// Write one `<locale>.json` per locale
    #[arg(short, long)]
    pub split: bool,

    /// Globs of bundle files merged into the output, comma separated
    #[arg(long, value_delimiter = ',')]
    pub bundle_with: Vec<String>,

    /// Expression decoding the locale and file name of a bundle path
    #[arg(long)]
    pub bundle_match: Option<String>,

    /// Namespace dictionary file for bundles
    #[arg(long)]
    pub namespace: Option<PathBuf>,

    /// Extra ignore file applied while finding components
    #[arg(long)]
    pub ignore_path: Option<PathBuf>,
}

/// Outcome of `squeeze`.
#[derive(Debug, Default)]
pub struct SqueezeReport {
    /// Number of components squeezed.
    pub components: usize,
    /// Number of bundle files merged.
    pub bundles: usize,
    /// Locales of the output.
    pub locales: Vec<Locale>,
    /// Files written.
    pub written: Vec<PathBuf>,
    /// Files skipped under `onError: continue`, with the reason.
    pub skipped: Vec<String>,
}

impl fmt::Display for SqueezeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for reason in &self.skipped {
            writeln!(f, "skipped: {reason}")?;
        }
        writeln!(
            f,
            "squeezed {} component(s) and {} bundle(s), locales: {}",
            self.components,
            self.bundles,
            self.locales.join(", ")
        )?;
        for path in &self.written {
            writeln!(f, "write {}", path.display())?;
        }
        Ok(())
    }
}

impl Report for SqueezeReport {}

impl SqueezeCommand {
    /// Squeezes the components under `target`, merges the bundles and writes the output.
    pub async fn execute(self, context: &Context) -> Result<SqueezeReport, CommandError> {
        let settings = context.settings_with(|settings| {
            if !self.bundle_with.is_empty() {
                settings.bundle.patterns.clone_from(&self.bundle_with);
            }
            if self.bundle_match.is_some() {
                settings.bundle.match_pattern.clone_from(&self.bundle_match);
            }
            if self.namespace.is_some() {
                settings.bundle.namespace_file.clone_from(&self.namespace);
            }
            if self.ignore_path.is_some() {
                settings.ignore_file.clone_from(&self.ignore_path);
            }
        })?;

        let base = context.resolve(&self.target);
        let sources = context.load_sources(&base, &settings).await?;
        let squeezed = squeeze(&base, &sources, &SfcScanner, &settings.block_type, settings.on_error)?;
        let mut tree = flatten_table(&squeezed.table);

        let mut bundles = 0;
        if !settings.bundle.patterns.is_empty() {
            let (matcher, namespaces) = context.bundle_tools(&settings).await?;
            let targets = expand_patterns(&context.root, &settings.bundle.patterns)?;
            let files = read_bundles(&targets).await?;
            bundles = files.len();
            merge_trees(&mut tree, merge_bundles(&files, &matcher, &namespaces));
        }

        let output = context.resolve(&self.output);
        let written = write_messages(&tree, &output, self.split, &settings.format_options()).await?;
        tracing::info!(components = squeezed.table.components.len(), bundles, "Squeezed");

        Ok(SqueezeReport {
            components: squeezed.table.components.len(),
            bundles,
            locales: tree.keys().cloned().collect(),
            written,
            skipped: squeezed.failures.iter().map(ToString::to_string).collect(),
        })
    }
}
