//! `infuse`: canonical message file → component blocks (and bundle files).

use std::fmt;
use std::path::PathBuf;

use clap::Args;

use super::{
    CommandError,
    Context,
    Report,
    write_text,
};
use crate::bundle::{
    BundleSplit,
    split_bundles,
    write_bundles,
};
use crate::indexer::expand_patterns;
use crate::infuse::{
    InfuseOptions,
    infuse,
};
use crate::input::messages::{
    locale_matcher,
    read_messages,
};
use crate::reconcile::ReconcileReport;
use crate::syntax::sfc::SfcScanner;

/// Arguments of `infuse`.
#[derive(Debug, Clone, Args)]
pub struct InfuseCommand {
    /// Directory of the components; the hierarchy of every file is relative to it
    #[arg(short, long, default_value = ".")]
    pub target: PathBuf,

    /// Canonical message file, or a directory of per-locale files
    #[arg(short, long)]
    pub locales: PathBuf,

    /// Expression extracting the locale from file names in a `--locales` directory
    #[arg(short, long = "match")]
    pub match_pattern: Option<String>,

    /// Globs of bundle files to write messages back to, comma separated
    #[arg(long, value_delimiter = ',')]
    pub unbundle_to: Vec<String>,

    /// Expression decoding the locale and file name of a bundle path
    #[arg(long)]
    pub unbundle_match: Option<String>,

    /// Namespace dictionary file for bundles
    #[arg(long)]
    pub namespace: Option<PathBuf>,

    /// Extra ignore file applied while finding components
    #[arg(long)]
    pub ignore_path: Option<PathBuf>,

    /// Report what would change without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Remove blocks and keys of locales missing from the message file
    #[arg(long)]
    pub allow_prune: bool,
}

/// Outcome of `infuse`.
#[derive(Debug, Default)]
pub struct InfuseReport {
    /// Whether the run wrote nothing.
    pub dry_run: bool,
    /// Components whose text changed.
    pub changed: Vec<PathBuf>,
    /// Number of components left as they were.
    pub unchanged: usize,
    /// Bundle files written.
    pub bundles: Vec<PathBuf>,
    /// Reconcile outcome per component.
    pub reports: Vec<ReconcileReport>,
    /// Files skipped under `onError: continue`, with the reason.
    pub skipped: Vec<String>,
}

impl InfuseReport {
    /// Files that kept locales missing from the message file.
    pub fn stale(&self) -> impl Iterator<Item = &ReconcileReport> {
        self.reports.iter().filter(|report| !report.stale.is_empty())
    }
}

impl fmt::Display for InfuseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.dry_run { "would write" } else { "write" };
        for path in self.changed.iter().chain(&self.bundles) {
            writeln!(f, "{verb} {}", path.display())?;
        }
        for report in self.stale() {
            let action = if report.pruned.is_empty() { "stale" } else { "pruned" };
            writeln!(f, "{action} locale(s) in {}: {}", report.path.display(), report.stale.join(", "))?;
        }
        for reason in &self.skipped {
            writeln!(f, "skipped: {reason}")?;
        }
        writeln!(f, "infused {} file(s), {} unchanged", self.changed.len(), self.unchanged)
    }
}

impl Report for InfuseReport {}

impl InfuseCommand {
    /// Writes the message file back into the components and bundles.
    pub async fn execute(self, context: &Context) -> Result<InfuseReport, CommandError> {
        let settings = context.settings_with(|settings| {
            if !self.unbundle_to.is_empty() {
                settings.bundle.patterns.clone_from(&self.unbundle_to);
            }
            if self.unbundle_match.is_some() {
                settings.bundle.match_pattern.clone_from(&self.unbundle_match);
            }
            if self.namespace.is_some() {
                settings.bundle.namespace_file.clone_from(&self.namespace);
            }
            if self.ignore_path.is_some() {
                settings.ignore_file.clone_from(&self.ignore_path);
            }
            settings.allow_prune |= self.allow_prune;
        })?;

        let matcher = locale_matcher(self.match_pattern.as_deref())?;
        let tree = read_messages(&context.resolve(&self.locales), &matcher).await?;

        let split = if settings.bundle.patterns.is_empty() {
            BundleSplit { embeddable: tree, external: Vec::new() }
        } else {
            let (matcher, namespaces) = context.bundle_tools(&settings).await?;
            let targets = expand_patterns(&context.root, &settings.bundle.patterns)?;
            split_bundles(&tree, &targets, &matcher, &namespaces)
        };

        let base = context.resolve(&self.target);
        let sources = context.load_sources(&base, &settings).await?;
        let options = InfuseOptions {
            block_type: settings.block_type.clone(),
            format: settings.format_options(),
            reconcile: settings.reconcile_options(),
            on_error: settings.on_error,
        };
        let infused = infuse(&base, &sources, &SfcScanner, &split.embeddable, &options)?;

        let mut report = InfuseReport { dry_run: self.dry_run, ..InfuseReport::default() };
        for file in infused.files {
            for locale in &file.report.stale {
                tracing::warn!(path = %file.path.display(), %locale, "Locale is not in the message file");
            }
            if file.changed {
                if !self.dry_run {
                    write_text(&file.path, &file.content).await?;
                }
                report.changed.push(file.path);
            } else {
                report.unchanged += 1;
            }
            report.reports.push(file.report);
        }
        if !self.dry_run {
            write_bundles(&split.external, &options.format).await?;
        }
        report.bundles = split.external.into_iter().map(|write| write.path).collect();
        report.skipped =
            infused.failures.iter().map(|(path, e)| format!("{}: {e}", path.display())).collect();

        Ok(report)
    }
}
