//! `import`: raw locale message files → localization service.

use std::fmt;

use clap::Args;

use super::targets::LocaleTargets;
use super::{
    CommandError,
    Context,
    ProviderArgs,
    Report,
};
use crate::input::InputError;
use crate::provider::RawLocaleMessage;
use crate::types::Locale;

/// Arguments of `import`.
#[derive(Debug, Clone, Args)]
pub struct ImportCommand {
    /// Provider to import into.
    #[command(flatten)]
    pub provider: ProviderArgs,

    /// Raw files to import.
    #[command(flatten)]
    pub targets: LocaleTargets,

    /// Locale of the single `--target` file
    #[arg(short, long)]
    pub locale: Option<Locale>,

    /// Format of files without an extension
    #[arg(short, long)]
    pub format: Option<String>,

    /// Run without applying anything to the service
    #[arg(short, long)]
    pub dry_run: bool,
}

/// Outcome of `import`.
#[derive(Debug)]
pub struct ImportReport {
    /// Locales handed to the service.
    pub imported: Vec<Locale>,
    /// Files skipped because their format is unknown.
    pub ignored: Vec<String>,
    /// Whether the service was left untouched.
    pub dry_run: bool,
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for path in &self.ignored {
            writeln!(f, "ignore {path}, due to be not specified with --format")?;
        }
        let suffix = if self.dry_run { " (dry run)" } else { "" };
        writeln!(f, "import success: {}{suffix}", self.imported.join(", "))
    }
}

impl Report for ImportReport {}

impl ImportCommand {
    /// Sends raw locale files to the service.
    pub async fn execute(self, context: &Context) -> Result<ImportReport, CommandError> {
        let provider = self.provider.connect(context).await?;
        let files = self.targets.resolve(context, self.locale.as_deref())?;

        let mut messages = Vec::with_capacity(files.len());
        let mut ignored = Vec::new();
        for file in files {
            let extension = file.path.extension().map(|ext| ext.to_string_lossy().into_owned());
            let Some(format) = extension.or_else(|| self.format.clone()) else {
                tracing::warn!(path = %file.path.display(), "No format for file");
                ignored.push(file.path.display().to_string());
                continue;
            };
            let data = tokio::fs::read_to_string(&file.path)
                .await
                .map_err(|source| InputError::Io { path: file.path.clone(), source })?;
            messages.push(RawLocaleMessage { locale: file.locale, format, data });
        }

        let imported = messages.iter().map(|raw| raw.locale.clone()).collect();
        provider.import(messages, self.dry_run).await?;
        Ok(ImportReport { imported, ignored, dry_run: self.dry_run })
    }
}
