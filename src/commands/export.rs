//! `export`: localization service → `<output>/<locale>.<format>`.

use std::fmt;
use std::path::PathBuf;

use clap::Args;

use super::{
    CommandError,
    Context,
    ProviderArgs,
    Report,
    write_text,
};
use crate::types::Locale;

/// Arguments of `export`.
#[derive(Debug, Clone, Args)]
pub struct ExportCommand {
    /// Provider to export from.
    #[command(flatten)]
    pub provider: ProviderArgs,

    /// Directory receiving the exported files
    #[arg(short, long)]
    pub output: PathBuf,

    /// Locales to export, comma separated; all when omitted
    #[arg(short, long, value_delimiter = ',')]
    pub locales: Vec<Locale>,

    /// Format requested from the service
    #[arg(short, long, default_value = "json")]
    pub format: String,

    /// Export without writing files
    #[arg(short, long)]
    pub dry_run: bool,
}

/// Files written by `export`.
#[derive(Debug)]
pub struct ExportReport {
    /// Locale and destination of each exported file.
    pub written: Vec<(Locale, PathBuf)>,
    /// Whether the run wrote nothing.
    pub dry_run: bool,
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (locale, path) in &self.written {
            writeln!(f, "write '{locale}' messages to {}", path.display())?;
        }
        let suffix = if self.dry_run { " (dry run)" } else { "" };
        writeln!(f, "export success{suffix}")
    }
}

impl Report for ExportReport {}

impl ExportCommand {
    /// Fetches raw files from the service and writes them to `output`.
    pub async fn execute(self, context: &Context) -> Result<ExportReport, CommandError> {
        let provider = self.provider.connect(context).await?;
        let messages = provider.export(self.locales, self.format, self.dry_run).await?;
        let output = context.resolve(&self.output);

        let mut written = Vec::with_capacity(messages.len());
        for raw in messages {
            let path = output.join(format!("{}.{}", raw.locale, raw.format));
            if !self.dry_run {
                write_text(&path, &raw.data).await?;
            }
            written.push((raw.locale, path));
        }

        Ok(ExportReport { written, dry_run: self.dry_run })
    }
}
