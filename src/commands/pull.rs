//! `pull`: localization service → `<output>/<locale>.json`.

use std::fmt;
use std::path::PathBuf;

use clap::Args;

use super::{
    CommandError,
    Context,
    ProviderArgs,
    Report,
};
use crate::input::messages::write_messages;
use crate::provider::PullResource;
use crate::syntax::format::FormatOptions;
use crate::types::Locale;

/// Arguments of `pull`.
#[derive(Debug, Clone, Args)]
pub struct PullCommand {
    /// Provider to pull from.
    #[command(flatten)]
    pub provider: ProviderArgs,

    /// Directory receiving one `<locale>.json` per locale
    #[arg(short, long)]
    pub output: PathBuf,

    /// Locales to pull, comma separated; all when omitted
    #[arg(short, long, value_delimiter = ',')]
    pub locales: Vec<Locale>,

    /// Pull without writing files
    #[arg(short, long)]
    pub dry_run: bool,
}

/// Files written by `pull`.
#[derive(Debug)]
pub struct PullReport {
    /// Locale and destination of each pulled file.
    pub written: Vec<(Locale, PathBuf)>,
    /// Whether the run wrote nothing.
    pub dry_run: bool,
}

impl fmt::Display for PullReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (locale, path) in &self.written {
            writeln!(f, "write '{locale}' messages to {}", path.display())?;
        }
        let suffix = if self.dry_run { " (dry run)" } else { "" };
        writeln!(f, "pull success{suffix}")
    }
}

impl Report for PullReport {}

impl PullCommand {
    /// Pulls messages and writes one file per locale.
    pub async fn execute(self, context: &Context) -> Result<PullReport, CommandError> {
        let provider = self.provider.connect(context).await?;
        let resource = PullResource { locales: self.locales, normalize: self.provider.normalize };
        let tree = provider.pull(resource, self.dry_run).await?;
        let output = context.resolve(&self.output);

        let written = if self.dry_run {
            tree.keys().map(|locale| (locale.clone(), output.join(format!("{locale}.json")))).collect()
        } else {
            let paths = write_messages(&tree, &output, true, &FormatOptions::default()).await?;
            tree.keys().cloned().zip(paths).collect()
        };

        Ok(PullReport { written, dry_run: self.dry_run })
    }
}
