//! `push`: local locale messages → localization service.

use std::fmt;

use clap::Args;

use super::targets::{
    LocaleTargets,
    read_locale_files,
};
use super::{
    CommandError,
    Context,
    ProviderArgs,
    Report,
};
use crate::provider::{
    PushFile,
    PushMode,
    PushResource,
};
use crate::types::Locale;

/// Arguments of `push`.
#[derive(Debug, Clone, Args)]
pub struct PushCommand {
    /// Provider to push to.
    #[command(flatten)]
    pub provider: ProviderArgs,

    /// Locale files to push.
    #[command(flatten)]
    pub targets: LocaleTargets,

    /// Locale of the single `--target` file
    #[arg(short, long)]
    pub locale: Option<Locale>,

    /// Run without applying anything to the service
    #[arg(short, long)]
    pub dry_run: bool,
}

/// Outcome of `push`.
#[derive(Debug)]
pub struct PushReport {
    /// Name of the provider.
    pub provider: String,
    /// Locales pushed.
    pub locales: Vec<Locale>,
    /// Whether the service was left untouched.
    pub dry_run: bool,
}

impl fmt::Display for PushReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = if self.dry_run { " (dry run)" } else { "" };
        writeln!(f, "push success to '{}': {}{suffix}", self.provider, self.locales.join(", "))
    }
}

impl Report for PushReport {}

impl PushCommand {
    /// Reads the locale files and pushes them in the provider's push mode.
    pub async fn execute(self, context: &Context) -> Result<PushReport, CommandError> {
        let configuration = self.provider.configuration(context).await?;
        let mode = configuration.push_mode;
        let provider = context.providers.create(&self.provider.provider, configuration)?;
        let files = self.targets.resolve(context, self.locale.as_deref())?;
        let locales: Vec<Locale> = files.iter().map(|file| file.locale.clone()).collect();

        let resource = match mode {
            PushMode::FilePath => PushResource {
                mode: PushMode::FilePath,
                files: files.into_iter().map(|file| PushFile { locale: file.locale, path: file.path }).collect(),
                normalize: self.provider.normalize,
                ..PushResource::default()
            },
            PushMode::LocaleMessage => PushResource {
                mode: PushMode::LocaleMessage,
                messages: read_locale_files(&files).await?,
                normalize: self.provider.normalize,
                ..PushResource::default()
            },
        };

        provider.push(resource, self.dry_run).await?;
        Ok(PushReport { provider: provider.name().to_string(), locales, dry_run: self.dry_run })
    }
}
