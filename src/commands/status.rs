//! `status`: translation progress per locale.

use std::fmt;

use clap::Args;

use super::{
    CommandError,
    Context,
    ProviderArgs,
    Report,
};
use crate::provider::TranslationStatus;
use crate::types::Locale;

/// Arguments of `status`.
#[derive(Debug, Clone, Args)]
pub struct StatusCommand {
    /// Provider to query.
    #[command(flatten)]
    pub provider: ProviderArgs,

    /// Locales to report, comma separated; all when omitted
    #[arg(short, long, value_delimiter = ',')]
    pub locales: Vec<Locale>,
}

/// Outcome of `status`.
#[derive(Debug)]
pub struct StatusReport {
    /// Progress per locale.
    pub statuses: Vec<TranslationStatus>,
}

impl StatusReport {
    /// Whether every locale is fully translated.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.statuses.iter().all(|status| status.percentage >= 100)
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.statuses.iter().map(|status| status.locale.len()).max().unwrap_or(0).max(6);
        writeln!(f, "{:<width$} | percentage", "locale")?;
        writeln!(f, "{}-+-----------", "-".repeat(width))?;
        for status in &self.statuses {
            writeln!(f, "{:<width$} | {:>9}%", status.locale, status.percentage)?;
        }
        if !self.is_complete() {
            writeln!(f, "Translation work in progress")?;
        }
        Ok(())
    }
}

impl Report for StatusReport {
    fn exit_code(&self) -> i32 {
        i32::from(!self.is_complete())
    }
}

impl StatusCommand {
    /// Fetches the translation status of the requested locales.
    pub async fn execute(self, context: &Context) -> Result<StatusReport, CommandError> {
        let provider = self.provider.connect(context).await?;
        let statuses = provider.status(self.locales).await?;
        tracing::debug!(?statuses, "Translation status");
        Ok(StatusReport { statuses })
    }
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    /// Status of `locale`.
    fn status(locale: &str, percentage: u32) -> TranslationStatus {
        TranslationStatus { locale: locale.to_string(), percentage }
    }

    #[googletest::test]
    fn test_table_and_exit_code() {
        let report = StatusReport { statuses: vec![status("en", 100), status("ja", 50)] };

        let table = report.to_string();

        expect_that!(table, contains_substring("en     |       100%"));
        expect_that!(table, contains_substring("ja     |        50%"));
        expect_that!(table, contains_substring("Translation work in progress"));
        expect_that!(report.exit_code(), eq(1));
    }

    #[googletest::test]
    fn test_complete() {
        let report = StatusReport { statuses: vec![status("en", 100)] };

        expect_that!(report.exit_code(), eq(0));
        expect_that!(report.to_string(), not(contains_substring("in progress")));
    }
}
