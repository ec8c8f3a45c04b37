//! `diff`: local locale messages against the localization service.

use std::fmt;

use clap::Args;

use super::targets::{
    LocaleTargets,
    read_locale_files,
};
use super::{
    CommandError,
    Context,
    EXIT_DIFFERENCES,
    ProviderArgs,
    Report,
};
use crate::ir::{
    Message,
    MessageTree,
    Patch,
    diff,
};
use crate::provider::{
    PullResource,
    normalize_tree,
};
use crate::types::Locale;

/// Arguments of `diff`.
#[derive(Debug, Clone, Args)]
pub struct DiffCommand {
    /// Provider to compare against.
    #[command(flatten)]
    pub provider: ProviderArgs,

    /// Local locale files.
    #[command(flatten)]
    pub targets: LocaleTargets,

    /// Locale of the single `--target` file
    #[arg(short, long)]
    pub locale: Option<Locale>,
}

/// Differences per locale.
#[derive(Debug, Default)]
pub struct DiffReport {
    /// Changes turning the local messages into the service messages.
    pub patches: Vec<(Locale, Patch)>,
}

impl DiffReport {
    /// Whether any locale differs.
    #[must_use]
    pub fn has_differences(&self) -> bool {
        self.patches.iter().any(|(_, patch)| !patch.is_empty())
    }
}

impl fmt::Display for DiffReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (locale, patch) in self.patches.iter().filter(|(_, patch)| !patch.is_empty()) {
            writeln!(f, "{locale}:")?;
            for op in patch.ops() {
                writeln!(f, "  {}", op.describe("."))?;
            }
        }
        if self.has_differences() {
            writeln!(f, "There are differences!")
        } else {
            writeln!(f, "No differences")
        }
    }
}

impl Report for DiffReport {
    fn exit_code(&self) -> i32 {
        if self.has_differences() { EXIT_DIFFERENCES } else { 0 }
    }
}

/// Per-locale patches over the union of locales, local locales first.
#[must_use]
pub fn diff_trees(local: &MessageTree, service: &MessageTree) -> Vec<(Locale, Patch)> {
    let missing = Message::Null;
    local
        .keys()
        .chain(service.keys().filter(|locale| !local.contains_key(*locale)))
        .map(|locale| {
            let old = local.get(locale).unwrap_or(&missing);
            let new = service.get(locale).unwrap_or(&missing);
            (locale.clone(), diff(old, new))
        })
        .collect()
}

impl DiffCommand {
    /// Compares the local files with what the service returns for their locales.
    pub async fn execute(self, context: &Context) -> Result<DiffReport, CommandError> {
        let provider = self.provider.connect(context).await?;
        let files = self.targets.resolve(context, self.locale.as_deref())?;
        let local = read_locale_files(&files).await?;

        let normalize = self.provider.normalize;
        let locales: Vec<Locale> = local.keys().cloned().collect();
        let service = provider.pull(PullResource { locales, normalize }, false).await?;

        Ok(DiffReport { patches: diff_trees(&normalize_tree(normalize, local), &service) })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::test_utils::tree;

    #[googletest::test]
    fn test_diff_trees() {
        let local = tree(json!({"en": {"a": "A", "b": "B"}, "ja": {"a": "あ"}}));
        let service = tree(json!({"en": {"a": "A2", "b": "B"}, "ja": {"a": "あ"}}));

        let report = DiffReport { patches: diff_trees(&local, &service) };

        expect_that!(report.patches.len(), eq(2));
        expect_that!(report.patches[1].1.is_empty(), eq(true));
        expect_that!(report.to_string(), contains_substring("en:\n  ~ a: \"A\" -> \"A2\"\n"));
        expect_that!(report.exit_code(), eq(EXIT_DIFFERENCES));
    }

    #[googletest::test]
    fn test_no_differences() {
        let local = tree(json!({"en": {"a": "A"}}));

        let report = DiffReport { patches: diff_trees(&local, &local.clone()) };

        expect_that!(report.exit_code(), eq(0));
        expect_that!(report.to_string(), eq("No differences\n"));
    }
}
