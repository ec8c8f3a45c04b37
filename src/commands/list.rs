//! `list`: keys defined in the main locale but missing or empty in others.

use std::fmt;

use clap::Args;

use super::targets::{
    LocaleTargets,
    read_locale_files,
};
use super::{
    CommandError,
    Context,
    Report,
    write_text,
};
use crate::ir::message::format_path;
use crate::ir::{
    Message,
    MessageTree,
    PathSegment,
};
use crate::syntax::format::to_json_pretty;
use crate::types::Locale;

/// Arguments of `list`.
#[derive(Debug, Clone, Args)]
pub struct ListCommand {
    /// Main locale the others are checked against
    #[arg(short, long)]
    pub locale: Locale,

    /// Locale files to check.
    #[command(flatten)]
    pub targets: LocaleTargets,

    /// Fill undefined keys with an empty string and rewrite the files
    #[arg(short, long)]
    pub define: bool,

    /// Indent of rewritten files
    #[arg(short, long, default_value_t = 2)]
    pub indent: usize,
}

/// A key of the main locale that another locale lacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Undefined {
    /// Locale lacking the key.
    pub locale: Locale,
    /// Dot-joined key path.
    pub key: String,
}

/// Outcome of `list`.
#[derive(Debug, Default)]
pub struct ListReport {
    /// Missing keys, by locale then key.
    pub undefined: Vec<Undefined>,
    /// Whether the missing keys were filled in.
    pub defined: bool,
}

impl fmt::Display for ListReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.undefined {
            writeln!(f, "{}: '{}' undefined", entry.locale, entry.key)?;
        }
        if !self.undefined.is_empty() && !self.defined {
            writeln!(
                f,
                "There are undefined fields in the target locale messages, you can define with --define option"
            )?;
        }
        Ok(())
    }
}

impl Report for ListReport {
    fn exit_code(&self) -> i32 {
        i32::from(!self.undefined.is_empty() && !self.defined)
    }
}

/// Finds main-locale leaves that are missing or blank in every other locale.
/// With `define`, those keys are set to `""` in `tree`.
pub fn find_undefined(tree: &mut MessageTree, main: &str, define: bool) -> Option<Vec<Undefined>> {
    let main_paths: Vec<Vec<PathSegment>> =
        tree.get(main)?.leaves().into_iter().map(|(path, _)| path).collect();

    let mut undefined = Vec::new();
    for (locale, message) in tree.iter_mut() {
        if locale == main {
            continue;
        }
        for path in &main_paths {
            if message.get_path(path).is_some_and(|value| !value.is_blank()) {
                continue;
            }
            undefined.push(Undefined { locale: locale.clone(), key: format_path(path, ".") });
            if define {
                message.set_path(path, Message::Text(String::new()));
            }
        }
    }
    Some(undefined)
}

impl ListCommand {
    /// Compares every locale with the main one.
    pub async fn execute(self, context: &Context) -> Result<ListReport, CommandError> {
        let files = self.targets.resolve(context, None)?;
        let mut tree = read_locale_files(&files).await?;

        let undefined = find_undefined(&mut tree, &self.locale, self.define)
            .ok_or_else(|| CommandError::MainLocaleNotFound(self.locale.clone()))?;

        if self.define {
            for file in files.iter().filter(|file| file.locale != self.locale) {
                if !undefined.iter().any(|entry| entry.locale == file.locale) {
                    continue;
                }
                let Some(message) = tree.get(&file.locale) else {
                    continue;
                };
                let mut content = to_json_pretty(message, self.indent)?;
                content.push('\n');
                write_text(&file.path, &content).await?;
                tracing::info!(path = %file.path.display(), "Defined missing keys");
            }
        }

        Ok(ListReport { undefined, defined: self.define })
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
    fn test_find_undefined_reports_missing_and_blank() {
        let mut messages = tree(json!({
            "en": {"a": "A", "b": {"c": "C", "d": "D"}},
            "ja": {"a": "あ", "b": {"c": ""}}
        }));

        let undefined = find_undefined(&mut messages, "en", false).unwrap();

        let keys: Vec<_> = undefined.iter().map(|u| format!("{}:{}", u.locale, u.key)).collect();
        expect_that!(keys, elements_are![eq("ja:b.c"), eq("ja:b.d")]);
        expect_that!(messages["ja"].get_path(&[PathSegment::Key("b".into()), PathSegment::Key("d".into())]), none());
    }

    #[googletest::test]
    fn test_find_undefined_defines_empty_strings() {
        let mut messages = tree(json!({"en": {"a": "A", "b": "B"}, "ja": {"a": "あ"}}));

        find_undefined(&mut messages, "en", true).unwrap();

        assert_eq!(messages, tree(json!({"en": {"a": "A", "b": "B"}, "ja": {"a": "あ", "b": ""}})));
    }

    #[googletest::test]
    fn test_missing_main_locale() {
        let mut messages = tree(json!({"ja": {"a": "あ"}}));

        assert_that!(find_undefined(&mut messages, "en", false), none());
    }

    #[googletest::test]
    fn test_exit_code() {
        let entry = Undefined { locale: "ja".to_string(), key: "a".to_string() };

        expect_that!(ListReport { undefined: vec![entry.clone()], defined: false }.exit_code(), eq(1));
        expect_that!(ListReport { undefined: vec![entry], defined: true }.exit_code(), eq(0));
        expect_that!(ListReport::default().exit_code(), eq(0));
    }
}
