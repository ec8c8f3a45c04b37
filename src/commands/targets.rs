//! Locale message files named on the command line, either one `--target`
//! file or `--target-paths` globs whose file names encode the locale.

use std::path::{
    Path,
    PathBuf,
};

use clap::Args;
use regex::Regex;

use super::{
    CommandError,
    Context,
};
use crate::indexer::expand_patterns;
use crate::input::messages::{
    locale_matcher,
    locale_of,
};
use crate::input::InputError;
use crate::ir::{
    Message,
    MessageTree,
};
use crate::types::Locale;

/// Locale files selected on the command line.
#[derive(Debug, Clone, Default, Args)]
pub struct LocaleTargets {
    /// Locale messages file; its file name is the locale unless `--locale` is given
    #[arg(short, long)]
    pub target: Option<PathBuf>,

    /// Globs of locale messages files, comma separated
    #[arg(short = 'T', long, value_delimiter = ',')]
    pub target_paths: Vec<String>,

    /// Expression extracting the locale from a file name; required with `--target-paths`
    #[arg(short = 'm', long)]
    pub filename_match: Option<String>,
}

/// A locale messages file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleFile {
    /// Locale the file holds.
    pub locale: Locale,
    /// Absolute path.
    pub path: PathBuf,
}

/// Final component of `path`.
fn file_name(path: &Path) -> PathBuf {
    path.file_name().map(PathBuf::from).unwrap_or_default()
}

impl LocaleTargets {
    /// Files to work on. `locale` overrides the locale of a single `--target`.
    pub fn resolve(&self, context: &Context, locale: Option<&str>) -> Result<Vec<LocaleFile>, CommandError> {
        if let Some(target) = &self.target {
            let path = context.resolve(target);
            let locale = locale.map_or_else(
                || path.file_stem().map(|stem| stem.to_string_lossy().into_owned()).unwrap_or_default(),
                str::to_string,
            );
            return Ok(vec![LocaleFile { locale, path }]);
        }

        if self.target_paths.is_empty() {
            return Err(CommandError::Usage(
                "You need to specify either --target or --target-paths".to_string(),
            ));
        }
        let Some(pattern) = &self.filename_match else {
            return Err(CommandError::Usage("You need to specify together --filename-match".to_string()));
        };
        let matcher: Regex = locale_matcher(Some(pattern))?;

        let mut files = Vec::new();
        for target in expand_patterns(&context.root, &self.target_paths)? {
            match locale_of(&file_name(&target.path), &matcher) {
                Some(locale) => files.push(LocaleFile { locale, path: target.path }),
                None => tracing::warn!(
                    path = %target.path.display(),
                    pattern = %pattern,
                    "File name does not match"
                ),
            }
        }
        Ok(files)
    }
}

/// Reads every file as the messages of its locale.
pub async fn read_locale_files(files: &[LocaleFile]) -> Result<MessageTree, CommandError> {
    let mut tree = MessageTree::new();
    for file in files {
        let content = tokio::fs::read_to_string(&file.path)
            .await
            .map_err(|source| InputError::Io { path: file.path.clone(), source })?;
        let message: Message = serde_json::from_str(&content)
            .map_err(|source| InputError::Parse { path: file.path.clone(), source })?;
        tree.insert(file.locale.clone(), message);
    }
    Ok(tree)
}
