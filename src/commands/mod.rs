//! Command line interface.
//!
//! Every subcommand is a `clap` argument struct with an `execute` method that
//! runs against a [`Context`] and returns a printable [`Report`]. Nothing here
//! prints; the binary decides what to do with the report and its exit code.
//!
//! | Command   | Alias | Does |
//! |-----------|-------|------|
//! | `squeeze` | `sqz` | components (+ bundles) → canonical message file |
//! | `infuse`  | `inf` | canonical message file → components (+ bundles) |
//! | `list`    | `lt`  | keys of the main locale missing elsewhere |
//! | `push`    | `ph`  | local messages → provider |
//! | `pull`    | `pl`  | provider → local files |
//! | `status`  | `st`  | translation progress per locale |
//! | `diff`    | `df`  | local messages vs. provider |
//! | `import`  | `imp` | raw files → provider |
//! | `export`  | `exp` | provider → raw files |

pub mod diff;
pub mod export;
pub mod import;
pub mod infuse;
pub mod list;
pub mod pull;
pub mod push;
pub mod squeeze;
pub mod status;
pub mod targets;

use std::fmt;
use std::path::{
    Path,
    PathBuf,
};

use clap::{
    Args,
    Parser,
    Subcommand,
};
use thiserror::Error;

use crate::bundle::{
    BundleError,
    BundleMatcher,
    NamespaceResolver,
};
use crate::config::{
    ConfigError,
    ConfigManager,
    FileMatcher,
    MatcherError,
    SyncSettings,
};
use crate::indexer::{
    ComponentSource,
    IndexerError,
    WorkspaceIndexer,
};
use crate::infuse::InjectError;
use crate::input::InputError;
use crate::input::namespace::load_namespace_dictionary;
use crate::provider::{
    LocaleServiceProvider,
    Normalize,
    ProviderConfiguration,
    ProviderError,
    ProviderRegistry,
    configuration_path,
    load_configuration,
};
use crate::squeeze::ExtractError;
use crate::syntax::format::FormatError;

/// Exit code of `diff` when local and service messages differ.
pub const EXIT_DIFFERENCES: i32 = 64;

/// Errors of any command; each maps to a process exit code.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Invalid `.sfc-locale.json`.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid include/exclude globs.
    #[error(transparent)]
    Matcher(#[from] MatcherError),

    /// Component discovery failed.
    #[error(transparent)]
    Indexer(#[from] IndexerError),

    /// A component could not be squeezed.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// A component could not be infused.
    #[error(transparent)]
    Inject(#[from] InjectError),

    /// Bundle handling failed.
    #[error(transparent)]
    Bundle(#[from] BundleError),

    /// A message file could not be read or written.
    #[error(transparent)]
    Input(#[from] InputError),

    /// A provider failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Content could not be serialized.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// A component file could not be written back.
    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid combination of arguments.
    #[error("{0}")]
    Usage(String),

    /// The main locale of `list` has no messages file.
    #[error("Not found main '{0}' locale message")]
    MainLocaleNotFound(String),
}

/// Outcome of a command, printed by the binary.
pub trait Report: fmt::Display + fmt::Debug {
    /// Process exit code; `0` unless overridden.
    fn exit_code(&self) -> i32 {
        0
    }
}

/// Everything a command needs besides its own arguments.
#[derive(Debug, Clone)]
pub struct Context {
    /// Workspace root; relative paths are resolved against it.
    pub root: PathBuf,
    /// Settings from `.sfc-locale.json`.
    pub settings: SyncSettings,
    /// Providers available by name.
    pub providers: ProviderRegistry,
}

impl Context {
    /// Context with the built-in providers.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, settings: SyncSettings) -> Self {
        Self { root: root.into(), settings, providers: ProviderRegistry::with_builtin() }
    }

    /// Reads and validates `.sfc-locale.json` in `root`.
    pub fn load(root: impl Into<PathBuf>) -> Result<Self, CommandError> {
        let root = root.into();
        let mut manager = ConfigManager::new();
        manager.load_settings(Some(&root))?;
        Ok(Self::new(root, manager.get_settings().clone()))
    }

    /// `path` relative to the workspace root (absolute paths stay as they are).
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    /// Settings with command line overrides applied, validated again.
    pub fn settings_with(
        &self,
        apply: impl FnOnce(&mut SyncSettings),
    ) -> Result<SyncSettings, CommandError> {
        let mut settings = self.settings.clone();
        apply(&mut settings);
        settings.validate().map_err(ConfigError::ValidationErrors)?;
        Ok(settings)
    }

    /// Component files below `base`.
    pub async fn load_sources(
        &self,
        base: &Path,
        settings: &SyncSettings,
    ) -> Result<Vec<ComponentSource>, CommandError> {
        let matcher = FileMatcher::new(base.to_path_buf(), settings)?;
        let ignore_file = settings.ignore_file.as_deref().map(|path| self.resolve(path));
        let sources = WorkspaceIndexer::new(matcher, ignore_file).load_components().await?;
        tracing::debug!(base = %base.display(), count = sources.len(), "Loaded component sources");
        Ok(sources)
    }

    /// Matcher and namespace resolver for the bundle settings.
    pub async fn bundle_tools(
        &self,
        settings: &SyncSettings,
    ) -> Result<(BundleMatcher, NamespaceResolver), CommandError> {
        let pattern = settings.bundle.match_pattern.as_deref().ok_or(BundleError::MissingPattern)?;
        let matcher = BundleMatcher::new(pattern)?;
        let namespace_file = settings.bundle.namespace_file.as_deref().map(|path| self.resolve(path));
        let dictionary = load_namespace_dictionary(namespace_file.as_deref()).await?;
        Ok((matcher, NamespaceResolver::new(dictionary)?))
    }
}

/// Writes `content` to `path`, creating parent directories.
pub(crate) async fn write_text(path: &Path, content: &str) -> Result<(), CommandError> {
    let write_error = |source| CommandError::Write { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
    }
    tokio::fs::write(path, content).await.map_err(write_error)
}

/// Provider selection shared by the provider commands.
#[derive(Debug, Clone, Args)]
pub struct ProviderArgs {
    /// Localization service provider
    #[arg(short, long)]
    pub provider: String,

    /// Provider configuration file; defaults to `<provider>-conf.json`
    #[arg(short, long)]
    pub conf: Option<PathBuf>,

    /// Shape of the messages exchanged with the service
    #[arg(short, long, value_enum)]
    pub normalize: Option<Normalize>,
}

impl ProviderArgs {
    /// Reads `<provider>-conf.json`, or the file given by `--conf`.
    pub async fn configuration(&self, context: &Context) -> Result<ProviderConfiguration, CommandError> {
        let path = configuration_path(&self.provider, self.conf.as_deref(), &context.root);
        Ok(load_configuration(&path).await?)
    }

    /// Creates the selected provider.
    pub async fn connect(&self, context: &Context) -> Result<Box<dyn LocaleServiceProvider>, CommandError> {
        let configuration = self.configuration(context).await?;
        Ok(context.providers.create(&self.provider, configuration)?)
    }
}

/// Sync i18n blocks of single-file components.
#[derive(Debug, Parser)]
#[command(name = "sfc-locale", about = "Sync i18n blocks of single-file components", version)]
pub struct Cli {
    /// Command to run.
    #[command(subcommand)]
    pub command: Command,

    /// Log level used when `RUST_LOG` is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Workspace root; defaults to the current directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,
}

/// Subcommands of [`Cli`].
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Squeeze the i18n blocks of components into one message file
    #[command(visible_alias = "sqz")]
    Squeeze(squeeze::SqueezeCommand),

    /// Infuse a message file back into the i18n blocks of components
    #[command(visible_alias = "inf")]
    Infuse(infuse::InfuseCommand),

    /// List keys undefined in other locales
    #[command(visible_alias = "lt")]
    List(list::ListCommand),

    /// Push locale messages to a localization service
    #[command(visible_alias = "ph")]
    Push(push::PushCommand),

    /// Pull locale messages from a localization service
    #[command(visible_alias = "pl")]
    Pull(pull::PullCommand),

    /// Show translation status of a localization service
    #[command(visible_alias = "st")]
    Status(status::StatusCommand),

    /// Diff local locale messages against a localization service
    #[command(visible_alias = "df")]
    Diff(diff::DiffCommand),

    /// Import raw locale message files to a localization service
    #[command(visible_alias = "imp")]
    Import(import::ImportCommand),

    /// Export raw locale message files from a localization service
    #[command(visible_alias = "exp")]
    Export(export::ExportCommand),
}

impl Command {
    /// Runs the command and returns its report.
    pub async fn execute(self, context: &Context) -> Result<Box<dyn Report>, CommandError> {
        Ok(match self {
            Self::Squeeze(command) => Box::new(command.execute(context).await?),
            Self::Infuse(command) => Box::new(command.execute(context).await?),
            Self::List(command) => Box::new(command.execute(context).await?),
            Self::Push(command) => Box::new(command.execute(context).await?),
            Self::Pull(command) => Box::new(command.execute(context).await?),
            Self::Status(command) => Box::new(command.execute(context).await?),
            Self::Diff(command) => Box::new(command.execute(context).await?),
            Self::Import(command) => Box::new(command.execute(context).await?),
            Self::Export(command) => Box::new(command.execute(context).await?),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::squeeze(&["sfc-locale", "sqz", "--target", "src"])]
    #[case::infuse(&["sfc-locale", "inf", "--locales", "messages.json", "--dry-run"])]
    #[case::list(&["sfc-locale", "lt", "--locale", "en", "--target", "en.json"])]
    #[case::status(&["sfc-locale", "st", "--provider", "local"])]
    #[case::export(&["sfc-locale", "exp", "-p", "local", "--output", "out"])]
    fn test_aliases_parse(#[case] args: &[&str]) {
        assert!(Cli::try_parse_from(args).is_ok());
    }

    #[googletest::test]
    fn test_bundle_with_splits_on_commas() {
        let cli = Cli::try_parse_from([
            "sfc-locale",
            "squeeze",
            "--bundle-with",
            "a/*.json,b/**/*.json",
            "--log-level",
            "debug",
        ])
        .unwrap();

        let Command::Squeeze(command) = cli.command else {
            panic!("expected squeeze");
        };
        expect_that!(command.bundle_with, elements_are![eq("a/*.json"), eq("b/**/*.json")]);
        expect_that!(cli.log_level, eq("debug"));
    }

    #[rstest]
    #[case::flat("flat", Some(Normalize::Flat))]
    #[case::hierarchy("hierarchy", Some(Normalize::Hierarchy))]
    fn test_push_normalize_option(#[case] value: &str, #[case] expected: Option<Normalize>) {
        let cli = Cli::try_parse_from(["sfc-locale", "push", "-p", "local", "-t", "en.json", "--normalize", value])
            .unwrap();

        let Command::Push(command) = cli.command else {
            panic!("expected push");
        };
        assert_that!(command.provider.normalize, eq(expected));
    }

    #[rstest]
    fn test_unknown_normalize_is_rejected() {
        let result = Cli::try_parse_from(["sfc-locale", "pull", "-p", "local", "-o", "out", "-n", "tree"]);

        assert!(result.is_err());
    }

    #[googletest::test]
    fn test_invalid_override_is_rejected() {
        let context = Context::new("/w", SyncSettings::default());

        let result = context.settings_with(|settings| settings.bundle.patterns = vec!["x/*.json".to_string()]);

        assert!(matches!(result, Err(CommandError::Config(ConfigError::ValidationErrors(_)))));
    }
}
