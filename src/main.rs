//! Entry point of the `sfc-locale` command.

use anyhow::{
    Context as _,
    Result,
};
use clap::Parser;
use sfc_locale_sync::{
    Cli,
    Context,
};
use tracing_subscriber::EnvFilter;

/// Parses the command line, runs the command and exits with its report's code.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let root = match cli.cwd {
        Some(cwd) => cwd,
        None => std::env::current_dir().context("Failed to get the current directory")?,
    };
    let context = Context::load(root)?;

    match cli.command.execute(&context).await {
        Ok(report) => {
            print!("{report}");
            let code = report.exit_code();
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            Err(e.into())
        }
    }
}
