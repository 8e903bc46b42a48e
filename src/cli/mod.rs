//! Command-line interface for aurup.
//!
//! Each command lives in its own module with its own argument struct and
//! execution logic:
//! - `list` — show configured packages; performs no network I/O.
//! - `update` — update one package, an explicit set, or every enabled
//!   package (the default when no subcommand is given).
//!
//! Global flags (`--config`, `--verbose`, `--quiet`, `--no-progress`)
//! apply to every subcommand. The process exit code is 0 only when every
//! requested package update succeeded; `list` never fails due to network
//! conditions.

mod list;
mod update;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::constants::{DEFAULT_CONFIG_FILE, NO_PROGRESS_ENV};

/// Top-level CLI for aurup.
#[derive(Parser)]
#[command(
    name = "aurup",
    about = "Automated PKGBUILD updater for packages tracking upstream binary releases",
    version
)]
pub struct Cli {
    /// The subcommand to run; defaults to updating all enabled packages.
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable debug output.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file.
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Disable progress bars (also via the AURUP_NO_PROGRESS environment
    /// variable).
    #[arg(long, global = true)]
    no_progress: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// List configured packages without touching the network.
    List(list::ListCommand),

    /// Update the named packages, or every enabled package when none are
    /// given.
    Update(update::UpdateCommand),
}

impl Cli {
    /// The default tracing filter derived from the verbosity flags.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }

    /// Execute the selected command.
    pub async fn execute(self) -> Result<()> {
        if self.no_progress {
            // Runs before any download task reads the switch; set_var's
            // contract requires no concurrent readers.
            unsafe { std::env::set_var(NO_PROGRESS_ENV, "1") };
        }

        let config_path = self
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let config = Config::load(&config_path).await?;

        match self.command {
            Some(Commands::List(cmd)) => cmd.execute(&config),
            Some(Commands::Update(cmd)) => cmd.execute(config).await,
            None => update::UpdateCommand::default().execute(config).await,
        }
    }
}
