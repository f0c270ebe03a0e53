//! Command-line interface definitions for autobackup.
//!
//! The CLI definitions are shared between the main binary and build tools
//! (like xtask) for man page generation.
//!
//! Note: Field-level documentation is provided via clap attributes, so we
//! allow missing_docs for this module to avoid redundant documentation.

#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Main CLI structure for autobackup.
#[derive(Parser)]
#[command(
    name = "autobackup",
    version = crate::VERSION,
    about = "Background revision history for a project directory",
    long_about = "Runs a detached daemon that periodically copies changed project files into \
                  a timestamped, per-contributor history folder"
)]
pub struct Cli {
    /// Subcommand to execute (defaults to `start`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Project directory to back up (defaults to the current directory)
    #[arg(short, long, global = true, env = "AUTOBACKUP_PROJECT", value_name = "DIR")]
    pub project: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// All available commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the background daemon (no-op if already running)
    Start {
        /// Contributor whose history folder receives the backups
        #[arg(short, long, value_name = "NAME")]
        contributor: Option<String>,
    },

    /// Stop the background daemon
    Stop,

    /// Show whether the daemon is running and when it last backed up
    Status,

    /// Run the daemon loop in the foreground (used by `start`)
    #[command(hide = true)]
    Run,

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// The requested command, with `start` as the default
    #[must_use]
    pub fn command_or_default(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Start { contributor: None })
    }
}
