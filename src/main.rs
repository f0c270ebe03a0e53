use anyhow::Result;
use autobackup::cli::{Cli, Commands};
use autobackup::output::{self, Verbosity};
use autobackup::{BackupContext, commands};
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use colored::Colorize;
use std::io;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command_or_default();

    output::set_verbosity(Verbosity::from_flags(cli.verbose, cli.quiet));

    // The daemon installs its own file subscriber
    if command != Commands::Run {
        init_tracing(cli.verbose);
    }

    match command {
        Commands::Completion { shell } => {
            print_completions(shell, &mut Cli::command());
        }
        Commands::Start { contributor } => {
            let ctx = BackupContext::from_env(cli.project)?;
            commands::start::execute(&ctx, contributor)?;
        }
        Commands::Stop => {
            let ctx = BackupContext::from_env_read_only(cli.project)?;
            commands::stop::execute(&ctx)?;
        }
        Commands::Status => {
            let ctx = BackupContext::from_env_read_only(cli.project)?;
            commands::status::execute(&ctx)?;
        }
        Commands::Run => {
            let ctx = BackupContext::from_env(cli.project)?;
            commands::run::execute(&ctx)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "autobackup=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(autobackup::LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
