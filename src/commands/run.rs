use crate::BackupContext;
use crate::daemon;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Run the daemon loop in the foreground
///
/// This is what `start` spawns. Logging goes to the project's log file
/// because the detached process has no terminal. Loop failures end in a
/// clean shutdown; only a failure to arm the daemon is returned.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or the marker cannot be
/// created.
pub fn execute(ctx: &BackupContext) -> Result<()> {
    let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&ctx.paths.log)
        .with_context(|| format!("Failed to open log file: {}", ctx.paths.log.display()))?;

    let filter = EnvFilter::try_from_env(crate::LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new("autobackup=info"));

    // The CLI may already have installed a stderr subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(log))
        .try_init();

    match daemon::run(ctx) {
        Ok(_) => Ok(()),
        Err(e) => {
            error!(error = %format!("{e:#}"), "Daemon failed to start");
            Err(e)
        }
    }
}
