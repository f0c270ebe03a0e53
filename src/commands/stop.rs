use crate::BackupContext;
use crate::process::StopOutcome;
use anyhow::{Result, bail};

/// Stop the background daemon for the project
///
/// A project with no live daemon is reported as already stopped, after
/// removing any marker left behind by a crash.
///
/// # Errors
///
/// Returns an error if the daemon could not be terminated. The marker is
/// left in place in that case.
pub fn execute(ctx: &BackupContext) -> Result<()> {
    let controller = ctx.controller();

    match controller.stop() {
        StopOutcome::NotRunning { removed_stale } => {
            super::print_success("Not running");
            if removed_stale {
                super::print_info("Removed stale marker file");
            }
            Ok(())
        }
        StopOutcome::Stopped { pid } => {
            super::print_success(&format!("Stopped (PID {pid})"));
            Ok(())
        }
        StopOutcome::Failed { pid, reason } => {
            super::print_error(&format!("Failed to stop PID {pid}"));
            bail!(reason)
        }
    }
}
