use crate::BackupContext;
use crate::identity;
use crate::output;
use crate::process::StartOutcome;
use anyhow::{Result, bail};
use crossterm::tty::IsTty;
use std::io;

/// Start the background daemon for the project
///
/// Does nothing if a live daemon already owns the project. Otherwise the
/// contributor is taken from `contributor`, or asked for when stdin is a
/// terminal, before the daemon is spawned.
///
/// # Errors
///
/// Returns an error if the contributor name is invalid, the prompt is
/// abandoned, or the daemon could not be started.
pub fn execute(ctx: &BackupContext, contributor: Option<String>) -> Result<()> {
    let controller = ctx.controller();
    output::action("Starting", &format!("auto-backup for {}", ctx.paths.root.display()));

    match controller.start(|| resolve_contributor(ctx, contributor)) {
        StartOutcome::AlreadyRunning { pid } => {
            super::print_success(&format!("Already running (PID {pid})"));
            Ok(())
        }
        StartOutcome::Started { pid, contributor } => {
            super::print_success(&format!("Started (PID {pid})"));
            super::print_detail("Contributor", &contributor);
            super::print_detail(
                "Interval",
                &humantime::format_duration(ctx.config.interval()).to_string(),
            );
            super::print_detail(
                "Backup to",
                &ctx.archive_root().join(&contributor).display().to_string(),
            );
            if !ctx.config.enabled {
                super::print_warning("Backups are disabled in the configuration; nothing will be copied");
            }
            Ok(())
        }
        StartOutcome::Failed { reason } => {
            super::print_error("Failed to start");
            bail!(reason)
        }
    }
}

/// Picks the identity to record before spawning, if any
fn resolve_contributor(ctx: &BackupContext, explicit: Option<String>) -> Result<Option<String>> {
    if let Some(name) = explicit {
        return identity::sanitize(&name).map(Some);
    }

    if ctx.non_interactive || !io::stdin().is_tty() {
        output::verbose("Not a terminal, keeping the recorded contributor");
        return Ok(None);
    }

    let stdin = io::stdin();
    let name = identity::prompt(&ctx.config.contributors, &mut stdin.lock(), &mut io::stdout())?;
    super::print_success(&format!("Contributor set to: {name}"));
    Ok(Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_contributor_is_sanitized() {
        let temp = TempDir::new().unwrap();
        let ctx = BackupContext::new_explicit(temp.path().to_path_buf()).unwrap();

        assert_eq!(
            resolve_contributor(&ctx, Some("  dana ".to_string())).unwrap(),
            Some("dana".to_string())
        );
        assert!(resolve_contributor(&ctx, Some("a/b".to_string())).is_err());
    }

    #[test]
    fn test_non_interactive_keeps_existing() {
        let temp = TempDir::new().unwrap();
        let ctx = BackupContext::new_explicit(temp.path().to_path_buf()).unwrap();
        assert_eq!(resolve_contributor(&ctx, None).unwrap(), None);
    }
}
