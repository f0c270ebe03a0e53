use crate::BackupContext;
use crate::marker::NEVER;
use crate::utils::time::marker_stamp;
use anyhow::Result;

/// Show whether the daemon is running and when it last backed up
///
/// # Errors
///
/// Never fails for a valid context; the `Result` keeps the command
/// signature uniform.
pub fn execute(ctx: &BackupContext) -> Result<()> {
    let report = ctx.controller().status();

    let Some(pid) = report.pid.filter(|_| report.running) else {
        super::print_error("Not running");
        return Ok(());
    };

    super::print_success(&format!("Running (PID {pid})"));
    if let Some(started) = report.started_at {
        super::print_detail("Started", &marker_stamp(&started));
    }
    super::print_detail(
        "Last backup",
        &report
            .last_backup
            .map_or_else(|| NEVER.to_string(), |t| marker_stamp(&t)),
    );
    super::print_detail(
        "Interval",
        &humantime::format_duration(ctx.config.interval()).to_string(),
    );
    super::print_detail("Archive", &ctx.archive_root().display().to_string());
    Ok(())
}
