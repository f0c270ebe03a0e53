//! The background polling loop.
//!
//! A [`Daemon`] is armed while its marker file exists. It sleeps in short
//! ticks, and every `backup_interval` it scans the project, archives whatever
//! changed since the previous scan and makes that scan the new baseline. The
//! loop ends when the marker disappears, a termination signal arrives or the
//! marker can no longer be updated.

use crate::BackupContext;
use crate::marker::{self, MarkerError, ServiceMarker};
use crate::scanner::{FileScanner, ScanRules};
use crate::storage::BackupWriter;
use crate::tracking::{TrackedState, diff};
use crate::utils::time::archive_stamp;
use anyhow::Result;
use chrono::Local;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::sleep;
use std::time::{Duration, Instant};
use tracing::{Level, debug, info, span, warn};

/// Sleep granularity; bounds how long an external stop takes to be noticed
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Why the loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The marker was removed, normally by `stop`
    MarkerRemoved,
    /// SIGTERM or SIGINT was received
    Signalled,
    /// The marker could not be read or rewritten
    MarkerFailure,
}

/// Timing and gating for the loop
#[derive(Debug, Clone, Copy)]
pub struct DaemonOptions {
    /// Sleep between checks
    pub tick: Duration,
    /// Time between polls
    pub interval: Duration,
    /// When false the daemon stays armed but never scans
    pub enabled: bool,
}

/// One armed daemon instance
pub struct Daemon {
    /// Marker owned by this instance
    marker_path: PathBuf,
    /// Produces each poll's snapshot
    scanner: FileScanner,
    /// Archives changed files for the active contributor
    writer: BackupWriter,
    /// Timing and gating
    options: DaemonOptions,
    /// Set from a signal handler or by an embedding caller to end the loop
    shutdown: Arc<AtomicBool>,
}

impl Daemon {
    /// Builds the daemon for a project and contributor
    #[must_use]
    pub fn new(ctx: &BackupContext, contributor: &str) -> Self {
        let root = ctx.paths.root.clone();
        let scanner = FileScanner::new(root.clone(), ScanRules::from_config(&ctx.config));
        let writer = BackupWriter::new(
            root,
            ctx.archive_root().join(contributor),
            ctx.paths.marker.clone(),
        );

        Self {
            marker_path: ctx.paths.marker.clone(),
            scanner,
            writer,
            options: DaemonOptions {
                tick: DEFAULT_TICK,
                interval: ctx.config.interval(),
                enabled: ctx.config.enabled,
            },
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Overrides the tick, interval and enabled gate
    #[must_use]
    pub const fn with_options(mut self, options: DaemonOptions) -> Self {
        self.options = options;
        self
    }

    /// Flag that ends the loop at the next tick when set
    #[must_use]
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Registers SIGTERM and SIGINT to set the shutdown flag
    ///
    /// # Errors
    ///
    /// Returns an error if a handler cannot be installed.
    #[cfg(unix)]
    pub fn install_signal_handlers(&self) -> Result<()> {
        use signal_hook::consts::{SIGINT, SIGTERM};

        signal_hook::flag::register(SIGTERM, Arc::clone(&self.shutdown))?;
        signal_hook::flag::register(SIGINT, Arc::clone(&self.shutdown))?;
        Ok(())
    }

    /// One scan → diff → backup → rebase step
    ///
    /// Takes the previous baseline and returns the next one. If nothing
    /// changed, no files are written and the marker is left alone.
    ///
    /// # Errors
    ///
    /// Returns a [`MarkerError`] if files were archived but the marker could
    /// not be updated; the caller treats this as a stop request.
    pub fn poll_cycle(&self, tracked: TrackedState) -> Result<TrackedState, MarkerError> {
        let current = self.scanner.scan();
        let changed = diff(&tracked, &current);

        if changed.is_empty() {
            debug!(files = current.len(), "No changes");
            return Ok(current);
        }

        let now = Local::now();
        let summary = self
            .writer
            .write_batch(&changed, &archive_stamp(&now), now.naive_local())?;
        debug!(
            changed = changed.len(),
            written = summary.written.len(),
            "Poll cycle complete"
        );
        Ok(current)
    }

    /// Writes the marker and loops until told to stop
    ///
    /// The marker is removed on every exit path, unless another instance
    /// has since replaced it with its own.
    ///
    /// # Errors
    ///
    /// Returns an error only if the initial marker cannot be written.
    pub fn run(&self) -> Result<ExitReason> {
        let span = span!(Level::INFO, "daemon", pid = std::process::id());
        let _span = span.enter();

        let own = ServiceMarker::for_current_process();
        own.write(&self.marker_path)?;
        let _cleanup = MarkerGuard {
            path: self.marker_path.clone(),
            pid: own.pid,
        };

        info!(
            root = %self.scanner.root().display(),
            archive = %self.writer.contributor_dir().display(),
            interval = %humantime::format_duration(self.options.interval),
            enabled = self.options.enabled,
            "Daemon armed"
        );

        let reason = self.poll_loop();
        info!(?reason, "Daemon stopping");
        Ok(reason)
    }

    /// The armed state: baseline, then tick until a stop condition
    fn poll_loop(&self) -> ExitReason {
        let mut tracked = if self.options.enabled {
            let baseline = self.scanner.scan();
            info!(files = baseline.len(), "Baseline established");
            baseline
        } else {
            TrackedState::new()
        };
        let mut last_poll = Instant::now();

        loop {
            sleep(self.options.tick);

            if self.shutdown.load(Ordering::Relaxed) {
                return ExitReason::Signalled;
            }
            if !self.marker_path.exists() {
                return ExitReason::MarkerRemoved;
            }
            if !self.options.enabled || last_poll.elapsed() < self.options.interval {
                continue;
            }
            last_poll = Instant::now();

            match self.poll_cycle(tracked) {
                Ok(next) => tracked = next,
                Err(MarkerError::Missing) => return ExitReason::MarkerRemoved,
                Err(e) => {
                    warn!(error = %e, "Cannot update marker");
                    return ExitReason::MarkerFailure;
                }
            }
        }
    }
}

/// Removes the marker when the loop exits, if it still names this process
struct MarkerGuard {
    /// Marker location
    path: PathBuf,
    /// PID written by this instance
    pid: u32,
}

impl Drop for MarkerGuard {
    fn drop(&mut self) {
        match marker::read_pid(&self.path) {
            Ok(pid) if pid == self.pid => {
                if let Err(e) = marker::remove(&self.path) {
                    warn!(error = %e, "Failed to remove marker on exit");
                }
            }
            Ok(pid) => debug!(pid, "Marker belongs to another instance, leaving it"),
            Err(_) => {}
        }
    }
}

/// Entry point for the background instance
///
/// Reads the contributor once, arms the daemon and blocks until it stops.
/// Loop failures end in a clean shutdown rather than an error.
///
/// # Errors
///
/// Returns an error if the marker cannot be created or signal handlers
/// cannot be installed.
pub fn run(ctx: &BackupContext) -> Result<ExitReason> {
    let contributor = crate::identity::read_or_default(&ctx.paths.contributor);
    let daemon = Daemon::new(ctx, &contributor);

    #[cfg(unix)]
    daemon.install_signal_handlers()?;

    daemon.run()
}
