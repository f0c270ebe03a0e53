//! Singleton lifecycle for the per-project daemon.
//!
//! The controller never raises: every operation returns an outcome value
//! that the command layer turns into operator output. Liveness is always
//! "marker present and PID alive"; anything else, including a probe failure,
//! counts as not running so a fresh start is never blocked by a stale file.

use super::probe::ProcessProbe;
use super::spawn::spawn_detached;
use crate::ProjectPaths;
use crate::marker::{self, ServiceMarker};
use chrono::NaiveDateTime;
use std::io;
use std::path::Path;
use std::thread::sleep;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How long `start` waits for the child to write its marker
const DEFAULT_SETTLE: Duration = Duration::from_secs(5);

/// How long `stop` waits after signalling before removing the marker
const DEFAULT_GRACE: Duration = Duration::from_secs(1);

/// Polling step while waiting for the marker
const POLL_STEP: Duration = Duration::from_millis(100);

/// Liveness snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Liveness {
    /// Whether a live daemon owns the marker
    pub running: bool,
    /// PID from the marker, when running
    pub pid: Option<u32>,
}

impl Liveness {
    /// Not running
    const STOPPED: Self = Self {
        running: false,
        pid: None,
    };
}

/// Result of [`ProcessController::start`]
#[derive(Debug)]
pub enum StartOutcome {
    /// A live daemon already owns the project; nothing was done
    AlreadyRunning {
        /// PID of the existing daemon
        pid: u32,
    },
    /// The daemon was spawned and wrote its marker
    Started {
        /// PID recorded in the new marker
        pid: u32,
        /// Contributor the daemon archives for
        contributor: String,
    },
    /// The identity step or the spawn failed, or the marker never appeared
    Failed {
        /// Operator-facing reason
        reason: String,
    },
}

/// Result of [`ProcessController::stop`]
#[derive(Debug)]
pub enum StopOutcome {
    /// No live daemon; any stale marker was removed
    NotRunning {
        /// Whether a stale marker file was cleaned up
        removed_stale: bool,
    },
    /// The daemon was signalled and the marker is gone
    Stopped {
        /// PID that was terminated
        pid: u32,
    },
    /// Termination could not be delivered; the marker is left for inspection
    Failed {
        /// PID that could not be terminated
        pid: u32,
        /// Operator-facing reason
        reason: String,
    },
}

/// Result of [`ProcessController::status`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// Whether a live daemon owns the marker
    pub running: bool,
    /// PID of the live daemon
    pub pid: Option<u32>,
    /// Recorded start time, when the marker could be parsed
    pub started_at: Option<NaiveDateTime>,
    /// Recorded last backup time; `None` also covers "never"
    pub last_backup: Option<NaiveDateTime>,
}

/// Starts the process that will run the daemon loop
pub trait Launcher: Send + Sync {
    /// Launches a detached daemon for `root`, returning its PID
    ///
    /// # Errors
    ///
    /// Returns an error if the process could not be created.
    fn launch(&self, root: &Path) -> io::Result<u32>;
}

/// Re-executes the current binary with `run` for the project
#[derive(Debug, Default, Clone, Copy)]
pub struct SelfLauncher;

impl Launcher for SelfLauncher {
    fn launch(&self, root: &Path) -> io::Result<u32> {
        let exe = std::env::current_exe()?;
        let root_arg = root
            .to_str()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "non UTF-8 project path"))?;
        spawn_detached(&exe, &["--project", root_arg, "run"], root)
    }
}

/// Owns the marker file and the daemon's process lifecycle
pub struct ProcessController {
    /// Project control files
    paths: ProjectPaths,
    /// Platform liveness/termination capability
    probe: Box<dyn ProcessProbe>,
    /// How the daemon process is created
    launcher: Box<dyn Launcher>,
    /// Maximum wait for the marker after spawning
    settle: Duration,
    /// Wait between termination and marker cleanup
    grace: Duration,
}

impl ProcessController {
    /// Controller that launches this binary as the daemon
    #[must_use]
    pub fn new(paths: ProjectPaths, probe: Box<dyn ProcessProbe>) -> Self {
        Self {
            paths,
            probe,
            launcher: Box::new(SelfLauncher),
            settle: DEFAULT_SETTLE,
            grace: DEFAULT_GRACE,
        }
    }

    /// Replaces the launcher
    #[must_use]
    pub fn with_launcher(mut self, launcher: Box<dyn Launcher>) -> Self {
        self.launcher = launcher;
        self
    }

    /// Overrides the start settle window and the stop grace period
    #[must_use]
    pub const fn with_timing(mut self, settle: Duration, grace: Duration) -> Self {
        self.settle = settle;
        self.grace = grace;
        self
    }

    /// Control file locations
    #[must_use]
    pub const fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    /// Whether a live daemon owns the marker
    ///
    /// Missing marker, unparsable PID and probe failures all report not running.
    #[must_use]
    pub fn is_running(&self) -> Liveness {
        let pid = match marker::read_pid(&self.paths.marker) {
            Ok(pid) => pid,
            Err(e) => {
                debug!(error = %e, "No usable marker");
                return Liveness::STOPPED;
            }
        };

        match self.probe.is_alive(pid) {
            Ok(true) => Liveness {
                running: true,
                pid: Some(pid),
            },
            Ok(false) => {
                debug!(pid, "Marker is stale");
                Liveness::STOPPED
            }
            Err(e) => {
                warn!(pid, error = %e, "Liveness check failed, assuming not running");
                Liveness::STOPPED
            }
        }
    }

    /// Starts a daemon unless one is already running
    ///
    /// `resolve_identity` is only called when a new daemon will actually be
    /// launched; it returns the contributor name to record, or `None` to
    /// keep whatever is already stored.
    pub fn start<F>(&self, resolve_identity: F) -> StartOutcome
    where
        F: FnOnce() -> anyhow::Result<Option<String>>,
    {
        if let Liveness {
            running: true,
            pid: Some(pid),
        } = self.is_running()
        {
            info!(pid, "Daemon already running");
            return StartOutcome::AlreadyRunning { pid };
        }

        match resolve_identity() {
            Ok(Some(name)) => {
                if let Err(e) = crate::identity::write(&self.paths.contributor, &name) {
                    return StartOutcome::Failed {
                        reason: format!("{e:#}"),
                    };
                }
            }
            Ok(None) => {}
            Err(e) => {
                return StartOutcome::Failed {
                    reason: format!("{e:#}"),
                };
            }
        }
        let contributor = crate::identity::read_or_default(&self.paths.contributor);

        // A stale marker would satisfy the wait below before the child writes its own
        if let Err(e) = marker::remove(&self.paths.marker) {
            return StartOutcome::Failed {
                reason: format!("Cannot remove stale marker: {e}"),
            };
        }

        let spawned = match self.launcher.launch(&self.paths.root) {
            Ok(pid) => pid,
            Err(e) => {
                warn!(error = %e, "Spawn failed");
                return StartOutcome::Failed {
                    reason: format!("Failed to spawn daemon: {e}"),
                };
            }
        };
        debug!(pid = spawned, "Waiting for daemon marker");

        let deadline = Instant::now() + self.settle;
        loop {
            if let Ok(pid) = marker::read_pid(&self.paths.marker) {
                info!(pid, "Daemon started");
                return StartOutcome::Started { pid, contributor };
            }
            if Instant::now() >= deadline {
                break;
            }
            sleep(POLL_STEP);
        }

        StartOutcome::Failed {
            reason: format!(
                "Daemon process {spawned} did not create {} within {}",
                self.paths.marker.display(),
                humantime::format_duration(self.settle)
            ),
        }
    }

    /// Stops the running daemon, or cleans up a stale marker
    pub fn stop(&self) -> StopOutcome {
        let Liveness {
            running: true,
            pid: Some(pid),
        } = self.is_running()
        else {
            let existed = self.paths.marker.exists();
            if let Err(e) = marker::remove(&self.paths.marker) {
                warn!(error = %e, "Failed to remove stale marker");
            }
            return StopOutcome::NotRunning {
                removed_stale: existed && !self.paths.marker.exists(),
            };
        };

        if let Err(e) = self.probe.terminate(pid) {
            warn!(pid, error = %e, "Termination failed");
            return StopOutcome::Failed {
                pid,
                reason: e.to_string(),
            };
        }

        sleep(self.grace);

        if let Err(e) = marker::remove(&self.paths.marker) {
            return StopOutcome::Failed {
                pid,
                reason: format!("Daemon signalled but marker could not be removed: {e}"),
            };
        }

        info!(pid, "Daemon stopped");
        StopOutcome::Stopped { pid }
    }

    /// Liveness plus the times recorded in the marker
    #[must_use]
    pub fn status(&self) -> StatusReport {
        let liveness = self.is_running();
        if !liveness.running {
            return StatusReport {
                running: false,
                pid: None,
                started_at: None,
                last_backup: None,
            };
        }

        let (started_at, last_backup) = match ServiceMarker::read(&self.paths.marker) {
            Ok(m) => (Some(m.started_at), m.last_backup),
            Err(e) => {
                debug!(error = %e, "Marker times unavailable");
                (None, None)
            }
        };

        StatusReport {
            running: true,
            pid: liveness.pid,
            started_at,
            last_backup,
        }
    }
}
