//! Platform process inspection and termination.
//!
//! POSIX systems probe with signal 0 and stop with SIGTERM. Windows has no
//! signals, so liveness is a `tasklist` query and stopping is a forced
//! `taskkill`.

use std::io;
use thiserror::Error;

/// Failure to inspect or signal a process
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The OS could not be queried
    #[error("process query failed: {0}")]
    Query(#[source] io::Error),
    /// The termination request could not be delivered
    #[error("failed to terminate process {pid}: {source}")]
    Signal {
        /// Target process
        pid: u32,
        /// Underlying error
        source: io::Error,
    },
}

/// Capability to check for and stop a process by PID
pub trait ProcessProbe: Send + Sync {
    /// Whether a process with this PID currently exists
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Query`] if the OS cannot be asked.
    fn is_alive(&self, pid: u32) -> Result<bool, ProbeError>;

    /// Requests termination of the process
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Signal`] if the request could not be delivered.
    fn terminate(&self, pid: u32) -> Result<(), ProbeError>;
}

/// Signal-based probe for Unix-like systems
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct PosixProbe;

#[cfg(unix)]
impl PosixProbe {
    /// Converts a PID for `kill(2)`, rejecting values that would address a group
    fn raw_pid(pid: u32) -> Option<libc::pid_t> {
        libc::pid_t::try_from(pid).ok().filter(|p| *p > 0)
    }
}

#[cfg(unix)]
impl ProcessProbe for PosixProbe {
    fn is_alive(&self, pid: u32) -> Result<bool, ProbeError> {
        let Some(raw) = Self::raw_pid(pid) else {
            return Ok(false);
        };
        // SAFETY: signal 0 performs permission and existence checks only
        if unsafe { libc::kill(raw, 0) } == 0 {
            return Ok(true);
        }
        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::ESRCH) => Ok(false),
            // Exists but owned by another user
            Some(libc::EPERM) => Ok(true),
            _ => Err(ProbeError::Query(err)),
        }
    }

    fn terminate(&self, pid: u32) -> Result<(), ProbeError> {
        let Some(raw) = Self::raw_pid(pid) else {
            return Err(ProbeError::Signal {
                pid,
                source: io::Error::new(io::ErrorKind::InvalidInput, "invalid pid"),
            });
        };
        // SAFETY: raw is a positive PID, so only that single process is signalled
        if unsafe { libc::kill(raw, libc::SIGTERM) } == 0 {
            Ok(())
        } else {
            Err(ProbeError::Signal {
                pid,
                source: io::Error::last_os_error(),
            })
        }
    }
}

/// Process-table probe for Windows
#[cfg(windows)]
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsProbe;

#[cfg(windows)]
impl WindowsProbe {
    /// CREATE_NO_WINDOW, so probing does not flash a console
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;

    /// Runs a helper tool without a console window
    fn run(program: &str, args: &[&str]) -> io::Result<std::process::Output> {
        use std::os::windows::process::CommandExt;

        std::process::Command::new(program)
            .args(args)
            .creation_flags(Self::CREATE_NO_WINDOW)
            .output()
    }
}

#[cfg(windows)]
impl ProcessProbe for WindowsProbe {
    fn is_alive(&self, pid: u32) -> Result<bool, ProbeError> {
        if pid == 0 {
            return Ok(false);
        }
        let filter = format!("PID eq {pid}");
        let output = Self::run("tasklist", &["/FI", &filter, "/FO", "CSV", "/NH"])
            .map_err(ProbeError::Query)?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        // CSV rows quote every field: "name.exe","1234",...
        let needle = format!("\"{pid}\"");
        Ok(stdout.lines().any(|line| line.contains(&needle)))
    }

    fn terminate(&self, pid: u32) -> Result<(), ProbeError> {
        let pid_arg = pid.to_string();
        let output = Self::run("taskkill", &["/F", "/PID", &pid_arg])
            .map_err(|source| ProbeError::Signal { pid, source })?;
        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(ProbeError::Signal {
                pid,
                source: io::Error::other(stderr),
            })
        }
    }
}

/// The probe for the platform this binary was built for
#[must_use]
pub fn platform_probe() -> Box<dyn ProcessProbe> {
    #[cfg(unix)]
    {
        Box::new(PosixProbe)
    }

    #[cfg(windows)]
    {
        Box::new(WindowsProbe)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::{Command, Stdio};

    #[test]
    fn test_current_process_is_alive() {
        assert!(PosixProbe.is_alive(std::process::id()).unwrap());
    }

    #[test]
    fn test_out_of_range_pid_is_not_alive() {
        assert!(!PosixProbe.is_alive(0).unwrap());
        assert!(!PosixProbe.is_alive(u32::MAX).unwrap());
    }

    #[test]
    fn test_terminate_child() {
        let mut child = Command::new("sleep")
            .arg("30")
            .stdout(Stdio::null())
            .spawn()
            .unwrap();
        let pid = child.id();
        assert!(PosixProbe.is_alive(pid).unwrap());

        PosixProbe.terminate(pid).unwrap();
        child.wait().unwrap();

        assert!(!PosixProbe.is_alive(pid).unwrap());
    }

    #[test]
    fn test_terminate_invalid_pid_fails() {
        assert!(PosixProbe.terminate(0).is_err());
    }
}
