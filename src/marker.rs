//! Service marker file proving a daemon instance is active
//!
//! The marker is a three-line text file in the project root:
//!
//! ```text
//! 12345
//! 2024-01-02 03:04:05
//! Never
//! ```
//!
//! Line 1 is the daemon's PID, line 2 its start time and line 3 the time of
//! the most recent successful backup batch (or `Never`). The daemon creates it
//! on start, rewrites line 3 after each batch and deletes it on exit. Presence
//! alone does not mean a daemon is running; callers confirm the PID with a
//! process probe.

use crate::utils::time::{self, marker_stamp};
use chrono::{Local, NaiveDateTime};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

/// Token stored on line 3 before the first successful backup.
pub const NEVER: &str = "Never";

/// Errors reading or rewriting the marker
#[derive(Debug, Error)]
pub enum MarkerError {
    /// The marker file does not exist (never created or removed by `stop`)
    #[error("marker file is missing")]
    Missing,
    /// The marker exists but a line could not be parsed
    #[error("marker file is malformed: {0}")]
    Malformed(String),
    /// Any other I/O failure
    #[error("marker I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Parsed contents of the marker file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceMarker {
    /// Process identifier of the daemon
    pub pid: u32,
    /// When the daemon started
    pub started_at: NaiveDateTime,
    /// When the last batch with at least one copied file finished
    pub last_backup: Option<NaiveDateTime>,
}

impl ServiceMarker {
    /// Marker for the current process, started now, with no backups yet
    #[must_use]
    pub fn for_current_process() -> Self {
        Self {
            pid: std::process::id(),
            started_at: Local::now().naive_local(),
            last_backup: None,
        }
    }

    /// Renders the three-line file body
    #[must_use]
    pub fn render(&self) -> String {
        let last = self
            .last_backup
            .map_or_else(|| NEVER.to_string(), |t| marker_stamp(&t));
        format!(
            "{}\n{}\n{}\n",
            self.pid,
            marker_stamp(&self.started_at),
            last
        )
    }

    /// Parses a full marker body
    ///
    /// # Errors
    ///
    /// Returns [`MarkerError::Malformed`] if a line is missing or unparsable.
    pub fn parse(content: &str) -> Result<Self, MarkerError> {
        let mut lines = content.lines();
        let pid = parse_pid_line(lines.next())?;

        let started_line = lines
            .next()
            .ok_or_else(|| MarkerError::Malformed("missing start time".to_string()))?;
        let started_at = time::parse_marker_stamp(started_line)
            .ok_or_else(|| MarkerError::Malformed(format!("bad start time '{started_line}'")))?;

        let last_line = lines.next().map_or(NEVER, str::trim);
        let last_backup = if last_line == NEVER {
            None
        } else {
            Some(time::parse_marker_stamp(last_line).ok_or_else(|| {
                MarkerError::Malformed(format!("bad last backup time '{last_line}'"))
            })?)
        };

        Ok(Self {
            pid,
            started_at,
            last_backup,
        })
    }

    /// Reads and parses the marker at `path`
    ///
    /// # Errors
    ///
    /// Returns [`MarkerError::Missing`] if the file does not exist, otherwise
    /// any read or parse failure.
    pub fn read(path: &Path) -> Result<Self, MarkerError> {
        Self::parse(&read_marker(path)?)
    }

    /// Writes the marker atomically, replacing any existing file
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be written or renamed.
    pub fn write(&self, path: &Path) -> Result<(), MarkerError> {
        self.persist(path, false)
    }

    /// Rewrites an existing marker atomically; never creates one
    ///
    /// Existence is checked again right before the rename, which narrows the
    /// window in which a concurrent removal could be undone to the rename
    /// itself.
    ///
    /// # Errors
    ///
    /// Returns [`MarkerError::Missing`] if the marker is gone, otherwise any
    /// write or rename failure.
    pub fn replace(&self, path: &Path) -> Result<(), MarkerError> {
        self.persist(path, true)
    }

    /// Writes a temporary sibling and renames it over `path`
    fn persist(&self, path: &Path, existing_only: bool) -> Result<(), MarkerError> {
        let dir = path
            .parent()
            .ok_or_else(|| MarkerError::Malformed("marker path has no parent".to_string()))?;
        let prefix = path
            .file_name()
            .map_or_else(|| ".marker".into(), |n| n.to_string_lossy().into_owned());

        let mut tmp = tempfile::Builder::new()
            .prefix(&format!("{prefix}."))
            .tempfile_in(dir)?;
        tmp.write_all(self.render().as_bytes())?;
        tmp.as_file().sync_all()?;
        // Dropping `tmp` deletes the temporary file
        if existing_only && !path.exists() {
            return Err(MarkerError::Missing);
        }
        tmp.persist(path).map_err(|e| MarkerError::Io(e.error))?;
        Ok(())
    }
}

/// Reads only the PID line, as needed for liveness checks
///
/// # Errors
///
/// Returns [`MarkerError::Missing`] if the file does not exist, or
/// [`MarkerError::Malformed`] if the first line is not a PID.
pub fn read_pid(path: &Path) -> Result<u32, MarkerError> {
    let content = read_marker(path)?;
    parse_pid_line(content.lines().next())
}

/// Rewrites line 3 with `when`, keeping PID and start time
///
/// A missing marker means the daemon was asked to stop; the caller must not
/// recreate it. Removal is re-checked just before the atomic rename, so only a
/// removal racing the rename itself can be undone, and the daemon then sees
/// the stop through its signal flag on the next tick.
///
/// # Errors
///
/// Returns [`MarkerError::Missing`] if the marker was removed, otherwise any
/// read, parse or write failure.
pub fn record_backup(path: &Path, when: NaiveDateTime) -> Result<(), MarkerError> {
    let mut marker = ServiceMarker::read(path)?;
    marker.last_backup = Some(when);
    marker.replace(path)
}

/// Deletes the marker, treating an already-missing file as success
///
/// # Errors
///
/// Returns an error for any failure other than the file not existing.
pub fn remove(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Reads the marker file, mapping "not found" to [`MarkerError::Missing`]
fn read_marker(path: &Path) -> Result<String, MarkerError> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            MarkerError::Missing
        } else {
            MarkerError::Io(e)
        }
    })
}

/// Parses the first marker line as a non-zero PID
fn parse_pid_line(line: Option<&str>) -> Result<u32, MarkerError> {
    let line = line.ok_or_else(|| MarkerError::Malformed("empty marker".to_string()))?;
    match line.trim().parse::<u32>() {
        Ok(pid) if pid > 0 => Ok(pid),
        _ => Err(MarkerError::Malformed(format!("bad pid '{}'", line.trim()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn stamp(text: &str) -> NaiveDateTime {
        time::parse_marker_stamp(text).unwrap()
    }

    #[test]
    fn test_render_and_parse() {
        let marker = ServiceMarker {
            pid: 4242,
            started_at: stamp("2024-01-02 03:04:05"),
            last_backup: None,
        };
        let body = marker.render();
        assert_eq!(body, "4242\n2024-01-02 03:04:05\nNever\n");
        assert_eq!(ServiceMarker::parse(&body).unwrap(), marker);
    }

    #[test]
    fn test_parse_without_trailing_newline() {
        let marker = ServiceMarker::parse("7\n2024-01-02 03:04:05\n2024-01-02 04:00:00").unwrap();
        assert_eq!(marker.pid, 7);
        assert_eq!(marker.last_backup, Some(stamp("2024-01-02 04:00:00")));
    }

    #[test]
    fn test_parse_missing_last_line_means_never() {
        let marker = ServiceMarker::parse("7\n2024-01-02 03:04:05\n").unwrap();
        assert_eq!(marker.last_backup, None);
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            ServiceMarker::parse("abc\n2024-01-02 03:04:05\nNever"),
            Err(MarkerError::Malformed(_))
        ));
        assert!(matches!(
            ServiceMarker::parse("0\n2024-01-02 03:04:05\nNever"),
            Err(MarkerError::Malformed(_))
        ));
        assert!(matches!(ServiceMarker::parse("12\n"), Err(MarkerError::Malformed(_))));
        assert!(matches!(ServiceMarker::parse(""), Err(MarkerError::Malformed(_))));
    }

    #[test]
    fn test_write_read_and_remove() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".backup_pid");

        let marker = ServiceMarker::for_current_process();
        marker.write(&path).unwrap();

        let loaded = ServiceMarker::read(&path).unwrap();
        assert_eq!(loaded.pid, std::process::id());
        assert_eq!(read_pid(&path).unwrap(), std::process::id());

        remove(&path).unwrap();
        assert!(!path.exists());
        // Removing twice is fine
        remove(&path).unwrap();
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".backup_pid");
        ServiceMarker::for_current_process().write(&path).unwrap();

        let entries: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_record_backup_updates_only_last_line() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".backup_pid");
        let marker = ServiceMarker {
            pid: 99,
            started_at: stamp("2024-01-02 03:04:05"),
            last_backup: None,
        };
        marker.write(&path).unwrap();

        record_backup(&path, stamp("2024-01-02 05:06:07")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "99\n2024-01-02 03:04:05\n2024-01-02 05:06:07\n");
    }

    #[test]
    fn test_replace_does_not_resurrect_removed_marker() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".backup_pid");
        let marker = ServiceMarker::for_current_process();
        marker.write(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert!(matches!(marker.replace(&path), Err(MarkerError::Missing)));
        assert!(!path.exists());
        let leftovers: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
        assert!(leftovers.is_empty(), "temporary file left behind");
    }

    #[test]
    fn test_record_backup_missing_marker() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".backup_pid");

        let result = record_backup(&path, stamp("2024-01-02 05:06:07"));
        assert!(matches!(result, Err(MarkerError::Missing)));
        assert!(!path.exists(), "a missing marker must not be recreated");
    }

    #[test]
    fn test_read_pid_missing() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            read_pid(&temp.path().join(".backup_pid")),
            Err(MarkerError::Missing)
        ));
    }
}
