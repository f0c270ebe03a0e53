//! Tracked baseline state and change detection.
//!
//! The daemon keeps one [`TrackedState`] in memory: the snapshot taken at the
//! previous poll. Each poll produces a fresh [`ScanResult`], [`diff`] reports
//! which keys are new or newer, and the scan then replaces the baseline
//! wholesale.
//!
//! Only modification times are compared. Deleted files are never reported,
//! so nothing in the archive is ever removed as a consequence of a scan.
//!
//! # Usage
//!
//! ```
//! use autobackup::tracking::{TrackedState, ScanResult, diff};
//! use std::time::{Duration, UNIX_EPOCH};
//!
//! let t0 = UNIX_EPOCH + Duration::from_secs(100);
//! let t1 = UNIX_EPOCH + Duration::from_secs(200);
//!
//! let tracked: TrackedState = [("a.txt".to_string(), t0)].into_iter().collect();
//! let current: ScanResult = [
//!     ("a.txt".to_string(), t1),
//!     ("b.txt".to_string(), t0),
//! ]
//! .into_iter()
//! .collect();
//!
//! let changed = diff(&tracked, &current);
//! assert_eq!(changed.len(), 2);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::time::SystemTime;

/// Relative path → last observed modification time, as of the previous poll
pub type TrackedState = BTreeMap<String, SystemTime>;

/// Relative path → modification time, as of the current poll
pub type ScanResult = BTreeMap<String, SystemTime>;

/// Paths reported as new or modified by [`diff`]
pub type ChangeSet = BTreeSet<String>;

/// Paths present in `current` that are absent from `tracked` or strictly newer
///
/// Equal or older timestamps are never reported, so a file that was touched
/// back to an earlier time is not backed up again.
#[must_use]
pub fn diff(tracked: &TrackedState, current: &ScanResult) -> ChangeSet {
    current
        .iter()
        .filter(|(path, modified)| tracked.get(*path).is_none_or(|seen| *modified > seen))
        .map(|(path, _)| path.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn state(entries: &[(&str, u64)]) -> BTreeMap<String, SystemTime> {
        entries
            .iter()
            .map(|(path, secs)| ((*path).to_string(), at(*secs)))
            .collect()
    }

    #[test]
    fn test_new_paths_reported() {
        let changed = diff(&state(&[]), &state(&[("a.txt", 1), ("b/c.txt", 2)]));
        assert_eq!(changed.len(), 2);
        assert!(changed.contains("b/c.txt"));
    }

    #[test]
    fn test_newer_paths_reported() {
        let changed = diff(&state(&[("a.txt", 1)]), &state(&[("a.txt", 2)]));
        assert_eq!(changed.into_iter().collect::<Vec<_>>(), vec!["a.txt"]);
    }

    #[test]
    fn test_unchanged_paths_not_reported() {
        let s = state(&[("a.txt", 5), ("b.txt", 7)]);
        assert!(diff(&s, &s).is_empty());
    }

    #[test]
    fn test_older_paths_not_reported() {
        let changed = diff(&state(&[("a.txt", 9)]), &state(&[("a.txt", 3)]));
        assert!(changed.is_empty());
    }

    #[test]
    fn test_deleted_paths_not_reported() {
        let changed = diff(&state(&[("gone.txt", 1), ("a.txt", 1)]), &state(&[("a.txt", 1)]));
        assert!(changed.is_empty());
    }

    #[test]
    fn test_sub_second_change_reported() {
        let tracked: TrackedState = [("a.txt".to_string(), at(10))].into_iter().collect();
        let current: ScanResult = [("a.txt".to_string(), at(10) + Duration::from_millis(1))]
            .into_iter()
            .collect();
        assert_eq!(diff(&tracked, &current).len(), 1);
    }
}
