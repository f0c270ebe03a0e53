//! Versioned archive storage.
//!
//! [`BackupWriter`] turns one poll's change set into immutable backup records
//! under `<archive-root>/<contributor>/`, all tagged with the same timestamp
//! so a batch can be read back as one generation. Records are only ever
//! created; nothing here overwrites or deletes an existing copy.

/// Single-file copy with classified failures
pub mod copy;
/// `<stem>_<timestamp><ext>` naming
pub mod naming;

use crate::marker::{self, MarkerError};
use crate::tracking::ChangeSet;
use crate::utils::paths::resolve_key;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, info, span, warn};

pub use copy::CopyError;
pub use naming::{VersionedName, versioned_path};

/// Outcome of one batch
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Archive paths written, in key order
    pub written: Vec<PathBuf>,
    /// Keys that could not be archived, with the reason
    pub skipped: Vec<(String, CopyError)>,
}

impl BatchSummary {
    /// Whether at least one record was written
    #[must_use]
    pub fn any_written(&self) -> bool {
        !self.written.is_empty()
    }
}

/// Writes backup records for one contributor
#[derive(Debug, Clone)]
pub struct BackupWriter {
    /// Project root that change-set keys are relative to
    root: PathBuf,
    /// `<archive-root>/<contributor>`
    contributor_dir: PathBuf,
    /// Marker whose last-backup line is refreshed after a productive batch
    marker_path: PathBuf,
}

impl BackupWriter {
    /// Create a writer
    ///
    /// # Arguments
    ///
    /// * `root` - Project root; change-set keys are resolved against it
    /// * `contributor_dir` - Destination directory for this contributor
    /// * `marker_path` - Service marker to stamp after successful batches
    #[must_use]
    pub const fn new(root: PathBuf, contributor_dir: PathBuf, marker_path: PathBuf) -> Self {
        Self {
            root,
            contributor_dir,
            marker_path,
        }
    }

    /// Destination directory for this contributor
    #[must_use]
    pub fn contributor_dir(&self) -> &Path {
        &self.contributor_dir
    }

    /// Copies every changed file under its versioned name
    ///
    /// A failure on one file is logged and recorded in the summary; the rest
    /// of the batch still runs. Nothing is written to the marker here.
    #[must_use]
    pub fn write_backups(&self, changed: &ChangeSet, timestamp: &str) -> BatchSummary {
        let span = span!(Level::INFO, "backup_batch", timestamp, files = changed.len());
        let _guard = span.enter();

        let mut summary = BatchSummary::default();

        for key in changed {
            let src = resolve_key(&self.root, key);
            let dest = versioned_path(&self.contributor_dir, key, timestamp);

            match copy::copy_new(&src, &dest) {
                Ok(bytes) => {
                    debug!(path = %key, bytes, "Archived");
                    summary.written.push(dest);
                }
                Err(e) if e.is_expected() => {
                    debug!(path = %key, error = %e, "Skipped");
                    summary.skipped.push((key.clone(), e));
                }
                Err(e) => {
                    warn!(path = %key, error = %e, "Failed to archive");
                    summary.skipped.push((key.clone(), e));
                }
            }
        }

        info!(
            written = summary.written.len(),
            skipped = summary.skipped.len(),
            "Backup batch complete"
        );
        summary
    }

    /// Runs a batch and, if anything was written, stamps the marker with `now`
    ///
    /// # Errors
    ///
    /// Returns a [`MarkerError`] if the marker could not be updated. A
    /// [`MarkerError::Missing`] means the daemon has been asked to stop. The
    /// records already written stay in place either way.
    pub fn write_batch(
        &self,
        changed: &ChangeSet,
        timestamp: &str,
        now: NaiveDateTime,
    ) -> Result<BatchSummary, MarkerError> {
        let summary = self.write_backups(changed, timestamp);
        if summary.any_written() {
            marker::record_backup(&self.marker_path, now)?;
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::ServiceMarker;
    use std::fs;
    use tempfile::TempDir;

    const TS: &str = "2024-01-02_03-04-05";

    struct Fixture {
        temp: TempDir,
        writer: BackupWriter,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let root = temp.path().to_path_buf();
            let writer = BackupWriter::new(
                root.clone(),
                root.join("RevisionHistory").join("alice"),
                root.join(".backup_pid"),
            );
            Self { temp, writer }
        }

        fn root(&self) -> &Path {
            self.temp.path()
        }

        fn file(&self, key: &str, content: &str) {
            let path = resolve_key(self.root(), key);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        fn marker(&self) -> PathBuf {
            self.root().join(".backup_pid")
        }
    }

    fn keys(items: &[&str]) -> ChangeSet {
        items.iter().map(ToString::to_string).collect()
    }

    fn now() -> NaiveDateTime {
        crate::utils::time::parse_marker_stamp("2024-01-02 03:04:06").unwrap()
    }

    #[test]
    fn test_writes_versioned_copies() {
        let fx = Fixture::new();
        fx.file("src/Foo.kt", "class Foo");
        fx.file("a.txt", "a");

        let summary = fx.writer.write_backups(&keys(&["src/Foo.kt", "a.txt"]), TS);

        assert_eq!(summary.written.len(), 2);
        let foo = fx
            .root()
            .join("RevisionHistory/alice/src/Foo_2024-01-02_03-04-05.kt");
        assert_eq!(fs::read_to_string(foo).unwrap(), "class Foo");
        assert!(
            fx.root()
                .join("RevisionHistory/alice/a_2024-01-02_03-04-05.txt")
                .exists()
        );
    }

    #[test]
    fn test_partial_failure_isolated_and_marker_updated() {
        let fx = Fixture::new();
        fx.file("one.txt", "1");
        fx.file("three.txt", "3");
        // two.txt is in the change set but vanished before the copy
        ServiceMarker::for_current_process()
            .write(&fx.marker())
            .unwrap();

        let summary = fx
            .writer
            .write_batch(&keys(&["one.txt", "two.txt", "three.txt"]), TS, now())
            .unwrap();

        assert_eq!(summary.written.len(), 2);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].0, "two.txt");
        assert!(matches!(summary.skipped[0].1, CopyError::SourceVanished(_)));

        let marker = ServiceMarker::read(&fx.marker()).unwrap();
        assert_eq!(marker.last_backup, Some(now()));
    }

    #[test]
    fn test_all_failed_leaves_marker_untouched() {
        let fx = Fixture::new();
        ServiceMarker::for_current_process()
            .write(&fx.marker())
            .unwrap();

        let summary = fx
            .writer
            .write_batch(&keys(&["ghost.txt"]), TS, now())
            .unwrap();

        assert!(!summary.any_written());
        assert_eq!(ServiceMarker::read(&fx.marker()).unwrap().last_backup, None);
    }

    #[test]
    fn test_missing_marker_reported_after_copies() {
        let fx = Fixture::new();
        fx.file("a.txt", "a");

        let result = fx.writer.write_batch(&keys(&["a.txt"]), TS, now());

        assert!(matches!(result, Err(MarkerError::Missing)));
        assert!(
            fx.root()
                .join("RevisionHistory/alice/a_2024-01-02_03-04-05.txt")
                .exists()
        );
        assert!(!fx.marker().exists());
    }

    #[test]
    fn test_same_file_in_later_batch_gets_new_record() {
        let fx = Fixture::new();
        fx.file("a.txt", "v1");
        let _ = fx.writer.write_backups(&keys(&["a.txt"]), TS);
        fx.file("a.txt", "v2");
        let _ = fx
            .writer
            .write_backups(&keys(&["a.txt"]), "2024-01-02_03-07-05");

        let dir = fx.root().join("RevisionHistory/alice");
        assert_eq!(
            fs::read_to_string(dir.join("a_2024-01-02_03-04-05.txt")).unwrap(),
            "v1"
        );
        assert_eq!(
            fs::read_to_string(dir.join("a_2024-01-02_03-07-05.txt")).unwrap(),
            "v2"
        );
    }

    #[test]
    fn test_empty_change_set() {
        let fx = Fixture::new();
        let summary = fx.writer.write_backups(&ChangeSet::new(), TS);
        assert!(!summary.any_written());
        assert!(summary.skipped.is_empty());
        assert!(!fx.writer.contributor_dir().exists());
    }
}
