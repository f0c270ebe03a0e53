//! Single-file copy into the archive with failure classification.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why one file of a batch was not archived
#[derive(Debug, Error)]
pub enum CopyError {
    /// The source disappeared between scan and copy
    #[error("source vanished: {}", .0.display())]
    SourceVanished(PathBuf),
    /// The source or destination is not accessible
    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    /// A record with this exact name already exists and is never overwritten
    #[error("already archived: {}", .0.display())]
    AlreadyArchived(PathBuf),
    /// Any other I/O failure
    #[error("copy of {} failed: {source}", path.display())]
    Io {
        /// File being read or written when the failure happened
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },
}

impl CopyError {
    /// Classifies an I/O error for `path`
    fn classify(path: &Path, error: io::Error) -> Self {
        let path = path.to_path_buf();
        match error.kind() {
            io::ErrorKind::NotFound => Self::SourceVanished(path),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            io::ErrorKind::AlreadyExists => Self::AlreadyArchived(path),
            _ => Self::Io {
                path,
                source: error,
            },
        }
    }

    /// Whether this failure is a normal consequence of a live project tree
    ///
    /// Expected failures are skipped quietly; the rest are worth a warning.
    #[must_use]
    pub const fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::SourceVanished(_) | Self::PermissionDenied(_) | Self::AlreadyArchived(_)
        )
    }
}

/// Copies `src` to a new file at `dest`, keeping permissions and mtime
///
/// The destination's parent directories are created as needed. An existing
/// destination is never replaced. Permission and mtime preservation are best
/// effort and do not fail the copy.
///
/// # Errors
///
/// Returns a classified [`CopyError`] if the source cannot be read or the
/// destination cannot be created or written.
pub fn copy_new(src: &Path, dest: &Path) -> Result<u64, CopyError> {
    let metadata = fs::metadata(src).map_err(|e| CopyError::classify(src, e))?;
    let mut reader = File::open(src).map_err(|e| CopyError::classify(src, e))?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| CopyError::classify(parent, e))?;
    }

    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .map_err(|e| CopyError::classify(dest, e))?;

    let bytes = match io::copy(&mut reader, &mut writer) {
        Ok(bytes) => bytes,
        Err(e) => {
            // Do not leave a truncated record behind
            drop(writer);
            let _ = fs::remove_file(dest);
            return Err(CopyError::classify(src, e));
        }
    };
    drop(writer);

    // mtime first: a read-only destination may refuse timestamp updates on Windows
    let mtime = filetime::FileTime::from_last_modification_time(&metadata);
    let _ = filetime::set_file_mtime(dest, mtime);
    let _ = fs::set_permissions(dest, metadata.permissions());

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_creates_parents_and_keeps_mtime() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src.txt");
        fs::write(&src, "hello").unwrap();
        let mtime = filetime::FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(&src, mtime).unwrap();

        let dest = temp.path().join("out/deep/dir/src_copy.txt");
        let bytes = copy_new(&src, &dest).unwrap();

        assert_eq!(bytes, 5);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "hello");
        let copied = filetime::FileTime::from_last_modification_time(&fs::metadata(&dest).unwrap());
        assert_eq!(copied, mtime);
    }

    #[test]
    fn test_missing_source_is_vanished() {
        let temp = TempDir::new().unwrap();
        let err = copy_new(&temp.path().join("nope"), &temp.path().join("dest")).unwrap_err();
        assert!(matches!(err, CopyError::SourceVanished(_)));
        assert!(err.is_expected());
        assert!(!temp.path().join("dest").exists());
    }

    #[test]
    fn test_existing_destination_is_never_overwritten() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src.txt");
        let dest = temp.path().join("dest.txt");
        fs::write(&src, "new").unwrap();
        fs::write(&dest, "old").unwrap();

        let err = copy_new(&src, &dest).unwrap_err();
        assert!(matches!(err, CopyError::AlreadyArchived(_)));
        assert_eq!(fs::read_to_string(&dest).unwrap(), "old");
    }
}
