//! Versioned archive file names.
//!
//! A backup of `src/Foo.kt` taken at `2024-01-02_03-04-05` is stored as
//! `src/Foo_2024-01-02_03-04-05.kt`. The tag goes immediately before the last
//! extension; names without an extension (including dotfiles such as
//! `.gitignore`) get the tag appended.

use crate::utils::time::{ARCHIVE_TAG_LEN, parse_archive_stamp};
use std::path::{Path, PathBuf};

/// A file name split into stem, version tag and extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedName {
    /// File name without the extension, e.g. `Foo`
    pub stem: String,
    /// Archive timestamp tag, e.g. `2024-01-02_03-04-05`
    pub timestamp: String,
    /// Extension including the leading dot, or empty
    pub extension: String,
}

impl VersionedName {
    /// Splits an original file name and attaches `timestamp`
    #[must_use]
    pub fn new(file_name: &str, timestamp: &str) -> Self {
        let (stem, extension) = split_extension(file_name);
        Self {
            stem: stem.to_string(),
            timestamp: timestamp.to_string(),
            extension: extension.to_string(),
        }
    }

    /// Recovers stem, tag and extension from an archived file name
    ///
    /// Returns `None` if the name does not carry a valid version tag.
    #[must_use]
    pub fn parse(archived: &str) -> Option<Self> {
        let (base, extension) = split_extension(archived);
        let split = base.len().checked_sub(ARCHIVE_TAG_LEN + 1)?;
        if !base.is_char_boundary(split) {
            return None;
        }
        let (stem, tagged) = base.split_at(split);
        let timestamp = tagged.strip_prefix('_')?;
        parse_archive_stamp(timestamp)?;

        Some(Self {
            stem: stem.to_string(),
            timestamp: timestamp.to_string(),
            extension: extension.to_string(),
        })
    }

    /// Renders `<stem>_<timestamp><ext>`
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}_{}{}", self.stem, self.timestamp, self.extension)
    }

    /// The original, untagged file name
    #[must_use]
    pub fn original_name(&self) -> String {
        format!("{}{}", self.stem, self.extension)
    }
}

/// Archive location for a relative key under a contributor directory
///
/// Every directory component of `key` is preserved; only the final file
/// name receives the tag.
#[must_use]
pub fn versioned_path(contributor_dir: &Path, key: &str, timestamp: &str) -> PathBuf {
    let mut parts: Vec<&str> = key.split('/').filter(|p| !p.is_empty()).collect();
    let file_name = parts.pop().unwrap_or_default();
    let dir = parts
        .into_iter()
        .fold(contributor_dir.to_path_buf(), |path, part| path.join(part));
    dir.join(VersionedName::new(file_name, timestamp).file_name())
}

/// Splits at the last dot, ignoring a leading dot
///
/// Mirrors `Path::file_stem`/`Path::extension`: `a.tar.gz` → (`a.tar`, `.gz`),
/// `.gitignore` → (`.gitignore`, ``), `Makefile` → (`Makefile`, ``).
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(0) | None => (name, ""),
        Some(idx) => name.split_at(idx),
    }
}
