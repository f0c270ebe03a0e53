//! Directory scanner producing path → modification time snapshots.
//!
//! `FileScanner` walks the project tree once per poll. Directories listed in
//! the skip set are pruned before they are entered, so build output, VCS
//! metadata and the archive itself cost nothing. Files the scanner cannot
//! stat are left out of the snapshot instead of failing the walk.

use crate::config::Config;
use crate::tracking::ScanResult;
use crate::utils::{has_excluded_suffix, is_reserved_name, paths::relative_key};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, span};
use walkdir::{DirEntry, WalkDir};

/// Filtering rules applied during a scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanRules {
    /// Directory names pruned at any depth
    pub skip_dirs: HashSet<String>,
    /// File name suffixes that are never recorded
    pub exclude_suffixes: Vec<String>,
    /// Exact file names that are never recorded
    pub reserved_names: Vec<String>,
}

impl ScanRules {
    /// Builds the rules for a project from its configuration
    ///
    /// The archive directory is always pruned and the daemon's own control
    /// files are always reserved.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            skip_dirs: config.effective_skip_dirs().into_iter().collect(),
            exclude_suffixes: config.exclude_extensions.clone(),
            reserved_names: crate::RESERVED_NAMES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Scanner for one project root
pub struct FileScanner {
    /// Directory whose contents are scanned
    root: PathBuf,
    /// Filters applied to the walk
    rules: ScanRules,
}

impl FileScanner {
    /// Create a new scanner
    ///
    /// # Arguments
    ///
    /// * `root` - Project directory; keys in the result are relative to it
    /// * `rules` - Skip, exclude and reserved-name filters
    #[must_use]
    pub const fn new(root: PathBuf, rules: ScanRules) -> Self {
        Self { root, rules }
    }

    /// The scanned directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the tree and record every retained file's modification time
    ///
    /// Never fails: unreadable directories are not descended into and files
    /// that vanish or cannot be stat'ed mid-walk are omitted.
    #[must_use]
    pub fn scan(&self) -> ScanResult {
        let span = span!(Level::DEBUG, "scan", root = %self.root.display());
        let _guard = span.enter();

        let mut files = ScanResult::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !self.is_pruned(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            let Some(name) = entry.file_name().to_str() else {
                debug!(path = %entry.path().display(), "Skipping non UTF-8 file name");
                continue;
            };
            if is_reserved_name(name, &self.rules.reserved_names)
                || has_excluded_suffix(name, &self.rules.exclude_suffixes)
            {
                continue;
            }

            // Follows symlinks so linked files are recorded by their target's mtime
            let modified = match std::fs::metadata(entry.path()) {
                Ok(meta) if meta.is_file() => meta.modified(),
                Ok(_) => continue,
                Err(e) => Err(e),
            };
            let modified = match modified {
                Ok(time) => time,
                Err(e) => {
                    debug!(path = %entry.path().display(), error = %e, "Cannot stat file");
                    continue;
                }
            };

            if let Some(key) = relative_key(entry.path(), &self.root) {
                files.insert(key, modified);
            }
        }

        debug!(files = files.len(), "Scan complete");
        files
    }

    /// Whether a directory entry is inside the skip set
    ///
    /// The root itself is never pruned even if its own name is listed.
    fn is_pruned(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.rules.skip_dirs.contains(name))
    }
}

/// Convenience wrapper around [`FileScanner::scan`]
#[must_use]
pub fn scan(root: &Path, rules: &ScanRules) -> ScanResult {
    FileScanner::new(root.to_path_buf(), rules.clone()).scan()
}
