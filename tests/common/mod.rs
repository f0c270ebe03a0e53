#![allow(dead_code)]

use anyhow::Result;
use autobackup::BackupContext;
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test project fixture for consistent test setup
pub struct TestProject {
    pub temp_dir: TempDir,
    pub ctx: BackupContext,
}

impl TestProject {
    /// Create an empty project with a default configuration file
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let ctx = BackupContext::new_explicit(temp_dir.path().to_path_buf())?;
        Ok(Self { temp_dir, ctx })
    }

    /// Project root (canonicalized)
    pub fn path(&self) -> &Path {
        &self.ctx.paths.root
    }

    /// Write `content` to a project-relative file with a fixed mtime
    pub fn write(&self, rel: &str, content: &str, mtime_secs: i64) -> Result<PathBuf> {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        filetime::set_file_mtime(&path, FileTime::from_unix_time(mtime_secs, 0))?;
        Ok(path)
    }

    /// Every file under the contributor's archive directory, relative and sorted
    pub fn archived(&self, contributor: &str) -> Vec<String> {
        let dir = self.ctx.archive_root().join(contributor);
        if !dir.exists() {
            return Vec::new();
        }
        let mut files: Vec<String> = walkdir::WalkDir::new(&dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| autobackup::utils::paths::relative_key(e.path(), &dir))
            .collect();
        files.sort();
        files
    }
}
