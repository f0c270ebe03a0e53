#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
#![allow(clippy::indexing_slicing)] // Bounds checked by logic

//! # autobackup - Background Revision History for Project Directories
//!
//! autobackup runs a small daemon next to a project and periodically copies
//! every file that changed since the previous poll into a per-contributor
//! history folder, tagging each copy with the time of the poll.
//!
//! ## Features
//!
//! - **Singleton Daemon**: one detached instance per project, tracked by a
//!   marker file and confirmed against the OS process table
//! - **Mtime Change Detection**: cheap scans that compare modification times
//!   against the previous scan; the first scan only seeds the baseline
//! - **Append-Only History**: every change becomes an immutable
//!   `<stem>_<timestamp><ext>` copy, nothing is ever overwritten or pruned
//! - **Pruned Traversal**: build output, VCS metadata and the archive itself
//!   are never walked
//!
//! ## Architecture
//!
//! - [`scanner`]: Filesystem walk producing path → mtime snapshots
//! - [`tracking`]: Baseline state and change detection between snapshots
//! - [`storage`]: Versioned archive naming and the backup writer
//! - [`marker`]: The on-disk service marker (PID, start time, last backup)
//! - [`process`]: Liveness probes, detached spawning and the process controller
//! - [`daemon`]: The polling loop run by the background instance
//! - [`config`]: JSON configuration loading and validation
//! - [`commands`]: Operator-facing command implementations
//!
//! ## Example Usage
//!
//! ```no_run
//! use autobackup::BackupContext;
//!
//! # fn main() -> anyhow::Result<()> {
//! let ctx = BackupContext::new("/path/to/project".into())?;
//! let status = ctx.controller().status();
//! println!("running: {}", status.running);
//! # Ok(())
//! # }
//! ```

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// Commands module containing all CLI command implementations.
pub mod commands;

/// Configuration parsing, validation, and management.
pub mod config;

/// The background polling loop.
pub mod daemon;

/// Contributor identity storage and the first-run prompt.
pub mod identity;

/// Service marker file proving a daemon instance is active.
pub mod marker;

/// Output formatting for operator commands.
pub mod output;

/// Process liveness, termination and detached spawning.
pub mod process;

/// Filesystem scanning with directory pruning and suffix exclusion.
pub mod scanner;

/// Versioned archive layout and the backup writer.
pub mod storage;

/// Tracked baseline state and change detection.
pub mod tracking;

/// Utility functions and helpers.
pub mod utils;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Current version of the autobackup binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration file name, relative to the project root.
pub const CONFIG_FILE: &str = "backup_config.json";

/// Service marker file name, relative to the project root.
pub const MARKER_FILE: &str = ".backup_pid";

/// Contributor identity file name, relative to the project root.
pub const CONTRIBUTOR_FILE: &str = ".developer_name";

/// Daemon log file name, relative to the project root.
pub const LOG_FILE: &str = ".backup.log";

/// Contributor used when no identity has been recorded.
pub const UNKNOWN_CONTRIBUTOR: &str = "Unknown";

/// Environment variable selecting the project directory.
pub const PROJECT_ENV: &str = "AUTOBACKUP_PROJECT";

/// Environment variable holding the tracing filter directive.
pub const LOG_ENV: &str = "AUTOBACKUP_LOG";

/// File names owned by autobackup itself; these are never scanned.
pub const RESERVED_NAMES: [&str; 4] = [CONFIG_FILE, MARKER_FILE, CONTRIBUTOR_FILE, LOG_FILE];

/// Resolved locations of every file autobackup reads or writes in a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    /// Project directory being backed up.
    pub root: PathBuf,
    /// `backup_config.json`.
    pub config: PathBuf,
    /// `.backup_pid`.
    pub marker: PathBuf,
    /// `.developer_name`.
    pub contributor: PathBuf,
    /// `.backup.log`.
    pub log: PathBuf,
}

impl ProjectPaths {
    /// Derives all control file locations from the project root.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            config: root.join(CONFIG_FILE),
            marker: root.join(MARKER_FILE),
            contributor: root.join(CONTRIBUTOR_FILE),
            log: root.join(LOG_FILE),
        }
    }

    /// Root of the revision history for all contributors.
    #[must_use]
    pub fn archive_root(&self, config: &config::Config) -> PathBuf {
        self.root.join(&config.archive_dir)
    }
}

/// Central context for all autobackup operations.
///
/// Holds the project location, the resolved control file paths and the
/// loaded configuration. Every command builds one of these first.
///
/// # Examples
///
/// ```no_run
/// use autobackup::BackupContext;
///
/// # fn main() -> anyhow::Result<()> {
/// // Context for the current directory
/// let ctx = BackupContext::from_env(None)?;
///
/// // Context for an explicit project (for testing)
/// let ctx = BackupContext::new("/tmp/project".into())?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BackupContext {
    /// Control file locations for the project.
    pub paths: ProjectPaths,

    /// Loaded configuration settings.
    pub config: config::Config,

    /// Whether to run in non-interactive mode (no prompts).
    /// Used primarily for testing to prevent stdin reads.
    pub non_interactive: bool,
}

impl BackupContext {
    /// Creates a context for `project`, falling back to the current directory.
    ///
    /// # Errors
    /// Returns an error if the current directory cannot be determined or the
    /// configuration cannot be loaded.
    pub fn from_env(project: Option<PathBuf>) -> Result<Self> {
        Self::new(Self::project_root(project)?)
    }

    /// Like [`BackupContext::from_env`] but never writes a configuration file.
    ///
    /// Used by commands that only inspect or stop a daemon.
    ///
    /// # Errors
    /// Returns an error if the current directory cannot be determined or an
    /// existing configuration cannot be loaded.
    pub fn from_env_read_only(project: Option<PathBuf>) -> Result<Self> {
        Self::read_only(Self::project_root(project)?)
    }

    /// The explicit project directory or the current directory.
    fn project_root(project: Option<PathBuf>) -> Result<PathBuf> {
        match project {
            Some(path) => Ok(path),
            None => std::env::current_dir().context("Could not determine current directory"),
        }
    }

    /// Creates a context for an explicit project root.
    ///
    /// The root is canonicalized so that the spawned daemon and the
    /// controlling command agree on every path. A missing configuration file
    /// is created with defaults.
    ///
    /// # Errors
    /// Returns an error if the project directory does not exist, the
    /// configuration file cannot be read, parsed or created, or its
    /// `archive_dir` is not a plain directory name.
    pub fn new(root: PathBuf) -> Result<Self> {
        Self::open(root, true)
    }

    /// Creates a context without creating a missing configuration file.
    ///
    /// # Errors
    /// Same as [`BackupContext::new`], minus the file creation.
    pub fn read_only(root: PathBuf) -> Result<Self> {
        Self::open(root, false)
    }

    /// Resolves paths and loads the configuration, optionally writing defaults.
    fn open(root: PathBuf, create_config: bool) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("Project directory not found: {}", root.display()))?;
        let paths = ProjectPaths::new(&root);

        let config = if create_config {
            config::Config::load(&paths.config)?
        } else {
            config::Config::load_or_default(&paths.config)?
        };
        config
            .check_archive_dir()
            .with_context(|| format!("Invalid configuration: {}", paths.config.display()))?;

        // Validate configuration and warn about issues
        let validator = config::validator::ConfigValidator::new();
        for issue in validator.validate(&config) {
            output::warning(&format!("Warning: {issue}"));
        }
        if let Ok(unknown) = validator.unknown_fields(&paths.config) {
            for field in unknown {
                output::warning(&format!("Warning: Unknown configuration field: {field}"));
            }
        }

        Ok(Self {
            paths,
            config,
            non_interactive: false,
        })
    }

    /// Creates a context with explicit paths and prompts disabled.
    ///
    /// # Errors
    /// Returns an error if the configuration cannot be loaded or created.
    pub fn new_explicit(root: PathBuf) -> Result<Self> {
        let mut context = Self::new(root)?;
        context.non_interactive = true;
        Ok(context)
    }

    /// Root of the revision history for all contributors.
    #[must_use]
    pub fn archive_root(&self) -> PathBuf {
        self.paths.archive_root(&self.config)
    }

    /// Builds the process controller for this project with the platform probe.
    #[must_use]
    pub fn controller(&self) -> process::ProcessController {
        process::ProcessController::new(self.paths.clone(), process::platform_probe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_new_writes_default_config() -> Result<()> {
        let temp = TempDir::new()?;
        let ctx = BackupContext::new(temp.path().to_path_buf())?;
        assert!(ctx.paths.config.exists());
        Ok(())
    }

    #[test]
    fn test_read_only_leaves_project_untouched() -> Result<()> {
        let temp = TempDir::new()?;
        let ctx = BackupContext::read_only(temp.path().to_path_buf())?;
        assert_eq!(ctx.config, config::Config::default());
        assert!(!ctx.paths.config.exists());
        Ok(())
    }

    #[test]
    fn test_nested_archive_dir_is_rejected() -> Result<()> {
        let temp = TempDir::new()?;
        for archive_dir in ["history/store", "", "..", "."] {
            fs::write(
                temp.path().join(CONFIG_FILE),
                format!(r#"{{ "archive_dir": "{archive_dir}" }}"#),
            )?;
            let err = BackupContext::new(temp.path().to_path_buf())
                .expect_err("archive_dir must be a plain name");
            assert!(format!("{err:#}").contains("plain directory name"), "{archive_dir}");
            assert!(BackupContext::read_only(temp.path().to_path_buf()).is_err());
        }
        Ok(())
    }
}
