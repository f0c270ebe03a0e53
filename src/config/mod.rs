pub mod validator;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Settings read from `backup_config.json`.
///
/// Every field has a default so partial files keep working; a missing file is
/// created with [`Config::default`] on first load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// When false the daemon stays armed but never scans.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Seconds between two polls.
    #[serde(default = "default_backup_interval")]
    pub backup_interval: u64,

    /// File name suffixes that are never backed up (case-sensitive).
    #[serde(default = "default_exclude_extensions")]
    pub exclude_extensions: Vec<String>,

    /// Directory names pruned during traversal, at any depth.
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,

    /// Name of the archive directory under the project root.
    #[serde(default = "default_archive_dir")]
    pub archive_dir: String,

    /// Names offered by the contributor prompt. Empty means free-text entry.
    #[serde(default)]
    pub contributors: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            backup_interval: default_backup_interval(),
            exclude_extensions: default_exclude_extensions(),
            skip_dirs: default_skip_dirs(),
            archive_dir: default_archive_dir(),
            contributors: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The default configuration cannot be written for a missing file
    /// - Cannot read or parse the configuration file
    /// - Configuration file contains invalid JSON
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            // Create default config if it doesn't exist
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        Self::load_or_default(path)
    }

    /// Load configuration without ever writing it
    ///
    /// A missing file yields [`Config::default`].
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid JSON for this schema.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Invalid JSON configuration")
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories
    /// - Cannot write to the file
    /// - JSON serialization fails
    pub fn save(&self, path: &Path) -> Result<()> {
        crate::utils::paths::ensure_parent_dirs(path)?;

        let json = serde_json::to_string_pretty(self)?;
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create config file: {}", path.display()))?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }

    /// Poll period as a duration.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.backup_interval)
    }

    /// Rejects an `archive_dir` that is not a single plain directory name.
    ///
    /// The archive is pruned by name during scans, so a nested path, an
    /// empty name, `.` or `..` would either get re-archived every poll or
    /// place records outside the project.
    ///
    /// # Errors
    ///
    /// Returns an error naming the offending value.
    pub fn check_archive_dir(&self) -> Result<()> {
        if !is_plain_dir_name(&self.archive_dir) {
            bail!(
                "archive_dir '{}' must be a plain directory name inside the project",
                self.archive_dir
            );
        }
        Ok(())
    }

    /// Directory names to prune, always including the archive directory.
    #[must_use]
    pub fn effective_skip_dirs(&self) -> Vec<String> {
        let mut dirs = self.skip_dirs.clone();
        if !dirs.iter().any(|d| d == &self.archive_dir) {
            dirs.push(self.archive_dir.clone());
        }
        dirs
    }
}

/// Whether `name` is a single directory name that stays inside its parent
#[must_use]
pub fn is_plain_dir_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}

// Default functions for serde
const fn default_enabled() -> bool {
    true
}

const fn default_backup_interval() -> u64 {
    180 // 3 minutes
}

fn default_exclude_extensions() -> Vec<String> {
    [".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_skip_dirs() -> Vec<String> {
    ["build", ".gradle", ".kotlin", ".git", ".idea"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_archive_dir() -> String {
    "RevisionHistory".to_string()
}
