use super::{Config, is_plain_dir_name};
use anyhow::{Context, Result};
use colored::Colorize;
use std::collections::HashSet;
use std::path::Path;

/// Checks a configuration for values and fields that will not behave as intended
pub struct ConfigValidator {
    /// Top-level keys recognized in `backup_config.json`
    known_fields: HashSet<&'static str>,
}

impl ConfigValidator {
    /// Create a new validator with known configuration fields
    #[must_use]
    pub fn new() -> Self {
        let known_fields = [
            "enabled",
            "backup_interval",
            "exclude_extensions",
            "skip_dirs",
            "archive_dir",
            "contributors",
        ]
        .into_iter()
        .collect();

        Self { known_fields }
    }

    /// Validate loaded values, returning one message per problem found
    #[must_use]
    pub fn validate(&self, config: &Config) -> Vec<String> {
        let mut issues = Vec::new();

        if config.backup_interval == 0 {
            issues.push("backup_interval is 0; every tick will trigger a scan".to_string());
        }

        if config.exclude_extensions.iter().any(String::is_empty) {
            issues.push(
                "exclude_extensions contains an empty suffix, which excludes every file"
                    .to_string(),
            );
        }

        for dir in &config.skip_dirs {
            if has_separator(dir) {
                issues.push(format!(
                    "skip_dirs entry '{}' contains a path separator; only plain directory names are matched",
                    dir.yellow()
                ));
            }
        }

        if !is_plain_dir_name(&config.archive_dir) {
            issues.push(format!(
                "archive_dir '{}' must be a plain directory name",
                config.archive_dir.yellow()
            ));
        }

        for name in &config.contributors {
            if name.trim().is_empty() || has_separator(name) {
                issues.push(format!(
                    "contributors entry '{}' cannot be used as a directory name",
                    name.yellow()
                ));
            }
        }

        issues
    }

    /// List top-level keys in the config file that autobackup does not recognize
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub fn unknown_fields(&self, config_path: &Path) -> Result<Vec<String>> {
        if !config_path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
        let parsed: serde_json::Value =
            serde_json::from_str(&content).context("Invalid JSON configuration")?;

        let mut unknown: Vec<String> = parsed
            .as_object()
            .map(|map| {
                map.keys()
                    .filter(|key| !self.known_fields.contains(key.as_str()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        unknown.sort();
        Ok(unknown)
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a name would be interpreted as a nested path
fn has_separator(name: &str) -> bool {
    name.contains('/') || name.contains('\\')
}
