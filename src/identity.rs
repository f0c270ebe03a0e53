//! Contributor identity.
//!
//! Each contributor's backups live in their own archive subdirectory. The
//! active name is stored as a single line in `.developer_name`; the daemon
//! reads it once at start and falls back to [`crate::UNKNOWN_CONTRIBUTOR`]
//! when it is missing or unusable.

use anyhow::{Context, Result, bail};
use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::debug;

/// Trims and validates a contributor name for use as a directory name
///
/// # Errors
///
/// Returns an error if the name is empty, contains a path separator, or is
/// a relative path component such as `..`.
pub fn sanitize(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Contributor name cannot be empty");
    }
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        bail!("Contributor name '{name}' cannot be used as a directory name");
    }
    Ok(name.to_string())
}

/// Reads the stored contributor, if any
#[must_use]
pub fn read(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    let line = content.lines().next().unwrap_or_default();
    sanitize(line).ok()
}

/// Reads the stored contributor or the fallback identity
#[must_use]
pub fn read_or_default(path: &Path) -> String {
    read(path).unwrap_or_else(|| {
        debug!(path = %path.display(), "No contributor recorded, using fallback");
        crate::UNKNOWN_CONTRIBUTOR.to_string()
    })
}

/// Stores the contributor name
///
/// # Errors
///
/// Returns an error if the name is invalid or the file cannot be written.
pub fn write(path: &Path, name: &str) -> Result<String> {
    let name = sanitize(name)?;
    fs::write(path, &name)
        .with_context(|| format!("Failed to write contributor file: {}", path.display()))?;
    Ok(name)
}

/// Asks the operator who is working on the project
///
/// With a non-empty `candidates` list a numbered menu is shown and the
/// answer must be one of the numbers (or one of the names). Otherwise any
/// valid name is accepted. Invalid answers are re-asked until input ends.
///
/// # Errors
///
/// Returns an error if input ends before a valid answer or I/O fails.
pub fn prompt<R: BufRead, W: Write>(
    candidates: &[String],
    input: &mut R,
    output: &mut W,
) -> Result<String> {
    writeln!(output)?;
    writeln!(output, "Who is working on this project?")?;
    for (i, name) in candidates.iter().enumerate() {
        writeln!(output, "  {}. {}", i + 1, name)?;
    }
    writeln!(output)?;

    loop {
        if candidates.is_empty() {
            write!(output, "Enter your name: ")?;
        } else {
            write!(output, "Enter your choice (1-{}): ", candidates.len())?;
        }
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("No contributor selected");
        }
        let answer = line.trim();

        let chosen = if candidates.is_empty() {
            sanitize(answer).ok()
        } else {
            answer
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| candidates.get(i))
                .or_else(|| candidates.iter().find(|c| c.as_str() == answer))
                .and_then(|c| sanitize(c).ok())
        };

        match chosen {
            Some(name) => return Ok(name),
            None if candidates.is_empty() => writeln!(output, "Invalid name. Please try again.")?,
            None => writeln!(
                output,
                "Invalid choice. Please enter a number between 1 and {}.",
                candidates.len()
            )?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn names() -> Vec<String> {
        vec!["Muhammad".to_string(), "Malik".to_string()]
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("  alice \n").unwrap(), "alice");
        assert!(sanitize("").is_err());
        assert!(sanitize("   ").is_err());
        assert!(sanitize("a/b").is_err());
        assert!(sanitize("..").is_err());
    }

    #[test]
    fn test_read_missing_falls_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".developer_name");
        assert_eq!(read(&path), None);
        assert_eq!(read_or_default(&path), "Unknown");
    }

    #[test]
    fn test_write_then_read() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".developer_name");
        write(&path, " Malik\n").unwrap();
        assert_eq!(read(&path).as_deref(), Some("Malik"));
    }

    #[test]
    fn test_read_blank_file_falls_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".developer_name");
        fs::write(&path, "\n").unwrap();
        assert_eq!(read_or_default(&path), "Unknown");
    }

    #[test]
    fn test_prompt_menu_by_number() {
        let mut input = Cursor::new("2\n");
        let mut output = Vec::new();
        let name = prompt(&names(), &mut input, &mut output).unwrap();
        assert_eq!(name, "Malik");
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("1. Muhammad"));
    }

    #[test]
    fn test_prompt_menu_retries_invalid() {
        let mut input = Cursor::new("7\nzero\n1\n");
        let mut output = Vec::new();
        let name = prompt(&names(), &mut input, &mut output).unwrap();
        assert_eq!(name, "Muhammad");
        let shown = String::from_utf8(output).unwrap();
        assert_eq!(shown.matches("Invalid choice").count(), 2);
    }

    #[test]
    fn test_prompt_menu_by_name() {
        let mut input = Cursor::new("Malik\n");
        let name = prompt(&names(), &mut input, &mut Vec::new()).unwrap();
        assert_eq!(name, "Malik");
    }

    #[test]
    fn test_prompt_free_text() {
        let mut input = Cursor::new("../x\n  dana  \n");
        let name = prompt(&[], &mut input, &mut Vec::new()).unwrap();
        assert_eq!(name, "dana");
    }

    #[test]
    fn test_prompt_eof() {
        let mut input = Cursor::new("");
        assert!(prompt(&names(), &mut input, &mut Vec::new()).is_err());
    }
}
