//! Utility functions and helpers.
//!
//! - [`paths`]: Relative path keys and directory creation
//! - [`time`]: Timestamp formats shared by the marker and the archive
//!
//! # Examples
//!
//! ```
//! use autobackup::utils::has_excluded_suffix;
//!
//! let suffixes = vec![".png".to_string()];
//! assert!(has_excluded_suffix("logo.png", &suffixes));
//! assert!(!has_excluded_suffix("logo.PNG", &suffixes));
//! ```

/// Path manipulation and resolution utilities
pub mod paths;
/// Marker and archive timestamp formatting
pub mod time;

/// Whether `name` ends with any of the given suffixes.
///
/// Matching is case-sensitive and purely textual, so `.tar.gz` excludes
/// `bundle.tar.gz` and `.png` does not exclude `logo.PNG`.
#[must_use]
pub fn has_excluded_suffix(name: &str, suffixes: &[String]) -> bool {
    suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
}

/// Whether `name` is one of the daemon's own control files.
///
/// Also matches the `<name>.XXXXXX` temporaries used for atomic rewrites.
#[must_use]
pub fn is_reserved_name(name: &str, reserved: &[String]) -> bool {
    reserved.iter().any(|r| {
        name == r
            || name
                .strip_prefix(r.as_str())
                .and_then(|rest| rest.strip_prefix('.'))
                .is_some_and(|tail| !tail.is_empty() && tail.chars().all(|c| c.is_ascii_alphanumeric()))
    })
}
