//! Timestamp formats.
//!
//! The marker file stores human-readable times (`2024-01-02 03:04:05`) while
//! archive names use a filesystem-safe variant (`2024-01-02_03-04-05`). Both
//! are local time with second resolution.

use chrono::{DateTime, Local, NaiveDateTime};

/// Format of the start and last-backup lines in the marker file.
pub const MARKER_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of the version tag inserted into archive file names.
pub const ARCHIVE_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Length of a rendered archive tag, e.g. `2024-01-02_03-04-05`.
pub const ARCHIVE_TAG_LEN: usize = 19;

/// Renders a time for the marker file.
#[must_use]
pub fn marker_stamp(time: &NaiveDateTime) -> String {
    time.format(MARKER_FORMAT).to_string()
}

/// Renders a time as an archive version tag.
#[must_use]
pub fn archive_stamp(time: &DateTime<Local>) -> String {
    time.format(ARCHIVE_FORMAT).to_string()
}

/// Parses a marker timestamp line.
#[must_use]
pub fn parse_marker_stamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), MARKER_FORMAT).ok()
}

/// Parses an archive version tag.
#[must_use]
pub fn parse_archive_stamp(text: &str) -> Option<NaiveDateTime> {
    if text.len() != ARCHIVE_TAG_LEN {
        return None;
    }
    NaiveDateTime::parse_from_str(text, ARCHIVE_FORMAT).ok()
}
