use autobackup::storage::{VersionedName, versioned_path};
use autobackup::tracking::{ScanResult, TrackedState, diff};
use proptest::prelude::*;
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};

fn snapshot() -> impl Strategy<Value = ScanResult> {
    prop::collection::btree_map("[a-z]{1,8}(/[a-z]{1,8}){0,2}\\.[a-z]{1,3}", 0u64..1_000_000, 0..40)
        .prop_map(|m| {
            m.into_iter()
                .map(|(k, secs)| (k, UNIX_EPOCH + Duration::from_secs(secs)))
                .collect()
        })
}

fn archive_tag() -> impl Strategy<Value = String> {
    (2000u32..2100, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60, 0u32..60).prop_map(
        |(y, mo, d, h, mi, s)| format!("{y:04}-{mo:02}-{d:02}_{h:02}-{mi:02}-{s:02}"),
    )
}

proptest! {
    #[test]
    fn test_unchanged_timestamps_never_reported(tracked in snapshot()) {
        // Same snapshot on both sides: nothing is new or newer
        let current: ScanResult = tracked.clone();
        prop_assert!(diff(&tracked, &current).is_empty());
    }

    #[test]
    fn test_diff_is_exactly_new_or_newer(tracked in snapshot(), current in snapshot()) {
        let changed = diff(&tracked, &current);

        for (path, modified) in &current {
            let expected = tracked.get(path).is_none_or(|seen| modified > seen);
            prop_assert_eq!(changed.contains(path), expected, "path {}", path);
        }
        // Deleted paths are never reported
        prop_assert!(changed.iter().all(|p| current.contains_key(p)));
    }

    #[test]
    fn test_rebased_baseline_reports_nothing(current in snapshot()) {
        let tracked: TrackedState = current.clone();
        prop_assert!(diff(&tracked, &current).is_empty());
        prop_assert_eq!(diff(&TrackedState::new(), &current).len(), current.len());
    }

    #[test]
    fn test_versioned_name_parses_back(
        stem in "[A-Za-z0-9_-]{1,16}",
        ext in "(\\.[a-z0-9]{1,5})?",
        tag in archive_tag(),
    ) {
        let original = format!("{stem}{ext}");
        let name = VersionedName::new(&original, &tag);
        let parsed = VersionedName::parse(&name.file_name()).expect("tagged name parses");

        prop_assert_eq!(&parsed.stem, &stem);
        prop_assert_eq!(&parsed.extension, &ext);
        prop_assert_eq!(&parsed.timestamp, &tag);
        prop_assert_eq!(parsed.original_name(), original);
    }

    #[test]
    fn test_versioned_path_keeps_directories(
        dirs in prop::collection::vec("[a-z]{1,6}", 0..4),
        file in "[a-z]{1,6}\\.[a-z]{1,3}",
        tag in archive_tag(),
    ) {
        let key = dirs.iter().cloned().chain([file.clone()]).collect::<Vec<_>>().join("/");
        let base = Path::new("/archive/alice");
        let path = versioned_path(base, &key, &tag);

        let mut expected_parent = base.to_path_buf();
        for d in &dirs {
            expected_parent.push(d);
        }
        prop_assert_eq!(path.parent(), Some(expected_parent.as_path()));
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let parsed = VersionedName::parse(file_name).expect("tagged name parses");
        prop_assert_eq!(parsed.original_name(), file);
    }
}
