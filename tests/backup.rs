// ABOUTME: Tests for live directory snapshots and backup rotation.
// ABOUTME: Uses real archives in temporary directories.

mod support;

use proptest::prelude::*;
use std::fs;
use std::path::Path;
use stevedore::archive::unpack;
use stevedore::backup::BackupManager;
use stevedore::types::{AppName, ExcludePattern};
use support::fixtures;

fn app() -> AppName {
    AppName::new("demo").unwrap()
}

fn excludes(patterns: &[&str]) -> Vec<ExcludePattern> {
    patterns
        .iter()
        .map(|p| ExcludePattern::parse(p).unwrap())
        .collect()
}

fn populate(live: &Path) {
    fs::create_dir_all(live.join("lib")).unwrap();
    fs::create_dir_all(live.join("node_modules/left-pad")).unwrap();
    fs::write(live.join("index.js"), "v0").unwrap();
    fs::write(live.join("lib/util.js"), "util").unwrap();
    fs::write(live.join("node_modules/left-pad/index.js"), "pad").unwrap();
}

#[test]
fn backup_skips_excluded_entries_and_round_trips() {
    let root = tempfile::tempdir().unwrap();
    let live = root.path().join("live");
    populate(&live);

    let manager = BackupManager::new(root.path().join("backups"), 3, excludes(&["node_modules"]));
    let archive = manager.snapshot(&live, &app()).unwrap().unwrap();

    assert!(archive.path.starts_with(manager.backup_dir()));
    assert!(
        archive
            .path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("demo_")
    );

    let restored = root.path().join("restored");
    unpack(&archive.path, &restored).unwrap();
    assert_eq!(fixtures::entries(&restored), vec!["index.js", "lib"]);
    assert_eq!(fs::read_to_string(restored.join("lib/util.js")).unwrap(), "util");
}

#[test]
fn empty_live_dir_produces_no_backup() {
    let root = tempfile::tempdir().unwrap();
    let live = root.path().join("live");
    fs::create_dir_all(&live).unwrap();

    let manager = BackupManager::new(root.path().join("backups"), 3, Vec::new());
    assert!(manager.snapshot(&live, &app()).unwrap().is_none());
    assert!(!manager.backup_dir().exists());
}

#[test]
fn list_is_newest_first_and_latest_matches() {
    let root = tempfile::tempdir().unwrap();
    let live = root.path().join("live");
    populate(&live);

    let manager = BackupManager::new(root.path().join("backups"), 5, Vec::new());
    let first = manager.snapshot(&live, &app()).unwrap().unwrap();
    let second = manager.snapshot(&live, &app()).unwrap().unwrap();

    let listed = manager.list(&app()).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0], second);
    assert_eq!(listed[1], first);
    assert_eq!(manager.latest(&app()).unwrap(), Some(second));
}

#[test]
fn snapshot_leaves_rotation_to_prune() {
    let root = tempfile::tempdir().unwrap();
    let live = root.path().join("live");
    populate(&live);

    let manager = BackupManager::new(root.path().join("backups"), 1, Vec::new());
    let first = manager.snapshot(&live, &app()).unwrap().unwrap();
    let second = manager.snapshot(&live, &app()).unwrap().unwrap();
    assert_eq!(manager.list(&app()).unwrap().len(), 2);

    let removed = manager.prune(&app()).unwrap();
    assert_eq!(removed, vec![first.path]);
    assert_eq!(manager.list(&app()).unwrap(), vec![second]);
}

#[test]
fn excluded_names_are_skipped_at_any_depth() {
    let root = tempfile::tempdir().unwrap();
    let live = root.path().join("live");
    populate(&live);
    fs::create_dir_all(live.join("lib/cache")).unwrap();
    fs::write(live.join("lib/cache/entry.bin"), "cached").unwrap();
    fs::write(live.join("lib/app.log.1"), "rotated").unwrap();

    let manager = BackupManager::new(
        root.path().join("backups"),
        3,
        excludes(&["node_modules", "cache", "*.log.[0-9]"]),
    );
    let archive = manager.snapshot(&live, &app()).unwrap().unwrap();

    let restored = root.path().join("restored");
    unpack(&archive.path, &restored).unwrap();
    assert_eq!(fixtures::entries(&restored.join("lib")), vec!["util.js"]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn rotation_keeps_only_the_newest(retained in 1usize..4, runs in 1usize..7) {
        let root = tempfile::tempdir().unwrap();
        let live = root.path().join("live");
        fs::create_dir_all(&live).unwrap();
        fs::write(live.join("index.js"), "x").unwrap();

        let manager = BackupManager::new(root.path().join("backups"), retained, Vec::new());
        let mut created = Vec::new();
        for _ in 0..runs {
            created.push(manager.snapshot(&live, &app()).unwrap().unwrap());
            manager.prune(&app()).unwrap();
        }

        let listed = manager.list(&app()).unwrap();
        prop_assert_eq!(listed.len(), runs.min(retained));

        let newest: Vec<_> = created.iter().rev().take(retained).cloned().collect();
        prop_assert_eq!(listed, newest);
    }
}
