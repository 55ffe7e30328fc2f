mod common;

use std::fs::File;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use well_dedup::discovery::{discover_candidates, newest_export, wait_for_export};
use well_dedup::naming::extract_project_name;

use common::TestWorkspace;

fn age(path: &PathBuf, seconds_ago: u64) {
    let file = File::options().write(true).open(path).expect("open for mtime");
    file.set_modified(SystemTime::now() - Duration::from_secs(seconds_ago))
        .expect("set mtime");
}

#[test]
fn directory_scan_ignores_non_csv_and_deletion_files() {
    let ws = TestWorkspace::new();
    ws.write("Delaware_Basin_wells.csv", common::HEADER);
    ws.write("eagleford.csv", common::HEADER);
    ws.write("eagleford.txt", common::HEADER);
    ws.write("wells_removed_by_new_method_Delaware.csv", common::HEADER);
    ws.write("budget.csv", "a,b\n");

    let candidates = discover_candidates(ws.path()).unwrap();
    let names = |paths: &[PathBuf]| {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
    };
    assert_eq!(
        names(&candidates.datasets),
        vec!["Delaware_Basin_wells.csv", "eagleford.csv"]
    );
    assert_eq!(
        names(&candidates.deletion_files),
        vec!["wells_removed_by_new_method_Delaware.csv"]
    );
    assert_eq!(extract_project_name(&candidates.datasets[0]), "Delaware");
}

#[test]
fn newest_export_prefers_latest_modification() {
    let ws = TestWorkspace::new();
    let older = ws.write("well_02___Eagleford_Legacy_1.csv", common::HEADER);
    let newer = ws.write("well_02___Eagleford_Legacy_2.csv", common::HEADER);
    ws.write("other_export.csv", common::HEADER);
    age(&older, 120);
    age(&newer, 10);

    let found = newest_export(ws.path(), "well_02___Eagleford_Legacy_").unwrap();
    assert_eq!(found, Some(newer));
    assert_eq!(newest_export(ws.path(), "missing_").unwrap(), None);
}

#[test]
fn wait_for_export_returns_readable_file() {
    let ws = TestWorkspace::new();
    let export = ws.copy_fixture("Midland_wells.csv");
    let found = wait_for_export(
        ws.path(),
        "Midland",
        Duration::from_millis(200),
        Duration::from_millis(20),
    )
    .unwrap();
    assert_eq!(found, export);
}

#[test]
fn wait_for_export_gives_up_after_deadline() {
    let ws = TestWorkspace::new();
    ws.write("Midland_partial.csv", "Well Name,API");
    let err = wait_for_export(
        ws.path(),
        "Midland",
        Duration::from_millis(100),
        Duration::from_millis(20),
    )
    .unwrap_err();
    assert!(err.to_string().contains("within"));
}
