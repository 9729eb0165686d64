//! Integrity gate behaviour against files on disk.

use dart_launcher::{sha256_file, Artifact, LaunchError, LaunchPlan};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// ==============================================================================
// Helpers
// ==============================================================================

fn write(dir: &Path, name: &str, content: &[u8]) -> Artifact {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    let hash = sha256_file(&path).unwrap();
    Artifact::new(path, hash)
}

fn plan(temp: &TempDir) -> LaunchPlan {
    LaunchPlan {
        main: write(temp.path(), "main", b"host binary"),
        auxiliary: write(temp.path(), "aux", b"auxiliary component"),
    }
}

// ==============================================================================
// Verification
// ==============================================================================

#[test]
fn test_matching_artifacts_pass() {
    let temp = TempDir::new().unwrap();
    assert!(plan(&temp).verify().is_ok());
}

#[test]
fn test_expected_hash_is_case_insensitive() {
    let temp = TempDir::new().unwrap();
    let mut plan = plan(&temp);
    plan.main.expected = plan.main.expected.to_lowercase();
    assert!(plan.verify().is_ok());
}

#[test]
fn test_missing_main_is_reported_first() {
    let temp = TempDir::new().unwrap();
    let plan = plan(&temp);
    fs::remove_file(&plan.main.path).unwrap();
    fs::remove_file(&plan.auxiliary.path).unwrap();

    let err = plan.verify().unwrap_err();
    assert!(matches!(err, LaunchError::MainMissing { .. }));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_tampered_main() {
    let temp = TempDir::new().unwrap();
    let plan = plan(&temp);
    fs::write(&plan.main.path, b"patched host binary").unwrap();

    let err = plan.verify().unwrap_err();
    assert_eq!(err.exit_code(), 3);
    match err {
        LaunchError::MainMismatch { actual, .. } => {
            assert_eq!(actual, sha256_file(&plan.main.path).unwrap())
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_auxiliary_checked_after_main() {
    let temp = TempDir::new().unwrap();
    let plan = plan(&temp);
    fs::remove_file(&plan.auxiliary.path).unwrap();
    assert_eq!(plan.verify().unwrap_err().exit_code(), 5);

    fs::write(&plan.auxiliary.path, b"something else").unwrap();
    assert_eq!(plan.verify().unwrap_err().exit_code(), 6);
}

// ==============================================================================
// Launch
// ==============================================================================

#[test]
fn test_launch_refuses_unverified_host() {
    let temp = TempDir::new().unwrap();
    let mut plan = plan(&temp);
    plan.main.expected = "00".repeat(32);

    let err = plan.launch(["--lang", "en"]).unwrap_err();
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn test_unstartable_host_is_a_launch_failure() {
    let temp = TempDir::new().unwrap();
    // Plain data file without execute permission.
    let plan = plan(&temp);

    let err = plan.spawn(Vec::<String>::new()).unwrap_err();
    assert_eq!(err.exit_code(), 7);
}
