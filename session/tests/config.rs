use std::io::Write;

use frames::ReorderPolicy;
use session::{CaretStart, SessionConfig, SessionError};

#[test]
fn defaults() {
    let config = SessionConfig::from_toml_str("").unwrap();
    assert_eq!(config, SessionConfig::default());
    assert_eq!(config.reorder_policy, ReorderPolicy::Validate);
    assert_eq!(config.caret_start, CaretStart::MainBody);
}

#[test]
fn parses_every_key() {
    let config = SessionConfig::from_toml_str(
        "reorder_policy = \"trust\"\ncaret_start = \"root-body\"\n",
    )
    .unwrap();
    assert_eq!(config.reorder_policy, ReorderPolicy::Trust);
    assert_eq!(config.caret_start, CaretStart::RootBody);
}

#[test]
fn rejects_unknown_keys_and_values() {
    let err = SessionConfig::from_toml_str("undo_depth = 3").unwrap_err();
    assert!(matches!(err, SessionError::Config(_)));
    assert!(SessionConfig::from_toml_str("reorder_policy = \"sometimes\"").is_err());
}

#[test]
fn loads_from_disk() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("session.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "reorder_policy = \"trust\"").unwrap();

    let config = SessionConfig::load(&path).unwrap();
    assert_eq!(config.reorder_policy, ReorderPolicy::Trust);
    assert_eq!(config.caret_start, CaretStart::MainBody);
}

#[test]
fn missing_file_reports_its_path() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("absent.toml");
    let err = SessionConfig::load(&path).unwrap_err();
    match err {
        SessionError::Io { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected an I/O error, got {other:?}"),
    }
}
