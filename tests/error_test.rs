//! Tests for error types

use std::collections::BTreeSet;
use std::path::PathBuf;

use hards::{Error, NameKind};

#[test]
fn test_does_not_exist_error() {
    let error = Error::DoesNotExist("Database does not contain dataset exp9".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Does not exist"));
    assert!(error_str.contains("exp9"));
    assert!(error.is_does_not_exist());
}

#[test]
fn test_already_exists_error() {
    let error = Error::AlreadyExists("Dataset exp1 already exists".to_string());
    assert!(format!("{error}").contains("exp1 already exists"));
    assert!(error.is_already_exists());
    assert!(!error.is_does_not_exist());
}

#[test]
fn test_invalid_name_error() {
    let error = Error::InvalidName {
        kind: NameKind::Datapoint,
        name: "d&tapoint".to_string(),
        invalid: BTreeSet::from(['&']),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("Datapoint name \"d&tapoint\""));
    assert!(error_str.contains("'&'"));
}

#[test]
fn test_structural_error() {
    let error = Error::Structural {
        location: PathBuf::from("/db"),
        missing: "children",
        entry: "directory",
        node: "Database",
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("/db does not contain a 'children' directory"));
    assert!(error_str.contains("'Database'"));
}

#[test]
fn test_serialization_error_conversion() {
    let json_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let error: Error = json_error.into();
    assert!(format!("{error}").contains("Metadata serialization error"));
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error: Error = io_error.into();
    let error_str = format!("{error}");
    assert!(error_str.contains("IO error"));
}

#[test]
fn test_error_debug() {
    let error = Error::DoesNotExist("x".to_string());
    let debug_str = format!("{error:?}");
    assert!(debug_str.contains("DoesNotExist"));
}

#[test]
fn test_result_type_alias() {
    #[allow(clippy::unnecessary_wraps)]
    fn returns_result() -> hards::Result<i32> {
        Ok(42)
    }

    let result = returns_result();
    assert!(result.is_ok());
    assert_eq!(result.unwrap(), 42);
}
