//! Tests for error types

use carandom::ledger::PatientId;
use carandom::{Error, ErrorKind};

#[test]
fn test_invalid_patient_id_error() {
    let error = Error::InvalidPatientId(0);
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid patient id 0"));
    assert!(error_str.contains("positive integers"));
    assert_eq!(error.kind(), ErrorKind::Validation);
}

#[test]
fn test_invalid_stratum_error() {
    let error = Error::InvalidStratum("medium".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid stratum 'medium'"));
    assert_eq!(error.kind(), ErrorKind::Validation);
}

#[test]
fn test_invalid_outcome_error() {
    let error = Error::InvalidOutcome {
        patient_id: PatientId::new(4),
        value: f64::INFINITY,
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("patient 4"));
    assert!(error_str.contains("inf"));
    assert!(error.is_recoverable());
}

#[test]
fn test_duplicate_id_error() {
    let error = Error::DuplicateId(PatientId::new(12));
    let error_str = format!("{error}");
    assert!(error_str.contains("Duplicate patient id 12"));
    assert_eq!(error.kind(), ErrorKind::State);
}

#[test]
fn test_unknown_id_error() {
    let error = Error::UnknownId(PatientId::new(99));
    let error_str = format!("{error}");
    assert!(error_str.contains("Unknown patient id 99"));
    assert_eq!(error.kind(), ErrorKind::State);
    assert!(error.is_recoverable());
}

#[test]
fn test_configuration_error() {
    let error = Error::Configuration("unknown target strategy 'X'".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Configuration error"));
    assert_eq!(error.kind(), ErrorKind::Configuration);
    assert!(!error.is_recoverable());
}

#[test]
fn test_internal_invariant_error() {
    let error = Error::InternalInvariant("biased coin denominator 0".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Internal invariant violated"));
    assert!(error_str.contains("Please report this issue"));
    assert_eq!(error.kind(), ErrorKind::Internal);
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error: Error = io_error.into();
    let error_str = format!("{error}");
    assert!(error_str.contains("IO error"));
    assert_eq!(error.kind(), ErrorKind::Configuration);
}

#[test]
fn test_json_error_conversion() {
    let json_error = serde_json::from_str::<u32>("not json").unwrap_err();
    let error: Error = json_error.into();
    assert!(format!("{error}").contains("JSON error"));
}

#[test]
fn test_error_debug() {
    let error = Error::UnknownId(PatientId::new(1));
    let debug_str = format!("{error:?}");
    assert!(debug_str.contains("UnknownId"));
}
