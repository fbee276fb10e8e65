//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use gtss::api::{DeleteResponse, ErrorResponse, HealthResponse, StatusResponse};
use gtss_core::StoreCounts;

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_serialization() {
    let health = HealthResponse {
        status: "ok".to_string(),
        version: "0.1.0".to_string(),
    };

    let json = serde_json::to_string(&health).unwrap();
    assert_eq!(json, r#"{"status":"ok","version":"0.1.0"}"#);
}

// =============================================================================
// STATUS RESPONSE TESTS
// =============================================================================

#[test]
fn test_status_response_from_counts() {
    let counts = StoreCounts {
        agency: 1,
        signals: 3,
        phases: 12,
        detectors: 7,
    };
    let status = StatusResponse::new(counts, true);

    assert!(status.has_agency);
    assert_eq!(status.signal_count, 3);
    assert_eq!(status.phase_count, 12);
    assert_eq!(status.detector_count, 7);
    assert!(status.persistent);
}

#[test]
fn test_status_response_uses_camel_case() {
    let status = StatusResponse::new(StoreCounts::default(), false);
    let json = serde_json::to_value(&status).unwrap();

    assert_eq!(json["hasAgency"], false);
    assert_eq!(json["signalCount"], 0);
    assert_eq!(json["phaseCount"], 0);
    assert_eq!(json["detectorCount"], 0);
    assert_eq!(json["persistent"], false);
}

#[test]
fn test_status_response_deserialization() {
    let json = r#"{"hasAgency":true,"signalCount":2,"phaseCount":4,"detectorCount":1,"persistent":true}"#;
    let status: StatusResponse = serde_json::from_str(json).unwrap();

    assert!(status.has_agency);
    assert_eq!(status.signal_count, 2);
    assert_eq!(status.detector_count, 1);
}

// =============================================================================
// DELETE / ERROR RESPONSE TESTS
// =============================================================================

#[test]
fn test_delete_response_serialization() {
    let json = serde_json::to_string(&DeleteResponse { deleted: true }).unwrap();
    assert_eq!(json, r#"{"deleted":true}"#);
}

#[test]
fn test_error_response_round_trip() {
    let error = ErrorResponse {
        message: "Signal not found: SIG_009".to_string(),
    };
    let json = serde_json::to_string(&error).unwrap();
    let back: ErrorResponse = serde_json::from_str(&json).unwrap();

    assert_eq!(back.message, error.message);
}
