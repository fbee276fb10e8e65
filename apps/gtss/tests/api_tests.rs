//! Integration tests for the GTSS HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::StatusCode;
use axum_test::TestServer;
use gtss::api::{
    AppState, DeleteResponse, ErrorResponse, HealthResponse, StatusResponse, create_router,
};
use gtss_core::{Agency, CascadeReport, Detector, Phase, Session, Signal};
use serde_json::{Value, json};
use std::io::{Cursor, Read};

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Create a test server with a fresh in-memory session.
fn create_test_server() -> TestServer {
    let state = AppState::new(Session::new());
    TestServer::new(create_router(state, None)).unwrap()
}

fn signal_body(street: &str) -> Value {
    json!({
        "agencyId": "SPRINGFIELD",
        "streetName1": street,
        "streetName2": "1st Ave",
        "latitude": 39.78,
        "longitude": -89.65,
    })
}

async fn create_signal(server: &TestServer, street: &str) -> Signal {
    let response = server.post("/api/signals").json(&signal_body(street)).await;
    response.assert_status_ok();
    response.json::<Signal>()
}

async fn create_phase(server: &TestServer, signal_id: &str, phase: u32) -> Phase {
    let response = server
        .post("/api/phases")
        .json(&json!({
            "phase": phase,
            "signalId": signal_id,
            "movementType": "Through",
        }))
        .await;
    response.assert_status_ok();
    response.json::<Phase>()
}

async fn create_detector(server: &TestServer, signal_id: &str, channel: &str) -> Detector {
    let response = server
        .post("/api/detectors")
        .json(&json!({
            "channel": channel,
            "signalId": signal_id,
            "phase": 2,
            "purpose": "Stopbar",
            "technologyType": "Video",
        }))
        .await;
    response.assert_status_ok();
    response.json::<Detector>()
}

// =============================================================================
// HEALTH / STATUS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();
    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
}

#[tokio::test]
async fn test_status_counts_records() {
    let server = create_test_server();
    let signal = create_signal(&server, "Main St").await;
    create_phase(&server, &signal.signal_id, 2).await;

    let status: StatusResponse = server.get("/api/status").await.json();
    assert!(!status.has_agency);
    assert_eq!(status.signal_count, 1);
    assert_eq!(status.phase_count, 1);
    assert_eq!(status.detector_count, 0);
    assert!(!status.persistent);
}

// =============================================================================
// AGENCY
// =============================================================================

#[tokio::test]
async fn test_agency_absent_is_null() {
    let server = create_test_server();
    let response = server.get("/api/agency").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), Value::Null);
}

#[tokio::test]
async fn test_agency_save_replaces_singleton() {
    let server = create_test_server();

    let first: Agency = server
        .post("/api/agency")
        .json(&json!({
            "agencyId": "SPRINGFIELD",
            "agencyName": "City",
            "agencyTimezone": "America/Chicago",
        }))
        .await
        .json();
    assert_eq!(first.agency_language, "en");

    let second: Agency = server
        .post("/api/agency")
        .json(&json!({
            "agencyId": "SHELBYVILLE",
            "agencyName": "Town",
            "agencyTimezone": "America/Chicago",
        }))
        .await
        .json();
    assert_eq!(second.id, first.id);

    let current: Agency = server.get("/api/agency").await.json();
    assert_eq!(current.agency_id, "SHELBYVILLE");
}

#[tokio::test]
async fn test_agency_missing_name_rejected() {
    let server = create_test_server();
    let response = server
        .post("/api/agency")
        .json(&json!({
            "agencyId": "SPRINGFIELD",
            "agencyName": "  ",
            "agencyTimezone": "America/Chicago",
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json();
    assert!(error.message.contains("agencyName"));
}

// =============================================================================
// SIGNALS
// =============================================================================

#[tokio::test]
async fn test_signal_ids_are_sequential() {
    let server = create_test_server();

    let first = create_signal(&server, "Main St").await;
    let second = create_signal(&server, "Oak St").await;

    assert_eq!(first.signal_id, "SIG_001");
    assert_eq!(second.signal_id, "SIG_002");

    let listed: Vec<Signal> = server.get("/api/signals").await.json();
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn test_signal_get_and_update() {
    let server = create_test_server();
    create_signal(&server, "Main St").await;

    let response = server
        .put("/api/signals/SIG_001")
        .json(&json!({ "hasCctv": true }))
        .await;
    response.assert_status_ok();

    let fetched: Signal = server.get("/api/signals/SIG_001").await.json();
    assert!(fetched.has_cctv);
    assert_eq!(fetched.street_name1, "Main St");
}

#[tokio::test]
async fn test_signal_get_missing_is_404() {
    let server = create_test_server();
    let response = server.get("/api/signals/SIG_404").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let error: ErrorResponse = response.json();
    assert!(error.message.contains("SIG_404"));
}

#[tokio::test]
async fn test_signal_update_missing_is_400() {
    let server = create_test_server();
    let response = server
        .put("/api/signals/SIG_404")
        .json(&json!({ "hasCctv": true }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signal_invalid_latitude_rejected() {
    let server = create_test_server();
    let mut body = signal_body("Main St");
    body["latitude"] = json!(120.0);

    let response = server.post("/api/signals").json(&body).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let signals: Vec<Signal> = server.get("/api/signals").await.json();
    assert!(signals.is_empty());
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let server = create_test_server();
    let response = server
        .post("/api/signals")
        .json(&json!({ "agencyId": 7 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json();
    assert!(error.message.starts_with("Invalid request body"));
}

#[tokio::test]
async fn test_signal_delete_cascades() {
    let server = create_test_server();
    let keep = create_signal(&server, "Main St").await;
    let gone = create_signal(&server, "Oak St").await;

    create_phase(&server, &keep.signal_id, 2).await;
    create_phase(&server, &gone.signal_id, 2).await;
    create_phase(&server, &gone.signal_id, 4).await;
    create_detector(&server, &gone.signal_id, "D1").await;

    let response = server.delete(&format!("/api/signals/{}", gone.signal_id)).await;
    response.assert_status_ok();

    let raw: Value = response.json();
    assert_eq!(
        raw,
        json!({ "deleted": true, "phasesRemoved": 2, "detectorsRemoved": 1 })
    );

    let phases: Vec<Phase> = server.get("/api/phases").await.json();
    assert_eq!(phases.len(), 1);
    assert_eq!(phases[0].signal_id, keep.signal_id);

    let detectors: Vec<Detector> = server.get("/api/detectors").await.json();
    assert!(detectors.is_empty());
}

#[tokio::test]
async fn test_signal_delete_missing_reports_nothing() {
    let server = create_test_server();
    let report: CascadeReport = server.delete("/api/signals/SIG_999").await.json();

    assert!(!report.deleted);
    assert_eq!(report.phases_removed, 0);
    assert_eq!(report.detectors_removed, 0);
}

#[tokio::test]
async fn test_signal_children_endpoints() {
    let server = create_test_server();
    let signal = create_signal(&server, "Main St").await;
    let other = create_signal(&server, "Oak St").await;

    create_phase(&server, &signal.signal_id, 2).await;
    create_phase(&server, &other.signal_id, 6).await;
    create_detector(&server, &signal.signal_id, "D1").await;

    let phases: Vec<Phase> = server
        .get(&format!("/api/signals/{}/phases", signal.signal_id))
        .await
        .json();
    assert_eq!(phases.len(), 1);
    assert_eq!(phases[0].phase, 2);

    let detectors: Vec<Detector> = server
        .get(&format!("/api/signals/{}/detectors", other.signal_id))
        .await
        .json();
    assert!(detectors.is_empty());
}

// =============================================================================
// PHASES / DETECTORS
// =============================================================================

#[tokio::test]
async fn test_phase_update_and_delete() {
    let server = create_test_server();
    let signal = create_signal(&server, "Main St").await;
    let phase = create_phase(&server, &signal.signal_id, 2).await;
    assert_eq!(phase.num_of_lanes, 1);

    let updated: Phase = server
        .put(&format!("/api/phases/{}", phase.id))
        .json(&json!({ "numOfLanes": 3 }))
        .await
        .json();
    assert_eq!(updated.num_of_lanes, 3);
    assert_eq!(updated.movement_type, "Through");

    let deleted: DeleteResponse = server
        .delete(&format!("/api/phases/{}", phase.id))
        .await
        .json();
    assert!(deleted.deleted);

    let again: DeleteResponse = server
        .delete(&format!("/api/phases/{}", phase.id))
        .await
        .json();
    assert!(!again.deleted);

    server
        .get(&format!("/api/phases/{}", phase.id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_phase_number_out_of_range() {
    let server = create_test_server();
    let response = server
        .post("/api/phases")
        .json(&json!({ "phase": 0, "signalId": "SIG_001", "movementType": "Through" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_detector_update() {
    let server = create_test_server();
    let signal = create_signal(&server, "Main St").await;
    let detector = create_detector(&server, &signal.signal_id, "D1").await;

    let updated: Detector = server
        .put(&format!("/api/detectors/{}", detector.id))
        .json(&json!({ "lane": "L1" }))
        .await
        .json();
    assert_eq!(updated.lane.as_deref(), Some("L1"));
    assert_eq!(updated.channel, "D1");

    let fetched: Detector = server
        .get(&format!("/api/detectors/{}", detector.id))
        .await
        .json();
    assert_eq!(fetched, updated);
}

// =============================================================================
// EXPORT
// =============================================================================

#[tokio::test]
async fn test_export_archive() {
    let server = create_test_server();
    let signal = create_signal(&server, "Main St").await;
    create_phase(&server, &signal.signal_id, 2).await;

    let response = server.post("/api/export").await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "application/zip");
    assert!(
        response
            .header("content-disposition")
            .to_str()
            .unwrap()
            .contains("gtss-export.zip")
    );

    let bytes = response.as_bytes().to_vec();
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(
        names,
        vec!["agency.csv", "detectors.csv", "phases.csv", "signals.csv"]
    );

    let mut phases = String::new();
    archive
        .by_name("phases.csv")
        .unwrap()
        .read_to_string(&mut phases)
        .unwrap();
    assert_eq!(phases.lines().count(), 2);
}

#[tokio::test]
async fn test_export_is_deterministic() {
    let server = create_test_server();
    create_signal(&server, "Main St").await;

    let first = server.post("/api/export").await.as_bytes().to_vec();
    let second = server.post("/api/export").await.as_bytes().to_vec();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_export_single_document() {
    let server = create_test_server();
    create_signal(&server, "Main St").await;

    let response = server.get("/api/export/signals.csv").await;
    response.assert_status_ok();
    assert!(
        response
            .header("content-type")
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );

    let body = response.text();
    let mut lines = body.lines();
    assert!(lines.next().unwrap().starts_with("signal_id,"));
    assert!(lines.next().unwrap().starts_with("SIG_001,SPRINGFIELD,"));
}

#[tokio::test]
async fn test_export_unknown_document() {
    let server = create_test_server();
    let response = server.get("/api/export/routes.csv").await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

// =============================================================================
// FILE BACKEND
// =============================================================================

#[tokio::test]
async fn test_file_backed_server_writes_mutations_back() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("inventory.bin");
    let state = AppState::with_snapshot_file(Session::new(), path.clone());
    let server = TestServer::new(create_router(state, None)).unwrap();

    let signal = create_signal(&server, "Main St").await;
    let on_disk = gtss_core::snapshot_from_bytes(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(on_disk.signals.len(), 1);

    server
        .delete(&format!("/api/signals/{}", signal.signal_id))
        .await
        .assert_status_ok();
    let on_disk = gtss_core::snapshot_from_bytes(&std::fs::read(&path).unwrap()).unwrap();
    assert!(on_disk.signals.is_empty());
}

#[tokio::test]
async fn test_rejected_mutation_leaves_file_untouched() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("inventory.bin");
    let state = AppState::with_snapshot_file(Session::new(), path.clone());
    let server = TestServer::new(create_router(state, None)).unwrap();

    let response = server
        .post("/api/signals")
        .json(&json!({ "agencyId": "" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(!path.exists());
}
