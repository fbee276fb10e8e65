//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Mutations take the session write lock and, on the `file` backend, rewrite
//! the snapshot file before releasing it; reads take the read lock. Export
//! holds the read lock only while copying the snapshot.

use super::{
    AppState,
    error::ApiError,
    types::{DeleteResponse, HealthResponse, StatusResponse},
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};
use gtss_core::{
    Agency, CascadeReport, Detector, DetectorPatch, DocumentKind, EntityKind, InsertAgency,
    InsertDetector, InsertPhase, InsertSignal, Phase, PhasePatch, Signal, SignalPatch,
    primitives::ARCHIVE_FILE_NAME,
};

type ApiResult<T> = Result<Json<T>, ApiError>;

// =============================================================================
// HEALTH / STATUS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Record counts.
pub async fn status_handler(State(state): State<AppState>) -> ApiResult<StatusResponse> {
    let session = state.session.read().await;
    let counts = session.counts()?;
    Ok(Json(StatusResponse::new(counts, session.is_persistent())))
}

// =============================================================================
// AGENCY
// =============================================================================

/// Get the agency, `null` when none is saved.
pub async fn get_agency_handler(State(state): State<AppState>) -> ApiResult<Option<Agency>> {
    let session = state.session.read().await;
    Ok(Json(session.agency()?))
}

/// Save (upsert) the agency.
pub async fn save_agency_handler(
    State(state): State<AppState>,
    payload: Result<Json<InsertAgency>, JsonRejection>,
) -> ApiResult<Agency> {
    let Json(insert) = payload?;
    let mut session = state.session.write().await;
    let agency = session.save_agency(insert)?;
    state.persist(&session)?;
    tracing::info!(agency_id = %agency.agency_id, "agency saved");
    Ok(Json(agency))
}

// =============================================================================
// SIGNALS
// =============================================================================

pub async fn list_signals_handler(State(state): State<AppState>) -> ApiResult<Vec<Signal>> {
    let session = state.session.read().await;
    Ok(Json(session.signals()?))
}

pub async fn get_signal_handler(
    State(state): State<AppState>,
    Path(signal_id): Path<String>,
) -> ApiResult<Signal> {
    let session = state.session.read().await;
    session
        .signal(&signal_id)?
        .map(Json)
        .ok_or(ApiError::Missing(EntityKind::Signal, signal_id))
}

pub async fn create_signal_handler(
    State(state): State<AppState>,
    payload: Result<Json<InsertSignal>, JsonRejection>,
) -> ApiResult<Signal> {
    let Json(insert) = payload?;
    let mut session = state.session.write().await;
    let signal = session.save_signal(insert)?;
    state.persist(&session)?;
    tracing::info!(signal_id = %signal.signal_id, "signal saved");
    Ok(Json(signal))
}

pub async fn update_signal_handler(
    State(state): State<AppState>,
    Path(signal_id): Path<String>,
    payload: Result<Json<SignalPatch>, JsonRejection>,
) -> ApiResult<Signal> {
    let Json(patch) = payload?;
    let mut session = state.session.write().await;
    let signal = session.update_signal(&signal_id, patch)?;
    state.persist(&session)?;
    tracing::info!(signal_id = %signal.signal_id, "signal updated");
    Ok(Json(signal))
}

/// Delete a signal and everything that references it.
pub async fn delete_signal_handler(
    State(state): State<AppState>,
    Path(signal_id): Path<String>,
) -> ApiResult<CascadeReport> {
    let mut session = state.session.write().await;
    let report = session.delete_signal(&signal_id)?;
    state.persist(&session)?;
    if report.deleted {
        tracing::info!(
            signal_id = %signal_id,
            phases_removed = report.phases_removed,
            detectors_removed = report.detectors_removed,
            "signal deleted"
        );
    }
    Ok(Json(report))
}

pub async fn signal_phases_handler(
    State(state): State<AppState>,
    Path(signal_id): Path<String>,
) -> ApiResult<Vec<Phase>> {
    let session = state.session.read().await;
    Ok(Json(session.phases_by_signal(&signal_id)?))
}

pub async fn signal_detectors_handler(
    State(state): State<AppState>,
    Path(signal_id): Path<String>,
) -> ApiResult<Vec<Detector>> {
    let session = state.session.read().await;
    Ok(Json(session.detectors_by_signal(&signal_id)?))
}

// =============================================================================
// PHASES
// =============================================================================

pub async fn list_phases_handler(State(state): State<AppState>) -> ApiResult<Vec<Phase>> {
    let session = state.session.read().await;
    Ok(Json(session.phases()?))
}

pub async fn get_phase_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Phase> {
    let session = state.session.read().await;
    session
        .phase(&id)?
        .map(Json)
        .ok_or(ApiError::Missing(EntityKind::Phase, id))
}

pub async fn create_phase_handler(
    State(state): State<AppState>,
    payload: Result<Json<InsertPhase>, JsonRejection>,
) -> ApiResult<Phase> {
    let Json(insert) = payload?;
    let mut session = state.session.write().await;
    let phase = session.save_phase(insert)?;
    state.persist(&session)?;
    tracing::info!(id = %phase.id, signal_id = %phase.signal_id, phase = phase.phase, "phase saved");
    Ok(Json(phase))
}

pub async fn update_phase_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<PhasePatch>, JsonRejection>,
) -> ApiResult<Phase> {
    let Json(patch) = payload?;
    let mut session = state.session.write().await;
    let phase = session.update_phase(&id, patch)?;
    state.persist(&session)?;
    tracing::info!(id = %phase.id, "phase updated");
    Ok(Json(phase))
}

pub async fn delete_phase_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeleteResponse> {
    let mut session = state.session.write().await;
    let deleted = session.delete_phase(&id)?;
    state.persist(&session)?;
    if deleted {
        tracing::info!(id = %id, "phase deleted");
    }
    Ok(Json(DeleteResponse { deleted }))
}

// =============================================================================
// DETECTORS
// =============================================================================

pub async fn list_detectors_handler(State(state): State<AppState>) -> ApiResult<Vec<Detector>> {
    let session = state.session.read().await;
    Ok(Json(session.detectors()?))
}

pub async fn get_detector_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Detector> {
    let session = state.session.read().await;
    session
        .detector(&id)?
        .map(Json)
        .ok_or(ApiError::Missing(EntityKind::Detector, id))
}

pub async fn create_detector_handler(
    State(state): State<AppState>,
    payload: Result<Json<InsertDetector>, JsonRejection>,
) -> ApiResult<Detector> {
    let Json(insert) = payload?;
    let mut session = state.session.write().await;
    let detector = session.save_detector(insert)?;
    state.persist(&session)?;
    tracing::info!(id = %detector.id, signal_id = %detector.signal_id, "detector saved");
    Ok(Json(detector))
}

pub async fn update_detector_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<DetectorPatch>, JsonRejection>,
) -> ApiResult<Detector> {
    let Json(patch) = payload?;
    let mut session = state.session.write().await;
    let detector = session.update_detector(&id, patch)?;
    state.persist(&session)?;
    tracing::info!(id = %detector.id, "detector updated");
    Ok(Json(detector))
}

pub async fn delete_detector_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeleteResponse> {
    let mut session = state.session.write().await;
    let deleted = session.delete_detector(&id)?;
    state.persist(&session)?;
    if deleted {
        tracing::info!(id = %id, "detector deleted");
    }
    Ok(Json(DeleteResponse { deleted }))
}

// =============================================================================
// EXPORT
// =============================================================================

/// Download the full GTSS archive.
pub async fn export_handler(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.session.read().await.snapshot()?;
    let bytes = gtss_core::export_archive(&snapshot)?;

    tracing::info!(
        bytes = bytes.len(),
        signals = snapshot.signals.len(),
        phases = snapshot.phases.len(),
        detectors = snapshot.detectors.len(),
        "archive exported"
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{ARCHIVE_FILE_NAME}\""),
            ),
        ],
        bytes,
    ))
}

/// Download one document of the set as CSV.
pub async fn export_document_handler(
    State(state): State<AppState>,
    Path(document): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let kind: DocumentKind = document.parse()?;
    let snapshot = state.session.read().await.snapshot()?;
    let body = gtss_core::export_document(kind, &snapshot)?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", kind.file_name()),
            ),
        ],
        body,
    ))
}
