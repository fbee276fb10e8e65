//! # GTSS HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /api/status` - Record counts
//! - `GET|POST /api/agency` - Agency singleton
//! - `GET|POST /api/signals`, `GET|PUT|DELETE /api/signals/{signal_id}`
//! - `GET /api/signals/{signal_id}/phases`, `GET /api/signals/{signal_id}/detectors`
//! - `GET|POST /api/phases`, `GET|PUT|DELETE /api/phases/{id}`
//! - `GET|POST /api/detectors`, `GET|PUT|DELETE /api/detectors/{id}`
//! - `POST /api/export` - GTSS ZIP archive
//! - `GET /api/export/{document}` - a single GTSS CSV document
//!
//! ## CORS
//!
//! Allowed origins come from `Config::cors_origins` (`GTSS_CORS_ORIGINS`):
//! a comma-separated list, or "*" for all. The default is localhost only.

mod error;
mod handlers;
mod types;

// Re-export handlers and types for integration tests (via `gtss::api::*`)
pub use error::ApiError;
#[allow(unused_imports)]
pub use handlers::{
    create_detector_handler, create_phase_handler, create_signal_handler,
    delete_detector_handler, delete_phase_handler, delete_signal_handler, export_document_handler,
    export_handler, get_agency_handler, get_detector_handler, get_phase_handler,
    get_signal_handler, health_handler, list_detectors_handler, list_phases_handler,
    list_signals_handler, save_agency_handler, signal_detectors_handler, signal_phases_handler,
    status_handler, update_detector_handler, update_phase_handler, update_signal_handler,
};
pub use types::{DeleteResponse, ErrorResponse, HealthResponse, StatusResponse};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use gtss_core::{GtssError, Session};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum accepted request body (2 MB).
const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the record session.
#[derive(Clone)]
pub struct AppState {
    /// The session holding the record store.
    pub session: Arc<RwLock<Session>>,
    /// Snapshot file rewritten after each mutation (`file` backend only).
    snapshot_file: Option<Arc<PathBuf>>,
}

impl AppState {
    /// Create new app state with a session.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
            snapshot_file: None,
        }
    }

    /// Create app state whose mutations are written back to `path`.
    #[must_use]
    pub fn with_snapshot_file(session: Session, path: PathBuf) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
            snapshot_file: Some(Arc::new(path)),
        }
    }

    /// Write the session to the snapshot file, if there is one.
    ///
    /// Called while the write lock is still held so the file never lags
    /// behind a response that has already been sent.
    pub(crate) fn persist(&self, session: &Session) -> Result<(), GtssError> {
        match &self.snapshot_file {
            Some(path) => crate::storage::write_snapshot_file(session, path),
            None => Ok(()),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const ALLOWED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

/// Build the CORS layer from the configured origins.
///
/// - `Some("*")`: allows all origins (development only)
/// - `None`: localhost only
/// - otherwise: comma-separated list of allowed origins
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (GTSS_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                restricted_cors(allowed_origins)
            }
        }
        None => build_localhost_cors(),
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:5173",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:5173",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    restricted_cors(origins)
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
pub fn create_router(state: AppState, cors_origins: Option<&str>) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(cors_origins))
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_SIZE));

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/status", get(handlers::status_handler))
        .route(
            "/api/agency",
            get(handlers::get_agency_handler).post(handlers::save_agency_handler),
        )
        .route(
            "/api/signals",
            get(handlers::list_signals_handler).post(handlers::create_signal_handler),
        )
        .route(
            "/api/signals/{signal_id}",
            get(handlers::get_signal_handler)
                .put(handlers::update_signal_handler)
                .delete(handlers::delete_signal_handler),
        )
        .route(
            "/api/signals/{signal_id}/phases",
            get(handlers::signal_phases_handler),
        )
        .route(
            "/api/signals/{signal_id}/detectors",
            get(handlers::signal_detectors_handler),
        )
        .route(
            "/api/phases",
            get(handlers::list_phases_handler).post(handlers::create_phase_handler),
        )
        .route(
            "/api/phases/{id}",
            get(handlers::get_phase_handler)
                .put(handlers::update_phase_handler)
                .delete(handlers::delete_phase_handler),
        )
        .route(
            "/api/detectors",
            get(handlers::list_detectors_handler).post(handlers::create_detector_handler),
        )
        .route(
            "/api/detectors/{id}",
            get(handlers::get_detector_handler)
                .put(handlers::update_detector_handler)
                .delete(handlers::delete_detector_handler),
        )
        .route("/api/export", post(handlers::export_handler))
        .route(
            "/api/export/{document}",
            get(handlers::export_document_handler),
        )
        .layer(middleware)
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Resolve when Ctrl+C is received.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received, draining connections");
}

/// Start the HTTP server and run until Ctrl+C.
pub async fn run_server(
    addr: &str,
    state: AppState,
    cors_origins: Option<&str>,
) -> Result<(), GtssError> {
    let router = create_router(state, cors_origins);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| GtssError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("GTSS HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| GtssError::IoError(format!("Server error: {}", e)))
}
