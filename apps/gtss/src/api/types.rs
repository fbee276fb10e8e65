//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API that are not
//! core records. Records and payloads are served as the core types.

use gtss_core::StoreCounts;
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Store status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub has_agency: bool,
    pub signal_count: usize,
    pub phase_count: usize,
    pub detector_count: usize,
    pub persistent: bool,
}

impl StatusResponse {
    #[must_use]
    pub fn new(counts: StoreCounts, persistent: bool) -> Self {
        Self {
            has_agency: counts.agency > 0,
            signal_count: counts.signals,
            phase_count: counts.phases,
            detector_count: counts.detectors,
            persistent,
        }
    }
}

// =============================================================================
// DELETE / ERROR RESPONSES
// =============================================================================

/// Phase or detector delete response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}
