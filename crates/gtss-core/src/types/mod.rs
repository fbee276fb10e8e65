//! # Core Type Definitions
//!
//! This module contains the identifier and error types shared by every
//! layer of the GTSS record store:
//! - Internal record identifiers (`RecordId`)
//! - Entity kinds (`EntityKind`)
//! - Error types (`GtssError`)

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// RECORD IDENTIFIER
// =============================================================================

/// Internal, store-assigned identifier of a record.
///
/// Opaque to callers. Assigned once at creation and never reused or changed.
/// Signals are addressed by their business key instead; phases and
/// detectors are addressed by this id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    /// Generate a fresh random identifier (UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// =============================================================================
// ENTITY KIND
// =============================================================================

/// The four record kinds held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Agency,
    Signal,
    Phase,
    Detector,
}

impl EntityKind {
    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Agency => "Agency",
            Self::Signal => "Signal",
            Self::Phase => "Phase",
            Self::Detector => "Detector",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the GTSS record store and export pipeline.
///
/// - `Validation` and `NotFound` are recoverable and meant for the caller
/// - `Export` and `Import` abort the archive operation, the store is untouched
/// - The store never panics; every failure is a value
#[derive(Debug, Error)]
pub enum GtssError {
    /// A payload field is missing or malformed.
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// No record matches the given key.
    #[error("{entity} not found: {key}")]
    NotFound { entity: EntityKind, key: String },

    /// The export archive could not be assembled.
    #[error("Export failed: {0}")]
    Export(String),

    /// An archive could not be read back into records.
    #[error("Import failed: {0}")]
    Import(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O or storage error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl GtssError {
    /// Build a validation error for a named field.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Build a not-found error for the given entity and key.
    pub fn not_found(entity: EntityKind, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// True for errors caused by the caller's input (validation, not found).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::NotFound { .. })
    }
}

// =============================================================================
// TESTS
// =============================================================================
