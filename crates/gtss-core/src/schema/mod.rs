//! # Entity Schemas
//!
//! The four GTSS record kinds and the payloads that create and modify them:
//! - `Agency` / `InsertAgency` (singleton, replaced wholesale on save)
//! - `Signal` / `InsertSignal` / `SignalPatch`
//! - `Phase` / `InsertPhase` / `PhasePatch`
//! - `Detector` / `InsertDetector` / `DetectorPatch`
//!
//! Insert payloads are a record minus its store-assigned id. Patch payloads
//! carry every mutable column as an `Option`; `None` means "leave as is".
//! Every payload exposes `validate()`, which the session calls before any
//! payload reaches a store.

mod agency;
mod detector;
mod movement;
mod phase;
mod signal;

pub use agency::{Agency, InsertAgency};
pub use detector::{Detector, DetectorPatch, InsertDetector};
pub use movement::{MovementType, decode_movement, encode_movement};
pub use phase::{InsertPhase, Phase, PhasePatch};
pub use signal::{InsertSignal, Signal, SignalPatch};

use crate::GtssError;
use crate::primitives::MAX_TEXT_LENGTH;

// =============================================================================
// MERGE-IF-PRESENT
// =============================================================================

/// Overwrite `slot` when a new value was supplied.
pub(crate) fn merge<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

/// Overwrite an optional column when a new value was supplied.
///
/// Absent stays absent; there is no way to clear a column through a patch.
pub(crate) fn merge_optional<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Empty optional text is stored as absent, the same way it exports.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Signal references are stored trimmed so lookups and cascades match the
/// trimmed business key.
pub(crate) fn signal_key(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.len() == value.len() {
        value
    } else {
        trimmed.to_string()
    }
}

// =============================================================================
// FIELD RULES
// =============================================================================

/// Required text: non-blank and within `MAX_TEXT_LENGTH`.
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), GtssError> {
    if value.trim().is_empty() {
        return Err(GtssError::validation(field, "is required"));
    }
    check_length(field, value)
}

/// Optional text: within `MAX_TEXT_LENGTH` when present.
pub(crate) fn check_optional_text(field: &str, value: Option<&str>) -> Result<(), GtssError> {
    match value {
        Some(v) => check_length(field, v),
        None => Ok(()),
    }
}

fn check_length(field: &str, value: &str) -> Result<(), GtssError> {
    if value.len() > MAX_TEXT_LENGTH {
        return Err(GtssError::validation(
            field,
            format!(
                "length {} exceeds maximum {} bytes",
                value.len(),
                MAX_TEXT_LENGTH
            ),
        ));
    }
    Ok(())
}

/// Coordinate within `[-limit, limit]`. Rejects NaN and infinities.
pub(crate) fn check_coordinate(field: &str, value: f64, limit: f64) -> Result<(), GtssError> {
    if !value.is_finite() || !(-limit..=limit).contains(&value) {
        return Err(GtssError::validation(
            field,
            format!("must be between -{limit} and {limit}"),
        ));
    }
    Ok(())
}

/// Optional measurement: finite and non-negative when present.
pub(crate) fn check_measurement(field: &str, value: Option<f64>) -> Result<(), GtssError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(GtssError::validation(
            field,
            "must be a finite, non-negative number",
        )),
        _ => Ok(()),
    }
}
