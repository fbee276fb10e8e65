//! # Record Store
//!
//! The `RecordStore` trait abstracts over in-memory and disk-backed storage
//! of the four GTSS collections. Both backends share one set of semantics:
//!
//! - Collections keep insertion order
//! - Signals are addressed by business key, phases and detectors by id
//! - Deleting a signal removes every phase and detector referencing it,
//!   in one operation
//! - `update` on an absent key is `NotFound`; `delete` on an absent key is
//!   a no-op
//!
//! Payloads are assumed valid; the `Session` validates them first.

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::primitives::{SIGNAL_ID_PREFIX, SIGNAL_ID_WIDTH};
use crate::schema::{
    Agency, Detector, DetectorPatch, InsertAgency, InsertDetector, InsertPhase, InsertSignal,
    Phase, PhasePatch, Signal, SignalPatch,
};
use crate::GtssError;
use serde::{Deserialize, Serialize};

// =============================================================================
// SNAPSHOT
// =============================================================================

/// A consistent copy of all four collections.
///
/// Used for export, for the snapshot file format and for atomic restore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub agency: Option<Agency>,
    pub signals: Vec<Signal>,
    pub phases: Vec<Phase>,
    pub detectors: Vec<Detector>,
}

impl Snapshot {
    /// Record counts per collection.
    #[must_use]
    pub fn counts(&self) -> StoreCounts {
        StoreCounts {
            agency: usize::from(self.agency.is_some()),
            signals: self.signals.len(),
            phases: self.phases.len(),
            detectors: self.detectors.len(),
        }
    }
}

/// Record counts per collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCounts {
    pub agency: usize,
    pub signals: usize,
    pub phases: usize,
    pub detectors: usize,
}

// =============================================================================
// CASCADE REPORT
// =============================================================================

/// Outcome of a signal delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeReport {
    /// Whether a signal with the key existed.
    pub deleted: bool,
    pub phases_removed: usize,
    pub detectors_removed: usize,
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Storage contract shared by every backend.
///
/// Every method returns `Result` so the in-memory backend and the redb
/// backend are interchangeable behind `&dyn RecordStore`.
pub trait RecordStore {
    // ----- agency ---------------------------------------------------------

    /// The agency singleton, if saved.
    fn agency(&self) -> Result<Option<Agency>, GtssError>;

    /// Save the agency. A second save replaces every column but keeps the
    /// id assigned by the first.
    fn save_agency(&mut self, insert: InsertAgency) -> Result<Agency, GtssError>;

    /// Remove the agency. Returns whether one existed.
    fn clear_agency(&mut self) -> Result<bool, GtssError>;

    // ----- signals --------------------------------------------------------

    fn signals(&self) -> Result<Vec<Signal>, GtssError>;

    fn signal(&self, signal_id: &str) -> Result<Option<Signal>, GtssError>;

    /// Append a signal, generating `SIG_NNN` when no business key is given.
    fn save_signal(&mut self, insert: InsertSignal) -> Result<Signal, GtssError>;

    fn update_signal(&mut self, signal_id: &str, patch: SignalPatch)
    -> Result<Signal, GtssError>;

    /// Delete a signal and cascade to its phases and detectors.
    fn delete_signal(&mut self, signal_id: &str) -> Result<CascadeReport, GtssError>;

    // ----- phases ---------------------------------------------------------

    fn phases(&self) -> Result<Vec<Phase>, GtssError>;

    fn phase(&self, id: &str) -> Result<Option<Phase>, GtssError>;

    fn phases_by_signal(&self, signal_id: &str) -> Result<Vec<Phase>, GtssError>;

    fn save_phase(&mut self, insert: InsertPhase) -> Result<Phase, GtssError>;

    fn update_phase(&mut self, id: &str, patch: PhasePatch) -> Result<Phase, GtssError>;

    fn delete_phase(&mut self, id: &str) -> Result<bool, GtssError>;

    // ----- detectors ------------------------------------------------------

    fn detectors(&self) -> Result<Vec<Detector>, GtssError>;

    fn detector(&self, id: &str) -> Result<Option<Detector>, GtssError>;

    fn detectors_by_signal(&self, signal_id: &str) -> Result<Vec<Detector>, GtssError>;

    fn save_detector(&mut self, insert: InsertDetector) -> Result<Detector, GtssError>;

    fn update_detector(
        &mut self,
        id: &str,
        patch: DetectorPatch,
    ) -> Result<Detector, GtssError>;

    fn delete_detector(&mut self, id: &str) -> Result<bool, GtssError>;

    // ----- whole store ----------------------------------------------------

    /// Consistent copy of all four collections.
    fn snapshot(&self) -> Result<Snapshot, GtssError>;

    /// Replace all four collections in one step.
    fn restore(&mut self, snapshot: Snapshot) -> Result<(), GtssError>;

    /// Remove every record.
    fn clear(&mut self) -> Result<(), GtssError> {
        self.restore(Snapshot::default())
    }
}

// =============================================================================
// SIGNAL ID GENERATION
// =============================================================================

/// Next free `SIG_NNN` business key.
///
/// Starts from the pre-insertion count plus one and walks upward until the
/// candidate is unused.
pub(crate) fn next_signal_id(signals: &[Signal]) -> String {
    let mut n = signals.len().saturating_add(1);
    loop {
        let candidate = format!("{SIGNAL_ID_PREFIX}{n:0width$}", width = SIGNAL_ID_WIDTH);
        if !signals.iter().any(|s| s.signal_id == candidate) {
            return candidate;
        }
        n = n.saturating_add(1);
    }
}
