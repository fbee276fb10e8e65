//! # Session Module
//!
//! The `Session` is the only entry point callers use to read and mutate
//! records. It validates every payload before it reaches a store, so the
//! store implementations can assume well-formed input.
//!
//! ## Storage Backends
//!
//! Session supports two storage backends:
//! - `InMemory`: Uses `MemoryStore` (fast, volatile unless saved as a snapshot file)
//! - `Persistent`: Uses `RedbStore` for disk-backed ACID storage

use crate::export::import_archive;
use crate::schema::{
    Agency, Detector, DetectorPatch, InsertAgency, InsertDetector, InsertPhase, InsertSignal,
    Phase, PhasePatch, Signal, SignalPatch,
};
use crate::store::{CascadeReport, MemoryStore, RecordStore, RedbStore, Snapshot, StoreCounts};
use crate::GtssError;
use std::path::Path;

/// Storage backend for a Session.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory collections (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed collections using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

/// Validated access to a record store.
///
/// Note: Session does NOT implement Clone; `RedbStore` holds a database
/// handle. Use `snapshot()` for a detached copy.
#[derive(Debug, Default)]
pub struct Session {
    backend: StorageBackend,
}

impl Session {
    /// Create a new empty session with in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an in-memory session holding the given collections.
    #[must_use]
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            backend: StorageBackend::InMemory(MemoryStore::from_snapshot(snapshot)),
        }
    }

    /// Create a session with persistent redb storage.
    ///
    /// Opens or creates a redb database at the given path.
    /// All changes are automatically persisted to disk.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, GtssError> {
        Ok(Self::with_redb_store(RedbStore::open(path)?))
    }

    /// Create a session with an existing RedbStore.
    #[must_use]
    pub fn with_redb_store(store: RedbStore) -> Self {
        Self {
            backend: StorageBackend::Persistent(store),
        }
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    /// The active backend as a trait object.
    #[must_use]
    pub fn store(&self) -> &dyn RecordStore {
        match &self.backend {
            StorageBackend::InMemory(s) => s,
            StorageBackend::Persistent(s) => s,
        }
    }

    fn store_mut(&mut self) -> &mut dyn RecordStore {
        match &mut self.backend {
            StorageBackend::InMemory(s) => s,
            StorageBackend::Persistent(s) => s,
        }
    }

    // =========================================================================
    // AGENCY
    // =========================================================================

    pub fn agency(&self) -> Result<Option<Agency>, GtssError> {
        self.store().agency()
    }

    /// Validate and save the agency singleton.
    pub fn save_agency(&mut self, insert: InsertAgency) -> Result<Agency, GtssError> {
        insert.validate()?;
        self.store_mut().save_agency(insert)
    }

    pub fn clear_agency(&mut self) -> Result<bool, GtssError> {
        self.store_mut().clear_agency()
    }

    // =========================================================================
    // SIGNALS
    // =========================================================================

    pub fn signals(&self) -> Result<Vec<Signal>, GtssError> {
        self.store().signals()
    }

    pub fn signal(&self, signal_id: &str) -> Result<Option<Signal>, GtssError> {
        self.store().signal(signal_id)
    }

    /// Validate and append a signal.
    pub fn save_signal(&mut self, insert: InsertSignal) -> Result<Signal, GtssError> {
        insert.validate()?;
        self.store_mut().save_signal(insert)
    }

    /// Validate and merge a partial signal update.
    pub fn update_signal(
        &mut self,
        signal_id: &str,
        patch: SignalPatch,
    ) -> Result<Signal, GtssError> {
        patch.validate()?;
        self.store_mut().update_signal(signal_id, patch)
    }

    /// Delete a signal together with its phases and detectors.
    pub fn delete_signal(&mut self, signal_id: &str) -> Result<CascadeReport, GtssError> {
        self.store_mut().delete_signal(signal_id)
    }

    // =========================================================================
    // PHASES
    // =========================================================================

    pub fn phases(&self) -> Result<Vec<Phase>, GtssError> {
        self.store().phases()
    }

    pub fn phase(&self, id: &str) -> Result<Option<Phase>, GtssError> {
        self.store().phase(id)
    }

    pub fn phases_by_signal(&self, signal_id: &str) -> Result<Vec<Phase>, GtssError> {
        self.store().phases_by_signal(signal_id)
    }

    pub fn save_phase(&mut self, insert: InsertPhase) -> Result<Phase, GtssError> {
        insert.validate()?;
        self.store_mut().save_phase(insert)
    }

    pub fn update_phase(&mut self, id: &str, patch: PhasePatch) -> Result<Phase, GtssError> {
        patch.validate()?;
        self.store_mut().update_phase(id, patch)
    }

    pub fn delete_phase(&mut self, id: &str) -> Result<bool, GtssError> {
        self.store_mut().delete_phase(id)
    }

    // =========================================================================
    // DETECTORS
    // =========================================================================

    pub fn detectors(&self) -> Result<Vec<Detector>, GtssError> {
        self.store().detectors()
    }

    pub fn detector(&self, id: &str) -> Result<Option<Detector>, GtssError> {
        self.store().detector(id)
    }

    pub fn detectors_by_signal(&self, signal_id: &str) -> Result<Vec<Detector>, GtssError> {
        self.store().detectors_by_signal(signal_id)
    }

    pub fn save_detector(&mut self, insert: InsertDetector) -> Result<Detector, GtssError> {
        insert.validate()?;
        self.store_mut().save_detector(insert)
    }

    pub fn update_detector(
        &mut self,
        id: &str,
        patch: DetectorPatch,
    ) -> Result<Detector, GtssError> {
        patch.validate()?;
        self.store_mut().update_detector(id, patch)
    }

    pub fn delete_detector(&mut self, id: &str) -> Result<bool, GtssError> {
        self.store_mut().delete_detector(id)
    }

    // =========================================================================
    // WHOLE STORE
    // =========================================================================

    /// Consistent copy of every collection.
    pub fn snapshot(&self) -> Result<Snapshot, GtssError> {
        self.store().snapshot()
    }

    /// Record counts per collection.
    pub fn counts(&self) -> Result<StoreCounts, GtssError> {
        Ok(self.snapshot()?.counts())
    }

    /// Remove every record.
    pub fn clear(&mut self) -> Result<(), GtssError> {
        self.store_mut().clear()
    }

    /// Replace the store contents with the records of a GTSS archive.
    ///
    /// The archive is parsed and every row validated into a fresh dataset
    /// before the store is touched; any failure leaves it unchanged.
    pub fn import_archive(&mut self, bytes: &[u8]) -> Result<StoreCounts, GtssError> {
        let snapshot = import_archive(bytes)?.into_snapshot()?;
        let counts = snapshot.counts();
        self.store_mut().restore(snapshot)?;
        Ok(counts)
    }
}

// =============================================================================
// TESTS
// =============================================================================
