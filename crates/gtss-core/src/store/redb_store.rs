//! # redb-backed Record Store
//!
//! A disk-backed record store using the redb embedded database.
//!
//! Storage is a single key-value table, `namespaces`, with one fixed key per
//! collection. Each value is the JSON encoding of the whole collection.
//!
//! Every mutation runs inside one write transaction:
//! 1. load the four collections into a `MemoryStore`
//! 2. apply the mutation there
//! 3. write the collections back and commit
//!
//! If step 2 fails the transaction is dropped, which aborts it, so a
//! cascade delete either lands completely or not at all.

use super::{CascadeReport, MemoryStore, RecordStore, Snapshot};
use crate::primitives::{
    AGENCY_NAMESPACE, DETECTORS_NAMESPACE, PHASES_NAMESPACE, SIGNALS_NAMESPACE,
};
use crate::schema::{
    Agency, Detector, DetectorPatch, InsertAgency, InsertDetector, InsertPhase, InsertSignal,
    Phase, PhasePatch, Signal, SignalPatch,
};
use crate::GtssError;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Table for collections: namespace key -> JSON document
const NAMESPACES: TableDefinition<&str, &str> = TableDefinition::new("namespaces");

fn io_error(e: impl std::fmt::Display) -> GtssError {
    GtssError::IoError(e.to_string())
}

/// A disk-backed record store using redb.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

// =============================================================================
// NAMESPACE ENCODING
// =============================================================================

fn read_namespace<T, Tbl>(table: &Tbl, key: &str) -> Result<Option<T>, GtssError>
where
    T: DeserializeOwned,
    Tbl: ReadableTable<&'static str, &'static str>,
{
    let Some(raw) = table.get(key).map_err(io_error)? else {
        return Ok(None);
    };
    let value = serde_json::from_str(raw.value())
        .map_err(|e| GtssError::SerializationError(format!("{key}: {e}")))?;
    Ok(Some(value))
}

fn read_snapshot<Tbl>(table: &Tbl) -> Result<Snapshot, GtssError>
where
    Tbl: ReadableTable<&'static str, &'static str>,
{
    Ok(Snapshot {
        agency: read_namespace::<Option<Agency>, _>(table, AGENCY_NAMESPACE)?.flatten(),
        signals: read_namespace(table, SIGNALS_NAMESPACE)?.unwrap_or_default(),
        phases: read_namespace(table, PHASES_NAMESPACE)?.unwrap_or_default(),
        detectors: read_namespace(table, DETECTORS_NAMESPACE)?.unwrap_or_default(),
    })
}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<String, GtssError> {
    serde_json::to_string(value).map_err(|e| GtssError::SerializationError(format!("{key}: {e}")))
}

// =============================================================================
// TRANSACTIONS
// =============================================================================

impl RedbStore {
    /// Open or create a record database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GtssError> {
        let db = Database::create(path.as_ref()).map_err(io_error)?;

        // Initialize the table if it doesn't exist
        {
            let write_txn = db.begin_write().map_err(io_error)?;
            let _ = write_txn.open_table(NAMESPACES).map_err(io_error)?;
            write_txn.commit().map_err(io_error)?;
        }

        Ok(Self { db })
    }

    /// Run a read-only query against a consistent copy of the collections.
    fn read<T>(
        &self,
        query: impl FnOnce(&MemoryStore) -> Result<T, GtssError>,
    ) -> Result<T, GtssError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let table = read_txn.open_table(NAMESPACES).map_err(io_error)?;
        let working = MemoryStore::from_snapshot(read_snapshot(&table)?);
        query(&working)
    }

    /// Apply a mutation in one write transaction.
    ///
    /// Nothing is written unless `mutation` succeeds and the commit lands.
    fn write<T>(
        &mut self,
        mutation: impl FnOnce(&mut MemoryStore) -> Result<T, GtssError>,
    ) -> Result<T, GtssError> {
        let write_txn = self.db.begin_write().map_err(io_error)?;
        let result = {
            let mut table = write_txn.open_table(NAMESPACES).map_err(io_error)?;
            let mut working = MemoryStore::from_snapshot(read_snapshot(&table)?);

            let result = mutation(&mut working)?;

            let data = working.into_snapshot();
            let agency = encode(AGENCY_NAMESPACE, &data.agency)?;
            let signals = encode(SIGNALS_NAMESPACE, &data.signals)?;
            let phases = encode(PHASES_NAMESPACE, &data.phases)?;
            let detectors = encode(DETECTORS_NAMESPACE, &data.detectors)?;

            table
                .insert(AGENCY_NAMESPACE, agency.as_str())
                .map_err(io_error)?;
            table
                .insert(SIGNALS_NAMESPACE, signals.as_str())
                .map_err(io_error)?;
            table
                .insert(PHASES_NAMESPACE, phases.as_str())
                .map_err(io_error)?;
            table
                .insert(DETECTORS_NAMESPACE, detectors.as_str())
                .map_err(io_error)?;
            result
        };
        write_txn.commit().map_err(io_error)?;
        Ok(result)
    }
}

// =============================================================================
// RECORD STORE IMPLEMENTATION
// =============================================================================

impl RecordStore for RedbStore {
    fn agency(&self) -> Result<Option<Agency>, GtssError> {
        self.read(|s| s.agency())
    }

    fn save_agency(&mut self, insert: InsertAgency) -> Result<Agency, GtssError> {
        self.write(|s| s.save_agency(insert))
    }

    fn clear_agency(&mut self) -> Result<bool, GtssError> {
        self.write(|s| s.clear_agency())
    }

    fn signals(&self) -> Result<Vec<Signal>, GtssError> {
        self.read(|s| s.signals())
    }

    fn signal(&self, signal_id: &str) -> Result<Option<Signal>, GtssError> {
        self.read(|s| s.signal(signal_id))
    }

    fn save_signal(&mut self, insert: InsertSignal) -> Result<Signal, GtssError> {
        self.write(|s| s.save_signal(insert))
    }

    fn update_signal(
        &mut self,
        signal_id: &str,
        patch: SignalPatch,
    ) -> Result<Signal, GtssError> {
        self.write(|s| s.update_signal(signal_id, patch))
    }

    fn delete_signal(&mut self, signal_id: &str) -> Result<CascadeReport, GtssError> {
        self.write(|s| s.delete_signal(signal_id))
    }

    fn phases(&self) -> Result<Vec<Phase>, GtssError> {
        self.read(|s| s.phases())
    }

    fn phase(&self, id: &str) -> Result<Option<Phase>, GtssError> {
        self.read(|s| s.phase(id))
    }

    fn phases_by_signal(&self, signal_id: &str) -> Result<Vec<Phase>, GtssError> {
        self.read(|s| s.phases_by_signal(signal_id))
    }

    fn save_phase(&mut self, insert: InsertPhase) -> Result<Phase, GtssError> {
        self.write(|s| s.save_phase(insert))
    }

    fn update_phase(&mut self, id: &str, patch: PhasePatch) -> Result<Phase, GtssError> {
        self.write(|s| s.update_phase(id, patch))
    }

    fn delete_phase(&mut self, id: &str) -> Result<bool, GtssError> {
        self.write(|s| s.delete_phase(id))
    }

    fn detectors(&self) -> Result<Vec<Detector>, GtssError> {
        self.read(|s| s.detectors())
    }

    fn detector(&self, id: &str) -> Result<Option<Detector>, GtssError> {
        self.read(|s| s.detector(id))
    }

    fn detectors_by_signal(&self, signal_id: &str) -> Result<Vec<Detector>, GtssError> {
        self.read(|s| s.detectors_by_signal(signal_id))
    }

    fn save_detector(&mut self, insert: InsertDetector) -> Result<Detector, GtssError> {
        self.write(|s| s.save_detector(insert))
    }

    fn update_detector(
        &mut self,
        id: &str,
        patch: DetectorPatch,
    ) -> Result<Detector, GtssError> {
        self.write(|s| s.update_detector(id, patch))
    }

    fn delete_detector(&mut self, id: &str) -> Result<bool, GtssError> {
        self.write(|s| s.delete_detector(id))
    }

    fn snapshot(&self) -> Result<Snapshot, GtssError> {
        self.read(|s| s.snapshot())
    }

    fn restore(&mut self, snapshot: Snapshot) -> Result<(), GtssError> {
        self.write(|s| s.restore(snapshot))
    }
}

// =============================================================================
// TESTS
// =============================================================================
