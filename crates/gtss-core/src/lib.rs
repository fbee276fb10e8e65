//! # gtss-core
//!
//! The record store and export serializer for GTSS traffic signal
//! inventories - THE LOGIC.
//!
//! This crate holds the four GTSS collections (agency, signals, phases,
//! detectors), keeps them referentially consistent, and renders them into
//! the GTSS CSV document set and ZIP archive.
//!
//! ## Layout
//!
//! - `schema`: entity records, insert payloads, patches, movement codes
//! - `store`: the `RecordStore` trait with in-memory and redb backends
//! - `session`: validated entry point over either backend
//! - `export`: CSV documents, ZIP archive, archive import
//! - `formats`: snapshot file encoding
//!
//! ## Architectural Constraints
//!
//! - The cascade rule lives in the store and nowhere else
//! - Export output is fully determined by the store contents
//! - Has NO async, NO network dependencies, NO logging (pure Rust);
//!   operations return reports the caller may log

// =============================================================================
// MODULES
// =============================================================================

pub mod export;
pub mod formats;
pub mod primitives;
pub mod schema;
pub mod session;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{EntityKind, GtssError, RecordId};

// =============================================================================
// RE-EXPORTS: Schema
// =============================================================================

pub use schema::{
    Agency, Detector, DetectorPatch, InsertAgency, InsertDetector, InsertPhase, InsertSignal,
    MovementType, Phase, PhasePatch, Signal, SignalPatch, decode_movement, encode_movement,
};

// =============================================================================
// RE-EXPORTS: Store + Session
// =============================================================================

pub use session::{Session, StorageBackend};
pub use store::{CascadeReport, MemoryStore, RecordStore, RedbStore, Snapshot, StoreCounts};

// =============================================================================
// RE-EXPORTS: Export + Formats
// =============================================================================

pub use export::{DocumentKind, ImportedArchive, export_archive, export_document, import_archive};
pub use formats::{PersistenceHeader, snapshot_from_bytes, snapshot_to_bytes};
