//! # Formats
//!
//! Byte-level encodings of the record store that live outside the store
//! itself. File I/O happens in the app layer; everything here is a pure
//! transformation.

pub mod persistence;

pub use persistence::{PersistenceHeader, snapshot_from_bytes, snapshot_to_bytes};
