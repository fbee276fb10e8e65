//! # Fixed Constants
//!
//! Compiled-in constants shared by the store, the export serializer and
//! the persistence formats. These are immutable at runtime.

// =============================================================================
// IDENTITY
// =============================================================================

/// Prefix for auto-generated signal business keys (`SIG_001`, `SIG_002`, ...).
pub const SIGNAL_ID_PREFIX: &str = "SIG_";

/// Minimum digit width of the numeric part of a generated signal id.
pub const SIGNAL_ID_WIDTH: usize = 3;

/// Language assigned to an agency saved without one.
pub const DEFAULT_AGENCY_LANGUAGE: &str = "en";

/// Lane count assigned to a phase saved without one.
pub const DEFAULT_NUM_OF_LANES: u32 = 1;

// =============================================================================
// KEY-VALUE NAMESPACES
// =============================================================================

/// Namespace key holding the JSON-encoded agency singleton.
pub const AGENCY_NAMESPACE: &str = "gtss:agency";

/// Namespace key holding the JSON-encoded signal collection.
pub const SIGNALS_NAMESPACE: &str = "gtss:signals";

/// Namespace key holding the JSON-encoded phase collection.
pub const PHASES_NAMESPACE: &str = "gtss:phases";

/// Namespace key holding the JSON-encoded detector collection.
pub const DETECTORS_NAMESPACE: &str = "gtss:detectors";

// =============================================================================
// SNAPSHOT FILE FORMAT
// =============================================================================

/// Magic bytes for the snapshot file header.
pub const MAGIC_BYTES: &[u8; 4] = b"GTSS";

/// Current snapshot file format version.
///
/// Increment this when making breaking changes to the snapshot layout.
pub const FORMAT_VERSION: u8 = 1;

// =============================================================================
// EXPORT
// =============================================================================

/// File name of the export archive offered for download.
pub const ARCHIVE_FILE_NAME: &str = "gtss-export.zip";

/// Separator used when a list field is flattened into one CSV cell.
pub const LIST_SEPARATOR: char = ';';

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length in bytes of any single text field.
pub const MAX_TEXT_LENGTH: usize = 256;

/// Highest phase number accepted (NEMA phases and overlaps fit well below).
pub const MAX_PHASE_NUMBER: u32 = 99;

/// Highest compass bearing accepted, in degrees.
pub const MAX_COMPASS_BEARING: u16 = 359;

/// Maximum number of detector ids listed on a single phase.
pub const MAX_DETECTION_IDS: usize = 64;

/// Maximum archive size accepted by import (50 MB).
pub const MAX_IMPORT_ARCHIVE_SIZE: usize = 50 * 1024 * 1024;
