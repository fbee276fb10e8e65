//! # Persistence Format
//!
//! Binary serialization of a store snapshot for the file backend.
//!
//! Format: Header (5 bytes) + postcard-serialized `Snapshot`.
//! - 4 bytes: Magic ("GTSS")
//! - 1 byte: Version
//!
//! Size and header are checked before the payload is decoded.

use crate::{GtssError, Snapshot, primitives};

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum allowed size of a snapshot file (100 MB).
pub const MAX_PERSISTENCE_PAYLOAD_SIZE: usize = 100 * 1024 * 1024;

const HEADER_SIZE: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The persistence header precedes all snapshot data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    /// Create a new header with current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), GtssError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(GtssError::SerializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(GtssError::SerializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GtssError> {
        let Some(header) = bytes.get(..HEADER_SIZE) else {
            return Err(GtssError::SerializationError(
                "Header too short".to_string(),
            ));
        };
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&header[0..4]);
        Ok(Self {
            magic,
            version: header[4],
        })
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a snapshot to bytes (header + payload).
pub fn snapshot_to_bytes(snapshot: &Snapshot) -> Result<Vec<u8>, GtssError> {
    let payload = postcard::to_stdvec(snapshot)
        .map_err(|e| GtssError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_SIZE + payload.len());
    result.extend_from_slice(&PersistenceHeader::new().to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Deserialize a snapshot from bytes.
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<Snapshot, GtssError> {
    if bytes.len() > MAX_PERSISTENCE_PAYLOAD_SIZE {
        return Err(GtssError::SerializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_PERSISTENCE_PAYLOAD_SIZE
        )));
    }

    let header = PersistenceHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload = bytes.get(HEADER_SIZE..).unwrap_or_default();
    postcard::from_bytes(payload).map_err(|e| {
        GtssError::SerializationError(format!("Failed to deserialize snapshot: {}", e))
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InsertPhase, InsertSignal, RecordId};

    fn sample() -> Snapshot {
        let signal = InsertSignal {
            agency_id: "SPRINGFIELD".to_string(),
            street_name1: "Main St".to_string(),
            street_name2: "1st Ave".to_string(),
            latitude: 39.78,
            longitude: -89.65,
            control_type: Some("Actuated".to_string()),
            ..Default::default()
        }
        .into_signal(RecordId::from("s1"), "SIG_001".to_string());
        let phase = InsertPhase {
            phase: 2,
            signal_id: "SIG_001".to_string(),
            movement_type: "Through".to_string(),
            vehicle_detection_ids: Some(vec!["D1".to_string(), "D2".to_string()]),
            ..Default::default()
        }
        .into_phase(RecordId::from("p1"));
        Snapshot {
            signals: vec![signal],
            phases: vec![phase],
            ..Default::default()
        }
    }

    #[test]
    fn header_roundtrip() {
        let bytes = PersistenceHeader::new().to_bytes();
        let restored = PersistenceHeader::from_bytes(&bytes).expect("parse header");
        assert_eq!(restored, PersistenceHeader::new());
    }

    #[test]
    fn bytes_roundtrip_bit_exact() {
        let bytes1 = snapshot_to_bytes(&sample()).expect("first serialize");
        let restored = snapshot_from_bytes(&bytes1).expect("deserialize");
        assert_eq!(restored, sample());

        let bytes2 = snapshot_to_bytes(&restored).expect("second serialize");
        assert_eq!(
            bytes1, bytes2,
            "save -> load -> save must produce identical bytes"
        );
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut bytes = vec![0u8; 10];
        bytes[0..4].copy_from_slice(b"XXXX");
        assert!(snapshot_from_bytes(&bytes).is_err());
    }

    #[test]
    fn truncated_header_rejected() {
        assert!(snapshot_from_bytes(b"GTS").is_err());
    }

    #[test]
    fn future_version_rejected() {
        let mut bytes = snapshot_to_bytes(&Snapshot::default()).expect("serialize");
        bytes[4] = primitives::FORMAT_VERSION + 1;
        assert!(snapshot_from_bytes(&bytes).is_err());
    }
}
