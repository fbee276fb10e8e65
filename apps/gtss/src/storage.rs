//! # Storage Backends
//!
//! Opens the configured database and writes the `file` backend back to
//! disk. The redb backend commits on every mutation, so only the snapshot
//! file needs an explicit save.

use crate::config::{Backend, Config};
use gtss_core::{GtssError, Session, snapshot_from_bytes, snapshot_to_bytes};
use std::path::Path;

/// Maximum snapshot file size for the file backend (100 MB).
const MAX_SNAPSHOT_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validate file size before reading.
pub(crate) fn validate_file_size(path: &Path, max_size: u64) -> Result<(), GtssError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| GtssError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(GtssError::Import(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Open the configured database, creating an empty store when the file
/// backend has nothing on disk yet.
pub fn open_session(config: &Config) -> Result<Session, GtssError> {
    match config.backend {
        Backend::Redb => Session::with_redb(&config.database),
        Backend::File => {
            if !config.database.exists() {
                return Ok(Session::new());
            }
            validate_file_size(&config.database, MAX_SNAPSHOT_FILE_SIZE)?;
            let data = std::fs::read(&config.database)
                .map_err(|e| GtssError::IoError(format!("Read db: {}", e)))?;
            Ok(Session::with_snapshot(snapshot_from_bytes(&data)?))
        }
    }
}

/// Write the session snapshot to `path`.
///
/// The bytes go to a sibling temp file first and are renamed over `path`,
/// so an interrupted write never leaves a truncated database.
pub fn write_snapshot_file(session: &Session, path: &Path) -> Result<(), GtssError> {
    let data = snapshot_to_bytes(&session.snapshot()?)?;
    let temp = path.with_extension("tmp");
    std::fs::write(&temp, &data).map_err(|e| GtssError::IoError(format!("Write db: {}", e)))?;
    std::fs::rename(&temp, path).map_err(|e| GtssError::IoError(format!("Replace db: {}", e)))
}

/// Write an in-memory session back to its snapshot file.
///
/// A redb session commits on every mutation, so there is nothing to do.
pub fn save_session(session: &Session, config: &Config) -> Result<(), GtssError> {
    if session.is_persistent() {
        return Ok(());
    }
    write_snapshot_file(session, &config.database)
}
