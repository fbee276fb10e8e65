//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::RecordAction;
use crate::api::{self, AppState};
use crate::config::{Backend, Config};
use crate::storage::{open_session, save_session, validate_file_size};
use gtss_core::{
    DetectorPatch, DocumentKind, EntityKind, GtssError, InsertAgency, InsertDetector, InsertPhase,
    InsertSignal, PhasePatch, Session, SignalPatch, StoreCounts, export_archive, export_document,
    primitives::MAX_IMPORT_ARCHIVE_SIZE,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE VALIDATION
// =============================================================================

/// Maximum size of a JSON payload read through `--data @file` (2 MB).
const MAX_PAYLOAD_FILE_SIZE: u64 = 2 * 1024 * 1024;

/// Resolve an input path and ensure it names a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, GtssError> {
    let canonical = path.canonicalize().map_err(|e| {
        GtssError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(GtssError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path against its canonical parent directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, GtssError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        GtssError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(GtssError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| GtssError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn print_record<T: Serialize>(record: &T) {
    print_json(&serde_json::to_value(record).unwrap_or_default());
}

/// Parse a `--data` argument: inline JSON, or `@path` to read it from a file.
fn read_payload<T: DeserializeOwned>(data: &str) -> Result<T, GtssError> {
    let text = match data.strip_prefix('@') {
        Some(path) => {
            let validated = validate_file_path(Path::new(path))?;
            validate_file_size(&validated, MAX_PAYLOAD_FILE_SIZE)?;
            std::fs::read_to_string(&validated)
                .map_err(|e| GtssError::IoError(format!("Read payload: {}", e)))?
        }
        None => data.to_string(),
    };
    serde_json::from_str(&text).map_err(|e| GtssError::validation("data", e.to_string()))
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &Config) -> Result<(), GtssError> {
    let session = open_session(config)?;

    println!("GTSS Signal Inventory Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Address:  {}", config.bind_address());
    println!("  Backend:  {}", config.backend);
    println!("  Database: {}", config.database.display());
    println!(
        "  CORS:     {}",
        config.cors_origins.as_deref().unwrap_or("localhost only")
    );
    println!();
    println!("Endpoints:");
    println!("  GET  /health                 - Health check");
    println!("  GET  /api/status             - Record counts");
    println!("  GET  /api/agency             - Agency (POST to save)");
    println!("  GET  /api/signals            - Signals (POST to create)");
    println!("  GET  /api/phases             - Phases (POST to create)");
    println!("  GET  /api/detectors          - Detectors (POST to create)");
    println!("  POST /api/export             - GTSS ZIP archive");
    println!("  GET  /api/export/{{document}}  - Single GTSS CSV document");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let state = match config.backend {
        Backend::Redb => AppState::new(session),
        Backend::File => {
            tracing::info!(
                path = %config.database.display(),
                "file backend: changes are written back after each request"
            );
            AppState::with_snapshot_file(session, config.database.clone())
        }
    };

    api::run_server(&config.bind_address(), state, config.cors_origins.as_deref()).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show record counts.
pub fn cmd_status(config: &Config, json_mode: bool) -> Result<(), GtssError> {
    let session = open_session(config)?;
    let counts = session.counts()?;

    if json_mode {
        print_json(&serde_json::json!({
            "database": config.database.to_string_lossy(),
            "backend": config.backend.name(),
            "has_agency": counts.agency > 0,
            "signal_count": counts.signals,
            "phase_count": counts.phases,
            "detector_count": counts.detectors,
        }));
        return Ok(());
    }

    println!("GTSS Inventory Status");
    println!("=====================");
    println!("Database: {}", config.database.display());
    println!("Backend:  {}", config.backend);
    println!();
    print_counts(&counts);

    Ok(())
}

fn print_counts(counts: &StoreCounts) {
    println!(
        "Agency:    {}",
        if counts.agency > 0 { "set" } else { "none" }
    );
    println!("Signals:   {}", counts.signals);
    println!("Phases:    {}", counts.phases);
    println!("Detectors: {}", counts.detectors);
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Write the archive, or a single CSV document when `document` is given.
pub fn cmd_export(
    config: &Config,
    json_mode: bool,
    output: &Path,
    document: Option<DocumentKind>,
) -> Result<(), GtssError> {
    let validated_output = validate_output_path(output)?;

    let session = open_session(config)?;
    let snapshot = session.snapshot()?;

    let data = match document {
        Some(kind) => export_document(kind, &snapshot)?.into_bytes(),
        None => export_archive(&snapshot)?,
    };

    std::fs::write(&validated_output, &data)
        .map_err(|e| GtssError::IoError(format!("Write file: {}", e)))?;

    tracing::info!(
        bytes = data.len(),
        path = %validated_output.display(),
        "export written"
    );

    if json_mode {
        print_json(&serde_json::json!({
            "path": validated_output.to_string_lossy(),
            "bytes": data.len(),
            "document": document.map(|kind| kind.file_name()),
        }));
    } else {
        println!(
            "Exported {} bytes to {}",
            data.len(),
            validated_output.display()
        );
    }

    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Replace every record with the contents of a GTSS archive.
///
/// The archive is fully validated before anything is replaced.
pub fn cmd_import(config: &Config, json_mode: bool, input: &Path) -> Result<(), GtssError> {
    let validated_path = validate_file_path(input)?;
    validate_file_size(&validated_path, MAX_IMPORT_ARCHIVE_SIZE as u64)?;

    let data = std::fs::read(&validated_path)
        .map_err(|e| GtssError::IoError(format!("Read file: {}", e)))?;

    let mut session = open_session(config)?;
    let counts = session.import_archive(&data)?;
    save_session(&session, config)?;

    tracing::info!(
        signals = counts.signals,
        phases = counts.phases,
        detectors = counts.detectors,
        "archive imported"
    );

    if json_mode {
        print_json(&serde_json::json!({
            "imported": counts,
        }));
    } else {
        println!("Imported {}", validated_path.display());
        print_counts(&counts);
    }

    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize new database.
pub fn cmd_init(config: &Config, force: bool) -> Result<(), GtssError> {
    let db_path = &config.database;
    if db_path.exists() {
        if !force {
            return Err(GtssError::IoError(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| GtssError::IoError(format!("Remove existing database: {}", e)))?;
    }

    match config.backend {
        Backend::Redb => {
            let _session = Session::with_redb(db_path)?;
            println!("Initialized new redb database at {}", db_path.display());
        }
        Backend::File => {
            let session = Session::new();
            save_session(&session, config)?;
            println!("Initialized new file database at {}", db_path.display());
        }
    }

    Ok(())
}

// =============================================================================
// AGENCY COMMAND
// =============================================================================

/// Show the agency, replace it with `set`, or remove it with `clear`.
pub fn cmd_agency(
    config: &Config,
    json_mode: bool,
    set: Option<&str>,
    clear: bool,
) -> Result<(), GtssError> {
    let mut session = open_session(config)?;

    if let Some(data) = set {
        let insert: InsertAgency = read_payload(data)?;
        let agency = session.save_agency(insert)?;
        save_session(&session, config)?;
        tracing::info!(agency_id = %agency.agency_id, "agency saved");
        print_record(&agency);
        return Ok(());
    }

    if clear {
        let removed = session.clear_agency()?;
        save_session(&session, config)?;
        if json_mode {
            print_json(&serde_json::json!({ "deleted": removed }));
        } else if removed {
            println!("Agency removed");
        } else {
            println!("No agency to remove");
        }
        return Ok(());
    }

    let agency = session.agency()?;
    if json_mode {
        print_json(&serde_json::to_value(&agency).unwrap_or_default());
        return Ok(());
    }

    match agency {
        Some(agency) => {
            println!("Agency");
            println!("======");
            println!("ID:       {}", agency.agency_id);
            println!("Name:     {}", agency.agency_name);
            println!("Timezone: {}", agency.agency_timezone);
            println!("Language: {}", agency.agency_language);
            if let Some(url) = &agency.agency_url {
                println!("URL:      {}", url);
            }
            if let Some(contact) = &agency.contact_name {
                println!("Contact:  {}", contact);
            }
        }
        None => println!("No agency saved"),
    }

    Ok(())
}

// =============================================================================
// RECORD COMMANDS
// =============================================================================

fn missing(entity: EntityKind, key: &str) -> GtssError {
    GtssError::not_found(entity, key)
}

fn print_deleted(json_mode: bool, entity: EntityKind, key: &str, deleted: bool) {
    if json_mode {
        print_json(&serde_json::json!({ "deleted": deleted }));
    } else if deleted {
        println!("Deleted {} {}", entity.name(), key);
    } else {
        println!("No {} {}", entity.name(), key);
    }
}

/// List, show, add, update or delete signals.
///
/// Deleting a signal also removes its phases and detectors.
pub fn cmd_signal(config: &Config, json_mode: bool, action: RecordAction) -> Result<(), GtssError> {
    let mut session = open_session(config)?;

    match action {
        RecordAction::List { signal } => {
            let mut signals = session.signals()?;
            if let Some(signal_id) = signal {
                signals.retain(|s| s.signal_id == signal_id);
            }
            if json_mode {
                print_record(&signals);
            } else if signals.is_empty() {
                println!("No signals");
            } else {
                for signal in &signals {
                    println!(
                        "{}  {} & {}",
                        signal.signal_id, signal.street_name1, signal.street_name2
                    );
                }
            }
        }
        RecordAction::Get { key } => {
            let signal = session
                .signal(&key)?
                .ok_or_else(|| missing(EntityKind::Signal, &key))?;
            print_record(&signal);
        }
        RecordAction::Add { data } => {
            let insert: InsertSignal = read_payload(&data)?;
            let signal = session.save_signal(insert)?;
            save_session(&session, config)?;
            tracing::info!(signal_id = %signal.signal_id, "signal saved");
            print_record(&signal);
        }
        RecordAction::Update { key, data } => {
            let patch: SignalPatch = read_payload(&data)?;
            let signal = session.update_signal(&key, patch)?;
            save_session(&session, config)?;
            tracing::info!(signal_id = %signal.signal_id, "signal updated");
            print_record(&signal);
        }
        RecordAction::Delete { key } => {
            let report = session.delete_signal(&key)?;
            save_session(&session, config)?;
            if json_mode {
                print_record(&report);
            } else if report.deleted {
                tracing::info!(
                    signal_id = %key,
                    phases_removed = report.phases_removed,
                    detectors_removed = report.detectors_removed,
                    "signal deleted"
                );
                println!(
                    "Deleted signal {} ({} phases, {} detectors removed)",
                    key, report.phases_removed, report.detectors_removed
                );
            } else {
                println!("No signal {}", key);
            }
        }
    }

    Ok(())
}

/// List, show, add, update or delete phases.
pub fn cmd_phase(config: &Config, json_mode: bool, action: RecordAction) -> Result<(), GtssError> {
    let mut session = open_session(config)?;

    match action {
        RecordAction::List { signal } => {
            let phases = match signal {
                Some(signal_id) => session.phases_by_signal(&signal_id)?,
                None => session.phases()?,
            };
            if json_mode {
                print_record(&phases);
            } else if phases.is_empty() {
                println!("No phases");
            } else {
                for phase in &phases {
                    println!(
                        "{}  {} phase {:>2}  {}",
                        phase.id, phase.signal_id, phase.phase, phase.movement_type
                    );
                }
            }
        }
        RecordAction::Get { key } => {
            let phase = session
                .phase(&key)?
                .ok_or_else(|| missing(EntityKind::Phase, &key))?;
            print_record(&phase);
        }
        RecordAction::Add { data } => {
            let insert: InsertPhase = read_payload(&data)?;
            let phase = session.save_phase(insert)?;
            save_session(&session, config)?;
            tracing::info!(id = %phase.id, signal_id = %phase.signal_id, phase = phase.phase, "phase saved");
            print_record(&phase);
        }
        RecordAction::Update { key, data } => {
            let patch: PhasePatch = read_payload(&data)?;
            let phase = session.update_phase(&key, patch)?;
            save_session(&session, config)?;
            tracing::info!(id = %phase.id, "phase updated");
            print_record(&phase);
        }
        RecordAction::Delete { key } => {
            let deleted = session.delete_phase(&key)?;
            save_session(&session, config)?;
            print_deleted(json_mode, EntityKind::Phase, &key, deleted);
        }
    }

    Ok(())
}

/// List, show, add, update or delete detectors.
pub fn cmd_detector(
    config: &Config,
    json_mode: bool,
    action: RecordAction,
) -> Result<(), GtssError> {
    let mut session = open_session(config)?;

    match action {
        RecordAction::List { signal } => {
            let detectors = match signal {
                Some(signal_id) => session.detectors_by_signal(&signal_id)?,
                None => session.detectors()?,
            };
            if json_mode {
                print_record(&detectors);
            } else if detectors.is_empty() {
                println!("No detectors");
            } else {
                for detector in &detectors {
                    println!(
                        "{}  {} {}  phase {}  {}",
                        detector.id,
                        detector.signal_id,
                        detector.channel,
                        detector.phase,
                        detector.purpose
                    );
                }
            }
        }
        RecordAction::Get { key } => {
            let detector = session
                .detector(&key)?
                .ok_or_else(|| missing(EntityKind::Detector, &key))?;
            print_record(&detector);
        }
        RecordAction::Add { data } => {
            let insert: InsertDetector = read_payload(&data)?;
            let detector = session.save_detector(insert)?;
            save_session(&session, config)?;
            tracing::info!(id = %detector.id, signal_id = %detector.signal_id, "detector saved");
            print_record(&detector);
        }
        RecordAction::Update { key, data } => {
            let patch: DetectorPatch = read_payload(&data)?;
            let detector = session.update_detector(&key, patch)?;
            save_session(&session, config)?;
            tracing::info!(id = %detector.id, "detector updated");
            print_record(&detector);
        }
        RecordAction::Delete { key } => {
            let deleted = session.delete_detector(&key)?;
            save_session(&session, config)?;
            print_deleted(json_mode, EntityKind::Detector, &key, deleted);
        }
    }

    Ok(())
}
