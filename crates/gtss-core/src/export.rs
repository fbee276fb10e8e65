//! # GTSS Export Module
//!
//! Deterministic serialization of a store snapshot into the GTSS document
//! set, and the reverse path for archive import.
//!
//! Every document has a fixed column order. Rendering rules:
//! - `\n` line terminators, RFC-4180 quoting only where a value needs it
//! - absent optional values are empty fields
//! - booleans are `1` / `0`, lists are joined with `;`
//! - phase movement labels are transcoded to their GTSS codes
//! - phase rows are ordered by (signal id, phase number); signal and
//!   detector rows keep collection order
//!
//! The archive is built fully in memory and only returned once the zip
//! writer has finished, so a failure never yields a partial archive.

use crate::primitives::{ARCHIVE_FILE_NAME, LIST_SEPARATOR, MAX_IMPORT_ARCHIVE_SIZE};
use crate::schema::{
    Agency, Detector, InsertAgency, InsertDetector, InsertPhase, InsertSignal, Phase, Signal,
    decode_movement, encode_movement,
};
use crate::store::{MemoryStore, RecordStore, Snapshot};
use crate::GtssError;
use std::fmt;
use std::io::{Cursor, Read, Write};
use std::str::FromStr;

// =============================================================================
// DOCUMENT KINDS
// =============================================================================

/// Column contract of `agency.csv`.
pub const AGENCY_COLUMNS: [&str; 8] = [
    "agency_id",
    "agency_name",
    "agency_url",
    "agency_timezone",
    "agency_language",
    "agency_phone",
    "agency_email",
    "contact_name",
];

/// Column contract of `signals.csv`.
pub const SIGNAL_COLUMNS: [&str; 11] = [
    "signal_id",
    "agency_id",
    "street_name1",
    "street_name2",
    "latitude",
    "longitude",
    "control_type",
    "cabinet_type",
    "cabinet_location",
    "has_battery_backup",
    "has_cctv",
];

/// Column contract of `phases.csv`.
pub const PHASE_COLUMNS: [&str; 11] = [
    "signal_id",
    "phase",
    "movement_type",
    "num_of_lanes",
    "compass_bearing",
    "posted_speed",
    "is_overlap",
    "is_pedestrian",
    "channel_output",
    "vehicle_detection_ids",
    "ped_audible_enabled",
];

/// Column contract of `detectors.csv`.
pub const DETECTOR_COLUMNS: [&str; 10] = [
    "channel",
    "signal_id",
    "phase",
    "description",
    "purpose",
    "vehicle_type",
    "lane",
    "technology_type",
    "length",
    "stopbar_setback_dist",
];

/// One document of the GTSS set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Agency,
    Signals,
    Phases,
    Detectors,
}

impl DocumentKind {
    /// Every document, in archive order.
    pub const ALL: [Self; 4] = [Self::Agency, Self::Signals, Self::Phases, Self::Detectors];

    /// Entry name inside the archive.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Agency => "agency.csv",
            Self::Signals => "signals.csv",
            Self::Phases => "phases.csv",
            Self::Detectors => "detectors.csv",
        }
    }

    /// Fixed header row.
    #[must_use]
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Agency => &AGENCY_COLUMNS,
            Self::Signals => &SIGNAL_COLUMNS,
            Self::Phases => &PHASE_COLUMNS,
            Self::Detectors => &DETECTOR_COLUMNS,
        }
    }

    const fn stem(self) -> &'static str {
        match self {
            Self::Agency => "agency",
            Self::Signals => "signals",
            Self::Phases => "phases",
            Self::Detectors => "detectors",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

impl FromStr for DocumentKind {
    type Err = GtssError;

    /// Accepts `phases` as well as `phases.csv`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stem = s.strip_suffix(".csv").unwrap_or(s);
        Self::ALL
            .into_iter()
            .find(|k| k.stem() == stem)
            .ok_or_else(|| {
                GtssError::validation(
                    "document",
                    format!("unknown document '{s}' (expected agency, signals, phases or detectors)"),
                )
            })
    }
}

// =============================================================================
// ROW RENDERING
// =============================================================================

fn flag(value: bool) -> String {
    String::from(if value { "1" } else { "0" })
}

fn optional<T: ToString>(value: Option<&T>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}

fn agency_row(a: &Agency) -> Vec<String> {
    vec![
        a.agency_id.clone(),
        a.agency_name.clone(),
        optional(a.agency_url.as_ref()),
        a.agency_timezone.clone(),
        a.agency_language.clone(),
        optional(a.agency_phone.as_ref()),
        optional(a.agency_email.as_ref()),
        optional(a.contact_name.as_ref()),
    ]
}

fn signal_row(s: &Signal) -> Vec<String> {
    vec![
        s.signal_id.clone(),
        s.agency_id.clone(),
        s.street_name1.clone(),
        s.street_name2.clone(),
        s.latitude.to_string(),
        s.longitude.to_string(),
        optional(s.control_type.as_ref()),
        optional(s.cabinet_type.as_ref()),
        optional(s.cabinet_location.as_ref()),
        flag(s.has_battery_backup),
        flag(s.has_cctv),
    ]
}

fn phase_row(p: &Phase) -> Vec<String> {
    let separator = LIST_SEPARATOR.to_string();
    vec![
        p.signal_id.clone(),
        p.phase.to_string(),
        encode_movement(&p.movement_type).to_string(),
        p.num_of_lanes.to_string(),
        optional(p.compass_bearing.as_ref()),
        optional(p.posted_speed.as_ref()),
        flag(p.is_overlap),
        flag(p.is_pedestrian),
        optional(p.channel_output.as_ref()),
        p.vehicle_detection_ids.join(&separator),
        flag(p.ped_audible_enabled),
    ]
}

fn detector_row(d: &Detector) -> Vec<String> {
    vec![
        d.channel.clone(),
        d.signal_id.clone(),
        d.phase.to_string(),
        optional(d.description.as_ref()),
        d.purpose.clone(),
        optional(d.vehicle_type.as_ref()),
        optional(d.lane.as_ref()),
        d.technology_type.clone(),
        optional(d.length.as_ref()),
        optional(d.stopbar_setback_dist.as_ref()),
    ]
}

/// Phases in export order: signal id, then phase number.
#[must_use]
pub fn sorted_phases(phases: &[Phase]) -> Vec<&Phase> {
    let mut sorted: Vec<&Phase> = phases.iter().collect();
    sorted.sort_by(|a, b| {
        a.signal_id
            .cmp(&b.signal_id)
            .then_with(|| a.phase.cmp(&b.phase))
    });
    sorted
}

fn rows(kind: DocumentKind, snapshot: &Snapshot) -> Vec<Vec<String>> {
    match kind {
        DocumentKind::Agency => snapshot.agency.iter().map(agency_row).collect(),
        DocumentKind::Signals => snapshot.signals.iter().map(signal_row).collect(),
        DocumentKind::Phases => sorted_phases(&snapshot.phases)
            .into_iter()
            .map(phase_row)
            .collect(),
        DocumentKind::Detectors => snapshot.detectors.iter().map(detector_row).collect(),
    }
}

// =============================================================================
// EXPORT
// =============================================================================

fn export_error(e: impl fmt::Display) -> GtssError {
    GtssError::Export(e.to_string())
}

/// Render one document of the set.
pub fn export_document(kind: DocumentKind, snapshot: &Snapshot) -> Result<String, GtssError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(kind.columns()).map_err(export_error)?;
    for row in rows(kind, snapshot) {
        writer.write_record(&row).map_err(export_error)?;
    }

    let bytes = writer.into_inner().map_err(export_error)?;
    String::from_utf8(bytes).map_err(export_error)
}

/// Bundle all four documents into the `gtss-export.zip` archive.
pub fn export_archive(snapshot: &Snapshot) -> Result<Vec<u8>, GtssError> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    // Fixed timestamp keeps the archive bytes reproducible
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    for kind in DocumentKind::ALL {
        let document = export_document(kind, snapshot)?;
        zip.start_file(kind.file_name(), options)
            .map_err(|e| GtssError::Export(format!("{ARCHIVE_FILE_NAME}/{kind}: {e}")))?;
        zip.write_all(document.as_bytes())
            .map_err(|e| GtssError::Export(format!("{ARCHIVE_FILE_NAME}/{kind}: {e}")))?;
    }

    let cursor = zip.finish().map_err(export_error)?;
    Ok(cursor.into_inner())
}

// =============================================================================
// IMPORT
// =============================================================================

/// Insert payloads recovered from an archive, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedArchive {
    pub agency: Option<InsertAgency>,
    pub signals: Vec<InsertSignal>,
    pub phases: Vec<InsertPhase>,
    pub detectors: Vec<InsertDetector>,
}

impl ImportedArchive {
    /// Validate every payload and build a fresh dataset from them.
    ///
    /// The first failing row aborts the whole import.
    pub fn into_snapshot(self) -> Result<Snapshot, GtssError> {
        let mut store = MemoryStore::new();

        if let Some(agency) = self.agency {
            agency.validate().map_err(|e| row_error(DocumentKind::Agency, 0, &e))?;
            store.save_agency(agency)?;
        }
        for (i, signal) in self.signals.into_iter().enumerate() {
            signal
                .validate()
                .and_then(|()| store.save_signal(signal).map(|_| ()))
                .map_err(|e| row_error(DocumentKind::Signals, i, &e))?;
        }
        for (i, phase) in self.phases.into_iter().enumerate() {
            phase
                .validate()
                .and_then(|()| store.save_phase(phase).map(|_| ()))
                .map_err(|e| row_error(DocumentKind::Phases, i, &e))?;
        }
        for (i, detector) in self.detectors.into_iter().enumerate() {
            detector
                .validate()
                .and_then(|()| store.save_detector(detector).map(|_| ()))
                .map_err(|e| row_error(DocumentKind::Detectors, i, &e))?;
        }

        Ok(store.into_snapshot())
    }
}

fn row_error(kind: DocumentKind, index: usize, e: &GtssError) -> GtssError {
    GtssError::Import(format!("{kind} row {}: {e}", index.saturating_add(1)))
}

/// A data row with its document and row number for error messages.
struct Row<'a> {
    kind: DocumentKind,
    number: usize,
    record: &'a csv::StringRecord,
}

impl Row<'_> {
    fn error(&self, column: usize, reason: &str) -> GtssError {
        let name = self.kind.columns().get(column).copied().unwrap_or("?");
        GtssError::Import(format!(
            "{} row {}: {name} {reason}",
            self.kind, self.number
        ))
    }

    fn text(&self, column: usize) -> String {
        self.record.get(column).unwrap_or_default().to_string()
    }

    fn optional_text(&self, column: usize) -> Option<String> {
        Some(self.text(column)).filter(|s| !s.is_empty())
    }

    fn number<T: FromStr>(&self, column: usize) -> Result<T, GtssError> {
        self.record
            .get(column)
            .unwrap_or_default()
            .trim()
            .parse()
            .map_err(|_| self.error(column, "is not a number"))
    }

    fn optional_number<T: FromStr>(&self, column: usize) -> Result<Option<T>, GtssError> {
        if self.record.get(column).unwrap_or_default().trim().is_empty() {
            return Ok(None);
        }
        self.number(column).map(Some)
    }

    fn flag(&self, column: usize) -> Result<Option<bool>, GtssError> {
        match self.record.get(column).unwrap_or_default().trim() {
            "" => Ok(None),
            "1" | "true" => Ok(Some(true)),
            "0" | "false" => Ok(Some(false)),
            _ => Err(self.error(column, "is not 1 or 0")),
        }
    }

    fn list(&self, column: usize) -> Option<Vec<String>> {
        let raw = self.record.get(column).unwrap_or_default();
        if raw.is_empty() {
            return None;
        }
        Some(
            raw.split(LIST_SEPARATOR)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

fn read_entry<R: Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
    kind: DocumentKind,
) -> Result<String, GtssError> {
    let mut file = archive
        .by_name(kind.file_name())
        .map_err(|_| GtssError::Import(format!("archive is missing {kind}")))?;
    if file.size() > MAX_IMPORT_ARCHIVE_SIZE as u64 {
        return Err(GtssError::Import(format!("{kind} is too large")));
    }
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| GtssError::Import(format!("{kind}: {e}")))?;
    Ok(content)
}

fn parse_document<T>(
    kind: DocumentKind,
    content: &str,
    parse_row: impl Fn(&Row<'_>) -> Result<T, GtssError>,
) -> Result<Vec<T>, GtssError> {
    let mut reader = csv::ReaderBuilder::new().from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| GtssError::Import(format!("{kind}: {e}")))?;
    if !headers.iter().eq(kind.columns().iter().copied()) {
        return Err(GtssError::Import(format!(
            "{kind}: unexpected header, expected {}",
            kind.columns().join(",")
        )));
    }

    let mut parsed = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| GtssError::Import(format!("{kind}: {e}")))?;
        let row = Row {
            kind,
            number: i.saturating_add(1),
            record: &record,
        };
        parsed.push(parse_row(&row)?);
    }
    Ok(parsed)
}

fn parse_agency(row: &Row<'_>) -> Result<InsertAgency, GtssError> {
    Ok(InsertAgency {
        agency_id: row.text(0),
        agency_name: row.text(1),
        agency_url: row.optional_text(2),
        agency_timezone: row.text(3),
        agency_language: row.optional_text(4),
        agency_phone: row.optional_text(5),
        agency_email: row.optional_text(6),
        contact_name: row.optional_text(7),
    })
}

fn parse_signal(row: &Row<'_>) -> Result<InsertSignal, GtssError> {
    Ok(InsertSignal {
        signal_id: row.optional_text(0),
        agency_id: row.text(1),
        street_name1: row.text(2),
        street_name2: row.text(3),
        latitude: row.number(4)?,
        longitude: row.number(5)?,
        control_type: row.optional_text(6),
        cabinet_type: row.optional_text(7),
        cabinet_location: row.optional_text(8),
        has_battery_backup: row.flag(9)?,
        has_cctv: row.flag(10)?,
    })
}

fn parse_phase(row: &Row<'_>) -> Result<InsertPhase, GtssError> {
    Ok(InsertPhase {
        signal_id: row.text(0),
        phase: row.number(1)?,
        movement_type: decode_movement(&row.text(2)).to_string(),
        num_of_lanes: row.optional_number(3)?,
        compass_bearing: row.optional_number(4)?,
        posted_speed: row.optional_number(5)?,
        is_overlap: row.flag(6)?,
        is_pedestrian: row.flag(7)?,
        channel_output: row.optional_number(8)?,
        vehicle_detection_ids: row.list(9),
        ped_audible_enabled: row.flag(10)?,
    })
}

fn parse_detector(row: &Row<'_>) -> Result<InsertDetector, GtssError> {
    Ok(InsertDetector {
        channel: row.text(0),
        signal_id: row.text(1),
        phase: row.number(2)?,
        description: row.optional_text(3),
        purpose: row.text(4),
        vehicle_type: row.optional_text(5),
        lane: row.optional_text(6),
        technology_type: row.text(7),
        length: row.optional_number(8)?,
        stopbar_setback_dist: row.optional_number(9)?,
    })
}

/// Read a GTSS archive back into insert payloads.
///
/// All four entries must be present with the exact column contract.
/// Movement codes are decoded to labels; unknown codes pass through.
pub fn import_archive(bytes: &[u8]) -> Result<ImportedArchive, GtssError> {
    if bytes.len() > MAX_IMPORT_ARCHIVE_SIZE {
        return Err(GtssError::Import(format!(
            "archive size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_IMPORT_ARCHIVE_SIZE
        )));
    }

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| GtssError::Import(format!("not a zip archive: {e}")))?;

    let agency = read_entry(&mut archive, DocumentKind::Agency)?;
    let signals = read_entry(&mut archive, DocumentKind::Signals)?;
    let phases = read_entry(&mut archive, DocumentKind::Phases)?;
    let detectors = read_entry(&mut archive, DocumentKind::Detectors)?;

    let mut agencies = parse_document(DocumentKind::Agency, &agency, parse_agency)?;
    if agencies.len() > 1 {
        return Err(GtssError::Import(format!(
            "{} holds {} rows, at most one agency is allowed",
            DocumentKind::Agency,
            agencies.len()
        )));
    }

    Ok(ImportedArchive {
        agency: agencies.pop(),
        signals: parse_document(DocumentKind::Signals, &signals, parse_signal)?,
        phases: parse_document(DocumentKind::Phases, &phases, parse_phase)?,
        detectors: parse_document(DocumentKind::Detectors, &detectors, parse_detector)?,
    })
}

// =============================================================================
// TESTS
// =============================================================================
