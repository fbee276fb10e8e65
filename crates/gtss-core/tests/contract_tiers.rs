//! # Contract Tier Tests (C0-C4)
//!
//! If ANY tier fails, the store is INVALID.
//!
//! ## Tiers
//! - C0: Payload Validation
//! - C1: Identity and Business Keys
//! - C2: Partial Update
//! - C3: Cascade Delete
//! - C4: Export Contract

use gtss_core::{
    DocumentKind, GtssError, InsertAgency, InsertDetector, InsertPhase, InsertSignal, PhasePatch,
    Session, SignalPatch, Snapshot, export_archive, export_document, import_archive,
};

fn insert_signal() -> InsertSignal {
    InsertSignal {
        agency_id: "SPRINGFIELD".to_string(),
        street_name1: "Main St".to_string(),
        street_name2: "1st Ave".to_string(),
        latitude: 39.7817,
        longitude: -89.6501,
        ..Default::default()
    }
}

fn insert_phase(signal_id: &str, phase: u32, movement: &str) -> InsertPhase {
    InsertPhase {
        phase,
        signal_id: signal_id.to_string(),
        movement_type: movement.to_string(),
        ..Default::default()
    }
}

fn insert_detector(signal_id: &str, channel: &str) -> InsertDetector {
    InsertDetector {
        channel: channel.to_string(),
        signal_id: signal_id.to_string(),
        phase: 2,
        purpose: "Stopbar".to_string(),
        technology_type: "Inductive Loop".to_string(),
        ..Default::default()
    }
}

fn insert_agency(name: &str) -> InsertAgency {
    InsertAgency {
        agency_id: "SPRINGFIELD".to_string(),
        agency_name: name.to_string(),
        agency_timezone: "America/Chicago".to_string(),
        ..Default::default()
    }
}

// =============================================================================
// TIER C0: PAYLOAD VALIDATION
// =============================================================================

mod c0_validation {
    use super::*;

    /// C0.1: Missing required signal columns are rejected.
    #[test]
    fn blank_street_rejected() {
        let mut session = Session::new();
        let result = session.save_signal(InsertSignal {
            street_name1: String::new(),
            ..insert_signal()
        });
        assert!(matches!(result, Err(GtssError::Validation { .. })));
    }

    /// C0.2: Phase numbers must be positive.
    #[test]
    fn phase_zero_rejected() {
        let mut session = Session::new();
        let result = session.save_phase(insert_phase("SIG_001", 0, "Through"));
        assert!(matches!(result, Err(GtssError::Validation { .. })));
        assert!(session.phases().expect("list").is_empty());
    }

    /// C0.3: A bare export code is not a movement type.
    #[test]
    fn export_code_as_movement_rejected() {
        let mut session = Session::new();
        for code in ["T", "FYA"] {
            let result = session.save_phase(insert_phase("SIG_001", 2, code));
            assert!(matches!(result, Err(GtssError::Validation { ref field, .. }) if field == "movementType"));
        }
        assert!(session.phases().expect("list").is_empty());
    }

    /// C0.4: Phases may reference a signal that does not exist yet.
    #[test]
    fn dangling_signal_reference_accepted() {
        let mut session = Session::new();
        assert!(
            session
                .save_phase(insert_phase("SIG_404", 2, "Through"))
                .is_ok()
        );
    }
}

// =============================================================================
// TIER C1: IDENTITY AND BUSINESS KEYS
// =============================================================================

mod c1_identity {
    use super::*;

    /// C1.1: Blank business keys are generated as SIG_NNN.
    #[test]
    fn generated_signal_ids_follow_count() {
        let mut session = Session::new();
        let ids: Vec<String> = (0..3)
            .map(|_| session.save_signal(insert_signal()).expect("save").signal_id)
            .collect();
        assert_eq!(ids, vec!["SIG_001", "SIG_002", "SIG_003"]);
    }

    /// C1.2: Generated keys stay unique after a delete.
    #[test]
    fn generated_ids_unique_after_delete() {
        let mut session = Session::new();
        session.save_signal(insert_signal()).expect("save");
        session.save_signal(insert_signal()).expect("save");
        session.delete_signal("SIG_001").expect("delete");

        let next = session.save_signal(insert_signal()).expect("save");
        assert_eq!(next.signal_id, "SIG_003");
    }

    /// C1.3: Internal ids are unique across records.
    #[test]
    fn internal_ids_unique() {
        let mut session = Session::new();
        let a = session.save_signal(insert_signal()).expect("save");
        let b = session.save_signal(insert_signal()).expect("save");
        assert_ne!(a.id, b.id);
    }

    /// C1.4: The agency is a singleton whose id survives re-saves.
    #[test]
    fn agency_is_singleton() {
        let mut session = Session::new();
        let first = session.save_agency(insert_agency("First")).expect("save");
        let second = session.save_agency(insert_agency("Second")).expect("save");

        assert_eq!(first.id, second.id);
        let stored = session.agency().expect("get").expect("present");
        assert_eq!(stored.agency_name, "Second");
        assert_eq!(session.counts().expect("counts").agency, 1);
    }
}

// =============================================================================
// TIER C2: PARTIAL UPDATE
// =============================================================================

mod c2_partial_update {
    use super::*;

    /// C2.1: Supplied fields overwrite, others keep prior values.
    #[test]
    fn signal_update_merges() {
        let mut session = Session::new();
        let original = session
            .save_signal(InsertSignal {
                control_type: Some("Actuated".to_string()),
                ..insert_signal()
            })
            .expect("save");

        let updated = session
            .update_signal(
                "SIG_001",
                SignalPatch {
                    street_name2: Some("2nd Ave".to_string()),
                    ..Default::default()
                },
            )
            .expect("update");

        assert_eq!(updated.street_name2, "2nd Ave");
        assert_eq!(updated.street_name1, original.street_name1);
        assert_eq!(updated.control_type.as_deref(), Some("Actuated"));
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.signal_id, original.signal_id);
    }

    /// C2.2: Update of a missing key is NotFound and changes nothing.
    #[test]
    fn update_missing_signal_is_not_found() {
        let mut session = Session::new();
        session.save_signal(insert_signal()).expect("save");
        let before = session.signals().expect("list");

        let result = session.update_signal(
            "SIG_999",
            SignalPatch {
                street_name1: Some("Elm St".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(GtssError::NotFound { .. })));
        assert_eq!(session.signals().expect("list"), before);
    }

    /// C2.3: Phases are updated by internal id.
    #[test]
    fn phase_update_by_id() {
        let mut session = Session::new();
        let phase = session
            .save_phase(insert_phase("SIG_001", 2, "Through"))
            .expect("save");

        let updated = session
            .update_phase(
                phase.id.as_str(),
                PhasePatch {
                    num_of_lanes: Some(3),
                    ..Default::default()
                },
            )
            .expect("update");
        assert_eq!(updated.num_of_lanes, 3);
        assert_eq!(updated.movement_type, "Through");
    }
}

// =============================================================================
// TIER C3: CASCADE DELETE
// =============================================================================

mod c3_cascade {
    use super::*;

    /// C3.1: Deleting a signal removes all of its children.
    #[test]
    fn delete_signal_removes_children() {
        let mut session = Session::new();
        session.save_signal(insert_signal()).expect("save");
        session.save_signal(insert_signal()).expect("save");
        for n in [2, 4, 6] {
            session
                .save_phase(insert_phase("SIG_001", n, "Through"))
                .expect("save");
        }
        session
            .save_phase(insert_phase("SIG_002", 2, "Through"))
            .expect("save");
        session
            .save_detector(insert_detector("SIG_001", "D1"))
            .expect("save");
        session
            .save_detector(insert_detector("SIG_002", "D9"))
            .expect("save");

        let report = session.delete_signal("SIG_001").expect("delete");
        assert!(report.deleted);
        assert_eq!(report.phases_removed, 3);
        assert_eq!(report.detectors_removed, 1);

        assert!(session.signal("SIG_001").expect("get").is_none());
        assert!(session.phases_by_signal("SIG_001").expect("list").is_empty());
        assert!(
            session
                .detectors_by_signal("SIG_001")
                .expect("list")
                .is_empty()
        );
        assert_eq!(session.phases_by_signal("SIG_002").expect("list").len(), 1);
        assert_eq!(
            session.detectors_by_signal("SIG_002").expect("list").len(),
            1
        );
    }

    /// C3.2: Children saved with a padded signal reference still cascade.
    #[test]
    fn padded_reference_cascades() {
        let mut session = Session::new();
        session.save_signal(insert_signal()).expect("save");
        session
            .save_phase(insert_phase(" SIG_001", 2, "Through"))
            .expect("save");
        session
            .save_detector(insert_detector("SIG_001 ", "D1"))
            .expect("save");

        let report = session.delete_signal("SIG_001").expect("delete");
        assert_eq!(report.phases_removed, 1);
        assert_eq!(report.detectors_removed, 1);
        assert!(session.phases().expect("list").is_empty());
        assert!(session.detectors().expect("list").is_empty());
    }

    /// C3.3: Deleting an absent signal is a no-op.
    #[test]
    fn delete_absent_signal_noop() {
        let mut session = Session::new();
        session.save_signal(insert_signal()).expect("save");
        let report = session.delete_signal("SIG_404").expect("delete");
        assert!(!report.deleted);
        assert_eq!(session.signals().expect("list").len(), 1);
    }

    /// C3.4: The cascade is atomic on the redb backend too.
    #[test]
    fn redb_cascade_survives_reopen() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("gtss.redb");

        {
            let mut session = Session::with_redb(&path).expect("open");
            session.save_signal(insert_signal()).expect("save");
            session
                .save_phase(insert_phase("SIG_001", 2, "Through"))
                .expect("save");
            session
                .save_detector(insert_detector("SIG_001", "D1"))
                .expect("save");
            session.delete_signal("SIG_001").expect("delete");
        }

        let session = Session::with_redb(&path).expect("reopen");
        assert!(session.is_persistent());
        let snapshot = session.snapshot().expect("snapshot");
        assert!(snapshot.signals.is_empty());
        assert!(snapshot.phases.is_empty());
        assert!(snapshot.detectors.is_empty());
    }
}

// =============================================================================
// TIER C4: EXPORT CONTRACT
// =============================================================================

mod c4_export {
    use super::*;

    /// C4.1: Empty store exports header-only documents.
    #[test]
    fn empty_store_header_only() {
        let snapshot = Snapshot::default();
        assert_eq!(
            export_document(DocumentKind::Agency, &snapshot).expect("render"),
            "agency_id,agency_name,agency_url,agency_timezone,agency_language,agency_phone,agency_email,contact_name\n"
        );
        assert_eq!(
            export_document(DocumentKind::Detectors, &snapshot).expect("render"),
            "channel,signal_id,phase,description,purpose,vehicle_type,lane,technology_type,length,stopbar_setback_dist\n"
        );
    }

    /// C4.2: Phase rows are ordered by signal then phase number.
    #[test]
    fn phase_rows_ordered() {
        let mut session = Session::new();
        session
            .save_phase(insert_phase("B", 2, "Through"))
            .expect("save");
        session
            .save_phase(insert_phase("A", 5, "Left Turn"))
            .expect("save");
        session
            .save_phase(insert_phase("A", 1, "Flashing Yellow Arrow"))
            .expect("save");

        let doc = export_document(DocumentKind::Phases, &session.snapshot().expect("snapshot"))
            .expect("render");
        let lines: Vec<&str> = doc.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("A,1,FYA,"));
        assert!(lines[2].starts_with("A,5,L,"));
        assert!(lines[3].starts_with("B,2,T,"));
    }

    /// C4.3: Agency row renders defaults.
    #[test]
    fn agency_row_rendered() {
        let mut session = Session::new();
        session.save_agency(insert_agency("City")).expect("save");
        let doc = export_document(DocumentKind::Agency, &session.snapshot().expect("snapshot"))
            .expect("render");
        assert_eq!(
            doc.lines().nth(1),
            Some("SPRINGFIELD,City,,America/Chicago,en,,,")
        );
    }

    /// C4.4: Free-text movement types and empty optional text survive the archive.
    #[test]
    fn free_text_and_empty_text_roundtrip() {
        let mut source = Session::new();
        source
            .save_agency(InsertAgency {
                agency_url: Some(String::new()),
                ..insert_agency("City")
            })
            .expect("save");
        source
            .save_signal(InsertSignal {
                control_type: Some(String::new()),
                ..insert_signal()
            })
            .expect("save");
        for (n, movement) in [(1, "Dual Left"), (2, "Th"), (3, "FYA Protected")] {
            source
                .save_phase(insert_phase("SIG_001", n, movement))
                .expect("save");
        }

        let original = source.snapshot().expect("snapshot");
        let bytes = export_archive(&original).expect("archive");
        let mut target = Session::new();
        target.import_archive(&bytes).expect("import");
        let restored = target.snapshot().expect("snapshot");

        assert_eq!(
            restored.agency.as_ref().map(|a| a.agency_url.clone()),
            original.agency.as_ref().map(|a| a.agency_url.clone())
        );
        assert_eq!(restored.signals[0].control_type, original.signals[0].control_type);
        let movements: Vec<&str> = restored
            .phases
            .iter()
            .map(|p| p.movement_type.as_str())
            .collect();
        assert_eq!(movements, vec!["Dual Left", "Th", "FYA Protected"]);
    }

    /// C4.5: Archive contains exactly the four documents.
    #[test]
    fn archive_has_four_entries() {
        let bytes = export_archive(&Snapshot::default()).expect("archive");
        let archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).expect("zip");
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort_unstable();
        assert_eq!(
            names,
            vec!["agency.csv", "detectors.csv", "phases.csv", "signals.csv"]
        );
    }

    /// C4.6: Export then import reproduces every business field.
    #[test]
    fn export_import_roundtrip() {
        let mut source = Session::new();
        source.save_agency(insert_agency("City")).expect("save");
        source
            .save_signal(InsertSignal {
                cabinet_location: Some("NE corner, behind pole".to_string()),
                has_cctv: Some(true),
                ..insert_signal()
            })
            .expect("save");
        source
            .save_phase(InsertPhase {
                compass_bearing: Some(90),
                vehicle_detection_ids: Some(vec!["D1".to_string(), "D2".to_string()]),
                ..insert_phase("SIG_001", 2, "Through-Right")
            })
            .expect("save");
        source
            .save_detector(InsertDetector {
                length: Some(6.5),
                ..insert_detector("SIG_001", "D1")
            })
            .expect("save");

        let original = source.snapshot().expect("snapshot");
        let bytes = export_archive(&original).expect("archive");
        let imported = import_archive(&bytes).expect("import");
        let restored = imported.into_snapshot().expect("build");

        assert_eq!(
            restored.agency.as_ref().map(|a| &a.agency_name),
            original.agency.as_ref().map(|a| &a.agency_name)
        );
        assert_eq!(restored.signals.len(), 1);
        assert_eq!(
            restored.signals[0].cabinet_location,
            original.signals[0].cabinet_location
        );
        assert_eq!(restored.signals[0].latitude, original.signals[0].latitude);
        assert!(restored.signals[0].has_cctv);
        assert_eq!(restored.phases[0].movement_type, "Through-Right");
        assert_eq!(
            restored.phases[0].vehicle_detection_ids,
            original.phases[0].vehicle_detection_ids
        );
        assert_eq!(restored.phases[0].compass_bearing, Some(90));
        assert_eq!(restored.detectors[0].length, Some(6.5));
    }
}
