//! # Export Benchmarks
//!
//! Performance benchmarks for gtss-core store and export operations.
//!
//! Run with: `cargo bench -p gtss-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use gtss_core::{
    DocumentKind, InsertDetector, InsertPhase, InsertSignal, Session, Snapshot, export_archive,
    export_document,
};
use std::hint::black_box;

/// Build an inventory of N signals with eight phases and four detectors each.
fn create_inventory(signals: usize) -> Snapshot {
    let mut session = Session::new();

    for i in 0..signals {
        let signal = session
            .save_signal(InsertSignal {
                agency_id: "BENCH".to_string(),
                street_name1: format!("Street {i}"),
                street_name2: "Main St".to_string(),
                latitude: 40.0,
                longitude: -75.0,
                ..Default::default()
            })
            .expect("save signal");

        for phase in (1..=8).rev() {
            session
                .save_phase(InsertPhase {
                    phase,
                    signal_id: signal.signal_id.clone(),
                    movement_type: if phase % 2 == 0 { "Through" } else { "Left Turn" }
                        .to_string(),
                    ..Default::default()
                })
                .expect("save phase");
        }

        for channel in 1..=4 {
            session
                .save_detector(InsertDetector {
                    channel: format!("D{channel}"),
                    signal_id: signal.signal_id.clone(),
                    phase: 2,
                    purpose: "Stopbar".to_string(),
                    technology_type: "Video".to_string(),
                    ..Default::default()
                })
                .expect("save detector");
        }
    }

    session.snapshot().expect("snapshot")
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_phase_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("phase_document");

    for size in [10, 100, 1000].iter() {
        let snapshot = create_inventory(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &snapshot, |b, snapshot| {
            b.iter(|| export_document(DocumentKind::Phases, black_box(snapshot)));
        });
    }

    group.finish();
}

fn bench_archive(c: &mut Criterion) {
    let mut group = c.benchmark_group("archive");

    for size in [10, 100, 1000].iter() {
        let snapshot = create_inventory(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &snapshot, |b, snapshot| {
            b.iter(|| export_archive(black_box(snapshot)));
        });
    }

    group.finish();
}

fn bench_cascade_delete(c: &mut Criterion) {
    let snapshot = create_inventory(100);

    c.bench_function("cascade_delete_100", |b| {
        b.iter(|| {
            let mut session = Session::with_snapshot(snapshot.clone());
            black_box(session.delete_signal("SIG_050"))
        });
    });
}

criterion_group!(benches, bench_phase_document, bench_archive, bench_cascade_delete);
criterion_main!(benches);
