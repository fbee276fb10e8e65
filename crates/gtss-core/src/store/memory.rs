//! In-memory record store.
//!
//! Collections are plain vectors in insertion order; lookups are linear
//! scans. This is also the working copy the redb backend applies each
//! mutation to inside its write transaction.

use super::{CascadeReport, RecordStore, Snapshot, next_signal_id};
use crate::schema::{
    Agency, Detector, DetectorPatch, InsertAgency, InsertDetector, InsertPhase, InsertSignal,
    Phase, PhasePatch, Signal, SignalPatch,
};
use crate::{EntityKind, GtssError, RecordId};

/// Volatile store backed by vectors.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Snapshot,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given collections.
    #[must_use]
    pub fn from_snapshot(data: Snapshot) -> Self {
        Self { data }
    }

    /// Consume the store, returning its collections.
    #[must_use]
    pub fn into_snapshot(self) -> Snapshot {
        self.data
    }

    fn signal_mut(&mut self, signal_id: &str) -> Result<&mut Signal, GtssError> {
        self.data
            .signals
            .iter_mut()
            .find(|s| s.signal_id == signal_id)
            .ok_or_else(|| GtssError::not_found(EntityKind::Signal, signal_id))
    }

    fn phase_mut(&mut self, id: &str) -> Result<&mut Phase, GtssError> {
        self.data
            .phases
            .iter_mut()
            .find(|p| p.id.as_str() == id)
            .ok_or_else(|| GtssError::not_found(EntityKind::Phase, id))
    }

    fn detector_mut(&mut self, id: &str) -> Result<&mut Detector, GtssError> {
        self.data
            .detectors
            .iter_mut()
            .find(|d| d.id.as_str() == id)
            .ok_or_else(|| GtssError::not_found(EntityKind::Detector, id))
    }
}

impl RecordStore for MemoryStore {
    fn agency(&self) -> Result<Option<Agency>, GtssError> {
        Ok(self.data.agency.clone())
    }

    fn save_agency(&mut self, insert: InsertAgency) -> Result<Agency, GtssError> {
        let id = self
            .data
            .agency
            .as_ref()
            .map_or_else(RecordId::generate, |a| a.id.clone());
        let agency = insert.into_agency(id);
        self.data.agency = Some(agency.clone());
        Ok(agency)
    }

    fn clear_agency(&mut self) -> Result<bool, GtssError> {
        Ok(self.data.agency.take().is_some())
    }

    fn signals(&self) -> Result<Vec<Signal>, GtssError> {
        Ok(self.data.signals.clone())
    }

    fn signal(&self, signal_id: &str) -> Result<Option<Signal>, GtssError> {
        Ok(self
            .data
            .signals
            .iter()
            .find(|s| s.signal_id == signal_id)
            .cloned())
    }

    fn save_signal(&mut self, insert: InsertSignal) -> Result<Signal, GtssError> {
        let signal_id = match insert.requested_signal_id() {
            Some(requested) => {
                if self.data.signals.iter().any(|s| s.signal_id == requested) {
                    return Err(GtssError::validation(
                        "signalId",
                        format!("{requested} already exists"),
                    ));
                }
                requested.to_string()
            }
            None => next_signal_id(&self.data.signals),
        };
        let signal = insert.into_signal(RecordId::generate(), signal_id);
        self.data.signals.push(signal.clone());
        Ok(signal)
    }

    fn update_signal(
        &mut self,
        signal_id: &str,
        patch: SignalPatch,
    ) -> Result<Signal, GtssError> {
        let signal = self.signal_mut(signal_id)?;
        patch.apply_to(signal);
        Ok(signal.clone())
    }

    fn delete_signal(&mut self, signal_id: &str) -> Result<CascadeReport, GtssError> {
        let before = self.data.signals.len();
        self.data.signals.retain(|s| s.signal_id != signal_id);
        if self.data.signals.len() == before {
            return Ok(CascadeReport::default());
        }

        let phases_before = self.data.phases.len();
        self.data.phases.retain(|p| p.signal_id != signal_id);
        let detectors_before = self.data.detectors.len();
        self.data.detectors.retain(|d| d.signal_id != signal_id);

        Ok(CascadeReport {
            deleted: true,
            phases_removed: phases_before.saturating_sub(self.data.phases.len()),
            detectors_removed: detectors_before.saturating_sub(self.data.detectors.len()),
        })
    }

    fn phases(&self) -> Result<Vec<Phase>, GtssError> {
        Ok(self.data.phases.clone())
    }

    fn phase(&self, id: &str) -> Result<Option<Phase>, GtssError> {
        Ok(self
            .data
            .phases
            .iter()
            .find(|p| p.id.as_str() == id)
            .cloned())
    }

    fn phases_by_signal(&self, signal_id: &str) -> Result<Vec<Phase>, GtssError> {
        Ok(self
            .data
            .phases
            .iter()
            .filter(|p| p.signal_id == signal_id)
            .cloned()
            .collect())
    }

    fn save_phase(&mut self, insert: InsertPhase) -> Result<Phase, GtssError> {
        let phase = insert.into_phase(RecordId::generate());
        self.data.phases.push(phase.clone());
        Ok(phase)
    }

    fn update_phase(&mut self, id: &str, patch: PhasePatch) -> Result<Phase, GtssError> {
        let phase = self.phase_mut(id)?;
        patch.apply_to(phase);
        Ok(phase.clone())
    }

    fn delete_phase(&mut self, id: &str) -> Result<bool, GtssError> {
        let before = self.data.phases.len();
        self.data.phases.retain(|p| p.id.as_str() != id);
        Ok(self.data.phases.len() != before)
    }

    fn detectors(&self) -> Result<Vec<Detector>, GtssError> {
        Ok(self.data.detectors.clone())
    }

    fn detector(&self, id: &str) -> Result<Option<Detector>, GtssError> {
        Ok(self
            .data
            .detectors
            .iter()
            .find(|d| d.id.as_str() == id)
            .cloned())
    }

    fn detectors_by_signal(&self, signal_id: &str) -> Result<Vec<Detector>, GtssError> {
        Ok(self
            .data
            .detectors
            .iter()
            .filter(|d| d.signal_id == signal_id)
            .cloned()
            .collect())
    }

    fn save_detector(&mut self, insert: InsertDetector) -> Result<Detector, GtssError> {
        let detector = insert.into_detector(RecordId::generate());
        self.data.detectors.push(detector.clone());
        Ok(detector)
    }

    fn update_detector(
        &mut self,
        id: &str,
        patch: DetectorPatch,
    ) -> Result<Detector, GtssError> {
        let detector = self.detector_mut(id)?;
        patch.apply_to(detector);
        Ok(detector.clone())
    }

    fn delete_detector(&mut self, id: &str) -> Result<bool, GtssError> {
        let before = self.data.detectors.len();
        self.data.detectors.retain(|d| d.id.as_str() != id);
        Ok(self.data.detectors.len() != before)
    }

    fn snapshot(&self) -> Result<Snapshot, GtssError> {
        Ok(self.data.clone())
    }

    fn restore(&mut self, snapshot: Snapshot) -> Result<(), GtssError> {
        self.data = snapshot;
        Ok(())
    }
}
