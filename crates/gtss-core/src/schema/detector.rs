//! Detector schema.

use super::{
    check_measurement, check_optional_text, merge, merge_optional, present, require_text,
    signal_key,
};
use crate::primitives::MAX_PHASE_NUMBER;
use crate::{GtssError, RecordId};
use serde::{Deserialize, Serialize};

/// A vehicle or pedestrian detector wired to a signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detector {
    pub id: RecordId,
    pub channel: String,
    pub signal_id: String,
    pub phase: u32,
    pub description: Option<String>,
    pub purpose: String,
    pub vehicle_type: Option<String>,
    pub lane: Option<String>,
    pub technology_type: String,
    pub length: Option<f64>,
    pub stopbar_setback_dist: Option<f64>,
}

/// Detector save payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertDetector {
    pub channel: String,
    pub signal_id: String,
    pub phase: u32,
    pub description: Option<String>,
    pub purpose: String,
    pub vehicle_type: Option<String>,
    pub lane: Option<String>,
    pub technology_type: String,
    pub length: Option<f64>,
    pub stopbar_setback_dist: Option<f64>,
}

fn check_phase_reference(value: u32) -> Result<(), GtssError> {
    if value > MAX_PHASE_NUMBER {
        return Err(GtssError::validation(
            "phase",
            format!("must be at most {MAX_PHASE_NUMBER}"),
        ));
    }
    Ok(())
}

impl InsertDetector {
    /// Check required columns and measurement ranges.
    pub fn validate(&self) -> Result<(), GtssError> {
        require_text("channel", &self.channel)?;
        require_text("signalId", &self.signal_id)?;
        check_phase_reference(self.phase)?;
        check_optional_text("description", self.description.as_deref())?;
        require_text("purpose", &self.purpose)?;
        check_optional_text("vehicleType", self.vehicle_type.as_deref())?;
        check_optional_text("lane", self.lane.as_deref())?;
        require_text("technologyType", &self.technology_type)?;
        check_measurement("length", self.length)?;
        check_measurement("stopbarSetbackDist", self.stopbar_setback_dist)?;
        Ok(())
    }

    /// Build the stored record.
    #[must_use]
    pub fn into_detector(self, id: RecordId) -> Detector {
        Detector {
            id,
            channel: self.channel,
            signal_id: signal_key(self.signal_id),
            phase: self.phase,
            description: present(self.description),
            purpose: self.purpose,
            vehicle_type: present(self.vehicle_type),
            lane: present(self.lane),
            technology_type: self.technology_type,
            length: self.length,
            stopbar_setback_dist: self.stopbar_setback_dist,
        }
    }
}

/// Partial detector update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorPatch {
    pub channel: Option<String>,
    pub signal_id: Option<String>,
    pub phase: Option<u32>,
    pub description: Option<String>,
    pub purpose: Option<String>,
    pub vehicle_type: Option<String>,
    pub lane: Option<String>,
    pub technology_type: Option<String>,
    pub length: Option<f64>,
    pub stopbar_setback_dist: Option<f64>,
}

impl DetectorPatch {
    /// Check every supplied column with the insert rules.
    pub fn validate(&self) -> Result<(), GtssError> {
        if let Some(v) = &self.channel {
            require_text("channel", v)?;
        }
        if let Some(v) = &self.signal_id {
            require_text("signalId", v)?;
        }
        if let Some(v) = self.phase {
            check_phase_reference(v)?;
        }
        check_optional_text("description", self.description.as_deref())?;
        if let Some(v) = &self.purpose {
            require_text("purpose", v)?;
        }
        check_optional_text("vehicleType", self.vehicle_type.as_deref())?;
        check_optional_text("lane", self.lane.as_deref())?;
        if let Some(v) = &self.technology_type {
            require_text("technologyType", v)?;
        }
        check_measurement("length", self.length)?;
        check_measurement("stopbarSetbackDist", self.stopbar_setback_dist)?;
        Ok(())
    }

    /// Merge supplied columns over `detector`.
    pub fn apply_to(self, detector: &mut Detector) {
        merge(&mut detector.channel, self.channel);
        merge(&mut detector.signal_id, self.signal_id.map(signal_key));
        merge(&mut detector.phase, self.phase);
        merge_optional(&mut detector.description, present(self.description));
        merge(&mut detector.purpose, self.purpose);
        merge_optional(&mut detector.vehicle_type, present(self.vehicle_type));
        merge_optional(&mut detector.lane, present(self.lane));
        merge(&mut detector.technology_type, self.technology_type);
        merge_optional(&mut detector.length, self.length);
        merge_optional(&mut detector.stopbar_setback_dist, self.stopbar_setback_dist);
    }
}
