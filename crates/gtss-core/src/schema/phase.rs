//! Phase (movement) schema.

use super::{MovementType, merge, merge_optional, require_text, signal_key};
use crate::primitives::{
    DEFAULT_NUM_OF_LANES, LIST_SEPARATOR, MAX_COMPASS_BEARING, MAX_DETECTION_IDS,
    MAX_PHASE_NUMBER,
};
use crate::{GtssError, RecordId};
use serde::{Deserialize, Serialize};

/// A movement phase served by a signal.
///
/// `signal_id` is a logical reference to `Signal::signal_id`; it is not
/// checked on save, but deleting the signal removes the phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub id: RecordId,
    pub phase: u32,
    pub signal_id: String,
    pub movement_type: String,
    pub num_of_lanes: u32,
    pub compass_bearing: Option<u16>,
    pub posted_speed: Option<u32>,
    pub is_overlap: bool,
    pub is_pedestrian: bool,
    pub channel_output: Option<u32>,
    pub vehicle_detection_ids: Vec<String>,
    pub ped_audible_enabled: bool,
}

/// Phase save payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertPhase {
    pub phase: u32,
    pub signal_id: String,
    pub movement_type: String,
    pub num_of_lanes: Option<u32>,
    pub compass_bearing: Option<u16>,
    pub posted_speed: Option<u32>,
    pub is_overlap: Option<bool>,
    pub is_pedestrian: Option<bool>,
    pub channel_output: Option<u32>,
    pub vehicle_detection_ids: Option<Vec<String>>,
    pub ped_audible_enabled: Option<bool>,
}

fn check_phase_number(value: u32) -> Result<(), GtssError> {
    if value == 0 || value > MAX_PHASE_NUMBER {
        return Err(GtssError::validation(
            "phase",
            format!("must be between 1 and {MAX_PHASE_NUMBER}"),
        ));
    }
    Ok(())
}

/// Free text is allowed, but not a bare export code: it would be read back
/// as the dictionary label.
fn check_movement_type(value: &str) -> Result<(), GtssError> {
    require_text("movementType", value)?;
    if MovementType::from_label(value).is_none() {
        if let Some(movement) = MovementType::from_code(value) {
            return Err(GtssError::validation(
                "movementType",
                format!("'{value}' is an export code, use '{}'", movement.label()),
            ));
        }
    }
    Ok(())
}

fn check_lanes(value: Option<u32>) -> Result<(), GtssError> {
    if value == Some(0) {
        return Err(GtssError::validation("numOfLanes", "must be at least 1"));
    }
    Ok(())
}

fn check_bearing(value: Option<u16>) -> Result<(), GtssError> {
    match value {
        Some(v) if v > MAX_COMPASS_BEARING => Err(GtssError::validation(
            "compassBearing",
            format!("must be between 0 and {MAX_COMPASS_BEARING}"),
        )),
        _ => Ok(()),
    }
}

fn check_detection_ids(ids: Option<&[String]>) -> Result<(), GtssError> {
    let Some(ids) = ids else {
        return Ok(());
    };
    if ids.len() > MAX_DETECTION_IDS {
        return Err(GtssError::validation(
            "vehicleDetectionIds",
            format!("at most {MAX_DETECTION_IDS} ids allowed"),
        ));
    }
    for id in ids {
        require_text("vehicleDetectionIds", id)?;
        if id.contains(LIST_SEPARATOR) {
            return Err(GtssError::validation(
                "vehicleDetectionIds",
                format!("ids must not contain '{LIST_SEPARATOR}'"),
            ));
        }
    }
    Ok(())
}

impl InsertPhase {
    /// Check required columns and numeric ranges.
    pub fn validate(&self) -> Result<(), GtssError> {
        check_phase_number(self.phase)?;
        require_text("signalId", &self.signal_id)?;
        check_movement_type(&self.movement_type)?;
        check_lanes(self.num_of_lanes)?;
        check_bearing(self.compass_bearing)?;
        check_detection_ids(self.vehicle_detection_ids.as_deref())?;
        Ok(())
    }

    /// Build the stored record, filling defaults for absent columns.
    #[must_use]
    pub fn into_phase(self, id: RecordId) -> Phase {
        Phase {
            id,
            phase: self.phase,
            signal_id: signal_key(self.signal_id),
            movement_type: self.movement_type,
            num_of_lanes: self.num_of_lanes.unwrap_or(DEFAULT_NUM_OF_LANES),
            compass_bearing: self.compass_bearing,
            posted_speed: self.posted_speed,
            is_overlap: self.is_overlap.unwrap_or(false),
            is_pedestrian: self.is_pedestrian.unwrap_or(false),
            channel_output: self.channel_output,
            vehicle_detection_ids: self.vehicle_detection_ids.unwrap_or_default(),
            ped_audible_enabled: self.ped_audible_enabled.unwrap_or(false),
        }
    }
}

/// Partial phase update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhasePatch {
    pub phase: Option<u32>,
    pub signal_id: Option<String>,
    pub movement_type: Option<String>,
    pub num_of_lanes: Option<u32>,
    pub compass_bearing: Option<u16>,
    pub posted_speed: Option<u32>,
    pub is_overlap: Option<bool>,
    pub is_pedestrian: Option<bool>,
    pub channel_output: Option<u32>,
    pub vehicle_detection_ids: Option<Vec<String>>,
    pub ped_audible_enabled: Option<bool>,
}

impl PhasePatch {
    /// Check every supplied column with the insert rules.
    pub fn validate(&self) -> Result<(), GtssError> {
        if let Some(v) = self.phase {
            check_phase_number(v)?;
        }
        if let Some(v) = &self.signal_id {
            require_text("signalId", v)?;
        }
        if let Some(v) = &self.movement_type {
            check_movement_type(v)?;
        }
        check_lanes(self.num_of_lanes)?;
        check_bearing(self.compass_bearing)?;
        check_detection_ids(self.vehicle_detection_ids.as_deref())?;
        Ok(())
    }

    /// Merge supplied columns over `phase`.
    pub fn apply_to(self, phase: &mut Phase) {
        merge(&mut phase.phase, self.phase);
        merge(&mut phase.signal_id, self.signal_id.map(signal_key));
        merge(&mut phase.movement_type, self.movement_type);
        merge(&mut phase.num_of_lanes, self.num_of_lanes);
        merge_optional(&mut phase.compass_bearing, self.compass_bearing);
        merge_optional(&mut phase.posted_speed, self.posted_speed);
        merge(&mut phase.is_overlap, self.is_overlap);
        merge(&mut phase.is_pedestrian, self.is_pedestrian);
        merge_optional(&mut phase.channel_output, self.channel_output);
        merge(&mut phase.vehicle_detection_ids, self.vehicle_detection_ids);
        merge(&mut phase.ped_audible_enabled, self.ped_audible_enabled);
    }
}
