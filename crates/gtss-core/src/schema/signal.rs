//! Signal (intersection controller) schema.

use super::{
    check_coordinate, check_optional_text, merge, merge_optional, present, require_text,
};
use crate::{GtssError, RecordId};
use serde::{Deserialize, Serialize};

/// A signalized intersection.
///
/// `signal_id` is the business key: unique among live signals and the key
/// every update and delete is addressed by. `id` is internal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub id: RecordId,
    pub signal_id: String,
    pub agency_id: String,
    pub street_name1: String,
    pub street_name2: String,
    pub latitude: f64,
    pub longitude: f64,
    pub control_type: Option<String>,
    pub cabinet_type: Option<String>,
    pub cabinet_location: Option<String>,
    pub has_battery_backup: bool,
    pub has_cctv: bool,
}

/// Signal save payload. A blank `signal_id` asks the store to generate one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertSignal {
    pub signal_id: Option<String>,
    pub agency_id: String,
    pub street_name1: String,
    pub street_name2: String,
    pub latitude: f64,
    pub longitude: f64,
    pub control_type: Option<String>,
    pub cabinet_type: Option<String>,
    pub cabinet_location: Option<String>,
    pub has_battery_backup: Option<bool>,
    pub has_cctv: Option<bool>,
}

impl InsertSignal {
    /// Check required columns, coordinate ranges and text limits.
    pub fn validate(&self) -> Result<(), GtssError> {
        check_optional_text("signalId", self.signal_id.as_deref())?;
        require_text("agencyId", &self.agency_id)?;
        require_text("streetName1", &self.street_name1)?;
        require_text("streetName2", &self.street_name2)?;
        check_coordinate("latitude", self.latitude, 90.0)?;
        check_coordinate("longitude", self.longitude, 180.0)?;
        check_optional_text("controlType", self.control_type.as_deref())?;
        check_optional_text("cabinetType", self.cabinet_type.as_deref())?;
        check_optional_text("cabinetLocation", self.cabinet_location.as_deref())?;
        Ok(())
    }

    /// The requested business key, if one was supplied and is not blank.
    #[must_use]
    pub fn requested_signal_id(&self) -> Option<&str> {
        self.signal_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Build the stored record with the resolved business key.
    #[must_use]
    pub fn into_signal(self, id: RecordId, signal_id: String) -> Signal {
        Signal {
            id,
            signal_id,
            agency_id: self.agency_id,
            street_name1: self.street_name1,
            street_name2: self.street_name2,
            latitude: self.latitude,
            longitude: self.longitude,
            control_type: present(self.control_type),
            cabinet_type: present(self.cabinet_type),
            cabinet_location: present(self.cabinet_location),
            has_battery_backup: self.has_battery_backup.unwrap_or(false),
            has_cctv: self.has_cctv.unwrap_or(false),
        }
    }
}

/// Partial signal update. The business key is deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalPatch {
    pub agency_id: Option<String>,
    pub street_name1: Option<String>,
    pub street_name2: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub control_type: Option<String>,
    pub cabinet_type: Option<String>,
    pub cabinet_location: Option<String>,
    pub has_battery_backup: Option<bool>,
    pub has_cctv: Option<bool>,
}

impl SignalPatch {
    /// Check every supplied column with the insert rules.
    pub fn validate(&self) -> Result<(), GtssError> {
        if let Some(v) = &self.agency_id {
            require_text("agencyId", v)?;
        }
        if let Some(v) = &self.street_name1 {
            require_text("streetName1", v)?;
        }
        if let Some(v) = &self.street_name2 {
            require_text("streetName2", v)?;
        }
        if let Some(v) = self.latitude {
            check_coordinate("latitude", v, 90.0)?;
        }
        if let Some(v) = self.longitude {
            check_coordinate("longitude", v, 180.0)?;
        }
        check_optional_text("controlType", self.control_type.as_deref())?;
        check_optional_text("cabinetType", self.cabinet_type.as_deref())?;
        check_optional_text("cabinetLocation", self.cabinet_location.as_deref())?;
        Ok(())
    }

    /// Merge supplied columns over `signal`.
    pub fn apply_to(self, signal: &mut Signal) {
        merge(&mut signal.agency_id, self.agency_id);
        merge(&mut signal.street_name1, self.street_name1);
        merge(&mut signal.street_name2, self.street_name2);
        merge(&mut signal.latitude, self.latitude);
        merge(&mut signal.longitude, self.longitude);
        merge_optional(&mut signal.control_type, present(self.control_type));
        merge_optional(&mut signal.cabinet_type, present(self.cabinet_type));
        merge_optional(&mut signal.cabinet_location, present(self.cabinet_location));
        merge(&mut signal.has_battery_backup, self.has_battery_backup);
        merge(&mut signal.has_cctv, self.has_cctv);
    }
}
