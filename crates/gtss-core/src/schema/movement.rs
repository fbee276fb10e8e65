//! Movement-type vocabulary and its GTSS export codes.
//!
//! The dictionary is closed: labels outside it are kept verbatim on export
//! and codes outside it are kept verbatim on import.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed movement-type vocabulary of a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MovementType {
    Through,
    LeftTurn,
    LeftThroughShared,
    PermissivePhase,
    FlashingYellowArrow,
    UTurn,
    RightTurn,
    ThroughRight,
    Pedestrian,
}

impl MovementType {
    /// Every movement type, in display order.
    pub const ALL: [Self; 9] = [
        Self::Through,
        Self::LeftTurn,
        Self::LeftThroughShared,
        Self::PermissivePhase,
        Self::FlashingYellowArrow,
        Self::UTurn,
        Self::RightTurn,
        Self::ThroughRight,
        Self::Pedestrian,
    ];

    /// Label as entered by users and stored on the phase.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Through => "Through",
            Self::LeftTurn => "Left Turn",
            Self::LeftThroughShared => "Left Through Shared",
            Self::PermissivePhase => "Permissive Phase",
            Self::FlashingYellowArrow => "Flashing Yellow Arrow",
            Self::UTurn => "U-Turn",
            Self::RightTurn => "Right Turn",
            Self::ThroughRight => "Through-Right",
            Self::Pedestrian => "Pedestrian",
        }
    }

    /// Short code written to `phases.csv`.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Through => "T",
            Self::LeftTurn => "L",
            Self::LeftThroughShared => "LT",
            Self::PermissivePhase => "PP",
            Self::FlashingYellowArrow => "FYA",
            Self::UTurn => "U",
            Self::RightTurn => "R",
            Self::ThroughRight => "TR",
            Self::Pedestrian => "PED",
        }
    }

    /// Exact, case-sensitive label lookup.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.label() == label)
    }

    /// Exact, case-sensitive code lookup.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.code() == code)
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Transcode a stored movement label to its export code.
#[must_use]
pub fn encode_movement(label: &str) -> &str {
    MovementType::from_label(label).map_or(label, |m| m.code())
}

/// Transcode an export code back to its stored label.
#[must_use]
pub fn decode_movement(code: &str) -> &str {
    MovementType::from_code(code).map_or(code, |m| m.label())
}
