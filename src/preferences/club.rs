use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::store::Preference;
use crate::errors::SwingError;

/// Clubs the user can pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Club {
    Driver,
    Wood3,
    Wood5,
    Wood7,
    Iron3,
    Iron4,
    Iron5,
    Iron6,
    Iron7,
    Iron8,
    Iron9,
    PitchingWedge,
    GapWedge,
    SandWedge,
    LobWedge,
    Putter,
}

impl Club {
    pub const ALL: [Club; 16] = [
        Club::Driver,
        Club::Wood3,
        Club::Wood5,
        Club::Wood7,
        Club::Iron3,
        Club::Iron4,
        Club::Iron5,
        Club::Iron6,
        Club::Iron7,
        Club::Iron8,
        Club::Iron9,
        Club::PitchingWedge,
        Club::GapWedge,
        Club::SandWedge,
        Club::LobWedge,
        Club::Putter,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Club::Driver => "Driver",
            Club::Wood3 => "3 Wood",
            Club::Wood5 => "5 Wood",
            Club::Wood7 => "7 Wood",
            Club::Iron3 => "3 Iron",
            Club::Iron4 => "4 Iron",
            Club::Iron5 => "5 Iron",
            Club::Iron6 => "6 Iron",
            Club::Iron7 => "7 Iron",
            Club::Iron8 => "8 Iron",
            Club::Iron9 => "9 Iron",
            Club::PitchingWedge => "Pitching Wedge",
            Club::GapWedge => "Gap Wedge",
            Club::SandWedge => "Sand Wedge",
            Club::LobWedge => "Lob Wedge",
            Club::Putter => "Putter",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Club::Driver => "D",
            Club::Wood3 => "3W",
            Club::Wood5 => "5W",
            Club::Wood7 => "7W",
            Club::Iron3 => "3I",
            Club::Iron4 => "4I",
            Club::Iron5 => "5I",
            Club::Iron6 => "6I",
            Club::Iron7 => "7I",
            Club::Iron8 => "8I",
            Club::Iron9 => "9I",
            Club::PitchingWedge => "PW",
            Club::GapWedge => "GW",
            Club::SandWedge => "SW",
            Club::LobWedge => "LW",
            Club::Putter => "P",
        }
    }

    /// Typical club head speed (km/h) and launch angle (deg) for an amateur
    /// swing with this club. Used to seed mock measurements.
    pub(crate) fn typical_speed_and_launch(&self) -> (f64, f64) {
        match self {
            Club::Driver => (150.0, 12.0),
            Club::Wood3 => (140.0, 11.0),
            Club::Wood5 => (135.0, 12.5),
            Club::Wood7 => (130.0, 14.0),
            Club::Iron3 => (128.0, 13.0),
            Club::Iron4 => (125.0, 14.0),
            Club::Iron5 => (121.0, 15.0),
            Club::Iron6 => (117.0, 16.5),
            Club::Iron7 => (113.0, 18.0),
            Club::Iron8 => (109.0, 20.0),
            Club::Iron9 => (105.0, 22.0),
            Club::PitchingWedge => (100.0, 25.0),
            Club::GapWedge => (96.0, 27.0),
            Club::SandWedge => (92.0, 30.0),
            Club::LobWedge => (88.0, 33.0),
            Club::Putter => (10.0, 2.0),
        }
    }
}

impl fmt::Display for Club {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Club {
    type Err = SwingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Club::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(wanted) || c.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SwingError::InvalidUserInput {
                field: "club".to_string(),
                reason: format!("unknown club '{wanted}'"),
            })
    }
}

impl Preference for Club {
    const KEY: &'static str = "selectedClub";

    fn encode(&self) -> Result<String, SwingError> {
        Ok(self.name().to_string())
    }

    fn decode(raw: &str) -> Result<Self, SwingError> {
        raw.parse().map_err(|_| SwingError::InvalidStoredValue {
            key: Self::KEY.to_string(),
            reason: format!("unknown club '{}'", raw.trim()),
        })
    }
}
