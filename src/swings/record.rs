use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event markers inside a swing, seconds from the start of the recording.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwingTimestamps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<f64>,
}

impl SwingTimestamps {
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.top.is_none() && self.impact.is_none()
    }
}

/// Canonical swing record. Every numeric field is finite or `None`.
///
/// Metric payloads fill the speed/angle fields, tempo payloads fill the
/// duration/ratio/timestamp fields. Serialized names follow the analyzer's
/// canonical names so an exported record normalizes back to itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwingRecord {
    /// Stable ordering key
    pub index: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_samples: Option<u64>,

    #[serde(rename = "clubSpeed_kph", skip_serializing_if = "Option::is_none")]
    pub club_speed_kph: Option<f64>,
    #[serde(rename = "launchAngle_deg", skip_serializing_if = "Option::is_none")]
    pub launch_angle_deg: Option<f64>,
    #[serde(rename = "attackAngle_deg", skip_serializing_if = "Option::is_none")]
    pub attack_angle_deg: Option<f64>,
    #[serde(rename = "clubPath_deg", skip_serializing_if = "Option::is_none")]
    pub club_path_deg: Option<f64>,
    #[serde(rename = "spinRate_rpm", skip_serializing_if = "Option::is_none")]
    pub spin_rate_rpm: Option<f64>,
    #[serde(rename = "impactIndex", skip_serializing_if = "Option::is_none")]
    pub impact_index: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub backswing_s: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downswing_s: Option<f64>,
    /// Backswing duration over downswing duration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "SwingTimestamps::is_empty")]
    pub timestamps: SwingTimestamps,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling_hz: Option<f64>,

    /// Raw fields nothing mapped, nested ones keyed `outer.inner`. Diagnostics
    /// only, never rendered or exported.
    #[serde(skip)]
    pub extra: Map<String, Value>,
}

impl SwingRecord {
    pub fn has_metrics(&self) -> bool {
        self.club_speed_kph.is_some()
            || self.launch_angle_deg.is_some()
            || self.attack_angle_deg.is_some()
            || self.club_path_deg.is_some()
    }

    pub fn has_tempo(&self) -> bool {
        self.backswing_s.is_some() || self.downswing_s.is_some() || self.ratio.is_some()
    }
}
