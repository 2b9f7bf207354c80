use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::club::Club;
use super::store::Preference;
use crate::errors::SwingError;
use crate::swings::SwingRecord;

/// The most recently known swing measurement. Either complete or not stored at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwingStatsSnapshot {
    /// Club head speed, km/h
    #[serde(rename = "clubSpeed_kph")]
    pub club_speed_kph: f64,
    /// Ball launch angle, degrees
    #[serde(rename = "launchAngle_deg")]
    pub launch_angle_deg: f64,
    /// Angle of attack, degrees. Negative is descending.
    #[serde(rename = "attackAngle_deg")]
    pub attack_angle_deg: f64,
    /// Club path relative to the target line, degrees. Positive is in-to-out.
    #[serde(rename = "clubPath_deg")]
    pub club_path_deg: f64,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl SwingStatsSnapshot {
    /// Build a snapshot from a normalized record, `None` unless every field is there.
    pub fn from_record(record: &SwingRecord, updated_at: DateTime<Utc>) -> Option<Self> {
        let snapshot = Self {
            club_speed_kph: record.club_speed_kph?,
            launch_angle_deg: record.launch_angle_deg?,
            attack_angle_deg: record.attack_angle_deg?,
            club_path_deg: record.club_path_deg?,
            updated_at,
        };
        snapshot.is_valid().then_some(snapshot)
    }

    pub fn is_valid(&self) -> bool {
        [
            self.club_speed_kph,
            self.launch_angle_deg,
            self.attack_angle_deg,
            self.club_path_deg,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    /// A plausible measurement for `club` (7 iron when none is selected), stamped now.
    pub fn mock(club: Option<Club>) -> Self {
        Self::mock_at(club, Utc::now())
    }

    pub fn mock_at(club: Option<Club>, now: DateTime<Utc>) -> Self {
        let club = club.unwrap_or(Club::Iron7);
        let (speed, launch) = club.typical_speed_and_launch();
        let attack_base = match club {
            Club::Driver | Club::Wood3 | Club::Wood5 | Club::Wood7 => 1.5,
            Club::Putter => 0.0,
            _ => -3.0,
        };

        let seed = now.timestamp() as u64 ^ u64::from(now.timestamp_subsec_nanos());
        Self {
            club_speed_kph: round1(speed * (1.0 + 0.05 * jitter(seed, 1))),
            launch_angle_deg: round1(launch + 1.5 * jitter(seed, 2)),
            attack_angle_deg: round1(attack_base + 2.0 * jitter(seed, 3)),
            club_path_deg: round1(3.0 * jitter(seed, 4)),
            updated_at: now,
        }
    }
}

impl Preference for SwingStatsSnapshot {
    const KEY: &'static str = "swingStats";

    fn encode(&self) -> Result<String, SwingError> {
        if !self.is_valid() {
            return Err(SwingError::InvalidStoredValue {
                key: Self::KEY.to_string(),
                reason: "non-finite measurement".to_string(),
            });
        }
        serde_json::to_string(self).map_err(|e| SwingError::StorageSerialize {
            key: Self::KEY.to_string(),
            source: e,
        })
    }

    fn decode(raw: &str) -> Result<Self, SwingError> {
        let snapshot: Self =
            serde_json::from_str(raw).map_err(|e| SwingError::StorageSerialize {
                key: Self::KEY.to_string(),
                source: e,
            })?;
        if !snapshot.is_valid() {
            return Err(SwingError::InvalidStoredValue {
                key: Self::KEY.to_string(),
                reason: "non-finite measurement".to_string(),
            });
        }
        Ok(snapshot)
    }

    fn is_valid(&self) -> bool {
        SwingStatsSnapshot::is_valid(self)
    }
}

/// Parse the analyzer's `updatedAt`. It writes `%Y-%m-%dT%H:%M:%S%z`, which is
/// not quite RFC 3339, so both are accepted.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|t| t.and_utc())
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

// deterministic value in [-1, 1) derived from seed and salt
fn jitter(seed: u64, salt: u64) -> f64 {
    let mixed = (seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    let unit = (mixed >> 11) as f64 / (1u64 << 53) as f64;
    unit * 2.0 - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::storage::MemoryStorage;
    use crate::preferences::store::PreferenceStore;
    use chrono::TimeZone;

    fn snapshot() -> SwingStatsSnapshot {
        SwingStatsSnapshot {
            club_speed_kph: 131.4,
            launch_angle_deg: 14.2,
            attack_angle_deg: -2.1,
            club_path_deg: 0.8,
            updated_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_encoded_field_names_match_analyzer() {
        let json: serde_json::Value =
            serde_json::from_str(&snapshot().encode().unwrap()).unwrap();
        assert_eq!(json["clubSpeed_kph"], 131.4);
        assert_eq!(json["clubPath_deg"], 0.8);
        assert_eq!(json["updatedAt"], "2025-03-01T09:30:00Z");
    }

    #[test]
    fn test_decode_rejects_partial_snapshot() {
        let raw = r#"{"clubSpeed_kph":120.0,"launchAngle_deg":12.0,"updatedAt":"2025-03-01T09:30:00Z"}"#;
        assert!(SwingStatsSnapshot::decode(raw).is_err());
    }

    #[test]
    fn test_non_finite_snapshot_never_persisted() {
        let bad = SwingStatsSnapshot {
            club_speed_kph: f64::NAN,
            ..snapshot()
        };
        assert!(matches!(
            bad.encode(),
            Err(SwingError::InvalidStoredValue { .. })
        ));

        let storage = MemoryStorage::new();
        let store = PreferenceStore::<SwingStatsSnapshot>::new(storage.clone());
        store.write(snapshot());
        store.write(bad);
        store.flush();

        assert_eq!(store.read(), Some(snapshot()));
        let stored = storage.peek(SwingStatsSnapshot::KEY).unwrap();
        assert!(!stored.contains("null"));
        assert_eq!(SwingStatsSnapshot::decode(&stored).unwrap(), snapshot());
    }

    #[test]
    fn test_from_record_requires_all_fields() {
        let mut record = SwingRecord {
            club_speed_kph: Some(120.0),
            launch_angle_deg: Some(12.0),
            attack_angle_deg: Some(-1.0),
            ..SwingRecord::default()
        };
        let now = Utc::now();
        assert!(SwingStatsSnapshot::from_record(&record, now).is_none());

        record.club_path_deg = Some(2.0);
        let snap = SwingStatsSnapshot::from_record(&record, now).unwrap();
        assert_eq!(snap.club_speed_kph, 120.0);
        assert_eq!(snap.updated_at, now);
    }

    #[test]
    fn test_mock_is_plausible_for_club() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let driver = SwingStatsSnapshot::mock_at(Some(Club::Driver), now);
        assert!(driver.is_valid());
        assert!(driver.club_speed_kph >= 142.0 && driver.club_speed_kph <= 158.0);
        assert!(driver.attack_angle_deg > -1.0);
        assert!(driver.club_path_deg.abs() <= 3.0);
        assert_eq!(driver.updated_at, now);

        let wedge = SwingStatsSnapshot::mock_at(Some(Club::SandWedge), now);
        assert!(wedge.club_speed_kph < driver.club_speed_kph);
        assert!(wedge.attack_angle_deg < 0.0);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2025-03-01T09:30:00+0100"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01T09:30:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01T08:30:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
