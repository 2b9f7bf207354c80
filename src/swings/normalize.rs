// Best-effort mapping of raw analyzer records onto SwingRecord.
//
// Each canonical field has an ordered candidate table. The first candidate path
// holding a defined, non-null value decides the field; its value is coerced to a
// finite number and converted to the canonical unit. A value that does not
// coerce leaves the field absent, later candidates are not consulted.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use serde_json::{Map, Value};
use uom::si::f64::{Time, Velocity};
use uom::si::time::{millisecond, second};
use uom::si::velocity::{kilometer_per_hour, meter_per_second};

use super::record::{SwingRecord, SwingTimestamps};

// km/h per mph
const KPH_PER_MPH: f64 = 1.60934;

/// Unit a candidate's value is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    KilometersPerHour,
    MetersPerSecond,
    MilesPerHour,
    Degrees,
    Seconds,
    Milliseconds,
    RevolutionsPerMinute,
    Hertz,
    /// Dimensionless: ratios, counts, indices
    Scalar,
}

impl Unit {
    /// Convert a value in this unit to the canonical unit of its quantity
    /// (km/h for speed, seconds for time, unchanged otherwise).
    pub fn to_canonical(self, value: f64) -> f64 {
        match self {
            Unit::MetersPerSecond => {
                Velocity::new::<meter_per_second>(value).get::<kilometer_per_hour>()
            }
            Unit::MilesPerHour => value * KPH_PER_MPH,
            Unit::Milliseconds => Time::new::<millisecond>(value).get::<second>(),
            Unit::KilometersPerHour
            | Unit::Degrees
            | Unit::Seconds
            | Unit::RevolutionsPerMinute
            | Unit::Hertz
            | Unit::Scalar => value,
        }
    }
}

/// One place a field may be found in a raw record.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub path: &'static [&'static str],
    pub unit: Unit,
}

impl Candidate {
    pub const fn new(path: &'static [&'static str], unit: Unit) -> Self {
        Self { path, unit }
    }
}

use Unit::*;

pub const CLUB_SPEED: &[Candidate] = &[
    Candidate::new(&["clubSpeed_kph"], KilometersPerHour),
    Candidate::new(&["club_speed_kph"], KilometersPerHour),
    Candidate::new(&["metrics", "clubSpeed_kph"], KilometersPerHour),
    Candidate::new(&["speed_kph"], KilometersPerHour),
    Candidate::new(&["clubSpeed_mps"], MetersPerSecond),
    Candidate::new(&["club_speed_mps"], MetersPerSecond),
    Candidate::new(&["metrics", "clubSpeed_mps"], MetersPerSecond),
    Candidate::new(&["speed_mps"], MetersPerSecond),
    Candidate::new(&["clubSpeed_mph"], MilesPerHour),
    Candidate::new(&["club_speed_mph"], MilesPerHour),
    Candidate::new(&["metrics", "clubSpeed_mph"], MilesPerHour),
    Candidate::new(&["speed_mph"], MilesPerHour),
];

pub const LAUNCH_ANGLE: &[Candidate] = &[
    Candidate::new(&["launchAngle_deg"], Degrees),
    Candidate::new(&["launch_angle_deg"], Degrees),
    Candidate::new(&["metrics", "launchAngle_deg"], Degrees),
    Candidate::new(&["launchAngle"], Degrees),
];

pub const ATTACK_ANGLE: &[Candidate] = &[
    Candidate::new(&["attackAngle_deg"], Degrees),
    Candidate::new(&["attack_angle_deg"], Degrees),
    Candidate::new(&["metrics", "attackAngle_deg"], Degrees),
    Candidate::new(&["attackAngle"], Degrees),
];

pub const CLUB_PATH: &[Candidate] = &[
    Candidate::new(&["clubPath_deg"], Degrees),
    Candidate::new(&["club_path_deg"], Degrees),
    Candidate::new(&["metrics", "clubPath_deg"], Degrees),
    Candidate::new(&["clubPath"], Degrees),
];

pub const SPIN_RATE: &[Candidate] = &[
    Candidate::new(&["spinRate_rpm"], RevolutionsPerMinute),
    Candidate::new(&["spin_rate_rpm"], RevolutionsPerMinute),
    Candidate::new(&["metrics", "spinRate_rpm"], RevolutionsPerMinute),
];

pub const BACKSWING: &[Candidate] = &[
    Candidate::new(&["backswing_s"], Seconds),
    Candidate::new(&["tempo", "backswing_s"], Seconds),
    Candidate::new(&["backswingDuration"], Seconds),
    Candidate::new(&["backswing_ms"], Milliseconds),
];

pub const DOWNSWING: &[Candidate] = &[
    Candidate::new(&["downswing_s"], Seconds),
    Candidate::new(&["tempo", "downswing_s"], Seconds),
    Candidate::new(&["downswingDuration"], Seconds),
    Candidate::new(&["downswing_ms"], Milliseconds),
];

pub const TEMPO_RATIO: &[Candidate] = &[
    Candidate::new(&["ratio"], Scalar),
    Candidate::new(&["tempo", "ratio"], Scalar),
    Candidate::new(&["tempoRatio"], Scalar),
    Candidate::new(&["tempo_ratio"], Scalar),
];

pub const START_TIME: &[Candidate] = &[
    Candidate::new(&["timestamps", "start"], Seconds),
    Candidate::new(&["start_s"], Seconds),
];

pub const TOP_TIME: &[Candidate] = &[
    Candidate::new(&["timestamps", "top"], Seconds),
    Candidate::new(&["top_s"], Seconds),
];

pub const IMPACT_TIME: &[Candidate] = &[
    Candidate::new(&["timestamps", "impact"], Seconds),
    Candidate::new(&["impact_s"], Seconds),
];

pub const SAMPLING_RATE: &[Candidate] = &[
    Candidate::new(&["sampling_hz"], Hertz),
    Candidate::new(&["metadata", "sampling_hz"], Hertz),
];

pub const NUM_SAMPLES: &[Candidate] = &[
    Candidate::new(&["metadata", "num_samples"], Scalar),
    Candidate::new(&["num_samples"], Scalar),
    Candidate::new(&["samples_count"], Scalar),
];

pub const IMPACT_INDEX: &[Candidate] = &[
    Candidate::new(&["impactIndex"], Scalar),
    Candidate::new(&["impact_index"], Scalar),
];

pub const INDEX: &[Candidate] = &[
    Candidate::new(&["index"], Scalar),
    Candidate::new(&["swing_index"], Scalar),
];

const ALL_TABLES: &[&[Candidate]] = &[
    CLUB_SPEED,
    LAUNCH_ANGLE,
    ATTACK_ANGLE,
    CLUB_PATH,
    SPIN_RATE,
    BACKSWING,
    DOWNSWING,
    TEMPO_RATIO,
    START_TIME,
    TOP_TIME,
    IMPACT_TIME,
    SAMPLING_RATE,
    NUM_SAMPLES,
    IMPACT_INDEX,
    INDEX,
];

static NUMBER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-+]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?").expect("valid number pattern")
});

// keys some candidate reads whole
static LEAF_KEYS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    candidate_paths()
        .filter(|path| path.len() == 1)
        .map(|path| path[0])
        .collect()
});

// object keys some candidate reads into, with the inner keys it reads
static NESTED_KEYS: LazyLock<HashMap<&'static str, HashSet<&'static str>>> =
    LazyLock::new(|| {
        let mut nested: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();
        for path in candidate_paths().filter(|path| path.len() == 2) {
            nested.entry(path[0]).or_default().insert(path[1]);
        }
        nested
    });

fn candidate_paths() -> impl Iterator<Item = &'static [&'static str]> {
    ALL_TABLES
        .iter()
        .flat_map(|table| table.iter())
        .map(|c| c.path)
}

/// Walk `path` into `raw`. JSON null counts as missing.
pub fn lookup<'a>(raw: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(raw, |node, key| node.get(*key))
        .filter(|v| !v.is_null())
}

/// Coerce a JSON value to a finite number.
///
/// Numbers pass through. Strings yield their first numeric token, so
/// `"12.3 kph"` and `"4.5°"` become 12.3 and 4.5. Anything else, and anything
/// that is not finite, is `None`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => NUMBER_TOKEN.find(s)?.as_str().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// First defined candidate, coerced and converted to the canonical unit.
pub fn probe(raw: &Value, candidates: &[Candidate]) -> Option<f64> {
    let (candidate, value) = candidates
        .iter()
        .find_map(|c| lookup(raw, c.path).map(|v| (c, v)))?;

    let Some(n) = coerce_number(value) else {
        debug!("Field {:?} holds non-numeric {}", candidate.path, value);
        return None;
    };
    let converted = candidate.unit.to_canonical(n);
    converted.is_finite().then_some(converted)
}

/// Like [`probe`] but for counts and indices: a non-negative whole number.
pub fn probe_count(raw: &Value, candidates: &[Candidate]) -> Option<u64> {
    probe(raw, candidates)
        .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= u64::MAX as f64)
        .map(|n| n as u64)
}

/// Normalize one raw record found at `position` in its source list.
pub fn normalize_record(raw: &Value, position: usize) -> SwingRecord {
    let backswing_s = probe(raw, BACKSWING);
    let downswing_s = probe(raw, DOWNSWING);
    let ratio = probe(raw, TEMPO_RATIO).or_else(|| derive_ratio(backswing_s, downswing_s));

    SwingRecord {
        index: probe_count(raw, INDEX).unwrap_or(position as u64),
        num_samples: probe_count(raw, NUM_SAMPLES),
        club_speed_kph: probe(raw, CLUB_SPEED),
        launch_angle_deg: probe(raw, LAUNCH_ANGLE),
        attack_angle_deg: probe(raw, ATTACK_ANGLE),
        club_path_deg: probe(raw, CLUB_PATH),
        spin_rate_rpm: probe(raw, SPIN_RATE),
        impact_index: probe_count(raw, IMPACT_INDEX),
        backswing_s,
        downswing_s,
        ratio,
        timestamps: SwingTimestamps {
            start: probe(raw, START_TIME),
            top: probe(raw, TOP_TIME),
            impact: probe(raw, IMPACT_TIME),
        },
        sampling_hz: probe(raw, SAMPLING_RATE),
        extra: unmapped_fields(raw),
    }
}

/// Normalize every record independently, keeping source order.
pub fn normalize_records(raw: &[Value]) -> Vec<SwingRecord> {
    raw.iter()
        .enumerate()
        .map(|(position, r)| normalize_record(r, position))
        .collect()
}

fn derive_ratio(backswing_s: Option<f64>, downswing_s: Option<f64>) -> Option<f64> {
    match (backswing_s, downswing_s) {
        (Some(b), Some(d)) if d > 0.0 => Some(b / d).filter(|r| r.is_finite()),
        _ => None,
    }
}

// Unread fields of `raw`. Unread keys inside a nested object some candidate
// reads into are kept under `outer.inner`.
fn unmapped_fields(raw: &Value) -> Map<String, Value> {
    let mut extra = Map::new();
    let Some(obj) = raw.as_object() else {
        return extra;
    };

    for (key, value) in obj {
        if LEAF_KEYS.contains(key.as_str()) {
            continue;
        }
        match (NESTED_KEYS.get(key.as_str()), value.as_object()) {
            (Some(read), Some(inner)) => {
                for (inner_key, inner_value) in inner {
                    if !read.contains(inner_key.as_str()) {
                        extra.insert(format!("{key}.{inner_key}"), inner_value.clone());
                    }
                }
            }
            _ => {
                extra.insert(key.clone(), value.clone());
            }
        }
    }
    extra
}
