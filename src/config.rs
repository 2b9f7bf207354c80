use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::SwingError;

const CONFIG_FILE_NAME: &str = "config.json";
const ENV_PREFIX: &str = "SWINGVIEW_";

pub const DEFAULT_ANALYZER_URL: &str = "http://127.0.0.1:5001";
pub const DEFAULT_TEMPO_AXIS: &str = "gyro_mag";
pub const DEFAULT_START_DEG_S: f64 = 25.0;
pub const DEFAULT_IMPACT_G: f64 = 3.0;

/// Where swing data comes from and how the tempo endpoint is queried.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FetcherConfig {
    /// Base URL of the swing analyzer, without a trailing path
    pub analyzer_url: String,
    /// Try the simulated data URL before the analyzer
    pub use_simulated: bool,
    pub simulated_url: Option<String>,
    /// Sensor axis the analyzer uses for tempo detection
    pub tempo_axis: String,
    /// Let the analyzer fall back to its secondary detection heuristic
    pub tempo_fallback: bool,
    /// Rotation rate (deg/s) marking the start of a swing
    pub start_deg_s: f64,
    /// Acceleration (g) marking impact
    pub impact_g: f64,
    pub request_timeout_s: Option<u64>,
    pub use_system_proxy: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            analyzer_url: DEFAULT_ANALYZER_URL.to_string(),
            use_simulated: false,
            simulated_url: None,
            tempo_axis: DEFAULT_TEMPO_AXIS.to_string(),
            tempo_fallback: true,
            start_deg_s: DEFAULT_START_DEG_S,
            impact_g: DEFAULT_IMPACT_G,
            request_timeout_s: None,
            use_system_proxy: true,
        }
    }
}

impl FetcherConfig {
    /// File config if there is one, then environment overrides.
    pub fn load() -> Self {
        let mut config = Self::from_local_file().unwrap_or_default();
        config.apply_overrides(|name| std::env::var(name).ok());
        config
    }

    pub fn config_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join("swingview").join(CONFIG_FILE_NAME))
    }

    pub fn from_local_file() -> Option<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            return None;
        }
        match Self::from_file(&config_path) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Ignoring config file {:?}: {}", config_path, e);
                None
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, SwingError> {
        let file =
            std::fs::File::open(path).map_err(|e| SwingError::ConfigIOError { source: e })?;
        serde_json::from_reader(file).map_err(|e| SwingError::ConfigSerializeError { source: e })
    }

    /// Apply `SWINGVIEW_*` overrides. `lookup` maps a variable name to its value.
    /// Values that do not parse are logged and skipped.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| {
            let name = format!("{ENV_PREFIX}{suffix}");
            lookup(&name).map(|value| (name, value.trim().to_string()))
        };

        if let Some((_, v)) = var("ANALYZER_URL") {
            if !v.is_empty() {
                self.analyzer_url = v;
            }
        }
        if let Some((name, v)) = var("USE_SIMULATED") {
            set_parsed(&name, &v, parse_flag, &mut self.use_simulated);
        }
        if let Some((_, v)) = var("SIMULATED_URL") {
            self.simulated_url = (!v.is_empty()).then_some(v);
        }
        if let Some((_, v)) = var("TEMPO_AXIS") {
            if !v.is_empty() {
                self.tempo_axis = v;
            }
        }
        if let Some((name, v)) = var("TEMPO_FALLBACK") {
            set_parsed(&name, &v, parse_flag, &mut self.tempo_fallback);
        }
        if let Some((name, v)) = var("START_DEG_S") {
            set_parsed(&name, &v, parse_finite, &mut self.start_deg_s);
        }
        if let Some((name, v)) = var("IMPACT_G") {
            set_parsed(&name, &v, parse_finite, &mut self.impact_g);
        }
        if let Some((name, v)) = var("REQUEST_TIMEOUT_S") {
            if v.is_empty() {
                self.request_timeout_s = None;
            } else {
                let mut timeout = self.request_timeout_s;
                set_parsed(&name, &v, |s| s.parse::<u64>().ok().map(Some), &mut timeout);
                self.request_timeout_s = timeout;
            }
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_s.map(Duration::from_secs)
    }

    /// The simulated URL, if one is set and not blank.
    pub fn simulated_source(&self) -> Option<&str> {
        self.simulated_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

fn set_parsed<T>(name: &str, raw: &str, parse: impl Fn(&str) -> Option<T>, target: &mut T) {
    match parse(raw) {
        Some(value) => {
            debug!("{} overrides config", name);
            *target = value;
        }
        None => warn!("Ignoring {}={:?}: not a valid value", name, raw),
    }
}

/// `1/0`, `true/false`, `yes/no`, `on/off`, any case.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = FetcherConfig::default();
        assert_eq!(config.analyzer_url, "http://127.0.0.1:5001");
        assert!(!config.use_simulated);
        assert!(config.tempo_fallback);
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = FetcherConfig::default();
        config.apply_overrides(env(&[
            ("SWINGVIEW_ANALYZER_URL", "http://10.0.0.2:5001"),
            ("SWINGVIEW_USE_SIMULATED", "yes"),
            ("SWINGVIEW_SIMULATED_URL", "https://example.org/swings.json"),
            ("SWINGVIEW_TEMPO_AXIS", "gyro_z"),
            ("SWINGVIEW_TEMPO_FALLBACK", "0"),
            ("SWINGVIEW_START_DEG_S", "40.5"),
            ("SWINGVIEW_IMPACT_G", "2"),
            ("SWINGVIEW_REQUEST_TIMEOUT_S", "15"),
        ]));

        assert_eq!(config.analyzer_url, "http://10.0.0.2:5001");
        assert!(config.use_simulated);
        assert_eq!(config.simulated_source(), Some("https://example.org/swings.json"));
        assert_eq!(config.tempo_axis, "gyro_z");
        assert!(!config.tempo_fallback);
        assert_eq!(config.start_deg_s, 40.5);
        assert_eq!(config.impact_g, 2.0);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_invalid_env_values_ignored() {
        let mut config = FetcherConfig::default();
        config.apply_overrides(env(&[
            ("SWINGVIEW_USE_SIMULATED", "maybe"),
            ("SWINGVIEW_START_DEG_S", "NaN"),
            ("SWINGVIEW_REQUEST_TIMEOUT_S", "soon"),
        ]));
        assert_eq!(config, FetcherConfig::default());
    }

    #[test]
    fn test_blank_simulated_url_unsets() {
        let mut config = FetcherConfig {
            simulated_url: Some("http://x/s.json".to_string()),
            ..FetcherConfig::default()
        };
        config.apply_overrides(env(&[("SWINGVIEW_SIMULATED_URL", " ")]));
        assert_eq!(config.simulated_source(), None);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{ "use_simulated": true, "simulated_url": "http://s/x" }"#)
            .unwrap();

        let config = FetcherConfig::from_file(&path).unwrap();
        assert!(config.use_simulated);
        assert_eq!(config.analyzer_url, DEFAULT_ANALYZER_URL);
        assert_eq!(config.impact_g, DEFAULT_IMPACT_G);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{ analyzer_url: ").unwrap();

        assert!(matches!(
            FetcherConfig::from_file(&path),
            Err(SwingError::ConfigSerializeError { .. })
        ));
        assert!(matches!(
            FetcherConfig::from_file(&temp_dir.path().join("missing.json")),
            Err(SwingError::ConfigIOError { .. })
        ));
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("ON"), Some(true));
        assert_eq!(parse_flag("false"), Some(false));
        assert_eq!(parse_flag(""), None);
    }
}
