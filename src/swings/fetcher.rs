// Fallback-chained fetch of the swing list, plus the latest-metrics round trip.

use chrono::Utc;
use log::{debug, error, info, warn};
use reqwest::Url;
use serde_json::Value;
use tokio::sync::watch;

use super::normalize::{normalize_record, normalize_records};
use super::record::SwingRecord;
use super::source::{AnalyzerClient, SourceKind, cache_busted};
use crate::config::FetcherConfig;
use crate::errors::SwingError;
use crate::preferences::SwingStatsSnapshot;
use crate::preferences::stats::parse_timestamp;

const METRICS_PATH: &str = "/all-metrics";
const TEMPO_PATH: &str = "/all-tempo";
const LATEST_PATH: &str = "/metrics";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dataset {
    #[default]
    Metrics,
    Tempo,
}

/// What observers of a fetcher see. `loading` is set before the first request
/// of a cycle goes out and cleared once its records are in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchState {
    pub loading: bool,
    pub records: Vec<SwingRecord>,
    pub source: Option<SourceKind>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    /// Source that produced the list, `None` when every source failed
    pub source: Option<SourceKind>,
    pub records: Vec<SwingRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub kind: SourceKind,
    pub url: String,
}

pub struct SwingFetcher {
    client: AnalyzerClient,
    config: FetcherConfig,
    state: watch::Sender<FetchState>,
}

impl SwingFetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, SwingError> {
        let client = AnalyzerClient::new(config.request_timeout(), config.use_system_proxy)?;
        let (state, _) = watch::channel(FetchState::default());
        Ok(Self {
            client,
            config,
            state,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.state.subscribe()
    }

    /// Current state snapshot.
    pub fn state(&self) -> FetchState {
        self.state.borrow().clone()
    }

    /// Sources to try for `dataset`, in order.
    pub fn plan(&self, dataset: Dataset) -> Vec<Attempt> {
        let simulated = self.config.simulated_source();
        let mut attempts = Vec::with_capacity(3);

        if let (true, Some(url)) = (self.config.use_simulated, simulated) {
            attempts.push(Attempt {
                kind: SourceKind::Simulated,
                url: url.to_string(),
            });
        }

        match self.analyzer_endpoint(dataset) {
            Ok(Some(url)) => attempts.push(Attempt {
                kind: SourceKind::Analyzer,
                url,
            }),
            Ok(None) => debug!("No analyzer URL configured"),
            Err(e) => warn!("Skipping analyzer: {}", e),
        }

        if let Some(url) = simulated {
            attempts.push(Attempt {
                kind: SourceKind::Simulated,
                url: url.to_string(),
            });
        }
        attempts
    }

    /// Analyzer URL serving `dataset`, `None` when no analyzer is configured.
    pub fn analyzer_endpoint(&self, dataset: Dataset) -> Result<Option<String>, SwingError> {
        let base = self.config.analyzer_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Ok(None);
        }

        let path = match dataset {
            Dataset::Metrics => METRICS_PATH,
            Dataset::Tempo => TEMPO_PATH,
        };
        let mut url = parse_url(&format!("{base}{path}"))?;
        if dataset == Dataset::Tempo {
            url.query_pairs_mut()
                .append_pair("axis", &self.config.tempo_axis)
                .append_pair("fallback", if self.config.tempo_fallback { "1" } else { "0" })
                .append_pair("start_deg_s", &self.config.start_deg_s.to_string())
                .append_pair("impact_g", &self.config.impact_g.to_string());
        }
        Ok(Some(url.to_string()))
    }

    /// Run one fetch cycle. Never fails: when no source yields a list the
    /// outcome is empty and the failure only shows up in the log.
    pub async fn fetch_cycle(&self, dataset: Dataset) -> FetchOutcome {
        self.state.send_modify(|state| state.loading = true);

        let mut winner = None;
        for attempt in self.plan(dataset) {
            match self.try_source(&attempt).await {
                Ok(raw) => {
                    debug!("{} returned {} records", attempt.kind, raw.len());
                    winner = Some((attempt.kind, raw));
                    break;
                }
                Err(e) => warn!(
                    "Skipping {} ({}): {}",
                    attempt.kind,
                    failure_category(&e),
                    e
                ),
            }
        }

        let outcome = match winner {
            Some((kind, raw)) => FetchOutcome {
                source: Some(kind),
                records: normalize_records(&raw),
            },
            None => {
                error!("No swing data source available");
                FetchOutcome {
                    source: None,
                    records: Vec::new(),
                }
            }
        };

        self.state.send_modify(|state| {
            state.loading = false;
            state.records = outcome.records.clone();
            state.source = outcome.source;
        });
        outcome
    }

    async fn try_source(&self, attempt: &Attempt) -> Result<Vec<Value>, SwingError> {
        match attempt.kind {
            SourceKind::Simulated => {
                let url = cache_busted(&attempt.url, self.client.next_bust_token());
                self.client.fetch_records(&url, true).await
            }
            SourceKind::Analyzer => self.client.fetch_records(&attempt.url, false).await,
        }
    }

    /// Ask the analyzer for its most recent measurement.
    pub async fn fetch_latest(&self) -> Result<SwingStatsSnapshot, SwingError> {
        let base = self.config.analyzer_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(SwingError::InvalidUserInput {
                field: "analyzer_url".to_string(),
                reason: "no analyzer URL configured".to_string(),
            });
        }
        let url = parse_url(&format!("{base}{LATEST_PATH}"))?.to_string();

        let body = self.client.get_json(&url, false).await?;
        let obj = match &body {
            Value::Object(obj) => obj,
            _ => {
                return Err(SwingError::UnexpectedShape {
                    url,
                    reason: "expected an object".to_string(),
                });
            }
        };
        if let Some(message) = obj.get("error") {
            let message = match message {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(SwingError::AnalyzerReported { message });
        }

        let record = normalize_record(&body, 0);
        let updated_at = obj
            .get("updatedAt")
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .unwrap_or_else(Utc::now);

        let snapshot = SwingStatsSnapshot::from_record(&record, updated_at).ok_or_else(|| {
            SwingError::UnexpectedShape {
                url: url.clone(),
                reason: "missing snapshot fields".to_string(),
            }
        })?;
        info!("Latest swing from analyzer: {:.1} km/h", snapshot.club_speed_kph);
        Ok(snapshot)
    }
}

fn parse_url(raw: &str) -> Result<Url, SwingError> {
    Url::parse(raw).map_err(|e| SwingError::InvalidUserInput {
        field: "analyzer_url".to_string(),
        reason: format!("{raw}: {e}"),
    })
}

fn failure_category(e: &SwingError) -> &'static str {
    match e {
        SwingError::Transport { .. } => "network error",
        SwingError::HttpStatus { .. } => "bad status",
        SwingError::InvalidJson { .. } => "malformed JSON",
        SwingError::UnexpectedShape { .. } => "unexpected shape",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(config: FetcherConfig) -> SwingFetcher {
        SwingFetcher::new(FetcherConfig {
            use_system_proxy: false,
            ..config
        })
        .unwrap()
    }

    fn kinds(plan: &[Attempt]) -> Vec<SourceKind> {
        plan.iter().map(|a| a.kind).collect()
    }

    #[test]
    fn test_plan_simulated_first_when_enabled() {
        let f = fetcher(FetcherConfig {
            use_simulated: true,
            simulated_url: Some("http://sim/swings.json".to_string()),
            ..FetcherConfig::default()
        });
        assert_eq!(
            kinds(&f.plan(Dataset::Metrics)),
            vec![
                SourceKind::Simulated,
                SourceKind::Analyzer,
                SourceKind::Simulated
            ]
        );
    }

    #[test]
    fn test_plan_analyzer_first_when_disabled() {
        let f = fetcher(FetcherConfig {
            simulated_url: Some("http://sim/swings.json".to_string()),
            ..FetcherConfig::default()
        });
        assert_eq!(
            kinds(&f.plan(Dataset::Metrics)),
            vec![SourceKind::Analyzer, SourceKind::Simulated]
        );
    }

    #[test]
    fn test_plan_without_simulated_url() {
        let f = fetcher(FetcherConfig {
            use_simulated: true,
            ..FetcherConfig::default()
        });
        assert_eq!(kinds(&f.plan(Dataset::Tempo)), vec![SourceKind::Analyzer]);
    }

    #[test]
    fn test_metrics_endpoint_trims_slash() {
        let f = fetcher(FetcherConfig {
            analyzer_url: "http://10.0.0.5:5001/".to_string(),
            ..FetcherConfig::default()
        });
        assert_eq!(
            f.analyzer_endpoint(Dataset::Metrics).unwrap().as_deref(),
            Some("http://10.0.0.5:5001/all-metrics")
        );
    }

    #[test]
    fn test_tempo_endpoint_query() {
        let f = fetcher(FetcherConfig {
            tempo_fallback: false,
            start_deg_s: 30.5,
            ..FetcherConfig::default()
        });
        assert_eq!(
            f.analyzer_endpoint(Dataset::Tempo).unwrap().as_deref(),
            Some("http://127.0.0.1:5001/all-tempo?axis=gyro_mag&fallback=0&start_deg_s=30.5&impact_g=3")
        );
    }

    #[test]
    fn test_invalid_analyzer_url_is_skipped() {
        let f = fetcher(FetcherConfig {
            analyzer_url: "not a url".to_string(),
            simulated_url: Some("http://sim/swings.json".to_string()),
            ..FetcherConfig::default()
        });
        assert!(f.analyzer_endpoint(Dataset::Metrics).is_err());
        assert_eq!(kinds(&f.plan(Dataset::Metrics)), vec![SourceKind::Simulated]);
    }

    #[test]
    fn test_initial_state() {
        let f = fetcher(FetcherConfig::default());
        assert_eq!(f.state(), FetchState::default());
    }
}
