// HTTP access to the swing analyzer and the simulated data source

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::debug;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use serde::Serialize;
use serde_json::Value;

use crate::errors::SwingError;

/// Wrapper field a source may nest its swing list under.
pub const SWINGS_FIELD: &str = "swings";
/// Query parameter carrying the cache-busting token.
pub const CACHE_BUST_PARAM: &str = "_cb";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceKind {
    Simulated,
    Analyzer,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Simulated => write!(f, "simulated data"),
            SourceKind::Analyzer => write!(f, "analyzer"),
        }
    }
}

/// Thin JSON-over-HTTP client. No response caching happens here.
pub struct AnalyzerClient {
    http: reqwest::Client,
    last_bust_token: AtomicU64,
}

impl AnalyzerClient {
    pub fn new(timeout: Option<Duration>, use_system_proxy: bool) -> Result<Self, SwingError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        if !use_system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder
            .build()
            .map_err(|e| SwingError::ClientBuild { source: e })?;

        Ok(Self {
            http,
            last_bust_token: AtomicU64::new(0),
        })
    }

    /// GET `url` and parse the body as JSON. With `no_store` the request asks
    /// every cache on the way to stay out of it.
    pub async fn get_json(&self, url: &str, no_store: bool) -> Result<Value, SwingError> {
        let mut request = self.http.get(url);
        if no_store {
            request = request
                .header(CACHE_CONTROL, "no-store, no-cache")
                .header(PRAGMA, "no-cache");
        }

        debug!("GET {}", url);
        let response = request.send().await.map_err(|e| SwingError::Transport {
            url: url.to_string(),
            source: e,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SwingError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SwingError::InvalidJson {
                url: url.to_string(),
                source: e,
            })
    }

    /// GET a swing list from `url`.
    pub async fn fetch_records(&self, url: &str, no_store: bool) -> Result<Vec<Value>, SwingError> {
        let body = self.get_json(url, no_store).await?;
        extract_records(url, body)
    }

    /// A token distinct from (and greater than) every previous one from this
    /// client. Milliseconds since the epoch unless calls come faster than that.
    pub fn next_bust_token(&self) -> u64 {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let mut current = self.last_bust_token.load(Ordering::Relaxed);
        loop {
            let next = now.max(current + 1);
            match self.last_bust_token.compare_exchange_weak(
                current,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }
}

/// Pull the swing list out of a response body: either the body itself is an
/// array, or it is an object with an array under [`SWINGS_FIELD`].
pub fn extract_records(url: &str, body: Value) -> Result<Vec<Value>, SwingError> {
    match body {
        Value::Array(records) => Ok(records),
        Value::Object(mut obj) => match obj.remove(SWINGS_FIELD) {
            Some(Value::Array(records)) => Ok(records),
            _ => {
                let reason = match obj.get("error").and_then(Value::as_str) {
                    Some(message) => format!("error object ({message})"),
                    None => format!("object without a '{SWINGS_FIELD}' array"),
                };
                Err(SwingError::UnexpectedShape {
                    url: url.to_string(),
                    reason,
                })
            }
        },
        other => Err(SwingError::UnexpectedShape {
            url: url.to_string(),
            reason: format!("expected array or object, got {}", json_kind(&other)),
        }),
    }
}

/// Append the cache-busting parameter to `url`, keeping any fragment last.
pub fn cache_busted(url: &str, token: u64) -> String {
    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };
    let separator = if !base.contains('?') {
        "?"
    } else if base.ends_with('?') || base.ends_with('&') {
        ""
    } else {
        "&"
    };

    let mut busted = format!("{base}{separator}{CACHE_BUST_PARAM}={token}");
    if let Some(fragment) = fragment {
        busted.push('#');
        busted.push_str(fragment);
    }
    busted
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
