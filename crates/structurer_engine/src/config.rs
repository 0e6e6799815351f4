//! Engine configuration, assembled once at start-up and passed to the
//! [`Coordinator`](crate::Coordinator).

use std::time::Duration;

use scraper::Selector;
use serde::{Deserialize, Serialize};
use structurer_logging::structurer_warn;

use crate::fetch::FetchSettings;

/// Upper bound for every outbound network wait.
pub const MAX_NETWORK_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable overriding the fetch timeout, in seconds.
pub const FETCH_TIMEOUT_ENV: &str = "FETCH_TIMEOUT";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid css selector {selector:?}: {message}")]
    InvalidSelector { selector: String, message: String },
    #[error("invalid value {value:?} for {name}")]
    InvalidEnv { name: String, value: String },
}

/// How the generic content selectors are scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectorScan {
    /// Stop at the first selector with any match and keep its longest match.
    #[default]
    FirstMatching,
    /// Try every selector and keep the longest match overall.
    LongestOverall,
}

/// Character-count floors. Every comparison is strict: content must exceed
/// the floor to be kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub paragraph_min_chars: usize,
    pub specialized_min_chars: usize,
    pub acceptance_min_chars: usize,
    pub library_min_chars: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            paragraph_min_chars: 15,
            specialized_min_chars: 500,
            acceptance_min_chars: 200,
            library_min_chars: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub fetch: FetchSettings,
    #[serde(with = "duration_secs")]
    pub library_timeout: Duration,
    pub thresholds: Thresholds,
    pub specialized_selectors: Vec<String>,
    pub content_selectors: Vec<String>,
    pub noise_tags: Vec<String>,
    pub selector_scan: SelectorScan,
    pub untitled_placeholder: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch: FetchSettings::default(),
            library_timeout: MAX_NETWORK_TIMEOUT,
            thresholds: Thresholds::default(),
            specialized_selectors: to_strings(&[
                ".wprm-recipe-container",
                ".tasty-recipes",
                ".mv-create-card",
            ]),
            content_selectors: to_strings(&[
                "article",
                "main",
                "[role=\"main\"]",
                ".entry-content",
                ".post-content",
                ".article-content",
                ".content",
                "#content",
            ]),
            noise_tags: to_strings(&["script", "style", "nav", "footer", "header", "aside"]),
            selector_scan: SelectorScan::FirstMatching,
            untitled_placeholder: "Untitled".to_string(),
        }
    }
}

impl EngineConfig {
    /// Applies environment overrides through `lookup` (normally
    /// `std::env::var(..).ok()`).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(FETCH_TIMEOUT_ENV) {
            let secs: f64 = raw
                .trim()
                .parse()
                .ok()
                .filter(|secs: &f64| secs.is_finite() && *secs > 0.0)
                .ok_or_else(|| ConfigError::InvalidEnv {
                    name: FETCH_TIMEOUT_ENV.to_string(),
                    value: raw.clone(),
                })?;
            self.fetch.request_timeout = Duration::from_secs_f64(secs);
        }
        Ok(())
    }

    /// Clamps network timeouts to [`MAX_NETWORK_TIMEOUT`] and checks that
    /// every configured selector parses.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        self.fetch.connect_timeout = clamp_timeout("connect_timeout", self.fetch.connect_timeout);
        self.fetch.request_timeout = clamp_timeout("request_timeout", self.fetch.request_timeout);
        self.library_timeout = clamp_timeout("library_timeout", self.library_timeout);

        for raw in self.specialized_selectors.iter().chain(&self.content_selectors) {
            parse_selector(raw)?;
        }
        Ok(self)
    }
}

fn clamp_timeout(name: &str, value: Duration) -> Duration {
    if value > MAX_NETWORK_TIMEOUT {
        structurer_warn!(
            "{} of {:?} exceeds the {:?} limit; clamping",
            name,
            value,
            MAX_NETWORK_TIMEOUT
        );
        MAX_NETWORK_TIMEOUT
    } else {
        value
    }
}

pub(crate) fn parse_selector(raw: &str) -> Result<Selector, ConfigError> {
    Selector::parse(raw).map_err(|err| ConfigError::InvalidSelector {
        selector: raw.to_string(),
        message: err.to_string(),
    })
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Durations as (fractional) seconds, e.g. `request_timeout: 7.5`.
pub(crate) mod duration_secs {
    use std::time::Duration;

    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(de::Error::custom(
                "duration must be a non-negative number of seconds",
            ));
        }
        Ok(Duration::from_secs_f64(secs))
    }
}
