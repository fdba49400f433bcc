//! Client configuration.
//!
//! Defaults match the hosted message API. Every field can be overridden from
//! the environment ([`ClientConfig::from_env`]) or loaded from YAML
//! ([`ClientConfig::from_yaml_str`]), with durations expressed in seconds.

use std::env;
use std::time::Duration;

use serde::Deserialize;

use crate::{Error, Result};

pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

/// Immutable configuration shared by every call a client makes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub endpoint: String,
    pub api_version: String,
    #[serde(with = "secs")]
    pub request_timeout: Duration,
    #[serde(with = "secs")]
    pub stream_timeout: Duration,
    pub max_retries: u32,
    /// Backoff before retry `n` is `backoff_unit * 2^n`.
    #[serde(with = "secs")]
    pub backoff_unit: Duration,
    /// Upper bound on bytes read from a failed streaming response.
    pub error_body_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout: Duration::from_secs(30),
            stream_timeout: Duration::from_secs(300),
            max_retries: 1,
            backoff_unit: Duration::from_secs(1),
            error_body_limit: 64 * 1024,
        }
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

impl ClientConfig {
    /// Defaults overlaid with `COACH_CHAT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        if let Ok(endpoint) = env::var("COACH_CHAT_ENDPOINT") {
            cfg.endpoint = endpoint;
        }
        if let Ok(version) = env::var("COACH_CHAT_API_VERSION") {
            cfg.api_version = version;
        }
        if let Some(t) = env_secs("COACH_CHAT_TIMEOUT_SECS") {
            cfg.request_timeout = t;
        }
        if let Some(t) = env_secs("COACH_CHAT_STREAM_TIMEOUT_SECS") {
            cfg.stream_timeout = t;
        }
        if let Some(n) = env::var("COACH_CHAT_MAX_RETRIES")
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok())
        {
            cfg.max_retries = n;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::DecodingFailed(format!("invalid client config: {}", e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.endpoint)
            .map_err(|e| Error::UnexpectedShape(format!("invalid endpoint: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::UnexpectedShape(format!(
                "unsupported endpoint scheme: {}",
                url.scheme()
            )));
        }
        if self.api_version.trim().is_empty() {
            return Err(Error::UnexpectedShape("api_version must not be empty".into()));
        }
        Ok(())
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(|e| {
            serde::de::Error::custom(format!(
                "duration must be a non-negative number of seconds: {}",
                e
            ))
        })
    }
}
