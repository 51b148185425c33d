//! Cache configuration.
//!
//! A [`CacheConfig`] is supplied once, when the cache is built, and stays
//! fixed for the life of the process. It can be assembled in code, read
//! from a JSON file, or taken from the environment:
//!
//! ```json
//! {
//!   "rules": [
//!     { "prefix": "events", "ttl_ms": 120000, "stale_while_revalidate": true },
//!     { "prefix": "tags", "ttl_ms": 300000 }
//!   ],
//!   "default_policy": { "ttl_ms": 30000, "stale_while_revalidate": false },
//!   "sweep_interval_ms": 60000
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    APPLICATION_POLICIES, DEFAULT_SWEEP_INTERVAL_MS, ENV_CONFIG_PATH, ENV_SWEEP_INTERVAL_MS,
};
use crate::error::{CacheError, Result};
use crate::types::{duration_ms, CachePolicy, PolicyRule};

/// Configuration of the response cache.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Prefix rules, checked in order
    pub rules: Vec<PolicyRule>,
    /// Policy for keys no rule matches
    pub default_policy: CachePolicy,
    /// Time between two expiry sweeps
    #[serde(rename = "sweep_interval_ms", with = "duration_ms")]
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            default_policy: CachePolicy::default(),
            sweep_interval: Duration::from_millis(DEFAULT_SWEEP_INTERVAL_MS),
        }
    }
}

impl CacheConfig {
    /// Creates an empty configuration: every key gets the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration used by the eventide data-access layer.
    pub fn application() -> Self {
        APPLICATION_POLICIES
            .iter()
            .fold(Self::default(), |config, &(prefix, ttl_ms, swr)| {
                config.with_rule(prefix, Duration::from_millis(ttl_ms), swr)
            })
    }

    /// Appends a prefix rule. Rules added earlier take precedence.
    pub fn with_rule(
        mut self,
        prefix: impl Into<String>,
        ttl: Duration,
        stale_while_revalidate: bool,
    ) -> Self {
        self.rules
            .push(PolicyRule::new(prefix, CachePolicy::new(ttl, stale_while_revalidate)));
        self
    }

    /// Replaces the fallback policy.
    pub fn with_default_policy(mut self, policy: CachePolicy) -> Self {
        self.default_policy = policy;
        self
    }

    /// Sets the sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Parses a configuration from JSON and validates it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Loads configuration from the environment.
    ///
    /// Reads `.env` if present. `EVENTIDE_CACHE_CONFIG` names a JSON file;
    /// without it the application table is used. `EVENTIDE_CACHE_SWEEP_MS`
    /// overrides the sweep interval either way.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let base = match std::env::var(ENV_CONFIG_PATH) {
            Ok(path) => Self::from_json_file(path)?,
            Err(_) => Self::application(),
        };

        let config = base.with_sweep_override(std::env::var(ENV_SWEEP_INTERVAL_MS).ok().as_deref())?;
        config.validate()?;
        Ok(config)
    }

    fn with_sweep_override(self, raw: Option<&str>) -> Result<Self> {
        let Some(raw) = raw else {
            return Ok(self);
        };

        let millis: u64 = raw.trim().parse().map_err(|_| CacheError::InvalidEnvValue {
            name: ENV_SWEEP_INTERVAL_MS.into(),
            value: raw.into(),
        })?;

        Ok(self.with_sweep_interval(Duration::from_millis(millis)))
    }

    /// Checks the configuration for values the cache cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.sweep_interval.is_zero() {
            return Err(CacheError::ConfigError(
                "sweep interval must be greater than zero".into(),
            ));
        }

        if self.default_policy.ttl.is_zero() {
            return Err(CacheError::ConfigError(
                "default policy TTL must be greater than zero".into(),
            ));
        }

        for (index, rule) in self.rules.iter().enumerate() {
            if rule.prefix.is_empty() {
                return Err(CacheError::ConfigError(format!(
                    "rule #{index} has an empty prefix"
                )));
            }
            if rule.policy.ttl.is_zero() {
                return Err(CacheError::ConfigError(format!(
                    "rule '{}' has a zero TTL",
                    rule.prefix
                )));
            }
        }

        Ok(())
    }
}
