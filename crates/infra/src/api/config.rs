//! Client configuration
//!
//! One immutable [`ClientConfig`] per client instance. Defaults are applied at
//! construction (and for any field missing from a config file); durations
//! travel as integer milliseconds on the wire.

use std::time::Duration;

use quill_common::duration_millis;
use quill_common::resilience::CircuitBreakerConfig;
use quill_domain::{QuillError, Result};
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1_000);
pub const DEFAULT_TOTAL_TIMEOUT: Duration = Duration::from_millis(12_000);
pub const DEFAULT_CIRCUIT_BREAKER_THRESHOLD: u32 = 5;
pub const DEFAULT_CIRCUIT_BREAKER_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Configuration for [`crate::api::ApiClient`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL every resource path is appended to
    pub base_url: String,
    /// Retries after the first attempt; 0 means a single attempt
    pub max_retries: u32,
    /// Un-jittered delay before the first retry
    #[serde(rename = "base_delay_ms", with = "duration_millis")]
    pub base_delay: Duration,
    /// Wall-clock ceiling for a whole call, sleeps included
    #[serde(rename = "total_timeout_ms", with = "duration_millis")]
    pub total_timeout: Duration,
    /// Consecutive failed calls that open the breaker
    pub circuit_breaker_threshold: u32,
    /// Cooldown before the breaker admits a half-open probe
    #[serde(rename = "circuit_breaker_timeout_ms", with = "duration_millis")]
    pub circuit_breaker_timeout: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            total_timeout: DEFAULT_TOTAL_TIMEOUT,
            circuit_breaker_threshold: DEFAULT_CIRCUIT_BREAKER_THRESHOLD,
            circuit_breaker_timeout: DEFAULT_CIRCUIT_BREAKER_TIMEOUT,
            user_agent: None,
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns [`QuillError::Config`] for an empty or unparsable base URL and
    /// for any zero delay, timeout or threshold.
    pub fn validate(&self) -> Result<()> {
        self.parsed_base_url()?;

        if self.base_delay.is_zero() {
            return Err(QuillError::Config("base_delay_ms must be greater than 0".into()));
        }
        if self.total_timeout.is_zero() {
            return Err(QuillError::Config("total_timeout_ms must be greater than 0".into()));
        }
        if self.circuit_breaker_threshold == 0 {
            return Err(QuillError::Config(
                "circuit_breaker_threshold must be greater than 0".into(),
            ));
        }
        if self.circuit_breaker_timeout.is_zero() {
            return Err(QuillError::Config(
                "circuit_breaker_timeout_ms must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Base URL parsed and normalised to end with `/`, so resource paths
    /// join underneath it instead of replacing its last segment.
    pub fn parsed_base_url(&self) -> Result<Url> {
        let trimmed = self.base_url.trim();
        if trimmed.is_empty() {
            return Err(QuillError::Config("base_url must not be empty".into()));
        }

        let normalised =
            if trimmed.ends_with('/') { trimmed.to_string() } else { format!("{trimmed}/") };
        let url = Url::parse(&normalised)
            .map_err(|e| QuillError::Config(format!("Invalid base_url {trimmed:?}: {e}")))?;

        if url.cannot_be_a_base() {
            return Err(QuillError::Config(format!("base_url {trimmed:?} cannot be a base URL")));
        }
        Ok(url)
    }

    /// Breaker settings derived from this configuration
    pub fn breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.circuit_breaker_threshold,
            open_timeout: self.circuit_breaker_timeout,
        }
    }
}

/// Builder for [`ClientConfig`]; starts from the defaults.
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.config.base_delay = delay;
        self
    }

    pub fn total_timeout(mut self, timeout: Duration) -> Self {
        self.config.total_timeout = timeout;
        self
    }

    pub fn circuit_breaker_threshold(mut self, threshold: u32) -> Self {
        self.config.circuit_breaker_threshold = threshold;
        self
    }

    pub fn circuit_breaker_timeout(mut self, timeout: Duration) -> Self {
        self.config.circuit_breaker_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(agent.into());
        self
    }

    /// Validate and return the configuration.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::validate`].
    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
