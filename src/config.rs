//! Client configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use crate::constants::{DEFAULT_BASE_URL, DEFAULT_MODEL_ID, MIN_POLL_INTERVAL};
use crate::error::ClientError;
use std::env;
use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote API configuration
    pub api: ApiConfig,
    /// Polling cadence used by the workflow helpers
    pub polling: PollingConfig,
    /// Prediction defaults
    pub prediction: PredictionConfig,
}

/// Remote API configuration
#[derive(Clone)]
pub struct ApiConfig {
    /// API key sent with every request
    pub api_key: String,
    /// Service base URL, without trailing slash
    pub base_url: String,
    /// Per-request timeout (in seconds)
    pub timeout_secs: u64,
}

// Keep the key out of logs.
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_key", &format!("<{} chars>", self.api_key.len()))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Polling configuration
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Seconds between two polls (never below the service minimum)
    pub interval_secs: u64,
    /// Polls attempted before giving up
    pub max_attempts: u32,
}

/// Prediction configuration
#[derive(Debug, Clone)]
pub struct PredictionConfig {
    /// Retrosynthesis model identifier
    pub model_id: String,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig {
                api_key: env::var("RXN_API_KEY").unwrap_or_default(),
                base_url: env::var("RXN_BASE_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
                timeout_secs: env::var("RXN_TIMEOUT_SECS")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(30),
            },
            polling: PollingConfig {
                interval_secs: env::var("RXN_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(15),
                max_attempts: env::var("RXN_POLL_MAX_ATTEMPTS")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(40),
            },
            prediction: PredictionConfig {
                model_id: env::var("RXN_MODEL_ID").unwrap_or_else(|_| DEFAULT_MODEL_ID.to_string()),
            },
        }
    }

    /// Build a configuration for a given key and base URL, other fields default
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            api: ApiConfig {
                api_key: api_key.into(),
                base_url: base_url.trim_end_matches('/').to_string(),
                timeout_secs: 30,
            },
            polling: PollingConfig {
                interval_secs: 15,
                max_attempts: 40,
            },
            prediction: PredictionConfig {
                model_id: DEFAULT_MODEL_ID.to_string(),
            },
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// * `ClientError::Authentication` if the API key is empty
    /// * `ClientError::InvalidInput` if any other field is empty or zero
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.api.api_key.trim().is_empty() {
            return Err(ClientError::Authentication(
                "API key is empty (set RXN_API_KEY)".to_string(),
            ));
        }
        if self.api.base_url.is_empty() {
            return Err(ClientError::InvalidInput(
                "base_url cannot be empty".to_string(),
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(ClientError::InvalidInput(
                "timeout_secs must be > 0".to_string(),
            ));
        }
        if self.polling.max_attempts == 0 {
            return Err(ClientError::InvalidInput(
                "max_attempts must be > 0".to_string(),
            ));
        }
        if self.prediction.model_id.is_empty() {
            return Err(ClientError::InvalidInput(
                "model_id cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Poll interval, clamped to the service minimum
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.polling.interval_secs).max(MIN_POLL_INTERVAL)
    }
}
