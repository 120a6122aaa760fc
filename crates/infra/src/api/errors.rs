//! API-specific error types
//!
//! Provides error classification for API operations with retry metadata.

use std::time::Duration;

use quill_common::resilience::CircuitState;
use quill_domain::QuillError;
use thiserror::Error;

/// Categories of API errors for caller-side branching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Input rejected before any network attempt
    Validation,
    /// Breaker refused the call without touching the transport
    CircuitOpen,
    /// Connection-level failure - retryable
    Network,
    /// Rate limiting (429) - retryable
    RateLimit,
    /// Server errors (5xx) - retryable
    Server,
    /// Client errors (4xx except 429) - non-retryable
    Client,
    /// Total time budget exhausted
    Timeout,
    /// 2xx body did not match the expected shape
    Decode,
    /// Client construction failed
    Config,
}

/// API operation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Circuit breaker is {state}; request rejected")]
    CircuitOpen { state: CircuitState },

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, retryable: bool, message: String },

    #[error("Request timed out after {elapsed:?} ({attempts} attempts)")]
    Timeout { elapsed: Duration, attempts: u32 },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Build an HTTP error from a non-2xx response.
    ///
    /// 429 and 5xx are marked retryable; every other status is terminal.
    pub fn from_status(status: u16, url: &str, body: &str) -> Self {
        let body = body.trim();
        let message = if body.is_empty() {
            format!("{url} returned status {status}")
        } else {
            format!("{url} returned status {status}: {body}")
        };

        Self::Http { status, retryable: status == 429 || status >= 500, message }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Validation(_) => ApiErrorCategory::Validation,
            Self::CircuitOpen { .. } => ApiErrorCategory::CircuitOpen,
            Self::Network(_) => ApiErrorCategory::Network,
            Self::Http { status: 429, .. } => ApiErrorCategory::RateLimit,
            Self::Http { status, .. } if *status >= 500 => ApiErrorCategory::Server,
            Self::Http { .. } => ApiErrorCategory::Client,
            Self::Timeout { .. } => ApiErrorCategory::Timeout,
            Self::Decode(_) => ApiErrorCategory::Decode,
            Self::Config(_) => ApiErrorCategory::Config,
        }
    }

    /// Whether the failure class is one the executor retries.
    ///
    /// A retryable error returned to the caller means retries were exhausted.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Http { retryable, .. } => *retryable,
            _ => false,
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<QuillError> for ApiError {
    fn from(err: QuillError) -> Self {
        match err {
            QuillError::Validation(message) => Self::Validation(message),
            QuillError::Config(message) => Self::Config(message),
        }
    }
}
