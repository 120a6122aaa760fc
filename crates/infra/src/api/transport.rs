//! Transport seam between the request executor and the HTTP stack
//!
//! The executor never talks to reqwest directly: it hands a fully resolved
//! [`TransportRequest`] to a [`Transport`] and classifies whatever comes
//! back. [`crate::http::HttpClient`] is the production implementation.

use std::fmt;

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use serde::Serialize;
use thiserror::Error;
use url::Url;

use super::errors::ApiError;

/// HTTP method of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Caller-supplied request options, resolved against the client's base URL
/// at execution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RequestOptions {
    /// Bodiless GET.
    pub fn get() -> Self {
        Self { method: HttpMethod::Get, headers: Vec::new(), body: None }
    }

    /// POST with a JSON-encoded body and a matching `Content-Type`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] if `body` cannot be serialised.
    pub fn post_json<T: Serialize + ?Sized>(body: &T) -> Result<Self, ApiError> {
        let encoded = serde_json::to_string(body)
            .map_err(|e| ApiError::Validation(format!("Failed to serialize body: {e}")))?;

        Ok(Self {
            method: HttpMethod::Post,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(encoded),
        })
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Check every header is a legal HTTP name/value pair.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] naming the first offending header.
    pub fn validate(&self) -> Result<(), ApiError> {
        for (name, value) in &self.headers {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::Validation(format!("Invalid header name {name:?}: {e}")))?;
            HeaderValue::from_str(value).map_err(|e| {
                ApiError::Validation(format!("Invalid value for header {name:?}: {e}"))
            })?;
        }
        Ok(())
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

/// A single transport attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl TransportRequest {
    pub fn new(url: Url, options: &RequestOptions) -> Self {
        Self {
            method: options.method,
            url,
            headers: options.headers.clone(),
            body: options.body.clone(),
        }
    }
}

/// Status and body of a completed exchange; any status, including errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The exchange could not complete (DNS, connect, reset, read)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("transport timed out: {0}")]
    Timeout(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::Network(err.to_string())
    }
}

/// Issues one HTTP exchange. Implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_json_sets_body_and_content_type() {
        let options = RequestOptions::post_json(&serde_json::json!({ "essayText": "hi" }))
            .expect("serialize body")
            .header("X-Request-Id", "abc");

        assert_eq!(options.method, HttpMethod::Post);
        assert_eq!(options.body.as_deref(), Some(r#"{"essayText":"hi"}"#));
        assert_eq!(
            options.headers,
            vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("X-Request-Id".to_string(), "abc".to_string()),
            ]
        );
    }

    #[test]
    fn test_malformed_headers_fail_validation() {
        assert!(RequestOptions::get().header("X-Trace", "abc").validate().is_ok());

        let bad_name = RequestOptions::get().header("bad header", "x").validate();
        assert!(matches!(bad_name, Err(ApiError::Validation(msg)) if msg.contains("bad header")));

        let bad_value = RequestOptions::get().header("X-Trace", "line\nbreak").validate();
        assert!(matches!(bad_value, Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_get_has_no_body() {
        let options = RequestOptions::get();
        assert_eq!(options.method, HttpMethod::Get);
        assert!(options.body.is_none());
        assert!(options.headers.is_empty());
        assert_eq!(RequestOptions::default(), options);
    }

    #[test]
    fn test_response_success_range() {
        assert!(TransportResponse::new(200, "").is_success());
        assert!(TransportResponse::new(204, "").is_success());
        assert!(!TransportResponse::new(199, "").is_success());
        assert!(!TransportResponse::new(301, "").is_success());
    }

    #[test]
    fn test_transport_errors_map_to_network() {
        let err: ApiError = TransportError::Connect("refused".into()).into();
        assert_eq!(err, ApiError::Network("connection failed: refused".into()));
    }
}
