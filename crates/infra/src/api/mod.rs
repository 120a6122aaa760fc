//! Quill API client
//!
//! This module provides the resilient HTTP surface for the Quill essay API.
//!
//! # Architecture
//!
//! - [`ApiClient`]: typed domain methods, input validation, health probe
//! - [`RequestExecutor`]: breaker admission, retry with jittered exponential
//!   backoff, total time budget, request metrics
//! - [`Transport`]: single-exchange seam; [`crate::http::HttpClient`] in
//!   production, a scripted double in tests
//! - [`ApiError`]: caller-facing error taxonomy

pub mod client;
pub mod config;
pub mod errors;
pub mod executor;
pub mod transport;

pub use client::{ApiClient, ApiClientBuilder};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use errors::{ApiError, ApiErrorCategory};
pub use executor::RequestExecutor;
pub use transport::{
    HttpMethod, RequestOptions, Transport, TransportError, TransportRequest, TransportResponse,
};
