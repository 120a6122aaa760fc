//! # Quill Infrastructure
//!
//! I/O side of the Quill client core.
//!
//! This crate contains:
//! - The resilient API client and request executor
//! - The reqwest-backed HTTP transport
//! - Configuration loading (environment, TOML, JSON)
//! - Tracing subscriber setup
//!
//! ## Architecture
//! - Resilience primitives come from `quill-common`
//! - Payloads and domain errors come from `quill-domain`
//! - Contains all "impure" code (network, filesystem, environment)

pub mod api;
pub mod config;
pub mod http;
pub mod observability;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export commonly used items
pub use api::{
    ApiClient, ApiClientBuilder, ApiError, ApiErrorCategory, ClientConfig, ClientConfigBuilder,
    HttpMethod, RequestExecutor, RequestOptions, Transport, TransportError, TransportRequest,
    TransportResponse,
};
pub use http::{HttpClient, HttpClientBuilder};
