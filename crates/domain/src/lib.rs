//! # Quill Domain
//!
//! Business domain types for the Quill essay platform client.
//!
//! This crate contains:
//! - Request/response payloads for the essay analysis and question
//!   generation endpoints
//! - Domain error types and Result definitions
//! - Domain constants (resource paths, payload limits)
//!
//! ## Architecture
//! - No dependencies on other Quill crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
