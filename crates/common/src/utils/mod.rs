//! Common utility helpers
//!
//! - **[`serde`]**: serialization helpers for configuration values

pub mod serde;

pub use self::serde::duration_millis;
