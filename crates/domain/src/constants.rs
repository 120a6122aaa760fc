//! Domain constants
//!
//! Resource paths and payload limits shared by the client surface.

// Resource paths (relative to the configured API base URL)
pub const ANALYZE_ESSAY_PATH: &str = "/analyze-essay";
pub const GENERATE_QUESTIONS_PATH: &str = "/generate-questions";
pub const HEALTH_PATH: &str = "/health";

// Question generation limits
pub const MAX_QUESTION_COUNT: u32 = 50;
