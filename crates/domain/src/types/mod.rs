//! Domain types and models
//!
//! Payloads exchanged with the essay platform API. Request types validate
//! their own preconditions so the client can refuse bad input before any
//! network attempt.

pub mod essay;
pub mod questions;

pub use essay::{EssayAnalysis, EssayAnalysisRequest};
pub use questions::{Difficulty, GeneratedQuestion, GeneratedQuestions, QuestionGenerationRequest};

use crate::errors::{QuillError, Result};

/// Reject empty or whitespace-only text fields.
pub(crate) fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(QuillError::Validation(format!("{field} must not be blank")));
    }
    Ok(())
}
