//! Question generation payloads

use serde::{Deserialize, Serialize};

use super::require_text;
use crate::constants::MAX_QUESTION_COUNT;
use crate::errors::{QuillError, Result};
use crate::impl_domain_enum_conversions;

/// Requested difficulty of generated questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl_domain_enum_conversions!(Difficulty {
    Easy => "easy",
    Medium => "medium",
    Hard => "hard",
});

/// Body of `POST /generate-questions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionGenerationRequest {
    pub source_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

impl QuestionGenerationRequest {
    pub fn new(source_text: impl Into<String>) -> Self {
        Self { source_text: source_text.into(), count: None, difficulty: None }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    /// Source text must be non-blank; an explicit count must be in
    /// `1..=MAX_QUESTION_COUNT`.
    pub fn validate(&self) -> Result<()> {
        require_text("source text", &self.source_text)?;

        if let Some(count) = self.count {
            if count == 0 || count > MAX_QUESTION_COUNT {
                return Err(QuillError::Validation(format!(
                    "question count must be between 1 and {MAX_QUESTION_COUNT}, got {count}"
                )));
            }
        }

        Ok(())
    }
}

/// A single generated question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    #[serde(default)]
    pub answer: Option<String>,
}

/// Response of the question generation endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuestions {
    #[serde(default)]
    pub questions: Vec<GeneratedQuestion>,
}
