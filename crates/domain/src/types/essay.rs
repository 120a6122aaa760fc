//! Essay analysis payloads

use serde::{Deserialize, Serialize};

use super::require_text;
use crate::errors::Result;

/// Body of `POST /analyze-essay`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EssayAnalysisRequest {
    pub essay_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<String>,
}

impl EssayAnalysisRequest {
    pub fn new(essay_text: impl Into<String>) -> Self {
        Self { essay_text: essay_text.into(), prompt: None, grade_level: None }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_grade_level(mut self, grade_level: impl Into<String>) -> Self {
        self.grade_level = Some(grade_level.into());
        self
    }

    /// The essay text must contain something other than whitespace.
    pub fn validate(&self) -> Result<()> {
        require_text("essay text", &self.essay_text)
    }
}

/// Feedback returned by the analysis endpoint.
///
/// Every field is optional on the wire; missing lists decode as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EssayAnalysis {
    pub overall_score: Option<f64>,
    pub summary: Option<String>,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QuillError;

    #[test]
    fn blank_essay_is_rejected() {
        for text in ["", "   ", "\n\t  \n"] {
            let err = EssayAnalysisRequest::new(text).validate().unwrap_err();
            assert!(matches!(err, QuillError::Validation(_)), "{text:?} should be rejected");
        }
    }

    #[test]
    fn non_blank_essay_passes() {
        assert!(EssayAnalysisRequest::new("  A thesis.  ").validate().is_ok());
    }

    #[test]
    fn request_serializes_camel_case_and_skips_empty_options() {
        let json = serde_json::to_value(EssayAnalysisRequest::new("text").with_grade_level("10"))
            .expect("serialize request");
        assert_eq!(json, serde_json::json!({ "essayText": "text", "gradeLevel": "10" }));
    }

    #[test]
    fn analysis_tolerates_missing_fields() {
        let analysis: EssayAnalysis =
            serde_json::from_str(r#"{"overallScore": 4.5, "strengths": ["clear thesis"]}"#)
                .expect("decode analysis");
        assert_eq!(analysis.overall_score, Some(4.5));
        assert_eq!(analysis.strengths, vec!["clear thesis".to_string()]);
        assert!(analysis.improvements.is_empty());
        assert_eq!(analysis.summary, None);
    }
}
