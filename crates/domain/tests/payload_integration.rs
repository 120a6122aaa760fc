//! Integration tests for API payload types
//!
//! Covers the wire shapes the essay API exchanges and the validation that
//! runs before any request is sent.

use quill_domain::constants::{
    ANALYZE_ESSAY_PATH, GENERATE_QUESTIONS_PATH, HEALTH_PATH, MAX_QUESTION_COUNT,
};
use quill_domain::{
    Difficulty, EssayAnalysis, EssayAnalysisRequest, GeneratedQuestions, QuestionGenerationRequest,
    QuillError,
};

/// A realistic analysis response decodes, and unknown fields are ignored.
#[test]
fn test_essay_analysis_full_response() {
    let json = r#"{
        "overallScore": 82.5,
        "summary": "Clear argument with uneven evidence.",
        "strengths": ["thesis", "transitions"],
        "improvements": ["cite sources"],
        "model": "grader-7"
    }"#;

    let analysis: EssayAnalysis = serde_json::from_str(json).expect("decode analysis");

    assert_eq!(analysis.overall_score, Some(82.5));
    assert_eq!(analysis.strengths.len(), 2);
    assert_eq!(analysis.improvements, vec!["cite sources".to_string()]);
}

#[test]
fn test_empty_analysis_response_uses_defaults() {
    let analysis: EssayAnalysis = serde_json::from_str("{}").expect("decode analysis");
    assert_eq!(analysis, EssayAnalysis::default());
}

/// Whitespace-only payloads fail validation with a message naming the field.
#[test]
fn test_blank_payloads_are_rejected() {
    let essay_err = EssayAnalysisRequest::new(" \t\n").validate().unwrap_err();
    let questions_err = QuestionGenerationRequest::new("").validate().unwrap_err();

    match (essay_err, questions_err) {
        (QuillError::Validation(essay), QuillError::Validation(source)) => {
            assert!(essay.contains("essay text"), "{essay}");
            assert!(source.contains("source text"), "{source}");
        }
        other => panic!("expected validation errors, got {other:?}"),
    }
}

#[test]
fn test_question_request_round_trip_preserves_fields() {
    let request = QuestionGenerationRequest::new("The French Revolution began in 1789.")
        .with_count(MAX_QUESTION_COUNT)
        .with_difficulty(Difficulty::Medium);

    let encoded = serde_json::to_string(&request).expect("encode request");
    let decoded: QuestionGenerationRequest = serde_json::from_str(&encoded).expect("decode request");

    assert_eq!(decoded, request);
    assert!(decoded.validate().is_ok());
}

#[test]
fn test_generated_questions_tolerate_missing_list() {
    let decoded: GeneratedQuestions = serde_json::from_str(r#"{"requestId": "abc"}"#).expect("decode");
    assert!(decoded.questions.is_empty());
}

#[test]
fn test_difficulty_rejects_unknown_value() {
    assert!(matches!("extreme".parse::<Difficulty>(), Err(QuillError::Validation(_))));
    assert!(serde_json::from_str::<Difficulty>(r#""extreme""#).is_err());
}

#[test]
fn test_resource_paths_are_rooted() {
    for path in [ANALYZE_ESSAY_PATH, GENERATE_QUESTIONS_PATH, HEALTH_PATH] {
        assert!(path.starts_with('/'), "{path}");
    }
}
