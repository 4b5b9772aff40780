use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::schemas::feedback::{
    FeedbackRecord, GradeEstimate, LineIssue, Misunderstanding, SpanIssue,
};
use crate::services::model_client::{AnalysisRequest, ModelCaller, ModelError};

/// A well-formed model payload with the given grade text, matching the wire
/// contract the prompt asks for.
pub(crate) fn sample_response_json(grade: &str) -> String {
    format!(
        r#"{{
            "syntax_errors": [
                {{"line": 2, "description": "missing colon", "suggestion": "add a colon"}}
            ],
            "logic_errors": [
                {{"description": "off-by-one in loop", "affected_lines": [3, 4], "suggestion": "start from 0"}}
            ],
            "style_issues": [],
            "efficiency_concerns": [],
            "conceptual_misunderstandings": [
                {{"concept": "recursion", "description": "base case is missing", "resources": ["https://example.com/recursion"]}}
            ],
            "positive_aspects": ["clear naming"],
            "overall_feedback": "Solid attempt with a few issues.",
            "suggested_resources": [
                {{"title": "Loops guide", "url": "https://example.com/loops", "reason": "covers the failing pattern"}}
            ],
            "grade_estimate": "{grade}"
        }}"#
    )
}

/// A committed-shape record for store and aggregation tests, bypassing the
/// normalizer. Carries one logic error and one misunderstood concept so
/// key-issue derivation is observable.
pub(crate) fn sample_record(numeric: u32, raw_grade: &str) -> FeedbackRecord {
    FeedbackRecord {
        syntax_errors: vec![LineIssue {
            line: Some(2),
            description: "missing colon".to_string(),
            suggestion: "add a colon".to_string(),
        }],
        logic_errors: vec![SpanIssue {
            description: "off-by-one in loop".to_string(),
            affected_lines: vec![3, 4],
            suggestion: "start from 0".to_string(),
        }],
        style_issues: Vec::new(),
        efficiency_concerns: Vec::new(),
        conceptual_misunderstandings: vec![Misunderstanding {
            concept: "recursion".to_string(),
            description: "base case is missing".to_string(),
            resources: vec!["https://example.com/recursion".to_string()],
        }],
        positive_aspects: vec!["clear naming".to_string()],
        overall_feedback: "Solid attempt with a few issues.".to_string(),
        suggested_resources: Vec::new(),
        grade: GradeEstimate {
            raw: raw_grade.to_string(),
            numeric,
            underspecified: false,
        },
        timestamp: "2025-01-01T00:00:00Z".to_string(),
        language: "python".to_string(),
        assignment: "A1".to_string(),
    }
}

/// Model caller that replays a script of canned outcomes and records every
/// request it receives.
pub(crate) struct ScriptedCaller {
    script: Mutex<VecDeque<Result<String, ModelError>>>,
    fallback: Option<String>,
    requests: Mutex<Vec<AnalysisRequest>>,
}

impl ScriptedCaller {
    pub(crate) fn always(response: String) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(response),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_script(script: Vec<Result<String, ModelError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }

    pub(crate) fn history_lengths(&self) -> Vec<usize> {
        self.requests
            .lock()
            .expect("requests lock")
            .iter()
            .map(|request| request.recent_history.len())
            .collect()
    }
}

#[async_trait]
impl ModelCaller for ScriptedCaller {
    async fn call_model(&self, request: &AnalysisRequest) -> Result<String, ModelError> {
        self.requests.lock().expect("requests lock").push(request.clone());

        match self.script.lock().expect("script lock").pop_front() {
            Some(outcome) => outcome,
            None => match &self.fallback {
                Some(response) => Ok(response.clone()),
                None => Err(ModelError::MissingContent),
            },
        }
    }
}
