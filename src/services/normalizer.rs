use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::schemas::feedback::{
    FeedbackRecord, GradeEstimate, LineIssue, Misunderstanding, SpanIssue, SuggestedResource,
};

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("model response is not valid JSON: {reason}")]
    Malformed { reason: String, raw: String },
    #[error("model response is missing required field `{field}`")]
    MissingField { field: &'static str, raw: String },
}

impl NormalizeError {
    /// The offending response text, kept for diagnostic display.
    pub fn raw_text(&self) -> &str {
        match self {
            NormalizeError::Malformed { raw, .. } => raw,
            NormalizeError::MissingField { raw, .. } => raw,
        }
    }
}

/// Wire schema as the model actually sends it: category lists are optional
/// and default to empty, required fields surface as options so their absence
/// can be reported by name.
#[derive(Debug, Deserialize)]
struct RawFeedback {
    #[serde(default)]
    syntax_errors: Vec<LineIssue>,
    #[serde(default)]
    logic_errors: Vec<SpanIssue>,
    #[serde(default)]
    style_issues: Vec<LineIssue>,
    #[serde(default)]
    efficiency_concerns: Vec<SpanIssue>,
    #[serde(default)]
    conceptual_misunderstandings: Vec<Misunderstanding>,
    #[serde(default)]
    positive_aspects: Vec<String>,
    overall_feedback: Option<String>,
    grade_estimate: Option<serde_json::Value>,
    #[serde(default)]
    suggested_resources: Vec<SuggestedResource>,
}

/// Validated feedback before the pipeline attaches its submission context.
#[derive(Debug, Clone)]
pub struct NormalizedFeedback {
    pub syntax_errors: Vec<LineIssue>,
    pub logic_errors: Vec<SpanIssue>,
    pub style_issues: Vec<LineIssue>,
    pub efficiency_concerns: Vec<SpanIssue>,
    pub conceptual_misunderstandings: Vec<Misunderstanding>,
    pub positive_aspects: Vec<String>,
    pub overall_feedback: String,
    pub suggested_resources: Vec<SuggestedResource>,
    pub grade: GradeEstimate,
}

impl NormalizedFeedback {
    pub fn into_record(self, timestamp: String, language: &str, assignment: &str) -> FeedbackRecord {
        FeedbackRecord {
            syntax_errors: self.syntax_errors,
            logic_errors: self.logic_errors,
            style_issues: self.style_issues,
            efficiency_concerns: self.efficiency_concerns,
            conceptual_misunderstandings: self.conceptual_misunderstandings,
            positive_aspects: self.positive_aspects,
            overall_feedback: self.overall_feedback,
            suggested_resources: self.suggested_resources,
            grade: self.grade,
            timestamp,
            language: language.to_string(),
            assignment: assignment.to_string(),
        }
    }
}

/// Parses raw model output into validated feedback. Pure: no side effects, no
/// state. Fence markup is stripped before parsing; absent category lists
/// become empty; `overall_feedback` and `grade_estimate` are required.
pub fn normalize(raw_text: &str) -> Result<NormalizedFeedback, NormalizeError> {
    let cleaned = strip_fences(raw_text);

    let parsed: RawFeedback = serde_json::from_str(&cleaned).map_err(|err| {
        NormalizeError::Malformed { reason: err.to_string(), raw: raw_text.to_string() }
    })?;

    let overall_feedback = parsed.overall_feedback.ok_or_else(|| NormalizeError::MissingField {
        field: "overall_feedback",
        raw: raw_text.to_string(),
    })?;

    let grade_raw = parsed.grade_estimate.map(grade_text).ok_or_else(|| {
        NormalizeError::MissingField { field: "grade_estimate", raw: raw_text.to_string() }
    })?;

    Ok(NormalizedFeedback {
        syntax_errors: parsed.syntax_errors,
        logic_errors: parsed.logic_errors,
        style_issues: parsed.style_issues,
        efficiency_concerns: parsed.efficiency_concerns,
        conceptual_misunderstandings: parsed.conceptual_misunderstandings,
        positive_aspects: parsed.positive_aspects,
        overall_feedback,
        suggested_resources: parsed.suggested_resources,
        grade: extract_grade(&grade_raw),
    })
}

/// Models fence their JSON payloads inconsistently; drop every fence token,
/// not only leading/trailing ones.
fn strip_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

fn grade_text(value: serde_json::Value) -> String {
    match value.as_str() {
        Some(text) => text.to_string(),
        None => value.to_string(),
    }
}

/// Ordered extraction chain, first match wins:
/// digits immediately before a `/`, then the first integer anywhere, then 0
/// with the record tagged underspecified. Derived values clamp to 100.
pub(crate) fn extract_grade(raw: &str) -> GradeEstimate {
    let (slash, integer) = grade_patterns();

    let numeric = slash
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .or_else(|| integer.find(raw))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .map(|value| value.min(100) as u32);

    match numeric {
        Some(value) => GradeEstimate { raw: raw.to_string(), numeric: value, underspecified: false },
        None => GradeEstimate { raw: raw.to_string(), numeric: 0, underspecified: true },
    }
}

fn grade_patterns() -> &'static (Regex, Regex) {
    static PATTERNS: OnceLock<(Regex, Regex)> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let slash = Regex::new(r"(\d+)\s*/").expect("slash grade pattern");
        let integer = Regex::new(r"\d+").expect("integer pattern");
        (slash, integer)
    })
}
