use serde::{Deserialize, Serialize};

/// A finding anchored to a single source line (syntax errors, style issues).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineIssue {
    #[serde(default)]
    pub line: Option<u32>,
    pub description: String,
    #[serde(default)]
    pub suggestion: String,
}

/// A finding spanning a set of source lines (logic errors, efficiency concerns).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanIssue {
    pub description: String,
    #[serde(default)]
    pub affected_lines: Vec<u32>,
    #[serde(default)]
    pub suggestion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Misunderstanding {
    pub concept: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedResource {
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub reason: String,
}

/// Grade in both the model's textual form and the derived integer.
///
/// `underspecified` marks records whose text contained no integer at all; the
/// numeric grade defaults to 0 in that case so a defaulted zero is
/// distinguishable from an earned one.
#[derive(Debug, Clone, Serialize)]
pub struct GradeEstimate {
    pub raw: String,
    pub numeric: u32,
    pub underspecified: bool,
}

/// Fully validated analysis of one submission, ready for storage and display.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackRecord {
    pub syntax_errors: Vec<LineIssue>,
    pub logic_errors: Vec<SpanIssue>,
    pub style_issues: Vec<LineIssue>,
    pub efficiency_concerns: Vec<SpanIssue>,
    pub conceptual_misunderstandings: Vec<Misunderstanding>,
    pub positive_aspects: Vec<String>,
    pub overall_feedback: String,
    pub suggested_resources: Vec<SuggestedResource>,
    pub grade: GradeEstimate,
    pub timestamp: String,
    pub language: String,
    pub assignment: String,
}

impl FeedbackRecord {
    /// Logic-error descriptions followed by misunderstood concept names, the
    /// derivation recorded as a history entry's key issues.
    pub fn key_issues(&self) -> Vec<String> {
        let mut issues: Vec<String> =
            self.logic_errors.iter().map(|issue| issue.description.clone()).collect();
        issues.extend(
            self.conceptual_misunderstandings.iter().map(|item| item.concept.clone()),
        );
        issues
    }
}
