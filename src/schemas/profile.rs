use serde::Serialize;

use crate::schemas::feedback::FeedbackRecord;

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub assignment: String,
    pub grade_estimate: String,
    pub key_issues: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressEntry {
    pub timestamp: String,
    pub assignment: String,
    pub grade: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchivedSubmission {
    pub id: String,
    pub code: String,
    pub language: String,
    pub assignment: String,
    pub feedback: FeedbackRecord,
    pub timestamp: String,
}

/// Longitudinal record for one student. `history`, `progress`, and `archive`
/// grow in lockstep: one entry each per committed submission.
#[derive(Debug, Clone, Serialize)]
pub struct StudentProfile {
    pub student_id: String,
    pub submissions: u64,
    pub history: Vec<HistoryEntry>,
    pub progress: Vec<ProgressEntry>,
    pub archive: Vec<ArchivedSubmission>,
}

impl StudentProfile {
    pub(crate) fn empty(student_id: &str) -> Self {
        Self {
            student_id: student_id.to_string(),
            submissions: 0,
            history: Vec::new(),
            progress: Vec::new(),
            archive: Vec::new(),
        }
    }

    /// Last `limit` history entries, oldest first.
    pub fn recent_history(&self, limit: usize) -> &[HistoryEntry] {
        let start = self.history.len().saturating_sub(limit);
        &self.history[start..]
    }
}
