use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ActivityRow {
    pub student_id: String,
    pub submissions: u64,
    pub latest_grade: u32,
    pub average_grade: f64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ClassTotals {
    pub students: usize,
    pub submissions: u64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct GradeBucket {
    pub lower: u32,
    pub upper: u32,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IssueCount {
    pub issue: String,
    pub count: usize,
}

/// One row of the global feedback log, kept for the class-wide recent view.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackEvent {
    pub student_id: String,
    pub assignment: String,
    pub timestamp: String,
    pub grade_estimate: String,
}
