use std::sync::Arc;

use async_trait::async_trait;

use codetta_rust::services::aggregation;
use codetta_rust::services::model_client::{AnalysisRequest, ModelCaller, ModelError};
use codetta_rust::services::pipeline::{FeedbackPipeline, PipelineError, SubmitRequest};
use codetta_rust::store::ProfileStore;

struct CannedModel {
    grades: Vec<&'static str>,
}

#[async_trait]
impl ModelCaller for CannedModel {
    async fn call_model(&self, request: &AnalysisRequest) -> Result<String, ModelError> {
        // One grade per submission, keyed by how much history has accumulated.
        let grade = self.grades.get(request.recent_history.len()).copied().unwrap_or("0/100");
        Ok(format!(
            r#"```json
{{
    "logic_errors": [
        {{"description": "loops", "affected_lines": [1], "suggestion": "simplify"}}
    ],
    "overall_feedback": "Keep going.",
    "grade_estimate": "{grade}"
}}
```"#
        ))
    }
}

fn submission(student_id: &str, assignment: &str) -> SubmitRequest {
    SubmitRequest {
        student_id: student_id.to_string(),
        code: "for i in range(10):\n    print(i)".to_string(),
        language: "python".to_string(),
        assignment: assignment.to_string(),
    }
}

#[tokio::test]
async fn two_submissions_build_a_consistent_profile() {
    let model = Arc::new(CannedModel { grades: vec!["70/100", "85/100"] });
    let pipeline = FeedbackPipeline::new(ProfileStore::new(), model);

    assert!(pipeline.register_student("S1"));
    assert!(!pipeline.register_student("S1"));

    let first = pipeline.submit(submission("S1", "A1")).await.expect("first submission");
    assert!(first.grade.numeric <= 100);
    assert_eq!(first.grade.numeric, 70);

    let second = pipeline.submit(submission("S1", "A2")).await.expect("second submission");
    assert_eq!(second.grade.numeric, 85);

    let profile = pipeline.store().get("S1").expect("profile");
    assert_eq!(profile.submissions, 2);
    assert_eq!(profile.history.len(), 2);
    assert_eq!(profile.progress.len(), 2);
    assert_eq!(profile.archive.len(), 2);

    assert_eq!(aggregation::latest_grade(&profile), Some(85));
    assert_eq!(aggregation::improvement(&profile), Some(15));

    let frequency = aggregation::issue_frequency(&profile, 5);
    assert_eq!(frequency.len(), 1);
    assert_eq!(frequency[0].issue, "loops");
    assert_eq!(frequency[0].count, 2);
}

#[tokio::test]
async fn class_views_reflect_only_committed_state() {
    let model = Arc::new(CannedModel { grades: vec!["60/100", "90/100"] });
    let pipeline = FeedbackPipeline::new(ProfileStore::new(), model);

    pipeline.register_student("S1");
    pipeline.register_student("idle");
    pipeline.submit(submission("S1", "A1")).await.expect("submission");

    let store = pipeline.store();
    let rows = aggregation::class_activity(store);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].student_id, "S1");
    assert_eq!(rows[0].latest_grade, 60);

    let totals = aggregation::class_totals(store);
    assert_eq!(totals.students, 2);
    assert_eq!(totals.submissions, 1);

    let buckets = aggregation::grade_distribution(&rows, 10);
    assert_eq!(buckets.iter().map(|bucket| bucket.count).sum::<usize>(), 1);
    assert_eq!(buckets[6].count, 1);

    let recent = aggregation::recent_feedback(store, 10);
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].student_id, "S1");
    assert_eq!(recent[0].grade_estimate, "60/100");
}

#[tokio::test]
async fn unregistered_student_is_a_typed_error_not_a_crash() {
    let model = Arc::new(CannedModel { grades: vec!["70/100"] });
    let pipeline = FeedbackPipeline::new(ProfileStore::new(), model);

    let err = pipeline.submit(submission("missing", "A1")).await.expect_err("not registered");
    assert!(matches!(err, PipelineError::UnknownStudent(ref id) if id == "missing"));
    assert!(pipeline.store().list_ids().is_empty());
}
