use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use validator::Validate;

use crate::core::time::now_rfc3339;
use crate::schemas::feedback::FeedbackRecord;
use crate::services::model_client::{AnalysisRequest, ModelCaller, ModelError};
use crate::services::normalizer::{self, NormalizeError};
use crate::store::{ProfileStore, StoreError};

/// How many prior history entries accompany a submission as model context.
pub const RECENT_HISTORY_LIMIT: usize = 3;

#[derive(Debug, Clone, Validate)]
pub struct SubmitRequest {
    #[validate(length(min = 1, message = "student_id must not be empty"))]
    pub student_id: String,
    #[validate(length(min = 1, message = "code must not be empty"))]
    pub code: String,
    #[validate(length(min = 1, message = "language must not be empty"))]
    pub language: String,
    #[validate(length(min = 1, message = "assignment must not be empty"))]
    pub assignment: String,
}

/// Every failure is a typed value for the presentation layer; nothing here
/// terminates the session, and failures before commit leave the store
/// unchanged.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),
    #[error("student {0} is not registered")]
    UnknownStudent(String),
    #[error("model provider error: {message}")]
    Upstream { status: Option<u16>, message: String },
    #[error("model request timed out after {seconds} seconds")]
    UpstreamTimeout { seconds: u64 },
    #[error(transparent)]
    Malformed(#[from] NormalizeError),
}

impl From<ModelError> for PipelineError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Timeout { seconds } => PipelineError::UpstreamTimeout { seconds },
            ModelError::Provider { status, message } => {
                PipelineError::Upstream { status: Some(status), message }
            }
            other => PipelineError::Upstream { status: None, message: other.to_string() },
        }
    }
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownStudent(id) | StoreError::NotFound(id) => {
                PipelineError::UnknownStudent(id)
            }
        }
    }
}

/// Orchestrates one submission: model call, normalization, atomic commit.
pub struct FeedbackPipeline {
    store: ProfileStore,
    model: Arc<dyn ModelCaller>,
}

impl FeedbackPipeline {
    pub fn new(store: ProfileStore, model: Arc<dyn ModelCaller>) -> Self {
        Self { store, model }
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    /// Registers a student, creating an empty profile on first sight.
    /// Returns whether the id was new.
    pub fn register_student(&self, student_id: &str) -> bool {
        let created = self.store.ensure(student_id);
        if created {
            tracing::info!(student_id, "Student registered");
        }
        created
    }

    pub async fn submit(&self, request: SubmitRequest) -> Result<FeedbackRecord, PipelineError> {
        request.validate().map_err(|err| PipelineError::InvalidSubmission(err.to_string()))?;

        let profile = self
            .store
            .get(&request.student_id)
            .map_err(|_| PipelineError::UnknownStudent(request.student_id.clone()))?;

        let analysis = AnalysisRequest {
            student_id: request.student_id.clone(),
            assignment: request.assignment.clone(),
            language: request.language.clone(),
            code: request.code.clone(),
            recent_history: profile.recent_history(RECENT_HISTORY_LIMIT).to_vec(),
        };

        let timer = Instant::now();
        let raw = match self.model.call_model(&analysis).await {
            Ok(raw) => raw,
            Err(err) => {
                metrics::counter!("feedback_submissions_total", "status" => "upstream_error")
                    .increment(1);
                tracing::error!(student_id = %request.student_id, error = %err, "Model call failed");
                return Err(err.into());
            }
        };

        let normalized = match normalizer::normalize(&raw) {
            Ok(normalized) => normalized,
            Err(err) => {
                metrics::counter!("feedback_submissions_total", "status" => "malformed")
                    .increment(1);
                tracing::error!(
                    student_id = %request.student_id,
                    error = %err,
                    "Model response rejected"
                );
                return Err(err.into());
            }
        };

        let record = normalized.into_record(now_rfc3339(), &request.language, &request.assignment);

        if record.grade.underspecified {
            metrics::counter!("underspecified_grades_total").increment(1);
            tracing::warn!(
                student_id = %request.student_id,
                assignment = %request.assignment,
                grade_text = %record.grade.raw,
                "Grade estimate carried no integer; recording 0"
            );
        }

        let profile = self.store.commit(
            &request.student_id,
            record.clone(),
            &request.code,
            &request.language,
            &request.assignment,
        )?;

        metrics::counter!("feedback_submissions_total", "status" => "success").increment(1);
        metrics::histogram!("analysis_duration_seconds").record(timer.elapsed().as_secs_f64());
        tracing::info!(
            student_id = %request.student_id,
            assignment = %request.assignment,
            grade = record.grade.numeric,
            submissions = profile.submissions,
            "Feedback committed"
        );

        Ok(record)
    }
}
