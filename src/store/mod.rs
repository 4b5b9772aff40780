use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use uuid::Uuid;

use crate::schemas::analytics::FeedbackEvent;
use crate::schemas::feedback::FeedbackRecord;
use crate::schemas::profile::{ArchivedSubmission, HistoryEntry, ProgressEntry, StudentProfile};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("student {0} is not registered")]
    UnknownStudent(String),
    #[error("student {0} not found")]
    NotFound(String),
}

/// In-memory keyed store of student profiles plus the global feedback log.
///
/// Cloning shares the underlying state. A commit runs as a single write-lock
/// critical section, so readers observe either none or all of the triple
/// append (history, progress, archive) and the counter increment.
#[derive(Clone, Default)]
pub struct ProfileStore {
    inner: Arc<RwLock<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
    profiles: HashMap<String, StudentProfile>,
    feedback_log: Vec<FeedbackEvent>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty profile if absent. Idempotent; an existing profile is
    /// never overwritten. Returns whether a profile was created.
    pub fn ensure(&self, student_id: &str) -> bool {
        let mut inner = self.write();
        if inner.profiles.contains_key(student_id) {
            return false;
        }
        inner.profiles.insert(student_id.to_string(), StudentProfile::empty(student_id));
        true
    }

    pub fn contains(&self, student_id: &str) -> bool {
        self.read().profiles.contains_key(student_id)
    }

    /// Appends one submission to a registered profile and the feedback log.
    /// All entries are constructed before the lock is taken; an unknown
    /// student leaves the store untouched.
    pub fn commit(
        &self,
        student_id: &str,
        feedback: FeedbackRecord,
        code: &str,
        language: &str,
        assignment: &str,
    ) -> Result<StudentProfile, StoreError> {
        let history_entry = HistoryEntry {
            timestamp: feedback.timestamp.clone(),
            assignment: assignment.to_string(),
            grade_estimate: feedback.grade.raw.clone(),
            key_issues: feedback.key_issues(),
        };
        let progress_entry = ProgressEntry {
            timestamp: feedback.timestamp.clone(),
            assignment: assignment.to_string(),
            grade: feedback.grade.numeric,
        };
        let event = FeedbackEvent {
            student_id: student_id.to_string(),
            assignment: assignment.to_string(),
            timestamp: feedback.timestamp.clone(),
            grade_estimate: feedback.grade.raw.clone(),
        };
        let archived = ArchivedSubmission {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            language: language.to_string(),
            assignment: assignment.to_string(),
            timestamp: feedback.timestamp.clone(),
            feedback,
        };

        let mut inner = self.write();
        let profile = inner
            .profiles
            .get_mut(student_id)
            .ok_or_else(|| StoreError::UnknownStudent(student_id.to_string()))?;

        profile.submissions += 1;
        profile.history.push(history_entry);
        profile.progress.push(progress_entry);
        profile.archive.push(archived);
        let snapshot = profile.clone();
        inner.feedback_log.push(event);

        Ok(snapshot)
    }

    pub fn get(&self, student_id: &str) -> Result<StudentProfile, StoreError> {
        self.read()
            .profiles
            .get(student_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(student_id.to_string()))
    }

    pub fn list_ids(&self) -> Vec<String> {
        self.read().profiles.keys().cloned().collect()
    }

    pub fn profiles(&self) -> Vec<StudentProfile> {
        self.read().profiles.values().cloned().collect()
    }

    pub fn feedback_events(&self) -> Vec<FeedbackEvent> {
        self.read().feedback_log.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
