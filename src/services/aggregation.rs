use std::collections::HashMap;

use crate::schemas::analytics::{ActivityRow, ClassTotals, FeedbackEvent, GradeBucket, IssueCount};
use crate::schemas::profile::StudentProfile;
use crate::store::ProfileStore;

pub fn latest_grade(profile: &StudentProfile) -> Option<u32> {
    profile.progress.last().map(|entry| entry.grade)
}

/// Latest minus first progress grade; `None` below two entries, since a
/// single data point has no trend.
pub fn improvement(profile: &StudentProfile) -> Option<i64> {
    if profile.progress.len() < 2 {
        return None;
    }
    let first = profile.progress.first()?.grade;
    let latest = profile.progress.last()?.grade;
    Some(i64::from(latest) - i64::from(first))
}

/// Occurrence counts of key issues across the whole history, most frequent
/// first. The sort is stable, so issues tied on count keep first-seen order.
pub fn issue_frequency(profile: &StudentProfile, top_n: usize) -> Vec<IssueCount> {
    let mut counts: Vec<IssueCount> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for entry in &profile.history {
        for issue in &entry.key_issues {
            match positions.get(issue) {
                Some(&position) => counts[position].count += 1,
                None => {
                    positions.insert(issue.clone(), counts.len());
                    counts.push(IssueCount { issue: issue.clone(), count: 1 });
                }
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(top_n);
    counts
}

/// One row per student with at least one committed grade; empty-progress
/// profiles are excluded rather than zero-filled. Ordered by latest grade
/// descending, then student id.
pub fn class_activity(store: &ProfileStore) -> Vec<ActivityRow> {
    let mut rows: Vec<ActivityRow> = store
        .profiles()
        .into_iter()
        .filter(|profile| !profile.progress.is_empty())
        .map(|profile| {
            let latest = profile.progress.last().map(|entry| entry.grade).unwrap_or(0);
            let sum: u64 = profile.progress.iter().map(|entry| u64::from(entry.grade)).sum();
            let average = sum as f64 / profile.progress.len() as f64;
            ActivityRow {
                student_id: profile.student_id,
                submissions: profile.submissions,
                latest_grade: latest,
                average_grade: round1(average),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.latest_grade.cmp(&a.latest_grade).then_with(|| a.student_id.cmp(&b.student_id))
    });
    rows
}

pub fn class_totals(store: &ProfileStore) -> ClassTotals {
    let profiles = store.profiles();
    let submissions = profiles.iter().map(|profile| profile.submissions).sum();
    ClassTotals { students: profiles.len(), submissions }
}

/// Buckets latest grades into `bucket_count` equal-width bins over [0, 100];
/// a grade of exactly 100 lands in the last bin.
pub fn grade_distribution(rows: &[ActivityRow], bucket_count: usize) -> Vec<GradeBucket> {
    if bucket_count == 0 {
        return Vec::new();
    }

    let width = 100.0 / bucket_count as f64;
    let mut buckets: Vec<GradeBucket> = (0..bucket_count)
        .map(|index| GradeBucket {
            lower: (width * index as f64).round() as u32,
            upper: if index + 1 == bucket_count {
                100
            } else {
                (width * (index + 1) as f64).round() as u32
            },
            count: 0,
        })
        .collect();

    for row in rows {
        let index = ((f64::from(row.latest_grade) / width) as usize).min(bucket_count - 1);
        buckets[index].count += 1;
    }

    buckets
}

/// Global feedback events, newest first, truncated to `limit`. Computed fresh
/// from the log on every call.
pub fn recent_feedback(store: &ProfileStore, limit: usize) -> Vec<FeedbackEvent> {
    let mut events = store.feedback_events();
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    events.truncate(limit);
    events
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
