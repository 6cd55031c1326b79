//! crates/workout_tracker_core/src/aggregator.rs
//!
//! Derives the dashboard metrics from the finalized session history.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::WorkoutSession;

/// How many of the most recent sessions feed the volume chart.
pub const VOLUME_WINDOW: usize = 7;
/// How many of the most recent sessions are listed as recent activity.
pub const RECENT_WINDOW: usize = 5;

/// One bar of the volume chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumePoint {
    /// Short weekday of the session start, e.g. "Mon".
    pub label: String,
    pub date: DateTime<Utc>,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub name: String,
    pub date: DateTime<Utc>,
    pub exercise_count: usize,
    pub set_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_sessions: usize,
    /// `None` when there is no history yet.
    pub last_session: Option<DateTime<Utc>>,
    /// Oldest first.
    pub volume_series: Vec<VolumePoint>,
    /// Most recent first.
    pub recent: Vec<SessionSummary>,
}

/// Summarizes a most-recent-first history. Never fails; an empty history yields zeros.
pub fn summarize(history: &[WorkoutSession]) -> DashboardSummary {
    let mut volume_series: Vec<VolumePoint> = history
        .iter()
        .take(VOLUME_WINDOW)
        .map(|session| VolumePoint {
            label: session.start_time.format("%a").to_string(),
            date: session.start_time,
            volume: session.total_volume(),
        })
        .collect();
    volume_series.reverse();

    let recent = history
        .iter()
        .take(RECENT_WINDOW)
        .map(|session| SessionSummary {
            id: session.id,
            name: session.name.clone(),
            date: session.start_time,
            exercise_count: session.exercises.len(),
            set_count: session.set_count(),
        })
        .collect();

    DashboardSummary {
        total_sessions: history.len(),
        last_session: history.first().map(|s| s.start_time),
        volume_series,
        recent,
    }
}
