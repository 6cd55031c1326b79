//! crates/workout_tracker_core/src/store.rs
//!
//! The single owned application state: finalized history, routines, and the session
//! currently being logged. Queries borrow; commands validate first and mutate only
//! when they succeed. Persistence lives outside, behind `WorkoutRepository`, fed by
//! `snapshot()`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::aggregator::{self, DashboardSummary};
use crate::domain::{DomainError, ExerciseLog, Routine, WorkoutSession, WorkoutSnapshot};
use crate::logger::ActiveSession;
use crate::routines::{self, RoutineDraft};

#[derive(Debug, Default)]
pub struct WorkoutStore {
    /// Most recent first.
    history: Vec<WorkoutSession>,
    /// Creation order.
    routines: Vec<Routine>,
    active: Option<ActiveSession>,
}

impl WorkoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the store from persisted data. History keeps its saved order, newest
    /// finalized first.
    pub fn from_snapshot(snapshot: WorkoutSnapshot) -> Self {
        Self {
            history: snapshot.history,
            routines: snapshot.routines,
            active: None,
        }
    }

    pub fn snapshot(&self) -> WorkoutSnapshot {
        WorkoutSnapshot {
            history: self.history.clone(),
            routines: self.routines.clone(),
        }
    }

    //=====================================================================================
    // Queries
    //=====================================================================================

    pub fn history(&self) -> &[WorkoutSession] {
        &self.history
    }

    pub fn session(&self, id: Uuid) -> Option<&WorkoutSession> {
        self.history.iter().find(|s| s.id == id)
    }

    pub fn routines(&self) -> &[Routine] {
        &self.routines
    }

    pub fn routine(&self, id: Uuid) -> Option<&Routine> {
        self.routines.iter().find(|r| r.id == id)
    }

    pub fn active(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    pub fn dashboard(&self) -> DashboardSummary {
        aggregator::summarize(&self.history)
    }

    //=====================================================================================
    // Routine Commands
    //=====================================================================================

    pub fn add_routine(&mut self, draft: &RoutineDraft) -> Result<&Routine, DomainError> {
        let routine = draft.build()?;
        self.routines.push(routine);
        Ok(&self.routines[self.routines.len() - 1])
    }

    pub fn delete_routine(&mut self, id: Uuid) -> Result<Routine, DomainError> {
        let index = self
            .routines
            .iter()
            .position(|r| r.id == id)
            .ok_or(DomainError::RoutineNotFound(id))?;
        Ok(self.routines.remove(index))
    }

    /// Adds the preset routines whose names are not taken yet. Returns what was added.
    pub fn load_presets(&mut self) -> Vec<Routine> {
        let added: Vec<Routine> = routines::push_pull_legs()
            .into_iter()
            .filter(|preset| !self.routines.iter().any(|r| r.name == preset.name))
            .collect();
        self.routines.extend(added.iter().cloned());
        added
    }

    /// Seeds the sample routine into an empty routine list.
    pub fn seed_sample_routine(&mut self) -> bool {
        if !self.routines.is_empty() {
            return false;
        }
        self.routines.push(routines::sample_routine());
        true
    }

    //=====================================================================================
    // Session Commands
    //=====================================================================================

    pub fn start_session(
        &mut self,
        name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<&ActiveSession, DomainError> {
        if self.active.is_some() {
            return Err(DomainError::SessionAlreadyActive);
        }
        Ok(&*self.active.insert(ActiveSession::start(name, now)?))
    }

    pub fn start_routine(
        &mut self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<&ActiveSession, DomainError> {
        if self.active.is_some() {
            return Err(DomainError::SessionAlreadyActive);
        }
        let routine = self.routine(id).ok_or(DomainError::RoutineNotFound(id))?;
        let active = ActiveSession::from_routine(routine, now);
        Ok(&*self.active.insert(active))
    }

    pub fn active_mut(&mut self) -> Result<&mut ActiveSession, DomainError> {
        self.active.as_mut().ok_or(DomainError::NoActiveSession)
    }

    /// Drops the session in progress without recording it.
    pub fn discard_session(&mut self) -> Result<ActiveSession, DomainError> {
        self.active.take().ok_or(DomainError::NoActiveSession)
    }

    /// Appends interpreted entries to the session with `session_id`, but only while it is
    /// still the active one. Returns whether anything was merged.
    pub fn merge_into(&mut self, session_id: Uuid, logs: Vec<ExerciseLog>) -> bool {
        match self.active.as_mut() {
            Some(active) if active.session().id == session_id => {
                active.merge(logs);
                true
            }
            _ => false,
        }
    }

    /// Finalizes the active session into history (newest first) and stamps its routine.
    ///
    /// A session without exercises is refused and stays active.
    pub fn finish_session(&mut self, now: DateTime<Utc>) -> Result<&WorkoutSession, DomainError> {
        let active = self.active.as_ref().ok_or(DomainError::NoActiveSession)?;
        let finished = active.finish(now)?;
        self.active = None;

        if let Some(routine_id) = finished.routine_id {
            if let Some(routine) = self.routines.iter_mut().find(|r| r.id == routine_id) {
                routine.last_performed = finished.end_time;
            }
        }

        self.history.insert(0, finished);
        Ok(&self.history[0])
    }
}
