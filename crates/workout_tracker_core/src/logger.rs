//! crates/workout_tracker_core/src/logger.rs
//!
//! The in-progress workout: a session being logged plus its pause-able timer.
//!
//! Lifecycle: created Active (timer running) → Active/Paused via `toggle_timer` →
//! finalized by `finish`, which refuses sessions without exercises.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    require_name, require_non_negative, DomainError, ExerciseLog, Routine, WeightUnit,
    WorkoutSession, WorkoutSet,
};
use crate::routines;

pub const DEFAULT_SESSION_NAME: &str = "Evening Workout";
pub const DEFAULT_WEIGHT: f64 = 20.0;
pub const DEFAULT_REPS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TimerState {
    Running { since: DateTime<Utc> },
    Paused,
}

/// A session being logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSession {
    session: WorkoutSession,
    timer: TimerState,
    /// Active time banked by earlier running spans.
    banked_ms: i64,
}

impl ActiveSession {
    fn with_session(session: WorkoutSession) -> Self {
        let since = session.start_time;
        Self {
            session,
            timer: TimerState::Running { since },
            banked_ms: 0,
        }
    }

    /// Starts an empty session. A blank name falls back to the default one.
    pub fn start(name: Option<&str>, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let name = match name {
            Some(n) if !n.trim().is_empty() => n,
            _ => DEFAULT_SESSION_NAME,
        };
        Ok(Self::with_session(WorkoutSession::new(name, now)?))
    }

    /// Starts a session pre-filled from a routine template.
    pub fn from_routine(routine: &Routine, now: DateTime<Utc>) -> Self {
        Self::with_session(routines::instantiate(routine, now))
    }

    //-------------------------------------------------------------------------------------
    // Queries
    //-------------------------------------------------------------------------------------

    pub fn session(&self) -> &WorkoutSession {
        &self.session
    }

    pub fn exercises(&self) -> &[ExerciseLog] {
        &self.session.exercises
    }

    pub fn timer(&self) -> TimerState {
        self.timer
    }

    pub fn is_running(&self) -> bool {
        matches!(self.timer, TimerState::Running { .. })
    }

    /// Whole seconds of active (unpaused) time up to `now`.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        let running_ms = match self.timer {
            TimerState::Running { since } => (now - since).num_milliseconds().max(0),
            TimerState::Paused => 0,
        };
        (self.banked_ms + running_ms) / 1000
    }

    //-------------------------------------------------------------------------------------
    // Commands
    //-------------------------------------------------------------------------------------

    /// Pauses a running timer or resumes a paused one. Returns whether it now runs.
    pub fn toggle_timer(&mut self, now: DateTime<Utc>) -> bool {
        self.timer = match self.timer {
            TimerState::Running { since } => {
                self.banked_ms += (now - since).num_milliseconds().max(0);
                TimerState::Paused
            }
            TimerState::Paused => TimerState::Running { since: now },
        };
        self.is_running()
    }

    pub fn rename(&mut self, name: &str) -> Result<(), DomainError> {
        self.session.name = require_name("session name", name)?;
        Ok(())
    }

    /// Adds an exercise with one not-yet-completed set.
    pub fn add_manual_exercise(
        &mut self,
        name: &str,
        weight: f64,
        reps: u32,
        unit: WeightUnit,
    ) -> Result<&ExerciseLog, DomainError> {
        let set = WorkoutSet::new(reps, weight, unit)?;
        let exercise = ExerciseLog::new(name, vec![set])?;
        self.session.exercises.push(exercise);
        Ok(&self.session.exercises[self.session.exercises.len() - 1])
    }

    /// Appends a set that repeats the exercise's last set, or the defaults when it has none.
    pub fn add_set(&mut self, exercise: usize) -> Result<&WorkoutSet, DomainError> {
        let log = self
            .session
            .exercises
            .get_mut(exercise)
            .ok_or(DomainError::ExerciseOutOfRange(exercise))?;
        let (reps, weight, unit) = log
            .sets
            .last()
            .map(|prev| (prev.reps, prev.weight, prev.unit))
            .unwrap_or((DEFAULT_REPS, DEFAULT_WEIGHT, WeightUnit::Kilograms));
        log.sets.push(WorkoutSet::new(reps, weight, unit)?);
        Ok(&log.sets[log.sets.len() - 1])
    }

    fn set_mut(&mut self, exercise: usize, set: usize) -> Result<&mut WorkoutSet, DomainError> {
        self.session
            .exercises
            .get_mut(exercise)
            .ok_or(DomainError::ExerciseOutOfRange(exercise))?
            .sets
            .get_mut(set)
            .ok_or(DomainError::SetOutOfRange { exercise, set })
    }

    /// Edits weight and/or reps of one set. Both values are validated before either is written.
    pub fn update_set(
        &mut self,
        exercise: usize,
        set: usize,
        weight: Option<f64>,
        reps: Option<u32>,
    ) -> Result<&WorkoutSet, DomainError> {
        let weight = weight
            .map(|w| require_non_negative("weight", w))
            .transpose()?;
        let target = self.set_mut(exercise, set)?;
        if let Some(weight) = weight {
            target.weight = weight;
        }
        if let Some(reps) = reps {
            target.reps = reps;
        }
        Ok(&*target)
    }

    /// Flips the completion flag of one set and returns the new value.
    pub fn toggle_set(&mut self, exercise: usize, set: usize) -> Result<bool, DomainError> {
        let target = self.set_mut(exercise, set)?;
        target.completed = !target.completed;
        Ok(target.completed)
    }

    pub fn remove_exercise(&mut self, exercise: usize) -> Result<ExerciseLog, DomainError> {
        if exercise >= self.session.exercises.len() {
            return Err(DomainError::ExerciseOutOfRange(exercise));
        }
        Ok(self.session.exercises.remove(exercise))
    }

    /// Appends interpreted entries in order.
    pub fn merge(&mut self, logs: Vec<ExerciseLog>) {
        self.session.exercises.extend(logs);
    }

    /// Produces the finalized record. The active session itself is left as it was.
    pub fn finish(&self, now: DateTime<Utc>) -> Result<WorkoutSession, DomainError> {
        if self.session.exercises.is_empty() {
            return Err(DomainError::EmptySession);
        }
        let mut finished = self.session.clone();
        finished.end_time = Some(now.max(finished.start_time));
        Ok(finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap()
    }

    #[test]
    fn blank_session_uses_default_name() {
        let active = ActiveSession::start(None, t0()).unwrap();
        assert_eq!(active.session().name, DEFAULT_SESSION_NAME);
        assert!(active.is_running());
        let named = ActiveSession::start(Some("Leg Day"), t0()).unwrap();
        assert_eq!(named.session().name, "Leg Day");
    }

    #[test]
    fn timer_banks_running_time_across_pauses() {
        let mut active = ActiveSession::start(None, t0()).unwrap();
        assert_eq!(active.elapsed_seconds(t0() + Duration::seconds(90)), 90);

        assert!(!active.toggle_timer(t0() + Duration::seconds(100)));
        assert_eq!(active.elapsed_seconds(t0() + Duration::seconds(500)), 100);

        assert!(active.toggle_timer(t0() + Duration::seconds(600)));
        assert_eq!(active.elapsed_seconds(t0() + Duration::seconds(630)), 130);
    }

    #[test]
    fn manual_entry_and_add_set() {
        let mut active = ActiveSession::start(None, t0()).unwrap();
        let log = active
            .add_manual_exercise(" Squat ", 100.0, 5, WeightUnit::Kilograms)
            .unwrap();
        assert_eq!(log.name, "Squat");
        assert!(!log.sets[0].completed);

        let set = active.add_set(0).unwrap();
        assert_eq!((set.reps, set.weight), (5, 100.0));
        assert!(!set.completed);
        assert_eq!(active.exercises()[0].sets.len(), 2);

        assert!(active
            .add_manual_exercise("  ", 20.0, 10, WeightUnit::Kilograms)
            .is_err());
        assert!(active
            .add_manual_exercise("Row", -1.0, 10, WeightUnit::Kilograms)
            .is_err());
        assert_eq!(active.exercises().len(), 1);
    }

    #[test]
    fn add_set_to_empty_exercise_uses_defaults() {
        let mut active = ActiveSession::start(None, t0()).unwrap();
        active.merge(vec![ExerciseLog::new("Dips", vec![]).unwrap()]);
        let set = active.add_set(0).unwrap();
        assert_eq!((set.reps, set.weight), (DEFAULT_REPS, DEFAULT_WEIGHT));
        assert_eq!(
            active.add_set(3).unwrap_err(),
            DomainError::ExerciseOutOfRange(3)
        );
    }

    #[test]
    fn update_set_validates_before_writing() {
        let mut active = ActiveSession::start(None, t0()).unwrap();
        active
            .add_manual_exercise("Press", 40.0, 8, WeightUnit::Kilograms)
            .unwrap();

        assert!(active.update_set(0, 0, Some(-5.0), Some(12)).is_err());
        assert_eq!(active.exercises()[0].sets[0].reps, 8);

        let set = active.update_set(0, 0, Some(42.5), None).unwrap();
        assert_eq!((set.weight, set.reps), (42.5, 8));
        assert_eq!(
            active.update_set(0, 4, None, Some(1)).unwrap_err(),
            DomainError::SetOutOfRange { exercise: 0, set: 4 }
        );
    }

    #[test]
    fn toggle_and_remove() {
        let mut active = ActiveSession::start(None, t0()).unwrap();
        active
            .add_manual_exercise("Curl", 12.0, 12, WeightUnit::Kilograms)
            .unwrap();
        assert!(active.toggle_set(0, 0).unwrap());
        assert!(!active.toggle_set(0, 0).unwrap());
        assert_eq!(active.remove_exercise(0).unwrap().name, "Curl");
        assert!(active.remove_exercise(0).is_err());
    }

    #[test]
    fn finish_requires_exercises_and_orders_timestamps() {
        let mut active = ActiveSession::start(None, t0()).unwrap();
        assert_eq!(
            active.finish(t0() + Duration::minutes(30)),
            Err(DomainError::EmptySession)
        );

        active
            .add_manual_exercise("Squat", 100.0, 5, WeightUnit::Kilograms)
            .unwrap();
        let done = active.finish(t0() + Duration::minutes(30)).unwrap();
        assert_eq!(done.end_time, Some(t0() + Duration::minutes(30)));

        // A clock that went backwards still yields end >= start.
        let skewed = active.finish(t0() - Duration::minutes(1)).unwrap();
        assert_eq!(skewed.end_time, Some(t0()));
    }

    #[test]
    fn rename_rejects_blank() {
        let mut active = ActiveSession::start(None, t0()).unwrap();
        assert!(active.rename("   ").is_err());
        active.rename("Upper").unwrap();
        assert_eq!(active.session().name, "Upper");
    }
}
