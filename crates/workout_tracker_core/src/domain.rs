//! crates/workout_tracker_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application together with the
//! validation helpers every mutator goes through.
//! These structs carry serde derives so any storage collaborator can snapshot them,
//! but they know nothing about where that snapshot ends up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Domain Error
//=========================================================================================

/// Rejections raised by domain validation and by the session state machine.
///
/// Every operation that returns one of these leaves the state it was called on untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("{0} must not be empty")]
    EmptyName(&'static str),
    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidNumber { field: &'static str, value: f64 },
    #[error("{field} must be a whole number (got {value})")]
    NotWholeNumber { field: &'static str, value: f64 },
    #[error("{0} must be at least 1")]
    NotPositive(&'static str),
    #[error("A routine needs at least one exercise")]
    EmptyRoutine,
    #[error("Cannot finish a session without exercises")]
    EmptySession,
    #[error("No session is in progress")]
    NoActiveSession,
    #[error("A session is already in progress")]
    SessionAlreadyActive,
    #[error("Exercise index {0} is out of range")]
    ExerciseOutOfRange(usize),
    #[error("Set index {set} is out of range for exercise {exercise}")]
    SetOutOfRange { exercise: usize, set: usize },
    #[error("Routine not found: {0}")]
    RoutineNotFound(Uuid),
}

//=========================================================================================
// Validation Helpers
//=========================================================================================

/// Trim-and-require: returns the trimmed name, rejecting empty or whitespace-only input.
pub fn require_name(field: &'static str, raw: &str) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::EmptyName(field));
    }
    Ok(trimmed.to_string())
}

/// Accepts finite values that are `>= 0`.
pub fn require_non_negative(field: &'static str, value: f64) -> Result<f64, DomainError> {
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::InvalidNumber { field, value });
    }
    Ok(value)
}

/// Converts a JSON-style number into a repetition count.
pub fn require_whole_count(field: &'static str, value: f64) -> Result<u32, DomainError> {
    let value = require_non_negative(field, value)?;
    if value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(DomainError::NotWholeNumber { field, value });
    }
    Ok(value as u32)
}

pub fn require_positive(field: &'static str, value: u32) -> Result<u32, DomainError> {
    if value == 0 {
        return Err(DomainError::NotPositive(field));
    }
    Ok(value)
}

/// Generates a fresh identifier (random 128-bit UUID v4).
pub fn new_id() -> Uuid {
    Uuid::new_v4()
}

//=========================================================================================
// Workout Entities
//=========================================================================================

/// The unit a weight was recorded in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeightUnit {
    #[default]
    #[serde(rename = "kg")]
    Kilograms,
    #[serde(rename = "lbs")]
    Pounds,
}

impl WeightUnit {
    /// Coerces a free-form unit label into a unit. Anything unrecognised is kilograms.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "lb" | "lbs" | "pound" | "pounds" => WeightUnit::Pounds,
            _ => WeightUnit::Kilograms,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WeightUnit::Kilograms => "kg",
            WeightUnit::Pounds => "lbs",
        }
    }
}

impl std::fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One performed effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSet {
    pub id: Uuid,
    pub reps: u32,
    pub weight: f64,
    pub unit: WeightUnit,
    pub completed: bool,
}

impl WorkoutSet {
    /// Creates a set that has not been ticked off yet.
    pub fn new(reps: u32, weight: f64, unit: WeightUnit) -> Result<Self, DomainError> {
        let weight = require_non_negative("weight", weight)?;
        Ok(Self {
            id: new_id(),
            reps,
            weight,
            unit,
            completed: false,
        })
    }

    /// Creates a set describing something already performed.
    pub fn performed(reps: u32, weight: f64, unit: WeightUnit) -> Result<Self, DomainError> {
        let mut set = Self::new(reps, weight, unit)?;
        set.completed = true;
        Ok(set)
    }

    /// weight × reps, regardless of completion.
    pub fn volume(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }
}

/// A named exercise performed within one session. Set order is performance order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseLog {
    pub id: Uuid,
    pub name: String,
    pub sets: Vec<WorkoutSet>,
}

impl ExerciseLog {
    pub fn new(name: &str, sets: Vec<WorkoutSet>) -> Result<Self, DomainError> {
        Ok(Self {
            id: new_id(),
            name: require_name("exercise name", name)?,
            sets,
        })
    }

    pub fn volume(&self) -> f64 {
        self.sets.iter().map(WorkoutSet::volume).sum()
    }
}

/// One workout occurrence, in progress or finalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: Uuid,
    pub name: String,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub exercises: Vec<ExerciseLog>,
    /// The routine this session was instantiated from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routine_id: Option<Uuid>,
}

impl WorkoutSession {
    pub fn new(name: &str, start_time: DateTime<Utc>) -> Result<Self, DomainError> {
        Ok(Self {
            id: new_id(),
            name: require_name("session name", name)?,
            start_time,
            end_time: None,
            exercises: Vec::new(),
            routine_id: None,
        })
    }

    /// Σ weight × reps over every set of every exercise.
    pub fn total_volume(&self) -> f64 {
        self.exercises.iter().map(ExerciseLog::volume).sum()
    }

    pub fn set_count(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }
}

//=========================================================================================
// Routine Templates
//=========================================================================================

/// What the planned value of a routine exercise counts.
///
/// Isometric holds such as planks plan a duration in seconds in the same numeric slot
/// that other exercises use for repetitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannedMeasure {
    #[default]
    Reps,
    Seconds,
}

/// A planned exercise inside a routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineExercise {
    pub id: Uuid,
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    #[serde(default)]
    pub measure: PlannedMeasure,
}

impl RoutineExercise {
    pub fn new(
        name: &str,
        sets: u32,
        reps: u32,
        measure: PlannedMeasure,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id: new_id(),
            name: require_name("exercise name", name)?,
            sets: require_positive("sets", sets)?,
            reps: require_positive("reps", reps)?,
            measure,
        })
    }
}

/// A reusable, named template of planned exercises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_performed: Option<DateTime<Utc>>,
    pub exercises: Vec<RoutineExercise>,
}

//=========================================================================================
// Persistence Snapshot
//=========================================================================================

/// Everything a storage collaborator has to keep: history most-recent-first and
/// routines in creation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSnapshot {
    #[serde(default)]
    pub history: Vec<WorkoutSession>,
    #[serde(default)]
    pub routines: Vec<Routine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed_and_required() {
        assert_eq!(require_name("name", "  Squat ").unwrap(), "Squat");
        assert_eq!(
            require_name("name", " \t "),
            Err(DomainError::EmptyName("name"))
        );
    }

    #[test]
    fn numbers_must_be_finite_and_non_negative() {
        assert!(require_non_negative("weight", 0.0).is_ok());
        assert!(require_non_negative("weight", -0.5).is_err());
        assert!(require_non_negative("weight", f64::NAN).is_err());
        assert!(require_non_negative("weight", f64::INFINITY).is_err());
    }

    #[test]
    fn whole_counts_reject_fractions() {
        assert_eq!(require_whole_count("reps", 8.0), Ok(8));
        assert!(matches!(
            require_whole_count("reps", 7.5),
            Err(DomainError::NotWholeNumber { .. })
        ));
        assert!(require_whole_count("reps", -1.0).is_err());
    }

    #[test]
    fn unit_labels_are_coerced() {
        assert_eq!(WeightUnit::from_label("lbs"), WeightUnit::Pounds);
        assert_eq!(WeightUnit::from_label(" LB "), WeightUnit::Pounds);
        assert_eq!(WeightUnit::from_label("kg"), WeightUnit::Kilograms);
        assert_eq!(WeightUnit::from_label("stone"), WeightUnit::Kilograms);
        assert_eq!(WeightUnit::from_label(""), WeightUnit::Kilograms);
    }

    #[test]
    fn manual_sets_start_incomplete() {
        let set = WorkoutSet::new(10, 20.0, WeightUnit::Kilograms).unwrap();
        assert!(!set.completed);
        assert!(WorkoutSet::performed(8, 100.0, WeightUnit::Kilograms)
            .unwrap()
            .completed);
        assert!(WorkoutSet::new(10, -1.0, WeightUnit::Kilograms).is_err());
    }

    #[test]
    fn session_volume_sums_weight_times_reps() {
        let mut session = WorkoutSession::new("Push", Utc::now()).unwrap();
        session.exercises.push(
            ExerciseLog::new(
                "Bench Press",
                vec![
                    WorkoutSet::performed(8, 100.0, WeightUnit::Kilograms).unwrap(),
                    WorkoutSet::new(5, 110.0, WeightUnit::Kilograms).unwrap(),
                ],
            )
            .unwrap(),
        );
        assert_eq!(session.total_volume(), 1350.0);
        assert_eq!(session.set_count(), 2);
    }

    #[test]
    fn routine_exercise_requires_positive_plan() {
        assert!(RoutineExercise::new("Plank", 3, 60, PlannedMeasure::Seconds).is_ok());
        assert_eq!(
            RoutineExercise::new("Plank", 0, 60, PlannedMeasure::Seconds),
            Err(DomainError::NotPositive("sets"))
        );
        assert!(RoutineExercise::new(" ", 3, 10, PlannedMeasure::Reps).is_err());
    }

    #[test]
    fn ids_are_unique() {
        let ids: std::collections::HashSet<_> = (0..1000).map(|_| new_id()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
