//! crates/workout_tracker_core/src/routines.rs
//!
//! Routine authoring, the bundled preset plans, and the instantiator that expands a
//! routine into a fresh session skeleton.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::{
    new_id, require_name, DomainError, ExerciseLog, PlannedMeasure, Routine, RoutineExercise,
    WeightUnit, WorkoutSession, WorkoutSet,
};

//=========================================================================================
// Routine Instantiator
//=========================================================================================

/// Expands `routine` into a new, empty-progress session started at `now`.
///
/// Every nested entity is newly allocated with its own identifier, so editing the
/// session can never reach back into the stored routine. Sets start at weight 0 kg,
/// incomplete, with the planned value as their rep count.
pub fn instantiate(routine: &Routine, now: DateTime<Utc>) -> WorkoutSession {
    let exercises = routine
        .exercises
        .iter()
        .map(|planned| ExerciseLog {
            id: new_id(),
            name: planned.name.clone(),
            sets: (0..planned.sets)
                .map(|_| WorkoutSet {
                    id: new_id(),
                    reps: planned.reps,
                    weight: 0.0,
                    unit: WeightUnit::Kilograms,
                    completed: false,
                })
                .collect(),
        })
        .collect();

    WorkoutSession {
        id: new_id(),
        name: routine.name.clone(),
        start_time: now,
        end_time: None,
        exercises,
        routine_id: Some(routine.id),
    }
}

//=========================================================================================
// Routine Authoring
//=========================================================================================

fn default_sets() -> u32 {
    3
}

fn default_reps() -> u32 {
    10
}

/// One planned exercise as entered by the user.
#[derive(Debug, Clone, Deserialize)]
pub struct RoutineExerciseDraft {
    pub name: String,
    #[serde(default = "default_sets")]
    pub sets: u32,
    #[serde(default = "default_reps")]
    pub reps: u32,
    #[serde(default)]
    pub measure: PlannedMeasure,
}

impl RoutineExerciseDraft {
    pub fn new(name: impl Into<String>, sets: u32, reps: u32) -> Self {
        Self {
            name: name.into(),
            sets,
            reps,
            measure: PlannedMeasure::Reps,
        }
    }
}

/// A routine under construction.
#[derive(Debug, Clone, Deserialize)]
pub struct RoutineDraft {
    pub name: String,
    pub exercises: Vec<RoutineExerciseDraft>,
}

impl RoutineDraft {
    /// Validates the draft and allocates the routine. Needs a name and at least one exercise.
    pub fn build(&self) -> Result<Routine, DomainError> {
        let name = require_name("routine name", &self.name)?;
        if self.exercises.is_empty() {
            return Err(DomainError::EmptyRoutine);
        }
        let exercises = self
            .exercises
            .iter()
            .map(|e| RoutineExercise::new(&e.name, e.sets, e.reps, e.measure))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Routine {
            id: new_id(),
            name,
            last_performed: None,
            exercises,
        })
    }
}

//=========================================================================================
// Presets
//=========================================================================================

type PresetTable = &'static [(&'static str, &'static [(&'static str, u32, u32)])];

const PUSH_PULL_LEGS: PresetTable = &[
    (
        "Push Day (PPL)",
        &[
            ("Bench Press", 4, 8),
            ("Overhead Press", 3, 10),
            ("Incline Dumbbell Press", 3, 10),
            ("Tricep Pushdowns", 3, 12),
            ("Lateral Raises", 4, 15),
        ],
    ),
    (
        "Pull Day (PPL)",
        &[
            ("Deadlift", 3, 5),
            ("Pull Ups", 3, 8),
            ("Barbell Rows", 4, 10),
            ("Face Pulls", 3, 15),
            ("Bicep Curls", 3, 12),
        ],
    ),
    (
        "Leg Day (PPL)",
        &[
            ("Squat", 4, 6),
            ("Romanian Deadlift", 3, 10),
            ("Leg Press", 3, 12),
            ("Leg Curls", 3, 12),
            ("Calf Raises", 4, 15),
        ],
    ),
];

fn preset_routine(name: &str, exercises: &[(&str, u32, u32)]) -> Routine {
    Routine {
        id: new_id(),
        name: name.to_string(),
        last_performed: None,
        exercises: exercises
            .iter()
            .map(|&(exercise, sets, reps)| RoutineExercise {
                id: new_id(),
                name: exercise.to_string(),
                sets,
                reps,
                measure: PlannedMeasure::Reps,
            })
            .collect(),
    }
}

/// The "Push Pull Legs" plan, freshly allocated on every call.
pub fn push_pull_legs() -> Vec<Routine> {
    PUSH_PULL_LEGS
        .iter()
        .map(|(name, exercises)| preset_routine(name, exercises))
        .collect()
}

/// A short core routine; the plank is planned in seconds.
pub fn sample_routine() -> Routine {
    Routine {
        id: new_id(),
        name: "Morning Cardio & Abs".to_string(),
        last_performed: None,
        exercises: vec![
            RoutineExercise {
                id: new_id(),
                name: "Crunch".to_string(),
                sets: 3,
                reps: 20,
                measure: PlannedMeasure::Reps,
            },
            RoutineExercise {
                id: new_id(),
                name: "Plank".to_string(),
                sets: 3,
                reps: 60,
                measure: PlannedMeasure::Seconds,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instantiate_builds_planned_sets() {
        let routine = push_pull_legs().remove(0);
        let now = Utc::now();
        let session = instantiate(&routine, now);

        assert_eq!(session.name, "Push Day (PPL)");
        assert_eq!(session.start_time, now);
        assert_eq!(session.end_time, None);
        assert_eq!(session.routine_id, Some(routine.id));
        assert_eq!(session.exercises.len(), 5);

        let bench = &session.exercises[0];
        assert_eq!(bench.name, "Bench Press");
        assert_eq!(bench.sets.len(), 4);
        assert!(bench.sets.iter().all(|s| s.reps == 8
            && s.weight == 0.0
            && s.unit == WeightUnit::Kilograms
            && !s.completed));
    }

    #[test]
    fn instantiated_sessions_are_independent() {
        let routine = sample_routine();
        let pristine = routine.clone();

        let mut first = instantiate(&routine, Utc::now());
        let second = instantiate(&routine, Utc::now());
        assert_ne!(first.id, second.id);
        assert_ne!(first.exercises[0].id, routine.exercises[0].id);
        assert_ne!(first.exercises[0].sets[0].id, second.exercises[0].sets[0].id);

        first.exercises[0].sets[0].weight = 50.0;
        first.exercises[0].sets[0].reps = 99;
        first.exercises[0].name = "Sit Up".to_string();

        assert_eq!(routine, pristine);
        assert_eq!(second.exercises[0].sets[0].weight, 0.0);
        assert_eq!(second.exercises[0].sets[0].reps, 20);
        assert_eq!(second.exercises[0].name, "Crunch");
    }

    #[test]
    fn seconds_measure_is_carried_as_planned_value() {
        let session = instantiate(&sample_routine(), Utc::now());
        let plank = &session.exercises[1];
        assert_eq!(plank.sets.len(), 3);
        assert_eq!(plank.sets[0].reps, 60);
    }

    #[test]
    fn draft_validation() {
        let draft = RoutineDraft {
            name: "  Monday Chest Day ".to_string(),
            exercises: vec![RoutineExerciseDraft::new("Bench Press", 3, 10)],
        };
        let routine = draft.build().unwrap();
        assert_eq!(routine.name, "Monday Chest Day");
        assert_eq!(routine.exercises.len(), 1);

        let empty = RoutineDraft {
            name: "Empty".to_string(),
            exercises: vec![],
        };
        assert_eq!(empty.build(), Err(DomainError::EmptyRoutine));

        let unnamed = RoutineDraft {
            name: " ".to_string(),
            exercises: vec![RoutineExerciseDraft::new("Squat", 3, 5)],
        };
        assert!(unnamed.build().is_err());

        let zero_sets = RoutineDraft {
            name: "Legs".to_string(),
            exercises: vec![RoutineExerciseDraft::new("Squat", 0, 5)],
        };
        assert_eq!(zero_sets.build(), Err(DomainError::NotPositive("sets")));
    }

    #[test]
    fn draft_defaults_from_json() {
        let draft: RoutineDraft =
            serde_json::from_str(r#"{"name":"Quick","exercises":[{"name":"Dips"}]}"#).unwrap();
        assert_eq!(draft.exercises[0].sets, 3);
        assert_eq!(draft.exercises[0].reps, 10);
        assert_eq!(draft.exercises[0].measure, PlannedMeasure::Reps);
    }

    #[test]
    fn presets_get_fresh_ids_each_time() {
        let a = push_pull_legs();
        let b = push_pull_legs();
        assert_eq!(a.len(), 3);
        assert_ne!(a[0].id, b[0].id);
        assert_eq!(a[2].name, "Leg Day (PPL)");
    }
}
