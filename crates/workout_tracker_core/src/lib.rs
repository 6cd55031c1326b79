pub mod aggregator;
pub mod domain;
pub mod interpreter;
pub mod logger;
pub mod ports;
pub mod routines;
pub mod store;

pub use aggregator::{DashboardSummary, SessionSummary, VolumePoint};
pub use domain::{
    DomainError, ExerciseLog, PlannedMeasure, Routine, RoutineExercise, WeightUnit, WorkoutSession,
    WorkoutSet, WorkoutSnapshot,
};
pub use interpreter::{CommandInterpreter, InterpretError};
pub use logger::{ActiveSession, TimerState};
pub use ports::{
    CommandParsingService, ParseRequest, PortError, PortResult, SpeechToTextService,
    WorkoutRepository,
};
pub use routines::{RoutineDraft, RoutineExerciseDraft};
pub use store::WorkoutStore;
