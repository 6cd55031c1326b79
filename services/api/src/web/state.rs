//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the single path through which
//! handlers mutate it.

use axum::http::StatusCode;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};
use workout_tracker_core::{
    domain::DomainError,
    interpreter::CommandInterpreter,
    ports::{PortResult, SpeechToTextService, WorkoutRepository},
    store::WorkoutStore,
};

/// The error shape every handler returns.
pub type HandlerError = (StatusCode, String);

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub store: RwLock<WorkoutStore>,
    pub repository: Arc<dyn WorkoutRepository>,
    pub interpreter: CommandInterpreter,
    /// Present only when a transcription backend is configured.
    pub sst_adapter: Option<Arc<dyn SpeechToTextService>>,
}

impl AppState {
    /// Builds the state from whatever the repository currently holds.
    pub async fn load(
        repository: Arc<dyn WorkoutRepository>,
        interpreter: CommandInterpreter,
        sst_adapter: Option<Arc<dyn SpeechToTextService>>,
        seed_sample_routine: bool,
    ) -> PortResult<Self> {
        let snapshot = repository.load().await?;
        info!(
            sessions = snapshot.history.len(),
            routines = snapshot.routines.len(),
            "Workout data loaded."
        );
        let mut store = WorkoutStore::from_snapshot(snapshot);
        if seed_sample_routine && store.seed_sample_routine() {
            info!("Seeded the sample routine.");
            repository.save(&store.snapshot()).await?;
        }

        Ok(Self {
            store: RwLock::new(store),
            repository,
            interpreter,
            sst_adapter,
        })
    }

    /// Applies a command that only touches the session in progress. The active session
    /// is not part of the persisted snapshot, so nothing is saved.
    pub async fn apply<T, F>(&self, command: F) -> Result<T, HandlerError>
    where
        F: FnOnce(&mut WorkoutStore) -> Result<T, DomainError>,
    {
        let mut store = self.store.write().await;
        command(&mut *store).map_err(domain_rejection)
    }

    /// Applies `command` to the store and persists the result.
    ///
    /// The write lock is held across the save so snapshots reach the repository in the
    /// order the commands were applied. A rejected command saves nothing.
    pub async fn mutate<T, F>(&self, command: F) -> Result<T, HandlerError>
    where
        F: FnOnce(&mut WorkoutStore) -> Result<T, DomainError>,
    {
        let mut store = self.store.write().await;
        let value = command(&mut *store).map_err(domain_rejection)?;
        if let Err(e) = self.repository.save(&store.snapshot()).await {
            error!("Failed to persist workout data: {:?}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save workout data".to_string(),
            ));
        }
        Ok(value)
    }
}

/// Maps a domain rejection onto an HTTP status.
pub fn domain_rejection(error: DomainError) -> HandlerError {
    let status = match error {
        DomainError::RoutineNotFound(_)
        | DomainError::ExerciseOutOfRange(_)
        | DomainError::SetOutOfRange { .. } => StatusCode::NOT_FOUND,
        DomainError::NoActiveSession | DomainError::SessionAlreadyActive => StatusCode::CONFLICT,
        DomainError::EmptyName(_)
        | DomainError::InvalidNumber { .. }
        | DomainError::NotWholeNumber { .. }
        | DomainError::NotPositive(_)
        | DomainError::EmptyRoutine
        | DomainError::EmptySession => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, error.to_string())
}
