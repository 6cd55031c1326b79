//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::{domain_rejection, AppState, HandlerError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;
use workout_tracker_core::{
    domain::{DomainError, ExerciseLog, PlannedMeasure, Routine, WeightUnit, WorkoutSession},
    interpreter::InterpretError,
    logger::{ActiveSession, DEFAULT_REPS, DEFAULT_WEIGHT},
    routines::{RoutineDraft, RoutineExerciseDraft},
};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        dashboard_handler,
        list_sessions_handler,
        get_session_handler,
        list_routines_handler,
        create_routine_handler,
        delete_routine_handler,
        load_presets_handler,
        start_routine_handler,
        get_active_session_handler,
        start_session_handler,
        discard_session_handler,
        rename_session_handler,
        toggle_timer_handler,
        add_exercise_handler,
        remove_exercise_handler,
        add_set_handler,
        update_set_handler,
        toggle_set_handler,
        command_handler,
        voice_command_handler,
        finish_session_handler,
    ),
    components(
        schemas(
            CreateRoutineRequest,
            RoutineExerciseRequest,
            StartSessionRequest,
            RenameSessionRequest,
            ManualExerciseRequest,
            UpdateSetRequest,
            CommandRequest,
            ActiveSessionView,
            TimerResponse,
            ToggleSetResponse,
            PresetLoadResponse,
            CommandResponse,
        )
    ),
    tags(
        (name = "Workout Tracker API", description = "Workout logging, routines, and natural-language entry.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RoutineExerciseRequest {
    pub name: String,
    /// Defaults to 3.
    pub sets: Option<u32>,
    /// Planned reps, or seconds when `measure` is `seconds`. Defaults to 10.
    pub reps: Option<u32>,
    /// "reps" (default) or "seconds".
    #[schema(value_type = Option<String>)]
    pub measure: Option<PlannedMeasure>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateRoutineRequest {
    pub name: String,
    pub exercises: Vec<RoutineExerciseRequest>,
}

impl CreateRoutineRequest {
    fn into_draft(self) -> RoutineDraft {
        RoutineDraft {
            name: self.name,
            exercises: self
                .exercises
                .into_iter()
                .map(|e| RoutineExerciseDraft {
                    name: e.name,
                    sets: e.sets.unwrap_or(3),
                    reps: e.reps.unwrap_or(10),
                    measure: e.measure.unwrap_or_default(),
                })
                .collect(),
        }
    }
}

#[derive(Deserialize, ToSchema, Default)]
pub struct StartSessionRequest {
    /// Defaults to "Evening Workout".
    pub name: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RenameSessionRequest {
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ManualExerciseRequest {
    pub name: String,
    /// Defaults to 20.
    pub weight: Option<f64>,
    /// Defaults to 10.
    pub reps: Option<u32>,
    /// "kg" or "lbs"; anything else is kilograms.
    pub unit: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateSetRequest {
    pub weight: Option<f64>,
    pub reps: Option<u32>,
}

#[derive(Deserialize, ToSchema)]
pub struct CommandRequest {
    /// Free text, e.g. "3 sets of bench press 100kg for 8 reps".
    pub text: String,
}

//=========================================================================================
// API Response Structs
//=========================================================================================

/// The session being logged, with its timer as of the response.
#[derive(Serialize, ToSchema)]
pub struct ActiveSessionView {
    /// The session with its exercises and sets.
    #[schema(value_type = Object)]
    pub session: WorkoutSession,
    pub running: bool,
    pub elapsed_seconds: i64,
}

impl ActiveSessionView {
    pub fn new(active: &ActiveSession, now: DateTime<Utc>) -> Self {
        Self {
            session: active.session().clone(),
            running: active.is_running(),
            elapsed_seconds: active.elapsed_seconds(now),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct TimerResponse {
    pub running: bool,
    pub elapsed_seconds: i64,
}

#[derive(Serialize, ToSchema)]
pub struct ToggleSetResponse {
    pub completed: bool,
}

#[derive(Serialize, ToSchema)]
pub struct PresetLoadResponse {
    /// Only the routines that were not already present.
    #[schema(value_type = Vec<Object>)]
    pub added: Vec<Routine>,
}

/// What a natural-language command did. Only `added` changes the session.
#[derive(Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandResponse {
    Added {
        #[serde(skip_serializing_if = "Option::is_none")]
        transcript: Option<String>,
        #[schema(value_type = Vec<Object>)]
        exercises: Vec<ExerciseLog>,
    },
    NoResult {
        #[serde(skip_serializing_if = "Option::is_none")]
        transcript: Option<String>,
        reason: String,
    },
    SpeechUnavailable {
        message: String,
    },
}

//=========================================================================================
// History & Dashboard Handlers
//=========================================================================================

/// Summary metrics over the finalized history.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses((status = 200, description = "Totals, last session date, volume series and recent activity"))
)]
pub async fn dashboard_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(app_state.store.read().await.dashboard())
}

/// Finalized sessions, most recent first.
#[utoipa::path(
    get,
    path = "/sessions",
    responses((status = 200, description = "Session history"))
)]
pub async fn list_sessions_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(app_state.store.read().await.history().to_vec())
}

#[utoipa::path(
    get,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "One finalized session with all exercises and sets"),
        (status = 404, description = "No such session")
    )
)]
pub async fn get_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkoutSession>, HandlerError> {
    app_state
        .store
        .read()
        .await
        .session(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Session not found: {}", id)))
}

//=========================================================================================
// Routine Handlers
//=========================================================================================

/// Routines in creation order.
#[utoipa::path(
    get,
    path = "/routines",
    responses((status = 200, description = "All routines"))
)]
pub async fn list_routines_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(app_state.store.read().await.routines().to_vec())
}

#[utoipa::path(
    post,
    path = "/routines",
    request_body = CreateRoutineRequest,
    responses(
        (status = 201, description = "Routine created"),
        (status = 422, description = "Missing name, no exercises, or a non-positive plan")
    )
)]
pub async fn create_routine_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateRoutineRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let draft = payload.into_draft();
    let routine = app_state
        .mutate(|store| store.add_routine(&draft).cloned())
        .await?;
    info!("Routine '{}' created.", routine.name);
    Ok((StatusCode::CREATED, Json(routine)))
}

#[utoipa::path(
    delete,
    path = "/routines/{id}",
    params(("id" = Uuid, Path, description = "Routine identifier")),
    responses(
        (status = 204, description = "Routine deleted"),
        (status = 404, description = "No such routine")
    )
)]
pub async fn delete_routine_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HandlerError> {
    app_state.mutate(|store| store.delete_routine(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Loads the Push Pull Legs plan. Routines whose name already exists are skipped.
#[utoipa::path(
    post,
    path = "/routines/presets",
    responses((status = 200, description = "The routines that were actually added", body = PresetLoadResponse))
)]
pub async fn load_presets_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<PresetLoadResponse>, HandlerError> {
    let added = app_state.mutate(|store| Ok(store.load_presets())).await?;
    info!("Loaded {} preset routines.", added.len());
    Ok(Json(PresetLoadResponse { added }))
}

/// Starts a new session pre-filled from the routine.
#[utoipa::path(
    post,
    path = "/routines/{id}/start",
    params(("id" = Uuid, Path, description = "Routine identifier")),
    responses(
        (status = 201, description = "Session started", body = ActiveSessionView),
        (status = 404, description = "No such routine"),
        (status = 409, description = "A session is already in progress")
    )
)]
pub async fn start_routine_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let now = Utc::now();
    let view = app_state
        .apply(|store| {
            store
                .start_routine(id, now)
                .map(|active| ActiveSessionView::new(active, now))
        })
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

//=========================================================================================
// Active Session Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "The session being logged", body = ActiveSessionView),
        (status = 409, description = "No session is in progress")
    )
)]
pub async fn get_active_session_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<ActiveSessionView>, HandlerError> {
    let store = app_state.store.read().await;
    let active = store
        .active()
        .ok_or_else(|| domain_rejection(DomainError::NoActiveSession))?;
    Ok(Json(ActiveSessionView::new(active, Utc::now())))
}

#[utoipa::path(
    post,
    path = "/session",
    request_body = StartSessionRequest,
    responses(
        (status = 201, description = "Blank session started", body = ActiveSessionView),
        (status = 409, description = "A session is already in progress")
    )
)]
pub async fn start_session_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let now = Utc::now();
    let view = app_state
        .apply(|store| {
            store
                .start_session(payload.name.as_deref(), now)
                .map(|active| ActiveSessionView::new(active, now))
        })
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Drops the session in progress without recording it.
#[utoipa::path(
    delete,
    path = "/session",
    responses(
        (status = 204, description = "Session discarded"),
        (status = 409, description = "No session is in progress")
    )
)]
pub async fn discard_session_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<StatusCode, HandlerError> {
    app_state.apply(|store| store.discard_session()).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/session/name",
    request_body = RenameSessionRequest,
    responses(
        (status = 200, description = "Session renamed", body = ActiveSessionView),
        (status = 422, description = "Blank name")
    )
)]
pub async fn rename_session_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<RenameSessionRequest>,
) -> Result<Json<ActiveSessionView>, HandlerError> {
    let now = Utc::now();
    let view = app_state
        .apply(|store| {
            let active = store.active_mut()?;
            active.rename(&payload.name)?;
            Ok(ActiveSessionView::new(active, now))
        })
        .await?;
    Ok(Json(view))
}

/// Pauses or resumes the session timer.
#[utoipa::path(
    post,
    path = "/session/timer/toggle",
    responses((status = 200, description = "New timer state", body = TimerResponse))
)]
pub async fn toggle_timer_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<TimerResponse>, HandlerError> {
    let now = Utc::now();
    let timer = app_state
        .apply(|store| {
            let active = store.active_mut()?;
            let running = active.toggle_timer(now);
            Ok(TimerResponse {
                running,
                elapsed_seconds: active.elapsed_seconds(now),
            })
        })
        .await?;
    Ok(Json(timer))
}

/// Adds an exercise by hand with a single, not yet completed set.
#[utoipa::path(
    post,
    path = "/session/exercises",
    request_body = ManualExerciseRequest,
    responses(
        (status = 201, description = "Exercise added"),
        (status = 422, description = "Blank name or negative weight")
    )
)]
pub async fn add_exercise_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<ManualExerciseRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let unit = payload
        .unit
        .as_deref()
        .map(WeightUnit::from_label)
        .unwrap_or_default();
    let exercise = app_state
        .apply(|store| {
            store
                .active_mut()?
                .add_manual_exercise(
                    &payload.name,
                    payload.weight.unwrap_or(DEFAULT_WEIGHT),
                    payload.reps.unwrap_or(DEFAULT_REPS),
                    unit,
                )
                .cloned()
        })
        .await?;
    Ok((StatusCode::CREATED, Json(exercise)))
}

#[utoipa::path(
    delete,
    path = "/session/exercises/{index}",
    params(("index" = usize, Path, description = "Position of the exercise in the session")),
    responses(
        (status = 204, description = "Exercise removed"),
        (status = 404, description = "No exercise at that position")
    )
)]
pub async fn remove_exercise_handler(
    State(app_state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<StatusCode, HandlerError> {
    app_state
        .apply(|store| store.active_mut()?.remove_exercise(index))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Appends a set repeating the exercise's last one.
#[utoipa::path(
    post,
    path = "/session/exercises/{index}/sets",
    params(("index" = usize, Path, description = "Position of the exercise in the session")),
    responses(
        (status = 201, description = "Set added"),
        (status = 404, description = "No exercise at that position")
    )
)]
pub async fn add_set_handler(
    State(app_state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<impl IntoResponse, HandlerError> {
    let set = app_state
        .apply(|store| store.active_mut()?.add_set(index).cloned())
        .await?;
    Ok((StatusCode::CREATED, Json(set)))
}

#[utoipa::path(
    patch,
    path = "/session/exercises/{index}/sets/{set}",
    request_body = UpdateSetRequest,
    params(
        ("index" = usize, Path, description = "Position of the exercise in the session"),
        ("set" = usize, Path, description = "Position of the set in the exercise")
    ),
    responses(
        (status = 200, description = "Set updated"),
        (status = 404, description = "No such exercise or set"),
        (status = 422, description = "Negative or non-finite weight")
    )
)]
pub async fn update_set_handler(
    State(app_state): State<Arc<AppState>>,
    Path((index, set)): Path<(usize, usize)>,
    Json(payload): Json<UpdateSetRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let updated = app_state
        .apply(|store| {
            store
                .active_mut()?
                .update_set(index, set, payload.weight, payload.reps)
                .cloned()
        })
        .await?;
    Ok(Json(updated))
}

#[utoipa::path(
    post,
    path = "/session/exercises/{index}/sets/{set}/toggle",
    params(
        ("index" = usize, Path, description = "Position of the exercise in the session"),
        ("set" = usize, Path, description = "Position of the set in the exercise")
    ),
    responses(
        (status = 200, description = "New completion flag", body = ToggleSetResponse),
        (status = 404, description = "No such exercise or set")
    )
)]
pub async fn toggle_set_handler(
    State(app_state): State<Arc<AppState>>,
    Path((index, set)): Path<(usize, usize)>,
) -> Result<Json<ToggleSetResponse>, HandlerError> {
    let completed = app_state
        .apply(|store| store.active_mut()?.toggle_set(index, set))
        .await?;
    Ok(Json(ToggleSetResponse { completed }))
}

/// Finalizes the session into history. Sessions without exercises are refused.
#[utoipa::path(
    post,
    path = "/session/finish",
    responses(
        (status = 201, description = "Session recorded"),
        (status = 409, description = "No session is in progress"),
        (status = 422, description = "The session has no exercises")
    )
)]
pub async fn finish_session_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let now = Utc::now();
    let finished = app_state
        .mutate(|store| store.finish_session(now).cloned())
        .await?;
    info!(
        "Session '{}' finished with {} exercises.",
        finished.name,
        finished.exercises.len()
    );
    Ok((StatusCode::CREATED, Json(finished)))
}

//=========================================================================================
// Natural-Language Command Handlers
//=========================================================================================

/// The id of the session in progress, or 409 when there is none.
async fn require_active_session(app_state: &AppState) -> Result<Uuid, HandlerError> {
    app_state
        .store
        .read()
        .await
        .active()
        .map(|active| active.session().id)
        .ok_or_else(|| domain_rejection(DomainError::NoActiveSession))
}

/// Runs the interpreter outside the store lock, then merges on success only, and only
/// into the session the command was issued against.
async fn interpret_and_merge(
    app_state: &AppState,
    session_id: Uuid,
    text: &str,
    transcript: Option<String>,
) -> Result<CommandResponse, HandlerError> {
    match app_state.interpreter.interpret(text).await {
        Ok(logs) => {
            let exercises = logs.clone();
            let merged = app_state
                .apply(|store| Ok(store.merge_into(session_id, logs)))
                .await?;
            if !merged {
                warn!(%session_id, "Session changed while the command was interpreted; result dropped.");
                return Ok(CommandResponse::NoResult {
                    transcript,
                    reason: "The session changed while the command was being interpreted."
                        .to_string(),
                });
            }
            Ok(CommandResponse::Added {
                transcript,
                exercises,
            })
        }
        Err(InterpretError::Busy) => Err((
            StatusCode::CONFLICT,
            InterpretError::Busy.to_string(),
        )),
        Err(e) => Ok(CommandResponse::NoResult {
            transcript,
            reason: e.to_string(),
        }),
    }
}

/// Interprets a typed command and appends the recognised exercises to the session.
#[utoipa::path(
    post,
    path = "/session/commands",
    request_body = CommandRequest,
    responses(
        (status = 200, description = "`added` with the new exercises, or `no_result` when nothing changed", body = CommandResponse),
        (status = 409, description = "No session in progress, or another command is still being interpreted")
    )
)]
pub async fn command_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CommandRequest>,
) -> Result<Json<CommandResponse>, HandlerError> {
    let session_id = require_active_session(&app_state).await?;
    Ok(Json(
        interpret_and_merge(&app_state, session_id, &payload.text, None).await?,
    ))
}

/// Transcribes recorded PCM16 mono audio and interprets the transcript.
#[utoipa::path(
    post,
    path = "/session/commands/voice",
    request_body(content = Vec<u8>, content_type = "application/octet-stream", description = "Raw PCM16 mono audio at 48 kHz."),
    responses(
        (status = 200, description = "`added`, `no_result`, or `speech_unavailable` (fall back to text entry)", body = CommandResponse),
        (status = 409, description = "No session in progress, or another command is still being interpreted")
    )
)]
pub async fn voice_command_handler(
    State(app_state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<CommandResponse>, HandlerError> {
    let session_id = require_active_session(&app_state).await?;

    let Some(sst_adapter) = app_state.sst_adapter.clone() else {
        return Ok(Json(CommandResponse::SpeechUnavailable {
            message: "Voice input is not available. Please type the command instead.".to_string(),
        }));
    };

    let transcript = match sst_adapter.transcribe_audio(&body).await {
        Ok(transcript) => transcript,
        Err(e) => {
            warn!("Speech transcription failed: {}", e);
            return Ok(Json(CommandResponse::SpeechUnavailable {
                message: "Speech could not be recognised. Please type the command instead."
                    .to_string(),
            }));
        }
    };
    info!("Transcribed command: '{}'", transcript);

    let response = interpret_and_merge(&app_state, session_id, &transcript, Some(transcript.clone()))
            .await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_bodies_are_documented() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().unwrap().schemas;
        for name in ["ActiveSessionView", "CommandResponse", "PresetLoadResponse"] {
            assert!(schemas.contains_key(name), "missing schema {}", name);
        }

        let json = serde_json::to_value(&doc).unwrap();
        let ok = &json["paths"]["/session/commands"]["post"]["responses"]["200"];
        assert_eq!(
            ok["content"]["application/json"]["schema"]["$ref"],
            "#/components/schemas/CommandResponse"
        );
        let measure = &json["components"]["schemas"]["RoutineExerciseRequest"]["properties"]["measure"];
        assert!(!measure.is_null());
    }
}
