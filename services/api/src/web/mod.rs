pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
    Router,
};
use rest::*;
use state::AppState;
use std::sync::Arc;

pub use ws_handler::ws_handler;

/// Recorded voice commands are short, but PCM16 at 48 kHz adds up quickly.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Builds the API router. CORS and the Swagger UI are layered on by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/dashboard", get(dashboard_handler))
        .route("/sessions", get(list_sessions_handler))
        .route("/sessions/{id}", get(get_session_handler))
        .route(
            "/routines",
            get(list_routines_handler).post(create_routine_handler),
        )
        .route("/routines/presets", post(load_presets_handler))
        .route("/routines/{id}", delete(delete_routine_handler))
        .route("/routines/{id}/start", post(start_routine_handler))
        .route(
            "/session",
            get(get_active_session_handler)
                .post(start_session_handler)
                .delete(discard_session_handler),
        )
        .route("/session/name", put(rename_session_handler))
        .route("/session/timer/toggle", post(toggle_timer_handler))
        .route("/session/exercises", post(add_exercise_handler))
        .route("/session/exercises/{index}", delete(remove_exercise_handler))
        .route("/session/exercises/{index}/sets", post(add_set_handler))
        .route(
            "/session/exercises/{index}/sets/{set}",
            patch(update_set_handler),
        )
        .route(
            "/session/exercises/{index}/sets/{set}/toggle",
            post(toggle_set_handler),
        )
        .route("/session/commands", post(command_handler))
        .route("/session/commands/voice", post(voice_command_handler))
        .route("/session/finish", post(finish_session_handler))
        .route("/session/ws", get(ws_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(app_state)
}
