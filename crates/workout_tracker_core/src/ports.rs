//! crates/workout_tracker_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the inference vendor, the transcription vendor and the
//! storage backend.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::WorkoutSnapshot;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., network, disk).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Inference Request
//=========================================================================================

/// Everything the inference service needs to turn one utterance into structured JSON.
#[derive(Debug, Clone)]
pub struct ParseRequest {
    /// Fixed instruction set (role + extraction rules).
    pub instructions: String,
    /// The user-facing prompt that embeds the utterance.
    pub prompt: String,
    /// Name under which the output schema is registered with the service.
    pub schema_name: &'static str,
    /// JSON schema the response must follow.
    pub schema: Value,
    /// Sampling temperature; the interpreter always asks for the most deterministic mode.
    pub temperature: f32,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait CommandParsingService: Send + Sync {
    /// Sends the request to the inference service and returns the raw JSON text it produced.
    async fn parse_command(&self, request: &ParseRequest) -> PortResult<String>;
}

#[async_trait]
pub trait SpeechToTextService: Send + Sync {
    /// Transcribes a slice of audio data into text.
    async fn transcribe_audio(&self, audio_data: &[u8]) -> PortResult<String>;
}

#[async_trait]
pub trait WorkoutRepository: Send + Sync {
    /// Loads the full session history and routine list.
    async fn load(&self) -> PortResult<WorkoutSnapshot>;

    /// Replaces the stored history and routine list with `snapshot`.
    async fn save(&self, snapshot: &WorkoutSnapshot) -> PortResult<()>;
}
