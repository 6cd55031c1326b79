//! crates/workout_tracker_core/src/interpreter.rs
//!
//! Turns a free-text workout command ("3 sets of bench press 100kg for 8 reps") into
//! exercise log entries, using the inference service as the only parsing engine.
//!
//! The interpreter never touches session state. It either hands back a complete,
//! validated list of entries or an `InterpretError`; callers merge on success only.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::domain::{require_whole_count, DomainError, ExerciseLog, WeightUnit, WorkoutSet};
use crate::ports::{CommandParsingService, ParseRequest, PortError};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const SCHEMA_NAME: &str = "workout_log";

const SYSTEM_INSTRUCTIONS: &str = r#"You are a fitness logging assistant. Parse the user's natural language workout command into structured JSON.

Rules:
1. Identify exercise names, sets, reps, and weights.
2. If sets are implied (e.g. "100kg for 5 reps"), assume 1 set unless specified otherwise.
3. Normalize exercise names to standard gym terminology (e.g. "bench" -> "Bench Press").
4. Default to "kg" if the unit is not specified, unless context implies otherwise.
5. Emit one entry in "sets" per performed set, in the order they were performed."#;

const USER_INPUT_TEMPLATE: &str = r#"User Command: "{command}""#;

//=========================================================================================
// Interpretation Errors
//=========================================================================================

/// Every way an interpretation can end without entries to merge.
#[derive(Debug, thiserror::Error)]
pub enum InterpretError {
    #[error("The command was empty")]
    EmptyCommand,
    #[error("Another command is still being interpreted")]
    Busy,
    #[error("The inference service did not answer within {0:?}")]
    Timeout(Duration),
    #[error("Inference service failure: {0}")]
    Service(#[from] PortError),
    #[error("The inference service response is not valid: {0}")]
    Malformed(String),
    #[error("The inference service response has no `exercises` field")]
    MissingExercises,
    #[error("The inference service response failed validation: {0}")]
    Invalid(#[from] DomainError),
    #[error("No exercises were recognised in the command")]
    NothingRecognised,
}

//=========================================================================================
// Request Construction
//=========================================================================================

/// The strict output schema the inference service must follow.
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "exercises": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {
                            "type": "string",
                            "description": "The standardized name of the exercise (e.g., 'Bench Press')"
                        },
                        "sets": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "reps": { "type": "number", "description": "Number of repetitions" },
                                    "weight": { "type": "number", "description": "Weight used" },
                                    "unit": { "type": "string", "description": "Unit of weight (kg or lbs)" }
                                },
                                "required": ["reps", "weight", "unit"],
                                "additionalProperties": false
                            }
                        }
                    },
                    "required": ["name", "sets"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["exercises"],
        "additionalProperties": false
    })
}

/// Builds the request for one utterance. Temperature 0 is the most deterministic mode.
pub fn build_request(command: &str) -> ParseRequest {
    ParseRequest {
        instructions: SYSTEM_INSTRUCTIONS.to_string(),
        prompt: USER_INPUT_TEMPLATE.replace("{command}", command),
        schema_name: SCHEMA_NAME,
        schema: response_schema(),
        temperature: 0.0,
    }
}

//=========================================================================================
// Response Validation
//=========================================================================================

#[derive(Deserialize)]
struct RawParseResult {
    exercises: Vec<RawExercise>,
}

#[derive(Deserialize)]
struct RawExercise {
    name: String,
    sets: Vec<RawSet>,
}

#[derive(Deserialize)]
struct RawSet {
    reps: f64,
    weight: f64,
    #[serde(default)]
    unit: Option<String>,
}

/// Models occasionally wrap JSON output in a markdown fence.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let body = rest.strip_prefix("json").unwrap_or(rest);
            body.strip_suffix("```").unwrap_or(body).trim()
        }
        None => trimmed,
    }
}

/// Validates a raw service response and maps it into fresh exercise log entries.
///
/// All-or-nothing: a single bad exercise or set rejects the whole response.
pub fn parse_response(raw: &str) -> Result<Vec<ExerciseLog>, InterpretError> {
    let value: Value = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| InterpretError::Malformed(e.to_string()))?;

    if value.get("exercises").map_or(true, Value::is_null) {
        return Err(InterpretError::MissingExercises);
    }

    let parsed: RawParseResult =
        serde_json::from_value(value).map_err(|e| InterpretError::Malformed(e.to_string()))?;

    if parsed.exercises.is_empty() {
        return Err(InterpretError::NothingRecognised);
    }

    parsed
        .exercises
        .into_iter()
        .map(|exercise| -> Result<ExerciseLog, InterpretError> {
            let sets = exercise
                .sets
                .into_iter()
                .map(|set| {
                    let unit = set
                        .unit
                        .as_deref()
                        .map(WeightUnit::from_label)
                        .unwrap_or_default();
                    let reps = require_whole_count("reps", set.reps)?;
                    WorkoutSet::performed(reps, set.weight, unit)
                })
                .collect::<Result<Vec<_>, DomainError>>()?;
            Ok(ExerciseLog::new(&exercise.name, sets)?)
        })
        .collect()
}

//=========================================================================================
// The Interpreter
//=========================================================================================

/// Owns the inference port plus the timeout and the one-request-at-a-time guard.
pub struct CommandInterpreter {
    service: Arc<dyn CommandParsingService>,
    timeout: Duration,
    in_flight: Semaphore,
}

impl CommandInterpreter {
    pub fn new(service: Arc<dyn CommandParsingService>, timeout: Duration) -> Self {
        Self {
            service,
            timeout,
            in_flight: Semaphore::new(1),
        }
    }

    /// Whether a request is currently outstanding.
    pub fn is_busy(&self) -> bool {
        self.in_flight.available_permits() == 0
    }

    /// Interprets one utterance. Failures are logged here and returned to the caller,
    /// which should treat any `Err` as "nothing happened".
    pub async fn interpret(&self, command: &str) -> Result<Vec<ExerciseLog>, InterpretError> {
        let result = self.run(command).await;
        match &result {
            Ok(logs) => info!(exercises = logs.len(), "Command interpreted"),
            Err(InterpretError::EmptyCommand) => debug!("Ignoring empty command"),
            Err(e) => warn!("Command interpretation produced no result: {}", e),
        }
        result
    }

    async fn run(&self, command: &str) -> Result<Vec<ExerciseLog>, InterpretError> {
        let command = command.trim();
        if command.is_empty() {
            return Err(InterpretError::EmptyCommand);
        }

        let _permit = self
            .in_flight
            .try_acquire()
            .map_err(|_| InterpretError::Busy)?;

        let request = build_request(command);
        let raw = tokio::time::timeout(self.timeout, self.service.parse_command(&request))
            .await
            .map_err(|_| InterpretError::Timeout(self.timeout))??;
        debug!("Inference service raw response: {}", raw);

        parse_response(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::ports::PortResult;

    /// Replies with a canned body after an optional delay and records every request.
    struct CannedService {
        reply: Result<String, String>,
        delay: Duration,
        requests: Mutex<Vec<ParseRequest>>,
    }

    impl CannedService {
        fn ok(body: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(body.to_string()),
                delay: Duration::ZERO,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message.to_string()),
                delay: Duration::ZERO,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn slow(body: &str, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(body.to_string()),
                delay,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CommandParsingService for CannedService {
        async fn parse_command(&self, request: &ParseRequest) -> PortResult<String> {
            self.requests.lock().unwrap().push(request.clone());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.reply.clone().map_err(PortError::Unexpected)
        }
    }

    const BENCH: &str = r#"{"exercises":[{"name":"Bench Press","sets":[
        {"reps":8,"weight":100,"unit":"kg"},
        {"reps":8,"weight":100,"unit":"kg"},
        {"reps":8,"weight":100,"unit":"kg"}]}]}"#;

    #[test]
    fn maps_sets_as_completed_with_fresh_ids() {
        let logs = parse_response(BENCH).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].name, "Bench Press");
        assert_eq!(logs[0].sets.len(), 3);
        assert!(logs[0].sets.iter().all(|s| s.completed));
        assert_eq!(logs[0].volume(), 2400.0);
        assert_ne!(logs[0].sets[0].id, logs[0].sets[1].id);
    }

    #[test]
    fn coerces_units() {
        let raw = r#"{"exercises":[{"name":"Squat","sets":[
            {"reps":5,"weight":225,"unit":"lbs"},
            {"reps":5,"weight":100,"unit":"stones"},
            {"reps":5,"weight":100}]}]}"#;
        let sets = &parse_response(raw).unwrap()[0].sets;
        assert_eq!(sets[0].unit, WeightUnit::Pounds);
        assert_eq!(sets[1].unit, WeightUnit::Kilograms);
        assert_eq!(sets[2].unit, WeightUnit::Kilograms);
    }

    #[test]
    fn rejects_missing_exercises_field() {
        assert!(matches!(
            parse_response(r#"{"workout":[]}"#),
            Err(InterpretError::MissingExercises)
        ));
        assert!(matches!(
            parse_response(r#"{"exercises":null}"#),
            Err(InterpretError::MissingExercises)
        ));
    }

    #[test]
    fn rejects_set_without_reps_or_weight() {
        let no_reps = r#"{"exercises":[{"name":"Row","sets":[{"weight":60,"unit":"kg"}]}]}"#;
        let no_weight = r#"{"exercises":[{"name":"Row","sets":[{"reps":10,"unit":"kg"}]}]}"#;
        assert!(matches!(
            parse_response(no_reps),
            Err(InterpretError::Malformed(_))
        ));
        assert!(matches!(
            parse_response(no_weight),
            Err(InterpretError::Malformed(_))
        ));
    }

    #[test]
    fn one_bad_entry_rejects_the_whole_response() {
        let raw = r#"{"exercises":[
            {"name":"Curl","sets":[{"reps":12,"weight":15,"unit":"kg"}]},
            {"name":"  ","sets":[{"reps":12,"weight":15,"unit":"kg"}]}]}"#;
        assert!(matches!(
            parse_response(raw),
            Err(InterpretError::Invalid(DomainError::EmptyName(_)))
        ));

        let negative = r#"{"exercises":[{"name":"Curl","sets":[{"reps":12,"weight":-5,"unit":"kg"}]}]}"#;
        assert!(matches!(
            parse_response(negative),
            Err(InterpretError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_garbage_and_empty_lists() {
        assert!(matches!(
            parse_response("I could not parse that"),
            Err(InterpretError::Malformed(_))
        ));
        assert!(matches!(
            parse_response(r#"{"exercises":[]}"#),
            Err(InterpretError::NothingRecognised)
        ));
    }

    #[test]
    fn accepts_fenced_json() {
        let fenced = format!("```json\n{}\n```", BENCH);
        assert_eq!(parse_response(&fenced).unwrap()[0].sets.len(), 3);
    }

    #[tokio::test]
    async fn sends_deterministic_request_with_schema() {
        let service = CannedService::ok(BENCH);
        let interpreter = CommandInterpreter::new(service.clone(), DEFAULT_TIMEOUT);

        interpreter
            .interpret("3 sets of bench 100kg for 8")
            .await
            .unwrap();

        let requests = service.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, 0.0);
        assert!(requests[0].prompt.contains("3 sets of bench 100kg for 8"));
        assert_eq!(requests[0].schema["required"][0], "exercises");
    }

    #[tokio::test]
    async fn empty_command_never_reaches_the_service() {
        let service = CannedService::ok(BENCH);
        let interpreter = CommandInterpreter::new(service.clone(), DEFAULT_TIMEOUT);

        assert!(matches!(
            interpreter.interpret("   ").await,
            Err(InterpretError::EmptyCommand)
        ));
        assert!(service.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn service_failure_is_a_no_result() {
        let interpreter =
            CommandInterpreter::new(CannedService::failing("connection refused"), DEFAULT_TIMEOUT);
        assert!(matches!(
            interpreter.interpret("bench 100 for 8").await,
            Err(InterpretError::Service(_))
        ));
        assert!(!interpreter.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_service_times_out() {
        let service = CannedService::slow(BENCH, Duration::from_secs(60));
        let interpreter = CommandInterpreter::new(service, Duration::from_secs(5));
        assert!(matches!(
            interpreter.interpret("bench 100 for 8").await,
            Err(InterpretError::Timeout(_))
        ));
        assert!(!interpreter.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn second_command_is_rejected_while_one_is_outstanding() {
        let service = CannedService::slow(BENCH, Duration::from_secs(1));
        let interpreter = Arc::new(CommandInterpreter::new(service, DEFAULT_TIMEOUT));

        let first = {
            let interpreter = interpreter.clone();
            tokio::spawn(async move { interpreter.interpret("bench 100 for 8").await })
        };
        tokio::task::yield_now().await;
        assert!(interpreter.is_busy());

        assert!(matches!(
            interpreter.interpret("squat 140 for 5").await,
            Err(InterpretError::Busy)
        ));
        assert!(first.await.unwrap().is_ok());
        assert!(!interpreter.is_busy());
    }
}
