//! services/api/src/adapters/command_llm.rs
//!
//! This module contains the adapter for the workout command parsing LLM.
//! It implements the `CommandParsingService` port from the `core` crate against any
//! OpenAI-compatible chat completions endpoint (Gemini's compatibility layer by default).

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use workout_tracker_core::ports::{CommandParsingService, ParseRequest, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `CommandParsingService` with structured (JSON schema) output.
#[derive(Clone)]
pub struct OpenAiCommandAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiCommandAdapter {
    /// Creates a new `OpenAiCommandAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `CommandParsingService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CommandParsingService for OpenAiCommandAdapter {
    async fn parse_command(&self, request: &ParseRequest) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.instructions.as_str())
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.prompt.as_str())
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let response_format = ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                description: Some("Exercises, sets, reps and weights from a workout command".to_string()),
                name: request.schema_name.to_string(),
                schema: Some(request.schema.clone()),
                strict: Some(true),
            },
        };

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(request.temperature)
            .response_format(response_format)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Map the vendor error here; the core only knows `PortError`.
        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                PortError::Unexpected("Command parsing LLM returned no text content.".to_string())
            })
    }
}
