//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{JsonFileRepository, MemoryRepository, OpenAiCommandAdapter, OpenAiSstAdapter},
    config::Config,
    error::ApiError,
    web::{rest::ApiDoc, router, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use workout_tracker_core::{
    interpreter::CommandInterpreter,
    ports::{SpeechToTextService, WorkoutRepository},
};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Open Storage ---
    let repository: Arc<dyn WorkoutRepository> = match &config.data_path {
        Some(path) => {
            info!("Persisting workout data to {}", path.display());
            Arc::new(JsonFileRepository::new(path.clone()))
        }
        None => {
            warn!("DATA_PATH is not set. Workout data will be lost on exit.");
            Arc::new(MemoryRepository::new())
        }
    };

    // --- 3. Initialize Service Adapters ---
    let inference_config = OpenAIConfig::new()
        .with_api_base(config.inference_base_url.clone())
        .with_api_key(config.gemini_api_key.clone());
    let command_adapter = Arc::new(OpenAiCommandAdapter::new(
        Client::with_config(inference_config),
        config.inference_model.clone(),
    ));
    let interpreter = CommandInterpreter::new(command_adapter, config.inference_timeout);

    let sst_adapter: Option<Arc<dyn SpeechToTextService>> = match &config.openai_api_key {
        Some(key) => {
            let openai_client = Client::with_config(OpenAIConfig::new().with_api_key(key.clone()));
            Some(Arc::new(OpenAiSstAdapter::new(
                openai_client,
                config.sst_model.clone(),
            )))
        }
        None => {
            info!("OPENAI_API_KEY is not set. Voice commands are disabled.");
            None
        }
    };

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(
        AppState::load(
            repository,
            interpreter,
            sst_adapter,
            config.seed_sample_routine,
        )
        .await?,
    );

    let cors_origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS_ORIGIN '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    // --- 5. Create the Web Router ---
    let app = Router::new()
        .merge(router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
