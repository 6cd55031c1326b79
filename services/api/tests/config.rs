use api_lib::config::{Config, ConfigError};
use serial_test::serial;
use std::time::Duration;

const VARS: &[&str] = &[
    "BIND_ADDRESS",
    "RUST_LOG",
    "CORS_ORIGIN",
    "GEMINI_API_KEY",
    "INFERENCE_BASE_URL",
    "INFERENCE_MODEL",
    "INFERENCE_TIMEOUT_SECS",
    "OPENAI_API_KEY",
    "SST_MODEL",
    "DATA_PATH",
    "SEED_SAMPLE_ROUTINE",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn defaults_apply_when_only_the_key_is_set() {
    clear_env();
    std::env::set_var("GEMINI_API_KEY", "test-key");

    let config = Config::from_env().unwrap();
    assert_eq!(config.bind_address.to_string(), "0.0.0.0:3000");
    assert_eq!(config.inference_model, "gemini-2.5-flash-lite");
    assert_eq!(config.inference_timeout, Duration::from_secs(15));
    assert_eq!(config.openai_api_key, None);
    assert_eq!(config.data_path, None);
    assert!(!config.seed_sample_routine);
}

#[test]
#[serial]
fn missing_inference_key_is_an_error() {
    clear_env();
    assert!(matches!(
        Config::from_env(),
        Err(ConfigError::MissingVar(var)) if var == "GEMINI_API_KEY"
    ));
}

#[test]
#[serial]
fn zero_timeout_is_rejected() {
    clear_env();
    std::env::set_var("GEMINI_API_KEY", "test-key");
    std::env::set_var("INFERENCE_TIMEOUT_SECS", "0");

    assert!(matches!(
        Config::from_env(),
        Err(ConfigError::InvalidValue(var, _)) if var == "INFERENCE_TIMEOUT_SECS"
    ));
    clear_env();
}

#[test]
#[serial]
fn optional_settings_are_read() {
    clear_env();
    std::env::set_var("GEMINI_API_KEY", "test-key");
    std::env::set_var("OPENAI_API_KEY", "sk-test");
    std::env::set_var("DATA_PATH", "/tmp/workouts.json");
    std::env::set_var("SEED_SAMPLE_ROUTINE", "true");

    let config = Config::from_env().unwrap();
    assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
    assert_eq!(
        config.data_path.as_deref(),
        Some(std::path::Path::new("/tmp/workouts.json"))
    );
    assert!(config.seed_sample_routine);
    clear_env();
}
