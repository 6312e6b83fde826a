//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid trade file: {0}")]
    Trades(String),

    #[error("Invalid session script: {0}")]
    Script(String),

    #[error("Engine error: {0}")]
    Engine(#[from] tradelog_engine::EngineError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] tradelog_telemetry::TelemetryError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
