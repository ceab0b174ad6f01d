use crate::types::SeriesKey;

/// Errors surfaced by ingestion, storage and configuration.
///
/// Analytics never return these: thin history and missing fields resolve to
/// documented neutral values instead.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {}", .0.join(", "))]
    InvalidConfig(Vec<String>),

    #[error("Fetch failed for {series}: {reason}")]
    Fetch { series: SeriesKey, reason: String },
}

pub type Result<T> = std::result::Result<T, MonitorError>;
