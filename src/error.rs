use thiserror::Error;

use crate::feed::FetchError;

/// Common error type for newsflow.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database error (rusqlite, surfaced through the async connection).
    #[error("database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Feed retrieval/parse error.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Validation error for caller input (duplicate URL, duplicate name).
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Claude API error.
    #[error("Claude API error: {0}")]
    ClaudeApi(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse error in the config file.
    #[error("configuration parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Database(tokio_rusqlite::Error::Rusqlite(e))
    }
}

/// Result type alias for newsflow operations.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display() {
        let err = AppError::Validation("source URL already exists".to_string());
        assert_eq!(err.to_string(), "validation error: source URL already exists");
    }

    #[test]
    fn fetch_error_is_transparent() {
        let err: AppError = FetchError::Http(503).into();
        assert_eq!(err.to_string(), "HTTP status 503");
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AppError = io_err.into();
        assert!(matches!(err, AppError::Io(_)));
    }
}
