use thiserror::Error;

/// Failures surfaced by the story service and everything layered on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("not authorized: {0}")]
    Auth(String),

    #[error("rejected by the service: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl ApiError {
    /// Map a non-success HTTP status to the error taxonomy.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => ApiError::Auth(message),
            404 => ApiError::NotFound(message),
            400 | 409 | 422 => ApiError::Validation(message),
            _ => ApiError::Api { status, message },
        }
    }
}

/// Failures of a persisted key-value backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
