use axum::http::StatusCode;
use thiserror::Error;

/// Failures reported by store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A required field was missing; nothing was changed.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("no user selected")]
    NoCurrentUser,
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn user_not_found(id: &str) -> Self {
        Self::NotFound {
            kind: "user",
            id: id.to_string(),
        }
    }
}

/// Storage read/write failures. Never aborts a store operation.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(_) => Self::bad_request(err.to_string()),
            StoreError::NotFound { .. } | StoreError::NoCurrentUser => {
                Self::not_found(err.to_string())
            }
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
