// crates/backend-lib/src/error.rs

//! Central error type.
use crate::validation::ValidationError;
use thiserror::Error;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Duplicate key in {collection}: {field}")]
    DuplicateKey {
        collection: String,
        field: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid session")]
    InvalidSession,

    #[error("Session token reused for {username}, all sessions revoked")]
    SessionTheft { username: String },

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VAL_001",
            AppError::DuplicateKey { .. } => "DB_001",
            AppError::NotFound(_) => "NF_001",
            AppError::InvalidCredentials => "AUTH_001",
            AppError::InvalidSession => "AUTH_002",
            AppError::SessionTheft { .. } => "AUTH_003",
            AppError::PasswordHash(_) => "AUTH_004",
            AppError::Internal(_) => "INT_001",
            AppError::Io(_) => "IO_001",
            AppError::Json(_) => "JSON_001",
        }
    }

    /// Get a sanitized message suitable for showing to end users
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Validation(e) => e.to_string(),
            AppError::DuplicateKey { field, .. } => format!("That {field} is already taken"),
            AppError::NotFound(_) => "Resource not found".to_string(),
            AppError::InvalidCredentials => "Authentication failed".to_string(),
            AppError::InvalidSession | AppError::SessionTheft { .. } => {
                "Please log in again".to_string()
            },
            AppError::PasswordHash(_)
            | AppError::Internal(_)
            | AppError::Io(_)
            | AppError::Json(_) => "An internal error occurred".to_string(),
        }
    }

    /// True for errors caused by the caller's input rather than the backend
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::DuplicateKey { .. }
                | AppError::NotFound(_)
                | AppError::InvalidCredentials
                | AppError::InvalidSession
                | AppError::SessionTheft { .. }
        )
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}
