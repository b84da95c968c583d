// src/error.rs

use thiserror::Error;

/// Result type for board operations
pub type Result<T> = std::result::Result<T, BoardError>;

/// Errors raised by the task store, the persistence collaborators and the
/// board service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoardError {
    /// Malformed task on create/update
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// Mutation targets a task that no longer exists
    #[error("task not found: {id}")]
    NotFound { id: String },

    /// Status value outside the fixed status set
    #[error("invalid status transition target: {value}")]
    InvalidTransition { value: String },

    /// The remote task storage rejected or failed a call
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl BoardError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn invalid_transition(value: impl Into<String>) -> Self {
        Self::InvalidTransition {
            value: value.into(),
        }
    }
}

impl From<mongodb::error::Error> for BoardError {
    fn from(e: mongodb::error::Error) -> Self {
        BoardError::Persistence(e.to_string())
    }
}

/// Startup configuration problems. These abort the server.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {message}")]
    InvalidVar { var: &'static str, message: String },
}
