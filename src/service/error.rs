use axum::http::StatusCode;
use thiserror::Error;

use crate::error::HttpError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Permission(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Precondition(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Mail error: {0}")]
    Mail(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ServiceError::Validation(msg.into())
    }

    pub fn permission(msg: impl Into<String>) -> Self {
        ServiceError::Permission(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ServiceError::NotFound(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        ServiceError::InvalidState(msg.into())
    }

    /// Stable identifier of the failure class, safe to match on by clients.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation_error",
            ServiceError::Permission(_) => "permission_error",
            ServiceError::NotFound(_) => "not_found_error",
            ServiceError::Duplicate(_) => "duplicate_error",
            ServiceError::InvalidState(_) => "invalid_state_error",
            ServiceError::InvalidTransition(_) => "invalid_transition_error",
            ServiceError::Conflict(_) => "conflict_error",
            ServiceError::Precondition(_) => "precondition_error",
            ServiceError::Database(_)
            | ServiceError::Storage(_)
            | ServiceError::Mail(_)
            | ServiceError::Other(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) | ServiceError::Precondition(_) => StatusCode::BAD_REQUEST,
            ServiceError::Permission(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Duplicate(_)
            | ServiceError::InvalidState(_)
            | ServiceError::InvalidTransition(_)
            | ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Database(_)
            | ServiceError::Storage(_)
            | ServiceError::Mail(_)
            | ServiceError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();
        let kind = error.kind();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("{}", error);
        }

        HttpError::new(error.to_string(), status, kind)
    }
}

impl From<String> for ServiceError {
    fn from(err: String) -> Self {
        ServiceError::Other(err)
    }
}
