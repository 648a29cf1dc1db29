/**
 * Backend Error Types
 *
 * Errors the repair-status lookup can answer with. Each maps to one HTTP
 * status and one fixed public message; gateway details are logged, never
 * returned to the caller.
 */

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Serial number is required")]
    MissingSerial,

    #[error("Equipment not found")]
    NotFound,

    /// Gateway failure; the detail stays in the logs
    #[error("Internal server error")]
    Internal(String),
}

impl LookupError {
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal(detail.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            LookupError::MissingSerial => StatusCode::BAD_REQUEST,
            LookupError::NotFound => StatusCode::NOT_FOUND,
            LookupError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Public message
    pub fn message(&self) -> String {
        self.to_string()
    }
}
