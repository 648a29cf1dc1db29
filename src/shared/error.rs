//! Shared Error Types
//!
//! Errors that can occur on both sides: in the dashboard client and in the
//! repair-status lookup service.
//!
//! # Error Categories
//!
//! - `ValidationError` - A field or requested change is not acceptable
//! - `NotFound` - A referenced record does not exist locally
//!
//! # Usage
//!
//! ```rust
//! use repairdesk::shared::error::SharedError;
//!
//! let error = SharedError::validation("technician_logs", "log entries cannot be removed");
//! ```
use thiserror::Error;

/// Shared error types that can occur in both client and server code
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// Record lookup failed
    #[error("Equipment record not found: {id}")]
    NotFound {
        /// Record id that was requested
        id: String,
    },
}

impl SharedError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }
}
