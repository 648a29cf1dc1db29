//! # Remote Data Gateway
//!
//! The row-oriented interface to the hosted `equipment` table. The sync layer
//! and the lookup service only talk to the store through [`EquipmentGateway`].
//!
//! ## Implementations
//!
//! - `postgrest.rs`: HTTP client for the hosted PostgREST API
//! - `memory.rs`: in-process table with switchable connectivity
//!
//! ## Failure Classes
//!
//! Every failure is either *transient* (retrying later may work) or
//! *permanent* (retrying will never work). Replay keeps transient failures
//! queued and drops permanent ones; see [`GatewayError::is_permanent`].

pub mod memory;
pub mod postgrest;

pub use memory::MemoryGateway;
pub use postgrest::PostgrestGateway;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::shared::equipment::{EquipmentRow, FinalCondition, TechnicianLog};

/// Postgres error code for unique constraint violations
pub const UNIQUE_VIOLATION: &str = "23505";

/// Operations the sync layer needs from the hosted store
#[async_trait]
pub trait EquipmentGateway: Send + Sync {
    /// All rows, newest `received_date` first
    async fn select_all(&self) -> Result<Vec<EquipmentRow>, GatewayError>;

    /// Insert one row; an existing primary key yields [`GatewayError::DuplicateKey`]
    async fn insert(&self, row: &EquipmentRow) -> Result<(), GatewayError>;

    /// Overwrite the technician log and final condition of a row
    async fn update_job_details(
        &self,
        id: &str,
        technician_logs: &[TechnicianLog],
        final_condition: Option<FinalCondition>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), GatewayError>;

    /// Set status to Fixed with the given completion time
    async fn mark_fixed(
        &self,
        id: &str,
        fixed_date: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), GatewayError>;

    /// First row with this serial number
    async fn find_by_serial(&self, serial_number: &str) -> Result<Option<EquipmentRow>, GatewayError>;
}

/// Errors reported by a gateway
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Connection refused, DNS failure, reset, offline
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    /// 5xx, or a 4xx that may clear up on its own (401, 403, 408, 429)
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The row already exists
    #[error("duplicate key: {message}")]
    DuplicateKey { message: String },

    /// The request itself is unacceptable and will never succeed
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Error body returned by PostgREST
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PostgrestErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

impl GatewayError {
    /// Whether retrying the same request can never succeed
    pub fn is_permanent(&self) -> bool {
        matches!(self, GatewayError::DuplicateKey { .. } | GatewayError::Rejected { .. })
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, GatewayError::DuplicateKey { .. })
    }

    /// Classify a non-success HTTP response
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: PostgrestErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = parsed
            .message
            .or(parsed.details)
            .unwrap_or_else(|| body.trim().to_string());

        let uncoded_conflict = status == 409 && parsed.code.is_none();
        if uncoded_conflict || parsed.code.as_deref() == Some(UNIQUE_VIOLATION) {
            return GatewayError::DuplicateKey { message };
        }

        match status {
            401 | 403 | 408 | 429 => GatewayError::Server { status, message },
            400..=499 => GatewayError::Rejected { status, message },
            _ => GatewayError::Server { status, message },
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Network(err.to_string())
        }
    }
}
