//! Backend Module
//!
//! Server-side code for the public repair-status lookup. It answers
//! `GET /api/external/repair-status/{serial}` from the hosted `equipment`
//! table so that a device owner can check on a repair without signing in.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs      - Module exports and documentation
//! ├── server/     - Application state and router assembly
//! ├── status/     - Lookup handlers
//! └── error/      - Lookup errors and their HTTP responses
//! ```
//!
//! # Responses
//!
//! - `200` with `{jobId, status, inRepair, srNumber, receivedDate}`
//! - `400` `{"error":"Serial number is required"}`
//! - `404` `{"error":"Equipment not found"}`
//! - `500` `{"error":"Internal server error"}`

/// Server setup and state
pub mod server;

/// Repair status handlers
pub mod status;

/// Backend error types
pub mod error;

pub use error::LookupError;
pub use server::{create_app, AppState};
