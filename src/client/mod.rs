//! # Dashboard Client
//!
//! Headless core of the repair-tracking dashboard: the offline sync layer,
//! local persistence, connectivity monitoring, role gate, and dashboard
//! queries, tied together by [`DeskApp`].
//!
//! ## Module Organization
//!
//! - `app`: controller and background tasks
//! - `auth`: Admin/Attachee sign-in
//! - `config`: environment-backed configuration
//! - `dashboard`: stats, filters, overstay alerts
//! - `error`: controller error type
//! - `local_db`: SQLite key-value store
//! - `offline`: sync queue, cache, optimistic updates, reconciliation
//! - `sync`: connectivity monitor

pub mod app;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod local_db;
pub mod offline;
pub mod sync;

pub use app::{DeskApp, SyncContext};
pub use auth::{AuthError, UserRole};
pub use config::Config;
pub use error::{AppError, AppResult};
