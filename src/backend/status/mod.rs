//! Repair status lookup by serial number

pub mod handlers;

pub use handlers::{get_repair_status, missing_serial};
