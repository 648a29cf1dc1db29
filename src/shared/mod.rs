//! Shared Module
//!
//! Types used by both the dashboard client and the repair-status lookup
//! service: the equipment domain model, the gateway to the hosted store, the
//! validated configuration, and shared errors.

/// Equipment records, raw rows, and their mapping
pub mod equipment;

/// Public repair status payload
pub mod status;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Access to the hosted `equipment` table
pub mod gateway;

/// Re-export commonly used types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use equipment::{
    EquipmentRecord, EquipmentRow, EquipmentStatus, FinalCondition, NewEquipment, Priority,
    TechnicianLog,
};
pub use error::SharedError;
pub use gateway::{EquipmentGateway, GatewayError, MemoryGateway, PostgrestGateway};
pub use status::RepairStatus;
