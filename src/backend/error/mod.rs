//! Backend Error Module
//!
//! # Architecture
//!
//! - **`types`** - Error type definitions and constructors
//! - **`conversion`** - `IntoResponse` and conversions from gateway errors

pub mod conversion;
pub mod types;

pub use types::LookupError;
