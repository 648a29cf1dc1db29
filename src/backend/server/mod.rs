//! Server Module
//!
//! - **`state`** - Application state shared by the handlers
//! - **`init`** - State creation and router assembly

pub mod init;
pub mod state;

pub use init::{create_app, create_router, server_port};
pub use state::AppState;
