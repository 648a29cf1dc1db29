//! # Connectivity Sync
//!
//! Detects when the hosted store becomes reachable again and triggers the
//! reconciliation engine.
//!
//! ## Key Components
//!
//! - `network_monitor.rs`: transition handling and the background probe
//! - `sync_state.rs`: status snapshot types

pub mod network_monitor;
pub mod sync_state;

pub use network_monitor::{ConnectivityEvent, ConnectivityProbe, NetworkMonitor};
pub use sync_state::{NetworkStatus, SyncStatus};
