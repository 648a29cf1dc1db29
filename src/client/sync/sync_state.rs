//! # Sync State
//!
//! Snapshot of connectivity and queue state for display.

use chrono::{DateTime, Utc};

use crate::client::offline::DrainReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    Online,
    Offline,
}

impl NetworkStatus {
    pub fn is_online(self) -> bool {
        self == NetworkStatus::Online
    }

    pub fn from_online(online: bool) -> Self {
        if online {
            NetworkStatus::Online
        } else {
            NetworkStatus::Offline
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncStatus {
    pub network: NetworkStatus,
    pub pending_tasks: usize,
    pub last_drain: Option<DrainReport>,
    pub last_refresh: Option<DateTime<Utc>>,
    /// Most recent user-facing notice
    pub notice: Option<String>,
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self {
            network: NetworkStatus::Online,
            pending_tasks: 0,
            last_drain: None,
            last_refresh: None,
            notice: None,
        }
    }
}
