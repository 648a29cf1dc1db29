//! # Network Monitor
//!
//! Watches connectivity to the hosted store and turns transitions into sync
//! work.
//!
//! ## Features
//!
//! - **Transition Handling**: coming online replays the queue and refetches;
//!   going offline only flips the engine's flag
//! - **Probing**: a background task polls a `ConnectivityProbe` and reports
//!   changes as events
//! - **Live Status**: current status is published on a `watch` channel

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::sync_state::NetworkStatus;
use crate::client::offline::{DrainReport, ReconciliationEngine};
use crate::shared::{MemoryGateway, PostgrestGateway};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    CameOnline,
    WentOffline,
}

/// Something that can tell whether the hosted store is reachable
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

#[async_trait]
impl ConnectivityProbe for PostgrestGateway {
    async fn is_reachable(&self) -> bool {
        self.ping().await
    }
}

#[async_trait]
impl ConnectivityProbe for MemoryGateway {
    async fn is_reachable(&self) -> bool {
        self.is_online().await
    }
}

pub struct NetworkMonitor {
    engine: Arc<ReconciliationEngine>,
    status_tx: watch::Sender<NetworkStatus>,
}

impl NetworkMonitor {
    pub fn new(engine: Arc<ReconciliationEngine>, initial: NetworkStatus) -> Self {
        let (status_tx, _) = watch::channel(initial);
        Self { engine, status_tx }
    }

    pub fn status(&self) -> NetworkStatus {
        *self.status_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<NetworkStatus> {
        self.status_tx.subscribe()
    }

    /// Initial sync, run once at start-up when the engine believes it is online
    pub async fn start(&self) -> Option<DrainReport> {
        let online = self.engine.is_online().await;
        self.status_tx.send_replace(NetworkStatus::from_online(online));
        if online {
            Some(self.engine.sync_now().await)
        } else {
            None
        }
    }

    /// React to a connectivity transition
    pub async fn handle(&self, event: ConnectivityEvent) -> Option<DrainReport> {
        match event {
            ConnectivityEvent::CameOnline => {
                tracing::info!("Connection restored, syncing");
                self.engine.set_online(true).await;
                self.status_tx.send_replace(NetworkStatus::Online);
                Some(self.engine.sync_now().await)
            }
            ConnectivityEvent::WentOffline => {
                tracing::warn!("Connection lost, writes will be queued");
                self.engine.set_online(false).await;
                self.status_tx.send_replace(NetworkStatus::Offline);
                None
            }
        }
    }

    /// Poll `probe` every `interval` until `shutdown` flips or its sender drops
    pub fn spawn_probe(
        self: &Arc<Self>,
        probe: Arc<dyn ConnectivityProbe>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let monitor = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let reachable = probe.is_reachable().await;
                        match (monitor.status(), reachable) {
                            (NetworkStatus::Offline, true) => {
                                monitor.handle(ConnectivityEvent::CameOnline).await;
                            }
                            (NetworkStatus::Online, false) => {
                                monitor.handle(ConnectivityEvent::WentOffline).await;
                            }
                            _ => {}
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::debug!("Connectivity probe stopped");
        })
    }
}
