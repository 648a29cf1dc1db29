//! # Dashboard Controller
//!
//! `DeskApp` owns the sync context (engine, queue, cache, monitor), the
//! signed-in role, and the background tasks that keep the collection fresh.
//!
//! ## Event Loop
//!
//! One task listens to the engine's `SyncEvent`s. A `RefreshRequested`
//! triggers a refetch; the other events only update the status snapshot.
//! A second task probes connectivity when started with a probe.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use repairdesk::client::{Config, DeskApp, UserRole};
//!
//! # async fn example() -> repairdesk::client::AppResult<()> {
//! let config = Config::from_env()?;
//! let app = DeskApp::start(&config).await?;
//! app.login(UserRole::Attachee, "").await?;
//! println!("{:?}", app.stats().await);
//! app.shutdown().await;
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::client::auth::{self, UserRole};
use crate::client::config::Config;
use crate::client::dashboard::{self, DashboardStats, ItemFilter};
use crate::client::error::{AppError, AppResult};
use crate::client::local_db::{KeyValueStore, LocalDatabase};
use crate::client::offline::{
    DrainReport, FetchOutcome, MutationOutcome, ReconciliationEngine, SyncEvent,
};
use crate::client::sync::{ConnectivityProbe, NetworkMonitor, NetworkStatus, SyncStatus};
use crate::shared::{
    AppConfig, EquipmentGateway, EquipmentRecord, FinalCondition, NewEquipment, PostgrestGateway,
    TechnicianLog,
};

/// Everything the offline sync layer needs, owned by the controller
pub struct SyncContext {
    pub engine: Arc<ReconciliationEngine>,
    pub monitor: Arc<NetworkMonitor>,
}

#[derive(Debug, Default)]
struct StatusLog {
    last_drain: Option<DrainReport>,
    last_refresh: Option<DateTime<Utc>>,
    notice: Option<String>,
}

pub struct DeskApp {
    config: AppConfig,
    context: SyncContext,
    role: RwLock<Option<UserRole>>,
    status: Arc<RwLock<StatusLog>>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl DeskApp {
    /// Connect to the hosted store and the local database, load, and start
    /// the background tasks
    pub async fn start(config: &Config) -> AppResult<Self> {
        let gateway = Arc::new(PostgrestGateway::new(config.app())?);
        let store = Arc::new(LocalDatabase::open(&config.db_path()).await?);

        let app = Self::with_parts(config.app().clone(), gateway.clone(), store).await;
        app.spawn_probe(gateway, config.probe_interval()).await;
        app.run().await;

        tracing::info!("Dashboard started against {}", config.supabase_url());
        Ok(app)
    }

    /// Controller over the given gateway and store, with the event loop running
    ///
    /// Nothing is fetched until [`DeskApp::run`].
    pub async fn with_parts(
        config: AppConfig,
        gateway: Arc<dyn EquipmentGateway>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let engine = Arc::new(ReconciliationEngine::open(gateway, store).await);
        let monitor = Arc::new(NetworkMonitor::new(engine.clone(), NetworkStatus::Online));
        let (shutdown_tx, _) = watch::channel(false);

        let app = Self {
            config,
            context: SyncContext { engine, monitor },
            role: RwLock::new(None),
            status: Arc::new(RwLock::new(StatusLog::default())),
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
        };

        let handle = Self::spawn_event_loop(
            app.context.engine.clone(),
            app.status.clone(),
            app.shutdown_tx.subscribe(),
        );
        app.tasks.lock().await.push(handle);
        app
    }

    /// First load, then the initial sync
    pub async fn run(&self) {
        match self.context.engine.fetch_items(true).await {
            FetchOutcome::Fresh(n) => tracing::info!("Loaded {} equipment records", n),
            FetchOutcome::Cached(n) => tracing::warn!("Showing {} cached records", n),
            FetchOutcome::Stale => tracing::warn!("No equipment records available"),
        }
        self.context.monitor.start().await;
    }

    /// Poll `probe` in the background until shutdown
    pub async fn spawn_probe(&self, probe: Arc<dyn ConnectivityProbe>, interval: Duration) {
        let handle = self
            .context
            .monitor
            .spawn_probe(probe, interval, self.shutdown_tx.subscribe());
        self.tasks.lock().await.push(handle);
    }

    fn spawn_event_loop(
        engine: Arc<ReconciliationEngine>,
        status: Arc<RwLock<StatusLog>>,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let mut events = engine.subscribe();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = events.recv() => match event {
                        Ok(SyncEvent::RefreshRequested) => {
                            engine.fetch_items(false).await;
                        }
                        Ok(SyncEvent::ItemsRefreshed { .. }) => {
                            let mut status = status.write().await;
                            status.last_refresh = Some(Utc::now());
                            status.notice = None;
                        }
                        Ok(SyncEvent::Drained(report)) => {
                            status.write().await.last_drain = Some(report);
                        }
                        Ok(SyncEvent::Notice(message)) => {
                            tracing::warn!("{}", message);
                            status.write().await.notice = Some(message);
                        }
                        Ok(SyncEvent::Queued { .. }) | Ok(SyncEvent::CacheFallback { .. }) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!("Event loop skipped {} sync events", skipped);
                        }
                        Err(RecvError::Closed) => break,
                    },
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("Sync event loop stopped");
        })
    }

    pub fn context(&self) -> &SyncContext {
        &self.context
    }

    pub async fn login(&self, role: UserRole, password: &str) -> AppResult<UserRole> {
        let role = auth::login(role, password, &self.config)?;
        *self.role.write().await = Some(role);
        tracing::info!("Signed in as {}", role);
        Ok(role)
    }

    pub async fn logout(&self) {
        if let Some(role) = self.role.write().await.take() {
            tracing::info!("Signed out {}", role);
        }
    }

    pub async fn current_role(&self) -> Option<UserRole> {
        *self.role.read().await
    }

    async fn require_role(&self) -> AppResult<UserRole> {
        self.current_role().await.ok_or(AppError::NotLoggedIn)
    }

    pub async fn add_item(&self, draft: NewEquipment) -> AppResult<(EquipmentRecord, MutationOutcome)> {
        let role = self.require_role().await?;
        Ok(self.context.engine.add_item(draft, role.as_str()).await)
    }

    pub async fn update_job_details(
        &self,
        id: &str,
        technician_logs: Vec<TechnicianLog>,
        final_condition: Option<FinalCondition>,
    ) -> AppResult<MutationOutcome> {
        self.require_role().await?;
        Ok(self
            .context
            .engine
            .update_job_details(id, technician_logs, final_condition)
            .await?)
    }

    pub async fn log_repair(&self, id: &str, technician: &str, action: &str) -> AppResult<MutationOutcome> {
        self.require_role().await?;
        Ok(self.context.engine.log_repair(id, technician, action).await?)
    }

    pub async fn mark_fixed(&self, id: &str) -> AppResult<MutationOutcome> {
        self.require_role().await?;
        Ok(self.context.engine.mark_fixed(id).await?)
    }

    /// Manual refresh
    pub async fn refresh(&self) -> FetchOutcome {
        self.context.engine.fetch_items(false).await
    }

    pub async fn items(&self) -> Vec<EquipmentRecord> {
        self.context.engine.items().await
    }

    pub async fn stats(&self) -> DashboardStats {
        dashboard::stats(&self.items().await)
    }

    pub async fn filtered(&self, filter: &ItemFilter) -> Vec<EquipmentRecord> {
        let items = self.items().await;
        dashboard::filter_items(&items, filter)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn overstay_alerts(&self) -> Vec<EquipmentRecord> {
        let items = self.items().await;
        dashboard::overstay_alerts(&items, Utc::now())
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn status(&self) -> SyncStatus {
        let log = self.status.read().await;
        SyncStatus {
            network: self.context.monitor.status(),
            pending_tasks: self.context.engine.queue().len().await,
            last_drain: log.last_drain,
            last_refresh: log.last_refresh,
            notice: log.notice.clone(),
        }
    }

    /// Stop the background tasks between events; in-flight requests finish
    pub async fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
        let handles: Vec<_> = self.tasks.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Background task failed: {}", e);
            }
        }
        tracing::info!("Dashboard stopped");
    }
}
