//! # State Reconciliation
//!
//! Keeps the displayed equipment collection consistent with the hosted store
//! across offline periods.
//!
//! ## Features
//!
//! - **Optimistic Mutations**: every user action is applied locally first
//! - **Single Remote Attempt**: a write is tried once when online and
//!   nothing is queued, otherwise it goes to the back of the sync queue
//! - **Fetch With Fallback**: failed fetches fall back to the cached snapshot
//!   and never clear what is already on screen
//! - **Events**: a broadcast channel reports refresh requests, queued writes,
//!   drains, and user-facing notices
//!
//! ## Usage
//!
//! ```rust,no_run
//! use repairdesk::client::local_db::MemoryStore;
//! use repairdesk::client::offline::ReconciliationEngine;
//! use repairdesk::shared::{MemoryGateway, NewEquipment};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let engine = ReconciliationEngine::open(
//!     Arc::new(MemoryGateway::new()),
//!     Arc::new(MemoryStore::new()),
//! )
//! .await;
//!
//! engine.fetch_items(true).await;
//! let (record, outcome) = engine.add_item(NewEquipment::default(), "Admin").await;
//! println!("{} -> {:?}", record.job_card_no, outcome);
//! # }
//! ```

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use super::cache::ItemCache;
use super::optimistic::{reduce, ItemAction};
use super::queue::{ApplyOutcome, DrainReport, SyncAction, SyncQueue};
use crate::client::local_db::KeyValueStore;
use crate::shared::equipment::{extends_logs, job_card_number};
use crate::shared::{
    EquipmentGateway, EquipmentRecord, EquipmentRow, FinalCondition, GatewayError, NewEquipment,
    SharedError, TechnicianLog,
};

/// Shown when a refresh falls back to local data
pub const FETCH_FAILED_NOTICE: &str =
    "Failed to fetch records from the database. Please check your internet connection.";

const EVENT_CAPACITY: usize = 64;

/// Something the controller or the UI should know about
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A write was confirmed; canonical data should be fetched
    RefreshRequested,
    /// A write was parked in the sync queue
    Queued { task_id: Uuid, action: &'static str },
    /// A fetch succeeded
    ItemsRefreshed { count: usize },
    /// A fetch failed and the cached snapshot is shown
    CacheFallback { count: usize },
    /// The queue was replayed
    Drained(DrainReport),
    /// Message for the user
    Notice(String),
}

/// What happened to a mutation after its optimistic apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The hosted store accepted the write
    Confirmed,
    /// The write is waiting in the sync queue
    Queued(Uuid),
    /// The hosted store refused the write outright
    Rejected(String),
}

/// Where the collection came from after a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Fresh(usize),
    Cached(usize),
    /// Nothing usable; previous items kept
    Stale,
}

/// Owns the displayed collection and coordinates gateway, queue, and cache
pub struct ReconciliationEngine {
    gateway: Arc<dyn EquipmentGateway>,
    queue: Arc<SyncQueue>,
    cache: ItemCache,
    items: RwLock<Vec<EquipmentRecord>>,
    is_online: RwLock<bool>,
    events: broadcast::Sender<SyncEvent>,
}

impl std::fmt::Debug for ReconciliationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationEngine").finish_non_exhaustive()
    }
}

impl ReconciliationEngine {
    pub fn new(gateway: Arc<dyn EquipmentGateway>, queue: Arc<SyncQueue>, cache: ItemCache) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            gateway,
            queue,
            cache,
            items: RwLock::new(Vec::new()),
            is_online: RwLock::new(true),
            events,
        }
    }

    /// Engine with the queue restored from `store` and the cache kept there
    pub async fn open(gateway: Arc<dyn EquipmentGateway>, store: Arc<dyn KeyValueStore>) -> Self {
        let queue = Arc::new(SyncQueue::load(store.clone()).await);
        Self::new(gateway, queue, ItemCache::new(store))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub fn queue(&self) -> &Arc<SyncQueue> {
        &self.queue
    }

    pub async fn set_online(&self, online: bool) {
        *self.is_online.write().await = online;
    }

    pub async fn is_online(&self) -> bool {
        *self.is_online.read().await
    }

    /// Snapshot of the displayed collection
    pub async fn items(&self) -> Vec<EquipmentRecord> {
        self.items.read().await.clone()
    }

    pub async fn find(&self, id: &str) -> Option<EquipmentRecord> {
        self.items.read().await.iter().find(|i| i.id == id).cloned()
    }

    /// Log a newly received device
    ///
    /// The job card number is derived from the current item count, so two
    /// sessions creating jobs at once can hand out the same number.
    pub async fn add_item(
        &self,
        draft: NewEquipment,
        logged_by: &str,
    ) -> (EquipmentRecord, MutationOutcome) {
        let now = Utc::now();
        let record = {
            let mut items = self.items.write().await;
            let job_card_no = job_card_number(items.len(), now);
            let record = EquipmentRecord::new_pending(draft, job_card_no, logged_by, now);
            *items = reduce(&items, &ItemAction::Add(record.clone()));
            record
        };

        tracing::info!("Logged {} as {}", record.serial_number, record.job_card_no);
        let outcome = self
            .submit(SyncAction::Add {
                row: EquipmentRow::from(&record),
            })
            .await;
        (record, outcome)
    }

    /// Replace a job's technician log and final condition
    ///
    /// The new log must keep every existing entry in order.
    pub async fn update_job_details(
        &self,
        id: &str,
        technician_logs: Vec<TechnicianLog>,
        final_condition: Option<FinalCondition>,
    ) -> Result<MutationOutcome, SharedError> {
        self.update_job_with(id, |current| {
            if !extends_logs(&current.technician_logs, &technician_logs) {
                return Err(SharedError::validation(
                    "technician_logs",
                    "existing log entries cannot be removed or changed",
                ));
            }
            Ok((technician_logs, final_condition))
        })
        .await
    }

    /// Append one technician log entry, keeping the final condition
    pub async fn log_repair(
        &self,
        id: &str,
        technician: &str,
        action: &str,
    ) -> Result<MutationOutcome, SharedError> {
        let action = action.trim();
        if action.is_empty() {
            if self.find(id).await.is_none() {
                return Err(SharedError::not_found(id));
            }
            return Err(SharedError::validation("action", "repair note is empty"));
        }

        let entry = TechnicianLog::new(technician, action, Utc::now());
        self.update_job_with(id, move |current| {
            let mut logs = current.technician_logs.clone();
            logs.push(entry);
            Ok((logs, current.final_condition))
        })
        .await
    }

    /// Compute a job's new log from its current state and apply it locally
    ///
    /// `build` runs under the collection write lock, so concurrent appends
    /// to the same job see each other.
    async fn update_job_with<F>(&self, id: &str, build: F) -> Result<MutationOutcome, SharedError>
    where
        F: FnOnce(&EquipmentRecord) -> Result<(Vec<TechnicianLog>, Option<FinalCondition>), SharedError>,
    {
        let (technician_logs, final_condition) = {
            let mut items = self.items.write().await;
            let current = items
                .iter()
                .find(|i| i.id == id)
                .ok_or_else(|| SharedError::not_found(id))?;
            let (technician_logs, final_condition) = build(current)?;
            *items = reduce(
                &items,
                &ItemAction::UpdateJob {
                    id: id.to_string(),
                    technician_logs: technician_logs.clone(),
                    final_condition,
                },
            );
            (technician_logs, final_condition)
        };

        Ok(self
            .submit(SyncAction::Update {
                id: id.to_string(),
                technician_logs,
                final_condition,
                updated_at: Utc::now(),
            })
            .await)
    }

    /// Move a job to Fixed
    ///
    /// A job that is already Fixed keeps its completion date; the write is
    /// still sent so the hosted store re-confirms it.
    pub async fn mark_fixed(&self, id: &str) -> Result<MutationOutcome, SharedError> {
        let now = Utc::now();
        let fixed_date = {
            let mut items = self.items.write().await;
            let current = items
                .iter()
                .find(|i| i.id == id)
                .ok_or_else(|| SharedError::not_found(id))?;
            let fixed_date = current.fixed_date.unwrap_or(now);
            *items = reduce(
                &items,
                &ItemAction::MarkFixed {
                    id: id.to_string(),
                    fixed_date,
                },
            );
            fixed_date
        };

        Ok(self
            .submit(SyncAction::Fix {
                id: id.to_string(),
                fixed_date,
                updated_at: now,
            })
            .await)
    }

    /// Reload the collection from the hosted store
    ///
    /// Outside the first load, pending writes are replayed first so they land
    /// before the read.
    pub async fn fetch_items(&self, is_first_load: bool) -> FetchOutcome {
        if !is_first_load && self.is_online().await && !self.queue.is_empty().await {
            self.drain_queue().await;
        }
        self.refetch(!is_first_load).await
    }

    /// Replay the queue, then reload
    pub async fn sync_now(&self) -> DrainReport {
        let report = self.drain_queue().await;
        self.refetch(true).await;
        report
    }

    /// Replay queued writes in order
    pub async fn drain_queue(&self) -> DrainReport {
        let gateway = self.gateway.clone();
        let report = self
            .queue
            .drain(move |task| {
                let gateway = gateway.clone();
                async move {
                    let outcome =
                        ApplyOutcome::from_result(apply_action(gateway.as_ref(), &task.action).await);
                    if outcome == ApplyOutcome::PermanentFailure {
                        tracing::warn!("Sync task {} can never be applied", task.id);
                    }
                    outcome
                }
            })
            .await;

        if report.applied + report.dropped > 0 {
            self.emit(SyncEvent::Drained(report));
        }
        report
    }

    async fn refetch(&self, notify: bool) -> FetchOutcome {
        match self.gateway.select_all().await {
            Ok(rows) => {
                let now = Utc::now();
                let records: Vec<EquipmentRecord> = rows
                    .into_iter()
                    .filter_map(|row| match EquipmentRecord::from_row(row, now) {
                        Ok(record) => Some(record),
                        Err(e) => {
                            tracing::warn!("Skipping equipment row: {}", e);
                            None
                        }
                    })
                    .collect();

                if let Err(e) = self.cache.save(&records).await {
                    tracing::error!("Failed to update item cache: {}", e);
                }

                let count = records.len();
                {
                    let mut items = self.items.write().await;
                    *items = reduce(&items, &ItemAction::Replace(records));
                }
                tracing::debug!("Fetched {} equipment records", count);
                self.emit(SyncEvent::ItemsRefreshed { count });
                FetchOutcome::Fresh(count)
            }
            Err(e) => {
                tracing::warn!("Equipment fetch failed: {}", e);

                let outcome = match self.cache.load().await {
                    Some(cached) => {
                        let count = cached.len();
                        let mut items = self.items.write().await;
                        *items = reduce(&items, &ItemAction::Replace(cached));
                        drop(items);
                        self.emit(SyncEvent::CacheFallback { count });
                        FetchOutcome::Cached(count)
                    }
                    None => FetchOutcome::Stale,
                };

                if notify {
                    self.emit(SyncEvent::Notice(FETCH_FAILED_NOTICE.to_string()));
                }
                outcome
            }
        }
    }

    /// Send a write, or park it behind earlier writes still waiting to replay
    ///
    /// While the queue holds tasks a direct write could overtake them (an
    /// update landing before the insert that creates its row), so the action
    /// joins the queue and the queue is replayed in order.
    async fn submit(&self, action: SyncAction) -> MutationOutcome {
        let online = self.is_online().await;
        if online && !self.queue.is_empty().await {
            let task_id = self.park(action).await;
            let report = self.drain_queue().await;
            if report.remaining == 0 {
                self.emit(SyncEvent::RefreshRequested);
            }
            return MutationOutcome::Queued(task_id);
        }

        if online {
            match apply_action(self.gateway.as_ref(), &action).await {
                Ok(()) => {
                    self.emit(SyncEvent::RefreshRequested);
                    return MutationOutcome::Confirmed;
                }
                Err(e) if e.is_duplicate_key() => {
                    self.emit(SyncEvent::RefreshRequested);
                    return MutationOutcome::Confirmed;
                }
                Err(e) if e.is_permanent() => {
                    tracing::error!("{} rejected by server: {}", action.label(), e);
                    self.emit(SyncEvent::Notice(format!("Change was rejected: {}", e)));
                    self.emit(SyncEvent::RefreshRequested);
                    return MutationOutcome::Rejected(e.to_string());
                }
                Err(e) => {
                    tracing::warn!("{} failed, queueing for retry: {}", action.label(), e);
                }
            }
        }

        MutationOutcome::Queued(self.park(action).await)
    }

    async fn park(&self, action: SyncAction) -> Uuid {
        let label = action.label();
        let task_id = self.queue.enqueue(action).await;
        self.emit(SyncEvent::Queued {
            task_id,
            action: label,
        });
        task_id
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

/// Send one queued action to the gateway
pub async fn apply_action(
    gateway: &dyn EquipmentGateway,
    action: &SyncAction,
) -> Result<(), GatewayError> {
    match action {
        SyncAction::Add { row } => gateway.insert(row).await,
        SyncAction::Update {
            id,
            technician_logs,
            final_condition,
            updated_at,
        } => {
            gateway
                .update_job_details(id, technician_logs, *final_condition, *updated_at)
                .await
        }
        SyncAction::Fix {
            id,
            fixed_date,
            updated_at,
        } => gateway.mark_fixed(id, *fixed_date, *updated_at).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::local_db::MemoryStore;
    use crate::shared::{EquipmentStatus, MemoryGateway};

    async fn engine() -> (Arc<MemoryGateway>, ReconciliationEngine) {
        let gateway = Arc::new(MemoryGateway::new());
        let engine = ReconciliationEngine::open(gateway.clone(), Arc::new(MemoryStore::new())).await;
        (gateway, engine)
    }

    fn draft(serial: &str) -> NewEquipment {
        NewEquipment {
            serial_number: serial.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_online_add_is_confirmed() {
        let (gateway, engine) = engine().await;
        let mut events = engine.subscribe();

        let (record, outcome) = engine.add_item(draft("SN-1"), "Admin").await;

        assert_eq!(outcome, MutationOutcome::Confirmed);
        assert_eq!(events.recv().await.unwrap(), SyncEvent::RefreshRequested);
        assert_eq!(gateway.rows().await.len(), 1);
        assert!(record.job_card_no.ends_with("/00001"));
        assert!(engine.queue().is_empty().await);
    }

    #[tokio::test]
    async fn test_offline_add_is_queued() {
        let (gateway, engine) = engine().await;
        engine.set_online(false).await;

        let (_, outcome) = engine.add_item(draft("SN-1"), "Admin").await;

        assert!(matches!(outcome, MutationOutcome::Queued(_)));
        assert!(gateway.journal().await.is_empty());
        assert_eq!(engine.items().await[0].status, EquipmentStatus::Pending);
    }

    #[tokio::test]
    async fn test_transient_failure_is_queued() {
        let (gateway, engine) = engine().await;
        gateway.fail_next(GatewayError::Timeout).await;

        let (_, outcome) = engine.add_item(draft("SN-1"), "Admin").await;

        assert!(matches!(outcome, MutationOutcome::Queued(_)));
        assert_eq!(engine.queue().len().await, 1);
    }

    #[tokio::test]
    async fn test_rejected_write_is_not_queued() {
        let (gateway, engine) = engine().await;
        gateway
            .fail_next(GatewayError::Rejected {
                status: 400,
                message: "bad column".into(),
            })
            .await;

        let (_, outcome) = engine.add_item(draft("SN-1"), "Admin").await;

        assert!(matches!(outcome, MutationOutcome::Rejected(_)));
        assert!(engine.queue().is_empty().await);
    }

    #[tokio::test]
    async fn test_update_rejects_shrinking_log() {
        let (_, engine) = engine().await;
        let (record, _) = engine.add_item(draft("SN-1"), "Admin").await;
        engine.log_repair(&record.id, "Ann", "Reseated RAM").await.unwrap();

        let err = engine
            .update_job_details(&record.id, Vec::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SharedError::ValidationError { .. }));
        assert_eq!(engine.find(&record.id).await.unwrap().technician_logs.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let (_, engine) = engine().await;
        assert_eq!(
            engine.mark_fixed("nope").await,
            Err(SharedError::not_found("nope"))
        );
    }

    #[tokio::test]
    async fn test_write_waits_behind_pending_tasks() {
        let (gateway, engine) = engine().await;
        engine.set_online(false).await;
        let (first, _) = engine.add_item(draft("SN-1"), "Admin").await;
        engine.set_online(true).await;
        gateway.fail_next(GatewayError::Timeout).await;

        let (second, outcome) = engine.add_item(draft("SN-2"), "Admin").await;

        // The replay halts on the timeout, so both writes stay queued
        assert!(matches!(outcome, MutationOutcome::Queued(_)));
        assert_eq!(engine.queue().len().await, 2);
        assert!(gateway.journal().await.is_empty());

        engine.sync_now().await;
        assert_eq!(
            gateway.journal().await,
            vec![format!("insert:{}", first.id), format!("insert:{}", second.id)]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_log_entries_both_kept() {
        let (_, engine) = engine().await;
        let engine = Arc::new(engine);
        let (record, _) = engine.add_item(draft("SN-1"), "Admin").await;

        let a = tokio::spawn({
            let engine = engine.clone();
            let id = record.id.clone();
            async move { engine.log_repair(&id, "Ann", "Cleaned fan").await }
        });
        let b = tokio::spawn({
            let engine = engine.clone();
            let id = record.id.clone();
            async move { engine.log_repair(&id, "Ben", "Replaced PSU").await }
        });

        assert!(a.await.unwrap().is_ok());
        assert!(b.await.unwrap().is_ok());
        let logs = engine.find(&record.id).await.unwrap().technician_logs;
        assert_eq!(logs.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_note_is_rejected() {
        let (_, engine) = engine().await;
        let (record, _) = engine.add_item(draft("SN-1"), "Admin").await;

        let err = engine.log_repair(&record.id, "Ann", "   ").await.unwrap_err();
        assert!(matches!(err, SharedError::ValidationError { .. }));
        assert_eq!(
            engine.log_repair("nope", "Ann", "").await,
            Err(SharedError::not_found("nope"))
        );
    }

    #[tokio::test]
    async fn test_first_load_failure_has_no_notice() {
        let (gateway, engine) = engine().await;
        let mut events = engine.subscribe();
        gateway.set_online(false).await;

        assert_eq!(engine.fetch_items(true).await, FetchOutcome::Stale);
        assert!(events.try_recv().is_err());

        assert_eq!(engine.fetch_items(false).await, FetchOutcome::Stale);
        assert_eq!(
            events.try_recv().unwrap(),
            SyncEvent::Notice(FETCH_FAILED_NOTICE.to_string())
        );
    }
}
