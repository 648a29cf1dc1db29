//! # Sync Queue
//!
//! Ordered, persisted list of mutations that could not reach the hosted store.
//! Tasks are replayed strictly in insertion order once connectivity returns.
//!
//! ## Features
//!
//! - **Persistent Queue**: the whole queue is rewritten to the key-value store
//!   after every change, so it survives restarts
//! - **Ordered Replay**: `drain` never skips past a task that failed transiently
//! - **Serialized Drains**: two drains never interleave
//!
//! ## Usage
//!
//! ```rust,no_run
//! use repairdesk::client::local_db::MemoryStore;
//! use repairdesk::client::offline::queue::{ApplyOutcome, SyncAction, SyncQueue};
//! use std::sync::Arc;
//!
//! # async fn example(action: SyncAction) {
//! let queue = SyncQueue::load(Arc::new(MemoryStore::new())).await;
//! queue.enqueue(action).await;
//!
//! let report = queue.drain(|task| async move { ApplyOutcome::Applied }).await;
//! assert_eq!(report.remaining, 0);
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::client::local_db::{KeyValueStore, SYNC_QUEUE_KEY};
use crate::shared::{EquipmentRow, FinalCondition, GatewayError, TechnicianLog};

/// A remote write waiting to be replayed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "UPPERCASE")]
pub enum SyncAction {
    /// Create a job
    Add { row: EquipmentRow },
    /// Replace the technician log and final condition of a job
    Update {
        id: String,
        technician_logs: Vec<TechnicianLog>,
        final_condition: Option<FinalCondition>,
        updated_at: DateTime<Utc>,
    },
    /// Mark a job Fixed
    Fix {
        id: String,
        fixed_date: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    },
}

impl SyncAction {
    /// Id of the record this action writes to
    pub fn record_id(&self) -> Option<&str> {
        match self {
            SyncAction::Add { row } => row.id.as_deref(),
            SyncAction::Update { id, .. } | SyncAction::Fix { id, .. } => Some(id),
        }
    }

    /// Short name used in logs and events
    pub fn label(&self) -> &'static str {
        match self {
            SyncAction::Add { .. } => "ADD",
            SyncAction::Update { .. } => "UPDATE",
            SyncAction::Fix { .. } => "FIX",
        }
    }
}

/// Queued action with metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncTask {
    pub id: Uuid,
    #[serde(flatten)]
    pub action: SyncAction,
    pub queued_at: DateTime<Utc>,
}

/// Result of replaying one task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The store accepted the write, or already had it
    Applied,
    /// The store will never accept this write
    PermanentFailure,
    /// Try again later
    TransientFailure,
}

impl ApplyOutcome {
    /// Classify a gateway result
    ///
    /// A duplicate key means an earlier attempt already landed, so it counts
    /// as applied.
    pub fn from_result(result: Result<(), GatewayError>) -> Self {
        match result {
            Ok(()) => ApplyOutcome::Applied,
            Err(e) if e.is_duplicate_key() => ApplyOutcome::Applied,
            Err(e) if e.is_permanent() => ApplyOutcome::PermanentFailure,
            Err(_) => ApplyOutcome::TransientFailure,
        }
    }
}

/// Summary of one drain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub applied: usize,
    pub dropped: usize,
    /// Stopped at a transient failure
    pub halted: bool,
    pub remaining: usize,
}

/// Persisted FIFO of pending writes
pub struct SyncQueue {
    tasks: Mutex<VecDeque<SyncTask>>,
    drain_lock: Mutex<()>,
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for SyncQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncQueue").finish_non_exhaustive()
    }
}

impl SyncQueue {
    /// Empty queue backed by `store`; nothing is read from it
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            tasks: Mutex::new(VecDeque::new()),
            drain_lock: Mutex::new(()),
            store,
        }
    }

    /// Restore the queue persisted in `store`
    ///
    /// Missing or unreadable data yields an empty queue.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let tasks = match store.get(SYNC_QUEUE_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<VecDeque<SyncTask>>(&raw) {
                Ok(tasks) => tasks,
                Err(e) => {
                    tracing::error!("Discarding unreadable sync queue: {}", e);
                    VecDeque::new()
                }
            },
            Ok(None) => VecDeque::new(),
            Err(e) => {
                tracing::error!("Failed to read sync queue: {}", e);
                VecDeque::new()
            }
        };

        if !tasks.is_empty() {
            tracing::info!("Restored {} pending sync task(s)", tasks.len());
        }

        Self {
            tasks: Mutex::new(tasks),
            drain_lock: Mutex::new(()),
            store,
        }
    }

    /// Append a task and persist the queue
    pub async fn enqueue(&self, action: SyncAction) -> Uuid {
        let task = SyncTask {
            id: Uuid::new_v4(),
            action,
            queued_at: Utc::now(),
        };
        let id = task.id;

        let mut tasks = self.tasks.lock().await;
        tracing::info!("Queued {} task {}", task.action.label(), id);
        tasks.push_back(task);
        self.persist(&tasks).await;
        id
    }

    /// Ordered snapshot of all pending tasks
    pub async fn peek_all(&self) -> Vec<SyncTask> {
        self.tasks.lock().await.iter().cloned().collect()
    }

    /// Number of pending tasks
    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }

    /// Whether nothing is waiting to be replayed
    pub async fn is_empty(&self) -> bool {
        self.tasks.lock().await.is_empty()
    }

    /// Delete a task by id and persist; returns whether it was present
    pub async fn remove(&self, task_id: Uuid) -> bool {
        let mut tasks = self.tasks.lock().await;
        let before = tasks.len();
        tasks.retain(|t| t.id != task_id);
        let removed = tasks.len() != before;
        if removed {
            self.persist(&tasks).await;
        }
        removed
    }

    /// Replay tasks front to back
    ///
    /// Applied and permanently failed tasks are removed, each removal persisted
    /// before the next task runs. The first transient failure stops the drain
    /// and leaves that task and everything after it in place.
    pub async fn drain<F, Fut>(&self, mut apply: F) -> DrainReport
    where
        F: FnMut(SyncTask) -> Fut,
        Fut: Future<Output = ApplyOutcome>,
    {
        let _drain = self.drain_lock.lock().await;
        let mut report = DrainReport::default();

        loop {
            let next = self.tasks.lock().await.front().cloned();
            let Some(task) = next else {
                break;
            };

            let task_id = task.id;
            let label = task.action.label();
            match apply(task).await {
                ApplyOutcome::Applied => {
                    self.remove(task_id).await;
                    report.applied += 1;
                }
                ApplyOutcome::PermanentFailure => {
                    tracing::warn!("Dropping {} task {}: rejected by server", label, task_id);
                    self.remove(task_id).await;
                    report.dropped += 1;
                }
                ApplyOutcome::TransientFailure => {
                    tracing::debug!("Drain halted at {} task {}", label, task_id);
                    report.halted = true;
                    break;
                }
            }
        }

        report.remaining = self.len().await;
        if report.applied + report.dropped > 0 {
            tracing::info!(
                "Sync drain: {} applied, {} dropped, {} remaining",
                report.applied,
                report.dropped,
                report.remaining
            );
        }
        report
    }

    async fn persist(&self, tasks: &VecDeque<SyncTask>) {
        let raw = match serde_json::to_string(tasks) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("Failed to serialize sync queue: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(SYNC_QUEUE_KEY, &raw).await {
            tracing::error!("Failed to persist sync queue: {}", e);
        }
    }
}
