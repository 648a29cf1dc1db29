//! # Offline Sync
//!
//! Keeps the dashboard usable while the hosted store is unreachable.
//!
//! ## Architecture
//!
//! - **Optimistic updates**: user actions change the displayed collection
//!   immediately
//! - **Sync queue**: writes that could not be sent wait here, persisted
//! - **Item cache**: the last successful fetch, shown when a fetch fails
//! - **Reconciliation**: ties the above to the gateway and replays the queue
//!   when connectivity returns
//!
//! ## Key Components
//!
//! - `optimistic.rs`: pure reducer over the item collection
//! - `queue.rs`: ordered, persisted write queue
//! - `cache.rs`: last-known-good snapshot
//! - `reconciliation.rs`: the engine

pub mod cache;
pub mod optimistic;
pub mod queue;
pub mod reconciliation;

pub use cache::ItemCache;
pub use optimistic::{reduce, ItemAction};
pub use queue::{ApplyOutcome, DrainReport, SyncAction, SyncQueue, SyncTask};
pub use reconciliation::{
    FetchOutcome, MutationOutcome, ReconciliationEngine, SyncEvent, FETCH_FAILED_NOTICE,
};
