//! # repairdesk
//!
//! Equipment-repair tracking for an IT workshop, built around an
//! offline-tolerant sync layer over a hosted PostgREST store.
//!
//! - [`shared`]: equipment model, gateway trait and implementations, config
//! - [`client`]: sync queue, reconciliation, connectivity, local storage, and
//!   the dashboard controller
//! - `backend` (feature `ssr`): public repair-status lookup service

pub mod client;
pub mod shared;

#[cfg(feature = "ssr")]
pub mod backend;
