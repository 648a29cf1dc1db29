//! Common test utilities and helpers
//!
//! Fixtures shared by the integration tests: configuration, intake drafts,
//! remote rows, and engines wired to in-memory parts.

#![allow(dead_code)]

use std::sync::Arc;

use repairdesk::client::local_db::{KeyValueStore, MemoryStore};
use repairdesk::client::offline::ReconciliationEngine;
use repairdesk::shared::{AppConfig, EquipmentRow, MemoryGateway, NewEquipment};

pub fn test_config(url: &str) -> AppConfig {
    AppConfig::builder()
        .supabase_url(url)
        .supabase_anon_key("test-anon-key")
        .build()
        .expect("valid test config")
}

pub fn draft(serial: &str, office: &str, assigned_to: &str) -> NewEquipment {
    NewEquipment {
        equipment_type: "Laptop".to_string(),
        serial_number: serial.to_string(),
        office_number: office.to_string(),
        assigned_to: assigned_to.to_string(),
        ..Default::default()
    }
}

pub fn remote_row(id: &str, serial: &str, received_date: &str) -> EquipmentRow {
    EquipmentRow {
        id: Some(id.to_string()),
        job_card_no: Some(format!("COMETZ25/{}", id)),
        equipment_type: Some("Desktop".to_string()),
        serial_number: Some(serial.to_string()),
        status: Some("Pending".to_string()),
        received_date: Some(received_date.to_string()),
        ..Default::default()
    }
}

/// Online gateway, fresh store, engine over both
pub struct Harness {
    pub gateway: Arc<MemoryGateway>,
    pub store: Arc<MemoryStore>,
    pub engine: Arc<ReconciliationEngine>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_gateway(MemoryGateway::new()).await
    }

    pub async fn with_gateway(gateway: MemoryGateway) -> Self {
        let gateway = Arc::new(gateway);
        let store = Arc::new(MemoryStore::new());
        let engine = Arc::new(ReconciliationEngine::open(gateway.clone(), store.clone()).await);
        Self {
            gateway,
            store,
            engine,
        }
    }

    /// A second engine over the same store, as after an app restart
    pub async fn restart(&self) -> ReconciliationEngine {
        let store: Arc<dyn KeyValueStore> = self.store.clone();
        ReconciliationEngine::open(self.gateway.clone(), store).await
    }

    pub async fn go_offline(&self) {
        self.gateway.set_online(false).await;
        self.engine.set_online(false).await;
    }

    pub async fn go_online(&self) {
        self.gateway.set_online(true).await;
        self.engine.set_online(true).await;
    }
}
