//! # In-Memory Gateway
//!
//! A gateway that keeps the `equipment` table in process. Connectivity can be
//! switched off and individual failures can be scripted, which makes it the
//! stand-in for the hosted store when exercising offline behaviour.
//!
//! Every successful write is appended to a journal (`insert:<id>`,
//! `update:<id>`, `fix:<id>`) so callers can check replay order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use tokio::sync::RwLock;

use super::{EquipmentGateway, GatewayError};
use crate::shared::equipment::{
    parse_timestamp, EquipmentRow, EquipmentStatus, FinalCondition, TechnicianLog,
};

#[derive(Debug, Default)]
pub struct MemoryGateway {
    rows: RwLock<Vec<EquipmentRow>>,
    online: RwLock<bool>,
    scripted_failures: RwLock<VecDeque<GatewayError>>,
    journal: RwLock<Vec<String>>,
}

impl MemoryGateway {
    /// Empty table, online
    pub fn new() -> Self {
        Self {
            online: RwLock::new(true),
            ..Default::default()
        }
    }

    /// Table pre-filled with rows, online
    pub fn with_rows(rows: Vec<EquipmentRow>) -> Self {
        Self {
            rows: RwLock::new(rows),
            online: RwLock::new(true),
            ..Default::default()
        }
    }

    pub async fn set_online(&self, online: bool) {
        *self.online.write().await = online;
    }

    pub async fn is_online(&self) -> bool {
        *self.online.read().await
    }

    /// Make the next call fail with `error`; scripted failures are consumed in order
    pub async fn fail_next(&self, error: GatewayError) {
        self.scripted_failures.write().await.push_back(error);
    }

    pub async fn rows(&self) -> Vec<EquipmentRow> {
        self.rows.read().await.clone()
    }

    /// Successful writes, oldest first
    pub async fn journal(&self) -> Vec<String> {
        self.journal.read().await.clone()
    }

    async fn gate(&self) -> Result<(), GatewayError> {
        if !*self.online.read().await {
            return Err(GatewayError::Network("offline".to_string()));
        }
        match self.scripted_failures.write().await.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn record(&self, entry: String) {
        self.journal.write().await.push(entry);
    }
}

#[async_trait]
impl EquipmentGateway for MemoryGateway {
    async fn select_all(&self) -> Result<Vec<EquipmentRow>, GatewayError> {
        self.gate().await?;
        let mut rows = self.rows.read().await.clone();
        // Newest first; rows without a parseable date sink to the end
        rows.sort_by(|a, b| {
            let a = a.received_date.as_deref().and_then(parse_timestamp);
            let b = b.received_date.as_deref().and_then(parse_timestamp);
            b.cmp(&a)
        });
        Ok(rows)
    }

    async fn insert(&self, row: &EquipmentRow) -> Result<(), GatewayError> {
        self.gate().await?;
        let id = row.id.clone().unwrap_or_default();
        {
            let mut rows = self.rows.write().await;
            if rows.iter().any(|existing| existing.id.as_deref() == Some(id.as_str())) {
                return Err(GatewayError::DuplicateKey {
                    message: format!("duplicate key value violates unique constraint (id={})", id),
                });
            }
            rows.push(row.clone());
        }
        self.record(format!("insert:{}", id)).await;
        Ok(())
    }

    async fn update_job_details(
        &self,
        id: &str,
        technician_logs: &[TechnicianLog],
        final_condition: Option<FinalCondition>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        self.gate().await?;
        {
            let mut rows = self.rows.write().await;
            if let Some(row) = rows.iter_mut().find(|row| row.id.as_deref() == Some(id)) {
                row.technician_logs = Some(
                    serde_json::to_value(technician_logs)
                        .map_err(|e| GatewayError::Decode(e.to_string()))?,
                );
                row.final_condition = final_condition.map(|c| c.as_str().to_string());
                row.updated_at = Some(updated_at.to_rfc3339());
            }
        }
        self.record(format!("update:{}", id)).await;
        Ok(())
    }

    async fn mark_fixed(
        &self,
        id: &str,
        fixed_date: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        self.gate().await?;
        {
            let mut rows = self.rows.write().await;
            if let Some(row) = rows.iter_mut().find(|row| row.id.as_deref() == Some(id)) {
                row.status = Some(EquipmentStatus::Fixed.as_str().to_string());
                row.fixed_date = Some(fixed_date.to_rfc3339());
                row.updated_at = Some(updated_at.to_rfc3339());
            }
        }
        self.record(format!("fix:{}", id)).await;
        Ok(())
    }

    async fn find_by_serial(&self, serial_number: &str) -> Result<Option<EquipmentRow>, GatewayError> {
        self.gate().await?;
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|row| row.serial_number.as_deref() == Some(serial_number))
            .cloned())
    }
}
