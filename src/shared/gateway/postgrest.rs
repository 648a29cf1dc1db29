/**
 * PostgREST Gateway
 *
 * HTTP implementation of `EquipmentGateway` against the hosted store's REST
 * endpoint (`{url}/rest/v1/equipment`). Every request carries the anon key
 * both as `apikey` and as a bearer token.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::json;

use super::{EquipmentGateway, GatewayError};
use crate::shared::config::AppConfig;
use crate::shared::equipment::{EquipmentRow, EquipmentStatus, FinalCondition, TechnicianLog};

/// Remote table holding repair jobs
pub const EQUIPMENT_TABLE: &str = "equipment";

/// Gateway backed by the hosted PostgREST API
#[derive(Debug, Clone)]
pub struct PostgrestGateway {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl PostgrestGateway {
    pub fn new(config: &AppConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, &config.supabase_url, &config.supabase_anon_key))
    }

    pub fn with_client(client: Client, base_url: &str, anon_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, EQUIPMENT_TABLE)
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, self.table_url())
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    /// Turn a non-success response into a classified error
    async fn check(response: Response) -> Result<Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = GatewayError::from_response(status.as_u16(), &body);
        tracing::debug!("PostgREST request failed: {}", err);
        Err(err)
    }

    /// Cheapest request that proves the store is reachable
    ///
    /// Any HTTP answer counts, including auth failures; only transport errors
    /// mean "offline".
    pub async fn ping(&self) -> bool {
        let result = self
            .request(Method::GET)
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await;

        match result {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("Connectivity probe failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl EquipmentGateway for PostgrestGateway {
    async fn select_all(&self) -> Result<Vec<EquipmentRow>, GatewayError> {
        let response = self
            .request(Method::GET)
            .query(&[("select", "*"), ("order", "received_date.desc")])
            .send()
            .await?;

        let rows = Self::check(response).await?.json::<Vec<EquipmentRow>>().await?;
        tracing::debug!("Fetched {} equipment rows", rows.len());
        Ok(rows)
    }

    async fn insert(&self, row: &EquipmentRow) -> Result<(), GatewayError> {
        let response = self
            .request(Method::POST)
            .header("Prefer", "return=minimal")
            .json(&[row])
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn update_job_details(
        &self,
        id: &str,
        technician_logs: &[TechnicianLog],
        final_condition: Option<FinalCondition>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        let body = json!({
            "technician_logs": technician_logs,
            "final_condition": final_condition.map(|c| c.as_str()),
            "updated_at": updated_at.to_rfc3339(),
        });

        let response = self
            .request(Method::PATCH)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn mark_fixed(
        &self,
        id: &str,
        fixed_date: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        let body = json!({
            "status": EquipmentStatus::Fixed.as_str(),
            "fixed_date": fixed_date.to_rfc3339(),
            "updated_at": updated_at.to_rfc3339(),
        });

        let response = self
            .request(Method::PATCH)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn find_by_serial(&self, serial_number: &str) -> Result<Option<EquipmentRow>, GatewayError> {
        let response = self
            .request(Method::GET)
            .query(&[
                ("select", "*".to_string()),
                ("serial_number", format!("eq.{}", serial_number)),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;

        let rows = Self::check(response).await?.json::<Vec<EquipmentRow>>().await?;
        Ok(rows.into_iter().next())
    }
}
