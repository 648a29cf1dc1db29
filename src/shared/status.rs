//! Repair status lookup payload
//!
//! The public answer to "where is my device?", keyed by serial number. Served
//! by the lookup endpoint in `backend::status`.

use serde::{Deserialize, Serialize};

use crate::shared::equipment::EquipmentRow;

/// Statuses that mean the device has left the repair bench
const OUT_OF_REPAIR: &[&str] = &["Fixed", "Collected"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairStatus {
    pub job_id: Option<String>,
    pub status: Option<String>,
    pub in_repair: bool,
    pub sr_number: Option<String>,
    pub received_date: Option<String>,
}

impl From<&EquipmentRow> for RepairStatus {
    fn from(row: &EquipmentRow) -> Self {
        let in_repair = !row
            .status
            .as_deref()
            .is_some_and(|status| OUT_OF_REPAIR.contains(&status));

        Self {
            job_id: row.job_card_no.clone(),
            status: row.status.clone(),
            in_repair,
            sr_number: row.sr_number.clone(),
            received_date: row.received_date.clone().or_else(|| row.created_at.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(status: Option<&str>) -> EquipmentRow {
        EquipmentRow {
            id: Some("1".to_string()),
            job_card_no: Some("COMETZ25/00007".to_string()),
            status: status.map(str::to_string),
            sr_number: Some("SR-88".to_string()),
            created_at: Some("2025-01-02T10:00:00+00:00".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_in_repair_flag() {
        assert!(RepairStatus::from(&row(Some("Pending"))).in_repair);
        assert!(RepairStatus::from(&row(None)).in_repair);
        assert!(!RepairStatus::from(&row(Some("Fixed"))).in_repair);
        assert!(!RepairStatus::from(&row(Some("Collected"))).in_repair);
    }

    #[test]
    fn test_serializes_camel_case() {
        let value = serde_json::to_value(RepairStatus::from(&row(Some("Pending")))).unwrap();
        assert_eq!(
            value,
            json!({
                "jobId": "COMETZ25/00007",
                "status": "Pending",
                "inRepair": true,
                "srNumber": "SR-88",
                "receivedDate": "2025-01-02T10:00:00+00:00"
            })
        );
    }
}
