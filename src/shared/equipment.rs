//! Equipment Records
//!
//! Domain types for repair jobs and the mapping between raw remote rows and
//! the records the dashboard works with.
//!
//! # Row Mapping
//!
//! Rows coming back from the hosted store are loosely typed: any column may be
//! missing, empty, or malformed. [`EquipmentRecord::from_row`] applies the
//! defaults:
//!
//! - descriptive text columns fall back to `"N/A"`
//! - priority falls back to `Medium`
//! - an unparseable `received_date` is replaced by the fetch time, and its
//!   display string becomes `"N/A"`
//! - `fixed_date` decides the status: a record is `Fixed` exactly when it has
//!   a completion timestamp
//!
//! # Job Card Numbers
//!
//! Job cards use `COMETZ{yy}/{n:05}` where `n` is the local item count plus one.
//! Two sessions creating jobs at the same time can produce the same number.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;

/// Sentinel used for descriptive fields the remote row did not provide
pub const NOT_AVAILABLE: &str = "N/A";

/// Fixed tag at the start of every job card number
pub const JOB_CARD_PREFIX: &str = "COMETZ";

/// Repair status of a piece of equipment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EquipmentStatus {
    /// Received and waiting for (or under) repair
    #[default]
    Pending,
    /// Repair completed
    Fixed,
}

impl EquipmentStatus {
    /// Column value used by the remote store
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentStatus::Pending => "Pending",
            EquipmentStatus::Fixed => "Fixed",
        }
    }
}

/// Job priority, chosen at intake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    /// Parse a column value, `None` for anything unrecognised
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Low" => Some(Priority::Low),
            "Medium" => Some(Priority::Medium),
            "High" => Some(Priority::High),
            _ => None,
        }
    }
}

/// Condition of the device when the technician closed out the job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FinalCondition {
    Working,
    Partially,
    Dead,
}

impl FinalCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinalCondition::Working => "Working",
            FinalCondition::Partially => "Partially",
            FinalCondition::Dead => "Dead",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Working" => Some(FinalCondition::Working),
            "Partially" => Some(FinalCondition::Partially),
            "Dead" => Some(FinalCondition::Dead),
            _ => None,
        }
    }
}

/// One entry in a job's technician log
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicianLog {
    /// When the work was done (RFC 3339)
    pub date: String,
    /// Who did it
    pub technician: String,
    /// What was done
    pub action: String,
}

impl TechnicianLog {
    pub fn new(technician: impl Into<String>, action: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            date: at.to_rfc3339(),
            technician: technician.into(),
            action: action.into(),
        }
    }
}

/// Whether `next` keeps every entry of `current`, in order, as its prefix
pub fn extends_logs(current: &[TechnicianLog], next: &[TechnicianLog]) -> bool {
    next.len() >= current.len() && next.starts_with(current)
}

/// Raw row of the remote `equipment` table
///
/// Every column is optional so that partially filled rows still decode.
/// `None` columns are left out when the row is serialized for an insert,
/// letting the store apply its own defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipmentRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_card_no: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub equipment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub office_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logged_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_firmware: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technician_logs: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sr_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Intake form contents for a new job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewEquipment {
    pub equipment_type: String,
    pub serial_number: String,
    pub office_number: String,
    pub assigned_to: String,
    pub priority: Priority,
    pub os_firmware: String,
    pub notes: String,
    pub sr_number: String,
    pub owner: String,
}

/// A repair job as shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRecord {
    pub id: String,
    pub job_card_no: String,
    pub equipment_type: String,
    pub serial_number: String,
    pub office_number: String,
    pub assigned_to: String,
    pub logged_by: String,
    pub os_firmware: String,
    pub notes: String,
    pub sr_number: String,
    pub owner: String,
    pub received_date: DateTime<Utc>,
    pub formatted_received_date: String,
    pub fixed_date: Option<DateTime<Utc>>,
    pub formatted_fixed_date: String,
    pub status: EquipmentStatus,
    pub priority: Priority,
    pub technician_logs: Vec<TechnicianLog>,
    pub final_condition: Option<FinalCondition>,
}

impl EquipmentRecord {
    /// Build a freshly received job with a client-generated id
    pub fn new_pending(
        draft: NewEquipment,
        job_card_no: String,
        logged_by: &str,
        received_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            job_card_no,
            equipment_type: text_or_na(Some(draft.equipment_type)),
            serial_number: text_or_na(Some(draft.serial_number)),
            office_number: text_or_na(Some(draft.office_number)),
            assigned_to: text_or_na(Some(draft.assigned_to)),
            logged_by: text_or_na(Some(logged_by.to_string())),
            os_firmware: text_or_na(Some(draft.os_firmware)),
            notes: text_or_na(Some(draft.notes)),
            sr_number: text_or_na(Some(draft.sr_number)),
            owner: text_or_na(Some(draft.owner)),
            received_date,
            formatted_received_date: format_display_date(&received_date),
            fixed_date: None,
            formatted_fixed_date: NOT_AVAILABLE.to_string(),
            status: EquipmentStatus::Pending,
            priority: draft.priority,
            technician_logs: Vec::new(),
            final_condition: None,
        }
    }

    /// Map a raw remote row, applying field defaults
    ///
    /// `now` stands in for a missing or unparseable `received_date`.
    pub fn from_row(row: EquipmentRow, now: DateTime<Utc>) -> Result<Self, SharedError> {
        let id = row
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| SharedError::validation("id", "row has no id"))?;

        let (received_date, formatted_received_date) = match row.received_date.as_deref() {
            None => (now, format_display_date(&now)),
            Some(raw) => match parse_timestamp(raw) {
                Some(parsed) => (parsed, format_display_date(&parsed)),
                None => (now, NOT_AVAILABLE.to_string()),
            },
        };

        let fixed_date = row.fixed_date.as_deref().and_then(parse_timestamp);
        let status = if fixed_date.is_some() {
            EquipmentStatus::Fixed
        } else {
            EquipmentStatus::Pending
        };
        if row.status.as_deref() == Some(EquipmentStatus::Fixed.as_str()) && fixed_date.is_none() {
            tracing::warn!("Row {} is marked Fixed without a fixed_date; showing it as Pending", id);
        }

        Ok(Self {
            job_card_no: text_or_na(row.job_card_no),
            equipment_type: text_or_na(row.equipment_type),
            serial_number: text_or_na(row.serial_number),
            office_number: text_or_na(row.office_number),
            assigned_to: text_or_na(row.assigned_to),
            logged_by: text_or_na(row.logged_by),
            os_firmware: text_or_na(row.os_firmware),
            notes: text_or_na(row.notes),
            sr_number: text_or_na(row.sr_number),
            owner: text_or_na(row.owner),
            received_date,
            formatted_received_date,
            formatted_fixed_date: fixed_date
                .as_ref()
                .map(format_display_date)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            fixed_date,
            status,
            priority: row
                .priority
                .as_deref()
                .and_then(Priority::parse)
                .unwrap_or_default(),
            technician_logs: parse_logs(row.technician_logs),
            final_condition: row.final_condition.as_deref().and_then(FinalCondition::parse),
            id,
        })
    }

    pub fn is_fixed(&self) -> bool {
        self.status == EquipmentStatus::Fixed
    }

    /// Transition to Fixed; a record that is already Fixed keeps its original date
    pub fn mark_fixed(&mut self, at: DateTime<Utc>) {
        if self.fixed_date.is_some() {
            return;
        }
        self.fixed_date = Some(at);
        self.formatted_fixed_date = format_display_date(&at);
        self.status = EquipmentStatus::Fixed;
    }
}

impl From<&EquipmentRecord> for EquipmentRow {
    fn from(record: &EquipmentRecord) -> Self {
        Self {
            id: Some(record.id.clone()),
            job_card_no: Some(record.job_card_no.clone()),
            equipment_type: Some(record.equipment_type.clone()),
            serial_number: Some(record.serial_number.clone()),
            office_number: Some(record.office_number.clone()),
            assigned_to: Some(record.assigned_to.clone()),
            logged_by: Some(record.logged_by.clone()),
            status: Some(record.status.as_str().to_string()),
            priority: Some(record.priority.as_str().to_string()),
            os_firmware: Some(record.os_firmware.clone()),
            notes: Some(record.notes.clone()),
            technician_logs: Some(
                serde_json::to_value(&record.technician_logs)
                    .unwrap_or_else(|_| serde_json::Value::Array(Vec::new())),
            ),
            final_condition: record.final_condition.map(|c| c.as_str().to_string()),
            received_date: Some(record.received_date.to_rfc3339()),
            fixed_date: record.fixed_date.map(|d| d.to_rfc3339()),
            sr_number: Some(record.sr_number.clone()),
            owner: Some(record.owner.clone()),
            created_at: None,
            updated_at: None,
        }
    }
}

/// Next job card number for a collection that currently holds `existing_count` items
pub fn job_card_number(existing_count: usize, now: DateTime<Utc>) -> String {
    format!(
        "{}{:02}/{:05}",
        JOB_CARD_PREFIX,
        now.year().rem_euclid(100),
        existing_count + 1
    )
}

/// `M/D/YYYY`, the format printed on job cards
pub fn format_display_date(date: &DateTime<Utc>) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}

/// Parse the timestamp formats the hosted store emits
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    // Postgres `timestamp without time zone` and the space-separated variant
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn text_or_na(value: Option<String>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn parse_logs(value: Option<serde_json::Value>) -> Vec<TechnicianLog> {
    match value {
        Some(serde_json::Value::Array(entries)) => entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value::<TechnicianLog>(entry).ok())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_job_card_number_format() {
        assert_eq!(job_card_number(0, fixed_now()), "COMETZ25/00001");
        assert_eq!(job_card_number(41, fixed_now()), "COMETZ25/00042");
        assert_eq!(job_card_number(99_999, fixed_now()), "COMETZ25/100000");
    }

    #[test]
    fn test_empty_row_defaults() {
        let row = EquipmentRow {
            id: Some("abc".to_string()),
            ..Default::default()
        };
        let record = EquipmentRecord::from_row(row, fixed_now()).unwrap();

        assert_eq!(record.job_card_no, NOT_AVAILABLE);
        assert_eq!(record.serial_number, NOT_AVAILABLE);
        assert_eq!(record.owner, NOT_AVAILABLE);
        assert_eq!(record.priority, Priority::Medium);
        assert_eq!(record.status, EquipmentStatus::Pending);
        assert_eq!(record.received_date, fixed_now());
        assert_eq!(record.formatted_received_date, "3/14/2025");
        assert_eq!(record.formatted_fixed_date, NOT_AVAILABLE);
        assert!(record.technician_logs.is_empty());
        assert!(record.final_condition.is_none());
    }

    #[test]
    fn test_row_without_id_is_rejected() {
        let result = EquipmentRecord::from_row(EquipmentRow::default(), fixed_now());
        assert!(matches!(result, Err(SharedError::ValidationError { .. })));
    }

    #[test]
    fn test_malformed_received_date_displays_na() {
        let row = EquipmentRow {
            id: Some("abc".to_string()),
            received_date: Some("yesterday-ish".to_string()),
            ..Default::default()
        };
        let record = EquipmentRecord::from_row(row, fixed_now()).unwrap();
        assert_eq!(record.received_date, fixed_now());
        assert_eq!(record.formatted_received_date, NOT_AVAILABLE);
    }

    #[test]
    fn test_fixed_date_decides_status() {
        let row = EquipmentRow {
            id: Some("abc".to_string()),
            status: Some("Pending".to_string()),
            fixed_date: Some("2025-03-10T08:00:00+00:00".to_string()),
            ..Default::default()
        };
        let record = EquipmentRecord::from_row(row, fixed_now()).unwrap();
        assert_eq!(record.status, EquipmentStatus::Fixed);
        assert_eq!(record.formatted_fixed_date, "3/10/2025");

        let row = EquipmentRow {
            id: Some("def".to_string()),
            status: Some("Fixed".to_string()),
            ..Default::default()
        };
        let record = EquipmentRecord::from_row(row, fixed_now()).unwrap();
        assert_eq!(record.status, EquipmentStatus::Pending);
    }

    #[test]
    fn test_logs_skip_malformed_entries() {
        let row = EquipmentRow {
            id: Some("abc".to_string()),
            technician_logs: Some(json!([
                {"date": "2025-03-11", "technician": "Admin", "action": "Replaced PSU"},
                "not an entry",
                {"technician": "Attachee"}
            ])),
            ..Default::default()
        };
        let record = EquipmentRecord::from_row(row, fixed_now()).unwrap();
        assert_eq!(record.technician_logs.len(), 2);
        assert_eq!(record.technician_logs[0].action, "Replaced PSU");
        assert_eq!(record.technician_logs[1].technician, "Attachee");
    }

    #[test]
    fn test_logs_that_are_not_an_array() {
        let row = EquipmentRow {
            id: Some("abc".to_string()),
            technician_logs: Some(json!({"oops": true})),
            ..Default::default()
        };
        let record = EquipmentRecord::from_row(row, fixed_now()).unwrap();
        assert!(record.technician_logs.is_empty());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2025-03-14T09:30:00Z").is_some());
        assert!(parse_timestamp("2025-03-14T09:30:00.123456+00:00").is_some());
        assert!(parse_timestamp("2025-03-14T09:30:00.123456").is_some());
        assert!(parse_timestamp("2025-03-14 09:30:00").is_some());
        assert_eq!(
            parse_timestamp("2025-03-14"),
            Some(Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap())
        );
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("14/03/2025").is_none());
    }

    #[test]
    fn test_mark_fixed_keeps_first_date() {
        let mut record = EquipmentRecord::new_pending(
            NewEquipment::default(),
            job_card_number(0, fixed_now()),
            "Admin",
            fixed_now(),
        );
        let first = fixed_now() + chrono::Duration::hours(2);
        record.mark_fixed(first);
        record.mark_fixed(first + chrono::Duration::days(1));

        assert!(record.is_fixed());
        assert_eq!(record.fixed_date, Some(first));
    }

    #[test]
    fn test_record_to_row_round_trip() {
        let draft = NewEquipment {
            equipment_type: "Laptop".to_string(),
            serial_number: "SN-001".to_string(),
            office_number: "Room 1".to_string(),
            assigned_to: "J. Doe".to_string(),
            priority: Priority::High,
            ..Default::default()
        };
        let mut record =
            EquipmentRecord::new_pending(draft, job_card_number(4, fixed_now()), "Admin", fixed_now());
        record.final_condition = Some(FinalCondition::Partially);

        let row = EquipmentRow::from(&record);
        assert_eq!(row.status.as_deref(), Some("Pending"));
        assert_eq!(row.final_condition.as_deref(), Some("Partially"));
        assert_eq!(row.technician_logs, Some(json!([])));

        let mapped = EquipmentRecord::from_row(row, fixed_now()).unwrap();
        assert_eq!(mapped, record);
    }

    #[test]
    fn test_extends_logs() {
        let a = TechnicianLog::new("Admin", "Diagnosed", fixed_now());
        let b = TechnicianLog::new("Admin", "Reinstalled OS", fixed_now());
        assert!(extends_logs(&[], &[a.clone()]));
        assert!(extends_logs(&[a.clone()], &[a.clone(), b.clone()]));
        assert!(extends_logs(&[a.clone()], &[a.clone()]));
        assert!(!extends_logs(&[a.clone(), b.clone()], &[a.clone()]));
        assert!(!extends_logs(&[a.clone()], &[b]));
    }
}
