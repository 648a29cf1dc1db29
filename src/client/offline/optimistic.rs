//! # Optimistic Updates
//!
//! Applies a user action to the displayed collection before the hosted store
//! has confirmed it. The next successful fetch replaces the result wholesale.
//!
//! `reduce` is pure: it takes the current items by reference and returns a new
//! collection, so callers can swap it in under a single write lock.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use repairdesk::client::offline::optimistic::{reduce, ItemAction};
//! # use repairdesk::shared::EquipmentRecord;
//! # fn example(items: Vec<EquipmentRecord>) {
//! let next = reduce(&items, &ItemAction::MarkFixed {
//!     id: items[0].id.clone(),
//!     fixed_date: chrono::Utc::now(),
//! });
//! assert!(next[0].is_fixed());
//! # }
//! ```

use chrono::{DateTime, Utc};

use crate::shared::equipment::extends_logs;
use crate::shared::{EquipmentRecord, FinalCondition, TechnicianLog};

/// A change to the displayed collection
#[derive(Debug, Clone, PartialEq)]
pub enum ItemAction {
    /// New job, shown first
    Add(EquipmentRecord),
    /// New technician log and final condition for a job
    UpdateJob {
        id: String,
        technician_logs: Vec<TechnicianLog>,
        final_condition: Option<FinalCondition>,
    },
    /// Job completed
    MarkFixed {
        id: String,
        fixed_date: DateTime<Utc>,
    },
    /// Canonical collection from a fetch or the cache
    Replace(Vec<EquipmentRecord>),
}

/// Apply `action` to `items`, returning the new collection
///
/// Actions that name an unknown id leave the collection as it was. A log
/// update that does not extend the current log is ignored.
pub fn reduce(items: &[EquipmentRecord], action: &ItemAction) -> Vec<EquipmentRecord> {
    match action {
        ItemAction::Add(record) => {
            let mut next = Vec::with_capacity(items.len() + 1);
            next.push(record.clone());
            next.extend(items.iter().filter(|i| i.id != record.id).cloned());
            next
        }
        ItemAction::UpdateJob {
            id,
            technician_logs,
            final_condition,
        } => items
            .iter()
            .map(|item| {
                if &item.id != id || !extends_logs(&item.technician_logs, technician_logs) {
                    return item.clone();
                }
                let mut updated = item.clone();
                updated.technician_logs = technician_logs.clone();
                updated.final_condition = *final_condition;
                updated
            })
            .collect(),
        ItemAction::MarkFixed { id, fixed_date } => items
            .iter()
            .map(|item| {
                let mut updated = item.clone();
                if &item.id == id {
                    updated.mark_fixed(*fixed_date);
                }
                updated
            })
            .collect(),
        ItemAction::Replace(records) => records.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::{EquipmentStatus, NewEquipment};
    use chrono::Duration;

    fn item(serial: &str) -> EquipmentRecord {
        EquipmentRecord::new_pending(
            NewEquipment {
                serial_number: serial.to_string(),
                ..Default::default()
            },
            "COMETZ25/00001".into(),
            "Admin",
            Utc::now(),
        )
    }

    #[test]
    fn test_add_prepends() {
        let items = vec![item("SN-1")];
        let added = item("SN-2");
        let next = reduce(&items, &ItemAction::Add(added.clone()));

        assert_eq!(next.len(), 2);
        assert_eq!(next[0], added);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_mark_fixed_sets_date_once() {
        let items = vec![item("SN-1")];
        let id = items[0].id.clone();
        let first = Utc::now();

        let fixed = reduce(&items, &ItemAction::MarkFixed { id: id.clone(), fixed_date: first });
        assert_eq!(fixed[0].status, EquipmentStatus::Fixed);
        assert_eq!(fixed[0].fixed_date, Some(first));
        assert_eq!(items[0].status, EquipmentStatus::Pending);

        let again = reduce(
            &fixed,
            &ItemAction::MarkFixed { id, fixed_date: first + Duration::hours(1) },
        );
        assert_eq!(again[0].fixed_date, Some(first));
    }

    #[test]
    fn test_unknown_id_is_untouched() {
        let items = vec![item("SN-1")];
        let next = reduce(
            &items,
            &ItemAction::MarkFixed { id: "missing".into(), fixed_date: Utc::now() },
        );
        assert_eq!(next, items);
    }

    #[test]
    fn test_update_job_requires_extension() {
        let mut base = item("SN-1");
        base.technician_logs = vec![TechnicianLog::new("Ann", "Swapped PSU", Utc::now())];
        let items = vec![base.clone()];

        let shrunk = reduce(
            &items,
            &ItemAction::UpdateJob {
                id: base.id.clone(),
                technician_logs: Vec::new(),
                final_condition: Some(FinalCondition::Dead),
            },
        );
        assert_eq!(shrunk, items);

        let mut logs = base.technician_logs.clone();
        logs.push(TechnicianLog::new("Bo", "Tested", Utc::now()));
        let grown = reduce(
            &items,
            &ItemAction::UpdateJob {
                id: base.id.clone(),
                technician_logs: logs.clone(),
                final_condition: Some(FinalCondition::Working),
            },
        );
        assert_eq!(grown[0].technician_logs, logs);
        assert_eq!(grown[0].final_condition, Some(FinalCondition::Working));
    }

    #[test]
    fn test_replace() {
        let items = vec![item("SN-1")];
        let fresh = vec![item("SN-9"), item("SN-8")];
        assert_eq!(reduce(&items, &ItemAction::Replace(fresh.clone())), fresh);
    }
}
