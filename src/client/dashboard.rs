//! # Dashboard Queries
//!
//! Read-only views over the equipment collection: header counts, the
//! tab/category/search filter, and workshop overstay alerts.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::shared::{EquipmentRecord, EquipmentStatus};

/// Pending jobs at least this many days old are flagged
pub const OVERSTAY_DAYS: i64 = 2;

/// Category filter value meaning "no category filter"
pub const ALL_CATEGORIES: &str = "All Categories";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub all: usize,
    pub pending: usize,
    pub fixed: usize,
}

pub fn stats(items: &[EquipmentRecord]) -> DashboardStats {
    items.iter().fold(
        DashboardStats {
            all: items.len(),
            ..Default::default()
        },
        |mut acc, item| {
            match item.status {
                EquipmentStatus::Pending => acc.pending += 1,
                EquipmentStatus::Fixed => acc.fixed += 1,
            }
            acc
        },
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    All,
    /// Pending jobs
    Received,
    Fixed,
}

/// Current filter selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    pub tab: Tab,
    /// Exact equipment type, `None` for all
    pub category: Option<String>,
    /// Case-insensitive substring over serial, office, job card and assignee
    pub search: String,
}

impl ItemFilter {
    pub fn matches(&self, item: &EquipmentRecord) -> bool {
        let tab_ok = match self.tab {
            Tab::All => true,
            Tab::Received => item.status == EquipmentStatus::Pending,
            Tab::Fixed => item.status == EquipmentStatus::Fixed,
        };
        if !tab_ok {
            return false;
        }

        if let Some(category) = self.category.as_deref() {
            if category != ALL_CATEGORIES && item.equipment_type != category {
                return false;
            }
        }

        let query = self.search.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        [
            &item.serial_number,
            &item.office_number,
            &item.job_card_no,
            &item.assigned_to,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&query))
    }
}

pub fn filter_items<'a>(items: &'a [EquipmentRecord], filter: &ItemFilter) -> Vec<&'a EquipmentRecord> {
    items.iter().filter(|item| filter.matches(item)).collect()
}

/// "All Categories" followed by every distinct equipment type, sorted
pub fn categories(items: &[EquipmentRecord]) -> Vec<String> {
    let types: BTreeSet<&str> = items.iter().map(|i| i.equipment_type.as_str()).collect();
    std::iter::once(ALL_CATEGORIES.to_string())
        .chain(types.into_iter().map(str::to_string))
        .collect()
}

/// Whole days since the job was received, never negative
pub fn days_in_workshop(item: &EquipmentRecord, now: DateTime<Utc>) -> i64 {
    (now - item.received_date).num_days().max(0)
}

/// Pending jobs that have been in the workshop for `OVERSTAY_DAYS` or more
pub fn overstay_alerts(items: &[EquipmentRecord], now: DateTime<Utc>) -> Vec<&EquipmentRecord> {
    items
        .iter()
        .filter(|i| {
            i.status == EquipmentStatus::Pending && days_in_workshop(i, now) >= OVERSTAY_DAYS
        })
        .collect()
}
