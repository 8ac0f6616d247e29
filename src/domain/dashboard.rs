use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::order::OrderStatus;

pub const WINDOW_DAYS: u64 = 30;

const LABEL_FORMAT: &str = "%Y-%m-%d";

/// Orders with one status created on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    /// `YYYY-MM-DD`
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    #[serde(deserialize_with = "super::money::deserialize")]
    pub total_revenue_last_30_days: BigDecimal,
    pub total_orders_last_30_days: u64,
    pub pending_orders: u64,
    pub total_users: u64,
    pub total_books: u64,
    /// Keyed by status name. Unknown keys are tolerated and ignored.
    #[serde(default)]
    pub orders_by_status: HashMap<String, Vec<StatusEntry>>,
}

/// Daily counts for one status, aligned with the label sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSeries {
    pub status: OrderStatus,
    pub counts: Vec<u64>,
}

/// `days` consecutive calendar days ending on `today`, oldest first.
///
/// Works on calendar dates rather than instants, so daylight-saving
/// transitions cannot skip or repeat a day.
pub fn day_labels_ending(today: NaiveDate, days: u64) -> Vec<String> {
    (0..days)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .map(|d| d.format(LABEL_FORMAT).to_string())
        .collect()
}

/// The trailing 30-day window ending on the local date.
pub fn last_30_day_labels() -> Vec<String> {
    day_labels_ending(Local::now().date_naive(), WINDOW_DAYS)
}

/// One count per label; days without an entry count as zero. Dates are
/// matched by exact string equality.
pub fn bucket_by_day(entries: &[StatusEntry], labels: &[String]) -> Vec<u64> {
    let lookup: HashMap<&str, u64> = entries
        .iter()
        .map(|e| (e.date.as_str(), e.count))
        .collect();
    labels
        .iter()
        .map(|label| lookup.get(label.as_str()).copied().unwrap_or(0))
        .collect()
}

/// One series per status, in lifecycle order.
pub fn status_series(report: &DashboardReport, labels: &[String]) -> Vec<StatusSeries> {
    OrderStatus::ALL
        .iter()
        .map(|&status| StatusSeries {
            status,
            counts: report
                .orders_by_status
                .get(status.as_str())
                .map(|entries| bucket_by_day(entries, labels))
                .unwrap_or_else(|| vec![0; labels.len()]),
        })
        .collect()
}
