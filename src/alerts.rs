use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::aggregate::floor_time;
use crate::config::AlertConfig;
use crate::ingest::LogRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Unread,
    Read,
}

/// A detected burst of undo/redo activity for one user on one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub window_start: DateTime<Utc>,
    pub user: String,
    pub document: String,
    pub count: usize,
    pub description: String,
    pub status: AlertStatus,
}

const CHURN_DESCRIPTION: &str = "Many redos/undos detected within a short time period";

/// Bucket undo/redo records per (user, document, window) and alert on every
/// bucket whose count exceeds the configured threshold. Ordering is by
/// window start, then user, then document.
pub fn detect_undo_redo_churn<'a, I>(records: I, cfg: &AlertConfig) -> Vec<Alert>
where
    I: IntoIterator<Item = &'a LogRecord>,
{
    let mut counts: BTreeMap<(DateTime<Utc>, String, String), usize> = BTreeMap::new();
    for r in records {
        if !r.action.is_undo_redo() {
            continue;
        }
        let window = floor_time(r.time, cfg.window);
        *counts
            .entry((window, r.user.clone(), r.document.clone()))
            .or_insert(0) += 1;
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count > cfg.undo_redo_threshold)
        .map(|((window_start, user, document), count)| Alert {
            window_start,
            user,
            document,
            count,
            description: CHURN_DESCRIPTION.to_string(),
            status: AlertStatus::Unread,
        })
        .collect()
}

pub fn unread_count(alerts: &[Alert]) -> usize {
    alerts
        .iter()
        .filter(|a| a.status == AlertStatus::Unread)
        .count()
}
