use chrono::Duration;
use serde_json::{json, Value};

use shapeflow::alerts::{self, AlertStatus};
use shapeflow::config::AlertConfig;
use shapeflow::ingest;

fn undo_rows(user: &str, document: &str, base_minute: u32, n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| {
            json!({
                "Time": format!("2024-01-01T10:{:02}:{:02}Z", base_minute + (i as u32 / 60), i % 60),
                "User": user,
                "Document": document,
                "Description": if i % 2 == 0 { "Undo" } else { "Redo" }
            })
        })
        .collect()
}

fn config(window_secs: i64, threshold: usize) -> AlertConfig {
    AlertConfig {
        window: Duration::seconds(window_secs),
        undo_redo_threshold: threshold,
    }
}

#[test]
fn churn_above_threshold_raises_one_alert_per_bucket() {
    let rows = undo_rows("dana", "Gearbox", 0, 16);
    let report = ingest::ingest_rows(&rows);
    let alerts = alerts::detect_undo_redo_churn(&report.records, &config(3600, 15));
    assert_eq!(alerts.len(), 1);
    let alert = &alerts[0];
    assert_eq!(alert.user, "dana");
    assert_eq!(alert.document, "Gearbox");
    assert_eq!(alert.count, 16);
    assert_eq!(alert.status, AlertStatus::Unread);
}

#[test]
fn churn_at_threshold_does_not_alert() {
    let rows = undo_rows("dana", "Gearbox", 0, 15);
    let report = ingest::ingest_rows(&rows);
    let alerts = alerts::detect_undo_redo_churn(&report.records, &config(3600, 15));
    assert!(alerts.is_empty());
}

#[test]
fn buckets_are_per_user_and_document() {
    let mut rows = undo_rows("dana", "Gearbox", 0, 10);
    rows.extend(undo_rows("lior", "Gearbox", 0, 10));
    rows.extend(undo_rows("dana", "Bracket", 0, 10));
    let report = ingest::ingest_rows(&rows);
    // each (user, document) bucket holds exactly 10 events
    let alerts = alerts::detect_undo_redo_churn(&report.records, &config(3600, 9));
    assert_eq!(alerts.len(), 3);
    let pairs: Vec<(&str, &str)> = alerts
        .iter()
        .map(|a| (a.user.as_str(), a.document.as_str()))
        .collect();
    assert!(pairs.contains(&("dana", "Gearbox")));
    assert!(pairs.contains(&("lior", "Gearbox")));
    assert!(pairs.contains(&("dana", "Bracket")));
}

#[test]
fn events_in_different_windows_do_not_accumulate() {
    // 8 undos at 10:00 and 8 more at 11:30 with a 1 h window
    let mut rows = undo_rows("dana", "Gearbox", 0, 8);
    rows.extend((0..8).map(|i| {
        json!({
            "Time": format!("2024-01-01T11:30:{:02}Z", i),
            "User": "dana",
            "Document": "Gearbox",
            "Description": "Undo"
        })
    }));
    let report = ingest::ingest_rows(&rows);
    let alerts = alerts::detect_undo_redo_churn(&report.records, &config(3600, 10));
    assert!(alerts.is_empty());
}

#[test]
fn non_undo_redo_actions_are_ignored() {
    let rows: Vec<Value> = (0..30)
        .map(|i| {
            json!({
                "Time": format!("2024-01-01T10:00:{:02}Z", i),
                "User": "dana",
                "Document": "Gearbox",
                "Description": "Edit sketch"
            })
        })
        .collect();
    let report = ingest::ingest_rows(&rows);
    let alerts = alerts::detect_undo_redo_churn(&report.records, &config(3600, 1));
    assert!(alerts.is_empty());
}

#[test]
fn unread_count_tracks_status() {
    let rows = undo_rows("dana", "Gearbox", 0, 20);
    let report = ingest::ingest_rows(&rows);
    let mut alerts = alerts::detect_undo_redo_churn(&report.records, &config(3600, 15));
    assert_eq!(alerts::unread_count(&alerts), 1);
    alerts[0].status = AlertStatus::Read;
    assert_eq!(alerts::unread_count(&alerts), 0);
}
