use chrono::{TimeZone, Utc};
use serde_json::json;

use shapeflow::actions::ActionType;
use shapeflow::ingest;

#[test]
fn ingest_keeps_valid_rows_and_counts_drops() {
    let raw = json!([
        {"Time": "2024-01-01T10:00", "User": "dana", "Document": "Gearbox", "Description": "Edit sketch"},
        {"Time": "bad", "User": "dana", "Document": "Gearbox", "Description": "Edit sketch"},
        {"User": "lior", "Document": "Gearbox", "Description": "Open document"}
    ]);
    let report = ingest::ingest_export(&raw);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.bad_timestamp_drops, 1);
    assert_eq!(report.missing_field_drops, 1);
    assert_eq!(report.dropped(), 2);

    let rec = &report.records[0];
    assert_eq!(rec.time, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
    assert_eq!(rec.user, "dana");
    assert_eq!(rec.document, "Gearbox");
    assert_eq!(rec.action, ActionType::Edit);
}

#[test]
fn missing_description_is_a_missing_field_drop() {
    let raw = json!([
        {"Time": "2024-01-01 10:00:00", "User": "dana", "Document": "Gearbox"}
    ]);
    let report = ingest::ingest_export(&raw);
    assert!(report.records.is_empty());
    assert_eq!(report.missing_field_drops, 1);
    assert_eq!(report.bad_timestamp_drops, 0);
}

#[test]
fn partial_invalidity_never_fails_the_batch() {
    let mut rows = Vec::new();
    for i in 0..5 {
        rows.push(json!({
            "Time": format!("2024-03-0{} 09:00:00", i + 1),
            "User": "dana",
            "Document": "Bracket",
            "Description": "Commit change"
        }));
    }
    rows.push(json!({"Time": "not a time", "Description": "Commit change"}));
    rows.push(json!("not even an object"));
    let report = ingest::ingest_rows(&rows);
    assert_eq!(report.records.len(), 5);
    assert_eq!(report.bad_timestamp_drops, 1);
    assert_eq!(report.missing_field_drops, 1);
}

#[test]
fn input_order_is_preserved() {
    let raw = json!([
        {"Time": "2024-01-02T08:00:00", "Description": "Open doc", "User": "b"},
        {"Time": "2024-01-01T08:00:00", "Description": "Close doc", "User": "a"}
    ]);
    let report = ingest::ingest_export(&raw);
    let users: Vec<&str> = report.records.iter().map(|r| r.user.as_str()).collect();
    assert_eq!(users, vec!["b", "a"]);
}

#[test]
fn keyed_export_shape_is_unwrapped() {
    let raw = json!({
        "-Nabc123": {
            "fileName": "sprint.json",
            "data": [
                {"Time": "2024-05-05T12:00:00Z", "User": "noa", "Document": "Hinge", "Description": "Insert part"}
            ]
        }
    });
    let report = ingest::ingest_export(&raw);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].action, ActionType::Insert);
}

#[test]
fn export_rows_selects_by_file_name() {
    let raw = json!({
        "k1": {"fileName": "first.json", "data": [{"Time": "2024-01-01T00:00:00Z", "Description": "Open"}]},
        "k2": {"fileName": "second.json", "data": [
            {"Time": "2024-01-01T00:00:00Z", "Description": "Open"},
            {"Time": "2024-01-01T00:01:00Z", "Description": "Close"}
        ]}
    });
    let rows = ingest::export_rows(&raw, Some("second.json")).expect("rows");
    assert_eq!(rows.len(), 2);
}

#[test]
fn epoch_timestamps_parse_in_seconds_and_millis() {
    let raw = json!([
        {"Time": 1700000000u64, "Description": "Open doc"},
        {"Time": 1700000000123u64, "Description": "Open doc"},
        {"Time": "1700000000", "Description": "Open doc"}
    ]);
    let report = ingest::ingest_export(&raw);
    assert_eq!(report.records.len(), 3);
    assert_eq!(report.records[0].time, report.records[2].time);
    assert_eq!(
        report.records[1].time.timestamp_millis(),
        1_700_000_000_123
    );
}

#[test]
fn extra_fields_land_in_metadata_flattened() {
    let raw = json!([
        {
            "Time": "2024-01-01T10:00:00Z",
            "User": "dana",
            "Document": "Gearbox",
            "Description": "Export STEP",
            "Tab": "Part Studio 1",
            "client": {"os": "linux", "version": 7}
        }
    ]);
    let report = ingest::ingest_export(&raw);
    let rec = &report.records[0];
    assert_eq!(rec.tab.as_deref(), Some("Part Studio 1"));
    assert_eq!(rec.metadata.get("client.os").map(String::as_str), Some("linux"));
    assert_eq!(rec.metadata.get("client.version").map(String::as_str), Some("7"));
    assert!(!rec.metadata.contains_key("Time"));
}

#[test]
fn ingest_slice_rejects_invalid_json() {
    assert!(ingest::ingest_slice("{not json").is_err());
    let report = ingest::ingest_slice("[]").expect("empty export parses");
    assert!(report.records.is_empty());
    assert_eq!(report.dropped(), 0);
}

#[test]
fn unknown_action_descriptions_pass_through() {
    let raw = json!([
        {"Time": "2024-01-01T10:00:00Z", "Description": "Rotate view"}
    ]);
    let report = ingest::ingest_export(&raw);
    let rec = &report.records[0];
    assert_eq!(rec.action, ActionType::Other("Rotate view".to_string()));
    assert_eq!(rec.action.label(), "Rotate view");
}
