use chrono::NaiveDate;
use serde_json::json;

use shapeflow::aggregate;
use shapeflow::ingest::{self, IngestReport};

fn sample() -> IngestReport {
    let raw = json!([
        {"Time": "2024-01-01T09:00:00Z", "User": "dana", "Document": "Gearbox", "Tab": "Part Studio 1", "Description": "Open document"},
        {"Time": "2024-01-01T09:10:00Z", "User": "dana", "Document": "Gearbox", "Tab": "Part Studio 1", "Description": "Edit sketch"},
        {"Time": "2024-01-01T10:00:00Z", "User": "lior", "Document": "Gearbox", "Tab": "Assembly 1", "Description": "Edit mate"},
        {"Time": "2024-01-02T11:00:00Z", "User": "dana", "Document": "Bracket", "Tab": "Part Studio 1", "Description": "Undo"},
        {"Time": "2024-01-02T11:05:00Z", "User": "dana", "Document": "Bracket", "Tab": "Part Studio 1", "Description": "Edit fillet"}
    ]);
    ingest::ingest_export(&raw)
}

#[test]
fn by_action_orders_count_desc_then_key() {
    let report = sample();
    let buckets = aggregate::by_action(&report.records);
    assert_eq!(buckets[0].key, "Edit");
    assert_eq!(buckets[0].count, 3);
    // remaining singletons tie-break alphabetically
    let rest: Vec<&str> = buckets[1..].iter().map(|b| b.key.as_str()).collect();
    assert_eq!(rest, vec!["Open", "Undo"]);
}

#[test]
fn by_user_and_document_count_occurrences() {
    let report = sample();
    let users = aggregate::by_user(&report.records);
    assert_eq!(users[0].key, "dana");
    assert_eq!(users[0].count, 4);
    let documents = aggregate::by_document(&report.records);
    assert_eq!(documents[0].key, "Gearbox");
    assert_eq!(documents[0].count, 3);
    assert_eq!(documents[1].key, "Bracket");
    assert_eq!(documents[1].count, 2);
}

#[test]
fn activity_over_time_buckets_by_day() {
    let report = sample();
    let days = aggregate::activity_over_time(&report.records);
    assert_eq!(days.len(), 2);
    assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert_eq!(days[0].count, 3);
    assert_eq!(days[1].count, 2);
}

#[test]
fn work_patterns_bucket_by_weekday_and_hour() {
    let report = sample();
    let buckets = aggregate::work_patterns(&report.records);
    // 2024-01-01 is a Monday
    assert_eq!(buckets[0].day, "Monday");
    assert_eq!(buckets[0].hour, 9);
    assert_eq!(buckets[0].count, 2);
    assert!(buckets.iter().any(|b| b.day == "Tuesday" && b.hour == 11 && b.count == 2));
}

#[test]
fn time_spent_per_tab_sums_capped_deltas() {
    let report = sample();
    let times = aggregate::time_spent_per_tab(&report.records);
    let part_studio = times.iter().find(|t| t.tab == "Part Studio 1").expect("tab");
    // 10 min on day one + 5 min on day two; the cross-day gap exceeds the
    // 30 min cap and is discarded
    assert_eq!(part_studio.seconds, 900);
    assert!(times.iter().all(|t| t.tab != "Assembly 1"));
}

#[test]
fn filter_options_keep_first_seen_order() {
    let report = sample();
    let options = aggregate::filter_options(report.records.as_slice());
    assert_eq!(options.documents, vec!["Gearbox", "Bracket"]);
    assert_eq!(options.users, vec!["dana", "lior"]);
    assert_eq!(options.descriptions.len(), 5);
}

#[test]
fn time_bounds_span_min_to_max() {
    let report = sample();
    let (min, max) = aggregate::time_bounds(&report.records).expect("bounds");
    assert_eq!(min, report.records[0].time);
    assert_eq!(max, report.records[4].time);
    let empty: Vec<shapeflow::ingest::LogRecord> = Vec::new();
    assert_eq!(aggregate::time_bounds(&empty), None);
}

#[test]
fn tier_breakdown_splits_advanced_and_basic() {
    let report = sample();
    let tiers = aggregate::tier_breakdown(&report.records);
    let dana_advanced = tiers
        .iter()
        .find(|t| t.user == "dana" && t.tier == shapeflow::actions::Tier::Advanced)
        .expect("dana advanced bucket");
    assert_eq!(dana_advanced.count, 2);
}
