use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::actions::{self, ActionType};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("export is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One normalized activity record. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub time: DateTime<Utc>,
    pub user: String,
    pub document: String,
    pub tab: Option<String>,
    pub description: String,
    pub action: ActionType,
    /// Extra export fields, flattened to dotted string keys.
    pub metadata: BTreeMap<String, String>,
}

/// Outcome of one ingestion pass. Dropped rows are counted, never raised.
#[derive(Debug, Default, Clone, Serialize)]
pub struct IngestReport {
    pub records: Vec<LogRecord>,
    pub missing_field_drops: usize,
    pub bad_timestamp_drops: usize,
}

impl IngestReport {
    pub fn dropped(&self) -> usize {
        self.missing_field_drops + self.bad_timestamp_drops
    }
}

const TIME_KEYS: &[&str] = &["Time", "time", "timestamp", "Timestamp"];
const USER_KEYS: &[&str] = &["User", "user"];
const DOCUMENT_KEYS: &[&str] = &["Document", "document"];
const TAB_KEYS: &[&str] = &["Tab", "tab"];
const DESCRIPTION_KEYS: &[&str] = &["Description", "description", "action"];

/// Parse an export payload from a raw JSON string.
pub fn ingest_slice(raw: &str) -> Result<IngestReport, IngestError> {
    let value: Value = serde_json::from_str(raw)?;
    Ok(ingest_export(&value))
}

/// Parse an export payload: either a bare array of rows, or the platform's
/// keyed shape `{key: {"fileName": ..., "data": [...]}}`.
pub fn ingest_export(raw: &Value) -> IngestReport {
    match export_rows(raw, None) {
        Some(rows) => ingest_rows(rows),
        None => {
            tracing::warn!("export payload has no recognizable record collection");
            IngestReport::default()
        }
    }
}

/// Locate the row collection inside an export payload. With `file_name`
/// set, the keyed upload shape is searched for that entry; otherwise the
/// first keyed entry (or a bare array) wins.
pub fn export_rows<'a>(raw: &'a Value, file_name: Option<&str>) -> Option<&'a Vec<Value>> {
    match raw {
        Value::Array(rows) => Some(rows),
        Value::Object(map) => {
            if let Some(Value::Array(rows)) = map.get("data") {
                return Some(rows);
            }
            let mut fallback = None;
            for entry in map.values() {
                let Value::Object(inner) = entry else { continue };
                let Some(Value::Array(rows)) = inner.get("data") else { continue };
                match file_name {
                    Some(wanted) => {
                        if inner.get("fileName").and_then(Value::as_str) == Some(wanted) {
                            return Some(rows);
                        }
                    }
                    None => return Some(rows),
                }
                if fallback.is_none() {
                    fallback = Some(rows);
                }
            }
            fallback
        }
        _ => None,
    }
}

/// Normalize a row collection. Rows missing a timestamp or an action
/// description are dropped and counted; unparseable timestamps are counted
/// separately. Order is preserved.
pub fn ingest_rows(rows: &[Value]) -> IngestReport {
    let mut report = IngestReport::default();
    for row in rows {
        let Value::Object(obj) = row else {
            report.missing_field_drops += 1;
            continue;
        };
        let time_raw = lookup(obj, TIME_KEYS);
        let description = lookup(obj, DESCRIPTION_KEYS).and_then(string_of);
        let (Some(time_raw), Some(description)) = (time_raw, description) else {
            report.missing_field_drops += 1;
            continue;
        };
        let Some(time) = parse_time_value(time_raw) else {
            report.bad_timestamp_drops += 1;
            continue;
        };

        let user = lookup(obj, USER_KEYS)
            .and_then(string_of)
            .unwrap_or_else(|| "Unknown".to_string());
        let document = lookup(obj, DOCUMENT_KEYS)
            .and_then(string_of)
            .unwrap_or_else(|| "Unknown".to_string());
        let tab = lookup(obj, TAB_KEYS).and_then(string_of);

        let mut metadata = BTreeMap::new();
        for (key, value) in obj {
            if is_known_key(key) {
                continue;
            }
            flatten_value(key, value, &mut metadata);
        }

        let action = actions::categorize(&description);
        report.records.push(LogRecord {
            time,
            user,
            document,
            tab,
            description,
            action,
            metadata,
        });
    }
    if report.dropped() > 0 {
        tracing::info!(
            kept = report.records.len(),
            missing_fields = report.missing_field_drops,
            bad_timestamps = report.bad_timestamp_drops,
            "ingestion dropped invalid rows"
        );
    }
    report
}

fn is_known_key(key: &str) -> bool {
    TIME_KEYS.contains(&key)
        || USER_KEYS.contains(&key)
        || DOCUMENT_KEYS.contains(&key)
        || TAB_KEYS.contains(&key)
        || DESCRIPTION_KEYS.contains(&key)
}

fn lookup<'a>(obj: &'a serde_json::Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k))
}

fn string_of(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn flatten_value(prefix: &str, v: &Value, out: &mut BTreeMap<String, String>) {
    match v {
        Value::Object(map) => {
            for (k, v) in map {
                flatten_value(&format!("{prefix}.{k}"), v, out);
            }
        }
        Value::Array(arr) => {
            for (idx, item) in arr.iter().enumerate() {
                flatten_value(&format!("{prefix}.{idx}"), item, out);
            }
        }
        Value::Null => {
            out.insert(prefix.to_string(), "null".to_string());
        }
        Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        Value::Number(n) => {
            out.insert(prefix.to_string(), n.to_string());
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
    }
}

fn parse_time_value(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => n.as_i64().and_then(epoch_to_dt),
        _ => None,
    }
}

/// Parse a timestamp string to UTC. RFC 3339 first, then the dashboard's
/// common export shapes, then bare dates and epoch digits.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let fmts = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
    ];
    for f in fmts.iter() {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, f) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }
    for f in ["%Y-%m-%d", "%d-%m-%Y"] {
        if let Ok(nd) = NaiveDate::parse_from_str(s, f) {
            let ndt = nd.and_hms_opt(0, 0, 0)?;
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }
    if s.chars().all(|c| c.is_ascii_digit()) {
        return s.parse::<i64>().ok().and_then(epoch_to_dt);
    }
    None
}

fn epoch_to_dt(n: i64) -> Option<DateTime<Utc>> {
    // 13+ digits are epoch milliseconds, shorter is seconds
    if n >= 1_000_000_000_000 {
        DateTime::<Utc>::from_timestamp(n / 1000, ((n % 1000) as u32) * 1_000_000)
    } else {
        DateTime::<Utc>::from_timestamp(n, 0)
    }
}
