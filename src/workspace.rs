use chrono::{DateTime, Utc};
use lru::LruCache;
use serde_json::{json, Value};
use std::num::NonZeroUsize;

use crate::aggregate::{self, CountBucket, DayBucket, FilterOptions};
use crate::alerts::{self, Alert, AlertStatus};
use crate::config::{AlertConfig, Collection};
use crate::filters::{filter_records, FilterCriteria};
use crate::ingest::{self, IngestReport, LogRecord};
use crate::store::{DocumentStore, StoreError};

pub const DEFAULT_SOURCE: &str = "Default Log";

// Bound on distinct log sources kept hot in memory.
const SOURCE_CACHE_CAPACITY: usize = 16;

/// Session-level state: the active log source, its derived aggregate
/// snapshots, and the alerts raised over it. Reloads go through an LRU
/// cache before touching the document store.
pub struct Workspace {
    store: Box<dyn DocumentStore>,
    alert_config: AlertConfig,
    cache: LruCache<String, Value>,
    pub selected_source: String,
    pub report: IngestReport,
    pub filter_options: FilterOptions,
    pub uploaded_logs: Vec<String>,
    pub activity_over_time: Vec<DayBucket>,
    pub document_usage: Vec<CountBucket>,
    pub user_activity: Vec<CountBucket>,
    pub time_bounds: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub alerts: Vec<Alert>,
}

impl Workspace {
    pub fn new(store: Box<dyn DocumentStore>, alert_config: AlertConfig) -> Self {
        let capacity = NonZeroUsize::new(SOURCE_CACHE_CAPACITY).expect("nonzero capacity");
        Self {
            store,
            alert_config,
            cache: LruCache::new(capacity),
            selected_source: DEFAULT_SOURCE.to_string(),
            report: IngestReport::default(),
            filter_options: FilterOptions::default(),
            uploaded_logs: vec![DEFAULT_SOURCE.to_string()],
            activity_over_time: Vec::new(),
            document_usage: Vec::new(),
            user_activity: Vec::new(),
            time_bounds: None,
            alerts: Vec::new(),
        }
    }

    /// Load the default log source.
    pub fn load_default(&mut self) -> Result<(), StoreError> {
        self.switch_log_source(Collection::OnshapeLogs, None)
    }

    /// Load a log source from cache or the store, then rebuild every
    /// derived snapshot. A missing source leaves an empty (but usable)
    /// workspace.
    pub fn switch_log_source(
        &mut self,
        collection: Collection,
        file_name: Option<&str>,
    ) -> Result<(), StoreError> {
        let source = file_name.unwrap_or(DEFAULT_SOURCE);
        let key = cache_key(collection, source);

        let payload = if let Some(cached) = self.cache.get(&key) {
            tracing::info!(source, "loaded log source from cache");
            Some(cached.clone())
        } else {
            match self.store.read(collection)? {
                Some(data) => {
                    self.cache.put(key, data.clone());
                    tracing::info!(source, "loaded log source from store and cached it");
                    Some(data)
                }
                None => {
                    tracing::warn!(source, collection = collection.path(), "no data for log source");
                    None
                }
            }
        };

        self.report = payload
            .as_ref()
            .and_then(|data| ingest::export_rows(data, file_name))
            .map(|rows| ingest::ingest_rows(rows))
            .unwrap_or_default();
        self.selected_source = source.to_string();
        self.refresh_uploaded_logs()?;
        self.refresh();
        Ok(())
    }

    /// Persist an uploaded export under its file name, then make it the
    /// active source.
    pub fn upload_log(&mut self, file_name: &str, payload: &Value) -> Result<(), StoreError> {
        let rows = ingest::export_rows(payload, None)
            .cloned()
            .unwrap_or_default();
        let entry = json!({ "fileName": file_name, "data": rows });
        let mut keyed = serde_json::Map::new();
        keyed.insert(file_name.to_string(), entry);
        self.store.write(Collection::UploadedLogs, &Value::Object(keyed))?;
        // drop any stale cached copy of the collection
        self.cache.pop(&cache_key(Collection::UploadedLogs, file_name));
        self.switch_log_source(Collection::UploadedLogs, Some(file_name))
    }

    /// Records passing the given criteria, original order.
    pub fn filtered(&self, criteria: &FilterCriteria) -> Vec<&LogRecord> {
        filter_records(&self.report.records, criteria)
    }

    pub fn unread_alerts(&self) -> usize {
        alerts::unread_count(&self.alerts)
    }

    pub fn acknowledge_alerts(&mut self) -> usize {
        let unread = self.unread_alerts();
        for alert in &mut self.alerts {
            alert.status = AlertStatus::Read;
        }
        unread
    }

    fn refresh_uploaded_logs(&mut self) -> Result<(), StoreError> {
        let mut names = vec![DEFAULT_SOURCE.to_string()];
        if let Some(Value::Object(map)) = self.store.read(Collection::UploadedLogs)? {
            for entry in map.values() {
                if let Some(name) = entry.get("fileName").and_then(Value::as_str) {
                    names.push(name.to_string());
                }
            }
        }
        self.uploaded_logs = names;
        Ok(())
    }

    fn refresh(&mut self) {
        let records = &self.report.records;
        self.filter_options = aggregate::filter_options(records.as_slice());
        self.activity_over_time = aggregate::activity_over_time(records);
        self.document_usage = aggregate::by_document(records);
        self.user_activity = aggregate::by_user(records);
        self.time_bounds = aggregate::time_bounds(records);
        self.alerts = alerts::detect_undo_redo_churn(records, &self.alert_config);
    }
}

fn cache_key(collection: Collection, source: &str) -> String {
    format!("{}::{}", collection.path(), source)
}
