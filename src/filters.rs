use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::LogRecord;

/// Optional constraints narrowing a record set. Absent fields impose no
/// constraint; the time range is closed on both ends.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    /// Matches the record's action label (e.g. "Undo", or a raw
    /// uncategorized description).
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.document.is_none()
            && self.user.is_none()
            && self.action.is_none()
            && self.start.is_none()
            && self.end.is_none()
    }

    fn accepts(&self, record: &LogRecord) -> bool {
        if let Some(document) = &self.document {
            if record.document != *document {
                return false;
            }
        }
        if let Some(user) = &self.user {
            if record.user != *user {
                return false;
            }
        }
        if let Some(action) = &self.action {
            if record.action.label() != action.as_str() {
                return false;
            }
        }
        if let Some(start) = self.start {
            if record.time < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if record.time > end {
                return false;
            }
        }
        true
    }
}

/// Keep the records passing every present criterion, in original order.
pub fn filter_records<'a>(
    records: &'a [LogRecord],
    criteria: &FilterCriteria,
) -> Vec<&'a LogRecord> {
    records.iter().filter(|r| criteria.accepts(r)).collect()
}
