use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::actions::{self, Tier};
use crate::ingest::LogRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountBucket {
    pub key: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkPatternBucket {
    pub day: String,
    pub hour: u32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabTime {
    pub tab: String,
    pub seconds: i64,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierBucket {
    pub user: String,
    pub tier: Tier,
    pub count: usize,
}

/// Dropdown data for the filter panel.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub documents: Vec<String>,
    pub users: Vec<String>,
    pub descriptions: Vec<String>,
}

fn count_by<'a, I, F>(records: I, key_of: F) -> Vec<CountBucket>
where
    I: IntoIterator<Item = &'a LogRecord>,
    F: Fn(&LogRecord) -> String,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for r in records {
        *counts.entry(key_of(r)).or_insert(0) += 1;
    }
    // value_counts ordering: count descending, key ascending on ties
    counts
        .into_iter()
        .map(|(key, count)| CountBucket { key, count })
        .sorted_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)))
        .collect()
}

pub fn by_action<'a, I: IntoIterator<Item = &'a LogRecord>>(records: I) -> Vec<CountBucket> {
    count_by(records, |r| r.action.label().to_string())
}

pub fn by_user<'a, I: IntoIterator<Item = &'a LogRecord>>(records: I) -> Vec<CountBucket> {
    count_by(records, |r| r.user.clone())
}

pub fn by_document<'a, I: IntoIterator<Item = &'a LogRecord>>(records: I) -> Vec<CountBucket> {
    count_by(records, |r| r.document.clone())
}

/// Daily activity counts, ascending by date.
pub fn activity_over_time<'a, I: IntoIterator<Item = &'a LogRecord>>(records: I) -> Vec<DayBucket> {
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for r in records {
        *counts.entry(r.time.date_naive()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(date, count)| DayBucket { date, count })
        .collect()
}

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Action counts per (weekday, hour-of-day), ordered Monday..Sunday then by
/// hour.
pub fn work_patterns<'a, I: IntoIterator<Item = &'a LogRecord>>(
    records: I,
) -> Vec<WorkPatternBucket> {
    let mut counts: BTreeMap<(u32, u32), usize> = BTreeMap::new();
    for r in records {
        let key = (r.time.weekday().num_days_from_monday(), r.time.hour());
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|((day_idx, hour), count)| WorkPatternBucket {
            day: DAY_NAMES[day_idx as usize].to_string(),
            hour,
            count,
        })
        .collect()
}

/// Per-user advanced/basic action counts.
pub fn tier_breakdown<'a, I: IntoIterator<Item = &'a LogRecord>>(records: I) -> Vec<TierBucket> {
    let mut counts: BTreeMap<(String, &'static str), (Tier, usize)> = BTreeMap::new();
    for r in records {
        let tier = actions::tier(&r.action);
        let tag = match tier {
            Tier::Advanced => "Advanced",
            Tier::Basic => "Basic",
        };
        counts
            .entry((r.user.clone(), tag))
            .and_modify(|(_, c)| *c += 1)
            .or_insert((tier, 1));
    }
    counts
        .into_iter()
        .map(|((user, _), (tier, count))| TierBucket { user, tier, count })
        .collect()
}

// Gaps above this are treated as the user walking away, not dwell time.
const MAX_DWELL_GAP_SECS: i64 = 1800;

/// Time spent per tab, summed from consecutive-record deltas within each
/// tab. Records without a tab are ignored.
pub fn time_spent_per_tab<'a, I: IntoIterator<Item = &'a LogRecord>>(records: I) -> Vec<TabTime> {
    let tabbed: Vec<(&str, DateTime<Utc>)> = records
        .into_iter()
        .filter_map(|r| r.tab.as_deref().map(|tab| (tab, r.time)))
        .sorted()
        .collect();

    let mut totals: BTreeMap<String, i64> = BTreeMap::new();
    for (&(tab_a, t_a), &(tab_b, t_b)) in tabbed.iter().tuple_windows() {
        if tab_a != tab_b {
            continue;
        }
        let delta = (t_b - t_a).num_seconds();
        if delta > 0 && delta <= MAX_DWELL_GAP_SECS {
            *totals.entry(tab_a.to_string()).or_insert(0) += delta;
        }
    }
    totals
        .into_iter()
        .map(|(tab, seconds)| TabTime {
            tab,
            seconds,
            hours: (seconds as f64 / 3600.0 * 100.0).round() / 100.0,
        })
        .collect()
}

/// Unique values per filterable column, first-seen order.
pub fn filter_options<'a, I: IntoIterator<Item = &'a LogRecord> + Copy>(
    records: I,
) -> FilterOptions {
    FilterOptions {
        documents: distinct(records, |r| r.document.as_str()),
        users: distinct(records, |r| r.user.as_str()),
        descriptions: distinct(records, |r| r.description.as_str()),
    }
}

fn distinct<'a, I, F>(records: I, field: F) -> Vec<String>
where
    I: IntoIterator<Item = &'a LogRecord>,
    F: Fn(&'a LogRecord) -> &'a str,
{
    records
        .into_iter()
        .map(field)
        .unique()
        .map(str::to_string)
        .collect()
}

/// Earliest and latest record timestamps, for the date-picker bounds.
pub fn time_bounds<'a, I: IntoIterator<Item = &'a LogRecord>>(
    records: I,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    records
        .into_iter()
        .map(|r| r.time)
        .minmax()
        .into_option()
}

/// Floor a timestamp onto a bucket boundary.
pub(crate) fn floor_time(t: DateTime<Utc>, bucket: Duration) -> DateTime<Utc> {
    let secs = bucket.num_seconds();
    if secs <= 0 {
        return t;
    }
    let ts = t.timestamp();
    let floored = ts - ts.rem_euclid(secs);
    DateTime::<Utc>::from_timestamp(floored, 0).unwrap_or(t)
}
