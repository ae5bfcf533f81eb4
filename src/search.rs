use ahash::AHashMap;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};

use crate::stemmer;

/// One glossary definition, reachable from every stem it contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    pub term: String,
    pub definition: String,
    #[serde(default)]
    pub source_document: String,
}

/// A ranked search result borrowed from the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit<'a> {
    pub entry: &'a GlossaryEntry,
    /// How many distinct query stems matched this entry.
    pub matched_stems: usize,
}

/// Stemmed inverted index over glossary entries. Built once, read-only.
#[derive(Debug, Default)]
pub struct GlossaryIndex {
    entries: Vec<GlossaryEntry>,
    postings: AHashMap<String, BTreeSet<usize>>,
}

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

// The dashboard's small stop set; applied before stemming.
const STOP_WORDS: &[&str] = &["a", "an", "the", "and", "or", "in", "on", "at"];

/// Lowercase, stop-word-strip and stem every word of `text`.
pub fn tokenize(text: &str) -> Vec<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .map(|w| stemmer::stem(&w))
        .collect()
}

impl GlossaryIndex {
    /// Index each entry's term and definition. One entry may be reachable
    /// from many stems; multiplicity is not tracked.
    pub fn build(entries: Vec<GlossaryEntry>) -> Self {
        let mut postings: AHashMap<String, BTreeSet<usize>> = AHashMap::new();
        for (id, entry) in entries.iter().enumerate() {
            let text = format!("{} {}", entry.term, entry.definition);
            for stem in tokenize(&text) {
                postings.entry(stem).or_default().insert(id);
            }
        }
        Self { entries, postings }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[GlossaryEntry] {
        &self.entries
    }

    /// Union the postings of all query stems and rank entries by how many
    /// distinct stems they matched, ties broken by original entry order.
    /// Empty queries and misses return an empty vector.
    pub fn search(&self, query: &str) -> Vec<SearchHit<'_>> {
        let stems: HashSet<String> = tokenize(query).into_iter().collect();
        if stems.is_empty() {
            return Vec::new();
        }
        let mut matches: AHashMap<usize, usize> = AHashMap::new();
        for stem in &stems {
            if let Some(ids) = self.postings.get(stem) {
                for &id in ids {
                    *matches.entry(id).or_insert(0) += 1;
                }
            }
        }
        matches
            .into_iter()
            .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
            .map(|(id, matched_stems)| SearchHit {
                entry: &self.entries[id],
                matched_stems,
            })
            .collect()
    }
}

/// Parse glossary entries from their persisted collection. Entries missing
/// a term or definition are skipped and counted.
pub fn parse_entries(raw: &Value) -> (Vec<GlossaryEntry>, usize) {
    let mut entries = Vec::new();
    let mut skipped = 0usize;
    let items: Vec<&Value> = match raw {
        Value::Array(list) => list.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => {
            tracing::warn!("glossary payload is neither a list nor a keyed object");
            return (entries, 0);
        }
    };
    for item in items {
        match serde_json::from_value::<GlossaryEntry>(item.clone()) {
            Ok(entry) if !entry.term.trim().is_empty() && !entry.definition.trim().is_empty() => {
                entries.push(entry)
            }
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::warn!(skipped, "glossary load skipped malformed entries");
    }
    (entries, skipped)
}
