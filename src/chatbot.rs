use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use serde_json::Value;

/// Returned whenever no configured pattern matches the input.
pub const FALLBACK_RESPONSE: &str = "Sorry, I don't have information on that specific topic. \
If you need help, type 'help' in the chat.";

/// One compiled chat rule: a case-insensitive regex and its candidate
/// replies. Load order is observable behavior and must not be disturbed.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub category: String,
    pub source: String,
    pub regex: Regex,
    pub responses: Vec<String>,
}

/// A configuration entry rejected at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPattern {
    pub category: String,
    pub pattern: String,
    pub reason: String,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: Vec<SkippedPattern>,
}

/// Ordered pattern set, built once at startup and read-only afterward.
#[derive(Debug, Default)]
pub struct PatternStore {
    patterns: Vec<Pattern>,
}

impl PatternStore {
    /// Load from a config document mapping category names to lists of
    /// `{pattern, responses}`. Malformed entries are skipped and reported;
    /// the remainder still loads.
    pub fn load(config: &Value) -> (Self, LoadReport) {
        let mut store = Self::default();
        let mut report = LoadReport::default();
        let Value::Object(categories) = config else {
            tracing::warn!("chat pattern config is not an object; no patterns loaded");
            return (store, report);
        };
        for (category, entries) in categories {
            let Value::Array(entries) = entries else {
                report.skipped.push(SkippedPattern {
                    category: category.clone(),
                    pattern: String::new(),
                    reason: "category is not a list".to_string(),
                });
                continue;
            };
            for entry in entries {
                match parse_entry(category, entry) {
                    Ok(pattern) => store.patterns.push(pattern),
                    Err(skipped) => {
                        tracing::warn!(
                            category = %skipped.category,
                            pattern = %skipped.pattern,
                            reason = %skipped.reason,
                            "skipping invalid chat pattern"
                        );
                        report.skipped.push(skipped);
                    }
                }
            }
        }
        report.loaded = store.patterns.len();
        (store, report)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }
}

fn parse_entry(category: &str, entry: &Value) -> Result<Pattern, SkippedPattern> {
    let skip = |pattern: &str, reason: String| SkippedPattern {
        category: category.to_string(),
        pattern: pattern.to_string(),
        reason,
    };
    let Value::Object(obj) = entry else {
        return Err(skip("", "entry is not an object".to_string()));
    };
    let Some(source) = obj.get("pattern").and_then(Value::as_str) else {
        return Err(skip("", "missing pattern string".to_string()));
    };
    let responses: Vec<String> = match obj.get("responses") {
        Some(Value::Array(list)) => list
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };
    if responses.is_empty() {
        return Err(skip(source, "no responses".to_string()));
    }
    let regex = RegexBuilder::new(source)
        .case_insensitive(true)
        .build()
        .map_err(|e| skip(source, e.to_string()))?;
    Ok(Pattern {
        category: category.to_string(),
        source: source.to_string(),
        regex,
        responses,
    })
}

/// Answers free text against a loaded pattern store. Pure apart from the
/// choice of response template.
pub struct Responder {
    store: PatternStore,
}

impl Responder {
    pub fn new(store: PatternStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &PatternStore {
        &self.store
    }

    /// First matching pattern wins; one of its templates is chosen
    /// uniformly at random. No match yields the fixed fallback.
    pub fn respond(&self, input: &str) -> String {
        self.respond_with_rng(input, &mut rand::thread_rng())
    }

    /// Same as [`respond`](Self::respond) with an injected random source,
    /// so tests can pin the template choice.
    pub fn respond_with_rng<R: Rng>(&self, input: &str, rng: &mut R) -> String {
        for pattern in self.store.patterns() {
            if let Some(caps) = pattern.regex.captures(input) {
                // load() guarantees a non-empty response list
                let Some(template) = pattern.responses.choose(rng) else {
                    continue;
                };
                return substitute(template, &caps);
            }
        }
        FALLBACK_RESPONSE.to_string()
    }
}

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"%(\d+)").unwrap());

// %1, %2, ... refer to capture groups; unmatched groups substitute empty.
fn substitute(template: &str, caps: &regex::Captures<'_>) -> String {
    PLACEHOLDER
        .replace_all(template, |m: &regex::Captures<'_>| {
            let idx: usize = m[1].parse().unwrap_or(0);
            caps.get(idx).map(|g| g.as_str()).unwrap_or("").to_string()
        })
        .into_owned()
}
