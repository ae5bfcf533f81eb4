use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use std::fs;

use shapeflow::aggregate;
use shapeflow::alerts::{self, Alert};
use shapeflow::chatbot::{PatternStore, Responder};
use shapeflow::config::AlertConfig;
use shapeflow::filters::{self, FilterCriteria};
use shapeflow::ingest::{self, parse_timestamp};
use shapeflow::search::{self, GlossaryIndex};

#[derive(Parser, Debug)]
#[command(name = "shapeflow", version, about = "CAD activity-log analytics")]
struct Cli {
    /// Activity-log export file (JSON)
    input: Option<String>,

    /// Chat pattern config file (JSON); required for --chat
    #[arg(long)]
    patterns: Option<String>,
    /// Glossary entries file (JSON); required for --search
    #[arg(long)]
    glossary: Option<String>,

    // Filters applied before aggregation
    #[arg(long)]
    user: Option<String>,
    #[arg(long)]
    document: Option<String>,
    #[arg(long)]
    action: Option<String>,
    #[arg(long)]
    start: Option<String>,
    #[arg(long)]
    end: Option<String>,

    /// One-shot chatbot message
    #[arg(long)]
    chat: Option<String>,
    /// One-shot glossary search query
    #[arg(long)]
    search: Option<String>,
}

#[derive(Serialize)]
struct Summary {
    source: String,
    records: usize,
    missing_field_drops: usize,
    bad_timestamp_drops: usize,
    filtered: usize,
    time_bounds: Option<(DateTime<Utc>, DateTime<Utc>)>,
    by_action: Vec<aggregate::CountBucket>,
    by_user: Vec<aggregate::CountBucket>,
    by_document: Vec<aggregate::CountBucket>,
    activity_over_time: Vec<aggregate::DayBucket>,
    work_patterns: Vec<aggregate::WorkPatternBucket>,
    time_spent_per_tab: Vec<aggregate::TabTime>,
    alerts: Vec<Alert>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Some(message) = &cli.chat {
        let path = cli
            .patterns
            .as_deref()
            .context("--chat requires --patterns <file>")?;
        let config = read_json(path)?;
        let (store, report) = PatternStore::load(&config);
        for skipped in &report.skipped {
            eprintln!(
                "skipped pattern in {}: {:?} ({})",
                skipped.category, skipped.pattern, skipped.reason
            );
        }
        let responder = Responder::new(store);
        println!("{}", responder.respond(message));
        return Ok(());
    }

    if let Some(query) = &cli.search {
        let path = cli
            .glossary
            .as_deref()
            .context("--search requires --glossary <file>")?;
        let raw = read_json(path)?;
        let (entries, skipped) = search::parse_entries(&raw);
        if skipped > 0 {
            eprintln!("skipped {skipped} malformed glossary entries");
        }
        let index = GlossaryIndex::build(entries);
        let hits: Vec<_> = index
            .search(query)
            .into_iter()
            .map(|h| (h.entry.term.clone(), h.matched_stems))
            .collect();
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    let input = cli.input.as_deref().context("no input file given")?;
    let raw = read_json(input)?;
    let report = ingest::ingest_export(&raw);

    let criteria = FilterCriteria {
        document: cli.document.clone(),
        user: cli.user.clone(),
        action: cli.action.clone(),
        start: parse_bound(cli.start.as_deref())?,
        end: parse_bound(cli.end.as_deref())?,
    };
    let filtered = filters::filter_records(&report.records, &criteria);
    let view = || filtered.iter().copied();

    let summary = Summary {
        source: input.to_string(),
        records: report.records.len(),
        missing_field_drops: report.missing_field_drops,
        bad_timestamp_drops: report.bad_timestamp_drops,
        filtered: filtered.len(),
        time_bounds: aggregate::time_bounds(view()),
        by_action: aggregate::by_action(view()),
        by_user: aggregate::by_user(view()),
        by_document: aggregate::by_document(view()),
        activity_over_time: aggregate::activity_over_time(view()),
        work_patterns: aggregate::work_patterns(view()),
        time_spent_per_tab: aggregate::time_spent_per_tab(view()),
        alerts: alerts::detect_undo_redo_churn(view(), &AlertConfig::from_env()),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn read_json(path: &str) -> Result<Value> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {path} as JSON"))
}

fn parse_bound(raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match raw {
        None => Ok(None),
        Some(s) => {
            let t = parse_timestamp(s).with_context(|| format!("unparseable time bound: {s}"))?;
            Ok(Some(t))
        }
    }
}
