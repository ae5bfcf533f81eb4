use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::aggregate::{self, CountBucket};
use crate::chatbot::Responder;
use crate::config::Collection;
use crate::filters::FilterCriteria;
use crate::ingest::LogRecord;
use crate::search::GlossaryIndex;
use crate::workspace::Workspace;

/// The closed set of UI-triggered events. The web layer deserializes its
/// callbacks into these; there is no runtime handler registration.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    UploadLog {
        file_name: String,
        payload: Value,
    },
    SwitchLogSource {
        #[serde(default)]
        file_name: Option<String>,
    },
    ApplyFilters {
        #[serde(default)]
        criteria: FilterCriteria,
    },
    SearchQuery {
        query: String,
    },
    ChatMessage {
        message: String,
    },
    AcknowledgeAlerts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResultRow {
    pub term: String,
    pub definition: String,
    pub source_document: String,
    pub matched_stems: usize,
}

/// What each event resolves to. Store failures surface as `Failed`; no
/// event terminates the process.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventOutcome {
    LogUploaded {
        file_name: String,
        records: usize,
        missing_field_drops: usize,
        bad_timestamp_drops: usize,
    },
    SourceSwitched {
        source: String,
        records: usize,
    },
    FilteredView {
        total: usize,
        records: Vec<LogRecord>,
        by_action: Vec<CountBucket>,
    },
    SearchResults {
        hits: Vec<SearchResultRow>,
    },
    ChatReply {
        reply: String,
    },
    AlertsAcknowledged {
        cleared: usize,
    },
    Failed {
        message: String,
    },
}

/// Route one UI event to its handler. One explicit match, no dynamic
/// dispatch table.
pub fn dispatch(
    workspace: &mut Workspace,
    responder: &Responder,
    index: &GlossaryIndex,
    event: UiEvent,
) -> EventOutcome {
    match event {
        UiEvent::UploadLog { file_name, payload } => {
            match workspace.upload_log(&file_name, &payload) {
                Ok(()) => EventOutcome::LogUploaded {
                    file_name,
                    records: workspace.report.records.len(),
                    missing_field_drops: workspace.report.missing_field_drops,
                    bad_timestamp_drops: workspace.report.bad_timestamp_drops,
                },
                Err(e) => failed(e),
            }
        }
        UiEvent::SwitchLogSource { file_name } => {
            let (collection, name) = match file_name.as_deref() {
                None | Some(crate::workspace::DEFAULT_SOURCE) => (Collection::OnshapeLogs, None),
                Some(name) => (Collection::UploadedLogs, Some(name)),
            };
            match workspace.switch_log_source(collection, name) {
                Ok(()) => EventOutcome::SourceSwitched {
                    source: workspace.selected_source.clone(),
                    records: workspace.report.records.len(),
                },
                Err(e) => failed(e),
            }
        }
        UiEvent::ApplyFilters { criteria } => {
            let filtered = workspace.filtered(&criteria);
            let by_action = aggregate::by_action(filtered.iter().copied());
            EventOutcome::FilteredView {
                total: filtered.len(),
                records: filtered.into_iter().cloned().collect(),
                by_action,
            }
        }
        UiEvent::SearchQuery { query } => EventOutcome::SearchResults {
            hits: index
                .search(&query)
                .into_iter()
                .map(|hit| SearchResultRow {
                    term: hit.entry.term.clone(),
                    definition: hit.entry.definition.clone(),
                    source_document: hit.entry.source_document.clone(),
                    matched_stems: hit.matched_stems,
                })
                .collect(),
        },
        UiEvent::ChatMessage { message } => EventOutcome::ChatReply {
            reply: responder.respond(&message),
        },
        UiEvent::AcknowledgeAlerts => EventOutcome::AlertsAcknowledged {
            cleared: workspace.acknowledge_alerts(),
        },
    }
}

fn failed(e: crate::store::StoreError) -> EventOutcome {
    tracing::error!(error = %e, "event handling failed");
    EventOutcome::Failed { message: e.to_string() }
}
