use chrono::Duration;

/// Collections in the external document store. The store is consumed, not
/// owned: paths match what the hosting platform provisioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    OnshapeLogs,
    UploadedLogs,
    GlossaryWords,
    IndexWords,
    BotPrompts,
    SystemLogs,
}

impl Collection {
    pub fn path(self) -> &'static str {
        match self {
            Collection::OnshapeLogs => "/onShapeLogs",
            Collection::UploadedLogs => "/uploaded-jsons",
            Collection::GlossaryWords => "/base-glossary-words",
            Collection::IndexWords => "/indices-words",
            Collection::BotPrompts => "/chatbot-patterns",
            Collection::SystemLogs => "/system-logs",
        }
    }
}

/// Tuning for undo/redo churn alerts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertConfig {
    /// Bucket width for grouping undo/redo events.
    pub window: Duration,
    /// A (user, document, window) bucket must exceed this count to alert.
    pub undo_redo_threshold: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self { window: Duration::hours(1), undo_redo_threshold: 15 }
    }
}

impl AlertConfig {
    /// Read overrides from the environment. Unparseable or non-positive
    /// values keep the defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(raw) = std::env::var("SHAPEFLOW_ALERT_WINDOW_SECS") {
            match raw.parse::<i64>() {
                Ok(secs) if secs > 0 => cfg.window = Duration::seconds(secs),
                _ => tracing::warn!(value = %raw, "ignoring invalid SHAPEFLOW_ALERT_WINDOW_SECS"),
            }
        }
        if let Ok(raw) = std::env::var("SHAPEFLOW_UNDO_REDO_THRESHOLD") {
            match raw.parse::<usize>() {
                Ok(n) if n > 0 => cfg.undo_redo_threshold = n,
                _ => tracing::warn!(value = %raw, "ignoring invalid SHAPEFLOW_UNDO_REDO_THRESHOLD"),
            }
        }
        cfg
    }
}
