use serde::{Serialize, Serializer};

/// Known activity categories. Unrecognized descriptions pass through as
/// `Other` with the raw label intact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionType {
    Undo,
    Redo,
    Insert,
    Export,
    Edit,
    Commit,
    Add,
    Close,
    Move,
    Open,
    Other(String),
}

// Keyword scan order matters: first hit wins.
const KEYWORDS: &[(&str, ActionType)] = &[
    ("undo", ActionType::Undo),
    ("redo", ActionType::Redo),
    ("insert", ActionType::Insert),
    ("export", ActionType::Export),
    ("edit", ActionType::Edit),
    ("commit", ActionType::Commit),
    ("add", ActionType::Add),
    ("close", ActionType::Close),
    ("move", ActionType::Move),
    ("open", ActionType::Open),
];

impl ActionType {
    pub fn label(&self) -> &str {
        match self {
            ActionType::Undo => "Undo",
            ActionType::Redo => "Redo",
            ActionType::Insert => "Insert",
            ActionType::Export => "Export",
            ActionType::Edit => "Edit",
            ActionType::Commit => "Commit",
            ActionType::Add => "Add",
            ActionType::Close => "Close",
            ActionType::Move => "Move",
            ActionType::Open => "Open",
            ActionType::Other(raw) => raw,
        }
    }

    pub fn is_undo_redo(&self) -> bool {
        matches!(self, ActionType::Undo | ActionType::Redo)
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ActionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Categorize a free-text action description by keyword.
pub fn categorize(description: &str) -> ActionType {
    let lower = description.to_lowercase();
    for (keyword, action) in KEYWORDS {
        if lower.contains(keyword) {
            return action.clone();
        }
    }
    ActionType::Other(description.to_string())
}

/// Coarse split used by the activity charts: modeling edits count as
/// advanced, navigation and bookkeeping as basic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Tier {
    Advanced,
    Basic,
}

pub fn tier(action: &ActionType) -> Tier {
    match action {
        ActionType::Edit | ActionType::Add | ActionType::Insert => Tier::Advanced,
        ActionType::Other(raw) => {
            let lower = raw.to_lowercase();
            if lower.contains("create") || lower.contains("delete") {
                Tier::Advanced
            } else {
                Tier::Basic
            }
        }
        _ => Tier::Basic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorize_matches_known_keywords() {
        assert_eq!(categorize("Undo operation"), ActionType::Undo);
        assert_eq!(categorize("Edit sketch dimensions"), ActionType::Edit);
        assert_eq!(categorize("Close document tab"), ActionType::Close);
    }

    #[test]
    fn categorize_is_case_insensitive_and_first_match_wins() {
        assert_eq!(categorize("REDO feature"), ActionType::Redo);
        // "undo" is scanned before "redo"
        assert_eq!(categorize("undo of redo"), ActionType::Undo);
    }

    #[test]
    fn unknown_descriptions_pass_through() {
        let action = categorize("Rotate view");
        assert_eq!(action, ActionType::Other("Rotate view".to_string()));
        assert_eq!(action.label(), "Rotate view");
    }

    #[test]
    fn undo_redo_classification_is_per_record() {
        assert!(categorize("Undo").is_undo_redo());
        assert!(categorize("Redo").is_undo_redo());
        assert!(!categorize("Open part studio").is_undo_redo());
    }

    #[test]
    fn tier_splits_advanced_from_basic() {
        assert_eq!(tier(&ActionType::Edit), Tier::Advanced);
        assert_eq!(tier(&ActionType::Open), Tier::Basic);
        assert_eq!(tier(&categorize("Create assembly")), Tier::Advanced);
        assert_eq!(tier(&categorize("Rotate view")), Tier::Basic);
    }
}
