//! Raw records, as exchanged with the collaborators (the course service and the checklist backend)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A work item, as fetched from the course service
#[derive(Clone, Debug, PartialEq)]
pub struct SourceItem {
    pub name: String,
    /// An RFC 3339 timestamp, or `None` in case this item has no due date
    pub due_at: Option<String>,
    /// Whether this work item accepts submissions at all
    pub accepts_submissions: bool,
    /// When the current user submitted this work item (if ever)
    pub submitted_at: Option<DateTime<Utc>>,
}

/// An item of a checklist note
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub text: String,
    pub checked: bool,
}

impl ChecklistItem {
    pub fn new<S: ToString>(text: S, checked: bool) -> Self {
        Self { text: text.to_string(), checked }
    }
}
