//! Work items, as the reconciliation engine sees them

use std::fmt::{Display, Formatter};

use chrono::{Duration, Timelike};

use crate::completeness::Completeness;
use crate::error::{Error, Result};
use crate::item::{ChecklistItem, SourceItem};
use crate::time::{self, DueDate};

/// A work item, either fetched from the course service or read back from a checklist.
///
/// Two tasks are equal when their name, due date and completeness are the same. \
/// Two tasks are about the same work when they share the same [`identity key`](Task::identity_key), whatever their completeness.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    name: String,
    /// Always has zero seconds, so that it survives a round trip through its display string
    due_date: Option<DueDate>,
    completeness: Completeness,
}

impl Task {
    /// Create a task. The due date is truncated to the minute.
    pub fn new<S: ToString>(name: S, due_date: Option<DueDate>, completeness: Completeness) -> Self {
        Self {
            name: name.to_string(),
            due_date: due_date.map(truncate_to_minute),
            completeness,
        }
    }

    /// Build a task from a work item of the course service
    pub fn from_source_item(item: &SourceItem) -> Result<Self> {
        let due_date = time::parse_source_timestamp(item.due_at.as_deref())?;
        let completeness = Completeness::classify(item.accepts_submissions, item.submitted_at);
        Ok(Self::new(&item.name, due_date, completeness))
    }

    /// Parse the text of a checklist item, that must be `<name> (<due date>)`.
    ///
    /// The name is everything before the last ` (`.
    /// Because checklists only know checked and unchecked items, the result is either [`Completeness::Complete`] or [`Completeness::Incomplete`]
    pub fn from_checklist_text(text: &str, checked: bool) -> Result<Self> {
        let body = text
            .strip_suffix(')')
            .ok_or_else(|| Error::parse(text, "it does not end with a parenthesized due date"))?;
        let (name, date) = body
            .rsplit_once(" (")
            .ok_or_else(|| Error::parse(text, "it does not end with a parenthesized due date"))?;
        if date.contains(')') {
            return Err(Error::parse(text, "unbalanced parentheses around the due date"));
        }

        let due_date = time::parse_display(date).map_err(|err| match err {
            Error::Parse { reason, .. } => Error::parse(text, reason),
            other => other,
        })?;

        Ok(Self {
            name: name.to_string(),
            due_date,
            completeness: Completeness::from_checked(checked),
        })
    }

    pub fn from_checklist_item(item: &ChecklistItem) -> Result<Self> {
        Self::from_checklist_text(&item.text, item.checked)
    }

    pub fn name(&self) -> &str                  { &self.name }
    pub fn due_date(&self) -> Option<&DueDate>  { self.due_date.as_ref() }
    pub fn completeness(&self) -> Completeness  { self.completeness }

    /// The `(name, due date)` pair that tells whether two tasks are about the same work
    pub fn identity_key(&self) -> (&str, Option<&DueDate>) {
        (self.name.as_str(), self.due_date.as_ref())
    }

    /// Whether both tasks are about the same work, regardless of their completeness
    pub fn same_work_as(&self, other: &Task) -> bool {
        self.identity_key() == other.identity_key()
    }

    /// The text of the checklist item for this task.
    ///
    /// It only depends on the identity key, not on the completeness
    pub fn checklist_text(&self) -> String {
        format!("{} ({})", self.name, time::format_display(self.due_date.as_ref()))
    }

    /// Whether the checklist item for this task should be checked
    pub fn checked(&self) -> bool {
        self.completeness.is_complete()
    }

    /// The key to sort tasks by due date. Tasks without due date go last
    pub fn sort_key(&self) -> DueDate {
        self.due_date.unwrap_or_else(time::max_sentinel)
    }
}

impl Display for Task {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {:^20}: {}", self.completeness, time::format_display(self.due_date.as_ref()), self.name)
    }
}

/// Sort tasks by due date (see [`Task::sort_key`]). Tasks that are due at the same time keep their relative order
pub fn sort_by_due_date(tasks: &mut [Task]) {
    tasks.sort_by_key(|task| task.sort_key());
}

fn truncate_to_minute(date: DueDate) -> DueDate {
    date - Duration::seconds(i64::from(date.second())) - Duration::nanoseconds(i64::from(date.nanosecond()))
}
