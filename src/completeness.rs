//! Completion status of a work item

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Whether a work item has been done.
///
/// The course service knows three states, but checklists only store a checked/unchecked flag. \
/// Hence, [`Completeness::Unknown`] can never be read back from a checklist: it is pushed as an unchecked item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Completeness {
    Incomplete,
    /// This work item does not accept submissions, so there is no way to tell whether it has been done
    Unknown,
    Complete,
}

impl Completeness {
    /// Derive the completion status from submission metadata
    pub fn classify<T>(accepts_submissions: bool, submitted_at: Option<T>) -> Self {
        match (accepts_submissions, submitted_at) {
            (false, _) => Completeness::Unknown,
            (true, Some(_)) => Completeness::Complete,
            (true, None) => Completeness::Incomplete,
        }
    }

    /// The completion status of a checklist item
    pub fn from_checked(checked: bool) -> Self {
        if checked { Completeness::Complete } else { Completeness::Incomplete }
    }

    /// Whether a checklist item should be checked for this status
    pub fn is_complete(&self) -> bool {
        match self {
            Completeness::Complete => true,
            Completeness::Incomplete | Completeness::Unknown => false,
        }
    }

    /// A single character, for human display only
    pub fn glyph(&self) -> char {
        match self {
            Completeness::Incomplete => ' ',
            Completeness::Unknown => '?',
            Completeness::Complete => 'X',
        }
    }
}

impl Display for Completeness {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.glyph())
    }
}
