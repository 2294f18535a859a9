//! Errors raised by the task model and the configuration loader
//!
//! Network and storage failures of the collaborators (see [`crate::traits`]) are not listed here: they are reported as `Box<dyn Error>` and handled by the [`Provider`](crate::Provider).

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A checklist item text does not follow the `<name> (<date>)` grammar, or its date is not a display date
    #[error("unable to parse checklist item {text:?}: {reason}")]
    Parse { text: String, reason: String },

    /// A due date sent by the course service is present, but is not a valid timestamp
    #[error("malformed due date {value:?}: {reason}")]
    MalformedDueDate { value: String, reason: String },

    #[error("unable to read config file {path:?}: {source}")]
    ConfigRead { path: PathBuf, source: std::io::Error },

    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("config validation error: {0}")]
    ConfigValidation(String),
}

impl Error {
    pub(crate) fn parse<T: ToString, R: ToString>(text: T, reason: R) -> Self {
        Self::Parse { text: text.to_string(), reason: reason.to_string() }
    }

    pub(crate) fn malformed_due_date<T: ToString, R: ToString>(value: T, reason: R) -> Self {
        Self::MalformedDueDate { value: value.to_string(), reason: reason.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
