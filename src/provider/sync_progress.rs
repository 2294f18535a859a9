//! Utilities to track the progression of a reconciliation cycle

use std::fmt::{Display, Error, Formatter};

/// An event that happens during a cycle
#[derive(Clone, Debug, PartialEq)]
pub enum SyncEvent {
    /// No cycle has started yet
    NotStarted,
    /// A cycle has just started but no course is handled yet
    Started,
    /// A cycle is in progress.
    InProgress{ course: String, details: String },
    /// A cycle is finished
    Finished{ success: bool, updates: usize },
}

impl Display for SyncEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            SyncEvent::NotStarted => write!(f, "Not started"),
            SyncEvent::Started => write!(f, "Sync has started..."),
            SyncEvent::InProgress{course, details} => write!(f, "[{}] {}...", course, details),
            SyncEvent::Finished{success, updates} => match success {
                true => write!(f, "Sync successfully finished ({} update(s))", updates),
                false => write!(f, "Sync finished with errors ({} update(s))", updates),
            }
        }
    }
}

impl Default for SyncEvent {
    fn default() -> Self {
        Self::NotStarted
    }
}



/// See [`feedback_channel`]
pub type FeedbackSender = tokio::sync::watch::Sender<SyncEvent>;
/// See [`feedback_channel`]
pub type FeedbackReceiver = tokio::sync::watch::Receiver<SyncEvent>;

/// Create a feeback channel, that can be used to retrieve the current progress of a cycle
pub fn feedback_channel() -> (FeedbackSender, FeedbackReceiver) {
    tokio::sync::watch::channel(SyncEvent::default())
}




/// A structure that tracks the progression and the errors that happen during a cycle
pub struct SyncProgress {
    n_errors: u32,
    n_updates: usize,
    feedback_channel: Option<FeedbackSender>
}
impl SyncProgress {
    pub fn new() -> Self {
        Self { n_errors: 0, n_updates: 0, feedback_channel: None }
    }
    pub fn new_with_feedback_channel(channel: FeedbackSender) -> Self {
        Self { n_errors: 0, n_updates: 0, feedback_channel: Some(channel) }
    }

    pub fn is_success(&self) -> bool {
        self.n_errors == 0
    }

    /// Count operations that have been planned
    pub fn add_updates(&mut self, n: usize) {
        self.n_updates += n;
    }
    pub fn n_updates(&self) -> usize {
        self.n_updates
    }

    /// Log an error
    pub fn error(&mut self, text: &str) {
        log::error!("{}", text);
        self.n_errors += 1;
    }
    /// Log a warning
    pub fn warn(&mut self, text: &str) {
        log::warn!("{}", text);
        self.n_errors += 1;
    }
    /// Log an info
    pub fn info(&mut self, text: &str) {
        log::info!("{}", text);
    }
    /// Log a debug message
    pub fn debug(&mut self, text: &str) {
        log::debug!("{}", text);
    }
    /// Send an event as a feedback to the listener (if any).
    pub fn feedback(&mut self, event: SyncEvent) {
        if let Some(sender) = self.feedback_channel.as_ref() {
            // Nobody may be listening anymore, this is fine
            let _ = sender.send(event);
        }
    }
}

impl Default for SyncProgress {
    fn default() -> Self {
        Self::new()
    }
}
