//! This crate mirrors work items (assignments) of a course-management service into checklist notes.
//!
//! Work items are fetched from a [`CourseSource`](traits::CourseSource), such as the Canvas [`client`]. \
//! They are mirrored into a [`ChecklistBackend`](traits::ChecklistBackend), such as the local [`cache`].
//!
//! The [`reconcile`] module compares both sides and computes the minimal set of updates to apply. \
//! It never erases anything on the checklist side: items are only ever added or checked, so that users' edits are kept. \
//! A [`Provider`](provider::Provider) runs this reconciliation periodically.

pub mod traits;

pub mod time;
pub use time::{DueDate, NO_DUE_DATE};
pub mod completeness;
pub use completeness::Completeness;
pub mod task;
pub use task::Task;
pub mod item;
pub use item::{ChecklistItem, SourceItem};
pub mod course;
pub use course::{Course, CourseId};
pub mod reconcile;
pub use reconcile::{CoursePlan, Update, UpdatePlan};
pub mod provider;
pub use provider::Provider;

pub mod client;
pub mod cache;

pub mod config;
pub mod error;
pub use error::Error;
pub mod utils;
pub mod mock_behaviour;
