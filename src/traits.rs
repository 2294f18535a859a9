//! The collaborators of the reconciliation engine
//!
//! The engine only depends on these traits, so that other course services or checklist backends can be plugged in.

use std::error::Error;
use std::collections::HashMap;

use async_trait::async_trait;

use crate::course::{Course, CourseId};
use crate::item::{ChecklistItem, SourceItem};
use crate::reconcile::UpdatePlan;

/// A service that provides work items (e.g. a course-management service)
#[async_trait]
pub trait CourseSource {
    /// Returns the work items of a course, along with the submission status of the current user.
    /// This may be a long process, that can fail (e.g. in case of a remote server)
    async fn fetch_work_items(&self, course: CourseId) -> Result<Vec<SourceItem>, Box<dyn Error>>;
}

/// A service that stores checklists, one per course
#[async_trait]
pub trait ChecklistBackend {
    /// Returns the items of the checklist of every given course.
    /// Courses that have no checklist yet are mapped to an empty list.
    async fn read_state(&mut self, courses: &[Course]) -> Result<HashMap<CourseId, Vec<ChecklistItem>>, Box<dyn Error>>;

    /// Apply an update plan, and commit the result.
    ///
    /// * an added task creates an item whose text is [`Task::checklist_text`](crate::Task::checklist_text), checked if the task is complete
    /// * a task marked as complete checks the existing item with the same text
    ///
    /// The items of every updated checklist are then sorted by due date.
    async fn apply_plan(&mut self, plan: &UpdatePlan, courses: &[Course]) -> Result<(), Box<dyn Error>>;
}
