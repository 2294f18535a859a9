//! The reconciliation engine
//!
//! It compares the tasks currently stored in a checklist with the tasks freshly fetched from the course service, and computes what should be done to the checklist so that they agree. \
//! It never removes an item and never un-checks one: whatever a user did on the checklist side is kept.

use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Formatter};

use crate::completeness::Completeness;
use crate::course::CourseId;
use crate::task::Task;

/// An operation to apply to a checklist
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Update {
    /// Create an item for this task (checked if the task is complete)
    Add(Task),
    /// Check the existing item of this task
    MarkComplete(Task),
}

impl Update {
    pub fn task(&self) -> &Task {
        match self {
            Update::Add(task) => task,
            Update::MarkComplete(task) => task,
        }
    }
}

impl Display for Update {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Update::Add(task) => write!(f, "+ {}", task),
            Update::MarkComplete(task) => write!(f, "✓ {}", task),
        }
    }
}


/// The operations to apply to the checklist of a single course, in the order the tasks were fetched
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoursePlan {
    updates: Vec<Update>,
}

impl CoursePlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, update: Update) {
        self.updates.push(update);
    }

    pub fn updates(&self) -> &[Update] { &self.updates }
    pub fn is_empty(&self) -> bool     { self.updates.is_empty() }
    pub fn len(&self) -> usize         { self.updates.len() }

    /// The tasks to add, in fetch order
    pub fn additions(&self) -> impl Iterator<Item = &Task> {
        self.updates.iter().filter_map(|update| match update {
            Update::Add(task) => Some(task),
            Update::MarkComplete(_) => None,
        })
    }

    /// The tasks to mark as complete, in fetch order
    pub fn completions(&self) -> impl Iterator<Item = &Task> {
        self.updates.iter().filter_map(|update| match update {
            Update::Add(_) => None,
            Update::MarkComplete(task) => Some(task),
        })
    }
}


/// The operations to apply to every course
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdatePlan {
    courses: BTreeMap<CourseId, CoursePlan>,
}

impl UpdatePlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, course: CourseId, plan: CoursePlan) {
        self.courses.insert(course, plan);
    }

    /// The plan for a course, or `None` in case this course has not been reconciled
    pub fn course(&self, course: CourseId) -> Option<&CoursePlan> {
        self.courses.get(&course)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CourseId, &CoursePlan)> {
        self.courses.iter()
    }

    /// Whether there is nothing to do at all
    pub fn is_empty(&self) -> bool {
        self.courses.values().all(|plan| plan.is_empty())
    }

    /// The total count of operations
    pub fn len(&self) -> usize {
        self.courses.values().map(|plan| plan.len()).sum()
    }
}


/// Compute what should be done to the checklist of a single course.
///
/// `stored` are the tasks read back from the checklist, `fetched` are the tasks from the course service (already filtered and sorted).
/// Every fetched task is considered in turn:
/// * if the very same task is stored, there is nothing to do
/// * if a stored task is about the same work (see [`Task::same_work_as`]), the fetched task is marked as complete if it is complete, and left alone otherwise
/// * otherwise, it is added
///
/// Stored tasks that are not fetched anymore are left untouched.
pub fn reconcile_course(stored: &[Task], fetched: &[Task]) -> CoursePlan {
    let mut plan = CoursePlan::new();

    for task in fetched {
        if stored.iter().any(|stored_task| stored_task == task) {
            log::trace!("Already in sync: {}", task);
            continue;
        }

        match stored.iter().find(|stored_task| stored_task.same_work_as(task)) {
            Some(counterpart) => match task.completeness() {
                Completeness::Complete => {
                    log::debug!("Newly completed: {}", task);
                    plan.push(Update::MarkComplete(task.clone()));
                },
                Completeness::Incomplete | Completeness::Unknown => {
                    log::trace!("Keeping {} as it is on the checklist ({})", task, counterpart.completeness());
                },
            },
            None => {
                log::debug!("New task: {}", task);
                plan.push(Update::Add(task.clone()));
            },
        }
    }

    plan
}

/// Compute what should be done to the checklist of every fetched course.
///
/// Each course is handled independently. A course that has no stored tasks gets all of its fetched tasks added.
pub fn reconcile(stored: &HashMap<CourseId, Vec<Task>>, fetched: &HashMap<CourseId, Vec<Task>>) -> UpdatePlan {
    let mut plan = UpdatePlan::new();
    for (course, fetched_tasks) in fetched {
        let stored_tasks = stored.get(course).map(|tasks| tasks.as_slice()).unwrap_or(&[]);
        plan.insert(*course, reconcile_course(stored_tasks, fetched_tasks));
    }
    plan
}
