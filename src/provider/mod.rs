//! This module drives the reconciliation between a course source and a checklist backend
//!
//! One cycle fetches the work items of every monitored course, reads the checklists back, reconciles them and applies the resulting plan.
//! Cycles can be run periodically, until they are cancelled.

use std::error::Error;
use std::collections::HashMap;

use chrono::{Duration, Local};
use tokio::sync::watch;

use crate::traits::{ChecklistBackend, CourseSource};
use crate::course::Course;
use crate::reconcile;
use crate::task::{self, Task};
use crate::time::DueDate;

pub mod sync_progress;
use sync_progress::SyncProgress;
use sync_progress::{FeedbackSender, SyncEvent};

/// The default horizon, in days
pub const DEFAULT_HORIZON_DAYS: i64 = 21;

/// See [`cancellation_channel`]
pub type CancelSender = watch::Sender<bool>;
/// See [`cancellation_channel`]
pub type CancelReceiver = watch::Receiver<bool>;

/// Create a channel that can stop [`Provider::run_until_cancelled`], by sending `true`.
/// Dropping the sender stops it as well.
pub fn cancellation_channel() -> (CancelSender, CancelReceiver) {
    watch::channel(false)
}


/// Keeps the checklists of a [`ChecklistBackend`] in sync with the work items of a [`CourseSource`].
///
/// Items are only ever added or checked: nothing is removed, and nothing a user checked is un-checked.
pub struct Provider<S, B>
where
    S: CourseSource + Sync,
    B: ChecklistBackend + Send,
{
    /// The course service
    source: S,
    /// Where the checklists are stored
    backend: B,

    courses: Vec<Course>,
    /// Only tasks due before `now + horizon` are mirrored
    horizon: Duration,
    /// Whether the fetched tasks and the plans should be printed to the console
    console_print: bool,
}

impl<S, B> Provider<S, B>
where
    S: CourseSource + Sync,
    B: ChecklistBackend + Send,
{
    /// Create a provider that monitors `courses`
    pub fn new(source: S, backend: B, courses: Vec<Course>) -> Self {
        Self {
            source, backend, courses,
            horizon: Duration::days(DEFAULT_HORIZON_DAYS),
            console_print: false,
        }
    }

    /// Only mirror tasks that are due within `days` days (or that have no due date).
    /// Horizons that are too large to be represented mean "no limit"
    pub fn with_horizon_days(mut self, days: i64) -> Self {
        self.horizon = Duration::try_days(days).unwrap_or_else(Duration::max_value);
        self
    }

    pub fn with_console_print(mut self, console_print: bool) -> Self {
        self.console_print = console_print;
        self
    }

    pub fn source(&self) -> &S { &self.source }
    pub fn backend(&self) -> &B { &self.backend }
    pub fn backend_mut(&mut self) -> &mut B { &mut self.backend }
    pub fn courses(&self) -> &[Course] { &self.courses }

    /// Runs a reconciliation cycle, and provide feeedback to the user about the progress.
    ///
    /// It returns whether the cycle was totally successful (details about errors are logged using the `log::*` macros).
    /// A failure in a course does not prevent the other courses from being synced. In any case, the next cycle will pick up what has been missed.
    pub async fn sync_with_feedback(&mut self, feedback_sender: FeedbackSender) -> bool {
        let mut progress = SyncProgress::new_with_feedback_channel(feedback_sender);
        self.run_sync(&mut progress).await
    }

    /// Runs a reconciliation cycle, without giving any feedback.
    ///
    /// See [`Self::sync_with_feedback`]
    pub async fn sync(&mut self) -> bool {
        let mut progress = SyncProgress::new();
        self.run_sync(&mut progress).await
    }

    /// Runs a cycle every `interval`, until `cancel` receives `true` (or its sender is dropped).
    ///
    /// Returns how many cycles have been run
    pub async fn run_until_cancelled(&mut self, interval: std::time::Duration, mut cancel: CancelReceiver) -> u32 {
        let mut n_cycles = 0;
        loop {
            if *cancel.borrow() {
                break;
            }

            n_cycles += 1;
            if self.sync().await == false {
                log::warn!("Sync did not complete, see the previous log lines for more info. It will be retried in {:?}", interval);
            }

            if wait_or_cancel(interval, &mut cancel).await {
                break;
            }
        }
        log::info!("Stopped after {} cycle(s)", n_cycles);
        n_cycles
    }

    async fn run_sync(&mut self, progress: &mut SyncProgress) -> bool {
        if let Err(err) = self.run_sync_inner(progress).await {
            progress.error(&format!("Sync terminated because of an error: {}", err));
        }
        progress.feedback(SyncEvent::Finished{ success: progress.is_success(), updates: progress.n_updates() });
        progress.is_success()
    }

    async fn run_sync_inner(&mut self, progress: &mut SyncProgress) -> Result<(), Box<dyn Error>> {
        progress.info("Starting a sync.");
        progress.feedback(SyncEvent::Started);

        // Step 1 - fetch the work items of every course
        let now = Local::now();
        let mut fetched = HashMap::new();
        for course in &self.courses {
            progress.feedback(SyncEvent::InProgress{
                course: course.nickname.clone(),
                details: "fetching work items".to_string(),
            });

            match self.fetch_course(course, now, progress).await {
                Err(err) => {
                    progress.warn(&format!("Unable to fetch the work items of {} ({}): {}. Skipping this time", course.nickname, course.id, err));
                    continue;
                },
                Ok(tasks) => {
                    if self.console_print {
                        crate::utils::print_course_tasks(course, &tasks);
                    }
                    fetched.insert(course.id, tasks);
                },
            }
        }

        // Step 2 - read what the checklists currently contain
        progress.debug("Reading the checklists...");
        let state = self.backend.read_state(&self.courses).await?;
        let mut stored = HashMap::new();
        for (course_id, items) in state {
            let mut tasks = Vec::with_capacity(items.len());
            for item in &items {
                match Task::from_checklist_item(item) {
                    Ok(task) => tasks.push(task),
                    Err(err) => progress.warn(&format!("Ignoring an item of course {}: {}", course_id, err)),
                }
            }
            stored.insert(course_id, tasks);
        }

        // Step 3 - find the differences
        let plan = reconcile::reconcile(&stored, &fetched);
        progress.add_updates(plan.len());
        progress.info(&format!("{} update(s) to apply", plan.len()));
        if self.console_print {
            crate::utils::print_plan(&plan, &self.courses);
        }

        // Step 4 - commit changes
        if let Err(err) = self.backend.apply_plan(&plan, &self.courses).await {
            progress.error(&format!("Unable to apply every update: {}", err));
        }

        progress.info("Sync ended");
        Ok(())
    }

    /// Fetch the tasks of a course that are within the horizon, sorted by due date.
    /// Records that cannot be understood are skipped
    async fn fetch_course(&self, course: &Course, now: DueDate, progress: &mut SyncProgress) -> Result<Vec<Task>, Box<dyn Error>> {
        let items = self.source.fetch_work_items(course.id).await?;
        progress.debug(&format!("{} work item(s) in {}", items.len(), course.nickname));

        let mut tasks = Vec::with_capacity(items.len());
        for item in &items {
            match Task::from_source_item(item) {
                Ok(task) => tasks.push(task),
                Err(err) => progress.warn(&format!("Ignoring work item {:?} of {}: {}", item.name, course.nickname, err)),
            }
        }

        Ok(within_horizon(tasks, now, self.horizon))
    }
}

/// Keep the tasks that have no due date, or that are due before `now + horizon`, sorted by due date
pub fn within_horizon(tasks: Vec<Task>, now: DueDate, horizon: Duration) -> Vec<Task> {
    // A limit that cannot be represented is later than any due date
    let limit = now.checked_add_signed(horizon);
    let mut kept: Vec<Task> = tasks.into_iter()
        .filter(|task| match (task.due_date(), limit) {
            (None, _) | (Some(_), None) => true,
            (Some(due_date), Some(limit)) => *due_date <= limit,
        })
        .collect();
    task::sort_by_due_date(&mut kept);
    kept
}

/// Wait for `interval`. Returns `true` in case a cancellation has been requested in the meantime
async fn wait_or_cancel(interval: std::time::Duration, cancel: &mut CancelReceiver) -> bool {
    let sleep = tokio::time::sleep(interval);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return false,
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    return true;
                }
            },
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    use crate::cache::ChecklistCache;
    use crate::completeness::Completeness;
    use crate::course::CourseId;
    use crate::item::{ChecklistItem, SourceItem};
    use crate::mock_behaviour::MockBehaviour;
    use crate::reconcile::UpdatePlan;

    /// A course source that serves fixed work items
    struct MockSource {
        items: HashMap<CourseId, Vec<SourceItem>>,
        behaviour: Mutex<MockBehaviour>,
        unreachable_courses: HashSet<CourseId>,
    }

    impl MockSource {
        fn new(items: HashMap<CourseId, Vec<SourceItem>>) -> Self {
            Self { items, behaviour: Mutex::new(MockBehaviour::new()), unreachable_courses: HashSet::new() }
        }
    }

    #[async_trait]
    impl CourseSource for MockSource {
        async fn fetch_work_items(&self, course: CourseId) -> Result<Vec<SourceItem>, Box<dyn Error>> {
            self.behaviour.lock().unwrap().can_fetch_work_items()?;
            if self.unreachable_courses.contains(&course) {
                return Err(format!("course {} is unreachable", course).into());
            }
            Ok(self.items.get(&course).cloned().unwrap_or_default())
        }
    }

    /// A checklist backend that can be told to fail
    struct MockBackend {
        inner: ChecklistCache,
        behaviour: MockBehaviour,
    }

    #[async_trait]
    impl ChecklistBackend for MockBackend {
        async fn read_state(&mut self, courses: &[Course]) -> Result<HashMap<CourseId, Vec<ChecklistItem>>, Box<dyn Error>> {
            self.behaviour.can_read_state()?;
            self.inner.read_state(courses).await
        }

        async fn apply_plan(&mut self, plan: &UpdatePlan, courses: &[Course]) -> Result<(), Box<dyn Error>> {
            self.behaviour.can_apply_plan()?;
            self.inner.apply_plan(plan, courses).await
        }
    }

    fn course(id: CourseId) -> Course {
        Course::new(id, format!("Course {}", id), csscolorparser::parse("orange").unwrap())
    }

    fn source_item(name: &str, due_at: Option<&str>, submitted: bool) -> SourceItem {
        SourceItem {
            name: name.to_string(),
            due_at: due_at.map(|d| d.to_string()),
            accepts_submissions: true,
            submitted_at: if submitted { Some(Utc::now()) } else { None },
        }
    }

    fn texts(backend: &MockBackend, course: CourseId) -> Vec<(String, bool)> {
        backend.inner.note(course)
            .map(|note| note.items().iter().map(|item| (item.text.clone(), item.checked)).collect())
            .unwrap_or_default()
    }

    fn far_future(day: u32) -> String {
        // Within the horizon only when the horizon is huge
        format!("2999-01-{:02}T12:00:00Z", day)
    }

    fn provider(source: MockSource, dir: &tempfile::TempDir) -> Provider<MockSource, MockBackend> {
        let backend = MockBackend {
            inner: ChecklistCache::new(&dir.path().join("cache.json")),
            behaviour: MockBehaviour::new(),
        };
        Provider::new(source, backend, vec![course(1), course(2)])
            .with_horizon_days(365 * 1000)
    }

    #[tokio::test]
    async fn failing_course_does_not_block_the_others() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();

        let mut items = HashMap::new();
        items.insert(1, vec![source_item("HW1", Some(&far_future(1)), false)]);
        items.insert(2, vec![source_item("Essay", Some(&far_future(2)), false)]);
        let mut source = MockSource::new(items);
        source.behaviour = Mutex::new(MockBehaviour { fetch_work_items_behaviour: (0, 1), ..MockBehaviour::default() });

        let mut provider = provider(source, &dir);

        // The first fetch (course 1) fails
        assert_eq!(provider.sync().await, false);
        assert!(texts(provider.backend(), 1).is_empty());
        assert_eq!(texts(provider.backend(), 2).len(), 1);

        // It is caught up at the next cycle
        assert_eq!(provider.sync().await, true);
        assert_eq!(texts(provider.backend(), 1).len(), 1);
        assert_eq!(texts(provider.backend(), 2).len(), 1);
    }

    #[tokio::test]
    async fn unreachable_course_is_skipped() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();

        let mut items = HashMap::new();
        items.insert(2, vec![source_item("Essay", None, true)]);
        let mut source = MockSource::new(items);
        source.unreachable_courses.insert(1);

        let mut provider = provider(source, &dir);
        assert_eq!(provider.sync().await, false);
        assert_eq!(texts(provider.backend(), 2), vec![("Essay (no due date)".to_string(), true)]);
    }

    #[tokio::test]
    async fn malformed_records_and_items_are_skipped() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();

        let mut items = HashMap::new();
        items.insert(1, vec![
            source_item("Broken", Some("someday"), false),
            source_item("HW1", Some(&far_future(1)), false),
        ]);
        let mut provider = provider(MockSource::new(items), &dir);
        provider.backend_mut().inner.apply_plan(&UpdatePlan::new(), &[course(1)]).await.unwrap();
        provider.backend_mut().inner.note_mut(1).unwrap().add_item(ChecklistItem::new("bring snacks", false));

        // Both the malformed record and the user item are reported, but do not prevent the sync
        assert_eq!(provider.sync().await, false);
        let expected_hw1 = Task::from_source_item(&provider.source().items[&1][1]).unwrap().checklist_text();
        assert_eq!(texts(provider.backend(), 1), vec![
            (expected_hw1, false),
            ("bring snacks".to_string(), false),
        ]);
    }

    #[tokio::test]
    async fn backend_failures_are_reported() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();

        let mut items = HashMap::new();
        items.insert(1, vec![source_item("HW1", None, false)]);
        let mut provider = provider(MockSource::new(items), &dir);

        provider.backend_mut().behaviour = MockBehaviour { read_state_behaviour: (0, 1), apply_plan_behaviour: (1, 1), ..MockBehaviour::default() };
        assert_eq!(provider.sync().await, false);  // read fails
        assert_eq!(provider.sync().await, true);   // everything works
        assert_eq!(texts(provider.backend(), 1).len(), 1);
        assert_eq!(provider.sync().await, false);  // apply fails, but there was nothing to do
        assert_eq!(texts(provider.backend(), 1).len(), 1);
    }

    #[tokio::test]
    async fn feedback() {
        let dir = tempfile::tempdir().unwrap();
        let mut items = HashMap::new();
        items.insert(1, vec![source_item("HW1", None, false), source_item("HW2", None, true)]);
        let mut provider = provider(MockSource::new(items), &dir);

        let (sender, receiver) = sync_progress::feedback_channel();
        assert!(provider.sync_with_feedback(sender).await);
        assert_eq!(*receiver.borrow(), SyncEvent::Finished{ success: true, updates: 2 });
    }

    #[test]
    fn horizon() {
        let now = Local.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let day = |d: u32| Some(Local.with_ymd_and_hms(2025, 6, d, 12, 0, 0).unwrap());
        let tasks = vec![
            Task::new("undated", None, Completeness::Incomplete),
            Task::new("too far", day(30), Completeness::Incomplete),
            Task::new("limit", day(8), Completeness::Incomplete),
            Task::new("past", day(1), Completeness::Complete),
            Task::new("soon", day(3), Completeness::Incomplete),
        ];

        let kept = within_horizon(tasks.clone(), now, Duration::days(7));
        let names: Vec<&str> = kept.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["past", "soon", "limit", "undated"]);

        // Overflowing horizons do not filter anything
        let kept = within_horizon(tasks, now, Duration::max_value());
        let names: Vec<&str> = kept.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["past", "soon", "limit", "too far", "undated"]);
    }

    #[test]
    fn huge_horizons() {
        let dir = tempfile::tempdir().unwrap();
        for days in &[1_000_000_000_000, i64::MAX] {
            let provider = provider(MockSource::new(HashMap::new()), &dir).with_horizon_days(*days);
            assert_eq!(provider.horizon, Duration::max_value());
        }
        let provider = provider(MockSource::new(HashMap::new()), &dir).with_horizon_days(1_000_000_000);
        let tasks = vec![Task::new("HW1", Some(Local.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()), Completeness::Incomplete)];
        assert_eq!(within_horizon(tasks, Local::now(), provider.horizon).len(), 1);
    }

    #[tokio::test]
    async fn scheduler_stops_when_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = provider(MockSource::new(HashMap::new()), &dir);

        let (cancel_sender, cancel_receiver) = cancellation_channel();
        cancel_sender.send(true).unwrap();
        assert_eq!(provider.run_until_cancelled(std::time::Duration::from_secs(3600), cancel_receiver).await, 0);

        let (cancel_sender, cancel_receiver) = cancellation_channel();
        let stopper = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            cancel_sender.send(true).unwrap();
        });
        let n_cycles = provider.run_until_cancelled(std::time::Duration::from_millis(10), cancel_receiver).await;
        stopper.await.unwrap();
        assert!(n_cycles >= 1);
    }
}
