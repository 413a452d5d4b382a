//! Planner view state
//!
//! `PlannerController` keeps an in-memory mirror of the stored tasks and tags
//! and applies every edit to the mirror before persisting it. What happens
//! to the mirror when the write fails is decided by [`SyncPolicy`].

use std::sync::Arc;
use tracing::{debug, warn};
use weekplan_core::{
    Day, NewTask, PlannerConfig, PlannerError, Result, SyncPolicy, Tag, Task, TimeBlock,
};
use weekplan_storage::TodoService;

use crate::views::{self, CompletionStats};
use crate::{CompletionFilter, Selection, TagFilter};

/// A persist that did not go through, kept until the UI dismisses it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub operation: &'static str,
    pub message: String,
    /// Whether the mirror was restored to its state before the edit
    pub rolled_back: bool,
}

/// State captured before an optimistic edit, only under `SyncPolicy::Rollback`
enum Snapshot {
    Tasks(Vec<Task>),
    Tags(Vec<Tag>),
    Nothing,
}

/// In-memory planner state backed by a [`TodoService`]
pub struct PlannerController {
    service: Arc<TodoService>,
    tasks: Vec<Task>,
    tags: Vec<Tag>,
    /// Active tag filter
    pub tag_filter: TagFilter,
    /// Active completion filter
    pub completion_filter: CompletionFilter,
    /// Day column the UI has zoomed into, if any
    pub focused_day: Option<Day>,
    selection: Selection,
    policy: SyncPolicy,
    default_time_block: TimeBlock,
    last_failure: Option<SyncFailure>,
}

impl PlannerController {
    pub fn new(service: Arc<TodoService>) -> Self {
        Self {
            service,
            tasks: Vec::new(),
            tags: Vec::new(),
            tag_filter: TagFilter::All,
            completion_filter: CompletionFilter::All,
            focused_day: None,
            selection: Selection::default(),
            policy: SyncPolicy::default(),
            default_time_block: TimeBlock::default(),
            last_failure: None,
        }
    }

    /// Create a controller using the sync policy and defaults from config
    pub fn from_config(service: Arc<TodoService>, config: &PlannerConfig) -> Self {
        let mut controller = Self::new(service).with_policy(config.sync.on_failure);
        controller.default_time_block = config.defaults.time_block;
        controller
    }

    pub fn with_policy(mut self, policy: SyncPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn policy(&self) -> SyncPolicy {
        self.policy
    }

    pub fn last_failure(&self) -> Option<&SyncFailure> {
        self.last_failure.as_ref()
    }

    pub fn clear_failure(&mut self) {
        self.last_failure = None;
    }

    /// Draft for the quick-add input, using the configured time block
    pub fn draft(&self, text: impl Into<String>, day: Day) -> NewTask {
        NewTask::new(text, day).with_time_block(self.default_time_block)
    }

    /// Replace the mirror with what the service holds
    pub async fn load(&mut self) -> Result<()> {
        let loaded = async {
            let tasks = self.service.get_all_tasks().await?;
            let tags = self.service.get_tags().await?;
            Ok::<_, PlannerError>((tasks, tags))
        }
        .await;

        match loaded {
            Ok((tasks, tags)) => {
                debug!(tasks = tasks.len(), tags = tags.len(), "Loaded planner state");
                self.tasks = tasks;
                self.tags = tags;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Failed to load planner state");
                self.record_failure("load", &err, false);
                Err(err)
            }
        }
    }

    /// Persist a new task and put it at the top of the mirror
    ///
    /// Empty or whitespace-only text is rejected before anything is stored.
    pub async fn add_task(&mut self, mut new_task: NewTask) -> Result<Task> {
        new_task.validate()?;
        new_task.text = new_task.text.trim().to_string();

        match self.service.add_task(new_task).await {
            Ok(task) => {
                self.tasks.insert(0, task.clone());
                Ok(task)
            }
            Err(err) => {
                warn!(error = %err, "Failed to add task");
                self.record_failure("add_task", &err, false);
                Err(err)
            }
        }
    }

    /// Flip completion; returns false if the task is not in the mirror
    pub async fn toggle_task(&mut self, id: &str) -> Result<bool> {
        let snapshot = self.snapshot_tasks();
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            return Ok(false);
        };
        task.completed = !task.completed;

        let result = self.service.toggle_task(id).await;
        self.settle("toggle_task", snapshot, result).map(|_| true)
    }

    pub async fn delete_task(&mut self, id: &str) -> Result<bool> {
        let snapshot = self.snapshot_tasks();
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        if self.tasks.len() == before {
            return Ok(false);
        }
        self.selection_forget(id);

        let result = self.service.delete_task(id).await;
        self.settle("delete_task", snapshot, result).map(|_| true)
    }

    /// Replace a task with an edited copy, matched by id
    pub async fn update_task(&mut self, task: Task) -> Result<bool> {
        let snapshot = self.snapshot_tasks();
        let Some(slot) = self.tasks.iter_mut().find(|t| t.id == task.id) else {
            return Ok(false);
        };
        *slot = task.clone();

        let result = self.service.update_task(&task).await;
        self.settle("update_task", snapshot, result).map(|_| true)
    }

    /// Move one task to another column (drag and drop, or the edit dialog)
    ///
    /// Unknown ids and drops onto the task's current day do nothing.
    pub async fn drop_task(&mut self, id: &str, day: Day) -> Result<bool> {
        let snapshot = self.snapshot_tasks();
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            return Ok(false);
        };
        if task.day == day {
            return Ok(false);
        }
        task.day = day;

        let result = self.service.update_task_day(id, day).await;
        self.settle("drop_task", snapshot, result).map(|_| true)
    }

    /// Move every incomplete task on `source` to `target`
    pub async fn move_all(&mut self, source: Day, target: Day) -> Result<usize> {
        if source == target {
            return Ok(0);
        }
        let ids: Vec<String> = self
            .tasks
            .iter()
            .filter(|task| task.day == source && !task.completed)
            .map(|task| task.id.clone())
            .collect();

        self.move_ids("move_all", ids, target).await
    }

    /// Move the selected tasks to `target`, then leave selection mode
    pub async fn move_selected(&mut self, target: Day) -> Result<usize> {
        if self.selection.is_empty() {
            return Ok(0);
        }
        let ids = self.selection.ids();
        let moved = self.move_ids("move_selected", ids, target).await?;
        self.selection.reset();
        Ok(moved)
    }

    /// Replace the tag collection
    pub async fn save_tags(&mut self, tags: Vec<Tag>) -> Result<()> {
        let snapshot = match self.policy {
            SyncPolicy::Rollback => Snapshot::Tags(self.tags.clone()),
            SyncPolicy::KeepOptimistic => Snapshot::Nothing,
        };
        self.tags = tags;
        if let TagFilter::Tag(id) = &self.tag_filter {
            if !self.tags.iter().any(|tag| &tag.id == id) {
                self.tag_filter = TagFilter::All;
            }
        }

        let result = self.service.save_tags(&self.tags).await;
        self.settle("save_tags", snapshot, result)
    }

    // ===== Selection =====

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn toggle_selection_mode(&mut self) {
        self.selection.toggle_mode();
    }

    pub fn toggle_selected(&mut self, id: &str) {
        self.selection.toggle(id);
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.contains(id)
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.selection.ids()
    }

    // ===== Filters and derived views =====

    pub fn toggle_tag_filter(&mut self, tag_id: &str) {
        self.tag_filter.toggle(tag_id);
    }

    /// Tasks of one column after both filters, newest first
    pub fn visible_tasks(&self, day: Day) -> Vec<&Task> {
        views::sorted_for_display(&self.tasks)
            .into_iter()
            .filter(|task| task.day == day)
            .filter(|task| self.tag_filter.matches(task))
            .filter(|task| self.completion_filter.matches(task))
            .collect()
    }

    /// Completion counts for the current weekday
    pub fn today_stats(&self) -> CompletionStats {
        views::today_stats(&self.tasks, self.service.clock().today())
    }

    pub fn resolve_tag(&self, task: &Task) -> Option<&Tag> {
        views::resolve_tag(&self.tags, task.tag())
    }

    // ===== Internals =====

    async fn move_ids(
        &mut self,
        operation: &'static str,
        ids: Vec<String>,
        target: Day,
    ) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let snapshot = self.snapshot_tasks();
        let mut moved = 0;
        for task in self.tasks.iter_mut().filter(|task| ids.contains(&task.id)) {
            task.day = target;
            moved += 1;
        }

        let result = self.service.move_batch(&ids, target).await;
        self.settle(operation, snapshot, result).map(|_| moved)
    }

    fn snapshot_tasks(&self) -> Snapshot {
        match self.policy {
            SyncPolicy::Rollback => Snapshot::Tasks(self.tasks.clone()),
            SyncPolicy::KeepOptimistic => Snapshot::Nothing,
        }
    }

    fn selection_forget(&mut self, id: &str) {
        if self.selection.contains(id) {
            self.selection.toggle(id);
        }
    }

    /// Apply the sync policy to the outcome of a persist
    fn settle<T>(
        &mut self,
        operation: &'static str,
        snapshot: Snapshot,
        result: Result<T>,
    ) -> Result<T> {
        let err = match result {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let rolled_back = match snapshot {
            Snapshot::Tasks(tasks) => {
                self.tasks = tasks;
                true
            }
            Snapshot::Tags(tags) => {
                self.tags = tags;
                true
            }
            Snapshot::Nothing => false,
        };

        warn!(
            operation,
            error = %err,
            store_failure = err.is_store_failure(),
            rolled_back,
            "Failed to persist change"
        );
        self.record_failure(operation, &err, rolled_back);
        Err(err)
    }

    fn record_failure(&mut self, operation: &'static str, err: &PlannerError, rolled_back: bool) {
        self.last_failure = Some(SyncFailure {
            operation,
            message: err.to_string(),
            rolled_back,
        });
    }
}
