//! The persistence service: sole gateway between planner entities and the store.
//!
//! Tasks and tags are stored as two independent JSON arrays, each under its
//! own key. Every mutation is a full read-modify-write of one array. The
//! service serializes those cycles with one async mutex per namespace, so two
//! mutations issued back to back through the same service cannot clobber each
//! other. Separate service instances over one store are not coordinated.
//!
//! Mutations work on the raw stored records rather than on migrated tasks:
//! a record that has not been rewritten keeps its original shape apart from
//! the field being changed.

use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;
use weekplan_core::{
    default_tags, Clock, Day, NewTask, PlannerConfig, PlannerError, Result, StorageConfig,
    SystemClock, Tag, Task, DEFAULT_TAGS_KEY, DEFAULT_TASKS_KEY,
};

use crate::migrate::{migrate_records, record_id, retire_legacy_fields};
use crate::store::{FileStore, KeyValueStore};

/// Task and tag persistence over a [`KeyValueStore`]
pub struct TodoService {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    tasks_key: String,
    tags_key: String,
    tasks_lock: Mutex<()>,
    tags_lock: Mutex<()>,
}

impl TodoService {
    /// Create a service using the default keys and the system clock
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            tasks_key: DEFAULT_TASKS_KEY.to_string(),
            tags_key: DEFAULT_TAGS_KEY.to_string(),
            tasks_lock: Mutex::new(()),
            tags_lock: Mutex::new(()),
        }
    }

    /// Create a service using the keys from a storage config
    pub fn with_config(store: Arc<dyn KeyValueStore>, config: &StorageConfig) -> Self {
        let mut service = Self::new(store);
        service.tasks_key = config.tasks_key.clone();
        service.tags_key = config.tags_key.clone();
        service
    }

    /// Open a file-backed service under `root` as described by `config`
    pub fn open(root: &Path, config: &PlannerConfig) -> Self {
        let store = FileStore::new(config.data_dir(root));
        debug!("Opening file store at {}", store.dir().display());
        Self::with_config(Arc::new(store), &config.storage)
    }

    /// Replace the time source (timestamps and the "today" migration default)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // ===== Raw collection I/O =====

    async fn read_array<T>(&self, key: &str) -> Result<Option<Vec<T>>>
    where
        T: serde::de::DeserializeOwned,
    {
        let Some(blob) = self.store.get(key).await? else {
            return Ok(None);
        };

        serde_json::from_str(&blob)
            .map(Some)
            .map_err(|source| PlannerError::CorruptPayload {
                key: key.to_string(),
                source,
            })
    }

    async fn write_array<T: serde::Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        let blob = serde_json::to_string(items)?;
        debug!("Writing {} records ({} bytes) to '{}'", items.len(), blob.len(), key);
        self.store.set(key, &blob).await
    }

    /// Run one read-modify-write cycle over the raw task records.
    ///
    /// `apply` returns how many records it changed; nothing is written when
    /// that is zero or when no collection exists yet.
    async fn mutate_tasks<F>(&self, apply: F) -> Result<usize>
    where
        F: FnOnce(&mut Vec<Value>) -> usize,
    {
        let _guard = self.tasks_lock.lock().await;

        let Some(mut records) = self.read_array::<Value>(&self.tasks_key).await? else {
            debug!("No task collection stored, nothing to change");
            return Ok(0);
        };

        let changed = apply(&mut records);
        if changed > 0 {
            self.write_array(&self.tasks_key, &records).await?;
        }
        Ok(changed)
    }

    // ===== Tags =====

    /// Load the tag collection.
    ///
    /// On first run (no tag collection stored) this writes the default tag
    /// set and returns it. That bootstrap is the only write performed by a
    /// read operation.
    #[instrument(skip(self))]
    pub async fn get_tags(&self) -> Result<Vec<Tag>> {
        let _guard = self.tags_lock.lock().await;

        if let Some(tags) = self.read_array::<Tag>(&self.tags_key).await? {
            return Ok(tags);
        }

        let tags = default_tags();
        info!("No tags stored, writing {} default tags", tags.len());
        self.write_array(&self.tags_key, &tags).await?;
        Ok(tags)
    }

    /// Replace the whole tag collection.
    ///
    /// Tasks referencing a removed tag are not touched; their `tagId` dangles.
    #[instrument(skip(self, tags), fields(count = tags.len()))]
    pub async fn save_tags(&self, tags: &[Tag]) -> Result<()> {
        let _guard = self.tags_lock.lock().await;
        self.write_array(&self.tags_key, tags).await
    }

    // ===== Tasks =====

    /// Load every task, migrated, newest `createdAt` first
    #[instrument(skip(self))]
    pub async fn get_all_tasks(&self) -> Result<Vec<Task>> {
        let records = {
            let _guard = self.tasks_lock.lock().await;
            self.read_array::<Value>(&self.tasks_key).await?
        };
        let Some(records) = records else {
            return Ok(Vec::new());
        };

        let mut tasks = migrate_records(&records, self.clock.today());
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        debug!("Loaded {} of {} task records", tasks.len(), records.len());
        Ok(tasks)
    }

    /// Create a task with a fresh id and timestamp and prepend it to storage
    #[instrument(skip(self, new_task), fields(day = %new_task.day))]
    pub async fn add_task(&self, new_task: NewTask) -> Result<Task> {
        let task = Task {
            id: Uuid::new_v4().to_string(),
            created_at: self.clock.now_millis(),
            text: new_task.text,
            completed: false,
            description: String::new(),
            subtasks: Vec::new(),
            day: new_task.day,
            time_block: new_task.time_block,
            tag_id: new_task.tag_id.filter(|tag| !tag.is_empty()),
            estimated_time: new_task.estimated_time,
            extra: Default::default(),
        };
        let record = serde_json::to_value(&task)?;

        let _guard = self.tasks_lock.lock().await;
        let mut records = self
            .read_array::<Value>(&self.tasks_key)
            .await?
            .unwrap_or_default();
        records.insert(0, record);
        self.write_array(&self.tasks_key, &records).await?;

        debug!("Added task {}", task.id);
        Ok(task)
    }

    /// Replace the stored record with the same id; returns whether one matched
    #[instrument(skip(self, task), fields(id = %task.id))]
    pub async fn update_task(&self, task: &Task) -> Result<bool> {
        let mut replacement = serde_json::to_value(task)?;
        retire_legacy_fields(&mut replacement);
        let changed = self
            .mutate_tasks(|records| {
                let mut changed = 0;
                let matching = records
                    .iter_mut()
                    .filter(|r| record_id(r).as_deref() == Some(task.id.as_str()));
                for record in matching {
                    *record = replacement.clone();
                    changed += 1;
                }
                changed
            })
            .await?;
        Ok(changed > 0)
    }

    /// Flip `completed`; returns whether a record matched
    #[instrument(skip(self))]
    pub async fn toggle_task(&self, id: &str) -> Result<bool> {
        let changed = self
            .mutate_tasks(|records| {
                let mut changed = 0;
                for record in records.iter_mut().filter(|r| record_id(r).as_deref() == Some(id)) {
                    let completed = record
                        .get("completed")
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                    set_field(record, "completed", Value::Bool(!completed));
                    changed += 1;
                }
                changed
            })
            .await?;
        Ok(changed > 0)
    }

    /// Remove the record; returns whether one matched
    #[instrument(skip(self))]
    pub async fn delete_task(&self, id: &str) -> Result<bool> {
        let changed = self
            .mutate_tasks(|records| {
                let before = records.len();
                records.retain(|r| record_id(r).as_deref() != Some(id));
                before - records.len()
            })
            .await?;
        Ok(changed > 0)
    }

    /// Move one task to another day; returns whether a record matched
    #[instrument(skip(self))]
    pub async fn update_task_day(&self, id: &str, day: Day) -> Result<bool> {
        let changed = self
            .mutate_tasks(|records| set_day(records, |candidate| candidate == id, day))
            .await?;
        Ok(changed > 0)
    }

    /// Move every listed task to `day` in a single write; unknown ids are skipped
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn move_batch(&self, ids: &[String], day: Day) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let moved = self
            .mutate_tasks(|records| set_day(records, |id| wanted.contains(id), day))
            .await?;

        debug!("Moved {} of {} requested tasks to {}", moved, ids.len(), day);
        Ok(moved)
    }
}

fn set_field(record: &mut Value, field: &str, value: Value) {
    if let Some(obj) = record.as_object_mut() {
        obj.insert(field.to_string(), value);
    }
}

fn set_day<F>(records: &mut [Value], matches: F, day: Day) -> usize
where
    F: Fn(&str) -> bool,
{
    let mut changed = 0;
    for record in records.iter_mut() {
        if record_id(record).is_some_and(|id| matches(id.as_str())) {
            set_field(record, "day", Value::String(day.label().to_string()));
            changed += 1;
        }
    }
    changed
}
