//! # weekplan-core
//!
//! Core types for the weekplan weekly task planner.
//!
//! A task lives in one column of the board (a weekday or the backlog), in one
//! time block of that day, and optionally carries a tag. Tags are a small
//! shared collection persisted separately from tasks.

mod clock;
mod config;
mod day;
mod error;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    PlannerConfig, StorageConfig, SyncConfig, SyncPolicy, TaskDefaults, CONFIG_DIR,
    DEFAULT_TAGS_KEY, DEFAULT_TASKS_KEY,
};
pub use day::{Day, ALL_COLUMNS, WEEKDAYS};
pub use error::{PlannerError, Result};
pub use types::{default_tags, ColorKey, NewTask, Subtask, Tag, Task, TimeBlock};
