//! weekplan-view - view state for the weekly planner board
//!
//! [`PlannerController`] mirrors the stored tasks and tags, applies edits
//! optimistically and persists them through `weekplan-storage`. The
//! [`views`] module holds the pure derived views a board renders: per-day
//! columns, today's progress, day load and time-block grouping.

pub mod controller;
pub mod selection;
pub mod views;

pub use controller::{PlannerController, SyncFailure};
pub use selection::{CompletionFilter, Selection, TagFilter};
pub use views::{
    day_load, filter_by_completion, filter_by_tag, format_duration, group_by_time_block,
    resolve_tag, sorted_for_display, tasks_for_day, today_stats, CompletionStats, DayLoad,
    LoadLevel, TimeBlockGroups,
};
