//! weekplan-storage - persistence layer for the weekly planner
//!
//! This crate owns the single source of truth for task and tag records:
//! reading and writing two flat JSON collections against a key-value store,
//! migrating records written by older schema versions, and exposing the
//! create/update/delete/toggle/batch-move operations the view layer uses.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │         View layer                          │
//! │  (weekplan-view PlannerController)          │
//! └─────────────────┬───────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────┐
//! │         TodoService (this crate)            │
//! │  • read-modify-write per namespace          │
//! │  • read-time migration                      │
//! │  • default tag bootstrap                    │
//! └─────────────────┬───────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────┐
//! │         KeyValueStore                       │
//! │  • todo_app_v1_data  (tasks)                │
//! │  • todo_app_v1_tags  (tags)                 │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use weekplan_core::{Day, NewTask, TimeBlock};
//! use weekplan_storage::{MemoryStore, TodoService};
//!
//! # async fn example() -> weekplan_core::Result<()> {
//! let service = TodoService::new(Arc::new(MemoryStore::new()));
//!
//! let tags = service.get_tags().await?;
//! let task = service
//!     .add_task(
//!         NewTask::new("Buy milk", Day::Tuesday)
//!             .with_time_block(TimeBlock::Morning)
//!             .with_estimated_time(15),
//!     )
//!     .await?;
//!
//! service.move_batch(&[task.id.clone()], Day::Friday).await?;
//! println!("{} tags, {} tasks", tags.len(), service.get_all_tasks().await?.len());
//! # Ok(())
//! # }
//! ```

pub mod migrate;
pub mod service;
pub mod store;

pub use migrate::{migrate_record, migrate_records, RawTask, SchemaVersion};
pub use service::TodoService;
pub use store::{FileStore, KeyValueStore, MemoryStore};
