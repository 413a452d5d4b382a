//! Configuration management for weekplan
//!
//! Settings live in `.weekplan/config.toml` under a root directory. Every
//! field has a default, so a missing file or a partial file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{PlannerError, Result, TimeBlock};

/// Directory holding the config file and default data directory
pub const CONFIG_DIR: &str = ".weekplan";

/// Storage key of the task collection
pub const DEFAULT_TASKS_KEY: &str = "todo_app_v1_data";

/// Storage key of the tag collection
pub const DEFAULT_TAGS_KEY: &str = "todo_app_v1_tags";

/// Top-level planner configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Where and under which keys collections are stored
    #[serde(default)]
    pub storage: StorageConfig,

    /// What the view layer does when a write fails
    #[serde(default)]
    pub sync: SyncConfig,

    /// Defaults for newly entered tasks
    #[serde(default)]
    pub defaults: TaskDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for file-backed stores, relative to the root
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_tasks_key")]
    pub tasks_key: String,

    #[serde(default = "default_tags_key")]
    pub tags_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub on_failure: SyncPolicy,
}

/// Reaction to a failed persist after an optimistic update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPolicy {
    /// Log and keep the optimistic state; memory and store diverge until reload
    #[default]
    KeepOptimistic,
    /// Restore the state from before the mutation
    Rollback,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDefaults {
    #[serde(default)]
    pub time_block: TimeBlock,
}

// Default value providers
fn default_data_dir() -> PathBuf {
    PathBuf::from(CONFIG_DIR).join("data")
}

fn default_tasks_key() -> String {
    DEFAULT_TASKS_KEY.to_string()
}

fn default_tags_key() -> String {
    DEFAULT_TAGS_KEY.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            tasks_key: default_tasks_key(),
            tags_key: default_tags_key(),
        }
    }
}

impl PlannerConfig {
    /// Load configuration from `.weekplan/config.toml` or use defaults
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let config_path = root.join(CONFIG_DIR).join("config.toml");

        if config_path.exists() {
            debug!("Loading config from {}", config_path.display());
            let content = std::fs::read_to_string(&config_path)?;
            let config: Self = toml::from_str(&content).map_err(|e| {
                PlannerError::Config(format!("Failed to parse config file: {}", e))
            })?;
            config.validate()?;
            Ok(config)
        } else {
            debug!("No config at {}, using defaults", config_path.display());
            Ok(Self::default())
        }
    }

    /// Write default configuration to `.weekplan/config.toml`
    pub fn write_default(root: &Path) -> Result<()> {
        let config_dir = root.join(CONFIG_DIR);
        std::fs::create_dir_all(&config_dir)?;

        let content = toml::to_string_pretty(&Self::default()).map_err(|e| {
            PlannerError::Config(format!("Failed to serialize config: {}", e))
        })?;
        std::fs::write(config_dir.join("config.toml"), content)?;
        Ok(())
    }

    /// Data directory resolved against the root
    pub fn data_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.storage.data_dir)
    }

    fn validate(&self) -> Result<()> {
        if self.storage.tasks_key.is_empty() || self.storage.tags_key.is_empty() {
            return Err(PlannerError::Config(
                "storage keys must not be empty".to_string(),
            ));
        }
        if self.storage.tasks_key == self.storage.tags_key {
            return Err(PlannerError::Config(format!(
                "tasks and tags must use different keys (both are '{}')",
                self.storage.tasks_key
            )));
        }
        Ok(())
    }
}
