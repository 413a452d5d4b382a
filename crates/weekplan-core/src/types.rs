//! Core data structures for the weekly planner.
//!
//! Field names serialize in camelCase so the stored JSON keeps the shape the
//! planner has always written (`createdAt`, `timeBlock`, `tagId`, ...).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

use crate::{Day, PlannerError, Result};

/// Sub-placement of a task inside a day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBlock {
    Morning,
    /// Older records call this block "day"
    #[default]
    #[serde(alias = "day")]
    Midday,
    Evening,
}

impl TimeBlock {
    pub const ALL: [TimeBlock; 3] = [Self::Morning, Self::Midday, Self::Evening];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Midday => "midday",
            Self::Evening => "evening",
        }
    }

    /// Parse a stored label, accepting the legacy "day" spelling
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "morning" => Some(Self::Morning),
            "midday" | "day" => Some(Self::Midday),
            "evening" => Some(Self::Evening),
            _ => None,
        }
    }
}

impl fmt::Display for TimeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Named colors a tag can use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorKey {
    #[default]
    Slate,
    Red,
    Orange,
    Amber,
    Green,
    Emerald,
    Teal,
    Cyan,
    Blue,
    Indigo,
    Violet,
    Purple,
    Fuchsia,
    Pink,
    Rose,
}

impl ColorKey {
    pub const ALL: [ColorKey; 15] = [
        Self::Slate,
        Self::Red,
        Self::Orange,
        Self::Amber,
        Self::Green,
        Self::Emerald,
        Self::Teal,
        Self::Cyan,
        Self::Blue,
        Self::Indigo,
        Self::Violet,
        Self::Purple,
        Self::Fuchsia,
        Self::Pink,
        Self::Rose,
    ];
}

/// A checklist item owned by its parent task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

/// Task represents one planned item on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    // ===== Identification =====
    pub id: String,
    pub created_at: i64, // epoch millis, only used for default ordering

    // ===== Content =====
    pub text: String,
    pub completed: bool,
    pub description: String,
    pub subtasks: Vec<Subtask>,

    // ===== Placement =====
    pub day: Day,
    pub time_block: TimeBlock,

    // ===== Classification =====
    /// Weak reference to a tag; may dangle after the tag is removed
    pub tag_id: Option<String>,
    /// Minutes
    pub estimated_time: u32,

    /// Fields this version does not know about, kept so rewrites never drop them
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    /// Tag id if the task is tagged (empty ids count as untagged)
    pub fn tag(&self) -> Option<&str> {
        self.tag_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Append a subtask and return its id
    pub fn add_subtask(&mut self, text: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PlannerError::Validation(
                "subtask text is required".to_string(),
            ));
        }

        let id = Uuid::new_v4().to_string();
        self.subtasks.push(Subtask {
            id: id.clone(),
            text: text.to_string(),
            completed: false,
        });
        Ok(id)
    }

    /// Flip a subtask; returns false if no subtask has that id
    pub fn toggle_subtask(&mut self, id: &str) -> bool {
        match self.subtasks.iter_mut().find(|st| st.id == id) {
            Some(subtask) => {
                subtask.completed = !subtask.completed;
                true
            }
            None => false,
        }
    }

    pub fn remove_subtask(&mut self, id: &str) -> bool {
        let before = self.subtasks.len();
        self.subtasks.retain(|st| st.id != id);
        self.subtasks.len() != before
    }

    /// (completed, total) subtask counts
    pub fn subtask_progress(&self) -> (usize, usize) {
        let done = self.subtasks.iter().filter(|st| st.completed).count();
        (done, self.subtasks.len())
    }
}

/// Parameters for creating a task; id and timestamp are assigned by storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub text: String,
    pub day: Day,
    pub time_block: TimeBlock,
    pub tag_id: Option<String>,
    pub estimated_time: u32,
}

impl NewTask {
    pub fn new(text: impl Into<String>, day: Day) -> Self {
        Self {
            text: text.into(),
            day,
            time_block: TimeBlock::default(),
            tag_id: None,
            estimated_time: 0,
        }
    }

    pub fn with_time_block(mut self, time_block: TimeBlock) -> Self {
        self.time_block = time_block;
        self
    }

    pub fn with_tag(mut self, tag_id: impl Into<String>) -> Self {
        self.tag_id = Some(tag_id.into());
        self
    }

    pub fn with_estimated_time(mut self, minutes: u32) -> Self {
        self.estimated_time = minutes;
        self
    }

    /// Reject text that is empty once trimmed
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(PlannerError::Validation("text is required".to_string()));
        }
        Ok(())
    }
}

/// A label with a color, shared by all tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub label: String,
    pub color: ColorKey,
}

impl Tag {
    /// Create a tag with a freshly generated id
    pub fn new(label: impl Into<String>, color: ColorKey) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            label: label.into(),
            color,
        }
    }
}

/// Tags written on first run when no tag collection exists yet
pub fn default_tags() -> Vec<Tag> {
    vec![
        Tag {
            id: "work".to_string(),
            label: "Work".to_string(),
            color: ColorKey::Blue,
        },
        Tag {
            id: "personal".to_string(),
            label: "Personal".to_string(),
            color: ColorKey::Emerald,
        },
        Tag {
            id: "urgent".to_string(),
            label: "Urgent".to_string(),
            color: ColorKey::Red,
        },
    ]
}
