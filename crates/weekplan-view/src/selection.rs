//! Filters and multi-select state

use std::collections::HashSet;
use weekplan_core::Task;

/// Which tags are shown
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TagFilter {
    #[default]
    All,
    Tag(String),
}

impl TagFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Tag(id) => task.tag() == Some(id.as_str()),
        }
    }

    /// Choosing the active tag again goes back to showing everything
    pub fn toggle(&mut self, tag_id: &str) {
        *self = match &*self {
            Self::Tag(current) if current.as_str() == tag_id => Self::All,
            _ => Self::Tag(tag_id.to_string()),
        };
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompletionFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl CompletionFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
        }
    }
}

/// Multi-select mode and the ids picked while in it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    active: bool,
    ids: HashSet<String>,
}

impl Selection {
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Enter or leave selection mode; the set is cleared either way
    pub fn toggle_mode(&mut self) {
        self.active = !self.active;
        self.ids.clear();
    }

    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Selected ids in a stable order
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Leave selection mode with nothing selected
    pub fn reset(&mut self) {
        self.active = false;
        self.ids.clear();
    }
}
