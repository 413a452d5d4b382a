//! Derived views over task slices
//!
//! Everything here is a pure function: the controller hands in its mirror
//! and renders whatever comes back.

use serde::Serialize;
use weekplan_core::{Day, Tag, Task, TimeBlock};

use crate::{CompletionFilter, TagFilter};

/// Completion counts for a set of tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompletionStats {
    pub total: usize,
    pub completed: usize,
    /// Rounded to the nearest whole percent; 0 when there are no tasks
    pub percent: u32,
}

/// How full a day column is, by estimated minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadLevel {
    Empty,
    Light,
    Normal,
    Heavy,
    Overloaded,
}

impl LoadLevel {
    const LIGHT_MAX: u32 = 240;
    const NORMAL_MAX: u32 = 450;
    const HEAVY_MAX: u32 = 540;

    pub fn for_minutes(minutes: u32) -> Self {
        match minutes {
            0 => Self::Empty,
            m if m <= Self::LIGHT_MAX => Self::Light,
            m if m <= Self::NORMAL_MAX => Self::Normal,
            m if m <= Self::HEAVY_MAX => Self::Heavy,
            _ => Self::Overloaded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayLoad {
    pub total_minutes: u32,
    pub done_minutes: u32,
    /// Share of estimated minutes already done, capped at 100
    pub progress: u32,
    pub level: LoadLevel,
}

/// Tasks of one column split by time block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeBlockGroups<'a> {
    pub morning: Vec<&'a Task>,
    pub midday: Vec<&'a Task>,
    pub evening: Vec<&'a Task>,
}

impl<'a> TimeBlockGroups<'a> {
    pub fn get(&self, block: TimeBlock) -> &[&'a Task] {
        match block {
            TimeBlock::Morning => &self.morning,
            TimeBlock::Midday => &self.midday,
            TimeBlock::Evening => &self.evening,
        }
    }
}

pub fn filter_by_tag<'a>(tasks: &'a [Task], filter: &TagFilter) -> Vec<&'a Task> {
    tasks.iter().filter(|task| filter.matches(task)).collect()
}

pub fn tasks_for_day(tasks: &[Task], day: Day) -> Vec<&Task> {
    tasks.iter().filter(|task| task.day == day).collect()
}

pub fn filter_by_completion(tasks: &[Task], filter: CompletionFilter) -> Vec<&Task> {
    tasks.iter().filter(|task| filter.matches(task)).collect()
}

/// Counts for the tasks placed on `today`
pub fn today_stats(tasks: &[Task], today: Day) -> CompletionStats {
    let todays = tasks_for_day(tasks, today);
    let total = todays.len();
    let completed = todays.iter().filter(|task| task.completed).count();
    let percent = if total == 0 {
        0
    } else {
        ((completed as f64 / total as f64) * 100.0).round() as u32
    };

    CompletionStats {
        total,
        completed,
        percent,
    }
}

/// Estimated-time load of a column; pass the tasks of a single day
pub fn day_load<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> DayLoad {
    let mut total_minutes = 0u32;
    let mut done_minutes = 0u32;
    for task in tasks {
        total_minutes = total_minutes.saturating_add(task.estimated_time);
        if task.completed {
            done_minutes = done_minutes.saturating_add(task.estimated_time);
        }
    }

    let progress = if total_minutes == 0 {
        0
    } else {
        ((done_minutes as f64 / total_minutes as f64) * 100.0)
            .round()
            .min(100.0) as u32
    };

    DayLoad {
        total_minutes,
        done_minutes,
        progress,
        level: LoadLevel::for_minutes(total_minutes),
    }
}

pub fn group_by_time_block<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
) -> TimeBlockGroups<'a> {
    let mut groups = TimeBlockGroups::default();
    for task in tasks {
        match task.time_block {
            TimeBlock::Morning => groups.morning.push(task),
            TimeBlock::Midday => groups.midday.push(task),
            TimeBlock::Evening => groups.evening.push(task),
        }
    }
    groups
}

/// Look up a task's tag; untagged and dangling references both give `None`
pub fn resolve_tag<'a>(tags: &'a [Tag], tag_id: Option<&str>) -> Option<&'a Tag> {
    let id = tag_id.filter(|id| !id.is_empty())?;
    tags.iter().find(|tag| tag.id == id)
}

/// Render minutes as `45m`, `2h` or `1h 30m`
pub fn format_duration(minutes: u32) -> String {
    let hours = minutes / 60;
    let rest = minutes % 60;
    match (hours, rest) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

/// Newest first; ties keep their incoming order
pub fn sorted_for_display(tasks: &[Task]) -> Vec<&Task> {
    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use weekplan_core::{default_tags, ColorKey};

    fn task(id: &str, day: Day, minutes: u32, completed: bool) -> Task {
        Task {
            id: id.to_string(),
            created_at: 0,
            text: id.to_string(),
            completed,
            description: String::new(),
            subtasks: Vec::new(),
            day,
            time_block: TimeBlock::Midday,
            tag_id: None,
            estimated_time: minutes,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_today_stats_rounds_percent() {
        let tasks = vec![
            task("a", Day::Monday, 0, true),
            task("b", Day::Monday, 0, false),
            task("c", Day::Monday, 0, false),
            task("d", Day::Tuesday, 0, true),
        ];

        let stats = today_stats(&tasks, Day::Monday);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.percent, 33);

        assert_eq!(today_stats(&tasks, Day::Sunday), CompletionStats::default());
    }

    #[test]
    fn test_day_load_levels() {
        assert_eq!(LoadLevel::for_minutes(0), LoadLevel::Empty);
        assert_eq!(LoadLevel::for_minutes(240), LoadLevel::Light);
        assert_eq!(LoadLevel::for_minutes(241), LoadLevel::Normal);
        assert_eq!(LoadLevel::for_minutes(450), LoadLevel::Normal);
        assert_eq!(LoadLevel::for_minutes(540), LoadLevel::Heavy);
        assert_eq!(LoadLevel::for_minutes(541), LoadLevel::Overloaded);

        let tasks = vec![
            task("a", Day::Friday, 90, true),
            task("b", Day::Friday, 30, false),
        ];
        let load = day_load(&tasks);
        assert_eq!(load.total_minutes, 120);
        assert_eq!(load.done_minutes, 90);
        assert_eq!(load.progress, 75);
        assert_eq!(load.level, LoadLevel::Light);
    }

    #[test]
    fn test_group_by_time_block() {
        let mut morning = task("m", Day::Monday, 0, false);
        morning.time_block = TimeBlock::Morning;
        let mut evening = task("e", Day::Monday, 0, false);
        evening.time_block = TimeBlock::Evening;
        let tasks = vec![morning, task("d", Day::Monday, 0, false), evening];

        let groups = group_by_time_block(&tasks);
        assert_eq!(groups.morning.len(), 1);
        assert_eq!(groups.get(TimeBlock::Midday)[0].id, "d");
        assert_eq!(groups.evening[0].id, "e");
    }

    #[test]
    fn test_resolve_tag_handles_dangling() {
        let mut tags = default_tags();
        tags.push(Tag::new("Errands", ColorKey::Amber));

        let work = resolve_tag(&tags, Some("work")).map(|t| t.label.as_str());
        assert_eq!(work, Some("Work"));
        assert!(resolve_tag(&tags, Some("deleted")).is_none());
        assert!(resolve_tag(&tags, Some("")).is_none());
        assert!(resolve_tag(&tags, None).is_none());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0m");
        assert_eq!(format_duration(45), "45m");
        assert_eq!(format_duration(120), "2h");
        assert_eq!(format_duration(90), "1h 30m");
    }

    #[test]
    fn test_filters_and_sort() {
        let mut old = task("old", Day::Backlog, 0, true);
        old.created_at = 1;
        let mut new = task("new", Day::Backlog, 0, false);
        new.created_at = 2;
        new.tag_id = Some("work".to_string());
        let tasks = vec![old, new];

        let sorted = sorted_for_display(&tasks);
        assert_eq!(sorted[0].id, "new");

        let tagged = filter_by_tag(&tasks, &TagFilter::Tag("work".to_string()));
        assert_eq!(tagged.len(), 1);
        assert_eq!(filter_by_tag(&tasks, &TagFilter::All).len(), 2);

        let active = filter_by_completion(&tasks, CompletionFilter::Active);
        assert_eq!(active[0].id, "new");
        let done = filter_by_completion(&tasks, CompletionFilter::Completed);
        assert_eq!(done[0].id, "old");
    }
}
