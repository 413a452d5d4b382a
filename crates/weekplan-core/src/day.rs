//! Day placement and the shared weekday naming table.
//!
//! Every "what day is today" question in weekplan goes through [`WEEKDAYS`]:
//! migration defaults in storage and the today statistics in the view layer
//! both resolve the current weekday here, so the two can never disagree.

use chrono::{Datelike, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::PlannerError;

/// Placement of a task: one of the seven weekdays or the unscheduled backlog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Day {
    Backlog,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// Weekdays in calendar order, indexed by days from Monday
pub const WEEKDAYS: [Day; 7] = [
    Day::Monday,
    Day::Tuesday,
    Day::Wednesday,
    Day::Thursday,
    Day::Friday,
    Day::Saturday,
    Day::Sunday,
];

/// Board columns: the backlog followed by the week
pub const ALL_COLUMNS: [Day; 8] = [
    Day::Backlog,
    Day::Monday,
    Day::Tuesday,
    Day::Wednesday,
    Day::Thursday,
    Day::Friday,
    Day::Saturday,
    Day::Sunday,
];

/// Labels written by earlier releases, same order as [`WEEKDAYS`]
const LEGACY_WEEKDAY_LABELS: [&str; 7] = [
    "Понедельник",
    "Вторник",
    "Среда",
    "Четверг",
    "Пятница",
    "Суббота",
    "Воскресенье",
];

impl Day {
    /// Canonical label used on the wire
    pub fn label(&self) -> &'static str {
        match self {
            Self::Backlog => "Backlog",
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }

    /// Map a calendar weekday onto the week table
    pub fn from_weekday(weekday: Weekday) -> Self {
        WEEKDAYS[weekday.num_days_from_monday() as usize]
    }

    /// The weekday of a calendar date
    pub fn of_date<D: Datelike>(date: &D) -> Self {
        Self::from_weekday(date.weekday())
    }

    /// Parse a stored label, accepting canonical and legacy spellings
    pub fn from_label(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        if trimmed.eq_ignore_ascii_case("backlog") {
            return Some(Self::Backlog);
        }

        if let Some(day) = WEEKDAYS
            .iter()
            .find(|day| day.label().eq_ignore_ascii_case(trimmed))
        {
            return Some(*day);
        }

        let lowered = trimmed.to_lowercase();
        LEGACY_WEEKDAY_LABELS
            .iter()
            .position(|legacy| legacy.to_lowercase() == lowered)
            .map(|idx| WEEKDAYS[idx])
    }

    pub fn is_backlog(&self) -> bool {
        matches!(self, Self::Backlog)
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for Day {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s)
            .ok_or_else(|| PlannerError::Validation(format!("unknown day: {}", s)))
    }
}

impl TryFrom<String> for Day {
    type Error = PlannerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Day> for String {
    fn from(day: Day) -> Self {
        day.label().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_weekday_table_matches_calendar() {
        // 2024-01-01 was a Monday
        let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        for (offset, expected) in WEEKDAYS.iter().enumerate() {
            let date = monday + chrono::Duration::days(offset as i64);
            assert_eq!(Day::of_date(&date), *expected);
        }
    }

    #[test]
    fn test_from_label_accepts_legacy_and_case() {
        assert_eq!(Day::from_label("Tuesday"), Some(Day::Tuesday));
        assert_eq!(Day::from_label("friday"), Some(Day::Friday));
        assert_eq!(Day::from_label("BACKLOG"), Some(Day::Backlog));
        assert_eq!(Day::from_label("Среда"), Some(Day::Wednesday));
        assert_eq!(Day::from_label("воскресенье"), Some(Day::Sunday));
        assert_eq!(Day::from_label("Someday"), None);
    }

    #[test]
    fn test_serde_uses_canonical_label() {
        let json = serde_json::to_string(&Day::Thursday).unwrap();
        assert_eq!(json, "\"Thursday\"");

        let legacy: Day = serde_json::from_str("\"Пятница\"").unwrap();
        assert_eq!(legacy, Day::Friday);

        assert!(serde_json::from_str::<Day>("\"Funday\"").is_err());
    }
}
