//! Read-time schema migration for stored task records.
//!
//! Records written by older releases lack fields that were added later. Every
//! record read from storage goes through [`RawTask`], a loosely-typed view in
//! which every field is optional, and only becomes a strict [`Task`] after
//! missing fields are backfilled:
//!
//! | field           | default when absent                                  |
//! |-----------------|------------------------------------------------------|
//! | `day`           | today's weekday, evaluated at read time              |
//! | `timeBlock`     | `midday`                                             |
//! | `tagId`         | legacy `tag` unless it is `"none"`, otherwise none   |
//! | `estimatedTime` | `0`                                                  |
//! | `description`   | empty                                                |
//! | `subtasks`      | empty                                                |
//!
//! Migration is idempotent: migrating the serialized output again yields the
//! same bytes. It is also non-destructive: fields it does not recognise
//! (including the legacy `tag`) are carried along in [`Task::extra`]. A full
//! rewrite through `TodoService::update_task` retires `tag`, after which the
//! record's `tagId` alone decides its tag.

use serde_json::{Map, Value};
use tracing::{debug, warn};
use weekplan_core::{Day, Subtask, Task, TimeBlock};

/// Legacy tag value meaning "untagged"
const LEGACY_NO_TAG: &str = "none";

/// Singular tag field written before `tagId` existed
pub(crate) const LEGACY_TAG_FIELD: &str = "tag";

/// Keys read into typed fields; everything else stays in `extra`
const KNOWN_FIELDS: [&str; 10] = [
    "id",
    "text",
    "completed",
    "createdAt",
    "day",
    "timeBlock",
    "tagId",
    "estimatedTime",
    "description",
    "subtasks",
];

/// Schema generations seen in stored data
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SchemaVersion {
    /// Plain list items, optional singular `tag`
    V1,
    /// Adds `day`, `timeBlock` and `tagId`
    V2,
    /// Adds `estimatedTime`, `description` and `subtasks`
    V3,
}

/// A stored task record with every field optional
///
/// Built field by field from the stored JSON: a value of the wrong type
/// reads as absent instead of making the whole record unreadable.
#[derive(Debug, Clone, Default)]
pub struct RawTask {
    pub id: Option<String>,
    pub text: Option<String>,
    pub completed: Option<bool>,
    pub created_at: Option<i64>,
    pub day: Option<String>,
    pub time_block: Option<String>,
    pub tag_id: Option<String>,
    pub estimated_time: Option<i64>,
    pub description: Option<String>,
    pub subtasks: Option<Vec<Subtask>>,

    pub extra: Map<String, Value>,
}

impl RawTask {
    /// Read a stored record; `None` unless it is a JSON object
    pub fn from_record(record: &Value) -> Option<Self> {
        let obj = record.as_object()?;
        let field = |name: &str| obj.get(name).filter(|value| !value.is_null());

        let extra = obj
            .iter()
            .filter(|(key, _)| !KNOWN_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Some(Self {
            id: field("id").and_then(lenient_string),
            text: field("text").and_then(lenient_string),
            completed: field("completed").and_then(lenient_bool),
            created_at: field("createdAt").and_then(lenient_integer),
            day: field("day").and_then(Value::as_str).map(str::to_string),
            time_block: field("timeBlock").and_then(Value::as_str).map(str::to_string),
            tag_id: field("tagId").and_then(Value::as_str).map(str::to_string),
            estimated_time: field("estimatedTime").and_then(lenient_integer),
            description: field("description").and_then(Value::as_str).map(str::to_string),
            subtasks: field("subtasks").and_then(Value::as_array).map(|entries| {
                entries.iter().filter_map(lenient_subtask).collect()
            }),
            extra,
        })
    }

    /// Oldest schema generation consistent with the fields present
    pub fn schema_version(&self) -> SchemaVersion {
        if self.estimated_time.is_some() || self.description.is_some() || self.subtasks.is_some()
        {
            SchemaVersion::V3
        } else if self.day.is_some() || self.time_block.is_some() || self.tag_id.is_some() {
            SchemaVersion::V2
        } else {
            SchemaVersion::V1
        }
    }

    /// Backfill missing fields and produce a strict task.
    ///
    /// Returns `None` for records without an id; they cannot be addressed by
    /// any operation and are left to the caller to report.
    pub fn migrate(self, today: Day) -> Option<Task> {
        let version = self.schema_version();
        let id = self.id.filter(|id| !id.is_empty())?;

        if version < SchemaVersion::V3 {
            debug!("Migrating task {} from {:?}", id, version);
        }

        let day = match self.day.as_deref() {
            None => today,
            Some(label) => Day::from_label(label).unwrap_or_else(|| {
                warn!("Task {} has unknown day {:?}, using {}", id, label, today);
                today
            }),
        };

        let time_block = match self.time_block.as_deref() {
            None => TimeBlock::default(),
            Some(label) => TimeBlock::from_label(label).unwrap_or_else(|| {
                warn!("Task {} has unknown time block {:?}, using midday", id, label);
                TimeBlock::default()
            }),
        };

        let tag_id = self
            .tag_id
            .filter(|tag| !tag.is_empty())
            .or_else(|| legacy_tag(&self.extra));

        Some(Task {
            id,
            created_at: self.created_at.unwrap_or(0),
            text: self.text.unwrap_or_default(),
            completed: self.completed.unwrap_or(false),
            description: self.description.unwrap_or_default(),
            subtasks: self.subtasks.unwrap_or_default(),
            day,
            time_block,
            tag_id,
            estimated_time: clamp_minutes(self.estimated_time),
            extra: self.extra,
        })
    }
}

/// Drop fields a rewritten record no longer needs; its `tagId` is authoritative
pub(crate) fn retire_legacy_fields(record: &mut Value) {
    if let Some(obj) = record.as_object_mut() {
        obj.remove(LEGACY_TAG_FIELD);
    }
}

fn legacy_tag(extra: &Map<String, Value>) -> Option<String> {
    extra
        .get(LEGACY_TAG_FIELD)
        .and_then(Value::as_str)
        .filter(|tag| !tag.is_empty() && *tag != LEGACY_NO_TAG)
        .map(str::to_string)
}

/// Id of a stored record, read the same way migration reads it
pub(crate) fn record_id(record: &Value) -> Option<String> {
    record.get("id").and_then(lenient_string)
}

fn lenient_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        _ => None,
    }
}

fn lenient_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    }
}

/// Subtask entries without an id are dropped; other fields default
fn lenient_subtask(entry: &Value) -> Option<Subtask> {
    let id = entry.get("id").and_then(lenient_string)?;
    Some(Subtask {
        id,
        text: entry.get("text").and_then(lenient_string).unwrap_or_default(),
        completed: entry.get("completed").and_then(lenient_bool).unwrap_or(false),
    })
}

fn clamp_minutes(minutes: Option<i64>) -> u32 {
    minutes
        .unwrap_or(0)
        .clamp(0, i64::from(u32::MAX))
        .try_into()
        .unwrap_or(0)
}

/// Migrate one stored record, `None` if it cannot become a task
pub fn migrate_record(record: &Value, today: Day) -> Option<Task> {
    let Some(raw) = RawTask::from_record(record) else {
        warn!("Skipping task record that is not an object");
        return None;
    };

    let task = raw.migrate(today);
    if task.is_none() {
        warn!("Skipping task record without an id");
    }
    task
}

/// Migrate every readable record, in storage order
pub fn migrate_records(records: &[Value], today: Day) -> Vec<Task> {
    records
        .iter()
        .filter_map(|record| migrate_record(record, today))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIELDS: [&str; 6] = [
        "day",
        "timeBlock",
        "tagId",
        "estimatedTime",
        "description",
        "subtasks",
    ];

    fn full_record() -> Value {
        json!({
            "id": "a1",
            "text": "Water plants",
            "completed": true,
            "createdAt": 1_700_000_000_000i64,
            "day": "Saturday",
            "timeBlock": "evening",
            "tagId": "personal",
            "estimatedTime": 10,
            "description": "balcony too",
            "subtasks": [{"id": "s1", "text": "fern", "completed": false}]
        })
    }

    #[test]
    fn test_v1_record_gets_all_defaults() {
        let record = json!({
            "id": "old",
            "text": "Legacy",
            "completed": false,
            "createdAt": 5,
            "tag": "work"
        });
        let task = migrate_record(&record, Day::Thursday).unwrap();

        assert_eq!(task.day, Day::Thursday);
        assert_eq!(task.time_block, TimeBlock::Midday);
        assert_eq!(task.tag_id.as_deref(), Some("work"));
        assert_eq!(task.estimated_time, 0);
        assert_eq!(task.description, "");
        assert!(task.subtasks.is_empty());
        // Legacy field is kept, not consumed
        assert_eq!(task.extra.get("tag"), Some(&json!("work")));
    }

    #[test]
    fn test_legacy_none_tag_means_untagged() {
        let record = json!({"id": "x", "text": "t", "tag": "none"});
        let task = migrate_record(&record, Day::Monday).unwrap();
        assert_eq!(task.tag_id, None);
    }

    #[test]
    fn test_empty_tag_id_falls_back_to_legacy() {
        let record = json!({"id": "x", "text": "t", "tagId": "", "tag": "urgent"});
        let task = migrate_record(&record, Day::Monday).unwrap();
        assert_eq!(task.tag_id.as_deref(), Some("urgent"));
    }

    #[test]
    fn test_present_fields_are_kept() {
        let task = migrate_record(&full_record(), Day::Monday).unwrap();
        assert_eq!(task.day, Day::Saturday);
        assert_eq!(task.time_block, TimeBlock::Evening);
        assert_eq!(task.tag_id.as_deref(), Some("personal"));
        assert_eq!(task.estimated_time, 10);
        assert_eq!(task.description, "balcony too");
        assert_eq!(task.subtasks.len(), 1);
        assert!(task.completed);
        assert!(task.extra.is_empty());
    }

    #[test]
    fn test_legacy_labels_are_normalized() {
        let record = json!({"id": "x", "text": "t", "day": "Вторник", "timeBlock": "day"});
        let task = migrate_record(&record, Day::Monday).unwrap();
        assert_eq!(task.day, Day::Tuesday);
        assert_eq!(task.time_block, TimeBlock::Midday);
    }

    #[test]
    fn test_unknown_day_repaired_to_today() {
        let record = json!({"id": "x", "text": "t", "day": "Someday"});
        let task = migrate_record(&record, Day::Sunday).unwrap();
        assert_eq!(task.day, Day::Sunday);
    }

    #[test]
    fn test_negative_estimate_clamped() {
        let record = json!({"id": "x", "text": "t", "estimatedTime": -20});
        assert_eq!(migrate_record(&record, Day::Monday).unwrap().estimated_time, 0);
    }

    #[test]
    fn test_records_without_id_or_shape_are_skipped() {
        let records = vec![
            json!({"text": "no id"}),
            json!("just a string"),
            json!({"id": "ok", "text": "fine"}),
            json!({"id": null, "text": "null id"}),
        ];
        let tasks = migrate_records(&records, Day::Monday);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "ok");
    }

    #[test]
    fn test_mistyped_fields_default_without_hiding_record() {
        let records = vec![
            json!({"id": "a", "text": "half hour", "estimatedTime": 15.5, "createdAt": 2}),
            json!({
                "id": "b",
                "text": "checklist",
                "completed": "yes",
                "subtasks": [{"id": 1, "text": "first"}, "junk", {"text": "no id"}],
                "description": 42
            }),
        ];
        let tasks = migrate_records(&records, Day::Monday);
        assert_eq!(tasks.len(), 2);

        assert_eq!(tasks[0].estimated_time, 16);

        let checklist = &tasks[1];
        assert!(!checklist.completed);
        assert_eq!(checklist.description, "");
        assert_eq!(checklist.subtasks.len(), 1);
        assert_eq!(checklist.subtasks[0].id, "1");
        assert_eq!(checklist.subtasks[0].text, "first");
        assert!(checklist.extra.is_empty());
    }

    #[test]
    fn test_numeric_id_is_addressable() {
        let task = migrate_record(&json!({"id": 7, "text": "t"}), Day::Monday).unwrap();
        assert_eq!(task.id, "7");
    }

    #[test]
    fn test_retire_legacy_fields_drops_tag() {
        let mut record = json!({"id": "x", "tagId": null, "tag": "work", "pinned": true});
        retire_legacy_fields(&mut record);
        assert_eq!(record, json!({"id": "x", "tagId": null, "pinned": true}));
    }

    #[test]
    fn test_schema_version_detection() {
        let v1 = RawTask::from_record(&json!({"id": "a", "tag": "work"})).unwrap();
        let v2 = RawTask::from_record(&json!({"id": "a", "day": "Monday"})).unwrap();
        let v3 = RawTask::from_record(&full_record()).unwrap();
        assert_eq!(v1.schema_version(), SchemaVersion::V1);
        assert_eq!(v2.schema_version(), SchemaVersion::V2);
        assert_eq!(v3.schema_version(), SchemaVersion::V3);
    }

    #[test]
    fn test_migration_is_idempotent_for_every_missing_subset() {
        // Every subset of the optional fields, removed from a full record
        for mask in 0u32..(1 << FIELDS.len()) {
            let mut record = full_record();
            let obj = record.as_object_mut().unwrap();
            obj.insert("tag".to_string(), json!("work"));
            for (bit, field) in FIELDS.iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    obj.remove(*field);
                }
            }

            let once = migrate_records(&[record], Day::Wednesday);
            let once_json = serde_json::to_string(&once).unwrap();

            let reread: Vec<Value> = serde_json::from_str(&once_json).unwrap();
            let twice = migrate_records(&reread, Day::Wednesday);
            let twice_json = serde_json::to_string(&twice).unwrap();

            assert_eq!(once_json, twice_json, "mask {:#08b}", mask);
            assert_eq!(once, twice);
        }
    }
}
