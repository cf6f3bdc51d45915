//! Reading stored documents
//!
//! Each todo entry is parsed on its own so that one damaged entry does not take
//! the whole file down with it. Files written before subtasks and due dates
//! existed are accepted and flagged for rewriting.

use super::item::Todo;
use super::todo_file::{LoadReport, MAX_ID, TodoFile, max_subtask_id, max_todo_id};
use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Fields added to todos after the first file format
const LATER_TODO_FIELDS: [&str; 4] = ["subtasks", "is_expanded", "due_date", "completed_at"];

/// Fields added to subtasks after they were introduced
const LATER_SUBTASK_FIELDS: [&str; 2] = ["due_date", "completed_at"];

/// Parse a timestamp as written by this program or by hand
pub fn parse_stored_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ]
    .iter()
    .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

/// Deserialize an optional timestamp, treating anything unreadable as absent
pub(crate) fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) if text.trim().is_empty() => None,
        Some(Value::String(text)) => {
            let parsed = parse_stored_datetime(&text);
            if parsed.is_none() {
                log::warn!("Ignoring unreadable timestamp '{}'", text);
            }
            parsed
        }
        Some(other) => {
            log::warn!("Ignoring timestamp of unexpected type: {}", other);
            None
        }
    })
}

fn lacks_any(object: &Map<String, Value>, fields: &[&str]) -> bool {
    fields.iter().any(|field| !object.contains_key(*field))
}

/// Whether a raw todo entry predates subtasks or due dates
fn entry_needs_migration(entry: &Value) -> bool {
    let Some(object) = entry.as_object() else {
        return false;
    };
    if lacks_any(object, &LATER_TODO_FIELDS) {
        return true;
    }
    object
        .get("subtasks")
        .and_then(Value::as_array)
        .is_some_and(|subtasks| {
            subtasks
                .iter()
                .filter_map(Value::as_object)
                .any(|s| lacks_any(s, &LATER_SUBTASK_FIELDS))
        })
}

fn stored_id(document: &Map<String, Value>, key: &str) -> Option<u32> {
    document
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

impl TodoFile {
    /// Build a document from parsed JSON
    ///
    /// Fails only when the document itself is unusable (not an object, or no
    /// `todos` array); broken entries are skipped and counted in the report.
    /// Id conflicts are repaired before returning.
    pub fn from_value(value: Value) -> Result<(Self, LoadReport)> {
        let Value::Object(document) = value else {
            bail!("Data is not a JSON object");
        };
        let Some(entries) = document.get("todos") else {
            bail!("Missing 'todos' key");
        };
        let Some(entries) = entries.as_array() else {
            bail!("'todos' is not a list");
        };

        let mut report = LoadReport {
            migrated: !document.contains_key("next_subtask_id"),
            ..LoadReport::default()
        };

        let mut todos = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            match Todo::deserialize(entry) {
                Ok(todo) if todo.id > MAX_ID => {
                    report.skipped += 1;
                    log::warn!(
                        "Skipping todo at index {}: id {} is out of range",
                        index,
                        todo.id
                    );
                }
                Ok(mut todo) => {
                    if entry_needs_migration(entry) {
                        report.migrated = true;
                    }
                    let before = todo.subtasks.len();
                    todo.subtasks.retain(|s| s.id <= MAX_ID);
                    if todo.subtasks.len() != before {
                        report.repaired = true;
                        log::warn!(
                            "Dropped {} subtask(s) of todo {} with out-of-range ids",
                            before - todo.subtasks.len(),
                            todo.id
                        );
                    }
                    todos.push(todo);
                }
                Err(e) => {
                    report.skipped += 1;
                    log::warn!("Skipping unreadable todo at index {}: {}", index, e);
                }
            }
        }
        if report.skipped > 0 {
            log::warn!("Skipped {} unreadable todo(s)", report.skipped);
        }
        if report.migrated {
            log::info!("Upgrading data file written by an older version");
        }

        let next_id = stored_id(&document, "next_id").unwrap_or(0);
        let next_subtask_id = stored_id(&document, "next_subtask_id").unwrap_or(0);
        let mut file = TodoFile {
            next_id: next_id.max(max_todo_id(&todos).saturating_add(1)),
            next_subtask_id: next_subtask_id.max(max_subtask_id(&todos).saturating_add(1)),
            todos,
        };
        report.repaired |= file.repair();

        Ok((file, report))
    }

    /// Parse a document from JSON text
    pub fn from_json_str(text: &str) -> Result<(Self, LoadReport)> {
        let value: Value = serde_json::from_str(text).context("Invalid JSON")?;
        Self::from_value(value)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize todos")
    }
}
