use super::serde_impl::lenient_datetime;
use super::subtask::SubTask;
use crate::dates::{self, DueDateError, UrgencyLevel};
use crate::validation::sanitize_folder_name;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

fn default_expanded() -> bool {
    true
}

/// A todo with its own folder on disk and an optional checklist of subtasks
///
/// A todo counts as completed either when it was explicitly completed
/// (`completed_at` is set) or when it has subtasks and all of them are done.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: u32,
    pub title: String,
    pub created_at: NaiveDateTime,
    /// Path of the todo's folder, as created under the folders directory
    #[serde(default)]
    pub folder_path: String,
    #[serde(default)]
    pub subtasks: Vec<SubTask>,
    /// Whether subtasks are shown in tree listings
    #[serde(default = "default_expanded")]
    pub is_expanded: bool,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub due_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub completed_at: Option<NaiveDateTime>,
}

impl Todo {
    pub fn new(
        id: u32,
        title: impl Into<String>,
        folder_path: impl Into<String>,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            created_at: now,
            folder_path: folder_path.into(),
            subtasks: Vec::new(),
            is_expanded: true,
            due_date: None,
            completed_at: None,
        }
    }

    /// Directory name for this todo: `todo_{id}_{sanitized title}`
    pub fn folder_name(&self) -> String {
        format!("todo_{}_{}", self.id, sanitize_folder_name(&self.title))
    }

    pub fn is_completed(&self) -> bool {
        if self.completed_at.is_some() {
            return true;
        }
        !self.subtasks.is_empty() && self.subtasks.iter().all(|s| s.is_completed)
    }

    /// Share of completed subtasks in `0.0..=1.0`
    pub fn completion_rate(&self) -> f64 {
        if self.subtasks.is_empty() {
            return if self.is_completed() { 1.0 } else { 0.0 };
        }
        let done = self.subtasks.iter().filter(|s| s.is_completed).count();
        done as f64 / self.subtasks.len() as f64
    }

    /// Complete the todo and every subtask
    pub fn mark_completed(&mut self, now: NaiveDateTime) {
        self.completed_at = Some(now);
        for subtask in &mut self.subtasks {
            subtask.mark_completed(now);
        }
    }

    /// Reopen the todo and every subtask
    pub fn mark_uncompleted(&mut self) {
        self.completed_at = None;
        for subtask in &mut self.subtasks {
            subtask.mark_uncompleted();
        }
    }

    /// Align `completed_at` with the subtasks after one of them changed
    pub fn sync_completion(&mut self, now: NaiveDateTime) {
        let all_done = !self.subtasks.is_empty() && self.subtasks.iter().all(|s| s.is_completed);
        if all_done {
            if self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        } else {
            self.completed_at = None;
        }
    }

    pub fn add_subtask(&mut self, subtask: SubTask) {
        self.subtasks.push(subtask);
    }

    pub fn remove_subtask(&mut self, subtask_id: u32) -> Option<SubTask> {
        let index = self.subtasks.iter().position(|s| s.id == subtask_id)?;
        Some(self.subtasks.remove(index))
    }

    pub fn find_subtask(&self, subtask_id: u32) -> Option<&SubTask> {
        self.subtasks.iter().find(|s| s.id == subtask_id)
    }

    pub fn find_subtask_mut(&mut self, subtask_id: u32) -> Option<&mut SubTask> {
        self.subtasks.iter_mut().find(|s| s.id == subtask_id)
    }

    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        match self.due_date {
            Some(due) => !self.is_completed() && due < now,
            None => false,
        }
    }

    pub fn urgency_level(&self, now: NaiveDateTime) -> UrgencyLevel {
        if self.is_completed() {
            UrgencyLevel::Normal
        } else {
            dates::urgency_level(self.due_date, now)
        }
    }

    pub fn time_remaining(&self, now: NaiveDateTime) -> Option<Duration> {
        self.due_date.map(|due| due - now)
    }

    pub fn time_remaining_text(&self, now: NaiveDateTime) -> String {
        let completed_at = if self.is_completed() {
            // Completed through subtasks only: use the latest subtask completion
            self.completed_at
                .or_else(|| self.subtasks.iter().filter_map(|s| s.completed_at).max())
                .or(Some(now))
        } else {
            None
        };
        dates::time_remaining_text(self.due_date, completed_at, now)
    }

    pub fn has_overdue_subtasks(&self, now: NaiveDateTime) -> bool {
        self.subtasks.iter().any(|s| s.is_overdue(now))
    }

    /// Check a subtask due date against this todo's due date
    pub fn validate_subtask_due_date(
        &self,
        due: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<(), DueDateError> {
        dates::validate_due_date(due, self.due_date, now)
    }
}
