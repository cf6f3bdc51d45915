use super::serde_impl::lenient_datetime;
use crate::dates::{self, UrgencyLevel};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A checklist item belonging to a todo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTask {
    /// Unique across all todos
    pub id: u32,
    /// Id of the owning todo
    pub todo_id: u32,
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
    pub created_at: NaiveDateTime,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub due_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub completed_at: Option<NaiveDateTime>,
}

impl SubTask {
    pub fn new(id: u32, todo_id: u32, title: impl Into<String>, now: NaiveDateTime) -> Self {
        Self {
            id,
            todo_id,
            title: title.into(),
            is_completed: false,
            created_at: now,
            due_date: None,
            completed_at: None,
        }
    }

    /// Flip the completion flag, stamping or clearing `completed_at`
    pub fn toggle_completion(&mut self, now: NaiveDateTime) {
        if self.is_completed {
            self.mark_uncompleted();
        } else {
            self.mark_completed(now);
        }
    }

    /// Keeps an existing `completed_at` when already completed
    pub fn mark_completed(&mut self, now: NaiveDateTime) {
        if !self.is_completed || self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
        self.is_completed = true;
    }

    pub fn mark_uncompleted(&mut self) {
        self.is_completed = false;
        self.completed_at = None;
    }

    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        match self.due_date {
            Some(due) => !self.is_completed && due < now,
            None => false,
        }
    }

    pub fn urgency_level(&self, now: NaiveDateTime) -> UrgencyLevel {
        if self.is_completed {
            UrgencyLevel::Normal
        } else {
            dates::urgency_level(self.due_date, now)
        }
    }

    pub fn time_remaining(&self, now: NaiveDateTime) -> Option<Duration> {
        self.due_date.map(|due| due - now)
    }

    pub fn time_remaining_text(&self, now: NaiveDateTime) -> String {
        let completed_at = if self.is_completed {
            self.completed_at
        } else {
            None
        };
        dates::time_remaining_text(self.due_date, completed_at, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_toggle_sets_and_clears_completed_at() {
        let mut sub = SubTask::new(1, 1, "step", now());
        sub.toggle_completion(now());
        assert!(sub.is_completed);
        assert_eq!(sub.completed_at, Some(now()));

        sub.toggle_completion(now());
        assert!(!sub.is_completed);
        assert_eq!(sub.completed_at, None);
    }

    #[test]
    fn test_overdue_ignores_completed() {
        let mut sub = SubTask::new(1, 1, "step", now());
        sub.due_date = Some(now() - Duration::hours(2));
        assert!(sub.is_overdue(now()));
        assert_eq!(sub.urgency_level(now()), UrgencyLevel::Overdue);

        sub.mark_completed(now());
        assert!(!sub.is_overdue(now()));
        assert_eq!(sub.urgency_level(now()), UrgencyLevel::Normal);
        assert!(sub.time_remaining_text(now()).starts_with("Done:"));
    }

    #[test]
    fn test_time_remaining() {
        let mut sub = SubTask::new(1, 1, "step", now());
        assert_eq!(sub.time_remaining(now()), None);
        sub.due_date = Some(now() + Duration::hours(5));
        assert_eq!(sub.time_remaining(now()), Some(Duration::hours(5)));
        assert_eq!(sub.time_remaining_text(now()), "5 hours left");
    }
}
