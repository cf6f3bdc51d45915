//! Due date notifications
//!
//! Everything here is computed from a snapshot of todos taken at one instant,
//! so that the counts in a single message always agree with each other.

use crate::service::{
    due_today_todos, overdue_todos, todos_by_due_date, todos_with_overdue_subtasks, urgent_todos,
};
use crate::dates::{DateRangeError, MAX_RANGE_DAYS};
use crate::todo::Todo;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Window, in hours, for a todo to count as urgent
pub const URGENT_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    High,
    Medium,
    Low,
    None,
}

impl fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotificationPriority::High => "high",
            NotificationPriority::Medium => "medium",
            NotificationPriority::Low => "low",
            NotificationPriority::None => "none",
        };
        f.write_str(s)
    }
}

/// Counts shown in status lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusSummary {
    pub overdue: usize,
    pub due_today: usize,
    pub urgent: usize,
    pub total: usize,
    pub completed: usize,
}

/// Titles per notification category
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DetailedInfo {
    pub overdue: Vec<String>,
    pub due_today: Vec<String>,
    pub urgent: Vec<String>,
}

pub struct NotificationService {
    todos: Vec<Todo>,
    now: NaiveDateTime,
}

fn titles(todos: &[Todo]) -> Vec<String> {
    todos.iter().map(|t| t.title.clone()).collect()
}

impl NotificationService {
    pub fn new(todos: Vec<Todo>, now: NaiveDateTime) -> Self {
        Self { todos, now }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    pub fn overdue_todos(&self) -> Vec<Todo> {
        overdue_todos(&self.todos, self.now)
    }

    pub fn due_today_todos(&self) -> Vec<Todo> {
        due_today_todos(&self.todos, self.now)
    }

    pub fn urgent_todos(&self) -> Vec<Todo> {
        urgent_todos(&self.todos, self.now, URGENT_HOURS)
    }

    pub fn todos_with_overdue_subtasks(&self) -> Vec<Todo> {
        todos_with_overdue_subtasks(&self.todos, self.now)
    }

    /// True when anything is overdue or due today
    pub fn should_show_startup_notification(&self) -> bool {
        !self.overdue_todos().is_empty() || !self.due_today_todos().is_empty()
    }

    pub fn startup_notification_message(&self) -> String {
        let overdue = self.overdue_todos().len();
        let due_today = self.due_today_todos().len();

        let mut lines = Vec::new();
        if overdue > 0 {
            lines.push(format!("⚠️ {} overdue todo(s).", overdue));
        }
        if due_today > 0 {
            lines.push(format!("📅 {} todo(s) due today.", due_today));
        }

        if lines.is_empty() {
            "All todos are on track.".to_string()
        } else {
            lines.join("\n")
        }
    }

    pub fn status_bar_summary(&self) -> StatusSummary {
        StatusSummary {
            overdue: self.overdue_todos().len(),
            due_today: self.due_today_todos().len(),
            urgent: self.urgent_todos().len(),
            total: self.todos.len(),
            completed: self.todos.iter().filter(|t| t.is_completed()).count(),
        }
    }

    pub fn detailed_info(&self) -> DetailedInfo {
        DetailedInfo {
            overdue: titles(&self.overdue_todos()),
            due_today: titles(&self.due_today_todos()),
            urgent: titles(&self.urgent_todos()),
        }
    }

    pub fn priority(&self) -> NotificationPriority {
        if !self.overdue_todos().is_empty() {
            NotificationPriority::High
        } else if !self.due_today_todos().is_empty() {
            NotificationPriority::Medium
        } else if !self.urgent_todos().is_empty() {
            NotificationPriority::Low
        } else {
            NotificationPriority::None
        }
    }

    /// e.g. `Overdue: 1 | Due today: 2 | Total: 5 | Done: 40%`
    pub fn status_bar_text(&self) -> String {
        let summary = self.status_bar_summary();
        let mut parts = Vec::new();

        if summary.overdue > 0 {
            parts.push(format!("Overdue: {}", summary.overdue));
        }
        if summary.due_today > 0 {
            parts.push(format!("Due today: {}", summary.due_today));
        }
        parts.push(format!("Total: {}", summary.total));
        if summary.total > 0 {
            let rate = summary.completed as f64 / summary.total as f64 * 100.0;
            parts.push(format!("Done: {:.0}%", rate));
        }

        parts.join(" | ")
    }

    /// Incomplete todos due on each day from today through `days` days ahead
    ///
    /// Only todos due from now on are counted; every day in the window has an
    /// entry, zero included. The window is limited to `MAX_RANGE_DAYS`.
    pub fn summary_for_period(
        &self,
        days: u32,
    ) -> Result<BTreeMap<NaiveDate, usize>, DateRangeError> {
        let days = i64::from(days);
        if days > MAX_RANGE_DAYS {
            return Err(DateRangeError::TooLong);
        }
        let end = self
            .now
            .checked_add_signed(Duration::days(days))
            .ok_or(DateRangeError::TooLong)?;
        let upcoming = todos_by_due_date(&self.todos, self.now, end);

        let summary = self
            .now
            .date()
            .iter_days()
            .take_while(|date| *date <= end.date())
            .map(|date| {
                let count = upcoming
                    .iter()
                    .filter(|t| !t.is_completed() && t.due_date.is_some_and(|d| d.date() == date))
                    .count();
                (date, count)
            })
            .collect();
        Ok(summary)
    }
}
