//! Display formatting for todos
//!
//! Plain text for the console and MCP replies, and a JSON view carrying the
//! urgency styling for clients that render their own lists.

use crate::dates::{
    DateFormat, business_days_between, format_due_date, format_duration, relative_time_text,
};
use crate::notification::NotificationService;
use crate::palette::{self, Style};
use crate::todo::{SubTask, Todo};
use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

fn progress_text(todo: &Todo) -> String {
    let done = todo.subtasks.iter().filter(|s| s.is_completed).count();
    format!(
        "{}/{} ({:.0}%)",
        done,
        todo.subtasks.len(),
        todo.completion_rate() * 100.0
    )
}

fn due_suffix(due: Option<NaiveDateTime>, remaining: &str, now: NaiveDateTime) -> String {
    match due {
        Some(_) => format!(
            " | due {} ({})",
            format_due_date(due, DateFormat::Relative, now),
            remaining
        ),
        None => String::new(),
    }
}

/// One line for a todo: `[3] 🟠 !! Write report [1/2 (50%)] | due Today 18:00 (6 hours left)`
pub fn format_todo_line(todo: &Todo, now: NaiveDateTime) -> String {
    let completed = todo.is_completed();
    let level = todo.urgency_level(now);
    let symbol = palette::symbol(level, completed);

    let mut line = format!("[{}] {}", todo.id, palette::icon(level, completed));
    if !symbol.is_empty() {
        line.push(' ');
        line.push_str(symbol);
    }
    line.push(' ');
    line.push_str(&todo.title);
    if !todo.subtasks.is_empty() {
        line.push_str(&format!(" [{}]", progress_text(todo)));
    }
    line.push_str(&due_suffix(
        todo.due_date,
        &todo.time_remaining_text(now),
        now,
    ));
    line
}

fn format_subtask_line(subtask: &SubTask, now: NaiveDateTime) -> String {
    let check = if subtask.is_completed { "x" } else { " " };
    let level = subtask.urgency_level(now);
    let symbol = palette::symbol(level, subtask.is_completed);

    let mut line = format!("    - [{}] #{} ", check, subtask.id);
    if !symbol.is_empty() && !subtask.is_completed {
        line.push_str(symbol);
        line.push(' ');
    }
    line.push_str(&subtask.title);
    line.push_str(&due_suffix(
        subtask.due_date,
        &subtask.time_remaining_text(now),
        now,
    ));
    line
}

/// Todos with their subtasks nested underneath (collapsed todos show none)
pub fn format_todo_tree(todos: &[Todo], now: NaiveDateTime) -> String {
    if todos.is_empty() {
        return "No todos found".to_string();
    }

    let mut result = format!("Found {} todo(s):\n\n", todos.len());
    for todo in todos {
        result.push_str(&format_todo_line(todo, now));
        result.push('\n');
        if todo.is_expanded {
            for subtask in &todo.subtasks {
                result.push_str(&format_subtask_line(subtask, now));
                result.push('\n');
            }
        }
    }
    result
}

/// Everything known about one todo
pub fn format_todo_detail(todo: &Todo, now: NaiveDateTime) -> String {
    let level = todo.urgency_level(now);
    let completed = todo.is_completed();

    let mut result = format!("[{}] {}\n", todo.id, todo.title);
    result.push_str(&format!(
        "  Status: {} {}\n",
        palette::icon(level, completed),
        palette::description(level, completed)
    ));
    result.push_str(&format!(
        "  Created: {} ({})\n",
        todo.created_at.format("%Y-%m-%d %H:%M"),
        relative_time_text(todo.created_at, now)
    ));
    if let Some(due) = todo.due_date {
        result.push_str(&format!(
            "  Due: {} ({})\n",
            format_due_date(Some(due), DateFormat::Absolute, now),
            todo.time_remaining_text(now)
        ));
        if !completed && due > now {
            result.push_str(&format!(
                "  Time left: {} ({} business day(s))\n",
                format_duration(due - now),
                business_days_between(now, due)
            ));
        }
    }
    if let Some(done) = todo.completed_at {
        result.push_str(&format!("  Completed: {}\n", done.format("%Y-%m-%d %H:%M")));
    }
    result.push_str(&format!("  Progress: {}\n", progress_text(todo)));
    result.push_str(&format!("  Folder: {}\n", todo.folder_path));

    for subtask in &todo.subtasks {
        result.push_str(&format_subtask_line(subtask, now));
        result.push('\n');
    }
    result
}

/// Status line followed by titles per category
pub fn format_status(notifications: &NotificationService) -> String {
    let mut result = notifications.status_bar_text();
    result.push('\n');
    result.push_str(&notifications.startup_notification_message());

    let info = notifications.detailed_info();
    for (label, titles) in [
        ("Overdue", &info.overdue),
        ("Due today", &info.due_today),
        ("Due within 24 hours", &info.urgent),
    ] {
        if !titles.is_empty() {
            result.push_str(&format!("\n{}:\n", label));
            for title in titles {
                result.push_str(&format!("  - {}\n", title));
            }
        }
    }

    let flagged = notifications.todos_with_overdue_subtasks();
    if !flagged.is_empty() {
        result.push_str("\nWith overdue subtasks:\n");
        for todo in flagged {
            result.push_str(&format!("  - [{}] {}\n", todo.id, todo.title));
        }
    }
    result
}

#[derive(Debug, Serialize)]
pub struct SubTaskView {
    pub id: u32,
    pub title: String,
    pub is_completed: bool,
    pub due_date: Option<NaiveDateTime>,
    pub urgency: crate::dates::UrgencyLevel,
    pub time_remaining: String,
    pub style: Style,
}

#[derive(Debug, Serialize)]
pub struct TodoView {
    pub id: u32,
    pub title: String,
    pub created_at: NaiveDateTime,
    pub folder_path: String,
    pub is_completed: bool,
    pub completion_rate: f64,
    pub due_date: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub urgency: crate::dates::UrgencyLevel,
    pub time_remaining: String,
    /// Whole seconds until due; negative when overdue
    pub seconds_remaining: Option<i64>,
    pub style: Style,
    /// Readable text colour on `style.background`
    pub text_color: &'static str,
    pub subtasks: Vec<SubTaskView>,
}

impl TodoView {
    pub fn new(todo: &Todo, now: NaiveDateTime) -> Self {
        let completed = todo.is_completed();
        let urgency = todo.urgency_level(now);
        let style = palette::style_for(urgency, completed);
        Self {
            id: todo.id,
            title: todo.title.clone(),
            created_at: todo.created_at,
            folder_path: todo.folder_path.clone(),
            is_completed: completed,
            completion_rate: todo.completion_rate(),
            due_date: todo.due_date,
            completed_at: todo.completed_at,
            urgency,
            time_remaining: todo.time_remaining_text(now),
            seconds_remaining: todo.time_remaining(now).map(|d: Duration| d.num_seconds()),
            text_color: palette::contrast_color(style.background),
            style,
            subtasks: todo
                .subtasks
                .iter()
                .map(|s| {
                    let urgency = s.urgency_level(now);
                    SubTaskView {
                        id: s.id,
                        title: s.title.clone(),
                        is_completed: s.is_completed,
                        due_date: s.due_date,
                        urgency,
                        time_remaining: s.time_remaining_text(now),
                        style: palette::style_for(urgency, s.is_completed),
                    }
                })
                .collect(),
        }
    }
}

pub fn todos_to_json(todos: &[Todo], now: NaiveDateTime) -> Result<String> {
    let views: Vec<TodoView> = todos.iter().map(|t| TodoView::new(t, now)).collect();
    serde_json::to_string_pretty(&views).context("Failed to serialize todo list")
}
