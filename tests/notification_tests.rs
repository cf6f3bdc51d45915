//! Integration tests for due date notifications built from the service

mod common;

use common::{at, get_test_service};
use tempfile::TempDir;
use todo_mcp::formatting::format_status;
use todo_mcp::notification::NotificationPriority;

#[test]
fn test_nothing_due() {
    let dir = TempDir::new().unwrap();
    let mut service = get_test_service(&dir);
    service
        .add_todo_with_due_date("Far away", Some(at(2025, 6, 1, 18, 0)))
        .unwrap();

    let notifications = service.notifications().unwrap();
    assert!(!notifications.should_show_startup_notification());
    assert_eq!(
        notifications.startup_notification_message(),
        "All todos are on track."
    );
    assert_eq!(notifications.priority(), NotificationPriority::None);
    assert_eq!(notifications.status_bar_text(), "Total: 1 | Done: 0%");
}

#[test]
fn test_overdue_and_due_today() {
    let dir = TempDir::new().unwrap();
    let mut service = get_test_service(&dir);
    service
        .add_todo_with_due_date("Missed call", Some(at(2025, 1, 15, 11, 15)))
        .unwrap();
    service
        .add_todo_with_due_date("Evening run", Some(at(2025, 1, 15, 19, 0)))
        .unwrap();
    let done = service.add_todo("Done already").unwrap();
    service.set_todo_completed(done.id, true).unwrap();

    let notifications = service.notifications().unwrap();
    assert!(notifications.should_show_startup_notification());
    assert_eq!(
        notifications.startup_notification_message(),
        "⚠️ 1 overdue todo(s).\n📅 1 todo(s) due today."
    );
    assert_eq!(notifications.priority(), NotificationPriority::High);
    assert_eq!(
        notifications.status_bar_text(),
        "Overdue: 1 | Due today: 1 | Total: 3 | Done: 33%"
    );

    let summary = notifications.status_bar_summary();
    assert_eq!(summary.urgent, 1);
    assert_eq!(summary.completed, 1);

    let info = notifications.detailed_info();
    assert_eq!(info.overdue, vec!["Missed call"]);
    assert_eq!(info.due_today, vec!["Evening run"]);
}

// 明日の期限は「緊急」だが通知の優先度は低
#[test]
fn test_urgent_only_is_low_priority() {
    let dir = TempDir::new().unwrap();
    let mut service = get_test_service(&dir);
    service
        .add_todo_with_due_date("Morning meeting", Some(at(2025, 1, 16, 9, 0)))
        .unwrap();

    let notifications = service.notifications().unwrap();
    assert!(!notifications.should_show_startup_notification());
    assert_eq!(notifications.priority(), NotificationPriority::Low);
}

#[test]
fn test_summary_for_period_counts_each_day() {
    let dir = TempDir::new().unwrap();
    let mut service = get_test_service(&dir);
    service
        .add_todo_with_due_date("Thu 1", Some(at(2025, 1, 16, 9, 0)))
        .unwrap();
    service
        .add_todo_with_due_date("Thu 2", Some(at(2025, 1, 16, 17, 0)))
        .unwrap();
    service
        .add_todo_with_due_date("Sat", Some(at(2025, 1, 18, 10, 0)))
        .unwrap();
    service
        .add_todo_with_due_date("Next month", Some(at(2025, 2, 10, 10, 0)))
        .unwrap();

    let summary = service
        .notifications()
        .unwrap()
        .summary_for_period(3)
        .unwrap();
    let counts: Vec<usize> = summary.values().copied().collect();
    assert_eq!(summary.len(), 4);
    assert_eq!(counts, vec![0, 2, 0, 1]);
}

#[test]
fn test_format_status_lists_overdue_subtasks() {
    let dir = TempDir::new().unwrap();
    let mut service = get_test_service(&dir);
    let todo = service.add_todo("Paperwork").unwrap();
    let subtask = service.add_subtask(todo.id, "Sign form").unwrap();
    service
        .set_subtask_due_date(todo.id, subtask.id, Some(at(2025, 1, 15, 11, 30)))
        .unwrap();

    let text = format_status(&service.notifications().unwrap());
    assert!(text.contains("With overdue subtasks:\n  - [1] Paperwork"));
}
