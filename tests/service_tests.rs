//! Integration tests for TodoService: persistence, completion rules and queries

mod common;

use common::{at, data_file, fixed_now, get_test_service};
use std::path::Path;
use tempfile::TempDir;
use todo_mcp::{AppConfig, DueFilter, ListQuery, SortKey, SortOrder, TodoError, TodoService};

#[test]
fn test_todos_survive_restart() {
    let dir = TempDir::new().unwrap();
    {
        let mut service = get_test_service(&dir);
        let todo = service.add_todo("Plan trip").unwrap();
        service.add_subtask(todo.id, "Book flights").unwrap();
        service
            .set_todo_due_date(todo.id, Some(at(2025, 2, 1, 18, 0)))
            .unwrap();
    }

    let mut service = get_test_service(&dir);
    let todo = service.get_todo_by_id(1).unwrap().unwrap();
    assert_eq!(todo.title, "Plan trip");
    assert_eq!(todo.subtasks.len(), 1);
    assert_eq!(todo.subtasks[0].title, "Book flights");
    assert_eq!(todo.due_date, Some(at(2025, 2, 1, 18, 0)));
    assert_eq!(service.add_todo("Next").unwrap().id, 2);
}

#[test]
fn test_folder_is_created_per_todo() {
    let dir = TempDir::new().unwrap();
    let mut service = get_test_service(&dir);

    let todo = service.add_todo("Quarterly report: Q1/Q2").unwrap();
    let folder = Path::new(&todo.folder_path);
    assert!(folder.is_dir());
    assert_eq!(
        folder.file_name().unwrap().to_string_lossy(),
        "todo_1_Quarterly_report__Q1_Q2"
    );
    assert!(folder.starts_with(dir.path().join("todo_folders")));
}

#[test]
fn test_rename_keeps_folder() {
    let dir = TempDir::new().unwrap();
    let mut service = get_test_service(&dir);
    let todo = service.add_todo("Old name").unwrap();

    let renamed = service.update_todo(todo.id, "  New name  ").unwrap();
    assert_eq!(renamed.title, "New name");
    assert_eq!(renamed.folder_path, todo.folder_path);
    assert!(Path::new(&todo.folder_path).is_dir());
}

#[test]
fn test_delete_without_folder_keeps_files() {
    let dir = TempDir::new().unwrap();
    let mut service = get_test_service(&dir);
    let todo = service.add_todo("Keep my files").unwrap();
    std::fs::write(Path::new(&todo.folder_path).join("notes.txt"), "hello").unwrap();

    let deleted = service.delete_todo(todo.id, false).unwrap();
    assert!(!deleted.folder_deleted);
    assert!(Path::new(&todo.folder_path).join("notes.txt").is_file());
    assert!(service.get_all_todos().unwrap().is_empty());
}

#[test]
fn test_delete_with_folder_removes_files() {
    let dir = TempDir::new().unwrap();
    let mut service = get_test_service(&dir);
    let todo = service.add_todo("Scratch").unwrap();
    std::fs::write(Path::new(&todo.folder_path).join("draft.md"), "# draft").unwrap();

    let deleted = service.delete_todo(todo.id, true).unwrap();
    assert!(deleted.folder_deleted);
    assert!(!Path::new(&todo.folder_path).exists());
}

// サブタスク ID は todo をまたいで一意
#[test]
fn test_subtask_ids_are_unique_across_todos() {
    let dir = TempDir::new().unwrap();
    let mut service = get_test_service(&dir);
    let a = service.add_todo("A").unwrap();
    let b = service.add_todo("B").unwrap();

    assert_eq!(service.add_subtask(a.id, "a1").unwrap().id, 1);
    assert_eq!(service.add_subtask(b.id, "b1").unwrap().id, 2);
    assert_eq!(service.add_subtask(a.id, "a2").unwrap().id, 3);

    service.clear_cache();
    assert_eq!(service.add_subtask(b.id, "b2").unwrap().id, 4);
}

#[test]
fn test_completion_follows_subtasks() {
    let dir = TempDir::new().unwrap();
    let mut service = get_test_service(&dir);
    let todo = service.add_todo("Release").unwrap();
    let s1 = service.add_subtask(todo.id, "Tag").unwrap();
    let s2 = service.add_subtask(todo.id, "Publish").unwrap();

    let after_one = service.toggle_subtask_completion(todo.id, s1.id).unwrap();
    assert!(!after_one.is_completed());
    assert_eq!(after_one.completion_rate(), 0.5);

    let after_two = service.toggle_subtask_completion(todo.id, s2.id).unwrap();
    assert!(after_two.is_completed());
    assert_eq!(after_two.completed_at, Some(fixed_now()));

    // 1つ戻すと未完了に戻る
    let reopened = service.toggle_subtask_completion(todo.id, s2.id).unwrap();
    assert!(!reopened.is_completed());
    assert_eq!(reopened.completed_at, None);
}

#[test]
fn test_adding_subtask_reopens_completed_todo() {
    let dir = TempDir::new().unwrap();
    let mut service = get_test_service(&dir);
    let todo = service.add_todo("Groceries").unwrap();
    service.set_todo_completed(todo.id, true).unwrap();

    service.add_subtask(todo.id, "Forgot milk").unwrap();
    let todo = service.get_todo_by_id(todo.id).unwrap().unwrap();
    assert!(!todo.is_completed());
}

#[test]
fn test_deleting_last_open_subtask_completes_todo() {
    let dir = TempDir::new().unwrap();
    let mut service = get_test_service(&dir);
    let todo = service.add_todo("Clean up").unwrap();
    let done = service.add_subtask(todo.id, "Desk").unwrap();
    let open = service.add_subtask(todo.id, "Garage").unwrap();
    service.toggle_subtask_completion(todo.id, done.id).unwrap();

    service.delete_subtask(todo.id, open.id).unwrap();
    let todo = service.get_todo_by_id(todo.id).unwrap().unwrap();
    assert!(todo.is_completed());
    assert_eq!(service.get_subtasks(todo.id).unwrap().len(), 1);
}

#[test]
fn test_complete_and_reopen_todo_with_subtasks() {
    let dir = TempDir::new().unwrap();
    let mut service = get_test_service(&dir);
    let todo = service.add_todo("Move").unwrap();
    service.add_subtask(todo.id, "Pack").unwrap();
    service.add_subtask(todo.id, "Drive").unwrap();

    let completed = service.set_todo_completed(todo.id, true).unwrap();
    assert!(completed.subtasks.iter().all(|s| s.is_completed));
    assert_eq!(completed.completion_rate(), 1.0);

    let reopened = service.set_todo_completed(todo.id, false).unwrap();
    assert!(reopened.subtasks.iter().all(|s| !s.is_completed));
    assert!(!reopened.is_completed());
}

#[test]
fn test_missing_ids_are_errors() {
    let dir = TempDir::new().unwrap();
    let mut service = get_test_service(&dir);
    let todo = service.add_todo("Only one").unwrap();

    assert!(matches!(
        service.add_subtask(99, "x"),
        Err(TodoError::TodoNotFound(99))
    ));
    assert!(matches!(
        service.toggle_subtask_completion(todo.id, 5),
        Err(TodoError::SubtaskNotFound {
            todo_id: 1,
            subtask_id: 5
        })
    ));
    assert!(matches!(
        service.set_todo_completed(42, true),
        Err(TodoError::TodoNotFound(42))
    ));
}

#[test]
fn test_subtask_due_date_cannot_exceed_todo() {
    let dir = TempDir::new().unwrap();
    let mut service = get_test_service(&dir);
    let todo = service.add_todo("Launch").unwrap();
    let subtask = service.add_subtask(todo.id, "Prepare").unwrap();
    service
        .set_todo_due_date(todo.id, Some(at(2025, 1, 20, 18, 0)))
        .unwrap();

    assert!(
        service
            .validate_subtask_due_date(todo.id, at(2025, 1, 20, 18, 0))
            .is_ok()
    );
    assert!(matches!(
        service.set_subtask_due_date(todo.id, subtask.id, Some(at(2025, 1, 21, 9, 0))),
        Err(TodoError::InvalidDueDate(_))
    ));

    let dated = service
        .set_subtask_due_date(todo.id, subtask.id, Some(at(2025, 1, 19, 9, 0)))
        .unwrap();
    assert_eq!(dated.due_date, Some(at(2025, 1, 19, 9, 0)));
}

#[test]
fn test_due_date_queries() {
    let dir = TempDir::new().unwrap();
    let mut service = get_test_service(&dir);
    let overdue = service
        .add_todo_with_due_date("Overdue", Some(at(2025, 1, 15, 11, 30)))
        .unwrap();
    let today = service
        .add_todo_with_due_date("Tonight", Some(at(2025, 1, 15, 20, 0)))
        .unwrap();
    let tomorrow = service
        .add_todo_with_due_date("Tomorrow", Some(at(2025, 1, 16, 9, 0)))
        .unwrap();
    let later = service
        .add_todo_with_due_date("Next month", Some(at(2025, 2, 15, 9, 0)))
        .unwrap();
    service.add_todo("Undated").unwrap();

    let ids = |todos: Vec<todo_mcp::Todo>| todos.iter().map(|t| t.id).collect::<Vec<_>>();

    assert_eq!(ids(service.get_overdue_todos().unwrap()), vec![overdue.id]);
    assert_eq!(ids(service.get_due_today_todos().unwrap()), vec![today.id]);
    assert_eq!(
        ids(service.get_urgent_todos(24).unwrap()),
        vec![today.id, tomorrow.id]
    );
    assert_eq!(
        ids(service
            .get_todos_by_due_date(at(2025, 1, 16, 0, 0), at(2025, 2, 15, 9, 0))
            .unwrap()),
        vec![tomorrow.id, later.id]
    );

    // 完了したものは期限切れに含まれない
    service.set_todo_completed(overdue.id, true).unwrap();
    assert!(service.get_overdue_todos().unwrap().is_empty());
}

#[test]
fn test_todos_with_overdue_subtasks() {
    let dir = TempDir::new().unwrap();
    let mut service = get_test_service(&dir);
    let todo = service.add_todo("Project").unwrap();
    let subtask = service.add_subtask(todo.id, "Step").unwrap();
    service.add_todo("Other").unwrap();
    service
        .set_subtask_due_date(todo.id, subtask.id, Some(at(2025, 1, 15, 11, 45)))
        .unwrap();

    let found = service.get_todos_with_overdue_subtasks().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, todo.id);
}

#[test]
fn test_filter_and_sort() {
    let dir = TempDir::new().unwrap();
    let mut service = get_test_service(&dir);
    let report = service
        .add_todo_with_due_date("Write report", Some(at(2025, 1, 17, 18, 0)))
        .unwrap();
    let errands = service.add_todo("Errands").unwrap();
    service.add_subtask(errands.id, "Pick up REPORT cards").unwrap();
    let done = service
        .add_todo_with_due_date("Archive", Some(at(2025, 1, 16, 18, 0)))
        .unwrap();
    service.set_todo_completed(done.id, true).unwrap();

    let titles = |todos: Vec<todo_mcp::Todo>| todos.into_iter().map(|t| t.title).collect::<Vec<_>>();

    // 検索はサブタスクのタイトルにも一致する
    assert_eq!(
        titles(service.filter_todos("report", true).unwrap()),
        vec!["Write report", "Errands"]
    );
    assert_eq!(titles(service.filter_todos("", false).unwrap()).len(), 2);

    let by_due = ListQuery {
        sort: SortKey::DueDate,
        ..ListQuery::default()
    };
    assert_eq!(
        titles(service.get_filtered_and_sorted_todos(&by_due).unwrap()),
        vec!["Archive", "Write report", "Errands"]
    );

    let this_week_open = ListQuery {
        filter: DueFilter::ThisWeek,
        show_completed: false,
        sort: SortKey::Title,
        order: Some(SortOrder::Descending),
        ..ListQuery::default()
    };
    assert_eq!(
        titles(service.get_filtered_and_sorted_todos(&this_week_open).unwrap()),
        vec![report.title.clone()]
    );

    let by_progress = ListQuery {
        sort: SortKey::Progress,
        ..ListQuery::default()
    };
    assert_eq!(
        titles(service.get_filtered_and_sorted_todos(&by_progress).unwrap())[0],
        "Archive"
    );
}

#[test]
fn test_config_limits_title_length() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig {
        data_file: data_file(&dir),
        folders_dir: dir.path().join("todo_folders"),
        max_title_length: 10,
        ..AppConfig::default()
    };
    let mut service = TodoService::from_config(&config);

    assert!(service.add_todo("Short").is_ok());
    assert!(matches!(
        service.add_todo("Much too long title"),
        Err(TodoError::TitleTooLong { len: 19, max: 10 })
    ));
}

#[test]
fn test_flush_writes_only_changes() {
    let dir = TempDir::new().unwrap();
    let mut service = get_test_service(&dir);
    service.add_todo("Saved right away").unwrap();

    assert!(!service.flush().unwrap());
    service.force_save().unwrap();
    assert!(!service.flush().unwrap());
    assert_eq!(service.get_max_todo_id().unwrap(), 1);
}
