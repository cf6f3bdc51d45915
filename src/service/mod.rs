//! Todo operations on top of storage and per-todo folders
//!
//! - `mod.rs`: `TodoService`, todo CRUD, completion and due dates
//! - `subtasks`: subtask operations
//! - `queries`: due date queries, filtering and sorting

mod queries;
mod subtasks;

pub use queries::{
    DueFilter, ListQuery, SortKey, SortOrder, due_today_todos, filter_todos, overdue_todos,
    query_todos, sort_todos, todos_by_due_date, todos_with_overdue_subtasks, urgent_todos,
};

use crate::config::AppConfig;
use crate::dates::{self, local_now};
use crate::error::{TodoError, TodoResult};
use crate::folders::FolderService;
use crate::notification::NotificationService;
use crate::storage::Storage;
use crate::todo::{MAX_ID, Todo, following_id};
use crate::validation::{DEFAULT_MAX_TITLE_LENGTH, validate_title};
use chrono::NaiveDateTime;

/// A removed todo and whether its folder went with it
#[derive(Debug, Clone)]
pub struct DeletedTodo {
    pub todo: Todo,
    pub folder_deleted: bool,
}

pub struct TodoService {
    storage: Storage,
    folders: FolderService,
    /// Loaded todos, `None` until first use or after `clear_cache`
    cache: Option<Vec<Todo>>,
    max_title_length: usize,
    default_due_hour: u32,
    clock: fn() -> NaiveDateTime,
}

impl TodoService {
    pub fn new(storage: Storage, folders: FolderService) -> Self {
        Self {
            storage,
            folders,
            cache: None,
            max_title_length: DEFAULT_MAX_TITLE_LENGTH,
            default_due_hour: 18,
            clock: local_now,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let storage = Storage::new(&config.data_file, config.backup_count, config.sync_git);
        let folders = FolderService::new(&config.folders_dir);
        Self {
            max_title_length: config.max_title_length,
            default_due_hour: config.default_due_hour,
            ..Self::new(storage, folders)
        }
    }

    /// Replace the clock, e.g. with a fixed time in tests
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    pub fn default_due_hour(&self) -> u32 {
        self.default_due_hour
    }

    pub fn folders(&self) -> &FolderService {
        &self.folders
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Parse free-form due date input against the service clock
    pub fn parse_due_input(&self, text: &str) -> TodoResult<NaiveDateTime> {
        dates::parse_user_date_input(text, self.now(), self.default_due_hour)
            .ok_or_else(|| TodoError::UnparsableDate(text.trim().to_string()))
    }

    pub(crate) fn todos_mut(&mut self) -> TodoResult<&mut Vec<Todo>> {
        let todos = match self.cache.take() {
            Some(todos) => todos,
            None => {
                let mut todos = self.storage.load().map_err(TodoError::storage)?;
                todos.sort_by_key(|t| t.created_at);
                todos
            }
        };
        Ok(self.cache.insert(todos))
    }

    pub(crate) fn todo_mut(&mut self, id: u32) -> TodoResult<&mut Todo> {
        self.todos_mut()?
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TodoError::TodoNotFound(id))
    }

    /// Write the cached todos; on failure the cache is dropped so the next
    /// read reflects what is actually on disk
    pub(crate) fn persist(&mut self, message: &str) -> TodoResult<()> {
        let Some(todos) = &self.cache else {
            return Ok(());
        };
        if let Err(e) = self.storage.save_with_message(todos, message) {
            self.cache = None;
            return Err(TodoError::storage(e));
        }
        Ok(())
    }

    pub fn add_todo(&mut self, title: &str) -> TodoResult<Todo> {
        self.add_todo_with_due_date(title, None)
    }

    /// Create a todo and its folder
    ///
    /// The folder is removed again when the todo cannot be saved.
    pub fn add_todo_with_due_date(
        &mut self,
        title: &str,
        due_date: Option<NaiveDateTime>,
    ) -> TodoResult<Todo> {
        let title = validate_title(title, self.max_title_length)?;
        let now = self.now();
        if let Some(due) = due_date {
            dates::validate_due_date(due, None, now)?;
        }

        let max_id = self.todos_mut()?.iter().map(|t| t.id).max().unwrap_or(0);
        let next_id = self.storage.next_id().map_err(TodoError::storage)?;
        let id = following_id(max_id)
            .map(|after_max| next_id.max(after_max))
            .filter(|&id| id <= MAX_ID)
            .ok_or(TodoError::IdsExhausted("todo"))?;

        let mut todo = Todo::new(id, title, "", now);
        todo.due_date = due_date;
        let folder = self
            .folders
            .create_todo_folder(&todo)
            .map_err(|e| TodoError::Folder(format!("{:#}", e)))?;
        todo.folder_path = folder.to_string_lossy().into_owned();

        self.todos_mut()?.push(todo.clone());
        if let Err(e) = self.persist(&format!("Add todo {}", id)) {
            if let Err(cleanup) = self.folders.delete_todo_folder(&todo.folder_path) {
                log::warn!("Failed to remove folder of unsaved todo: {:#}", cleanup);
            }
            return Err(e);
        }

        log::info!("Added todo {} '{}'", todo.id, todo.title);
        Ok(todo)
    }

    /// All todos, oldest first
    pub fn get_all_todos(&mut self) -> TodoResult<Vec<Todo>> {
        let mut todos = self.todos_mut()?.clone();
        todos.sort_by_key(|t| t.created_at);
        Ok(todos)
    }

    pub fn get_todo_by_id(&mut self, id: u32) -> TodoResult<Option<Todo>> {
        Ok(self.todos_mut()?.iter().find(|t| t.id == id).cloned())
    }

    pub fn get_max_todo_id(&mut self) -> TodoResult<u32> {
        Ok(self.todos_mut()?.iter().map(|t| t.id).max().unwrap_or(0))
    }

    /// Forget loaded todos; the next call reads the data file again
    pub fn clear_cache(&mut self) {
        self.cache = None;
    }

    /// Write the current todos even if nothing changed
    pub fn force_save(&mut self) -> TodoResult<()> {
        self.todos_mut()?;
        self.persist("Save todos")
    }

    /// Write the current todos only if they differ from the file
    pub fn flush(&mut self) -> TodoResult<bool> {
        match &self.cache {
            Some(todos) => self.storage.save_if_changed(todos).map_err(TodoError::storage),
            None => Ok(false),
        }
    }

    /// Push pending commits when git sync is enabled
    pub fn shutdown(&self) -> anyhow::Result<()> {
        self.storage.shutdown()
    }

    pub fn update_todo(&mut self, id: u32, title: &str) -> TodoResult<Todo> {
        let title = validate_title(title, self.max_title_length)?;
        let todo = self.todo_mut(id)?;
        todo.title = title;
        let updated = todo.clone();
        self.persist(&format!("Rename todo {}", id))?;
        Ok(updated)
    }

    /// Remove a todo, optionally deleting its folder
    ///
    /// A folder that cannot be deleted is logged and reported in the result;
    /// the todo is removed regardless.
    pub fn delete_todo(&mut self, id: u32, delete_folder: bool) -> TodoResult<DeletedTodo> {
        let todos = self.todos_mut()?;
        let index = todos
            .iter()
            .position(|t| t.id == id)
            .ok_or(TodoError::TodoNotFound(id))?;
        let todo = todos.remove(index);
        self.persist(&format!("Delete todo {}", id))?;

        let mut folder_deleted = false;
        if delete_folder && !todo.folder_path.is_empty() {
            match self.folders.delete_todo_folder(&todo.folder_path) {
                Ok(()) => folder_deleted = true,
                Err(e) => log::warn!("Failed to delete folder {}: {:#}", todo.folder_path, e),
            }
        }

        log::info!("Deleted todo {} '{}'", todo.id, todo.title);
        Ok(DeletedTodo {
            todo,
            folder_deleted,
        })
    }

    /// Complete or reopen a todo together with all of its subtasks
    pub fn set_todo_completed(&mut self, id: u32, completed: bool) -> TodoResult<Todo> {
        let now = self.now();
        let todo = self.todo_mut(id)?;
        if completed {
            todo.mark_completed(now);
        } else {
            todo.mark_uncompleted();
        }
        let updated = todo.clone();
        let verb = if completed { "Complete" } else { "Reopen" };
        self.persist(&format!("{} todo {}", verb, id))?;
        Ok(updated)
    }

    /// Set or clear a todo's due date
    pub fn set_todo_due_date(&mut self, id: u32, due: Option<NaiveDateTime>) -> TodoResult<Todo> {
        let now = self.now();
        if let Some(due) = due {
            dates::validate_due_date(due, None, now)?;
        }
        let todo = self.todo_mut(id)?;
        todo.due_date = due;
        let updated = todo.clone();
        self.persist(&format!("Set due date of todo {}", id))?;
        Ok(updated)
    }

    pub fn get_overdue_todos(&mut self) -> TodoResult<Vec<Todo>> {
        let now = self.now();
        Ok(overdue_todos(self.todos_mut()?, now))
    }

    pub fn get_due_today_todos(&mut self) -> TodoResult<Vec<Todo>> {
        let now = self.now();
        Ok(due_today_todos(self.todos_mut()?, now))
    }

    pub fn get_urgent_todos(&mut self, hours: i64) -> TodoResult<Vec<Todo>> {
        let now = self.now();
        Ok(urgent_todos(self.todos_mut()?, now, hours))
    }

    pub fn get_todos_by_due_date(
        &mut self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> TodoResult<Vec<Todo>> {
        Ok(todos_by_due_date(self.todos_mut()?, start, end))
    }

    pub fn get_todos_with_overdue_subtasks(&mut self) -> TodoResult<Vec<Todo>> {
        let now = self.now();
        Ok(todos_with_overdue_subtasks(self.todos_mut()?, now))
    }

    pub fn filter_todos(&mut self, search: &str, show_completed: bool) -> TodoResult<Vec<Todo>> {
        let todos = self.get_all_todos()?;
        Ok(filter_todos(&todos, search, show_completed))
    }

    pub fn get_filtered_and_sorted_todos(&mut self, query: &ListQuery) -> TodoResult<Vec<Todo>> {
        let now = self.now();
        let todos = self.get_all_todos()?;
        Ok(query_todos(&todos, query, now))
    }

    /// Notification summary over the current todos
    pub fn notifications(&mut self) -> TodoResult<NotificationService> {
        let now = self.now();
        Ok(NotificationService::new(self.get_all_todos()?, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use tempfile::TempDir;

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn service_in(dir: &TempDir) -> TodoService {
        let storage = Storage::new(dir.path().join("todos.json"), 2, false);
        let folders = FolderService::new(dir.path().join("folders"));
        TodoService::new(storage, folders).with_clock(fixed_now)
    }

    #[test]
    fn test_add_creates_folder_and_persists() {
        let dir = TempDir::new().unwrap();
        let mut service = service_in(&dir);

        let todo = service.add_todo("  Write report ").unwrap();
        assert_eq!(todo.id, 1);
        assert_eq!(todo.title, "Write report");
        assert!(std::path::Path::new(&todo.folder_path).is_dir());

        service.clear_cache();
        assert_eq!(service.get_all_todos().unwrap(), vec![todo]);
    }

    #[test]
    fn test_ids_increase() {
        let dir = TempDir::new().unwrap();
        let mut service = service_in(&dir);
        service.add_todo("a").unwrap();
        service.add_todo("b").unwrap();
        assert_eq!(service.add_todo("c").unwrap().id, 3);
        assert_eq!(service.get_max_todo_id().unwrap(), 3);
    }

    #[test]
    fn test_invalid_title_is_rejected_without_side_effects() {
        let dir = TempDir::new().unwrap();
        let mut service = service_in(&dir);
        assert!(matches!(service.add_todo("   "), Err(TodoError::EmptyTitle)));
        assert!(service.get_all_todos().unwrap().is_empty());
        assert!(!dir.path().join("folders").exists());
    }

    #[test]
    fn test_update_and_delete_missing() {
        let dir = TempDir::new().unwrap();
        let mut service = service_in(&dir);
        assert!(matches!(service.update_todo(9, "x"), Err(TodoError::TodoNotFound(9))));
        assert!(matches!(service.delete_todo(9, true), Err(TodoError::TodoNotFound(9))));
    }

    #[test]
    fn test_delete_with_folder() {
        let dir = TempDir::new().unwrap();
        let mut service = service_in(&dir);
        let todo = service.add_todo("temp").unwrap();

        let deleted = service.delete_todo(todo.id, true).unwrap();
        assert!(deleted.folder_deleted);
        assert!(!std::path::Path::new(&todo.folder_path).exists());
        assert!(service.get_todo_by_id(todo.id).unwrap().is_none());
    }

    #[test]
    fn test_due_date_validation() {
        let dir = TempDir::new().unwrap();
        let mut service = service_in(&dir);
        let todo = service.add_todo("dated").unwrap();

        let past = fixed_now() - Duration::days(2);
        assert!(matches!(
            service.set_todo_due_date(todo.id, Some(past)),
            Err(TodoError::InvalidDueDate(_))
        ));

        let due = fixed_now() + Duration::days(1);
        assert_eq!(service.set_todo_due_date(todo.id, Some(due)).unwrap().due_date, Some(due));
        assert_eq!(service.set_todo_due_date(todo.id, None).unwrap().due_date, None);
    }

    #[test]
    fn test_parse_due_input_uses_clock() {
        let dir = TempDir::new().unwrap();
        let service = service_in(&dir);
        assert_eq!(
            service.parse_due_input("tomorrow").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 16)
                .unwrap()
                .and_hms_opt(18, 0, 0)
                .unwrap()
        );
        assert!(matches!(
            service.parse_due_input("whenever"),
            Err(TodoError::UnparsableDate(_))
        ));
    }
}
