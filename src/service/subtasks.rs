use super::TodoService;
use crate::error::{TodoError, TodoResult};
use crate::todo::{MAX_ID, SubTask, Todo, following_id};
use crate::validation::validate_title;
use chrono::NaiveDateTime;

fn subtask_mut(todo: &mut Todo, subtask_id: u32) -> TodoResult<&mut SubTask> {
    let todo_id = todo.id;
    todo.find_subtask_mut(subtask_id)
        .ok_or(TodoError::SubtaskNotFound {
            todo_id,
            subtask_id,
        })
}

impl TodoService {
    /// Add a subtask; a completed todo is reopened since it has new work
    pub fn add_subtask(&mut self, todo_id: u32, title: &str) -> TodoResult<SubTask> {
        let title = validate_title(title, self.max_title_length)?;
        let now = self.now();

        let max_id = self
            .todos_mut()?
            .iter()
            .flat_map(|t| t.subtasks.iter().map(|s| s.id))
            .max()
            .unwrap_or(0);
        let next_id = self.storage.next_subtask_id().map_err(TodoError::storage)?;
        let id = following_id(max_id)
            .map(|after_max| next_id.max(after_max))
            .filter(|&id| id <= MAX_ID)
            .ok_or(TodoError::IdsExhausted("subtask"))?;

        let todo = self.todo_mut(todo_id)?;
        let subtask = SubTask::new(id, todo_id, title, now);
        todo.add_subtask(subtask.clone());
        todo.sync_completion(now);

        self.persist(&format!("Add subtask {} to todo {}", id, todo_id))?;
        Ok(subtask)
    }

    pub fn update_subtask(
        &mut self,
        todo_id: u32,
        subtask_id: u32,
        title: &str,
    ) -> TodoResult<SubTask> {
        let title = validate_title(title, self.max_title_length)?;
        let subtask = subtask_mut(self.todo_mut(todo_id)?, subtask_id)?;
        subtask.title = title;
        let updated = subtask.clone();
        self.persist(&format!("Rename subtask {} of todo {}", subtask_id, todo_id))?;
        Ok(updated)
    }

    pub fn delete_subtask(&mut self, todo_id: u32, subtask_id: u32) -> TodoResult<SubTask> {
        let now = self.now();
        let todo = self.todo_mut(todo_id)?;
        let removed = todo
            .remove_subtask(subtask_id)
            .ok_or(TodoError::SubtaskNotFound {
                todo_id,
                subtask_id,
            })?;
        if !todo.subtasks.is_empty() {
            todo.sync_completion(now);
        }
        self.persist(&format!("Delete subtask {} of todo {}", subtask_id, todo_id))?;
        Ok(removed)
    }

    /// Toggle a subtask and update the todo's completion to match
    ///
    /// Returns the whole todo so callers can show its new progress.
    pub fn toggle_subtask_completion(&mut self, todo_id: u32, subtask_id: u32) -> TodoResult<Todo> {
        let now = self.now();
        let todo = self.todo_mut(todo_id)?;
        subtask_mut(todo, subtask_id)?.toggle_completion(now);
        todo.sync_completion(now);
        let updated = todo.clone();
        self.persist(&format!("Toggle subtask {} of todo {}", subtask_id, todo_id))?;
        Ok(updated)
    }

    pub fn get_subtasks(&mut self, todo_id: u32) -> TodoResult<Vec<SubTask>> {
        Ok(self.todo_mut(todo_id)?.subtasks.clone())
    }

    /// Check a subtask due date against the todo's own due date
    pub fn validate_subtask_due_date(&mut self, todo_id: u32, due: NaiveDateTime) -> TodoResult<()> {
        let now = self.now();
        let todo = self.todo_mut(todo_id)?;
        todo.validate_subtask_due_date(due, now)?;
        Ok(())
    }

    pub fn set_subtask_due_date(
        &mut self,
        todo_id: u32,
        subtask_id: u32,
        due: Option<NaiveDateTime>,
    ) -> TodoResult<SubTask> {
        let now = self.now();
        let todo = self.todo_mut(todo_id)?;
        if let Some(due) = due {
            todo.validate_subtask_due_date(due, now)?;
        }
        let subtask = subtask_mut(todo, subtask_id)?;
        subtask.due_date = due;
        let updated = subtask.clone();
        self.persist(&format!("Set due date of subtask {} of todo {}", subtask_id, todo_id))?;
        Ok(updated)
    }
}
