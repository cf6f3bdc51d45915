//! Due date handlers for the todo MCP server

use super::tool_error;
use crate::TodoServerHandler;
use crate::dates::validate_date_range;
use crate::error::TodoError;
use crate::formatting::format_todo_tree;
use mcp_attr::Result as McpResult;

impl TodoServerHandler {
    /// Sets or clears the due date of a todo, or of one of its subtasks.
    ///
    /// An empty or missing `due` clears the date.
    pub async fn handle_set_due_date(
        &self,
        todo_id: u32,
        subtask_id: Option<u32>,
        due: Option<String>,
    ) -> McpResult<String> {
        let mut service = self.service.lock().unwrap();

        let due_date = match due.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Some(service.parse_due_input(text).map_err(tool_error)?),
            _ => None,
        };

        let (target, applied) = match subtask_id {
            Some(subtask_id) => {
                let subtask = service
                    .set_subtask_due_date(todo_id, subtask_id, due_date)
                    .map_err(tool_error)?;
                (format!("subtask {}", subtask.id), subtask.due_date)
            }
            None => {
                let todo = service
                    .set_todo_due_date(todo_id, due_date)
                    .map_err(tool_error)?;
                (format!("todo {}", todo.id), todo.due_date)
            }
        };
        drop(service);

        Ok(match applied {
            Some(due) => format!("Due date of {} set to {}", target, due.format("%Y-%m-%d %H:%M")),
            None => format!("Due date of {} cleared", target),
        })
    }

    /// Lists todos due within an inclusive range given in free-form date text.
    pub async fn handle_due_between(&self, start: String, end: String) -> McpResult<String> {
        let mut service = self.service.lock().unwrap();
        let start = service.parse_due_input(&start).map_err(tool_error)?;
        let end = service.parse_due_input(&end).map_err(tool_error)?;
        validate_date_range(start, end)
            .map_err(TodoError::from)
            .map_err(tool_error)?;

        let todos = service.get_todos_by_due_date(start, end).map_err(tool_error)?;
        let now = service.now();
        drop(service);

        Ok(format_todo_tree(&todos, now))
    }
}
