//! Subtask handlers for the todo MCP server

use super::tool_error;
use crate::TodoServerHandler;
use mcp_attr::Result as McpResult;

impl TodoServerHandler {
    pub async fn handle_add_subtask(&self, todo_id: u32, title: String) -> McpResult<String> {
        let mut service = self.service.lock().unwrap();
        let subtask = service.add_subtask(todo_id, &title).map_err(tool_error)?;
        drop(service);

        Ok(format!(
            "Subtask created with ID: {} (todo {})",
            subtask.id, subtask.todo_id
        ))
    }

    pub async fn handle_update_subtask(
        &self,
        todo_id: u32,
        subtask_id: u32,
        title: String,
    ) -> McpResult<String> {
        let mut service = self.service.lock().unwrap();
        let subtask = service
            .update_subtask(todo_id, subtask_id, &title)
            .map_err(tool_error)?;
        drop(service);

        Ok(format!("Subtask {} renamed to '{}'", subtask.id, subtask.title))
    }

    pub async fn handle_delete_subtask(&self, todo_id: u32, subtask_id: u32) -> McpResult<String> {
        let mut service = self.service.lock().unwrap();
        let subtask = service
            .delete_subtask(todo_id, subtask_id)
            .map_err(tool_error)?;
        drop(service);

        Ok(format!(
            "Deleted subtask {} '{}' from todo {}",
            subtask.id, subtask.title, todo_id
        ))
    }

    /// Toggles a subtask; the todo completes when its last open subtask is done.
    pub async fn handle_toggle_subtask(&self, todo_id: u32, subtask_id: u32) -> McpResult<String> {
        let mut service = self.service.lock().unwrap();
        let todo = service
            .toggle_subtask_completion(todo_id, subtask_id)
            .map_err(tool_error)?;
        drop(service);

        let done = todo
            .find_subtask(subtask_id)
            .is_some_and(|s| s.is_completed);
        Ok(format!(
            "Subtask {} marked {}. Todo {} progress: {:.0}%{}",
            subtask_id,
            if done { "done" } else { "not done" },
            todo.id,
            todo.completion_rate() * 100.0,
            if todo.is_completed() { " (completed)" } else { "" }
        ))
    }
}
