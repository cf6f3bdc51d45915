//! Todo handlers for the todo MCP server

use super::{parse_option, tool_error};
use crate::TodoServerHandler;
use crate::formatting::{format_todo_detail, format_todo_tree, todos_to_json};
use crate::service::{DueFilter, ListQuery, SortKey, SortOrder};
use mcp_attr::{Result as McpResult, bail_public};

impl TodoServerHandler {
    /// Creates a todo with its folder and an optional due date in free-form text.
    pub async fn handle_add_todo(&self, title: String, due: Option<String>) -> McpResult<String> {
        let mut service = self.service.lock().unwrap();

        let due_date = match due.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Some(service.parse_due_input(text).map_err(tool_error)?),
            _ => None,
        };

        let todo = service
            .add_todo_with_due_date(&title, due_date)
            .map_err(tool_error)?;
        let now = service.now();
        drop(service);

        Ok(format!(
            "Todo created with ID: {}\n{}",
            todo.id,
            format_todo_detail(&todo, now)
        ))
    }

    /// Lists todos with optional due filter, search, sort and JSON output.
    #[allow(clippy::too_many_arguments)]
    pub async fn handle_list_todos(
        &self,
        filter: Option<String>,
        search: Option<String>,
        show_completed: Option<bool>,
        sort: Option<String>,
        order: Option<String>,
        format: Option<String>,
    ) -> McpResult<String> {
        let query = ListQuery {
            filter: parse_option::<DueFilter>(filter)?.unwrap_or_default(),
            search: search.unwrap_or_default(),
            show_completed: show_completed.unwrap_or(true),
            sort: parse_option::<SortKey>(sort)?.unwrap_or_default(),
            order: parse_option::<SortOrder>(order)?,
        };

        let mut service = self.service.lock().unwrap();
        let todos = service
            .get_filtered_and_sorted_todos(&query)
            .map_err(tool_error)?;
        let now = service.now();
        drop(service);

        match format.as_deref().map(str::trim) {
            None | Some("") | Some("text") => Ok(format_todo_tree(&todos, now)),
            Some("json") => match todos_to_json(&todos, now) {
                Ok(json) => Ok(json),
                Err(e) => bail_public!(_, "{:#}", e),
            },
            Some(other) => {
                bail_public!(_, "Invalid format '{}'. Valid options are: text, json", other)
            }
        }
    }

    /// Shows a single todo with all details.
    pub async fn handle_show_todo(&self, id: u32) -> McpResult<String> {
        let mut service = self.service.lock().unwrap();
        let todo = service.get_todo_by_id(id).map_err(tool_error)?;
        let now = service.now();
        drop(service);

        match todo {
            Some(todo) => Ok(format_todo_detail(&todo, now)),
            None => bail_public!(
                _,
                "Todo {} not found. Use list_todos() to see available todos.",
                id
            ),
        }
    }

    pub async fn handle_update_todo(&self, id: u32, title: String) -> McpResult<String> {
        let mut service = self.service.lock().unwrap();
        let todo = service.update_todo(id, &title).map_err(tool_error)?;
        drop(service);

        Ok(format!("Todo {} renamed to '{}'", todo.id, todo.title))
    }

    /// Deletes a todo; its folder is kept unless `delete_folder` is true.
    pub async fn handle_delete_todo(&self, id: u32, delete_folder: Option<bool>) -> McpResult<String> {
        let delete_folder = delete_folder.unwrap_or(false);
        let mut service = self.service.lock().unwrap();
        let deleted = service.delete_todo(id, delete_folder).map_err(tool_error)?;
        drop(service);

        let mut message = format!("Deleted todo {} '{}'", deleted.todo.id, deleted.todo.title);
        if delete_folder {
            if deleted.folder_deleted {
                message.push_str(" and its folder");
            } else {
                message.push_str(&format!(
                    "\nWarning: folder {} could not be deleted",
                    deleted.todo.folder_path
                ));
            }
        }
        Ok(message)
    }

    /// Marks a todo (and all its subtasks) completed, or reopens it.
    pub async fn handle_complete_todo(&self, id: u32, completed: Option<bool>) -> McpResult<String> {
        let completed = completed.unwrap_or(true);
        let mut service = self.service.lock().unwrap();
        let todo = service.set_todo_completed(id, completed).map_err(tool_error)?;
        drop(service);

        let state = if completed { "completed" } else { "reopened" };
        Ok(format!("Todo {} '{}' {}", todo.id, todo.title, state))
    }
}
