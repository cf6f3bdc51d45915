//! Todo MCP Library
//!
//! A to-do manager where every todo owns a folder on disk, can carry a due date
//! and can be broken down into subtasks. The same service backs three front
//! ends: an MCP server over stdio, a numbered console menu and one-shot CLI
//! subcommands.
//!
//! # Architecture
//!
//! - **Front ends**: `TodoServerHandler` (MCP), `menu::Menu` (console), the binary's subcommands
//! - **Service Layer**: `service::TodoService` - todo and subtask operations, due date queries
//! - **Domain Layer**: `todo`, `dates`, `notification`, `palette` - models and due date rules
//! - **Persistence Layer**: `storage` (JSON file with backups and optional Git sync) and `folders`
//!
//! # Example
//!
//! ```no_run
//! use todo_mcp::{AppConfig, TodoServerHandler};
//! use anyhow::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let handler = TodoServerHandler::new(&AppConfig::default())?;
//!     // Use handler with MCP server...
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dates;
pub mod error;
pub mod folders;
pub mod formatting;
mod git_ops;
mod handlers;
pub mod menu;
pub mod notification;
pub mod palette;
pub mod service;
pub mod storage;
pub mod todo;
pub mod validation;

use anyhow::Result;
use mcp_attr::Result as McpResult;
use mcp_attr::server::{McpServer, mcp_server};
use std::sync::Mutex;

pub use config::AppConfig;
pub use dates::UrgencyLevel;
pub use error::{TodoError, TodoResult};
pub use folders::FolderService;
pub use notification::NotificationService;
pub use service::{DueFilter, ListQuery, SortKey, SortOrder, TodoService};
pub use storage::Storage;
pub use todo::{SubTask, Todo};

/// MCP Server handler for todo management
///
/// Wraps a `TodoService`; every change is written to the data file right away
/// and, with Git sync enabled, committed.
pub struct TodoServerHandler {
    pub(crate) service: Mutex<TodoService>,
}

impl TodoServerHandler {
    /// Create a handler from configuration, loading the data file up front so
    /// a broken file is reported before serving
    pub fn new(config: &AppConfig) -> Result<Self> {
        let mut service = TodoService::from_config(config);
        service.get_all_todos()?;
        Ok(Self::from_service(service))
    }

    pub fn from_service(service: TodoService) -> Self {
        Self {
            service: Mutex::new(service),
        }
    }
}

impl Drop for TodoServerHandler {
    fn drop(&mut self) {
        let service = match self.service.get_mut() {
            Ok(service) => service,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = service.flush() {
            log::warn!("Final save failed: {}", e);
        }
        // Push to git on shutdown if sync is enabled
        if let Err(e) = service.shutdown() {
            eprintln!("Warning: Shutdown git sync failed: {}", e);
        }
    }
}

/// To-do manager with a folder per todo, due dates and subtasks.
///
/// Todos are identified by numeric IDs (1, 2, 3...). Subtask IDs are unique
/// across all todos. A todo with subtasks is completed exactly when all of its
/// subtasks are.
///
/// Due dates accept free-form text: "today", "tomorrow", "day after tomorrow",
/// "2025-03-15", "2025-03-15 09:30", "12/31", "12/31 18:00", "15d" (the 15th
/// of this or next month) or "15d 14h". A date without a time gets the
/// configured default hour.
///
/// Urgency levels: overdue, urgent (within 24 hours), warning (within 3 days),
/// normal (later or no due date).
#[mcp_server]
impl McpServer for TodoServerHandler {
    /// **Add**: Create a todo with its own folder.
    /// **Tip**: Give `due` to set a deadline right away.
    #[tool]
    async fn add_todo(
        &self,
        /// Title: 1-100 characters
        title: String,
        /// Due date: free-form, e.g. "tomorrow", "2025-03-15 09:30", "12/31" (optional)
        due: Option<String>,
    ) -> McpResult<String> {
        self.handle_add_todo(title, due).await
    }

    /// **Review**: List todos with urgency, progress and due dates.
    /// **Use**: filter="overdue" for what slipped; sort="due_date" to plan.
    #[allow(clippy::too_many_arguments)]
    #[tool]
    async fn list_todos(
        &self,
        /// Due filter: all/due_today/overdue/this_week (optional, default all)
        filter: Option<String>,
        /// Search text matched against todo and subtask titles, case-insensitive (optional)
        search: Option<String>,
        /// Include completed todos (optional, default true)
        show_completed: Option<bool>,
        /// Sort key: created_at/title/progress/due_date (optional, default created_at)
        sort: Option<String>,
        /// Sort order: asc/desc (optional, progress defaults to desc, others to asc)
        order: Option<String>,
        /// Output format: text/json (optional, default text)
        format: Option<String>,
    ) -> McpResult<String> {
        self.handle_list_todos(filter, search, show_completed, sort, order, format)
            .await
    }

    /// **Show**: Full details of one todo including folder, subtasks and due dates.
    #[tool]
    async fn show_todo(
        &self,
        /// Todo ID
        id: u32,
    ) -> McpResult<String> {
        self.handle_show_todo(id).await
    }

    /// **Rename**: Change a todo's title. The folder keeps its name.
    #[tool]
    async fn update_todo(
        &self,
        /// Todo ID
        id: u32,
        /// New title: 1-100 characters
        title: String,
    ) -> McpResult<String> {
        self.handle_update_todo(id, title).await
    }

    /// **Delete**: Remove a todo and its subtasks.
    /// **Caution**: delete_folder=true also deletes the folder and every file in it.
    #[tool]
    async fn delete_todo(
        &self,
        /// Todo ID
        id: u32,
        /// Also delete the todo's folder (optional, default false)
        delete_folder: Option<bool>,
    ) -> McpResult<String> {
        self.handle_delete_todo(id, delete_folder).await
    }

    /// **Complete**: Mark a todo and all its subtasks done, or reopen it with completed=false.
    #[tool]
    async fn complete_todo(
        &self,
        /// Todo ID
        id: u32,
        /// true to complete, false to reopen (optional, default true)
        completed: Option<bool>,
    ) -> McpResult<String> {
        self.handle_complete_todo(id, completed).await
    }

    /// **Break down**: Add a subtask to a todo. Reopens the todo if it was completed.
    #[tool]
    async fn add_subtask(
        &self,
        /// Parent todo ID
        todo_id: u32,
        /// Title: 1-100 characters
        title: String,
    ) -> McpResult<String> {
        self.handle_add_subtask(todo_id, title).await
    }

    /// **Rename subtask**: Change a subtask's title.
    #[tool]
    async fn update_subtask(
        &self,
        /// Parent todo ID
        todo_id: u32,
        /// Subtask ID
        subtask_id: u32,
        /// New title: 1-100 characters
        title: String,
    ) -> McpResult<String> {
        self.handle_update_subtask(todo_id, subtask_id, title).await
    }

    /// **Delete subtask**: Remove a subtask from its todo.
    #[tool]
    async fn delete_subtask(
        &self,
        /// Parent todo ID
        todo_id: u32,
        /// Subtask ID
        subtask_id: u32,
    ) -> McpResult<String> {
        self.handle_delete_subtask(todo_id, subtask_id).await
    }

    /// **Progress**: Toggle a subtask between done and not done.
    /// The todo completes when all subtasks are done and reopens otherwise.
    #[tool]
    async fn toggle_subtask(
        &self,
        /// Parent todo ID
        todo_id: u32,
        /// Subtask ID
        subtask_id: u32,
    ) -> McpResult<String> {
        self.handle_toggle_subtask(todo_id, subtask_id).await
    }

    /// **Schedule**: Set or clear the due date of a todo or of one of its subtasks.
    /// **Rules**: at most 1 hour in the past, at most 10 years ahead; a subtask may not be due after its todo.
    #[tool]
    async fn set_due_date(
        &self,
        /// Todo ID
        todo_id: u32,
        /// Subtask ID, to date a subtask instead of the todo (optional)
        subtask_id: Option<u32>,
        /// Due date: free-form; empty or omitted clears it (optional)
        due: Option<String>,
    ) -> McpResult<String> {
        self.handle_set_due_date(todo_id, subtask_id, due).await
    }

    /// **Plan**: List todos due between two dates (inclusive, at most one year apart).
    #[tool]
    async fn due_between(
        &self,
        /// Range start: free-form date
        start: String,
        /// Range end: free-form date
        end: String,
    ) -> McpResult<String> {
        self.handle_due_between(start, end).await
    }

    /// **Status**: Overdue, due today and urgent counts with a per-day outlook.
    /// **Workflow**: Check at the start of a session.
    #[tool]
    async fn status_summary(
        &self,
        /// Days to look ahead in the per-day breakdown (optional, default 7, at most 365)
        days: Option<u32>,
    ) -> McpResult<String> {
        self.handle_status_summary(days).await
    }
}
