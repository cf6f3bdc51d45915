//! MCP tool handlers for the todo server
//!
//! Each `#[tool]` method of `TodoServerHandler` delegates to a `handle_*` method
//! defined in one of these files.

pub mod due_dates;
pub mod subtasks;
pub mod summary;
pub mod todos;

use crate::error::TodoError;
use mcp_attr::Result as McpResult;
use std::str::FromStr;

/// Turn a domain error into an MCP error the client gets to see
pub(crate) fn tool_error(err: TodoError) -> mcp_attr::Error {
    let code = match err {
        TodoError::Storage(_) | TodoError::Folder(_) => mcp_attr::ErrorCode::INTERNAL_ERROR,
        _ => mcp_attr::ErrorCode::INVALID_PARAMS,
    };
    mcp_attr::Error::new(code).with_message(err.to_string(), true)
}

/// Parse an optional tool argument; empty strings count as absent
pub(crate) fn parse_option<T>(value: Option<String>) -> McpResult<Option<T>>
where
    T: FromStr<Err = String>,
{
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text.parse::<T>().map(Some).map_err(|message| {
            mcp_attr::Error::new(mcp_attr::ErrorCode::INVALID_PARAMS).with_message(message, true)
        }),
    }
}
