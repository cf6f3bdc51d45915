//! Error types for todo operations
//!
//! Storage and git plumbing report `anyhow::Error`; everything a caller may want
//! to branch on (missing items, rejected input) is a `TodoError` variant.

use crate::dates::{DateRangeError, DueDateError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("Title must not be empty")]
    EmptyTitle,

    #[error("Title is too long ({len} characters, maximum {max})")]
    TitleTooLong { len: usize, max: usize },

    #[error("Todo {0} not found")]
    TodoNotFound(u32),

    #[error("Subtask {subtask_id} not found in todo {todo_id}")]
    SubtaskNotFound { todo_id: u32, subtask_id: u32 },

    #[error(transparent)]
    InvalidDueDate(#[from] DueDateError),

    #[error(transparent)]
    InvalidDateRange(#[from] DateRangeError),

    #[error("Could not understand date '{0}'. Try 'tomorrow', 'MM/DD', 'MM/DD HH:MM' or 'YYYY-MM-DD HH:MM'")]
    UnparsableDate(String),

    #[error("No {0} ids left")]
    IdsExhausted(&'static str),

    #[error("Folder operation failed: {0}")]
    Folder(String),

    #[error("Failed to save: {0}")]
    Storage(String),
}

impl TodoError {
    /// Wrap a storage failure, keeping the whole `anyhow` context chain in the message
    pub(crate) fn storage(err: anyhow::Error) -> Self {
        TodoError::Storage(format!("{:#}", err))
    }
}

pub type TodoResult<T> = Result<T, TodoError>;
