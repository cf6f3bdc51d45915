use super::item::Todo;
use serde::Serialize;
use std::collections::HashSet;

/// The persisted document: all todos plus the next free ids
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodoFile {
    pub todos: Vec<Todo>,
    pub next_id: u32,
    pub next_subtask_id: u32,
}

/// What happened while reading a stored document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Entries that could not be parsed and were dropped
    pub skipped: usize,
    /// Fields introduced after the file was written were filled with defaults
    pub migrated: bool,
    /// Duplicate or inconsistent ids were fixed
    pub repaired: bool,
}

impl LoadReport {
    /// The document on disk differs from what was loaded and should be rewritten
    pub fn needs_save(&self) -> bool {
        self.migrated || self.repaired
    }
}

/// Largest id a todo or subtask may carry; `u32::MAX` stays free so the
/// next id after any stored id can always be represented.
pub const MAX_ID: u32 = u32::MAX - 1;

/// The id after `id`, or `None` once the id space is used up
pub(crate) fn following_id(id: u32) -> Option<u32> {
    id.checked_add(1).filter(|&next| next <= MAX_ID)
}

pub(crate) fn max_todo_id(todos: &[Todo]) -> u32 {
    todos.iter().map(|t| t.id).max().unwrap_or(0)
}

pub(crate) fn max_subtask_id(todos: &[Todo]) -> u32 {
    todos
        .iter()
        .flat_map(|t| t.subtasks.iter().map(|s| s.id))
        .max()
        .unwrap_or(0)
}

impl TodoFile {
    /// Wrap `todos`, deriving the next ids from the largest ids in use
    pub fn from_todos(todos: Vec<Todo>) -> Self {
        let next_id = max_todo_id(&todos).saturating_add(1);
        let next_subtask_id = max_subtask_id(&todos).saturating_add(1);
        Self {
            todos,
            next_id,
            next_subtask_id,
        }
    }

    pub fn empty() -> Self {
        Self::from_todos(Vec::new())
    }

    /// Fix id conflicts in place, returning whether anything changed
    ///
    /// - A todo id seen before is replaced with a fresh id past the maximum.
    /// - A subtask whose `todo_id` differs from its parent is pointed at the parent.
    /// - A subtask id seen before (in any todo) is replaced with a fresh id.
    ///
    /// A duplicate that cannot get a fresh id because the id space is used up
    /// is dropped.
    pub fn repair(&mut self) -> bool {
        let mut repaired = false;

        let mut fresh_todo_id = following_id(max_todo_id(&self.todos));
        let mut seen_todos = HashSet::new();
        self.todos.retain_mut(|todo| {
            if seen_todos.insert(todo.id) {
                return true;
            }
            repaired = true;
            let Some(id) = fresh_todo_id else {
                log::warn!(
                    "Duplicate todo id {} ('{}') dropped, no ids left",
                    todo.id,
                    todo.title
                );
                return false;
            };
            log::warn!(
                "Duplicate todo id {} ('{}'), reassigned to {}",
                todo.id,
                todo.title,
                id
            );
            todo.id = id;
            seen_todos.insert(id);
            fresh_todo_id = following_id(id);
            true
        });

        let mut fresh_subtask_id = following_id(max_subtask_id(&self.todos));
        let mut seen_subtasks = HashSet::new();
        for todo in &mut self.todos {
            let parent = todo.id;
            todo.subtasks.retain_mut(|subtask| {
                if subtask.todo_id != parent {
                    log::warn!(
                        "Subtask {} pointed at todo {} but belongs to todo {}",
                        subtask.id,
                        subtask.todo_id,
                        parent
                    );
                    subtask.todo_id = parent;
                    repaired = true;
                }
                if seen_subtasks.insert(subtask.id) {
                    return true;
                }
                repaired = true;
                let Some(id) = fresh_subtask_id else {
                    log::warn!("Duplicate subtask id {} dropped, no ids left", subtask.id);
                    return false;
                };
                log::warn!("Duplicate subtask id {}, reassigned to {}", subtask.id, id);
                subtask.id = id;
                seen_subtasks.insert(id);
                fresh_subtask_id = following_id(id);
                true
            });
        }

        self.next_id = self.next_id.max(max_todo_id(&self.todos).saturating_add(1));
        self.next_subtask_id = self
            .next_subtask_id
            .max(max_subtask_id(&self.todos).saturating_add(1));

        repaired
    }
}
