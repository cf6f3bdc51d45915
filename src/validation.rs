//! Input validation helpers
//!
//! Title and id checks shared by the service, the console menu and the MCP
//! handlers, plus the folder name sanitiser used for per-todo folders.

use crate::error::{TodoError, TodoResult};

/// Default maximum title length in characters
pub const DEFAULT_MAX_TITLE_LENGTH: usize = 100;

/// Longest sanitised title used in a folder name
const MAX_FOLDER_TITLE_CHARS: usize = 30;

/// Validate a todo or subtask title
///
/// # Arguments
/// * `title` - Title as typed; surrounding whitespace is ignored
/// * `max_len` - Maximum length in characters after trimming
///
/// # Returns
/// The trimmed title, or `EmptyTitle` / `TitleTooLong`
pub fn validate_title(title: &str, max_len: usize) -> TodoResult<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TodoError::EmptyTitle);
    }

    let len = trimmed.chars().count();
    if len > max_len {
        return Err(TodoError::TitleTooLong { len, max: max_len });
    }

    Ok(trimmed.to_string())
}

/// Parse a todo id typed by a user
///
/// Returns `None` unless the input is a positive integer no larger than `max_id`.
pub fn validate_todo_id(input: &str, max_id: u32) -> Option<u32> {
    let id: u32 = input.trim().parse().ok()?;
    if id > 0 && id <= max_id { Some(id) } else { None }
}

/// Turn a title into a string that is safe as a directory name
///
/// Each character other than a letter, digit, `_`, `-` or whitespace becomes
/// `_`; runs of `-` and whitespace collapse into a single `_`. Underscores
/// already in the title are kept as they are. The result is capped at 30
/// characters and falls back to `untitled` when nothing usable is left.
pub fn sanitize_folder_name(title: &str) -> String {
    let mut sanitized = String::with_capacity(title.len());
    let mut in_separator = false;

    for c in title.chars() {
        if c == '-' || c.is_whitespace() {
            if !in_separator {
                sanitized.push('_');
            }
            in_separator = true;
            continue;
        }
        in_separator = false;
        if c.is_alphanumeric() || c == '_' {
            sanitized.push(c);
        } else {
            sanitized.push('_');
        }
    }

    let trimmed: String = sanitized
        .trim_matches('_')
        .chars()
        .take(MAX_FOLDER_TITLE_CHARS)
        .collect();

    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_title_trims() {
        assert_eq!(validate_title("  Buy milk  ", 100).unwrap(), "Buy milk");
    }

    #[test]
    fn test_validate_title_rejects_blank() {
        assert!(matches!(validate_title("   ", 100), Err(TodoError::EmptyTitle)));
        assert!(matches!(validate_title("", 100), Err(TodoError::EmptyTitle)));
    }

    #[test]
    fn test_validate_title_length_counts_characters() {
        let exactly = "가".repeat(100);
        assert!(validate_title(&exactly, 100).is_ok());

        let too_long = "a".repeat(101);
        match validate_title(&too_long, 100) {
            Err(TodoError::TitleTooLong { len, max }) => {
                assert_eq!(len, 101);
                assert_eq!(max, 100);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_validate_todo_id() {
        assert_eq!(validate_todo_id(" 3 ", 5), Some(3));
        assert_eq!(validate_todo_id("5", 5), Some(5));
        assert_eq!(validate_todo_id("6", 5), None);
        assert_eq!(validate_todo_id("0", 5), None);
        assert_eq!(validate_todo_id("-1", 5), None);
        assert_eq!(validate_todo_id("abc", 5), None);
        assert_eq!(validate_todo_id("", 5), None);
    }

    #[test]
    fn test_sanitize_folder_name() {
        assert_eq!(sanitize_folder_name("Buy milk"), "Buy_milk");
        assert_eq!(sanitize_folder_name("a/b:c*d?"), "a_b_c_d");
        assert_eq!(sanitize_folder_name("  spaced -- out__here "), "spaced_out__here");
        assert_eq!(sanitize_folder_name("Plan: trip / 2025"), "Plan__trip___2025");
        assert_eq!(sanitize_folder_name("보고서 작성"), "보고서_작성");
    }

    #[test]
    fn test_sanitize_folder_name_fallback_and_cap() {
        assert_eq!(sanitize_folder_name(""), "untitled");
        assert_eq!(sanitize_folder_name("???"), "untitled");

        let long = "x".repeat(50);
        assert_eq!(sanitize_folder_name(&long).chars().count(), 30);
    }
}
