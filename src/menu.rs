//! Interactive console menu
//!
//! Reads one line per prompt from any `BufRead` and writes to any `Write`, so
//! the whole loop can be driven from tests. End of input always exits.

use crate::dates::quick_date_options;
use crate::error::TodoResult;
use crate::formatting::{format_status, format_todo_tree};
use crate::service::TodoService;
use crate::todo::Todo;
use crate::validation::validate_todo_id;
use anyhow::Result;
use chrono::NaiveDateTime;
use std::io::{BufRead, Write};

const MENU_ITEMS: [(&str, &str); 10] = [
    ("1", "Add todo"),
    ("2", "List todos"),
    ("3", "Rename todo"),
    ("4", "Delete todo"),
    ("5", "Open todo folder"),
    ("6", "Add subtask"),
    ("7", "Toggle subtask"),
    ("8", "Set due date"),
    ("9", "Status summary"),
    ("0", "Exit"),
];

pub struct Menu<'a, R, W> {
    service: &'a mut TodoService,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(service: &'a mut TodoService, input: R, output: W) -> Self {
        Self {
            service,
            input,
            output,
        }
    }

    /// Print `prompt` and read one trimmed line; `None` at end of input
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        Ok(self
            .ask(prompt)?
            .is_some_and(|answer| answer.eq_ignore_ascii_case("y")))
    }

    fn say(&mut self, message: impl AsRef<str>) -> Result<()> {
        writeln!(self.output, "{}", message.as_ref())?;
        Ok(())
    }

    fn print_menu(&mut self) -> Result<()> {
        let count = self.service.get_all_todos().map(|t| t.len()).unwrap_or(0);
        self.say("")?;
        self.say(format!("=== Todo manager ({} todo(s)) ===", count))?;
        for (key, label) in MENU_ITEMS {
            self.say(format!("  {}. {}", key, label))?;
        }
        Ok(())
    }

    fn print_quick_picks(&mut self) -> Result<()> {
        let picks = quick_date_options(self.service.now(), self.service.default_due_hour());
        for (n, (label, at)) in picks.iter().enumerate() {
            self.say(format!("  {}. {} ({})", n + 1, label, at.format("%m/%d %H:%M")))?;
        }
        Ok(())
    }

    /// A quick pick number or free-form date text
    fn parse_due(&self, input: &str) -> TodoResult<NaiveDateTime> {
        let picks = quick_date_options(self.service.now(), self.service.default_due_hour());
        if let Ok(n) = input.parse::<usize>()
            && let Some((_, at)) = n.checked_sub(1).and_then(|i| picks.get(i))
        {
            return Ok(*at);
        }
        self.service.parse_due_input(input)
    }

    /// Run until the user exits or input ends
    pub fn run(&mut self) -> Result<()> {
        match self.service.notifications() {
            Ok(notifications) if notifications.should_show_startup_notification() => {
                let message = notifications.startup_notification_message();
                self.say(message)?;
            }
            Ok(_) => {}
            Err(e) => log::warn!("Failed to check due dates: {}", e),
        }

        loop {
            self.print_menu()?;
            let Some(choice) = self.ask("Choose an option (0-9): ")? else {
                break;
            };

            match choice.as_str() {
                "0" => break,
                "1" => self.add_todo()?,
                "2" => self.list_todos()?,
                "3" => self.rename_todo()?,
                "4" => self.delete_todo()?,
                "5" => self.open_folder()?,
                "6" => self.add_subtask()?,
                "7" => self.toggle_subtask()?,
                "8" => self.set_due_date()?,
                "9" => self.show_status()?,
                other => {
                    self.say(format!("Invalid choice '{}'. Enter a number from 0 to 9.", other))?;
                    continue;
                }
            }

            if !self.confirm("Run another action? (y/N): ")? {
                break;
            }
        }

        if let Err(e) = self.service.flush() {
            self.say(format!("Error: {}", e))?;
        }
        self.say("Goodbye!")?;
        Ok(())
    }

    /// Ask for a todo id and look the todo up; problems are reported and yield `None`
    fn pick_todo(&mut self, purpose: &str) -> Result<Option<Todo>> {
        let todos = match self.service.get_all_todos() {
            Ok(todos) => todos,
            Err(e) => {
                self.say(format!("Error: {}", e))?;
                return Ok(None);
            }
        };
        if todos.is_empty() {
            self.say("There are no todos yet.")?;
            return Ok(None);
        }

        for todo in &todos {
            self.say(format!("  [{}] {}", todo.id, todo.title))?;
        }
        let Some(input) = self.ask(&format!("Todo id to {} (Enter to cancel): ", purpose))? else {
            return Ok(None);
        };
        if input.is_empty() {
            self.say("Cancelled.")?;
            return Ok(None);
        }

        let max_id = todos.iter().map(|t| t.id).max().unwrap_or(0);
        let found = validate_todo_id(&input, max_id)
            .and_then(|id| todos.into_iter().find(|t| t.id == id));
        if found.is_none() {
            self.say(format!("Error: No todo with id '{}'.", input))?;
        }
        Ok(found)
    }

    fn add_todo(&mut self) -> Result<()> {
        let Some(title) = self.ask("Title (Enter to cancel): ")? else {
            return Ok(());
        };
        if title.is_empty() {
            return self.say("Cancelled.");
        }

        self.print_quick_picks()?;
        let due_input = self
            .ask("Due date: pick a number or type e.g. tomorrow, 12/31 18:00 (Enter for none): ")?
            .unwrap_or_default();
        let due = if due_input.is_empty() {
            None
        } else {
            match self.parse_due(&due_input) {
                Ok(due) => Some(due),
                Err(e) => return self.say(format!("Error: {}", e)),
            }
        };

        match self.service.add_todo_with_due_date(&title, due) {
            Ok(todo) => {
                self.say(format!("Added todo [{}] {}", todo.id, todo.title))?;
                self.say(format!("Folder: {}", todo.folder_path))
            }
            Err(e) => self.say(format!("Error: {}", e)),
        }
    }

    fn list_todos(&mut self) -> Result<()> {
        let now = self.service.now();
        match self.service.get_all_todos() {
            Ok(todos) => self.say(format_todo_tree(&todos, now)),
            Err(e) => self.say(format!("Error: {}", e)),
        }
    }

    fn rename_todo(&mut self) -> Result<()> {
        let Some(todo) = self.pick_todo("rename")? else {
            return Ok(());
        };
        self.say(format!("Current title: {}", todo.title))?;
        let Some(title) = self.ask("New title (Enter to cancel): ")? else {
            return Ok(());
        };
        if title.is_empty() {
            return self.say("Cancelled.");
        }

        match self.service.update_todo(todo.id, &title) {
            Ok(updated) => self.say(format!("Renamed '{}' to '{}'", todo.title, updated.title)),
            Err(e) => self.say(format!("Error: {}", e)),
        }
    }

    fn delete_todo(&mut self) -> Result<()> {
        let Some(todo) = self.pick_todo("delete")? else {
            return Ok(());
        };
        if !self.confirm(&format!("Delete '{}'? (y/n): ", todo.title))? {
            return self.say("Cancelled.");
        }
        let delete_folder = self.confirm("Also delete its folder and files? (y/n): ")?;

        match self.service.delete_todo(todo.id, delete_folder) {
            Ok(deleted) => {
                self.say(format!("Deleted todo [{}] {}", deleted.todo.id, deleted.todo.title))?;
                if delete_folder && !deleted.folder_deleted {
                    self.say(format!(
                        "Warning: Could not delete folder {}",
                        deleted.todo.folder_path
                    ))?;
                }
                Ok(())
            }
            Err(e) => self.say(format!("Error: {}", e)),
        }
    }

    fn open_folder(&mut self) -> Result<()> {
        let Some(todo) = self.pick_todo("open")? else {
            return Ok(());
        };
        match self.service.folders().open_todo_folder(&todo.folder_path) {
            Ok(()) => self.say(format!("Opened {}", todo.folder_path)),
            Err(e) => self.say(format!("Error: {:#}", e)),
        }
    }

    fn add_subtask(&mut self) -> Result<()> {
        let Some(todo) = self.pick_todo("add a subtask to")? else {
            return Ok(());
        };
        let Some(title) = self.ask("Subtask title (Enter to cancel): ")? else {
            return Ok(());
        };
        if title.is_empty() {
            return self.say("Cancelled.");
        }

        match self.service.add_subtask(todo.id, &title) {
            Ok(subtask) => self.say(format!(
                "Added subtask #{} '{}' to [{}] {}",
                subtask.id, subtask.title, todo.id, todo.title
            )),
            Err(e) => self.say(format!("Error: {}", e)),
        }
    }

    fn toggle_subtask(&mut self) -> Result<()> {
        let Some(todo) = self.pick_todo("toggle a subtask of")? else {
            return Ok(());
        };
        if todo.subtasks.is_empty() {
            return self.say(format!("[{}] {} has no subtasks.", todo.id, todo.title));
        }

        for subtask in &todo.subtasks {
            let check = if subtask.is_completed { "x" } else { " " };
            self.say(format!("  [{}] #{} {}", check, subtask.id, subtask.title))?;
        }
        let Some(input) = self.ask("Subtask id (Enter to cancel): ")? else {
            return Ok(());
        };
        if input.is_empty() {
            return self.say("Cancelled.");
        }
        let Ok(subtask_id) = input.parse::<u32>() else {
            return self.say(format!("Error: '{}' is not a subtask id.", input));
        };

        match self.service.toggle_subtask_completion(todo.id, subtask_id) {
            Ok(updated) => self.say(format!(
                "Progress of [{}] {}: {:.0}%{}",
                updated.id,
                updated.title,
                updated.completion_rate() * 100.0,
                if updated.is_completed() { " (completed)" } else { "" }
            )),
            Err(e) => self.say(format!("Error: {}", e)),
        }
    }

    fn set_due_date(&mut self) -> Result<()> {
        let Some(todo) = self.pick_todo("schedule")? else {
            return Ok(());
        };
        self.print_quick_picks()?;
        let Some(input) =
            self.ask("Due date: pick a number or type e.g. tomorrow, 12/31 18:00 (Enter to clear): ")?
        else {
            return Ok(());
        };

        let due = if input.is_empty() {
            None
        } else {
            match self.parse_due(&input) {
                Ok(due) => Some(due),
                Err(e) => return self.say(format!("Error: {}", e)),
            }
        };

        match self.service.set_todo_due_date(todo.id, due) {
            Ok(updated) => match updated.due_date {
                Some(due) => self.say(format!(
                    "Due date of [{}] set to {}",
                    updated.id,
                    due.format("%Y-%m-%d %H:%M")
                )),
                None => self.say(format!("Cleared due date of [{}]", updated.id)),
            },
            Err(e) => self.say(format!("Error: {}", e)),
        }
    }

    fn show_status(&mut self) -> Result<()> {
        match self.service.notifications() {
            Ok(notifications) => {
                let text = format_status(&notifications);
                self.say(text)
            }
            Err(e) => self.say(format!("Error: {}", e)),
        }
    }
}
