//! Todo MCP - Main Entry Point
//!
//! Runs the MCP server, the console menu or a single command against the todo
//! data file. The actual implementation is in the `todo_mcp` library.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use mcp_attr::server::serve_stdio;
use std::io;
use std::path::PathBuf;
use todo_mcp::dates::validate_date_range;
use todo_mcp::formatting::{format_status, format_todo_detail, format_todo_tree, todos_to_json};
use todo_mcp::menu::Menu;
use todo_mcp::{AppConfig, DueFilter, ListQuery, SortKey, SortOrder, TodoServerHandler, TodoService};

/// Todo manager with a folder per todo, due dates and subtasks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (default: todo.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the todo data file
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    /// Directory holding the per-todo folders
    #[arg(long, global = true)]
    folders_dir: Option<PathBuf>,

    /// Enable git synchronization on save
    #[arg(long, global = true)]
    sync_git: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the MCP protocol over stdio
    Serve,
    /// Interactive numbered menu (default)
    Menu,
    /// Add a todo
    Add {
        title: String,
        /// Due date, e.g. "tomorrow", "2025-03-15 09:30", "12/31 18:00"
        #[arg(long)]
        due: Option<String>,
    },
    /// List todos
    List {
        /// all, due_today, overdue or this_week
        #[arg(long, default_value = "all")]
        filter: DueFilter,
        /// created_at, title, progress or due_date
        #[arg(long, default_value = "created_at")]
        sort: SortKey,
        /// asc or desc
        #[arg(long)]
        order: Option<SortOrder>,
        /// Leave out completed todos
        #[arg(long)]
        hide_completed: bool,
        /// Case-insensitive text matched against todo and subtask titles
        #[arg(long, default_value = "")]
        search: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show one todo in detail
    Show { id: u32 },
    /// Rename a todo
    Rename { id: u32, title: String },
    /// Delete a todo
    Delete {
        id: u32,
        /// Also delete the todo's folder and its files
        #[arg(long)]
        delete_folder: bool,
    },
    /// Mark a todo and its subtasks completed
    Done { id: u32 },
    /// Reopen a completed todo
    Undone { id: u32 },
    /// Manage subtasks
    Subtask {
        #[command(subcommand)]
        command: SubtaskCommand,
    },
    /// Set the due date of a todo or subtask; omit the date to clear it
    Due {
        id: u32,
        text: Option<String>,
        /// Date this subtask of the todo instead
        #[arg(long)]
        subtask: Option<u32>,
    },
    /// List todos due between two dates
    Range { start: String, end: String },
    /// Show overdue, due today and urgent todos
    Status {
        /// Days to look ahead in the per-day breakdown (at most 365)
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Open a todo's folder in the file manager
    Open { id: u32 },
}

#[derive(Subcommand, Debug)]
enum SubtaskCommand {
    Add { todo_id: u32, title: String },
    Rename { todo_id: u32, subtask_id: u32, title: String },
    Delete { todo_id: u32, subtask_id: u32 },
    Toggle { todo_id: u32, subtask_id: u32 },
}

fn init_logging() {
    // stdout carries MCP messages, so logs always go to stderr
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    if let Some(ref data_file) = cli.data_file {
        config.data_file = data_file.clone();
    }
    if let Some(ref folders_dir) = cli.folders_dir {
        config.folders_dir = folders_dir.clone();
    }
    if cli.sync_git {
        config.sync_git = true;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Some(Command::Serve) => {
            let handler = TodoServerHandler::new(&config)?;
            serve_stdio(handler).await?;
            Ok(())
        }
        None | Some(Command::Menu) => {
            let mut service = TodoService::from_config(&config);
            let stdin = io::stdin();
            Menu::new(&mut service, stdin.lock(), io::stdout()).run()?;
            service.shutdown()
        }
        Some(command) => {
            let mut service = TodoService::from_config(&config);
            let output = run_command(&mut service, command)?;
            println!("{}", output.trim_end());
            service.shutdown()
        }
    }
}

/// Run a one-shot command and return what to print
fn run_command(service: &mut TodoService, command: Command) -> Result<String> {
    let now = service.now();
    let output = match command {
        Command::Serve | Command::Menu => unreachable!("handled in main"),
        Command::Add { title, due } => {
            let due = due
                .as_deref()
                .filter(|text| !text.trim().is_empty())
                .map(|text| service.parse_due_input(text))
                .transpose()?;
            let todo = service.add_todo_with_due_date(&title, due)?;
            format!("Added todo {}\n{}", todo.id, format_todo_detail(&todo, now))
        }
        Command::List {
            filter,
            sort,
            order,
            hide_completed,
            search,
            json,
        } => {
            let query = ListQuery {
                filter,
                show_completed: !hide_completed,
                search,
                sort,
                order,
            };
            let todos = service.get_filtered_and_sorted_todos(&query)?;
            if json {
                todos_to_json(&todos, now)?
            } else {
                format_todo_tree(&todos, now)
            }
        }
        Command::Show { id } => {
            let todo = service
                .get_todo_by_id(id)?
                .with_context(|| format!("No todo with id {}", id))?;
            format_todo_detail(&todo, now)
        }
        Command::Rename { id, title } => {
            let todo = service.update_todo(id, &title)?;
            format!("Renamed todo {} to '{}'", todo.id, todo.title)
        }
        Command::Delete { id, delete_folder } => {
            let deleted = service.delete_todo(id, delete_folder)?;
            match (delete_folder, deleted.folder_deleted) {
                (true, true) => format!("Deleted todo {} and its folder", id),
                (true, false) => format!(
                    "Deleted todo {}; folder {} could not be deleted",
                    id, deleted.todo.folder_path
                ),
                (false, _) => format!(
                    "Deleted todo {}; folder kept at {}",
                    id, deleted.todo.folder_path
                ),
            }
        }
        Command::Done { id } => {
            let todo = service.set_todo_completed(id, true)?;
            format!("Completed todo {} '{}'", todo.id, todo.title)
        }
        Command::Undone { id } => {
            let todo = service.set_todo_completed(id, false)?;
            format!("Reopened todo {} '{}'", todo.id, todo.title)
        }
        Command::Subtask { command } => run_subtask_command(service, command)?,
        Command::Due { id, text, subtask } => {
            let due = text
                .as_deref()
                .filter(|text| !text.trim().is_empty())
                .map(|text| service.parse_due_input(text))
                .transpose()?;
            let applied = match subtask {
                Some(subtask_id) => service.set_subtask_due_date(id, subtask_id, due)?.due_date,
                None => service.set_todo_due_date(id, due)?.due_date,
            };
            match applied {
                Some(due) => format!("Due date set to {}", due.format("%Y-%m-%d %H:%M")),
                None => "Due date cleared".to_string(),
            }
        }
        Command::Range { start, end } => {
            let start = service.parse_due_input(&start)?;
            let end = service.parse_due_input(&end)?;
            validate_date_range(start, end)?;
            format_todo_tree(&service.get_todos_by_due_date(start, end)?, now)
        }
        Command::Status { days } => {
            let notifications = service.notifications()?;
            let mut result = format_status(&notifications);
            result.push('\n');
            for (date, count) in notifications.summary_for_period(days)? {
                result.push_str(&format!("  {} {}\n", date.format("%Y-%m-%d %a"), count));
            }
            result
        }
        Command::Open { id } => {
            let todo = service
                .get_todo_by_id(id)?
                .with_context(|| format!("No todo with id {}", id))?;
            service.folders().open_todo_folder(&todo.folder_path)?;
            format!("Opened {}", todo.folder_path)
        }
    };
    Ok(output)
}

fn run_subtask_command(service: &mut TodoService, command: SubtaskCommand) -> Result<String> {
    let output = match command {
        SubtaskCommand::Add { todo_id, title } => {
            let subtask = service.add_subtask(todo_id, &title)?;
            format!("Added subtask {} to todo {}", subtask.id, todo_id)
        }
        SubtaskCommand::Rename {
            todo_id,
            subtask_id,
            title,
        } => {
            let subtask = service.update_subtask(todo_id, subtask_id, &title)?;
            format!("Renamed subtask {} to '{}'", subtask.id, subtask.title)
        }
        SubtaskCommand::Delete {
            todo_id,
            subtask_id,
        } => {
            let subtask = service.delete_subtask(todo_id, subtask_id)?;
            format!("Deleted subtask {} '{}'", subtask.id, subtask.title)
        }
        SubtaskCommand::Toggle {
            todo_id,
            subtask_id,
        } => {
            let todo = service.toggle_subtask_completion(todo_id, subtask_id)?;
            format!(
                "Todo {} progress: {:.0}%{}",
                todo.id,
                todo.completion_rate() * 100.0,
                if todo.is_completed() { " (completed)" } else { "" }
            )
        }
    };
    Ok(output)
}
