//! `TaskBoard` CLI — inspect and manipulate the board from a terminal.
//!
//! Talks to a running `taskboard-server` through the same optimistic
//! store the UI layers use. Configuration via CLI flags, environment
//! variables, or config file (`~/.config/taskboard/config.toml`).
//!
//! ```bash
//! # Show the board
//! cargo run --bin taskboard -- list
//!
//! # Move a task to the done column (order defaults to max + 1)
//! cargo run --bin taskboard -- move <task-id> done
//!
//! # Create and delete
//! cargo run --bin taskboard -- create "Fix flaky test" --board board-1 --column todo
//! cargo run --bin taskboard -- delete <task-id>
//! ```

use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use url::Url;

use taskboard::api::HttpTaskApi;
use taskboard::board::{DeleteOutcome, TaskStore};
use taskboard::config::{CliArgs, ClientConfig};
use taskboard_proto::api::CreateTaskRequest;
use taskboard_proto::task::{BoardId, ColumnId, Priority, TaskId, UserId};

#[derive(Parser, Debug)]
#[command(version, about = "TaskBoard — Kanban board client")]
struct Cli {
    #[command(flatten)]
    args: CliArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show every column and its tasks (the default).
    List,
    /// Create a task.
    Create {
        /// Task title.
        title: String,
        /// Destination board.
        #[arg(long)]
        board: String,
        /// Destination column.
        #[arg(long)]
        column: String,
        /// Position in the column (default: after the last task).
        #[arg(long)]
        order: Option<i64>,
        /// Description text.
        #[arg(long)]
        description: Option<String>,
        /// Priority: LOW, MEDIUM, HIGH, or URGENT.
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
        /// Due date (YYYY-MM-DD).
        #[arg(long)]
        due: Option<NaiveDate>,
        /// Assignee user id.
        #[arg(long)]
        assignee: Option<String>,
    },
    /// Move a task to another column.
    Move {
        /// Task id.
        task_id: String,
        /// Destination column.
        column: String,
        /// Position in the column (default: after the last task).
        #[arg(long)]
        order: Option<i64>,
    },
    /// Delete a task.
    Delete {
        /// Task id.
        task_id: String,
    },
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    match s.to_ascii_uppercase().as_str() {
        "LOW" => Ok(Priority::Low),
        "MEDIUM" => Ok(Priority::Medium),
        "HIGH" => Ok(Priority::High),
        "URGENT" => Ok(Priority::Urgent),
        other => Err(format!(
            "unknown priority {other:?} (expected LOW, MEDIUM, HIGH, or URGENT)"
        )),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load and resolve configuration (CLI args > config file > env > defaults).
    let config = match ClientConfig::load(&cli.args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command.unwrap_or(Command::List), &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(
    command: Command,
    config: &ClientConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let base_url = Url::parse(&config.api_base_url)?;
    let api = HttpTaskApi::new(base_url, config.request_timeout)?;
    let (store, _events) = TaskStore::new(api, config.event_buffer);

    let count = store.refresh().await?;
    tracing::debug!(count, "loaded tasks");

    match command {
        Command::List => {
            print_board(&store);
        }
        Command::Create {
            title,
            board,
            column,
            order,
            description,
            priority,
            due,
            assignee,
        } => {
            let column_id = ColumnId::new(column);
            let order = order.unwrap_or_else(|| next_order(&store, &column_id));
            let created = store
                .create_task(CreateTaskRequest {
                    title,
                    description,
                    priority,
                    due_date: due,
                    order,
                    board_id: BoardId::new(board),
                    column_id,
                    assignee_id: assignee.map(UserId::new),
                })
                .await?;
            println!("created {} ({})", created.id, created.title);
        }
        Command::Move {
            task_id,
            column,
            order,
        } => {
            let task_id = TaskId::new(task_id);
            let column_id = ColumnId::new(column);
            let order = order.unwrap_or_else(|| next_order(&store, &column_id));

            let Some(handle) = store.move_task(&task_id, column_id.clone(), order) else {
                return Err(format!("no such task: {task_id}").into());
            };
            // The CLI has nothing else to do, so wait for the
            // reconciliation the UI would fire-and-forget.
            handle.await?;

            match store.task(&task_id) {
                Some(task) if task.column_id == column_id => {
                    println!("moved {task_id} to {column_id} (order {order})");
                }
                _ => return Err("move failed and was rolled back".into()),
            }
        }
        Command::Delete { task_id } => {
            let task_id = TaskId::new(task_id);
            match store.delete_task(&task_id).await? {
                DeleteOutcome::Deleted => println!("deleted {task_id}"),
                DeleteOutcome::Ignored => println!("no such task: {task_id}"),
            }
        }
    }

    Ok(())
}

/// One past the highest order in the column, or 1 for an empty column,
/// matching the rule the board UI uses when dropping a card.
fn next_order(store: &TaskStore<HttpTaskApi>, column_id: &ColumnId) -> i64 {
    store
        .column_tasks(column_id)
        .iter()
        .map(|t| t.order)
        .max()
        .map_or(1, |max| max + 1)
}

/// Prints the board grouped by column, tasks in render order.
fn print_board(store: &TaskStore<HttpTaskApi>) {
    let tasks = store.tasks();
    let mut columns: Vec<ColumnId> = Vec::new();
    for task in &tasks {
        if !columns.contains(&task.column_id) {
            columns.push(task.column_id.clone());
        }
    }

    if columns.is_empty() {
        println!("(no tasks)");
        return;
    }

    for column_id in columns {
        println!("{column_id}:");
        for task in store.column_tasks(&column_id) {
            let priority = task
                .priority
                .map_or(String::new(), |p| format!(" [{p}]"));
            let due = task
                .due_date
                .map_or(String::new(), |d| format!(" (due {d})"));
            println!("  {:>3}. {}{priority}{due}  {}", task.order, task.title, task.id);
        }
    }
}
