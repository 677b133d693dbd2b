//! Diagnostic CLI over the shared task store.
//!
//! # Responsibility
//! - Verify `taskwidget_core` linkage without the Flutter host.
//! - Inspect and poke the same store file the app and widget use.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use taskwidget_core::db::open_db;
use taskwidget_core::{
    default_log_level, init_logging, now_epoch_ms, BoardService, SqlitePrefsRepository,
    WidgetActionOutcome, WidgetService,
};

#[derive(Parser)]
#[command(name = "taskwidget", version, about = "Inspect and edit the task widget store")]
struct Cli {
    /// Store file shared with the app and widget.
    #[arg(long, env = "TASKWIDGET_DB_PATH", default_value = "taskwidget_store.sqlite3")]
    db: PathBuf,

    /// Absolute directory for rolling log files; logging is off when unset.
    #[arg(long)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print core linkage info.
    Ping,
    /// List all task lists, marking the current one.
    Lists,
    /// Show the current list with subtasks.
    Show,
    /// Create a list and make it current.
    NewList { name: String },
    /// Make a list current.
    Select { list_id: String },
    /// Add a task to the current list.
    Add {
        text: String,
        /// Add as a subtask of this top-level task.
        #[arg(long)]
        parent: Option<String>,
    },
    /// Toggle a task by id.
    Toggle { task_id: String },
    /// Delete a task by id.
    Delete { task_id: String },
    /// Print the widget frame.
    Widget,
    /// Toggle the widget row at a position.
    WidgetToggle { index: usize },
    /// Delete the widget row at a position.
    WidgetDelete { index: usize },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(default_log_level(), log_dir).context("failed to start logging")?;
    }

    if let Command::Ping = cli.command {
        println!("taskwidget_core ping={}", taskwidget_core::ping());
        println!("taskwidget_core version={}", taskwidget_core::core_version());
        return Ok(());
    }

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open store `{}`", cli.db.display()))?;
    let repo = SqlitePrefsRepository::try_new(&conn)?;

    match cli.command {
        Command::Ping => {}
        Command::Widget => print_widget(&WidgetService::new(&repo))?,
        Command::WidgetToggle { index } => {
            print_outcome(WidgetService::new(&repo).toggle_at(index)?)
        }
        Command::WidgetDelete { index } => {
            print_outcome(WidgetService::new(&repo).delete_at(index)?)
        }
        command => run_board_command(BoardService::load(&repo)?, command)?,
    }
    Ok(())
}

fn run_board_command(
    mut board: BoardService<&SqlitePrefsRepository<'_>>,
    command: Command,
) -> Result<()> {
    match command {
        Command::Lists => {
            for list in board.lists() {
                let marker = if list.id == board.current_list_id() {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{marker} {}  {}  ({})",
                    list.id,
                    list.name,
                    list.progress().label()
                );
            }
        }
        Command::Show => {
            let list = board.current_list();
            println!("{} ({})", list.name, list.progress().label());
            for task in &list.tasks {
                println!("[{}] {}  {}", check(task.completed), task.text, task.id);
                for sub in &task.subtasks {
                    println!("    [{}] {}  {}", check(sub.completed), sub.text, sub.id);
                }
            }
        }
        Command::NewList { name } => println!("{}", board.create_list(&name)?),
        Command::Select { list_id } => board.select_list(&list_id)?,
        Command::Add { text, parent } => println!("{}", board.add_task(&text, parent.as_deref())?),
        Command::Toggle { task_id } => {
            let completed = board.toggle_task(&task_id)?;
            println!("{task_id} completed={completed}");
        }
        Command::Delete { task_id } => board.delete_task(&task_id)?,
        Command::Ping
        | Command::Widget
        | Command::WidgetToggle { .. }
        | Command::WidgetDelete { .. } => {}
    }
    Ok(())
}

fn print_widget(widget: &WidgetService<&SqlitePrefsRepository<'_>>) -> Result<()> {
    let snapshot = widget.render(now_epoch_ms())?;
    println!("{}", snapshot.title);
    for row in &snapshot.rows {
        let badge = row.due_badge.as_deref().unwrap_or("");
        println!("{:>2} [{}] {} {}", row.index, check(row.completed), row.text, badge);
    }
    if let Some(label) = snapshot.overflow_label() {
        println!("   {label}");
    }
    Ok(())
}

fn print_outcome(outcome: WidgetActionOutcome) {
    match outcome {
        WidgetActionOutcome::Toggled { task_id, completed } => {
            println!("{task_id} completed={completed}")
        }
        WidgetActionOutcome::Deleted { task_id } => println!("{task_id} deleted"),
        WidgetActionOutcome::OutOfRange { index, len } => {
            println!("no task at position {index} (list has {len})")
        }
    }
}

fn check(completed: bool) -> char {
    if completed {
        'x'
    } else {
        ' '
    }
}
