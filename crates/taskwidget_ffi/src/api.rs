//! FFI use-case API for the Flutter app and its home-screen widget.
//!
//! # Responsibility
//! - Expose board and widget operations to Dart via FRB.
//! - Open the shared store per call so app and widget callbacks never hold
//!   a connection between events.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Failures come back as `ok=false` envelopes with a readable message.

use log::warn;
use std::path::PathBuf;
use std::sync::OnceLock;
use taskwidget_core::db::open_db;
use taskwidget_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, now_epoch_ms,
    ping as ping_inner, BoardService, SqlitePrefsRepository, Task, WidgetActionOutcome,
    WidgetService, WidgetSnapshot,
};

const STORE_DB_FILE_NAME: &str = "taskwidget_store.sqlite3";
const STORE_DB_PATH_ENV: &str = "TASKWIDGET_DB_PATH";
static STORE_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
/// Safe to repeat with the same `level + log_dir`.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Pins the store file both the app and widget process use.
///
/// Must be called before the first board/widget call to take effect.
/// Returns an empty string on success, or a message when the path is blank
/// or a different path is already in use.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_store_path(path: String) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return "store path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = STORE_DB_PATH.get_or_init(|| requested.clone());
    if *active == requested {
        String::new()
    } else {
        format!(
            "store path already set to `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        )
    }
}

/// One list entry for the list picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub list_id: String,
    pub name: String,
    /// ARGB color.
    pub color: i32,
}

/// One task row, flattened; subtasks follow their parent with `depth = 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub task_id: String,
    pub text: String,
    pub completed: bool,
    pub due_date: Option<i64>,
    pub parent_task_id: Option<String>,
    pub depth: u32,
    /// `"done/total"` for parents with subtasks.
    pub subtask_progress: Option<String>,
}

/// Full main-view state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub ok: bool,
    pub message: String,
    pub lists: Vec<ListItem>,
    pub current_list_id: String,
    pub tasks: Vec<TaskItem>,
    /// `No tasks` or `c/t completed`.
    pub progress_label: String,
}

/// Generic action envelope for board/widget mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Created or affected entity id, when there is one.
    pub id: Option<String>,
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

/// Candidate parents for moving a subtask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTargetsResponse {
    pub ok: bool,
    pub message: String,
    pub targets: Vec<TaskItem>,
}

/// One widget row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetRowItem {
    /// Position to pass back to `widget_toggle_at` / `widget_delete_at`.
    pub index: u32,
    pub text: String,
    pub completed: bool,
    pub due_badge: Option<String>,
}

/// One widget frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetView {
    pub ok: bool,
    pub message: String,
    pub title: String,
    pub rows: Vec<WidgetRowItem>,
    /// Trailing "+N more" row text.
    pub overflow_label: Option<String>,
}

/// Loads the main-view state.
#[flutter_rust_bridge::frb(sync)]
pub fn board_snapshot() -> BoardSnapshot {
    match with_board(|board| Ok(snapshot_of(board))) {
        Ok(snapshot) => snapshot,
        Err(message) => BoardSnapshot {
            ok: false,
            message: format!("board_snapshot failed: {message}"),
            lists: Vec::new(),
            current_list_id: String::new(),
            tasks: Vec::new(),
            progress_label: String::new(),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_select_list(list_id: String) -> ActionResponse {
    respond("board_select_list", "List selected.", |board| {
        board.select_list(&list_id)?;
        Ok(Some(list_id.clone()))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_create_list(name: String) -> ActionResponse {
    respond("board_create_list", "List created.", |board| {
        board.create_list(&name).map(Some)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_rename_list(list_id: String, name: String) -> ActionResponse {
    respond("board_rename_list", "List renamed.", |board| {
        board.rename_list(&list_id, &name)?;
        Ok(Some(list_id.clone()))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_delete_list(list_id: String) -> ActionResponse {
    respond("board_delete_list", "List deleted.", |board| {
        board.delete_list(&list_id)?;
        Ok(None)
    })
}

/// Adds a task to the current list; `parent_task_id` makes it a subtask.
#[flutter_rust_bridge::frb(sync)]
pub fn board_add_task(text: String, parent_task_id: Option<String>) -> ActionResponse {
    respond("board_add_task", "Task added.", |board| {
        board.add_task(&text, parent_task_id.as_deref()).map(Some)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_edit_task(task_id: String, text: String) -> ActionResponse {
    respond("board_edit_task", "Task updated.", |board| {
        board.edit_task_text(&task_id, &text)?;
        Ok(Some(task_id.clone()))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_toggle_task(task_id: String) -> ActionResponse {
    respond("board_toggle_task", "Task toggled.", |board| {
        board.toggle_task(&task_id)?;
        Ok(Some(task_id.clone()))
    })
}

/// Sets (`Some`) or clears (`None`) a due date in epoch milliseconds.
#[flutter_rust_bridge::frb(sync)]
pub fn board_set_due_date(task_id: String, due_epoch_ms: Option<i64>) -> ActionResponse {
    let message = if due_epoch_ms.is_some() {
        "Due date set."
    } else {
        "Due date removed."
    };
    respond("board_set_due_date", message, |board| {
        board.set_due_date(&task_id, due_epoch_ms)?;
        Ok(Some(task_id.clone()))
    })
}

/// Sets the due date `hours` from now; the quick-pick path of the due dialog.
#[flutter_rust_bridge::frb(sync)]
pub fn board_set_due_in_hours(task_id: String, hours: i64) -> ActionResponse {
    respond("board_set_due_in_hours", "Due date set.", |board| {
        board.set_due_in_hours(&task_id, hours, now_epoch_ms())?;
        Ok(Some(task_id.clone()))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_delete_task(task_id: String) -> ActionResponse {
    respond("board_delete_task", "Task deleted.", |board| {
        board.delete_task(&task_id)?;
        Ok(None)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_reorder_task(task_id: String, new_index: u32) -> ActionResponse {
    respond("board_reorder_task", "Task moved.", |board| {
        board.reorder_task(&task_id, new_index as usize)?;
        Ok(Some(task_id.clone()))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_make_standalone(task_id: String) -> ActionResponse {
    respond("board_make_standalone", "Subtask made standalone.", |board| {
        board.make_standalone(&task_id)?;
        Ok(Some(task_id.clone()))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_move_subtask(task_id: String, target_task_id: String) -> ActionResponse {
    respond("board_move_subtask", "Subtask moved.", |board| {
        board.move_subtask(&task_id, &target_task_id)?;
        Ok(Some(task_id.clone()))
    })
}

/// Lists the top-level tasks a subtask may be moved under.
#[flutter_rust_bridge::frb(sync)]
pub fn board_move_targets(task_id: String) -> MoveTargetsResponse {
    let result = with_board(|board| {
        board
            .move_targets(&task_id)
            .map(|targets| targets.into_iter().map(|task| task_item_of(task, 0)).collect())
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(targets) => MoveTargetsResponse {
            ok: true,
            message: String::new(),
            targets,
        },
        Err(message) => {
            warn!("event=ffi_call module=ffi status=error op=board_move_targets error={message}");
            MoveTargetsResponse {
                ok: false,
                message: format!("board_move_targets failed: {message}"),
                targets: Vec::new(),
            }
        }
    }
}

/// Renders the current list for the home-screen widget.
#[flutter_rust_bridge::frb(sync)]
pub fn widget_render() -> WidgetView {
    match with_widget(|widget| widget.render(now_epoch_ms()).map_err(|err| err.to_string())) {
        Ok(snapshot) => widget_view_of(snapshot),
        Err(message) => WidgetView {
            ok: false,
            message: format!("widget_render failed: {message}"),
            title: String::new(),
            rows: Vec::new(),
            overflow_label: None,
        },
    }
}

/// Toggles the task rendered at `index`.
#[flutter_rust_bridge::frb(sync)]
pub fn widget_toggle_at(index: u32) -> ActionResponse {
    widget_action("widget_toggle_at", |widget| widget.toggle_at(index as usize))
}

/// Deletes the task rendered at `index`.
#[flutter_rust_bridge::frb(sync)]
pub fn widget_delete_at(index: u32) -> ActionResponse {
    widget_action("widget_delete_at", |widget| widget.delete_at(index as usize))
}

fn resolve_store_path() -> PathBuf {
    STORE_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(STORE_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(STORE_DB_FILE_NAME)
        })
        .clone()
}

fn with_board<T>(
    f: impl FnOnce(&mut BoardService<SqlitePrefsRepository<'_>>) -> Result<T, String>,
) -> Result<T, String> {
    let conn = open_db(resolve_store_path()).map_err(|err| format!("store open failed: {err}"))?;
    let repo = SqlitePrefsRepository::try_new(&conn)
        .map_err(|err| format!("store init failed: {err}"))?;
    let mut board = BoardService::load(repo).map_err(|err| err.to_string())?;
    f(&mut board)
}

fn with_widget<T>(
    f: impl FnOnce(&WidgetService<SqlitePrefsRepository<'_>>) -> Result<T, String>,
) -> Result<T, String> {
    let conn = open_db(resolve_store_path()).map_err(|err| format!("store open failed: {err}"))?;
    let repo = SqlitePrefsRepository::try_new(&conn)
        .map_err(|err| format!("store init failed: {err}"))?;
    f(&WidgetService::new(repo))
}

fn respond(
    operation: &str,
    success_message: &str,
    f: impl FnOnce(
        &mut BoardService<SqlitePrefsRepository<'_>>,
    ) -> taskwidget_core::BoardResult<Option<String>>,
) -> ActionResponse {
    match with_board(|board| f(board).map_err(|err| err.to_string())) {
        Ok(id) => ActionResponse::success(success_message, id),
        Err(message) => {
            warn!("event=ffi_call module=ffi status=error op={operation} error={message}");
            ActionResponse::failure(format!("{operation} failed: {message}"))
        }
    }
}

fn widget_action(
    operation: &str,
    f: impl FnOnce(
        &WidgetService<SqlitePrefsRepository<'_>>,
    ) -> taskwidget_core::WidgetResult<WidgetActionOutcome>,
) -> ActionResponse {
    match with_widget(|widget| f(widget).map_err(|err| err.to_string())) {
        Ok(WidgetActionOutcome::Toggled { task_id, completed }) => {
            let message = if completed {
                "Task completed."
            } else {
                "Task reopened."
            };
            ActionResponse::success(message, Some(task_id))
        }
        Ok(WidgetActionOutcome::Deleted { task_id }) => {
            ActionResponse::success("Task deleted.", Some(task_id))
        }
        Ok(WidgetActionOutcome::OutOfRange { index, len }) => ActionResponse::failure(format!(
            "{operation} failed: no task at position {index} (list has {len})"
        )),
        Err(message) => ActionResponse::failure(format!("{operation} failed: {message}")),
    }
}

fn snapshot_of(board: &BoardService<SqlitePrefsRepository<'_>>) -> BoardSnapshot {
    let lists = board
        .lists()
        .iter()
        .map(|list| ListItem {
            list_id: list.id.clone(),
            name: list.name.clone(),
            color: list.color,
        })
        .collect();
    let mut tasks = Vec::new();
    for task in &board.current_list().tasks {
        tasks.push(task_item_of(task, 0));
        tasks.extend(task.subtasks.iter().map(|sub| task_item_of(sub, 1)));
    }

    BoardSnapshot {
        ok: true,
        message: String::new(),
        lists,
        current_list_id: board.current_list_id().to_string(),
        tasks,
        progress_label: board.progress().label(),
    }
}

fn task_item_of(task: &Task, depth: u32) -> TaskItem {
    TaskItem {
        task_id: task.id.clone(),
        text: task.text.clone(),
        completed: task.completed,
        due_date: task.due_date,
        parent_task_id: task.parent_task_id.clone(),
        depth,
        subtask_progress: task
            .has_subtasks()
            .then(|| format!("{}/{}", task.completed_subtasks(), task.total_subtasks())),
    }
}

fn widget_view_of(snapshot: WidgetSnapshot) -> WidgetView {
    let overflow_label = snapshot.overflow_label();
    WidgetView {
        ok: true,
        message: String::new(),
        title: snapshot.title,
        rows: snapshot
            .rows
            .into_iter()
            .map(|row| WidgetRowItem {
                index: row.index as u32,
                text: row.text,
                completed: row.completed,
                due_badge: row.due_badge,
            })
            .collect(),
        overflow_label,
    }
}
