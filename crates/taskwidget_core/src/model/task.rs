//! Task domain model.
//!
//! # Responsibility
//! - Define one to-do item and its ordered subtasks.
//! - Keep the JSON field shape stable for both app and widget readers.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `parent_task_id` is `Some` exactly when the task sits in a parent's
//!   `subtasks`.
//! - Optional fields serialize as explicit `null`, never omitted.

use super::{epoch_ms_or_now, lenient_option, new_entity_id, now_epoch_ms};
use super::task_list::DEFAULT_LIST_ID;
use serde::{Deserialize, Serialize};

/// Opaque task identifier (UUID text for new tasks).
pub type TaskId = String;

/// One to-do item.
///
/// Field order matches the persisted blob layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    /// Unix epoch milliseconds.
    #[serde(default, deserialize_with = "lenient_option")]
    pub due_date: Option<i64>,
    /// Stored for forward compatibility; nothing schedules it.
    #[serde(default, deserialize_with = "lenient_option")]
    pub reminder: Option<i64>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub parent_task_id: Option<TaskId>,
    #[serde(default)]
    pub subtasks: Vec<Task>,
    #[serde(default = "now_epoch_ms", deserialize_with = "epoch_ms_or_now")]
    pub created: i64,
    #[serde(default = "default_list_id", deserialize_with = "list_id_or_default")]
    pub list_id: String,
}

impl Task {
    /// Creates a top-level task owned by `list_id`.
    pub fn new(text: impl Into<String>, list_id: impl Into<String>) -> Self {
        Self {
            id: new_entity_id(),
            text: text.into(),
            completed: false,
            due_date: None,
            reminder: None,
            parent_task_id: None,
            subtasks: Vec::new(),
            created: now_epoch_ms(),
            list_id: list_id.into(),
        }
    }

    /// Creates a subtask pointing at `parent_id`.
    pub fn new_subtask(
        text: impl Into<String>,
        list_id: impl Into<String>,
        parent_id: impl Into<TaskId>,
    ) -> Self {
        let mut task = Self::new(text, list_id);
        task.parent_task_id = Some(parent_id.into());
        task
    }

    /// Flips completion and returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.completed = !self.completed;
        self.completed
    }

    pub fn is_subtask(&self) -> bool {
        self.parent_task_id.is_some()
    }

    pub fn has_subtasks(&self) -> bool {
        !self.subtasks.is_empty()
    }

    pub fn completed_subtasks(&self) -> usize {
        self.subtasks.iter().filter(|task| task.completed).count()
    }

    pub fn total_subtasks(&self) -> usize {
        self.subtasks.len()
    }
}

fn default_list_id() -> String {
    DEFAULT_LIST_ID.to_string()
}

fn list_id_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(lenient_option::<D, String>(deserializer)?.unwrap_or_else(default_list_id))
}
