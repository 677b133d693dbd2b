//! Task list domain model.
//!
//! # Responsibility
//! - Define a named, ordered collection of top-level tasks.
//! - Resolve tasks by id across the top level and one subtask level.
//!
//! # Invariants
//! - `tasks` order is the user's arrangement and must be preserved.
//! - Name comparison for uniqueness is case-insensitive.

use super::task::Task;
use super::{epoch_ms_or_now, lenient_option, new_entity_id, now_epoch_ms};
use serde::{Deserialize, Deserializer, Serialize};

/// Id of the list synthesized when storage holds no usable list.
pub const DEFAULT_LIST_ID: &str = "default";
/// Display name of the synthesized list.
pub const DEFAULT_LIST_NAME: &str = "My Tasks";
/// ARGB accent color assigned to new lists.
pub const DEFAULT_LIST_COLOR: i32 = 0xFF33_99FF_u32 as i32;

/// Opaque list identifier (UUID text, or `"default"`).
pub type ListId = String;

/// Named ordered collection of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    pub id: ListId,
    pub name: String,
    #[serde(default = "default_color", deserialize_with = "color_or_default")]
    pub color: i32,
    #[serde(default = "now_epoch_ms", deserialize_with = "epoch_ms_or_now")]
    pub created: i64,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Completed/total counters over top-level tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListProgress {
    pub completed: usize,
    pub total: usize,
}

impl ListProgress {
    /// Short label used by list headers: `No tasks` or `c/t completed`.
    pub fn label(&self) -> String {
        if self.total == 0 {
            "No tasks".to_string()
        } else {
            format!("{}/{} completed", self.completed, self.total)
        }
    }
}

impl TaskList {
    /// Creates an empty list with a generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(new_entity_id(), name)
    }

    /// Creates an empty list with a caller-provided id.
    pub fn with_id(id: impl Into<ListId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: DEFAULT_LIST_COLOR,
            created: now_epoch_ms(),
            tasks: Vec::new(),
        }
    }

    /// The fallback list used when nothing usable is stored.
    pub fn default_list() -> Self {
        Self::with_id(DEFAULT_LIST_ID, DEFAULT_LIST_NAME)
    }

    /// Case-insensitive name comparison.
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    pub fn progress(&self) -> ListProgress {
        ListProgress {
            completed: self.tasks.iter().filter(|task| task.completed).count(),
            total: self.tasks.len(),
        }
    }

    /// Position of a top-level task.
    pub fn top_level_index(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    /// Finds a task at the top level or one level down.
    pub fn find_task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find_map(|task| {
            if task.id == id {
                Some(task)
            } else {
                task.subtasks.iter().find(|sub| sub.id == id)
            }
        })
    }

    pub fn find_task_mut(&mut self, id: &str) -> Option<&mut Task> {
        for task in &mut self.tasks {
            if task.id == id {
                return Some(task);
            }
            if let Some(sub) = task.subtasks.iter_mut().find(|sub| sub.id == id) {
                return Some(sub);
            }
        }
        None
    }

    /// Detaches a task from wherever it sits and returns it.
    pub fn remove_task(&mut self, id: &str) -> Option<Task> {
        if let Some(index) = self.top_level_index(id) {
            return Some(self.tasks.remove(index));
        }
        for parent in &mut self.tasks {
            if let Some(index) = parent.subtasks.iter().position(|sub| sub.id == id) {
                return Some(parent.subtasks.remove(index));
            }
        }
        None
    }

    /// Top-level tasks a subtask may be moved under: every top-level task
    /// other than its current parent and itself.
    pub fn move_targets(&self, subtask: &Task) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| {
                Some(&task.id) != subtask.parent_task_id.as_ref()
                    && task.id != subtask.id
                    && task.parent_task_id.is_none()
            })
            .collect()
    }
}

fn default_color() -> i32 {
    DEFAULT_LIST_COLOR
}

fn color_or_default<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_option::<D, i32>(deserializer)?.unwrap_or_else(default_color))
}

#[cfg(test)]
mod tests {
    use super::{TaskList, DEFAULT_LIST_COLOR, DEFAULT_LIST_ID, DEFAULT_LIST_NAME};
    use crate::model::task::Task;

    fn list_with_family() -> (TaskList, String, String) {
        let mut list = TaskList::new("Home");
        let mut parent = Task::new("clean", list.id.clone());
        let child = Task::new_subtask("kitchen", list.id.clone(), parent.id.clone());
        let child_id = child.id.clone();
        parent.subtasks.push(child);
        let parent_id = parent.id.clone();
        list.tasks.push(parent);
        list.tasks.push(Task::new("laundry", list.id.clone()));
        (list, parent_id, child_id)
    }

    #[test]
    fn default_list_uses_well_known_identity() {
        let list = TaskList::default_list();
        assert_eq!(list.id, DEFAULT_LIST_ID);
        assert_eq!(list.name, DEFAULT_LIST_NAME);
        assert_eq!(list.color, DEFAULT_LIST_COLOR);
        assert!(list.tasks.is_empty());
    }

    #[test]
    fn name_matching_ignores_case() {
        let list = TaskList::new("Groceries");
        assert!(list.name_matches("groceries"));
        assert!(list.name_matches("GROCERIES"));
        assert!(!list.name_matches("Grocery"));
    }

    #[test]
    fn find_and_remove_reach_subtasks() {
        let (mut list, parent_id, child_id) = list_with_family();
        assert_eq!(list.find_task(&child_id).unwrap().text, "kitchen");

        let removed = list.remove_task(&child_id).unwrap();
        assert_eq!(removed.id, child_id);
        assert!(list.find_task(&child_id).is_none());
        assert!(!list.find_task(&parent_id).unwrap().has_subtasks());
    }

    #[test]
    fn move_targets_exclude_current_parent() {
        let (list, parent_id, child_id) = list_with_family();
        let child = list.find_task(&child_id).unwrap().clone();
        let targets = list.move_targets(&child);
        assert_eq!(targets.len(), 1);
        assert_ne!(targets[0].id, parent_id);
    }

    #[test]
    fn progress_label_reports_empty_and_partial() {
        let mut list = TaskList::new("Work");
        assert_eq!(list.progress().label(), "No tasks");
        list.tasks.push(Task::new("a", list.id.clone()));
        list.tasks[0].toggle();
        list.tasks.push(Task::new("b", list.id.clone()));
        assert_eq!(list.progress().label(), "1/2 completed");
    }

    #[test]
    fn wrong_typed_color_and_created_fall_back() {
        let list: TaskList =
            serde_json::from_str(r#"{"id":"l1","name":"Work","color":"blue","created":[]}"#)
                .unwrap();
        assert_eq!(list.color, DEFAULT_LIST_COLOR);
        assert!(list.created > 0);
    }
}
