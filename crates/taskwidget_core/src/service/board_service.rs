//! Board (main view) use-case service.
//!
//! # Responsibility
//! - Load the collection and current-list pointer from the store.
//! - Validate and apply list/task mutations requested by the view layer.
//! - Persist the whole collection after every successful mutation.
//!
//! # Invariants
//! - At least one list exists at all times.
//! - List names are unique, compared case-insensitively.
//! - The current list id always resolves to a loaded list.
//! - A subtask's parent is a top-level task of the same list.

use crate::blob::{encode_lists, load_or_default};
use crate::model::task::{Task, TaskId};
use crate::model::task_list::{ListId, ListProgress, TaskList};
use crate::repo::prefs_repo::{PrefsRepository, RepoError, KEY_CURRENT_LIST, KEY_TASK_LISTS};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

const HOUR_MS: i64 = 60 * 60 * 1000;

pub type BoardResult<T> = Result<T, BoardError>;

/// Errors from board operations.
///
/// Validation variants are meant to be shown to the user as short notices.
#[derive(Debug)]
pub enum BoardError {
    /// List name is blank after trim.
    EmptyListName,
    /// Rename target equals the current name.
    UnchangedListName,
    /// Another list already uses this name (case-insensitive).
    DuplicateListName(String),
    /// Refused to delete the only remaining list.
    LastList,
    ListNotFound(ListId),
    /// Task text is blank after trim.
    EmptyTaskText,
    TaskNotFound(TaskId),
    /// Parent is not a top-level task of the current list.
    ParentNotFound(TaskId),
    /// Operation requires a subtask but got a top-level task.
    NotASubtask(TaskId),
    /// Move target is the subtask itself, its current parent, or nested.
    InvalidMoveTarget(TaskId),
    Encode(serde_json::Error),
    Repo(RepoError),
}

impl Display for BoardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyListName => write!(f, "please enter a list name"),
            Self::UnchangedListName => write!(f, "please enter a new list name"),
            Self::DuplicateListName(name) => write!(f, "list '{name}' already exists"),
            Self::LastList => write!(f, "the last remaining list cannot be deleted"),
            Self::ListNotFound(id) => write!(f, "list not found: {id}"),
            Self::EmptyTaskText => write!(f, "please enter a task"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent task not found: {id}"),
            Self::NotASubtask(id) => write!(f, "task is not a subtask: {id}"),
            Self::InvalidMoveTarget(id) => write!(f, "cannot move subtask under task {id}"),
            Self::Encode(err) => write!(f, "failed to encode task lists: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BoardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for BoardError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<serde_json::Error> for BoardError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// In-memory board state backed by a key-value repository.
pub struct BoardService<R: PrefsRepository> {
    repo: R,
    lists: Vec<TaskList>,
    current_list_id: ListId,
}

impl<R: PrefsRepository> BoardService<R> {
    /// Loads the board from storage.
    ///
    /// # Side effects
    /// - Persists the synthesized default list when nothing usable was
    ///   stored.
    /// - Persists the current-list pointer when the stored one is missing
    ///   or stale.
    pub fn load(repo: R) -> BoardResult<Self> {
        let mut board = Self {
            repo,
            lists: Vec::new(),
            current_list_id: ListId::new(),
        };
        board.reload()?;
        Ok(board)
    }

    /// Re-reads the store, replacing in-memory state.
    ///
    /// Used after the other surface changed the blob.
    pub fn reload(&mut self) -> BoardResult<()> {
        let raw = self.repo.get_value(KEY_TASK_LISTS)?;
        let decoded = load_or_default(raw.as_deref());
        info!(
            "event=board_load module=board status=ok lists={} skipped={} synthesized={}",
            decoded.lists.len(),
            decoded.skipped,
            decoded.synthesized
        );
        self.lists = decoded.lists;
        if decoded.synthesized {
            self.persist_lists()?;
        }

        let stored = self.repo.get_value(KEY_CURRENT_LIST)?;
        match stored {
            Some(id) if self.list_index(&id).is_some() => self.current_list_id = id,
            other => {
                if let Some(stale) = other {
                    warn!(
                        "event=board_load module=board status=skip reason=stale_current_list list_id={}",
                        stale
                    );
                }
                self.current_list_id = self.lists[0].id.clone();
                self.persist_current()?;
            }
        }
        Ok(())
    }

    pub fn lists(&self) -> &[TaskList] {
        &self.lists
    }

    pub fn current_list_id(&self) -> &str {
        &self.current_list_id
    }

    pub fn current_list(&self) -> &TaskList {
        &self.lists[self.current_index()]
    }

    /// Completed/total counters over the current list's top-level tasks.
    pub fn progress(&self) -> ListProgress {
        self.current_list().progress()
    }

    /// Switches the list shown by both surfaces.
    pub fn select_list(&mut self, id: &str) -> BoardResult<()> {
        if self.list_index(id).is_none() {
            return Err(BoardError::ListNotFound(id.to_string()));
        }
        self.current_list_id = id.to_string();
        self.persist_current()
    }

    /// Creates a list and makes it current.
    pub fn create_list(&mut self, name: &str) -> BoardResult<ListId> {
        let name = normalize_list_name(name)?;
        if self.lists.iter().any(|list| list.name_matches(&name)) {
            return Err(BoardError::DuplicateListName(name));
        }

        let list = TaskList::new(name);
        let id = list.id.clone();
        self.lists.push(list);
        self.persist_lists()?;
        self.current_list_id = id.clone();
        self.persist_current()?;
        Ok(id)
    }

    /// Renames a list, keeping names unique.
    pub fn rename_list(&mut self, id: &str, name: &str) -> BoardResult<()> {
        let name = normalize_list_name(name)?;
        let index = self
            .list_index(id)
            .ok_or_else(|| BoardError::ListNotFound(id.to_string()))?;
        if self.lists[index].name == name {
            return Err(BoardError::UnchangedListName);
        }
        if self
            .lists
            .iter()
            .any(|list| list.id != id && list.name_matches(&name))
        {
            return Err(BoardError::DuplicateListName(name));
        }

        self.lists[index].name = name;
        self.persist_lists()
    }

    /// Deletes a list and all of its tasks.
    ///
    /// Deleting the current list makes the first remaining list current.
    pub fn delete_list(&mut self, id: &str) -> BoardResult<()> {
        let index = self
            .list_index(id)
            .ok_or_else(|| BoardError::ListNotFound(id.to_string()))?;
        if self.lists.len() <= 1 {
            return Err(BoardError::LastList);
        }

        self.lists.remove(index);
        self.persist_lists()?;
        if self.current_list_id == id {
            self.current_list_id = self.lists[0].id.clone();
            self.persist_current()?;
        }
        Ok(())
    }

    /// Adds a task to the current list, optionally as a subtask.
    pub fn add_task(&mut self, text: &str, parent_id: Option<&str>) -> BoardResult<TaskId> {
        let text = normalize_task_text(text)?;
        let list = self.current_list_mut();
        let list_id = list.id.clone();

        let id = match parent_id {
            Some(parent_id) => {
                let parent = list
                    .tasks
                    .iter_mut()
                    .find(|task| task.id == parent_id)
                    .ok_or_else(|| BoardError::ParentNotFound(parent_id.to_string()))?;
                let task = Task::new_subtask(text, list_id, parent_id);
                let id = task.id.clone();
                parent.subtasks.push(task);
                id
            }
            None => {
                let task = Task::new(text, list_id);
                let id = task.id.clone();
                list.tasks.push(task);
                id
            }
        };

        self.persist_lists()?;
        Ok(id)
    }

    /// Replaces a task's text.
    pub fn edit_task_text(&mut self, id: &str, text: &str) -> BoardResult<()> {
        let text = normalize_task_text(text)?;
        self.task_mut(id)?.text = text;
        self.persist_lists()
    }

    /// Flips completion and returns the new state.
    pub fn toggle_task(&mut self, id: &str) -> BoardResult<bool> {
        let completed = self.task_mut(id)?.toggle();
        self.persist_lists()?;
        Ok(completed)
    }

    /// Sets or clears a task's due date (epoch ms).
    pub fn set_due_date(&mut self, id: &str, due_date: Option<i64>) -> BoardResult<()> {
        self.task_mut(id)?.due_date = due_date;
        self.persist_lists()
    }

    /// Sets the due date `hours` after `now_ms` and returns it.
    pub fn set_due_in_hours(&mut self, id: &str, hours: i64, now_ms: i64) -> BoardResult<i64> {
        let due = now_ms.saturating_add(hours.saturating_mul(HOUR_MS));
        self.set_due_date(id, Some(due))?;
        Ok(due)
    }

    /// Removes a task (and its subtasks) from the current list.
    pub fn delete_task(&mut self, id: &str) -> BoardResult<()> {
        self.current_list_mut()
            .remove_task(id)
            .ok_or_else(|| BoardError::TaskNotFound(id.to_string()))?;
        self.persist_lists()
    }

    /// Moves a top-level task to `new_index`; indexes past the end append.
    pub fn reorder_task(&mut self, id: &str, new_index: usize) -> BoardResult<()> {
        let list = self.current_list_mut();
        let from = list
            .top_level_index(id)
            .ok_or_else(|| BoardError::TaskNotFound(id.to_string()))?;
        let task = list.tasks.remove(from);
        let to = new_index.min(list.tasks.len());
        list.tasks.insert(to, task);
        self.persist_lists()
    }

    /// Detaches a subtask and appends it as a top-level task.
    pub fn make_standalone(&mut self, subtask_id: &str) -> BoardResult<()> {
        let mut subtask = self.take_subtask(subtask_id)?;
        subtask.parent_task_id = None;
        self.current_list_mut().tasks.push(subtask);
        self.persist_lists()
    }

    /// Re-parents a subtask under another top-level task.
    pub fn move_subtask(&mut self, subtask_id: &str, target_id: &str) -> BoardResult<()> {
        let list = self.current_list();
        let subtask = list
            .find_task(subtask_id)
            .ok_or_else(|| BoardError::TaskNotFound(subtask_id.to_string()))?;
        if !subtask.is_subtask() {
            return Err(BoardError::NotASubtask(subtask_id.to_string()));
        }
        if !list
            .move_targets(subtask)
            .iter()
            .any(|task| task.id == target_id)
        {
            return Err(BoardError::InvalidMoveTarget(target_id.to_string()));
        }

        let mut subtask = self.take_subtask(subtask_id)?;
        subtask.parent_task_id = Some(target_id.to_string());
        let list = self.current_list_mut();
        let index = list
            .top_level_index(target_id)
            .ok_or_else(|| BoardError::InvalidMoveTarget(target_id.to_string()))?;
        list.tasks[index].subtasks.push(subtask);
        self.persist_lists()
    }

    /// Candidate parents for moving a subtask, in list order.
    pub fn move_targets(&self, subtask_id: &str) -> BoardResult<Vec<&Task>> {
        let list = self.current_list();
        let subtask = list
            .find_task(subtask_id)
            .ok_or_else(|| BoardError::TaskNotFound(subtask_id.to_string()))?;
        Ok(list.move_targets(subtask))
    }

    fn take_subtask(&mut self, subtask_id: &str) -> BoardResult<Task> {
        let list = self.current_list_mut();
        if list.top_level_index(subtask_id).is_some() {
            return Err(BoardError::NotASubtask(subtask_id.to_string()));
        }
        list.remove_task(subtask_id)
            .ok_or_else(|| BoardError::TaskNotFound(subtask_id.to_string()))
    }

    fn task_mut(&mut self, id: &str) -> BoardResult<&mut Task> {
        self.current_list_mut()
            .find_task_mut(id)
            .ok_or_else(|| BoardError::TaskNotFound(id.to_string()))
    }

    fn list_index(&self, id: &str) -> Option<usize> {
        self.lists.iter().position(|list| list.id == id)
    }

    fn current_index(&self) -> usize {
        self.list_index(&self.current_list_id).unwrap_or(0)
    }

    fn current_list_mut(&mut self) -> &mut TaskList {
        let index = self.current_index();
        &mut self.lists[index]
    }

    fn persist_lists(&self) -> BoardResult<()> {
        let encoded = encode_lists(&self.lists)?;
        self.repo.put_value(KEY_TASK_LISTS, &encoded)?;
        info!(
            "event=lists_saved module=board status=ok lists={} bytes={}",
            self.lists.len(),
            encoded.len()
        );
        Ok(())
    }

    fn persist_current(&self) -> BoardResult<()> {
        self.repo
            .put_value(KEY_CURRENT_LIST, &self.current_list_id)?;
        Ok(())
    }
}

fn normalize_list_name(name: &str) -> BoardResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(BoardError::EmptyListName);
    }
    Ok(trimmed.to_string())
}

fn normalize_task_text(text: &str) -> BoardResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(BoardError::EmptyTaskText);
    }
    Ok(trimmed.to_string())
}
