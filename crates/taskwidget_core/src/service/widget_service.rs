//! Home-screen widget surface.
//!
//! # Responsibility
//! - Build a capped row model of the current list for the widget renderer.
//! - Apply toggle/delete actions addressed by row position.
//!
//! # Invariants
//! - Reads the store independently of the board; no in-memory state.
//! - Every action is one read-modify-write of the whole blob.
//! - Actions address tasks by position at call time. A reorder between
//!   render and tap makes the action hit whatever task now sits there.

use crate::blob::{encode_lists, load_or_default};
use crate::model::task::TaskId;
use crate::model::task_list::{ListId, TaskList, DEFAULT_LIST_ID, DEFAULT_LIST_NAME};
use crate::repo::prefs_repo::{PrefsRepository, RepoError, KEY_CURRENT_LIST, KEY_TASK_LISTS};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum number of top-level tasks rendered as rows.
pub const WIDGET_TASK_CAP: usize = 8;

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

pub type WidgetResult<T> = Result<T, WidgetError>;

#[derive(Debug)]
pub enum WidgetError {
    Encode(serde_json::Error),
    Repo(RepoError),
}

impl Display for WidgetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode task lists: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for WidgetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for WidgetError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<serde_json::Error> for WidgetError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// One rendered task row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetRow {
    /// Position within the list at render time; the action address.
    pub index: usize,
    pub task_id: TaskId,
    pub text: String,
    pub completed: bool,
    /// Countdown label for future due dates.
    pub due_badge: Option<String>,
}

/// Everything the widget renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetSnapshot {
    pub list_id: ListId,
    pub list_name: String,
    /// `"{name} ({completed}/{shown})"`.
    pub title: String,
    pub rows: Vec<WidgetRow>,
    /// Completed tasks among the shown rows.
    pub completed_count: usize,
    /// Tasks beyond the row cap.
    pub overflow: usize,
}

impl WidgetSnapshot {
    /// Text of the trailing "+N more" row, if any.
    pub fn overflow_label(&self) -> Option<String> {
        (self.overflow > 0).then(|| format!("... and {} more tasks", self.overflow))
    }
}

/// Result of one positional action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetActionOutcome {
    Toggled { task_id: TaskId, completed: bool },
    Deleted { task_id: TaskId },
    /// Nothing was written.
    OutOfRange { index: usize, len: usize },
}

/// Stateless widget surface over a key-value repository.
pub struct WidgetService<R: PrefsRepository> {
    repo: R,
}

impl<R: PrefsRepository> WidgetService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Renders the current list at `now_ms`.
    pub fn render(&self, now_ms: i64) -> WidgetResult<WidgetSnapshot> {
        let (lists, current_id) = self.read_state()?;
        let snapshot = match resolve_list(&lists, &current_id) {
            Some(index) => snapshot_of(&lists[index], now_ms),
            None => WidgetSnapshot {
                list_id: DEFAULT_LIST_ID.to_string(),
                list_name: DEFAULT_LIST_NAME.to_string(),
                title: format!("{DEFAULT_LIST_NAME} (0/0)"),
                rows: Vec::new(),
                completed_count: 0,
                overflow: 0,
            },
        };
        info!(
            "event=widget_render module=widget status=ok list_id={} rows={} overflow={}",
            snapshot.list_id,
            snapshot.rows.len(),
            snapshot.overflow
        );
        Ok(snapshot)
    }

    /// Flips completion of the task at `index` in the current list.
    pub fn toggle_at(&self, index: usize) -> WidgetResult<WidgetActionOutcome> {
        self.apply_at(index, |list, index| {
            let task = &mut list.tasks[index];
            let completed = task.toggle();
            WidgetActionOutcome::Toggled {
                task_id: task.id.clone(),
                completed,
            }
        })
    }

    /// Deletes the task at `index` in the current list.
    pub fn delete_at(&self, index: usize) -> WidgetResult<WidgetActionOutcome> {
        self.apply_at(index, |list, index| WidgetActionOutcome::Deleted {
            task_id: list.tasks.remove(index).id,
        })
    }

    fn apply_at(
        &self,
        index: usize,
        action: impl FnOnce(&mut TaskList, usize) -> WidgetActionOutcome,
    ) -> WidgetResult<WidgetActionOutcome> {
        let (mut lists, current_id) = self.read_state()?;
        let Some(list_index) = resolve_list(&lists, &current_id) else {
            return Ok(WidgetActionOutcome::OutOfRange { index, len: 0 });
        };

        let list = &mut lists[list_index];
        let len = list.tasks.len();
        if index >= len {
            warn!(
                "event=widget_action module=widget status=skip reason=out_of_range index={} len={}",
                index, len
            );
            return Ok(WidgetActionOutcome::OutOfRange { index, len });
        }

        let outcome = action(list, index);
        let encoded = encode_lists(&lists)?;
        self.repo.put_value(KEY_TASK_LISTS, &encoded)?;
        info!(
            "event=widget_action module=widget status=ok index={} outcome={:?}",
            index, outcome
        );
        Ok(outcome)
    }

    /// Reads the blob and the current-list pointer. Lists are empty only
    /// when nothing was ever stored or nothing decodes.
    fn read_state(&self) -> WidgetResult<(Vec<TaskList>, ListId)> {
        let raw = self.repo.get_value(KEY_TASK_LISTS)?;
        let decoded = load_or_default(raw.as_deref());
        let lists = if decoded.synthesized {
            Vec::new()
        } else {
            decoded.lists
        };
        let current_id = self
            .repo
            .get_value(KEY_CURRENT_LIST)?
            .unwrap_or_else(|| DEFAULT_LIST_ID.to_string());
        Ok((lists, current_id))
    }
}

/// Current list by id, falling back to the first list.
fn resolve_list(lists: &[TaskList], current_id: &str) -> Option<usize> {
    if lists.is_empty() {
        return None;
    }
    Some(
        lists
            .iter()
            .position(|list| list.id == current_id)
            .unwrap_or(0),
    )
}

fn snapshot_of(list: &TaskList, now_ms: i64) -> WidgetSnapshot {
    let rows = list
        .tasks
        .iter()
        .take(WIDGET_TASK_CAP)
        .enumerate()
        .map(|(index, task)| WidgetRow {
            index,
            task_id: task.id.clone(),
            text: task.text.clone(),
            completed: task.completed,
            due_badge: task.due_date.and_then(|due| due_badge(due, now_ms)),
        })
        .collect::<Vec<_>>();
    let completed_count = rows.iter().filter(|row| row.completed).count();

    WidgetSnapshot {
        list_id: list.id.clone(),
        list_name: list.name.clone(),
        title: format!("{} ({}/{})", list.name, completed_count, rows.len()),
        completed_count,
        overflow: list.tasks.len().saturating_sub(rows.len()),
        rows,
    }
}

/// Countdown label for a due date, or `None` once it has passed.
///
/// Weeks from seven days up, then days, hours, minutes, and `Now` for the
/// final minute.
pub fn due_badge(due_ms: i64, now_ms: i64) -> Option<String> {
    if due_ms <= now_ms {
        return None;
    }
    let left = due_ms - now_ms;
    let days = left / DAY_MS;
    let hours = left / HOUR_MS;
    let minutes = (left % HOUR_MS) / MINUTE_MS;

    let badge = if days >= 7 {
        format!("{}w", days / 7)
    } else if days >= 1 {
        format!("{days}d")
    } else if hours >= 1 {
        format!("{hours}h")
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        "Now".to_string()
    };
    Some(badge)
}

#[cfg(test)]
mod tests {
    use super::{due_badge, DAY_MS, HOUR_MS, MINUTE_MS};

    #[test]
    fn due_badge_picks_the_coarsest_unit() {
        let now = 1_700_000_000_000;
        assert_eq!(due_badge(now + 15 * DAY_MS, now).as_deref(), Some("2w"));
        assert_eq!(due_badge(now + 3 * DAY_MS, now).as_deref(), Some("3d"));
        assert_eq!(due_badge(now + 5 * HOUR_MS, now).as_deref(), Some("5h"));
        assert_eq!(due_badge(now + 42 * MINUTE_MS, now).as_deref(), Some("42m"));
        assert_eq!(due_badge(now + 30_000, now).as_deref(), Some("Now"));
    }

    #[test]
    fn past_due_dates_have_no_badge() {
        let now = 1_700_000_000_000;
        assert_eq!(due_badge(now, now), None);
        assert_eq!(due_badge(now - DAY_MS, now), None);
    }
}
