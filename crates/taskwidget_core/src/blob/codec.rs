//! Lenient JSON codec for persisted task lists.
//!
//! # Responsibility
//! - Serialize lists with explicit `null` optionals.
//! - Decode list, task, and subtask entries individually so one broken
//!   entry never takes the rest of the collection down.
//!
//! # Invariants
//! - `encode_lists(decode_lists(encode_lists(x)))` equals `encode_lists(x)`.
//! - Only a missing or wrong-typed required field (`id`, `name` for lists;
//!   `id`, `text`, `completed` for tasks) makes an entry malformed. Other
//!   fields fall back to their defaults.
//! - Lists with an empty name, or a name an earlier list already uses
//!   (case-insensitive), are treated as malformed.
//! - Decoded `parentTaskId` always names the enclosing task, or is `null`
//!   for top-level tasks.

use crate::model::task::Task;
use crate::model::task_list::TaskList;
use log::{error, warn};
use serde_json::Value;

/// Output of one decode pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedLists {
    pub lists: Vec<TaskList>,
    /// Number of list/task entries dropped as malformed.
    pub skipped: usize,
    /// Whether the default list was synthesized because nothing decoded.
    pub synthesized: bool,
}

/// Encodes the full collection as a compact JSON array.
///
/// # Errors
/// - Returns a serializer error only if a value cannot be represented in
///   JSON, which the model types never produce in practice.
pub fn encode_lists(lists: &[TaskList]) -> Result<String, serde_json::Error> {
    serde_json::to_string(lists)
}

/// Decodes a blob, skipping malformed entries.
///
/// Text that is not a JSON array yields an empty result and is logged as a
/// total decode failure.
pub fn decode_lists(raw: &str) -> DecodedLists {
    let entries = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(entries)) => entries,
        Ok(_) => {
            error!("event=blob_decode module=blob status=error error_code=not_an_array");
            return DecodedLists::default();
        }
        Err(err) => {
            error!(
                "event=blob_decode module=blob status=error error_code=invalid_json error={}",
                err
            );
            return DecodedLists::default();
        }
    };

    let mut decoded = DecodedLists::default();
    for (index, entry) in entries.into_iter().enumerate() {
        let result = decode_list(entry, &mut decoded.skipped).and_then(|list| {
            if decoded.lists.iter().any(|kept| kept.name_matches(&list.name)) {
                Err(format!("duplicate list name `{}`", list.name))
            } else {
                Ok(list)
            }
        });
        match result {
            Ok(list) => decoded.lists.push(list),
            Err(reason) => {
                decoded.skipped += 1;
                warn!(
                    "event=blob_decode module=blob status=skip entry=list index={} reason={}",
                    index, reason
                );
            }
        }
    }
    decoded
}

/// Decodes an optional blob and guarantees at least one list.
///
/// An absent blob, a total decode failure, and a blob with no valid list
/// all produce the single default list with `synthesized = true`.
pub fn load_or_default(raw: Option<&str>) -> DecodedLists {
    let mut decoded = raw.map(decode_lists).unwrap_or_default();
    if decoded.lists.is_empty() {
        decoded.lists.push(TaskList::default_list());
        decoded.synthesized = true;
    }
    decoded
}

fn decode_list(entry: Value, skipped: &mut usize) -> Result<TaskList, String> {
    let Value::Object(mut object) = entry else {
        return Err("entry is not an object".to_string());
    };
    let raw_tasks = take_array(&mut object, "tasks");

    let mut list: TaskList =
        serde_json::from_value(Value::Object(object)).map_err(|err| err.to_string())?;
    if list.name.is_empty() {
        return Err("list name is empty".to_string());
    }

    for (index, raw_task) in raw_tasks.into_iter().enumerate() {
        match decode_task(raw_task, None, skipped) {
            Ok(task) => list.tasks.push(task),
            Err(reason) => {
                *skipped += 1;
                warn!(
                    "event=blob_decode module=blob status=skip entry=task list_id={} index={} reason={}",
                    list.id, index, reason
                );
            }
        }
    }
    Ok(list)
}

/// Decodes one task; `parent_id` is the enclosing task for subtasks.
///
/// The stored `parentTaskId` is overwritten with the actual nesting so
/// board moves can rely on it.
fn decode_task(
    entry: Value,
    parent_id: Option<&str>,
    skipped: &mut usize,
) -> Result<Task, String> {
    let Value::Object(mut object) = entry else {
        return Err("entry is not an object".to_string());
    };
    let raw_subtasks = take_array(&mut object, "subtasks");

    let mut task: Task =
        serde_json::from_value(Value::Object(object)).map_err(|err| err.to_string())?;
    if task.parent_task_id.as_deref() != parent_id {
        warn!(
            "event=blob_decode module=blob status=repair entry=task task_id={} field=parentTaskId stored={} actual={}",
            task.id,
            task.parent_task_id.as_deref().unwrap_or("null"),
            parent_id.unwrap_or("null")
        );
        task.parent_task_id = parent_id.map(str::to_string);
    }
    for (index, raw_subtask) in raw_subtasks.into_iter().enumerate() {
        match decode_task(raw_subtask, Some(&task.id), skipped) {
            Ok(subtask) => task.subtasks.push(subtask),
            Err(reason) => {
                *skipped += 1;
                warn!(
                    "event=blob_decode module=blob status=skip entry=subtask task_id={} index={} reason={}",
                    task.id, index, reason
                );
            }
        }
    }
    Ok(task)
}

/// Removes an optional array field; absence, `null` and any non-array
/// value all mean empty.
fn take_array(object: &mut serde_json::Map<String, Value>, field: &str) -> Vec<Value> {
    match object.remove(field) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => {
            warn!(
                "event=blob_decode module=blob status=repair field={} reason=not_an_array",
                field
            );
            Vec::new()
        }
    }
}
