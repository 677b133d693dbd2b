//! Task/list domain model shared by the board and the widget surface.
//!
//! # Responsibility
//! - Define the canonical list/task tree that is persisted as one JSON blob.
//! - Provide small lookup and mutation helpers used by services.
//!
//! # Invariants
//! - List names are unique (case-insensitive) among all lists.
//! - Subtasks nest exactly one level under a top-level task of the same list.
//! - Timestamps are Unix epoch milliseconds.

pub mod task;
pub mod task_list;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current wall-clock time as Unix epoch milliseconds.
///
/// Falls back to `0` if the system clock is set before the epoch.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Reads any JSON value and keeps it only if it has the expected type.
///
/// Optional fields go through this so a wrong-typed value falls back to the
/// field default instead of failing the whole entry.
pub(crate) fn lenient_option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// Epoch timestamp that substitutes "now" for `null` or a non-integer.
pub(crate) fn epoch_ms_or_now<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_option::<D, i64>(deserializer)?.unwrap_or_else(now_epoch_ms))
}

pub(crate) fn new_entity_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
