//! Core domain logic for the task widget app.
//! Both the companion app and the home-screen widget go through this crate
//! to read and rewrite the shared task store.

pub mod blob;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use blob::{decode_lists, encode_lists, load_or_default, DecodedLists};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::now_epoch_ms;
pub use model::task::{Task, TaskId};
pub use model::task_list::{
    ListId, ListProgress, TaskList, DEFAULT_LIST_COLOR, DEFAULT_LIST_ID, DEFAULT_LIST_NAME,
};
pub use repo::prefs_repo::{
    PrefsRepository, RepoError, RepoResult, SqlitePrefsRepository, KEY_CURRENT_LIST,
    KEY_TASK_LISTS,
};
pub use service::board_service::{BoardError, BoardResult, BoardService};
pub use service::widget_service::{
    due_badge, WidgetActionOutcome, WidgetError, WidgetResult, WidgetRow, WidgetService,
    WidgetSnapshot, WIDGET_TASK_CAP,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
