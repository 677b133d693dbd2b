//! Flutter-facing bindings for the task widget core.

pub mod api;
