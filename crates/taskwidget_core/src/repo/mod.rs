//! Repository layer over the shared key-value store.
//!
//! # Responsibility
//! - Define the get/put contract both surfaces use for persisted state.
//! - Keep SQL details out of board and widget services.
//!
//! # Invariants
//! - A write replaces the stored value for its key wholesale.

pub mod prefs_repo;
