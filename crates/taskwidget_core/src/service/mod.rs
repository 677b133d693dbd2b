//! Use-case services over the shared store.
//!
//! # Responsibility
//! - `board_service`: main-view model that owns the decoded collection and
//!   rewrites the blob after each mutation.
//! - `widget_service`: home-screen surface that reads independently and
//!   applies positional actions as read-modify-write cycles.
//!
//! # Invariants
//! - Neither service locks the store; the last writer wins.

pub mod board_service;
pub mod widget_service;
