//! JSON blob encoding for the whole list/task tree.
//!
//! # Responsibility
//! - Encode the full collection to one compact JSON array.
//! - Decode it back leniently, skipping malformed entries one by one.
//!
//! # Invariants
//! - Encoding always writes the entire collection (no incremental diff).
//! - Decoding never fails as a whole; the caller always gets at least one
//!   list from `load_or_default`.

mod codec;

pub use codec::{decode_lists, encode_lists, load_or_default, DecodedLists};
