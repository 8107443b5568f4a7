//! Deterministic fixtures for hand-written tests.

use stackstore::{ArrayStore, Store};
use stackstore_core::{ResourceId, Stack, StoreId, UpdateReason};

/// A resource identifier filled with `tag`.
pub fn resource(tag: u8) -> ResourceId {
    ResourceId::from_bytes([tag; 16])
}

/// A stack of `quantity` units of [`resource`]`(tag)` with default ceiling.
pub fn stack(tag: u8, quantity: u32) -> Stack {
    Stack::new(resource(tag), quantity).expect("fixture quantity is positive")
}

/// A store identifier filled with `tag`.
pub fn store_id(tag: u8) -> StoreId {
    StoreId::from_bytes([tag; 16])
}

/// A caused update reason for tests that do not care about attribution.
pub fn reason() -> UpdateReason {
    UpdateReason::caused(0xCA05E)
}

/// An array store populated slot-by-slot from `contents`, where `0` marks an
/// empty slot and `(tag, quantity)` otherwise.
pub fn populated(contents: &[Option<(u8, u32)>]) -> ArrayStore {
    let mut store = ArrayStore::new(contents.len());
    for (slot, entry) in contents.iter().enumerate() {
        if let Some((tag, quantity)) = entry {
            store.set_silently(slot, Some(stack(*tag, *quantity)));
        }
    }
    store
}
