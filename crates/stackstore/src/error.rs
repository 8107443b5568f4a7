//! Error types for store construction, configuration, and persistence.

use thiserror::Error;

/// Errors raised by store construction, configuration, and persistence.
///
/// The mutation algorithms themselves do not error: rejections surface as
/// `false`/leftover return values, and out-of-bounds slot access panics like
/// slice indexing does.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A store's declared size disagrees with a supplied array length.
    #[error("store size {expected} does not match array of length {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// A composite store was constructed over zero sub-stores.
    #[error("composite store requires at least one sub-store")]
    EmptyComposite,

    /// A proposed iteration order is not a permutation of the slot indices.
    #[error("iteration order of length {len} is not a permutation of 0..{size}")]
    NotAPermutation { len: usize, size: usize },

    /// Configuration or listener registration was attempted on a store that
    /// does not own that concern: views delegate it to their backing
    /// store(s), and delegating stores fix their capacities.
    #[error("{0} does not own this configuration")]
    DelegatedConfiguration(&'static str),

    /// A quantity adjustment targeted an empty slot.
    #[error("no stack on slot {0}")]
    EmptySlot(usize),

    /// A configuration call addressed a slot past the end of the store.
    #[error("slot {slot} out of bounds for store of size {size}")]
    SlotOutOfBounds { slot: usize, size: usize },

    /// Persisted data declares a format version this build does not read.
    #[error("unsupported persistence format version {0}")]
    UnsupportedVersion(u8),

    /// Persisted data ended before the declared structure was complete.
    #[error("persisted store data is truncated")]
    Truncated,

    /// A stack payload failed to encode.
    #[error("failed to encode stack payload: {0}")]
    Encode(String),

    /// A stack payload failed to decode.
    #[error("failed to decode stack payload: {0}")]
    Decode(String),

    /// A core value construction failed.
    #[error(transparent)]
    Core(#[from] stackstore_core::CoreError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
