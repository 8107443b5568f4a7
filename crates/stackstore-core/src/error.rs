//! Error types for core value construction.

use thiserror::Error;

/// Errors raised while constructing core values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A stack was constructed with quantity zero. Absence of a stack is
    /// modeled as `None`, never as a zero-quantity stack.
    #[error("stack quantity must be positive")]
    ZeroQuantity,

    /// A stack was given a per-type ceiling of zero.
    #[error("stack type ceiling must be positive")]
    ZeroTypeMax,

    /// An update event was constructed with the suppressed sentinel reason.
    #[error("update events cannot carry a suppressed reason")]
    SuppressedReason,

    /// An identifier could not be parsed from its hex form.
    #[error("invalid identifier hex: {0}")]
    InvalidHex(String),
}

/// Convenience alias for core construction results.
pub type Result<T> = std::result::Result<T, CoreError>;
