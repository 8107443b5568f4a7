//! Update reasons: causation tokens threaded through every mutation.

use serde::{Deserialize, Serialize};

/// Opaque causation token attached to a non-suppressed mutation. The engine
/// never interprets it; listeners use it to attribute changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CauseId(pub u64);

/// The reason attached to a mutating store operation.
///
/// `Suppressed` is a reserved sentinel: the mutation commits directly without
/// firing update events. It is accepted by every mutating operation but must
/// never reach event construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateReason {
    /// Commit without firing update events.
    Suppressed,
    /// An attributed mutation.
    Caused(CauseId),
}

impl UpdateReason {
    pub fn caused(raw: u64) -> Self {
        UpdateReason::Caused(CauseId(raw))
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, UpdateReason::Suppressed)
    }

    /// The causation token, unless suppressed.
    pub fn cause(&self) -> Option<CauseId> {
        match self {
            UpdateReason::Suppressed => None,
            UpdateReason::Caused(cause) => Some(*cause),
        }
    }
}
