//! Mutation events: cancellable pre-update, informational post-update,
//! interaction clicks, and array resizes.

use crate::error::{CoreError, Result};
use crate::reason::{CauseId, UpdateReason};
use crate::stack::Stack;

/// Fired before a mutation commits. Listeners may cancel the mutation or
/// overwrite the proposed stack; the store commits whatever the event holds
/// once every listener has run.
#[derive(Debug, Clone)]
pub struct PreUpdateEvent {
    slot: usize,
    cause: CauseId,
    previous: Option<Stack>,
    new: Option<Stack>,
    cancelled: bool,
}

impl PreUpdateEvent {
    /// Constructs the event from a full update reason. The suppressed
    /// sentinel is rejected: suppressed mutations bypass events entirely.
    pub fn new(
        reason: UpdateReason,
        slot: usize,
        previous: Option<Stack>,
        new: Option<Stack>,
    ) -> Result<Self> {
        match reason.cause() {
            Some(cause) => Ok(Self::with_cause(cause, slot, previous, new)),
            None => Err(CoreError::SuppressedReason),
        }
    }

    /// Constructs the event from a causation token, which is non-suppressed
    /// by construction.
    pub fn with_cause(
        cause: CauseId,
        slot: usize,
        previous: Option<Stack>,
        new: Option<Stack>,
    ) -> Self {
        Self {
            slot,
            cause,
            previous,
            new,
            cancelled: false,
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn cause(&self) -> CauseId {
        self.cause
    }

    pub fn previous_stack(&self) -> Option<&Stack> {
        self.previous.as_ref()
    }

    /// The stack that will be committed unless the event is cancelled.
    pub fn new_stack(&self) -> Option<&Stack> {
        self.new.as_ref()
    }

    /// Overwrites the stack to commit.
    pub fn set_new_stack(&mut self, stack: Option<Stack>) {
        self.new = stack;
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn previous_quantity(&self) -> u32 {
        self.previous.as_ref().map_or(0, |s| s.quantity())
    }

    pub fn new_quantity(&self) -> u32 {
        self.new.as_ref().map_or(0, |s| s.quantity())
    }

    /// Signed quantity change this event describes, after any listener edits.
    pub fn quantity_delta(&self) -> i64 {
        self.new_quantity() as i64 - self.previous_quantity() as i64
    }

    /// Whether units of a similar stack are being added to the slot.
    pub fn is_add(&self) -> bool {
        match (&self.previous, &self.new) {
            (None, Some(_)) => true,
            (Some(p), Some(n)) => p.is_similar(n) && n.quantity() > p.quantity(),
            _ => false,
        }
    }

    /// Whether units are being removed from the slot.
    pub fn is_remove(&self) -> bool {
        match (&self.previous, &self.new) {
            (Some(_), None) => true,
            (Some(p), Some(n)) => p.is_similar(n) && n.quantity() < p.quantity(),
            _ => false,
        }
    }

    /// Whether the slot content is being exchanged for a dissimilar stack.
    pub fn is_swap(&self) -> bool {
        match (&self.previous, &self.new) {
            (Some(p), Some(n)) => !p.is_similar(n),
            _ => false,
        }
    }

    pub fn into_new_stack(self) -> Option<Stack> {
        self.new
    }
}

/// Fired after a mutation has committed. Purely informational.
#[derive(Debug, Clone)]
pub struct PostUpdateEvent {
    slot: usize,
    cause: CauseId,
    previous: Option<Stack>,
    new: Option<Stack>,
}

impl PostUpdateEvent {
    /// Constructs the event from a full update reason, rejecting the
    /// suppressed sentinel.
    pub fn new(
        reason: UpdateReason,
        slot: usize,
        previous: Option<Stack>,
        new: Option<Stack>,
    ) -> Result<Self> {
        match reason.cause() {
            Some(cause) => Ok(Self::with_cause(cause, slot, previous, new)),
            None => Err(CoreError::SuppressedReason),
        }
    }

    pub fn with_cause(
        cause: CauseId,
        slot: usize,
        previous: Option<Stack>,
        new: Option<Stack>,
    ) -> Self {
        Self {
            slot,
            cause,
            previous,
            new,
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn cause(&self) -> CauseId {
        self.cause
    }

    pub fn previous_stack(&self) -> Option<&Stack> {
        self.previous.as_ref()
    }

    pub fn new_stack(&self) -> Option<&Stack> {
        self.new.as_ref()
    }

    pub fn previous_quantity(&self) -> u32 {
        self.previous.as_ref().map_or(0, |s| s.quantity())
    }

    pub fn new_quantity(&self) -> u32 {
        self.new.as_ref().map_or(0, |s| s.quantity())
    }

    pub fn quantity_delta(&self) -> i64 {
        self.new_quantity() as i64 - self.previous_quantity() as i64
    }
}

/// Opaque descriptor of an external interaction gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interaction(pub u64);

/// Fired when an external surface reports an interaction with a slot.
/// Listeners may cancel the interaction before it turns into a mutation.
#[derive(Debug, Clone)]
pub struct ClickEvent {
    slot: usize,
    interaction: Interaction,
    cancelled: bool,
}

impl ClickEvent {
    pub fn new(slot: usize, interaction: Interaction) -> Self {
        Self {
            slot,
            interaction,
            cancelled: false,
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Fired after an array-backed store has been resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeEvent {
    pub old_size: usize,
    pub new_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::stack::ResourceId;

    fn stack(tag: u8, quantity: u32) -> Stack {
        Stack::new(ResourceId::from_bytes([tag; 16]), quantity).unwrap()
    }

    #[test]
    fn test_suppressed_reason_rejected() {
        let err = PreUpdateEvent::new(UpdateReason::Suppressed, 0, None, Some(stack(1, 1)));
        assert!(matches!(err, Err(CoreError::SuppressedReason)));
        let err = PostUpdateEvent::new(UpdateReason::Suppressed, 0, None, Some(stack(1, 1)));
        assert!(matches!(err, Err(CoreError::SuppressedReason)));
    }

    #[test]
    fn test_pre_update_edit_and_cancel() {
        let mut event =
            PreUpdateEvent::new(UpdateReason::caused(1), 2, None, Some(stack(1, 10))).unwrap();
        assert_eq!(event.slot(), 2);
        assert!(!event.is_cancelled());
        event.set_new_stack(Some(stack(1, 4)));
        assert_eq!(event.new_stack().unwrap().quantity(), 4);
        event.cancel();
        assert!(event.is_cancelled());
    }

    #[test]
    fn test_delta_classification() {
        let add = PreUpdateEvent::with_cause(CauseId(0), 0, Some(stack(1, 2)), Some(stack(1, 5)));
        assert!(add.is_add() && !add.is_remove() && !add.is_swap());
        assert_eq!(add.quantity_delta(), 3);

        let remove = PreUpdateEvent::with_cause(CauseId(0), 0, Some(stack(1, 5)), None);
        assert!(remove.is_remove());
        assert_eq!(remove.quantity_delta(), -5);

        let swap = PreUpdateEvent::with_cause(CauseId(0), 0, Some(stack(1, 5)), Some(stack(2, 5)));
        assert!(swap.is_swap() && !swap.is_add() && !swap.is_remove());
    }

    #[test]
    fn test_click_event_cancel() {
        let mut click = ClickEvent::new(3, Interaction(9));
        assert!(!click.is_cancelled());
        click.cancel();
        assert!(click.is_cancelled());
        assert_eq!(click.interaction(), Interaction(9));
    }
}
