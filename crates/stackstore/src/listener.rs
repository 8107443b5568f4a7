//! Listener lists with stable registration handles and per-listener fault
//! isolation.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use stackstore_core::{CauseId, ClickEvent, Interaction, PostUpdateEvent, PreUpdateEvent, Stack};

/// Handle identifying one registered listener. Handles are unique per
/// listener list and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A boxed pre-update listener.
pub type PreUpdateListener = Box<dyn Fn(&mut PreUpdateEvent)>;
/// A boxed post-update listener.
pub type PostUpdateListener = Box<dyn Fn(&mut PostUpdateEvent)>;
/// A boxed click listener.
pub type ClickListener = Box<dyn Fn(&mut ClickEvent)>;

/// An ordered listener list for one event type.
///
/// Listeners run in registration order. A panicking listener is isolated:
/// the panic is caught, logged, and the remaining listeners still run with
/// the event state left by the faulty one.
pub struct Listeners<E> {
    entries: Vec<(ListenerId, Box<dyn Fn(&mut E)>)>,
    next: u64,
}

impl<E> Listeners<E> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Registers a listener and returns its removal handle.
    pub fn subscribe(&mut self, listener: Box<dyn Fn(&mut E)>) -> ListenerId {
        let id = ListenerId(self.next);
        self.next += 1;
        self.entries.push((id, listener));
        id
    }

    /// Removes the listener behind `id`. Returns whether it was present.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Runs every listener against `event`, isolating panics.
    pub fn dispatch(&self, event: &mut E) {
        for (id, listener) in &self.entries {
            let outcome = catch_unwind(AssertUnwindSafe(|| listener(event)));
            if outcome.is_err() {
                tracing::error!(listener = id.0, "listener panicked while handling store event");
            }
        }
    }
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.entries.len())
            .finish()
    }
}

/// The three listener lists an event-owning store carries, plus the event
/// construction and dispatch that every such store shares.
#[derive(Debug, Default)]
pub struct EventHub {
    pre_update: Listeners<PreUpdateEvent>,
    post_update: Listeners<PostUpdateEvent>,
    click: Listeners<ClickEvent>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe_pre_update(&mut self, listener: PreUpdateListener) -> ListenerId {
        self.pre_update.subscribe(listener)
    }

    pub fn unsubscribe_pre_update(&mut self, id: ListenerId) -> bool {
        self.pre_update.unsubscribe(id)
    }

    pub fn subscribe_post_update(&mut self, listener: PostUpdateListener) -> ListenerId {
        self.post_update.subscribe(listener)
    }

    pub fn unsubscribe_post_update(&mut self, id: ListenerId) -> bool {
        self.post_update.unsubscribe(id)
    }

    pub fn subscribe_click(&mut self, listener: ClickListener) -> ListenerId {
        self.click.subscribe(listener)
    }

    pub fn unsubscribe_click(&mut self, id: ListenerId) -> bool {
        self.click.unsubscribe(id)
    }

    /// Whether any pre- or post-update listener is registered. Click
    /// listeners do not count: they gate interactions, not mutations.
    pub fn has_update_listeners(&self) -> bool {
        !self.pre_update.is_empty() || !self.post_update.is_empty()
    }

    /// Builds a pre-update event and runs it through the listeners.
    pub fn call_pre_update(
        &self,
        cause: CauseId,
        slot: usize,
        previous: Option<Stack>,
        new: Option<Stack>,
    ) -> PreUpdateEvent {
        let mut event = PreUpdateEvent::with_cause(cause, slot, previous, new);
        self.pre_update.dispatch(&mut event);
        event
    }

    /// Builds a post-update event and runs it through the listeners.
    pub fn call_post_update(
        &self,
        cause: CauseId,
        slot: usize,
        previous: Option<Stack>,
        new: Option<Stack>,
    ) {
        let mut event = PostUpdateEvent::with_cause(cause, slot, previous, new);
        self.post_update.dispatch(&mut event);
    }

    /// Builds a click event, runs the listeners, and reports whether the
    /// interaction was cancelled.
    pub fn call_click(&self, slot: usize, interaction: Interaction) -> bool {
        let mut event = ClickEvent::new(slot, interaction);
        self.click.dispatch(&mut event);
        event.is_cancelled()
    }
}
