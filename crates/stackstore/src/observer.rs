//! Observers: payload-free change signals for external display surfaces.
//!
//! Unlike update listeners, observers never see stack contents. They receive
//! a bare "slot changed" signal and are expected to re-query the store. The
//! registry is lock-guarded so surfaces on other threads can attach and
//! detach while the owning thread mutates content.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

/// A change observer. Implementations re-query the store when poked.
pub trait Observer: Send + Sync {
    /// Called after a slot the observer is bound to has changed. `context` is
    /// the token supplied at registration, typically the observer's own slot
    /// index in its display surface.
    fn slot_changed(&self, context: u64);
}

/// One registration: an observer plus its context token. The same observer
/// may be bound to the same slot under different contexts.
struct Binding {
    observer: Arc<dyn Observer>,
    context: u64,
}

impl Binding {
    fn key(&self) -> (usize, u64) {
        (Arc::as_ptr(&self.observer).cast::<()>() as usize, self.context)
    }
}

impl PartialEq for Binding {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Binding {}

impl std::hash::Hash for Binding {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// Per-slot observer bindings behind a single lock.
///
/// Registration, removal, and notification all take the lock, so concurrent
/// attach/detach from display threads is safe even though store contents are
/// confined to one mutation thread.
pub struct ObserverRegistry {
    slots: Mutex<Vec<HashSet<Binding>>>,
}

impl ObserverRegistry {
    pub fn new(size: usize) -> Self {
        let mut slots = Vec::with_capacity(size);
        slots.resize_with(size, HashSet::new);
        Self {
            slots: Mutex::new(slots),
        }
    }

    /// Grows or shrinks the registry alongside its store. Bindings on
    /// truncated slots are dropped.
    pub fn resize(&self, size: usize) {
        let mut slots = self.slots.lock().unwrap();
        slots.resize_with(size, HashSet::new);
    }

    /// Binds `observer` to `slot` under `context`. Returns whether the
    /// binding was new.
    pub fn add(&self, slot: usize, observer: Arc<dyn Observer>, context: u64) -> bool {
        let mut slots = self.slots.lock().unwrap();
        slots[slot].insert(Binding { observer, context })
    }

    /// Removes the binding identified by observer identity and context.
    /// Returns whether it was present.
    pub fn remove(&self, slot: usize, observer: &Arc<dyn Observer>, context: u64) -> bool {
        let mut slots = self.slots.lock().unwrap();
        slots[slot].remove(&Binding {
            observer: Arc::clone(observer),
            context,
        })
    }

    /// Pokes every observer bound to `slot`.
    pub fn notify_slot(&self, slot: usize) {
        let slots = self.slots.lock().unwrap();
        if let Some(bindings) = slots.get(slot) {
            for binding in bindings {
                binding.observer.slot_changed(binding.context);
            }
        }
    }

    /// Pokes every observer on every slot.
    pub fn notify_all(&self) {
        let slots = self.slots.lock().unwrap();
        for bindings in slots.iter() {
            for binding in bindings {
                binding.observer.slot_changed(binding.context);
            }
        }
    }

    /// Number of bindings on `slot`.
    pub fn binding_count(&self, slot: usize) -> usize {
        self.slots.lock().unwrap()[slot].len()
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.lock().unwrap();
        f.debug_struct("ObserverRegistry")
            .field("slots", &slots.len())
            .finish()
    }
}
