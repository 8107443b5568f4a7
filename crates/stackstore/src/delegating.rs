//! The delegating backend: a store facade over an externally owned,
//! array-like resource.
//!
//! Contents live in the external resource and are reached through three
//! injected functions; the facade itself only adds the shared algorithms,
//! listeners, observers, and an iteration order. Every slot reports one
//! fixed capacity because the external resource's own limits are opaque
//! here. Propagating a write beyond the injected setter is the external
//! owner's concern.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use stackstore_core::{CauseId, Interaction, PreUpdateEvent, Stack};

use crate::error::{Result, StoreError};
use crate::listener::{
    ClickListener, EventHub, ListenerId, PostUpdateListener, PreUpdateListener,
};
use crate::observer::{Observer, ObserverRegistry};
use crate::store::{sealed, validate_iteration_order, Store};

/// Capacity reported for every slot of a delegating store.
pub const DELEGATED_SLOT_CAP: u32 = 64;

/// Reads the full contents of the external resource, indexed by slot.
pub type BulkGetter<E> = Box<dyn Fn(&E) -> Vec<Option<Stack>>>;
/// Reads one slot of the external resource.
pub type SlotGetter<E> = Box<dyn Fn(&E, usize) -> Option<Stack>>;
/// Writes one slot of the external resource.
pub type SlotSetter<E> = Box<dyn FnMut(&mut E, usize, Option<Stack>)>;

/// A store adapting an external resource `E` through injected accessors.
pub struct DelegatingStore<E> {
    external: E,
    bulk_getter: BulkGetter<E>,
    slot_getter: SlotGetter<E>,
    slot_setter: SlotSetter<E>,
    size: usize,
    order: Vec<usize>,
    hub: EventHub,
    observers: ObserverRegistry,
}

impl<E> DelegatingStore<E> {
    /// Builds the facade. The slot count is fixed at construction from one
    /// bulk read of `external`.
    pub fn new(
        external: E,
        bulk_getter: BulkGetter<E>,
        slot_getter: SlotGetter<E>,
        slot_setter: SlotSetter<E>,
    ) -> Self {
        let size = bulk_getter(&external).len();
        Self {
            external,
            bulk_getter,
            slot_getter,
            slot_setter,
            size,
            order: (0..size).collect(),
            hub: EventHub::new(),
            observers: ObserverRegistry::new(size),
        }
    }

    pub fn external(&self) -> &E {
        &self.external
    }

    pub fn external_mut(&mut self) -> &mut E {
        &mut self.external
    }

    pub fn into_external(self) -> E {
        self.external
    }
}

impl<E> fmt::Debug for DelegatingStore<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatingStore")
            .field("size", &self.size)
            .finish()
    }
}

impl<E> sealed::Sealed for DelegatingStore<E> {}

impl<E> Store for DelegatingStore<E> {
    fn size(&self) -> usize {
        self.size
    }

    fn max_slot_quantity(&self, _slot: usize) -> u32 {
        DELEGATED_SLOT_CAP
    }

    fn max_quantities(&self) -> Vec<u32> {
        vec![DELEGATED_SLOT_CAP; self.size]
    }

    fn get(&self, slot: usize) -> Option<Stack> {
        (self.slot_getter)(&self.external, slot)
    }

    fn get_live(&self, slot: usize) -> Option<Cow<'_, Stack>> {
        // The getter materializes a value; there is no borrowable backing
        // array on this side of the boundary.
        (self.slot_getter)(&self.external, slot).map(Cow::Owned)
    }

    fn snapshot(&self) -> Vec<Option<Stack>> {
        (self.bulk_getter)(&self.external)
    }

    fn set_direct(&mut self, slot: usize, stack: Option<Stack>) {
        (self.slot_setter)(&mut self.external, slot, stack);
    }

    fn iteration_order(&self) -> Cow<'_, [usize]> {
        Cow::Borrowed(&self.order)
    }

    fn set_iteration_order(&mut self, order: Vec<usize>) -> Result<()> {
        validate_iteration_order(&order, self.size)?;
        self.order = order;
        Ok(())
    }

    fn set_max_slot_quantity(&mut self, _slot: usize, _cap: u32) -> Result<()> {
        Err(StoreError::DelegatedConfiguration("delegating store"))
    }

    fn set_max_quantities(&mut self, _caps: Vec<u32>) -> Result<()> {
        Err(StoreError::DelegatedConfiguration("delegating store"))
    }

    fn add_observer(&self, slot: usize, observer: Arc<dyn Observer>, context: u64) {
        self.observers.add(slot, observer, context);
    }

    fn remove_observer(&self, slot: usize, observer: &Arc<dyn Observer>, context: u64) {
        self.observers.remove(slot, observer, context);
    }

    fn notify_slot(&self, slot: usize) {
        self.observers.notify_slot(slot);
    }

    fn notify_all(&self) {
        self.observers.notify_all();
    }

    fn add_pre_update_listener(&mut self, listener: PreUpdateListener) -> Result<ListenerId> {
        Ok(self.hub.subscribe_pre_update(listener))
    }

    fn remove_pre_update_listener(&mut self, id: ListenerId) -> Result<bool> {
        Ok(self.hub.unsubscribe_pre_update(id))
    }

    fn add_post_update_listener(&mut self, listener: PostUpdateListener) -> Result<ListenerId> {
        Ok(self.hub.subscribe_post_update(listener))
    }

    fn remove_post_update_listener(&mut self, id: ListenerId) -> Result<bool> {
        Ok(self.hub.unsubscribe_post_update(id))
    }

    fn add_click_listener(&mut self, listener: ClickListener) -> Result<ListenerId> {
        Ok(self.hub.subscribe_click(listener))
    }

    fn remove_click_listener(&mut self, id: ListenerId) -> Result<bool> {
        Ok(self.hub.unsubscribe_click(id))
    }

    fn has_update_listeners(&self) -> bool {
        self.hub.has_update_listeners()
    }

    fn call_pre_update(
        &self,
        cause: CauseId,
        slot: usize,
        previous: Option<Stack>,
        new: Option<Stack>,
    ) -> PreUpdateEvent {
        self.hub.call_pre_update(cause, slot, previous, new)
    }

    fn call_post_update(
        &self,
        cause: CauseId,
        slot: usize,
        previous: Option<Stack>,
        new: Option<Stack>,
    ) {
        self.hub.call_post_update(cause, slot, previous, new)
    }

    fn call_click(&self, slot: usize, interaction: Interaction) -> bool {
        self.hub.call_click(slot, interaction)
    }
}
