//! The filtered backend: a view over another store with some slots hidden.
//!
//! Exposed slots keep the relative order of the visible backing slots. The
//! view holds no state of its own beyond the index maps; contents, events,
//! capacities, and observers all live in the backing store, so configuration
//! on the view is an error.

use std::borrow::Cow;
use std::sync::Arc;

use stackstore_core::{CauseId, Interaction, PreUpdateEvent, Stack};

use crate::error::{Result, StoreError};
use crate::listener::{ClickListener, ListenerId, PostUpdateListener, PreUpdateListener};
use crate::observer::Observer;
use crate::store::{sealed, Store};

/// A store hiding a subset of another store's slots.
pub struct FilteredStore {
    backing: Box<dyn Store>,
    /// exposed slot -> backing slot
    forward: Vec<usize>,
    /// backing slot -> exposed slot, if visible
    inverse: Vec<Option<usize>>,
}

impl FilteredStore {
    /// Builds a view over `backing` hiding every slot for which `hide`
    /// returns true.
    pub fn new(backing: Box<dyn Store>, hide: impl Fn(usize) -> bool) -> Self {
        let forward: Vec<usize> = (0..backing.size()).filter(|&slot| !hide(slot)).collect();
        let mut inverse = vec![None; backing.size()];
        for (exposed, &backing_slot) in forward.iter().enumerate() {
            inverse[backing_slot] = Some(exposed);
        }
        Self {
            backing,
            forward,
            inverse,
        }
    }

    pub fn backing(&self) -> &dyn Store {
        self.backing.as_ref()
    }

    pub fn backing_mut(&mut self) -> &mut (dyn Store + 'static) {
        self.backing.as_mut()
    }

    pub fn into_backing(self) -> Box<dyn Store> {
        self.backing
    }

    /// The backing slot behind an exposed slot.
    pub fn backing_slot(&self, slot: usize) -> usize {
        self.forward[slot]
    }
}

impl sealed::Sealed for FilteredStore {}

impl Store for FilteredStore {
    fn size(&self) -> usize {
        self.forward.len()
    }

    fn max_slot_quantity(&self, slot: usize) -> u32 {
        self.backing.max_slot_quantity(self.forward[slot])
    }

    fn max_quantities(&self) -> Vec<u32> {
        self.forward
            .iter()
            .map(|&slot| self.backing.max_slot_quantity(slot))
            .collect()
    }

    fn get(&self, slot: usize) -> Option<Stack> {
        self.backing.get(self.forward[slot])
    }

    fn get_live(&self, slot: usize) -> Option<Cow<'_, Stack>> {
        self.backing.get_live(self.forward[slot])
    }

    fn snapshot(&self) -> Vec<Option<Stack>> {
        self.forward
            .iter()
            .map(|&slot| self.backing.get(slot))
            .collect()
    }

    fn set_direct(&mut self, slot: usize, stack: Option<Stack>) {
        let backing_slot = self.forward[slot];
        self.backing.set_direct(backing_slot, stack);
    }

    /// The backing store's order, restricted to visible slots and remapped
    /// to view indices.
    fn iteration_order(&self) -> Cow<'_, [usize]> {
        let mut order = Vec::with_capacity(self.forward.len());
        for &backing_slot in self.backing.iteration_order().iter() {
            if let Some(exposed) = self.inverse.get(backing_slot).copied().flatten() {
                order.push(exposed);
            }
        }
        Cow::Owned(order)
    }

    fn set_iteration_order(&mut self, _order: Vec<usize>) -> Result<()> {
        Err(StoreError::DelegatedConfiguration("filtered store"))
    }

    fn set_max_slot_quantity(&mut self, _slot: usize, _cap: u32) -> Result<()> {
        Err(StoreError::DelegatedConfiguration("filtered store"))
    }

    fn set_max_quantities(&mut self, _caps: Vec<u32>) -> Result<()> {
        Err(StoreError::DelegatedConfiguration("filtered store"))
    }

    fn add_observer(&self, slot: usize, observer: Arc<dyn Observer>, context: u64) {
        self.backing.add_observer(self.forward[slot], observer, context);
    }

    fn remove_observer(&self, slot: usize, observer: &Arc<dyn Observer>, context: u64) {
        self.backing
            .remove_observer(self.forward[slot], observer, context);
    }

    fn notify_slot(&self, slot: usize) {
        self.backing.notify_slot(self.forward[slot]);
    }

    fn notify_all(&self) {
        self.backing.notify_all();
    }

    fn add_pre_update_listener(&mut self, _listener: PreUpdateListener) -> Result<ListenerId> {
        Err(StoreError::DelegatedConfiguration("filtered store"))
    }

    fn remove_pre_update_listener(&mut self, _id: ListenerId) -> Result<bool> {
        Err(StoreError::DelegatedConfiguration("filtered store"))
    }

    fn add_post_update_listener(&mut self, _listener: PostUpdateListener) -> Result<ListenerId> {
        Err(StoreError::DelegatedConfiguration("filtered store"))
    }

    fn remove_post_update_listener(&mut self, _id: ListenerId) -> Result<bool> {
        Err(StoreError::DelegatedConfiguration("filtered store"))
    }

    fn add_click_listener(&mut self, _listener: ClickListener) -> Result<ListenerId> {
        Err(StoreError::DelegatedConfiguration("filtered store"))
    }

    fn remove_click_listener(&mut self, _id: ListenerId) -> Result<bool> {
        Err(StoreError::DelegatedConfiguration("filtered store"))
    }

    fn has_update_listeners(&self) -> bool {
        self.backing.has_update_listeners()
    }

    fn call_pre_update(
        &self,
        cause: CauseId,
        slot: usize,
        previous: Option<Stack>,
        new: Option<Stack>,
    ) -> PreUpdateEvent {
        self.backing
            .call_pre_update(cause, self.forward[slot], previous, new)
    }

    fn call_post_update(
        &self,
        cause: CauseId,
        slot: usize,
        previous: Option<Stack>,
        new: Option<Stack>,
    ) {
        self.backing
            .call_post_update(cause, self.forward[slot], previous, new);
    }

    fn call_click(&self, slot: usize, interaction: Interaction) -> bool {
        self.backing.call_click(self.forward[slot], interaction)
    }
}
