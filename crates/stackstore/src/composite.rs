//! The composite backend: several stores presented as one contiguous slot
//! space.
//!
//! Sub-stores keep their own listeners, capacities, and observers; the
//! composite only translates logical slots to (sub-store, local slot) pairs
//! and fans notifications out. It carries no configuration of its own, so
//! configuration and listener registration on the composite itself is an
//! error.

use std::borrow::Cow;
use std::sync::Arc;

use stackstore_core::{CauseId, Interaction, PreUpdateEvent, Stack};

use crate::error::{Result, StoreError};
use crate::listener::{ClickListener, ListenerId, PostUpdateListener, PreUpdateListener};
use crate::observer::Observer;
use crate::store::{sealed, Store};

/// A store concatenating the slot spaces of its sub-stores, in order.
pub struct CompositeStore {
    subs: Vec<Box<dyn Store>>,
}

impl CompositeStore {
    /// Builds a composite over `subs`. Errors when `subs` is empty.
    pub fn new(subs: Vec<Box<dyn Store>>) -> Result<Self> {
        if subs.is_empty() {
            return Err(StoreError::EmptyComposite);
        }
        Ok(Self { subs })
    }

    pub fn sub_stores(&self) -> &[Box<dyn Store>] {
        &self.subs
    }

    pub fn sub_store(&self, index: usize) -> Option<&dyn Store> {
        self.subs.get(index).map(|sub| sub.as_ref())
    }

    pub fn sub_store_mut(&mut self, index: usize) -> Option<&mut (dyn Store + 'static)> {
        self.subs.get_mut(index).map(|sub| sub.as_mut())
    }

    pub fn into_sub_stores(self) -> Vec<Box<dyn Store>> {
        self.subs
    }

    /// Translates a logical slot to (sub-store index, local slot) by walking
    /// the prefix sums of the sub sizes. Panics when `slot` is past the end,
    /// like slice indexing.
    fn locate(&self, slot: usize) -> (usize, usize) {
        let mut local = slot;
        for (index, sub) in self.subs.iter().enumerate() {
            let size = sub.size();
            if local < size {
                return (index, local);
            }
            local -= size;
        }
        panic!(
            "slot {slot} out of bounds for composite store of size {}",
            self.size()
        );
    }
}

impl sealed::Sealed for CompositeStore {}

impl Store for CompositeStore {
    fn size(&self) -> usize {
        self.subs.iter().map(|sub| sub.size()).sum()
    }

    fn max_slot_quantity(&self, slot: usize) -> u32 {
        let (index, local) = self.locate(slot);
        self.subs[index].max_slot_quantity(local)
    }

    fn max_quantities(&self) -> Vec<u32> {
        self.subs
            .iter()
            .flat_map(|sub| sub.max_quantities())
            .collect()
    }

    fn get(&self, slot: usize) -> Option<Stack> {
        let (index, local) = self.locate(slot);
        self.subs[index].get(local)
    }

    fn get_live(&self, slot: usize) -> Option<Cow<'_, Stack>> {
        let (index, local) = self.locate(slot);
        self.subs[index].get_live(local)
    }

    fn snapshot(&self) -> Vec<Option<Stack>> {
        self.subs.iter().flat_map(|sub| sub.snapshot()).collect()
    }

    fn set_direct(&mut self, slot: usize, stack: Option<Stack>) {
        let (index, local) = self.locate(slot);
        self.subs[index].set_direct(local, stack);
    }

    fn iteration_order(&self) -> Cow<'_, [usize]> {
        let mut order = Vec::with_capacity(self.size());
        let mut offset = 0;
        for sub in &self.subs {
            order.extend(sub.iteration_order().iter().map(|&slot| slot + offset));
            offset += sub.size();
        }
        Cow::Owned(order)
    }

    fn set_iteration_order(&mut self, _order: Vec<usize>) -> Result<()> {
        Err(StoreError::DelegatedConfiguration("composite store"))
    }

    fn set_max_slot_quantity(&mut self, _slot: usize, _cap: u32) -> Result<()> {
        Err(StoreError::DelegatedConfiguration("composite store"))
    }

    fn set_max_quantities(&mut self, _caps: Vec<u32>) -> Result<()> {
        Err(StoreError::DelegatedConfiguration("composite store"))
    }

    fn add_observer(&self, slot: usize, observer: Arc<dyn Observer>, context: u64) {
        let (index, local) = self.locate(slot);
        self.subs[index].add_observer(local, observer, context);
    }

    fn remove_observer(&self, slot: usize, observer: &Arc<dyn Observer>, context: u64) {
        let (index, local) = self.locate(slot);
        self.subs[index].remove_observer(local, observer, context);
    }

    fn notify_slot(&self, slot: usize) {
        let (index, local) = self.locate(slot);
        self.subs[index].notify_slot(local);
    }

    fn notify_all(&self) {
        for sub in &self.subs {
            sub.notify_all();
        }
    }

    fn add_pre_update_listener(&mut self, _listener: PreUpdateListener) -> Result<ListenerId> {
        Err(StoreError::DelegatedConfiguration("composite store"))
    }

    fn remove_pre_update_listener(&mut self, _id: ListenerId) -> Result<bool> {
        Err(StoreError::DelegatedConfiguration("composite store"))
    }

    fn add_post_update_listener(&mut self, _listener: PostUpdateListener) -> Result<ListenerId> {
        Err(StoreError::DelegatedConfiguration("composite store"))
    }

    fn remove_post_update_listener(&mut self, _id: ListenerId) -> Result<bool> {
        Err(StoreError::DelegatedConfiguration("composite store"))
    }

    fn add_click_listener(&mut self, _listener: ClickListener) -> Result<ListenerId> {
        Err(StoreError::DelegatedConfiguration("composite store"))
    }

    fn remove_click_listener(&mut self, _id: ListenerId) -> Result<bool> {
        Err(StoreError::DelegatedConfiguration("composite store"))
    }

    fn has_update_listeners(&self) -> bool {
        self.subs.iter().any(|sub| sub.has_update_listeners())
    }

    fn call_pre_update(
        &self,
        cause: CauseId,
        slot: usize,
        previous: Option<Stack>,
        new: Option<Stack>,
    ) -> PreUpdateEvent {
        let (index, local) = self.locate(slot);
        self.subs[index].call_pre_update(cause, local, previous, new)
    }

    fn call_post_update(
        &self,
        cause: CauseId,
        slot: usize,
        previous: Option<Stack>,
        new: Option<Stack>,
    ) {
        let (index, local) = self.locate(slot);
        self.subs[index].call_post_update(cause, local, previous, new);
    }

    fn call_click(&self, slot: usize, interaction: Interaction) -> bool {
        let (index, local) = self.locate(slot);
        self.subs[index].call_click(local, interaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::ArrayStore;
    use stackstore_core::{ResourceId, UpdateReason};

    fn stack(tag: u8, quantity: u32) -> Stack {
        Stack::new(ResourceId::from_bytes([tag; 16]), quantity).unwrap()
    }

    fn composite(sizes: &[usize]) -> CompositeStore {
        CompositeStore::new(
            sizes
                .iter()
                .map(|&size| Box::new(ArrayStore::new(size)) as Box<dyn Store>)
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_composite_rejected() {
        assert!(matches!(
            CompositeStore::new(Vec::new()),
            Err(StoreError::EmptyComposite)
        ));
    }

    #[test]
    fn test_slot_resolution() {
        let mut store = composite(&[2, 3]);
        // Logical slot 2 is the second sub-store's local slot 0.
        store.set_silently(2, Some(stack(1, 5)));
        assert_eq!(store.sub_store(1).unwrap().quantity_at(0), 5);
        assert_eq!(store.sub_store(0).unwrap().total_quantity(), 0);
        assert_eq!(store.quantity_at(2), 5);
        assert_eq!(store.size(), 5);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_out_of_bounds_slot_panics() {
        composite(&[2, 3]).get(5);
    }

    #[test]
    fn test_add_spills_across_sub_stores() {
        let mut store = composite(&[1, 2]);
        assert_eq!(store.add(UpdateReason::caused(1), stack(1, 100)), 0);
        assert_eq!(store.sub_store(0).unwrap().quantity_at(0), 64);
        assert_eq!(store.sub_store(1).unwrap().quantity_at(0), 36);
    }

    #[test]
    fn test_iteration_order_concatenates_with_offsets() {
        let mut first = ArrayStore::new(2);
        first.set_iteration_order(vec![1, 0]).unwrap();
        let store = CompositeStore::new(vec![
            Box::new(first) as Box<dyn Store>,
            Box::new(ArrayStore::new(2)) as Box<dyn Store>,
        ])
        .unwrap();
        assert_eq!(store.iteration_order().as_ref(), &[1, 0, 2, 3]);
    }

    #[test]
    fn test_configuration_is_delegated() {
        let mut store = composite(&[1]);
        assert!(matches!(
            store.set_iteration_order(vec![0]),
            Err(StoreError::DelegatedConfiguration(_))
        ));
        assert!(matches!(
            store.set_max_quantities(vec![1]),
            Err(StoreError::DelegatedConfiguration(_))
        ));
        assert!(matches!(
            store.add_pre_update_listener(Box::new(|_| {})),
            Err(StoreError::DelegatedConfiguration(_))
        ));
    }

    #[test]
    fn test_events_route_to_owning_sub_store() {
        let mut guarded = ArrayStore::new(1);
        guarded
            .add_pre_update_listener(Box::new(|event| event.cancel()))
            .unwrap();
        let mut store = CompositeStore::new(vec![
            Box::new(ArrayStore::new(1)) as Box<dyn Store>,
            Box::new(guarded) as Box<dyn Store>,
        ])
        .unwrap();

        let reason = UpdateReason::caused(1);
        assert!(store.set(reason, 0, Some(stack(1, 5))));
        assert!(!store.set(reason, 1, Some(stack(1, 5))));
        assert_eq!(store.quantity_at(0), 5);
        assert_eq!(store.quantity_at(1), 0);
    }

    #[test]
    fn test_into_sub_stores_returns_children_untouched() {
        let mut store = composite(&[1, 1]);
        store.set_silently(1, Some(stack(1, 7)));
        let subs = store.into_sub_stores();
        assert_eq!(subs[1].quantity_at(0), 7);
        assert_eq!(subs[0].quantity_at(0), 0);
    }
}
