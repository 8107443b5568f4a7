//! The array-backed store: the canonical owning backend.
//!
//! Holds its contents, capacities, and iteration order in plain vectors, owns
//! its listener lists and observer registry, and is the only backend with a
//! persistent form (see the serialize/deserialize impl in `persist`).

use std::borrow::Cow;
use std::sync::Arc;

use stackstore_core::{CauseId, Interaction, PreUpdateEvent, ResizeEvent, Stack, StoreId};

use crate::error::{Result, StoreError};
use crate::listener::{
    ClickListener, EventHub, ListenerId, Listeners, PostUpdateListener, PreUpdateListener,
};
use crate::observer::{Observer, ObserverRegistry};
use crate::store::{sealed, validate_iteration_order, Store};

/// Slot capacity assigned when none is configured.
pub const DEFAULT_SLOT_CAP: u32 = 64;

/// An array-backed store.
#[derive(Debug)]
pub struct ArrayStore {
    id: StoreId,
    items: Vec<Option<Stack>>,
    max_quantities: Vec<u32>,
    order: Vec<usize>,
    hub: EventHub,
    resize_listeners: Listeners<ResizeEvent>,
    observers: ObserverRegistry,
}

impl ArrayStore {
    /// An anonymous empty store of `size` slots with default capacities.
    pub fn new(size: usize) -> Self {
        Self::with_id(StoreId::NIL, size)
    }

    /// An empty store of `size` slots carrying a persistence identifier.
    pub fn with_id(id: StoreId, size: usize) -> Self {
        Self::assemble(id, vec![None; size], vec![DEFAULT_SLOT_CAP; size])
    }

    /// A store over pre-existing contents and capacities. Errors when either
    /// array disagrees with `size`.
    pub fn with_contents(
        id: StoreId,
        size: usize,
        items: Vec<Option<Stack>>,
        max_quantities: Vec<u32>,
    ) -> Result<Self> {
        if items.len() != size {
            return Err(StoreError::SizeMismatch {
                expected: size,
                actual: items.len(),
            });
        }
        if max_quantities.len() != size {
            return Err(StoreError::SizeMismatch {
                expected: size,
                actual: max_quantities.len(),
            });
        }
        Ok(Self::assemble(id, items, max_quantities))
    }

    /// An anonymous empty store whose size and capacities come from
    /// `max_quantities`.
    pub fn from_max_quantities(max_quantities: Vec<u32>) -> Self {
        let size = max_quantities.len();
        Self::assemble(StoreId::NIL, vec![None; size], max_quantities)
    }

    fn assemble(id: StoreId, items: Vec<Option<Stack>>, max_quantities: Vec<u32>) -> Self {
        let size = items.len();
        Self {
            id,
            items,
            max_quantities,
            order: (0..size).collect(),
            hub: EventHub::new(),
            resize_listeners: Listeners::new(),
            observers: ObserverRegistry::new(size),
        }
    }

    /// Internal constructor over already-validated parts. Used by the
    /// multi-stack dry run, whose inputs come straight from a live store.
    pub(crate) fn from_parts(
        id: StoreId,
        items: Vec<Option<Stack>>,
        max_quantities: Vec<u32>,
        order: Vec<usize>,
    ) -> Self {
        let mut store = Self::assemble(id, items, max_quantities);
        store.order = order;
        store
    }

    pub fn id(&self) -> StoreId {
        self.id
    }

    /// Changes the slot count in place. Truncation silently drops trailing
    /// stacks and their observer bindings; extension appends empty slots
    /// whose capacity inherits the previous last capacity (the default when
    /// the store had none). The iteration order resets to identity. No slot
    /// events fire; resize listeners run after the arrays have changed.
    pub fn resize(&mut self, new_size: usize) {
        let old_size = self.items.len();
        if new_size == old_size {
            return;
        }
        let inherited_cap = self
            .max_quantities
            .last()
            .copied()
            .unwrap_or(DEFAULT_SLOT_CAP);
        self.items.resize(new_size, None);
        self.max_quantities.resize(new_size, inherited_cap);
        self.order = (0..new_size).collect();
        self.observers.resize(new_size);
        let mut event = ResizeEvent { old_size, new_size };
        self.resize_listeners.dispatch(&mut event);
    }

    pub fn add_resize_listener(&mut self, listener: Box<dyn Fn(&mut ResizeEvent)>) -> ListenerId {
        self.resize_listeners.subscribe(listener)
    }

    pub fn remove_resize_listener(&mut self, id: ListenerId) -> bool {
        self.resize_listeners.unsubscribe(id)
    }
}

impl sealed::Sealed for ArrayStore {}

impl Store for ArrayStore {
    fn size(&self) -> usize {
        self.items.len()
    }

    fn max_slot_quantity(&self, slot: usize) -> u32 {
        self.max_quantities[slot]
    }

    fn max_quantities(&self) -> Vec<u32> {
        self.max_quantities.clone()
    }

    fn get(&self, slot: usize) -> Option<Stack> {
        self.items[slot].clone()
    }

    fn get_live(&self, slot: usize) -> Option<Cow<'_, Stack>> {
        self.items[slot].as_ref().map(Cow::Borrowed)
    }

    fn snapshot(&self) -> Vec<Option<Stack>> {
        self.items.clone()
    }

    fn set_direct(&mut self, slot: usize, stack: Option<Stack>) {
        self.items[slot] = stack;
    }

    fn iteration_order(&self) -> Cow<'_, [usize]> {
        Cow::Borrowed(&self.order)
    }

    fn set_iteration_order(&mut self, order: Vec<usize>) -> Result<()> {
        validate_iteration_order(&order, self.items.len())?;
        self.order = order;
        Ok(())
    }

    fn set_max_slot_quantity(&mut self, slot: usize, cap: u32) -> Result<()> {
        if slot >= self.max_quantities.len() {
            return Err(StoreError::SlotOutOfBounds {
                slot,
                size: self.max_quantities.len(),
            });
        }
        self.max_quantities[slot] = cap;
        Ok(())
    }

    fn set_max_quantities(&mut self, caps: Vec<u32>) -> Result<()> {
        if caps.len() != self.max_quantities.len() {
            return Err(StoreError::SizeMismatch {
                expected: self.max_quantities.len(),
                actual: caps.len(),
            });
        }
        self.max_quantities = caps;
        Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use stackstore_core::ResourceId;

    fn stack(tag: u8, quantity: u32) -> Stack {
        Stack::new(ResourceId::from_bytes([tag; 16]), quantity).unwrap()
    }

    #[test]
    fn test_with_contents_validates_lengths() {
        let short = vec![None, Some(stack(1, 1))];
        assert!(matches!(
            ArrayStore::with_contents(StoreId::NIL, 3, short, vec![64; 3]),
            Err(StoreError::SizeMismatch {
                expected: 3,
                actual: 2
            })
        ));
        assert!(matches!(
            ArrayStore::with_contents(StoreId::NIL, 2, vec![None, None], vec![64; 3]),
            Err(StoreError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_from_max_quantities() {
        let store = ArrayStore::from_max_quantities(vec![1, 2, 3]);
        assert_eq!(store.size(), 3);
        assert_eq!(store.max_slot_quantity(2), 3);
        assert!(store.is_empty());
    }

    #[test]
    fn test_default_caps_and_identity_order() {
        let store = ArrayStore::new(4);
        assert_eq!(store.max_quantities(), vec![DEFAULT_SLOT_CAP; 4]);
        assert_eq!(store.iteration_order().as_ref(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_set_iteration_order_rejects_non_permutations() {
        let mut store = ArrayStore::new(3);
        assert!(matches!(
            store.set_iteration_order(vec![0, 1]),
            Err(StoreError::NotAPermutation { len: 2, size: 3 })
        ));
        assert!(store.set_iteration_order(vec![1, 2, 0]).is_ok());
        assert_eq!(store.iteration_order().as_ref(), &[1, 2, 0]);
    }

    #[test]
    fn test_set_max_quantities_validation() {
        let mut store = ArrayStore::new(2);
        assert!(matches!(
            store.set_max_quantities(vec![1]),
            Err(StoreError::SizeMismatch { .. })
        ));
        assert!(store.set_max_quantities(vec![5, 6]).is_ok());
        assert!(matches!(
            store.set_max_slot_quantity(2, 1),
            Err(StoreError::SlotOutOfBounds { slot: 2, size: 2 })
        ));
    }

    #[test]
    fn test_resize_extends_with_inherited_cap() {
        let mut store = ArrayStore::from_max_quantities(vec![10, 20]);
        store.resize(4);
        assert_eq!(store.max_quantities(), vec![10, 20, 20, 20]);
        assert_eq!(store.iteration_order().as_ref(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_resize_from_zero_uses_default_cap() {
        let mut store = ArrayStore::new(0);
        store.resize(2);
        assert_eq!(store.max_quantities(), vec![DEFAULT_SLOT_CAP; 2]);
    }

    #[test]
    fn test_resize_truncation_drops_stacks() {
        let mut store = ArrayStore::new(3);
        store.set_silently(2, Some(stack(1, 5)));
        store.resize(2);
        assert_eq!(store.size(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_resize_listener_sees_updated_arrays() {
        let observed = Rc::new(RefCell::new(Vec::new()));
        let mut store = ArrayStore::new(2);
        let sink = Rc::clone(&observed);
        let id = store.add_resize_listener(Box::new(move |event| {
            sink.borrow_mut().push((event.old_size, event.new_size));
        }));
        store.resize(5);
        store.resize(5);
        assert_eq!(observed.borrow().as_slice(), &[(2, 5)]);

        assert!(store.remove_resize_listener(id));
        store.resize(1);
        assert_eq!(observed.borrow().len(), 1);
    }

    #[test]
    fn test_get_live_borrows() {
        let mut store = ArrayStore::new(1);
        store.set_silently(0, Some(stack(1, 5)));
        match store.get_live(0) {
            Some(Cow::Borrowed(live)) => assert_eq!(live.quantity(), 5),
            other => panic!("expected a borrowed stack, got {other:?}"),
        }
    }
}
