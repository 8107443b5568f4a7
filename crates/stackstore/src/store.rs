//! The `Store` trait: backend primitives plus every shared algorithm.
//!
//! Backends implement a small primitive surface (geometry, raw slot access,
//! event plumbing, notification). Everything user-facing is implemented once
//! here as provided methods over those primitives: capacity-checked writes,
//! bin-packing insertion, dry runs, and the collection and removal sweeps.
//! All four backends therefore share one set of semantics.

use std::borrow::Cow;
use std::sync::Arc;

use stackstore_core::{CauseId, Interaction, PreUpdateEvent, Stack, StoreId, UpdateReason};

use crate::array::ArrayStore;
use crate::error::{Result, StoreError};
use crate::listener::{ClickListener, ListenerId, PostUpdateListener, PreUpdateListener};
use crate::observer::Observer;

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// A slot-based store of resource stacks.
///
/// Slots hold `Option<Stack>`; `None` means empty, and a quantity of zero is
/// unrepresentable. Mutating operations take an [`UpdateReason`]: a caused
/// reason routes the change through the cancellable update-event pipeline,
/// while [`UpdateReason::Suppressed`] commits directly. Out-of-range slot
/// indices panic, like slice indexing.
///
/// This trait is sealed; the four backends in this crate are the only
/// implementations.
pub trait Store: sealed::Sealed {
    // --- geometry ---

    /// Number of slots.
    fn size(&self) -> usize;

    /// The slot's own capacity, ignoring any occupant's type ceiling.
    fn max_slot_quantity(&self, slot: usize) -> u32;

    /// All slot capacities, indexed by slot.
    fn max_quantities(&self) -> Vec<u32>;

    // --- content primitives ---

    /// Cloned content of `slot`.
    fn get(&self, slot: usize) -> Option<Stack>;

    /// Content of `slot` without a defensive copy where the backend allows
    /// it. Array-backed stores return a borrow; delegating stores must
    /// materialize an owned value.
    fn get_live(&self, slot: usize) -> Option<Cow<'_, Stack>>;

    /// Cloned contents of every slot, indexed by slot.
    fn snapshot(&self) -> Vec<Option<Stack>>;

    /// Writes `slot` directly, bypassing events, capacity checks, and
    /// notification. The raw commit primitive under every other mutation.
    fn set_direct(&mut self, slot: usize, stack: Option<Stack>);

    // --- iteration order ---

    /// The slot order walked by insertion, collection, and removal sweeps.
    /// Always a permutation of `0..size`.
    fn iteration_order(&self) -> Cow<'_, [usize]>;

    /// Replaces the iteration order. Errors with
    /// [`StoreError::NotAPermutation`] unless `order` is a permutation of
    /// `0..size`, and with [`StoreError::DelegatedConfiguration`] on views.
    fn set_iteration_order(&mut self, order: Vec<usize>) -> Result<()>;

    // --- capacity configuration ---

    /// Sets one slot's capacity. `DelegatedConfiguration` on views.
    fn set_max_slot_quantity(&mut self, slot: usize, cap: u32) -> Result<()>;

    /// Replaces all slot capacities. Errors with [`StoreError::SizeMismatch`]
    /// on length disagreement, `DelegatedConfiguration` on views.
    fn set_max_quantities(&mut self, caps: Vec<u32>) -> Result<()>;

    // --- observers ---

    /// Binds a change observer to `slot`. Safe from any thread; the registry
    /// carries its own lock.
    fn add_observer(&self, slot: usize, observer: Arc<dyn Observer>, context: u64);

    /// Removes the binding identified by observer identity and context.
    fn remove_observer(&self, slot: usize, observer: &Arc<dyn Observer>, context: u64);

    /// Pokes the observers bound to `slot`.
    fn notify_slot(&self, slot: usize);

    /// Pokes every observer.
    fn notify_all(&self);

    // --- update and click listeners ---

    fn add_pre_update_listener(&mut self, listener: PreUpdateListener) -> Result<ListenerId>;
    fn remove_pre_update_listener(&mut self, id: ListenerId) -> Result<bool>;
    fn add_post_update_listener(&mut self, listener: PostUpdateListener) -> Result<ListenerId>;
    fn remove_post_update_listener(&mut self, id: ListenerId) -> Result<bool>;
    fn add_click_listener(&mut self, listener: ClickListener) -> Result<ListenerId>;
    fn remove_click_listener(&mut self, id: ListenerId) -> Result<bool>;

    /// Whether any pre- or post-update listener is registered, here or in a
    /// backing store. When false, caused mutations skip event construction.
    fn has_update_listeners(&self) -> bool;

    // --- event plumbing ---

    /// Builds a pre-update event and runs the listener chain. Views delegate
    /// to the backing store's chain first.
    fn call_pre_update(
        &self,
        cause: CauseId,
        slot: usize,
        previous: Option<Stack>,
        new: Option<Stack>,
    ) -> PreUpdateEvent;

    /// Builds a post-update event and runs the listener chain.
    fn call_post_update(
        &self,
        cause: CauseId,
        slot: usize,
        previous: Option<Stack>,
        new: Option<Stack>,
    );

    /// Reports an external interaction with `slot` to the click listeners.
    /// Returns whether the interaction was cancelled.
    fn call_click(&self, slot: usize, interaction: Interaction) -> bool;

    // --- provided: capacity queries ---

    /// Effective capacity of `slot` for planning a write of `stack`:
    /// min(slot cap, stack's type ceiling), ignoring any occupant.
    fn slot_cap_for(&self, slot: usize, stack: &Stack) -> u32 {
        self.max_slot_quantity(slot).min(stack.type_max())
    }

    /// Effective capacity of `slot` given its current occupant: the
    /// occupant's type ceiling capped by the slot, or the bare slot cap when
    /// empty.
    fn max_quantity(&self, slot: usize) -> u32 {
        let slot_cap = self.max_slot_quantity(slot);
        match self.get_live(slot) {
            Some(stack) => slot_cap.min(stack.type_max()),
            None => slot_cap,
        }
    }

    /// Like [`Store::max_quantity`], but assumes `stack` would occupy the
    /// slot if it is currently empty.
    fn max_quantity_assuming(&self, slot: usize, stack: &Stack) -> u32 {
        let slot_cap = self.max_slot_quantity(slot);
        match self.get_live(slot) {
            Some(current) => slot_cap.min(current.type_max()),
            None => slot_cap.min(stack.type_max()),
        }
    }

    // --- provided: single-slot writes ---

    /// Replaces the content of `slot`, rejecting stacks that exceed the
    /// slot's effective capacity. Type-cap and slot-cap overflow are the same
    /// `false`; callers that need to distinguish compare against
    /// [`Store::max_quantity`] first. Returns whether the write committed.
    fn set(&mut self, reason: UpdateReason, slot: usize, stack: Option<Stack>) -> bool {
        if let Some(stack) = &stack {
            if stack.quantity() > self.slot_cap_for(slot, stack) {
                return false;
            }
        }
        self.force_set(reason, slot, stack)
    }

    /// Replaces the content of `slot` without any capacity check. Still
    /// routed through the event pipeline; returns false only on
    /// cancellation.
    fn force_set(&mut self, reason: UpdateReason, slot: usize, stack: Option<Stack>) -> bool {
        let Some(cause) = effective_cause(self, reason) else {
            self.set_silently(slot, stack);
            return true;
        };
        let previous = self.get(slot);
        let event = self.call_pre_update(cause, slot, previous.clone(), stack);
        if event.is_cancelled() {
            return false;
        }
        let committed = event.into_new_stack();
        self.set_direct(slot, committed.clone());
        self.notify_slot(slot);
        self.call_post_update(cause, slot, previous, committed);
        true
    }

    /// Writes `slot` without events or capacity checks, but still notifies
    /// observers.
    fn set_silently(&mut self, slot: usize, stack: Option<Stack>) {
        self.set_direct(slot, stack);
        self.notify_slot(slot);
    }

    /// Like [`Store::set`], but returns what the slot actually holds
    /// afterwards, which reflects cancellations and listener edits.
    fn change(&mut self, reason: UpdateReason, slot: usize, stack: Option<Stack>) -> Option<Stack> {
        self.set(reason, slot, stack);
        self.get(slot)
    }

    /// Merges `stack` into `slot` and returns the leftover quantity. A
    /// dissimilar occupant or an already-full slot rejects the entire input.
    fn put(&mut self, reason: UpdateReason, slot: usize, stack: Stack) -> u32 {
        let input = stack.quantity();
        let current = self.get(slot);
        if let Some(current) = &current {
            if !current.is_similar(&stack) {
                return input;
            }
        }
        let current_quantity = current.as_ref().map_or(0, |s| s.quantity());
        let cap = self.max_quantity_assuming(slot, &stack);
        if current_quantity >= cap {
            return input;
        }
        let proposed = stack.with_quantity(current_quantity.saturating_add(input).min(cap));
        merge_commit(self, reason, slot, current, proposed, input)
    }

    /// Adjusts the quantity on an occupied slot, clamped to the slot's
    /// effective capacity; 0 clears the slot. Returns the quantity actually
    /// present after listeners ran, or [`StoreError::EmptySlot`].
    fn set_quantity(&mut self, reason: UpdateReason, slot: usize, quantity: u32) -> Result<u32> {
        let current = self.get(slot).ok_or(StoreError::EmptySlot(slot))?;
        let clamped = quantity.min(self.max_quantity(slot));
        let proposed = current.with_quantity(clamped);
        let Some(cause) = effective_cause(self, reason) else {
            self.set_direct(slot, proposed);
            self.notify_slot(slot);
            return Ok(clamped);
        };
        let event = self.call_pre_update(cause, slot, Some(current.clone()), proposed);
        if event.is_cancelled() {
            return Ok(current.quantity());
        }
        let committed = event.into_new_stack();
        let committed_quantity = committed.as_ref().map_or(0, |s| s.quantity());
        self.set_direct(slot, committed.clone());
        self.notify_slot(slot);
        self.call_post_update(cause, slot, Some(current), committed);
        Ok(committed_quantity)
    }

    /// Applies a signed quantity delta to `slot`. An empty slot is a no-op
    /// returning 0. Returns the delta actually applied, which may be smaller
    /// after clamping or listener edits.
    fn add_quantity(&mut self, reason: UpdateReason, slot: usize, delta: i64) -> Result<i64> {
        let Some(current) = self.get(slot) else {
            return Ok(0);
        };
        let current_quantity = current.quantity() as i64;
        let target = (current_quantity + delta).clamp(0, u32::MAX as i64) as u32;
        let committed = self.set_quantity(reason, slot, target)? as i64;
        Ok(committed - current_quantity)
    }

    // --- provided: bin-packing insertion ---

    /// Distributes `stack` across the store and returns the leftover
    /// quantity. Two phases, both walking the iteration order: similar
    /// partially-filled slots are topped up first, then the remainder spills
    /// into empty slots.
    fn add(&mut self, reason: UpdateReason, stack: Stack) -> u32 {
        let order = self.iteration_order().into_owned();
        let mut left = stack.quantity();

        for &slot in &order {
            if left == 0 {
                break;
            }
            let Some(current) = self.get(slot) else {
                continue;
            };
            if !current.is_similar(&stack) {
                continue;
            }
            let cap = self.slot_cap_for(slot, &stack);
            if current.quantity() >= cap {
                continue;
            }
            let proposed = stack.with_quantity(current.quantity().saturating_add(left).min(cap));
            left = merge_commit(self, reason, slot, Some(current), proposed, left);
        }

        for &slot in &order {
            if left == 0 {
                break;
            }
            if self.get_live(slot).is_some() {
                continue;
            }
            let proposed = stack.with_quantity(left.min(self.slot_cap_for(slot, &stack)));
            left = merge_commit(self, reason, slot, None, proposed, left);
        }

        left
    }

    /// Dry run of sequential [`Store::add`] calls: returns the leftover for
    /// each input stack without mutating the store or firing events.
    ///
    /// A single stack is answered arithmetically. Multiple stacks are driven
    /// through a disposable array-backed copy, which costs O(size) per call;
    /// fine for container-scale stores, not for tight sizing loops.
    fn simulate_add(&self, stacks: &[Stack]) -> Vec<u32> {
        match stacks {
            [] => Vec::new(),
            [stack] => vec![simulate_single_add(self, stack)],
            _ => simulate_multi_add(self, stacks),
        }
    }

    /// Whether the store can absorb all of `stacks` with no leftover.
    fn can_hold(&self, stacks: &[Stack]) -> bool {
        self.simulate_add(stacks).iter().all(|&left| left == 0)
    }

    // --- provided: collection and removal ---

    /// Gathers units similar to `template` on top of `base_quantity`, up to
    /// the template's type ceiling. Partially filled slots are drained
    /// before full ones, both in iteration order. Returns the accumulated
    /// quantity.
    fn collect_similar(&mut self, reason: UpdateReason, template: &Stack, base_quantity: u32) -> u32 {
        let ceiling = template.type_max();
        let mut amount = base_quantity;
        if amount >= ceiling {
            return amount;
        }
        let order = self.iteration_order().into_owned();
        for &slot in &order {
            let Some(current) = self.get(slot) else {
                continue;
            };
            if !current.is_similar(template) || current.quantity() >= ceiling {
                continue;
            }
            // A listener may clear more than requested; the accumulated
            // amount never passes the ceiling.
            let taken = self.take_from(reason, slot, ceiling - amount);
            amount = amount.saturating_add(taken).min(ceiling);
            if amount >= ceiling {
                return amount;
            }
        }
        for &slot in &order {
            let Some(current) = self.get(slot) else {
                continue;
            };
            if !current.is_similar(template) || current.quantity() < ceiling {
                continue;
            }
            let taken = self.take_from(reason, slot, ceiling - amount);
            amount = amount.saturating_add(taken).min(ceiling);
            if amount >= ceiling {
                return amount;
            }
        }
        amount
    }

    /// Clears every slot whose stack matches `predicate`. The predicate sees
    /// cloned snapshots. Returns the total quantity removed; cancelled slots
    /// do not count.
    fn remove_if(&mut self, reason: UpdateReason, predicate: &dyn Fn(&Stack) -> bool) -> u32 {
        let order = self.iteration_order().into_owned();
        let mut removed = 0;
        for &slot in &order {
            let Some(current) = self.get(slot) else {
                continue;
            };
            if predicate(&current) && self.set(reason, slot, None) {
                removed += current.quantity();
            }
        }
        removed
    }

    /// Clears every slot holding a stack similar to `reference`.
    fn remove_similar(&mut self, reason: UpdateReason, reference: &Stack) -> u32 {
        self.remove_if(reason, &|stack: &Stack| stack.is_similar(reference))
    }

    /// Drains up to `max_quantity` units from matching slots in iteration
    /// order; the last slot touched may be partially drained. Returns the
    /// quantity removed.
    fn remove_first(
        &mut self,
        reason: UpdateReason,
        max_quantity: u32,
        predicate: &dyn Fn(&Stack) -> bool,
    ) -> u32 {
        let order = self.iteration_order().into_owned();
        let mut left = max_quantity;
        for &slot in &order {
            if left == 0 {
                break;
            }
            let Some(current) = self.get(slot) else {
                continue;
            };
            if predicate(&current) {
                // A listener may clear more than requested; the budget must
                // not underflow.
                left = left.saturating_sub(self.take_from(reason, slot, left));
            }
        }
        max_quantity - left
    }

    /// Drains up to `max_quantity` units similar to `reference`.
    fn remove_first_similar(
        &mut self,
        reason: UpdateReason,
        max_quantity: u32,
        reference: &Stack,
    ) -> u32 {
        self.remove_first(reason, max_quantity, &|stack: &Stack| {
            stack.is_similar(reference)
        })
    }

    /// Takes up to `max_take` units from `slot`, leaving the remainder (or
    /// clearing the slot when fully drained). Returns the quantity actually
    /// taken; 0 when the slot is empty or a listener cancels.
    fn take_from(&mut self, reason: UpdateReason, slot: usize, max_take: u32) -> u32 {
        let Some(current) = self.get(slot) else {
            return 0;
        };
        let quantity = current.quantity();
        let take = quantity.min(max_take);
        let proposed = current.with_quantity(quantity - take);
        let Some(cause) = effective_cause(self, reason) else {
            self.set_direct(slot, proposed);
            self.notify_slot(slot);
            return take;
        };
        let event = self.call_pre_update(cause, slot, Some(current.clone()), proposed);
        if event.is_cancelled() {
            return 0;
        }
        let committed = event.into_new_stack();
        let committed_quantity = committed.as_ref().map_or(0, |s| s.quantity());
        self.set_direct(slot, committed.clone());
        self.notify_slot(slot);
        self.call_post_update(cause, slot, Some(current), committed);
        quantity.saturating_sub(committed_quantity)
    }

    // --- provided: scans ---

    /// Whether every slot is filled to its effective capacity.
    fn is_full(&self) -> bool {
        (0..self.size()).all(|slot| {
            self.get_live(slot)
                .map_or(false, |stack| stack.quantity() >= self.max_quantity(slot))
        })
    }

    fn is_empty(&self) -> bool {
        (0..self.size()).all(|slot| self.get_live(slot).is_none())
    }

    fn has_empty_slot(&self) -> bool {
        (0..self.size()).any(|slot| self.get_live(slot).is_none())
    }

    fn contains(&self, predicate: &dyn Fn(&Stack) -> bool) -> bool {
        (0..self.size()).any(|slot| self.get_live(slot).is_some_and(|stack| predicate(&stack)))
    }

    fn contains_similar(&self, reference: &Stack) -> bool {
        self.contains(&|stack: &Stack| stack.is_similar(reference))
    }

    /// Total units held in stacks matching `predicate`.
    fn count(&self, predicate: &dyn Fn(&Stack) -> bool) -> u32 {
        (0..self.size())
            .filter_map(|slot| self.get_live(slot))
            .filter(|stack| predicate(stack))
            .map(|stack| stack.quantity())
            .sum()
    }

    /// Total units held in stacks similar to `reference`.
    fn count_similar(&self, reference: &Stack) -> u32 {
        self.count(&|stack: &Stack| stack.is_similar(reference))
    }

    fn has_stack(&self, slot: usize) -> bool {
        self.get_live(slot).is_some()
    }

    /// Quantity on `slot`, 0 when empty.
    fn quantity_at(&self, slot: usize) -> u32 {
        self.get_live(slot).map_or(0, |stack| stack.quantity())
    }

    /// Total units across all slots.
    fn total_quantity(&self) -> u64 {
        (0..self.size())
            .filter_map(|slot| self.get_live(slot))
            .map(|stack| stack.quantity() as u64)
            .sum()
    }

    /// Whether `slot` currently holds exactly `expected`. Used by external
    /// surfaces to detect drift before applying a prepared change.
    fn is_synced(&self, slot: usize, expected: Option<&Stack>) -> bool {
        match (self.get_live(slot), expected) {
            (None, None) => true,
            (Some(live), Some(expected)) => *live == *expected,
            _ => false,
        }
    }
}

/// The causation token to run a mutation's event pipeline under, or `None`
/// when the pipeline should be skipped: suppressed reasons always skip, and
/// caused reasons skip when no update listener is registered.
fn effective_cause<S: Store + ?Sized>(store: &S, reason: UpdateReason) -> Option<CauseId> {
    match reason.cause() {
        Some(cause) if store.has_update_listeners() => Some(cause),
        _ => None,
    }
}

/// Commits a merge-style slot change (quantities only grow or shrink within
/// one similar stack) and returns the pending quantity left unabsorbed.
fn merge_commit<S: Store + ?Sized>(
    store: &mut S,
    reason: UpdateReason,
    slot: usize,
    previous: Option<Stack>,
    proposed: Option<Stack>,
    pending: u32,
) -> u32 {
    let previous_quantity = previous.as_ref().map_or(0, |s| s.quantity());
    let Some(cause) = effective_cause(store, reason) else {
        let committed_quantity = proposed.as_ref().map_or(0, |s| s.quantity());
        store.set_direct(slot, proposed);
        store.notify_slot(slot);
        return pending - (committed_quantity - previous_quantity);
    };
    let event = store.call_pre_update(cause, slot, previous.clone(), proposed);
    if event.is_cancelled() {
        return pending;
    }
    let committed = event.into_new_stack();
    let committed_quantity = committed.as_ref().map_or(0, |s| s.quantity());
    store.set_direct(slot, committed.clone());
    store.notify_slot(slot);
    store.call_post_update(cause, slot, previous, committed);
    // A listener may have shrunk or cleared the slot; never report negative.
    let absorbed = committed_quantity as i64 - previous_quantity as i64;
    (pending as i64 - absorbed).clamp(0, u32::MAX as i64) as u32
}

fn simulate_single_add<S: Store + ?Sized>(store: &S, stack: &Stack) -> u32 {
    let mut left = stack.quantity();
    let order = store.iteration_order();
    for &slot in order.iter() {
        if left == 0 {
            break;
        }
        let Some(current) = store.get_live(slot) else {
            continue;
        };
        if !current.is_similar(stack) {
            continue;
        }
        let cap = store.slot_cap_for(slot, stack);
        left -= left.min(cap.saturating_sub(current.quantity()));
    }
    for &slot in order.iter() {
        if left == 0 {
            break;
        }
        if store.get_live(slot).is_some() {
            continue;
        }
        left -= left.min(store.slot_cap_for(slot, stack));
    }
    left
}

fn simulate_multi_add<S: Store + ?Sized>(store: &S, stacks: &[Stack]) -> Vec<u32> {
    let mut scratch = ArrayStore::from_parts(
        StoreId::NIL,
        store.snapshot(),
        store.max_quantities(),
        store.iteration_order().into_owned(),
    );
    stacks
        .iter()
        .map(|stack| scratch.add(UpdateReason::Suppressed, stack.clone()))
        .collect()
}

/// Checks that `order` is a permutation of `0..size`.
pub(crate) fn validate_iteration_order(order: &[usize], size: usize) -> Result<()> {
    let not_a_permutation = || StoreError::NotAPermutation {
        len: order.len(),
        size,
    };
    if order.len() != size {
        return Err(not_a_permutation());
    }
    let mut seen = vec![false; size];
    for &slot in order {
        if slot >= size || seen[slot] {
            return Err(not_a_permutation());
        }
        seen[slot] = true;
    }
    Ok(())
}
