//! End-to-end scenarios across backends, the event pipeline, observers, and
//! persistence.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use stackstore::{
    ArrayStore, CompositeStore, DelegatingStore, FilteredStore, Observer, Store, StoreError,
};
use stackstore_core::{Interaction, ResourceId, Stack, StoreId, UpdateReason};

fn stack(tag: u8, quantity: u32) -> Stack {
    Stack::new(ResourceId::from_bytes([tag; 16]), quantity).unwrap()
}

fn reason() -> UpdateReason {
    UpdateReason::caused(1)
}

#[test]
fn test_add_distributes_then_reports_leftover() {
    let mut store = ArrayStore::new(3);
    assert_eq!(store.add(reason(), stack(1, 100)), 0);
    assert_eq!(store.quantity_at(0), 64);
    assert_eq!(store.quantity_at(1), 36);
    assert_eq!(store.get(2), None);

    // A second batch tops up the partial slot before opening slot 2.
    assert_eq!(store.add(reason(), stack(1, 100)), 8);
    assert_eq!(store.quantity_at(1), 64);
    assert_eq!(store.quantity_at(2), 64);
}

#[test]
fn test_put_merges_and_rejects() {
    let mut store = ArrayStore::new(1);
    store.set_max_slot_quantity(0, 10).unwrap();
    store.set_silently(0, Some(stack(1, 4)));

    assert_eq!(store.put(reason(), 0, stack(1, 3)), 0);
    assert_eq!(store.quantity_at(0), 7);
    // A dissimilar stack bounces off in full.
    assert_eq!(store.put(reason(), 0, stack(2, 1)), 1);
    assert_eq!(store.get(0), Some(stack(1, 7)));
}

#[test]
fn test_composite_slot_resolution_and_spill() {
    let mut store = CompositeStore::new(vec![
        Box::new(ArrayStore::new(2)) as Box<dyn Store>,
        Box::new(ArrayStore::new(3)) as Box<dyn Store>,
    ])
    .unwrap();
    assert_eq!(store.size(), 5);

    // Logical slot 2 lands on the second sub-store's local slot 0.
    assert!(store.set(reason(), 2, Some(stack(1, 5))));
    assert_eq!(store.sub_store(1).unwrap().quantity_at(0), 5);
    assert!(store.sub_store(0).unwrap().is_empty());

    // A large insert spills from the first sub-store into the second.
    assert_eq!(store.add(reason(), stack(2, 130)), 0);
    assert_eq!(store.sub_store(0).unwrap().total_quantity(), 128);
    assert_eq!(store.sub_store(1).unwrap().count_similar(&stack(2, 1)), 2);
}

#[test]
fn test_filtered_view_geometry_and_write_through() {
    let mut view = FilteredStore::new(Box::new(ArrayStore::new(5)), |slot| {
        slot == 1 || slot == 3
    });
    assert_eq!(view.size(), 3);

    // View slot 1 is backing slot 2.
    assert!(view.set(reason(), 1, Some(stack(1, 5))));
    assert_eq!(view.backing().quantity_at(2), 5);
    assert_eq!(view.backing().quantity_at(1), 0);
    assert_eq!(view.backing().quantity_at(3), 0);
}

#[test]
fn test_cancelling_listener_blocks_every_event_routed_mutation() {
    let mut store = ArrayStore::new(2);
    store.set_silently(1, Some(stack(1, 10)));
    store
        .add_pre_update_listener(Box::new(|event| event.cancel()))
        .unwrap();

    assert!(!store.set(reason(), 0, Some(stack(1, 5))));
    assert!(!store.force_set(reason(), 0, Some(stack(1, 5))));
    assert_eq!(store.put(reason(), 0, stack(1, 5)), 5);
    assert_eq!(store.add(reason(), stack(1, 5)), 5);
    assert_eq!(store.take_from(reason(), 1, 5), 0);
    assert_eq!(store.remove_similar(reason(), &stack(1, 1)), 0);
    assert_eq!(store.set_quantity(reason(), 1, 3).unwrap(), 10);
    assert_eq!(store.quantity_at(1), 10);

    // The suppressed sentinel bypasses the pipeline entirely.
    assert!(store.set(UpdateReason::Suppressed, 0, Some(stack(1, 5))));
    assert_eq!(store.quantity_at(0), 5);
}

#[test]
fn test_listener_registered_on_backing_guards_views() {
    let mut backing = ArrayStore::new(4);
    backing
        .add_pre_update_listener(Box::new(|event| {
            if event.new_quantity() > 10 {
                event.cancel();
            }
        }))
        .unwrap();
    let mut view = FilteredStore::new(Box::new(backing), |slot| slot == 0);

    assert!(view.set(reason(), 0, Some(stack(1, 10))));
    assert!(!view.set(reason(), 1, Some(stack(1, 11))));
    assert_eq!(view.backing().total_quantity(), 10);
}

#[test]
fn test_filtered_over_composite() {
    let composite = CompositeStore::new(vec![
        Box::new(ArrayStore::new(2)) as Box<dyn Store>,
        Box::new(ArrayStore::new(2)) as Box<dyn Store>,
    ])
    .unwrap();
    // Hide the first sub-store entirely.
    let mut view = FilteredStore::new(Box::new(composite), |slot| slot < 2);
    assert_eq!(view.size(), 2);

    assert_eq!(view.add(reason(), stack(1, 100)), 0);
    assert_eq!(view.quantity_at(0), 64);
    assert_eq!(view.quantity_at(1), 36);
    assert_eq!(view.backing().quantity_at(0), 0);
    assert_eq!(view.backing().quantity_at(2), 64);
}

#[test]
fn test_delegating_store_funnels_writes() {
    let mut store = DelegatingStore::new(
        vec![None, Some(stack(1, 60))],
        Box::new(|external: &Vec<Option<Stack>>| external.clone()),
        Box::new(|external: &Vec<Option<Stack>>, slot| external[slot].clone()),
        Box::new(|external: &mut Vec<Option<Stack>>, slot, stack| external[slot] = stack),
    );

    assert_eq!(store.add(reason(), stack(1, 10)), 0);
    assert_eq!(store.external()[1].as_ref().unwrap().quantity(), 64);
    assert_eq!(store.external()[0].as_ref().unwrap().quantity(), 6);
}

#[test]
fn test_observers_fire_on_writes_not_dry_runs() {
    struct Hits(AtomicU64);
    impl Observer for Hits {
        fn slot_changed(&self, _context: u64) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let mut store = ArrayStore::new(2);
    let hits = Arc::new(Hits(AtomicU64::new(0)));
    let observer: Arc<dyn Observer> = hits.clone();
    store.add_observer(0, Arc::clone(&observer), 0);

    store.set(reason(), 0, Some(stack(1, 5)));
    assert_eq!(hits.0.load(Ordering::SeqCst), 1);

    // Writes to other slots and dry runs stay silent.
    store.set(reason(), 1, Some(stack(1, 5)));
    store.simulate_add(&[stack(1, 10), stack(2, 10)]);
    assert_eq!(hits.0.load(Ordering::SeqCst), 1);

    store.remove_observer(0, &observer, 0);
    store.take_from(reason(), 0, 5);
    assert_eq!(hits.0.load(Ordering::SeqCst), 1);
}

#[test]
fn test_click_pipeline() {
    let mut store = ArrayStore::new(1);
    assert!(!store.call_click(0, Interaction(4)));
    let id = store
        .add_click_listener(Box::new(|click| {
            if click.interaction() == Interaction(4) {
                click.cancel();
            }
        }))
        .unwrap();
    assert!(store.call_click(0, Interaction(4)));
    assert!(!store.call_click(0, Interaction(5)));
    assert!(store.remove_click_listener(id).unwrap());
    assert!(!store.call_click(0, Interaction(4)));
}

#[test]
fn test_persistence_round_trip_mid_lifecycle() {
    let mut store = ArrayStore::with_id(StoreId::from_bytes([9; 16]), 4);
    store.add(reason(), stack(1, 100));
    store.add(reason(), stack(2, 30));
    store.take_from(reason(), 1, 6);

    let restored = ArrayStore::deserialize(&store.serialize().unwrap()).unwrap();
    assert_eq!(restored.id(), store.id());
    assert_eq!(restored.snapshot(), store.snapshot());
    assert_eq!(restored.total_quantity(), 154);
}

#[test]
fn test_boundary_cases() {
    let mut store = ArrayStore::new(1);

    // Exact fit leaves nothing over.
    assert_eq!(store.add(reason(), stack(1, 64)), 0);
    assert!(store.is_full());
    // A full store rejects the whole input.
    assert_eq!(store.add(reason(), stack(1, 1)), 1);

    // Quantity surgery on empty slots.
    let mut empty = ArrayStore::new(1);
    assert!(matches!(
        empty.set_quantity(reason(), 0, 5),
        Err(StoreError::EmptySlot(0))
    ));
    assert_eq!(empty.add_quantity(reason(), 0, 5).unwrap(), 0);
    assert!(empty.is_empty());
}

#[test]
fn test_collect_similar_across_composite() {
    let mut left = ArrayStore::new(2);
    left.set_silently(0, Some(stack(1, 64)));
    left.set_silently(1, Some(stack(1, 8)));
    let mut right = ArrayStore::new(1);
    right.set_silently(0, Some(stack(1, 16)));

    let mut store = CompositeStore::new(vec![
        Box::new(left) as Box<dyn Store>,
        Box::new(right) as Box<dyn Store>,
    ])
    .unwrap();

    // Partial slots (8, then 16) drain before the full one tops it off.
    assert_eq!(store.collect_similar(reason(), &stack(1, 1), 0), 64);
    assert_eq!(store.get(1), None);
    assert_eq!(store.get(2), None);
    assert_eq!(store.quantity_at(0), 24);
}
