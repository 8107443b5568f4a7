//! Proptest strategies for core values and store shapes.

use bytes::Bytes;
use proptest::collection::vec;
use proptest::prelude::*;

use stackstore::ArrayStore;
use stackstore_core::{ResourceId, Stack, StoreId};

/// Strategy for resource identifiers drawn from a small pool, so generated
/// stores contain plenty of similar stacks.
pub fn resource_id() -> impl Strategy<Value = ResourceId> {
    (0u8..8).prop_map(|tag| ResourceId::from_bytes([tag; 16]))
}

/// Strategy for arbitrary resource identifiers.
pub fn any_resource_id() -> impl Strategy<Value = ResourceId> {
    any::<[u8; 16]>().prop_map(ResourceId::from_bytes)
}

/// Strategy for store identifiers.
pub fn store_id() -> impl Strategy<Value = StoreId> {
    any::<[u8; 16]>().prop_map(StoreId::from_bytes)
}

/// Strategy for short opaque metadata, empty half the time.
pub fn metadata() -> impl Strategy<Value = Bytes> {
    prop_oneof![
        Just(Bytes::new()),
        vec(any::<u8>(), 1..16).prop_map(Bytes::from),
    ]
}

/// Strategy for stacks with container-scale quantities and ceilings.
pub fn stack() -> impl Strategy<Value = Stack> {
    (resource_id(), metadata(), 1u32..=128, 1u32..=128).prop_map(
        |(resource, metadata, quantity, type_max)| {
            let type_max = type_max.max(quantity);
            Stack::new(resource, quantity)
                .expect("quantity is positive")
                .with_metadata(metadata)
                .with_type_max(type_max)
                .expect("ceiling is positive")
        },
    )
}

/// Strategy for slot contents: empty two slots out of five.
pub fn slot() -> impl Strategy<Value = Option<Stack>> {
    prop_oneof![
        2 => Just(None),
        3 => stack().prop_map(Some),
    ]
}

/// Strategy for populated array-backed stores of 1 to 27 slots with varied
/// per-slot capacities.
pub fn array_store() -> impl Strategy<Value = ArrayStore> {
    (1usize..=27)
        .prop_flat_map(|size| {
            (
                store_id(),
                vec(slot(), size),
                vec(1u32..=128, size),
            )
        })
        .prop_map(|(id, items, caps)| {
            let size = items.len();
            ArrayStore::with_contents(id, size, items, caps).expect("lengths match by construction")
        })
}

/// Strategy for batches of stacks to feed insertion operations.
pub fn stack_batch() -> impl Strategy<Value = Vec<Stack>> {
    vec(stack(), 1..6)
}
