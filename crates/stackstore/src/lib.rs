//! # Stackstore
//!
//! A slot-based storage engine for stackable resource units.
//!
//! The [`Store`] trait implements the shared algorithms (capacity-checked
//! writes, two-phase bin-packing insertion, dry runs, collection and removal
//! sweeps) once, over a small primitive surface provided by four backends:
//!
//! - [`ArrayStore`]: owns its contents in plain arrays; resizable; the only
//!   backend with a binary persistent form.
//! - [`CompositeStore`]: several stores presented as one contiguous slot
//!   space.
//! - [`FilteredStore`]: a view over another store with some slots hidden.
//! - [`DelegatingStore`]: a facade over an externally owned resource reached
//!   through injected accessors.
//!
//! Mutations flow through a cancellable update-event pipeline unless made
//! with [`UpdateReason::Suppressed`]; display surfaces attach payload-free
//! [`Observer`]s through a lock-guarded registry.

pub mod array;
pub mod composite;
pub mod delegating;
pub mod error;
pub mod filtered;
pub mod listener;
pub mod observer;
mod persist;
pub mod store;

pub use array::{ArrayStore, DEFAULT_SLOT_CAP};
pub use composite::CompositeStore;
pub use delegating::{BulkGetter, DelegatingStore, SlotGetter, SlotSetter, DELEGATED_SLOT_CAP};
pub use error::{Result, StoreError};
pub use filtered::FilteredStore;
pub use listener::{ClickListener, EventHub, ListenerId, Listeners, PostUpdateListener, PreUpdateListener};
pub use observer::{Observer, ObserverRegistry};
pub use persist::FORMAT_VERSION;
pub use store::Store;

pub use stackstore_core::{
    CauseId, ClickEvent, CoreError, Interaction, PostUpdateEvent, PreUpdateEvent, ResizeEvent,
    ResourceId, Stack, StoreId, UpdateReason, DEFAULT_TYPE_MAX,
};
