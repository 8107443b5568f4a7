//! # Stackstore Core
//!
//! Pure value types for the stackstore engine: stacks of resource units,
//! identifiers, update reasons, and the mutation events that flow through a
//! store's update pipeline.
//!
//! This crate performs no storage and no I/O. Everything here is `Clone`-able
//! data that the `stackstore` crate threads through its algorithms.

pub mod error;
pub mod event;
pub mod id;
pub mod reason;
pub mod stack;

pub use error::CoreError;
pub use event::{ClickEvent, Interaction, PostUpdateEvent, PreUpdateEvent, ResizeEvent};
pub use id::StoreId;
pub use reason::{CauseId, UpdateReason};
pub use stack::{ResourceId, Stack, DEFAULT_TYPE_MAX};
