//! Stacks: a positive quantity of one resource type plus opaque metadata.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Default per-type stack ceiling used when a stack does not declare its own.
pub const DEFAULT_TYPE_MAX: u32 = 64;

/// A 16-byte resource-type identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(pub [u8; 16]);

impl ResourceId {
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidHex(e.to_string()))?;
        let arr: [u8; 16] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidHex(format!("expected 16 bytes in {s:?}")))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({})", &self.to_hex()[..8])
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A stack: a positive quantity of a single resource type, with opaque
/// metadata and a per-type quantity ceiling.
///
/// Two stacks are *similar* when resource type and metadata match; quantity
/// and ceiling play no part in similarity. A quantity of zero is
/// unrepresentable: code that would drain a stack to zero replaces it with
/// `None` instead (see [`Stack::with_quantity`]).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    resource: ResourceId,
    metadata: Bytes,
    quantity: u32,
    type_max: u32,
}

impl Stack {
    /// Creates a stack of `quantity` units of `resource` with empty metadata
    /// and the default type ceiling.
    pub fn new(resource: ResourceId, quantity: u32) -> Result<Self> {
        if quantity == 0 {
            return Err(CoreError::ZeroQuantity);
        }
        Ok(Self {
            resource,
            metadata: Bytes::new(),
            quantity,
            type_max: DEFAULT_TYPE_MAX,
        })
    }

    /// Attaches opaque metadata. Metadata participates in similarity checks.
    pub fn with_metadata(mut self, metadata: impl Into<Bytes>) -> Self {
        self.metadata = metadata.into();
        self
    }

    /// Overrides the per-type ceiling.
    pub fn with_type_max(mut self, type_max: u32) -> Result<Self> {
        if type_max == 0 {
            return Err(CoreError::ZeroTypeMax);
        }
        self.type_max = type_max;
        Ok(self)
    }

    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    pub fn metadata(&self) -> &Bytes {
        &self.metadata
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Per-type ceiling for this stack's resource. A slot's effective capacity
    /// is the minimum of this and the slot's own cap.
    pub fn type_max(&self) -> u32 {
        self.type_max
    }

    /// Whether `other` holds the same resource type and metadata.
    pub fn is_similar(&self, other: &Stack) -> bool {
        self.resource == other.resource && self.metadata == other.metadata
    }

    /// Returns a copy holding `quantity` units, or `None` when `quantity` is
    /// zero. This is the only way quantities change, which keeps the
    /// positive-quantity invariant structural.
    pub fn with_quantity(&self, quantity: u32) -> Option<Stack> {
        if quantity == 0 {
            return None;
        }
        let mut copy = self.clone();
        copy.quantity = quantity;
        Some(copy)
    }
}

impl fmt::Debug for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack")
            .field("resource", &self.resource)
            .field("quantity", &self.quantity)
            .field("type_max", &self.type_max)
            .field("metadata_len", &self.metadata.len())
            .finish()
    }
}
