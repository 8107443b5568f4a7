//! Binary persistence for [`ArrayStore`].
//!
//! Envelope, all integers big-endian: 16-byte store id, one version byte, a
//! u32 slot count, then one entry per slot: a u32 length prefix followed by
//! that many bytes of CBOR stack payload, with length 0 marking an empty
//! slot. Version 1 is the recognized legacy variant carrying an obsolete
//! length-prefixed capacity block between the version byte and the slot
//! count; the block is skipped on read. Slot capacities are not persisted
//! and reset to the default on load.

use stackstore_core::{Stack, StoreId};

use crate::array::{ArrayStore, DEFAULT_SLOT_CAP};
use crate::error::{Result, StoreError};
use crate::store::Store;

/// Version byte written by [`ArrayStore::serialize`].
pub const FORMAT_VERSION: u8 = 2;

/// Legacy version whose extra capacity block is read and discarded.
const LEGACY_CAPACITY_BLOCK_VERSION: u8 = 1;

impl ArrayStore {
    /// Encodes id and per-slot contents. Capacities, iteration order, and
    /// listeners are runtime configuration and are not part of the format.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let size = u32::try_from(self.size())
            .map_err(|_| StoreError::Encode("store too large to persist".into()))?;
        let mut out = Vec::new();
        out.extend_from_slice(self.id().as_bytes());
        out.push(FORMAT_VERSION);
        out.extend_from_slice(&size.to_be_bytes());
        for slot in 0..self.size() {
            match self.get_live(slot) {
                Some(stack) => {
                    let mut payload = Vec::new();
                    ciborium::ser::into_writer(stack.as_ref(), &mut payload)
                        .map_err(|e| StoreError::Encode(e.to_string()))?;
                    let len = u32::try_from(payload.len())
                        .map_err(|_| StoreError::Encode("stack payload too large".into()))?;
                    out.extend_from_slice(&len.to_be_bytes());
                    out.extend_from_slice(&payload);
                }
                None => out.extend_from_slice(&0u32.to_be_bytes()),
            }
        }
        Ok(out)
    }

    /// Decodes a store previously written by [`ArrayStore::serialize`], or
    /// by the legacy version-1 writer.
    pub fn deserialize(bytes: &[u8]) -> Result<ArrayStore> {
        let mut reader = Reader::new(bytes);
        let id = StoreId::from_bytes(reader.take_16()?);
        match reader.take_u8()? {
            FORMAT_VERSION => {}
            LEGACY_CAPACITY_BLOCK_VERSION => {
                let obsolete = reader.take_u32()? as usize;
                reader.skip(obsolete)?;
            }
            other => return Err(StoreError::UnsupportedVersion(other)),
        }
        let size = reader.take_u32()? as usize;
        // The slot count is untrusted; every slot costs at least a 4-byte
        // length prefix, so the remaining buffer bounds the pre-allocation.
        let mut items = Vec::with_capacity(size.min(reader.remaining() / 4));
        for slot in 0..size {
            let len = reader.take_u32()? as usize;
            if len == 0 {
                items.push(None);
                continue;
            }
            let payload = reader.take(len)?;
            let stack: Stack = ciborium::de::from_reader(payload)
                .map_err(|e| StoreError::Decode(e.to_string()))?;
            if stack.quantity() == 0 {
                return Err(StoreError::Decode(format!(
                    "zero-quantity stack on slot {slot}"
                )));
            }
            items.push(Some(stack));
        }
        ArrayStore::with_contents(id, size, items, vec![DEFAULT_SLOT_CAP; size])
    }
}

struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn remaining(&self) -> usize {
        self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.buf.len() < n {
            return Err(StoreError::Truncated);
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    fn take_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn take_u32(&mut self) -> Result<u32> {
        let bytes: [u8; 4] = self.take(4)?.try_into().map_err(|_| StoreError::Truncated)?;
        Ok(u32::from_be_bytes(bytes))
    }

    fn take_16(&mut self) -> Result<[u8; 16]> {
        self.take(16)?.try_into().map_err(|_| StoreError::Truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackstore_core::ResourceId;

    fn stack(tag: u8, quantity: u32) -> Stack {
        Stack::new(ResourceId::from_bytes([tag; 16]), quantity).unwrap()
    }

    fn sample() -> ArrayStore {
        let mut store = ArrayStore::with_id(StoreId::from_bytes([7; 16]), 3);
        store.set_silently(0, Some(stack(1, 5)));
        store.set_silently(
            2,
            Some(
                stack(2, 64)
                    .with_metadata(&b"etched"[..])
                    .with_type_max(99)
                    .unwrap(),
            ),
        );
        store
    }

    #[test]
    fn test_round_trip_preserves_id_and_contents() {
        let store = sample();
        let bytes = store.serialize().unwrap();
        let restored = ArrayStore::deserialize(&bytes).unwrap();
        assert_eq!(restored.id(), store.id());
        assert_eq!(restored.snapshot(), store.snapshot());
    }

    #[test]
    fn test_capacities_reset_on_load() {
        let mut store = sample();
        store.set_max_quantities(vec![1, 2, 3]).unwrap();
        let restored = ArrayStore::deserialize(&store.serialize().unwrap()).unwrap();
        assert_eq!(restored.max_quantities(), vec![DEFAULT_SLOT_CAP; 3]);
    }

    #[test]
    fn test_legacy_version_skips_capacity_block() {
        let store = sample();
        let bytes = store.serialize().unwrap();

        let mut legacy = Vec::new();
        legacy.extend_from_slice(&bytes[..16]);
        legacy.push(LEGACY_CAPACITY_BLOCK_VERSION);
        legacy.extend_from_slice(&8u32.to_be_bytes());
        legacy.extend_from_slice(&[0xff; 8]);
        legacy.extend_from_slice(&bytes[17..]);

        let restored = ArrayStore::deserialize(&legacy).unwrap();
        assert_eq!(restored.id(), store.id());
        assert_eq!(restored.snapshot(), store.snapshot());
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut bytes = sample().serialize().unwrap();
        bytes[16] = 9;
        assert!(matches!(
            ArrayStore::deserialize(&bytes),
            Err(StoreError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn test_truncated_input_rejected() {
        let bytes = sample().serialize().unwrap();
        for cut in [0, 10, 16, 17, 20, bytes.len() - 1] {
            assert!(
                matches!(
                    ArrayStore::deserialize(&bytes[..cut]),
                    Err(StoreError::Truncated)
                ),
                "cut at {cut}"
            );
        }
    }

    #[test]
    fn test_overstated_slot_count_rejected() {
        // 21 bytes claiming u32::MAX slots: the first missing length prefix
        // fails the decode before any slot data is materialized.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&[7; 16]);
        bytes.push(FORMAT_VERSION);
        bytes.extend_from_slice(&u32::MAX.to_be_bytes());
        assert!(matches!(
            ArrayStore::deserialize(&bytes),
            Err(StoreError::Truncated)
        ));
    }

    #[test]
    fn test_empty_store_round_trip() {
        let store = ArrayStore::with_id(StoreId::from_bytes([3; 16]), 0);
        let restored = ArrayStore::deserialize(&store.serialize().unwrap()).unwrap();
        assert_eq!(restored.size(), 0);
        assert_eq!(restored.id(), store.id());
    }
}
