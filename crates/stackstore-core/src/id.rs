//! Store identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A 128-bit store identifier, carried through persistence round trips.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoreId(pub [u8; 16]);

impl StoreId {
    /// The all-zero identifier, used for anonymous and throwaway stores.
    pub const NIL: StoreId = StoreId([0u8; 16]);

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

    pub fn is_nil(&self) -> bool {
        *self == Self::NIL
    }
}

impl fmt::Debug for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreId({})", &self.to_hex()[..8])
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nil_is_all_zero() {
        assert!(StoreId::NIL.is_nil());
        assert!(!StoreId::from_bytes([1; 16]).is_nil());
    }

    #[test]
    fn test_hex_round_trip() {
        let id = StoreId::from_bytes([0x5a; 16]);
        assert_eq!(StoreId::from_hex(&id.to_hex()).unwrap(), id);
    }
}
