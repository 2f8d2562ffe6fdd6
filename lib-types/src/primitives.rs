//! Canonical primitive types shared by every core component.
//!
//! Rule: no String identifiers in core state. Ever.
//!
//! These types are designed to be:
//! - Fixed-size (no dynamic allocation)
//! - Deterministically serializable
//! - Efficient to copy and compare

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ============================================================================
// TYPE ALIASES
// ============================================================================

/// Coin and token amounts in minor units (supports up to ~340 undecillion)
pub type Amount = u128;

/// Basis points for percentage calculations (10000 = 100%)
pub type Bps = u16;

// ============================================================================
// SCALING CONSTANTS
// ============================================================================

/// 18-decimal fixed-point scale ("wad")
pub const WAD: Amount = 1_000_000_000_000_000_000;

/// Maximum basis points (100%)
pub const MAX_BPS: Amount = 10_000;

/// Parts-per-million denominator
pub const PPM: Amount = 1_000_000;

/// One whole coin in minor units
pub const COIN: Amount = WAD;

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// 128-bit opaque identifier uniquely keying a tokenized subject.
///
/// Minted off-chain (UUID-sized); the core never interprets its contents.
///
/// Serializes as a 32-character hex string so person-keyed maps stay valid
/// JSON for the read-only API surface.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct PersonId(pub [u8; 16]);

impl PersonId {
    /// Create a new PersonId from raw bytes
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Create a PersonId from a u128 value
    pub const fn from_u128(value: u128) -> Self {
        Self(value.to_be_bytes())
    }

    /// Get the identifier as a u128
    pub const fn as_u128(&self) -> u128 {
        u128::from_be_bytes(self.0)
    }

    /// Get the underlying bytes
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Debug for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PersonId({})", hex::encode(self.0))
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 16]> for PersonId {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl From<u128> for PersonId {
    fn from(value: u128) -> Self {
        Self::from_u128(value)
    }
}

impl Serialize for PersonId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for PersonId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = hex::decode(&text).map_err(D::Error::custom)?;
        let bytes: [u8; 16] = bytes
            .try_into()
            .map_err(|_| D::Error::custom("person id must be 16 bytes of hex"))?;
        Ok(Self(bytes))
    }
}

/// 32-byte account or contract address
///
/// Serializes as a 64-character hex string (see [`PersonId`] for why).
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// Create a new Address from raw bytes
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The zero address (used to disable minting, never a real account)
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Check if this is the zero address
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Get the underlying bytes
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Derive the address controlled by an ed25519 verifying key.
    ///
    /// The address is the BLAKE3 hash of the raw 32-byte key. Permit
    /// verification relies on this mapping to bind signatures to owners.
    pub fn from_public_key(key_bytes: &[u8]) -> Self {
        Self(*blake3::hash(key_bytes).as_bytes())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = hex::decode(&text).map_err(D::Error::custom)?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| D::Error::custom("address must be 32 bytes of hex"))?;
        Ok(Self(bytes))
    }
}
