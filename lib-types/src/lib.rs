//! Canonical Primitive Types for the NILE Economic Core
//!
//! This crate defines the identifiers, amounts and scaling conventions that
//! every other core crate builds on, plus the native-coin ledger seam.
//!
//! # Key Types
//!
//! - [`PersonId`]: 128-bit opaque identifier for a tokenized subject
//! - [`Address`]: 32-byte account / contract address
//! - [`Amount`]: u128 balance type (coin minor units and token base units)
//! - [`CoinLedger`]: the seam through which native coin moves
//!
//! # Scaling Conventions
//!
//! - [`WAD`]: 18-decimal fixed point (1e18)
//! - [`MAX_BPS`]: basis points denominator (1e4)
//! - [`PPM`]: parts-per-million denominator (1e6)

pub mod coin;
pub mod primitives;

pub use coin::{CoinError, CoinLedger, CoinResult, InMemoryCoinLedger};
pub use primitives::*;
