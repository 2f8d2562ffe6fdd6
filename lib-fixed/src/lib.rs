//! NILE Fixed-Point Arithmetic
//!
//! Pure, deterministic wad (1e18) arithmetic for the bonding curve engine.
//!
//! # Design Principles
//!
//! 1. **Pure functions** - No side effects, no global state
//! 2. **Deterministic** - Same inputs produce identical outputs across all platforms
//! 3. **No floats** - All arithmetic uses u128 integers with U256 intermediates
//! 4. **Overflow-safe** - Every narrowing step is checked
//!
//! # Usage
//!
//! ```ignore
//! use lib_fixed::{mul_wad, div_wad, pow_one_plus};
//! use lib_types::WAD;
//!
//! let ratio = div_wad(deposit, reserve)?;
//! let growth = pow_one_plus(ratio, exponent_wad)?;
//! let minted = mul_wad(supply, growth - WAD)?;
//! ```

pub mod golden_vectors;
pub mod wad;

pub use wad::*;
