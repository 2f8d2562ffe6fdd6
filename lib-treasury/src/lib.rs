//! NILE Fee Treasury
//!
//! Atomic receipt of trading fees and safe withdrawal paths.
//!
//! Every curve forwards its 1% trading fee here in one call, pre-split into
//! creator / protocol / staker components. The treasury keeps its own
//! ledger for each bucket and never trusts the raw coin balance:
//!
//! # Invariant
//!
//! `Σ creator_balances + protocol_pending + staker_pool ≤ treasury coin balance`
//!
//! # Key Types
//!
//! - [`FeeTreasury`]: the contract state and operations
//! - [`TreasuryStats`]: read-only accounting snapshot
//! - [`TreasuryError`] / [`TreasuryEvent`]

pub mod errors;
pub mod events;
pub mod treasury;

pub use errors::{TreasuryError, TreasuryResult};
pub use events::TreasuryEvent;
pub use treasury::{FeeTreasury, TreasuryStats};
