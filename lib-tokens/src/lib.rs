//! NILE Soul Token Contract
//!
//! One fungible token per tokenized subject, with a lifecycle phase machine
//! and an authorized-minter gate.
//!
//! # Key Types
//!
//! - [`SoulToken`]: the canonical per-person fungible token
//! - [`Phase`]: lifecycle state machine (Bonding → AMM → OrderBook)
//! - [`TokenError`]: typed failures for every gated operation
//!
//! # Authority Model
//!
//! Exactly one `minter` (the bonding curve pre-graduation, the market
//! router afterwards) may change `total_supply`; only the immutable
//! `factory` may rotate the minter or advance the phase. The mutual
//! token ↔ curve reference is broken here: each side stores the other's
//! address, but only the factory mutates the wiring.

pub mod contract;
pub mod errors;
pub mod events;
pub mod permit;
pub mod types;

pub use contract::SoulToken;
pub use errors::{TokenError, TokenResult};
pub use events::TokenEvent;
pub use permit::{permit_digest, PERMIT_DOMAIN_TAG};
pub use types::Phase;
