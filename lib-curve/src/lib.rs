//! NILE Bonding Curve Market
//!
//! The trading core: one Bancor-style bonding curve per soul token, a
//! factory that deploys and registers token/curve pairs at deterministic
//! addresses, and a router that mediates trades.
//!
//! # Data Flow (buy)
//!
//! ```text
//! caller ─▶ Router ─▶ Factory (pair lookup)
//!                     └▶ Curve (price, reserve) ─▶ Token (mint)
//!                                               └▶ Treasury (fee split)
//! ```
//!
//! # Lifecycle
//!
//! A curve is active from construction until its reserve first reaches the
//! graduation threshold after a buy; deactivation is terminal. The factory
//! then hands the token off to the post-graduation market by advancing the
//! phase and rotating the minter.

pub mod curve;
pub mod errors;
pub mod events;
pub mod factory;
pub mod math;
pub mod router;

pub use curve::{BondingCurve, BuyOutcome, SellOutcome};
pub use errors::{MarketError, MarketResult};
pub use events::{InMemoryMarketEventIndexer, MarketEvent, MarketEventIndexer};
pub use factory::{FactoryConfig, SoulTokenFactory, TokenPair, DEFAULT_GRADUATION_THRESHOLD};
pub use math::{
    calc_purchase_return, calc_sale_return, spot_price, FEE_BPS, FEE_CREATOR_BPS,
    FEE_PROTOCOL_BPS, FEE_STAKER_BPS, INITIAL_RESERVE, INITIAL_SUPPLY, RESERVE_RATIO,
};
pub use router::NileRouter;
