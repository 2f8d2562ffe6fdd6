//! Token lifecycle phase machine.
//!
//! ```text
//!   ┌─────────┐    Graduation     ┌─────┐    Book Listed    ┌───────────┐
//!   │ Bonding │ ────────────────▶ │ AMM │ ────────────────▶ │ OrderBook │
//!   └─────────┘   (irreversible)  └─────┘  (irreversible)   └───────────┘
//! ```
//!
//! Phases only advance. Entering `Amm` marks the token graduated, and
//! graduation never clears.

use serde::{Deserialize, Serialize};

/// Token lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    /// Priced and minted by the bonding curve
    Bonding,
    /// Graduated: liquidity lives in an external AMM pool
    Amm,
    /// Mature market: order-book venue listing
    OrderBook,
}

impl Phase {
    /// Check if the token has left the bonding curve
    pub fn is_graduated(&self) -> bool {
        matches!(self, Phase::Amm | Phase::OrderBook)
    }

    /// Check if curve trading applies in this phase
    pub fn is_bonding(&self) -> bool {
        matches!(self, Phase::Bonding)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Bonding => write!(f, "bonding"),
            Phase::Amm => write!(f, "amm"),
            Phase::OrderBook => write!(f, "order_book"),
        }
    }
}
