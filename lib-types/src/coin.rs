//! Native Coin Ledger Seam
//!
//! The native coin balance is the single resource shared across the core.
//! Every component that moves coin does so through the [`CoinLedger`] trait;
//! no component ever reads another's coin balance as authoritative state.
//!
//! A transfer can fail (the recipient side of a real chain can reject a
//! send), so the trait is fallible and callers decide whether a failure
//! reverts the operation or degrades gracefully; the curve's fee-forwarding
//! path is the one place that degrades.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::primitives::{Address, Amount};

/// Error during native coin movement
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoinError {
    #[error("Insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: Amount, need: Amount },

    #[error("Recipient rejected transfer: {0}")]
    Rejected(Address),

    #[error("Arithmetic overflow")]
    Overflow,
}

/// Result type for coin operations
pub type CoinResult<T> = Result<T, CoinError>;

/// Trait for native coin custody operations
///
/// Implementations are provided by the chain environment; the in-memory
/// ledger below backs tests and local simulation.
pub trait CoinLedger {
    /// Get the coin balance of an address
    fn balance_of(&self, address: &Address) -> Amount;

    /// Create coin out of thin air and credit it to an address.
    ///
    /// Only the environment may do this (genesis funding, test setup);
    /// contracts move existing coin via [`CoinLedger::transfer`].
    fn credit(&mut self, address: &Address, amount: Amount) -> CoinResult<()>;

    /// Move coin between two addresses
    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> CoinResult<()>;
}

/// In-memory coin ledger for tests and simulation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryCoinLedger {
    balances: HashMap<Address, Amount>,
}

impl InMemoryCoinLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Total coin across all accounts
    pub fn total_issued(&self) -> Amount {
        self.balances.values().sum()
    }
}

impl CoinLedger for InMemoryCoinLedger {
    fn balance_of(&self, address: &Address) -> Amount {
        *self.balances.get(address).unwrap_or(&0)
    }

    fn credit(&mut self, address: &Address, amount: Amount) -> CoinResult<()> {
        let entry = self.balances.entry(*address).or_insert(0);
        *entry = entry.checked_add(amount).ok_or(CoinError::Overflow)?;
        Ok(())
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> CoinResult<()> {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(CoinError::InsufficientFunds {
                have: from_balance,
                need: amount,
            });
        }

        let to_balance = self.balance_of(to);
        let new_to = to_balance.checked_add(amount).ok_or(CoinError::Overflow)?;

        self.balances.insert(*from, from_balance - amount);
        self.balances.insert(*to, new_to);
        Ok(())
    }
}
