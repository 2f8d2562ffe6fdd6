//! Fee Treasury Contract
//!
//! Receives split trading fees from the bonding curves and accounts for
//! three buckets: per-creator balances, protocol fees and the staker pool.
//! Reward distribution out of the staker pool happens elsewhere; this
//! contract only custodies and accounts.
//!
//! The protocol counter is split in two: `protocol_pending` is the
//! withdrawable balance and drops to zero on withdrawal,
//! `protocol_cumulative` only ever grows. Both are exposed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use lib_types::{Address, Amount, CoinLedger};

use crate::errors::{TreasuryError, TreasuryResult};
use crate::events::TreasuryEvent;

/// Read-only accounting snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryStats {
    /// Cumulative creator fees ever received
    pub total_creator_fees: Amount,
    /// Protocol fees awaiting withdrawal
    pub protocol_pending: Amount,
    /// Cumulative protocol fees ever received
    pub protocol_cumulative: Amount,
    /// Cumulative staker fees ever received
    pub total_staker_fees: Amount,
    /// Current staker pool balance
    pub staker_pool: Amount,
}

/// Trading-fee treasury
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeTreasury {
    /// This treasury's own address (coin custody account)
    address: Address,
    /// Administrative owner
    owner: Address,
    /// Destination for protocol withdrawals
    protocol_wallet: Address,

    /// Accrued, unwithdrawn balance per creator
    creator_balances: HashMap<Address, Amount>,
    /// Cumulative creator fees
    total_creator_fees: Amount,
    /// Withdrawable protocol fees
    protocol_pending: Amount,
    /// Cumulative protocol fees (monotone)
    protocol_cumulative: Amount,
    /// Cumulative staker fees
    total_staker_fees: Amount,
    /// Running staker pool balance
    staker_pool: Amount,

    /// Withdrawal re-entrancy flag
    #[serde(skip)]
    entered: bool,
}

impl FeeTreasury {
    /// Create a new treasury
    pub fn new(address: Address, owner: Address, protocol_wallet: Address) -> TreasuryResult<Self> {
        if address.is_zero() || owner.is_zero() || protocol_wallet.is_zero() {
            return Err(TreasuryError::ZeroAddress);
        }

        Ok(Self {
            address,
            owner,
            protocol_wallet,
            creator_balances: HashMap::new(),
            total_creator_fees: 0,
            protocol_pending: 0,
            protocol_cumulative: 0,
            total_staker_fees: 0,
            staker_pool: 0,
            entered: false,
        })
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// This treasury's coin custody address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Current protocol wallet
    pub fn protocol_wallet(&self) -> Address {
        self.protocol_wallet
    }

    /// Accrued balance of a creator
    pub fn creator_balance_of(&self, creator: &Address) -> Amount {
        *self.creator_balances.get(creator).unwrap_or(&0)
    }

    /// Accounting snapshot
    pub fn stats(&self) -> TreasuryStats {
        TreasuryStats {
            total_creator_fees: self.total_creator_fees,
            protocol_pending: self.protocol_pending,
            protocol_cumulative: self.protocol_cumulative,
            total_staker_fees: self.total_staker_fees,
            staker_pool: self.staker_pool,
        }
    }

    /// Sum the treasury ledger must be able to cover from its coin balance
    pub fn obligations(&self) -> Amount {
        self.creator_balances
            .values()
            .sum::<Amount>()
            .saturating_add(self.protocol_pending)
            .saturating_add(self.staker_pool)
    }

    // =========================================================================
    // Fee intake
    // =========================================================================

    /// Receive a split trading fee from a curve.
    ///
    /// `attached` is the coin the payer sends with the call; it must equal
    /// the sum of the three components exactly. The coin is pulled from
    /// `payer` before any bucket is credited, so a failed transfer leaves
    /// the ledger untouched (the caller keeps the fee; this backs the
    /// curve's fee-retention path).
    #[allow(clippy::too_many_arguments)]
    pub fn receive_fees(
        &mut self,
        ledger: &mut dyn CoinLedger,
        payer: &Address,
        attached: Amount,
        creator: &Address,
        creator_fee: Amount,
        protocol_fee: Amount,
        staker_fee: Amount,
    ) -> TreasuryResult<TreasuryEvent> {
        if creator.is_zero() {
            return Err(TreasuryError::ZeroAddress);
        }

        let expected = creator_fee
            .checked_add(protocol_fee)
            .and_then(|v| v.checked_add(staker_fee))
            .ok_or(TreasuryError::Overflow)?;
        if attached != expected {
            return Err(TreasuryError::FeeMismatch { attached, expected });
        }

        ledger.transfer(payer, &self.address, attached)?;

        let entry = self.creator_balances.entry(*creator).or_insert(0);
        *entry = entry.checked_add(creator_fee).ok_or(TreasuryError::Overflow)?;
        self.total_creator_fees = self
            .total_creator_fees
            .checked_add(creator_fee)
            .ok_or(TreasuryError::Overflow)?;
        self.protocol_pending = self
            .protocol_pending
            .checked_add(protocol_fee)
            .ok_or(TreasuryError::Overflow)?;
        self.protocol_cumulative = self
            .protocol_cumulative
            .checked_add(protocol_fee)
            .ok_or(TreasuryError::Overflow)?;
        self.total_staker_fees = self
            .total_staker_fees
            .checked_add(staker_fee)
            .ok_or(TreasuryError::Overflow)?;
        self.staker_pool = self
            .staker_pool
            .checked_add(staker_fee)
            .ok_or(TreasuryError::Overflow)?;

        debug!(
            creator = %creator,
            creator_fee,
            protocol_fee,
            staker_fee,
            "treasury received fees"
        );

        Ok(TreasuryEvent::FeesReceived {
            creator: *creator,
            creator_fee,
            protocol_fee,
            staker_fee,
        })
    }

    // =========================================================================
    // Withdrawals
    // =========================================================================

    /// Drain the caller's accrued creator balance to the caller.
    pub fn creator_withdraw(
        &mut self,
        ledger: &mut dyn CoinLedger,
        caller: &Address,
    ) -> TreasuryResult<TreasuryEvent> {
        self.enter()?;
        let result = self.creator_withdraw_inner(ledger, caller);
        self.entered = false;
        result
    }

    fn creator_withdraw_inner(
        &mut self,
        ledger: &mut dyn CoinLedger,
        caller: &Address,
    ) -> TreasuryResult<TreasuryEvent> {
        let amount = self.creator_balance_of(caller);
        if amount == 0 {
            return Err(TreasuryError::InsufficientBalance);
        }

        ledger.transfer(&self.address, caller, amount)?;
        self.creator_balances.insert(*caller, 0);

        info!(creator = %caller, amount, "creator withdrew accrued fees");
        Ok(TreasuryEvent::CreatorWithdraw {
            creator: *caller,
            amount,
        })
    }

    /// Drain pending protocol fees to the protocol wallet. Owner only.
    pub fn protocol_withdraw(
        &mut self,
        ledger: &mut dyn CoinLedger,
        caller: &Address,
    ) -> TreasuryResult<TreasuryEvent> {
        self.enter()?;
        let result = self.protocol_withdraw_inner(ledger, caller);
        self.entered = false;
        result
    }

    fn protocol_withdraw_inner(
        &mut self,
        ledger: &mut dyn CoinLedger,
        caller: &Address,
    ) -> TreasuryResult<TreasuryEvent> {
        if *caller != self.owner {
            return Err(TreasuryError::NotAuthorized(*caller));
        }
        let amount = self.protocol_pending;
        if amount == 0 {
            return Err(TreasuryError::InsufficientBalance);
        }

        ledger.transfer(&self.address, &self.protocol_wallet, amount)?;
        self.protocol_pending = 0;

        info!(wallet = %self.protocol_wallet, amount, "protocol fees withdrawn");
        Ok(TreasuryEvent::ProtocolWithdraw {
            wallet: self.protocol_wallet,
            amount,
        })
    }

    /// Rotate the protocol wallet. Owner only; zero is rejected.
    pub fn set_protocol_wallet(
        &mut self,
        caller: &Address,
        new: Address,
    ) -> TreasuryResult<TreasuryEvent> {
        if *caller != self.owner {
            return Err(TreasuryError::NotAuthorized(*caller));
        }
        if new.is_zero() {
            return Err(TreasuryError::ZeroAddress);
        }

        let old = self.protocol_wallet;
        self.protocol_wallet = new;
        Ok(TreasuryEvent::ProtocolWalletUpdated { old, new })
    }

    fn enter(&mut self) -> TreasuryResult<()> {
        if self.entered {
            return Err(TreasuryError::Reentrancy);
        }
        self.entered = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::{CoinError, CoinResult, InMemoryCoinLedger, COIN};

    fn addr(id: u8) -> Address {
        Address::new([id; 32])
    }

    fn setup() -> (FeeTreasury, InMemoryCoinLedger) {
        let treasury = FeeTreasury::new(addr(1), addr(2), addr(3)).unwrap();
        let mut ledger = InMemoryCoinLedger::new();
        // The "curve" account the fees come from
        ledger.credit(&addr(10), 100 * COIN).unwrap();
        (treasury, ledger)
    }

    fn receive_one_coin(treasury: &mut FeeTreasury, ledger: &mut InMemoryCoinLedger) {
        treasury
            .receive_fees(
                ledger,
                &addr(10),
                COIN,
                &addr(20),
                COIN / 2,
                3 * COIN / 10,
                COIN / 5,
            )
            .unwrap();
    }

    #[test]
    fn test_receive_fees_credits_all_buckets() {
        let (mut treasury, mut ledger) = setup();
        receive_one_coin(&mut treasury, &mut ledger);

        assert_eq!(treasury.creator_balance_of(&addr(20)), COIN / 2);
        let stats = treasury.stats();
        assert_eq!(stats.total_creator_fees, COIN / 2);
        assert_eq!(stats.protocol_pending, 3 * COIN / 10);
        assert_eq!(stats.protocol_cumulative, 3 * COIN / 10);
        assert_eq!(stats.total_staker_fees, COIN / 5);
        assert_eq!(stats.staker_pool, COIN / 5);

        // Coin actually moved and covers the obligations
        assert_eq!(ledger.balance_of(&treasury.address()), COIN);
        assert!(ledger.balance_of(&treasury.address()) >= treasury.obligations());
    }

    #[test]
    fn test_receive_fees_rejects_mismatched_value() {
        let (mut treasury, mut ledger) = setup();
        let result = treasury.receive_fees(
            &mut ledger,
            &addr(10),
            COIN,
            &addr(20),
            COIN / 2,
            COIN / 2,
            COIN / 5,
        );
        assert!(matches!(result, Err(TreasuryError::FeeMismatch { .. })));
        assert_eq!(ledger.balance_of(&treasury.address()), 0);
    }

    #[test]
    fn test_receive_fees_failed_transfer_leaves_ledger_untouched() {
        let (mut treasury, mut ledger) = setup();
        // Payer with no funds
        let result = treasury.receive_fees(
            &mut ledger,
            &addr(99),
            COIN,
            &addr(20),
            COIN / 2,
            3 * COIN / 10,
            COIN / 5,
        );
        assert!(matches!(result, Err(TreasuryError::TransferFailed(_))));
        assert_eq!(treasury.stats().protocol_cumulative, 0);
        assert_eq!(treasury.creator_balance_of(&addr(20)), 0);
    }

    #[test]
    fn test_creator_withdraw_drains_exactly_the_ledger_entry() {
        let (mut treasury, mut ledger) = setup();
        receive_one_coin(&mut treasury, &mut ledger);

        let before = ledger.balance_of(&addr(20));
        let event = treasury.creator_withdraw(&mut ledger, &addr(20)).unwrap();

        assert_eq!(
            event,
            TreasuryEvent::CreatorWithdraw {
                creator: addr(20),
                amount: COIN / 2,
            }
        );
        assert_eq!(ledger.balance_of(&addr(20)) - before, COIN / 2);
        assert_eq!(treasury.creator_balance_of(&addr(20)), 0);

        // Second withdraw has nothing left
        let result = treasury.creator_withdraw(&mut ledger, &addr(20));
        assert!(matches!(result, Err(TreasuryError::InsufficientBalance)));
    }

    #[test]
    fn test_protocol_withdraw_owner_only_and_resets_pending() {
        let (mut treasury, mut ledger) = setup();
        receive_one_coin(&mut treasury, &mut ledger);

        let result = treasury.protocol_withdraw(&mut ledger, &addr(99));
        assert!(matches!(result, Err(TreasuryError::NotAuthorized(_))));

        treasury.protocol_withdraw(&mut ledger, &addr(2)).unwrap();
        assert_eq!(ledger.balance_of(&addr(3)), 3 * COIN / 10);

        let stats = treasury.stats();
        assert_eq!(stats.protocol_pending, 0);
        // The cumulative counter survives the withdrawal
        assert_eq!(stats.protocol_cumulative, 3 * COIN / 10);

        let result = treasury.protocol_withdraw(&mut ledger, &addr(2));
        assert!(matches!(result, Err(TreasuryError::InsufficientBalance)));
    }

    #[test]
    fn test_set_protocol_wallet() {
        let (mut treasury, _) = setup();

        let result = treasury.set_protocol_wallet(&addr(99), addr(4));
        assert!(matches!(result, Err(TreasuryError::NotAuthorized(_))));

        let result = treasury.set_protocol_wallet(&addr(2), Address::zero());
        assert!(matches!(result, Err(TreasuryError::ZeroAddress)));

        let event = treasury.set_protocol_wallet(&addr(2), addr(4)).unwrap();
        assert_eq!(
            event,
            TreasuryEvent::ProtocolWalletUpdated {
                old: addr(3),
                new: addr(4),
            }
        );
        assert_eq!(treasury.protocol_wallet(), addr(4));
    }

    #[test]
    fn test_failed_withdraw_keeps_creator_balance() {
        /// Ledger that rejects every payout from the treasury
        struct RejectingLedger(InMemoryCoinLedger);

        impl CoinLedger for RejectingLedger {
            fn balance_of(&self, address: &Address) -> Amount {
                self.0.balance_of(address)
            }
            fn credit(&mut self, address: &Address, amount: Amount) -> CoinResult<()> {
                self.0.credit(address, amount)
            }
            fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> CoinResult<()> {
                if *from == Address::new([1u8; 32]) {
                    return Err(CoinError::Rejected(*to));
                }
                self.0.transfer(from, to, amount)
            }
        }

        let (mut treasury, ledger) = setup();
        let mut ledger = RejectingLedger(ledger);
        receive_one_coin_dyn(&mut treasury, &mut ledger);

        let result = treasury.creator_withdraw(&mut ledger, &addr(20));
        assert!(matches!(result, Err(TreasuryError::TransferFailed(_))));
        // Accrued balance survives the failed payout
        assert_eq!(treasury.creator_balance_of(&addr(20)), COIN / 2);

        // And the guard flag was cleared: a later withdraw is not locked out
        let result = treasury.creator_withdraw(&mut ledger, &addr(20));
        assert!(matches!(result, Err(TreasuryError::TransferFailed(_))));
    }

    fn receive_one_coin_dyn(treasury: &mut FeeTreasury, ledger: &mut dyn CoinLedger) {
        treasury
            .receive_fees(
                ledger,
                &addr(10),
                COIN,
                &addr(20),
                COIN / 2,
                3 * COIN / 10,
                COIN / 5,
            )
            .unwrap();
    }

    #[test]
    fn test_serde_round_trip() {
        let (mut treasury, mut ledger) = setup();
        receive_one_coin(&mut treasury, &mut ledger);

        let json = serde_json::to_string(&treasury).unwrap();
        let back: FeeTreasury = serde_json::from_str(&json).unwrap();
        assert_eq!(back.stats(), treasury.stats());
        assert_eq!(back.creator_balance_of(&addr(20)), COIN / 2);
    }
}
