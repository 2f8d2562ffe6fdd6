//! Bonding Curve Contract
//!
//! Custodies the coin reserve for one soul token and prices every trade
//! with the Bancor return formulas. The curve is the token's minter while
//! active; trading mints on buys and burns on sells.
//!
//! # Invariants
//! - `reserve_balance ≥ INITIAL_RESERVE` while active
//! - deactivation (graduation) is terminal; an inactive curve rejects trades
//! - the curve's actual coin holding always equals
//!   `reserve_balance − INITIAL_RESERVE` (the virtual seed is never backed)
//!
//! # Failure ordering
//! Every fallible step runs before the first owned-state mutation, except
//! the two external legs with explicit unwinds (deposit refund on a failed
//! mint, re-mint on a failed payout) and the documented fee-forwarding
//! degradation: a failing treasury never blocks a trade, the fee is simply
//! retained as extra reserve.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use lib_tokens::SoulToken;
use lib_treasury::FeeTreasury;
use lib_types::{Address, Amount, CoinError, CoinLedger, PersonId, MAX_BPS};

use crate::errors::{MarketError, MarketResult};
use crate::events::MarketEvent;
use crate::math::{
    calc_purchase_return, calc_sale_return, spot_price, FEE_BPS, FEE_CREATOR_BPS,
    FEE_PROTOCOL_BPS, INITIAL_RESERVE, INITIAL_SUPPLY,
};

/// Result of a buy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyOutcome {
    /// Tokens minted to the buyer
    pub tokens_out: Amount,
    /// Fee taken from the deposit
    pub fee: Amount,
    /// Whether the fee stayed in the reserve because the treasury failed
    pub fee_retained: bool,
    /// Marginal price after the trade (wad)
    pub new_price: Amount,
    /// Reserve after the trade
    pub new_reserve: Amount,
    /// Whether this buy pushed the curve over its graduation threshold
    pub graduated: bool,
}

/// Result of a sell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellOutcome {
    /// Coin paid out, net of fee
    pub coin_out: Amount,
    /// Fee taken from the gross proceeds
    pub fee: Amount,
    /// Whether the fee stayed in the reserve because the treasury failed
    pub fee_retained: bool,
    /// Marginal price after the trade (wad)
    pub new_price: Amount,
    /// Reserve after the trade
    pub new_reserve: Amount,
}

/// Bancor bonding curve for one soul token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondingCurve {
    /// This curve's own address (coin custody account)
    address: Address,
    /// Subject this curve prices
    person_id: PersonId,
    /// The soul token this curve mints and burns
    token: Address,
    /// Treasury receiving fee splits
    treasury: Address,
    /// Creator credited with the creator fee share
    creator: Address,

    /// Reserve backing the curve, including the virtual seed
    reserve_balance: Amount,
    /// Reserve level at which the curve freezes
    graduation_threshold: Amount,
    /// False once graduated; terminal
    active: bool,

    /// Trade re-entrancy flag
    #[serde(skip)]
    entered: bool,
}

impl BondingCurve {
    /// Create a new curve seeded with the virtual reserve.
    pub fn new(
        address: Address,
        person_id: PersonId,
        token: Address,
        treasury: Address,
        creator: Address,
        graduation_threshold: Amount,
    ) -> MarketResult<Self> {
        if graduation_threshold <= INITIAL_RESERVE {
            return Err(MarketError::ThresholdTooLow {
                threshold: graduation_threshold,
                minimum: INITIAL_RESERVE,
            });
        }

        Ok(Self {
            address,
            person_id,
            token,
            treasury,
            creator,
            reserve_balance: INITIAL_RESERVE,
            graduation_threshold,
            active: true,
            entered: false,
        })
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// This curve's coin custody address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Subject this curve prices
    pub fn person_id(&self) -> PersonId {
        self.person_id
    }

    /// Token address this curve is wired to
    pub fn token(&self) -> Address {
        self.token
    }

    /// Creator credited with fee shares
    pub fn creator(&self) -> Address {
        self.creator
    }

    /// Current reserve (virtual seed included)
    pub fn reserve_balance(&self) -> Amount {
        self.reserve_balance
    }

    /// Reserve level that freezes the curve
    pub fn graduation_threshold(&self) -> Amount {
        self.graduation_threshold
    }

    /// Whether the curve still trades
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Real supply plus the virtual initial supply
    pub fn effective_supply(&self, token: &SoulToken) -> MarketResult<Amount> {
        token
            .total_supply()
            .checked_add(INITIAL_SUPPLY)
            .ok_or(MarketError::Overflow)
    }

    /// Instantaneous marginal price in coin-per-token (wad)
    pub fn current_price(&self, token: &SoulToken) -> MarketResult<Amount> {
        Ok(spot_price(self.effective_supply(token)?, self.reserve_balance)?)
    }

    /// Quote a buy: `(tokens_out, fee)` for a deposit of `value`
    pub fn quote_buy(&self, token: &SoulToken, value: Amount) -> MarketResult<(Amount, Amount)> {
        if !self.active {
            return Err(MarketError::CurveNotActive);
        }
        if value == 0 {
            return Err(MarketError::InsufficientPayment);
        }

        let (_, _, _, fee) = split_fee(value)?;
        let tokens_out =
            calc_purchase_return(self.effective_supply(token)?, self.reserve_balance, value - fee)?;
        Ok((tokens_out, fee))
    }

    /// Quote a sell: `(coin_out, fee)` for `amount` tokens
    pub fn quote_sell(&self, token: &SoulToken, amount: Amount) -> MarketResult<(Amount, Amount)> {
        if !self.active {
            return Err(MarketError::CurveNotActive);
        }
        if amount == 0 {
            return Err(MarketError::InsufficientTokens);
        }

        let gross =
            calc_sale_return(self.effective_supply(token)?, self.reserve_balance, amount)?;
        let (_, _, _, fee) = split_fee(gross)?;
        Ok((gross - fee, fee))
    }

    // =========================================================================
    // Trading
    // =========================================================================

    /// Buy tokens with `value` coin pulled from `buyer`.
    ///
    /// Tokens are minted to `buyer`; the router passes itself here and
    /// forwards to the trader. Triggers graduation when the reserve reaches
    /// the threshold.
    pub fn buy(
        &mut self,
        token: &mut SoulToken,
        treasury: &mut FeeTreasury,
        ledger: &mut dyn CoinLedger,
        buyer: &Address,
        value: Amount,
        min_tokens_out: Amount,
    ) -> MarketResult<(BuyOutcome, Vec<MarketEvent>)> {
        self.enter()?;
        let result = self.buy_inner(token, treasury, ledger, buyer, value, min_tokens_out);
        self.entered = false;
        result
    }

    fn buy_inner(
        &mut self,
        token: &mut SoulToken,
        treasury: &mut FeeTreasury,
        ledger: &mut dyn CoinLedger,
        buyer: &Address,
        value: Amount,
        min_tokens_out: Amount,
    ) -> MarketResult<(BuyOutcome, Vec<MarketEvent>)> {
        if !self.active {
            return Err(MarketError::CurveNotActive);
        }
        if value == 0 {
            return Err(MarketError::InsufficientPayment);
        }

        let (creator_fee, protocol_fee, staker_fee, fee) = split_fee(value)?;
        let net = value - fee;
        let supply = self.effective_supply(token)?;
        let tokens_out = calc_purchase_return(supply, self.reserve_balance, net)?;
        if tokens_out < min_tokens_out {
            return Err(MarketError::SlippageExceeded {
                min_out: min_tokens_out,
                amount_out: tokens_out,
            });
        }
        let new_reserve = self
            .reserve_balance
            .checked_add(net)
            .ok_or(MarketError::Overflow)?;

        // Pull the deposit, then mint. A mint failure means broken wiring;
        // unwind the deposit and surface it.
        ledger
            .transfer(buyer, &self.address, value)
            .map_err(|err| match err {
                CoinError::InsufficientFunds { .. } => MarketError::InsufficientPayment,
                other => MarketError::TransferFailed(other),
            })?;
        if let Err(err) = token.mint(&self.address, buyer, tokens_out) {
            let _ = ledger.transfer(&self.address, buyer, value);
            return Err(err.into());
        }

        self.reserve_balance = new_reserve;
        let fee_retained = self.distribute_fee(treasury, ledger, creator_fee, protocol_fee, staker_fee, fee)?;

        let new_price = self.current_price(token)?;
        let mut events = vec![MarketEvent::Buy {
            person_id: self.person_id,
            buyer: *buyer,
            coin_in: value,
            tokens_out,
            fee,
            new_price,
        }];

        let graduated = self.reserve_balance >= self.graduation_threshold;
        if graduated {
            self.active = false;
            info!(
                person_id = %self.person_id,
                reserve = self.reserve_balance,
                "graduation threshold reached; curve frozen"
            );
            events.push(MarketEvent::GraduationTriggered {
                person_id: self.person_id,
                reserve: self.reserve_balance,
            });
        }

        Ok((
            BuyOutcome {
                tokens_out,
                fee,
                fee_retained,
                new_price,
                new_reserve: self.reserve_balance,
                graduated,
            },
            events,
        ))
    }

    /// Sell `amount` tokens from `seller`, paying coin to `recipient`.
    ///
    /// The payout destination is a separate argument so the router can pull
    /// tokens to itself but have the coin land directly on the trader; a
    /// rejected payout unwinds the burn and reverts the trade.
    #[allow(clippy::too_many_arguments)]
    pub fn sell(
        &mut self,
        token: &mut SoulToken,
        treasury: &mut FeeTreasury,
        ledger: &mut dyn CoinLedger,
        seller: &Address,
        recipient: &Address,
        amount: Amount,
        min_coin_out: Amount,
    ) -> MarketResult<(SellOutcome, Vec<MarketEvent>)> {
        self.enter()?;
        let result =
            self.sell_inner(token, treasury, ledger, seller, recipient, amount, min_coin_out);
        self.entered = false;
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn sell_inner(
        &mut self,
        token: &mut SoulToken,
        treasury: &mut FeeTreasury,
        ledger: &mut dyn CoinLedger,
        seller: &Address,
        recipient: &Address,
        amount: Amount,
        min_coin_out: Amount,
    ) -> MarketResult<(SellOutcome, Vec<MarketEvent>)> {
        if !self.active {
            return Err(MarketError::CurveNotActive);
        }
        if amount == 0 || token.balance_of(seller) < amount {
            return Err(MarketError::InsufficientTokens);
        }

        let supply = self.effective_supply(token)?;
        let gross = calc_sale_return(supply, self.reserve_balance, amount)?;
        let (creator_fee, protocol_fee, staker_fee, fee) = split_fee(gross)?;
        let net = gross - fee;
        if net < min_coin_out {
            return Err(MarketError::SlippageExceeded {
                min_out: min_coin_out,
                amount_out: net,
            });
        }
        let new_reserve = self
            .reserve_balance
            .checked_sub(gross)
            .ok_or(MarketError::Overflow)?;
        debug_assert!(new_reserve >= INITIAL_RESERVE);

        // Burn first (balance pre-checked), then pay out; a rejected payout
        // re-mints and reverts the trade.
        token.burn(&self.address, seller, amount)?;
        if let Err(err) = ledger.transfer(&self.address, recipient, net) {
            let _ = token.mint(&self.address, seller, amount);
            return Err(MarketError::TransferFailed(err));
        }

        self.reserve_balance = new_reserve;
        let fee_retained = self.distribute_fee(treasury, ledger, creator_fee, protocol_fee, staker_fee, fee)?;

        let new_price = self.current_price(token)?;
        let events = vec![MarketEvent::Sell {
            person_id: self.person_id,
            seller: *seller,
            tokens_in: amount,
            coin_out: net,
            fee,
            new_price,
        }];

        Ok((
            SellOutcome {
                coin_out: net,
                fee,
                fee_retained,
                new_price,
                new_reserve: self.reserve_balance,
            },
            events,
        ))
    }

    /// Forward a split fee to the treasury.
    ///
    /// Returns whether the fee was retained instead: a failing treasury
    /// must not be able to halt trading, so on any failure the fee folds
    /// into the reserve and the trade stands.
    fn distribute_fee(
        &mut self,
        treasury: &mut FeeTreasury,
        ledger: &mut dyn CoinLedger,
        creator_fee: Amount,
        protocol_fee: Amount,
        staker_fee: Amount,
        fee: Amount,
    ) -> MarketResult<bool> {
        if fee == 0 {
            return Ok(false);
        }

        match treasury.receive_fees(
            ledger,
            &self.address,
            fee,
            &self.creator,
            creator_fee,
            protocol_fee,
            staker_fee,
        ) {
            Ok(_) => Ok(false),
            Err(err) => {
                warn!(
                    person_id = %self.person_id,
                    %err,
                    fee,
                    "fee distribution failed; retaining fee in reserve"
                );
                self.reserve_balance = self
                    .reserve_balance
                    .checked_add(fee)
                    .ok_or(MarketError::Overflow)?;
                Ok(true)
            }
        }
    }

    fn enter(&mut self) -> MarketResult<()> {
        if self.entered {
            return Err(MarketError::Reentrancy);
        }
        self.entered = true;
        Ok(())
    }
}

/// Split a trade value into fee components.
///
/// The staker share is the remainder of the total fee after the creator and
/// protocol cuts, so integer rounding dust lands in the staker pool.
fn split_fee(value: Amount) -> MarketResult<(Amount, Amount, Amount, Amount)> {
    let fee = value.checked_mul(FEE_BPS).ok_or(MarketError::Overflow)? / MAX_BPS;
    let creator = value.checked_mul(FEE_CREATOR_BPS).ok_or(MarketError::Overflow)? / MAX_BPS;
    let protocol = value.checked_mul(FEE_PROTOCOL_BPS).ok_or(MarketError::Overflow)? / MAX_BPS;
    Ok((creator, protocol, fee - creator - protocol, fee))
}
