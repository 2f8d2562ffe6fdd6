//! NILE Router
//!
//! The single trade entry point. Looks the pair up in the factory, checks
//! the token's phase, and dispatches to the bonding curve. The
//! post-graduation venue is not wired up yet: any trade or quote against a
//! graduated token fails with `NotGraduated` until the AMM integration
//! lands.
//!
//! # Mediation
//!
//! - **Buy**: the router pulls the deposit from the caller, buys as itself
//!   (the curve mints to its direct caller), then forwards the minted
//!   tokens. A curve failure refunds the pulled deposit.
//! - **Sell**: the router pulls tokens from the seller (requires a prior
//!   allowance), sells as itself, and has the curve pay the coin directly
//!   to the trader. A curve failure returns the pulled tokens.
//!
//! The router holds no balances beyond these in-flight values and keeps
//! its own re-entrancy guard on both trade paths.

use serde::{Deserialize, Serialize};
use tracing::debug;

use lib_treasury::FeeTreasury;
use lib_types::{Address, Amount, CoinError, CoinLedger, PersonId};

use crate::curve::{BuyOutcome, SellOutcome};
use crate::errors::{MarketError, MarketResult};
use crate::events::MarketEvent;
use crate::factory::SoulTokenFactory;

/// Trade router for the bonding-curve market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NileRouter {
    /// This router's own address (transient custody account)
    address: Address,

    /// Trade re-entrancy flag
    #[serde(skip)]
    entered: bool,
}

impl NileRouter {
    /// Create a new router
    pub fn new(address: Address) -> Self {
        Self {
            address,
            entered: false,
        }
    }

    /// This router's address
    pub fn address(&self) -> Address {
        self.address
    }

    // =========================================================================
    // Trading
    // =========================================================================

    /// Buy `person_id` tokens with `value` coin from `caller`.
    pub fn buy(
        &mut self,
        factory: &mut SoulTokenFactory,
        treasury: &mut FeeTreasury,
        ledger: &mut dyn CoinLedger,
        caller: &Address,
        person_id: &PersonId,
        value: Amount,
        min_tokens_out: Amount,
    ) -> MarketResult<(BuyOutcome, Vec<MarketEvent>)> {
        self.enter()?;
        let result =
            self.buy_inner(factory, treasury, ledger, caller, person_id, value, min_tokens_out);
        self.entered = false;
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn buy_inner(
        &mut self,
        factory: &mut SoulTokenFactory,
        treasury: &mut FeeTreasury,
        ledger: &mut dyn CoinLedger,
        caller: &Address,
        person_id: &PersonId,
        value: Amount,
        min_tokens_out: Amount,
    ) -> MarketResult<(BuyOutcome, Vec<MarketEvent>)> {
        let (curve, token) = factory.pair_mut(person_id)?;
        if token.graduated() {
            return Err(MarketError::NotGraduated);
        }

        // Take custody of the deposit, trade as ourselves, forward the
        // minted tokens. A failed trade refunds the deposit.
        ledger
            .transfer(caller, &self.address, value)
            .map_err(|err| match err {
                CoinError::InsufficientFunds { .. } => MarketError::InsufficientPayment,
                other => MarketError::TransferFailed(other),
            })?;

        let router = self.address;
        match curve.buy(token, treasury, ledger, &router, value, min_tokens_out) {
            Ok((outcome, mut events)) => {
                if outcome.tokens_out > 0 {
                    token.transfer(&router, caller, outcome.tokens_out)?;
                }
                debug!(
                    person_id = %person_id,
                    buyer = %caller,
                    value,
                    tokens_out = outcome.tokens_out,
                    "routed buy"
                );
                rewrite_buyer(&mut events, caller);
                Ok((outcome, events))
            }
            Err(err) => {
                let _ = ledger.transfer(&router, caller, value);
                Err(err)
            }
        }
    }

    /// Sell `amount` tokens of `person_id` for `caller`.
    ///
    /// The caller must have approved the router for at least `amount`.
    pub fn sell(
        &mut self,
        factory: &mut SoulTokenFactory,
        treasury: &mut FeeTreasury,
        ledger: &mut dyn CoinLedger,
        caller: &Address,
        person_id: &PersonId,
        amount: Amount,
        min_coin_out: Amount,
    ) -> MarketResult<(SellOutcome, Vec<MarketEvent>)> {
        self.enter()?;
        let result =
            self.sell_inner(factory, treasury, ledger, caller, person_id, amount, min_coin_out);
        self.entered = false;
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn sell_inner(
        &mut self,
        factory: &mut SoulTokenFactory,
        treasury: &mut FeeTreasury,
        ledger: &mut dyn CoinLedger,
        caller: &Address,
        person_id: &PersonId,
        amount: Amount,
        min_coin_out: Amount,
    ) -> MarketResult<(SellOutcome, Vec<MarketEvent>)> {
        let (curve, token) = factory.pair_mut(person_id)?;
        if token.graduated() {
            return Err(MarketError::NotGraduated);
        }
        if amount == 0 {
            return Err(MarketError::InsufficientTokens);
        }

        // Pull the tokens on the caller's allowance, sell as ourselves with
        // the coin landing directly on the trader. A failed trade returns
        // the pulled tokens.
        let router = self.address;
        token.transfer_from(&router, caller, &router, amount)?;

        match curve.sell(token, treasury, ledger, &router, caller, amount, min_coin_out) {
            Ok((outcome, mut events)) => {
                debug!(
                    person_id = %person_id,
                    seller = %caller,
                    amount,
                    coin_out = outcome.coin_out,
                    "routed sell"
                );
                rewrite_seller(&mut events, caller);
                Ok((outcome, events))
            }
            Err(err) => {
                let _ = token.transfer(&router, caller, amount);
                Err(err)
            }
        }
    }

    // =========================================================================
    // Quotes
    // =========================================================================

    /// Quote a buy without trading: `(tokens_out, fee)`
    pub fn quote_buy(
        &self,
        factory: &SoulTokenFactory,
        person_id: &PersonId,
        value: Amount,
    ) -> MarketResult<(Amount, Amount)> {
        let token = factory.token(person_id)?;
        if token.graduated() {
            return Err(MarketError::NotGraduated);
        }
        factory.curve(person_id)?.quote_buy(token, value)
    }

    /// Quote a sell without trading: `(coin_out, fee)`
    pub fn quote_sell(
        &self,
        factory: &SoulTokenFactory,
        person_id: &PersonId,
        amount: Amount,
    ) -> MarketResult<(Amount, Amount)> {
        let token = factory.token(person_id)?;
        if token.graduated() {
            return Err(MarketError::NotGraduated);
        }
        factory.curve(person_id)?.quote_sell(token, amount)
    }

    fn enter(&mut self) -> MarketResult<()> {
        if self.entered {
            return Err(MarketError::Reentrancy);
        }
        self.entered = true;
        Ok(())
    }
}

/// The curve records its direct caller (the router) as the trader; rewrite
/// the events to name the real account before they reach indexers.
fn rewrite_buyer(events: &mut [MarketEvent], caller: &Address) {
    for event in events {
        if let MarketEvent::Buy { buyer, .. } = event {
            *buyer = *caller;
        }
    }
}

fn rewrite_seller(events: &mut [MarketEvent], caller: &Address) {
    for event in events {
        if let MarketEvent::Sell { seller, .. } = event {
            *seller = *caller;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::FactoryConfig;
    use lib_types::{InMemoryCoinLedger, COIN};

    fn addr(id: u8) -> Address {
        Address::new([id; 32])
    }

    const OWNER: u8 = 2;
    const TRADER: u8 = 6;

    struct Env {
        factory: SoulTokenFactory,
        treasury: FeeTreasury,
        router: NileRouter,
        ledger: InMemoryCoinLedger,
        person: PersonId,
    }

    fn setup() -> Env {
        let mut factory =
            SoulTokenFactory::new(addr(1), addr(OWNER), addr(3), FactoryConfig::default()).unwrap();
        let treasury = FeeTreasury::new(addr(3), addr(OWNER), addr(9)).unwrap();
        let router = NileRouter::new(addr(4));
        let mut ledger = InMemoryCoinLedger::new();
        ledger.credit(&addr(TRADER), 1_000 * COIN).unwrap();

        let person = PersonId::from_u128(1);
        factory
            .create_soul_token(&addr(5), person, "Test".to_string(), "TST".to_string())
            .unwrap();

        Env {
            factory,
            treasury,
            router,
            ledger,
            person,
        }
    }

    fn routed_buy(env: &mut Env, value: Amount) -> BuyOutcome {
        let person = env.person;
        let (outcome, _) = env
            .router
            .buy(
                &mut env.factory,
                &mut env.treasury,
                &mut env.ledger,
                &addr(TRADER),
                &person,
                value,
                0,
            )
            .unwrap();
        outcome
    }

    #[test]
    fn test_routed_buy_delivers_tokens_to_caller() {
        let mut env = setup();
        let outcome = routed_buy(&mut env, COIN);

        let token = env.factory.token(&env.person).unwrap();
        assert!(outcome.tokens_out > 0);
        assert_eq!(token.balance_of(&addr(TRADER)), outcome.tokens_out);
        // Nothing sticks to the router
        assert_eq!(token.balance_of(&env.router.address()), 0);
        assert_eq!(env.ledger.balance_of(&env.router.address()), 0);
    }

    #[test]
    fn test_routed_buy_events_name_the_trader() {
        let mut env = setup();
        let person = env.person;
        let (_, events) = env
            .router
            .buy(
                &mut env.factory,
                &mut env.treasury,
                &mut env.ledger,
                &addr(TRADER),
                &person,
                COIN,
                0,
            )
            .unwrap();

        match &events[0] {
            MarketEvent::Buy { buyer, .. } => assert_eq!(*buyer, addr(TRADER)),
            other => panic!("expected Buy event, got {:?}", other),
        }
    }

    #[test]
    fn test_routed_buy_failure_refunds_deposit() {
        let mut env = setup();
        let before = env.ledger.balance_of(&addr(TRADER));
        let person = env.person;

        // Impossible slippage floor forces the curve to reject
        let result = env.router.buy(
            &mut env.factory,
            &mut env.treasury,
            &mut env.ledger,
            &addr(TRADER),
            &person,
            COIN,
            Amount::MAX,
        );
        assert!(matches!(result, Err(MarketError::SlippageExceeded { .. })));
        assert_eq!(env.ledger.balance_of(&addr(TRADER)), before);
        assert_eq!(env.ledger.balance_of(&env.router.address()), 0);
    }

    #[test]
    fn test_routed_sell_requires_allowance() {
        let mut env = setup();
        let outcome = routed_buy(&mut env, COIN);
        let person = env.person;

        let result = env.router.sell(
            &mut env.factory,
            &mut env.treasury,
            &mut env.ledger,
            &addr(TRADER),
            &person,
            outcome.tokens_out,
            0,
        );
        assert!(matches!(
            result,
            Err(MarketError::Token(lib_tokens::TokenError::InsufficientAllowance { .. }))
        ));
    }

    #[test]
    fn test_routed_sell_round_trip() {
        let mut env = setup();
        let outcome = routed_buy(&mut env, COIN);
        let person = env.person;
        let router_address = env.router.address();

        {
            let (_, token) = env.factory.pair_mut(&person).unwrap();
            token
                .approve(&addr(TRADER), &router_address, outcome.tokens_out)
                .unwrap();
        }

        let before = env.ledger.balance_of(&addr(TRADER));
        let (sell_outcome, events) = env
            .router
            .sell(
                &mut env.factory,
                &mut env.treasury,
                &mut env.ledger,
                &addr(TRADER),
                &person,
                outcome.tokens_out,
                0,
            )
            .unwrap();

        assert!(sell_outcome.coin_out > 0);
        assert_eq!(
            env.ledger.balance_of(&addr(TRADER)),
            before + sell_outcome.coin_out
        );
        // Tokens fully burned, none stuck on the router
        let token = env.factory.token(&person).unwrap();
        assert_eq!(token.balance_of(&addr(TRADER)), 0);
        assert_eq!(token.balance_of(&router_address), 0);

        match &events[0] {
            MarketEvent::Sell { seller, .. } => assert_eq!(*seller, addr(TRADER)),
            other => panic!("expected Sell event, got {:?}", other),
        }
    }

    #[test]
    fn test_routed_sell_failure_returns_tokens() {
        let mut env = setup();
        let outcome = routed_buy(&mut env, COIN);
        let person = env.person;
        let router_address = env.router.address();

        {
            let (_, token) = env.factory.pair_mut(&person).unwrap();
            token
                .approve(&addr(TRADER), &router_address, outcome.tokens_out)
                .unwrap();
        }

        let result = env.router.sell(
            &mut env.factory,
            &mut env.treasury,
            &mut env.ledger,
            &addr(TRADER),
            &person,
            outcome.tokens_out,
            Amount::MAX,
        );
        assert!(matches!(result, Err(MarketError::SlippageExceeded { .. })));

        let token = env.factory.token(&person).unwrap();
        assert_eq!(token.balance_of(&addr(TRADER)), outcome.tokens_out);
        assert_eq!(token.balance_of(&router_address), 0);
    }

    #[test]
    fn test_graduated_token_routes_nowhere_yet() {
        let mut env = setup();
        let person = env.person;
        env.factory
            .graduate_token(&addr(OWNER), &person, addr(40))
            .unwrap();

        let result = env.router.buy(
            &mut env.factory,
            &mut env.treasury,
            &mut env.ledger,
            &addr(TRADER),
            &person,
            COIN,
            0,
        );
        assert!(matches!(result, Err(MarketError::NotGraduated)));

        let result = env.router.quote_buy(&env.factory, &person, COIN);
        assert!(matches!(result, Err(MarketError::NotGraduated)));
        let result = env.router.quote_sell(&env.factory, &person, COIN);
        assert!(matches!(result, Err(MarketError::NotGraduated)));
    }

    #[test]
    fn test_quotes_match_trades() {
        let mut env = setup();
        let person = env.person;
        let (quoted_tokens, quoted_fee) =
            env.router.quote_buy(&env.factory, &person, COIN).unwrap();
        let outcome = routed_buy(&mut env, COIN);
        assert_eq!(outcome.tokens_out, quoted_tokens);
        assert_eq!(outcome.fee, quoted_fee);
    }

    #[test]
    fn test_unknown_person_fails() {
        let mut env = setup();
        let missing = PersonId::from_u128(404);
        let result = env.router.buy(
            &mut env.factory,
            &mut env.treasury,
            &mut env.ledger,
            &addr(TRADER),
            &missing,
            COIN,
            0,
        );
        assert!(matches!(result, Err(MarketError::TokenNotFound(_))));
    }
}
