//! Soul Token Contract
//!
//! Standard fungible semantics plus the NILE lifecycle gating:
//! - `mint` / `burn` only by the current `minter`
//! - `set_minter` / `set_phase` only by the immutable `factory`
//! - phase advances strictly forward; entering AMM graduates the token
//!
//! # Invariants
//! - `graduated == true` iff `phase ∈ {Amm, OrderBook}`
//! - `total_supply` changes only through the minter gate
//! - balances and supply always move together (mint credits, burn debits)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use lib_types::{Address, Amount, PersonId};

use crate::errors::{TokenError, TokenResult};
use crate::events::TokenEvent;
use crate::permit::{permit_digest, recover_signer};
use crate::types::Phase;

/// Maximum symbol length accepted at deployment
const MAX_SYMBOL_LEN: usize = 10;

/// Per-person fungible token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoulToken {
    // === Identity ===
    /// Subject this token represents
    pub person_id: PersonId,
    /// Token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    /// Token decimals (always 18)
    pub decimals: u8,

    // === Wiring ===
    /// This token's own address (permit domain separation)
    address: Address,
    /// Deploying factory; the only authority over minter and phase
    factory: Address,
    /// Current minter (the curve pre-graduation; zero disables minting)
    minter: Address,
    /// Chain id baked into permit digests
    chain_id: u64,

    // === Lifecycle ===
    /// Current phase
    phase: Phase,
    /// Set once the phase first reaches AMM; never cleared
    graduated: bool,

    // === Ledger ===
    /// Total supply in circulation
    total_supply: Amount,
    /// Balances by holder
    balances: HashMap<Address, Amount>,
    /// Allowances: owner → spender → amount
    allowances: HashMap<Address, HashMap<Address, Amount>>,
    /// Permit nonces by owner
    nonces: HashMap<Address, u64>,
}

impl SoulToken {
    /// Deploy a new soul token.
    ///
    /// The minter starts unset (zero); the factory wires the bonding curve
    /// in immediately after deploying the pair.
    pub fn deploy(
        person_id: PersonId,
        name: String,
        symbol: String,
        address: Address,
        factory: Address,
        chain_id: u64,
    ) -> TokenResult<Self> {
        if name.is_empty() {
            return Err(TokenError::InvalidMetadata("name cannot be empty".to_string()));
        }
        if symbol.is_empty() || symbol.len() > MAX_SYMBOL_LEN {
            return Err(TokenError::InvalidMetadata(format!(
                "symbol must be 1..={} characters",
                MAX_SYMBOL_LEN
            )));
        }
        if address.is_zero() || factory.is_zero() {
            return Err(TokenError::ZeroAddress);
        }

        Ok(Self {
            person_id,
            name,
            symbol,
            decimals: 18,
            address,
            factory,
            minter: Address::zero(),
            chain_id,
            phase: Phase::Bonding,
            graduated: false,
            total_supply: 0,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            nonces: HashMap::new(),
        })
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// This token's address
    pub fn address(&self) -> Address {
        self.address
    }

    /// The deploying factory
    pub fn factory(&self) -> Address {
        self.factory
    }

    /// The current minter
    pub fn minter(&self) -> Address {
        self.minter
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the token has graduated off the curve
    pub fn graduated(&self) -> bool {
        self.graduated
    }

    /// Total supply in circulation
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Balance of a holder
    pub fn balance_of(&self, holder: &Address) -> Amount {
        *self.balances.get(holder).unwrap_or(&0)
    }

    /// Remaining allowance from owner to spender
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|per_spender| per_spender.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Next permit nonce for an owner
    pub fn nonce_of(&self, owner: &Address) -> u64 {
        *self.nonces.get(owner).unwrap_or(&0)
    }

    // =========================================================================
    // Fungible surface
    // =========================================================================

    /// Move tokens from the caller to `to`
    pub fn transfer(&mut self, caller: &Address, to: &Address, amount: Amount) -> TokenResult<()> {
        if to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        if amount == 0 {
            return Err(TokenError::ZeroAmount);
        }
        self.debit(caller, amount)?;
        self.credit(to, amount)
    }

    /// Set the allowance from the caller to `spender`
    pub fn approve(&mut self, caller: &Address, spender: &Address, amount: Amount) -> TokenResult<()> {
        if spender.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        self.allowances
            .entry(*caller)
            .or_default()
            .insert(*spender, amount);
        Ok(())
    }

    /// Move tokens from `from` to `to` on the strength of an allowance
    pub fn transfer_from(
        &mut self,
        caller: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> TokenResult<()> {
        if to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        if amount == 0 {
            return Err(TokenError::ZeroAmount);
        }

        let allowed = self.allowance(from, caller);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance {
                have: allowed,
                need: amount,
            });
        }

        self.debit(from, amount)?;
        self.credit(to, amount)?;
        self.allowances
            .entry(*from)
            .or_default()
            .insert(*caller, allowed - amount);
        Ok(())
    }

    /// Grant an allowance via an off-chain ed25519 signature.
    ///
    /// `now` is the canonical transaction timestamp supplied by the
    /// environment. The signer's key must hash to `owner`.
    #[allow(clippy::too_many_arguments)]
    pub fn permit(
        &mut self,
        owner: &Address,
        spender: &Address,
        value: Amount,
        deadline: u64,
        now: u64,
        key_bytes: &[u8; 32],
        signature: &[u8; 64],
    ) -> TokenResult<()> {
        if spender.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        if now > deadline {
            return Err(TokenError::PermitExpired { deadline, now });
        }

        let nonce = self.nonce_of(owner);
        let digest = permit_digest(
            self.chain_id,
            &self.address,
            &self.person_id,
            owner,
            spender,
            value,
            nonce,
            deadline,
        );
        let signer = recover_signer(&digest, key_bytes, signature)?;
        if signer != *owner {
            return Err(TokenError::InvalidSignature);
        }

        self.nonces.insert(*owner, nonce + 1);
        self.allowances
            .entry(*owner)
            .or_default()
            .insert(*spender, value);
        Ok(())
    }

    // =========================================================================
    // Minter gate
    // =========================================================================

    /// Mint new tokens to `to`. Minter only.
    pub fn mint(&mut self, caller: &Address, to: &Address, amount: Amount) -> TokenResult<()> {
        self.require_minter(caller)?;
        if to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }

        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        self.credit(to, amount)
    }

    /// Burn tokens from `from`. Minter only.
    pub fn burn(&mut self, caller: &Address, from: &Address, amount: Amount) -> TokenResult<()> {
        self.require_minter(caller)?;
        self.debit(from, amount)?;
        // Debit cannot exceed supply: every balance was minted into supply
        self.total_supply -= amount;
        Ok(())
    }

    // =========================================================================
    // Factory gate
    // =========================================================================

    /// Rotate the minter. Factory only; zero is allowed and disables minting.
    pub fn set_minter(&mut self, caller: &Address, new: Address) -> TokenResult<TokenEvent> {
        self.require_factory(caller)?;
        let old = self.minter;
        self.minter = new;
        Ok(TokenEvent::MinterUpdated {
            token: self.address,
            old,
            new,
        })
    }

    /// Advance the lifecycle phase. Factory only; phases never move backwards.
    pub fn set_phase(&mut self, caller: &Address, new: Phase) -> TokenResult<TokenEvent> {
        self.require_factory(caller)?;
        if new <= self.phase {
            return Err(TokenError::PhaseRegression {
                current: self.phase,
                requested: new,
            });
        }

        let old = self.phase;
        self.phase = new;
        if new.is_graduated() {
            self.graduated = true;
        }
        Ok(TokenEvent::PhaseChanged {
            token: self.address,
            old,
            new,
        })
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn require_minter(&self, caller: &Address) -> TokenResult<()> {
        if self.minter.is_zero() || *caller != self.minter {
            return Err(TokenError::OnlyMinter(*caller));
        }
        Ok(())
    }

    fn require_factory(&self, caller: &Address) -> TokenResult<()> {
        if *caller != self.factory {
            return Err(TokenError::OnlyFactory(*caller));
        }
        Ok(())
    }

    fn credit(&mut self, to: &Address, amount: Amount) -> TokenResult<()> {
        let entry = self.balances.entry(*to).or_insert(0);
        *entry = entry.checked_add(amount).ok_or(TokenError::Overflow)?;
        Ok(())
    }

    fn debit(&mut self, from: &Address, amount: Amount) -> TokenResult<()> {
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(TokenError::InsufficientBalance {
                have: balance,
                need: amount,
            });
        }
        self.balances.insert(*from, balance - amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    const CHAIN_ID: u64 = 8453;

    fn addr(id: u8) -> Address {
        Address::new([id; 32])
    }

    fn test_token() -> SoulToken {
        SoulToken::deploy(
            PersonId::from_u128(1),
            "Test".to_string(),
            "TST".to_string(),
            addr(10),
            addr(11),
            CHAIN_ID,
        )
        .unwrap()
    }

    fn wired_token() -> SoulToken {
        let mut token = test_token();
        token.set_minter(&addr(11), addr(12)).unwrap();
        token
    }

    #[test]
    fn test_deploy_defaults() {
        let token = test_token();
        assert_eq!(token.phase(), Phase::Bonding);
        assert!(!token.graduated());
        assert_eq!(token.total_supply(), 0);
        assert_eq!(token.decimals, 18);
        assert!(token.minter().is_zero());
    }

    #[test]
    fn test_mint_requires_minter() {
        let mut token = test_token();
        // Minter not wired yet: nobody can mint
        let result = token.mint(&addr(1), &addr(2), 100);
        assert!(matches!(result, Err(TokenError::OnlyMinter(_))));

        let mut token = wired_token();
        token.mint(&addr(12), &addr(2), 100).unwrap();
        assert_eq!(token.balance_of(&addr(2)), 100);
        assert_eq!(token.total_supply(), 100);

        let result = token.mint(&addr(99), &addr(2), 100);
        assert!(matches!(result, Err(TokenError::OnlyMinter(_))));
    }

    #[test]
    fn test_mint_to_zero_address_fails() {
        let mut token = wired_token();
        let result = token.mint(&addr(12), &Address::zero(), 100);
        assert!(matches!(result, Err(TokenError::ZeroAddress)));
    }

    #[test]
    fn test_burn_more_than_balance_fails() {
        let mut token = wired_token();
        token.mint(&addr(12), &addr(2), 100).unwrap();

        let result = token.burn(&addr(12), &addr(2), 150);
        assert!(matches!(
            result,
            Err(TokenError::InsufficientBalance { have: 100, need: 150 })
        ));

        token.burn(&addr(12), &addr(2), 60).unwrap();
        assert_eq!(token.balance_of(&addr(2)), 40);
        assert_eq!(token.total_supply(), 40);
    }

    #[test]
    fn test_transfer_and_allowance_flow() {
        let mut token = wired_token();
        token.mint(&addr(12), &addr(2), 1_000).unwrap();

        token.transfer(&addr(2), &addr(3), 300).unwrap();
        assert_eq!(token.balance_of(&addr(2)), 700);
        assert_eq!(token.balance_of(&addr(3)), 300);

        token.approve(&addr(2), &addr(4), 500).unwrap();
        assert_eq!(token.allowance(&addr(2), &addr(4)), 500);

        token.transfer_from(&addr(4), &addr(2), &addr(5), 200).unwrap();
        assert_eq!(token.balance_of(&addr(5)), 200);
        assert_eq!(token.allowance(&addr(2), &addr(4)), 300);

        let result = token.transfer_from(&addr(4), &addr(2), &addr(5), 400);
        assert!(matches!(
            result,
            Err(TokenError::InsufficientAllowance { have: 300, need: 400 })
        ));
    }

    #[test]
    fn test_minter_rotation_to_zero_disables_minting() {
        let mut token = wired_token();
        token.mint(&addr(12), &addr(2), 100).unwrap();

        let event = token.set_minter(&addr(11), Address::zero()).unwrap();
        assert!(matches!(event, TokenEvent::MinterUpdated { .. }));

        let result = token.mint(&addr(12), &addr(2), 100);
        assert!(matches!(result, Err(TokenError::OnlyMinter(_))));
    }

    #[test]
    fn test_set_minter_requires_factory() {
        let mut token = test_token();
        let result = token.set_minter(&addr(99), addr(12));
        assert!(matches!(result, Err(TokenError::OnlyFactory(_))));
    }

    #[test]
    fn test_phase_advances_and_graduates() {
        let mut token = test_token();
        assert!(!token.graduated());

        token.set_phase(&addr(11), Phase::Amm).unwrap();
        assert!(token.graduated());
        assert_eq!(token.phase(), Phase::Amm);

        // Regression is rejected, graduation sticks
        let result = token.set_phase(&addr(11), Phase::Bonding);
        assert!(matches!(result, Err(TokenError::PhaseRegression { .. })));
        assert!(token.graduated());

        token.set_phase(&addr(11), Phase::OrderBook).unwrap();
        assert!(token.graduated());
    }

    #[test]
    fn test_permit_grants_allowance_and_burns_nonce() {
        let mut token = test_token();
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let key_bytes = key.verifying_key().to_bytes();
        let owner = Address::from_public_key(&key_bytes);
        let spender = addr(4);

        let digest = crate::permit::permit_digest(
            CHAIN_ID,
            &token.address(),
            &token.person_id,
            &owner,
            &spender,
            777,
            0,
            1_000,
        );
        let signature = key.sign(&digest).to_bytes();

        token
            .permit(&owner, &spender, 777, 1_000, 500, &key_bytes, &signature)
            .unwrap();
        assert_eq!(token.allowance(&owner, &spender), 777);
        assert_eq!(token.nonce_of(&owner), 1);

        // Replay fails: the nonce moved
        let result = token.permit(&owner, &spender, 777, 1_000, 500, &key_bytes, &signature);
        assert!(matches!(result, Err(TokenError::InvalidSignature)));
    }

    #[test]
    fn test_permit_expired() {
        let mut token = test_token();
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let key_bytes = key.verifying_key().to_bytes();
        let owner = Address::from_public_key(&key_bytes);

        let result = token.permit(&owner, &addr(4), 1, 100, 101, &key_bytes, &[0u8; 64]);
        assert!(matches!(
            result,
            Err(TokenError::PermitExpired { deadline: 100, now: 101 })
        ));
    }

    #[test]
    fn test_permit_rejects_foreign_signer() {
        let mut token = test_token();
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let key_bytes = key.verifying_key().to_bytes();
        // Owner is NOT the address of the signing key
        let owner = addr(9);
        let spender = addr(4);

        let digest = crate::permit::permit_digest(
            CHAIN_ID,
            &token.address(),
            &token.person_id,
            &owner,
            &spender,
            777,
            0,
            1_000,
        );
        let signature = key.sign(&digest).to_bytes();

        let result = token.permit(&owner, &spender, 777, 1_000, 500, &key_bytes, &signature);
        assert!(matches!(result, Err(TokenError::InvalidSignature)));
    }

    #[test]
    fn test_serde_round_trip() {
        let mut token = wired_token();
        token.mint(&addr(12), &addr(2), 123).unwrap();

        let json = serde_json::to_string(&token).unwrap();
        let back: SoulToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back.balance_of(&addr(2)), 123);
        assert_eq!(back.total_supply(), 123);
        assert_eq!(back.minter(), addr(12));
    }
}
