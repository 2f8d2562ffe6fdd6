//! Soul Token Factory
//!
//! Deploys one token/curve pair per person at deterministic addresses,
//! keeps the canonical registry, and performs the post-graduation handoff
//! (phase advance + minter rotation).
//!
//! The factory owns the deployed contract instances; the router borrows a
//! pair for the duration of a trade. Addresses are derived from a versioned
//! domain tag, the factory address, the person id and a role salt, so the
//! same person always lands on the same pair of addresses.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

use lib_tokens::{Phase, SoulToken, TokenEvent};
use lib_types::{Address, Amount, PersonId, COIN};

use crate::curve::BondingCurve;
use crate::errors::{MarketError, MarketResult};
use crate::events::MarketEvent;
use crate::math::INITIAL_RESERVE;

/// Domain tag for deterministic pair addresses (versioned for migrations)
const ADDRESS_DOMAIN_TAG: &[u8] = b"NILE_SOUL_FACTORY_V1";

/// Default reserve level at which new curves graduate (50 coin)
pub const DEFAULT_GRADUATION_THRESHOLD: Amount = 50 * COIN;

/// Factory construction parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryConfig {
    /// Chain id baked into every token's permit domain
    pub chain_id: u64,
    /// Graduation threshold applied to curves deployed from now on
    pub default_graduation_threshold: Amount,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            chain_id: 8453,
            default_graduation_threshold: DEFAULT_GRADUATION_THRESHOLD,
        }
    }
}

/// Registry entry for a deployed pair. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Token address
    pub token: Address,
    /// Curve address
    pub curve: Address,
    /// Creator (fee beneficiary)
    pub creator: Address,
    /// Registration flag; never unset
    pub exists: bool,
}

/// Factory and registry for soul token / curve pairs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoulTokenFactory {
    /// This factory's own address
    address: Address,
    /// Administrative owner
    owner: Address,
    /// Treasury address wired into every curve
    treasury: Address,
    /// Construction parameters
    config: FactoryConfig,

    /// Registry: person → pair
    pairs: HashMap<PersonId, TokenPair>,
    /// Deployment order, append-only
    deployed_person_ids: Vec<PersonId>,
    /// Deployed token instances
    tokens: HashMap<PersonId, SoulToken>,
    /// Deployed curve instances
    curves: HashMap<PersonId, BondingCurve>,
}

impl SoulTokenFactory {
    /// Create a new factory
    pub fn new(
        address: Address,
        owner: Address,
        treasury: Address,
        config: FactoryConfig,
    ) -> MarketResult<Self> {
        if config.default_graduation_threshold <= INITIAL_RESERVE {
            return Err(MarketError::ThresholdTooLow {
                threshold: config.default_graduation_threshold,
                minimum: INITIAL_RESERVE,
            });
        }

        Ok(Self {
            address,
            owner,
            treasury,
            config,
            pairs: HashMap::new(),
            deployed_person_ids: Vec::new(),
            tokens: HashMap::new(),
            curves: HashMap::new(),
        })
    }

    // =========================================================================
    // Deployment
    // =========================================================================

    /// Deploy a token/curve pair for a person.
    ///
    /// The caller becomes the pair's creator and fee beneficiary. Fails if
    /// the person already has a registered pair.
    pub fn create_soul_token(
        &mut self,
        caller: &Address,
        person_id: PersonId,
        name: String,
        symbol: String,
    ) -> MarketResult<((Address, Address), MarketEvent)> {
        if self.pairs.get(&person_id).map(|p| p.exists).unwrap_or(false) {
            return Err(MarketError::TokenAlreadyExists(person_id));
        }

        let token_address = self.derive_pair_address(&person_id, b"token");
        let curve_address = self.derive_pair_address(&person_id, b"curve");

        let mut token = SoulToken::deploy(
            person_id,
            name.clone(),
            symbol.clone(),
            token_address,
            self.address,
            self.config.chain_id,
        )?;
        token.set_minter(&self.address, curve_address)?;

        let curve = BondingCurve::new(
            curve_address,
            person_id,
            token_address,
            self.treasury,
            *caller,
            self.config.default_graduation_threshold,
        )?;

        self.pairs.insert(
            person_id,
            TokenPair {
                token: token_address,
                curve: curve_address,
                creator: *caller,
                exists: true,
            },
        );
        self.deployed_person_ids.push(person_id);
        self.tokens.insert(person_id, token);
        self.curves.insert(person_id, curve);

        info!(
            person_id = %person_id,
            token = %token_address,
            curve = %curve_address,
            symbol = %symbol,
            "soul token deployed"
        );

        let event = MarketEvent::SoulTokenCreated {
            person_id,
            token: token_address,
            curve: curve_address,
            creator: *caller,
            name,
            symbol,
        };
        Ok(((token_address, curve_address), event))
    }

    // =========================================================================
    // Registry views
    // =========================================================================

    /// Look up the registered pair addresses for a person
    pub fn get_token_pair(&self, person_id: &PersonId) -> MarketResult<(Address, Address)> {
        match self.pairs.get(person_id) {
            Some(pair) if pair.exists => Ok((pair.token, pair.curve)),
            _ => Err(MarketError::TokenNotFound(*person_id)),
        }
    }

    /// Full registry entry for a person
    pub fn pair_entry(&self, person_id: &PersonId) -> Option<&TokenPair> {
        self.pairs.get(person_id).filter(|p| p.exists)
    }

    /// Number of deployed pairs
    pub fn total_tokens(&self) -> u64 {
        self.deployed_person_ids.len() as u64
    }

    /// Deployment order, oldest first
    pub fn deployed_person_ids(&self) -> &[PersonId] {
        &self.deployed_person_ids
    }

    /// Threshold applied to curves deployed from now on
    pub fn default_graduation_threshold(&self) -> Amount {
        self.config.default_graduation_threshold
    }

    /// Borrow a deployed token
    pub fn token(&self, person_id: &PersonId) -> MarketResult<&SoulToken> {
        self.tokens
            .get(person_id)
            .ok_or(MarketError::TokenNotFound(*person_id))
    }

    /// Borrow a deployed curve
    pub fn curve(&self, person_id: &PersonId) -> MarketResult<&BondingCurve> {
        self.curves
            .get(person_id)
            .ok_or(MarketError::TokenNotFound(*person_id))
    }

    /// Borrow a pair mutably for the trade path.
    ///
    /// The curve and token live in disjoint tables, so the two mutable
    /// borrows coexist.
    pub fn pair_mut(
        &mut self,
        person_id: &PersonId,
    ) -> MarketResult<(&mut BondingCurve, &mut SoulToken)> {
        let curve = self
            .curves
            .get_mut(person_id)
            .ok_or(MarketError::TokenNotFound(*person_id))?;
        let token = self
            .tokens
            .get_mut(person_id)
            .ok_or(MarketError::TokenNotFound(*person_id))?;
        Ok((curve, token))
    }

    // =========================================================================
    // Owner operations
    // =========================================================================

    /// Change the threshold for curves deployed in the future. Owner only;
    /// already-deployed curves keep the threshold they were born with.
    pub fn set_graduation_threshold(&mut self, caller: &Address, new: Amount) -> MarketResult<()> {
        self.require_owner(caller)?;
        if new <= INITIAL_RESERVE {
            return Err(MarketError::ThresholdTooLow {
                threshold: new,
                minimum: INITIAL_RESERVE,
            });
        }
        self.config.default_graduation_threshold = new;
        Ok(())
    }

    /// Complete a token's graduation: advance the phase to AMM and rotate
    /// the minter to the post-graduation venue. Owner only.
    pub fn graduate_token(
        &mut self,
        caller: &Address,
        person_id: &PersonId,
        new_minter: Address,
    ) -> MarketResult<Vec<TokenEvent>> {
        self.require_owner(caller)?;

        let curve_active = self
            .curves
            .get(person_id)
            .ok_or(MarketError::TokenNotFound(*person_id))?
            .is_active();
        let token = self
            .tokens
            .get_mut(person_id)
            .ok_or(MarketError::TokenNotFound(*person_id))?;
        if token.graduated() {
            return Err(MarketError::AlreadyGraduated);
        }
        if curve_active {
            // Allowed but worth flagging: the curve has not hit its
            // threshold, so rotating the minter halts curve trading.
            warn!(person_id = %person_id, "graduating a token whose curve is still active");
        }

        let factory = self.address;
        let phase_event = token.set_phase(&factory, Phase::Amm)?;
        let minter_event = token.set_minter(&factory, new_minter)?;

        info!(person_id = %person_id, new_minter = %new_minter, "token graduated to AMM phase");
        Ok(vec![phase_event, minter_event])
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn require_owner(&self, caller: &Address) -> MarketResult<()> {
        if *caller != self.owner {
            return Err(MarketError::NotAuthorized(*caller));
        }
        Ok(())
    }

    /// Deterministic, collision-resistant pair address derivation.
    ///
    /// Preimage: `tag || factory:32 || person_id:16 || len(role):u16 || role`
    fn derive_pair_address(&self, person_id: &PersonId, role: &[u8]) -> Address {
        let mut data = Vec::with_capacity(ADDRESS_DOMAIN_TAG.len() + 32 + 16 + 2 + role.len());
        data.extend_from_slice(ADDRESS_DOMAIN_TAG);
        data.extend_from_slice(self.address.as_bytes());
        data.extend_from_slice(person_id.as_bytes());
        data.extend_from_slice(&(role.len() as u16).to_be_bytes());
        data.extend_from_slice(role);
        Address::new(*blake3::hash(&data).as_bytes())
    }
}
