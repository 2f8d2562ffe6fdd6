//! Market Events
//!
//! All state changes on the trading path emit events; downstream indexers
//! (dashboards, the read-only API) treat these as the source of truth.
//! Every variant carries the person id so indexers can filter per subject.

use lib_types::{Address, Amount, PersonId};
use serde::{Deserialize, Serialize};

/// Trading-path events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketEvent {
    /// A new token/curve pair was deployed
    SoulTokenCreated {
        /// Subject of the new token
        person_id: PersonId,
        /// Token address
        token: Address,
        /// Curve address
        curve: Address,
        /// Creator (fee beneficiary)
        creator: Address,
        /// Token name
        name: String,
        /// Token symbol
        symbol: String,
    },

    /// Tokens bought from a curve
    Buy {
        /// Subject traded
        person_id: PersonId,
        /// Buying account
        buyer: Address,
        /// Coin paid in (gross, fee included)
        coin_in: Amount,
        /// Tokens minted out
        tokens_out: Amount,
        /// Fee taken
        fee: Amount,
        /// Marginal price after the trade (wad)
        new_price: Amount,
    },

    /// Tokens sold back to a curve
    Sell {
        /// Subject traded
        person_id: PersonId,
        /// Selling account
        seller: Address,
        /// Tokens burned in
        tokens_in: Amount,
        /// Coin paid out (net of fee)
        coin_out: Amount,
        /// Fee taken
        fee: Amount,
        /// Marginal price after the trade (wad)
        new_price: Amount,
    },

    /// A curve reached its graduation threshold and froze
    GraduationTriggered {
        /// Subject graduating
        person_id: PersonId,
        /// Final reserve at graduation
        reserve: Amount,
    },
}

impl MarketEvent {
    /// Get the person id this event belongs to
    pub fn person_id(&self) -> &PersonId {
        match self {
            MarketEvent::SoulTokenCreated { person_id, .. } => person_id,
            MarketEvent::Buy { person_id, .. } => person_id,
            MarketEvent::Sell { person_id, .. } => person_id,
            MarketEvent::GraduationTriggered { person_id, .. } => person_id,
        }
    }

    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            MarketEvent::SoulTokenCreated { .. } => "soul_token_created",
            MarketEvent::Buy { .. } => "buy",
            MarketEvent::Sell { .. } => "sell",
            MarketEvent::GraduationTriggered { .. } => "graduation_triggered",
        }
    }
}

/// Event indexer interface
///
/// Implement this to index market events for API queries.
pub trait MarketEventIndexer {
    /// Index a new event
    fn index_event(&mut self, event: MarketEvent);

    /// Get all events for a person
    fn events_for(&self, person_id: &PersonId) -> Vec<&MarketEvent>;

    /// Get the latest event for a person
    fn latest_for(&self, person_id: &PersonId) -> Option<&MarketEvent>;
}

/// In-memory event indexer for tests and local simulation
#[derive(Debug, Clone, Default)]
pub struct InMemoryMarketEventIndexer {
    events: Vec<MarketEvent>,
}

impl InMemoryMarketEventIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

impl MarketEventIndexer for InMemoryMarketEventIndexer {
    fn index_event(&mut self, event: MarketEvent) {
        self.events.push(event);
    }

    fn events_for(&self, person_id: &PersonId) -> Vec<&MarketEvent> {
        self.events
            .iter()
            .filter(|e| e.person_id() == person_id)
            .collect()
    }

    fn latest_for(&self, person_id: &PersonId) -> Option<&MarketEvent> {
        self.events.iter().rev().find(|e| e.person_id() == person_id)
    }
}
