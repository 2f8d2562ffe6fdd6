//! Soul Token Events
//!
//! Wiring changes are rare and administrative; both are emitted so indexers
//! can reconstruct the authority history of every token.

use lib_types::Address;
use serde::{Deserialize, Serialize};

use crate::types::Phase;

/// Token wiring events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenEvent {
    /// Minter authority rotated by the factory
    MinterUpdated {
        /// Token address
        token: Address,
        /// Previous minter
        old: Address,
        /// New minter (zero disables minting)
        new: Address,
    },

    /// Lifecycle phase advanced by the factory
    PhaseChanged {
        /// Token address
        token: Address,
        /// Previous phase
        old: Phase,
        /// New phase
        new: Phase,
    },
}
