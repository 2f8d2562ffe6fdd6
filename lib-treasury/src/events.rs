//! Treasury Events

use lib_types::{Address, Amount};
use serde::{Deserialize, Serialize};

/// Treasury state-change events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreasuryEvent {
    /// A curve forwarded a split trading fee
    FeesReceived {
        /// Creator credited with the creator share
        creator: Address,
        /// Creator share
        creator_fee: Amount,
        /// Protocol share
        protocol_fee: Amount,
        /// Staker-pool share
        staker_fee: Amount,
    },

    /// A creator drained their accrued balance
    CreatorWithdraw {
        /// Withdrawing creator
        creator: Address,
        /// Amount paid out
        amount: Amount,
    },

    /// The owner drained pending protocol fees to the protocol wallet
    ProtocolWithdraw {
        /// Receiving wallet
        wallet: Address,
        /// Amount paid out
        amount: Amount,
    },

    /// The protocol wallet was rotated
    ProtocolWalletUpdated {
        /// Previous wallet
        old: Address,
        /// New wallet
        new: Address,
    },
}
