//! Treasury Errors

use lib_types::{Address, Amount, CoinError};
use thiserror::Error;

/// Error during treasury operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreasuryError {
    #[error("Caller {0} is not authorized")]
    NotAuthorized(Address),

    #[error("Zero address not allowed here")]
    ZeroAddress,

    #[error("Nothing to withdraw")]
    InsufficientBalance,

    #[error("Attached value {attached} does not equal fee components {expected}")]
    FeeMismatch { attached: Amount, expected: Amount },

    #[error("Native transfer failed: {0}")]
    TransferFailed(#[from] CoinError),

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Re-entrant call rejected")]
    Reentrancy,
}

/// Result type for treasury operations
pub type TreasuryResult<T> = Result<T, TreasuryError>;
