//! Market Errors
//!
//! One taxonomy across the curve, factory and router. Token-side and
//! arithmetic failures are wrapped rather than flattened so the original
//! cause survives to the caller.

use lib_types::{Address, Amount, CoinError, PersonId};
use thiserror::Error;

use lib_fixed::FixedPointError;
use lib_tokens::TokenError;

/// Error during market operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    #[error("Token already exists for person {0}")]
    TokenAlreadyExists(PersonId),

    #[error("No token registered for person {0}")]
    TokenNotFound(PersonId),

    #[error("Curve is no longer active")]
    CurveNotActive,

    #[error("Payment missing or insufficient")]
    InsufficientPayment,

    #[error("Token amount missing or insufficient")]
    InsufficientTokens,

    #[error("Slippage exceeded: output {amount_out} below minimum {min_out}")]
    SlippageExceeded { min_out: Amount, amount_out: Amount },

    #[error("Native transfer failed: {0}")]
    TransferFailed(#[from] CoinError),

    #[error("Caller {0} is not authorized")]
    NotAuthorized(Address),

    #[error("Post-graduation market is not wired up yet")]
    NotGraduated,

    #[error("Token has already graduated")]
    AlreadyGraduated,

    #[error("Graduation threshold {threshold} must exceed the virtual reserve {minimum}")]
    ThresholdTooLow { threshold: Amount, minimum: Amount },

    #[error("Re-entrant call rejected")]
    Reentrancy,

    #[error("Token operation failed: {0}")]
    Token(#[from] TokenError),

    #[error("Curve math failed: {0}")]
    Math(#[from] FixedPointError),

    #[error("Arithmetic overflow")]
    Overflow,
}

/// Result type for market operations
pub type MarketResult<T> = Result<T, MarketError>;
