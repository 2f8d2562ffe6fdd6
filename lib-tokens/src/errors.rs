//! Soul Token Errors

use lib_types::{Address, Amount};
use thiserror::Error;

use crate::types::Phase;

/// Error during token operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Only the current minter may mint or burn (caller {0})")]
    OnlyMinter(Address),

    #[error("Only the factory may rotate the minter or phase (caller {0})")]
    OnlyFactory(Address),

    #[error("Zero address not allowed here")]
    ZeroAddress,

    #[error("Zero amount not allowed")]
    ZeroAmount,

    #[error("Invalid token metadata: {0}")]
    InvalidMetadata(String),

    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: Amount, need: Amount },

    #[error("Insufficient allowance: have {have}, need {need}")]
    InsufficientAllowance { have: Amount, need: Amount },

    #[error("Phase can only advance: current {current}, requested {requested}")]
    PhaseRegression { current: Phase, requested: Phase },

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Permit deadline passed: deadline {deadline}, now {now}")]
    PermitExpired { deadline: u64, now: u64 },

    #[error("Permit signature invalid or not from owner")]
    InvalidSignature,
}

/// Result type for token operations
pub type TokenResult<T> = Result<T, TokenError>;
