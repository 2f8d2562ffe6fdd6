//! Oracle Errors

use lib_types::Address;
use thiserror::Error;

/// Error during oracle operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Caller {0} is not authorized")]
    NotAuthorized(Address),

    #[error("Zero address not allowed here")]
    ZeroAddress,

    #[error("Agent {0} is already authorized")]
    AgentExists(Address),

    #[error("Agent {0} is not authorized")]
    AgentNotFound(Address),

    #[error("No report with id {0}")]
    ReportNotFound(u64),

    #[error("Agent {agent} already voted on report {report_id}")]
    AlreadyVoted { report_id: u64, agent: Address },

    #[error("Report {0} is already finalized")]
    AlreadyFinalized(u64),

    #[error("Impact score {0} outside [-100, +100]")]
    InvalidImpactScore(i16),
}

/// Result type for oracle operations
pub type OracleResult<T> = Result<T, OracleError>;
