//! Oracle Events

use lib_types::{Address, PersonId};
use serde::{Deserialize, Serialize};

/// Oracle state-change events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OracleEvent {
    /// An agent was added to the authorized set
    AgentAuthorized {
        /// The new agent
        agent: Address,
    },

    /// An agent was removed from the authorized set
    AgentRevoked {
        /// The removed agent
        agent: Address,
    },

    /// A report was submitted (the submitter is pre-recorded as confirming)
    ReportSubmitted {
        /// Allocated report id
        report_id: u64,
        /// Subject of the report
        person_id: PersonId,
        /// Submitting agent
        submitter: Address,
    },

    /// An agent voted on a pending report
    VoteCast {
        /// Report voted on
        report_id: u64,
        /// Voting agent
        agent: Address,
        /// Confirmation (true) or rejection (false)
        approve: bool,
    },

    /// A report reached a terminal decision
    ReportFinalized {
        /// Finalized report id
        report_id: u64,
        /// Whether the report was accepted
        accepted: bool,
        /// Impact score carried by the report
        impact_score: i16,
    },
}
