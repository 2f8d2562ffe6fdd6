//! Oracle report state.

use lib_types::{Address, PersonId};
use serde::{Deserialize, Serialize};

/// Lower bound of a valid impact score
pub const MIN_IMPACT_SCORE: i16 = -100;

/// Upper bound of a valid impact score
pub const MAX_IMPACT_SCORE: i16 = 100;

/// A submitted real-world event report.
///
/// Created by an authorized agent, voted on until finalized, then frozen:
/// once `finalized` is set, `accepted` and `impact_score` never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Report id, allocated sequentially at submission
    pub report_id: u64,
    /// Subject the event concerns
    pub person_id: PersonId,
    /// Producer-defined event category ("news", "result", "social", ...)
    pub event_type: String,
    /// Human-readable headline
    pub headline: String,
    /// Scoring impact in [-100, +100]
    pub impact_score: i16,

    /// Confirmations so far (submission counts as the first)
    pub confirmations: u32,
    /// Rejections so far
    pub rejections: u32,
    /// Confirmations needed to accept; snapshotted at submission
    pub required_quorum: u32,
    /// Agent count at submission; the rejection bar derives from it
    pub agent_count_at_submission: u32,

    /// Whether a terminal decision was reached
    pub finalized: bool,
    /// Terminal decision (meaningful once finalized)
    pub accepted: bool,

    /// Submitting agent
    pub submitter: Address,
    /// Submission timestamp supplied by the environment
    pub submitted_at: u64,
}

impl Report {
    /// Whether this report can still reach its acceptance quorum
    pub fn quorum_reachable(&self) -> bool {
        self.rejections <= self.agent_count_at_submission - self.required_quorum
    }
}
