//! Oracle Contract
//!
//! Maintains the authorized agent set and the report store, and drives
//! each report through submission → voting → finalization.
//!
//! # Invariants
//! - `confirmations + rejections ≤ agent_count_at_submission` for every
//!   report (a pending report always finalizes by its last possible vote)
//! - `finalized` is monotone; a finalized report's decision is frozen
//! - one vote per agent per report, the submitter's confirmation included

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use lib_types::{Address, PersonId};

use crate::errors::{OracleError, OracleResult};
use crate::events::OracleEvent;
use crate::report::{Report, MAX_IMPACT_SCORE, MIN_IMPACT_SCORE};

/// Quorum oracle over real-world event reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NileOracle {
    /// Administrative owner
    owner: Address,
    /// Authorized agent set (sorted for deterministic serialization)
    agents: BTreeSet<Address>,
    /// All reports by id
    reports: BTreeMap<u64, Report>,
    /// Next report id / number of reports ever submitted
    report_count: u64,
    /// Voters per report, the submitter included
    voted: BTreeMap<u64, BTreeSet<Address>>,
}

impl NileOracle {
    /// Create a new oracle with an empty agent set
    pub fn new(owner: Address) -> OracleResult<Self> {
        if owner.is_zero() {
            return Err(OracleError::ZeroAddress);
        }
        Ok(Self {
            owner,
            agents: BTreeSet::new(),
            reports: BTreeMap::new(),
            report_count: 0,
            voted: BTreeMap::new(),
        })
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Number of currently authorized agents
    pub fn agent_count(&self) -> u32 {
        self.agents.len() as u32
    }

    /// Whether an address is an authorized agent
    pub fn is_authorized(&self, agent: &Address) -> bool {
        self.agents.contains(agent)
    }

    /// Number of reports ever submitted
    pub fn report_count(&self) -> u64 {
        self.report_count
    }

    /// Snapshot of a report
    pub fn get_report(&self, report_id: u64) -> OracleResult<Report> {
        self.reports
            .get(&report_id)
            .cloned()
            .ok_or(OracleError::ReportNotFound(report_id))
    }

    /// Whether an agent already voted on a report
    pub fn has_voted(&self, report_id: u64, agent: &Address) -> bool {
        self.voted
            .get(&report_id)
            .map(|voters| voters.contains(agent))
            .unwrap_or(false)
    }

    // =========================================================================
    // Agent set
    // =========================================================================

    /// Add an agent. Owner only.
    pub fn authorize_agent(&mut self, caller: &Address, agent: Address) -> OracleResult<OracleEvent> {
        self.require_owner(caller)?;
        if agent.is_zero() {
            return Err(OracleError::ZeroAddress);
        }
        if !self.agents.insert(agent) {
            return Err(OracleError::AgentExists(agent));
        }

        info!(agent = %agent, agent_count = self.agents.len(), "oracle agent authorized");
        Ok(OracleEvent::AgentAuthorized { agent })
    }

    /// Remove an agent. Owner only. Votes already cast stand; the agent
    /// only loses future voting rights.
    pub fn revoke_agent(&mut self, caller: &Address, agent: Address) -> OracleResult<OracleEvent> {
        self.require_owner(caller)?;
        if !self.agents.remove(&agent) {
            return Err(OracleError::AgentNotFound(agent));
        }

        info!(agent = %agent, agent_count = self.agents.len(), "oracle agent revoked");
        Ok(OracleEvent::AgentRevoked { agent })
    }

    // =========================================================================
    // Reports
    // =========================================================================

    /// Submit a report. Agent only.
    ///
    /// The submitter is pre-recorded as the first confirmation and the
    /// quorum bar is snapshotted from the current agent count:
    /// `ceil(2·N/3)`, at least 1. A quorum of 1 finalizes immediately.
    pub fn submit_report(
        &mut self,
        caller: &Address,
        person_id: PersonId,
        event_type: String,
        headline: String,
        impact_score: i16,
        submitted_at: u64,
    ) -> OracleResult<(u64, Vec<OracleEvent>)> {
        self.require_agent(caller)?;
        if !(MIN_IMPACT_SCORE..=MAX_IMPACT_SCORE).contains(&impact_score) {
            return Err(OracleError::InvalidImpactScore(impact_score));
        }

        let agent_count = self.agent_count();
        let required_quorum = quorum_for(agent_count);
        let report_id = self.report_count;
        self.report_count += 1;

        let mut report = Report {
            report_id,
            person_id,
            event_type,
            headline,
            impact_score,
            confirmations: 1,
            rejections: 0,
            required_quorum,
            agent_count_at_submission: agent_count,
            finalized: false,
            accepted: false,
            submitter: *caller,
            submitted_at,
        };
        self.voted.entry(report_id).or_default().insert(*caller);

        let mut events = vec![OracleEvent::ReportSubmitted {
            report_id,
            person_id,
            submitter: *caller,
        }];

        if required_quorum <= 1 {
            report.finalized = true;
            report.accepted = true;
            info!(report_id, "single-agent quorum; report accepted at submission");
            events.push(OracleEvent::ReportFinalized {
                report_id,
                accepted: true,
                impact_score: report.impact_score,
            });
        }

        debug!(
            report_id,
            person_id = %person_id,
            required_quorum,
            agent_count,
            "report submitted"
        );
        self.reports.insert(report_id, report);
        Ok((report_id, events))
    }

    /// Vote on a pending report. Agent only, one vote per agent.
    ///
    /// Finalizes as accepted once confirmations reach the quorum, and as
    /// rejected once enough rejections make the quorum arithmetically
    /// unreachable.
    pub fn vote(
        &mut self,
        caller: &Address,
        report_id: u64,
        approve: bool,
    ) -> OracleResult<Vec<OracleEvent>> {
        self.require_agent(caller)?;

        let report = self
            .reports
            .get_mut(&report_id)
            .ok_or(OracleError::ReportNotFound(report_id))?;
        if report.finalized {
            return Err(OracleError::AlreadyFinalized(report_id));
        }

        let voters = self.voted.entry(report_id).or_default();
        if !voters.insert(*caller) {
            return Err(OracleError::AlreadyVoted {
                report_id,
                agent: *caller,
            });
        }

        if approve {
            report.confirmations += 1;
        } else {
            report.rejections += 1;
        }

        let mut events = vec![OracleEvent::VoteCast {
            report_id,
            agent: *caller,
            approve,
        }];

        if report.confirmations >= report.required_quorum {
            report.finalized = true;
            report.accepted = true;
        } else if !report.quorum_reachable() {
            report.finalized = true;
            report.accepted = false;
        }

        if report.finalized {
            info!(
                report_id,
                accepted = report.accepted,
                confirmations = report.confirmations,
                rejections = report.rejections,
                "report finalized"
            );
            events.push(OracleEvent::ReportFinalized {
                report_id,
                accepted: report.accepted,
                impact_score: report.impact_score,
            });
        }

        Ok(events)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn require_owner(&self, caller: &Address) -> OracleResult<()> {
        if *caller != self.owner {
            return Err(OracleError::NotAuthorized(*caller));
        }
        Ok(())
    }

    fn require_agent(&self, caller: &Address) -> OracleResult<()> {
        if !self.agents.contains(caller) {
            return Err(OracleError::NotAuthorized(*caller));
        }
        Ok(())
    }
}

/// Quorum formula: `ceil(2·N/3)`, at least 1
fn quorum_for(agent_count: u32) -> u32 {
    ((2 * agent_count).div_ceil(3)).max(1)
}
