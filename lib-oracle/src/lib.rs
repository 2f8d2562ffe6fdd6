//! NILE Oracle Consensus
//!
//! Authorized agents submit reports about real-world events (news, game
//! results, social signals) affecting a tokenized subject; the agent set
//! then votes each report to acceptance or rejection under a 2/3 quorum.
//! External scorers consume only finalized decisions.
//!
//! # Quorum Snapshotting
//!
//! `required_quorum` is fixed at submission time from the then-current
//! agent count; authorizing more agents later never moves the bar on a
//! pending report. A finalized report is frozen forever.

pub mod errors;
pub mod events;
pub mod oracle;
pub mod report;

pub use errors::{OracleError, OracleResult};
pub use events::OracleEvent;
pub use oracle::NileOracle;
pub use report::Report;
