//! Errors surfaced by the voting ledger.

use core::fmt;

use super::{lifecycle::Phase, oracle::OracleError, Timestamp, VotingId};
use crate::toolkit::ToolkitError;

/// Reasons why a ledger operation was rejected. A rejected operation never changes
/// the ledger state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LedgerError {
    /// The caller is not the ledger owner and cannot perform an administrative operation.
    Unauthorized,
    /// Number of options is outside the allowed range.
    InvalidOptionCount {
        /// Requested number of options.
        actual: usize,
        /// Minimum allowed number of options.
        min: usize,
        /// Maximum allowed number of options.
        max: usize,
    },
    /// Voting window is empty, reversed or starts in the past.
    InvalidTimeWindow {
        /// Requested start.
        start: Timestamp,
        /// Requested end.
        end: Timestamp,
        /// Time at which the request was processed.
        now: Timestamp,
    },
    /// No voting with the specified ID exists.
    NotFound(VotingId),
    /// The voting does not accept ballots at the moment.
    VotingNotOpen {
        /// Voting ID.
        id: VotingId,
        /// Current phase of the voting.
        phase: Phase,
    },
    /// The voter has already submitted a ballot for this voting.
    DuplicateVote(VotingId),
    /// Ballot length differs from the number of options in the voting.
    OptionCountMismatch {
        /// Number of options in the voting.
        expected: usize,
        /// Number of allocations in the ballot.
        actual: usize,
    },
    /// Voter balance could not be obtained.
    BudgetCheckUnavailable(OracleError),
    /// Encryption toolkit failed to perform an operation.
    Toolkit(ToolkitError),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized => formatter.write_str("caller is not the ledger owner"),
            Self::InvalidOptionCount { actual, min, max } => write!(
                formatter,
                "invalid number of options {actual}; expected a value in {min}..={max}"
            ),
            Self::InvalidTimeWindow { start, end, now } => write!(
                formatter,
                "invalid voting window {start}..={end} (current time: {now})"
            ),
            Self::NotFound(id) => write!(formatter, "voting {id} does not exist"),
            Self::VotingNotOpen { id, phase } => {
                write!(formatter, "voting {id} is not open (phase: {phase})")
            }
            Self::DuplicateVote(id) => {
                write!(formatter, "voter has already cast a ballot in voting {id}")
            }
            Self::OptionCountMismatch { expected, actual } => write!(
                formatter,
                "number of allocations in the ballot ({actual}) differs from expected ({expected})"
            ),
            Self::BudgetCheckUnavailable(err) => {
                write!(formatter, "cannot determine voter budget: {err}")
            }
            Self::Toolkit(err) => write!(formatter, "encryption toolkit failure: {err}"),
        }
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::BudgetCheckUnavailable(err) => Some(err),
            Self::Toolkit(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ToolkitError> for LedgerError {
    fn from(err: ToolkitError) -> Self {
        Self::Toolkit(err)
    }
}
