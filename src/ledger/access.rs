//! Access control: the owner gate for administration and the one-ballot-per-voter rule.

use core::hash::Hash;
use std::collections::HashSet;

use super::{error::LedgerError, lifecycle::Phase, voting::VotingRecord, Timestamp, VotingId};

/// Checks which callers may perform which operations.
#[derive(Debug, Clone)]
pub(crate) struct AccessController<A> {
    owner: A,
}

impl<A: Clone + Eq + Hash> AccessController<A> {
    pub fn new(owner: A) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> &A {
        &self.owner
    }

    pub fn authorize_admin(&self, caller: &A) -> Result<(), LedgerError> {
        if *caller == self.owner {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized)
        }
    }

    /// Checks that `voter` may cast a ballot in the voting at the time `now`.
    /// Checks are ordered: phase first, then duplicate voting.
    pub fn authorize_ballot<V: Clone>(
        &self,
        record: &VotingRecord<A, V>,
        voter: &A,
        now: Timestamp,
    ) -> Result<BallotPermit<A>, LedgerError> {
        let id = record.id();
        let phase = record.window().phase(now);
        if phase != Phase::Open {
            return Err(LedgerError::VotingNotOpen { id, phase });
        }
        if record.voters().contains(voter) {
            return Err(LedgerError::DuplicateVote(id));
        }
        Ok(BallotPermit {
            voting_id: id,
            voter: voter.clone(),
        })
    }
}

/// Proof that a voter passed access checks. Consumed when the ballot is committed.
#[derive(Debug)]
#[must_use = "permit must be committed together with the ballot"]
pub(crate) struct BallotPermit<A> {
    voting_id: VotingId,
    voter: A,
}

impl<A> BallotPermit<A> {
    pub fn voting_id(&self) -> VotingId {
        self.voting_id
    }
}

/// Set of voters that have cast a ballot in a voting. Entries are never removed.
#[derive(Debug, Clone)]
pub(crate) struct VoterRoll<A> {
    voters: HashSet<A>,
}

impl<A> Default for VoterRoll<A> {
    fn default() -> Self {
        Self {
            voters: HashSet::new(),
        }
    }
}

impl<A: Eq + Hash> VoterRoll<A> {
    pub fn contains(&self, voter: &A) -> bool {
        self.voters.contains(voter)
    }

    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn record(&mut self, permit: BallotPermit<A>) {
        let is_new = self.voters.insert(permit.voter);
        debug_assert!(is_new, "voter recorded twice");
    }
}
