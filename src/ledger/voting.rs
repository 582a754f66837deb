//! Voting records and read-only views of them.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use core::fmt;

use super::{
    access::{BallotPermit, VoterRoll},
    lifecycle::{Phase, TimeWindow, Timestamp},
    tally::StagedTallies,
};

/// Identifier of a voting within a [`Ledger`](crate::ledger::Ledger).
///
/// IDs are assigned sequentially starting from 0 and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct VotingId(u64);

impl VotingId {
    /// Wraps a raw ID, e.g. one received from a client.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value of this ID.
    pub const fn get(self) -> u64 {
        self.0
    }

    pub(crate) fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl fmt::Display for VotingId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "#{}", self.0)
    }
}

/// Mutable state of a single voting, guarded by a per-voting lock.
#[derive(Debug)]
pub(crate) struct VotingRecord<A, V> {
    id: VotingId,
    window: TimeWindow,
    creator: A,
    tallies: Vec<V>,
    voters: VoterRoll<A>,
}

impl<A, V> VotingRecord<A, V>
where
    A: Clone + Eq + core::hash::Hash,
    V: Clone,
{
    pub fn new(id: VotingId, window: TimeWindow, creator: A, tallies: Vec<V>) -> Self {
        Self {
            id,
            window,
            creator,
            tallies,
            voters: VoterRoll::default(),
        }
    }

    pub fn id(&self) -> VotingId {
        self.id
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    pub fn option_count(&self) -> usize {
        self.tallies.len()
    }

    pub fn tallies(&self) -> &[V] {
        &self.tallies
    }

    pub fn voters(&self) -> &VoterRoll<A> {
        &self.voters
    }

    /// Replaces tallies and marks the voter in a single step.
    pub fn commit(&mut self, permit: BallotPermit<A>, staged: StagedTallies<V>) {
        debug_assert_eq!(permit.voting_id(), self.id);
        let tallies = staged.into_inner();
        debug_assert_eq!(tallies.len(), self.tallies.len());
        self.tallies = tallies;
        self.voters.record(permit);
    }

    pub fn snapshot(&self, now: Timestamp) -> VotingSnapshot<A, V> {
        VotingSnapshot {
            id: self.id,
            window: self.window,
            option_count: self.tallies.len(),
            creator: self.creator.clone(),
            status: self.window.phase(now),
            voter_count: self.voters.len(),
            tallies: self.tallies.clone(),
        }
    }
}

/// Point-in-time view of a voting.
///
/// `A` is the account type, `V` the encrypted value type of the toolkit.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VotingSnapshot<A, V> {
    id: VotingId,
    window: TimeWindow,
    option_count: usize,
    creator: A,
    status: Phase,
    voter_count: usize,
    tallies: Vec<V>,
}

impl<A, V> VotingSnapshot<A, V> {
    /// Returns the voting ID.
    pub fn id(&self) -> VotingId {
        self.id
    }

    /// Returns the voting window.
    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    /// Returns the number of options.
    pub fn option_count(&self) -> usize {
        self.option_count
    }

    /// Returns the account that created the voting.
    pub fn creator(&self) -> &A {
        &self.creator
    }

    /// Returns the phase at the time the snapshot was taken.
    pub fn status(&self) -> Phase {
        self.status
    }

    /// Returns the number of voters that have cast a ballot.
    pub fn voter_count(&self) -> usize {
        self.voter_count
    }

    /// Returns encrypted per-option tallies.
    pub fn tallies(&self) -> &[V] {
        &self.tallies
    }

    /// Consumes the snapshot returning the encrypted tallies.
    pub fn into_tallies(self) -> Vec<V> {
        self.tallies
    }
}

/// Votings partitioned by their phase.
#[derive(Debug, Clone)]
pub struct VotingsByStatus<A, V> {
    /// Votings that have not started yet.
    pub pending: Vec<VotingSnapshot<A, V>>,
    /// Votings accepting ballots.
    pub open: Vec<VotingSnapshot<A, V>>,
    /// Finished votings.
    pub closed: Vec<VotingSnapshot<A, V>>,
}

impl<A, V> Default for VotingsByStatus<A, V> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            open: Vec::new(),
            closed: Vec::new(),
        }
    }
}

impl<A, V> FromIterator<VotingSnapshot<A, V>> for VotingsByStatus<A, V> {
    fn from_iter<I: IntoIterator<Item = VotingSnapshot<A, V>>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), |mut acc, snapshot| {
            match snapshot.status {
                Phase::Pending => acc.pending.push(snapshot),
                Phase::Open => acc.open.push(snapshot),
                Phase::Closed => acc.closed.push(snapshot),
            }
            acc
        })
    }
}

impl<A, V> VotingsByStatus<A, V> {
    /// Returns the total number of votings in all phases.
    pub fn len(&self) -> usize {
        self.pending.len() + self.open.len() + self.closed.len()
    }

    /// Checks whether there are no votings.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
