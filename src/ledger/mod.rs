//! Voting ledger: registry of quadratic votings with encrypted ballots.
//!
//! The [`Ledger`] keeps a list of votings, each with a fixed number of options, a time window
//! and per-option encrypted tallies. Voters submit one ballot per voting, consisting of
//! encrypted allocations for every option. The ballot cost (the sum of squared allocations)
//! is compared against the voter's budget derived from a [`BalanceOracle`]; if the cost
//! exceeds the budget, the ballot is zeroed out instead of being rejected, so that nobody
//! observing the ledger learns whether the ballot was valid.
//!
//! # Examples
//!
//! ```
//! # use confidential_qv::{
//! #     group::Ristretto, ledger::{FixedBalances, Ledger, ManualClock, Phase},
//! #     toolkit::ElGamalToolkit, DiscreteLogTable, Keypair,
//! # };
//! # use rand::thread_rng;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut rng = thread_rng();
//! let keypair = Keypair::<Ristretto>::generate(&mut rng);
//! let toolkit = ElGamalToolkit::new(keypair.clone(), 100, 1_000, &mut rng);
//! let oracle: FixedBalances<&str> = [("alice", 100), ("bob", 10)].into_iter().collect();
//! let clock = ManualClock::new(1_000);
//! let ledger = Ledger::new("owner", toolkit, oracle, clock.clone());
//!
//! let id = ledger.create_voting(&"owner", 1_100, 2_000, 3)?;
//! clock.set(1_500);
//! let receiver = ledger.toolkit().receiver();
//! // Costs 6^2 + 8^2 = 100 credits; Alice has 100.
//! let ballot = receiver.encrypt_allocations(&[6, 8, 0], &mut rng);
//! ledger.submit_ballot(id, &"alice", &ballot)?;
//! // Bob cannot afford this, so his ballot is silently zeroed.
//! let ballot = receiver.encrypt_allocations(&[0, 0, 4], &mut rng);
//! ledger.submit_ballot(id, &"bob", &ballot)?;
//!
//! clock.set(2_001);
//! let voting = ledger.voting(id)?;
//! assert_eq!(voting.status(), Phase::Closed);
//! let lookup_table = DiscreteLogTable::new(0..=1_000);
//! let totals: Vec<_> = voting
//!     .tallies()
//!     .iter()
//!     .map(|tally| keypair.secret().decrypt(*tally, &lookup_table))
//!     .collect();
//! assert_eq!(totals, [Some(6), Some(8), Some(0)]);
//! # Ok(())
//! # }
//! ```

use log::{debug, info, warn};

use core::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

mod access;
mod error;
mod lifecycle;
mod oracle;
mod params;
mod tally;
mod voting;

pub use self::{
    error::LedgerError,
    lifecycle::{classify, Clock, ManualClock, Phase, SystemClock, TimeWindow, Timestamp},
    oracle::{BalanceOracle, FixedBalances, OracleError},
    params::{BudgetPolicy, LedgerParams, DEFAULT_MAX_OPTIONS, MIN_OPTIONS},
    voting::{VotingId, VotingSnapshot, VotingsByStatus},
};

use self::{access::AccessController, tally::TallyEngine, voting::VotingRecord};
use crate::toolkit::EncryptionToolkit;

type Account<O> = <O as BalanceOracle>::Account;
type Entry<O, T> = Arc<Mutex<VotingRecord<Account<O>, <T as EncryptionToolkit>::Value>>>;

/// Registry of quadratic votings over encrypted ballots.
///
/// # Concurrency
///
/// All operations take `&self`. Submissions to the same voting are serialized by a per-voting
/// lock held for the whole submission, so concurrent ballots cannot lose each other's updates
/// or slip past the duplicate-vote check. Submissions to different votings proceed in parallel.
///
/// # Atomicity
///
/// A submission either updates all tallies and records the voter, or changes nothing.
/// In particular, a failure of the [`BalanceOracle`] or the [`EncryptionToolkit`] leaves
/// the voting untouched, and the voter may retry.
pub struct Ledger<T, O, C = SystemClock>
where
    T: EncryptionToolkit,
    O: BalanceOracle,
{
    access: AccessController<O::Account>,
    params: LedgerParams,
    toolkit: T,
    oracle: O,
    clock: C,
    votings: RwLock<Vec<Entry<O, T>>>,
}

impl<T, O, C> fmt::Debug for Ledger<T, O, C>
where
    T: EncryptionToolkit + fmt::Debug,
    O: BalanceOracle,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Ledger")
            .field("owner", self.access.owner())
            .field("params", &self.params)
            .field("toolkit", &self.toolkit)
            .field(
                "voting_count",
                &self.votings.read().map_or(0, |votings| votings.len()),
            )
            .finish_non_exhaustive()
    }
}

// Records are only replaced wholesale in `VotingRecord::commit()`, so a poisoned lock
// still guards a consistent record.
fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T, O, C> Ledger<T, O, C>
where
    T: EncryptionToolkit,
    O: BalanceOracle,
    C: Clock,
{
    /// Creates an empty ledger with default [`LedgerParams`].
    pub fn new(owner: O::Account, toolkit: T, oracle: O, clock: C) -> Self {
        Self::with_params(owner, LedgerParams::default(), toolkit, oracle, clock)
    }

    /// Creates an empty ledger with the specified parameters.
    pub fn with_params(
        owner: O::Account,
        params: LedgerParams,
        toolkit: T,
        oracle: O,
        clock: C,
    ) -> Self {
        info!("Created ledger owned by {owner:?} with {params:?}");
        Self {
            access: AccessController::new(owner),
            params,
            toolkit,
            oracle,
            clock,
            votings: RwLock::new(Vec::new()),
        }
    }

    /// Returns the owner of this ledger, who is the only account allowed to create votings.
    pub fn owner(&self) -> &O::Account {
        self.access.owner()
    }

    /// Returns ledger parameters.
    pub fn params(&self) -> &LedgerParams {
        &self.params
    }

    /// Returns the encryption toolkit. Clients use it to learn e.g. the encryption key.
    pub fn toolkit(&self) -> &T {
        &self.toolkit
    }

    /// Returns the number of votings ever created.
    pub fn len(&self) -> usize {
        self.votings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Checks whether no votings were created yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates a new voting with `option_count` options accepting ballots in `start..=end`.
    /// All tallies start as encryptions of zero.
    ///
    /// # Errors
    ///
    /// Checks are performed in this order:
    ///
    /// - [`LedgerError::Unauthorized`] if `caller` is not the owner
    /// - [`LedgerError::InvalidOptionCount`] if `option_count` is outside
    ///   `MIN_OPTIONS..=max_options`
    /// - [`LedgerError::InvalidTimeWindow`] if `start` is in the past or `start >= end`
    /// - [`LedgerError::Toolkit`] if zero tallies cannot be produced
    pub fn create_voting(
        &self,
        caller: &O::Account,
        start: Timestamp,
        end: Timestamp,
        option_count: usize,
    ) -> Result<VotingId, LedgerError> {
        let result = self.try_create_voting(caller, start, end, option_count);
        match &result {
            Ok(id) => info!(
                "Created voting {id} with {option_count} options for {start}..={end} by {caller:?}"
            ),
            Err(err) => warn!("Rejected voting creation by {caller:?}: {err}"),
        }
        result
    }

    fn try_create_voting(
        &self,
        caller: &O::Account,
        start: Timestamp,
        end: Timestamp,
        option_count: usize,
    ) -> Result<VotingId, LedgerError> {
        self.access.authorize_admin(caller)?;
        self.params.check_option_count(option_count)?;
        let now = self.clock.now();
        let window = TimeWindow::new(start, end)
            .filter(|window| window.start() >= now)
            .ok_or(LedgerError::InvalidTimeWindow { start, end, now })?;
        let tallies = TallyEngine::new(&self.toolkit).zero_tallies(option_count)?;

        let mut votings = self
            .votings
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let id = VotingId::new(votings.len() as u64);
        let record = VotingRecord::new(id, window, caller.clone(), tallies);
        votings.push(Arc::new(Mutex::new(record)));
        Ok(id)
    }

    fn entry(&self, id: VotingId) -> Result<Entry<O, T>, LedgerError> {
        let votings = self.votings.read().unwrap_or_else(PoisonError::into_inner);
        let entry = id.index().and_then(|idx| votings.get(idx)).cloned();
        entry.ok_or(LedgerError::NotFound(id))
    }

    /// Submits a ballot of `voter` in the voting with the specified `id`. `allocations`
    /// must contain one encrypted allocation per option.
    ///
    /// If the ballot cost exceeds the voter's budget, the ballot is accepted, but contributes
    /// zero to every tally. The voter is considered to have voted in either case.
    ///
    /// # Errors
    ///
    /// Checks are performed in this order; none of the errors changes the ledger state:
    ///
    /// - [`LedgerError::NotFound`] if there is no such voting
    /// - [`LedgerError::VotingNotOpen`] if the current time is outside the voting window
    /// - [`LedgerError::DuplicateVote`] if `voter` has already voted
    /// - [`LedgerError::OptionCountMismatch`] if the ballot has a wrong number of allocations
    /// - [`LedgerError::BudgetCheckUnavailable`] if the [`BalanceOracle`] fails
    /// - [`LedgerError::Toolkit`] if any homomorphic operation fails
    pub fn submit_ballot(
        &self,
        id: VotingId,
        voter: &O::Account,
        allocations: &[T::Value],
    ) -> Result<(), LedgerError> {
        let result = self.try_submit_ballot(id, voter, allocations);
        match &result {
            Ok(()) => debug!("Accepted ballot by {voter:?} in voting {id}"),
            Err(err) => warn!("Rejected ballot by {voter:?} in voting {id}: {err}"),
        }
        result
    }

    fn try_submit_ballot(
        &self,
        id: VotingId,
        voter: &O::Account,
        allocations: &[T::Value],
    ) -> Result<(), LedgerError> {
        let entry = self.entry(id)?;
        let mut record = lock(&entry);

        let now = self.clock.now();
        let permit = self.access.authorize_ballot(&record, voter, now)?;
        if allocations.len() != record.option_count() {
            return Err(LedgerError::OptionCountMismatch {
                expected: record.option_count(),
                actual: allocations.len(),
            });
        }

        let engine = TallyEngine::new(&self.toolkit);
        let cost = engine.quadratic_cost(allocations)?;
        let balance = self
            .oracle
            .balance_of(voter)
            .map_err(LedgerError::BudgetCheckUnavailable)?;
        let budget = self.params.budget_policy().budget(balance);
        let staged = engine.stage(record.tallies(), allocations, &cost, budget)?;

        record.commit(permit, staged);
        Ok(())
    }

    /// Returns a snapshot of the voting with the specified `id`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] if there is no such voting.
    pub fn voting(&self, id: VotingId) -> Result<VotingSnapshot<O::Account, T::Value>, LedgerError> {
        let entry = self.entry(id)?;
        let record = lock(&entry);
        Ok(record.snapshot(self.clock.now()))
    }

    /// Returns the current encrypted tallies of the voting with the specified `id`, one per option.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] if there is no such voting.
    pub fn option_tallies(&self, id: VotingId) -> Result<Vec<T::Value>, LedgerError> {
        let entry = self.entry(id)?;
        let tallies = lock(&entry).tallies().to_vec();
        Ok(tallies)
    }

    /// Checks whether `voter` has cast a ballot in the voting with the specified `id`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] if there is no such voting.
    pub fn has_voted(&self, id: VotingId, voter: &O::Account) -> Result<bool, LedgerError> {
        let entry = self.entry(id)?;
        let has_voted = lock(&entry).voters().contains(voter);
        Ok(has_voted)
    }

    /// Returns snapshots of all votings in the creation order.
    pub fn votings(&self) -> Vec<VotingSnapshot<O::Account, T::Value>> {
        let now = self.clock.now();
        let entries = self
            .votings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        entries
            .iter()
            .map(|entry| lock(entry).snapshot(now))
            .collect()
    }

    /// Returns snapshots of all votings partitioned by their phase. Within each phase,
    /// votings are listed in the creation order. Every voting is classified with the same
    /// current time.
    pub fn votings_by_status(&self) -> VotingsByStatus<O::Account, T::Value> {
        let by_status: VotingsByStatus<_, _> = self.votings().into_iter().collect();
        debug!(
            "Classified votings: {} pending, {} open, {} closed",
            by_status.pending.len(),
            by_status.open.len(),
            by_status.closed.len()
        );
        by_status
    }
}
