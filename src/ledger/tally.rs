//! Budget enforcement and tally accumulation over encrypted ballots.

use crate::toolkit::{EncryptionToolkit, ToolkitError};

/// New tallies computed for a ballot but not yet written to the voting.
#[derive(Debug)]
#[must_use = "staged tallies must be committed"]
pub(crate) struct StagedTallies<V>(Vec<V>);

impl<V> StagedTallies<V> {
    pub fn new(tallies: Vec<V>) -> Self {
        Self(tallies)
    }

    pub fn into_inner(self) -> Vec<V> {
        self.0
    }
}

/// Runs the ballot pipeline on top of an [`EncryptionToolkit`]. The engine never sees
/// plaintext allocations.
#[derive(Debug)]
pub(crate) struct TallyEngine<'a, T> {
    toolkit: &'a T,
}

impl<'a, T: EncryptionToolkit> TallyEngine<'a, T> {
    pub fn new(toolkit: &'a T) -> Self {
        Self { toolkit }
    }

    pub fn zero_tallies(&self, option_count: usize) -> Result<Vec<T::Value>, ToolkitError> {
        (0..option_count)
            .map(|_| self.toolkit.encrypt_zero())
            .collect()
    }

    /// Computes the encrypted sum of squared allocations.
    pub fn quadratic_cost(&self, allocations: &[T::Value]) -> Result<T::Value, ToolkitError> {
        let zero = self.toolkit.encrypt_zero()?;
        allocations.iter().try_fold(zero, |acc, allocation| {
            self.toolkit.square_and_add(&acc, allocation)
        })
    }

    /// Computes the tallies after applying `allocations`. If `cost` exceeds `budget`, the ballot
    /// is replaced with zeros; which branch was taken is not observable.
    pub fn stage(
        &self,
        tallies: &[T::Value],
        allocations: &[T::Value],
        cost: &T::Value,
        budget: u64,
    ) -> Result<StagedTallies<T::Value>, ToolkitError> {
        debug_assert_eq!(tallies.len(), allocations.len());

        let budget = self.toolkit.encrypt_public(budget)?;
        let within_budget = self.toolkit.less_or_equal(cost, &budget)?;
        let zero = self.toolkit.encrypt_zero()?;

        let staged = tallies
            .iter()
            .zip(allocations)
            .map(|(tally, allocation)| {
                let accepted = self.toolkit.select(&within_budget, allocation, &zero)?;
                self.toolkit.add(tally, &accepted)
            })
            .collect::<Result<_, _>>()?;
        Ok(StagedTallies::new(staged))
    }
}
