//! Ledger configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use core::num::NonZeroU64;

use super::error::LedgerError;

/// Minimum number of options in a voting.
pub const MIN_OPTIONS: usize = 3;

/// Default maximum number of options in a voting.
pub const DEFAULT_MAX_OPTIONS: usize = 64;

/// Derivation of a voter's voice credit budget from the plaintext balance reported
/// by the [`BalanceOracle`](crate::ledger::BalanceOracle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BudgetPolicy {
    /// Budget equals the balance.
    #[default]
    Balance,
    /// Budget is `balance * numerator / denominator`, rounded down and saturated at `u64::MAX`.
    Scaled {
        /// Multiplier applied to the balance.
        numerator: u64,
        /// Divisor applied to the balance.
        denominator: NonZeroU64,
    },
    /// Every known voter gets the same number of credits regardless of the balance.
    Uniform(u64),
}

impl BudgetPolicy {
    /// Computes the budget for the specified `balance`.
    pub fn budget(&self, balance: u64) -> u64 {
        match *self {
            Self::Balance => balance,
            Self::Scaled {
                numerator,
                denominator,
            } => {
                let scaled = u128::from(balance) * u128::from(numerator)
                    / u128::from(denominator.get());
                u64::try_from(scaled).unwrap_or(u64::MAX)
            }
            Self::Uniform(credits) => credits,
        }
    }
}

/// Parameters of a [`Ledger`](crate::ledger::Ledger).
///
/// # Examples
///
/// ```
/// # use confidential_qv::ledger::{BudgetPolicy, LedgerParams};
/// let params = LedgerParams::default().with_budget_policy(BudgetPolicy::Uniform(100));
/// assert_eq!(params.budget_policy().budget(5), 100);
/// assert_eq!(params.max_options(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LedgerParams {
    budget_policy: BudgetPolicy,
    max_options: usize,
}

impl Default for LedgerParams {
    fn default() -> Self {
        Self {
            budget_policy: BudgetPolicy::default(),
            max_options: DEFAULT_MAX_OPTIONS,
        }
    }
}

impl LedgerParams {
    /// Returns the budget policy.
    pub fn budget_policy(&self) -> &BudgetPolicy {
        &self.budget_policy
    }

    /// Sets the budget policy.
    #[must_use]
    pub fn with_budget_policy(mut self, policy: BudgetPolicy) -> Self {
        self.budget_policy = policy;
        self
    }

    /// Returns the maximum number of options in a voting.
    pub fn max_options(&self) -> usize {
        self.max_options
    }

    /// Sets the maximum number of options in a voting.
    ///
    /// # Panics
    ///
    /// Panics if `max_options` is less than [`MIN_OPTIONS`].
    pub fn set_max_options(&mut self, max_options: usize) {
        assert!(
            max_options >= MIN_OPTIONS,
            "Option bound {max_options} is too small; a voting has at least {MIN_OPTIONS} options"
        );
        self.max_options = max_options;
    }

    pub(crate) fn check_option_count(&self, option_count: usize) -> Result<(), LedgerError> {
        if (MIN_OPTIONS..=self.max_options).contains(&option_count) {
            Ok(())
        } else {
            Err(LedgerError::InvalidOptionCount {
                actual: option_count,
                min: MIN_OPTIONS,
                max: self.max_options,
            })
        }
    }
}
