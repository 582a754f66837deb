//! Source of voter balances used to derive voice credit budgets.

use core::{fmt, hash::Hash};
use std::{collections::HashMap, sync::Arc};

/// Read-only source of plaintext voter balances (e.g., a fungible token contract).
///
/// The oracle is consulted exactly once per ballot submission. A failure aborts
/// the submission without touching the tallies.
pub trait BalanceOracle {
    /// Account identifier used by the hosting ledger.
    type Account: Clone + Eq + Hash + fmt::Debug;

    /// Returns the balance of `account`.
    ///
    /// # Errors
    ///
    /// Returns an error if the balance cannot be obtained.
    fn balance_of(&self, account: &Self::Account) -> Result<u64, OracleError>;
}

impl<O: BalanceOracle + ?Sized> BalanceOracle for &O {
    type Account = O::Account;

    fn balance_of(&self, account: &Self::Account) -> Result<u64, OracleError> {
        (**self).balance_of(account)
    }
}

impl<O: BalanceOracle + ?Sized> BalanceOracle for Arc<O> {
    type Account = O::Account;

    fn balance_of(&self, account: &Self::Account) -> Result<u64, OracleError> {
        (**self).balance_of(account)
    }
}

/// Errors produced by a [`BalanceOracle`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum OracleError {
    /// The oracle has no record of the account.
    UnknownAccount,
    /// The oracle could not be reached (e.g., timed out).
    Unavailable(String),
}

impl fmt::Display for OracleError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAccount => formatter.write_str("unknown account"),
            Self::Unavailable(reason) => write!(formatter, "balance oracle unavailable: {reason}"),
        }
    }
}

impl std::error::Error for OracleError {}

/// In-memory [`BalanceOracle`] with a fixed set of balances.
///
/// # Examples
///
/// ```
/// # use confidential_qv::ledger::{BalanceOracle, FixedBalances, OracleError};
/// let balances: FixedBalances<&str> = [("alice", 100), ("bob", 25)].into_iter().collect();
/// assert_eq!(balances.balance_of(&"alice"), Ok(100));
/// assert_eq!(balances.balance_of(&"carol"), Err(OracleError::UnknownAccount));
/// ```
#[derive(Debug, Clone)]
pub struct FixedBalances<A> {
    balances: HashMap<A, u64>,
}

impl<A> Default for FixedBalances<A> {
    fn default() -> Self {
        Self {
            balances: HashMap::new(),
        }
    }
}

impl<A: Eq + Hash> FixedBalances<A> {
    /// Creates an oracle without any accounts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the balance of `account`, returning the previous balance if any.
    pub fn set_balance(&mut self, account: A, balance: u64) -> Option<u64> {
        self.balances.insert(account, balance)
    }

    /// Adds an account with the specified balance.
    #[must_use]
    pub fn with_balance(mut self, account: A, balance: u64) -> Self {
        self.set_balance(account, balance);
        self
    }
}

impl<A: Eq + Hash> FromIterator<(A, u64)> for FixedBalances<A> {
    fn from_iter<I: IntoIterator<Item = (A, u64)>>(iter: I) -> Self {
        Self {
            balances: iter.into_iter().collect(),
        }
    }
}

impl<A: Clone + Eq + Hash + fmt::Debug> BalanceOracle for FixedBalances<A> {
    type Account = A;

    fn balance_of(&self, account: &A) -> Result<u64, OracleError> {
        self.balances
            .get(account)
            .copied()
            .ok_or(OracleError::UnknownAccount)
    }
}
