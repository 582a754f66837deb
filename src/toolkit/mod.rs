//! Capability interface of the encryption toolkit consumed by the voting ledger.
//!
//! The ledger treats encrypted values as opaque: the only things it can do with them are
//! the algebraic operations of [`EncryptionToolkit`]. In particular, there is no decryption
//! operation, so the ledger cannot branch on an encrypted comparison; it uses
//! [`select()`](EncryptionToolkit::select()) instead.
//!
//! [`ElGamalToolkit`] is the provided backend built on exponential ElGamal [`Ciphertext`]s.
//!
//! [`Ciphertext`]: crate::Ciphertext

use core::fmt;

mod elgamal;

pub use self::elgamal::{ElGamalToolkit, EncryptedFlag};

/// Homomorphic operations over encrypted values used to validate and accumulate ballots.
///
/// Implementations may be backed by a remote coprocessor, so every operation is fallible.
/// Failures are reported as [`ToolkitError`]s and abort the ledger operation that triggered
/// them without any state changes.
pub trait EncryptionToolkit {
    /// Opaque encrypted unsigned integer (an allocation, a cost or a tally).
    type Value: Clone + fmt::Debug;
    /// Opaque encrypted Boolean produced by comparisons.
    type Bool: fmt::Debug;

    /// Produces a fresh encryption of zero.
    fn encrypt_zero(&self) -> Result<Self::Value, ToolkitError>;

    /// Moves a public plaintext `value` into ciphertext space so that it can be compared
    /// with encrypted values.
    fn encrypt_public(&self, value: u64) -> Result<Self::Value, ToolkitError>;

    /// Homomorphically adds two encrypted values.
    fn add(&self, lhs: &Self::Value, rhs: &Self::Value) -> Result<Self::Value, ToolkitError>;

    /// Computes `acc + value * value` over ciphertexts.
    fn square_and_add(
        &self,
        acc: &Self::Value,
        value: &Self::Value,
    ) -> Result<Self::Value, ToolkitError>;

    /// Computes an encrypted `lhs <= rhs` flag.
    fn less_or_equal(&self, lhs: &Self::Value, rhs: &Self::Value)
        -> Result<Self::Bool, ToolkitError>;

    /// Obliviously returns `if_true` if `condition` encrypts `true`, and `if_false` otherwise.
    /// The output must not be linkable to either of the inputs by anyone not holding
    /// the decryption key.
    fn select(
        &self,
        condition: &Self::Bool,
        if_true: &Self::Value,
        if_false: &Self::Value,
    ) -> Result<Self::Value, ToolkitError>;
}

impl<T: EncryptionToolkit + ?Sized> EncryptionToolkit for &T {
    type Value = T::Value;
    type Bool = T::Bool;

    fn encrypt_zero(&self) -> Result<Self::Value, ToolkitError> {
        (**self).encrypt_zero()
    }

    fn encrypt_public(&self, value: u64) -> Result<Self::Value, ToolkitError> {
        (**self).encrypt_public(value)
    }

    fn add(&self, lhs: &Self::Value, rhs: &Self::Value) -> Result<Self::Value, ToolkitError> {
        (**self).add(lhs, rhs)
    }

    fn square_and_add(
        &self,
        acc: &Self::Value,
        value: &Self::Value,
    ) -> Result<Self::Value, ToolkitError> {
        (**self).square_and_add(acc, value)
    }

    fn less_or_equal(
        &self,
        lhs: &Self::Value,
        rhs: &Self::Value,
    ) -> Result<Self::Bool, ToolkitError> {
        (**self).less_or_equal(lhs, rhs)
    }

    fn select(
        &self,
        condition: &Self::Bool,
        if_true: &Self::Value,
        if_false: &Self::Value,
    ) -> Result<Self::Value, ToolkitError> {
        (**self).select(condition, if_true, if_false)
    }
}

/// Errors produced by an [`EncryptionToolkit`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ToolkitError {
    /// An encrypted operand lies outside the plaintext domain supported by the toolkit
    /// (e.g., it is encrypted for another key).
    ValueOutOfRange,
    /// Both compared values exceed the range the toolkit can compare exactly
    /// (e.g., a budget larger than the toolkit capacity against a saturated cost).
    CapacityExceeded,
    /// An encrypted condition passed to [`EncryptionToolkit::select()`] is not a Boolean.
    InvalidCondition,
    /// The toolkit backend could not be reached or refused the operation.
    Unavailable(String),
}

impl fmt::Display for ToolkitError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValueOutOfRange => {
                formatter.write_str("encrypted operand is outside the supported plaintext domain")
            }
            Self::CapacityExceeded => {
                formatter.write_str("compared values exceed the toolkit capacity")
            }
            Self::InvalidCondition => formatter.write_str("encrypted condition is not a Boolean"),
            Self::Unavailable(reason) => write!(formatter, "toolkit is unavailable: {reason}"),
        }
    }
}

impl std::error::Error for ToolkitError {}
