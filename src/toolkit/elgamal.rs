//! Encryption toolkit backed by exponential ElGamal.

use rand_chacha::ChaChaRng;
use rand_core::{CryptoRng, RngCore, SeedableRng};
use subtle::{Choice, ConditionallySelectable};

use core::fmt;
use std::sync::{Mutex, PoisonError};

use super::{EncryptionToolkit, ToolkitError};
use crate::{group::Group, Ciphertext, DiscreteLogTable, Keypair, PublicKey};

/// Encrypted Boolean produced by [`ElGamalToolkit`]: an ElGamal encryption of 0 or 1.
#[derive(Clone, Copy)]
pub struct EncryptedFlag<G: Group>(Ciphertext<G>);

impl<G: Group> fmt::Debug for EncryptedFlag<G> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_tuple("EncryptedFlag").field(&self.0).finish()
    }
}

impl<G: Group> EncryptedFlag<G> {
    /// Returns the underlying ciphertext.
    pub fn as_ciphertext(&self) -> &Ciphertext<G> {
        &self.0
    }
}

/// [`EncryptionToolkit`] over ElGamal [`Ciphertext`]s.
///
/// ElGamal is only additively homomorphic, so this toolkit plays the role of the external
/// evaluator (a coprocessor network in a hosted deployment): it holds the receiver
/// [`Keypair`] and performs the non-linear operations (`square_and_add`, `less_or_equal`,
/// `select`) on behalf of the ledger. Every value it returns is a fresh or re-randomized
/// ciphertext, so the ledger learns nothing from the outputs. Addition never touches the key.
///
/// # Plaintext domain
///
/// The toolkit works with two bounds:
///
/// - `value_bound` limits a single allocation. An allocation outside `0..=value_bound`
///   (including one encrypted for another key) does not fail the operation; it saturates
///   the cost instead, so the ballot never passes a budget comparison and is zeroed.
/// - `cost_bound` limits quadratic costs and public values. Costs above it saturate
///   at `cost_bound + 1`. A public value above it is encoded as the saturation point as well;
///   comparing two saturated values is undecidable and fails with
///   [`ToolkitError::CapacityExceeded`].
///
/// Comparisons are exact for any budget up to `cost_bound`. Choosing `cost_bound` to be at
/// least `option_count * value_bound^2` makes them exact for every valid ballot.
///
/// # Examples
///
/// ```
/// # use confidential_qv::{
/// #     group::Ristretto, toolkit::{ElGamalToolkit, EncryptionToolkit}, DiscreteLogTable, Keypair,
/// # };
/// # use rand::thread_rng;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut rng = thread_rng();
/// let keypair = Keypair::<Ristretto>::generate(&mut rng);
/// let toolkit = ElGamalToolkit::new(keypair.clone(), 10, 1_000, &mut rng);
///
/// let six = toolkit.receiver().encrypt(6_u64, &mut rng);
/// let eight = toolkit.receiver().encrypt(8_u64, &mut rng);
/// let cost = toolkit.encrypt_zero()?;
/// let cost = toolkit.square_and_add(&cost, &six)?;
/// let cost = toolkit.square_and_add(&cost, &eight)?;
///
/// let lookup_table = DiscreteLogTable::new(0..=1_000);
/// assert_eq!(keypair.secret().decrypt(cost, &lookup_table), Some(100));
/// # Ok(())
/// # }
/// ```
pub struct ElGamalToolkit<G: Group> {
    keypair: Keypair<G>,
    value_bound: u64,
    cost_bound: u64,
    lookup_table: DiscreteLogTable<G>,
    rng: Mutex<ChaChaRng>,
}

impl<G: Group> fmt::Debug for ElGamalToolkit<G> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ElGamalToolkit")
            .field("receiver", self.keypair.public())
            .field("value_bound", &self.value_bound)
            .field("cost_bound", &self.cost_bound)
            .finish_non_exhaustive()
    }
}

impl<G: Group> ElGamalToolkit<G> {
    /// Creates a toolkit for the specified receiver `keypair`. `rng` is only used to seed
    /// the internal CSPRNG.
    ///
    /// Construction precomputes a discrete log table with `cost_bound + 2` entries, so
    /// the cost bound should be kept reasonably small (up to several million).
    ///
    /// # Panics
    ///
    /// Panics if `value_bound` is zero, if `cost_bound` is less than `value_bound`,
    /// or if `cost_bound` is `u64::MAX`.
    pub fn new<R: CryptoRng + RngCore>(
        keypair: Keypair<G>,
        value_bound: u64,
        cost_bound: u64,
        rng: &mut R,
    ) -> Self {
        assert!(value_bound > 0, "Value bound must be positive");
        assert!(
            cost_bound >= value_bound,
            "Cost bound must not be less than the value bound"
        );
        assert!(cost_bound < u64::MAX, "Cost bound is too large");

        let mut seed = <ChaChaRng as SeedableRng>::Seed::default();
        rng.fill_bytes(&mut seed);
        Self {
            keypair,
            value_bound,
            cost_bound,
            lookup_table: DiscreteLogTable::new(0..=cost_bound + 1),
            rng: Mutex::new(ChaChaRng::from_seed(seed)),
        }
    }

    /// Returns the public key that voters must encrypt their allocations for.
    pub fn receiver(&self) -> &PublicKey<G> {
        self.keypair.public()
    }

    /// Returns the maximum plaintext value of a single allocation.
    pub fn value_bound(&self) -> u64 {
        self.value_bound
    }

    /// Returns the maximum cost or public value that can be compared exactly.
    pub fn cost_bound(&self) -> u64 {
        self.cost_bound
    }

    fn saturation_point(&self) -> u64 {
        self.cost_bound + 1
    }

    fn with_rng<T>(&self, action: impl FnOnce(&mut ChaChaRng) -> T) -> T {
        // The RNG state stays valid even if another thread panicked while holding the lock.
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        action(&mut rng)
    }

    fn fresh_encryption(&self, value: u64) -> Ciphertext<G> {
        self.with_rng(|rng| self.keypair.public().encrypt(value, rng))
    }

    fn open(&self, ciphertext: &Ciphertext<G>) -> Result<u64, ToolkitError> {
        self.keypair
            .secret()
            .decrypt(*ciphertext, &self.lookup_table)
            .ok_or(ToolkitError::ValueOutOfRange)
    }

    /// Returns `None` for allocations outside `0..=value_bound`.
    fn open_allocation(&self, ciphertext: &Ciphertext<G>) -> Option<u64> {
        self.keypair
            .secret()
            .decrypt(*ciphertext, &self.lookup_table)
            .filter(|&value| value <= self.value_bound)
    }
}

impl<G: Group> EncryptionToolkit for ElGamalToolkit<G> {
    type Value = Ciphertext<G>;
    type Bool = EncryptedFlag<G>;

    fn encrypt_zero(&self) -> Result<Self::Value, ToolkitError> {
        Ok(self.fresh_encryption(0))
    }

    fn encrypt_public(&self, value: u64) -> Result<Self::Value, ToolkitError> {
        Ok(Ciphertext::non_blinded(value.min(self.saturation_point())))
    }

    fn add(&self, lhs: &Self::Value, rhs: &Self::Value) -> Result<Self::Value, ToolkitError> {
        Ok(*lhs + *rhs)
    }

    fn square_and_add(
        &self,
        acc: &Self::Value,
        value: &Self::Value,
    ) -> Result<Self::Value, ToolkitError> {
        let acc = self.open(acc)?;
        let sum = self
            .open_allocation(value)
            .and_then(|value| value.checked_mul(value))
            .and_then(|square| square.checked_add(acc))
            .map_or(self.saturation_point(), |sum| sum.min(self.saturation_point()));
        Ok(self.fresh_encryption(sum))
    }

    fn less_or_equal(
        &self,
        lhs: &Self::Value,
        rhs: &Self::Value,
    ) -> Result<Self::Bool, ToolkitError> {
        let lhs = self.open(lhs)?;
        let rhs = self.open(rhs)?;
        if lhs == self.saturation_point() && rhs == self.saturation_point() {
            return Err(ToolkitError::CapacityExceeded);
        }
        Ok(EncryptedFlag(self.fresh_encryption(u64::from(lhs <= rhs))))
    }

    fn select(
        &self,
        condition: &Self::Bool,
        if_true: &Self::Value,
        if_false: &Self::Value,
    ) -> Result<Self::Value, ToolkitError> {
        let bit = match self.open(&condition.0) {
            Ok(bit @ (0 | 1)) => bit,
            _ => return Err(ToolkitError::InvalidCondition),
        };
        let choice = Choice::from(bit as u8);
        let selected = Ciphertext::conditional_select(if_false, if_true, choice);
        Ok(self.with_rng(|rng| selected.rerandomize(self.keypair.public(), rng)))
    }
}
