//! `Ciphertext` and closely related types.

use rand_core::{CryptoRng, RngCore};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use subtle::{Choice, ConditionallySelectable};

use core::{fmt, marker::PhantomData, ops};
use std::collections::HashMap;

#[cfg(feature = "serde")]
use crate::serde::ElementHelper;
use crate::{group::Group, PublicKey, SecretKey};

/// Ciphertext for ElGamal encryption.
///
/// A ciphertext consists of 2 group elements: the random element `R` and a blinded encrypted
/// value `B`. If the encrypted value is `[m]G` and the public key is `K = [x]G`, then
/// `R = [r]G` for a random scalar `r` and `B = [m]G + [r]K`.
///
/// Ciphertexts are partially homomorphic: they can be added together or multiplied by a scalar
/// value. This is exactly what the voting ledger relies on to accumulate per-option tallies
/// without decrypting individual allocations.
///
/// # Examples
///
/// ```
/// # use confidential_qv::{group::Ristretto, DiscreteLogTable, Keypair};
/// # use rand::thread_rng;
/// let mut rng = thread_rng();
/// let (receiver, secret) = Keypair::<Ristretto>::generate(&mut rng).into_tuple();
/// let tally = receiver.encrypt(6_u64, &mut rng) + receiver.encrypt(3_u64, &mut rng);
///
/// let lookup_table = DiscreteLogTable::new(0..=20);
/// assert_eq!(secret.decrypt(tally, &lookup_table), Some(9));
/// ```
#[derive(Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = ""))]
pub struct Ciphertext<G: Group> {
    #[cfg_attr(feature = "serde", serde(with = "ElementHelper::<G>"))]
    pub(crate) random_element: G::Element,
    #[cfg_attr(feature = "serde", serde(with = "ElementHelper::<G>"))]
    pub(crate) blinded_element: G::Element,
}

impl<G: Group> fmt::Debug for Ciphertext<G> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Ciphertext")
            .field("random_element", &self.random_element)
            .field("blinded_element", &self.blinded_element)
            .finish()
    }
}

impl<G: Group> Ciphertext<G> {
    /// Represents encryption of zero value without the blinding factor.
    pub fn zero() -> Self {
        Self {
            random_element: G::identity(),
            blinded_element: G::identity(),
        }
    }

    /// Creates a non-blinded encryption of the specified scalar `value`, i.e., `(O, [value]G)`
    /// where `O` is identity and `G` is the conventional group generator.
    ///
    /// Such a ciphertext carries a public value (e.g., a voter budget) into ciphertext space.
    pub fn non_blinded<T>(value: T) -> Self
    where
        G::Scalar: From<T>,
    {
        let scalar = G::Scalar::from(value);
        Self {
            random_element: G::identity(),
            blinded_element: G::mul_generator(&scalar),
        }
    }

    /// Returns a reference to the random element.
    pub fn random_element(&self) -> &G::Element {
        &self.random_element
    }

    /// Returns a reference to the blinded element.
    pub fn blinded_element(&self) -> &G::Element {
        &self.blinded_element
    }

    /// Serializes this ciphertext as two group elements (the random element,
    /// then the blinded value).
    pub fn to_bytes(self) -> Vec<u8> {
        let mut bytes = vec![0_u8; 2 * G::ELEMENT_SIZE];
        G::serialize_element(&self.random_element, &mut bytes[..G::ELEMENT_SIZE]);
        G::serialize_element(&self.blinded_element, &mut bytes[G::ELEMENT_SIZE..]);
        bytes
    }

    /// Deserializes a ciphertext from bytes produced by [`Self::to_bytes()`]. Returns `None`
    /// if the buffer has an unexpected length or any of the elements is invalid.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != 2 * G::ELEMENT_SIZE {
            return None;
        }
        let (random_bytes, blinded_bytes) = bytes.split_at(G::ELEMENT_SIZE);
        Some(Self {
            random_element: G::deserialize_element(random_bytes)?,
            blinded_element: G::deserialize_element(blinded_bytes)?,
        })
    }

    /// Re-randomizes this ciphertext by adding a fresh encryption of zero. The encrypted value
    /// is unchanged, but the result cannot be linked to the original ciphertext without
    /// the secret key.
    pub fn rerandomize<R: CryptoRng + RngCore>(self, receiver: &PublicKey<G>, rng: &mut R) -> Self {
        self + Self::encrypt_element(G::identity(), receiver, rng)
    }
}

impl<G: Group> ConditionallySelectable for Ciphertext<G> {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self {
            random_element: G::Element::conditional_select(
                &a.random_element,
                &b.random_element,
                choice,
            ),
            blinded_element: G::Element::conditional_select(
                &a.blinded_element,
                &b.blinded_element,
                choice,
            ),
        }
    }
}

impl<G: Group> ops::Add for Ciphertext<G> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            random_element: self.random_element + rhs.random_element,
            blinded_element: self.blinded_element + rhs.blinded_element,
        }
    }
}

impl<G: Group> ops::AddAssign for Ciphertext<G> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<G: Group> ops::Sub for Ciphertext<G> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            random_element: self.random_element - rhs.random_element,
            blinded_element: self.blinded_element - rhs.blinded_element,
        }
    }
}

impl<G: Group> ops::SubAssign for Ciphertext<G> {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<G: Group> ops::Mul<&G::Scalar> for Ciphertext<G> {
    type Output = Self;

    fn mul(self, rhs: &G::Scalar) -> Self {
        Self {
            random_element: self.random_element * rhs,
            blinded_element: self.blinded_element * rhs,
        }
    }
}

impl<G: Group> ops::Mul<u64> for Ciphertext<G> {
    type Output = Self;

    fn mul(self, rhs: u64) -> Self {
        let scalar = G::Scalar::from(rhs);
        self * &scalar
    }
}

/// Lookup table for discrete logarithms.
///
/// For [`Ciphertext`]s to be partially homomorphic, the encrypted values must be
/// group scalars linearly mapped to group elements: `x -> [x]G`, where `G` is the group
/// generator. After decryption it is necessary to map the decrypted group element back
/// to a scalar (i.e., get its discrete logarithm with base `G`). Because of the discrete
/// logarithm assumption, this task is computationally infeasible in the general case;
/// however, if the possible range of encrypted values is small, it is possible to "cheat"
/// by precomputing mapping `[x]G -> x` for all allowed `x` ahead of time. This is exactly
/// what `DiscreteLogTable` does.
///
/// Voting tallies and allocations are bounded, so a table covering the plausible range
/// is sufficient.
#[derive(Debug, Clone)]
pub struct DiscreteLogTable<G: Group> {
    inner: HashMap<[u8; 8], u64>,
    _t: PhantomData<G>,
}

impl<G: Group> DiscreteLogTable<G> {
    /// Creates a lookup table for the specified `values`.
    pub fn new(values: impl IntoIterator<Item = u64>) -> Self {
        let mut bytes = vec![0_u8; G::ELEMENT_SIZE];
        let lookup_table = values
            .into_iter()
            .filter(|&value| value != 0)
            .map(|value| {
                let element = G::vartime_mul_generator(&G::Scalar::from(value));
                G::serialize_element(&element, &mut bytes);
                let mut initial_bytes = [0_u8; 8];
                initial_bytes.copy_from_slice(&bytes[..8]);
                (initial_bytes, value)
            })
            .collect();

        Self {
            inner: lookup_table,
            _t: PhantomData,
        }
    }

    /// Gets the discrete log of `decrypted_element`, or `None` if it is not present among
    /// `values` supplied when constructing this table.
    pub fn get(&self, decrypted_element: &G::Element) -> Option<u64> {
        if G::is_identity(decrypted_element) {
            // The identity element may have a special serialization, so we check it separately.
            Some(0)
        } else {
            let mut bytes = vec![0_u8; G::ELEMENT_SIZE];
            G::serialize_element(decrypted_element, &mut bytes);
            let mut initial_bytes = [0_u8; 8];
            initial_bytes.copy_from_slice(&bytes[..8]);
            self.inner.get(&initial_bytes).copied()
        }
    }
}

impl<G: Group> Ciphertext<G> {
    /// Encrypts `value` given as a group element for the specified `receiver`.
    pub(crate) fn encrypt_element<R: CryptoRng + RngCore>(
        value: G::Element,
        receiver: &PublicKey<G>,
        rng: &mut R,
    ) -> Self {
        let random_scalar = SecretKey::<G>::generate(rng);
        let random_element = G::mul_generator(random_scalar.expose_scalar());
        let dh_element = receiver.as_element() * random_scalar.expose_scalar();
        Self {
            random_element,
            blinded_element: value + dh_element,
        }
    }
}
