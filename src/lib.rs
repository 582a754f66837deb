//! Confidential [quadratic voting] ledger with homomorphically accumulated tallies.
//!
//! # ⚠ Warnings
//!
//! While the logic in this crate relies on standard cryptographic assumptions
//! (complexity of discrete log and decisional Diffie–Hellman problems in certain groups),
//! it has not been independently verified for correctness or absence of side-channel
//! attack vectors. **Use at your own risk.**
//!
//! The provided [`ElGamalToolkit`](toolkit::ElGamalToolkit) holds the decryption key
//! in order to evaluate squares and comparisons. In a real deployment, this role belongs
//! to a separate party (e.g., a threshold coprocessor network), and the ledger should only
//! be given a handle to it.
//!
//! # Overview
//!
//! - [`ledger`] module contains the voting [`Ledger`](ledger::Ledger): a registry of votings
//!   with time windows, an owner-only creation gate, one ballot per voter, and
//!   budget enforcement that zeroes over-budget ballots instead of rejecting them.
//! - [`toolkit`] module defines the [`EncryptionToolkit`](toolkit::EncryptionToolkit)
//!   capability interface through which the ledger manipulates encrypted values,
//!   and its ElGamal-based implementation.
//! - [`Ciphertext`] provides exponential ElGamal encryption. Voters use [`PublicKey`]
//!   to encrypt their allocations; [`SecretKey`] together with a [`DiscreteLogTable`]
//!   decrypts final tallies.
//!
//! # Backends
//!
//! [`group`] module exposes a generic framework for plugging a [`Group`]
//! implementation into crypto primitives. It provides two implementations based on
//! Curve25519: [`Ristretto`] and [`Curve25519Subgroup`].
//!
//! # Logging
//!
//! The crate emits records via the [`log`] facade: ledger construction and voting creation
//! are logged at the `info` level, accepted ballots at `debug`, and rejected operations
//! at `warn`. Plaintext values and budget check outcomes are never logged.
//!
//! # Crate features
//!
//! ## `serde`
//!
//! *(off by default)*
//!
//! Enables [`Serialize`](::serde::Serialize) / [`Deserialize`](::serde::Deserialize)
//! implementations for keys, ciphertexts, ledger parameters and voting snapshots.
//! Group elements and keys are serialized to human-readable formats
//! (JSON, YAML, TOML, etc.) as strings that represent corresponding byte buffers using
//! base64-url encoding without padding. For binary formats, byte buffers are serialized directly.
//!
//! [quadratic voting]: https://en.wikipedia.org/wiki/Quadratic_voting
//! [`Group`]: group::Group
//! [`Ristretto`]: group::Ristretto
//! [`Curve25519Subgroup`]: group::Curve25519Subgroup
//! [`log`]: https://docs.rs/log/

// Documentation settings.
#![cfg_attr(docsrs, feature(doc_cfg))]
// Linter settings.
#![warn(missing_debug_implementations, missing_docs, bare_trait_objects)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::doc_markdown,
    clippy::cast_possible_truncation
)]

mod encryption;
pub mod group;
mod keys;
pub mod ledger;
#[cfg(feature = "serde")]
mod serde;
pub mod toolkit;

pub use crate::{
    encryption::{Ciphertext, DiscreteLogTable},
    keys::{Keypair, PublicKey, PublicKeyConversionError, SecretKey},
};
