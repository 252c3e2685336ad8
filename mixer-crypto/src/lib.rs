//! This crate includes the cryptographic primitives behind an auditable puzzle-swap mixer,
//! instantiated over the prime-order group G1 of BLS12-381:
//! - Pedersen commitments over a two-generator common reference string.
//! - Schnorr-style zero-knowledge proofs of openings, linear sums, links and discrete-log
//!   equalities, plus a Diffie-Hellman tuple proof.
//! - A composite relation proof tying two commitments, two ciphertexts and a curve point to the
//!   same pair of secrets, and the ZKEval transform that re-targets it to a scaled statement.
//! - Paillier encryption with the homomorphisms the puzzle needs, and dedicated per-hop proofs
//!   that an additive shift or a multiplicative scaling used one factor on every representation.
//! - ECDSA-style adaptor signatures over the same group.

#![warn(missing_docs)]
#![warn(missing_copy_implementations, missing_debug_implementations)]
#![warn(unused_qualifications, unused_results)]
#![warn(future_incompatible)]
#![warn(unused)]
#![forbid(broken_intra_doc_links)]

pub mod adaptor;
pub mod composite;
pub mod encryption;
pub mod pedersen;
pub mod proofs;
pub mod statement;
pub mod wire;
pub mod zkeval;

mod serde;

pub use crate::serde::SerializeElement;
pub use common::Rng;

use crate::common::*;
use ::serde::*;
use composite::CompositeComponent;
use ff::Field;
use std::fmt;
use thiserror::*;

/// Error types that may arise from cryptographic operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Caused by malformed public parameters or keys. Surfaced before any protocol run starts.
    #[error("invalid setup: {0}")]
    Setup(&'static str),
    /// A standalone proof did not verify.
    #[error("{0} proof failed to verify")]
    ProofInvalid(ProofKind),
    /// A composite relation proof did not verify.
    ///
    /// The failing component is kept for local diagnostics only; it is deliberately absent from
    /// the displayed message.
    #[error("composite relation proof failed to verify")]
    CompositeProofInvalid(CompositeComponent),
    /// Caused by an invalid scaling factor passed to ZKEval, or a transform whose result does not
    /// match the statement it was asked to target.
    #[error("invalid transform factor")]
    Transform,
    /// A pre-signature and signature pair that does not reveal a witness for the expected point.
    #[error("signature pair does not reveal a witness for the given point")]
    WitnessExtraction,
    /// Caused by attempting to complete a pre-signature with a zero witness.
    #[error("cannot complete a pre-signature with a zero witness")]
    InvalidWitness,
    /// Caused by a malformed fixed-size encoding.
    #[error("malformed encoding: {0}")]
    Encoding(&'static str),
    /// Caused by a ciphertext outside the multiplicative group of the key.
    #[error("ciphertext is not valid under this key")]
    Decryption,
}

/// The kinds of standalone proof in this crate, used to report which verification failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofKind {
    /// Knowledge of a commitment opening.
    Opening,
    /// A commitment equals the sum of two others.
    LinearSum,
    /// Knowledge of the opening of a commitment difference.
    Link,
    /// Knowledge of a discrete log with respect to a base.
    Equality,
    /// Equality of two discrete logs.
    Dleq,
    /// A re-randomization used one factor across a point and two ciphertexts.
    Relation,
}

impl fmt::Display for ProofKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProofKind::Opening => "opening",
            ProofKind::LinearSum => "linear sum",
            ProofKind::Link => "link",
            ProofKind::Equality => "equality",
            ProofKind::Dleq => "discrete log equality",
            ProofKind::Relation => "puzzle relation",
        };
        f.write_str(name)
    }
}

/// Blinding factor for a commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindingFactor(#[serde(with = "SerializeElement")] Scalar);

impl BlindingFactor {
    /// Generate a new blinding factor uniformly at random from the set of possible [`Scalar`]s.
    pub fn new(rng: &mut impl Rng) -> Self {
        Self(Scalar::random(rng))
    }

    /// Construct a blinding factor from the scalar representing it.
    pub fn from_scalar(scalar: Scalar) -> Self {
        Self(scalar)
    }

    /// Convert to the inner scalar representing this blinding factor.
    pub fn to_scalar(self) -> Scalar {
        self.0
    }
}

mod common {
    //! Common types used internally.

    pub use crate::BlindingFactor;
    pub use bls12_381::{G1Affine, G1Projective, Scalar};
    pub use group::{Group, GroupEncoding};

    /// A trait synonym for a cryptographically secure random number generator. This trait is
    /// blanket-implemented for all valid types and will never need to be implemented by-hand.
    pub trait Rng: rand::CryptoRng + rand::RngCore {}
    impl<T: rand::CryptoRng + rand::RngCore> Rng for T {}

    /// Select a non-identity element from the group uniformly at random.
    pub fn random_non_identity<G>(rng: &mut impl Rng) -> G
    where
        G: Group<Scalar = Scalar>,
    {
        loop {
            let g = G::random(&mut *rng);
            if !bool::from(g.is_identity()) {
                return g;
            }
        }
    }

    /// Select a nonzero scalar uniformly at random.
    pub fn random_nonzero_scalar(rng: &mut impl Rng) -> Scalar {
        loop {
            let s = <Scalar as ff::Field>::random(&mut *rng);
            if s != Scalar::zero() {
                return s;
            }
        }
    }

    /// Compare two points on their canonical affine encodings.
    pub fn same_point(a: &G1Projective, b: &G1Projective) -> bool {
        G1Affine::from(a) == G1Affine::from(b)
    }
}
