//! Pedersen commitments \[1\] over the prime-order group G1 of BLS12-381.
//!
//! A commitment to a message `m` with blinding factor `r` is `C = m·H + r·G`, where `{G, H}` is
//! the common reference string ([`Crs`]). Commitments are additively homomorphic:
//! `Commit(m₁, r₁) + Commit(m₂, r₂) = Commit(m₁ + m₂, r₁ + r₂)`, and scaling a commitment by `β`
//! commits to `(β·m, β·r)`. The ZKEval transform relies on the latter.
//!
//! ```
//! # use mixer_crypto::{BlindingFactor, pedersen::Crs};
//! # use bls12_381::Scalar;
//! let crs = Crs::global().unwrap();
//! let bf = BlindingFactor::from_scalar(Scalar::from(5u64));
//! let commitment = crs.commit(Scalar::from(11u64), bf);
//! assert!(commitment.verify_opening(crs, Scalar::from(11u64), bf));
//! ```
//!
//! ## References
//!
//! 1. Torben Pyrds Pedersen. "Non-interactive and information-theoretic secure verifiable secret
//!    sharing". 1992. URL: <https://www.cs.cornell.edu/courses/cs754/2001fa/129.PDF>

use crate::{
    common::*,
    proofs::{ChallengeBuilder, ChallengeInput},
    serde::SerializeElement,
    wire::{FixedSize, Read, Write},
    Error,
};
use bytes::{Buf, BufMut};
use ff::Field;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::{ops::Add, sync::OnceLock};

/// Domain tag from which the message generator `H` is derived.
const CRS_DOMAIN: &[u8] = b"mixer-crypto/crs/message-generator/v1";

/// The common reference string: a randomness generator `G` and a message generator `H` with no
/// known discrete-log relation between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crs {
    #[serde(with = "SerializeElement")]
    g: G1Projective,
    #[serde(with = "SerializeElement")]
    h: G1Projective,
}

static GLOBAL_CRS: OnceLock<Result<Crs, Error>> = OnceLock::new();

impl Crs {
    /// Derive the reference string.
    ///
    /// `G` is the standard G1 generator. `H` is sampled as a uniformly random curve point from a
    /// ChaCha20 stream seeded with the SHA3-256 digest of a fixed domain tag, so every party
    /// derives the same `H` and nobody knows its discrete log with respect to `G`.
    pub fn setup() -> Result<Self, Error> {
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&Sha3_256::digest(CRS_DOMAIN));
        let mut stream = rand_chacha::ChaCha20Rng::from_seed(seed);
        let h: G1Projective = random_non_identity(&mut stream);
        Self::from_generators(G1Projective::generator(), h)
    }

    /// The process-wide reference string, derived on first use.
    pub fn global() -> Result<&'static Crs, Error> {
        GLOBAL_CRS
            .get_or_init(Crs::setup)
            .as_ref()
            .map_err(|err| *err)
    }

    /// Build a reference string from externally supplied generators.
    ///
    /// Fails if either generator is the identity or if the two coincide.
    pub fn from_generators(g: G1Projective, h: G1Projective) -> Result<Self, Error> {
        if bool::from(g.is_identity()) || bool::from(h.is_identity()) {
            return Err(Error::Setup("reference string generator is the identity"));
        }
        if same_point(&g, &h) {
            return Err(Error::Setup("reference string generators coincide"));
        }
        Ok(Self { g, h })
    }

    /// The randomness generator.
    pub fn g(&self) -> G1Projective {
        self.g
    }

    /// The message generator.
    pub fn h(&self) -> G1Projective {
        self.h
    }

    /// Commit to `message` under blinding factor `bf`.
    pub fn commit(&self, message: Scalar, bf: BlindingFactor) -> Commitment {
        Commitment(self.combine(message, bf.to_scalar()))
    }

    /// Compute `m·H + r·G`; the right-hand side of every Schnorr check in this crate.
    pub(crate) fn combine(&self, m: Scalar, r: Scalar) -> G1Projective {
        self.h * m + self.g * r
    }
}

impl ChallengeInput for Crs {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume(&self.g);
        builder.consume(&self.h);
    }
}

/// A Pedersen commitment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Commitment(#[serde(with = "SerializeElement")] pub(crate) G1Projective);

impl Commitment {
    /// Verify a provided opening of the commitment.
    pub fn verify_opening(&self, crs: &Crs, message: Scalar, bf: BlindingFactor) -> bool {
        crs.commit(message, bf) == *self
    }

    /// Get the inner group element representing the commitment.
    pub fn to_element(self) -> G1Projective {
        self.0
    }

    /// Wrap a group element as a commitment.
    pub fn from_element(element: G1Projective) -> Self {
        Self(element)
    }

    /// The commitment to `(0, 0)`.
    pub fn identity() -> Self {
        Self(G1Projective::identity())
    }

    /// Scale the commitment, committing to `(β·m, β·r)`.
    pub fn scale(self, beta: Scalar) -> Self {
        Self(self.0 * beta)
    }
}

impl PartialEq for Commitment {
    fn eq(&self, other: &Self) -> bool {
        same_point(&self.0, &other.0)
    }
}

impl Eq for Commitment {}

impl Add for Commitment {
    type Output = Commitment;

    fn add(self, rhs: Commitment) -> Commitment {
        Commitment(self.0 + rhs.0)
    }
}

impl ChallengeInput for Commitment {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume(&self.0);
    }
}

impl FixedSize for Commitment {
    const SIZE: usize = G1Projective::SIZE;
}

impl Write for Commitment {
    fn write(&self, buf: &mut impl BufMut) {
        self.0.write(buf);
    }
}

impl Read for Commitment {
    fn read(buf: &mut impl Buf) -> Result<Self, Error> {
        G1Projective::read(buf).map(Commitment)
    }
}

/// The secret opening of a [`Commitment`].
#[derive(Debug, Clone, Copy)]
pub struct Opening {
    /// The committed message.
    pub message: Scalar,
    /// The blinding factor.
    pub blinding_factor: BlindingFactor,
}

impl Opening {
    /// Sample a fresh blinding factor for `message`.
    pub fn new(rng: &mut impl Rng, message: Scalar) -> Self {
        Self {
            message,
            blinding_factor: BlindingFactor::new(rng),
        }
    }

    /// Sample a uniformly random message and blinding factor.
    pub fn random(rng: &mut impl Rng) -> Self {
        let message = Scalar::random(&mut *rng);
        Self::new(rng, message)
    }

    /// Commit to this opening.
    pub fn commit(&self, crs: &Crs) -> Commitment {
        crs.commit(self.message, self.blinding_factor)
    }
}
