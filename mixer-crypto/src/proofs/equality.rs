//! Proof of knowledge of a discrete log with respect to a swappable base.
//!
//! An [`EqualityProof`] shows knowledge of `x` with `public = x·base`. The base is a parameter so
//! the same machinery serves both the commitment randomness generator and the curve generator
//! that puzzle points and signature keys live over.

use crate::{
    common::*,
    proofs::{Challenge, ChallengeBuilder, ChallengeInput},
    serde::SerializeElement,
    wire::{FixedSize, Read, Write},
    Error,
};
use bytes::{Buf, BufMut};
use ff::Field;
use serde::{Deserialize, Serialize};

const EQUALITY_DOMAIN: &[u8] = b"mixer-crypto/proof/equality/v1";

/// Proof of knowledge of `x` such that `public = x·base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EqualityProof {
    /// Commitment to the blinding scalar, `T = w·base`.
    #[serde(with = "SerializeElement")]
    scalar_commitment: G1Projective,
    /// Response scalar, `z = w + e·x`.
    #[serde(with = "SerializeElement")]
    response: Scalar,
}

impl EqualityProof {
    /// Prove knowledge of `x` for `public = x·base` with a challenge bound to both points.
    pub fn prove(rng: &mut impl Rng, base: G1Projective, public: G1Projective, x: Scalar) -> Self {
        let builder = EqualityProofBuilder::generate_proof_commitments(rng, base, x);
        let challenge = Self::challenge(base, public, &builder);
        builder.generate_proof_response(challenge)
    }

    /// Verify a proof produced by [`EqualityProof::prove`].
    pub fn verify(&self, base: G1Projective, public: G1Projective) -> bool {
        let challenge = Self::challenge(base, public, self);
        self.verify_with_challenge(base, public, challenge)
    }

    /// Check `T + e·public == z·base` for an externally supplied challenge.
    pub fn verify_with_challenge(
        &self,
        base: G1Projective,
        public: G1Projective,
        challenge: Challenge,
    ) -> bool {
        let lhs = self.scalar_commitment + public * challenge.to_scalar();
        same_point(&lhs, &(base * self.response))
    }

    /// Scale the proof by `beta`: `T' = β·T`, `z' = β·z`.
    ///
    /// Under an unchanged challenge the result verifies for `β·public`.
    pub fn scale(&self, beta: Scalar) -> Self {
        Self {
            scalar_commitment: self.scalar_commitment * beta,
            response: self.response * beta,
        }
    }

    /// The response scalar.
    pub fn response(&self) -> Scalar {
        self.response
    }

    /// Solve for `T` so that the proof verifies for `public` under `challenge` with `response`.
    #[cfg(test)]
    pub(crate) fn simulate(
        base: G1Projective,
        public: G1Projective,
        challenge: Challenge,
        response: Scalar,
    ) -> Self {
        Self {
            scalar_commitment: base * response - public * challenge.to_scalar(),
            response,
        }
    }

    fn challenge(
        base: G1Projective,
        public: G1Projective,
        first_message: &impl ChallengeInput,
    ) -> Challenge {
        ChallengeBuilder::with_domain(EQUALITY_DOMAIN)
            .with(&base)
            .with(first_message)
            .with(&public)
            .finish()
    }
}

impl ChallengeInput for EqualityProof {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume(&self.scalar_commitment);
    }
}

impl FixedSize for EqualityProof {
    const SIZE: usize = G1Projective::SIZE + Scalar::SIZE;
}

impl Write for EqualityProof {
    fn write(&self, buf: &mut impl BufMut) {
        self.scalar_commitment.write(buf);
        self.response.write(buf);
    }
}

impl Read for EqualityProof {
    fn read(buf: &mut impl Buf) -> Result<Self, Error> {
        Ok(Self {
            scalar_commitment: G1Projective::read(buf)?,
            response: Scalar::read(buf)?,
        })
    }
}

/// A partially-built [`EqualityProof`].
#[derive(Debug, Clone, Copy)]
pub struct EqualityProofBuilder {
    x: Scalar,
    commitment_scalar: Scalar,
    scalar_commitment: G1Projective,
}

impl EqualityProofBuilder {
    /// Run the commitment phase for the discrete log `x` of some point over `base`.
    pub fn generate_proof_commitments(rng: &mut impl Rng, base: G1Projective, x: Scalar) -> Self {
        Self::with_commitment_scalar(base, x, Scalar::random(&mut *rng))
    }

    /// Run the commitment phase with a blinding scalar shared with another proof of `x`.
    ///
    /// Two proofs of the same `x` that share the blinding scalar and the challenge have equal
    /// responses, which is how a caller ties them to one witness.
    pub(crate) fn with_commitment_scalar(
        base: G1Projective,
        x: Scalar,
        commitment_scalar: Scalar,
    ) -> Self {
        Self {
            x,
            commitment_scalar,
            scalar_commitment: base * commitment_scalar,
        }
    }

    /// Run the response phase to complete the proof.
    pub fn generate_proof_response(self, challenge: Challenge) -> EqualityProof {
        EqualityProof {
            scalar_commitment: self.scalar_commitment,
            response: self.commitment_scalar + challenge.to_scalar() * self.x,
        }
    }
}

impl ChallengeInput for EqualityProofBuilder {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume(&self.scalar_commitment);
    }
}
