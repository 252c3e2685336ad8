//! Proof of knowledge of the opening of the difference `C_sum − C_base`.
//!
//! This links a commitment to a known increment over a base: if the prover knows `(m, r)` with
//! `C_sum = C_base + Commit(m, r)`, it can show so without revealing `m`. With the identity as base
//! it degenerates to an opening proof of `C_sum`, which is how the composite relation proof ties a
//! commitment to the value it hands to the encryption layer.

use super::{SchnorrCommitment, SchnorrTranscript};
use crate::{
    common::*,
    pedersen::{Commitment, Crs, Opening},
    proofs::{Challenge, ChallengeBuilder, ChallengeInput},
    wire::{FixedSize, Read, Write},
    Error,
};
use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

const LINK_DOMAIN: &[u8] = b"mixer-crypto/proof/link/v1";

/// Proof that the prover knows an opening of `C_sum − C_base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkProof(SchnorrTranscript);

impl LinkProof {
    /// Prove knowledge of `delta`, the opening of `sum − base`.
    pub fn prove(
        rng: &mut impl Rng,
        crs: &Crs,
        base: &Commitment,
        sum: &Commitment,
        delta: &Opening,
    ) -> Self {
        let builder = LinkProofBuilder::generate_proof_commitments(rng, crs, *delta);
        let challenge = Self::challenge(crs, base, sum, &builder);
        builder.generate_proof_response(challenge)
    }

    /// Verify a proof produced by [`LinkProof::prove`].
    pub fn verify(&self, crs: &Crs, base: &Commitment, sum: &Commitment) -> bool {
        let challenge = Self::challenge(crs, base, sum, self);
        self.verify_with_challenge(crs, base, sum, challenge)
    }

    /// Verify against an externally supplied challenge.
    pub fn verify_with_challenge(
        &self,
        crs: &Crs,
        base: &Commitment,
        sum: &Commitment,
        challenge: Challenge,
    ) -> bool {
        let delta = sum.to_element() - base.to_element();
        self.0.check(crs, delta, challenge)
    }

    /// Scale the proof by `beta`.
    ///
    /// A proof that verified for `(base, sum)` under a fixed challenge verifies for
    /// `(β·base, β·sum)` under the same challenge. Only meaningful for proofs whose challenge does
    /// not depend on the statement.
    pub fn scale(&self, beta: Scalar) -> Self {
        Self(self.0.scale(beta))
    }

    #[cfg(test)]
    pub(crate) fn simulate(
        crs: &Crs,
        base: &Commitment,
        sum: &Commitment,
        challenge: Challenge,
        message_response: Scalar,
        blinding_response: Scalar,
    ) -> Self {
        Self(SchnorrTranscript::simulate(
            crs,
            sum.to_element() - base.to_element(),
            challenge,
            message_response,
            blinding_response,
        ))
    }

    fn challenge(
        crs: &Crs,
        base: &Commitment,
        sum: &Commitment,
        first_message: &impl ChallengeInput,
    ) -> Challenge {
        ChallengeBuilder::with_domain(LINK_DOMAIN)
            .with(crs)
            .with(first_message)
            .with(base)
            .with(sum)
            .finish()
    }
}

impl ChallengeInput for LinkProof {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume(&self.0);
    }
}

impl FixedSize for LinkProof {
    const SIZE: usize = SchnorrTranscript::SIZE;
}

impl Write for LinkProof {
    fn write(&self, buf: &mut impl BufMut) {
        self.0.write(buf);
    }
}

impl Read for LinkProof {
    fn read(buf: &mut impl Buf) -> Result<Self, Error> {
        SchnorrTranscript::read(buf).map(Self)
    }
}

/// A partially-built [`LinkProof`].
#[derive(Debug, Clone, Copy)]
pub struct LinkProofBuilder {
    delta: Opening,
    commitment: SchnorrCommitment,
}

impl LinkProofBuilder {
    /// Run the commitment phase for a link over the difference opening `delta`.
    pub fn generate_proof_commitments(rng: &mut impl Rng, crs: &Crs, delta: Opening) -> Self {
        Self {
            delta,
            commitment: SchnorrCommitment::new(rng, crs),
        }
    }

    /// Run the response phase to complete the proof.
    pub fn generate_proof_response(self, challenge: Challenge) -> LinkProof {
        LinkProof(self.commitment.respond(&self.delta, challenge))
    }
}

impl ChallengeInput for LinkProofBuilder {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume(&self.commitment);
    }
}
