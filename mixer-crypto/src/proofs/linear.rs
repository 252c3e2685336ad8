//! Proof that a commitment is the sum of two others, with knowledge of the combined witness.
//!
//! The prover shows it knows `(m_a + m_b, r_a + r_b)` opening `C_a + C_b`, and the verifier
//! additionally requires `C_sum` to equal that sum on canonical coordinates.

use super::{SchnorrCommitment, SchnorrTranscript};
use crate::{
    common::*,
    pedersen::{Commitment, Crs, Opening},
    proofs::{Challenge, ChallengeBuilder, ChallengeInput},
    wire::{FixedSize, Read, Write},
    BlindingFactor, Error,
};
use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

const LINEAR_SUM_DOMAIN: &[u8] = b"mixer-crypto/proof/linear-sum/v1";

/// The public statement of a [`LinearSumProof`].
#[derive(Debug, Clone, Copy)]
pub struct LinearSumStatement {
    /// First summand.
    pub a: Commitment,
    /// Second summand.
    pub b: Commitment,
    /// The claimed sum.
    pub sum: Commitment,
}

impl ChallengeInput for LinearSumStatement {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume(&self.a);
        builder.consume(&self.b);
        builder.consume(&self.sum);
    }
}

/// Proof that `C_sum` commits to the coordinate-wise sum of the witnesses behind `C_a` and `C_b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinearSumProof(SchnorrTranscript);

impl LinearSumProof {
    /// Prove the sum relation from the openings of both summands.
    pub fn prove(
        rng: &mut impl Rng,
        crs: &Crs,
        statement: &LinearSumStatement,
        a: &Opening,
        b: &Opening,
    ) -> Self {
        let combined = Opening {
            message: a.message + b.message,
            blinding_factor: BlindingFactor::from_scalar(
                a.blinding_factor.to_scalar() + b.blinding_factor.to_scalar(),
            ),
        };
        let commitment = SchnorrCommitment::new(rng, crs);
        let challenge = Self::challenge(crs, statement, &commitment);
        Self(commitment.respond(&combined, challenge))
    }

    /// Verify the sum relation.
    pub fn verify(&self, crs: &Crs, statement: &LinearSumStatement) -> bool {
        let expected_sum = statement.a + statement.b;
        if expected_sum != statement.sum {
            return false;
        }
        let challenge = Self::challenge(crs, statement, &self.0);
        self.0.check(crs, expected_sum.to_element(), challenge)
    }

    fn challenge(
        crs: &Crs,
        statement: &LinearSumStatement,
        first_message: &impl ChallengeInput,
    ) -> Challenge {
        ChallengeBuilder::with_domain(LINEAR_SUM_DOMAIN)
            .with(crs)
            .with(first_message)
            .with(statement)
            .finish()
    }
}

impl FixedSize for LinearSumProof {
    const SIZE: usize = SchnorrTranscript::SIZE;
}

impl Write for LinearSumProof {
    fn write(&self, buf: &mut impl BufMut) {
        self.0.write(buf);
    }
}

impl Read for LinearSumProof {
    fn read(buf: &mut impl Buf) -> Result<Self, Error> {
        SchnorrTranscript::read(buf).map(Self)
    }
}
