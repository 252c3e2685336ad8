//! Zero-knowledge proofs, implemented as building blocks for the composite relation proof and the
//! adaptor signature.
//!
//! The opening, linear-sum and link proofs share one Schnorr template over the commitment
//! generators: the prover commits to blinding scalars `T = w_m·H + w_r·G`, derives a challenge
//! `e`, and answers `z_m = w_m + e·m`, `z_r = w_r + e·r`; the verifier checks
//! `T + e·target == z_m·H + z_r·G` for the relation's target point. Each proof type decides
//! what its target is and which public data its challenge absorbs.
//!
//! Every proof can also be built in two phases through its builder, so that callers may bind
//! several proofs to one challenge.

mod challenge;
mod dleq;
mod equality;
mod linear;
mod link;
mod opening;
mod relation;
mod scaling;

pub use self::{
    challenge::*, dleq::*, equality::*, linear::*, link::*, opening::*, relation::*, scaling::*,
};

use crate::{
    common::*,
    pedersen::{Crs, Opening},
    serde::SerializeElement,
    wire::{FixedSize, Read, Write},
    Error,
};
use bytes::{Buf, BufMut};
use ff::Field;
use serde::{Deserialize, Serialize};

/// The transcript of one commitment-based Schnorr proof: `{T, z_m, z_r}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SchnorrTranscript {
    /// Commitment to the blinding scalars, `T`.
    #[serde(with = "SerializeElement")]
    scalar_commitment: G1Projective,
    /// Response for the message, `z_m`.
    #[serde(with = "SerializeElement")]
    message_response: Scalar,
    /// Response for the blinding factor, `z_r`.
    #[serde(with = "SerializeElement")]
    blinding_response: Scalar,
}

impl SchnorrTranscript {
    /// Check `T + e·target == z_m·H + z_r·G` on canonical coordinates.
    fn check(&self, crs: &Crs, target: G1Projective, challenge: Challenge) -> bool {
        let lhs = self.scalar_commitment + target * challenge.to_scalar();
        let rhs = crs.combine(self.message_response, self.blinding_response);
        same_point(&lhs, &rhs)
    }

    /// Solve for `T` given chosen responses, so that the transcript verifies against `target`
    /// under `challenge`.
    fn simulate(
        crs: &Crs,
        target: G1Projective,
        challenge: Challenge,
        message_response: Scalar,
        blinding_response: Scalar,
    ) -> Self {
        let scalar_commitment = crs.combine(message_response, blinding_response)
            - target * challenge.to_scalar();
        Self {
            scalar_commitment,
            message_response,
            blinding_response,
        }
    }

    /// Scale every component by `beta`. If the transcript verified for `target` under a challenge,
    /// the result verifies for `beta·target` under the same challenge.
    fn scale(&self, beta: Scalar) -> Self {
        Self {
            scalar_commitment: self.scalar_commitment * beta,
            message_response: self.message_response * beta,
            blinding_response: self.blinding_response * beta,
        }
    }
}

impl ChallengeInput for SchnorrTranscript {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume(&self.scalar_commitment);
    }
}

impl FixedSize for SchnorrTranscript {
    const SIZE: usize = G1Projective::SIZE + 2 * Scalar::SIZE;
}

impl Write for SchnorrTranscript {
    fn write(&self, buf: &mut impl BufMut) {
        self.scalar_commitment.write(buf);
        self.message_response.write(buf);
        self.blinding_response.write(buf);
    }
}

impl Read for SchnorrTranscript {
    fn read(buf: &mut impl Buf) -> Result<Self, Error> {
        Ok(Self {
            scalar_commitment: G1Projective::read(buf)?,
            message_response: Scalar::read(buf)?,
            blinding_response: Scalar::read(buf)?,
        })
    }
}

/// The commitment phase of the Schnorr template.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SchnorrCommitment {
    message_commitment_scalar: Scalar,
    blinding_commitment_scalar: Scalar,
    scalar_commitment: G1Projective,
}

impl SchnorrCommitment {
    /// Sample blinding scalars and commit to them.
    fn new(rng: &mut impl Rng, crs: &Crs) -> Self {
        let message_commitment_scalar = Scalar::random(&mut *rng);
        let blinding_commitment_scalar = Scalar::random(&mut *rng);
        Self {
            message_commitment_scalar,
            blinding_commitment_scalar,
            scalar_commitment: crs.combine(message_commitment_scalar, blinding_commitment_scalar),
        }
    }

    /// Answer `challenge` for the witness `opening`.
    fn respond(self, opening: &Opening, challenge: Challenge) -> SchnorrTranscript {
        let e = challenge.to_scalar();
        SchnorrTranscript {
            scalar_commitment: self.scalar_commitment,
            message_response: self.message_commitment_scalar + e * opening.message,
            blinding_response: self.blinding_commitment_scalar
                + e * opening.blinding_factor.to_scalar(),
        }
    }
}

impl ChallengeInput for SchnorrCommitment {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume(&self.scalar_commitment);
    }
}
