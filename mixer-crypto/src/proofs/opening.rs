//! Proof of knowledge of the opening of a [`Commitment`].
//!
//! ```
//! # use mixer_crypto::{pedersen::{Crs, Opening}, proofs::OpeningProof};
//! # use bls12_381::Scalar;
//! # let mut rng = rand::thread_rng();
//! let crs = Crs::global().unwrap();
//! let opening = Opening::new(&mut rng, Scalar::from(11u64));
//! let commitment = opening.commit(crs);
//! let proof = OpeningProof::prove(&mut rng, crs, &commitment, &opening);
//! assert!(proof.verify(crs, &commitment));
//! ```

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

const OPENING_DOMAIN: &[u8] = b"mixer-crypto/proof/opening/v1";

/// Fully constructed proof of knowledge of the opening of a commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpeningProof(SchnorrTranscript);

impl OpeningProof {
    /// Prove knowledge of `opening` for `commitment`, with a challenge bound to the commitment.
    pub fn prove(
        rng: &mut impl Rng,
        crs: &Crs,
        commitment: &Commitment,
        opening: &Opening,
    ) -> Self {
        let builder = OpeningProofBuilder::generate_proof_commitments(rng, crs, *opening);
        let challenge = Self::challenge(crs, commitment, &builder);
        builder.generate_proof_response(challenge)
    }

    /// Verify a proof produced by [`OpeningProof::prove`].
    pub fn verify(&self, crs: &Crs, commitment: &Commitment) -> bool {
        let challenge = Self::challenge(crs, commitment, self);
        self.verify_with_challenge(crs, commitment, challenge)
    }

    /// Verify knowledge of the opening of `commitment` under an externally supplied challenge.
    pub fn verify_with_challenge(
        &self,
        crs: &Crs,
        commitment: &Commitment,
        challenge: Challenge,
    ) -> bool {
        self.0.check(crs, commitment.to_element(), challenge)
    }

    /// Construct a proof that verifies for `commitment` under `challenge` from freely chosen
    /// responses, without knowing the opening.
    ///
    /// **warning:** a simulated proof shows only that the transcript is consistent with the
    /// commitment. It is used where the prover provably lacks the witness, such as after a
    /// ZKEval transform.
    pub fn simulate(
        crs: &Crs,
        commitment: &Commitment,
        challenge: Challenge,
        message_response: Scalar,
        blinding_response: Scalar,
    ) -> Self {
        Self(SchnorrTranscript::simulate(
            crs,
            commitment.to_element(),
            challenge,
            message_response,
            blinding_response,
        ))
    }

    /// The response scalar for the committed message.
    pub fn message_response(&self) -> Scalar {
        self.0.message_response
    }

    /// The response scalar for the blinding factor.
    pub fn blinding_response(&self) -> Scalar {
        self.0.blinding_response
    }

    fn challenge(
        crs: &Crs,
        commitment: &Commitment,
        first_message: &impl ChallengeInput,
    ) -> Challenge {
        ChallengeBuilder::with_domain(OPENING_DOMAIN)
            .with(crs)
            .with(first_message)
            .with(commitment)
            .finish()
    }
}

impl ChallengeInput for OpeningProof {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume(&self.0);
    }
}

impl FixedSize for OpeningProof {
    const SIZE: usize = SchnorrTranscript::SIZE;
}

impl Write for OpeningProof {
    fn write(&self, buf: &mut impl BufMut) {
        self.0.write(buf);
    }
}

impl Read for OpeningProof {
    fn read(buf: &mut impl Buf) -> Result<Self, Error> {
        SchnorrTranscript::read(buf).map(Self)
    }
}

/// A partially-built [`OpeningProof`].
///
/// Built up to (but not including) the challenge phase of a Schnorr proof.
#[derive(Debug, Clone, Copy)]
pub struct OpeningProofBuilder {
    opening: Opening,
    commitment: SchnorrCommitment,
}

impl OpeningProofBuilder {
    /// Run the commitment phase of a Schnorr-style opening proof.
    pub fn generate_proof_commitments(rng: &mut impl Rng, crs: &Crs, opening: Opening) -> Self {
        Self {
            opening,
            commitment: SchnorrCommitment::new(rng, crs),
        }
    }

    /// The blinding scalar committed for the message, for conjunctions that must share it.
    pub(crate) fn message_commitment_scalar(&self) -> Scalar {
        self.commitment.message_commitment_scalar
    }

    /// Run the response phase of the Schnorr-style opening proof to complete the proof.
    pub fn generate_proof_response(self, challenge: Challenge) -> OpeningProof {
        OpeningProof(self.commitment.respond(&self.opening, challenge))
    }
}

impl ChallengeInput for OpeningProofBuilder {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume(&self.commitment);
    }
}
