//! ZKEval: re-target a composite relation proof at a scaled puzzle without its witness.
//!
//! Given a proof for a statement `S` and a nonzero factor `β`, [`transform`] produces a proof for
//! `β·S`: both commitments, the point and both plaintexts scaled by `β`. Pedersen commitments
//! satisfy `β·Commit(m, r) = Commit(β·m, β·r)`, so:
//! - the commitments are scaled directly;
//! - the equality and link proofs are scaled algebraically and keep verifying under the anchor
//!   challenge;
//! - the opening proofs cannot be re-derived without the openings, so they are simulated from the
//!   scaled responses under the scaled session challenge.
//!
//! The simulated openings carry no knowledge, so every transform also emits a
//! [`PuzzleScalingProof`] tying the new statement and commitments to the old ones. The transformer
//! checks its own output with [`CompositeRelationProof::verify_transformed`] before returning it.

use crate::{
    common::*,
    composite::CompositeRelationProof,
    pedersen::Crs,
    proofs::{Challenge, OpeningProof, PuzzleScalingProof},
    statement::{PuzzleKeys, PuzzleStatement},
    Error,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// A nonzero scalar by which a puzzle and its proof are scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[u8; 32]", into = "[u8; 32]")]
pub struct TransformFactor(Scalar);

impl TransformFactor {
    /// Wrap a scalar, rejecting zero.
    pub fn new(beta: Scalar) -> Result<Self, Error> {
        if beta == Scalar::zero() {
            return Err(Error::Transform);
        }
        Ok(Self(beta))
    }

    /// Decode a factor from its 32-byte little-endian encoding, rejecting zero and unreduced
    /// values.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, Error> {
        let beta: Option<Scalar> = Scalar::from_bytes(bytes).into();
        beta.ok_or(Error::Transform).and_then(Self::new)
    }

    /// Sample a factor uniformly from the nonzero scalars.
    pub fn random(rng: &mut impl Rng) -> Self {
        Self(random_nonzero_scalar(rng))
    }

    /// The factor as a scalar.
    pub fn to_scalar(self) -> Scalar {
        self.0
    }

    /// The inverse factor, which undoes this one.
    pub fn invert(self) -> Self {
        let inverse: Option<Scalar> = self.0.invert().into();
        Self(inverse.expect("impossible; transform factors are nonzero"))
    }

    /// The 32-byte little-endian encoding.
    pub fn to_bytes(self) -> [u8; 32] {
        self.0.to_bytes()
    }
}

impl std::convert::TryFrom<[u8; 32]> for TransformFactor {
    type Error = Error;

    fn try_from(bytes: [u8; 32]) -> Result<Self, Error> {
        Self::from_bytes(&bytes)
    }
}

impl From<TransformFactor> for [u8; 32] {
    fn from(factor: TransformFactor) -> Self {
        factor.to_bytes()
    }
}

/// Transform `proof`, issued or transformed for `previous`, into a proof for `new_statement`,
/// which must be `previous` scaled by `beta` on the point and on both ciphertexts.
///
/// Returns the new proof and the scaling proof that links it to `proof`. Fails with
/// [`Error::Transform`] if the result does not verify against `new_statement`, for instance when
/// the point or either ciphertext was scaled by a different factor.
pub fn transform(
    rng: &mut impl Rng,
    proof: &CompositeRelationProof,
    beta: TransformFactor,
    crs: &Crs,
    keys: &PuzzleKeys,
    previous: &PuzzleStatement,
    new_statement: &PuzzleStatement,
) -> Result<(CompositeRelationProof, PuzzleScalingProof), Error> {
    let b = beta.to_scalar();
    let hops = proof.hops.checked_add(1).ok_or(Error::Transform)?;

    let r0_commitment = proof.r0_commitment.scale(b);
    let alpha_commitment = proof.alpha_commitment.scale(b);
    let session_challenge = proof.session_challenge * b;
    let responses = proof.responses.scale(b);
    let session = Challenge::from_scalar(session_challenge);

    let mut factors = proof.factors;
    factors.r0 *= b;
    factors.alpha *= b;

    let transformed = CompositeRelationProof {
        r0_opening: OpeningProof::simulate(
            crs,
            &r0_commitment,
            session,
            responses.r0_message,
            responses.r0_blinding,
        ),
        alpha_opening: OpeningProof::simulate(
            crs,
            &alpha_commitment,
            session,
            responses.alpha_message,
            responses.alpha_blinding,
        ),
        r0_link: proof.r0_link.scale(b),
        alpha_link: proof.alpha_link.scale(b),
        equality: proof.equality.scale(b),
        r0_commitment,
        alpha_commitment,
        session_challenge,
        anchor_challenge: proof.anchor_challenge,
        responses,
        id: proof.id,
        version: proof.version,
        hops,
        factors,
    };
    let scaling = PuzzleScalingProof::prove(
        rng,
        keys,
        proof.committed(previous),
        transformed.committed(new_statement),
        b,
    );

    transformed
        .verify_transformed(crs, keys, previous, proof, new_statement, &scaling)
        .map_err(|err| {
            debug!(error = ?err, hops, "transformed proof does not match the target statement");
            Error::Transform
        })?;
    trace!(hops, "transformed composite relation proof");
    Ok((transformed, scaling))
}
