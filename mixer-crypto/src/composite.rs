//! The composite relation proof behind a freshly issued puzzle.
//!
//! A [`CompositeRelationProof`] shows knowledge of `(r₀, α)` such that
//! - `C_r₀` opens to `r₀` and `C_α` opens to `α`,
//! - the auditor ciphertext encrypts `r₀` and the hub ciphertext encrypts `α`,
//! - the puzzle point equals `α·G`.
//!
//! It is the conjunction of two opening proofs, two link proofs and one equality proof over the
//! curve generator:
//! - The opening proofs answer the **session challenge**, a Fiat-Shamir hash over the whole
//!   issuance transcript.
//! - The equality and link proofs answer the **anchor challenge**, which is the session challenge
//!   as issued. It is kept unscaled so those components stay verifiable after a
//!   [ZKEval](crate::zkeval) transform scales them.
//! - The equality proof shares its blinding scalar with the `α` opening, so its response equals
//!   the `α` message response. Verification checks that, which ties the point to `C_α` and
//!   survives scaling.
//! - The ciphertexts are bound by construction: the prover hands the same scalars to the
//!   commitments and to the encryption layer. Ciphertext internals are never inspected.
//!
//! A transformed proof (one with `hops > 0`) carries simulated opening proofs and a session
//! challenge that can no longer be recomputed, so on its own it proves nothing. It is only
//! accepted by [`CompositeRelationProof::verify_transformed`], next to the proof it was derived
//! from and a [`PuzzleScalingProof`] showing that the statement and both commitments were scaled
//! from their predecessors by one factor. Chained back to an issued proof, that gives the same
//! guarantee as the issued proof for the scaled secrets.

use crate::{
    common::*,
    pedersen::{Commitment, Crs, Opening},
    proofs::{
        Challenge, ChallengeBuilder, CommittedPuzzle, EqualityProof, EqualityProofBuilder,
        LinkProof, LinkProofBuilder, OpeningProof, OpeningProofBuilder, PuzzleScalingProof,
    },
    serde::SerializeElement,
    statement::{PuzzleKeys, PuzzleStatement},
    wire::{FixedSize, Read, Write},
    Error, ProofKind,
};
use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use tracing::{debug, trace};

/// The only composite proof version this crate produces and accepts.
pub const COMPOSITE_VERSION: u32 = 1;

const SESSION_DOMAIN: &[u8] = b"mixer-crypto/proof/composite/v1";
const IDENTIFIER_DOMAIN: &[u8] = b"mixer-crypto/composite/identifier/v1";

/// Names the part of a composite proof that failed verification.
///
/// Reported for local diagnostics only; it never crosses a protocol boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompositeComponent {
    /// Unsupported version tag.
    Version,
    /// The session challenge does not match the issuance transcript.
    Challenge,
    /// Opening proof of `C_r₀`.
    AuditOpening,
    /// Opening proof of `C_α`.
    SecretOpening,
    /// The carried response scalars disagree with the opening proofs.
    Responses,
    /// The point is not `α·G` for the `α` behind `C_α`.
    Equality,
    /// Link proof of `C_r₀`.
    AuditLink,
    /// Link proof of `C_α`.
    SecretLink,
    /// The hop count, identifier, anchor or version does not continue the previous proof, or a
    /// transformed proof was offered without one.
    Lineage,
    /// The statement or commitments are not the previous ones scaled by a single factor.
    Scaling,
}

/// The secrets behind a puzzle.
#[derive(Debug, Clone, Copy)]
pub struct CompositeWitness {
    /// The audit secret, encrypted under the auditor key.
    pub r0: Scalar,
    /// The puzzle secret, encrypted under the hub key.
    pub alpha: Scalar,
}

/// Cumulative factors applied by ZKEval. Held locally by whoever applied them; never encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformFactors {
    /// Product of the factors applied to the `r₀` side.
    pub r0: Scalar,
    /// Product of the factors applied to the `α` side.
    pub alpha: Scalar,
}

impl Default for TransformFactors {
    fn default() -> Self {
        Self {
            r0: Scalar::one(),
            alpha: Scalar::one(),
        }
    }
}

/// The carried response scalars: `(z_m, z_r)` of each opening proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Responses {
    #[serde(with = "SerializeElement")]
    pub(crate) r0_message: Scalar,
    #[serde(with = "SerializeElement")]
    pub(crate) r0_blinding: Scalar,
    #[serde(with = "SerializeElement")]
    pub(crate) alpha_message: Scalar,
    #[serde(with = "SerializeElement")]
    pub(crate) alpha_blinding: Scalar,
}

impl Responses {
    fn of(r0_opening: &OpeningProof, alpha_opening: &OpeningProof) -> Self {
        Self {
            r0_message: r0_opening.message_response(),
            r0_blinding: r0_opening.blinding_response(),
            alpha_message: alpha_opening.message_response(),
            alpha_blinding: alpha_opening.blinding_response(),
        }
    }

    pub(crate) fn scale(&self, beta: Scalar) -> Self {
        Self {
            r0_message: self.r0_message * beta,
            r0_blinding: self.r0_blinding * beta,
            alpha_message: self.alpha_message * beta,
            alpha_blinding: self.alpha_blinding * beta,
        }
    }
}

/// Proof that two commitments, two ciphertexts and a point all carry the same pair of secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeRelationProof {
    pub(crate) r0_commitment: Commitment,
    pub(crate) alpha_commitment: Commitment,
    pub(crate) r0_opening: OpeningProof,
    pub(crate) alpha_opening: OpeningProof,
    pub(crate) r0_link: LinkProof,
    pub(crate) alpha_link: LinkProof,
    pub(crate) equality: EqualityProof,
    #[serde(with = "SerializeElement")]
    pub(crate) session_challenge: Scalar,
    #[serde(with = "SerializeElement")]
    pub(crate) anchor_challenge: Scalar,
    pub(crate) responses: Responses,
    pub(crate) id: [u8; 32],
    pub(crate) version: u32,
    pub(crate) hops: u32,
    #[serde(skip)]
    pub(crate) factors: TransformFactors,
}

impl CompositeRelationProof {
    /// Prove that `statement` holds `witness` under `keys`.
    ///
    /// The ciphertexts must have been produced by encrypting `witness.r0` and `witness.alpha`;
    /// this is not checked. The point is checked, and a mismatch fails with
    /// [`Error::ProofInvalid`].
    pub fn prove(
        rng: &mut impl Rng,
        crs: &Crs,
        witness: &CompositeWitness,
        statement: &PuzzleStatement,
        keys: &PuzzleKeys,
    ) -> Result<Self, Error> {
        if !same_point(&statement.point, &(G1Projective::generator() * witness.alpha)) {
            return Err(Error::ProofInvalid(ProofKind::Equality));
        }

        let r0_secret = Opening::new(&mut *rng, witness.r0);
        let alpha_secret = Opening::new(&mut *rng, witness.alpha);
        let r0_commitment = r0_secret.commit(crs);
        let alpha_commitment = alpha_secret.commit(crs);

        let r0_opening = OpeningProofBuilder::generate_proof_commitments(rng, crs, r0_secret);
        let alpha_opening = OpeningProofBuilder::generate_proof_commitments(rng, crs, alpha_secret);
        let equality = EqualityProofBuilder::with_commitment_scalar(
            G1Projective::generator(),
            witness.alpha,
            alpha_opening.message_commitment_scalar(),
        );
        let r0_link = LinkProofBuilder::generate_proof_commitments(rng, crs, r0_secret);
        let alpha_link = LinkProofBuilder::generate_proof_commitments(rng, crs, alpha_secret);
        let id = Self::identifier(witness);

        let challenge = ChallengeBuilder::with_domain(SESSION_DOMAIN)
            .with(crs)
            .with(&r0_commitment)
            .with(&alpha_commitment)
            .with(&r0_opening)
            .with(&alpha_opening)
            .with(&equality)
            .with(&r0_link)
            .with(&alpha_link)
            .with(statement)
            .with(keys)
            .with_bytes(id)
            .with_bytes(COMPOSITE_VERSION.to_be_bytes())
            .finish();

        let r0_opening = r0_opening.generate_proof_response(challenge);
        let alpha_opening = alpha_opening.generate_proof_response(challenge);
        trace!(id = ?id, "issued composite relation proof");
        Ok(Self {
            r0_commitment,
            alpha_commitment,
            responses: Responses::of(&r0_opening, &alpha_opening),
            r0_opening,
            alpha_opening,
            r0_link: r0_link.generate_proof_response(challenge),
            alpha_link: alpha_link.generate_proof_response(challenge),
            equality: equality.generate_proof_response(challenge),
            session_challenge: challenge.to_scalar(),
            anchor_challenge: challenge.to_scalar(),
            id,
            version: COMPOSITE_VERSION,
            hops: 0,
            factors: TransformFactors::default(),
        })
    }

    /// Verify an issued proof against `statement`.
    ///
    /// Transformed proofs are rejected here with [`CompositeComponent::Lineage`]; they verify only
    /// through [`CompositeRelationProof::verify_transformed`]. On failure the offending component
    /// is logged at debug level and carried in [`Error::CompositeProofInvalid`], whose displayed
    /// message omits it.
    pub fn verify(
        &self,
        crs: &Crs,
        statement: &PuzzleStatement,
        keys: &PuzzleKeys,
    ) -> Result<(), Error> {
        self.check_issued(crs, statement, keys)
            .map_err(|component| self.rejected(component))
    }

    /// Verify a transformed proof for `statement` against the proof it was derived from.
    ///
    /// `previous_proof` must be the proof for `previous` one hop earlier, and `scaling` must show
    /// that `statement` and this proof's commitments are `previous` and its commitments scaled by
    /// one factor. Only that single hop is checked: `previous_proof` has to be trusted, or
    /// verified in turn, by the caller.
    pub fn verify_transformed(
        &self,
        crs: &Crs,
        keys: &PuzzleKeys,
        previous: &PuzzleStatement,
        previous_proof: &CompositeRelationProof,
        statement: &PuzzleStatement,
        scaling: &PuzzleScalingProof,
    ) -> Result<(), Error> {
        self.check_transformed(crs, keys, previous, previous_proof, statement, scaling)
            .map_err(|component| self.rejected(component))
    }

    fn rejected(&self, component: CompositeComponent) -> Error {
        debug!(
            component = ?component,
            hops = self.hops,
            "composite relation proof rejected"
        );
        Error::CompositeProofInvalid(component)
    }

    fn check_issued(
        &self,
        crs: &Crs,
        statement: &PuzzleStatement,
        keys: &PuzzleKeys,
    ) -> Result<(), CompositeComponent> {
        if self.version != COMPOSITE_VERSION {
            return Err(CompositeComponent::Version);
        }
        if self.hops != 0 {
            return Err(CompositeComponent::Lineage);
        }

        let recomputed = self.session_transcript(crs, statement, keys).finish();
        if recomputed.to_scalar() != self.session_challenge
            || self.anchor_challenge != self.session_challenge
        {
            return Err(CompositeComponent::Challenge);
        }

        self.check_components(crs, statement)
    }

    fn check_transformed(
        &self,
        crs: &Crs,
        keys: &PuzzleKeys,
        previous: &PuzzleStatement,
        previous_proof: &CompositeRelationProof,
        statement: &PuzzleStatement,
        scaling: &PuzzleScalingProof,
    ) -> Result<(), CompositeComponent> {
        if self.version != COMPOSITE_VERSION {
            return Err(CompositeComponent::Version);
        }
        if previous_proof.hops.checked_add(1) != Some(self.hops)
            || previous_proof.id != self.id
            || previous_proof.anchor_challenge != self.anchor_challenge
            || previous_proof.version != self.version
        {
            return Err(CompositeComponent::Lineage);
        }

        self.check_components(crs, statement)?;

        if !scaling.verify(
            keys,
            previous_proof.committed(previous),
            self.committed(statement),
        ) {
            return Err(CompositeComponent::Scaling);
        }
        Ok(())
    }

    /// The checks shared by issued and transformed proofs.
    fn check_components(
        &self,
        crs: &Crs,
        statement: &PuzzleStatement,
    ) -> Result<(), CompositeComponent> {
        let session = Challenge::from_scalar(self.session_challenge);
        if !self
            .r0_opening
            .verify_with_challenge(crs, &self.r0_commitment, session)
        {
            return Err(CompositeComponent::AuditOpening);
        }
        if !self
            .alpha_opening
            .verify_with_challenge(crs, &self.alpha_commitment, session)
        {
            return Err(CompositeComponent::SecretOpening);
        }

        if Responses::of(&self.r0_opening, &self.alpha_opening) != self.responses {
            return Err(CompositeComponent::Responses);
        }

        let anchor = Challenge::from_scalar(self.anchor_challenge);
        if self.equality.response() != self.responses.alpha_message
            || !self.equality.verify_with_challenge(
                G1Projective::generator(),
                statement.point,
                anchor,
            )
        {
            return Err(CompositeComponent::Equality);
        }

        let base = Commitment::identity();
        if !self
            .r0_link
            .verify_with_challenge(crs, &base, &self.r0_commitment, anchor)
        {
            return Err(CompositeComponent::AuditLink);
        }
        if !self
            .alpha_link
            .verify_with_challenge(crs, &base, &self.alpha_commitment, anchor)
        {
            return Err(CompositeComponent::SecretLink);
        }

        Ok(())
    }

    /// `statement` together with this proof's commitments, as one end of a scaling hop.
    pub(crate) fn committed<'a>(&self, statement: &'a PuzzleStatement) -> CommittedPuzzle<'a> {
        CommittedPuzzle {
            statement,
            r0_commitment: self.r0_commitment,
            alpha_commitment: self.alpha_commitment,
        }
    }

    fn session_transcript(
        &self,
        crs: &Crs,
        statement: &PuzzleStatement,
        keys: &PuzzleKeys,
    ) -> ChallengeBuilder {
        ChallengeBuilder::with_domain(SESSION_DOMAIN)
            .with(crs)
            .with(&self.r0_commitment)
            .with(&self.alpha_commitment)
            .with(&self.r0_opening)
            .with(&self.alpha_opening)
            .with(&self.equality)
            .with(&self.r0_link)
            .with(&self.alpha_link)
            .with(statement)
            .with(keys)
            .with_bytes(self.id)
            .with_bytes(self.version.to_be_bytes())
    }

    /// `SHA3-256(domain ‖ r₀ ‖ α)`, for correlating audit records.
    fn identifier(witness: &CompositeWitness) -> [u8; 32] {
        let mut hasher = Sha3_256::new();
        hasher.update(IDENTIFIER_DOMAIN);
        hasher.update(witness.r0.to_bytes());
        hasher.update(witness.alpha.to_bytes());
        let mut id = [0u8; 32];
        id.copy_from_slice(&hasher.finalize());
        id
    }

    /// The audit correlation identifier. Preserved across transforms.
    pub fn id(&self) -> [u8; 32] {
        self.id
    }

    /// Number of ZKEval transforms applied since issuance.
    pub fn hops(&self) -> u32 {
        self.hops
    }

    /// The version tag.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Commitment to `r₀`.
    pub fn r0_commitment(&self) -> Commitment {
        self.r0_commitment
    }

    /// Commitment to `α`.
    pub fn alpha_commitment(&self) -> Commitment {
        self.alpha_commitment
    }

    /// Factors applied by local transforms. Always one on a proof received from elsewhere.
    pub fn transform_factors(&self) -> TransformFactors {
        self.factors
    }
}

impl FixedSize for CompositeRelationProof {
    const SIZE: usize = 2 * Commitment::SIZE
        + 2 * OpeningProof::SIZE
        + 2 * LinkProof::SIZE
        + EqualityProof::SIZE
        + 6 * Scalar::SIZE
        + <[u8; 32]>::SIZE
        + 2 * u32::SIZE;
}

impl Write for CompositeRelationProof {
    fn write(&self, buf: &mut impl BufMut) {
        self.r0_commitment.write(buf);
        self.alpha_commitment.write(buf);
        self.r0_opening.write(buf);
        self.alpha_opening.write(buf);
        self.r0_link.write(buf);
        self.alpha_link.write(buf);
        self.equality.write(buf);
        self.session_challenge.write(buf);
        self.anchor_challenge.write(buf);
        self.responses.r0_message.write(buf);
        self.responses.r0_blinding.write(buf);
        self.responses.alpha_message.write(buf);
        self.responses.alpha_blinding.write(buf);
        self.id.write(buf);
        self.version.write(buf);
        self.hops.write(buf);
    }
}

impl Read for CompositeRelationProof {
    fn read(buf: &mut impl Buf) -> Result<Self, Error> {
        Ok(Self {
            r0_commitment: Commitment::read(buf)?,
            alpha_commitment: Commitment::read(buf)?,
            r0_opening: OpeningProof::read(buf)?,
            alpha_opening: OpeningProof::read(buf)?,
            r0_link: LinkProof::read(buf)?,
            alpha_link: LinkProof::read(buf)?,
            equality: EqualityProof::read(buf)?,
            session_challenge: Scalar::read(buf)?,
            anchor_challenge: Scalar::read(buf)?,
            responses: Responses {
                r0_message: Scalar::read(buf)?,
                r0_blinding: Scalar::read(buf)?,
                alpha_message: Scalar::read(buf)?,
                alpha_blinding: Scalar::read(buf)?,
            },
            id: <[u8; 32]>::read(buf)?,
            version: u32::read(buf)?,
            hops: u32::read(buf)?,
            factors: TransformFactors::default(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        encryption::EncryptionKeyPair,
        wire::{Decode, Encode},
        zkeval::{transform, TransformFactor},
    };
    use ff::Field;
    use std::sync::OnceLock;

    fn keys() -> PuzzleKeys {
        static KEYS: OnceLock<PuzzleKeys> = OnceLock::new();
        KEYS.get_or_init(|| {
            let mut rng = crate::test::rng();
            PuzzleKeys {
                auditor: EncryptionKeyPair::generate(&mut rng, 512)
                    .unwrap()
                    .encryption_key()
                    .clone(),
                hub: EncryptionKeyPair::generate(&mut rng, 512)
                    .unwrap()
                    .encryption_key()
                    .clone(),
            }
        })
        .clone()
    }

    fn issue(rng: &mut impl Rng) -> (CompositeRelationProof, PuzzleStatement, PuzzleKeys) {
        let crs = Crs::global().unwrap();
        let keys = keys();
        let witness = CompositeWitness {
            r0: Scalar::from(7u64),
            alpha: Scalar::from(11u64),
        };
        let statement = PuzzleStatement {
            point: G1Projective::generator() * witness.alpha,
            r0_ciphertext: keys.auditor.encrypt(&mut *rng, witness.r0),
            alpha_ciphertext: keys.hub.encrypt(&mut *rng, witness.alpha),
        };
        let proof = CompositeRelationProof::prove(rng, crs, &witness, &statement, &keys).unwrap();
        (proof, statement, keys)
    }

    fn transformed(
        rng: &mut impl Rng,
        proof: &CompositeRelationProof,
        statement: &PuzzleStatement,
        keys: &PuzzleKeys,
    ) -> (CompositeRelationProof, PuzzleStatement, PuzzleScalingProof) {
        let beta = TransformFactor::random(&mut *rng);
        let b = beta.to_scalar();
        let target = PuzzleStatement {
            point: statement.point * b,
            r0_ciphertext: keys.auditor.scale(&statement.r0_ciphertext, b),
            alpha_ciphertext: keys.hub.scale(&statement.alpha_ciphertext, b),
        };
        let (transformed, scaling) = transform(
            rng,
            proof,
            beta,
            Crs::global().unwrap(),
            keys,
            statement,
            &target,
        )
        .unwrap();
        (transformed, target, scaling)
    }

    #[test]
    fn composite_proof_verifies() {
        let mut rng = crate::test::rng();
        let (proof, statement, keys) = issue(&mut rng);
        assert_eq!(proof.verify(Crs::global().unwrap(), &statement, &keys), Ok(()));
        assert_eq!(proof.hops(), 0);
        assert_eq!(proof.version(), COMPOSITE_VERSION);
    }

    #[test]
    fn prove_rejects_a_point_off_the_secret() {
        let mut rng = crate::test::rng();
        let keys = keys();
        let witness = CompositeWitness {
            r0: Scalar::from(7u64),
            alpha: Scalar::from(11u64),
        };
        let statement = PuzzleStatement {
            point: G1Projective::generator() * Scalar::from(12u64),
            r0_ciphertext: keys.auditor.encrypt(&mut rng, witness.r0),
            alpha_ciphertext: keys.hub.encrypt(&mut rng, witness.alpha),
        };
        let crs = Crs::global().unwrap();
        let result = CompositeRelationProof::prove(&mut rng, crs, &witness, &statement, &keys);
        assert_eq!(result.err(), Some(Error::ProofInvalid(ProofKind::Equality)));
    }

    #[test]
    fn identifier_depends_only_on_the_secrets() {
        let mut rng = crate::test::rng();
        let (first, _, _) = issue(&mut rng);
        let (second, _, _) = issue(&mut rng);
        assert_eq!(first.id(), second.id());
        assert_ne!(first.r0_commitment(), second.r0_commitment());
    }

    #[test]
    fn swapped_ciphertext_breaks_the_session_challenge() {
        let mut rng = crate::test::rng();
        let (proof, mut statement, keys) = issue(&mut rng);
        statement.alpha_ciphertext = keys.hub.encrypt(&mut rng, Scalar::from(11u64));

        assert_eq!(
            proof.verify(Crs::global().unwrap(), &statement, &keys),
            Err(Error::CompositeProofInvalid(CompositeComponent::Challenge))
        );
    }

    #[test]
    fn unsupported_version_is_reported() {
        let mut rng = crate::test::rng();
        let (mut proof, statement, keys) = issue(&mut rng);
        proof.version = COMPOSITE_VERSION + 1;

        assert_eq!(
            proof.verify(Crs::global().unwrap(), &statement, &keys),
            Err(Error::CompositeProofInvalid(CompositeComponent::Version))
        );
    }

    #[test]
    fn mismatched_responses_are_reported() {
        let mut rng = crate::test::rng();
        let (proof, statement, keys) = issue(&mut rng);
        let (mut transformed, target, scaling) = transformed(&mut rng, &proof, &statement, &keys);
        transformed.responses.r0_blinding += Scalar::one();

        assert_eq!(
            transformed.verify_transformed(
                Crs::global().unwrap(),
                &keys,
                &statement,
                &proof,
                &target,
                &scaling
            ),
            Err(Error::CompositeProofInvalid(CompositeComponent::Responses))
        );
    }

    #[test]
    fn wrong_point_fails_the_equality_component() {
        let mut rng = crate::test::rng();
        let (proof, statement, keys) = issue(&mut rng);
        let (transformed, mut target, scaling) = transformed(&mut rng, &proof, &statement, &keys);
        target.point = G1Projective::generator() * Scalar::random(&mut rng);

        assert_eq!(
            transformed.verify_transformed(
                Crs::global().unwrap(),
                &keys,
                &statement,
                &proof,
                &target,
                &scaling
            ),
            Err(Error::CompositeProofInvalid(CompositeComponent::Equality))
        );
    }

    #[test]
    fn transformed_proof_needs_its_predecessor() {
        let mut rng = crate::test::rng();
        let crs = Crs::global().unwrap();
        let (proof, statement, keys) = issue(&mut rng);
        let (transformed, target, scaling) = transformed(&mut rng, &proof, &statement, &keys);

        assert_eq!(
            transformed.verify(crs, &target, &keys),
            Err(Error::CompositeProofInvalid(CompositeComponent::Lineage))
        );
        assert_eq!(
            transformed.verify_transformed(crs, &keys, &target, &transformed, &target, &scaling),
            Err(Error::CompositeProofInvalid(CompositeComponent::Lineage))
        );
        assert_eq!(
            transformed.verify_transformed(crs, &keys, &statement, &proof, &target, &scaling),
            Ok(())
        );
    }

    #[test]
    fn simulated_proof_for_an_arbitrary_statement_is_rejected() {
        let mut rng = crate::test::rng();
        let crs = Crs::global().unwrap();
        let (issued, statement, keys) = issue(&mut rng);

        // A statement nobody knows the secrets of, and a hop-one proof simulated for it under the
        // issued anchor and a made-up session challenge.
        let (r0, alpha) = (Scalar::random(&mut rng), Scalar::random(&mut rng));
        let target = PuzzleStatement {
            point: random_non_identity(&mut rng),
            r0_ciphertext: keys.auditor.encrypt(&mut rng, r0),
            alpha_ciphertext: keys.hub.encrypt(&mut rng, alpha),
        };
        let anchor = Challenge::from_scalar(issued.anchor_challenge);
        let session = Challenge::from_scalar(Scalar::random(&mut rng));
        let r0_commitment = Commitment::from_element(random_non_identity(&mut rng));
        let alpha_commitment = Commitment::from_element(random_non_identity(&mut rng));
        let responses = Responses {
            r0_message: Scalar::random(&mut rng),
            r0_blinding: Scalar::random(&mut rng),
            alpha_message: Scalar::random(&mut rng),
            alpha_blinding: Scalar::random(&mut rng),
        };
        let base = Commitment::identity();
        let forged = CompositeRelationProof {
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
            r0_link: LinkProof::simulate(
                crs,
                &base,
                &r0_commitment,
                anchor,
                Scalar::random(&mut rng),
                Scalar::random(&mut rng),
            ),
            alpha_link: LinkProof::simulate(
                crs,
                &base,
                &alpha_commitment,
                anchor,
                Scalar::random(&mut rng),
                Scalar::random(&mut rng),
            ),
            equality: EqualityProof::simulate(
                G1Projective::generator(),
                target.point,
                anchor,
                responses.alpha_message,
            ),
            r0_commitment,
            alpha_commitment,
            session_challenge: session.to_scalar(),
            anchor_challenge: issued.anchor_challenge,
            responses,
            id: issued.id,
            version: COMPOSITE_VERSION,
            hops: 1,
            factors: TransformFactors::default(),
        };

        assert_eq!(
            forged.verify(crs, &target, &keys),
            Err(Error::CompositeProofInvalid(CompositeComponent::Lineage))
        );

        // A scaling proof from an honest hop does not carry over to the forged one.
        let (_, _, scaling) = transformed(&mut rng, &issued, &statement, &keys);
        assert_eq!(
            forged.verify_transformed(crs, &keys, &statement, &issued, &target, &scaling),
            Err(Error::CompositeProofInvalid(CompositeComponent::Scaling))
        );
    }

    #[test]
    fn displayed_error_omits_the_component() {
        let message = Error::CompositeProofInvalid(CompositeComponent::SecretLink).to_string();
        assert!(!message.to_lowercase().contains("link"));
    }

    #[test]
    fn wire_encoding_drops_local_factors() {
        let mut rng = crate::test::rng();
        let (mut proof, statement, keys) = issue(&mut rng);
        proof.factors.alpha = Scalar::from(3u64);

        let bytes = proof.encode();
        assert_eq!(bytes.len(), CompositeRelationProof::SIZE);
        let decoded = CompositeRelationProof::decode(&bytes).unwrap();
        assert_eq!(decoded.transform_factors(), TransformFactors::default());
        assert_eq!(decoded.verify(Crs::global().unwrap(), &statement, &keys), Ok(()));
    }
}
