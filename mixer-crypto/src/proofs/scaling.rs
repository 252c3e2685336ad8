//! The per-hop proof for multiplicative re-randomization.
//!
//! A relay that scales a puzzle by `β` publishes `point' = β·point` and `ctᵢ' = ctᵢ^β mod Nᵢ²`,
//! and ZKEval scales the composite proof's commitments to `C' = β·C`. A [`PuzzleScalingProof`]
//! shows that one hidden `β` took all five elements of the previous hop to the current one. Like
//! the relation proof it is a sigma protocol over the integers:
//!
//! - the prover draws an integer mask `s` much wider than `e·β`, publishes `A_X = s·X` for each
//!   curve element `X` and `Bᵢ = ctᵢˢ mod Nᵢ²` for each ciphertext, and answers `z = s + e·β`;
//! - the verifier checks `(z mod q)·X == A_X + e·X'` and `ctᵢᶻ ≡ Bᵢ·ctᵢ'ᵉ (mod Nᵢ²)`.
//!
//! The challenge hashes both hops and both keys, so a proof is bound to exactly one hop.

use crate::{
    common::*,
    encryption::{integer_to_scalar, scalar_to_integer, Ciphertext, EncryptionKey},
    pedersen::Commitment,
    proofs::{ChallengeBuilder, ChallengeInput},
    serde::SerializeElement,
    statement::{PuzzleKeys, PuzzleStatement},
};
use num_bigint::{BigUint, RandBigInt};
use num_traits::Zero;
use serde::{Deserialize, Serialize};

const SCALING_DOMAIN: &[u8] = b"mixer-crypto/proof/puzzle-scaling/v1";

/// Bit length of the integer mask `s`.
const MASK_BITS: u64 = 640;

/// One end of a scaling hop: a puzzle and the commitments of the composite proof beside it.
#[derive(Debug, Clone, Copy)]
pub struct CommittedPuzzle<'a> {
    /// The public puzzle.
    pub statement: &'a PuzzleStatement,
    /// Commitment to `r₀`.
    pub r0_commitment: Commitment,
    /// Commitment to `α`.
    pub alpha_commitment: Commitment,
}

impl ChallengeInput for CommittedPuzzle<'_> {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume(self.statement);
        builder.consume(&self.r0_commitment);
        builder.consume(&self.alpha_commitment);
    }
}

/// Proof that a puzzle and its commitments were scaled by one `β` on every element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleScalingProof {
    #[serde(with = "SerializeElement")]
    point_mask: G1Projective,
    #[serde(with = "SerializeElement")]
    r0_commitment_mask: G1Projective,
    #[serde(with = "SerializeElement")]
    alpha_commitment_mask: G1Projective,
    auditor_mask: BigUint,
    hub_mask: BigUint,
    response: BigUint,
}

impl PuzzleScalingProof {
    /// Prove that `current` is `previous` scaled by `beta`.
    pub fn prove(
        rng: &mut impl Rng,
        keys: &PuzzleKeys,
        previous: CommittedPuzzle<'_>,
        current: CommittedPuzzle<'_>,
        beta: Scalar,
    ) -> Self {
        let mask = rng.gen_biguint(MASK_BITS);
        let s = integer_to_scalar(&mask);
        let raise = |key: &EncryptionKey, ciphertext: &Ciphertext| {
            ciphertext
                .as_integer()
                .modpow(&mask, key.modulus_squared())
        };

        let point_mask = previous.statement.point * s;
        let r0_commitment_mask = previous.r0_commitment.to_element() * s;
        let alpha_commitment_mask = previous.alpha_commitment.to_element() * s;
        let auditor_mask = raise(&keys.auditor, &previous.statement.r0_ciphertext);
        let hub_mask = raise(&keys.hub, &previous.statement.alpha_ciphertext);

        let challenge = ChallengeBuilder::with_domain(SCALING_DOMAIN)
            .with(keys)
            .with(&previous)
            .with(&current)
            .with(&point_mask)
            .with(&r0_commitment_mask)
            .with(&alpha_commitment_mask)
            .with_bytes(auditor_mask.to_bytes_be())
            .with_bytes(hub_mask.to_bytes_be())
            .finish();
        let response = &mask + scalar_to_integer(challenge.to_scalar()) * scalar_to_integer(beta);

        Self {
            point_mask,
            r0_commitment_mask,
            alpha_commitment_mask,
            auditor_mask,
            hub_mask,
            response,
        }
    }

    /// Verify that `current` is `previous` scaled by a single hidden `β`.
    pub fn verify(
        &self,
        keys: &PuzzleKeys,
        previous: CommittedPuzzle<'_>,
        current: CommittedPuzzle<'_>,
    ) -> bool {
        if self.response.bits() > MASK_BITS + 1 {
            return false;
        }
        let challenge = ChallengeBuilder::with_domain(SCALING_DOMAIN)
            .with(keys)
            .with(&previous)
            .with(&current)
            .with(&self.point_mask)
            .with(&self.r0_commitment_mask)
            .with(&self.alpha_commitment_mask)
            .with_bytes(self.auditor_mask.to_bytes_be())
            .with_bytes(self.hub_mask.to_bytes_be())
            .finish();
        let e = challenge.to_scalar();
        let z = integer_to_scalar(&self.response);

        let scaled = |before: G1Projective, after: G1Projective, mask: G1Projective| {
            same_point(&(before * z), &(mask + after * e))
        };
        let e = scalar_to_integer(e);

        scaled(
            previous.statement.point,
            current.statement.point,
            self.point_mask,
        ) && scaled(
            previous.r0_commitment.to_element(),
            current.r0_commitment.to_element(),
            self.r0_commitment_mask,
        ) && scaled(
            previous.alpha_commitment.to_element(),
            current.alpha_commitment.to_element(),
            self.alpha_commitment_mask,
        ) && self.ciphertexts_agree(
            &keys.auditor,
            &self.auditor_mask,
            &previous.statement.r0_ciphertext,
            &current.statement.r0_ciphertext,
            &e,
        ) && self.ciphertexts_agree(
            &keys.hub,
            &self.hub_mask,
            &previous.statement.alpha_ciphertext,
            &current.statement.alpha_ciphertext,
            &e,
        )
    }

    /// Check `ctᶻ ≡ B·ct'ᵉ (mod N²)`.
    fn ciphertexts_agree(
        &self,
        key: &EncryptionKey,
        mask: &BigUint,
        previous: &Ciphertext,
        current: &Ciphertext,
        challenge: &BigUint,
    ) -> bool {
        let n_squared = key.modulus_squared();
        if mask.is_zero() || mask >= n_squared {
            return false;
        }
        let lhs = previous.as_integer().modpow(&self.response, n_squared);
        let rhs = mask * current.as_integer().modpow(challenge, n_squared) % n_squared;
        lhs == rhs
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{encryption::EncryptionKeyPair, pedersen::Crs};
    use ff::Field;
    use std::sync::OnceLock;

    fn keys() -> PuzzleKeys {
        static KEYS: OnceLock<PuzzleKeys> = OnceLock::new();
        KEYS.get_or_init(|| {
            let mut rng = crate::test::rng();
            PuzzleKeys {
                auditor: EncryptionKeyPair::generate(&mut rng, 1024)
                    .unwrap()
                    .encryption_key()
                    .clone(),
                hub: EncryptionKeyPair::generate(&mut rng, 1024)
                    .unwrap()
                    .encryption_key()
                    .clone(),
            }
        })
        .clone()
    }

    struct Hop {
        statement: PuzzleStatement,
        r0_commitment: Commitment,
        alpha_commitment: Commitment,
    }

    impl Hop {
        fn committed(&self) -> CommittedPuzzle<'_> {
            CommittedPuzzle {
                statement: &self.statement,
                r0_commitment: self.r0_commitment,
                alpha_commitment: self.alpha_commitment,
            }
        }

        fn scaled(&self, keys: &PuzzleKeys, beta: Scalar) -> Hop {
            Hop {
                statement: PuzzleStatement {
                    point: self.statement.point * beta,
                    r0_ciphertext: keys.auditor.scale(&self.statement.r0_ciphertext, beta),
                    alpha_ciphertext: keys.hub.scale(&self.statement.alpha_ciphertext, beta),
                },
                r0_commitment: self.r0_commitment.scale(beta),
                alpha_commitment: self.alpha_commitment.scale(beta),
            }
        }
    }

    fn issued(rng: &mut impl Rng, keys: &PuzzleKeys) -> Hop {
        let crs = Crs::global().unwrap();
        let (r0, alpha) = (Scalar::random(&mut *rng), random_nonzero_scalar(&mut *rng));
        Hop {
            statement: PuzzleStatement {
                point: G1Projective::generator() * alpha,
                r0_ciphertext: keys.auditor.encrypt(&mut *rng, r0),
                alpha_ciphertext: keys.hub.encrypt(&mut *rng, alpha),
            },
            r0_commitment: crs.commit(r0, BlindingFactor::new(&mut *rng)),
            alpha_commitment: crs.commit(alpha, BlindingFactor::new(&mut *rng)),
        }
    }

    #[test]
    fn scaling_proof_verifies() {
        let mut rng = crate::test::rng();
        let keys = keys();
        let previous = issued(&mut rng, &keys);
        let beta = random_nonzero_scalar(&mut rng);
        let current = previous.scaled(&keys, beta);

        let proof = PuzzleScalingProof::prove(
            &mut rng,
            &keys,
            previous.committed(),
            current.committed(),
            beta,
        );
        assert!(proof.verify(&keys, previous.committed(), current.committed()));
    }

    #[test]
    fn ciphertext_scaled_by_another_factor_is_rejected() {
        let mut rng = crate::test::rng();
        let keys = keys();
        let previous = issued(&mut rng, &keys);
        let (beta, gamma) = (random_nonzero_scalar(&mut rng), random_nonzero_scalar(&mut rng));
        let mut current = previous.scaled(&keys, beta);
        current.statement.r0_ciphertext = keys.auditor.scale(&previous.statement.r0_ciphertext, gamma);

        let proof = PuzzleScalingProof::prove(
            &mut rng,
            &keys,
            previous.committed(),
            current.committed(),
            beta,
        );
        assert!(!proof.verify(&keys, previous.committed(), current.committed()));
    }

    #[test]
    fn commitment_scaled_by_another_factor_is_rejected() {
        let mut rng = crate::test::rng();
        let keys = keys();
        let previous = issued(&mut rng, &keys);
        let (beta, gamma) = (random_nonzero_scalar(&mut rng), random_nonzero_scalar(&mut rng));
        let mut current = previous.scaled(&keys, beta);
        current.alpha_commitment = previous.alpha_commitment.scale(gamma);

        let proof = PuzzleScalingProof::prove(
            &mut rng,
            &keys,
            previous.committed(),
            current.committed(),
            beta,
        );
        assert!(!proof.verify(&keys, previous.committed(), current.committed()));
    }

    #[test]
    fn scaling_proof_is_bound_to_its_hop() {
        let mut rng = crate::test::rng();
        let keys = keys();
        let previous = issued(&mut rng, &keys);
        let beta = random_nonzero_scalar(&mut rng);
        let current = previous.scaled(&keys, beta);
        let proof = PuzzleScalingProof::prove(
            &mut rng,
            &keys,
            previous.committed(),
            current.committed(),
            beta,
        );

        let other = issued(&mut rng, &keys);
        let other_scaled = other.scaled(&keys, beta);
        assert!(!proof.verify(&keys, other.committed(), other_scaled.committed()));
    }
}
