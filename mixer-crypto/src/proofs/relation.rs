//! The dedicated per-hop proof for additive re-randomization.
//!
//! A relay that shifts a puzzle by `β` publishes
//! `point' = point + β·G`, `ct₁' = ct₁ ⊗ Enc_K₁(β; ρ₁)` and `ct₂' = ct₂ ⊗ Enc_K₂(β; ρ₂)`.
//! A [`PuzzleRelationProof`] shows all three deltas hide the same `β` without revealing it. It is a
//! sigma protocol over the integers:
//!
//! - the prover masks `β` with an integer `s` drawn from a range much wider than `e·β`, commits to
//!   `s` under both keys and over `G`, and answers `z = s + e·β` together with `vᵢ = uᵢ·ρᵢᵉ mod Nᵢ`;
//! - the verifier checks `(1+Nᵢ)ᶻ·vᵢᴺⁱ·ctᵢᵉ ≡ Aᵢ·ctᵢ'ᵉ (mod Nᵢ²)` for each key, which avoids
//!   inverting the previous ciphertext, and `(z mod q)·G == A + e·(point' − point)`.
//!
//! The challenge hashes both statements and both keys, so a proof is bound to exactly one hop.

use crate::{
    common::*,
    encryption::{integer_to_scalar, scalar_to_integer, Ciphertext, EncryptionKey, Nonce},
    proofs::ChallengeBuilder,
    serde::SerializeElement,
    statement::{PuzzleKeys, PuzzleStatement},
};
use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

const RELATION_DOMAIN: &[u8] = b"mixer-crypto/proof/puzzle-relation/v1";

/// Bit length of the integer mask `s`. It exceeds the bit length of `e·β` by a statistical
/// hiding margin.
const MASK_BITS: u64 = 640;

/// What a relay knows about its own shift.
#[derive(Debug, Clone)]
pub struct RelationWitness {
    /// The shift `β`.
    pub shift: Scalar,
    /// Randomness of `Enc_auditor(β)`.
    pub auditor_nonce: Nonce,
    /// Randomness of `Enc_hub(β)`.
    pub hub_nonce: Nonce,
}

/// Proof that a puzzle was shifted by one `β` on all three representations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleRelationProof {
    auditor_commitment: BigUint,
    hub_commitment: BigUint,
    #[serde(with = "SerializeElement")]
    point_commitment: G1Projective,
    response: BigUint,
    auditor_nonce_response: BigUint,
    hub_nonce_response: BigUint,
}

impl PuzzleRelationProof {
    /// Prove that `current` is `previous` shifted by `witness.shift`.
    pub fn prove(
        rng: &mut impl Rng,
        keys: &PuzzleKeys,
        previous: &PuzzleStatement,
        current: &PuzzleStatement,
        witness: &RelationWitness,
    ) -> Self {
        let mask = rng.gen_biguint(MASK_BITS);
        let auditor_unit = keys.auditor.random_unit(rng);
        let hub_unit = keys.hub.random_unit(rng);

        let auditor_commitment = keys.auditor.encrypt_integer(&mask, &auditor_unit);
        let hub_commitment = keys.hub.encrypt_integer(&mask, &hub_unit);
        let point_commitment = G1Projective::generator() * integer_to_scalar(&mask);

        let challenge = Self::challenge(
            keys,
            previous,
            current,
            auditor_commitment.as_integer(),
            hub_commitment.as_integer(),
            point_commitment,
        );

        let response = mask + &challenge * scalar_to_integer(witness.shift);
        let nonce_response = |key: &EncryptionKey, unit: BigUint, nonce: &Nonce| {
            (unit * nonce.as_integer().modpow(&challenge, key.modulus())) % key.modulus()
        };
        Self {
            auditor_nonce_response: nonce_response(
                &keys.auditor,
                auditor_unit,
                &witness.auditor_nonce,
            ),
            hub_nonce_response: nonce_response(&keys.hub, hub_unit, &witness.hub_nonce),
            auditor_commitment: auditor_commitment.as_integer().clone(),
            hub_commitment: hub_commitment.as_integer().clone(),
            point_commitment,
            response,
        }
    }

    /// Verify that `current` is `previous` shifted by a single hidden `β`.
    pub fn verify(
        &self,
        keys: &PuzzleKeys,
        previous: &PuzzleStatement,
        current: &PuzzleStatement,
    ) -> bool {
        if self.response.bits() > MASK_BITS + 1 {
            return false;
        }
        let challenge = Self::challenge(
            keys,
            previous,
            current,
            &self.auditor_commitment,
            &self.hub_commitment,
            self.point_commitment,
        );

        let point_ok = same_point(
            &(G1Projective::generator() * integer_to_scalar(&self.response)),
            &(self.point_commitment
                + (current.point - previous.point) * integer_to_scalar(&challenge)),
        );

        point_ok
            && self.ciphertexts_agree(
                &keys.auditor,
                &self.auditor_commitment,
                &self.auditor_nonce_response,
                &previous.r0_ciphertext,
                &current.r0_ciphertext,
                &challenge,
            )
            && self.ciphertexts_agree(
                &keys.hub,
                &self.hub_commitment,
                &self.hub_nonce_response,
                &previous.alpha_ciphertext,
                &current.alpha_ciphertext,
                &challenge,
            )
    }

    /// Check `(1+N)ᶻ·vᴺ·ctᵉ ≡ A·ct'ᵉ (mod N²)`.
    fn ciphertexts_agree(
        &self,
        key: &EncryptionKey,
        commitment: &BigUint,
        nonce_response: &BigUint,
        previous: &Ciphertext,
        current: &Ciphertext,
        challenge: &BigUint,
    ) -> bool {
        let n = key.modulus();
        let n_squared = key.modulus_squared();
        if nonce_response.is_zero()
            || nonce_response >= n
            || !nonce_response.gcd(n).is_one()
            || commitment.is_zero()
            || commitment >= n_squared
        {
            return false;
        }
        let lhs = key.shift(&self.response)
            * nonce_response.modpow(n, n_squared)
            % n_squared
            * previous.as_integer().modpow(challenge, n_squared)
            % n_squared;
        let rhs = commitment * current.as_integer().modpow(challenge, n_squared) % n_squared;
        lhs == rhs
    }

    fn challenge(
        keys: &PuzzleKeys,
        previous: &PuzzleStatement,
        current: &PuzzleStatement,
        auditor_commitment: &BigUint,
        hub_commitment: &BigUint,
        point_commitment: G1Projective,
    ) -> BigUint {
        let challenge = ChallengeBuilder::with_domain(RELATION_DOMAIN)
            .with(keys)
            .with(previous)
            .with(current)
            .with_bytes(auditor_commitment.to_bytes_be())
            .with_bytes(hub_commitment.to_bytes_be())
            .with(&point_commitment)
            .finish();
        scalar_to_integer(challenge.to_scalar())
    }
}
