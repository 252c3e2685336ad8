/*!
The puzzle as it travels between parties, and the blinding each relay applies to it.

A [`PuzzleState`] pairs the public [`PuzzleStatement`] with a [`ConsistencyProof`] that its three
representations hold the same secret. The hub [`issue`]s the first state with a composite relation
proof. Every relay then [`apply`](PuzzleState::apply)s a fresh blinding under the session's
[`Strategy`]:

- [`Strategy::Relation`] shifts the secret, `α ↦ α + β`, and proves the shift with a dedicated
  [`PuzzleRelationProof`] linking the previous statement to the new one.
- [`Strategy::Malleable`] scales the secret, `α ↦ β·α`, re-targets the previous composite proof
  with ZKEval without knowing the secret, and proves the scaling with a [`PuzzleScalingProof`].

Either way a blinded state carries the statement it was blinded from, and its proof only shows
the single hop from there. [`PuzzleState::verify_from`] anchors that hop to an issued puzzle.

The relay keeps its [`Blinding`] to remove it from the solution later.
*/

use crate::{types::*, Error, PublicParameters, Rng, Verification};
use ff::Field;
use mixer_crypto::{
    composite::{CompositeRelationProof, CompositeWitness},
    encryption::Ciphertext,
    proofs::{PuzzleRelationProof, PuzzleScalingProof, RelationWitness},
    statement::PuzzleStatement,
    zkeval::{self, TransformFactor},
};
use serde::*;
use tracing::debug;

/// The number of times a puzzle can be blinded under [`Strategy::Malleable`]: once by the receiver
/// and once by the sender.
pub const MAX_HOPS: u32 = 2;

/// How relays blind the puzzle and prove they did so consistently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Additive blinding, proven hop by hop with a dedicated relation proof.
    Relation,
    /// Multiplicative blinding, proven by transforming the issuer's composite proof.
    Malleable,
}

/// Evidence that a puzzle's point and ciphertexts carry the same secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsistencyProof {
    /// The composite relation proof the hub issued the puzzle with.
    Issued(CompositeRelationProof),
    /// A composite proof transformed by ZKEval from the one accompanying `previous`.
    Scaled {
        /// The statement the relay started from.
        previous: PuzzleStatement,
        /// The composite proof that accompanied `previous`.
        previous_proof: CompositeRelationProof,
        /// The transformed composite proof.
        proof: CompositeRelationProof,
        /// The proof that this puzzle and `proof`'s commitments are scaled from their
        /// predecessors by one factor.
        scaling: PuzzleScalingProof,
    },
    /// A proof that this puzzle is `previous` shifted by one hidden value.
    Shifted {
        /// The statement the relay started from.
        previous: PuzzleStatement,
        /// The proof of the shift.
        proof: PuzzleRelationProof,
    },
}

/// A puzzle and the proof that it is consistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleState {
    /// The public puzzle.
    pub statement: PuzzleStatement,
    /// The proof accompanying it.
    pub proof: ConsistencyProof,
}

/// The record the hub hands to the audit committee for one issued puzzle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Identifier of the issued composite proof, shared by every transform of it.
    pub id: [u8; 32],
    /// `Enc_auditor(r₀)` as issued.
    pub r0_ciphertext: Ciphertext,
    /// `Enc_hub(α)` as issued.
    pub alpha_ciphertext: Ciphertext,
}

/// A relay's own blinding factor, kept to remove it from the solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blinding {
    /// The secret was shifted by this value.
    Shifted(Scalar),
    /// The secret was multiplied by this factor.
    Scaled(TransformFactor),
}

impl Blinding {
    /// Map a solution of the blinded puzzle back to a solution of the puzzle before blinding.
    pub fn derandomize(&self, solution: Scalar) -> Scalar {
        match self {
            Blinding::Shifted(beta) => solution - beta,
            Blinding::Scaled(beta) => solution * beta.invert().to_scalar(),
        }
    }
}

/// Issue a fresh puzzle under `params`.
///
/// Samples the secret `α` and the audit secret `r₀`, encrypts them under the hub and auditor keys,
/// and proves the result consistent with `α·G`.
pub fn issue(
    rng: &mut impl Rng,
    params: &PublicParameters,
) -> Result<(PuzzleState, AuditRecord), Error> {
    let keys = params.keys();
    let witness = CompositeWitness {
        r0: Scalar::random(&mut *rng),
        alpha: TransformFactor::random(&mut *rng).to_scalar(),
    };
    let statement = PuzzleStatement {
        point: G1Projective::generator() * witness.alpha,
        r0_ciphertext: keys.auditor.encrypt(&mut *rng, witness.r0),
        alpha_ciphertext: keys.hub.encrypt(&mut *rng, witness.alpha),
    };
    let proof = CompositeRelationProof::prove(rng, params.crs(), &witness, &statement, keys)?;
    let audit = AuditRecord {
        id: proof.id(),
        r0_ciphertext: statement.r0_ciphertext.clone(),
        alpha_ciphertext: statement.alpha_ciphertext.clone(),
    };
    Ok((
        PuzzleState {
            statement,
            proof: ConsistencyProof::Issued(proof),
        },
        audit,
    ))
}

impl PuzzleState {
    /// The puzzle point.
    pub fn point(&self) -> G1Projective {
        self.statement.point
    }

    /// Whether this is a freshly issued puzzle: a composite proof that no relay has transformed.
    pub fn is_issued(&self) -> bool {
        matches!(&self.proof, ConsistencyProof::Issued(proof) if proof.hops() == 0)
    }

    /// Verify the last hop of the puzzle under `params`.
    ///
    /// An issued proof is accepted under either strategy. A scaled proof is accepted under
    /// [`Strategy::Malleable`] up to [`MAX_HOPS`] transforms, and a shifted proof under
    /// [`Strategy::Relation`]. A blinded state is checked against the previous statement it
    /// carries, which this does not authenticate; see [`PuzzleState::verify_from`].
    pub fn verify(&self, params: &PublicParameters) -> Verification {
        let keys = params.keys();
        if !self.statement.is_well_formed(keys) {
            debug!("puzzle is not well formed");
            return Verification::Failed;
        }
        match (&self.proof, params.strategy()) {
            (ConsistencyProof::Issued(proof), _) => {
                proof.verify(params.crs(), &self.statement, keys).is_ok().into()
            }
            (
                ConsistencyProof::Scaled {
                    previous,
                    previous_proof,
                    proof,
                    scaling,
                },
                Strategy::Malleable,
            ) => {
                if proof.hops() > MAX_HOPS {
                    debug!(hops = proof.hops(), "composite proof has too many hops");
                    return Verification::Failed;
                }
                if !previous.is_well_formed(keys) {
                    debug!("previous puzzle is not well formed");
                    return Verification::Failed;
                }
                proof
                    .verify_transformed(
                        params.crs(),
                        keys,
                        previous,
                        previous_proof,
                        &self.statement,
                        scaling,
                    )
                    .is_ok()
                    .into()
            }
            (ConsistencyProof::Shifted { previous, proof }, Strategy::Relation) => {
                if !previous.is_well_formed(keys) {
                    debug!("previous puzzle is not well formed");
                    return Verification::Failed;
                }
                let verified = proof.verify(keys, previous, &self.statement);
                if !verified {
                    debug!("puzzle relation proof rejected");
                }
                verified.into()
            }
            (_, strategy) => {
                debug!(strategy = ?strategy, "puzzle was blinded under the other strategy");
                Verification::Failed
            }
        }
    }

    /// Verify that this puzzle was blinded once from `issued`, a puzzle fresh from the hub.
    ///
    /// Checks that `issued` verifies, that the previous statement (and for a scaled puzzle the
    /// previous proof) carried by this puzzle is exactly `issued`'s, and then verifies the hop
    /// itself. The caller must make sure `issued` really came from the hub.
    pub fn verify_from(&self, params: &PublicParameters, issued: &PuzzleState) -> Verification {
        if !issued.is_issued() || !issued.verify(params).is_verified() {
            debug!("issued puzzle does not verify");
            return Verification::Failed;
        }
        let descends = match (&self.proof, &issued.proof) {
            (ConsistencyProof::Shifted { previous, .. }, _) => previous == &issued.statement,
            (
                ConsistencyProof::Scaled {
                    previous,
                    previous_proof,
                    ..
                },
                ConsistencyProof::Issued(issued_proof),
            ) => previous == &issued.statement && previous_proof == issued_proof,
            _ => false,
        };
        if !descends {
            debug!("puzzle does not descend from the issued puzzle");
            return Verification::Failed;
        }
        self.verify(params)
    }

    /// Blind the puzzle under the session's strategy, producing the next state and the blinding
    /// to remove later.
    ///
    /// The caller must have verified `self`. Fails with [`Error::StrategyMismatch`] if the puzzle
    /// was already blinded under the other strategy.
    pub fn apply(
        self,
        rng: &mut impl Rng,
        params: &PublicParameters,
    ) -> Result<(PuzzleState, Blinding), Error> {
        match params.strategy() {
            Strategy::Relation => self.shift(rng, params),
            Strategy::Malleable => self.scale(rng, params),
        }
    }

    fn shift(
        self,
        rng: &mut impl Rng,
        params: &PublicParameters,
    ) -> Result<(PuzzleState, Blinding), Error> {
        if let ConsistencyProof::Scaled { .. } = self.proof {
            return Err(Error::StrategyMismatch);
        }
        let keys = params.keys();
        let beta = Scalar::random(&mut *rng);
        let (auditor_delta, auditor_nonce) = keys.auditor.encrypt_with_nonce(&mut *rng, beta);
        let (hub_delta, hub_nonce) = keys.hub.encrypt_with_nonce(&mut *rng, beta);
        let previous = self.statement;
        let statement = PuzzleStatement {
            point: previous.point + G1Projective::generator() * beta,
            r0_ciphertext: keys.auditor.combine(&previous.r0_ciphertext, &auditor_delta),
            alpha_ciphertext: keys.hub.combine(&previous.alpha_ciphertext, &hub_delta),
        };
        let witness = RelationWitness {
            shift: beta,
            auditor_nonce,
            hub_nonce,
        };
        let proof = PuzzleRelationProof::prove(rng, keys, &previous, &statement, &witness);
        Ok((
            PuzzleState {
                statement,
                proof: ConsistencyProof::Shifted { previous, proof },
            },
            Blinding::Shifted(beta),
        ))
    }

    fn scale(
        self,
        rng: &mut impl Rng,
        params: &PublicParameters,
    ) -> Result<(PuzzleState, Blinding), Error> {
        let PuzzleState {
            statement: previous,
            proof,
        } = self;
        let previous_proof = match proof {
            ConsistencyProof::Issued(proof) | ConsistencyProof::Scaled { proof, .. } => proof,
            ConsistencyProof::Shifted { .. } => return Err(Error::StrategyMismatch),
        };
        if previous_proof.hops() >= MAX_HOPS {
            return Err(Error::HopLimit);
        }

        let keys = params.keys();
        let beta = TransformFactor::random(&mut *rng);
        let b = beta.to_scalar();
        let statement = PuzzleStatement {
            point: previous.point * b,
            r0_ciphertext: keys.auditor.scale(&previous.r0_ciphertext, b),
            alpha_ciphertext: keys.hub.scale(&previous.alpha_ciphertext, b),
        };
        let (proof, scaling) = zkeval::transform(
            rng,
            &previous_proof,
            beta,
            params.crs(),
            keys,
            &previous,
            &statement,
        )?;
        Ok((
            PuzzleState {
                statement,
                proof: ConsistencyProof::Scaled {
                    previous,
                    previous_proof,
                    proof,
                    scaling,
                },
            },
            Blinding::Scaled(beta),
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Parameters;
    use mixer_crypto::{
        adaptor::SigningKey, encryption::EncryptionKeyPair, pedersen::Crs, statement::PuzzleKeys,
    };
    use rand::SeedableRng;
    use std::sync::OnceLock;

    fn rng() -> impl Rng {
        const TEST_RNG_SEED: [u8; 32] = *b"NEVER USE THIS FOR ANYTHING REAL";
        rand::rngs::StdRng::from_seed(TEST_RNG_SEED)
    }

    fn keys() -> &'static (EncryptionKeyPair, EncryptionKeyPair) {
        static KEYS: OnceLock<(EncryptionKeyPair, EncryptionKeyPair)> = OnceLock::new();
        KEYS.get_or_init(|| {
            let mut rng = rng();
            (
                EncryptionKeyPair::generate(&mut rng, 1024).unwrap(),
                EncryptionKeyPair::generate(&mut rng, 1024).unwrap(),
            )
        })
    }

    fn params(strategy: Strategy) -> PublicParameters {
        let (auditor, hub) = keys();
        PublicParameters::new(
            &Parameters {
                strategy,
                modulus_bits: 1024,
            },
            *Crs::global().unwrap(),
            PuzzleKeys {
                auditor: auditor.encryption_key().clone(),
                hub: hub.encryption_key().clone(),
            },
            SigningKey::new(&mut rng()).verification_key(),
        )
        .unwrap()
    }

    #[test]
    fn derandomize_undoes_each_blinding() {
        let mut rng = rng();
        let solution = Scalar::random(&mut rng);
        let shift = Scalar::random(&mut rng);
        let factor = TransformFactor::random(&mut rng);

        assert_eq!(
            Blinding::Shifted(shift).derandomize(solution + shift),
            solution
        );
        assert_eq!(
            Blinding::Scaled(factor).derandomize(solution * factor.to_scalar()),
            solution
        );
    }

    #[test]
    fn issued_puzzle_verifies_under_both_strategies() {
        let mut rng = rng();
        let relation = params(Strategy::Relation);
        let (state, audit) = issue(&mut rng, &relation).unwrap();

        assert!(state.is_issued());
        assert!(state.verify(&relation).is_verified());
        assert!(state.verify(&params(Strategy::Malleable)).is_verified());
        assert_eq!(audit.alpha_ciphertext, state.statement.alpha_ciphertext);
    }

    #[test]
    fn shifted_puzzle_carries_its_previous_statement() {
        let mut rng = rng();
        let params = params(Strategy::Relation);
        let (state, _) = issue(&mut rng, &params).unwrap();
        let issued = state.statement.clone();

        let (state, blinding) = state.apply(&mut rng, &params).unwrap();
        assert!(state.verify(&params).is_verified());
        assert!(!state.is_issued());
        match (&state.proof, blinding) {
            (ConsistencyProof::Shifted { previous, .. }, Blinding::Shifted(beta)) => {
                assert_eq!(previous, &issued);
                assert_eq!(state.point(), issued.point + G1Projective::generator() * beta);
            }
            other => panic!("unexpected proof and blinding: {:?}", other),
        }
    }

    #[test]
    fn malleable_blinding_stops_at_the_hop_limit() {
        let mut rng = rng();
        let params = params(Strategy::Malleable);
        let (state, _) = issue(&mut rng, &params).unwrap();

        let (state, _) = state.apply(&mut rng, &params).unwrap();
        let (state, _) = state.apply(&mut rng, &params).unwrap();
        assert!(state.verify(&params).is_verified());
        assert_eq!(state.apply(&mut rng, &params).err(), Some(Error::HopLimit));
    }

    #[test]
    fn proofs_from_the_other_strategy_are_rejected() {
        let mut rng = rng();
        let relation = params(Strategy::Relation);
        let malleable = params(Strategy::Malleable);
        let (state, _) = issue(&mut rng, &relation).unwrap();

        let (shifted, _) = state.clone().apply(&mut rng, &relation).unwrap();
        assert_eq!(shifted.verify(&malleable), Verification::Failed);

        let (scaled, _) = state.apply(&mut rng, &malleable).unwrap();
        assert_eq!(scaled.verify(&relation), Verification::Failed);

        assert_eq!(
            shifted.apply(&mut rng, &malleable).err(),
            Some(Error::StrategyMismatch)
        );
        assert_eq!(
            scaled.apply(&mut rng, &relation).err(),
            Some(Error::StrategyMismatch)
        );
    }

    #[test]
    fn blinded_puzzle_verifies_from_its_issued_puzzle() {
        let mut rng = rng();
        for strategy in [Strategy::Relation, Strategy::Malleable] {
            let params = params(strategy);
            let (issued, _) = issue(&mut rng, &params).unwrap();
            let (other, _) = issue(&mut rng, &params).unwrap();

            let (blinded, _) = issued.clone().apply(&mut rng, &params).unwrap();
            assert!(blinded.verify_from(&params, &issued).is_verified());
            assert_eq!(blinded.verify_from(&params, &other), Verification::Failed);
            // Only an issued puzzle anchors the chain.
            assert_eq!(blinded.verify_from(&params, &blinded), Verification::Failed);
        }
    }

    #[test]
    fn shift_of_a_fabricated_puzzle_does_not_verify_from_the_issued_one() {
        let mut rng = rng();
        let params = params(Strategy::Relation);
        let keys = params.keys();
        let (issued, _) = issue(&mut rng, &params).unwrap();

        // Point 5·G with both ciphertexts holding 9, next to the issued proof.
        let fabricated = PuzzleState {
            statement: PuzzleStatement {
                point: G1Projective::generator() * Scalar::from(5u64),
                r0_ciphertext: keys.auditor.encrypt(&mut rng, Scalar::from(9u64)),
                alpha_ciphertext: keys.hub.encrypt(&mut rng, Scalar::from(9u64)),
            },
            proof: issued.proof.clone(),
        };
        assert_eq!(fabricated.verify(&params), Verification::Failed);

        let (shifted, _) = fabricated.apply(&mut rng, &params).unwrap();
        // The shift itself is sound, so the hop alone verifies.
        assert!(shifted.verify(&params).is_verified());
        assert_eq!(shifted.verify_from(&params, &issued), Verification::Failed);
    }
}
