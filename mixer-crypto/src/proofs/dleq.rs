//! Proof that two points share a discrete log over two bases (a Diffie-Hellman tuple).
//!
//! Given the curve generator `G` and a second base `Y`, a [`DleqProof`] shows the prover knows `k`
//! with `U = k·G` and `V = k·Y`. The adaptor pre-signature uses it to tie its nonce point to the
//! witness point.

use crate::{
    common::*,
    proofs::{ChallengeBuilder, ChallengeInput},
    serde::SerializeElement,
    wire::{FixedSize, Read, Write},
    Error,
};
use bytes::{Buf, BufMut};
use ff::Field;
use serde::{Deserialize, Serialize};

const DLEQ_DOMAIN: &[u8] = b"mixer-crypto/proof/dleq/v1";

/// The public points of a Diffie-Hellman tuple `(G, Y, k·G, k·Y)`.
#[derive(Debug, Clone, Copy)]
pub struct DleqStatement {
    /// The second base.
    pub base: G1Projective,
    /// `k·G`.
    pub over_generator: G1Projective,
    /// `k·Y`.
    pub over_base: G1Projective,
}

impl ChallengeInput for DleqStatement {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume(&G1Projective::generator());
        builder.consume(&self.base);
        builder.consume(&self.over_generator);
        builder.consume(&self.over_base);
    }
}

/// Proof of knowledge of `k` for a [`DleqStatement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DleqProof {
    #[serde(with = "SerializeElement")]
    generator_commitment: G1Projective,
    #[serde(with = "SerializeElement")]
    base_commitment: G1Projective,
    #[serde(with = "SerializeElement")]
    response: Scalar,
}

impl DleqProof {
    /// Prove the statement given its shared discrete log `k`.
    pub fn prove(rng: &mut impl Rng, statement: &DleqStatement, k: Scalar) -> Self {
        let nonce = Scalar::random(&mut *rng);
        let generator_commitment = G1Projective::generator() * nonce;
        let base_commitment = statement.base * nonce;
        let challenge = Self::challenge(statement, generator_commitment, base_commitment);
        Self {
            generator_commitment,
            base_commitment,
            response: nonce + challenge * k,
        }
    }

    /// Check `z·G == A₁ + e·U` and `z·Y == A₂ + e·V`.
    pub fn verify(&self, statement: &DleqStatement) -> bool {
        let e = Self::challenge(statement, self.generator_commitment, self.base_commitment);
        let over_generator = same_point(
            &(G1Projective::generator() * self.response),
            &(self.generator_commitment + statement.over_generator * e),
        );
        let over_base = same_point(
            &(statement.base * self.response),
            &(self.base_commitment + statement.over_base * e),
        );
        over_generator && over_base
    }

    fn challenge(
        statement: &DleqStatement,
        generator_commitment: G1Projective,
        base_commitment: G1Projective,
    ) -> Scalar {
        ChallengeBuilder::with_domain(DLEQ_DOMAIN)
            .with(&generator_commitment)
            .with(&base_commitment)
            .with(statement)
            .finish()
            .to_scalar()
    }
}

impl FixedSize for DleqProof {
    const SIZE: usize = 2 * G1Projective::SIZE + Scalar::SIZE;
}

impl Write for DleqProof {
    fn write(&self, buf: &mut impl BufMut) {
        self.generator_commitment.write(buf);
        self.base_commitment.write(buf);
        self.response.write(buf);
    }
}

impl Read for DleqProof {
    fn read(buf: &mut impl Buf) -> Result<Self, Error> {
        Ok(Self {
            generator_commitment: G1Projective::read(buf)?,
            base_commitment: G1Projective::read(buf)?,
            response: Scalar::read(buf)?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tuple(rng: &mut impl Rng) -> (DleqStatement, Scalar) {
        let base = random_non_identity::<G1Projective>(&mut *rng);
        let k = Scalar::random(&mut *rng);
        let statement = DleqStatement {
            base,
            over_generator: G1Projective::generator() * k,
            over_base: base * k,
        };
        (statement, k)
    }

    #[test]
    fn dleq_proof_verifies() {
        let mut rng = crate::test::rng();
        let (statement, k) = tuple(&mut rng);
        assert!(DleqProof::prove(&mut rng, &statement, k).verify(&statement));
    }

    #[test]
    fn dleq_proof_rejects_mismatched_logs() {
        let mut rng = crate::test::rng();
        let (mut statement, k) = tuple(&mut rng);
        statement.over_base = statement.base * (k + Scalar::one());

        let proof = DleqProof::prove(&mut rng, &statement, k);
        assert!(!proof.verify(&statement));
    }

    #[test]
    fn dleq_proof_is_bound_to_its_base() {
        let mut rng = crate::test::rng();
        let (statement, k) = tuple(&mut rng);
        let proof = DleqProof::prove(&mut rng, &statement, k);

        let (other, _) = tuple(&mut rng);
        let swapped = DleqStatement {
            base: other.base,
            ..statement
        };
        assert!(!proof.verify(&swapped));
    }
}
