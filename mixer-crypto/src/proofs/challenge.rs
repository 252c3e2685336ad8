//! Functionality for building challenge scalars.
//!
//! Every Fiat-Shamir challenge in this crate is built by feeding a domain tag and then exactly
//! the public data the verifier will recompute into a [`ChallengeBuilder`]. Adaptor signatures
//! reuse the builder under their own domain to hash messages.

use crate::common::*;
use sha3::{Digest, Sha3_256};

/// A trait implemented by types which can feed their public components into a
/// [`ChallengeBuilder`].
pub trait ChallengeInput {
    /// Incorporate public components of this type into a [`ChallengeBuilder`].
    fn consume(&self, builder: &mut ChallengeBuilder);
}

impl<'a, T: ChallengeInput> ChallengeInput for &'a T {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        (**self).consume(builder);
    }
}

impl ChallengeInput for Scalar {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume_bytes(self.to_bytes());
    }
}

impl ChallengeInput for G1Affine {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume_bytes(self.to_compressed());
    }
}

impl ChallengeInput for G1Projective {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume(&G1Affine::from(self));
    }
}

/// A challenge scalar for use in a Schnorr-style proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Challenge(Scalar);

impl Challenge {
    /// Retrieve the internal scalar value.
    pub fn to_scalar(self) -> Scalar {
        self.0
    }

    /// Use a known scalar as a challenge.
    ///
    /// Only composite proofs that carry their challenge need this; standalone proofs always
    /// derive theirs with a [`ChallengeBuilder`].
    pub fn from_scalar(scalar: Scalar) -> Self {
        Self(scalar)
    }
}

/// Holds state used when building a [`Challenge`] using the Fiat-Shamir heuristic, as in a
/// non-interactive Schnorr proof.
#[derive(Debug, Clone)]
#[allow(missing_copy_implementations)]
pub struct ChallengeBuilder {
    hasher: Sha3_256,
}

impl Default for ChallengeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChallengeBuilder {
    /// Initialize a new, empty challenge.
    pub fn new() -> Self {
        Self {
            hasher: Sha3_256::new(),
        }
    }

    /// Initialize a challenge separated from every other proof type by `domain`.
    pub fn with_domain(domain: &[u8]) -> Self {
        Self::new().with_bytes(domain)
    }

    /// Incorporate public data from some given type into the challenge.
    pub fn consume<T: ChallengeInput>(&mut self, object: &T) {
        object.consume(self);
    }

    /// A conveniently chainable variant of [`ChallengeBuilder::consume`].
    pub fn with<T: ChallengeInput>(mut self, object: &T) -> Self {
        object.consume(&mut self);
        self
    }

    /// Incorporate arbitrary bytes into the challenge.
    ///
    /// The length is absorbed first so that adjacent variable-length inputs cannot be shifted
    /// into one another.
    pub fn consume_bytes(&mut self, bytes: impl AsRef<[u8]>) {
        let bytes = bytes.as_ref();
        self.hasher.update((bytes.len() as u64).to_be_bytes());
        self.hasher.update(bytes);
    }

    /// A conveniently chainable variant of [`ChallengeBuilder::consume_bytes`].
    pub fn with_bytes(mut self, bytes: impl AsRef<[u8]>) -> Self {
        self.consume_bytes(bytes);
        self
    }

    /// Consume the builder and generate a [`Challenge`] from the accumulated data.
    ///
    /// The 256-bit digest is read as a little-endian integer and reduced modulo the group order.
    pub fn finish(self) -> Challenge {
        let digested = self.hasher.finalize();
        let mut limbs = [0u64; 4];
        for (limb, chunk) in limbs.iter_mut().zip(digested.chunks_exact(8)) {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            *limb = u64::from_le_bytes(bytes);
        }
        Challenge(Scalar::from_raw(limbs))
    }
}
