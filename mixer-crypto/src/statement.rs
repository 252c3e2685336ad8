//! The public puzzle: one secret held as a curve point and as ciphertexts under two keys.

use crate::{
    common::*,
    encryption::{Ciphertext, EncryptionKey},
    proofs::{ChallengeBuilder, ChallengeInput},
    serde::SerializeElement,
};
use serde::{Deserialize, Serialize};

/// The two encryption keys a puzzle is held under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleKeys {
    /// Key of the audit committee. Its ciphertext carries the audit secret `r₀`.
    pub auditor: EncryptionKey,
    /// Key of the hub. Its ciphertext carries the puzzle secret `α`.
    pub hub: EncryptionKey,
}

impl ChallengeInput for PuzzleKeys {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume(&self.auditor);
        builder.consume(&self.hub);
    }
}

/// The public face of a puzzle at one hop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleStatement {
    /// `α·G`, up to the blindings applied so far.
    #[serde(with = "SerializeElement")]
    pub point: G1Projective,
    /// `Enc_auditor(r₀)`, up to the blindings applied so far.
    pub r0_ciphertext: Ciphertext,
    /// `Enc_hub(α)`, up to the blindings applied so far.
    pub alpha_ciphertext: Ciphertext,
}

impl PuzzleStatement {
    /// Whether both ciphertexts are valid under their keys and the point is not the identity.
    pub fn is_well_formed(&self, keys: &PuzzleKeys) -> bool {
        !bool::from(self.point.is_identity())
            && keys.auditor.is_valid(&self.r0_ciphertext)
            && keys.hub.is_valid(&self.alpha_ciphertext)
    }
}

impl ChallengeInput for PuzzleStatement {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume(&self.point);
        builder.consume(&self.r0_ciphertext);
        builder.consume(&self.alpha_ciphertext);
    }
}
