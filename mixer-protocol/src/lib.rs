/*!
This crate describes the puzzle-swap protocol run between a hub and two peers, built on the
primitives in `mixer-crypto`.

A session moves one secret `α` through three parties:

1. The [hub](hub) issues a puzzle `(α·G, Enc_auditor(r₀), Enc_hub(α))` with a proof that all
   three agree, and pre-signs a payment to the [receiver] locked to `α·G`.
2. The receiver checks the promise, blinds the puzzle and hands it to the [sender].
3. The sender checks the blinded puzzle, blinds it again and pre-signs a payment to the hub
   locked to the twice-blinded point.
4. The hub decrypts the puzzle it is handed, which completes the sender's payment and reveals the
   twice-blinded solution to the sender.
5. The sender strips its blinding and passes the solution on; the receiver strips its own,
   recovers `α` and completes the hub's payment.

Each blinding carries a [`ConsistencyProof`](puzzle::ConsistencyProof) for the hop from the
puzzle it was applied to. The receiver forwards the hub's promise along with its blinded puzzle, so
the sender can anchor that hop to a puzzle the hub signed for. The hub only sees the last hop.
Under [`Strategy::Relation`] nothing it receives is tied to the issued puzzle; under
[`Strategy::Malleable`] the composite proof keeps its issuance identifier for the audit committee,
and the hub sees that identifier too.

Every verification failure aborts the session with [`Error::Aborted`], which names only the
phase; which proof component failed is logged locally.
*/
#![warn(missing_docs)]
#![warn(missing_copy_implementations, missing_debug_implementations)]
#![warn(unused_qualifications, unused_results)]
#![warn(future_incompatible)]
#![warn(unused)]
#![forbid(broken_intra_doc_links)]
pub mod hub;
pub mod messages;
pub mod puzzle;
pub mod receiver;
pub mod sender;

pub use messages::{Message, MessageKind};
pub use puzzle::{Strategy, MAX_HOPS};

use ff::PrimeField;
use mixer_crypto::{
    adaptor::VerificationKey, encryption::EncryptionKeyPair, pedersen::Crs, statement::PuzzleKeys,
};
use serde::*;
use std::fmt;
use thiserror::*;
use tracing::warn;

#[allow(unused)]
mod types {
    pub use bls12_381::{G1Projective, Scalar};
    pub use group::Group;
}

/// Trait synonym for a cryptographically secure random number generator.
pub trait Rng: rand::CryptoRng + rand::RngCore {}
impl<T: rand::CryptoRng + rand::RngCore> Rng for T {}

/// The result of a verification of some property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "the result of a verification should always be checked"]
pub enum Verification {
    /// A verification succeeded.
    Verified,
    /// A verification failed.
    Failed,
}

impl Verification {
    /// Whether the verification succeeded.
    pub fn is_verified(self) -> bool {
        matches!(self, Verification::Verified)
    }
}

impl From<bool> for Verification {
    fn from(verified: bool) -> Self {
        if verified {
            Verification::Verified
        } else {
            Verification::Failed
        }
    }
}

/// The user-visible phases of a session. Each one passes or fails as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// The receiver accepts the hub's puzzle and pre-signature.
    Promise,
    /// The sender accepts the receiver's blinded puzzle, and the hub accepts the sender's.
    Registration,
    /// The puzzle is solved and the solution travels back to the receiver.
    Solve,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Promise => "promise",
            Phase::Registration => "registration",
            Phase::Solve => "solve",
        };
        f.write_str(name)
    }
}

/// Error types that may arise while running the protocol.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Caused by parameters or keys that cannot support the configured session.
    #[error("invalid setup: {0}")]
    Setup(&'static str),
    /// A verification failed and the session is over.
    #[error("session aborted during the {0} phase")]
    Aborted(Phase),
    /// A message arrived that the role does not accept in its current state.
    #[error("expected a {expected} message, got a {got} message")]
    UnexpectedMessage {
        /// The kind of message the role was waiting for.
        expected: MessageKind,
        /// The kind of message it was handed.
        got: MessageKind,
    },
    /// A message could not be framed or unframed.
    #[error("malformed message")]
    MalformedMessage,
    /// The Malleable strategy has already been applied the maximum number of times.
    #[error("puzzle has reached the hop limit")]
    HopLimit,
    /// Caused by blinding a puzzle under a different strategy than it was blinded with before.
    #[error("puzzle was blinded under the other strategy")]
    StrategyMismatch,
    /// Caused by a local cryptographic operation, such as key generation or blinding.
    #[error(transparent)]
    Crypto(#[from] mixer_crypto::Error),
}

/// Log the abort of `phase` and produce the error reported to the caller.
pub(crate) fn abort(phase: Phase, reason: &'static str) -> Error {
    warn!(phase = ?phase, reason, "aborting session");
    Error::Aborted(phase)
}

/// Session configuration shared by all parties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// How relays prove their blinding.
    pub strategy: Strategy,
    /// Size of the Paillier moduli generated for the hub and the auditor.
    pub modulus_bits: u64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            strategy: Strategy::Relation,
            modulus_bits: 2048,
        }
    }
}

impl Parameters {
    /// The smallest modulus that can carry a puzzle through every hop under `strategy`.
    ///
    /// Under [`Strategy::Malleable`] the plaintexts are multiplied by a scalar at each hop, so
    /// after [`MAX_HOPS`] hops they are below `q^(MAX_HOPS + 1)` and the modulus must exceed that.
    pub fn required_modulus_bits(strategy: Strategy) -> u64 {
        match strategy {
            Strategy::Relation => MIN_MODULUS_BITS,
            Strategy::Malleable => {
                let bound = u64::from(types::Scalar::NUM_BITS) * (u64::from(MAX_HOPS) + 1) + 1;
                bound.max(MIN_MODULUS_BITS)
            }
        }
    }

    /// Check that the configured modulus size supports the configured strategy.
    pub fn validate(&self) -> Result<(), Error> {
        if self.modulus_bits < Self::required_modulus_bits(self.strategy) {
            return Err(Error::Setup(
                "modulus is too small for the configured strategy",
            ));
        }
        Ok(())
    }

    /// Generate a Paillier key pair of the configured size.
    pub fn generate_key_pair(&self, rng: &mut impl Rng) -> Result<EncryptionKeyPair, Error> {
        self.validate()?;
        Ok(EncryptionKeyPair::generate(rng, self.modulus_bits)?)
    }
}

/// Smallest modulus accepted by the encryption layer.
const MIN_MODULUS_BITS: u64 = 512;

/// The public values every party of a session holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicParameters {
    crs: Crs,
    keys: PuzzleKeys,
    hub_key: VerificationKey,
    strategy: Strategy,
}

impl PublicParameters {
    /// Bundle the public values of a session, checking the keys against `parameters`.
    ///
    /// Fails with [`Error::Setup`] if either encryption key is too small for the strategy.
    pub fn new(
        parameters: &Parameters,
        crs: Crs,
        keys: PuzzleKeys,
        hub_key: VerificationKey,
    ) -> Result<Self, Error> {
        parameters.validate()?;
        let required = Parameters::required_modulus_bits(parameters.strategy);
        if keys.auditor.modulus_bits() < required || keys.hub.modulus_bits() < required {
            return Err(Error::Setup(
                "encryption key is too small for the configured strategy",
            ));
        }
        Ok(Self {
            crs,
            keys,
            hub_key,
            strategy: parameters.strategy,
        })
    }

    /// The commitment reference string.
    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// The auditor and hub encryption keys.
    pub fn keys(&self) -> &PuzzleKeys {
        &self.keys
    }

    /// The key the hub signs payments with.
    pub fn hub_key(&self) -> &VerificationKey {
        &self.hub_key
    }

    /// The blinding strategy of the session.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }
}
