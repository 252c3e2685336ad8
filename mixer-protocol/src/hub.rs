//! The hub: issues puzzles with a locked payment, and solves the blinded puzzles it is handed in
//! exchange for a payment.
//!
//! The hub serves many sessions at once, so unlike the peers it holds no per-session state.

use crate::{
    abort,
    messages::{Message, PromiseMessage, SolutionMessage, SolveRequest},
    puzzle::{self, AuditRecord},
    types::*,
    Error, Phase, PublicParameters, Rng,
};
use mixer_crypto::{
    adaptor::SigningKey,
    encryption::{DecryptionKey, EncryptionKeyPair},
};
use std::convert::TryFrom;
use tracing::debug;

/// A hub that is ready to issue and solve puzzles.
///
/// Holds the keys used across every session the hub takes part in.
#[derive(Debug, Clone)]
pub struct Config {
    params: PublicParameters,
    signing_key: SigningKey,
    decryption_key: DecryptionKey,
}

impl Config {
    /// Instantiate a hub from its keys.
    ///
    /// Fails with [`Error::Setup`] if the keys do not match the ones published in `params`.
    pub fn new(
        params: PublicParameters,
        signing_key: SigningKey,
        key_pair: EncryptionKeyPair,
    ) -> Result<Self, Error> {
        if &signing_key.verification_key() != params.hub_key() {
            return Err(Error::Setup("signing key does not match the published hub key"));
        }
        if key_pair.encryption_key() != &params.keys().hub {
            return Err(Error::Setup(
                "encryption key does not match the published hub key",
            ));
        }
        Ok(Self {
            params,
            signing_key,
            decryption_key: key_pair.decryption_key().clone(),
        })
    }

    /// The public parameters the hub runs under.
    pub fn params(&self) -> &PublicParameters {
        &self.params
    }

    /**
    Issue a puzzle to a receiver together with a pre-signature on `payment` that only the
    puzzle's solution completes.

    Returns the message for the receiver and the record for the audit committee.
    */
    pub fn promise(
        &self,
        rng: &mut impl Rng,
        payment: &[u8],
    ) -> Result<(PromiseMessage, AuditRecord), Error> {
        let (puzzle, audit) = puzzle::issue(rng, &self.params)?;
        let pre_signature = self.signing_key.pre_sign(rng, payment, puzzle.point());
        debug!(id = ?audit.id, "issued puzzle");
        Ok((
            PromiseMessage {
                puzzle,
                payment: payment.to_vec(),
                pre_signature,
            },
            audit,
        ))
    }

    /**
    Solve a sender's puzzle, completing the sender's payment.

    The puzzle's proof and the sender's pre-signature are checked first; either failing aborts
    the registration phase. Only the last hop is checked, since the hub is not shown the puzzle
    it issued. Its own decryption anchors the secret instead: the hub then decrypts the puzzle
    and checks the solution against the puzzle point, and a mismatch aborts the solve phase.
    */
    pub fn solve(&self, message: impl Into<Message>) -> Result<SolutionMessage, Error> {
        let request = SolveRequest::try_from(message.into())?;
        let point = request.puzzle.point();

        if !request.puzzle.verify(&self.params).is_verified() {
            return Err(abort(Phase::Registration, "puzzle proof rejected"));
        }
        if !request
            .pre_signature
            .pre_verify(&request.payment, point, &request.sender_key)
        {
            return Err(abort(Phase::Registration, "sender pre-signature rejected"));
        }

        let solution = self
            .decryption_key
            .decrypt(&request.puzzle.statement.alpha_ciphertext)
            .map_err(|_| abort(Phase::Solve, "puzzle ciphertext does not decrypt"))?;
        if G1Projective::generator() * solution != point {
            return Err(abort(Phase::Solve, "decrypted solution does not match the point"));
        }
        let signature = request
            .pre_signature
            .complete(solution)
            .map_err(|_| abort(Phase::Solve, "solution cannot complete the pre-signature"))?;
        Ok(SolutionMessage { signature })
    }
}
