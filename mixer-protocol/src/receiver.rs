/*!
The receiver: accepts the hub's promise, blinds the puzzle for the sender, and finally unblinds
the sender's solution to claim the hub's payment.

The receiver begins with a [`Config`]. On a valid [`PromiseMessage`] it
[`accept()`](Config::accept())s the puzzle, blinds it, and enters the [`Randomized`] state,
producing a [`RandomizeMessage`] for the sender that carries the promise along.

On receiving a [`SecretMessage`], the receiver [`settle()`](Randomized::settle())s: it removes its
blinding to recover the issued secret and completes the hub's payment, entering [`Settled`].
*/

use crate::{
    abort,
    messages::{Message, PromiseMessage, RandomizeMessage, SecretMessage},
    puzzle::Blinding,
    types::*,
    Error, Phase, PublicParameters, Rng,
};
use mixer_crypto::adaptor::{AdaptorPreSignature, Signature};
use std::convert::TryFrom;
use tracing::debug;

/// A receiver waiting for a promise from the hub.
#[derive(Debug, Clone)]
pub struct Config {
    params: PublicParameters,
}

/// A receiver that has blinded the hub's puzzle and waits for its solution.
#[derive(Debug)]
pub struct Randomized {
    params: PublicParameters,
    issued_point: G1Projective,
    blinding: Blinding,
    payment: Vec<u8>,
    pre_signature: AdaptorPreSignature,
}

/// A receiver holding the hub's completed payment.
#[derive(Debug, Clone)]
pub struct Settled {
    payment: Vec<u8>,
    signature: Signature,
    secret: Scalar,
}

impl Config {
    /// Instantiate a receiver for a session under `params`.
    pub fn new(params: PublicParameters) -> Self {
        Self { params }
    }

    /**
    Accept the hub's promise and blind its puzzle.

    Fails with [`Error::Aborted`] in the promise phase if the puzzle is not freshly issued, its
    proof does not verify, or the pre-signature is not locked to its point.
    */
    pub fn accept(
        self,
        rng: &mut impl Rng,
        message: impl Into<Message>,
    ) -> Result<(Randomized, RandomizeMessage), Error> {
        let promise = PromiseMessage::try_from(message.into())?;
        let issued_point = promise.puzzle.point();

        if !promise.puzzle.is_issued() {
            return Err(abort(Phase::Promise, "puzzle is not freshly issued"));
        }
        if !promise.puzzle.verify(&self.params).is_verified() {
            return Err(abort(Phase::Promise, "puzzle proof rejected"));
        }
        if !promise
            .pre_signature
            .pre_verify(&promise.payment, issued_point, self.params.hub_key())
        {
            return Err(abort(Phase::Promise, "hub pre-signature rejected"));
        }

        let (puzzle, blinding) = promise.puzzle.clone().apply(rng, &self.params)?;
        debug!("blinded issued puzzle");
        Ok((
            Randomized {
                params: self.params,
                issued_point,
                blinding,
                payment: promise.payment.clone(),
                pre_signature: promise.pre_signature.clone(),
            },
            RandomizeMessage { puzzle, promise },
        ))
    }
}

impl Randomized {
    /**
    Unblind the sender's solution and complete the hub's payment with it.

    Fails with [`Error::Aborted`] in the solve phase if the unblinded secret does not solve the
    issued puzzle.
    */
    pub fn settle(self, message: impl Into<Message>) -> Result<Settled, Error> {
        let SecretMessage { secret } = SecretMessage::try_from(message.into())?;
        let secret = self.blinding.derandomize(secret);
        if G1Projective::generator() * secret != self.issued_point {
            return Err(abort(Phase::Solve, "secret does not solve the issued puzzle"));
        }

        let signature = self
            .pre_signature
            .complete(secret)
            .map_err(|_| abort(Phase::Solve, "secret cannot complete the pre-signature"))?;
        if !self.params.hub_key().verify(&self.payment, &signature) {
            return Err(abort(Phase::Solve, "completed payment does not verify"));
        }
        Ok(Settled {
            payment: self.payment,
            signature,
            secret,
        })
    }
}

impl Settled {
    /// The payment the hub signed.
    pub fn payment(&self) -> &[u8] {
        &self.payment
    }

    /// The hub's completed signature on the payment.
    pub fn signature(&self) -> Signature {
        self.signature
    }

    /// The issued puzzle's secret.
    pub fn secret(&self) -> Scalar {
        self.secret
    }
}
