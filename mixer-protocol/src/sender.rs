/*!
The sender: pays the hub to solve a puzzle, and hands the unblinded solution to the receiver.

The sender begins with a [`Config`]. On a [`RandomizeMessage`] whose puzzle descends from the
hub's forwarded promise, it [`lock()`](Config::lock())s: it blinds the puzzle again, pre-signs its
payment to the hub against the new point and enters the [`Locked`] state, producing a
[`SolveRequest`] for the hub.

Once the hub publishes the completed payment as a [`SolutionMessage`], the sender
[`solve()`](Locked::solve())s: it extracts the solution from the signature, removes its
blinding, and enters [`Solved`], producing a [`SecretMessage`] for the receiver.
*/

use crate::{
    abort,
    messages::{Message, RandomizeMessage, SecretMessage, SolutionMessage, SolveRequest},
    puzzle::Blinding,
    types::*,
    Error, Phase, PublicParameters, Rng,
};
use mixer_crypto::adaptor::{AdaptorPreSignature, Signature, SigningKey, VerificationKey};
use std::convert::TryFrom;
use tracing::debug;

/// A sender waiting for the receiver's blinded puzzle.
#[derive(Debug, Clone)]
pub struct Config {
    params: PublicParameters,
    signing_key: SigningKey,
}

/// A sender whose payment to the hub is locked to its blinded puzzle.
#[derive(Debug)]
pub struct Locked {
    verification_key: VerificationKey,
    received_point: G1Projective,
    locked_point: G1Projective,
    blinding: Blinding,
    payment: Vec<u8>,
    pre_signature: AdaptorPreSignature,
}

/// A sender whose payment went through and who knows the receiver's solution.
#[derive(Debug, Clone, Copy)]
pub struct Solved {
    signature: Signature,
    secret: Scalar,
}

impl Config {
    /// Instantiate a sender that pays with `signing_key`.
    pub fn new(params: PublicParameters, signing_key: SigningKey) -> Self {
        Self {
            params,
            signing_key,
        }
    }

    /**
    Accept the receiver's puzzle, blind it, and lock `payment` to the result.

    Fails with [`Error::Aborted`] in the registration phase if the forwarded promise is not
    pre-signed by the hub, or the puzzle does not verify as one blinding of the promised puzzle.
    */
    pub fn lock(
        self,
        rng: &mut impl Rng,
        message: impl Into<Message>,
        payment: &[u8],
    ) -> Result<(Locked, SolveRequest), Error> {
        let RandomizeMessage { puzzle, promise } = RandomizeMessage::try_from(message.into())?;
        if !promise.pre_signature.pre_verify(
            &promise.payment,
            promise.puzzle.point(),
            self.params.hub_key(),
        ) {
            return Err(abort(Phase::Registration, "promise is not signed by the hub"));
        }
        if !puzzle
            .verify_from(&self.params, &promise.puzzle)
            .is_verified()
        {
            return Err(abort(Phase::Registration, "puzzle proof rejected"));
        }

        let received_point = puzzle.point();
        let (puzzle, blinding) = puzzle.apply(rng, &self.params)?;
        let locked_point = puzzle.point();
        let pre_signature = self.signing_key.pre_sign(rng, payment, locked_point);
        let verification_key = self.signing_key.verification_key();
        debug!("locked payment to blinded puzzle");

        Ok((
            Locked {
                verification_key,
                received_point,
                locked_point,
                blinding,
                payment: payment.to_vec(),
                pre_signature: pre_signature.clone(),
            },
            SolveRequest {
                puzzle,
                payment: payment.to_vec(),
                pre_signature,
                sender_key: verification_key,
            },
        ))
    }
}

impl Locked {
    /**
    Extract the solution from the hub's completed payment and remove the sender's blinding.

    Fails with [`Error::Aborted`] in the solve phase if the signature is not a completion of the
    sender's pre-signature, or the unblinded solution does not solve the receiver's puzzle.
    */
    pub fn solve(self, message: impl Into<Message>) -> Result<(Solved, SecretMessage), Error> {
        let SolutionMessage { signature } = SolutionMessage::try_from(message.into())?;
        if !self.verification_key.verify(&self.payment, &signature) {
            return Err(abort(Phase::Solve, "published payment does not verify"));
        }

        let solution = self
            .pre_signature
            .extract_witness(&signature, self.locked_point)
            .map_err(|_| abort(Phase::Solve, "signature does not reveal the solution"))?;
        let secret = self.blinding.derandomize(solution);
        if G1Projective::generator() * secret != self.received_point {
            return Err(abort(Phase::Solve, "solution does not solve the received puzzle"));
        }
        Ok((Solved { signature, secret }, SecretMessage { secret }))
    }
}

impl Solved {
    /// The completed payment to the hub.
    pub fn signature(&self) -> Signature {
        self.signature
    }

    /// The solution to the receiver's blinded puzzle.
    pub fn secret(&self) -> Scalar {
        self.secret
    }
}
