//! Messages exchanged between the hub, the receiver and the sender.
//!
//! Each message has its own type, and all of them travel as one tagged [`Message`], framed with
//! `bincode`. Roles take any `impl Into<Message>` and reject the kinds they do not expect in their
//! current state with [`Error::UnexpectedMessage`].

use crate::{puzzle::PuzzleState, types::*, Error};
use mixer_crypto::{
    adaptor::{AdaptorPreSignature, Signature, VerificationKey},
    SerializeElement,
};
use serde::*;
use std::{convert::TryFrom, fmt};
use tracing::debug;

/// Sent by the hub to the receiver: a fresh puzzle and a payment locked to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromiseMessage {
    /// The issued puzzle.
    pub puzzle: PuzzleState,
    /// The payment the hub pre-signed.
    pub payment: Vec<u8>,
    /// The hub's pre-signature on `payment`, locked to the puzzle point.
    pub pre_signature: AdaptorPreSignature,
}

/// Sent by the receiver to the sender: the puzzle after the receiver's blinding, and the hub's
/// promise it was blinded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomizeMessage {
    /// The blinded puzzle.
    pub puzzle: PuzzleState,
    /// The promise the receiver accepted. Its pre-signature shows the hub issued the puzzle.
    pub promise: PromiseMessage,
}

/// Sent by the sender to the hub: the twice-blinded puzzle and a payment locked to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveRequest {
    /// The twice-blinded puzzle.
    pub puzzle: PuzzleState,
    /// The payment the sender pre-signed.
    pub payment: Vec<u8>,
    /// The sender's pre-signature on `payment`, locked to the puzzle point.
    pub pre_signature: AdaptorPreSignature,
    /// The key `pre_signature` verifies under.
    pub sender_key: VerificationKey,
}

/// Published by the hub: the completed payment from the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionMessage {
    /// The sender's signature, completed with the solution.
    pub signature: Signature,
}

/// Sent by the sender to the receiver: the solution with the sender's blinding removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretMessage {
    /// The solution to the puzzle the receiver handed on.
    #[serde(with = "SerializeElement")]
    pub secret: Scalar,
}

/// Any protocol message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// See [`PromiseMessage`].
    Promise(PromiseMessage),
    /// See [`RandomizeMessage`].
    Randomize(RandomizeMessage),
    /// See [`SolveRequest`].
    Solve(SolveRequest),
    /// See [`SolutionMessage`].
    Solution(SolutionMessage),
    /// See [`SecretMessage`].
    Secret(SecretMessage),
}

/// The kind of a [`Message`], without its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    #[allow(missing_docs)]
    Promise,
    #[allow(missing_docs)]
    Randomize,
    #[allow(missing_docs)]
    Solve,
    #[allow(missing_docs)]
    Solution,
    #[allow(missing_docs)]
    Secret,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageKind::Promise => "promise",
            MessageKind::Randomize => "randomize",
            MessageKind::Solve => "solve",
            MessageKind::Solution => "solution",
            MessageKind::Secret => "secret",
        };
        f.write_str(name)
    }
}

impl Message {
    /// The kind of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Promise(_) => MessageKind::Promise,
            Message::Randomize(_) => MessageKind::Randomize,
            Message::Solve(_) => MessageKind::Solve,
            Message::Solution(_) => MessageKind::Solution,
            Message::Secret(_) => MessageKind::Secret,
        }
    }

    /// Frame the message for transport.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        bincode::serialize(self).map_err(|err| {
            debug!(error = %err, kind = %self.kind(), "could not frame message");
            Error::MalformedMessage
        })
    }

    /// Read a message framed with [`Message::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        bincode::deserialize(bytes).map_err(|err| {
            debug!(error = %err, len = bytes.len(), "could not unframe message");
            Error::MalformedMessage
        })
    }
}

/// Implement conversions between a message type and its [`Message`] variant.
macro_rules! impl_message_variant {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Message {
                fn from(message: $ty) -> Self {
                    Message::$variant(message)
                }
            }

            impl TryFrom<Message> for $ty {
                type Error = Error;

                fn try_from(message: Message) -> Result<Self, Error> {
                    match message {
                        Message::$variant(inner) => Ok(inner),
                        other => Err(Error::UnexpectedMessage {
                            expected: MessageKind::$variant,
                            got: other.kind(),
                        }),
                    }
                }
            }
        )*
    };
}

impl_message_variant!(
    Promise(PromiseMessage),
    Randomize(RandomizeMessage),
    Solve(SolveRequest),
    Solution(SolutionMessage),
    Secret(SecretMessage),
);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wrong_variant_names_both_kinds() {
        let message = Message::from(SecretMessage {
            secret: Scalar::from(3u64),
        });
        assert_eq!(
            SolutionMessage::try_from(message.clone()),
            Err(Error::UnexpectedMessage {
                expected: MessageKind::Solution,
                got: MessageKind::Secret,
            })
        );
        assert_eq!(
            SecretMessage::try_from(message).map(|m| m.secret),
            Ok(Scalar::from(3u64))
        );
    }

    #[test]
    fn framed_secret_survives_transport() {
        let message = Message::from(SecretMessage {
            secret: Scalar::from(42u64),
        });
        let bytes = message.to_bytes().unwrap();
        assert_eq!(Message::from_bytes(&bytes), Ok(message));
    }

    #[test]
    fn truncated_frame_is_malformed() {
        let bytes = Message::from(SecretMessage {
            secret: Scalar::from(42u64),
        })
        .to_bytes()
        .unwrap();
        assert_eq!(
            Message::from_bytes(&bytes[..bytes.len() - 1]),
            Err(Error::MalformedMessage)
        );
    }

    #[test]
    fn kinds_display_in_lowercase() {
        assert_eq!(
            Error::UnexpectedMessage {
                expected: MessageKind::Promise,
                got: MessageKind::Solve,
            }
            .to_string(),
            "expected a promise message, got a solve message"
        );
    }
}
