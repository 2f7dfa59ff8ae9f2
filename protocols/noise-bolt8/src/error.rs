// # Error Handling
//
// Defines error types and utilities for handling errors in the `noise_bolt8` crate.
//
// Every error returned by this crate is terminal for the handshake or connection it came from:
// a failed authentication can not be told apart from an active attack, so nothing here is
// retryable.

use core::fmt;

pub use chacha20poly1305::aead::Error as AeadError;

/// Identifies one of the three handshake acts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Act {
    One,
    Two,
    Three,
}

impl fmt::Display for Act {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Act::One => write!(f, "ACT1"),
            Act::Two => write!(f, "ACT2"),
            Act::Three => write!(f, "ACT3"),
        }
    }
}

/// Identifies which AEAD verification failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Tag of act one (empty plaintext).
    ActOne,
    /// Tag of act two (empty plaintext).
    ActTwo,
    /// Encrypted initiator static key carried by act three.
    ActThreeStaticKey,
    /// Final tag of act three (empty plaintext).
    ActThree,
    /// Encrypted two-byte length prefix of a transport record.
    RecordLength,
    /// Encrypted body of a transport record.
    RecordBody,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::ActOne => write!(f, "ACT1_BAD_TAG"),
            Stage::ActTwo => write!(f, "ACT2_BAD_TAG"),
            Stage::ActThreeStaticKey => write!(f, "ACT3_BAD_CIPHERTEXT"),
            Stage::ActThree => write!(f, "ACT3_BAD_TAG"),
            Stage::RecordLength => write!(f, "BAD_LENGTH_TAG"),
            Stage::RecordBody => write!(f, "BAD_BODY_TAG"),
        }
    }
}

/// Noise protocol error handling.
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// The version byte of a handshake act is not `0`.
    UnsupportedVersion { act: Act, version: u8 },

    /// A public key received during a handshake act is not a valid curve point.
    InvalidPublicKey(Act),

    /// An AEAD tag did not verify.
    AuthenticationFailed(Stage),

    /// A handshake message or record has an incorrect length.
    InvalidMessageLength { expected: usize, actual: usize },

    /// A transport payload exceeds [`crate::MAX_MESSAGE_SIZE`].
    MessageTooLarge(usize),

    /// A nonce counter would overflow. Rekeying makes this unreachable unless a cipher is misused.
    NonceExhausted,

    /// The transport key has been erased, the connection is closed.
    KeyErased,

    /// A previous act failed, the handshake can not be resumed.
    HandshakeAborted,

    /// An act was driven out of order.
    UnexpectedHandshakeMessage,

    /// A raw public key is invalid or cannot be parsed.
    InvalidRawPublicKey,

    /// A raw private key is invalid or cannot be parsed.
    InvalidRawPrivateKey,

    /// Wraps AEAD errors that are not tag verification failures (e.g. buffer errors on encryption).
    Aead(AeadError),
}

impl Error {
    /// Turns an opaque AEAD failure into an [`Error::AuthenticationFailed`] for `stage`.
    ///
    /// Any other error is returned unchanged.
    pub(crate) fn in_stage(self, stage: Stage) -> Self {
        match self {
            Error::Aead(_) => Error::AuthenticationFailed(stage),
            other => other,
        }
    }

    /// Returns `true` for failures that can only come from a misbehaving or malicious peer.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Error::AuthenticationFailed(_)
                | Error::UnsupportedVersion { .. }
                | Error::InvalidPublicKey(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;
        match self {
            UnsupportedVersion { act, version } => write!(f, "{act}_BAD_VERSION {version}"),
            InvalidPublicKey(act) => write!(f, "{act}_BAD_PUBKEY"),
            AuthenticationFailed(stage) => write!(f, "{stage}"),
            InvalidMessageLength { expected, actual } => {
                write!(f, "invalid message length: expected {expected}, got {actual}")
            }
            MessageTooLarge(size) => write!(
                f,
                "message too large: {size} bytes (max {})",
                crate::MAX_MESSAGE_SIZE
            ),
            NonceExhausted => write!(f, "nonce exhausted"),
            KeyErased => write!(f, "transport key erased"),
            HandshakeAborted => write!(f, "handshake aborted"),
            UnexpectedHandshakeMessage => write!(f, "handshake act out of order"),
            InvalidRawPublicKey => write!(f, "invalid raw public key"),
            InvalidRawPrivateKey => write!(f, "invalid raw private key"),
            Aead(e) => write!(f, "aead error: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<AeadError> for Error {
    fn from(value: AeadError) -> Self {
        Self::Aead(value)
    }
}
