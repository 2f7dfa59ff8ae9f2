use core::fmt;

use noise_bolt8::{Error as NoiseError, Stage};

/// Errors returned by the codec.
///
/// [`Error::MissingBytes`] only means that more input is needed, every other variant is fatal for
/// the connection it came from.
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// More bytes are needed before the next handshake act or record can be processed.
    MissingBytes(usize),
    /// Error from the handshake or the record ciphers.
    Noise(NoiseError),
    /// The input ended in the middle of a record.
    TruncatedRecord { expected: usize, received: usize },
    /// The operation is not valid in the current state (e.g. encrypting before the handshake).
    UnexpectedNoiseState,
    /// A payload exceeds the configured maximum message size.
    MessageTooLarge(usize),
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::MissingBytes(_))
    }

    /// Returns `true` when the error comes from a failed handshake rather than from an
    /// established connection.
    pub fn is_handshake_failure(&self) -> bool {
        match self {
            Error::Noise(NoiseError::AuthenticationFailed(stage)) => {
                !matches!(stage, Stage::RecordLength | Stage::RecordBody)
            }
            Error::Noise(e) => matches!(
                e,
                NoiseError::UnsupportedVersion { .. }
                    | NoiseError::InvalidPublicKey(_)
                    | NoiseError::HandshakeAborted
                    | NoiseError::UnexpectedHandshakeMessage
                    | NoiseError::InvalidMessageLength { .. }
            ),
            _ => false,
        }
    }
}

impl From<NoiseError> for Error {
    fn from(e: NoiseError) -> Self {
        Error::Noise(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;
        match self {
            MissingBytes(u) => write!(f, "Missing `{}` bytes", u),
            Noise(e) => write!(f, "Noise error: {}", e),
            TruncatedRecord { expected, received } => write!(
                f,
                "Stream ended mid-record: expected `{}` bytes, received `{}`",
                expected, received
            ),
            UnexpectedNoiseState => write!(f, "Noise state is incorrect"),
            MessageTooLarge(size) => write!(f, "Message of `{}` bytes is too large", size),
        }
    }
}

impl std::error::Error for Error {}
