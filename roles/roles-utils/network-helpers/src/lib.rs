pub mod noise_connection;
pub mod noise_stream;

use async_channel::{RecvError, SendError};
use codec_bolt8::Error as CodecError;
use std::fmt;

pub use codec_bolt8;

#[derive(Debug)]
pub enum Error {
    CodecError(CodecError),
    RecvError,
    SendError,
    // This means that a socket that was supposed to be opened have been closed, likely by the
    // peer
    SocketClosed,
    Io(std::io::ErrorKind),
}

impl Error {
    /// `true` when the peer misbehaved cryptographically (failed handshake, forged or corrupted
    /// record), as opposed to an ordinary disconnect.
    pub fn is_protocol_failure(&self) -> bool {
        match self {
            Error::CodecError(CodecError::TruncatedRecord { .. }) => false,
            Error::CodecError(e) => e.is_fatal(),
            _ => false,
        }
    }

    pub fn is_handshake_failure(&self) -> bool {
        matches!(self, Error::CodecError(e) if e.is_handshake_failure())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CodecError(e) => write!(f, "{}", e),
            Error::RecvError => write!(f, "Channel receive failed"),
            Error::SendError => write!(f, "Channel send failed"),
            Error::SocketClosed => write!(f, "Socket closed by peer"),
            Error::Io(kind) => write!(f, "I/O error: {}", kind),
        }
    }
}

impl std::error::Error for Error {}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Error::CodecError(e)
    }
}
impl From<RecvError> for Error {
    fn from(_: RecvError) -> Self {
        Error::RecvError
    }
}
impl<T> From<SendError<T>> for Error {
    fn from(_: SendError<T>) -> Self {
        Error::SendError
    }
}
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe => Error::SocketClosed,
            kind => Error::Io(kind),
        }
    }
}
