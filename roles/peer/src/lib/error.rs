//! ## Error Module
//!
//! Defines [`PeerError`], the error enum used throughout the peer.
//!
//! Handshake failures are kept apart from network errors so that a peer presenting the wrong
//! identity, or forging records, is reported differently from one that simply went away.

use network_helpers_bolt8::Error as NetworkError;
use std::{fmt, time::Duration};

#[derive(Debug)]
pub enum PeerError {
    Io(std::io::Error),
    Network(NetworkError),
    /// The remote failed authentication or sent a malformed act.
    HandshakeFailed(NetworkError),
    /// The three acts did not complete in time.
    HandshakeTimeout(Duration),
    /// An established connection received a record that failed authentication.
    ConnectionAborted(NetworkError),
    ChannelRecv(async_channel::RecvError),
    BadConfig(String),
    BadCliArgs,
}

impl PeerError {
    /// Sorts an error raised while the handshake was running.
    pub fn from_handshake(e: NetworkError) -> Self {
        if e.is_handshake_failure() {
            PeerError::HandshakeFailed(e)
        } else {
            PeerError::Network(e)
        }
    }

    /// Sorts an error raised by an established connection.
    pub fn from_transport(e: NetworkError) -> Self {
        if e.is_protocol_failure() {
            PeerError::ConnectionAborted(e)
        } else {
            PeerError::Network(e)
        }
    }
}

impl fmt::Display for PeerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use PeerError::*;
        match self {
            Io(ref e) => write!(f, "I/O error: `{e:?}`"),
            Network(ref e) => write!(f, "Network error: `{e}`"),
            HandshakeFailed(ref e) => write!(f, "Handshake failed: `{e}`"),
            HandshakeTimeout(ref t) => write!(f, "Handshake timed out after {t:?}"),
            ConnectionAborted(ref e) => write!(f, "Connection aborted: `{e}`"),
            ChannelRecv(ref e) => write!(f, "Channel recv failed: `{e:?}`"),
            BadConfig(ref e) => write!(f, "Bad configuration: {e}"),
            BadCliArgs => write!(f, "Bad CLI arg input"),
        }
    }
}

impl std::error::Error for PeerError {}

impl From<std::io::Error> for PeerError {
    fn from(e: std::io::Error) -> PeerError {
        PeerError::Io(e)
    }
}

impl From<async_channel::RecvError> for PeerError {
    fn from(e: async_channel::RecvError) -> PeerError {
        PeerError::ChannelRecv(e)
    }
}
