//! Status messages sent by the listener and connection tasks to the main loop.

use key_utils::Secp256k1PublicKey;
use std::net::SocketAddr;
use tracing::{debug, error, info, warn};

use super::error::PeerError;

/// Each sending side of the status channel is wrapped with this enum so the main loop knows
/// which component sent the message.
#[derive(Debug, Clone)]
pub enum Sender {
    Listener(async_channel::Sender<Status>),
    Connection(async_channel::Sender<Status>),
}

impl Sender {
    pub async fn send(&self, state: State) {
        let tx = match self {
            Sender::Listener(tx) | Sender::Connection(tx) => tx,
        };
        if tx.send(Status { state }).await.is_err() {
            debug!("Status receiver dropped");
        }
    }

    pub fn for_connection(&self) -> Self {
        match self {
            Sender::Listener(tx) | Sender::Connection(tx) => Sender::Connection(tx.clone()),
        }
    }
}

#[derive(Debug)]
pub enum State {
    /// The listener can not accept connections any more.
    ListenerShutdown(PeerError),
    /// A dial attempt failed before the handshake started.
    DialFailed { address: String, error: PeerError },
    /// The handshake completed.
    Connected {
        address: SocketAddr,
        node_id: Secp256k1PublicKey,
    },
    /// The handshake did not complete: timeout, failed authentication or bad act.
    HandshakeFailed {
        address: SocketAddr,
        error: PeerError,
    },
    /// The connection ended. `error` is `None` for a clean close.
    Disconnected {
        address: SocketAddr,
        error: Option<PeerError>,
    },
}

/// Message to be sent to the status loop on the main task.
#[derive(Debug)]
pub struct Status {
    pub state: State,
}

/// Logs a status message. Returns `true` if the peer must shut down.
pub fn handle_status(status: Status) -> bool {
    match status.state {
        State::ListenerShutdown(err) => {
            error!("SHUTDOWN from listener: {}", err);
            true
        }
        State::DialFailed { address, error } => {
            warn!("Could not dial {}: {}", address, error);
            false
        }
        State::Connected { address, node_id } => {
            info!("Connected to {} at {}", node_id, address);
            false
        }
        State::HandshakeFailed { address, error } => {
            warn!("Handshake with {} failed: {}", address, error);
            false
        }
        State::Disconnected {
            address,
            error: Some(error @ PeerError::ConnectionAborted(_)),
        } => {
            error!("Connection with {} aborted: {}", address, error);
            false
        }
        State::Disconnected {
            address,
            error: Some(error),
        } => {
            warn!("Disconnected from {}: {}", address, error);
            false
        }
        State::Disconnected {
            address,
            error: None,
        } => {
            info!("Peer {} closed the connection", address);
            false
        }
    }
}
