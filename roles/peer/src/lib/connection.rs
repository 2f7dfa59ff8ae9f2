//! Drives one TCP connection from the first handshake byte to its end.

use key_utils::Secp256k1PublicKey;
use network_helpers_bolt8::{
    codec_bolt8::HandshakeRole, noise_stream::NoiseTcpStream, Error as NetworkError,
};
use std::{net::SocketAddr, time::Duration};
use tokio::{net::TcpStream, time::timeout};
use tracing::{debug, info};

use crate::{
    error::PeerError,
    status::{self, State},
};

/// Per-connection settings taken from the configuration.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub handshake_timeout: Duration,
    pub max_message_size: usize,
    pub greeting: Option<String>,
}

/// Runs the handshake within the configured timeout, then logs every record received until the
/// peer goes away. The outcome is reported on `status`; the number of records received is
/// returned.
pub async fn handle_connection(
    stream: TcpStream,
    role: HandshakeRole,
    settings: ConnectionSettings,
    status: status::Sender,
) -> u64 {
    let address = match stream.peer_addr() {
        Ok(address) => address,
        Err(e) => {
            debug!("Connection dropped before it could be handled: {}", e);
            return 0;
        }
    };

    let stream = match handshake(stream, role, &settings).await {
        Ok(stream) => stream,
        Err(error) => {
            status.send(State::HandshakeFailed { address, error }).await;
            return 0;
        }
    };
    let node_id = Secp256k1PublicKey(stream.remote_static());
    status.send(State::Connected { address, node_id }).await;

    let (received, error) = run(stream, address, node_id, &settings).await;
    status.send(State::Disconnected { address, error }).await;
    received
}

async fn handshake(
    stream: TcpStream,
    role: HandshakeRole,
    settings: &ConnectionSettings,
) -> Result<NoiseTcpStream, PeerError> {
    match timeout(
        settings.handshake_timeout,
        NoiseTcpStream::with_max_message_size(stream, role, settings.max_message_size),
    )
    .await
    {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(PeerError::from_handshake(e)),
        Err(_) => Err(PeerError::HandshakeTimeout(settings.handshake_timeout)),
    }
}

async fn run(
    stream: NoiseTcpStream,
    address: SocketAddr,
    node_id: Secp256k1PublicKey,
    settings: &ConnectionSettings,
) -> (u64, Option<PeerError>) {
    let (mut reader, mut writer) = stream.into_split();
    if let Some(greeting) = &settings.greeting {
        if let Err(e) = writer.write_frame(greeting.as_bytes()).await {
            return (0, Some(PeerError::from_transport(e)));
        }
    }

    let mut received = 0;
    let error = loop {
        match reader.read_frame().await {
            Ok(payload) => {
                received += 1;
                info!(
                    "Record #{} from {} ({}): {} bytes",
                    received,
                    node_id,
                    address,
                    payload.len()
                );
                debug!("Payload: {:?}", String::from_utf8_lossy(&payload));
            }
            Err(NetworkError::SocketClosed) => break None,
            Err(e) => break Some(PeerError::from_transport(e)),
        }
    };
    let _ = writer.shutdown().await;
    (received, error)
}
