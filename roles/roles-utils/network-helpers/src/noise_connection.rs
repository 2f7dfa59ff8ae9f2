use crate::{
    noise_stream::{NoiseTcpReadHalf, NoiseTcpStream, NoiseTcpWriteHalf},
    Error,
};
use async_channel::{unbounded, Receiver, Sender};
use codec_bolt8::HandshakeRole;
use secp256k1::PublicKey;
use std::net::SocketAddr;
use tokio::{net::TcpStream, task};
use tracing::{debug, error, info};

/// Channel-based view of an established connection.
///
/// Payloads received from the peer are pushed to `receiver`; payloads sent on `sender` are
/// encrypted and written to the socket. Both channels are closed when the connection ends.
#[derive(Debug)]
pub struct Connection {
    pub receiver: Receiver<Vec<u8>>,
    pub sender: Sender<Vec<u8>>,
    pub remote_static: PublicKey,
    pub task: task::JoinHandle<Option<Error>>,
}

struct ConnectionState {
    sender_incoming: Sender<Vec<u8>>,
    receiver_incoming: Receiver<Vec<u8>>,
    sender_outgoing: Sender<Vec<u8>>,
    receiver_outgoing: Receiver<Vec<u8>>,
}

impl ConnectionState {
    fn close_all(&self) {
        debug!("Closing all channels");
        self.sender_incoming.close();
        self.receiver_incoming.close();
        self.sender_outgoing.close();
        self.receiver_outgoing.close();
    }
}

impl Connection {
    /// Runs the handshake on `stream` and spawns the task moving payloads between the socket and
    /// the returned channels.
    pub async fn new(stream: TcpStream, role: HandshakeRole) -> Result<Self, Error> {
        let address = stream.peer_addr()?;
        match &role {
            HandshakeRole::Initiator(_) => debug!("Initializing as initiator for {}", address),
            HandshakeRole::Responder(_) => debug!("Initializing as responder for {}", address),
        }
        let stream = NoiseTcpStream::new(stream, role).await?;
        let remote_static = stream.remote_static();
        let (reader, writer) = stream.into_split();

        let (sender_incoming, receiver_incoming) = unbounded();
        let (sender_outgoing, receiver_outgoing) = unbounded();

        let conn_state = ConnectionState {
            sender_incoming,
            receiver_incoming: receiver_incoming.clone(),
            sender_outgoing: sender_outgoing.clone(),
            receiver_outgoing,
        };
        let task = Self::spawn_connection_loop(reader, writer, address, conn_state);

        Ok(Self {
            receiver: receiver_incoming,
            sender: sender_outgoing,
            remote_static,
            task,
        })
    }

    fn spawn_connection_loop(
        mut reader: NoiseTcpReadHalf,
        mut writer: NoiseTcpWriteHalf,
        address: SocketAddr,
        conn_state: ConnectionState,
    ) -> task::JoinHandle<Option<Error>> {
        let sender_incoming = conn_state.sender_incoming.clone();
        let receiver_outgoing = conn_state.receiver_outgoing.clone();

        task::spawn(async move {
            let outcome = loop {
                tokio::select! {
                    biased;
                    res = receiver_outgoing.recv() => {
                        match res {
                            Ok(payload) => {
                                if let Err(e) = writer.write_frame(&payload).await {
                                    error!("Write error for {}: {}, shutting down", address, e);
                                    break Some(e);
                                }
                            }
                            Err(_) => {
                                debug!("Sender closed for {}", address);
                                break None;
                            }
                        }
                    }
                    // read_frame is cancellation-safe
                    res = reader.read_frame() => {
                        match res {
                            Ok(payload) => {
                                if sender_incoming.send(payload).await.is_err() {
                                    debug!("Receiver dropped for {}", address);
                                    break None;
                                }
                            }
                            Err(Error::SocketClosed) => {
                                info!("Peer {} disconnected", address);
                                break None;
                            }
                            Err(e) => {
                                error!("Read error for {}: {}, shutting down", address, e);
                                break Some(e);
                            }
                        }
                    }
                }
            };

            let _ = writer.shutdown().await;
            conn_state.close_all();
            info!("Connection to {} shut down", address);
            outcome
        })
    }
}
