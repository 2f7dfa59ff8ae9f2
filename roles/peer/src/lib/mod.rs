pub mod config;
pub mod connection;
pub mod error;
pub mod status;

use async_channel::unbounded;
use config::PeerConfig;
use connection::{handle_connection, ConnectionSettings};
use error::PeerError;
use network_helpers_bolt8::codec_bolt8::HandshakeRole;
use secp256k1::SecretKey;
use std::future::Future;
use tokio::{
    net::{TcpListener, TcpStream},
    select,
    task::JoinSet,
};
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct Peer {
    config: PeerConfig,
}

impl Peer {
    pub fn new(config: PeerConfig) -> Self {
        Self { config }
    }

    /// Runs until Ctrl+C is received or the listener fails.
    pub async fn start(&self) -> Result<(), PeerError> {
        self.run(tokio::signal::ctrl_c()).await
    }

    /// Runs until `shutdown` resolves or the listener fails. All connections are dropped, and
    /// their keys erased, on return.
    pub async fn run<F>(&self, shutdown: F) -> Result<(), PeerError>
    where
        F: Future<Output = std::io::Result<()>>,
    {
        self.config.validate()?;
        info!("Node id: {}", self.config.node_id());

        let secret = self.config.static_secret_key().0;
        let settings = ConnectionSettings {
            handshake_timeout: self.config.handshake_timeout(),
            max_message_size: self.config.max_message_size(),
            greeting: self.config.greeting().map(str::to_string),
        };
        let (status_tx, status_rx) = unbounded();
        let mut tasks = JoinSet::new();

        if let Some(address) = self.config.listen_address() {
            let listener = TcpListener::bind(address).await?;
            info!("Listening for connections on {}", listener.local_addr()?);
            let sender = status::Sender::Listener(status_tx.clone());
            tasks.spawn(listen(listener, secret, settings.clone(), sender));
        }

        for peer in self.config.peers() {
            let sender = status::Sender::Connection(status_tx.clone());
            let peer = peer.clone();
            let settings = settings.clone();
            tasks.spawn(async move {
                match TcpStream::connect(&peer.address).await {
                    Ok(stream) => {
                        info!("Dialing {} at {}", peer.node_id, peer.address);
                        let role = HandshakeRole::initiator(secret, peer.node_id.0);
                        handle_connection(stream, role, settings, sender).await;
                    }
                    Err(e) => {
                        sender
                            .send(status::State::DialFailed {
                                address: peer.address,
                                error: e.into(),
                            })
                            .await
                    }
                }
            });
        }
        drop(status_tx);

        tokio::pin!(shutdown);
        loop {
            let task_status = select! {
                task_status = status_rx.recv() => task_status,
                interrupt_signal = &mut shutdown => {
                    match interrupt_signal {
                        Ok(()) => info!("Interrupt received"),
                        Err(err) => error!("Unable to listen for interrupt signal: {}", err),
                    }
                    break;
                }
            };
            match task_status {
                Ok(task_status) => {
                    if status::handle_status(task_status) {
                        break;
                    }
                }
                Err(_) => {
                    info!("No connection left");
                    break;
                }
            }
        }
        tasks.shutdown().await;
        Ok(())
    }
}

async fn listen(
    listener: TcpListener,
    secret: SecretKey,
    settings: ConnectionSettings,
    sender: status::Sender,
) {
    let mut connections = JoinSet::new();
    loop {
        while connections.try_join_next().is_some() {}
        match listener.accept().await {
            Ok((stream, _)) => {
                connections.spawn(handle_connection(
                    stream,
                    HandshakeRole::responder(secret),
                    settings.clone(),
                    sender.for_connection(),
                ));
            }
            Err(e) => {
                sender
                    .send(status::State::ListenerShutdown(PeerError::Io(e)))
                    .await;
                break;
            }
        }
    }
}
