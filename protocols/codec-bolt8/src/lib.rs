//! Byte-oriented driver for BOLT 8 connections.
//!
//! [`NoiseTransport`] owns the handshake while it runs and the two record ciphers afterwards. It
//! never touches a socket: callers feed it whatever bytes they read and write out whatever it
//! returns, which keeps it usable from blocking code, async runtimes and tests alike.

use secp256k1::{PublicKey, SecretKey};
use tracing::{debug, warn};

mod decoder;
mod encoder;
pub mod error;

pub use decoder::NoiseDecoder;
pub use encoder::NoiseEncoder;
pub use error::{Error, Result};

pub use noise_bolt8::{self, Initiator, Responder, MAX_MESSAGE_SIZE};

#[derive(Debug)]
pub enum State {
    /// Not yet initialized
    NotInitialized,
    /// Handshake mode where codec is negotiating keys
    HandShake(Box<HandshakeRole>),
    /// Transport mode where AEAD is fully operational. The `TransportMode` object in this variant
    /// is able to perform encryption and decryption resp.
    Transport(Box<TransportMode>),
    /// Closed, all key material has been erased
    Closed,
}

#[derive(Debug)]
pub enum HandshakeRole {
    Initiator(Box<noise_bolt8::Initiator>),
    Responder(Box<noise_bolt8::Responder>),
}

impl HandshakeRole {
    /// Role of the side dialing `remote_static`.
    pub fn initiator(local_static: SecretKey, remote_static: PublicKey) -> Self {
        Self::Initiator(Initiator::new(local_static, remote_static))
    }

    /// Role of the side accepting a connection.
    pub fn responder(local_static: SecretKey) -> Self {
        Self::Responder(Responder::new(local_static))
    }

    fn expected_act_size(&self) -> Option<usize> {
        match self {
            Self::Initiator(i) => i.expected_act_size(),
            Self::Responder(r) => r.expected_act_size(),
        }
    }
}

/// Both directions of an established connection.
#[derive(Debug)]
pub struct TransportMode {
    encoder: NoiseEncoder,
    decoder: NoiseDecoder,
}

impl State {
    #[inline(always)]
    pub fn is_in_transport_mode(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    #[inline(always)]
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, Self::NotInitialized)
    }

    pub fn take(&mut self) -> Self {
        let mut new_me = Self::NotInitialized;
        core::mem::swap(&mut new_me, self);
        new_me
    }

    pub fn new() -> Self {
        Self::NotInitialized
    }

    pub fn initialize(inner: HandshakeRole) -> Self {
        Self::HandShake(Box::new(inner))
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of feeding handshake bytes.
#[derive(Debug, PartialEq, Eq)]
pub enum HandshakeStep {
    /// At least this many more bytes are needed for the next act.
    NeedMoreBytes(usize),
    /// Send these bytes to the peer, then keep feeding its answer.
    Send(Vec<u8>),
    /// The handshake is complete. The initiator still has to send act three.
    Ready(Option<Vec<u8>>),
}

/// A single BOLT 8 connection, from the first handshake byte to `close`.
#[derive(Debug)]
pub struct NoiseTransport {
    state: State,
    handshake_buffer: Vec<u8>,
    remote_static: Option<PublicKey>,
    max_message_size: usize,
}

impl Default for NoiseTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseTransport {
    pub fn new() -> Self {
        Self {
            state: State::new(),
            handshake_buffer: Vec::new(),
            remote_static: None,
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }

    /// Largest payload [`NoiseTransport::encrypt_message`] accepts, clamped to
    /// [`MAX_MESSAGE_SIZE`].
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size.min(MAX_MESSAGE_SIZE);
        self
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_in_transport_mode()
    }

    /// The peer's static public key: known from the start for an initiator, learned from act
    /// three for a responder.
    pub fn remote_static(&self) -> Option<PublicKey> {
        self.remote_static
    }

    /// Starts the handshake. An initiator gets act one to send, a responder is told how many
    /// bytes act one needs.
    pub fn start_handshake(&mut self, mut role: HandshakeRole) -> Result<HandshakeStep> {
        if !self.state.is_not_initialized() {
            return Err(Error::UnexpectedNoiseState);
        }
        let step = match &mut role {
            HandshakeRole::Initiator(initiator) => {
                self.remote_static = Some(initiator.remote_static());
                let act_one = initiator.step_0()?;
                debug!("act one ready");
                HandshakeStep::Send(act_one.to_vec())
            }
            HandshakeRole::Responder(responder) => {
                HandshakeStep::NeedMoreBytes(responder.expected_act_size().unwrap_or_default())
            }
        };
        self.state = State::initialize(role);
        Ok(step)
    }

    /// Consumes handshake bytes received from the peer.
    ///
    /// Bytes beyond the final act are handed over to the record decoder.
    pub fn feed_handshake_bytes(&mut self, bytes: &[u8]) -> Result<HandshakeStep> {
        let role = match &mut self.state {
            State::HandShake(role) => role,
            _ => return Err(Error::UnexpectedNoiseState),
        };
        self.handshake_buffer.extend_from_slice(bytes);
        let expected = role
            .expected_act_size()
            .ok_or(Error::Noise(noise_bolt8::Error::HandshakeAborted))?;
        if self.handshake_buffer.len() < expected {
            return Ok(HandshakeStep::NeedMoreBytes(
                expected - self.handshake_buffer.len(),
            ));
        }
        let act: Vec<u8> = self.handshake_buffer.drain(..expected).collect();

        let (codec, reply) = match role.as_mut() {
            HandshakeRole::Responder(responder) if expected == noise_bolt8::ACT_ONE_SIZE => {
                let act_two = responder.step_1(&act)?;
                debug!("act one received, act two ready");
                return Ok(HandshakeStep::Send(act_two.to_vec()));
            }
            HandshakeRole::Responder(responder) => {
                let (remote, codec) = responder.step_3(&act)?;
                debug!("act three received from {}", remote);
                self.remote_static = Some(remote);
                (codec, None)
            }
            HandshakeRole::Initiator(initiator) => {
                let (act_three, codec) = initiator.step_2(&act)?;
                debug!("act two received, act three ready");
                (codec, Some(act_three.to_vec()))
            }
        };

        let (encryptor, decryptor) = codec.into_split();
        let mut encoder = NoiseEncoder::new(encryptor);
        encoder.set_max_message_size(self.max_message_size);
        let mut decoder = NoiseDecoder::new(decryptor);
        decoder.feed(&self.handshake_buffer);
        self.handshake_buffer.clear();
        self.state = State::Transport(Box::new(TransportMode { encoder, decoder }));
        Ok(HandshakeStep::Ready(reply))
    }

    /// Encrypts `payload` into wire bytes.
    pub fn encrypt_message(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
        match &mut self.state {
            State::Transport(transport) => transport.encoder.encode(payload),
            _ => Err(Error::UnexpectedNoiseState),
        }
    }

    /// Buffers bytes received from the peer after the handshake.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<()> {
        match &mut self.state {
            State::Transport(transport) => {
                transport.decoder.feed(bytes);
                Ok(())
            }
            _ => Err(Error::UnexpectedNoiseState),
        }
    }

    /// Returns the next complete payload, or `None` if more bytes are needed.
    ///
    /// A failed record closes the transport: both directions are erased and later calls fail
    /// with [`Error::UnexpectedNoiseState`].
    pub fn decrypt_next_message(&mut self) -> Result<Option<Vec<u8>>> {
        let frame = match &mut self.state {
            State::Transport(transport) => transport.decoder.next_frame(),
            _ => return Err(Error::UnexpectedNoiseState),
        };
        match frame {
            Ok(payload) => Ok(Some(payload)),
            Err(Error::MissingBytes(_)) => Ok(None),
            Err(e) => {
                warn!("closing transport after a failed record: {}", e);
                self.close();
                Err(e)
            }
        }
    }

    /// Signals that the peer closed its side: fails if an act or a record was left incomplete.
    pub fn finish(&self) -> Result<()> {
        match &self.state {
            State::Transport(transport) => transport.decoder.finish(),
            State::HandShake(role) if !self.handshake_buffer.is_empty() => {
                Err(Error::TruncatedRecord {
                    expected: role.expected_act_size().unwrap_or_default(),
                    received: self.handshake_buffer.len(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Erases all key material. The transport can not be used afterwards.
    pub fn close(&mut self) {
        if let State::Transport(transport) = &mut self.state {
            transport.encoder.erase();
            transport.decoder.erase();
        }
        self.handshake_buffer.clear();
        self.state = State::Closed;
    }

    /// Splits an established transport into its sending and receiving halves.
    pub fn into_split(mut self) -> Result<(NoiseEncoder, NoiseDecoder)> {
        match self.state.take() {
            State::Transport(transport) => {
                let TransportMode { encoder, decoder } = *transport;
                Ok((encoder, decoder))
            }
            other => {
                self.state = other;
                Err(Error::UnexpectedNoiseState)
            }
        }
    }
}
