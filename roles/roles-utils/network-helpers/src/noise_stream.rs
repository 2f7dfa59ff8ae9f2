//! A BOLT 8 encrypted wrapper around a `TcpStream`, providing message-based read/write I/O.
//!
//! `NoiseTcpStream` performs the three-act handshake for the provided [`HandshakeRole`] while it
//! is constructed. It can then be split into a `NoiseTcpReadHalf` and a `NoiseTcpWriteHalf`, each
//! owning one direction of the record layer.
//!
//! Timeouts are left to the caller: wrap [`NoiseTcpStream::new`] in `tokio::time::timeout`.
//! Dropping the future mid-handshake drops, and so erases, all handshake secrets.

use crate::Error;
use codec_bolt8::{
    noise_bolt8::ACT_THREE_SIZE, HandshakeRole, HandshakeStep, NoiseDecoder, NoiseEncoder,
    NoiseTransport, MAX_MESSAGE_SIZE,
};
use secp256k1::PublicKey;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
};
use tracing::{debug, error};

const READ_BUFFER_SIZE: usize = 8192;

/// An encrypted and authenticated duplex stream over TCP.
#[derive(Debug)]
pub struct NoiseTcpStream {
    reader: NoiseTcpReadHalf,
    writer: NoiseTcpWriteHalf,
    remote_static: PublicKey,
}

/// The reading half of a `NoiseTcpStream`.
///
/// It buffers incoming encrypted bytes and decodes one record at a time.
pub struct NoiseTcpReadHalf {
    reader: OwnedReadHalf,
    decoder: NoiseDecoder,
    buffer: Box<[u8]>,
}

/// The writing half of a `NoiseTcpStream`.
#[derive(Debug)]
pub struct NoiseTcpWriteHalf {
    writer: OwnedWriteHalf,
    encoder: NoiseEncoder,
}

impl std::fmt::Debug for NoiseTcpReadHalf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseTcpReadHalf")
            .field("reader", &self.reader)
            .field("decoder", &self.decoder)
            .finish()
    }
}

impl NoiseTcpStream {
    /// Constructs a new `NoiseTcpStream` over the given TCP stream, performing the handshake in
    /// the given `role`.
    pub async fn new(stream: TcpStream, role: HandshakeRole) -> Result<Self, Error> {
        Self::with_max_message_size(stream, role, MAX_MESSAGE_SIZE).await
    }

    /// Same as [`NoiseTcpStream::new`], with a lower limit on outgoing payloads.
    pub async fn with_max_message_size(
        stream: TcpStream,
        role: HandshakeRole,
        max_message_size: usize,
    ) -> Result<Self, Error> {
        let (mut reader, mut writer) = stream.into_split();
        let mut transport = NoiseTransport::new().with_max_message_size(max_message_size);
        let mut buffer = [0u8; ACT_THREE_SIZE];

        let mut step = transport.start_handshake(role)?;
        loop {
            step = match step {
                HandshakeStep::Send(act) => {
                    writer.write_all(&act).await?;
                    debug!("Handshake act sent");
                    read_handshake(&mut reader, &mut transport, &mut buffer).await?
                }
                HandshakeStep::NeedMoreBytes(_) => {
                    read_handshake(&mut reader, &mut transport, &mut buffer).await?
                }
                HandshakeStep::Ready(act_three) => {
                    if let Some(act_three) = act_three {
                        writer.write_all(&act_three).await?;
                        debug!("Act three sent");
                    }
                    break;
                }
            };
        }

        let remote_static = transport
            .remote_static()
            .ok_or(Error::CodecError(codec_bolt8::Error::UnexpectedNoiseState))?;
        let (encoder, decoder) = transport.into_split()?;
        debug!("Handshake complete with {}", remote_static);
        Ok(Self {
            reader: NoiseTcpReadHalf {
                reader,
                decoder,
                buffer: vec![0; READ_BUFFER_SIZE].into_boxed_slice(),
            },
            writer: NoiseTcpWriteHalf { writer, encoder },
            remote_static,
        })
    }

    /// Node id of the peer, authenticated by the handshake.
    pub fn remote_static(&self) -> PublicKey {
        self.remote_static
    }

    /// Consumes the stream and returns its reader and writer halves.
    pub fn into_split(self) -> (NoiseTcpReadHalf, NoiseTcpWriteHalf) {
        (self.reader, self.writer)
    }
}

async fn read_handshake(
    reader: &mut OwnedReadHalf,
    transport: &mut NoiseTransport,
    buffer: &mut [u8],
) -> Result<HandshakeStep, Error> {
    let n = reader.read(buffer).await?;
    if n == 0 {
        transport.finish()?;
        return Err(Error::SocketClosed);
    }
    transport.feed_handshake_bytes(&buffer[..n]).map_err(|e| {
        error!("Handshake failed: {}", e);
        Error::CodecError(e)
    })
}

impl NoiseTcpWriteHalf {
    /// Encrypts `payload` into one record and writes it to the socket.
    ///
    /// Not cancellation-safe: a canceled write may leave a partial record on the wire.
    pub async fn write_frame(&mut self, payload: &[u8]) -> Result<(), Error> {
        let record = self.encoder.encode(payload)?;
        self.writer.write_all(&record).await?;
        Ok(())
    }

    /// Erases the sending key and shuts down the writing half of the socket.
    pub async fn shutdown(&mut self) -> Result<(), Error> {
        self.encoder.erase();
        self.writer.shutdown().await?;
        Ok(())
    }
}

impl NoiseTcpReadHalf {
    /// Reads and decrypts the next payload.
    ///
    /// Cancellation-safe: bytes are handed to the decoder as soon as a read completes, so a
    /// canceled call loses nothing and the next call resumes the same record.
    ///
    /// A clean end of stream between records is reported as [`Error::SocketClosed`], an end of
    /// stream inside a record as a `TruncatedRecord` codec error.
    pub async fn read_frame(&mut self) -> Result<Vec<u8>, Error> {
        loop {
            if let Some(payload) = self.poll_decoder()? {
                return Ok(payload);
            }
            let n = self.reader.read(&mut self.buffer).await?;
            self.on_read(n)?;
        }
    }

    /// Attempts to read and decrypt a payload without blocking.
    ///
    /// Returns `Ok(None)` if the socket has no more bytes available yet.
    pub fn try_read_frame(&mut self) -> Result<Option<Vec<u8>>, Error> {
        loop {
            if let Some(payload) = self.poll_decoder()? {
                return Ok(Some(payload));
            }
            match self.reader.try_read(&mut self.buffer) {
                Ok(n) => self.on_read(n)?,
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(None),
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn poll_decoder(&mut self) -> Result<Option<Vec<u8>>, Error> {
        match self.decoder.next_frame() {
            Ok(payload) => Ok(Some(payload)),
            Err(codec_bolt8::Error::MissingBytes(_)) => Ok(None),
            Err(e) => {
                self.decoder.erase();
                Err(Error::CodecError(e))
            }
        }
    }

    fn on_read(&mut self, n: usize) -> Result<(), Error> {
        if n == 0 {
            self.decoder.finish()?;
            return Err(Error::SocketClosed);
        }
        self.decoder.feed(&self.buffer[..n]);
        Ok(())
    }
}
