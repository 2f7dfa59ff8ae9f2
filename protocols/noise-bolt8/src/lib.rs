//! Implements the BOLT 8 encrypted and authenticated transport
//! <https://github.com/lightning/bolts/blob/master/08-transport.md>
//!
//! Two parties run the three-act `Noise_XK_secp256k1_ChaChaPoly_SHA256` handshake:
//!
//! ```text
//! Initiator                                  Responder
//!     | --------- act one (50 bytes) ----------> |
//!     | <-------- act two (50 bytes) ----------- |
//!     | --------- act three (66 bytes) --------> |
//! ```
//!
//! The initiator must know the responder's static public key in advance; the responder learns the
//! initiator's static public key from act three. Both sides end with a [`NoiseCodec`] that frames
//! payloads of up to [`MAX_MESSAGE_SIZE`] bytes into length-prefixed records and rotates each
//! direction's key every [`REKEY_INTERVAL`] AEAD operations.

use cipher_state::Cipher;

mod aed_cipher;
mod cipher_state;
mod error;
mod handshake;
mod initiator;
pub mod primitives;
mod responder;
#[cfg(test)]
mod test;
mod transport;

/// Noise protocol name, hashed to seed both the handshake hash and the chaining key.
pub const PROTOCOL_NAME: &[u8] = b"Noise_XK_secp256k1_ChaChaPoly_SHA256";
/// Prologue mixed into the handshake hash before any act.
pub const PROLOGUE: &[u8] = b"lightning";
/// The only handshake version defined, carried as the first byte of every act.
pub const HANDSHAKE_VERSION: u8 = 0;

/// Size of a compressed secp256k1 public key.
pub const PUBLIC_KEY_SIZE: usize = 33;
/// Size of a Poly1305 authentication tag.
pub const MAC_SIZE: usize = 16;
/// Act one: version, ephemeral key, tag.
pub const ACT_ONE_SIZE: usize = 1 + PUBLIC_KEY_SIZE + MAC_SIZE;
/// Act two: version, ephemeral key, tag.
pub const ACT_TWO_SIZE: usize = 1 + PUBLIC_KEY_SIZE + MAC_SIZE;
/// Act three: version, encrypted static key, tag.
pub const ACT_THREE_SIZE: usize = 1 + PUBLIC_KEY_SIZE + MAC_SIZE + MAC_SIZE;

/// Plaintext size of a record length prefix.
pub const LENGTH_HEADER_SIZE: usize = 2;
/// Wire size of a record length prefix.
pub const ENCRYPTED_LENGTH_SIZE: usize = LENGTH_HEADER_SIZE + MAC_SIZE;
/// Largest payload a single record can carry.
pub const MAX_MESSAGE_SIZE: usize = u16::MAX as usize;
/// Number of AEAD operations after which a transport key is rotated.
pub const REKEY_INTERVAL: u64 = 1000;

/// Transport state of an established connection: one cipher per direction.
pub struct NoiseCodec {
    encryptor: Encryptor,
    decryptor: Decryptor,
}

impl std::fmt::Debug for NoiseCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseCodec").finish()
    }
}

impl NoiseCodec {
    // `sk` encrypts outgoing records, `rk` decrypts incoming ones. Both directions start from the
    // final handshake chaining key.
    pub(crate) fn from_handshake(sk: [u8; 32], rk: [u8; 32], ck: [u8; 32]) -> Self {
        Self {
            encryptor: Encryptor::new(Cipher::from_key_and_ck(sk, ck)),
            decryptor: Decryptor::new(Cipher::from_key_and_ck(rk, ck)),
        }
    }

    /// Encrypts `payload` into one record ready to be written to the wire.
    pub fn encrypt_message(&mut self, payload: &[u8]) -> Result<Vec<u8>, Error> {
        self.encryptor.encrypt_message(payload)
    }

    /// Decrypts the 18-byte encrypted length prefix of the next incoming record.
    pub fn decrypt_length(&mut self, header: &[u8]) -> Result<usize, Error> {
        self.decryptor.decrypt_length(header)
    }

    /// Decrypts the body of the record whose length was returned by
    /// [`NoiseCodec::decrypt_length`].
    pub fn decrypt_body(&mut self, body: &[u8]) -> Result<Vec<u8>, Error> {
        self.decryptor.decrypt_body(body)
    }

    /// Decrypts one complete incoming record.
    pub fn decrypt_message(&mut self, record: &[u8]) -> Result<Vec<u8>, Error> {
        self.decryptor.decrypt_message(record)
    }

    /// Splits the codec so that each direction can be driven independently.
    pub fn into_split(self) -> (Encryptor, Decryptor) {
        (self.encryptor, self.decryptor)
    }

    /// Erases the key material of both directions.
    pub fn erase(&mut self) {
        self.encryptor.erase();
        self.decryptor.erase();
    }

    #[cfg(test)]
    pub(crate) fn encryptor(&self) -> &Encryptor {
        &self.encryptor
    }

    #[cfg(test)]
    pub(crate) fn decryptor(&self) -> &Decryptor {
        &self.decryptor
    }
}

pub use error::{Act, AeadError, Error, Stage};
pub use initiator::Initiator;
pub use responder::Responder;
pub use transport::{Decryptor, Encryptor};
