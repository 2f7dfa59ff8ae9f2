// # Transport Records
//
// Frames application payloads into BOLT 8 records once the handshake is complete.
//
// Every record is two AEAD ciphertexts produced with consecutive nonces of the same cipher:
//
// | Field        | Size            | Content                                    |
// | ------------ | --------------- | ------------------------------------------ |
// | length       | 2 + 16 bytes    | big-endian `u16` payload length and tag    |
// | body         | len + 16 bytes  | payload and tag                            |
//
// [`Encryptor`] and [`Decryptor`] each own one direction of the connection and can be moved to
// different tasks.

use crate::{
    cipher_state::Cipher,
    error::{Error, Stage},
    ENCRYPTED_LENGTH_SIZE, LENGTH_HEADER_SIZE, MAC_SIZE, MAX_MESSAGE_SIZE,
};
use chacha20poly1305::ChaCha20Poly1305;

/// Sending half of an established connection.
#[derive(Debug)]
pub struct Encryptor {
    cipher: Cipher<ChaCha20Poly1305>,
}

/// Receiving half of an established connection.
#[derive(Debug)]
pub struct Decryptor {
    cipher: Cipher<ChaCha20Poly1305>,
}

impl Encryptor {
    pub(crate) fn new(cipher: Cipher<ChaCha20Poly1305>) -> Self {
        Self { cipher }
    }

    /// Encrypts `payload` into a full record: encrypted length followed by encrypted body.
    ///
    /// Payloads larger than [`MAX_MESSAGE_SIZE`] are rejected without consuming a nonce.
    pub fn encrypt_message(&mut self, payload: &[u8]) -> Result<Vec<u8>, Error> {
        if payload.len() > MAX_MESSAGE_SIZE {
            return Err(Error::MessageTooLarge(payload.len()));
        }
        let mut record = Vec::with_capacity(ENCRYPTED_LENGTH_SIZE + payload.len() + MAC_SIZE);
        record.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        self.cipher.encrypt_record(&mut record)?;

        let mut body = Vec::with_capacity(payload.len() + MAC_SIZE);
        body.extend_from_slice(payload);
        self.cipher.encrypt_record(&mut body)?;
        record.extend_from_slice(&body);
        Ok(record)
    }

    /// Number of encryptions performed with the current key.
    pub fn nonce(&self) -> u64 {
        self.cipher.nonce()
    }

    /// Erases the key material, any further use fails.
    pub fn erase(&mut self) {
        self.cipher.erase_k();
    }

    #[cfg(test)]
    pub(crate) fn key_material(&self) -> (Option<[u8; 32]>, [u8; 32]) {
        self.cipher.key_material()
    }
}

impl Decryptor {
    pub(crate) fn new(cipher: Cipher<ChaCha20Poly1305>) -> Self {
        Self { cipher }
    }

    /// Decrypts the 18-byte encrypted length prefix and returns the length of the body that
    /// follows, tag excluded.
    pub fn decrypt_length(&mut self, header: &[u8]) -> Result<usize, Error> {
        if header.len() != ENCRYPTED_LENGTH_SIZE {
            return Err(Error::InvalidMessageLength {
                expected: ENCRYPTED_LENGTH_SIZE,
                actual: header.len(),
            });
        }
        let mut length = header.to_vec();
        self.open(Stage::RecordLength, &mut length)?;
        let mut be = [0u8; LENGTH_HEADER_SIZE];
        be.copy_from_slice(&length);
        Ok(u16::from_be_bytes(be) as usize)
    }

    /// Decrypts a record body (payload followed by its tag) and returns the payload.
    pub fn decrypt_body(&mut self, body: &[u8]) -> Result<Vec<u8>, Error> {
        if body.len() < MAC_SIZE {
            return Err(Error::InvalidMessageLength {
                expected: MAC_SIZE,
                actual: body.len(),
            });
        }
        let mut payload = body.to_vec();
        self.open(Stage::RecordBody, &mut payload)?;
        Ok(payload)
    }

    /// Decrypts one complete record held in `record`.
    ///
    /// `record` must contain exactly the encrypted length followed by the encrypted body.
    pub fn decrypt_message(&mut self, record: &[u8]) -> Result<Vec<u8>, Error> {
        if record.len() < ENCRYPTED_LENGTH_SIZE {
            return Err(Error::InvalidMessageLength {
                expected: ENCRYPTED_LENGTH_SIZE,
                actual: record.len(),
            });
        }
        let (header, body) = record.split_at(ENCRYPTED_LENGTH_SIZE);
        let len = self.decrypt_length(header)?;
        if body.len() != len + MAC_SIZE {
            // The length prefix consumed a nonce, the stream cannot be resynchronized.
            self.erase();
            return Err(Error::InvalidMessageLength {
                expected: ENCRYPTED_LENGTH_SIZE + len + MAC_SIZE,
                actual: record.len(),
            });
        }
        self.decrypt_body(body)
    }

    /// Number of decryptions performed with the current key.
    pub fn nonce(&self) -> u64 {
        self.cipher.nonce()
    }

    /// Erases the key material, any further use fails.
    pub fn erase(&mut self) {
        self.cipher.erase_k();
    }

    /// Returns `true` once the key has been erased, either explicitly or after a failure.
    pub fn is_erased(&self) -> bool {
        self.cipher.is_erased()
    }

    // A failed decryption is terminal: the receiving key is erased and every later call fails
    // with `KeyErased`.
    fn open(&mut self, stage: Stage, data: &mut Vec<u8>) -> Result<(), Error> {
        self.cipher.decrypt_record(stage, data).map_err(|e| {
            self.cipher.erase_k();
            e
        })
    }

    #[cfg(test)]
    pub(crate) fn key_material(&self) -> (Option<[u8; 32]>, [u8; 32]) {
        self.cipher.key_material()
    }
}
