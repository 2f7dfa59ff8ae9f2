use noise_bolt8::{Decryptor, Error as NoiseError, ENCRYPTED_LENGTH_SIZE, MAC_SIZE};
use tracing::trace;

use crate::{Error, Result};

/// Incremental reader of BOLT 8 records.
///
/// Bytes are appended with [`NoiseDecoder::feed`] (or written into [`NoiseDecoder::writable`])
/// in chunks of any size. [`NoiseDecoder::next_frame`] returns one payload at a time, or
/// [`Error::MissingBytes`] with the number of bytes needed to make progress. The length prefix of
/// a record is decrypted exactly once even when the body arrives over several calls.
#[derive(Debug)]
pub struct NoiseDecoder {
    decryptor: Decryptor,
    buffer: Vec<u8>,
    // Body length (tag included) of the record being read, once its prefix has been decrypted
    body_len: Option<usize>,
}

impl NoiseDecoder {
    pub fn new(decryptor: Decryptor) -> Self {
        Self {
            decryptor,
            buffer: Vec::with_capacity(ENCRYPTED_LENGTH_SIZE),
            body_len: None,
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Number of bytes required before [`NoiseDecoder::next_frame`] can make progress.
    pub fn missing_bytes(&self) -> usize {
        let needed = self.body_len.unwrap_or(ENCRYPTED_LENGTH_SIZE);
        needed.saturating_sub(self.buffer.len())
    }

    /// Grows the buffer by exactly the number of missing bytes and returns the new region, to be
    /// filled completely by the caller (e.g. with `read_exact`).
    #[inline]
    pub fn writable(&mut self) -> &mut [u8] {
        let start = self.buffer.len();
        self.buffer.resize(start + self.missing_bytes(), 0);
        &mut self.buffer[start..]
    }

    /// Decodes the next record from the buffered bytes.
    ///
    /// Any error other than [`Error::MissingBytes`] erases the receiving key and drops the
    /// buffered bytes, every later call fails with `KeyErased`.
    #[inline]
    pub fn next_frame(&mut self) -> Result<Vec<u8>> {
        if self.decryptor.is_erased() {
            return Err(Error::Noise(NoiseError::KeyErased));
        }
        match self.decode() {
            Err(e) if e.is_fatal() => {
                self.erase();
                Err(e)
            }
            frame => frame,
        }
    }

    fn decode(&mut self) -> Result<Vec<u8>> {
        let body_len = match self.body_len {
            Some(len) => len,
            None => {
                if self.buffer.len() < ENCRYPTED_LENGTH_SIZE {
                    return Err(Error::MissingBytes(self.missing_bytes()));
                }
                let header: Vec<u8> = self.buffer.drain(..ENCRYPTED_LENGTH_SIZE).collect();
                let len = self.decryptor.decrypt_length(&header)? + MAC_SIZE;
                trace!("record of {} bytes announced", len - MAC_SIZE);
                self.body_len = Some(len);
                len
            }
        };
        if self.buffer.len() < body_len {
            return Err(Error::MissingBytes(self.missing_bytes()));
        }
        let body: Vec<u8> = self.buffer.drain(..body_len).collect();
        self.body_len = None;
        Ok(self.decryptor.decrypt_body(&body)?)
    }

    /// Called when the input has ended: fails with [`Error::TruncatedRecord`] if a record was
    /// left incomplete.
    pub fn finish(&self) -> Result<()> {
        if self.buffer.is_empty() && self.body_len.is_none() {
            return Ok(());
        }
        let expected = match self.body_len {
            Some(len) => ENCRYPTED_LENGTH_SIZE + len,
            None => ENCRYPTED_LENGTH_SIZE,
        };
        let received = match self.body_len {
            Some(_) => ENCRYPTED_LENGTH_SIZE + self.buffer.len(),
            None => self.buffer.len(),
        };
        Err(Error::TruncatedRecord { expected, received })
    }

    /// Number of buffered bytes not yet consumed by a complete record.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn erase(&mut self) {
        self.decryptor.erase();
        self.buffer.clear();
        self.body_len = None;
    }
}
