use noise_bolt8::{Encryptor, MAX_MESSAGE_SIZE};

use crate::{Error, Result};

/// Turns payloads into encrypted BOLT 8 records.
#[derive(Debug)]
pub struct NoiseEncoder {
    encryptor: Encryptor,
    max_message_size: usize,
}

impl NoiseEncoder {
    pub fn new(encryptor: Encryptor) -> Self {
        Self {
            encryptor,
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }

    /// Lowers the largest accepted payload. Values above [`MAX_MESSAGE_SIZE`] are clamped.
    pub fn set_max_message_size(&mut self, size: usize) {
        self.max_message_size = size.min(MAX_MESSAGE_SIZE);
    }

    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    #[inline]
    pub fn encode(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
        if payload.len() > self.max_message_size {
            return Err(Error::MessageTooLarge(payload.len()));
        }
        Ok(self.encryptor.encrypt_message(payload)?)
    }

    pub fn erase(&mut self) {
        self.encryptor.erase();
    }
}
