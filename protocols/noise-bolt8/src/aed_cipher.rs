// # AEAD Cipher
//
// Abstracts the encryption and decryption operations of the authenticated encryption with
// associated data (AEAD) cipher used by BOLT 8.
//
// BOLT 8 fixes the cipher to `ChaCha20-Poly1305` (IETF variant, 96-bit nonce, 128-bit tag). The
// [`AeadCipher`] trait keeps the handshake and the transport ciphers generic over the concrete
// implementation so that they can be exercised with alternative backends in tests.

use chacha20poly1305::{
    aead::{Buffer, Error as AeadError},
    AeadInPlace, ChaCha20Poly1305, KeyInit,
};

// Defines the interface for AEAD ciphers.
//
// Implementors encrypt and decrypt a [`Buffer`] in place. Encryption appends the 16-byte tag to
// the buffer, decryption verifies and strips it. A failed decryption leaves the buffer untouched.
pub trait AeadCipher {
    // Creates a new instance of the cipher from a 32-byte key.
    fn from_key(k: [u8; 32]) -> Self;

    // Encrypts `data` in place using the 12-byte `nonce` and associated data `ad`.
    fn encrypt<T: Buffer>(
        &mut self,
        nonce: &[u8; 12],
        ad: &[u8],
        data: &mut T,
    ) -> Result<(), AeadError>;

    // Decrypts `data` in place using the 12-byte `nonce` and associated data `ad`.
    fn decrypt<T: Buffer>(
        &mut self,
        nonce: &[u8; 12],
        ad: &[u8],
        data: &mut T,
    ) -> Result<(), AeadError>;
}

impl AeadCipher for ChaCha20Poly1305 {
    fn from_key(k: [u8; 32]) -> Self {
        ChaCha20Poly1305::new(&k.into())
    }

    fn encrypt<T: Buffer>(
        &mut self,
        nonce: &[u8; 12],
        ad: &[u8],
        data: &mut T,
    ) -> Result<(), AeadError> {
        self.encrypt_in_place(nonce.into(), ad, data)
    }

    fn decrypt<T: Buffer>(
        &mut self,
        nonce: &[u8; 12],
        ad: &[u8],
        data: &mut T,
    ) -> Result<(), AeadError> {
        self.decrypt_in_place(nonce.into(), ad, data)
    }
}
