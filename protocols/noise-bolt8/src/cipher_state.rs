// # Cipher State Management
//
// Defines the [`CipherState`] trait and the [`Cipher`] struct, which manage the state of the AEAD
// cipher used in the BOLT 8 handshake and transport.
//
// The [`CipherState`] trait abstracts the management of the core elements of an AEAD cipher:
// - the 32-byte encryption key `k`,
// - the 64-bit nonce counter `n`, incremented after every successful operation,
// - the cipher instance derived from `k`.
//
// It is implemented by [`crate::Initiator`] and [`crate::Responder`], which use it for the
// temporary keys of the three handshake acts, and by [`Cipher`], which is the per-direction
// transport state returned once the handshake completes.
//
// A [`Cipher`] additionally carries the chaining key it was derived from and rotates its key every
// [`crate::REKEY_INTERVAL`] operations: `ck', k' = HKDF(ck, k)`, `n = 0`. The sending and the
// receiving cipher of a connection rotate independently.

use core::ptr;

use crate::{
    aed_cipher::AeadCipher,
    error::{Error, Stage},
    primitives::hkdf_2,
    REKEY_INTERVAL,
};
use chacha20poly1305::aead::Buffer;
use tracing::trace;

// Manages an AEAD cipher together with its key and nonce.
//
// `encrypt_with_ad` and `decrypt_with_ad` use the current nonce and advance it by one only when
// the operation succeeds, so a failed decryption never consumes a nonce. When no key has been set
// both operations are a no-op, as required by the Noise `EncryptAndHash` / `DecryptAndHash`
// definitions.
pub trait CipherState<Cipher_: AeadCipher>
where
    Self: Sized,
{
    fn get_k(&mut self) -> &mut Option<[u8; 32]>;

    fn set_k(&mut self, k: Option<[u8; 32]>);

    fn get_n(&self) -> u64;

    fn set_n(&mut self, n: u64);

    fn get_cipher(&mut self) -> &mut Option<Cipher_>;

    // Encodes the nonce as 32 bits of zeros followed by the little-endian 64-bit counter.
    fn nonce_to_bytes(&self) -> [u8; 12] {
        let mut res = [0u8; 12];
        res[4..].copy_from_slice(&self.get_n().to_le_bytes());
        res
    }

    fn encrypt_with_ad<T: Buffer>(&mut self, ad: &[u8], data: &mut T) -> Result<(), Error> {
        if self.get_n() == u64::MAX {
            return Err(Error::NonceExhausted);
        }
        let n = self.nonce_to_bytes();
        match self.get_cipher() {
            Some(c) => {
                c.encrypt(&n, ad, data)?;
                self.set_n(self.get_n() + 1);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn decrypt_with_ad<T: Buffer>(&mut self, ad: &[u8], data: &mut T) -> Result<(), Error> {
        if self.get_n() == u64::MAX {
            return Err(Error::NonceExhausted);
        }
        let n = self.nonce_to_bytes();
        match self.get_cipher() {
            Some(c) => {
                c.decrypt(&n, ad, data)?;
                self.set_n(self.get_n() + 1);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// One direction of an established BOLT 8 connection.
pub struct Cipher<C: AeadCipher> {
    k: Option<[u8; 32]>,
    n: u64,
    // Chaining key, seed of the next key rotation
    ck: [u8; 32],
    cipher: Option<C>,
}

impl<C: AeadCipher> core::fmt::Debug for Cipher<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Cipher").field("n", &self.n).finish()
    }
}

impl<C: AeadCipher> Cipher<C> {
    /// Creates a transport cipher from the key produced by the handshake split and the final
    /// handshake chaining key.
    pub fn from_key_and_ck(k: [u8; 32], ck: [u8; 32]) -> Self {
        Self {
            k: Some(k),
            n: 0,
            ck,
            cipher: Some(C::from_key(k)),
        }
    }

    /// Current nonce counter of this direction.
    pub fn nonce(&self) -> u64 {
        self.n
    }

    pub fn is_erased(&self) -> bool {
        self.cipher.is_none()
    }

    /// Encrypts one record (ad is empty), rotating the key first if it has been used
    /// [`REKEY_INTERVAL`] times.
    pub fn encrypt_record<T: Buffer>(&mut self, data: &mut T) -> Result<(), Error> {
        self.ensure_keyed()?;
        self.rotate_if_due()?;
        self.encrypt_with_ad(&[], data)
    }

    /// Decrypts one record (ad is empty), rotating the key first if it has been used
    /// [`REKEY_INTERVAL`] times. A bad tag is reported as `AuthenticationFailed(stage)`.
    pub fn decrypt_record<T: Buffer>(&mut self, stage: Stage, data: &mut T) -> Result<(), Error> {
        self.ensure_keyed()?;
        self.rotate_if_due()?;
        self.decrypt_with_ad(&[], data).map_err(|e| e.in_stage(stage))
    }

    // Unlike the handshake, a transport cipher never falls back to plaintext.
    fn ensure_keyed(&self) -> Result<(), Error> {
        match self.cipher {
            Some(_) => Ok(()),
            None => Err(Error::KeyErased),
        }
    }

    fn rotate_if_due(&mut self) -> Result<(), Error> {
        if self.n == REKEY_INTERVAL {
            self.rekey()?;
        }
        Ok(())
    }

    fn rekey(&mut self) -> Result<(), Error> {
        let k = self.k.ok_or(Error::KeyErased)?;
        let (ck, k) = hkdf_2(&self.ck, &k);
        self.erase_k();
        self.ck = ck;
        self.k = Some(k);
        self.cipher = Some(C::from_key(k));
        self.n = 0;
        trace!("transport key rotated");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn key_material(&self) -> (Option<[u8; 32]>, [u8; 32]) {
        (self.k, self.ck)
    }

    /// Overwrites the key and chaining key and drops the cipher, leaving the state unusable.
    pub fn erase_k(&mut self) {
        if let Some(k) = self.k.as_mut() {
            for b in k.iter_mut() {
                unsafe { ptr::write_volatile(b, 0) };
            }
        }
        self.k = None;
        for b in self.ck.iter_mut() {
            unsafe { ptr::write_volatile(b, 0) };
        }
        self.cipher = None;
    }
}

impl<C: AeadCipher> Drop for Cipher<C> {
    fn drop(&mut self) {
        self.erase_k();
    }
}

impl<C: AeadCipher> CipherState<C> for Cipher<C> {
    fn get_k(&mut self) -> &mut Option<[u8; 32]> {
        &mut self.k
    }
    fn get_n(&self) -> u64 {
        self.n
    }
    fn set_n(&mut self, n: u64) {
        self.n = n;
    }
    fn get_cipher(&mut self) -> &mut Option<C> {
        &mut self.cipher
    }

    fn set_k(&mut self, k: Option<[u8; 32]>) {
        self.k = k;
    }
}
