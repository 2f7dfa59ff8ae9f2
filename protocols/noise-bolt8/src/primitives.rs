// # Primitive Adapters
//
// Thin wrappers over the hashing, key derivation and Diffie-Hellman primitives used by the BOLT 8
// handshake and by the rekeying transport ciphers.
//
// - `sha256` and `sha256_concat`: SHA-256 over one or two byte slices.
// - `hmac_sha256`: HMAC-SHA256 keyed with a 32-byte chaining key.
// - `hkdf_2`: two-output HKDF (RFC 5869 extract followed by two expand rounds) used by both
//   `MixKey` during the handshake and by the key rotation of a [`crate::cipher_state::Cipher`].
// - `ecdh`: secp256k1 point multiplication followed by SHA-256 of the compressed shared point.
//   This is the exact convention mandated by BOLT 8 and is what [`SharedSecret`] computes.

use secp256k1::{
    ecdh::SharedSecret,
    hashes::{sha256::Hash as Sha256Hash, Hash, HashEngine, Hmac, HmacEngine},
    rand, PublicKey, Secp256k1, SecretKey,
};

/// Size in bytes of every key, chaining key and handshake hash handled by this crate.
pub const HASH_LEN: usize = 32;

pub(crate) fn sha256(data: &[u8]) -> [u8; HASH_LEN] {
    Sha256Hash::hash(data).to_byte_array()
}

pub(crate) fn sha256_concat(a: &[u8], b: &[u8]) -> [u8; HASH_LEN] {
    let mut engine = Sha256Hash::engine();
    engine.input(a);
    engine.input(b);
    Sha256Hash::from_engine(engine).to_byte_array()
}

pub(crate) fn hmac_sha256(key: &[u8; HASH_LEN], parts: &[&[u8]]) -> [u8; HASH_LEN] {
    let mut engine = HmacEngine::<Sha256Hash>::new(&key[..]);
    for part in parts {
        engine.input(part);
    }
    Hmac::<Sha256Hash>::from_engine(engine).to_byte_array()
}

/// Derives two 32-byte outputs from `chaining_key` and `input_key_material`.
///
/// `temp_key = HMAC(ck, ikm)`, `out_1 = HMAC(temp_key, 0x01)`, `out_2 = HMAC(temp_key, out_1 || 0x02)`.
pub fn hkdf_2(
    chaining_key: &[u8; HASH_LEN],
    input_key_material: &[u8],
) -> ([u8; HASH_LEN], [u8; HASH_LEN]) {
    let temp_key = hmac_sha256(chaining_key, &[input_key_material]);
    let out_1 = hmac_sha256(&temp_key, &[&[0x1]]);
    let out_2 = hmac_sha256(&temp_key, &[&out_1[..], &[0x2]]);
    (out_1, out_2)
}

/// Computes the BOLT 8 ECDH shared secret: `SHA256(compressed(private * public))`.
pub fn ecdh(private: &SecretKey, public: &PublicKey) -> [u8; HASH_LEN] {
    SharedSecret::new(public, private).secret_bytes()
}

/// Generates a fresh secp256k1 secret key from the thread-local CSPRNG.
pub fn generate_key() -> SecretKey {
    SecretKey::new(&mut rand::thread_rng())
}

/// Computes the compressed public key of `secret`.
pub fn public_key(secret: &SecretKey) -> PublicKey {
    let secp = Secp256k1::signing_only();
    PublicKey::from_secret_key(&secp, secret)
}
