// # Handshake Operations
//
// Provides the symmetric state shared by both sides of the BOLT 8 `Noise_XK` handshake.
//
// [`HandshakeOp`] extends [`CipherState`] with the handshake hash `h` and the chaining key `ck`
// and implements the Noise `MixHash`, `MixKey`, `EncryptAndHash`, `DecryptAndHash` and `Split`
// operations on top of them. [`crate::Initiator`] and [`crate::Responder`] implement it and drive
// the three acts through these methods.

use crate::{
    aed_cipher::AeadCipher,
    cipher_state::CipherState,
    error::Error,
    primitives::{hkdf_2, sha256, sha256_concat},
    PROLOGUE, PROTOCOL_NAME,
};
use chacha20poly1305::ChaCha20Poly1305;
use secp256k1::PublicKey;

// Next act a handshake side expects to process.
//
// Any failure moves a side to `Aborted` for good, there is no way to resume a handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Progress {
    ActOne,
    ActTwo,
    ActThree,
    Complete,
    Aborted,
}

impl Progress {
    pub(crate) fn expect(self, step: Progress) -> Result<(), Error> {
        match self {
            s if s == step => Ok(()),
            Progress::Aborted => Err(Error::HandshakeAborted),
            _ => Err(Error::UnexpectedHandshakeMessage),
        }
    }
}

// Checks the size and the version byte of a received act.
pub(crate) fn check_act(
    message: &[u8],
    expected: usize,
    act: crate::error::Act,
) -> Result<(), Error> {
    if message.len() != expected {
        return Err(Error::InvalidMessageLength {
            expected,
            actual: message.len(),
        });
    }
    match message[0] {
        crate::HANDSHAKE_VERSION => Ok(()),
        version => Err(Error::UnsupportedVersion { act, version }),
    }
}

// Represents the operations needed during a BOLT 8 handshake.
pub trait HandshakeOp<Cipher: AeadCipher>: CipherState<Cipher> {
    // Returns the name of the entity implementing the handshake operation, used in traces.
    fn name(&self) -> String;

    fn get_h(&mut self) -> &mut [u8; 32];

    fn get_ck(&mut self) -> &mut [u8; 32];

    fn set_h(&mut self, data: [u8; 32]);

    fn set_ck(&mut self, data: [u8; 32]);

    // `h = SHA256(h || data)`
    fn mix_hash(&mut self, data: &[u8]) {
        let h = self.get_h();
        *h = sha256_concat(&h[..], data);
    }

    // `ck, temp_k = HKDF(ck, input_key_material)` and resets the nonce to zero.
    fn mix_key(&mut self, input_key_material: &[u8]) {
        let ck = self.get_ck();
        let (ck, temp_k) = hkdf_2(ck, input_key_material);
        self.set_ck(ck);
        self.initialize_key(temp_k);
    }

    // Encrypts `plaintext` in place with `h` as associated data, then mixes the ciphertext into
    // `h`. Without a key the plaintext is only hashed.
    fn encrypt_and_hash(&mut self, plaintext: &mut Vec<u8>) -> Result<(), Error> {
        if self.get_k().is_some() {
            let h = *self.get_h();
            self.encrypt_with_ad(&h, plaintext)?;
        };
        let ciphertext = plaintext;
        self.mix_hash(ciphertext);
        Ok(())
    }

    // Decrypts `ciphertext` in place with `h` as associated data, then mixes the received
    // ciphertext into `h`. On failure `h` is left unchanged.
    fn decrypt_and_hash(&mut self, ciphertext: &mut Vec<u8>) -> Result<(), Error> {
        let encrypted = ciphertext.clone();
        if self.get_k().is_some() {
            let h = *self.get_h();
            self.decrypt_with_ad(&h, ciphertext)?;
        };
        self.mix_hash(&encrypted);
        Ok(())
    }

    /// Prior to the first act both sides initialize `h` and `ck` from the protocol name, mix in
    /// the prologue and then the responder's static public key (the `<- s` pre-message of XK).
    fn initialize_self(&mut self, responder_static: &PublicKey) {
        let h = sha256(PROTOCOL_NAME);
        self.set_ck(h);
        self.set_h(h);
        self.mix_hash(PROLOGUE);
        self.mix_hash(&responder_static.serialize());
        self.set_k(None);
    }

    fn initialize_key(&mut self, key: [u8; 32]) {
        self.set_n(0);
        let cipher = ChaCha20Poly1305::from_key(key);
        self.set_handshake_cipher(cipher);
        self.set_k(Some(key));
    }

    // Derives the two transport keys from the final chaining key: the initiator sends with the
    // first one and the responder with the second.
    fn split(&mut self) -> ([u8; 32], [u8; 32]) {
        hkdf_2(self.get_ck(), &[])
    }

    fn set_handshake_cipher(&mut self, cipher: ChaCha20Poly1305);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::primitives::{ecdh, public_key};
    use quickcheck::TestResult;
    use secp256k1::SecretKey;

    // Bare symmetric state, without the act logic of `Initiator` and `Responder`.
    #[derive(Default)]
    struct Transcript {
        k: Option<[u8; 32]>,
        n: u64,
        cipher: Option<ChaCha20Poly1305>,
        h: [u8; 32],
        ck: [u8; 32],
    }

    impl CipherState<ChaCha20Poly1305> for Transcript {
        fn get_k(&mut self) -> &mut Option<[u8; 32]> {
            &mut self.k
        }
        fn set_k(&mut self, k: Option<[u8; 32]>) {
            self.k = k
        }
        fn get_n(&self) -> u64 {
            self.n
        }
        fn set_n(&mut self, n: u64) {
            self.n = n
        }
        fn get_cipher(&mut self) -> &mut Option<ChaCha20Poly1305> {
            &mut self.cipher
        }
    }

    impl HandshakeOp<ChaCha20Poly1305> for Transcript {
        fn name(&self) -> String {
            "Transcript".to_string()
        }
        fn get_h(&mut self) -> &mut [u8; 32] {
            &mut self.h
        }
        fn get_ck(&mut self) -> &mut [u8; 32] {
            &mut self.ck
        }
        fn set_h(&mut self, data: [u8; 32]) {
            self.h = data
        }
        fn set_ck(&mut self, data: [u8; 32]) {
            self.ck = data
        }
        fn set_handshake_cipher(&mut self, cipher: ChaCha20Poly1305) {
            self.cipher = Some(cipher)
        }
    }

    fn bytes_32(s: &str) -> [u8; 32] {
        let mut out = [0; 32];
        out.copy_from_slice(&hex::decode(s).unwrap());
        out
    }

    // State of both sides right before act one, for the responder key of the BOLT 8 vectors.
    fn vector_transcript() -> Transcript {
        let rs = public_key(&SecretKey::from_slice(&[0x21; 32]).unwrap());
        let mut transcript = Transcript::default();
        transcript.initialize_self(&rs);
        transcript
    }

    #[test]
    fn initial_state_matches_bolt8_vector() {
        let mut transcript = vector_transcript();
        assert_eq!(
            hex::encode(transcript.get_h()),
            "8401b3fdcaaa710b5405400536a3d5fd7792fe8e7fe29cd8b687216fe323ecbd"
        );
        assert_eq!(
            hex::encode(transcript.get_ck()),
            "2640f52eebcd9e882958951c794250eedb28002c05d7dc2ea0f195406042caf1"
        );
        assert!(transcript.get_k().is_none());
    }

    #[test]
    fn act_one_transcript_matches_bolt8_vector() {
        let mut transcript = vector_transcript();
        let e_pub =
            hex::decode("036360e856310ce5d294e8be33fc807077dc56ac80d95d9cd4ddbd21325eff73f7")
                .unwrap();
        transcript.mix_hash(&e_pub);
        transcript.mix_key(&bytes_32(
            "1e2fb3c8fe8fb9f262f649f64d26ecf0f2c0a805a767cf02dc2d77a6ef1fdcc3",
        ));
        assert_eq!(
            *transcript.get_ck(),
            bytes_32("b61ec1191326fa240decc9564369dbb3ae2b34341d1e11ad64ed89f89180582f")
        );
        assert_eq!(
            transcript.get_k().unwrap(),
            bytes_32("e68f69b7f096d7917245f5e5cf8ae1595febe4d4644333c99f9c4a1282031c9f")
        );

        let mut tag = vec![];
        transcript.encrypt_and_hash(&mut tag).unwrap();
        assert_eq!(hex::encode(&tag), "0df6086551151f58b8afe6c195782c6a");
    }

    #[test]
    fn mix_key_resets_the_nonce() {
        let mut transcript = vector_transcript();
        transcript.mix_key(&[7; 32]);
        let mut sealed = vec![1, 2, 3];
        transcript.encrypt_and_hash(&mut sealed).unwrap();
        assert_eq!(transcript.get_n(), 1);

        transcript.mix_key(&[8; 32]);
        assert_eq!(transcript.get_n(), 0);
    }

    #[test]
    fn hash_only_without_key() {
        let mut transcript = vector_transcript();
        let before = *transcript.get_h();
        let mut data = vec![4, 5, 6];
        transcript.encrypt_and_hash(&mut data).unwrap();
        assert_eq!(data, vec![4, 5, 6]);
        assert_eq!(*transcript.get_h(), sha256_concat(&before, &[4, 5, 6]));
    }

    #[test]
    fn both_sides_keep_the_same_transcript() {
        let mut sender = vector_transcript();
        let mut receiver = vector_transcript();
        sender.mix_key(&[9; 32]);
        receiver.mix_key(&[9; 32]);

        let static_key = public_key(&SecretKey::from_slice(&[0x11; 32]).unwrap()).serialize();
        let mut sealed = static_key.to_vec();
        sender.encrypt_and_hash(&mut sealed).unwrap();
        assert_eq!(sealed.len(), static_key.len() + 16);

        receiver.decrypt_and_hash(&mut sealed).unwrap();
        assert_eq!(sealed, static_key);
        assert_eq!(sender.get_h(), receiver.get_h());
    }

    #[test]
    fn failed_decrypt_leaves_hash_untouched() {
        let mut sender = vector_transcript();
        let mut receiver = vector_transcript();
        sender.initialize_key([1; 32]);
        receiver.initialize_key([2; 32]);

        let mut sealed = vec![];
        sender.encrypt_and_hash(&mut sealed).unwrap();
        let before = *receiver.get_h();
        assert!(receiver.decrypt_and_hash(&mut sealed).is_err());
        assert_eq!(*receiver.get_h(), before);
        assert_eq!(receiver.get_n(), 0);
    }

    #[test]
    fn split_yields_distinct_keys() {
        let mut transcript = vector_transcript();
        transcript.mix_key(&[3; 32]);
        let (k_a, k_b) = transcript.split();
        assert_ne!(k_a, k_b);
        assert_eq!((k_a, k_b), hkdf_2(transcript.get_ck(), &[]));
    }

    #[quickcheck_macros::quickcheck]
    fn ecdh_is_symmetric(seed_1: Vec<u8>, seed_2: Vec<u8>) -> TestResult {
        let (sk_1, sk_2) = match (
            SecretKey::from_slice(&sha256(&seed_1)),
            SecretKey::from_slice(&sha256(&seed_2)),
        ) {
            (Ok(sk_1), Ok(sk_2)) => (sk_1, sk_2),
            _ => return TestResult::discard(),
        };
        TestResult::from_bool(ecdh(&sk_1, &public_key(&sk_2)) == ecdh(&sk_2, &public_key(&sk_1)))
    }
}
