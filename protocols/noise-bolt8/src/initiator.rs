use std::ptr;

use crate::{
    cipher_state::CipherState,
    error::{Act, Error, Stage},
    handshake::{check_act, HandshakeOp, Progress},
    primitives::{ecdh, generate_key, public_key},
    NoiseCodec, ACT_ONE_SIZE, ACT_THREE_SIZE, ACT_TWO_SIZE, HANDSHAKE_VERSION, PUBLIC_KEY_SIZE,
};
use chacha20poly1305::ChaCha20Poly1305;
use secp256k1::{PublicKey, SecretKey};
use tracing::debug;

/// The side of a BOLT 8 handshake that opens the connection.
///
/// The initiator must know the responder's static public key (its node id) beforehand. It sends
/// act one, processes act two and sends act three, after which both sides hold a [`NoiseCodec`].
pub struct Initiator {
    handshake_cipher: Option<ChaCha20Poly1305>,
    k: Option<[u8; 32]>,
    n: u64,
    // Chaining key
    ck: [u8; 32],
    // Handshake hash
    h: [u8; 32],
    // local static key
    s: SecretKey,
    // ephemeral key
    e: SecretKey,
    // responder static pub key
    rs: PublicKey,
    progress: Progress,
}

impl std::fmt::Debug for Initiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Initiator")
            .field("progress", &self.progress)
            .finish()
    }
}

impl CipherState<ChaCha20Poly1305> for Initiator {
    fn get_k(&mut self) -> &mut Option<[u8; 32]> {
        &mut self.k
    }
    fn get_n(&self) -> u64 {
        self.n
    }
    fn set_n(&mut self, n: u64) {
        self.n = n;
    }
    fn get_cipher(&mut self) -> &mut Option<ChaCha20Poly1305> {
        &mut self.handshake_cipher
    }

    fn set_k(&mut self, k: Option<[u8; 32]>) {
        self.k = k;
    }
}

impl HandshakeOp<ChaCha20Poly1305> for Initiator {
    fn name(&self) -> String {
        "Initiator".to_string()
    }
    fn get_h(&mut self) -> &mut [u8; 32] {
        &mut self.h
    }

    fn get_ck(&mut self) -> &mut [u8; 32] {
        &mut self.ck
    }

    fn set_h(&mut self, data: [u8; 32]) {
        self.h = data;
    }

    fn set_ck(&mut self, data: [u8; 32]) {
        self.ck = data;
    }

    fn set_handshake_cipher(&mut self, cipher: ChaCha20Poly1305) {
        self.handshake_cipher = Some(cipher);
    }
}

impl Initiator {
    /// Builds an initiator from a raw 32-byte static secret and the responder's raw 33-byte
    /// compressed public key.
    pub fn from_raw_k(
        static_secret: [u8; 32],
        responder_static: [u8; PUBLIC_KEY_SIZE],
    ) -> Result<Box<Self>, Error> {
        let s = SecretKey::from_slice(&static_secret).map_err(|_| Error::InvalidRawPrivateKey)?;
        let rs =
            PublicKey::from_slice(&responder_static).map_err(|_| Error::InvalidRawPublicKey)?;
        Ok(Self::new(s, rs))
    }

    /// Creates an initiator with a freshly generated ephemeral key.
    pub fn new(s: SecretKey, rs: PublicKey) -> Box<Self> {
        Self::with_ephemeral(s, generate_key(), rs)
    }

    /// Creates an initiator with a caller supplied ephemeral key.
    ///
    /// Reusing an ephemeral key across handshakes breaks forward secrecy, this exists for
    /// deterministic tests.
    pub fn with_ephemeral(s: SecretKey, e: SecretKey, rs: PublicKey) -> Box<Self> {
        let mut self_ = Self {
            handshake_cipher: None,
            k: None,
            n: 0,
            ck: [0; 32],
            h: [0; 32],
            s,
            e,
            rs,
            progress: Progress::ActOne,
        };
        self_.initialize_self(&rs);
        Box::new(self_)
    }

    /// Static public key of the responder.
    pub fn remote_static(&self) -> PublicKey {
        self.rs
    }

    /// Size of the next act this side has to receive, `None` when it is not waiting for one.
    pub fn expected_act_size(&self) -> Option<usize> {
        match self.progress {
            Progress::ActTwo => Some(ACT_TWO_SIZE),
            _ => None,
        }
    }

    /// Produces act one: `0x00 || e.pub || tag`.
    ///
    /// 1. `h = SHA256(h || e.pub)`
    /// 2. `es = ECDH(e.priv, rs)`
    /// 3. `ck, temp_k1 = HKDF(ck, es)`
    /// 4. `c = encryptWithAD(temp_k1, 0, h, "")`
    /// 5. `h = SHA256(h || c)`
    ///
    /// Message length: 50 bytes
    pub fn step_0(&mut self) -> Result<[u8; ACT_ONE_SIZE], Error> {
        self.progress.expect(Progress::ActOne)?;
        let res = self.act_one();
        self.advance(&res, Progress::ActTwo);
        res
    }

    /// Processes act two and produces act three: `0x00 || c || t`.
    ///
    /// Act two handling:
    /// 1. checks the version byte and parses `re`
    /// 2. `h = SHA256(h || re)`
    /// 3. `ee = ECDH(e.priv, re)`, `ck, temp_k2 = HKDF(ck, ee)`
    /// 4. verifies the tag with `decryptWithAD(temp_k2, 0, h, c)`, `h = SHA256(h || c)`
    ///
    /// Act three:
    /// 1. `c = encryptWithAD(temp_k2, 1, h, s.pub)`, `h = SHA256(h || c)`
    /// 2. `se = ECDH(s.priv, re)`, `ck, temp_k3 = HKDF(ck, se)`
    /// 3. `t = encryptWithAD(temp_k3, 0, h, "")`
    /// 4. `sk, rk = HKDF(ck, "")`
    ///
    /// Message length: 66 bytes
    pub fn step_2(&mut self, message: &[u8]) -> Result<([u8; ACT_THREE_SIZE], NoiseCodec), Error> {
        self.progress.expect(Progress::ActTwo)?;
        let res = self.act_two_and_three(message);
        self.advance(&res, Progress::Complete);
        res
    }

    fn act_one(&mut self) -> Result<[u8; ACT_ONE_SIZE], Error> {
        let e_pub = public_key(&self.e).serialize();
        self.mix_hash(&e_pub);
        let es = ecdh(&self.e, &self.rs);
        self.mix_key(&es);
        let mut tag = vec![];
        self.encrypt_and_hash(&mut tag)?;

        let mut message = [0u8; ACT_ONE_SIZE];
        message[0] = HANDSHAKE_VERSION;
        message[1..1 + PUBLIC_KEY_SIZE].copy_from_slice(&e_pub);
        message[1 + PUBLIC_KEY_SIZE..].copy_from_slice(&tag);
        Ok(message)
    }

    fn act_two_and_three(
        &mut self,
        message: &[u8],
    ) -> Result<([u8; ACT_THREE_SIZE], NoiseCodec), Error> {
        check_act(message, ACT_TWO_SIZE, Act::Two)?;
        let re_serialized = &message[1..1 + PUBLIC_KEY_SIZE];
        let re =
            PublicKey::from_slice(re_serialized).map_err(|_| Error::InvalidPublicKey(Act::Two))?;
        self.mix_hash(re_serialized);
        let ee = ecdh(&self.e, &re);
        self.mix_key(&ee);
        let mut tag = message[1 + PUBLIC_KEY_SIZE..].to_vec();
        self.decrypt_and_hash(&mut tag)
            .map_err(|e| e.in_stage(Stage::ActTwo))?;

        let mut encrypted_static = public_key(&self.s).serialize().to_vec();
        self.encrypt_and_hash(&mut encrypted_static)?;
        let se = ecdh(&self.s, &re);
        self.mix_key(&se);
        let mut tag = vec![];
        self.encrypt_and_hash(&mut tag)?;

        let mut act_three = [0u8; ACT_THREE_SIZE];
        act_three[0] = HANDSHAKE_VERSION;
        act_three[1..1 + encrypted_static.len()].copy_from_slice(&encrypted_static);
        act_three[1 + encrypted_static.len()..].copy_from_slice(&tag);

        let (sk, rk) = self.split();
        let codec = NoiseCodec::from_handshake(sk, rk, self.ck);
        Ok((act_three, codec))
    }

    fn advance<T>(&mut self, res: &Result<T, Error>, next: Progress) {
        match res {
            Ok(_) if next == Progress::Complete => {
                debug!("{} handshake complete", self.name());
                self.progress = next;
                self.erase();
            }
            Ok(_) => self.progress = next,
            Err(e) => {
                debug!("{} handshake aborted: {}", self.name(), e);
                self.progress = Progress::Aborted;
                self.erase();
            }
        }
    }

    fn erase(&mut self) {
        if let Some(k) = self.k.as_mut() {
            for b in k.iter_mut() {
                unsafe { ptr::write_volatile(b, 0) };
            }
        }
        self.k = None;
        self.handshake_cipher = None;
        for b in self.ck.iter_mut() {
            unsafe { ptr::write_volatile(b, 0) };
        }
        for b in self.h.iter_mut() {
            unsafe { ptr::write_volatile(b, 0) };
        }
        self.e.non_secure_erase();
        self.s.non_secure_erase();
    }
}

impl Drop for Initiator {
    fn drop(&mut self) {
        self.erase();
    }
}
