use std::ptr;

use crate::{
    cipher_state::CipherState,
    error::{Act, Error, Stage},
    handshake::{check_act, HandshakeOp, Progress},
    primitives::{ecdh, generate_key, public_key},
    NoiseCodec, ACT_ONE_SIZE, ACT_THREE_SIZE, ACT_TWO_SIZE, HANDSHAKE_VERSION, MAC_SIZE,
    PUBLIC_KEY_SIZE,
};
use chacha20poly1305::ChaCha20Poly1305;
use secp256k1::{PublicKey, SecretKey};
use tracing::debug;

/// The side of a BOLT 8 handshake that accepts the connection.
///
/// The responder only needs its own static key. It learns the initiator's static public key from
/// act three.
pub struct Responder {
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
    // initiator static pub key, learned from act three
    rs: Option<PublicKey>,
    progress: Progress,
}

impl std::fmt::Debug for Responder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Responder")
            .field("progress", &self.progress)
            .finish()
    }
}

impl CipherState<ChaCha20Poly1305> for Responder {
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

impl HandshakeOp<ChaCha20Poly1305> for Responder {
    fn name(&self) -> String {
        "Responder".to_string()
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

impl Responder {
    pub fn from_raw_k(static_secret: [u8; 32]) -> Result<Box<Self>, Error> {
        let s = SecretKey::from_slice(&static_secret).map_err(|_| Error::InvalidRawPrivateKey)?;
        Ok(Self::new(s))
    }

    /// Creates a responder with a freshly generated ephemeral key.
    pub fn new(s: SecretKey) -> Box<Self> {
        Self::with_ephemeral(s, generate_key())
    }

    /// Creates a responder with a caller supplied ephemeral key, for deterministic tests.
    pub fn with_ephemeral(s: SecretKey, e: SecretKey) -> Box<Self> {
        let local_static = public_key(&s);
        let mut self_ = Self {
            handshake_cipher: None,
            k: None,
            n: 0,
            ck: [0; 32],
            h: [0; 32],
            s,
            e,
            rs: None,
            progress: Progress::ActOne,
        };
        self_.initialize_self(&local_static);
        Box::new(self_)
    }

    /// Static public key of the initiator, available once act three has been verified.
    pub fn remote_static(&self) -> Option<PublicKey> {
        self.rs
    }

    /// Size of the next act this side has to receive, `None` once the handshake is over.
    pub fn expected_act_size(&self) -> Option<usize> {
        match self.progress {
            Progress::ActOne => Some(ACT_ONE_SIZE),
            Progress::ActThree => Some(ACT_THREE_SIZE),
            _ => None,
        }
    }

    /// Processes act one and produces act two: `0x00 || e.pub || tag`.
    ///
    /// Act one handling:
    /// 1. checks the version byte and parses `re`
    /// 2. `h = SHA256(h || re)`
    /// 3. `es = ECDH(s.priv, re)`, `ck, temp_k1 = HKDF(ck, es)`
    /// 4. verifies the tag with `decryptWithAD(temp_k1, 0, h, c)`, `h = SHA256(h || c)`
    ///
    /// Act two:
    /// 1. `h = SHA256(h || e.pub)`
    /// 2. `ee = ECDH(e.priv, re)`, `ck, temp_k2 = HKDF(ck, ee)`
    /// 3. `c = encryptWithAD(temp_k2, 0, h, "")`, `h = SHA256(h || c)`
    ///
    /// Message length: 50 bytes
    pub fn step_1(&mut self, message: &[u8]) -> Result<[u8; ACT_TWO_SIZE], Error> {
        self.progress.expect(Progress::ActOne)?;
        let res = self.act_one_and_two(message);
        self.advance(&res, Progress::ActThree);
        res
    }

    /// Processes act three and returns the initiator's static public key with the transport
    /// codec.
    ///
    /// 1. checks the version byte
    /// 2. `rs = decryptWithAD(temp_k2, 1, h, c)`, `h = SHA256(h || c)`
    /// 3. `se = ECDH(e.priv, rs)`, `ck, temp_k3 = HKDF(ck, se)`
    /// 4. verifies the tag with `decryptWithAD(temp_k3, 0, h, t)`
    /// 5. `rk, sk = HKDF(ck, "")`
    pub fn step_3(&mut self, message: &[u8]) -> Result<(PublicKey, NoiseCodec), Error> {
        self.progress.expect(Progress::ActThree)?;
        let res = self.act_three(message);
        self.advance(&res, Progress::Complete);
        res
    }

    fn act_one_and_two(&mut self, message: &[u8]) -> Result<[u8; ACT_TWO_SIZE], Error> {
        check_act(message, ACT_ONE_SIZE, Act::One)?;
        let re_serialized = &message[1..1 + PUBLIC_KEY_SIZE];
        let re =
            PublicKey::from_slice(re_serialized).map_err(|_| Error::InvalidPublicKey(Act::One))?;
        self.mix_hash(re_serialized);
        let es = ecdh(&self.s, &re);
        self.mix_key(&es);
        let mut tag = message[1 + PUBLIC_KEY_SIZE..].to_vec();
        self.decrypt_and_hash(&mut tag)
            .map_err(|e| e.in_stage(Stage::ActOne))?;

        let e_pub = public_key(&self.e).serialize();
        self.mix_hash(&e_pub);
        let ee = ecdh(&self.e, &re);
        self.mix_key(&ee);
        let mut tag = vec![];
        self.encrypt_and_hash(&mut tag)?;

        let mut act_two = [0u8; ACT_TWO_SIZE];
        act_two[0] = HANDSHAKE_VERSION;
        act_two[1..1 + PUBLIC_KEY_SIZE].copy_from_slice(&e_pub);
        act_two[1 + PUBLIC_KEY_SIZE..].copy_from_slice(&tag);
        Ok(act_two)
    }

    fn act_three(&mut self, message: &[u8]) -> Result<(PublicKey, NoiseCodec), Error> {
        check_act(message, ACT_THREE_SIZE, Act::Three)?;
        let static_end = 1 + PUBLIC_KEY_SIZE + MAC_SIZE;
        let mut rs = message[1..static_end].to_vec();
        self.decrypt_and_hash(&mut rs)
            .map_err(|e| e.in_stage(Stage::ActThreeStaticKey))?;
        let rs = PublicKey::from_slice(&rs).map_err(|_| Error::InvalidPublicKey(Act::Three))?;

        let se = ecdh(&self.e, &rs);
        self.mix_key(&se);
        let mut tag = message[static_end..].to_vec();
        self.decrypt_and_hash(&mut tag)
            .map_err(|e| e.in_stage(Stage::ActThree))?;
        self.rs = Some(rs);

        let (rk, sk) = self.split();
        let codec = NoiseCodec::from_handshake(sk, rk, self.ck);
        Ok((rs, codec))
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

impl Drop for Responder {
    fn drop(&mut self) {
        self.erase();
    }
}
