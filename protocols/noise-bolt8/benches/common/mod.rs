use rand::{rngs::StdRng, SeedableRng};
use secp256k1::{PublicKey, Secp256k1, SecretKey};

pub fn rng() -> StdRng {
    // Fixed seed for deterministic benchmark runs.
    StdRng::seed_from_u64(0xdead_beef)
}

pub fn generate_key_with_rng<R: rand::Rng + ?Sized>(rng: &mut R) -> (SecretKey, PublicKey) {
    let secp = Secp256k1::new();
    secp.generate_keypair(rng)
}

pub fn payload(len: usize) -> Vec<u8> {
    vec![0u8; len]
}
