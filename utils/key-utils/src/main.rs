use ::key_utils::{Secp256k1PublicKey, Secp256k1SecretKey};
use secp256k1::{rand, Secp256k1};

fn generate_key() -> (Secp256k1SecretKey, Secp256k1PublicKey) {
    let secp = Secp256k1::new();
    let (secret_key, public_key) = secp.generate_keypair(&mut rand::thread_rng());
    (
        Secp256k1SecretKey(secret_key),
        Secp256k1PublicKey(public_key),
    )
}

fn main() {
    let (secret, public) = generate_key();
    let secret: String = secret.into();
    let public: String = public.into();
    println!("Static Secret Key: {secret}");
    println!("Node Id: {public}");
}
