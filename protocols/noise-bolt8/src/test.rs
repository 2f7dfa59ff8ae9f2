use crate::{
    error::{Act, Stage},
    initiator::Initiator,
    primitives::public_key,
    responder::Responder,
    Error, NoiseCodec, ACT_ONE_SIZE, ACT_THREE_SIZE, ACT_TWO_SIZE, REKEY_INTERVAL,
};
use quickcheck::TestResult;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use secp256k1::{PublicKey, SecretKey};

// BOLT 8 appendix A keys.
const INITIATOR_STATIC: [u8; 32] = [0x11; 32];
const INITIATOR_EPHEMERAL: [u8; 32] = [0x12; 32];
const RESPONDER_STATIC: [u8; 32] = [0x21; 32];
const RESPONDER_EPHEMERAL: [u8; 32] = [0x22; 32];

const RESPONDER_STATIC_PUB: &str =
    "028d7500dd4c12685d1f568b4c2b5048e8534b873319f3a8daa612b469132ec7f7";
const INITIATOR_STATIC_PUB: &str =
    "034f355bdcb7cc0af728ef3cceb9615d90684bb5b2ca5f859ab0f0b704075871aa";

const ACT_ONE: &str = "00036360e856310ce5d294e8be33fc807077dc56ac80d95d9cd4ddbd21325eff73f70df6086551151f58b8afe6c195782c6a";
const ACT_TWO: &str = "0002466d7fcae563e5cb09a0d1870bb580344804617879a14949cf22285f1bae3f276e2470b93aac583c9ef6eafca3f730ae";
const ACT_THREE: &str = "00b9e3a702e93e3a9948c2ed6e5fd7590a6e1c3a0344cfc9d5b57357049aa22355361aa02e55a8fc28fef5bd6d71ad0c38228dc68b1c466263b47fdf31e560e139ba";

const SK: &str = "969ab31b4d288cedf6218839b27a3e2140827047f2c0f01bf5c04435d43511a9";
const RK: &str = "bb9020b8965f4df047e07f955f3c4b88418984aadc5cdb35096b9ea8fa5c3442";
const CK: &str = "919219dbb2920afa8db80f9a51787a840bcf111ed8d588caf9ab4be716e42b01";

fn secret(bytes: [u8; 32]) -> SecretKey {
    SecretKey::from_slice(&bytes).unwrap()
}

fn pubkey(s: &str) -> PublicKey {
    PublicKey::from_slice(&hex::decode(s).unwrap()).unwrap()
}

fn vector_initiator() -> Box<Initiator> {
    Initiator::with_ephemeral(
        secret(INITIATOR_STATIC),
        secret(INITIATOR_EPHEMERAL),
        pubkey(RESPONDER_STATIC_PUB),
    )
}

fn vector_responder() -> Box<Responder> {
    Responder::with_ephemeral(secret(RESPONDER_STATIC), secret(RESPONDER_EPHEMERAL))
}

fn patched(vector: &str, index: usize, byte: u8) -> Vec<u8> {
    let mut bytes = hex::decode(vector).unwrap();
    bytes[index] = byte;
    bytes
}

fn vector_codecs() -> (NoiseCodec, NoiseCodec) {
    let mut initiator = vector_initiator();
    let mut responder = vector_responder();
    let act_one = initiator.step_0().unwrap();
    let act_two = responder.step_1(&act_one).unwrap();
    let (act_three, initiator_codec) = initiator.step_2(&act_two).unwrap();
    let (_, responder_codec) = responder.step_3(&act_three).unwrap();
    (initiator_codec, responder_codec)
}

#[test]
fn test_1() {
    let responder_static = crate::primitives::generate_key();
    let initiator_static = crate::primitives::generate_key();

    let mut initiator = Initiator::new(initiator_static, public_key(&responder_static));
    let mut responder = Responder::new(responder_static);
    let first_message = initiator.step_0().unwrap();
    let second_message = responder.step_1(&first_message).unwrap();
    let (third_message, mut codec_initiator) = initiator.step_2(&second_message).unwrap();
    let (remote, mut codec_responder) = responder.step_3(&third_message).unwrap();
    assert_eq!(remote, public_key(&initiator_static));

    let message = codec_initiator.encrypt_message(b"ciao").unwrap();
    assert!(!message.windows(4).any(|w| w == b"ciao"));
    assert_eq!(codec_responder.decrypt_message(&message).unwrap(), b"ciao");

    let reply = codec_responder.encrypt_message(b"ciao ciao").unwrap();
    assert_eq!(codec_initiator.decrypt_message(&reply).unwrap(), b"ciao ciao");
}

#[test]
fn initiator_produces_vector_acts() {
    let mut initiator = vector_initiator();
    let act_one = initiator.step_0().unwrap();
    assert_eq!(hex::encode(act_one), ACT_ONE);

    let (act_three, codec) = initiator.step_2(&hex::decode(ACT_TWO).unwrap()).unwrap();
    assert_eq!(hex::encode(act_three), ACT_THREE);

    let (sk, ck) = codec.encryptor().key_material();
    let (rk, _) = codec.decryptor().key_material();
    assert_eq!(hex::encode(sk.unwrap()), SK);
    assert_eq!(hex::encode(rk.unwrap()), RK);
    assert_eq!(hex::encode(ck), CK);
}

#[test]
fn responder_produces_vector_acts() {
    let mut responder = vector_responder();
    let act_two = responder.step_1(&hex::decode(ACT_ONE).unwrap()).unwrap();
    assert_eq!(hex::encode(act_two), ACT_TWO);

    let (remote, codec) = responder.step_3(&hex::decode(ACT_THREE).unwrap()).unwrap();
    assert_eq!(hex::encode(remote.serialize()), INITIATOR_STATIC_PUB);
    assert_eq!(responder.remote_static(), Some(remote));

    // Directions are mirrored on the responder side.
    let (sk, ck) = codec.encryptor().key_material();
    let (rk, _) = codec.decryptor().key_material();
    assert_eq!(hex::encode(sk.unwrap()), RK);
    assert_eq!(hex::encode(rk.unwrap()), SK);
    assert_eq!(hex::encode(ck), CK);
}

#[test]
fn initiator_rejects_bad_act_two() {
    let cases = [
        (patched(ACT_TWO, 0, 0x01), "ACT2_BAD_VERSION 1"),
        (patched(ACT_TWO, 1, 0x04), "ACT2_BAD_PUBKEY"),
        (patched(ACT_TWO, ACT_TWO_SIZE - 1, 0xaf), "ACT2_BAD_TAG"),
    ];
    for (act_two, expected) in cases {
        let mut initiator = vector_initiator();
        initiator.step_0().unwrap();
        let err = initiator.step_2(&act_two).unwrap_err();
        assert_eq!(err.to_string(), expected);
        assert!(err.is_authentication_failure());
    }
}

#[test]
fn responder_rejects_bad_act_one() {
    let cases = [
        (patched(ACT_ONE, 0, 0x01), "ACT1_BAD_VERSION 1"),
        (patched(ACT_ONE, 1, 0x04), "ACT1_BAD_PUBKEY"),
        (patched(ACT_ONE, ACT_ONE_SIZE - 1, 0x6b), "ACT1_BAD_TAG"),
    ];
    for (act_one, expected) in cases {
        let mut responder = vector_responder();
        let err = responder.step_1(&act_one).unwrap_err();
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn responder_rejects_bad_act_three() {
    let bad_pubkey = "00bfe3a702e93e3a9948c2ed6e5fd7590a6e1c3a0344cfc9d5b57357049aa2235536ad09a8ee351870c2bb7f78b754a26c6cef79a98d25139c856d7efd252c2ae73c";
    let cases = [
        (patched(ACT_THREE, 0, 0x01), "ACT3_BAD_VERSION 1"),
        (patched(ACT_THREE, 1, 0xc9), "ACT3_BAD_CIPHERTEXT"),
        (hex::decode(bad_pubkey).unwrap(), "ACT3_BAD_PUBKEY"),
        (patched(ACT_THREE, ACT_THREE_SIZE - 1, 0xbb), "ACT3_BAD_TAG"),
    ];
    for (act_three, expected) in cases {
        let mut responder = vector_responder();
        responder.step_1(&hex::decode(ACT_ONE).unwrap()).unwrap();
        let err = responder.step_3(&act_three).unwrap_err();
        assert_eq!(err.to_string(), expected);
        assert!(responder.remote_static().is_none());
    }
}

#[test]
fn bad_tags_are_typed() {
    let mut responder = vector_responder();
    let err = responder
        .step_1(&patched(ACT_ONE, ACT_ONE_SIZE - 1, 0x6b))
        .unwrap_err();
    assert_eq!(err, Error::AuthenticationFailed(Stage::ActOne));

    let mut responder = vector_responder();
    let err = responder.step_1(&patched(ACT_ONE, 0, 0x01)).unwrap_err();
    assert_eq!(
        err,
        Error::UnsupportedVersion {
            act: Act::One,
            version: 1
        }
    );
}

#[test]
fn message_vectors_across_rekey() {
    let (mut initiator, mut responder) = vector_codecs();
    let expected = [
        (0, "cf2b30ddf0cf3f80e7c35a6e6730b59fe802473180f396d88a8fb0db8cbcf25d2f214cf9ea1d95"),
        (1, "72887022101f0b6753e0c7de21657d35a4cb2a1f5cde2650528bbc8f837d0f0d7ad833b1a256a1"),
        (500, "178cb9d7387190fa34db9c2d50027d21793c9bc2d40b1e14dcf30ebeeeb220f48364f7a4c68bf8"),
        (501, "1b186c57d44eb6de4c057c49940d79bb838a145cb528d6e8fd26dbe50a60ca2c104b56b60e45bd"),
        (1000, "4a2f3cc3b5e78ddb83dcb426d9863d9d9a723b0337c89dd0b005d89f8d3c05c52b76b29b740f09"),
        (1001, "2ecd8c8a5629d0d02ab457a0fdd0f7b90a192cd46be5ecb6ca570bfc5e268338b1a16cf4ef2d36"),
    ];
    let mut checked = 0;
    for i in 0..1002 {
        let record = initiator.encrypt_message(b"hello").unwrap();
        if let Some((_, vector)) = expected.iter().find(|(index, _)| *index == i) {
            assert_eq!(hex::encode(&record), *vector, "message {i}");
            checked += 1;
        }
        assert_eq!(responder.decrypt_message(&record).unwrap(), b"hello");
    }
    assert_eq!(checked, expected.len());
}

#[test]
fn length_and_body_decrypt_separately() {
    let (mut initiator, mut responder) = vector_codecs();
    let record = initiator.encrypt_message(&[7; 300]).unwrap();
    let len = responder.decrypt_length(&record[..18]).unwrap();
    assert_eq!(len, 300);
    assert_eq!(responder.decrypt_body(&record[18..]).unwrap(), vec![7; 300]);
}

#[test]
fn split_halves_keep_talking() {
    let (initiator, responder) = vector_codecs();
    let (mut i_enc, mut i_dec) = initiator.into_split();
    let (mut r_enc, mut r_dec) = responder.into_split();
    for i in 0..(2 * REKEY_INTERVAL) {
        let msg = i.to_be_bytes();
        assert_eq!(r_dec.decrypt_message(&i_enc.encrypt_message(&msg).unwrap()).unwrap(), msg);
    }
    let record = r_enc.encrypt_message(b"late").unwrap();
    assert_eq!(i_dec.decrypt_message(&record).unwrap(), b"late");
}

#[test]
fn erased_codec_refuses_to_send() {
    let (mut initiator, _) = vector_codecs();
    initiator.erase();
    assert_eq!(initiator.encrypt_message(b"x").unwrap_err(), Error::KeyErased);
}

#[test]
fn wrong_responder_key_fails_act_one() {
    let mut initiator = Initiator::new(
        crate::primitives::generate_key(),
        public_key(&crate::primitives::generate_key()),
    );
    let mut responder = Responder::new(crate::primitives::generate_key());
    let act_one = initiator.step_0().unwrap();
    assert_eq!(
        responder.step_1(&act_one).unwrap_err(),
        Error::AuthenticationFailed(Stage::ActOne)
    );
}

#[test]
fn deterministic_random_payloads_round_trip() {
    let mut rng = ChaCha20Rng::seed_from_u64(8);
    let (mut initiator, mut responder) = vector_codecs();
    for _ in 0..64 {
        let len = rng.gen_range(0..4096);
        let payload: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        let record = initiator.encrypt_message(&payload).unwrap();
        assert_eq!(record.len(), 18 + payload.len() + 16);
        assert_eq!(responder.decrypt_message(&record).unwrap(), payload);
    }
}

#[quickcheck_macros::quickcheck]
fn any_keys_agree(a: Vec<u8>, b: Vec<u8>, payload: Vec<u8>) -> TestResult {
    let key = |mut v: Vec<u8>| {
        v.resize(32, 1);
        SecretKey::from_slice(&v).ok()
    };
    let (initiator_static, responder_static) = match (key(a), key(b)) {
        (Some(a), Some(b)) => (a, b),
        _ => return TestResult::discard(),
    };
    let mut initiator = Initiator::new(initiator_static, public_key(&responder_static));
    let mut responder = Responder::new(responder_static);
    let act_two = responder.step_1(&initiator.step_0().unwrap()).unwrap();
    let (act_three, mut i_codec) = initiator.step_2(&act_two).unwrap();
    let (remote, mut r_codec) = responder.step_3(&act_three).unwrap();
    if remote != public_key(&initiator_static) {
        return TestResult::failed();
    }
    let record = i_codec.encrypt_message(&payload).unwrap();
    TestResult::from_bool(r_codec.decrypt_message(&record).unwrap() == payload)
}
