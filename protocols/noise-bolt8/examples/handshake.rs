// # BOLT 8 Handshake
//
// This example demonstrates how to use the `noise_bolt8` crate to run the three-act handshake
// between an initiator and a responder held in the same process, then exchange an encrypted
// message in each direction.
//
// ## Run
//
// ```sh
// cargo run --example handshake
// ```

use noise_bolt8::{primitives, Initiator, Responder};

fn main() {
    let secret_message = b"Ciao, Mondo!";

    let responder_key = primitives::generate_key();
    let initiator_key = primitives::generate_key();

    // The initiator has to know who it is talking to.
    let mut initiator = Initiator::new(initiator_key, primitives::public_key(&responder_key));
    let mut responder = Responder::new(responder_key);

    let act_one = initiator
        .step_0()
        .expect("Initiator failed to produce act one");

    let act_two = responder
        .step_1(&act_one)
        .expect("Responder failed to process act one");

    let (act_three, mut initiator_state) = initiator
        .step_2(&act_two)
        .expect("Initiator failed to process act two");

    let (initiator_pub, mut responder_state) = responder
        .step_3(&act_three)
        .expect("Responder failed to process act three");
    assert_eq!(initiator_pub, primitives::public_key(&initiator_key));

    let record = initiator_state
        .encrypt_message(secret_message)
        .expect("Initiator failed to encrypt the secret message");
    assert_eq!(record.len(), 18 + secret_message.len() + 16);

    let plaintext = responder_state
        .decrypt_message(&record)
        .expect("Responder failed to decrypt the secret message");
    assert_eq!(plaintext, secret_message);

    let reply = responder_state
        .encrypt_message(b"Ciao!")
        .expect("Responder failed to encrypt the reply");
    let plaintext = initiator_state
        .decrypt_message(&reply)
        .expect("Initiator failed to decrypt the reply");
    println!("{}", String::from_utf8_lossy(&plaintext));
}
