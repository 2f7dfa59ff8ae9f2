// # Using the BOLT 8 Codec over TCP
//
// This example shows how to drive `codec_bolt8` over a blocking TCP connection:
//
// * Run the three-act handshake by feeding whatever bytes the socket returns.
// * Encrypt a payload into a BOLT 8 record and write it to the socket.
// * Read the record back with `NoiseDecoder::writable`, which asks for exactly the bytes needed
//   to make progress.
//
// ## Run
//
// ```
// cargo run --example encrypted
// ```

use codec_bolt8::{
    noise_bolt8::primitives::{generate_key, public_key},
    Error, HandshakeRole, HandshakeStep, NoiseTransport,
};
use std::{
    io::{Read, Write},
    net::{TcpListener, TcpStream},
};

// Emulate a TCP connection
const TCP_ADDR: &str = "127.0.0.1:9735";

fn drive(transport: &mut NoiseTransport, stream: &mut TcpStream, mut step: HandshakeStep) {
    loop {
        match step {
            HandshakeStep::Send(bytes) => {
                stream.write_all(&bytes).expect("Failed to send act");
                step = HandshakeStep::NeedMoreBytes(0);
            }
            HandshakeStep::NeedMoreBytes(_) => {
                let mut buf = [0u8; 128];
                let n = stream.read(&mut buf).expect("Failed to read act");
                assert!(n > 0, "Peer closed during the handshake");
                step = transport
                    .feed_handshake_bytes(&buf[..n])
                    .expect("Handshake failed");
            }
            HandshakeStep::Ready(act_three) => {
                if let Some(act_three) = act_three {
                    stream.write_all(&act_three).expect("Failed to send act three");
                }
                return;
            }
        }
    }
}

fn main() {
    let listener = TcpListener::bind(TCP_ADDR).expect("Failed to bind TCP listener");

    let responder_static = generate_key();
    let responder_node_id = public_key(&responder_static);

    let receiver = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("Failed to accept connection");
        let mut transport = NoiseTransport::new();
        let step = transport
            .start_handshake(HandshakeRole::responder(responder_static))
            .expect("Failed to start handshake");
        drive(&mut transport, &mut stream, step);
        println!(
            "Responder: connected to {}",
            transport.remote_static().expect("Act three carries the key")
        );

        let (_, mut decoder) = transport.into_split().expect("Transport mode");
        loop {
            match decoder.next_frame() {
                Ok(payload) => return payload,
                Err(Error::MissingBytes(_)) => stream
                    .read_exact(decoder.writable())
                    .expect("Failed to read record"),
                Err(e) => panic!("Failed to decode the record: {}", e),
            }
        }
    });

    let mut stream = TcpStream::connect(TCP_ADDR).expect("Failed to connect");
    let mut transport = NoiseTransport::new();
    let step = transport
        .start_handshake(HandshakeRole::initiator(generate_key(), responder_node_id))
        .expect("Failed to start handshake");
    drive(&mut transport, &mut stream, step);

    let record = transport
        .encrypt_message(b"hello over bolt 8")
        .expect("Failed to encrypt");
    stream.write_all(&record).expect("Failed to send record");

    let received = receiver.join().expect("Receiver panicked");
    assert_eq!(received, b"hello over bolt 8");
    println!("Initiator: message delivered");
}
