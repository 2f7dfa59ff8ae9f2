use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use noise_bolt8::{Initiator, Responder};

use crate::common::{generate_key_with_rng, rng};
mod common;

fn bench_xk_handshake(c: &mut Criterion) {
    let mut group = c.benchmark_group("handshake");

    group.bench_function("act_one_initiator", |b| {
        b.iter_batched(
            || {
                let mut rng = rng();
                let (initiator_key, _) = generate_key_with_rng(&mut rng);
                let (_, responder_pub) = generate_key_with_rng(&mut rng);
                Initiator::new(initiator_key, responder_pub)
            },
            |mut initiator| {
                let _act_one = initiator.step_0().unwrap();
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("act_two_responder", |b| {
        b.iter_batched(
            || {
                let mut rng = rng();
                let (initiator_key, _) = generate_key_with_rng(&mut rng);
                let (responder_key, responder_pub) = generate_key_with_rng(&mut rng);
                let mut initiator = Initiator::new(initiator_key, responder_pub);
                let responder = Responder::new(responder_key);

                let act_one = initiator.step_0().unwrap();
                (responder, act_one)
            },
            |(mut responder, act_one)| {
                let _ = responder.step_1(&act_one).unwrap();
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("act_three_initiator", |b| {
        b.iter_batched(
            || {
                let mut rng = rng();
                let (initiator_key, _) = generate_key_with_rng(&mut rng);
                let (responder_key, responder_pub) = generate_key_with_rng(&mut rng);
                let mut initiator = Initiator::new(initiator_key, responder_pub);
                let mut responder = Responder::new(responder_key);

                let act_one = initiator.step_0().unwrap();
                let act_two = responder.step_1(&act_one).unwrap();
                (initiator, act_two)
            },
            |(mut initiator, act_two)| {
                let _ = initiator.step_2(&act_two).unwrap();
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("handshake", |b| {
        b.iter_batched(
            || {
                let mut rng = rng();
                let (initiator_key, _) = generate_key_with_rng(&mut rng);
                let (responder_key, responder_pub) = generate_key_with_rng(&mut rng);
                let initiator = Initiator::new(initiator_key, responder_pub);
                let responder = Responder::new(responder_key);
                (initiator, responder)
            },
            |(mut initiator, mut responder)| {
                let act_one = initiator.step_0().unwrap();
                let act_two = responder.step_1(&act_one).unwrap();
                let (act_three, _) = initiator.step_2(&act_two).unwrap();
                let _ = responder.step_3(&act_three).unwrap();
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(handshake, bench_xk_handshake);
criterion_main!(handshake);
