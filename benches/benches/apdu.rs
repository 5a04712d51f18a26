use ark_std::{
    rand::{rngs::StdRng, SeedableRng},
    UniformRand,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use smartcard_kvac::{
    apdu::{Case, CommandApdu, ResponseApdu},
    codec::CardPoint,
    constants::{CLA_APPLICATION, INS_COMPUTE_PROOF_OF_KEY, MAX_COMMAND_LENGTH},
};
use test_utils::G1;

fn codec(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0u64);
    let point = G1::rand(&mut rng);
    let encoded = point.to_card_bytes().unwrap();

    c.bench_function("Encode point", |b| {
        b.iter(|| black_box(&point).to_card_bytes().unwrap())
    });
    // Includes the curve and subgroup checks
    c.bench_function("Decode point", |b| {
        b.iter(|| G1::from_card_bytes(black_box(&encoded)).unwrap())
    });
}

fn frames(c: &mut Criterion) {
    let nonce = [7u8; 20];
    let mut frame = [0u8; MAX_COMMAND_LENGTH];
    c.bench_function("Write compute proof command", |b| {
        b.iter(|| {
            CommandApdu::new(
                Case::Case4Short,
                CLA_APPLICATION,
                INS_COMPUTE_PROOF_OF_KEY,
                0,
                0,
                black_box(&nonce),
                149,
            )
            .unwrap()
            .write_to(&mut frame)
            .unwrap()
        })
    });

    let mut response = vec![0u8; 149];
    response.extend_from_slice(&[0x90, 0x00]);
    c.bench_function("Parse response", |b| {
        b.iter(|| ResponseApdu::parse(black_box(&response)).unwrap().sw.status())
    });
}

criterion_group!(benches, codec, frames);
criterion_main!(benches);
