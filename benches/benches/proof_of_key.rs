use benches::setup;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sha1::Sha1;
use smartcard_kvac::nonce::Nonce;
use test_utils::G1;

fn proof_of_key(c: &mut Criterion) {
    let (verifier, mut cards, mut rng) = setup(1);
    let card = &mut cards[0];
    let nonce = verifier.generate_nonce(&mut rng);

    c.bench_function("Get proof of key from software card", |b| {
        b.iter(|| card.request_proof::<G1, Sha1>(black_box(&nonce)).unwrap())
    });

    let proof = card.request_proof::<G1, Sha1>(&nonce).unwrap();
    c.bench_function("Verify proof of key", |b| {
        b.iter(|| {
            verifier
                .verify::<Sha1>(Nonce::from(*nonce.as_bytes()), black_box(&proof))
                .unwrap()
        })
    });
}

fn batch_verification(c: &mut Criterion) {
    let counts = [4, 16, 64];
    let (verifier, mut cards, mut rng) = setup(*counts.iter().max().unwrap() as u64);
    let attempts = cards
        .iter_mut()
        .map(|card| {
            let nonce = verifier.generate_nonce(&mut rng);
            let proof = card.request_proof::<G1, Sha1>(&nonce).unwrap();
            (*nonce.as_bytes(), proof)
        })
        .collect::<Vec<_>>();

    let mut group = c.benchmark_group("Batch verification");
    for count in counts {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{} proofs", count)),
            &count,
            |b, &count| {
                b.iter(|| {
                    let batch = attempts[..count]
                        .iter()
                        .map(|(n, p)| (Nonce::from(*n), p.clone()))
                        .collect();
                    verifier.verify_batch::<Sha1>(black_box(batch)).unwrap()
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, proof_of_key, batch_verification);
criterion_main!(benches);
