use ark_std::rand::{rngs::StdRng, SeedableRng};
use smartcard_kvac::{
    epoch::{Epoch, FixedEpoch},
    user::UserCard,
    verifier::Verifier,
};
use test_utils::{
    kvac::{issuer_setup, provisioned_card, TestCard},
    G1,
};

/// Epoch all benchmarks run in
pub const EPOCH: Epoch = Epoch(19_000);

/// A verifier and `count` software cards provisioned for [`EPOCH`]
pub fn setup(count: u64) -> (Verifier<G1, FixedEpoch>, Vec<UserCard<TestCard>>, StdRng) {
    let mut rng = StdRng::seed_from_u64(0u64);
    let (params, sk, _) = issuer_setup(&mut rng);
    let cards = (0..count)
        .map(|i| provisioned_card(&mut rng, EPOCH, &sk, &params, i).0)
        .collect();
    (Verifier::new(params, sk, FixedEpoch(EPOCH)), cards, rng)
}
