use ark_std::rand::{rngs::StdRng, RngCore, SeedableRng};
use blake2::Blake2b512;
use sha1::Sha1;
use smartcard_kvac::{
    emulator::SoftwareCard,
    epoch::Epoch,
    setup::{IssuerPublicKey, IssuerSecretKey, SystemParams},
    signature::{IssuerSignature, UserIdentifier},
    user::UserCard,
};

use crate::{Fr, G1};

/// Software card as used in tests, computing SHA-1 challenges over BN254
pub type TestCard = SoftwareCard<G1, Sha1, StdRng>;

pub fn issuer_setup<R: RngCore>(
    rng: &mut R,
) -> (SystemParams<G1>, IssuerSecretKey<Fr>, IssuerPublicKey<G1>) {
    let params = SystemParams::<G1>::new::<Blake2b512>(b"test");
    let sk = IssuerSecretKey::new(rng);
    let pk = IssuerPublicKey::new(&sk, &params);
    (params, sk, pk)
}

/// Random identifier and the issuer's signature on it for `epoch`
pub fn issue<R: RngCore>(
    rng: &mut R,
    epoch: Epoch,
    sk: &IssuerSecretKey<Fr>,
    params: &SystemParams<G1>,
) -> (UserIdentifier, IssuerSignature<G1>) {
    let mut id = [0u8; 32];
    rng.fill_bytes(&mut id);
    let identifier = UserIdentifier(id);
    let signature = IssuerSignature::new(&identifier, epoch, sk, params).unwrap();
    (identifier, signature)
}

/// A software card already holding a fresh identifier and its signature for `epoch`. `seed` drives the
/// card's own randomness.
pub fn provisioned_card<R: RngCore>(
    rng: &mut R,
    epoch: Epoch,
    sk: &IssuerSecretKey<Fr>,
    params: &SystemParams<G1>,
    seed: u64,
) -> (UserCard<TestCard>, UserIdentifier) {
    let (identifier, signature) = issue(rng, epoch, sk, params);
    let mut card = UserCard::new(TestCard::new(
        params.clone(),
        StdRng::seed_from_u64(seed),
    ));
    card.set_identifier_and_signature(identifier, &signature)
        .unwrap();
    (card, identifier)
}
