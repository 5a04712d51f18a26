use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::PrimeField;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::RngCore;
use digest::{Digest, DynDigest};
use dock_crypto_utils::{
    affine_group_element_from_byte_slices, concat_slices, hashing_utils::hash_to_field,
    serde_utils::ArkObjectBytes,
};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::SmartcardKVACError;

/// Public parameters shared by the issuer, the card and the verifier
#[serde_as]
#[derive(
    Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
pub struct SystemParams<G: AffineRepr> {
    #[serde_as(as = "ArkObjectBytes")]
    pub g: G,
}

/// Issuer's secret key `(k_0, k_1, k_2)`. `k_1` binds the user identifier and `k_2` the epoch.
/// Verification of a proof of key needs this key, so it is shared only with trusted verifiers.
#[serde_as]
#[derive(
    Clone,
    PartialEq,
    Eq,
    Debug,
    CanonicalSerialize,
    CanonicalDeserialize,
    Serialize,
    Deserialize,
    Zeroize,
    ZeroizeOnDrop,
)]
pub struct IssuerSecretKey<F: PrimeField> {
    #[serde_as(as = "ArkObjectBytes")]
    pub k0: F,
    #[serde_as(as = "ArkObjectBytes")]
    pub k1: F,
    #[serde_as(as = "ArkObjectBytes")]
    pub k2: F,
}

/// `X_i = g * k_i` for each component of the secret key
#[serde_as]
#[derive(
    Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
pub struct IssuerPublicKey<G: AffineRepr> {
    #[serde_as(as = "ArkObjectBytes")]
    pub x0: G,
    #[serde_as(as = "ArkObjectBytes")]
    pub x1: G,
    #[serde_as(as = "ArkObjectBytes")]
    pub x2: G,
}

impl<G: AffineRepr> SystemParams<G> {
    /// Generator created by hashing `label`
    pub fn new<D: Digest>(label: &[u8]) -> Self {
        Self {
            g: affine_group_element_from_byte_slices!(label, b" : g"),
        }
    }

    /// Use an agreed generator, e.g. the one hardcoded in the card
    pub fn from_generator(g: G) -> Result<Self, SmartcardKVACError> {
        let params = Self { g };
        if !params.is_valid() {
            return Err(SmartcardKVACError::InvalidSystemParams);
        }
        Ok(params)
    }

    pub fn is_valid(&self) -> bool {
        !self.g.is_zero()
    }
}

impl<F: PrimeField> IssuerSecretKey<F> {
    pub const DST: &'static [u8] = b"SMARTCARD-KVAC-KEYGEN-SALT";

    pub fn new<R: RngCore>(rng: &mut R) -> Self {
        Self {
            k0: F::rand(rng),
            k1: F::rand(rng),
            k2: F::rand(rng),
        }
    }

    /// Derive all 3 components from `seed`, each with its own domain separation tag
    pub fn generate_using_seed<D: DynDigest + Default + Clone>(seed: &[u8]) -> Self {
        Self {
            k0: hash_to_field::<F, D>(&concat_slices!(Self::DST, b"-0"), seed),
            k1: hash_to_field::<F, D>(&concat_slices!(Self::DST, b"-1"), seed),
            k2: hash_to_field::<F, D>(&concat_slices!(Self::DST, b"-2"), seed),
        }
    }
}

impl<G: AffineRepr> IssuerPublicKey<G> {
    pub fn new(sk: &IssuerSecretKey<G::ScalarField>, params: &SystemParams<G>) -> Self {
        let [x0, x1, x2] = [sk.k0, sk.k1, sk.k2].map(|k| (params.g * k).into_affine());
        Self { x0, x1, x2 }
    }

    pub fn is_valid(&self) -> bool {
        !(self.x0.is_zero() || self.x1.is_zero() || self.x2.is_zero())
    }
}
