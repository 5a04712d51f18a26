//! The issuer's signature over the user's key material. It is a MAC_wBB, section 3 of
//! [Fast Keyed-Verification Anonymous Credentials on Standard Smart Cards](https://eprint.iacr.org/2019/460),
//! on 2 messages, the user identifier `id` and the epoch `t`:
//!
//! - `user_key = g * 1/(k_0 + k_1 * id + k_2 * t)`
//! - `user_key_prime = user_key * k_1`
//!
//! The card stores both points next to the identifier and later proves knowledge of them.

use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{Field, PrimeField};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use dock_crypto_utils::serde_utils::ArkObjectBytes;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    codec::CardPoint,
    constants::IDENTIFIER_LENGTH,
    epoch::Epoch,
    error::SmartcardKVACError,
    setup::{IssuerSecretKey, SystemParams},
};

/// Identifier of a credential, fixed once the card is provisioned
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserIdentifier(pub [u8; IDENTIFIER_LENGTH]);

/// Issuer's signature on the identifier and epoch of a user
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
pub struct IssuerSignature<G: AffineRepr> {
    #[serde_as(as = "ArkObjectBytes")]
    pub user_key: G,
    #[serde_as(as = "ArkObjectBytes")]
    pub user_key_prime: G,
}

impl UserIdentifier {
    /// The identifier as a message. Its bytes are read big-endian and reduced modulo the group order.
    pub fn to_scalar<F: PrimeField>(&self) -> F {
        F::from_be_bytes_mod_order(&self.0)
    }
}

impl From<[u8; IDENTIFIER_LENGTH]> for UserIdentifier {
    fn from(bytes: [u8; IDENTIFIER_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for UserIdentifier {
    type Error = SmartcardKVACError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        <[u8; IDENTIFIER_LENGTH]>::try_from(bytes)
            .map(Self)
            .map_err(|_| SmartcardKVACError::InvalidArgument("identifier must be 32 bytes"))
    }
}

impl AsRef<[u8]> for UserIdentifier {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl<G: AffineRepr> IssuerSignature<G> {
    pub fn new(
        identifier: &UserIdentifier,
        epoch: Epoch,
        sk: &IssuerSecretKey<G::ScalarField>,
        params: &SystemParams<G>,
    ) -> Result<Self, SmartcardKVACError> {
        let denominator = Self::denominator(identifier, epoch, sk);
        let inverse = denominator
            .inverse()
            .ok_or(SmartcardKVACError::CannotInvert0)?;
        let user_key = (params.g * inverse).into_affine();
        let user_key_prime = (user_key * sk.k1).into_affine();
        Ok(Self {
            user_key,
            user_key_prime,
        })
    }

    /// Check the signature with the issuer's secret key
    pub fn verify(
        &self,
        identifier: &UserIdentifier,
        epoch: Epoch,
        sk: &IssuerSecretKey<G::ScalarField>,
        params: &SystemParams<G>,
    ) -> Result<(), SmartcardKVACError> {
        if !self.is_valid() {
            return Err(SmartcardKVACError::InvalidSignature);
        }
        let denominator = Self::denominator(identifier, epoch, sk);
        if (self.user_key * denominator).into_affine() != params.g {
            return Err(SmartcardKVACError::InvalidSignature);
        }
        if (self.user_key * sk.k1).into_affine() != self.user_key_prime {
            return Err(SmartcardKVACError::InvalidSignature);
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        !(self.user_key.is_zero() || self.user_key_prime.is_zero())
    }

    fn denominator(
        identifier: &UserIdentifier,
        epoch: Epoch,
        sk: &IssuerSecretKey<G::ScalarField>,
    ) -> G::ScalarField {
        let id = identifier.to_scalar::<G::ScalarField>();
        let t = epoch.to_scalar::<G::ScalarField>();
        sk.k0 + sk.k1 * id + sk.k2 * t
    }
}

impl<G: CardPoint> IssuerSignature<G> {
    /// Both points are on the curve, in the prime order subgroup and not the identity
    pub fn has_valid_points(&self) -> bool {
        self.user_key.is_valid_group_element() && self.user_key_prime.is_valid_group_element()
    }
}
