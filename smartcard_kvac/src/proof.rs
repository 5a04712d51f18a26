//! Proof of knowledge of the issuer signature held by the card, section 4.2 of
//! [Fast Keyed-Verification Anonymous Credentials on Standard Smart Cards](https://eprint.iacr.org/2019/460)
//! with the identifier hidden and the epoch revealed.
//!
//! The card, holding `user_key`, `user_key_prime` and `id`:
//! - picks random `r`, `rho_r`, `rho_id` and sets `key_hat = user_key * r`
//! - commits `t = g * rho_r + (user_key_prime * r) * rho_id`
//! - computes `e = H(key_hat || t || nonce)`, the digest padded into a scalar
//! - responds `s = rho_r + e * r` and `s_id = rho_id - e * id`
//!
//! The verifier, knowing the issuer's secret key and the current epoch `t_e`:
//! - recomputes `t' = g * s + key_hat * (-e * k_0) + key_hat * (k_1 * s_id) + key_hat * (-e * k_2 * t_e)`
//! - accepts iff `H(key_hat || t' || nonce) == e`
//!
//! On the wire the proof is `key_hat || digest || s || s_id`.

use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{PrimeField, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::{io::Write, rand::RngCore, vec, vec::Vec, UniformRand};
use digest::Digest;
use dock_crypto_utils::{misc::rand, serde_utils::ArkObjectBytes};
use schnorr_pok::SchnorrCommitment;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    codec::{
        checked_digest_length, decode_scalar, digest_to_scalar, encode_scalar, scalar_length,
        scalar_to_digest, CardPoint,
    },
    epoch::Epoch,
    error::SmartcardKVACError,
    nonce::Nonce,
    setup::{IssuerSecretKey, SystemParams},
    signature::{IssuerSignature, UserIdentifier},
};

/// Proof of knowledge of the key held by the card
#[serde_as]
#[derive(
    Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
pub struct ProofOfKey<G: AffineRepr> {
    /// Randomized signature `user_key * r`
    #[serde_as(as = "ArkObjectBytes")]
    pub key_hat: G,
    /// The challenge
    #[serde_as(as = "ArkObjectBytes")]
    pub e: G::ScalarField,
    #[serde_as(as = "ArkObjectBytes")]
    pub s: G::ScalarField,
    #[serde_as(as = "ArkObjectBytes")]
    pub s_id: G::ScalarField,
}

/// Protocol run by the card to prove knowledge of its key. Used by the software card.
#[derive(Clone, PartialEq, Eq, Debug, Zeroize, ZeroizeOnDrop)]
pub struct PoKOfKeyProtocol<G: AffineRepr> {
    #[zeroize(skip)]
    pub key_hat: G,
    /// Commitment `t` to blindings `rho_r, rho_id` with bases `g, user_key_prime * r`
    pub sc_comm: SchnorrCommitment<G>,
    /// Witnesses `r, -id`
    sc_wits: Vec<G::ScalarField>,
}

impl<G: CardPoint> ProofOfKey<G> {
    /// Bytes of an encoded proof, for digest `D`
    pub fn wire_length<D: Digest>() -> Result<usize, SmartcardKVACError> {
        Ok(G::ENCODED_LENGTH
            + checked_digest_length::<G::ScalarField, D>()?
            + 2 * scalar_length::<G>())
    }

    /// Decode a proof sent by the card. Each field is checked on its own and the first invalid one
    /// is reported with its own error.
    pub fn from_card_bytes<D: Digest>(bytes: &[u8]) -> Result<Self, SmartcardKVACError> {
        let digest_length = checked_digest_length::<G::ScalarField, D>()?;
        let scalar_length = scalar_length::<G>();
        let expected = Self::wire_length::<D>()?;
        if bytes.len() != expected {
            return Err(SmartcardKVACError::ResponseLengthMismatch {
                expected,
                received: bytes.len(),
            });
        }

        let (key_hat, rest) = bytes.split_at(G::ENCODED_LENGTH);
        let key_hat = G::from_card_bytes(key_hat).map_err(|_| SmartcardKVACError::InvalidKeyHat)?;

        let (e, rest) = rest.split_at(digest_length);
        let e = digest_to_scalar(e).map_err(|_| SmartcardKVACError::InvalidChallenge)?;

        let (s, s_id) = rest.split_at(scalar_length);
        let s = decode_scalar(s).map_err(|_| SmartcardKVACError::InvalidS)?;
        let s_id = decode_scalar(s_id).map_err(|_| SmartcardKVACError::InvalidSId)?;

        Ok(Self {
            key_hat,
            e,
            s,
            s_id,
        })
    }

    pub fn to_card_bytes<D: Digest>(&self) -> Result<Vec<u8>, SmartcardKVACError> {
        let digest_length = checked_digest_length::<G::ScalarField, D>()?;
        let scalar_length = scalar_length::<G>();
        let mut bytes = vec![0; Self::wire_length::<D>()?];

        let (key_hat, rest) = bytes.split_at_mut(G::ENCODED_LENGTH);
        self.key_hat.write_card_bytes(key_hat)?;
        let (e, rest) = rest.split_at_mut(digest_length);
        scalar_to_digest(&self.e, e)?;
        let (s, s_id) = rest.split_at_mut(scalar_length);
        encode_scalar(&self.s, s)?;
        encode_scalar(&self.s_id, s_id)?;
        Ok(bytes)
    }

    /// Verify the proof for `nonce` in `epoch`. Needs the issuer's secret key.
    pub fn verify<D: Digest>(
        &self,
        nonce: &Nonce,
        epoch: Epoch,
        secret_key: &IssuerSecretKey<G::ScalarField>,
        params: &SystemParams<G>,
    ) -> Result<(), SmartcardKVACError> {
        let t = self.commitment(epoch, secret_key, params)?;
        let mut challenge_bytes = vec![];
        compute_challenge_contribution(&self.key_hat, &t, nonce.as_ref(), &mut challenge_bytes)?;
        let e = compute_challenge::<G::ScalarField, D>(&challenge_bytes)?;
        if e != self.e {
            return Err(SmartcardKVACError::ProofRejected);
        }
        Ok(())
    }

    /// `t' = g * s + key_hat * (-e * k_0) + key_hat * (k_1 * s_id) + key_hat * (-e * k_2 * epoch)`,
    /// accumulated in this order
    fn commitment(
        &self,
        epoch: Epoch,
        secret_key: &IssuerSecretKey<G::ScalarField>,
        params: &SystemParams<G>,
    ) -> Result<G, SmartcardKVACError> {
        if !self.key_hat.is_valid_group_element() {
            return Err(SmartcardKVACError::InvalidKeyHat);
        }
        let epoch = epoch.to_scalar::<G::ScalarField>();
        let mut t = params.g * self.s;
        t += self.key_hat * (-(self.e * secret_key.k0));
        t += self.key_hat * (secret_key.k1 * self.s_id);
        t += self.key_hat * (-(self.e * secret_key.k2 * epoch));
        let t = t.into_affine();
        if !t.is_valid_group_element() {
            return Err(SmartcardKVACError::InvalidCommitment);
        }
        Ok(t)
    }
}

impl<G: CardPoint> PoKOfKeyProtocol<G> {
    pub fn init<R: RngCore>(
        rng: &mut R,
        signature: &IssuerSignature<G>,
        identifier: &UserIdentifier,
        params: &SystemParams<G>,
    ) -> Result<Self, SmartcardKVACError> {
        if !signature.has_valid_points() {
            return Err(SmartcardKVACError::InvalidSignature);
        }
        let mut r = G::ScalarField::rand(rng);
        while r.is_zero() {
            r = G::ScalarField::rand(rng);
        }
        let key_hat = (signature.user_key * r).into_affine();
        let key_prime_hat = (signature.user_key_prime * r).into_affine();
        let sc_comm = SchnorrCommitment::new(&[params.g, key_prime_hat], vec![rand(rng), rand(rng)]);
        Ok(Self {
            key_hat,
            sc_comm,
            sc_wits: vec![r, -identifier.to_scalar::<G::ScalarField>()],
        })
    }

    pub fn challenge_contribution<W: Write>(
        &self,
        nonce: &[u8],
        writer: W,
    ) -> Result<(), SmartcardKVACError> {
        compute_challenge_contribution(&self.key_hat, &self.sc_comm.t, nonce, writer)
    }

    pub fn gen_proof(self, challenge: &G::ScalarField) -> Result<ProofOfKey<G>, SmartcardKVACError> {
        let responses = self.sc_comm.response(&self.sc_wits, challenge)?;
        Ok(ProofOfKey {
            key_hat: self.key_hat,
            e: *challenge,
            s: *responses.get_response(0)?,
            s_id: *responses.get_response(1)?,
        })
    }
}

/// Bytes hashed for the challenge, `key_hat || t || nonce` with points in their card encoding
pub fn compute_challenge_contribution<G: CardPoint, W: Write>(
    key_hat: &G,
    t: &G,
    nonce: &[u8],
    mut writer: W,
) -> Result<(), SmartcardKVACError> {
    let mut point = vec![0; G::ENCODED_LENGTH];
    for p in [key_hat, t] {
        p.write_card_bytes(&mut point)?;
        writer
            .write_all(&point)
            .map_err(|_| SmartcardKVACError::EncodingError("cannot write challenge bytes"))?;
    }
    writer
        .write_all(nonce)
        .map_err(|_| SmartcardKVACError::EncodingError("cannot write challenge bytes"))
}

/// Hash the challenge bytes with `D` and pad the digest into a scalar
pub fn compute_challenge<F: PrimeField, D: Digest>(
    challenge_bytes: &[u8],
) -> Result<F, SmartcardKVACError> {
    checked_digest_length::<F, D>()?;
    digest_to_scalar(&D::digest(challenge_bytes)).map_err(|_| SmartcardKVACError::InvalidChallenge)
}
