//! Conversion between the card's fixed width encodings and arkworks types.
//!
//! - A point is `0x04 || X || Y` with both coordinates big-endian. The point at infinity has no encoding.
//! - A scalar is big-endian. Values not less than the group order are rejected, never reduced.
//! - Every coordinate and scalar takes exactly `ceil(modulus_bits / 8)` bytes of its field.
//!
//! The card hashes with a digest shorter than a scalar. Such a digest becomes a scalar by copying it into the
//! trailing bytes of a zeroed scalar sized buffer, see [`pad_digest`]. Card and host must pad identically or
//! no challenge ever matches.

use crate::{constants::UNCOMPRESSED_POINT_TAG, error::SmartcardKVACError};
use ark_ec::{
    short_weierstrass::{Affine, SWCurveConfig},
    AffineRepr,
};
use ark_ff::{BigInteger, PrimeField};
use ark_std::{vec, vec::Vec};
use digest::Digest;

/// Number of bytes used to encode an element of the prime field `F`
pub fn field_byte_length<F: PrimeField>() -> usize {
    (F::MODULUS_BIT_SIZE as usize + 7) / 8
}

/// Number of bytes used to encode a scalar of group `G`
pub fn scalar_length<G: AffineRepr>() -> usize {
    field_byte_length::<G::ScalarField>()
}

/// An affine group element with a card wire encoding
pub trait CardPoint: AffineRepr {
    /// Bytes per coordinate
    const COORDINATE_LENGTH: usize;
    /// Bytes of an encoded point, tag included
    const ENCODED_LENGTH: usize = 1 + 2 * Self::COORDINATE_LENGTH;

    /// Write the encoding in `out` which must be exactly [`Self::ENCODED_LENGTH`] bytes long.
    fn write_card_bytes(&self, out: &mut [u8]) -> Result<(), SmartcardKVACError>;

    /// Decode a point and check that it is on the curve and in the prime order subgroup.
    fn from_card_bytes(bytes: &[u8]) -> Result<Self, SmartcardKVACError>;

    /// Not the identity, on the curve and in the prime order subgroup
    fn is_valid_group_element(&self) -> bool;

    fn to_card_bytes(&self) -> Result<Vec<u8>, SmartcardKVACError> {
        let mut out = vec![0; Self::ENCODED_LENGTH];
        self.write_card_bytes(&mut out)?;
        Ok(out)
    }
}

impl<P: SWCurveConfig> CardPoint for Affine<P>
where
    P::BaseField: PrimeField,
{
    const COORDINATE_LENGTH: usize =
        (<P::BaseField as PrimeField>::MODULUS_BIT_SIZE as usize + 7) / 8;

    fn write_card_bytes(&self, out: &mut [u8]) -> Result<(), SmartcardKVACError> {
        if out.len() != Self::ENCODED_LENGTH {
            return Err(SmartcardKVACError::EncodingError(
                "point buffer has the wrong length",
            ));
        }
        if self.infinity {
            return Err(SmartcardKVACError::EncodingError(
                "point at infinity has no card encoding",
            ));
        }
        let (tag, coordinates) = out.split_at_mut(1);
        let (x, y) = coordinates.split_at_mut(Self::COORDINATE_LENGTH);
        tag[0] = UNCOMPRESSED_POINT_TAG;
        write_field_be(&self.x, x);
        write_field_be(&self.y, y);
        Ok(())
    }

    fn from_card_bytes(bytes: &[u8]) -> Result<Self, SmartcardKVACError> {
        if bytes.len() != Self::ENCODED_LENGTH || bytes[0] != UNCOMPRESSED_POINT_TAG {
            return Err(SmartcardKVACError::InvalidCurvePoint);
        }
        let (x, y) = bytes[1..].split_at(Self::COORDINATE_LENGTH);
        let x = read_field_be::<P::BaseField>(x).ok_or(SmartcardKVACError::InvalidCurvePoint)?;
        let y = read_field_be::<P::BaseField>(y).ok_or(SmartcardKVACError::InvalidCurvePoint)?;
        let point = Affine::<P>::new_unchecked(x, y);
        if !point.is_valid_group_element() {
            return Err(SmartcardKVACError::InvalidCurvePoint);
        }
        Ok(point)
    }

    fn is_valid_group_element(&self) -> bool {
        !self.infinity && self.is_on_curve() && self.is_in_correct_subgroup_assuming_on_curve()
    }
}

/// `0x04 || X || Y`, fails for the point at infinity
pub fn encode_point<G: CardPoint>(point: &G) -> Result<Vec<u8>, SmartcardKVACError> {
    point.to_card_bytes()
}

/// Inverse of [`encode_point`]. Anything but a valid group element is
/// [`SmartcardKVACError::InvalidCurvePoint`].
pub fn decode_point<G: CardPoint>(bytes: &[u8]) -> Result<G, SmartcardKVACError> {
    G::from_card_bytes(bytes)
}

/// Write `scalar` big-endian in `out` which must be exactly [`field_byte_length`] bytes long.
pub fn encode_scalar<F: PrimeField>(scalar: &F, out: &mut [u8]) -> Result<(), SmartcardKVACError> {
    if out.len() != field_byte_length::<F>() {
        return Err(SmartcardKVACError::EncodingError(
            "scalar buffer has the wrong length",
        ));
    }
    write_field_be(scalar, out);
    Ok(())
}

pub fn decode_scalar<F: PrimeField>(bytes: &[u8]) -> Result<F, SmartcardKVACError> {
    if bytes.len() != field_byte_length::<F>() {
        return Err(SmartcardKVACError::InvalidScalar);
    }
    read_field_be(bytes).ok_or(SmartcardKVACError::InvalidScalar)
}

/// Length of the digest `D` after checking it is strictly shorter than a scalar of `F`
pub fn checked_digest_length<F: PrimeField, D: Digest>() -> Result<usize, SmartcardKVACError> {
    let digest_length = <D as Digest>::output_size();
    let width = field_byte_length::<F>();
    if digest_length >= width {
        return Err(SmartcardKVACError::DigestTooLong(digest_length, width));
    }
    Ok(digest_length)
}

/// Place `digest` in the trailing bytes of a zeroed scalar sized buffer.
pub fn pad_digest<F: PrimeField>(digest: &[u8]) -> Result<Vec<u8>, SmartcardKVACError> {
    let width = field_byte_length::<F>();
    if digest.len() >= width {
        return Err(SmartcardKVACError::DigestTooLong(digest.len(), width));
    }
    let mut padded = vec![0; width];
    padded[width - digest.len()..].copy_from_slice(digest);
    Ok(padded)
}

/// Pad `digest` and decode it as a scalar
pub fn digest_to_scalar<F: PrimeField>(digest: &[u8]) -> Result<F, SmartcardKVACError> {
    decode_scalar(&pad_digest::<F>(digest)?)
}

/// Inverse of [`digest_to_scalar`]. Fails if `scalar` has a non-zero byte outside the trailing `out.len()` bytes.
pub fn scalar_to_digest<F: PrimeField>(
    scalar: &F,
    out: &mut [u8],
) -> Result<(), SmartcardKVACError> {
    let width = field_byte_length::<F>();
    if out.len() >= width {
        return Err(SmartcardKVACError::DigestTooLong(out.len(), width));
    }
    let mut encoded = vec![0; width];
    write_field_be(scalar, &mut encoded);
    let (padding, digest) = encoded.split_at(width - out.len());
    if padding.iter().any(|b| *b != 0) {
        return Err(SmartcardKVACError::EncodingError(
            "scalar does not fit in the digest width",
        ));
    }
    out.copy_from_slice(digest);
    Ok(())
}

fn write_field_be<F: PrimeField>(element: &F, out: &mut [u8]) {
    let bytes = element.into_bigint().to_bytes_be();
    out.copy_from_slice(&bytes[bytes.len() - out.len()..]);
}

/// Big-endian bytes of a field element, `None` unless less than the modulus
fn read_field_be<F: PrimeField>(bytes: &[u8]) -> Option<F> {
    let modulus = F::MODULUS.to_bytes_be();
    if bytes.len() > modulus.len() {
        return None;
    }
    let (high, modulus) = modulus.split_at(modulus.len() - bytes.len());
    // Same width, so byte order is numeric order
    if high.iter().all(|b| *b == 0) && bytes >= modulus {
        return None;
    }
    Some(F::from_be_bytes_mod_order(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::{Fr, G1Affine};
    use ark_ec::CurveGroup;
    use ark_ff::{One, Zero};
    use ark_std::{
        rand::{rngs::StdRng, SeedableRng},
        UniformRand,
    };
    use sha1::Sha1;

    #[test]
    fn bn254_widths() {
        assert_eq!(G1Affine::COORDINATE_LENGTH, 32);
        assert_eq!(G1Affine::ENCODED_LENGTH, 65);
        assert_eq!(scalar_length::<G1Affine>(), 32);
        assert_eq!(ark_bls12_381::G1Affine::ENCODED_LENGTH, 97);
        assert_eq!(scalar_length::<ark_bls12_381::G1Affine>(), 32);
        assert_eq!(checked_digest_length::<Fr, Sha1>().unwrap(), 20);
        assert!(matches!(
            checked_digest_length::<Fr, sha2::Sha256>(),
            Err(SmartcardKVACError::DigestTooLong(32, 32))
        ));
    }

    #[test]
    fn point_encoding() {
        let mut rng = StdRng::seed_from_u64(0u64);
        let point = (G1Affine::generator() * Fr::rand(&mut rng)).into_affine();
        let bytes = encode_point(&point).unwrap();
        assert_eq!(bytes.len(), 65);
        assert_eq!(bytes[0], UNCOMPRESSED_POINT_TAG);
        assert_eq!(decode_point::<G1Affine>(&bytes).unwrap(), point);

        // Generator of BN254 G1 is (1, 2)
        let g = encode_point(&G1Affine::generator()).unwrap();
        assert!(g[1..32].iter().all(|b| *b == 0));
        assert_eq!(g[32], 1);
        assert!(g[33..64].iter().all(|b| *b == 0));
        assert_eq!(g[64], 2);

        assert!(matches!(
            encode_point(&G1Affine::zero()),
            Err(SmartcardKVACError::EncodingError(_))
        ));
        assert!(matches!(
            point.write_card_bytes(&mut [0; 64]),
            Err(SmartcardKVACError::EncodingError(_))
        ));
    }

    #[test]
    fn invalid_points_are_rejected() {
        let mut rng = StdRng::seed_from_u64(1u64);
        let point = (G1Affine::generator() * Fr::rand(&mut rng)).into_affine();
        let bytes = encode_point(&point).unwrap();

        // Not on the curve
        let mut off_curve = bytes.clone();
        off_curve[64] ^= 0x01;
        assert!(matches!(
            decode_point::<G1Affine>(&off_curve),
            Err(SmartcardKVACError::InvalidCurvePoint)
        ));

        // Wrong tag, compressed and infinity tags are not accepted
        for tag in [0x00, 0x02, 0x03] {
            let mut wrong_tag = bytes.clone();
            wrong_tag[0] = tag;
            assert!(matches!(
                decode_point::<G1Affine>(&wrong_tag),
                Err(SmartcardKVACError::InvalidCurvePoint)
            ));
        }

        // Wrong length
        assert!(matches!(
            decode_point::<G1Affine>(&bytes[..64]),
            Err(SmartcardKVACError::InvalidCurvePoint)
        ));

        // Coordinate not less than the base field modulus
        let mut too_big = bytes.clone();
        too_big[1..33].copy_from_slice(&[0xff; 32]);
        assert!(matches!(
            decode_point::<G1Affine>(&too_big),
            Err(SmartcardKVACError::InvalidCurvePoint)
        ));

        // Coordinate equal to the modulus, which reduces to a point on the curve
        let mut at_modulus = bytes.clone();
        at_modulus[1..33].copy_from_slice(&ark_bn254::Fq::MODULUS.to_bytes_be());
        let reduced = ark_bn254::Fq::from_be_bytes_mod_order(&at_modulus[1..33]);
        assert_eq!(reduced, ark_bn254::Fq::zero());
        assert!(matches!(
            decode_point::<G1Affine>(&at_modulus),
            Err(SmartcardKVACError::InvalidCurvePoint)
        ));

        assert!(matches!(
            decode_point::<G1Affine>(&[0; 65]),
            Err(SmartcardKVACError::InvalidCurvePoint)
        ));
    }

    #[test]
    fn points_outside_subgroup_are_rejected() {
        // BLS12-381 G1 has a large cofactor so most points on the curve are not in the prime order subgroup
        type P = ark_bls12_381::g1::Config;
        let mut x = ark_bls12_381::Fq::one();
        let point = loop {
            if let Some(p) = Affine::<P>::get_point_from_x_unchecked(x, true) {
                if !p.is_in_correct_subgroup_assuming_on_curve() {
                    break p;
                }
            }
            x += ark_bls12_381::Fq::one();
        };
        assert!(point.is_on_curve());
        let bytes = point.to_card_bytes().unwrap();
        assert!(matches!(
            Affine::<P>::from_card_bytes(&bytes),
            Err(SmartcardKVACError::InvalidCurvePoint)
        ));

        let in_subgroup = point.clear_cofactor();
        let bytes = in_subgroup.to_card_bytes().unwrap();
        assert_eq!(Affine::<P>::from_card_bytes(&bytes).unwrap(), in_subgroup);
    }

    #[test]
    fn scalar_encoding() {
        let mut rng = StdRng::seed_from_u64(2u64);
        let scalar = Fr::rand(&mut rng);
        let mut bytes = [0; 32];
        encode_scalar(&scalar, &mut bytes).unwrap();
        assert_eq!(decode_scalar::<Fr>(&bytes).unwrap(), scalar);
        assert_eq!(Fr::from_be_bytes_mod_order(&bytes), scalar);

        let mut one = [0; 32];
        one[31] = 1;
        assert_eq!(decode_scalar::<Fr>(&one).unwrap(), Fr::one());

        // The modulus itself and anything above it is rejected
        let modulus = Fr::MODULUS.to_bytes_be();
        assert!(matches!(
            decode_scalar::<Fr>(&modulus),
            Err(SmartcardKVACError::InvalidScalar)
        ));
        assert!(matches!(
            decode_scalar::<Fr>(&[0xff; 32]),
            Err(SmartcardKVACError::InvalidScalar)
        ));
        let largest = (-Fr::one()).into_bigint().to_bytes_be();
        assert_eq!(decode_scalar::<Fr>(&largest).unwrap(), -Fr::one());
        let mut above = largest.clone();
        above[31] += 2;
        assert!(matches!(
            decode_scalar::<Fr>(&above),
            Err(SmartcardKVACError::InvalidScalar)
        ));

        // BLS12-381 scalars have spare high bits too
        let modulus = ark_bls12_381::Fr::MODULUS.to_bytes_be();
        assert!(decode_scalar::<ark_bls12_381::Fr>(&modulus).is_err());
        let mut below = modulus.clone();
        below[31] -= 1;
        assert_eq!(
            decode_scalar::<ark_bls12_381::Fr>(&below).unwrap(),
            -ark_bls12_381::Fr::one()
        );

        assert!(matches!(
            decode_scalar::<Fr>(&[0; 31]),
            Err(SmartcardKVACError::InvalidScalar)
        ));
        assert!(matches!(
            encode_scalar(&scalar, &mut [0; 33]),
            Err(SmartcardKVACError::EncodingError(_))
        ));
    }

    #[test]
    fn digest_padding() {
        let digest = [0xffu8; 20];
        let padded = pad_digest::<Fr>(&digest).unwrap();
        assert_eq!(padded.len(), 32);
        assert!(padded[..12].iter().all(|b| *b == 0));
        assert_eq!(&padded[12..], &digest);
        assert_eq!(pad_digest::<Fr>(&digest).unwrap(), padded);

        // A padded digest is always a valid scalar and equal to the digest read as an integer
        let e = digest_to_scalar::<Fr>(&digest).unwrap();
        assert_eq!(e, Fr::from_be_bytes_mod_order(&digest));
        assert_eq!(digest_to_scalar::<Fr>(&digest).unwrap(), e);

        let mut back = [0; 20];
        scalar_to_digest(&e, &mut back).unwrap();
        assert_eq!(back, digest);

        // A full width scalar does not fit back in a digest
        assert!(matches!(
            scalar_to_digest(&-Fr::one(), &mut back),
            Err(SmartcardKVACError::EncodingError(_))
        ));
        assert!(matches!(
            pad_digest::<Fr>(&[0; 32]),
            Err(SmartcardKVACError::DigestTooLong(32, 32))
        ));
        assert_eq!(digest_to_scalar::<Fr>(&[0; 20]).unwrap(), Fr::zero());
    }
}
