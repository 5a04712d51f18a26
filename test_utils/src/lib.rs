use ark_bn254::Bn254;
use ark_ec::pairing::Pairing;

pub type Fr = <Bn254 as Pairing>::ScalarField;
pub type G1 = <Bn254 as Pairing>::G1Affine;

#[macro_use]
pub mod serialization;
pub mod kvac;
pub mod transport;
