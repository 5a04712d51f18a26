use ark_std::rand::RngCore;

use crate::{constants::NONCE_LENGTH, error::SmartcardKVACError};

/// Fresh random bytes sent by the verifier and hashed into the challenge of the proof of key.
/// [`crate::verifier::Verifier::verify`] takes it by value. Callers must still not reuse the bytes for
/// another attempt.
#[derive(Debug, PartialEq, Eq)]
pub struct Nonce([u8; NONCE_LENGTH]);

impl Nonce {
    pub fn random<R: RngCore>(rng: &mut R) -> Self {
        let mut bytes = [0u8; NONCE_LENGTH];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_LENGTH] {
        &self.0
    }
}

impl From<[u8; NONCE_LENGTH]> for Nonce {
    fn from(bytes: [u8; NONCE_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Nonce {
    type Error = SmartcardKVACError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        <[u8; NONCE_LENGTH]>::try_from(bytes)
            .map(Self)
            .map_err(|_| SmartcardKVACError::InvalidArgument("nonce must be 20 bytes"))
    }
}

impl AsRef<[u8]> for Nonce {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
