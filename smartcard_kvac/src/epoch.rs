//! Epochs bind a credential to a time window. The card holds a signature over its identifier for the current
//! epoch and the verifier derives the same epoch on its own, so both sides must agree on the epoch source.
//! A proof made with a signature for another epoch is simply rejected.

use ark_ff::PrimeField;
use serde::{Deserialize, Serialize};

use crate::error::SmartcardKVACError;

#[cfg(feature = "std")]
use crate::constants::DEFAULT_EPOCH_PERIOD_SECS;

/// Counter of elapsed epochs. Its 4 big-endian bytes are right-aligned in a scalar sized buffer, so as a scalar
/// it is the counter itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Epoch(pub u32);

impl Epoch {
    pub fn to_scalar<F: PrimeField>(&self) -> F {
        F::from(self.0 as u64)
    }

    pub fn to_be_bytes(&self) -> [u8; crate::constants::EPOCH_LENGTH] {
        self.0.to_be_bytes()
    }

    pub fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Where a role learns the current epoch from
pub trait EpochSource {
    fn current_epoch(&self) -> Result<Epoch, SmartcardKVACError>;
}

/// Always the same epoch. For tests and for deployments where the epoch is distributed out of band.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedEpoch(pub Epoch);

impl EpochSource for FixedEpoch {
    fn current_epoch(&self) -> Result<Epoch, SmartcardKVACError> {
        Ok(self.0)
    }
}

/// Number of whole `period_secs` periods since the UNIX epoch
#[cfg(feature = "std")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SystemClockEpoch {
    pub period_secs: u64,
}

#[cfg(feature = "std")]
impl Default for SystemClockEpoch {
    fn default() -> Self {
        Self {
            period_secs: DEFAULT_EPOCH_PERIOD_SECS,
        }
    }
}

#[cfg(feature = "std")]
impl SystemClockEpoch {
    pub fn epoch_at(&self, time: std::time::SystemTime) -> Result<Epoch, SmartcardKVACError> {
        if self.period_secs == 0 {
            return Err(SmartcardKVACError::InvalidArgument("epoch period is 0"));
        }
        let elapsed = time
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|_| SmartcardKVACError::ClockUnavailable)?;
        u32::try_from(elapsed.as_secs() / self.period_secs)
            .map(Epoch)
            .map_err(|_| SmartcardKVACError::ClockUnavailable)
    }
}

#[cfg(feature = "std")]
impl EpochSource for SystemClockEpoch {
    fn current_epoch(&self) -> Result<Epoch, SmartcardKVACError> {
        self.epoch_at(std::time::SystemTime::now())
    }
}

impl<E: EpochSource + ?Sized> EpochSource for &E {
    fn current_epoch(&self) -> Result<Epoch, SmartcardKVACError> {
        (**self).current_epoch()
    }
}
