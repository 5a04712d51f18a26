//! The verifier role. It shares the issuer's secret key, so verification is keyed.

use ark_std::{cfg_into_iter, rand::RngCore, vec::Vec};
use digest::Digest;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
    codec::CardPoint,
    epoch::{Epoch, EpochSource},
    error::SmartcardKVACError,
    nonce::Nonce,
    proof::ProofOfKey,
    setup::{IssuerSecretKey, SystemParams},
};

pub struct Verifier<G: CardPoint, E> {
    pub params: SystemParams<G>,
    secret_key: IssuerSecretKey<G::ScalarField>,
    pub epoch_source: E,
}

impl<G: CardPoint, E: EpochSource> Verifier<G, E> {
    pub fn new(
        params: SystemParams<G>,
        secret_key: IssuerSecretKey<G::ScalarField>,
        epoch_source: E,
    ) -> Self {
        Self {
            params,
            secret_key,
            epoch_source,
        }
    }

    /// Fresh nonce for a single verification attempt
    pub fn generate_nonce<R: RngCore>(&self, rng: &mut R) -> Nonce {
        Nonce::random(rng)
    }

    pub fn current_epoch(&self) -> Result<Epoch, SmartcardKVACError> {
        self.epoch_source.current_epoch()
    }

    /// Verify a proof against the nonce sent to the card. The nonce is consumed so it can't back another attempt.
    pub fn verify<D: Digest>(
        &self,
        nonce: Nonce,
        proof: &ProofOfKey<G>,
    ) -> Result<(), SmartcardKVACError> {
        let epoch = self.current_epoch()?;
        self.verify_in_epoch::<D>(nonce, proof, epoch)
    }

    /// Verify independent attempts, in parallel with the `parallel` feature. The epoch is read once so every
    /// attempt is checked against the same one. Returns one result per attempt, in order.
    pub fn verify_batch<D: Digest>(
        &self,
        attempts: Vec<(Nonce, ProofOfKey<G>)>,
    ) -> Result<Vec<Result<(), SmartcardKVACError>>, SmartcardKVACError>
    where
        E: Sync,
    {
        let epoch = self.current_epoch()?;
        let results = cfg_into_iter!(attempts)
            .map(|(nonce, proof)| self.verify_in_epoch::<D>(nonce, &proof, epoch))
            .collect::<Vec<_>>();
        tracing::debug!(
            attempts = results.len(),
            accepted = results.iter().filter(|r| r.is_ok()).count(),
            "verified batch"
        );
        Ok(results)
    }

    fn verify_in_epoch<D: Digest>(
        &self,
        nonce: Nonce,
        proof: &ProofOfKey<G>,
        epoch: Epoch,
    ) -> Result<(), SmartcardKVACError> {
        let result = proof.verify::<D>(&nonce, epoch, &self.secret_key, &self.params);
        match &result {
            Ok(()) => tracing::debug!(epoch = epoch.0, "proof of key accepted"),
            Err(e) => tracing::debug!(epoch = epoch.0, error = ?e, "proof of key rejected"),
        }
        result
    }
}
