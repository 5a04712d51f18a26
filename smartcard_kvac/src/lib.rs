#![cfg_attr(not(feature = "std"), no_std)]

//! Keyed-verification anonymous credentials with the user's secret held by a smart card, following
//! [Fast Keyed-Verification Anonymous Credentials on Standard Smart Cards](https://eprint.iacr.org/2019/460).
//!
//! There are 3 roles:
//! - the issuer signs the user's identifier and the current epoch, see [`signature::IssuerSignature`]
//! - the user's card stores that signature and, for every nonce a verifier sends, proves knowledge of it
//!   without revealing the identifier. The host side of this is [`user::UserCard`] which talks to the card
//!   over a [`transport::Transport`] using short APDUs
//! - the verifier holds the issuer's secret key and checks the proof for the current epoch, see [`verifier::Verifier`]
//!
//! [`emulator::SoftwareCard`] is a software card speaking the same wire protocol as the card application.
//!
//! Points and scalars go over the wire in the fixed width encodings of [`codec`]. The card hashes with a
//! digest shorter than a scalar which is padded into a scalar before use.

pub mod apdu;
pub mod codec;
pub mod constants;
pub mod emulator;
pub mod epoch;
pub mod error;
pub mod nonce;
pub mod proof;
pub mod setup;
pub mod signature;
pub mod transport;
pub mod user;
pub mod verifier;

pub mod prelude {
    pub use crate::{
        codec::CardPoint,
        emulator::SoftwareCard,
        epoch::{Epoch, EpochSource, FixedEpoch},
        error::SmartcardKVACError,
        nonce::Nonce,
        proof::ProofOfKey,
        setup::{IssuerPublicKey, IssuerSecretKey, SystemParams},
        signature::{IssuerSignature, UserIdentifier},
        transport::{Transport, TransportError},
        user::{CommandSet, UserCard},
        verifier::Verifier,
    };

    #[cfg(feature = "std")]
    pub use crate::epoch::SystemClockEpoch;
}
