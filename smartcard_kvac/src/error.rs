use ark_std::string::String;
use schnorr_pok::error::SchnorrError;

use crate::transport::TransportError;

#[derive(Debug)]
pub enum SmartcardKVACError {
    /// Caller supplied input of the wrong shape, like a nonce or identifier of the wrong length
    InvalidArgument(&'static str),
    /// A command or a wire encoding could not be built
    EncodingError(&'static str),
    Transport(TransportError),
    /// The card answered with a status word other than success or "more data"
    CardStatus {
        sw: u16,
        message: String,
    },
    /// Response frame too short to carry a status word
    MalformedResponse,
    UnexpectedStatus(u16),
    ResponseLengthMismatch {
        expected: usize,
        received: usize,
    },
    InvalidCurvePoint,
    InvalidScalar,
    InvalidKeyHat,
    InvalidChallenge,
    InvalidS,
    InvalidSId,
    InvalidCommitment,
    ProofRejected,
    /// Digest output size and scalar size. The digest must be strictly shorter than a scalar.
    DigestTooLong(usize, usize),
    CannotInvert0,
    InvalidSignature,
    InvalidSystemParams,
    ClockUnavailable,
    SchnorrError(SchnorrError),
}

impl From<TransportError> for SmartcardKVACError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<SchnorrError> for SmartcardKVACError {
    fn from(e: SchnorrError) -> Self {
        Self::SchnorrError(e)
    }
}
