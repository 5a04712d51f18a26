//! A card implemented in software. It answers the same commands with the same frames and status words as the
//! card application, which makes it usable wherever a [`Transport`] to a real reader is expected.

use ark_std::{marker::PhantomData, rand::RngCore, vec, vec::Vec};
use digest::Digest;

use crate::{
    apdu::{Case, CommandApdu, StatusWord},
    codec::CardPoint,
    constants::{
        CLA_ISO, IDENTIFIER_LENGTH, INS_GET_RESPONSE, NONCE_LENGTH, SW1_MORE_DATA,
        SW_CLA_NOT_SUPPORTED, SW_CONDITIONS_NOT_SATISFIED, SW_INCORRECT_P1P2,
        SW_INS_NOT_SUPPORTED, SW_SUCCESS, SW_WRONG_DATA, SW_WRONG_LENGTH,
    },
    error::SmartcardKVACError,
    proof::{compute_challenge, PoKOfKeyProtocol},
    setup::SystemParams,
    signature::{IssuerSignature, UserIdentifier},
    transport::{Exchange, Transport, TransportError},
    user::CommandSet,
};

/// No precise diagnosis
const SW_UNKNOWN: u16 = 0x6F00;
/// Wrong `Le`, `SW2` carries the available length
const SW1_WRONG_LE: u8 = 0x6C;

/// Software double of the card
pub struct SoftwareCard<G: CardPoint, D, R> {
    params: SystemParams<G>,
    commands: CommandSet,
    rng: R,
    identifier: Option<UserIdentifier>,
    signature: Option<IssuerSignature<G>>,
    /// Response left for `GET RESPONSE`
    pending: Vec<u8>,
    /// Answer case 4 commands with `61XX` like a T=0 card instead of returning the data directly
    chain_responses: bool,
    _digest: PhantomData<D>,
}

impl<G: CardPoint, D: Digest, R: RngCore> SoftwareCard<G, D, R> {
    pub fn new(params: SystemParams<G>, rng: R) -> Self {
        Self {
            params,
            commands: CommandSet::default(),
            rng,
            identifier: None,
            signature: None,
            pending: Vec::new(),
            chain_responses: true,
            _digest: PhantomData,
        }
    }

    pub fn with_commands(mut self, commands: CommandSet) -> Self {
        self.commands = commands;
        self
    }

    /// Return data in the response to the command itself, as a T=1 card does
    pub fn with_direct_responses(mut self) -> Self {
        self.chain_responses = false;
        self
    }

    pub fn is_provisioned(&self) -> bool {
        self.identifier.is_some() && self.signature.is_some()
    }

    pub fn identifier(&self) -> Option<&UserIdentifier> {
        self.identifier.as_ref()
    }

    /// Process one command frame and return the response data and status word
    pub fn process(&mut self, frame: &[u8]) -> (Vec<u8>, StatusWord) {
        let (data, sw) = match CommandApdu::parse(frame) {
            Ok(command) => self.dispatch(&command),
            Err(_) => (vec![], SW_WRONG_LENGTH),
        };
        (data, StatusWord(sw))
    }

    fn dispatch(&mut self, command: &CommandApdu<'_>) -> (Vec<u8>, u16) {
        // Only the command right after the one that left data pending may fetch it
        let pending = core::mem::take(&mut self.pending);
        if command.cla == CLA_ISO && command.ins == INS_GET_RESPONSE {
            return Self::get_response(command, pending);
        }
        if command.cla != self.commands.cla {
            return (vec![], SW_CLA_NOT_SUPPORTED);
        }
        if command.p1 != 0 || command.p2 != 0 {
            return (vec![], SW_INCORRECT_P1P2);
        }
        let ins = command.ins;
        if ins == self.commands.set_identifier_and_signature {
            (vec![], self.set_identifier_and_signature(command))
        } else if ins == self.commands.get_identifier {
            self.get_identifier(command)
        } else if ins == self.commands.compute_proof_of_key {
            self.compute_proof_of_key(command)
        } else {
            (vec![], SW_INS_NOT_SUPPORTED)
        }
    }

    fn get_response(command: &CommandApdu<'_>, pending: Vec<u8>) -> (Vec<u8>, u16) {
        if command.case != Case::Case2Short {
            return (vec![], SW_WRONG_LENGTH);
        }
        if command.p1 != 0 || command.p2 != 0 {
            return (vec![], SW_INCORRECT_P1P2);
        }
        if pending.is_empty() {
            return (vec![], SW_CONDITIONS_NOT_SATISFIED);
        }
        if command.expected_response_len() != pending.len() {
            return (
                vec![],
                u16::from_be_bytes([SW1_WRONG_LE, pending.len() as u8]),
            );
        }
        (pending, SW_SUCCESS)
    }

    fn set_identifier_and_signature(&mut self, command: &CommandApdu<'_>) -> u16 {
        if command.case != Case::Case3Short
            || command.data.len() != IDENTIFIER_LENGTH + 2 * G::ENCODED_LENGTH
        {
            return SW_WRONG_LENGTH;
        }
        let (identifier, points) = command.data.split_at(IDENTIFIER_LENGTH);
        let (user_key, user_key_prime) = points.split_at(G::ENCODED_LENGTH);
        let (user_key, user_key_prime) = match (
            G::from_card_bytes(user_key),
            G::from_card_bytes(user_key_prime),
        ) {
            (Ok(k), Ok(k_prime)) => (k, k_prime),
            _ => return SW_WRONG_DATA,
        };
        let identifier = match UserIdentifier::try_from(identifier) {
            Ok(id) => id,
            Err(_) => return SW_WRONG_DATA,
        };
        self.identifier = Some(identifier);
        self.signature = Some(IssuerSignature {
            user_key,
            user_key_prime,
        });
        tracing::debug!("software card provisioned");
        SW_SUCCESS
    }

    fn get_identifier(&self, command: &CommandApdu<'_>) -> (Vec<u8>, u16) {
        if command.case != Case::Case2Short {
            return (vec![], SW_WRONG_LENGTH);
        }
        match &self.identifier {
            Some(identifier) => (identifier.as_ref().to_vec(), SW_SUCCESS),
            None => (vec![], SW_CONDITIONS_NOT_SATISFIED),
        }
    }

    fn compute_proof_of_key(&mut self, command: &CommandApdu<'_>) -> (Vec<u8>, u16) {
        if !matches!(command.case, Case::Case3Short | Case::Case4Short)
            || command.data.len() != NONCE_LENGTH
        {
            return (vec![], SW_WRONG_LENGTH);
        }
        let proof = match self.prove(command.data) {
            Ok(proof) => proof,
            Err(SmartcardKVACError::InvalidArgument(_)) => {
                return (vec![], SW_CONDITIONS_NOT_SATISFIED)
            }
            Err(e) => {
                tracing::warn!(error = ?e, "software card failed to create a proof");
                return (vec![], SW_UNKNOWN);
            }
        };
        if proof.len() > 256 {
            tracing::warn!(len = proof.len(), "proof does not fit in a short response");
            return (vec![], SW_UNKNOWN);
        }
        if self.chain_responses {
            // `61 00` announces 256 bytes
            let sw = u16::from_be_bytes([SW1_MORE_DATA, proof.len() as u8]);
            self.pending = proof;
            (vec![], sw)
        } else {
            (proof, SW_SUCCESS)
        }
    }

    fn prove(&mut self, nonce: &[u8]) -> Result<Vec<u8>, SmartcardKVACError> {
        let (identifier, signature) = match (&self.identifier, &self.signature) {
            (Some(identifier), Some(signature)) => (identifier, signature),
            _ => return Err(SmartcardKVACError::InvalidArgument("card not provisioned")),
        };
        let protocol = PoKOfKeyProtocol::init(&mut self.rng, signature, identifier, &self.params)?;
        let mut challenge_bytes = vec![];
        protocol.challenge_contribution(nonce, &mut challenge_bytes)?;
        let challenge = compute_challenge::<G::ScalarField, D>(&challenge_bytes)?;
        protocol.gen_proof(&challenge)?.to_card_bytes::<D>()
    }
}

impl<G: CardPoint, D: Digest, R: RngCore> Transport for SoftwareCard<G, D, R> {
    fn transmit(
        &mut self,
        command: &[u8],
        response: &mut [u8],
    ) -> Result<Exchange, TransportError> {
        #[cfg(feature = "std")]
        let start = std::time::Instant::now();

        let (data, sw) = self.process(command);
        let len = data.len() + 2;
        if response.len() < len {
            return Err(TransportError::Io("response buffer too small".into()));
        }
        response[..data.len()].copy_from_slice(&data);
        response[data.len()..len].copy_from_slice(&sw.to_bytes());

        #[cfg(feature = "std")]
        let elapsed = Some(start.elapsed());
        #[cfg(not(feature = "std"))]
        let elapsed = None;
        Ok(Exchange { len, elapsed })
    }
}
