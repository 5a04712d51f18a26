//! Host side of the user role. Provisions a card with its identifier and the issuer's signature, and asks it
//! for proofs of key.

use ark_std::vec::Vec;
use digest::Digest;

use crate::{
    apdu::{Case, CommandApdu},
    codec::CardPoint,
    constants::{
        CLA_APPLICATION, IDENTIFIER_LENGTH, INS_COMPUTE_PROOF_OF_KEY, INS_GET_USER_IDENTIFIER,
        INS_SET_USER_IDENTIFIER_ISSUER_SIGNATURE, NONCE_LENGTH,
    },
    error::SmartcardKVACError,
    proof::ProofOfKey,
    signature::{IssuerSignature, UserIdentifier},
    transport::{CardChannel, Transport},
};

/// Class and instruction bytes of the card application
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandSet {
    pub cla: u8,
    pub set_identifier_and_signature: u8,
    pub compute_proof_of_key: u8,
    pub get_identifier: u8,
}

impl Default for CommandSet {
    fn default() -> Self {
        Self {
            cla: CLA_APPLICATION,
            set_identifier_and_signature: INS_SET_USER_IDENTIFIER_ISSUER_SIGNATURE,
            compute_proof_of_key: INS_COMPUTE_PROOF_OF_KEY,
            get_identifier: INS_GET_USER_IDENTIFIER,
        }
    }
}

/// A card reachable over a transport
#[derive(Debug)]
pub struct UserCard<T> {
    channel: CardChannel<T>,
    commands: CommandSet,
}

impl<T: Transport> UserCard<T> {
    pub fn new(transport: T) -> Self {
        Self::with_commands(transport, CommandSet::default())
    }

    pub fn with_commands(transport: T, commands: CommandSet) -> Self {
        Self {
            channel: CardChannel::new(transport),
            commands,
        }
    }

    pub fn commands(&self) -> &CommandSet {
        &self.commands
    }

    pub fn transport(&self) -> &T {
        self.channel.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.channel.transport_mut()
    }

    pub fn into_inner(self) -> T {
        self.channel.into_inner()
    }

    /// Identifier provisioned in the card
    pub fn get_identifier(&mut self) -> Result<UserIdentifier, SmartcardKVACError> {
        let command = CommandApdu::new(
            Case::Case2Short,
            self.commands.cla,
            self.commands.get_identifier,
            0x00,
            0x00,
            &[],
            IDENTIFIER_LENGTH as u8,
        )?;
        let data = self.channel.transmit(&command)?;
        if data.len() != IDENTIFIER_LENGTH {
            return Err(SmartcardKVACError::ResponseLengthMismatch {
                expected: IDENTIFIER_LENGTH,
                received: data.len(),
            });
        }
        UserIdentifier::try_from(data.as_slice())
    }

    /// Like [`Self::get_identifier`] but writes in `out` which must be exactly 32 bytes long
    pub fn get_identifier_into(&mut self, out: &mut [u8]) -> Result<(), SmartcardKVACError> {
        if out.len() != IDENTIFIER_LENGTH {
            return Err(SmartcardKVACError::InvalidArgument(
                "identifier destination must be 32 bytes",
            ));
        }
        let identifier = self.get_identifier()?;
        out.copy_from_slice(identifier.as_ref());
        Ok(())
    }

    /// Store the identifier and the issuer's signature in the card with a single command.
    /// If this fails the card state is unknown and it should be provisioned again.
    pub fn set_identifier_and_signature<G: CardPoint>(
        &mut self,
        identifier: impl AsRef<[u8]>,
        signature: &IssuerSignature<G>,
    ) -> Result<(), SmartcardKVACError> {
        let identifier = identifier.as_ref();
        if identifier.len() != IDENTIFIER_LENGTH {
            return Err(SmartcardKVACError::InvalidArgument(
                "identifier must be 32 bytes",
            ));
        }
        if !signature.has_valid_points() {
            return Err(SmartcardKVACError::InvalidArgument(
                "signature points must be valid group elements",
            ));
        }
        let data_len = IDENTIFIER_LENGTH + 2 * G::ENCODED_LENGTH;
        let mut data = [0u8; u8::MAX as usize];
        if data_len > data.len() {
            return Err(SmartcardKVACError::EncodingError(
                "identifier and signature do not fit in one command",
            ));
        }
        let (id, points) = data[..data_len].split_at_mut(IDENTIFIER_LENGTH);
        id.copy_from_slice(identifier);
        let (user_key, user_key_prime) = points.split_at_mut(G::ENCODED_LENGTH);
        signature.user_key.write_card_bytes(user_key)?;
        signature.user_key_prime.write_card_bytes(user_key_prime)?;

        let command = CommandApdu::new(
            Case::Case3Short,
            self.commands.cla,
            self.commands.set_identifier_and_signature,
            0x00,
            0x00,
            &data[..data_len],
            0,
        )?;
        let response = self.channel.transmit(&command)?;
        if !response.is_empty() {
            return Err(SmartcardKVACError::ResponseLengthMismatch {
                expected: 0,
                received: response.len(),
            });
        }
        tracing::debug!("card provisioned");
        Ok(())
    }

    /// Ask the card for a proof of key over `nonce`. The answer may come in 2 frames.
    pub fn request_proof<G: CardPoint, D: Digest>(
        &mut self,
        nonce: impl AsRef<[u8]>,
    ) -> Result<ProofOfKey<G>, SmartcardKVACError> {
        let nonce = nonce.as_ref();
        if nonce.len() != NONCE_LENGTH {
            return Err(SmartcardKVACError::InvalidArgument("nonce must be 20 bytes"));
        }
        let proof_len = ProofOfKey::<G>::wire_length::<D>()?;
        let le = CommandApdu::short_le(proof_len)?;
        let command = CommandApdu::new(
            Case::Case4Short,
            self.commands.cla,
            self.commands.compute_proof_of_key,
            0x00,
            0x00,
            nonce,
            le,
        )?;
        let payload: Vec<u8> = self.channel.transmit_chained(&command, proof_len)?;
        let proof = ProofOfKey::from_card_bytes::<D>(&payload);
        if let Err(e) = &proof {
            tracing::warn!(error = ?e, "card returned an invalid proof");
        }
        proof
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        epoch::Epoch,
        nonce::Nonce,
        proof::{compute_challenge, PoKOfKeyProtocol},
        setup::{IssuerSecretKey, SystemParams},
        transport::{tests::ScriptedTransport, TransportError},
    };
    use ark_bn254::{Fq, Fr, G1Affine};
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use blake2::Blake2b512;
    use sha1::Sha1;

    fn frame(data: &[u8], sw: u16) -> Result<Vec<u8>, TransportError> {
        let mut f = data.to_vec();
        f.extend_from_slice(&sw.to_be_bytes());
        Ok(f)
    }

    fn issue() -> (
        SystemParams<G1Affine>,
        IssuerSecretKey<Fr>,
        UserIdentifier,
        IssuerSignature<G1Affine>,
    ) {
        let mut rng = StdRng::seed_from_u64(0u64);
        let params = SystemParams::<G1Affine>::new::<Blake2b512>(b"test");
        let sk = IssuerSecretKey::new(&mut rng);
        let identifier = UserIdentifier([3; 32]);
        let signature = IssuerSignature::new(&identifier, Epoch(100), &sk, &params).unwrap();
        (params, sk, identifier, signature)
    }

    #[test]
    fn provisioning() {
        let (_, _, identifier, signature) = issue();
        let mut card = UserCard::new(ScriptedTransport::new([frame(&[], 0x9000)]));
        card.set_identifier_and_signature(identifier, &signature)
            .unwrap();

        let command = &card.transport().commands[0];
        assert_eq!(command.len(), 5 + 32 + 65 + 65);
        assert_eq!(&command[..5], &[0x80, 0x10, 0x00, 0x00, 162]);
        assert_eq!(&command[5..37], &[3; 32]);
        assert_eq!(
            G1Affine::from_card_bytes(&command[37..102]).unwrap(),
            signature.user_key
        );
        assert_eq!(
            G1Affine::from_card_bytes(&command[102..]).unwrap(),
            signature.user_key_prime
        );

        // The card reports failure and nothing is retried
        let mut card = UserCard::new(ScriptedTransport::new([
            frame(&[], 0x6A80),
            frame(&[], 0x9000),
        ]));
        assert!(matches!(
            card.set_identifier_and_signature(identifier, &signature),
            Err(SmartcardKVACError::CardStatus { sw: 0x6A80, .. })
        ));
        assert_eq!(card.transport().commands.len(), 1);
    }

    #[test]
    fn wrong_identifier_length_sends_nothing() {
        let (_, _, _, signature) = issue();
        let mut card = UserCard::new(ScriptedTransport::new([frame(&[], 0x9000)]));
        for len in [0, 31, 33] {
            assert!(matches!(
                card.set_identifier_and_signature(vec![1u8; len], &signature),
                Err(SmartcardKVACError::InvalidArgument(_))
            ));
        }
        let identity = IssuerSignature {
            user_key: G1Affine::identity(),
            user_key_prime: signature.user_key_prime,
        };
        assert!(matches!(
            card.set_identifier_and_signature([1u8; 32], &identity),
            Err(SmartcardKVACError::InvalidArgument(_))
        ));
        assert!(card.transport().commands.is_empty());
    }

    #[test]
    fn invalid_signature_points_send_nothing() {
        let (_, _, identifier, signature) = issue();
        // y^2 = 9 but x^3 + 3 = 4
        let off_curve = G1Affine::new_unchecked(Fq::from(1u64), Fq::from(3u64));
        assert!(!off_curve.is_on_curve());

        let mut card = UserCard::new(ScriptedTransport::new([frame(&[], 0x9000)]));
        for bad in [
            IssuerSignature {
                user_key: off_curve,
                user_key_prime: signature.user_key_prime,
            },
            IssuerSignature {
                user_key: signature.user_key,
                user_key_prime: off_curve,
            },
        ] {
            assert!(matches!(
                card.set_identifier_and_signature(identifier, &bad),
                Err(SmartcardKVACError::InvalidArgument(_))
            ));
        }
        assert!(card.transport().commands.is_empty());

        card.set_identifier_and_signature(identifier, &signature)
            .unwrap();
        assert_eq!(card.transport().commands.len(), 1);
    }

    #[test]
    fn identifier_retrieval() {
        let mut card = UserCard::new(ScriptedTransport::new([
            frame(&[9; 32], 0x9000),
            frame(&[9; 32], 0x9000),
            frame(&[9; 31], 0x9000),
            frame(&[], 0x6985),
        ]));
        assert_eq!(card.get_identifier().unwrap(), UserIdentifier([9; 32]));
        assert_eq!(card.transport().commands[0], vec![0x80, 0x30, 0, 0, 32]);

        let mut out = [0u8; 32];
        card.get_identifier_into(&mut out).unwrap();
        assert_eq!(out, [9; 32]);

        assert!(matches!(
            card.get_identifier_into(&mut [0u8; 16]),
            Err(SmartcardKVACError::InvalidArgument(_))
        ));
        assert_eq!(card.transport().commands.len(), 2);

        assert!(matches!(
            card.get_identifier(),
            Err(SmartcardKVACError::ResponseLengthMismatch {
                expected: 32,
                received: 31
            })
        ));
        assert!(matches!(
            card.get_identifier(),
            Err(SmartcardKVACError::CardStatus { sw: 0x6985, .. })
        ));
    }

    #[test]
    fn proof_request() {
        let (params, sk, identifier, signature) = issue();
        let mut rng = StdRng::seed_from_u64(1u64);
        let nonce = Nonce::random(&mut rng);

        let protocol = PoKOfKeyProtocol::init(&mut rng, &signature, &identifier, &params).unwrap();
        let mut challenge_bytes = vec![];
        protocol
            .challenge_contribution(nonce.as_ref(), &mut challenge_bytes)
            .unwrap();
        let challenge = compute_challenge::<Fr, Sha1>(&challenge_bytes).unwrap();
        let proof = protocol.gen_proof(&challenge).unwrap();
        let bytes = proof.to_card_bytes::<Sha1>().unwrap();

        let mut card = UserCard::new(ScriptedTransport::new([
            frame(&[], 0x6195),
            frame(&bytes, 0x9000),
        ]));
        let received = card.request_proof::<G1Affine, Sha1>(&nonce).unwrap();
        assert_eq!(received, proof);
        received.verify::<Sha1>(&nonce, Epoch(100), &sk, &params).unwrap();

        let commands = &card.transport().commands;
        assert_eq!(&commands[0][..5], &[0x80, 0x20, 0, 0, 20]);
        assert_eq!(&commands[0][5..25], nonce.as_ref());
        assert_eq!(commands[0][25], 149);
        assert_eq!(commands[1], vec![0x00, 0xC0, 0, 0, 0x95]);

        // Corrupted s
        let mut corrupted = bytes.clone();
        corrupted[85..117].copy_from_slice(&[0xff; 32]);
        let mut card = UserCard::new(ScriptedTransport::new([
            frame(&[], 0x6195),
            frame(&corrupted, 0x9000),
        ]));
        assert!(matches!(
            card.request_proof::<G1Affine, Sha1>(&nonce),
            Err(SmartcardKVACError::InvalidS)
        ));

        // Nonce of the wrong length is refused before any exchange
        let mut card = UserCard::new(ScriptedTransport::new([]));
        assert!(matches!(
            card.request_proof::<G1Affine, Sha1>([0u8; 19]),
            Err(SmartcardKVACError::InvalidArgument(_))
        ));
        assert!(card.transport().commands.is_empty());

        // A timeout is reported as is
        let mut card = UserCard::new(ScriptedTransport::new([
            frame(&[], 0x6195),
            Err(TransportError::Timeout),
        ]));
        assert!(matches!(
            card.request_proof::<G1Affine, Sha1>(&nonce),
            Err(SmartcardKVACError::Transport(TransportError::Timeout))
        ));
    }

    #[test]
    fn custom_commands() {
        let commands = CommandSet {
            cla: 0xB0,
            get_identifier: 0x42,
            ..CommandSet::default()
        };
        let mut card = UserCard::with_commands(
            ScriptedTransport::new([frame(&[1; 32], 0x9000)]),
            commands,
        );
        card.get_identifier().unwrap();
        assert_eq!(card.transport().commands[0], vec![0xB0, 0x42, 0, 0, 32]);
    }
}
