//! The boundary to the reader driver and the command channel built over it.
//!
//! A card is half-duplex, so a [`Transport`] is used through `&mut self` and a [`CardChannel`] never has more
//! than one command in flight. Nothing here retries: a failed exchange leaves the card in an unknown state
//! and the failure goes back to the caller.

use crate::{
    apdu::{CommandApdu, ResponseApdu, Status, StatusWord},
    constants::{MAX_COMMAND_LENGTH, MAX_RESPONSE_LENGTH},
    error::SmartcardKVACError,
};
use ark_std::{
    fmt,
    string::{String, ToString},
    vec::Vec,
};
use core::time::Duration;

/// Failure of the channel itself, as opposed to a failure status returned by the card
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportError {
    Timeout,
    Disconnected,
    /// Driver specific failure with its diagnostic text
    Io(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timed out waiting for the card"),
            Self::Disconnected => write!(f, "card or reader disconnected"),
            Self::Io(msg) => write!(f, "{}", msg),
        }
    }
}

/// Outcome of a single exchange
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Exchange {
    /// Number of bytes written in the response buffer, status word included
    pub len: usize,
    /// Time the card took, when the driver measures it. Only used for tracing.
    pub elapsed: Option<Duration>,
}

/// Moves bytes to and from a card, e.g. a PC/SC reader or [`crate::emulator::SoftwareCard`].
pub trait Transport {
    /// Send `command` and write the response frame, data followed by `SW1 SW2`, in `response`.
    fn transmit(
        &mut self,
        command: &[u8],
        response: &mut [u8],
    ) -> Result<Exchange, TransportError>;

    /// Human readable text for a failure status word
    fn describe_status(&self, sw: StatusWord) -> String {
        iso7816_status_message(sw).to_string()
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn transmit(
        &mut self,
        command: &[u8],
        response: &mut [u8],
    ) -> Result<Exchange, TransportError> {
        (**self).transmit(command, response)
    }

    fn describe_status(&self, sw: StatusWord) -> String {
        (**self).describe_status(sw)
    }
}

pub fn iso7816_status_message(sw: StatusWord) -> &'static str {
    match sw.0 {
        0x6281 => "part of returned data may be corrupted",
        0x6581 => "memory failure",
        0x6700 => "wrong length",
        0x6882 => "secure messaging not supported",
        0x6982 => "security status not satisfied",
        0x6983 => "authentication method blocked",
        0x6985 => "conditions of use not satisfied",
        0x6986 => "command not allowed",
        0x6A80 => "incorrect parameters in the data field",
        0x6A82 => "file or application not found",
        0x6A84 => "not enough memory space",
        0x6A86 => "incorrect parameters P1-P2",
        0x6D00 => "instruction code not supported",
        0x6E00 => "class not supported",
        0x6F00 => "no precise diagnosis",
        _ => match sw.sw1() {
            0x64 | 0x65 => "execution error",
            0x67 => "wrong length",
            0x69 => "command not allowed",
            0x6A => "wrong parameters",
            0x6C => "wrong Le field",
            _ => "unknown status",
        },
    }
}

/// Sends commands over a [`Transport`] and turns responses into payloads or typed errors
#[derive(Debug)]
pub struct CardChannel<T> {
    transport: T,
}

impl<T: Transport> CardChannel<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Send a command that is answered in one frame with success and return the data of the response
    pub fn transmit(&mut self, command: &CommandApdu<'_>) -> Result<Vec<u8>, SmartcardKVACError> {
        let (data, sw) = self.exchange(command)?;
        match sw.status() {
            Status::Success => Ok(data),
            _ => Err(SmartcardKVACError::UnexpectedStatus(sw.0)),
        }
    }

    /// Send a command whose answer may be left pending by the card. On `61XX` exactly one `GET RESPONSE`
    /// asking for the `XX` pending bytes follows. The full payload must be `expected_len` bytes long.
    pub fn transmit_chained(
        &mut self,
        command: &CommandApdu<'_>,
        expected_len: usize,
    ) -> Result<Vec<u8>, SmartcardKVACError> {
        let (mut payload, sw) = self.exchange(command)?;
        if let Status::MoreData(pending) = sw.status() {
            // `Le = 0` asks for 256 bytes
            let follow_up = CommandApdu::get_response(pending as u8);
            let (rest, sw) = self.exchange(&follow_up)?;
            if sw.status() != Status::Success {
                return Err(SmartcardKVACError::UnexpectedStatus(sw.0));
            }
            if rest.len() != pending {
                return Err(SmartcardKVACError::ResponseLengthMismatch {
                    expected: pending,
                    received: rest.len(),
                });
            }
            payload.extend_from_slice(&rest);
        }
        if payload.len() != expected_len {
            return Err(SmartcardKVACError::ResponseLengthMismatch {
                expected: expected_len,
                received: payload.len(),
            });
        }
        Ok(payload)
    }

    /// A single exchange. Failure status words become [`SmartcardKVACError::CardStatus`].
    fn exchange(
        &mut self,
        command: &CommandApdu<'_>,
    ) -> Result<(Vec<u8>, StatusWord), SmartcardKVACError> {
        let mut command_frame = [0u8; MAX_COMMAND_LENGTH];
        let command_len = command.write_to(&mut command_frame)?;
        let mut response_frame = [0u8; MAX_RESPONSE_LENGTH];

        let exchange = self
            .transport
            .transmit(&command_frame[..command_len], &mut response_frame)
            .map_err(|e| {
                tracing::warn!(ins = command.ins, error = %e, "transport failure");
                e
            })?;
        if exchange.len > response_frame.len() {
            return Err(SmartcardKVACError::MalformedResponse);
        }
        let response = ResponseApdu::parse(&response_frame[..exchange.len])?;
        tracing::debug!(
            ins = command.ins,
            sw = response.sw.0,
            len = response.data.len(),
            elapsed = ?exchange.elapsed,
            "card exchange"
        );

        if let Status::Failure(sw) = response.sw.status() {
            let message = self.transport.describe_status(response.sw);
            tracing::warn!(ins = command.ins, sw, %message, "card returned failure status");
            return Err(SmartcardKVACError::CardStatus { sw, message });
        }
        Ok((response.data.to_vec(), response.sw))
    }
}
