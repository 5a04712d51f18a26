//! Short command and response APDUs as used over a T=0 reader.
//!
//! A command is `CLA INS P1 P2 [Lc data] [Le]` where the presence of `Lc`/data and `Le` is given by its [`Case`].
//! A response is the returned data followed by the status word `SW1 SW2`.

use crate::{
    constants::{CLA_ISO, INS_GET_RESPONSE, MAX_COMMAND_LENGTH, SW1_MORE_DATA, SW_SUCCESS},
    error::SmartcardKVACError,
};

/// Whether a command sends data, expects data, both or neither
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Case {
    /// No data sent, no data expected
    Case1,
    /// No data sent, `Le` bytes expected
    Case2Short,
    /// `Lc` bytes sent, no data expected
    Case3Short,
    /// `Lc` bytes sent, `Le` bytes expected
    Case4Short,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandApdu<'a> {
    pub case: Case,
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: &'a [u8],
    /// Expected response length. Written only for case 2 and 4 commands where `0` stands for 256 bytes.
    pub le: u8,
}

impl<'a> CommandApdu<'a> {
    pub fn new(
        case: Case,
        cla: u8,
        ins: u8,
        p1: u8,
        p2: u8,
        data: &'a [u8],
        le: u8,
    ) -> Result<Self, SmartcardKVACError> {
        if data.len() > u8::MAX as usize {
            return Err(SmartcardKVACError::EncodingError(
                "command data longer than 255 bytes",
            ));
        }
        match case {
            Case::Case1 if !data.is_empty() || le != 0 => Err(SmartcardKVACError::EncodingError(
                "case 1 command carries neither data nor Le",
            )),
            Case::Case2Short if !data.is_empty() => Err(SmartcardKVACError::EncodingError(
                "case 2 command carries no data",
            )),
            Case::Case3Short if data.is_empty() || le != 0 => Err(
                SmartcardKVACError::EncodingError("case 3 command carries data and no Le"),
            ),
            Case::Case4Short if data.is_empty() => Err(SmartcardKVACError::EncodingError(
                "case 4 command carries data",
            )),
            _ => Ok(Self {
                case,
                cla,
                ins,
                p1,
                p2,
                data,
                le,
            }),
        }
    }

    /// `GET RESPONSE` asking for `le` bytes left pending by the previous command
    pub fn get_response(le: u8) -> Self {
        Self {
            case: Case::Case2Short,
            cla: CLA_ISO,
            ins: INS_GET_RESPONSE,
            p1: 0x00,
            p2: 0x00,
            data: &[],
            le,
        }
    }

    /// `Le` byte asking for `len` bytes, `1..=256`, with 256 written as `0`
    pub fn short_le(len: usize) -> Result<u8, SmartcardKVACError> {
        match len {
            1..=255 => Ok(len as u8),
            256 => Ok(0),
            _ => Err(SmartcardKVACError::EncodingError(
                "expected length does not fit in a short response",
            )),
        }
    }

    pub fn encoded_len(&self) -> usize {
        match self.case {
            Case::Case1 => 4,
            Case::Case2Short => 5,
            Case::Case3Short => 5 + self.data.len(),
            Case::Case4Short => 6 + self.data.len(),
        }
    }

    /// Number of bytes the card is asked to return. `0` for case 1 and 3 commands.
    pub fn expected_response_len(&self) -> usize {
        match self.case {
            Case::Case1 | Case::Case3Short => 0,
            Case::Case2Short | Case::Case4Short if self.le == 0 => 256,
            Case::Case2Short | Case::Case4Short => self.le as usize,
        }
    }

    /// Write the command in `out` and return the number of bytes written
    pub fn write_to(&self, out: &mut [u8]) -> Result<usize, SmartcardKVACError> {
        let len = self.encoded_len();
        if out.len() < len || len > MAX_COMMAND_LENGTH {
            return Err(SmartcardKVACError::EncodingError(
                "command does not fit in the frame",
            ));
        }
        out[..4].copy_from_slice(&[self.cla, self.ins, self.p1, self.p2]);
        let mut offset = 4;
        if matches!(self.case, Case::Case3Short | Case::Case4Short) {
            out[offset] = self.data.len() as u8;
            offset += 1;
            out[offset..offset + self.data.len()].copy_from_slice(self.data);
            offset += self.data.len();
        }
        if matches!(self.case, Case::Case2Short | Case::Case4Short) {
            out[offset] = self.le;
            offset += 1;
        }
        Ok(offset)
    }

    /// Inverse of [`Self::write_to`], used by a card to read a received command.
    /// The case is inferred from the frame length the way a T=1 card does.
    pub fn parse(frame: &'a [u8]) -> Result<Self, SmartcardKVACError> {
        let (header, body) = match frame.len() {
            0..=3 => {
                return Err(SmartcardKVACError::EncodingError(
                    "command shorter than its header",
                ))
            }
            _ => frame.split_at(4),
        };
        let (case, data, le) = match body.len() {
            0 => (Case::Case1, &body[..0], 0),
            1 => (Case::Case2Short, &body[..0], body[0]),
            n if body[0] as usize == n - 1 && n > 1 => (Case::Case3Short, &body[1..], 0),
            n if body[0] as usize == n - 2 && n > 2 => {
                (Case::Case4Short, &body[1..n - 1], body[n - 1])
            }
            _ => {
                return Err(SmartcardKVACError::EncodingError(
                    "Lc does not match the command length",
                ))
            }
        };
        Self::new(case, header[0], header[1], header[2], header[3], data, le)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusWord(pub u16);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Success,
    /// Number of bytes waiting to be fetched with `GET RESPONSE`
    MoreData(usize),
    Failure(u16),
}

impl StatusWord {
    pub fn new(sw1: u8, sw2: u8) -> Self {
        Self(u16::from_be_bytes([sw1, sw2]))
    }

    pub fn sw1(&self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn sw2(&self) -> u8 {
        self.0 as u8
    }

    pub fn to_bytes(&self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    pub fn status(&self) -> Status {
        match (self.0, self.sw1()) {
            (SW_SUCCESS, _) => Status::Success,
            (_, SW1_MORE_DATA) if self.sw2() == 0 => Status::MoreData(256),
            (_, SW1_MORE_DATA) => Status::MoreData(self.sw2() as usize),
            (sw, _) => Status::Failure(sw),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseApdu<'a> {
    pub data: &'a [u8],
    pub sw: StatusWord,
}

impl<'a> ResponseApdu<'a> {
    pub fn parse(frame: &'a [u8]) -> Result<Self, SmartcardKVACError> {
        if frame.len() < 2 {
            return Err(SmartcardKVACError::MalformedResponse);
        }
        let (data, sw) = frame.split_at(frame.len() - 2);
        Ok(Self {
            data,
            sw: StatusWord::new(sw[0], sw[1]),
        })
    }
}
