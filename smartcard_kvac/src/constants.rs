//! Fixed widths and command bytes shared by the host, the card and the verifier

/// Length of the user identifier stored in the card
pub const IDENTIFIER_LENGTH: usize = 32;

/// Length of the verifier's nonce
pub const NONCE_LENGTH: usize = 20;

/// Number of bytes of the epoch counter. It is right-aligned in a scalar sized buffer.
pub const EPOCH_LENGTH: usize = 4;

/// Default epoch period in seconds, one day
pub const DEFAULT_EPOCH_PERIOD_SECS: u64 = 86_400;

/// Tag byte preceding both coordinates of an encoded point
pub const UNCOMPRESSED_POINT_TAG: u8 = 0x04;

/// `CLA INS P1 P2 Lc <255 bytes of data> Le`
pub const MAX_COMMAND_LENGTH: usize = 4 + 1 + 255 + 1;

/// 256 bytes of data followed by `SW1 SW2`
pub const MAX_RESPONSE_LENGTH: usize = 256 + 2;

pub const CLA_ISO: u8 = 0x00;
pub const CLA_APPLICATION: u8 = 0x80;

pub const INS_SET_USER_IDENTIFIER_ISSUER_SIGNATURE: u8 = 0x10;
pub const INS_COMPUTE_PROOF_OF_KEY: u8 = 0x20;
pub const INS_GET_USER_IDENTIFIER: u8 = 0x30;
pub const INS_GET_RESPONSE: u8 = 0xC0;

pub const SW_SUCCESS: u16 = 0x9000;
pub const SW1_MORE_DATA: u8 = 0x61;
pub const SW_WRONG_LENGTH: u16 = 0x6700;
pub const SW_CONDITIONS_NOT_SATISFIED: u16 = 0x6985;
pub const SW_WRONG_DATA: u16 = 0x6A80;
pub const SW_INCORRECT_P1P2: u16 = 0x6A86;
pub const SW_INS_NOT_SUPPORTED: u16 = 0x6D00;
pub const SW_CLA_NOT_SUPPORTED: u16 = 0x6E00;
