//! AXLE Codec - Canonical binary layout of accounts and instructions
//!
//! Every record starts with an 8-byte discriminator, followed by its fields in
//! declaration order:
//!
//! - integers: little-endian, fixed width
//! - bool: one byte, `0` or `1`
//! - 32-byte keys and hashes: raw
//! - strings: `u32` LE byte length, then UTF-8
//! - string sequences: `u32` LE count, then strings
//! - optionals: one presence byte (`0`/`1`), then the payload if present
//! - task status: one byte
//!
//! Two independent implementations following these rules agree byte for byte.

pub mod wire;
pub mod account;
pub mod instruction;

pub use wire::*;
pub use account::*;
pub use instruction::*;

use axle_types::AxleError;
use thiserror::Error;

/// Decode errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Buffer truncated: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Unknown discriminator {0:02x?}")]
    UnknownDiscriminator([u8; 8]),

    #[error("Invalid {field} byte {value}")]
    InvalidTag { field: &'static str, value: u8 },

    #[error("Invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

pub type CodecResult<T> = Result<T, CodecError>;

impl From<CodecError> for AxleError {
    fn from(err: CodecError) -> Self {
        AxleError::malformed(err.to_string())
    }
}
