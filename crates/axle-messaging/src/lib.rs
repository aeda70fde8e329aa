//! AXLE Messaging - Signed off-ledger agent messages
//!
//! Agents negotiate over any transport with self-authenticating JSON
//! messages. The sender signs the canonical JSON of every field except the
//! signature; receivers verify against the key embedded in the sender's
//! `did:sol:` identifier. Nothing here touches the ledger.

use thiserror::Error;

pub mod canonical;
pub mod message;

pub use canonical::{to_canonical_bytes, to_canonical_string};
pub use message::*;

/// Errors that can occur while building or checking messages
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessagingError {
    #[error("Unknown message type: {0}")]
    UnknownType(String),

    #[error("Invalid sender {sender}: {reason}")]
    InvalidSender { sender: String, reason: String },

    #[error("Invalid signature encoding: {0}")]
    InvalidSignature(String),

    #[error("Signature does not match sender")]
    SignatureMismatch,

    #[error("JSON error: {message}")]
    Json { message: String },
}

pub type Result<T> = std::result::Result<T, MessagingError>;

impl From<MessagingError> for axle_types::AxleError {
    fn from(err: MessagingError) -> Self {
        match err {
            MessagingError::UnknownType(_) | MessagingError::Json { .. } => {
                axle_types::AxleError::invalid_input("message", err.to_string())
            }
            other => axle_types::AxleError::VerificationFailed {
                reason: other.to_string(),
            },
        }
    }
}
