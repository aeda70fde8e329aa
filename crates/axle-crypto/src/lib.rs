//! AXLE Crypto - Cryptographic primitives for the agent task protocol
//!
//! This crate provides:
//! - Key generation, loading and saving (Ed25519)
//! - Detached signatures
//! - Hashing (SHA-256) and discriminators
//! - Program-derived address derivation for protocol accounts
//!
//! Derived addresses are guaranteed to lie off the Ed25519 curve, so no
//! private key can ever sign for an agent, task, escrow or badge account.

pub mod address;
pub mod keys;
pub mod signature;
pub mod hash;

pub use address::*;
pub use keys::*;
pub use signature::*;
pub use hash::*;

use axle_types::AxleError;
use thiserror::Error;

/// Cryptographic errors
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("Invalid seeds: {0}")]
    InvalidSeeds(String),

    #[error("No off-curve address exists for these seeds")]
    NoViableBump,

    #[error("Keypair file error: {0}")]
    KeyFile(#[from] std::io::Error),
}

pub type CryptoResult<T> = Result<T, CryptoError>;

impl From<CryptoError> for AxleError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::VerificationFailed(reason) => AxleError::VerificationFailed { reason },
            CryptoError::InvalidKeyFormat(reason) => AxleError::invalid_input("key", reason),
            CryptoError::InvalidSeeds(reason) => AxleError::invalid_input("seeds", reason),
            other => AxleError::invalid_input("crypto", other.to_string()),
        }
    }
}
