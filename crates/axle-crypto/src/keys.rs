//! Key management for AXLE
//!
//! Wallet keys are Ed25519. On disk a keypair is a JSON array of 64 integers:
//! the 32-byte secret followed by the 32-byte public key.

use std::fmt;
use std::path::Path;

use axle_types::Address;
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;

use crate::{CryptoError, CryptoResult, Signature};

/// A key pair for signing operations
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let mut csprng = OsRng;
        let signing_key = SigningKey::generate(&mut csprng);
        let verifying_key = signing_key.verifying_key();

        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Create from existing secret key bytes
    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(bytes);
        let verifying_key = signing_key.verifying_key();

        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Create from the 64-byte `secret ‖ public` form, checking the halves agree
    pub fn from_keypair_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        let array: &[u8; 64] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidKeyFormat(format!("keypair must be 64 bytes, got {}", bytes.len()))
        })?;
        let signing_key = SigningKey::from_keypair_bytes(array)
            .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
        let verifying_key = signing_key.verifying_key();

        Ok(Self {
            signing_key,
            verifying_key,
        })
    }

    /// The 64-byte `secret ‖ public` form
    pub fn to_keypair_bytes(&self) -> [u8; 64] {
        self.signing_key.to_keypair_bytes()
    }

    /// Get the verifying key (public)
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Ledger address of this key
    pub fn address(&self) -> Address {
        Address::new(self.verifying_key.to_bytes())
    }

    /// Decentralized identifier used in off-ledger messages
    pub fn did(&self) -> String {
        did_for(&self.address())
    }

    /// Sign a message
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature::from(self.signing_key.sign(message).to_bytes())
    }

    /// Parse a keypair from its JSON array form
    pub fn from_json(json: &str) -> CryptoResult<Self> {
        let bytes: Vec<u8> = serde_json::from_str(json)
            .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
        Self::from_keypair_bytes(&bytes)
    }

    /// Render the keypair in its JSON array form
    pub fn to_json(&self) -> String {
        let bytes = self.to_keypair_bytes();
        let parts: Vec<String> = bytes.iter().map(|b| b.to_string()).collect();
        format!("[{}]", parts.join(","))
    }

    /// Load a keypair file
    pub fn load(path: impl AsRef<Path>) -> CryptoResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(contents.trim())
    }

    /// Write a keypair file, refusing to overwrite an existing one
    pub fn save(&self, path: impl AsRef<Path>) -> CryptoResult<()> {
        let path = path.as_ref();
        if path.exists() {
            return Err(CryptoError::KeyFile(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} already exists", path.display()),
            )));
        }
        std::fs::write(path, self.to_json())?;
        tracing::debug!(path = %path.display(), address = %self.address(), "saved keypair");
        Ok(())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Scheme prefix of agent identifiers
pub const DID_PREFIX: &str = "did:sol:";

/// `did:sol:<base58>` identifier for an address
pub fn did_for(address: &Address) -> String {
    format!("{}{}", DID_PREFIX, address.to_base58())
}

/// Identifier form of a bare base58 key; identifiers pass through
pub fn to_did(id: &str) -> String {
    if id.starts_with(DID_PREFIX) {
        id.to_string()
    } else {
        format!("{}{}", DID_PREFIX, id)
    }
}

/// Address inside a `did:sol:` identifier
pub fn address_from_did(did: &str) -> CryptoResult<Address> {
    let encoded = did
        .strip_prefix(DID_PREFIX)
        .ok_or_else(|| CryptoError::InvalidKeyFormat(format!("not a did:sol identifier: {}", did)))?;
    Address::from_base58(encoded).map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let keypair = KeyPair::generate();
        assert_eq!(keypair.address().as_bytes(), keypair.verifying_key().as_bytes());
    }

    #[test]
    fn test_keypair_bytes_roundtrip() {
        let keypair1 = KeyPair::generate();
        let bytes = keypair1.to_keypair_bytes();
        let keypair2 = KeyPair::from_keypair_bytes(&bytes).unwrap();

        assert_eq!(keypair1.address(), keypair2.address());
    }

    #[test]
    fn test_mismatched_halves_rejected() {
        let mut bytes = KeyPair::generate().to_keypair_bytes();
        bytes[40] ^= 0xff;
        assert!(KeyPair::from_keypair_bytes(&bytes).is_err());
        assert!(KeyPair::from_keypair_bytes(&bytes[..32]).is_err());
    }

    #[test]
    fn test_keypair_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.json");

        let keypair = KeyPair::generate();
        keypair.save(&path).unwrap();
        let loaded = KeyPair::load(&path).unwrap();
        assert_eq!(keypair.address(), loaded.address());

        // Second save must not clobber the file
        assert!(KeyPair::generate().save(&path).is_err());
    }

    #[test]
    fn test_did_roundtrip() {
        let keypair = KeyPair::generate();
        let did = keypair.did();
        assert!(did.starts_with("did:sol:"));
        assert_eq!(address_from_did(&did).unwrap(), keypair.address());
        assert!(address_from_did("did:web:example.com").is_err());
    }

    #[test]
    fn test_to_did_prefixes_bare_keys_once() {
        let address = KeyPair::generate().address();
        let did = to_did(&address.to_base58());
        assert_eq!(did, did_for(&address));
        assert_eq!(to_did(&did), did);
    }

    #[test]
    fn test_debug_hides_secret() {
        let keypair = KeyPair::generate();
        let rendered = format!("{:?}", keypair);
        assert!(rendered.contains(&keypair.address().to_base58()));
        assert!(!rendered.contains("signing_key"));
    }
}
