//! Identity types for AXLE
//!
//! Every account on the ledger is addressed by a 32-byte key. Owning keys are
//! Ed25519 public keys; derived accounts are program-derived addresses. Both
//! share the same wire shape, so they share one type. Task ids are 32-byte
//! digests and get their own type to prevent accidental mixing.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::AxleError;

/// Macro to generate 32-byte key types with common implementations
macro_rules! define_key_type {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            /// Byte length of the key
            pub const LEN: usize = 32;

            /// Create from raw bytes
            pub const fn new(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Create from a slice, failing unless it is exactly 32 bytes
            pub fn from_slice(bytes: &[u8]) -> Result<Self, AxleError> {
                let array: [u8; 32] = bytes.try_into().map_err(|_| {
                    AxleError::invalid_input(
                        stringify!($name),
                        format!("expected 32 bytes, got {}", bytes.len()),
                    )
                })?;
                Ok(Self(array))
            }

            /// Borrow the raw bytes
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// Copy out the raw bytes
            pub fn to_bytes(self) -> [u8; 32] {
                self.0
            }

            /// Base58 string form
            pub fn to_base58(&self) -> String {
                bs58::encode(self.0).into_string()
            }

            /// Parse from base58
            pub fn from_base58(s: &str) -> Result<Self, AxleError> {
                let bytes = bs58::decode(s).into_vec().map_err(|e| {
                    AxleError::invalid_input(stringify!($name), e.to_string())
                })?;
                Self::from_slice(&bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_base58())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_base58())
            }
        }

        impl FromStr for $name {
            type Err = AxleError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_base58(s)
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_base58())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_base58(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

define_key_type!(Address, "A 32-byte ledger address: an owning public key or a derived account");
define_key_type!(TaskId, "Unique 32-byte identifier of a task, derived from a random handle");

/// A 32-byte content digest (description hash, result hash)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// The all-zero hash, used before a result is delivered
    pub const ZERO: ContentHash = ContentHash([0u8; 32]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; 32]> for ContentHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("content hash must be 32 bytes"))?;
        Ok(Self(array))
    }
}
