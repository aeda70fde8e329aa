//! Hashing utilities for AXLE

use axle_types::{ContentHash, TaskId};
use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of data
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute SHA-256 hash and return as hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Compute hash of multiple items
pub fn hash_all(items: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for item in items {
        hasher.update(item);
    }
    hasher.finalize().into()
}

/// First 8 bytes of `SHA-256("<namespace>:<name>")`
///
/// Accounts use the `account` namespace with the record type name,
/// instructions use `global` with the operation name.
pub fn discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let digest = hash_all(&[namespace.as_bytes(), b":", name.as_bytes()]);
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

/// Task id for a caller-facing task handle
pub fn task_id_from_handle(handle: &str) -> TaskId {
    TaskId::new(sha256(handle.as_bytes()))
}

/// Content hash of a task description
pub fn description_hash(description: &str) -> ContentHash {
    ContentHash::from(sha256(description.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_all_matches_concatenation() {
        assert_eq!(hash_all(&[b"ab", b"c"]), sha256(b"abc"));
    }

    #[test]
    fn test_discriminator_is_prefix_of_digest() {
        let disc = discriminator("account", "AgentState");
        assert_eq!(&disc[..], &sha256(b"account:AgentState")[..8]);
        assert_ne!(disc, discriminator("account", "TaskAccount"));
    }

    #[test]
    fn test_task_id_is_deterministic() {
        let a = task_id_from_handle("4f0c7d0e-2f0b-4c1e-9a57-1d1f1e5a9b01");
        let b = task_id_from_handle("4f0c7d0e-2f0b-4c1e-9a57-1d1f1e5a9b01");
        assert_eq!(a, b);
        assert_ne!(a, task_id_from_handle("other"));
    }
}
