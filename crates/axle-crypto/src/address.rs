//! Program-derived addresses for protocol accounts
//!
//! Every protocol account lives at an address derived from the program id, a
//! domain tag and a fixed list of seeds:
//!
//! | Account | Seeds                 |
//! |---------|-----------------------|
//! | agent   | `"agent"`, owner key  |
//! | task    | `"task"`, task id     |
//! | escrow  | `"escrow"`, task id   |
//! | badge   | `"badge"`, owner key  |
//!
//! For each bump from 255 down to 0 the candidate is
//! `SHA-256(seeds ‖ [bump] ‖ program_id ‖ "ProgramDerivedAddress")`; the first
//! candidate that is not a valid Ed25519 point is the address.

use axle_types::{Address, TaskId};
use curve25519_dalek::edwards::CompressedEdwardsY;
use sha2::{Digest, Sha256};

use crate::{CryptoError, CryptoResult};

/// Maximum length of a single seed in bytes
pub const MAX_SEED_LEN: usize = 32;

/// Maximum number of seeds, including the bump
pub const MAX_SEEDS: usize = 16;

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Program id the protocol is deployed under unless configured otherwise
/// (`4zr1KP5Rp4xrofrUWFjPqBjJKciNL2s8qXt4eFtc7M82`)
pub const DEFAULT_PROGRAM_ID: Address = Address::new([
    59, 100, 147, 218, 98, 143, 215, 1, 1, 53, 53, 100, 87, 20, 185, 183, 63, 197, 48, 8, 201,
    140, 92, 126, 102, 95, 86, 117, 124, 21, 82, 103,
]);

/// Domain tag of a protocol account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountTag {
    Agent,
    Task,
    Escrow,
    Badge,
}

impl AccountTag {
    /// Seed bytes of the tag
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Agent => b"agent",
            Self::Task => b"task",
            Self::Escrow => b"escrow",
            Self::Badge => b"badge",
        }
    }
}

/// An address together with the bump that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivedAddress {
    pub address: Address,
    pub bump: u8,
}

/// Whether 32 bytes decompress to a point on the Ed25519 curve
pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    CompressedEdwardsY(*bytes).decompress().is_some()
}

/// Hash one candidate address; `None` if it lands on the curve
pub fn create_program_address(seeds: &[&[u8]], program_id: &Address) -> CryptoResult<Option<Address>> {
    if seeds.len() > MAX_SEEDS {
        return Err(CryptoError::InvalidSeeds(format!(
            "{} seeds exceeds maximum of {}",
            seeds.len(),
            MAX_SEEDS
        )));
    }
    if let Some(seed) = seeds.iter().find(|s| s.len() > MAX_SEED_LEN) {
        return Err(CryptoError::InvalidSeeds(format!(
            "seed of {} bytes exceeds maximum of {}",
            seed.len(),
            MAX_SEED_LEN
        )));
    }

    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(program_id.as_bytes());
    hasher.update(PDA_MARKER);
    let candidate: [u8; 32] = hasher.finalize().into();

    if is_on_curve(&candidate) {
        Ok(None)
    } else {
        Ok(Some(Address::new(candidate)))
    }
}

/// Find the canonical (highest bump) derived address for `seeds`
pub fn find_program_address(seeds: &[&[u8]], program_id: &Address) -> CryptoResult<DerivedAddress> {
    if seeds.len() >= MAX_SEEDS {
        return Err(CryptoError::InvalidSeeds(format!(
            "{} seeds leaves no room for the bump",
            seeds.len()
        )));
    }

    for bump in (0..=u8::MAX).rev() {
        let bump_seed = [bump];
        let mut with_bump: Vec<&[u8]> = seeds.to_vec();
        with_bump.push(&bump_seed);

        if let Some(address) = create_program_address(&with_bump, program_id)? {
            return Ok(DerivedAddress { address, bump });
        }
    }

    Err(CryptoError::NoViableBump)
}

/// Derive the address of a protocol account from its tag and seeds
pub fn derive_address(
    program_id: &Address,
    tag: AccountTag,
    seeds: &[&[u8]],
) -> CryptoResult<DerivedAddress> {
    let mut all: Vec<&[u8]> = Vec::with_capacity(seeds.len() + 1);
    all.push(tag.as_bytes());
    all.extend_from_slice(seeds);

    let derived = find_program_address(&all, program_id)?;
    tracing::trace!(?tag, address = %derived.address, bump = derived.bump, "derived address");
    Ok(derived)
}

/// Agent account of an owner
pub fn agent_address(program_id: &Address, owner: &Address) -> CryptoResult<DerivedAddress> {
    derive_address(program_id, AccountTag::Agent, &[&owner.as_bytes()[..]])
}

/// Task account of a task id
pub fn task_address(program_id: &Address, task_id: &TaskId) -> CryptoResult<DerivedAddress> {
    derive_address(program_id, AccountTag::Task, &[&task_id.as_bytes()[..]])
}

/// Escrow account holding a task's reward
pub fn escrow_address(program_id: &Address, task_id: &TaskId) -> CryptoResult<DerivedAddress> {
    derive_address(program_id, AccountTag::Escrow, &[&task_id.as_bytes()[..]])
}

/// Badge account of an owner
pub fn badge_address(program_id: &Address, owner: &Address) -> CryptoResult<DerivedAddress> {
    derive_address(program_id, AccountTag::Badge, &[&owner.as_bytes()[..]])
}
