//! AXLE Types - Canonical domain types for the agent task protocol
//!
//! This crate contains the foundational types shared by every AXLE crate and
//! has no dependencies on other axle crates. It defines:
//!
//! - Identity types (Address, TaskId, ContentHash)
//! - Agent records and capability sets
//! - Task records and the task status enumeration
//! - The protocol-wide error taxonomy
//!
//! # Protocol Invariants
//!
//! 1. A task's escrow holds exactly its reward while the task is open
//! 2. A task has a provider if and only if it has left `Created`
//! 3. Reputation changes only through completion or timeout
//! 4. Terminal task states are never left

pub mod identity;
pub mod agent;
pub mod task;
pub mod error;

pub use identity::*;
pub use agent::*;
pub use task::*;
pub use error::*;

/// Version of the AXLE types schema
pub const TYPES_VERSION: &str = "0.1.0";

/// Seconds since the unix epoch, as stored on the ledger
pub type UnixTimestamp = i64;

/// Base units in one whole token
pub const BASE_UNITS_PER_TOKEN: u64 = 1_000_000_000;

/// Convert a decimal token amount to base units, truncating sub-unit dust
pub fn tokens_to_base_units(tokens: f64) -> u64 {
    (tokens * BASE_UNITS_PER_TOKEN as f64).round() as u64
}

/// Convert base units to a decimal token amount for display
pub fn base_units_to_tokens(units: u64) -> f64 {
    units as f64 / BASE_UNITS_PER_TOKEN as f64
}

/// Current wall-clock time in unix seconds
pub fn now_unix() -> UnixTimestamp {
    chrono::Utc::now().timestamp()
}

/// Current wall-clock time in unix milliseconds
pub fn now_unix_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenth_of_a_token() {
        assert_eq!(tokens_to_base_units(0.1), 100_000_000);
        assert_eq!(base_units_to_tokens(100_000_000), 0.1);
    }
}
