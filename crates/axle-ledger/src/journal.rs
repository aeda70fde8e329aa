//! Append-only journal of balance movements

use axle_types::{Address, TaskId, UnixTimestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a journal entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

impl EntryId {
    pub fn new() -> Self {
        Self(format!("entry_{}", Uuid::new_v4()))
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

/// Direction of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryType {
    Credit,
    Debit,
}

/// Why a balance moved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryReason {
    /// Test funding outside the protocol
    Airdrop,
    /// Requester funds a task's escrow
    EscrowFund { task_id: TaskId },
    /// Escrow pays the provider
    EscrowRelease { task_id: TaskId },
    /// Escrow returns the reward to the requester
    EscrowRefund { task_id: TaskId },
}

/// One side of a balance movement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub entry_id: EntryId,
    pub slot: u64,
    pub account: Address,
    pub entry_type: EntryType,
    pub amount: u64,
    pub balance_after: u64,
    pub reason: EntryReason,
    pub created_at: UnixTimestamp,
}
