//! Task records and the task status enumeration

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AxleError, Result};
use crate::identity::{Address, ContentHash, TaskId};
use crate::UnixTimestamp;

/// Lifecycle status of a task
///
/// The discriminant is the byte stored on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TaskStatus {
    Created = 0,
    Accepted = 1,
    Delivered = 2,
    Completed = 3,
    /// Declared for layout compatibility; no operation enters or leaves it
    Disputed = 4,
    Cancelled = 5,
    TimedOut = 6,
}

impl TaskStatus {
    /// All statuses in discriminant order
    pub const ALL: [TaskStatus; 7] = [
        TaskStatus::Created,
        TaskStatus::Accepted,
        TaskStatus::Delivered,
        TaskStatus::Completed,
        TaskStatus::Disputed,
        TaskStatus::Cancelled,
        TaskStatus::TimedOut,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Result<Self> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| AxleError::malformed(format!("unknown task status byte {}", value)))
    }

    /// Terminal statuses are never left again
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::TimedOut)
    }

    /// Statuses during which the escrow must hold the full reward
    pub fn holds_escrow(self) -> bool {
        matches!(self, Self::Created | Self::Accepted | Self::Delivered)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "Created",
            Self::Accepted => "Accepted",
            Self::Delivered => "Delivered",
            Self::Completed => "Completed",
            Self::Disputed => "Disputed",
            Self::Cancelled => "Cancelled",
            Self::TimedOut => "TimedOut",
        };
        f.write_str(name)
    }
}

/// A unit of outsourced work with escrowed funds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub requester: Address,
    /// Set if and only if status is not `Created`
    pub provider: Option<Address>,
    /// SHA-256 of the off-ledger description text
    pub description_hash: ContentHash,
    pub required_capability: String,
    /// Reward in base units, always > 0
    pub reward: u64,
    pub deadline: UnixTimestamp,
    pub status: TaskStatus,
    /// Zero until delivered
    pub result_hash: ContentHash,
    pub created_at: UnixTimestamp,
    pub accepted_at: Option<UnixTimestamp>,
    pub delivered_at: Option<UnixTimestamp>,
    pub completed_at: Option<UnixTimestamp>,
}

impl TaskRecord {
    /// Whether `who` is the requester
    pub fn is_requester(&self, who: &Address) -> bool {
        &self.requester == who
    }

    /// Whether `who` is the assigned provider
    pub fn is_provider(&self, who: &Address) -> bool {
        self.provider.as_ref() == Some(who)
    }

    /// Whether the deadline has strictly passed at `now`
    pub fn is_past_deadline(&self, now: UnixTimestamp) -> bool {
        now > self.deadline
    }
}
