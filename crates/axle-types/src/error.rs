//! Error types for AXLE
//!
//! Every guard violation maps to exactly one kind. Callers branch on
//! [`ErrorKind`] (or the stable [`AxleError::error_code`]) instead of parsing
//! messages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::task::TaskStatus;

/// Result type for AXLE operations
pub type Result<T> = std::result::Result<T, AxleError>;

/// AXLE error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AxleError {
    // ========================================================================
    // Account Errors
    // ========================================================================

    /// An account already exists at the derived address
    #[error("Account already exists at {address}")]
    AlreadyExists { address: String },

    /// No record at the derived address
    #[error("No account found at {address}")]
    NotFound { address: String },

    /// Decode failure: truncated buffer, unknown discriminator, bad tag
    #[error("Malformed record: {reason}")]
    MalformedRecord { reason: String },

    // ========================================================================
    // Authorization Errors
    // ========================================================================

    /// Caller is not the required requester, provider or owner
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// Signed message or instruction signature check failed
    #[error("Verification failed: {reason}")]
    VerificationFailed { reason: String },

    // ========================================================================
    // Agent Errors
    // ========================================================================

    /// Accepting agent lacks the required capability
    #[error("Agent does not have required capability '{required}'")]
    CapabilityMismatch { required: String },

    /// Accept attempted by a deactivated agent
    #[error("Agent {agent} is not active")]
    InactiveAgent { agent: String },

    // ========================================================================
    // Task Errors
    // ========================================================================

    /// Operation attempted from a state that does not permit it
    #[error("Cannot {operation} a task in status {status}")]
    InvalidStateTransition {
        operation: String,
        status: TaskStatus,
    },

    /// Timeout called before the deadline passed
    #[error("Deadline {deadline} has not been reached (now {now})")]
    DeadlineNotReached { deadline: i64, now: i64 },

    /// Accept attempted after the deadline passed
    #[error("Task expired at {deadline} (now {now})")]
    TaskExpired { deadline: i64, now: i64 },

    /// Reward must be strictly positive
    #[error("Invalid reward amount: {reward}")]
    InvalidReward { reward: u64 },

    /// Deadline must be in the future at creation
    #[error("Invalid deadline {deadline}: must be after {now}")]
    InvalidDeadline { deadline: i64, now: i64 },

    // ========================================================================
    // Funds Errors
    // ========================================================================

    /// Requester cannot fund the escrow
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: u64, available: u64 },

    // ========================================================================
    // General Errors
    // ========================================================================

    /// Invalid input (length limits, empty sets, account list mismatch)
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    /// Transport or ledger-side failure unrelated to protocol guards
    #[error("Ledger error: {message}")]
    Ledger { message: String },
}

/// Discriminant of [`AxleError`] for branching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    AlreadyExists,
    NotFound,
    MalformedRecord,
    Unauthorized,
    VerificationFailed,
    CapabilityMismatch,
    InactiveAgent,
    InvalidStateTransition,
    DeadlineNotReached,
    TaskExpired,
    InvalidReward,
    InvalidDeadline,
    InsufficientFunds,
    InvalidInput,
    Ledger,
}

impl AxleError {
    /// Create an invalid input error
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    /// Create a malformed record error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            reason: reason.into(),
        }
    }

    /// Create a not-found error for an address
    pub fn not_found(address: impl ToString) -> Self {
        Self::NotFound {
            address: address.to_string(),
        }
    }

    /// Create an already-exists error for an address
    pub fn already_exists(address: impl ToString) -> Self {
        Self::AlreadyExists {
            address: address.to_string(),
        }
    }

    /// Create an invalid transition error
    pub fn invalid_transition(operation: impl Into<String>, status: TaskStatus) -> Self {
        Self::InvalidStateTransition {
            operation: operation.into(),
            status,
        }
    }

    /// Create a ledger transport error
    pub fn ledger(message: impl Into<String>) -> Self {
        Self::Ledger {
            message: message.into(),
        }
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::MalformedRecord { .. } => ErrorKind::MalformedRecord,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::VerificationFailed { .. } => ErrorKind::VerificationFailed,
            Self::CapabilityMismatch { .. } => ErrorKind::CapabilityMismatch,
            Self::InactiveAgent { .. } => ErrorKind::InactiveAgent,
            Self::InvalidStateTransition { .. } => ErrorKind::InvalidStateTransition,
            Self::DeadlineNotReached { .. } => ErrorKind::DeadlineNotReached,
            Self::TaskExpired { .. } => ErrorKind::TaskExpired,
            Self::InvalidReward { .. } => ErrorKind::InvalidReward,
            Self::InvalidDeadline { .. } => ErrorKind::InvalidDeadline,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::Ledger { .. } => ErrorKind::Ledger,
        }
    }

    /// Only ledger transport failures are worth retrying, and only by the
    /// transport layer
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Ledger { .. })
    }

    /// Get an error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::AlreadyExists => "ALREADY_EXISTS",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::MalformedRecord => "MALFORMED_RECORD",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::VerificationFailed => "VERIFICATION_FAILED",
            ErrorKind::CapabilityMismatch => "CAPABILITY_MISMATCH",
            ErrorKind::InactiveAgent => "INACTIVE_AGENT",
            ErrorKind::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorKind::DeadlineNotReached => "DEADLINE_NOT_REACHED",
            ErrorKind::TaskExpired => "TASK_EXPIRED",
            ErrorKind::InvalidReward => "INVALID_REWARD",
            ErrorKind::InvalidDeadline => "INVALID_DEADLINE",
            ErrorKind::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::Ledger => "LEDGER_ERROR",
        }
    }
}
