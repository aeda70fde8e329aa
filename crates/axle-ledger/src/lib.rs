//! AXLE Ledger - Ledger interface and in-process reference ledger
//!
//! The ledger is:
//! - Account-keyed by 32-byte addresses (owner keys and derived accounts)
//! - Instruction-driven (every change comes from one signed instruction)
//! - Serialized (instructions commit one at a time in slot order)
//! - Atomic (record writes and balance movements commit together or not at all)
//!
//! # Invariants
//!
//! 1. No negative balances
//! 2. While a task is Created, Accepted or Delivered its escrow holds exactly
//!    the reward
//! 3. Every balance movement is journaled as a debit and a matching credit
//! 4. Rejected instructions leave no trace

pub mod instruction;
pub mod journal;
pub mod ledger;
pub mod memory;

pub use instruction::{
    accept_task, cancel_task, complete_task, create_task, deliver_task, mint_agent_badge,
    register_agent, timeout_task, update_agent, AccountMeta, Instruction, SignedInstruction,
};
pub use journal::{EntryId, EntryReason, EntryType, JournalEntry};
pub use ledger::{Ledger, TxReceipt};
pub use memory::{Badge, MemoryLedger};
