//! AXLE Reputation - Scoring of task outcomes
//!
//! Reputation has exactly two mutation paths:
//!
//! - success: `+10`, saturating at `u64::MAX`, `tasks_completed += 1`
//! - failure: `-20`, floored at `0`, `tasks_failed += 1`
//!
//! The deltas and the floor are part of the protocol; every ledger must
//! reproduce them exactly. For N successes and M failures in any order where
//! the floor is never hit, the final score is `100 + 10N - 20M`.

use axle_types::AgentRecord;
use serde::{Deserialize, Serialize};

/// Reputation added for a completed task
pub const SUCCESS_DELTA: u64 = 10;

/// Reputation removed for a timed-out task
pub const FAILURE_PENALTY: u64 = 20;

/// Outcome of a task for its provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
}

/// Before/after view of one reputation update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationChange {
    pub outcome: Outcome,
    pub old_reputation: u64,
    pub new_reputation: u64,
}

impl ReputationChange {
    pub fn delta(&self) -> i128 {
        self.new_reputation as i128 - self.old_reputation as i128
    }
}

/// Pure scoring function
pub fn score(reputation: u64, outcome: Outcome) -> u64 {
    match outcome {
        Outcome::Success => reputation.saturating_add(SUCCESS_DELTA),
        Outcome::Failure => reputation.saturating_sub(FAILURE_PENALTY),
    }
}

/// Apply an outcome to an agent's score and counters
pub fn apply(agent: &mut AgentRecord, outcome: Outcome) -> ReputationChange {
    let old_reputation = agent.reputation;
    agent.reputation = score(old_reputation, outcome);
    match outcome {
        Outcome::Success => agent.tasks_completed = agent.tasks_completed.saturating_add(1),
        Outcome::Failure => agent.tasks_failed = agent.tasks_failed.saturating_add(1),
    }

    tracing::debug!(
        node_id = %agent.node_id,
        ?outcome,
        old = old_reputation,
        new = agent.reputation,
        "reputation updated"
    );

    ReputationChange {
        outcome,
        old_reputation,
        new_reputation: agent.reputation,
    }
}

/// Record a completed task for the provider
pub fn on_success(agent: &mut AgentRecord) -> ReputationChange {
    apply(agent, Outcome::Success)
}

/// Record a timed-out task for the provider
pub fn on_failure(agent: &mut AgentRecord) -> ReputationChange {
    apply(agent, Outcome::Failure)
}
