//! AXLE Escrow - Task lifecycle with escrowed rewards
//!
//! ```text
//! Created ──accept──▶ Accepted ──deliver──▶ Delivered ──complete──▶ Completed
//!    │                   │
//!  cancel             timeout
//!    ▼                   ▼
//! Cancelled           TimedOut
//! ```
//!
//! `Disputed` is a valid stored status but no operation enters or leaves it.
//!
//! Every transition is a pure function of the current record. It either fails
//! without effect or returns a [`Transition`]: the new record, the escrow
//! movement to perform and the reputation outcome to apply to the provider.
//! The ledger applies all three atomically.
//!
//! Guards run in a fixed order: status, then actor, then the remaining
//! operation guards.

use axle_reputation::Outcome;
use axle_types::{
    validate_capability, Address, AgentRecord, AxleError, ContentHash, Result, TaskId, TaskRecord,
    TaskStatus, UnixTimestamp,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// Effects
// ============================================================================

/// Value movement into or out of a task's escrow account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EscrowMovement {
    /// Requester funds the escrow at creation
    Fund { from: Address, amount: u64 },
    /// Escrow pays the provider on completion
    Release { to: Address, amount: u64 },
    /// Escrow returns the reward to the requester
    Refund { to: Address, amount: u64 },
}

impl EscrowMovement {
    pub fn amount(&self) -> u64 {
        match self {
            Self::Fund { amount, .. } | Self::Release { amount, .. } | Self::Refund { amount, .. } => {
                *amount
            }
        }
    }
}

/// Reputation side effect for the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOutcome {
    pub provider: Address,
    pub outcome: Outcome,
}

/// Result of a successful transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub task: TaskRecord,
    pub movement: Option<EscrowMovement>,
    pub reputation: Option<ProviderOutcome>,
}

impl Transition {
    fn record_only(task: TaskRecord) -> Self {
        Self {
            task,
            movement: None,
            reputation: None,
        }
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Parameters of a new task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub task_id: TaskId,
    pub description_hash: ContentHash,
    pub required_capability: String,
    pub reward: u64,
    pub deadline: UnixTimestamp,
}

/// Create a task and fund its escrow from the requester
///
/// `existing` is whatever is stored at the task's derived address.
pub fn create(
    existing: Option<&TaskRecord>,
    task_address: &Address,
    requester: Address,
    params: NewTask,
    requester_balance: u64,
    now: UnixTimestamp,
) -> Result<Transition> {
    if existing.is_some() {
        return Err(AxleError::already_exists(task_address));
    }
    if params.reward == 0 {
        return Err(AxleError::InvalidReward {
            reward: params.reward,
        });
    }
    if params.deadline <= now {
        return Err(AxleError::InvalidDeadline {
            deadline: params.deadline,
            now,
        });
    }
    validate_capability(&params.required_capability)?;
    if requester_balance < params.reward {
        return Err(AxleError::InsufficientFunds {
            requested: params.reward,
            available: requester_balance,
        });
    }

    let task = TaskRecord {
        id: params.task_id,
        requester,
        provider: None,
        description_hash: params.description_hash,
        required_capability: params.required_capability,
        reward: params.reward,
        deadline: params.deadline,
        status: TaskStatus::Created,
        result_hash: ContentHash::ZERO,
        created_at: now,
        accepted_at: None,
        delivered_at: None,
        completed_at: None,
    };

    tracing::info!(task = %task.id, reward = task.reward, deadline = task.deadline, "task created");
    Ok(Transition {
        movement: Some(EscrowMovement::Fund {
            from: requester,
            amount: task.reward,
        }),
        reputation: None,
        task,
    })
}

/// Assign the task to an eligible agent
pub fn accept(
    task: &TaskRecord,
    agent: &AgentRecord,
    caller: &Address,
    now: UnixTimestamp,
) -> Result<Transition> {
    require_status(task, TaskStatus::Created, "accept")?;
    if &agent.authority != caller {
        return Err(AxleError::unauthorized("agent account does not belong to caller"));
    }
    if !agent.is_active {
        return Err(AxleError::InactiveAgent {
            agent: agent.node_id.clone(),
        });
    }
    if task.deadline <= now {
        return Err(AxleError::TaskExpired {
            deadline: task.deadline,
            now,
        });
    }
    if !agent.capabilities.contains(&task.required_capability) {
        return Err(AxleError::CapabilityMismatch {
            required: task.required_capability.clone(),
        });
    }

    let mut next = task.clone();
    next.status = TaskStatus::Accepted;
    next.provider = Some(*caller);
    next.accepted_at = Some(now);

    tracing::info!(task = %next.id, provider = %caller, "task accepted");
    Ok(Transition::record_only(next))
}

/// Record the provider's result
pub fn deliver(
    task: &TaskRecord,
    caller: &Address,
    result_hash: ContentHash,
    now: UnixTimestamp,
) -> Result<Transition> {
    require_status(task, TaskStatus::Accepted, "deliver")?;
    if !task.is_provider(caller) {
        return Err(AxleError::unauthorized("only the provider may deliver"));
    }

    let mut next = task.clone();
    next.status = TaskStatus::Delivered;
    next.result_hash = result_hash;
    next.delivered_at = Some(now);

    tracing::info!(task = %next.id, result = %result_hash, "task delivered");
    Ok(Transition::record_only(next))
}

/// Release the escrow to the provider
pub fn complete(task: &TaskRecord, caller: &Address, now: UnixTimestamp) -> Result<Transition> {
    require_status(task, TaskStatus::Delivered, "complete")?;
    if !task.is_requester(caller) {
        return Err(AxleError::unauthorized("only the requester may complete"));
    }
    let provider = assigned_provider(task)?;

    let mut next = task.clone();
    next.status = TaskStatus::Completed;
    next.completed_at = Some(now);

    tracing::info!(task = %next.id, provider = %provider, reward = next.reward, "task completed");
    Ok(Transition {
        movement: Some(EscrowMovement::Release {
            to: provider,
            amount: next.reward,
        }),
        reputation: Some(ProviderOutcome {
            provider,
            outcome: Outcome::Success,
        }),
        task: next,
    })
}

/// Refund an unaccepted task
pub fn cancel(task: &TaskRecord, caller: &Address) -> Result<Transition> {
    require_status(task, TaskStatus::Created, "cancel")?;
    if !task.is_requester(caller) {
        return Err(AxleError::unauthorized("only the requester may cancel"));
    }

    let mut next = task.clone();
    next.status = TaskStatus::Cancelled;

    tracing::info!(task = %next.id, refund = next.reward, "task cancelled");
    Ok(Transition {
        movement: Some(EscrowMovement::Refund {
            to: next.requester,
            amount: next.reward,
        }),
        reputation: None,
        task: next,
    })
}

/// Refund a task whose provider let the deadline pass
pub fn timeout(task: &TaskRecord, caller: &Address, now: UnixTimestamp) -> Result<Transition> {
    require_status(task, TaskStatus::Accepted, "timeout")?;
    if !task.is_requester(caller) {
        return Err(AxleError::unauthorized("only the requester may time out a task"));
    }
    if !task.is_past_deadline(now) {
        return Err(AxleError::DeadlineNotReached {
            deadline: task.deadline,
            now,
        });
    }
    let provider = assigned_provider(task)?;

    let mut next = task.clone();
    next.status = TaskStatus::TimedOut;

    tracing::info!(task = %next.id, provider = %provider, refund = next.reward, "task timed out");
    Ok(Transition {
        movement: Some(EscrowMovement::Refund {
            to: next.requester,
            amount: next.reward,
        }),
        reputation: Some(ProviderOutcome {
            provider,
            outcome: Outcome::Failure,
        }),
        task: next,
    })
}

fn require_status(task: &TaskRecord, expected: TaskStatus, operation: &str) -> Result<()> {
    if task.status != expected {
        tracing::debug!(task = %task.id, status = %task.status, operation, "transition rejected");
        return Err(AxleError::invalid_transition(operation, task.status));
    }
    Ok(())
}

fn assigned_provider(task: &TaskRecord) -> Result<Address> {
    task.provider
        .ok_or_else(|| AxleError::malformed(format!("task {} has no provider", task.id)))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axle_types::{CapabilitySet, ErrorKind};

    const NOW: i64 = 1_700_000_000;
    const REWARD: u64 = 100_000_000;

    fn requester() -> Address {
        Address::new([1u8; 32])
    }

    fn provider() -> Address {
        Address::new([2u8; 32])
    }

    fn agent(owner: Address, caps: &[&str]) -> AgentRecord {
        AgentRecord::new(
            owner,
            "provider".to_string(),
            CapabilitySet::new(caps.iter().copied()).unwrap(),
            0,
            NOW,
        )
    }

    fn created() -> TaskRecord {
        create(
            None,
            &Address::new([9u8; 32]),
            requester(),
            NewTask {
                task_id: TaskId::new([3u8; 32]),
                description_hash: ContentHash::from([4u8; 32]),
                required_capability: "scraping".to_string(),
                reward: REWARD,
                deadline: NOW + 3_600,
            },
            REWARD,
            NOW,
        )
        .unwrap()
        .task
    }

    fn accepted() -> TaskRecord {
        accept(&created(), &agent(provider(), &["scraping"]), &provider(), NOW + 1)
            .unwrap()
            .task
    }

    fn delivered() -> TaskRecord {
        deliver(&accepted(), &provider(), ContentHash::from([5u8; 32]), NOW + 2)
            .unwrap()
            .task
    }

    fn new_task(reward: u64, deadline: i64, capability: &str) -> NewTask {
        NewTask {
            task_id: TaskId::new([3u8; 32]),
            description_hash: ContentHash::ZERO,
            required_capability: capability.to_string(),
            reward,
            deadline,
        }
    }

    #[test]
    fn test_create_funds_escrow() {
        let transition = create(
            None,
            &Address::new([9u8; 32]),
            requester(),
            new_task(REWARD, NOW + 10, "scraping"),
            REWARD * 2,
            NOW,
        )
        .unwrap();
        assert_eq!(transition.task.status, TaskStatus::Created);
        assert_eq!(transition.task.provider, None);
        assert!(transition.task.result_hash.is_zero());
        assert_eq!(
            transition.movement,
            Some(EscrowMovement::Fund {
                from: requester(),
                amount: REWARD
            })
        );
    }

    #[test]
    fn test_create_guards() {
        let addr = Address::new([9u8; 32]);
        let cases = [
            (new_task(0, NOW + 10, "scraping"), REWARD, ErrorKind::InvalidReward),
            (new_task(REWARD, NOW, "scraping"), REWARD, ErrorKind::InvalidDeadline),
            (new_task(REWARD, NOW + 10, ""), REWARD, ErrorKind::InvalidInput),
            (new_task(REWARD, NOW + 10, "scraping"), REWARD - 1, ErrorKind::InsufficientFunds),
        ];
        for (params, balance, kind) in cases {
            let err = create(None, &addr, requester(), params, balance, NOW).unwrap_err();
            assert_eq!(err.kind(), kind);
        }

        let existing = created();
        let err = create(
            Some(&existing),
            &addr,
            requester(),
            new_task(REWARD, NOW + 10, "scraping"),
            REWARD,
            NOW,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_accept_sets_provider() {
        let task = accepted();
        assert_eq!(task.status, TaskStatus::Accepted);
        assert_eq!(task.provider, Some(provider()));
        assert_eq!(task.accepted_at, Some(NOW + 1));
    }

    #[test]
    fn test_accept_guards_in_order() {
        let task = created();

        let inactive = {
            let mut a = agent(provider(), &["browser"]);
            a.is_active = false;
            a
        };
        // Inactive is reported before the capability mismatch
        let err = accept(&task, &inactive, &provider(), NOW).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InactiveAgent);

        let err = accept(&task, &agent(provider(), &["scraping"]), &provider(), NOW + 3_600)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TaskExpired);

        let err = accept(&task, &agent(provider(), &["scrap"]), &provider(), NOW).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapabilityMismatch);

        let err = accept(&task, &agent(provider(), &["scraping"]), &requester(), NOW).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn test_second_accept_is_invalid_transition() {
        let task = accepted();
        let other = Address::new([6u8; 32]);
        let err = accept(&task, &agent(other, &["scraping"]), &other, NOW + 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
        assert_eq!(err.to_string(), "Cannot accept a task in status Accepted");
    }

    #[test]
    fn test_deliver_only_by_provider() {
        let task = accepted();
        let err = deliver(&task, &requester(), ContentHash::ZERO, NOW).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let task = delivered();
        assert_eq!(task.status, TaskStatus::Delivered);
        assert_eq!(task.result_hash, ContentHash::from([5u8; 32]));
        assert_eq!(task.delivered_at, Some(NOW + 2));
    }

    #[test]
    fn test_complete_releases_to_provider() {
        let transition = complete(&delivered(), &requester(), NOW + 3).unwrap();
        assert_eq!(transition.task.status, TaskStatus::Completed);
        assert_eq!(transition.task.completed_at, Some(NOW + 3));
        assert_eq!(
            transition.movement,
            Some(EscrowMovement::Release {
                to: provider(),
                amount: REWARD
            })
        );
        assert_eq!(
            transition.reputation,
            Some(ProviderOutcome {
                provider: provider(),
                outcome: Outcome::Success
            })
        );
    }

    #[test]
    fn test_complete_by_provider_unauthorized() {
        let err = complete(&delivered(), &provider(), NOW).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn test_complete_before_delivery_invalid() {
        let err = complete(&accepted(), &requester(), NOW).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
    }

    #[test]
    fn test_state_checked_before_actor() {
        // Wrong state and wrong actor: the state error wins
        let err = cancel(&accepted(), &provider()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
    }

    #[test]
    fn test_cancel_refunds_requester() {
        let transition = cancel(&created(), &requester()).unwrap();
        assert_eq!(transition.task.status, TaskStatus::Cancelled);
        assert_eq!(
            transition.movement,
            Some(EscrowMovement::Refund {
                to: requester(),
                amount: REWARD
            })
        );
        assert!(transition.reputation.is_none());

        let err = cancel(&created(), &provider()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn test_timeout_requires_deadline_passed() {
        let task = accepted();
        let err = timeout(&task, &requester(), task.deadline).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeadlineNotReached);

        let transition = timeout(&task, &requester(), task.deadline + 1).unwrap();
        assert_eq!(transition.task.status, TaskStatus::TimedOut);
        assert_eq!(
            transition.movement,
            Some(EscrowMovement::Refund {
                to: requester(),
                amount: REWARD
            })
        );
        assert_eq!(
            transition.reputation.map(|r| r.outcome),
            Some(Outcome::Failure)
        );
    }

    #[test]
    fn test_timeout_after_delivery_invalid() {
        let task = delivered();
        let err = timeout(&task, &requester(), task.deadline + 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
    }

    #[test]
    fn test_disputed_rejects_everything() {
        let mut task = accepted();
        task.status = TaskStatus::Disputed;
        let later = task.deadline + 1;

        let errors = [
            accept(&task, &agent(provider(), &["scraping"]), &provider(), NOW).unwrap_err(),
            deliver(&task, &provider(), ContentHash::ZERO, NOW).unwrap_err(),
            complete(&task, &requester(), NOW).unwrap_err(),
            cancel(&task, &requester()).unwrap_err(),
            timeout(&task, &requester(), later).unwrap_err(),
        ];
        for err in errors {
            assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        let completed = complete(&delivered(), &requester(), NOW).unwrap().task;
        let cancelled = cancel(&created(), &requester()).unwrap().task;
        for task in [completed, cancelled] {
            assert!(task.status.is_terminal());
            assert!(cancel(&task, &requester()).is_err());
            assert!(complete(&task, &requester(), NOW).is_err());
            assert!(timeout(&task, &requester(), i64::MAX).is_err());
        }
    }
}
