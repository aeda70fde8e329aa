//! Escrow conservation under arbitrary operation sequences

use std::collections::HashMap;

use axle_escrow::{accept, cancel, complete, create, deliver, timeout, EscrowMovement, NewTask};
use axle_types::{Address, AgentRecord, CapabilitySet, ContentHash, TaskId};
use proptest::prelude::*;

const START: i64 = 1_700_000_000;

#[derive(Debug, Clone)]
enum Op {
    Accept(u8),
    Deliver(u8),
    Complete(u8),
    Cancel(u8),
    Timeout(u8),
    Tick(i64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..3).prop_map(Op::Accept),
        (0u8..3).prop_map(Op::Deliver),
        (0u8..3).prop_map(Op::Complete),
        (0u8..3).prop_map(Op::Cancel),
        (0u8..3).prop_map(Op::Timeout),
        (1i64..2_000).prop_map(Op::Tick),
    ]
}

fn party(n: u8) -> Address {
    Address::new([n + 1; 32])
}

/// Escrow account key in the toy balance map
fn escrow_key() -> Address {
    Address::new([0xee; 32])
}

fn apply(balances: &mut HashMap<Address, u64>, movement: EscrowMovement) {
    let (from, to, amount) = match movement {
        EscrowMovement::Fund { from, amount } => (from, escrow_key(), amount),
        EscrowMovement::Release { to, amount } | EscrowMovement::Refund { to, amount } => {
            (escrow_key(), to, amount)
        }
    };
    *balances.entry(from).or_default() -= amount;
    *balances.entry(to).or_default() += amount;
}

proptest! {
    #[test]
    fn escrow_holds_reward_exactly_while_open(
        reward in 1u64..1_000_000_000,
        ops in proptest::collection::vec(op_strategy(), 0..40),
    ) {
        let requester = party(0);
        let mut balances: HashMap<Address, u64> = HashMap::new();
        balances.insert(requester, reward);
        let supply: u64 = balances.values().sum();

        let agents: Vec<AgentRecord> = (0..3)
            .map(|n| AgentRecord::new(
                party(n),
                format!("agent-{n}"),
                CapabilitySet::new(["scraping"]).unwrap(),
                0,
                START,
            ))
            .collect();

        let mut now = START;
        let created = create(
            None,
            &Address::new([0xaa; 32]),
            requester,
            NewTask {
                task_id: TaskId::new([7u8; 32]),
                description_hash: ContentHash::ZERO,
                required_capability: "scraping".into(),
                reward,
                deadline: START + 1_000,
            },
            reward,
            now,
        ).unwrap();
        let mut task = created.task;
        apply(&mut balances, created.movement.unwrap());

        for op in ops {
            let result = match op {
                Op::Accept(n) => accept(&task, &agents[n as usize], &party(n), now),
                Op::Deliver(n) => deliver(&task, &party(n), ContentHash::from([1u8; 32]), now),
                Op::Complete(n) => complete(&task, &party(n), now),
                Op::Cancel(n) => cancel(&task, &party(n)),
                Op::Timeout(n) => timeout(&task, &party(n), now),
                Op::Tick(dt) => {
                    now += dt;
                    continue;
                }
            };

            let before = task.clone();
            if let Ok(transition) = result {
                if let Some(movement) = transition.movement {
                    apply(&mut balances, movement);
                }
                task = transition.task;
            }

            let escrow = balances.get(&escrow_key()).copied().unwrap_or(0);
            if task.status.holds_escrow() {
                prop_assert_eq!(escrow, reward);
            } else {
                prop_assert_eq!(escrow, 0);
            }
            prop_assert_eq!(task.provider.is_some(), task.status != axle_types::TaskStatus::Created);
            prop_assert_eq!(balances.values().sum::<u64>(), supply);
            if before.status.is_terminal() {
                prop_assert_eq!(&task, &before);
            }
        }
    }
}
