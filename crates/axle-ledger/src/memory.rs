//! In-process reference ledger
//!
//! [`MemoryLedger`] executes protocol instructions against in-memory accounts.
//! All state sits behind one async mutex, so instructions run strictly one at
//! a time. Each instruction first stages every write (records, transfers,
//! badge) and validates all balances; only then is anything applied, so a
//! rejected instruction has no effect at all.
//!
//! The clock is manual: it starts at construction time and only moves through
//! [`MemoryLedger::advance_clock`] or [`MemoryLedger::set_clock`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axle_codec::{decode_agent, decode_task, encode_agent, encode_task, ProtocolInstruction};
use axle_crypto::{agent_address, badge_address, escrow_address, task_address, DEFAULT_PROGRAM_ID};
use axle_escrow::{EscrowMovement, NewTask, Transition};
use axle_registry::Registration;
use axle_types::{now_unix, Address, AgentRecord, AxleError, Result, TaskRecord, UnixTimestamp};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    AccountMeta, EntryId, EntryReason, EntryType, JournalEntry, Ledger, SignedInstruction, TxReceipt,
};

/// Minted agent badge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub owner: Address,
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub minted_at: UnixTimestamp,
}

/// The reference ledger
#[derive(Clone)]
pub struct MemoryLedger {
    program_id: Address,
    state: Arc<Mutex<LedgerState>>,
}

#[derive(Default)]
struct LedgerState {
    accounts: HashMap<Address, Vec<u8>>,
    balances: HashMap<Address, u64>,
    badges: HashMap<Address, Badge>,
    journal: Vec<JournalEntry>,
    clock: UnixTimestamp,
    slot: u64,
}

struct Transfer {
    from: Address,
    to: Address,
    amount: u64,
    reason: EntryReason,
}

/// Writes staged by one instruction
#[derive(Default)]
struct Effects {
    accounts: Vec<(Address, Vec<u8>)>,
    transfers: Vec<Transfer>,
    badge: Option<(Address, Badge)>,
    logs: Vec<String>,
}

impl MemoryLedger {
    /// Ledger for the default program id, clock at wall time
    pub fn new() -> Self {
        Self::with_program_id(DEFAULT_PROGRAM_ID)
    }

    pub fn with_program_id(program_id: Address) -> Self {
        let state = LedgerState {
            clock: now_unix(),
            ..Default::default()
        };
        Self {
            program_id,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Credit an address from outside the protocol
    pub async fn airdrop(&self, to: &Address, amount: u64) -> Result<u64> {
        let mut state = self.state.lock().await;
        let balance = state.balance_of(to);
        let new_balance = balance
            .checked_add(amount)
            .ok_or_else(|| AxleError::ledger("balance overflow"))?;

        state.slot += 1;
        let slot = state.slot;
        let created_at = state.clock;
        state.balances.insert(*to, new_balance);
        state.journal.push(JournalEntry {
            entry_id: EntryId::new(),
            slot,
            account: *to,
            entry_type: EntryType::Credit,
            amount,
            balance_after: new_balance,
            reason: EntryReason::Airdrop,
            created_at,
        });

        tracing::debug!(to = %to, amount, balance = new_balance, "airdrop");
        Ok(new_balance)
    }

    /// Move the clock forward
    pub async fn advance_clock(&self, seconds: i64) -> UnixTimestamp {
        let mut state = self.state.lock().await;
        state.clock = state.clock.saturating_add(seconds);
        state.clock
    }

    pub async fn set_clock(&self, timestamp: UnixTimestamp) {
        self.state.lock().await.clock = timestamp;
    }

    /// Badge minted for an owner, if any
    pub async fn badge(&self, owner: &Address) -> Result<Option<Badge>> {
        let address = badge_address(&self.program_id, owner)?.address;
        Ok(self.state.lock().await.badges.get(&address).cloned())
    }

    /// All journal entries, oldest first
    pub async fn journal(&self) -> Vec<JournalEntry> {
        self.state.lock().await.journal.clone()
    }

    /// Journal entries touching one address
    pub async fn account_entries(&self, account: &Address) -> Vec<JournalEntry> {
        let state = self.state.lock().await;
        state
            .journal
            .iter()
            .filter(|e| &e.account == account)
            .cloned()
            .collect()
    }

    /// Sum of all balances
    pub async fn total_supply(&self) -> u128 {
        let state = self.state.lock().await;
        state.balances.values().map(|b| *b as u128).sum()
    }

    // ------------------------------------------------------------------------
    // Instruction processing
    // ------------------------------------------------------------------------

    fn execute(&self, state: &LedgerState, tx: &SignedInstruction) -> Result<Effects> {
        let ix = &tx.instruction;
        if ix.program_id != self.program_id {
            return Err(AxleError::invalid_input(
                "program_id",
                format!("expected {}, got {}", self.program_id, ix.program_id),
            ));
        }
        if !tx.verify() {
            return Err(AxleError::unauthorized("invalid instruction signature"));
        }

        let signer = tx.signer;
        let now = state.clock;
        let mut effects = Effects::default();

        match ix.operation()? {
            ProtocolInstruction::RegisterAgent {
                node_id,
                capabilities,
                fee_per_task,
            } => {
                let accounts = expect_accounts(&ix.accounts, 2, "register_agent")?;
                expect_signer(&accounts[1], &signer)?;
                let agent_addr = agent_address(&self.program_id, &signer)?.address;
                expect_address(&accounts[0], &agent_addr, "agent")?;

                let existing = state.agent(&agent_addr)?;
                let agent = axle_registry::register(
                    existing.as_ref(),
                    &agent_addr,
                    signer,
                    Registration {
                        node_id,
                        capabilities,
                        fee_per_task,
                    },
                    now,
                )?;
                effects.logs.push(format!("Agent registered: {} ({})", agent.node_id, signer));
                effects.accounts.push((agent_addr, encode_agent(&agent)));
            }

            ProtocolInstruction::UpdateAgent(changes) => {
                let accounts = expect_accounts(&ix.accounts, 2, "update_agent")?;
                expect_signer(&accounts[1], &signer)?;
                let agent_addr = agent_address(&self.program_id, &signer)?.address;
                expect_address(&accounts[0], &agent_addr, "agent")?;

                let agent = state.require_agent(&agent_addr)?;
                let updated = axle_registry::update(&agent, &signer, &changes)?;
                effects.logs.push(format!("Agent updated: {}", updated.node_id));
                effects.accounts.push((agent_addr, encode_agent(&updated)));
            }

            ProtocolInstruction::CreateTask {
                task_id,
                description_hash,
                required_capability,
                reward,
                deadline,
            } => {
                let accounts = expect_accounts(&ix.accounts, 3, "create_task")?;
                expect_signer(&accounts[2], &signer)?;
                let task_addr = task_address(&self.program_id, &task_id)?.address;
                let escrow_addr = escrow_address(&self.program_id, &task_id)?.address;
                expect_address(&accounts[0], &task_addr, "task")?;
                expect_address(&accounts[1], &escrow_addr, "escrow")?;

                let existing = state.task(&task_addr)?;
                let transition = axle_escrow::create(
                    existing.as_ref(),
                    &task_addr,
                    signer,
                    NewTask {
                        task_id,
                        description_hash,
                        required_capability,
                        reward,
                        deadline,
                    },
                    state.balance_of(&signer),
                    now,
                )?;
                effects.logs.push(format!("Task created with {} reward", reward));
                self.stage_transition(state, &mut effects, task_addr, escrow_addr, transition)?;
            }

            ProtocolInstruction::AcceptTask => {
                let accounts = expect_accounts(&ix.accounts, 3, "accept_task")?;
                expect_signer(&accounts[2], &signer)?;
                let (task_addr, task) = self.load_task(state, &accounts[0])?;
                let agent_addr = agent_address(&self.program_id, &signer)?.address;
                expect_address(&accounts[1], &agent_addr, "agent")?;
                let agent = state.require_agent(&agent_addr)?;

                let transition = axle_escrow::accept(&task, &agent, &signer, now)?;
                effects.logs.push(format!("Task accepted by {}", agent.node_id));
                let escrow_addr = escrow_address(&self.program_id, &task.id)?.address;
                self.stage_transition(state, &mut effects, task_addr, escrow_addr, transition)?;
            }

            ProtocolInstruction::DeliverTask { result_hash } => {
                let accounts = expect_accounts(&ix.accounts, 2, "deliver_task")?;
                expect_signer(&accounts[1], &signer)?;
                let (task_addr, task) = self.load_task(state, &accounts[0])?;

                let transition = axle_escrow::deliver(&task, &signer, result_hash, now)?;
                effects.logs.push("Task result delivered".to_string());
                let escrow_addr = escrow_address(&self.program_id, &task.id)?.address;
                self.stage_transition(state, &mut effects, task_addr, escrow_addr, transition)?;
            }

            ProtocolInstruction::CompleteTask => {
                let accounts = expect_accounts(&ix.accounts, 5, "complete_task")?;
                expect_signer(&accounts[4], &signer)?;
                let (task_addr, task) = self.load_task(state, &accounts[0])?;
                if let Some(provider) = task.provider {
                    expect_address(&accounts[2], &provider, "provider")?;
                }
                let agent_addr = agent_address(&self.program_id, &accounts[2].address)?.address;
                expect_address(&accounts[1], &agent_addr, "agent")?;
                let escrow_addr = escrow_address(&self.program_id, &task.id)?.address;
                expect_address(&accounts[3], &escrow_addr, "escrow")?;

                let transition = axle_escrow::complete(&task, &signer, now)?;
                effects
                    .logs
                    .push(format!("Task completed, {} released to provider", task.reward));
                self.stage_transition(state, &mut effects, task_addr, escrow_addr, transition)?;
            }

            ProtocolInstruction::CancelTask => {
                let accounts = expect_accounts(&ix.accounts, 3, "cancel_task")?;
                expect_signer(&accounts[2], &signer)?;
                let (task_addr, task) = self.load_task(state, &accounts[0])?;
                let escrow_addr = escrow_address(&self.program_id, &task.id)?.address;
                expect_address(&accounts[1], &escrow_addr, "escrow")?;

                let transition = axle_escrow::cancel(&task, &signer)?;
                effects.logs.push("Task cancelled, escrow refunded".to_string());
                self.stage_transition(state, &mut effects, task_addr, escrow_addr, transition)?;
            }

            ProtocolInstruction::TimeoutTask => {
                let accounts = expect_accounts(&ix.accounts, 4, "timeout_task")?;
                expect_signer(&accounts[3], &signer)?;
                let (task_addr, task) = self.load_task(state, &accounts[0])?;
                if let Some(provider) = task.provider {
                    let agent_addr = agent_address(&self.program_id, &provider)?.address;
                    expect_address(&accounts[1], &agent_addr, "agent")?;
                }
                let escrow_addr = escrow_address(&self.program_id, &task.id)?.address;
                expect_address(&accounts[2], &escrow_addr, "escrow")?;

                let transition = axle_escrow::timeout(&task, &signer, now)?;
                effects
                    .logs
                    .push("Task timed out, escrow refunded, provider penalized".to_string());
                self.stage_transition(state, &mut effects, task_addr, escrow_addr, transition)?;
            }

            ProtocolInstruction::MintAgentBadge { name, symbol, uri } => {
                let accounts = expect_accounts(&ix.accounts, 3, "mint_agent_badge")?;
                expect_signer(&accounts[2], &signer)?;
                let agent_addr = agent_address(&self.program_id, &signer)?.address;
                let badge_addr = badge_address(&self.program_id, &signer)?.address;
                expect_address(&accounts[0], &agent_addr, "agent")?;
                expect_address(&accounts[1], &badge_addr, "badge")?;

                let agent = state.agent(&agent_addr)?;
                axle_registry::validate_badge(agent.as_ref(), &signer, &name, &symbol, &uri)?;
                if state.badges.contains_key(&badge_addr) {
                    return Err(AxleError::already_exists(badge_addr));
                }

                effects.logs.push(format!("Badge minted: {} ({})", name, symbol));
                effects.badge = Some((
                    badge_addr,
                    Badge {
                        owner: signer,
                        name,
                        symbol,
                        uri,
                        minted_at: now,
                    },
                ));
            }
        }

        Ok(effects)
    }

    /// Read a task record and check it lives at its canonical address
    fn load_task(&self, state: &LedgerState, meta: &AccountMeta) -> Result<(Address, TaskRecord)> {
        let task = state
            .task(&meta.address)?
            .ok_or_else(|| AxleError::not_found(meta.address))?;
        let canonical = task_address(&self.program_id, &task.id)?.address;
        expect_address(meta, &canonical, "task")?;
        Ok((meta.address, task))
    }

    fn stage_transition(
        &self,
        state: &LedgerState,
        effects: &mut Effects,
        task_addr: Address,
        escrow_addr: Address,
        transition: Transition,
    ) -> Result<()> {
        let task_id = transition.task.id;
        effects.accounts.push((task_addr, encode_task(&transition.task)));

        if let Some(movement) = transition.movement {
            let transfer = match movement {
                EscrowMovement::Fund { from, amount } => Transfer {
                    from,
                    to: escrow_addr,
                    amount,
                    reason: EntryReason::EscrowFund { task_id },
                },
                EscrowMovement::Release { to, amount } => Transfer {
                    from: escrow_addr,
                    to,
                    amount,
                    reason: EntryReason::EscrowRelease { task_id },
                },
                EscrowMovement::Refund { to, amount } => Transfer {
                    from: escrow_addr,
                    to,
                    amount,
                    reason: EntryReason::EscrowRefund { task_id },
                },
            };
            effects.transfers.push(transfer);
        }

        if let Some(outcome) = transition.reputation {
            let agent_addr = agent_address(&self.program_id, &outcome.provider)?.address;
            let mut agent = state.require_agent(&agent_addr)?;
            let change = axle_reputation::apply(&mut agent, outcome.outcome);
            effects.logs.push(format!(
                "Reputation of {}: {} -> {}",
                agent.node_id, change.old_reputation, change.new_reputation
            ));
            effects.accounts.push((agent_addr, encode_agent(&agent)));
        }

        Ok(())
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerState {
    fn balance_of(&self, address: &Address) -> u64 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    fn agent(&self, address: &Address) -> Result<Option<AgentRecord>> {
        match self.accounts.get(address) {
            Some(data) => Ok(Some(decode_agent(data)?)),
            None => Ok(None),
        }
    }

    fn require_agent(&self, address: &Address) -> Result<AgentRecord> {
        self.agent(address)?.ok_or_else(|| AxleError::not_found(address))
    }

    fn task(&self, address: &Address) -> Result<Option<TaskRecord>> {
        match self.accounts.get(address) {
            Some(data) => Ok(Some(decode_task(data)?)),
            None => Ok(None),
        }
    }

    /// Validate every transfer, then apply all staged writes
    fn commit(&mut self, effects: Effects) -> Result<u64> {
        let mut staged: HashMap<Address, u64> = HashMap::new();
        for t in &effects.transfers {
            let from_balance = staged.get(&t.from).copied().unwrap_or_else(|| self.balance_of(&t.from));
            let new_from = from_balance.checked_sub(t.amount).ok_or(AxleError::InsufficientFunds {
                requested: t.amount,
                available: from_balance,
            })?;
            staged.insert(t.from, new_from);

            let to_balance = staged.get(&t.to).copied().unwrap_or_else(|| self.balance_of(&t.to));
            let new_to = to_balance
                .checked_add(t.amount)
                .ok_or_else(|| AxleError::ledger("balance overflow"))?;
            staged.insert(t.to, new_to);
        }

        self.slot += 1;
        let slot = self.slot;
        let created_at = self.clock;

        for (address, data) in effects.accounts {
            self.accounts.insert(address, data);
        }

        for t in effects.transfers {
            let from_after = self.balance_of(&t.from).saturating_sub(t.amount);
            self.balances.insert(t.from, from_after);
            let to_after = self.balance_of(&t.to).saturating_add(t.amount);
            self.balances.insert(t.to, to_after);

            self.journal.push(JournalEntry {
                entry_id: EntryId::new(),
                slot,
                account: t.from,
                entry_type: EntryType::Debit,
                amount: t.amount,
                balance_after: from_after,
                reason: t.reason.clone(),
                created_at,
            });
            self.journal.push(JournalEntry {
                entry_id: EntryId::new(),
                slot,
                account: t.to,
                entry_type: EntryType::Credit,
                amount: t.amount,
                balance_after: to_after,
                reason: t.reason,
                created_at,
            });
        }

        if let Some((address, badge)) = effects.badge {
            self.badges.insert(address, badge);
        }

        Ok(slot)
    }
}

fn expect_accounts<'a>(accounts: &'a [AccountMeta], count: usize, operation: &str) -> Result<&'a [AccountMeta]> {
    if accounts.len() != count {
        return Err(AxleError::invalid_input(
            "accounts",
            format!("{} takes {} accounts, got {}", operation, count, accounts.len()),
        ));
    }
    Ok(accounts)
}

fn expect_signer(meta: &AccountMeta, signer: &Address) -> Result<()> {
    if !meta.is_signer || &meta.address != signer {
        return Err(AxleError::unauthorized(format!(
            "{} did not sign this instruction",
            meta.address
        )));
    }
    Ok(())
}

fn expect_address(meta: &AccountMeta, expected: &Address, name: &str) -> Result<()> {
    if &meta.address != expected {
        return Err(AxleError::invalid_input(
            "accounts",
            format!("{} account should be {}, got {}", name, expected, meta.address),
        ));
    }
    Ok(())
}

#[async_trait]
impl Ledger for MemoryLedger {
    fn program_id(&self) -> Address {
        self.program_id
    }

    async fn submit(&self, tx: SignedInstruction) -> Result<TxReceipt> {
        let mut state = self.state.lock().await;
        let operation = tx
            .instruction
            .operation()
            .map(|op| op.name())
            .unwrap_or("unknown");

        let effects = match self.execute(&state, &tx) {
            Ok(effects) => effects,
            Err(err) => {
                tracing::warn!(operation, signer = %tx.signer, code = err.error_code(), error = %err, "instruction rejected");
                return Err(err);
            }
        };

        let logs = effects.logs.clone();
        let slot = state.commit(effects)?;
        let timestamp = state.clock;

        tracing::debug!(operation, slot, signer = %tx.signer, "instruction committed");
        Ok(TxReceipt {
            signature: tx.signature,
            operation: operation.to_string(),
            slot,
            timestamp,
            logs,
        })
    }

    async fn fetch_account(&self, address: &Address) -> Result<Option<Vec<u8>>> {
        Ok(self.state.lock().await.accounts.get(address).cloned())
    }

    async fn fetch_accounts(&self, discriminator: [u8; 8]) -> Result<Vec<(Address, Vec<u8>)>> {
        let state = self.state.lock().await;
        let mut found: Vec<(Address, Vec<u8>)> = state
            .accounts
            .iter()
            .filter(|(_, data)| data.starts_with(&discriminator))
            .map(|(address, data)| (*address, data.clone()))
            .collect();
        found.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(found)
    }

    async fn balance(&self, address: &Address) -> Result<u64> {
        Ok(self.state.lock().await.balance_of(address))
    }

    async fn clock(&self) -> Result<UnixTimestamp> {
        Ok(self.state.lock().await.clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::*;
    use axle_codec::AgentUpdate;
    use axle_crypto::{description_hash, task_id_from_handle, KeyPair};
    use axle_types::{ContentHash, ErrorKind, TaskId, TaskStatus};

    const START: UnixTimestamp = 1_700_000_000;

    async fn ledger() -> MemoryLedger {
        let ledger = MemoryLedger::new();
        ledger.set_clock(START).await;
        ledger
    }

    async fn register(ledger: &MemoryLedger, keypair: &KeyPair, caps: &[&str]) -> Address {
        let ix = register_agent(
            &ledger.program_id(),
            &keypair.address(),
            Registration {
                node_id: format!("node-{}", &keypair.address().to_base58()[..6]),
                capabilities: caps.iter().map(|c| c.to_string()).collect(),
                fee_per_task: 1_000,
            },
        )
        .unwrap();
        ledger.submit(ix.sign(keypair)).await.unwrap();
        agent_address(&ledger.program_id(), &keypair.address()).unwrap().address
    }

    async fn create(ledger: &MemoryLedger, requester: &KeyPair, handle: &str, reward: u64) -> TaskId {
        let task_id = task_id_from_handle(handle);
        let ix = create_task(
            &ledger.program_id(),
            &requester.address(),
            NewTask {
                task_id,
                description_hash: description_hash("scrape the site"),
                required_capability: "scraping".into(),
                reward,
                deadline: START + 3600,
            },
        )
        .unwrap();
        ledger.submit(ix.sign(requester)).await.unwrap();
        task_id
    }

    async fn task(ledger: &MemoryLedger, task_id: &TaskId) -> TaskRecord {
        let address = task_address(&ledger.program_id(), task_id).unwrap().address;
        ledger.fetch_task(&address).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_register_and_duplicate() {
        let ledger = ledger().await;
        let alice = KeyPair::generate();
        let agent_addr = register(&ledger, &alice, &["scraping"]).await;

        let agent = ledger.fetch_agent(&agent_addr).await.unwrap().unwrap();
        assert_eq!(agent.reputation, 100);
        assert_eq!(agent.registered_at, START);

        let again = register_agent(
            &ledger.program_id(),
            &alice.address(),
            Registration {
                node_id: "other".into(),
                capabilities: vec!["coding".into()],
                fee_per_task: 0,
            },
        )
        .unwrap();
        let err = ledger.submit(again.sign(&alice)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        let agent = ledger.fetch_agent(&agent_addr).await.unwrap().unwrap();
        assert_eq!(agent.node_id.len(), 11);
    }

    #[tokio::test]
    async fn test_create_moves_reward_into_escrow() {
        let ledger = ledger().await;
        let requester = KeyPair::generate();
        ledger.airdrop(&requester.address(), 1_000_000_000).await.unwrap();

        let task_id = create(&ledger, &requester, "t-1", 100_000_000).await;
        let escrow = escrow_address(&ledger.program_id(), &task_id).unwrap().address;

        assert_eq!(ledger.balance(&escrow).await.unwrap(), 100_000_000);
        assert_eq!(ledger.balance(&requester.address()).await.unwrap(), 900_000_000);
        assert_eq!(task(&ledger, &task_id).await.status, TaskStatus::Created);

        let entries = ledger.account_entries(&escrow).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entry_type, EntryType::Credit);
        assert_eq!(entries[0].reason, EntryReason::EscrowFund { task_id });
    }

    #[tokio::test]
    async fn test_create_insufficient_funds_leaves_nothing() {
        let ledger = ledger().await;
        let requester = KeyPair::generate();
        ledger.airdrop(&requester.address(), 10).await.unwrap();

        let task_id = task_id_from_handle("poor");
        let ix = create_task(
            &ledger.program_id(),
            &requester.address(),
            NewTask {
                task_id,
                description_hash: ContentHash::ZERO,
                required_capability: "scraping".into(),
                reward: 11,
                deadline: START + 60,
            },
        )
        .unwrap();
        let err = ledger.submit(ix.sign(&requester)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);

        let address = task_address(&ledger.program_id(), &task_id).unwrap().address;
        assert!(ledger.fetch_account(&address).await.unwrap().is_none());
        assert_eq!(ledger.balance(&requester.address()).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_full_lifecycle_pays_provider() {
        let ledger = ledger().await;
        let requester = KeyPair::generate();
        let provider = KeyPair::generate();
        ledger.airdrop(&requester.address(), 1_000).await.unwrap();
        let agent_addr = register(&ledger, &provider, &["scraping"]).await;
        let task_id = create(&ledger, &requester, "t-life", 400).await;
        let pid = ledger.program_id();

        let ix = accept_task(&pid, &task_id, &provider.address()).unwrap();
        ledger.submit(ix.sign(&provider)).await.unwrap();

        let result = ContentHash::from([7u8; 32]);
        let ix = deliver_task(&pid, &task_id, &provider.address(), result).unwrap();
        ledger.submit(ix.sign(&provider)).await.unwrap();

        let ix = complete_task(&pid, &task_id, &provider.address(), &requester.address()).unwrap();
        let receipt = ledger.submit(ix.sign(&requester)).await.unwrap();
        assert_eq!(receipt.operation, "complete_task");

        let record = task(&ledger, &task_id).await;
        assert_eq!(record.status, TaskStatus::Completed);
        assert_eq!(record.result_hash, result);
        assert_eq!(record.completed_at, Some(START));

        let escrow = escrow_address(&pid, &task_id).unwrap().address;
        assert_eq!(ledger.balance(&escrow).await.unwrap(), 0);
        assert_eq!(ledger.balance(&provider.address()).await.unwrap(), 400);
        assert_eq!(ledger.balance(&requester.address()).await.unwrap(), 600);

        let agent = ledger.fetch_agent(&agent_addr).await.unwrap().unwrap();
        assert_eq!(agent.reputation, 110);
        assert_eq!(agent.tasks_completed, 1);
        assert_eq!(ledger.total_supply().await, 1_000);
    }

    #[tokio::test]
    async fn test_timeout_refunds_and_penalizes() {
        let ledger = ledger().await;
        let requester = KeyPair::generate();
        let provider = KeyPair::generate();
        ledger.airdrop(&requester.address(), 500).await.unwrap();
        let agent_addr = register(&ledger, &provider, &["scraping"]).await;
        let task_id = create(&ledger, &requester, "t-slow", 500).await;
        let pid = ledger.program_id();

        let ix = accept_task(&pid, &task_id, &provider.address()).unwrap();
        ledger.submit(ix.sign(&provider)).await.unwrap();

        let ix = timeout_task(&pid, &task_id, &provider.address(), &requester.address()).unwrap();
        let err = ledger.submit(ix.clone().sign(&requester)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeadlineNotReached);

        ledger.advance_clock(3601).await;
        ledger.submit(ix.sign(&requester)).await.unwrap();

        let record = task(&ledger, &task_id).await;
        assert_eq!(record.status, TaskStatus::TimedOut);
        assert_eq!(record.completed_at, None);
        assert_eq!(ledger.balance(&requester.address()).await.unwrap(), 500);

        let agent = ledger.fetch_agent(&agent_addr).await.unwrap().unwrap();
        assert_eq!(agent.reputation, 80);
        assert_eq!(agent.tasks_failed, 1);
    }

    #[tokio::test]
    async fn test_cancel_refunds_requester() {
        let ledger = ledger().await;
        let requester = KeyPair::generate();
        ledger.airdrop(&requester.address(), 300).await.unwrap();
        let task_id = create(&ledger, &requester, "t-cancel", 300).await;

        let ix = cancel_task(&ledger.program_id(), &task_id, &requester.address()).unwrap();
        ledger.submit(ix.clone().sign(&requester)).await.unwrap();
        assert_eq!(ledger.balance(&requester.address()).await.unwrap(), 300);
        assert_eq!(task(&ledger, &task_id).await.status, TaskStatus::Cancelled);

        let err = ledger.submit(ix.sign(&requester)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
    }

    #[tokio::test]
    async fn test_wrong_signer_rejected() {
        let ledger = ledger().await;
        let requester = KeyPair::generate();
        let mallory = KeyPair::generate();
        ledger.airdrop(&requester.address(), 100).await.unwrap();
        let task_id = create(&ledger, &requester, "t-auth", 100).await;

        // Instruction names the requester but mallory signs it
        let ix = cancel_task(&ledger.program_id(), &task_id, &requester.address()).unwrap();
        let err = ledger.submit(ix.sign(&mallory)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        // Mallory names herself as the requester
        let ix = cancel_task(&ledger.program_id(), &task_id, &mallory.address()).unwrap();
        let err = ledger.submit(ix.sign(&mallory)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        assert_eq!(task(&ledger, &task_id).await.status, TaskStatus::Created);
    }

    #[tokio::test]
    async fn test_tampered_signature_rejected() {
        let ledger = ledger().await;
        let alice = KeyPair::generate();
        let ix = update_agent(
            &ledger.program_id(),
            &alice.address(),
            AgentUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();
        let mut signed = ix.sign(&alice);
        signed.signature.0[0] ^= 0xff;
        let err = ledger.submit(signed).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_wrong_program_id_rejected() {
        let ledger = ledger().await;
        let alice = KeyPair::generate();
        let other = Address::new([5u8; 32]);
        let ix = cancel_task(&other, &TaskId::new([1u8; 32]), &alice.address()).unwrap();
        let err = ledger.submit(ix.sign(&alice)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_substituted_escrow_account_rejected() {
        let ledger = ledger().await;
        let requester = KeyPair::generate();
        ledger.airdrop(&requester.address(), 100).await.unwrap();
        let task_id = create(&ledger, &requester, "t-swap", 100).await;

        let mut ix = cancel_task(&ledger.program_id(), &task_id, &requester.address()).unwrap();
        ix.accounts[1].address = requester.address();
        let err = ledger.submit(ix.sign(&requester)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_accept_requires_registered_agent() {
        let ledger = ledger().await;
        let requester = KeyPair::generate();
        let stranger = KeyPair::generate();
        ledger.airdrop(&requester.address(), 100).await.unwrap();
        let task_id = create(&ledger, &requester, "t-stranger", 100).await;

        let ix = accept_task(&ledger.program_id(), &task_id, &stranger.address()).unwrap();
        let err = ledger.submit(ix.sign(&stranger)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_badge_once_per_owner() {
        let ledger = ledger().await;
        let alice = KeyPair::generate();
        let pid = ledger.program_id();

        let mint = || {
            mint_agent_badge(&pid, &alice.address(), "Agent".into(), "AGT".into(), "https://x/1".into())
                .unwrap()
        };

        let err = ledger.submit(mint().sign(&alice)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        register(&ledger, &alice, &["scraping"]).await;
        ledger.submit(mint().sign(&alice)).await.unwrap();
        let badge = ledger.badge(&alice.address()).await.unwrap().unwrap();
        assert_eq!(badge.symbol, "AGT");

        let err = ledger.submit(mint().sign(&alice)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn test_fetch_accounts_by_kind() {
        let ledger = ledger().await;
        let requester = KeyPair::generate();
        ledger.airdrop(&requester.address(), 100).await.unwrap();
        register(&ledger, &KeyPair::generate(), &["a"]).await;
        register(&ledger, &KeyPair::generate(), &["b"]).await;
        create(&ledger, &requester, "t-scan", 100).await;

        assert_eq!(ledger.all_agents().await.unwrap().len(), 2);
        assert_eq!(ledger.all_tasks().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_journal_entries_pair_up() {
        let ledger = ledger().await;
        let requester = KeyPair::generate();
        ledger.airdrop(&requester.address(), 100).await.unwrap();
        let task_id = create(&ledger, &requester, "t-journal", 60).await;
        let ix = cancel_task(&ledger.program_id(), &task_id, &requester.address()).unwrap();
        ledger.submit(ix.sign(&requester)).await.unwrap();

        let journal = ledger.journal().await;
        assert_eq!(journal.len(), 5);
        let debits: u64 = journal
            .iter()
            .filter(|e| e.entry_type == EntryType::Debit)
            .map(|e| e.amount)
            .sum();
        assert_eq!(debits, 120);

        let json = serde_json::to_string(&journal[0]).unwrap();
        assert!(json.contains("Airdrop"));
    }
}
