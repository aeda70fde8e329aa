//! The AXLE client facade

use std::sync::Arc;

use axle_codec::AgentUpdate;
use axle_crypto::{agent_address, description_hash, sha256, task_address, KeyPair};
use axle_escrow::NewTask;
use axle_ledger::{instruction, Instruction, Ledger, TxReceipt};
use axle_messaging::{to_canonical_string, MessageType, SignedMessage};
use axle_registry::Registration;
use axle_types::{Address, AgentRecord, AxleError, ContentHash, Result, TaskId, TaskRecord, TaskStatus, UnixTimestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::alias::{remember, resolve, AliasStore, TaskAliasCache};
use crate::config::Config;
use crate::events::{AxleEvent, EventBus, EventKind};

/// Parameters for a new task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskParams {
    /// Plain-text description, hashed before it reaches the ledger
    pub description: String,
    pub required_capability: String,
    /// Reward in base units
    pub reward: u64,
    pub deadline: UnixTimestamp,
}

/// A task created by this client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHandle {
    /// Caller-facing name; the task id is its SHA-256
    pub handle: String,
    pub task_id: TaskId,
    pub address: Address,
    pub record: TaskRecord,
    pub receipt: TxReceipt,
}

/// Client bound to one wallet and one ledger
#[derive(Clone)]
pub struct AxleClient {
    ledger: Arc<dyn Ledger>,
    keypair: Arc<KeyPair>,
    config: Arc<Config>,
    events: EventBus,
    aliases: Arc<dyn AliasStore>,
}

impl AxleClient {
    /// Client with default settings for the ledger's program
    pub fn new(ledger: Arc<dyn Ledger>, keypair: KeyPair) -> Self {
        let config = Config::default().with_program_id(ledger.program_id());
        Self {
            ledger,
            keypair: Arc::new(keypair),
            config: Arc::new(config),
            events: EventBus::default(),
            aliases: Arc::new(TaskAliasCache::new()),
        }
    }

    /// Client with explicit configuration
    ///
    /// Fails if the configured program id differs from the ledger's.
    pub fn with_config(ledger: Arc<dyn Ledger>, keypair: KeyPair, config: Config) -> Result<Self> {
        if config.program_id != ledger.program_id() {
            return Err(AxleError::invalid_input(
                "program_id",
                format!(
                    "configured {} but ledger runs {}",
                    config.program_id,
                    ledger.program_id()
                ),
            ));
        }
        Ok(Self {
            ledger,
            keypair: Arc::new(keypair),
            config: Arc::new(config),
            events: EventBus::default(),
            aliases: Arc::new(TaskAliasCache::new()),
        })
    }

    /// Replace the alias cache
    pub fn with_alias_store(mut self, aliases: Arc<dyn AliasStore>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Share an event bus with other clients
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn wallet_address(&self) -> Address {
        self.keypair.address()
    }

    pub fn program_id(&self) -> Address {
        self.config.program_id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AxleEvent> {
        self.events.subscribe()
    }

    pub fn on<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(&AxleEvent) + Send + Sync + 'static,
    {
        self.events.on(kind, handler);
    }

    pub fn on_all<F>(&self, handler: F)
    where
        F: Fn(&AxleEvent) + Send + Sync + 'static,
    {
        self.events.on_all(handler);
    }

    /// Wallet balance in base units
    pub async fn balance(&self) -> Result<u64> {
        self.ledger.balance(&self.wallet_address()).await
    }

    /// Task id behind a handle
    pub fn task_id(&self, handle: &str) -> TaskId {
        resolve(self.aliases.as_ref(), handle)
    }

    // ========================================================================
    // Agents
    // ========================================================================

    pub async fn register_agent(
        &self,
        node_id: impl Into<String>,
        capabilities: Vec<String>,
        fee_per_task: u64,
    ) -> Result<AgentRecord> {
        let registration = Registration {
            node_id: node_id.into(),
            capabilities,
            fee_per_task,
        };
        let ix = instruction::register_agent(&self.program_id(), &self.wallet_address(), registration)?;
        self.submit(ix).await?;

        let agent = self.own_agent().await?;
        self.events.emit(AxleEvent::AgentRegistered {
            authority: agent.authority,
            node_id: agent.node_id.clone(),
            capabilities: agent.capabilities.as_slice().to_vec(),
            timestamp: agent.registered_at,
        });
        Ok(agent)
    }

    pub async fn update_agent(&self, changes: AgentUpdate) -> Result<AgentRecord> {
        let ix = instruction::update_agent(&self.program_id(), &self.wallet_address(), changes)?;
        let receipt = self.submit(ix).await?;

        let agent = self.own_agent().await?;
        self.events.emit(AxleEvent::AgentUpdated {
            authority: agent.authority,
            is_active: agent.is_active,
            timestamp: receipt.timestamp,
        });
        Ok(agent)
    }

    /// Agent record owned by `owner`
    pub async fn get_agent(&self, owner: &Address) -> Result<Option<AgentRecord>> {
        let address = agent_address(&self.program_id(), owner)?.address;
        self.ledger.fetch_agent(&address).await
    }

    /// Registered agents, optionally only active ones offering `capability`
    pub async fn find_agents(&self, capability: Option<&str>) -> Result<Vec<AgentRecord>> {
        let agents: Vec<AgentRecord> = self
            .ledger
            .all_agents()
            .await?
            .into_iter()
            .map(|(_, agent)| agent)
            .collect();

        Ok(match capability {
            Some(capability) => axle_registry::find_by_capability(&agents, capability)
                .into_iter()
                .cloned()
                .collect(),
            None => agents,
        })
    }

    pub async fn get_reputation(&self, owner: &Address) -> Result<u64> {
        let address = agent_address(&self.program_id(), owner)?.address;
        self.ledger
            .fetch_agent(&address)
            .await?
            .map(|agent| agent.reputation)
            .ok_or_else(|| AxleError::not_found(address))
    }

    pub async fn mint_agent_badge(
        &self,
        name: impl Into<String>,
        symbol: impl Into<String>,
        uri: impl Into<String>,
    ) -> Result<TxReceipt> {
        let (name, symbol) = (name.into(), symbol.into());
        let ix = instruction::mint_agent_badge(
            &self.program_id(),
            &self.wallet_address(),
            name.clone(),
            symbol.clone(),
            uri.into(),
        )?;
        let receipt = self.submit(ix).await?;
        self.events.emit(AxleEvent::BadgeMinted {
            owner: self.wallet_address(),
            name,
            symbol,
        });
        Ok(receipt)
    }

    // ========================================================================
    // Tasks
    // ========================================================================

    /// Create a task under a fresh handle and fund its escrow
    pub async fn create_task(&self, params: CreateTaskParams) -> Result<TaskHandle> {
        let handle = Uuid::new_v4().to_string();
        let task_id = self.task_id(&handle);

        let ix = instruction::create_task(
            &self.program_id(),
            &self.wallet_address(),
            NewTask {
                task_id,
                description_hash: description_hash(&params.description),
                required_capability: params.required_capability,
                reward: params.reward,
                deadline: params.deadline,
            },
        )?;
        let receipt = self.submit(ix).await?;

        let address = task_address(&self.program_id(), &task_id)?.address;
        let record = self.require_task(&address).await?;
        remember(self.aliases.as_ref(), &handle, task_id);
        self.events.emit(AxleEvent::TaskCreated {
            handle: handle.clone(),
            task_id,
            requester: record.requester,
            required_capability: record.required_capability.clone(),
            reward: record.reward,
            deadline: record.deadline,
        });

        Ok(TaskHandle {
            handle,
            task_id,
            address,
            record,
            receipt,
        })
    }

    pub async fn accept_task(&self, handle: &str) -> Result<TaskRecord> {
        let task_id = self.task_id(handle);
        let ix = instruction::accept_task(&self.program_id(), &task_id, &self.wallet_address())?;
        let receipt = self.submit(ix).await?;

        let task = self.fetch_known(handle, &task_id).await?;
        self.events.emit(AxleEvent::TaskAccepted {
            task_id,
            provider: self.wallet_address(),
            timestamp: receipt.timestamp,
        });
        Ok(task)
    }

    /// Deliver a JSON result; the ledger stores its canonical hash
    pub async fn deliver_task(&self, handle: &str, result: &Value) -> Result<TaskRecord> {
        let task_id = self.task_id(handle);
        let result_hash = result_hash(result);
        let ix = instruction::deliver_task(&self.program_id(), &task_id, &self.wallet_address(), result_hash)?;
        let receipt = self.submit(ix).await?;

        let task = self.fetch_known(handle, &task_id).await?;
        self.events.emit(AxleEvent::TaskDelivered {
            task_id,
            provider: self.wallet_address(),
            result_hash,
            timestamp: receipt.timestamp,
        });
        Ok(task)
    }

    pub async fn complete_task(&self, handle: &str) -> Result<TaskRecord> {
        let task_id = self.task_id(handle);
        let current = self.fetch_known(handle, &task_id).await?;
        let provider = current.provider.unwrap_or_else(|| self.wallet_address());
        let before = self.get_agent(&provider).await?;

        let ix = instruction::complete_task(&self.program_id(), &task_id, &provider, &self.wallet_address())?;
        let receipt = self.submit(ix).await?;

        let task = self.fetch_known(handle, &task_id).await?;
        self.events.emit(AxleEvent::TaskCompleted {
            task_id,
            provider,
            reward: task.reward,
            timestamp: receipt.timestamp,
        });
        self.emit_reputation(&provider, before).await?;
        Ok(task)
    }

    pub async fn cancel_task(&self, handle: &str) -> Result<TaskRecord> {
        let task_id = self.task_id(handle);
        let ix = instruction::cancel_task(&self.program_id(), &task_id, &self.wallet_address())?;
        let receipt = self.submit(ix).await?;

        let task = self.fetch_known(handle, &task_id).await?;
        self.events.emit(AxleEvent::TaskCancelled {
            task_id,
            refund: task.reward,
            timestamp: receipt.timestamp,
        });
        Ok(task)
    }

    /// Reclaim the reward of an accepted task past its deadline
    pub async fn timeout_task(&self, handle: &str) -> Result<TaskRecord> {
        let task_id = self.task_id(handle);
        let current = self.fetch_known(handle, &task_id).await?;
        let provider = current.provider.unwrap_or_else(|| self.wallet_address());
        let before = self.get_agent(&provider).await?;

        let ix = instruction::timeout_task(&self.program_id(), &task_id, &provider, &self.wallet_address())?;
        let receipt = self.submit(ix).await?;

        let task = self.fetch_known(handle, &task_id).await?;
        self.events.emit(AxleEvent::TaskTimedOut {
            task_id,
            provider,
            refund: task.reward,
            timestamp: receipt.timestamp,
        });
        self.emit_reputation(&provider, before).await?;
        Ok(task)
    }

    pub async fn get_task(&self, handle: &str) -> Result<Option<TaskRecord>> {
        let task_id = self.task_id(handle);
        let address = task_address(&self.program_id(), &task_id)?.address;
        let task = self.ledger.fetch_task(&address).await?;
        if task.is_some() {
            remember(self.aliases.as_ref(), handle, task_id);
        }
        Ok(task)
    }

    /// All tasks, or only open tasks needing `capability`
    pub async fn list_tasks(&self, capability: Option<&str>) -> Result<Vec<TaskRecord>> {
        let tasks = self.ledger.all_tasks().await?.into_iter().map(|(_, task)| task);
        Ok(match capability {
            Some(capability) => tasks
                .filter(|task| task.status == TaskStatus::Created && task.required_capability == capability)
                .collect(),
            None => tasks.collect(),
        })
    }

    // ========================================================================
    // Messaging
    // ========================================================================

    /// Sign a message from this wallet
    pub fn create_message(
        &self,
        message_type: MessageType,
        recipient: Option<String>,
        payload: Value,
    ) -> Result<SignedMessage> {
        Ok(axle_messaging::create_message(&self.keypair, message_type, recipient, payload)?)
    }

    pub fn verify_message(&self, message: &SignedMessage) -> bool {
        axle_messaging::verify_message(message)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn submit(&self, ix: Instruction) -> Result<TxReceipt> {
        let operation = ix.operation().map(|op| op.name()).unwrap_or("unknown");
        let signed = ix.sign(&self.keypair);

        let receipt = tokio::time::timeout(self.config.confirmation_timeout, self.ledger.submit(signed))
            .await
            .map_err(|_| {
                AxleError::ledger(format!(
                    "{} not confirmed within {:?}",
                    operation, self.config.confirmation_timeout
                ))
            })??;

        tracing::info!(operation, slot = receipt.slot, signature = %receipt.signature, "confirmed");
        Ok(receipt)
    }

    async fn own_agent(&self) -> Result<AgentRecord> {
        let address = agent_address(&self.program_id(), &self.wallet_address())?.address;
        self.ledger
            .fetch_agent(&address)
            .await?
            .ok_or_else(|| AxleError::not_found(address))
    }

    /// Fetch an existing task and keep its alias
    async fn fetch_known(&self, handle: &str, task_id: &TaskId) -> Result<TaskRecord> {
        let address = task_address(&self.program_id(), task_id)?.address;
        let task = self.require_task(&address).await?;
        remember(self.aliases.as_ref(), handle, *task_id);
        Ok(task)
    }

    async fn require_task(&self, address: &Address) -> Result<TaskRecord> {
        self.ledger
            .fetch_task(address)
            .await?
            .ok_or_else(|| AxleError::not_found(address))
    }

    async fn emit_reputation(&self, provider: &Address, before: Option<AgentRecord>) -> Result<()> {
        let (Some(before), Some(after)) = (before, self.get_agent(provider).await?) else {
            return Ok(());
        };
        self.events.emit(AxleEvent::ReputationUpdated {
            agent: *provider,
            old_reputation: before.reputation,
            new_reputation: after.reputation,
        });
        Ok(())
    }
}

/// SHA-256 of the canonical JSON of a delivered result
pub fn result_hash(result: &Value) -> ContentHash {
    ContentHash::from(sha256(to_canonical_string(result).as_bytes()))
}
