//! Protocol events emitted by the client
//!
//! Events are published after the ledger confirms an operation. Consumers
//! either register callbacks (per kind or for every event) or subscribe to
//! the broadcast stream.

use std::collections::HashMap;
use std::sync::Arc;

use axle_types::{Address, ContentHash, TaskId, UnixTimestamp};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Events emitted after confirmed operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AxleEvent {
    AgentRegistered {
        authority: Address,
        node_id: String,
        capabilities: Vec<String>,
        timestamp: UnixTimestamp,
    },

    AgentUpdated {
        authority: Address,
        is_active: bool,
        timestamp: UnixTimestamp,
    },

    TaskCreated {
        handle: String,
        task_id: TaskId,
        requester: Address,
        required_capability: String,
        reward: u64,
        deadline: UnixTimestamp,
    },

    TaskAccepted {
        task_id: TaskId,
        provider: Address,
        timestamp: UnixTimestamp,
    },

    TaskDelivered {
        task_id: TaskId,
        provider: Address,
        result_hash: ContentHash,
        timestamp: UnixTimestamp,
    },

    TaskCompleted {
        task_id: TaskId,
        provider: Address,
        reward: u64,
        timestamp: UnixTimestamp,
    },

    TaskCancelled {
        task_id: TaskId,
        refund: u64,
        timestamp: UnixTimestamp,
    },

    TaskTimedOut {
        task_id: TaskId,
        provider: Address,
        refund: u64,
        timestamp: UnixTimestamp,
    },

    ReputationUpdated {
        agent: Address,
        old_reputation: u64,
        new_reputation: u64,
    },

    BadgeMinted {
        owner: Address,
        name: String,
        symbol: String,
    },
}

/// Discriminant of [`AxleEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    AgentRegistered,
    AgentUpdated,
    TaskCreated,
    TaskAccepted,
    TaskDelivered,
    TaskCompleted,
    TaskCancelled,
    TaskTimedOut,
    ReputationUpdated,
    BadgeMinted,
}

impl AxleEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::AgentRegistered { .. } => EventKind::AgentRegistered,
            Self::AgentUpdated { .. } => EventKind::AgentUpdated,
            Self::TaskCreated { .. } => EventKind::TaskCreated,
            Self::TaskAccepted { .. } => EventKind::TaskAccepted,
            Self::TaskDelivered { .. } => EventKind::TaskDelivered,
            Self::TaskCompleted { .. } => EventKind::TaskCompleted,
            Self::TaskCancelled { .. } => EventKind::TaskCancelled,
            Self::TaskTimedOut { .. } => EventKind::TaskTimedOut,
            Self::ReputationUpdated { .. } => EventKind::ReputationUpdated,
            Self::BadgeMinted { .. } => EventKind::BadgeMinted,
        }
    }
}

/// Callback invoked for matching events
pub type EventHandler = Arc<dyn Fn(&AxleEvent) + Send + Sync>;

/// Fan-out point for client events
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AxleEvent>,
    by_kind: Arc<RwLock<HashMap<EventKind, Vec<EventHandler>>>>,
    catch_all: Arc<RwLock<Vec<EventHandler>>>,
}

impl EventBus {
    /// Bus whose stream keeps up to `capacity` unread events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            by_kind: Arc::new(RwLock::new(HashMap::new())),
            catch_all: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register a handler for one kind of event
    pub fn on<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(&AxleEvent) + Send + Sync + 'static,
    {
        self.by_kind.write().entry(kind).or_default().push(Arc::new(handler));
    }

    /// Register a handler for every event
    pub fn on_all<F>(&self, handler: F)
    where
        F: Fn(&AxleEvent) + Send + Sync + 'static,
    {
        self.catch_all.write().push(Arc::new(handler));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AxleEvent> {
        self.sender.subscribe()
    }

    /// Deliver an event to handlers and subscribers
    pub fn emit(&self, event: AxleEvent) {
        // Handlers are cloned out so they may register further handlers
        let handlers: Vec<EventHandler> = {
            let by_kind = self.by_kind.read();
            let catch_all = self.catch_all.read();
            by_kind
                .get(&event.kind())
                .into_iter()
                .flatten()
                .chain(catch_all.iter())
                .cloned()
                .collect()
        };
        for handler in handlers {
            handler(&event);
        }

        tracing::debug!(kind = ?event.kind(), "event emitted");
        // Ignore send errors (no receivers)
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
