//! AXLE SDK - Client facade for the agent task protocol
//!
//! [`AxleClient`] wraps a [`Ledger`] and a wallet keypair. It builds and
//! signs instructions, waits for their confirmation, reads records back and
//! emits [`AxleEvent`]s. It owns no authoritative state: the only thing it
//! keeps is a rebuildable cache of task handle aliases.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use axle_sdk::{AxleClient, CreateTaskParams, KeyPair, MemoryLedger};
//!
//! let ledger = Arc::new(MemoryLedger::new());
//! let provider = AxleClient::new(ledger.clone(), KeyPair::generate());
//! provider.register_agent("scraper-1", vec!["scraping".into()], 1_000).await?;
//!
//! let requester = AxleClient::new(ledger.clone(), KeyPair::generate());
//! let task = requester.create_task(CreateTaskParams {
//!     description: "Scrape example.com".into(),
//!     required_capability: "scraping".into(),
//!     reward: 100_000_000,
//!     deadline: now + 3600,
//! }).await?;
//!
//! provider.accept_task(&task.handle).await?;
//! ```

pub mod alias;
pub mod client;
pub mod config;
pub mod events;

pub use alias::{AliasStore, TaskAliasCache};
pub use client::{result_hash, AxleClient, CreateTaskParams, TaskHandle};
pub use config::{Cluster, Config};
pub use events::{AxleEvent, EventBus, EventHandler, EventKind};

pub use axle_codec::AgentUpdate;
pub use axle_crypto::KeyPair;
pub use axle_ledger::{Ledger, MemoryLedger, TxReceipt};
pub use axle_messaging::{MessageType, SignedMessage};
pub use axle_types::*;
