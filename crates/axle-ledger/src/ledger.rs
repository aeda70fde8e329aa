//! The ledger operation interface

use async_trait::async_trait;
use axle_codec::{decode_agent, decode_task, AccountKind, AccountRecord};
use axle_crypto::Signature;
use axle_types::{Address, AgentRecord, AxleError, Result, TaskRecord, UnixTimestamp};
use serde::{Deserialize, Serialize};

use crate::SignedInstruction;

/// Confirmation of a committed instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Signature of the submission, doubling as its id
    pub signature: Signature,
    pub operation: String,
    /// Position of the commit in the ledger's total order
    pub slot: u64,
    pub timestamp: UnixTimestamp,
    /// Program log lines emitted during execution
    pub logs: Vec<String>,
}

/// Ledger that stores accounts and executes protocol instructions atomically
///
/// Implementations execute one instruction at a time. A rejected instruction
/// leaves no trace in account data or balances.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Program id instructions must target
    fn program_id(&self) -> Address;

    /// Execute a signed instruction and wait for its commit
    async fn submit(&self, tx: SignedInstruction) -> Result<TxReceipt>;

    /// Raw data stored at an address
    async fn fetch_account(&self, address: &Address) -> Result<Option<Vec<u8>>>;

    /// Every account whose data starts with `discriminator`
    async fn fetch_accounts(&self, discriminator: [u8; 8]) -> Result<Vec<(Address, Vec<u8>)>>;

    /// Native balance held at an address
    async fn balance(&self, address: &Address) -> Result<u64>;

    /// Current ledger time
    async fn clock(&self) -> Result<UnixTimestamp>;

    /// Decoded record at an address
    async fn fetch_record(&self, address: &Address) -> Result<Option<AccountRecord>> {
        match self.fetch_account(address).await? {
            Some(data) => Ok(Some(AccountRecord::decode(&data)?)),
            None => Ok(None),
        }
    }

    async fn fetch_agent(&self, address: &Address) -> Result<Option<AgentRecord>> {
        match self.fetch_account(address).await? {
            Some(data) => Ok(Some(decode_agent(&data)?)),
            None => Ok(None),
        }
    }

    async fn fetch_task(&self, address: &Address) -> Result<Option<TaskRecord>> {
        match self.fetch_account(address).await? {
            Some(data) => Ok(Some(decode_task(&data)?)),
            None => Ok(None),
        }
    }

    /// Every agent record, with its address
    async fn all_agents(&self) -> Result<Vec<(Address, AgentRecord)>> {
        let accounts = self.fetch_accounts(AccountKind::Agent.discriminator()).await?;
        accounts
            .into_iter()
            .map(|(address, data)| Ok::<_, AxleError>((address, decode_agent(&data)?)))
            .collect()
    }

    /// Every task record, with its address
    async fn all_tasks(&self) -> Result<Vec<(Address, TaskRecord)>> {
        let accounts = self.fetch_accounts(AccountKind::Task.discriminator()).await?;
        accounts
            .into_iter()
            .map(|(address, data)| Ok::<_, AxleError>((address, decode_task(&data)?)))
            .collect()
    }
}
