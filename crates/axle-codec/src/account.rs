//! Account records: discriminated union of agent and task state

use axle_crypto::discriminator;
use axle_types::{AgentRecord, CapabilitySet, TaskRecord};
use serde::{Deserialize, Serialize};

use crate::{ByteReader, ByteWriter, CodecError, CodecResult};

/// Record type name hashed into the agent discriminator
pub const AGENT_ACCOUNT_NAME: &str = "AgentState";

/// Record type name hashed into the task discriminator
pub const TASK_ACCOUNT_NAME: &str = "TaskAccount";

/// Discriminator of an agent account
pub fn agent_discriminator() -> [u8; 8] {
    discriminator("account", AGENT_ACCOUNT_NAME)
}

/// Discriminator of a task account
pub fn task_discriminator() -> [u8; 8] {
    discriminator("account", TASK_ACCOUNT_NAME)
}

/// Kind of stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Agent,
    Task,
}

impl AccountKind {
    pub fn discriminator(self) -> [u8; 8] {
        match self {
            Self::Agent => agent_discriminator(),
            Self::Task => task_discriminator(),
        }
    }

    pub fn from_discriminator(disc: &[u8; 8]) -> Option<Self> {
        if *disc == agent_discriminator() {
            Some(Self::Agent)
        } else if *disc == task_discriminator() {
            Some(Self::Task)
        } else {
            None
        }
    }
}

/// A decoded account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccountRecord {
    Agent(AgentRecord),
    Task(TaskRecord),
}

impl AccountRecord {
    pub fn kind(&self) -> AccountKind {
        match self {
            Self::Agent(_) => AccountKind::Agent,
            Self::Task(_) => AccountKind::Task,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Agent(agent) => encode_agent(agent),
            Self::Task(task) => encode_task(task),
        }
    }

    /// Decode by matching the discriminator first; trailing bytes are ignored
    pub fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let mut reader = ByteReader::new(bytes);
        let disc = reader.discriminator()?;
        match AccountKind::from_discriminator(&disc) {
            Some(AccountKind::Agent) => read_agent(&mut reader).map(Self::Agent),
            Some(AccountKind::Task) => read_task(&mut reader).map(Self::Task),
            None => Err(CodecError::UnknownDiscriminator(disc)),
        }
    }

    pub fn into_agent(self) -> Option<AgentRecord> {
        match self {
            Self::Agent(agent) => Some(agent),
            Self::Task(_) => None,
        }
    }

    pub fn into_task(self) -> Option<TaskRecord> {
        match self {
            Self::Task(task) => Some(task),
            Self::Agent(_) => None,
        }
    }
}

pub fn encode_agent(agent: &AgentRecord) -> Vec<u8> {
    let mut w = ByteWriter::with_discriminator(agent_discriminator());
    w.put_address(&agent.authority)
        .put_str(&agent.node_id)
        .put_str_seq(agent.capabilities.as_slice())
        .put_u64(agent.fee_per_task)
        .put_u64(agent.reputation)
        .put_bool(agent.is_active)
        .put_u64(agent.tasks_completed)
        .put_u64(agent.tasks_failed)
        .put_i64(agent.registered_at);
    w.into_bytes()
}

pub fn encode_task(task: &TaskRecord) -> Vec<u8> {
    let mut w = ByteWriter::with_discriminator(task_discriminator());
    w.put_task_id(&task.id)
        .put_address(&task.requester)
        .put_option(task.provider.as_ref(), |w, p| {
            w.put_address(p);
        })
        .put_hash(&task.description_hash)
        .put_str(&task.required_capability)
        .put_u64(task.reward)
        .put_i64(task.deadline)
        .put_status(task.status)
        .put_hash(&task.result_hash)
        .put_i64(task.created_at);
    for ts in [task.accepted_at, task.delivered_at, task.completed_at] {
        w.put_option(ts.as_ref(), |w, t| {
            w.put_i64(*t);
        });
    }
    w.into_bytes()
}

/// Decode an agent account, failing on any other kind
pub fn decode_agent(bytes: &[u8]) -> CodecResult<AgentRecord> {
    let mut reader = ByteReader::new(bytes);
    let disc = reader.discriminator()?;
    if disc != agent_discriminator() {
        return Err(CodecError::UnknownDiscriminator(disc));
    }
    read_agent(&mut reader)
}

/// Decode a task account, failing on any other kind
pub fn decode_task(bytes: &[u8]) -> CodecResult<TaskRecord> {
    let mut reader = ByteReader::new(bytes);
    let disc = reader.discriminator()?;
    if disc != task_discriminator() {
        return Err(CodecError::UnknownDiscriminator(disc));
    }
    read_task(&mut reader)
}

fn read_agent(r: &mut ByteReader<'_>) -> CodecResult<AgentRecord> {
    let authority = r.address()?;
    let node_id = r.string("node_id")?;
    let capabilities = CapabilitySet::new(r.string_seq("capabilities")?).map_err(|e| {
        CodecError::InvalidField {
            field: "capabilities",
            reason: e.to_string(),
        }
    })?;

    Ok(AgentRecord {
        authority,
        node_id,
        capabilities,
        fee_per_task: r.u64()?,
        reputation: r.u64()?,
        is_active: r.bool("is_active")?,
        tasks_completed: r.u64()?,
        tasks_failed: r.u64()?,
        registered_at: r.i64()?,
    })
}

fn read_task(r: &mut ByteReader<'_>) -> CodecResult<TaskRecord> {
    Ok(TaskRecord {
        id: r.task_id()?,
        requester: r.address()?,
        provider: r.option("provider", |r| r.address())?,
        description_hash: r.hash()?,
        required_capability: r.string("required_capability")?,
        reward: r.u64()?,
        deadline: r.i64()?,
        status: r.status()?,
        result_hash: r.hash()?,
        created_at: r.i64()?,
        accepted_at: r.option("accepted_at", |r| r.i64())?,
        delivered_at: r.option("delivered_at", |r| r.i64())?,
        completed_at: r.option("completed_at", |r| r.i64())?,
    })
}
