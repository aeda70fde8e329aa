//! Instruction payloads: one variant per ledger operation

use axle_crypto::discriminator;
use axle_types::{ContentHash, TaskId};
use serde::{Deserialize, Serialize};

use crate::{ByteReader, ByteWriter, CodecError, CodecResult};

/// Parameters of an agent update; unset fields stay unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentUpdate {
    pub capabilities: Option<Vec<String>>,
    pub fee_per_task: Option<u64>,
    pub is_active: Option<bool>,
}

impl AgentUpdate {
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_none() && self.fee_per_task.is_none() && self.is_active.is_none()
    }
}

/// A protocol operation with its parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum ProtocolInstruction {
    RegisterAgent {
        node_id: String,
        capabilities: Vec<String>,
        fee_per_task: u64,
    },
    UpdateAgent(AgentUpdate),
    CreateTask {
        task_id: TaskId,
        description_hash: ContentHash,
        required_capability: String,
        reward: u64,
        deadline: i64,
    },
    AcceptTask,
    DeliverTask {
        result_hash: ContentHash,
    },
    CompleteTask,
    CancelTask,
    TimeoutTask,
    MintAgentBadge {
        name: String,
        symbol: String,
        uri: String,
    },
}

impl ProtocolInstruction {
    /// All operation names, in declaration order
    pub const OPERATIONS: [&'static str; 9] = [
        "register_agent",
        "update_agent",
        "create_task",
        "accept_task",
        "deliver_task",
        "complete_task",
        "cancel_task",
        "timeout_task",
        "mint_agent_badge",
    ];

    /// Operation name as hashed into the discriminator
    pub fn name(&self) -> &'static str {
        match self {
            Self::RegisterAgent { .. } => "register_agent",
            Self::UpdateAgent(_) => "update_agent",
            Self::CreateTask { .. } => "create_task",
            Self::AcceptTask => "accept_task",
            Self::DeliverTask { .. } => "deliver_task",
            Self::CompleteTask => "complete_task",
            Self::CancelTask => "cancel_task",
            Self::TimeoutTask => "timeout_task",
            Self::MintAgentBadge { .. } => "mint_agent_badge",
        }
    }

    pub fn discriminator(&self) -> [u8; 8] {
        instruction_discriminator(self.name())
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_discriminator(self.discriminator());
        match self {
            Self::RegisterAgent {
                node_id,
                capabilities,
                fee_per_task,
            } => {
                w.put_str(node_id).put_str_seq(capabilities).put_u64(*fee_per_task);
            }
            Self::UpdateAgent(update) => {
                w.put_option(update.capabilities.as_ref(), |w, caps| {
                    w.put_str_seq(caps);
                })
                .put_option(update.fee_per_task.as_ref(), |w, fee| {
                    w.put_u64(*fee);
                })
                .put_option(update.is_active.as_ref(), |w, active| {
                    w.put_bool(*active);
                });
            }
            Self::CreateTask {
                task_id,
                description_hash,
                required_capability,
                reward,
                deadline,
            } => {
                w.put_task_id(task_id)
                    .put_hash(description_hash)
                    .put_str(required_capability)
                    .put_u64(*reward)
                    .put_i64(*deadline);
            }
            Self::DeliverTask { result_hash } => {
                w.put_hash(result_hash);
            }
            Self::MintAgentBadge { name, symbol, uri } => {
                w.put_str(name).put_str(symbol).put_str(uri);
            }
            Self::AcceptTask | Self::CompleteTask | Self::CancelTask | Self::TimeoutTask => {}
        }
        w.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let mut r = ByteReader::new(bytes);
        let disc = r.discriminator()?;
        let name = Self::OPERATIONS
            .iter()
            .find(|name| instruction_discriminator(name) == disc)
            .ok_or(CodecError::UnknownDiscriminator(disc))?;

        let instruction = match *name {
            "register_agent" => Self::RegisterAgent {
                node_id: r.string("node_id")?,
                capabilities: r.string_seq("capabilities")?,
                fee_per_task: r.u64()?,
            },
            "update_agent" => Self::UpdateAgent(AgentUpdate {
                capabilities: r.option("capabilities", |r| r.string_seq("capabilities"))?,
                fee_per_task: r.option("fee_per_task", |r| r.u64())?,
                is_active: r.option("is_active", |r| r.bool("is_active"))?,
            }),
            "create_task" => Self::CreateTask {
                task_id: r.task_id()?,
                description_hash: r.hash()?,
                required_capability: r.string("required_capability")?,
                reward: r.u64()?,
                deadline: r.i64()?,
            },
            "accept_task" => Self::AcceptTask,
            "deliver_task" => Self::DeliverTask {
                result_hash: r.hash()?,
            },
            "complete_task" => Self::CompleteTask,
            "cancel_task" => Self::CancelTask,
            "timeout_task" => Self::TimeoutTask,
            "mint_agent_badge" => Self::MintAgentBadge {
                name: r.string("name")?,
                symbol: r.string("symbol")?,
                uri: r.string("uri")?,
            },
            _ => return Err(CodecError::UnknownDiscriminator(disc)),
        };
        Ok(instruction)
    }
}

/// Discriminator of an operation name
pub fn instruction_discriminator(operation: &str) -> [u8; 8] {
    discriminator("global", operation)
}
