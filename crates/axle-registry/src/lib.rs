//! AXLE Registry - Agent registration and capability lookup
//!
//! Registration is keyed by the owner's derived agent address, so each key
//! registers at most once. The owner may later change capabilities, fee and
//! the active flag; the node id never changes. Reputation and counters are
//! not writable here.

use axle_codec::AgentUpdate;
use axle_types::{
    validate_node_id, Address, AgentRecord, AxleError, CapabilitySet, Result, UnixTimestamp,
};
use serde::{Deserialize, Serialize};

/// Maximum badge name length in bytes
pub const MAX_BADGE_NAME_LEN: usize = 64;

/// Maximum badge symbol length in bytes
pub const MAX_BADGE_SYMBOL_LEN: usize = 16;

/// Maximum badge metadata uri length in bytes
pub const MAX_BADGE_URI_LEN: usize = 200;

/// Parameters of a registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub node_id: String,
    pub capabilities: Vec<String>,
    pub fee_per_task: u64,
}

/// Create the record for a new agent
///
/// `existing` is whatever is stored at the owner's agent address.
pub fn register(
    existing: Option<&AgentRecord>,
    agent_address: &Address,
    authority: Address,
    registration: Registration,
    now: UnixTimestamp,
) -> Result<AgentRecord> {
    if existing.is_some() {
        return Err(AxleError::already_exists(agent_address));
    }

    validate_node_id(&registration.node_id)?;
    let capabilities = CapabilitySet::new(registration.capabilities)?;

    let agent = AgentRecord::new(
        authority,
        registration.node_id,
        capabilities,
        registration.fee_per_task,
        now,
    );

    tracing::info!(
        node_id = %agent.node_id,
        authority = %agent.authority,
        capabilities = agent.capabilities.len(),
        "agent registered"
    );
    Ok(agent)
}

/// Apply an owner update, leaving unset fields unchanged
pub fn update(agent: &AgentRecord, caller: &Address, changes: &AgentUpdate) -> Result<AgentRecord> {
    if &agent.authority != caller {
        return Err(AxleError::unauthorized(format!(
            "{} is not the owner of agent {}",
            caller, agent.node_id
        )));
    }

    let mut updated = agent.clone();
    if let Some(capabilities) = &changes.capabilities {
        updated.capabilities = CapabilitySet::new(capabilities.iter().cloned())?;
    }
    if let Some(fee) = changes.fee_per_task {
        updated.fee_per_task = fee;
    }
    if let Some(active) = changes.is_active {
        updated.is_active = active;
    }

    tracing::info!(node_id = %updated.node_id, active = updated.is_active, "agent updated");
    Ok(updated)
}

/// All active agents advertising `capability`, in input order
pub fn find_by_capability<'a, I>(agents: I, capability: &str) -> Vec<&'a AgentRecord>
where
    I: IntoIterator<Item = &'a AgentRecord>,
{
    agents
        .into_iter()
        .filter(|agent| agent.is_eligible_for(capability))
        .collect()
}

/// Check badge metadata limits and that the owner is a registered agent
pub fn validate_badge(
    agent: Option<&AgentRecord>,
    owner: &Address,
    name: &str,
    symbol: &str,
    uri: &str,
) -> Result<()> {
    match agent {
        None => return Err(AxleError::not_found(owner)),
        Some(agent) if &agent.authority != owner => {
            return Err(AxleError::unauthorized("badge owner must be the agent authority"));
        }
        Some(_) => {}
    }

    check_len("name", name, MAX_BADGE_NAME_LEN)?;
    check_len("symbol", symbol, MAX_BADGE_SYMBOL_LEN)?;
    check_len("uri", uri, MAX_BADGE_URI_LEN)
}

fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    if value.len() > max {
        return Err(AxleError::invalid_input(
            field,
            format!("too long ({} bytes, max {})", value.len(), max),
        ));
    }
    Ok(())
}
