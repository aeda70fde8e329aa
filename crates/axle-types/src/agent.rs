//! Agent records and capability sets

use serde::{Deserialize, Serialize};

use crate::error::{AxleError, Result};
use crate::identity::Address;
use crate::UnixTimestamp;

/// Maximum node identifier length in bytes
pub const MAX_NODE_ID_LEN: usize = 64;

/// Maximum length of a single capability tag in bytes
pub const MAX_CAPABILITY_LEN: usize = 64;

/// Maximum number of capabilities one agent may advertise
pub const MAX_CAPABILITIES: usize = 16;

/// Reputation every agent starts with
pub const INITIAL_REPUTATION: u64 = 100;

/// Validate a node identifier
pub fn validate_node_id(node_id: &str) -> Result<()> {
    if node_id.is_empty() {
        return Err(AxleError::invalid_input("node_id", "must not be empty"));
    }
    if node_id.len() > MAX_NODE_ID_LEN {
        return Err(AxleError::invalid_input(
            "node_id",
            format!("too long ({} bytes, max {})", node_id.len(), MAX_NODE_ID_LEN),
        ));
    }
    Ok(())
}

/// Validate a single capability tag
pub fn validate_capability(capability: &str) -> Result<()> {
    if capability.is_empty() {
        return Err(AxleError::invalid_input("capability", "must not be empty"));
    }
    if capability.len() > MAX_CAPABILITY_LEN {
        return Err(AxleError::invalid_input(
            "capability",
            format!(
                "'{}' too long ({} bytes, max {})",
                capability,
                capability.len(),
                MAX_CAPABILITY_LEN
            ),
        ));
    }
    Ok(())
}

/// A non-empty, duplicate-free set of capability tags
///
/// Order of first appearance is preserved so the encoded form is stable.
/// Matching is exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CapabilitySet(Vec<String>);

impl CapabilitySet {
    /// Build a capability set, rejecting empty sets and oversize tags
    pub fn new<I, S>(capabilities: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tags: Vec<String> = Vec::new();
        for capability in capabilities {
            let capability = capability.into();
            validate_capability(&capability)?;
            if !tags.contains(&capability) {
                tags.push(capability);
            }
        }

        if tags.is_empty() {
            return Err(AxleError::invalid_input(
                "capabilities",
                "at least one capability is required",
            ));
        }
        if tags.len() > MAX_CAPABILITIES {
            return Err(AxleError::invalid_input(
                "capabilities",
                format!("too many ({}, max {})", tags.len(), MAX_CAPABILITIES),
            ));
        }

        Ok(Self(tags))
    }

    /// Exact-match membership test
    pub fn contains(&self, capability: &str) -> bool {
        self.0.iter().any(|c| c == capability)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a constructed set; present for API symmetry
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl TryFrom<Vec<String>> for CapabilitySet {
    type Error = AxleError;

    fn try_from(value: Vec<String>) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CapabilitySet> for Vec<String> {
    fn from(value: CapabilitySet) -> Self {
        value.0
    }
}

/// On-ledger identity of a task-performing agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Controlling key
    pub authority: Address,
    /// Human-readable node identifier, immutable after registration
    pub node_id: String,
    pub capabilities: CapabilitySet,
    /// Fee per task in base units
    pub fee_per_task: u64,
    /// Adjusted only by the reputation engine
    pub reputation: u64,
    pub is_active: bool,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    pub registered_at: UnixTimestamp,
}

impl AgentRecord {
    /// A freshly registered agent
    pub fn new(
        authority: Address,
        node_id: String,
        capabilities: CapabilitySet,
        fee_per_task: u64,
        registered_at: UnixTimestamp,
    ) -> Self {
        Self {
            authority,
            node_id,
            capabilities,
            fee_per_task,
            reputation: INITIAL_REPUTATION,
            is_active: true,
            tasks_completed: 0,
            tasks_failed: 0,
            registered_at,
        }
    }

    /// Whether this agent may accept a task needing `capability`
    pub fn is_eligible_for(&self, capability: &str) -> bool {
        self.is_active && self.capabilities.contains(capability)
    }
}
