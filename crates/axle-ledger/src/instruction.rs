//! Ledger instructions and their builders
//!
//! Each protocol operation is one instruction: the program id, a fixed ordered
//! account list and the encoded [`ProtocolInstruction`]. Submissions carry the
//! signer's signature over `program_id ‖ accounts ‖ data`.

use axle_codec::{AgentUpdate, ProtocolInstruction};
use axle_crypto::{
    agent_address, badge_address, escrow_address, task_address, KeyPair, Signable, Signature,
};
use axle_escrow::NewTask;
use axle_registry::Registration;
use axle_types::{Address, ContentHash, Result, TaskId};
use serde::{Deserialize, Serialize};

/// One entry of an instruction's account list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMeta {
    pub address: Address,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn writable(address: Address) -> Self {
        Self {
            address,
            is_signer: false,
            is_writable: true,
        }
    }

    pub fn readonly(address: Address) -> Self {
        Self {
            address,
            is_signer: false,
            is_writable: false,
        }
    }

    pub fn signer(address: Address, is_writable: bool) -> Self {
        Self {
            address,
            is_signer: true,
            is_writable,
        }
    }
}

/// An unsigned instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub program_id: Address,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

impl Instruction {
    pub fn new(program_id: Address, accounts: Vec<AccountMeta>, operation: &ProtocolInstruction) -> Self {
        Self {
            program_id,
            accounts,
            data: operation.encode(),
        }
    }

    /// Decode the operation carried in `data`
    pub fn operation(&self) -> Result<ProtocolInstruction> {
        Ok(ProtocolInstruction::decode(&self.data)?)
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.accounts.iter().map(|meta| meta.address).collect()
    }

    /// Sign with the operation's signer
    pub fn sign(self, keypair: &KeyPair) -> SignedInstruction {
        let signature = axle_crypto::sign(keypair, &self);
        SignedInstruction {
            instruction: self,
            signer: keypair.address(),
            signature,
        }
    }
}

impl Signable for Instruction {
    fn signable_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(32 + self.accounts.len() * 32 + self.data.len());
        bytes.extend_from_slice(self.program_id.as_bytes());
        for meta in &self.accounts {
            bytes.extend_from_slice(meta.address.as_bytes());
        }
        bytes.extend_from_slice(&self.data);
        bytes
    }
}

/// An instruction with its signer's signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedInstruction {
    pub instruction: Instruction,
    pub signer: Address,
    pub signature: Signature,
}

impl SignedInstruction {
    pub fn verify(&self) -> bool {
        axle_crypto::verify(&self.signature, &self.signer, &self.instruction)
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn register_agent(program_id: &Address, authority: &Address, registration: Registration) -> Result<Instruction> {
    let agent = agent_address(program_id, authority)?;
    let operation = ProtocolInstruction::RegisterAgent {
        node_id: registration.node_id,
        capabilities: registration.capabilities,
        fee_per_task: registration.fee_per_task,
    };
    Ok(Instruction::new(
        *program_id,
        vec![
            AccountMeta::writable(agent.address),
            AccountMeta::signer(*authority, true),
        ],
        &operation,
    ))
}

pub fn update_agent(program_id: &Address, authority: &Address, update: AgentUpdate) -> Result<Instruction> {
    let agent = agent_address(program_id, authority)?;
    Ok(Instruction::new(
        *program_id,
        vec![
            AccountMeta::writable(agent.address),
            AccountMeta::signer(*authority, false),
        ],
        &ProtocolInstruction::UpdateAgent(update),
    ))
}

pub fn create_task(program_id: &Address, requester: &Address, params: NewTask) -> Result<Instruction> {
    let task = task_address(program_id, &params.task_id)?;
    let escrow = escrow_address(program_id, &params.task_id)?;
    let operation = ProtocolInstruction::CreateTask {
        task_id: params.task_id,
        description_hash: params.description_hash,
        required_capability: params.required_capability,
        reward: params.reward,
        deadline: params.deadline,
    };
    Ok(Instruction::new(
        *program_id,
        vec![
            AccountMeta::writable(task.address),
            AccountMeta::writable(escrow.address),
            AccountMeta::signer(*requester, true),
        ],
        &operation,
    ))
}

pub fn accept_task(program_id: &Address, task_id: &TaskId, provider: &Address) -> Result<Instruction> {
    let task = task_address(program_id, task_id)?;
    let agent = agent_address(program_id, provider)?;
    Ok(Instruction::new(
        *program_id,
        vec![
            AccountMeta::writable(task.address),
            AccountMeta::readonly(agent.address),
            AccountMeta::signer(*provider, false),
        ],
        &ProtocolInstruction::AcceptTask,
    ))
}

pub fn deliver_task(
    program_id: &Address,
    task_id: &TaskId,
    provider: &Address,
    result_hash: ContentHash,
) -> Result<Instruction> {
    let task = task_address(program_id, task_id)?;
    Ok(Instruction::new(
        *program_id,
        vec![
            AccountMeta::writable(task.address),
            AccountMeta::signer(*provider, false),
        ],
        &ProtocolInstruction::DeliverTask { result_hash },
    ))
}

pub fn complete_task(
    program_id: &Address,
    task_id: &TaskId,
    provider: &Address,
    requester: &Address,
) -> Result<Instruction> {
    let task = task_address(program_id, task_id)?;
    let agent = agent_address(program_id, provider)?;
    let escrow = escrow_address(program_id, task_id)?;
    Ok(Instruction::new(
        *program_id,
        vec![
            AccountMeta::writable(task.address),
            AccountMeta::writable(agent.address),
            AccountMeta::writable(*provider),
            AccountMeta::writable(escrow.address),
            AccountMeta::signer(*requester, false),
        ],
        &ProtocolInstruction::CompleteTask,
    ))
}

pub fn cancel_task(program_id: &Address, task_id: &TaskId, requester: &Address) -> Result<Instruction> {
    let task = task_address(program_id, task_id)?;
    let escrow = escrow_address(program_id, task_id)?;
    Ok(Instruction::new(
        *program_id,
        vec![
            AccountMeta::writable(task.address),
            AccountMeta::writable(escrow.address),
            AccountMeta::signer(*requester, true),
        ],
        &ProtocolInstruction::CancelTask,
    ))
}

pub fn timeout_task(
    program_id: &Address,
    task_id: &TaskId,
    provider: &Address,
    requester: &Address,
) -> Result<Instruction> {
    let task = task_address(program_id, task_id)?;
    let agent = agent_address(program_id, provider)?;
    let escrow = escrow_address(program_id, task_id)?;
    Ok(Instruction::new(
        *program_id,
        vec![
            AccountMeta::writable(task.address),
            AccountMeta::writable(agent.address),
            AccountMeta::writable(escrow.address),
            AccountMeta::signer(*requester, true),
        ],
        &ProtocolInstruction::TimeoutTask,
    ))
}

pub fn mint_agent_badge(
    program_id: &Address,
    authority: &Address,
    name: String,
    symbol: String,
    uri: String,
) -> Result<Instruction> {
    let agent = agent_address(program_id, authority)?;
    let badge = badge_address(program_id, authority)?;
    Ok(Instruction::new(
        *program_id,
        vec![
            AccountMeta::readonly(agent.address),
            AccountMeta::writable(badge.address),
            AccountMeta::signer(*authority, true),
        ],
        &ProtocolInstruction::MintAgentBadge { name, symbol, uri },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axle_crypto::DEFAULT_PROGRAM_ID;

    #[test]
    fn test_account_orders() {
        let requester = Address::new([1u8; 32]);
        let provider = Address::new([2u8; 32]);
        let id = TaskId::new([3u8; 32]);
        let pid = DEFAULT_PROGRAM_ID;

        let task = task_address(&pid, &id).unwrap().address;
        let escrow = escrow_address(&pid, &id).unwrap().address;
        let agent = agent_address(&pid, &provider).unwrap().address;

        let complete = complete_task(&pid, &id, &provider, &requester).unwrap();
        assert_eq!(complete.addresses(), vec![task, agent, provider, escrow, requester]);
        assert!(complete.accounts[4].is_signer);
        assert!(!complete.accounts[2].is_signer);

        let timeout = timeout_task(&pid, &id, &provider, &requester).unwrap();
        assert_eq!(timeout.addresses(), vec![task, agent, escrow, requester]);

        let accept = accept_task(&pid, &id, &provider).unwrap();
        assert_eq!(accept.addresses(), vec![task, agent, provider]);
    }

    #[test]
    fn test_signature_covers_accounts_and_data() {
        let keypair = KeyPair::generate();
        let ix = cancel_task(&DEFAULT_PROGRAM_ID, &TaskId::new([1u8; 32]), &keypair.address()).unwrap();
        let signed = ix.sign(&keypair);
        assert!(signed.verify());

        let mut tampered = signed.clone();
        tampered.instruction.accounts[0].address = Address::new([9u8; 32]);
        assert!(!tampered.verify());

        let mut tampered = signed.clone();
        tampered.instruction.data.push(0);
        assert!(!tampered.verify());

        let mut tampered = signed;
        tampered.instruction.program_id = Address::new([9u8; 32]);
        assert!(!tampered.verify());
    }

    #[test]
    fn test_operation_decodes() {
        let ix = accept_task(&DEFAULT_PROGRAM_ID, &TaskId::new([1u8; 32]), &Address::new([2u8; 32])).unwrap();
        assert_eq!(ix.operation().unwrap(), ProtocolInstruction::AcceptTask);
    }
}
