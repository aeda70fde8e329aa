//! Wallet commands - Keypairs and derived account addresses

use std::path::Path;

use axle_crypto::{
    agent_address, badge_address, escrow_address, task_address, task_id_from_handle, KeyPair,
};
use axle_sdk::Address;
use colored::*;

use crate::display;

/// Which derived account to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AccountKind {
    Agent,
    Task,
    Escrow,
    Badge,
}

/// Generate a keypair and write it to `outfile`
pub fn keygen(outfile: &Path, force: bool) -> anyhow::Result<()> {
    println!("{}", "Generating Keypair...".bright_white().bold());
    println!();

    if outfile.exists() {
        if !force {
            anyhow::bail!("{} already exists (pass --force to overwrite)", outfile.display());
        }
        std::fs::remove_file(outfile)?;
    }

    let keypair = KeyPair::generate();
    keypair.save(outfile)?;
    tracing::info!(path = %outfile.display(), address = %keypair.address(), "keypair written");

    display::success(&format!("Wrote {}", outfile.display()));
    display::kv("Address", &keypair.address().to_string());
    display::kv("DID", &keypair.did());
    println!();
    println!("{}", "Keep this file secret: it holds the signing key.".bright_black());
    Ok(())
}

/// Print the address of a derived account
///
/// `agent` and `badge` take `--owner` (defaults to the configured wallet);
/// `task` and `escrow` take `--handle`.
pub fn derive(
    kind: AccountKind,
    program_id: &Address,
    owner: Option<Address>,
    handle: Option<&str>,
    keypair_path: &Path,
) -> anyhow::Result<()> {
    let derived = match kind {
        AccountKind::Agent | AccountKind::Badge => {
            let owner = match owner {
                Some(owner) => owner,
                None => KeyPair::load(keypair_path)?.address(),
            };
            if kind == AccountKind::Agent {
                agent_address(program_id, &owner)?
            } else {
                badge_address(program_id, &owner)?
            }
        }
        AccountKind::Task | AccountKind::Escrow => {
            let handle = handle.ok_or_else(|| anyhow::anyhow!("--handle is required for {:?} addresses", kind))?;
            let task_id = task_id_from_handle(handle);
            display::kv("Task id", &task_id.to_string());
            if kind == AccountKind::Task {
                task_address(program_id, &task_id)?
            } else {
                escrow_address(program_id, &task_id)?
            }
        }
    };

    display::kv("Program", &program_id.to_string());
    display::kv("Address", &derived.address.to_string());
    display::kv("Bump", &derived.bump.to_string());
    Ok(())
}
