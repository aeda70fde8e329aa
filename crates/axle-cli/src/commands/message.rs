//! Message commands - Sign and verify agent messages

use std::fs;
use std::path::Path;

use axle_crypto::KeyPair;
use axle_messaging::{create_message, verify_message_json, MessageType};
use colored::*;
use serde_json::Value;

/// Sign a message with the keypair at `keypair_path` and print its JSON
pub fn sign(
    keypair_path: &Path,
    message_type: &str,
    recipient: Option<String>,
    payload: &str,
) -> anyhow::Result<()> {
    let keypair = KeyPair::load(keypair_path)?;
    let message_type: MessageType = message_type.parse()?;
    let payload: Value = serde_json::from_str(&load_input(payload)?)?;

    let message = create_message(&keypair, message_type, recipient, payload)?;
    println!("{}", serde_json::to_string_pretty(&message)?);
    Ok(())
}

/// Verify a message given inline or as a file path
pub fn verify(input: &str) -> anyhow::Result<bool> {
    println!("{}", "Verifying Message...".bright_white().bold());
    println!();

    let report = verify_message_json(&load_input(input)?);
    println!("  Type: {}", report.message_type.bright_cyan());
    println!("  ID: {}", report.message_id.bright_yellow());
    println!("  Sender: {}", report.sender.bright_cyan());
    println!();

    if report.valid {
        println!("  {} {}", "✓".bright_green(), "Signature is VALID".bright_green().bold());
    } else {
        println!("  {} {}", "✗".bright_red(), "Signature is INVALID".bright_red().bold());
        for error in &report.errors {
            println!("  Error: {}", error.bright_red());
        }
    }
    Ok(report.valid)
}

/// Inline JSON, or the contents of the file it names
fn load_input(input: &str) -> anyhow::Result<String> {
    let trimmed = input.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') || trimmed.starts_with('"') {
        return Ok(input.to_string());
    }
    if Path::new(input).exists() {
        return Ok(fs::read_to_string(input)?);
    }
    Ok(input.to_string())
}
