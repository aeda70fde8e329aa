//! Demo command - The full task lifecycle on the in-process ledger
//!
//! A provider agent completes one task, lets a second one expire, and the
//! requester cancels a third before anyone accepts it. Reputation and
//! balances are printed after every step.

use std::sync::Arc;

use axle_ledger::{Ledger, MemoryLedger};
use axle_sdk::{AxleClient, AxleEvent, CreateTaskParams, KeyPair, MessageType, BASE_UNITS_PER_TOKEN};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

use crate::display;

const STEPS: u64 = 7;

/// Run the lifecycle demo with `reward` base units per task
pub async fn run(reward: u64, verbose: bool) -> anyhow::Result<()> {
    println!("{}", "AXLE DEMO: Agent Task Lifecycle".bright_white().bold());
    println!();
    println!("This demo shows agents outsourcing work with:");
    println!("  • {} rewards held by the protocol", "Escrowed".bright_green());
    println!("  • {} that follows delivery", "Reputation".bright_green());
    println!("  • {} agent-to-agent messages", "Signed".bright_green());

    let pb = ProgressBar::new(STEPS);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );

    let ledger = Arc::new(MemoryLedger::new());
    let requester = AxleClient::new(ledger.clone(), KeyPair::generate());
    let provider = AxleClient::new(ledger.clone(), KeyPair::generate());

    if verbose {
        requester.on_all(|event| log_event("requester", event));
        provider.on_all(|event| log_event("provider", event));
    }

    // Step 1: Fund and register
    pb.set_message("Registering provider...");
    display::section("Step 1: Fund Requester, Register Provider");
    ledger.airdrop(&requester.wallet_address(), BASE_UNITS_PER_TOKEN).await?;
    display::success(&format!(
        "Requester {} funded with {}",
        short(&requester.wallet_address().to_string()),
        display::tokens(BASE_UNITS_PER_TOKEN)
    ));

    let agent = provider
        .register_agent("scraper-node-1", vec!["scraping".into(), "browser".into()], reward / 10)
        .await?;
    display::success(&format!("Agent {} registered", agent.node_id.bright_cyan()));
    display::kv("Capabilities", &agent.capabilities.as_slice().join(", "));
    display::kv("Reputation", &agent.reputation.to_string());
    pb.inc(1);

    // Step 2: Negotiate off-ledger
    pb.set_message("Exchanging messages...");
    display::section("Step 2: Signed Offer");
    let offer = provider.create_message(
        MessageType::Offer,
        Some(requester.wallet_address().to_string()),
        json!({"capability": "scraping", "price": reward}),
    )?;
    let valid = requester.verify_message(&offer);
    display::success(&format!("Offer {} from {}", offer.id.bright_yellow(), short(&offer.sender)));
    display::kv("Signature valid", &valid.to_string());
    pb.inc(1);

    // Step 3: Completed task
    pb.set_message("Running first task...");
    display::section("Step 3: Create, Accept, Deliver, Complete");
    let first = post(&ledger, &requester, "Scrape product prices from example.com", reward, 3600).await?;
    display::info(&format!("Task {} escrowed {}", short(&first), display::tokens(reward)));
    provider.accept_task(&first).await?;
    display::info("Provider accepted");
    let delivered = provider
        .deliver_task(&first, &json!({"products": 42, "source": "example.com"}))
        .await?;
    display::info(&format!("Result hash {}", short(&delivered.result_hash.to_hex())));
    requester.complete_task(&first).await?;
    display::success("Requester completed; reward released");
    report(&ledger, &requester, &provider).await?;
    pb.inc(1);

    // Step 4: Accepted but never delivered
    pb.set_message("Running second task...");
    display::section("Step 4: Missed Deadline");
    let second = post(&ledger, &requester, "Scrape the archive", reward, 60).await?;
    provider.accept_task(&second).await?;
    display::info("Provider accepted, then went quiet");
    let now = ledger.advance_clock(61).await;
    display::info(&format!("Ledger clock advanced to {}", now));
    requester.timeout_task(&second).await?;
    display::success("Requester timed out the task; reward refunded");
    report(&ledger, &requester, &provider).await?;
    pb.inc(1);

    // Step 5: Cancelled before acceptance
    pb.set_message("Running third task...");
    display::section("Step 5: Cancel Before Acceptance");
    let before = requester.balance().await?;
    let third = post(&ledger, &requester, "Scrape nothing", reward, 3600).await?;
    requester.cancel_task(&third).await?;
    let after = requester.balance().await?;
    display::success("Requester cancelled; escrow refunded");
    display::kv("Balance before", &display::tokens(before));
    display::kv("Balance after", &display::tokens(after));
    pb.inc(1);

    // Step 6: Badge
    pb.set_message("Minting badge...");
    display::section("Step 6: Agent Badge");
    provider
        .mint_agent_badge("Scraper Node 1", "SCRP", "https://axleprotocol.com/badges/scraper-node-1.json")
        .await?;
    display::success("Badge minted for the provider");
    pb.inc(1);

    // Step 7: Totals
    pb.set_message("Checking totals...");
    display::section("Step 7: Ledger Totals");
    let tasks = requester.list_tasks(None).await?;
    display::kv("Tasks on ledger", &tasks.len().to_string());
    display::kv("Journal entries", &ledger.journal().await.len().to_string());
    let supply = ledger.total_supply().await;
    display::kv("Total supply", &supply.to_string());
    if supply != BASE_UNITS_PER_TOKEN as u128 {
        display::error("Supply changed during the demo");
        anyhow::bail!("supply mismatch: {}", supply);
    }
    pb.inc(1);
    pb.finish_with_message("Done");

    println!();
    println!("{}", "All escrow movements balanced.".bright_green().bold());
    Ok(())
}

async fn post(
    ledger: &MemoryLedger,
    requester: &AxleClient,
    description: &str,
    reward: u64,
    window: i64,
) -> anyhow::Result<String> {
    let now = ledger.clock().await?;
    let task = requester
        .create_task(CreateTaskParams {
            description: description.to_string(),
            required_capability: "scraping".into(),
            reward,
            deadline: now + window,
        })
        .await?;
    Ok(task.handle)
}

async fn report(ledger: &MemoryLedger, requester: &AxleClient, provider: &AxleClient) -> anyhow::Result<()> {
    let me = provider.wallet_address();
    let agent = provider
        .get_agent(&me)
        .await?
        .ok_or_else(|| anyhow::anyhow!("provider agent missing"))?;
    display::kv("Provider reputation", &agent.reputation.to_string());
    display::kv(
        "Completed / failed",
        &format!("{} / {}", agent.tasks_completed, agent.tasks_failed),
    );
    display::kv("Provider balance", &display::tokens(ledger.balance(&me).await?));
    display::kv("Requester balance", &display::tokens(requester.balance().await?));
    Ok(())
}

fn log_event(who: &str, event: &AxleEvent) {
    if let Ok(json) = serde_json::to_string(event) {
        println!("      {} {}", format!("[{}]", who).bright_black(), json.bright_black());
    }
}

fn short(s: &str) -> String {
    if s.len() <= 12 {
        s.to_string()
    } else {
        format!("{}…", &s[..12])
    }
}
