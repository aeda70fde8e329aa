//! AXLE CLI - Command-line interface for the agent task protocol
//!
//! # Quick Start
//!
//! ```bash
//! # Create a wallet keypair
//! axle keygen --outfile axle-keypair.json
//!
//! # Derive the agent account for it
//! axle address agent
//!
//! # Walk through the whole task lifecycle on an in-process ledger
//! axle demo --verbose
//!
//! # Sign and verify an off-ledger message
//! axle message sign --type ping --payload '{"hello":"world"}' > msg.json
//! axle message verify msg.json
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod display;

use axle_sdk::Address;
use commands::{demo, message, wallet};
use config::{AxleConfig, LoggingConfig};

/// AXLE CLI - Outsource tasks to agents with escrowed rewards
#[derive(Parser)]
#[command(name = "axle")]
#[command(author = "AXLE Protocol Contributors")]
#[command(version)]
#[command(about = "Agent task outsourcing with escrow, reputation and signed messages", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, env = "AXLE_CONFIG")]
    config: Option<String>,

    /// Wallet keypair file (overrides configuration)
    #[arg(short, long, global = true)]
    keypair: Option<PathBuf>,

    /// Program id (overrides configuration)
    #[arg(long, global = true)]
    program_id: Option<String>,

    /// Log level (overrides configuration; RUST_LOG takes precedence when set)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format: pretty or json
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new wallet keypair file
    Keygen {
        /// Output path (defaults to the configured keypair path)
        #[arg(short, long)]
        outfile: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Derive a protocol account address
    Address {
        #[arg(value_enum)]
        kind: wallet::AccountKind,

        /// Owner address for agent and badge accounts (defaults to the wallet)
        #[arg(long)]
        owner: Option<String>,

        /// Task handle for task and escrow accounts
        #[arg(long)]
        handle: Option<String>,
    },

    /// Run the task lifecycle demo on an in-process ledger
    Demo {
        /// Reward per task in base units
        #[arg(long, default_value = "100000000")]
        reward: u64,

        /// Print every emitted event
        #[arg(short, long)]
        verbose: bool,
    },

    /// Sign and verify off-ledger messages
    Message {
        #[command(subcommand)]
        action: MessageCommands,
    },
}

#[derive(Subcommand)]
enum MessageCommands {
    /// Sign a message with the wallet keypair
    Sign {
        /// Message type (discover, offer, accept, reject, deliver, verify, settle, ping, pong)
        #[arg(short = 't', long = "type")]
        message_type: String,

        /// Recipient DID
        #[arg(short, long)]
        recipient: Option<String>,

        /// JSON payload (inline or file path)
        #[arg(short, long, default_value = "{}")]
        payload: String,
    },

    /// Verify a signed message
    Verify {
        /// Message JSON (file path or inline)
        message: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = AxleConfig::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        settings.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        settings.logging.format = format;
    }
    if let Some(path) = cli.keypair {
        settings.keypair_path = path;
    }
    if let Some(id) = cli.program_id {
        settings.program_id = Some(id);
    }
    init_logging(&settings.logging)?;

    let sdk_config = settings.sdk_config()?;
    tracing::debug!(cluster = %sdk_config.cluster, program = %sdk_config.program_id, "configuration loaded");

    match cli.command {
        Commands::Keygen { outfile, force } => {
            let path = outfile.unwrap_or_else(|| settings.keypair_path.clone());
            wallet::keygen(&path, force)?;
        }

        Commands::Address { kind, owner, handle } => {
            let owner = owner.map(|o| o.parse::<Address>()).transpose()?;
            wallet::derive(
                kind,
                &sdk_config.program_id,
                owner,
                handle.as_deref(),
                &settings.keypair_path,
            )?;
        }

        Commands::Demo { reward, verbose } => {
            print_banner();
            demo::run(reward, verbose).await?;
        }

        Commands::Message { action } => match action {
            MessageCommands::Sign {
                message_type,
                recipient,
                payload,
            } => {
                message::sign(&settings.keypair_path, &message_type, recipient, &payload)?;
            }
            MessageCommands::Verify { message: input } => {
                if !message::verify(&input)? {
                    std::process::exit(1);
                }
            }
        },
    }

    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber
                .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_target(true).with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}

fn print_banner() {
    println!();
    println!("{}", "╔══════════════════════════════════════════════════════╗".bright_cyan());
    println!("{}", "║                                                      ║".bright_cyan());
    println!(
        "{}{}{}",
        "║   ".bright_cyan(),
        format!("{:<51}", "AXLE  -  Agent Task Outsourcing Protocol").bright_white().bold(),
        "║".bright_cyan()
    );
    println!("{}", "║                                                      ║".bright_cyan());
    println!("{}", "╚══════════════════════════════════════════════════════╝".bright_cyan());
    println!();
}
