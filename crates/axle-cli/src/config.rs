//! CLI configuration
//!
//! Sources, lowest precedence first: `config/default`, `config/local`, the
//! file named by `--config`, then `AXLE__`-prefixed environment variables
//! (`AXLE__LOGGING__LEVEL=debug`). Command-line flags override all of them.

use std::path::PathBuf;
use std::time::Duration;

use axle_sdk::{Address, Cluster, Config};
use serde::{Deserialize, Serialize};

/// Top-level CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxleConfig {
    /// Cluster name (localnet, devnet, mainnet)
    #[serde(default = "default_cluster")]
    pub cluster: String,

    /// RPC endpoint; the cluster default when unset
    #[serde(default)]
    pub rpc_url: Option<String>,

    /// Program id in base58; the built-in id when unset
    #[serde(default)]
    pub program_id: Option<String>,

    /// Wallet keypair file
    #[serde(default = "default_keypair_path")]
    pub keypair_path: PathBuf,

    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout_secs: u64,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for AxleConfig {
    fn default() -> Self {
        Self {
            cluster: default_cluster(),
            rpc_url: None,
            program_id: None,
            keypair_path: default_keypair_path(),
            confirmation_timeout_secs: default_confirmation_timeout(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_cluster() -> String {
    "devnet".to_string()
}

fn default_keypair_path() -> PathBuf {
    PathBuf::from("axle-keypair.json")
}

fn default_confirmation_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

// =============================================================================
// Configuration Loading
// =============================================================================

impl AxleConfig {
    /// Load configuration from files and environment
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("AXLE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// SDK settings derived from this configuration
    pub fn sdk_config(&self) -> anyhow::Result<Config> {
        let cluster: Cluster = self.cluster.parse()?;
        let mut config = Config::default()
            .with_cluster(cluster)
            .with_confirmation_timeout(Duration::from_secs(self.confirmation_timeout_secs));

        if let Some(url) = &self.rpc_url {
            config = config.with_rpc_url(url.clone());
        }
        if let Some(id) = &self.program_id {
            config = config.with_program_id(id.parse::<Address>()?);
        }
        Ok(config)
    }
}
