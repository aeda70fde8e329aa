//! Client configuration

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use axle_crypto::DEFAULT_PROGRAM_ID;
use axle_types::{Address, AxleError};
use serde::{Deserialize, Serialize};

/// Named ledger deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cluster {
    Localnet,
    Devnet,
    Mainnet,
}

impl Cluster {
    /// Default RPC endpoint of the cluster
    pub fn rpc_url(self) -> &'static str {
        match self {
            Self::Localnet => "http://127.0.0.1:8899",
            Self::Devnet => "https://api.devnet.solana.com",
            Self::Mainnet => "https://api.mainnet-beta.solana.com",
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Localnet => "localnet",
            Self::Devnet => "devnet",
            Self::Mainnet => "mainnet",
        };
        f.write_str(name)
    }
}

impl FromStr for Cluster {
    type Err = AxleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "localnet" | "local" => Ok(Self::Localnet),
            "devnet" => Ok(Self::Devnet),
            "mainnet" | "mainnet-beta" => Ok(Self::Mainnet),
            other => Err(AxleError::invalid_input("cluster", format!("unknown cluster '{}'", other))),
        }
    }
}

/// SDK configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub cluster: Cluster,
    /// RPC endpoint, defaults to the cluster's
    pub rpc_url: String,
    /// Program the client targets
    pub program_id: Address,
    /// How long to wait for a submission to commit
    pub confirmation_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cluster: Cluster::Devnet,
            rpc_url: Cluster::Devnet.rpc_url().to_string(),
            program_id: DEFAULT_PROGRAM_ID,
            confirmation_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Switch cluster, resetting the RPC url to the cluster default
    pub fn with_cluster(mut self, cluster: Cluster) -> Self {
        self.cluster = cluster;
        self.rpc_url = cluster.rpc_url().to_string();
        self
    }

    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    pub fn with_program_id(mut self, program_id: Address) -> Self {
        self.program_id = program_id;
        self
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }
}
