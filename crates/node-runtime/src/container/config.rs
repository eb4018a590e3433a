//! # Node Configuration
//!
//! Layered, lowest precedence first: built-in defaults, an optional TOML file,
//! `MC_*` environment variables, then command-line flags (applied by the
//! binary).
//!
//! ```toml
//! [network]
//! port = 8001
//! bootstrap_peers = ["127.0.0.1:8002", "127.0.0.1:8003"]
//!
//! [storage]
//! data_dir = "data"
//!
//! [keys]
//! keys_dir = "keys"
//!
//! [records]
//! offchain_dir = "offchain/records"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use mc_05_wire_protocol::MAX_MESSAGE_LEN;
use serde::Deserialize;
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NodeConfig {
    pub network: NetworkConfig,
    pub storage: StorageConfig,
    pub keys: KeysConfig,
    pub records: RecordsConfig,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Invalid peer address {0:?}, expected host:port")]
    InvalidPeer(String),

    #[error("Port must not be 0")]
    ZeroPort,

    #[error("max_peers must be at least 1")]
    NoPeerSlots,

    #[error("max_line_bytes {configured} is below the largest protocol message ({required})")]
    LineLimitTooSmall { configured: usize, required: usize },
}

impl NodeConfig {
    /// Defaults, then `path` if given, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Override fields from `MC_PORT`, `MC_DATA_DIR`, `MC_KEYS_DIR`, `MC_PEERS`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("MC_PORT") {
            self.network.port = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv {
                    var: "MC_PORT",
                    value,
                })?;
        }
        if let Some(value) = lookup("MC_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("MC_KEYS_DIR") {
            self.keys.keys_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("MC_PEERS") {
            self.network.bootstrap_peers = value
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(())
    }

    /// Reject settings the node cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        if self.network.max_peers == 0 {
            return Err(ConfigError::NoPeerSlots);
        }
        if self.network.max_line_bytes < MAX_MESSAGE_LEN {
            return Err(ConfigError::LineLimitTooSmall {
                configured: self.network.max_line_bytes,
                required: MAX_MESSAGE_LEN,
            });
        }
        for peer in &self.network.bootstrap_peers {
            parse_peer(peer)?;
        }
        Ok(())
    }

    /// Ledger file of the node listening on `port`.
    pub fn ledger_path(&self, port: u16) -> PathBuf {
        self.storage.data_dir.join(format!("blockchain_{port}.dat"))
    }
}

/// Split `host:port`.
pub fn parse_peer(peer: &str) -> Result<(String, u16), ConfigError> {
    let (host, port) = peer
        .rsplit_once(':')
        .ok_or_else(|| ConfigError::InvalidPeer(peer.to_string()))?;
    let port: u16 = port
        .parse()
        .map_err(|_| ConfigError::InvalidPeer(peer.to_string()))?;
    if host.is_empty() || port == 0 {
        return Err(ConfigError::InvalidPeer(peer.to_string()));
    }
    Ok((host.to_string(), port))
}

/// Network configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Interface to listen on.
    pub listen_host: String,
    /// Listening port; doubles as this node's validator identity.
    pub port: u16,
    /// Peers dialed once at startup, as `host:port`.
    pub bootstrap_peers: Vec<String>,
    /// Maximum simultaneously connected peers.
    pub max_peers: usize,
    /// Longest accepted protocol line.
    pub max_line_bytes: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_host: "127.0.0.1".to_string(),
            port: 8001,
            bootstrap_peers: Vec::new(),
            max_peers: 50,
            max_line_bytes: 8192,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `blockchain_<port>.dat`.
    pub data_dir: PathBuf,
    /// Create a genesis block when the ledger is empty. A node started
    /// without one backfills block 0 from its peers.
    pub create_genesis: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            create_genesis: true,
        }
    }
}

/// Key material configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KeysConfig {
    /// Directory holding `<port>_private.key` and `<port>_public.key`.
    pub keys_dir: PathBuf,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            keys_dir: PathBuf::from("keys"),
        }
    }
}

/// Off-chain record configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RecordsConfig {
    /// Directory `ADD`, `HASH`, `CHECKDUP` and `VALIDATE` resolve files against.
    pub offchain_dir: PathBuf,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            offchain_dir: PathBuf::from("offchain/records"),
        }
    }
}
