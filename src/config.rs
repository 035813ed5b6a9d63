//! Configuration types for the Taproot wallet
//!
//! Manages global configuration including network selection, Esplora endpoint,
//! request timeout and fee-rate floor.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default request timeout for the Esplora client, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Minimum fee rate in sat/vB used when the upstream recommendation is missing or lower
pub const DEFAULT_MIN_FEE_RATE: u64 = 2;

/// Global wallet configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    pub bitcoin: BitcoinConfig,
    /// Optional custom data directory (holds the key file)
    pub wallet_dir: Option<String>,
}

/// Bitcoin network and blockchain configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitcoinConfig {
    pub network: NetworkType,
    pub esplora_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_min_fee_rate")]
    pub min_fee_rate: u64,
    /// Number of concurrent transaction lookups during UTXO validation
    #[serde(default = "default_parallel_requests")]
    pub parallel_requests: usize,
}

/// Bitcoin network type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Regtest,
    Signet,
    Testnet,
    Mainnet,
}

impl NetworkType {
    /// Convert to the `bitcoin` crate network
    pub fn to_bitcoin_network(self) -> bitcoin::Network {
        match self {
            NetworkType::Mainnet => bitcoin::Network::Bitcoin,
            NetworkType::Testnet => bitcoin::Network::Testnet,
            NetworkType::Signet => bitcoin::Network::Signet,
            NetworkType::Regtest => bitcoin::Network::Regtest,
        }
    }

    /// Default Esplora URL for this network
    ///
    /// - Regtest: `http://localhost:3002`
    /// - Signet: `https://mempool.space/signet/api`
    /// - Testnet: `https://mempool.space/testnet/api`
    /// - Mainnet: `https://mempool.space/api`
    pub fn default_esplora_url(self) -> String {
        match self {
            NetworkType::Regtest => "http://localhost:3002".to_string(),
            NetworkType::Signet => "https://mempool.space/signet/api".to_string(),
            NetworkType::Testnet => "https://mempool.space/testnet/api".to_string(),
            NetworkType::Mainnet => "https://mempool.space/api".to_string(),
        }
    }
}

impl std::str::FromStr for NetworkType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "regtest" => Ok(NetworkType::Regtest),
            "signet" => Ok(NetworkType::Signet),
            "testnet" => Ok(NetworkType::Testnet),
            "mainnet" | "bitcoin" => Ok(NetworkType::Mainnet),
            other => Err(ConfigError::InvalidNetwork(other.to_string())),
        }
    }
}

impl std::fmt::Display for NetworkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkType::Regtest => write!(f, "regtest"),
            NetworkType::Signet => write!(f, "signet"),
            NetworkType::Testnet => write!(f, "testnet"),
            NetworkType::Mainnet => write!(f, "mainnet"),
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_min_fee_rate() -> u64 {
    DEFAULT_MIN_FEE_RATE
}

fn default_parallel_requests() -> usize {
    1
}

impl BitcoinConfig {
    /// Network defaults for the given network
    pub fn for_network(network: NetworkType) -> Self {
        Self {
            network,
            esplora_url: network.default_esplora_url(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            min_fee_rate: DEFAULT_MIN_FEE_RATE,
            parallel_requests: default_parallel_requests(),
        }
    }
}

impl GlobalConfig {
    /// Create default configuration for a network
    pub fn for_network(network: NetworkType) -> Self {
        Self {
            bitcoin: BitcoinConfig::for_network(network),
            wallet_dir: None,
        }
    }

    /// Create default configuration for signet
    pub fn default_signet() -> Self {
        Self::for_network(NetworkType::Signet)
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self::default_signet()
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid network: {0}")]
    InvalidNetwork(String),

    #[error("Config directory not found")]
    DirectoryNotFound,
}

/// Configuration overrides from CLI arguments or environment variables
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub network: Option<NetworkType>,
    pub esplora_url: Option<String>,
    pub wallet_dir: Option<String>,
}

impl ConfigOverrides {
    /// Create empty overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Create overrides from environment variables
    ///
    /// Reads `BITCOIN_NETWORK`, `ESPLORA_URL` and `WALLET_DIR`. An unparseable network is ignored.
    pub fn from_env() -> Self {
        Self {
            network: std::env::var("BITCOIN_NETWORK")
                .ok()
                .and_then(|s| s.parse().ok()),
            esplora_url: std::env::var("ESPLORA_URL").ok(),
            wallet_dir: std::env::var("WALLET_DIR").ok(),
        }
    }

    /// Merge with another set of overrides (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        if other.network.is_some() {
            self.network = other.network;
        }
        if other.esplora_url.is_some() {
            self.esplora_url = other.esplora_url;
        }
        if other.wallet_dir.is_some() {
            self.wallet_dir = other.wallet_dir;
        }
        self
    }
}

/// Get the default configuration directory path
///
/// Returns: `~/.taproot-wallet/`
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(".taproot-wallet"))
        .ok_or(ConfigError::DirectoryNotFound)
}

/// Get the default configuration file path
///
/// Returns: `~/.taproot-wallet/config.json`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(default_config_dir()?.join("config.json"))
}

/// Load configuration from file with overrides
///
/// # Priority (highest to lowest):
/// 1. CLI overrides (passed as argument)
/// 2. Environment variables
/// 3. Config file
/// 4. Network defaults
///
/// # Example
///
/// ```ignore
/// use taproot_wallet::config::{load_config, ConfigOverrides, NetworkType};
///
/// let mut cli_overrides = ConfigOverrides::new();
/// cli_overrides.network = Some(NetworkType::Signet);
///
/// let config = load_config(None, cli_overrides)?;
/// ```
pub fn load_config(
    config_path: Option<&Path>,
    cli_overrides: ConfigOverrides,
) -> Result<GlobalConfig, ConfigError> {
    let env_overrides = ConfigOverrides::from_env();
    load_config_with(config_path, env_overrides, cli_overrides)
}

/// Load configuration with explicit environment overrides
///
/// Same as [`load_config`] but does not read the process environment.
pub fn load_config_with(
    config_path: Option<&Path>,
    env_overrides: ConfigOverrides,
    cli_overrides: ConfigOverrides,
) -> Result<GlobalConfig, ConfigError> {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    let mut config = if path.exists() {
        let contents = std::fs::read_to_string(&path)?;
        serde_json::from_str(&contents)?
    } else {
        let network = cli_overrides
            .network
            .or(env_overrides.network)
            .unwrap_or(NetworkType::Signet);
        GlobalConfig::for_network(network)
    };

    apply_overrides(&mut config, env_overrides);
    apply_overrides(&mut config, cli_overrides);

    validate(&config)?;

    Ok(config)
}

/// Save configuration to file
///
/// Creates parent directories if they don't exist.
pub fn save_config(config: &GlobalConfig, config_path: Option<&Path>) -> Result<(), ConfigError> {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;

    Ok(())
}

fn validate(config: &GlobalConfig) -> Result<(), ConfigError> {
    if config.bitcoin.esplora_url.trim().is_empty() {
        return Err(ConfigError::Invalid("esplora_url must not be empty".to_string()));
    }
    if config.bitcoin.min_fee_rate == 0 {
        return Err(ConfigError::Invalid(
            "min_fee_rate must be at least 1 sat/vB".to_string(),
        ));
    }
    Ok(())
}

/// Apply configuration overrides (internal helper)
fn apply_overrides(config: &mut GlobalConfig, overrides: ConfigOverrides) {
    // Switching networks re-points the Esplora URL unless it is overridden too
    if let Some(network) = overrides.network {
        if config.bitcoin.network != network {
            config.bitcoin.network = network;
            if overrides.esplora_url.is_none() {
                config.bitcoin.esplora_url = network.default_esplora_url();
            }
        }
    }

    if let Some(url) = overrides.esplora_url {
        config.bitcoin.esplora_url = url;
    }

    if let Some(wallet_dir) = overrides.wallet_dir {
        config.wallet_dir = Some(wallet_dir);
    }
}
