//! Server configuration
//!
//! Values are layered: TOML file, then environment (`PORT`,
//! `MINTBRIDGE_PRIVATE_KEY`), then command line flags.

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mintbridge_core::{
    AuctionScanConfig, BroadcastConfig, EngineConfig, EventKind, EventRegistry, GasPolicy,
    LookbackWindow,
};
use mintbridge_primitives::{Address, H256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::Cli;
use crate::http::ServerConfig;

/// Environment variable holding the operator key
pub const PRIVATE_KEY_ENV: &str = "MINTBRIDGE_PRIVATE_KEY";
/// Environment variable overriding the listen port
pub const PORT_ENV: &str = "PORT";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// File is not valid TOML for [`Config`]
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Required value absent
    #[error("missing {0}")]
    Missing(&'static str),

    /// Value present but unusable
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Setting name
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// Engine rejected the settings
    #[error(transparent)]
    Engine(#[from] mintbridge_core::CoreError),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ledger connection
    pub ledger: LedgerConfig,
    /// Operator account
    pub operator: OperatorConfig,
    /// Contract addresses
    pub contracts: ContractsConfig,
    /// Gas multipliers
    pub gas: GasConfig,
    /// Receipt wait
    pub broadcast: BroadcastSection,
    /// Active auction scan
    pub auctions: AuctionsConfig,
    /// Expected event hashes
    pub events: EventsConfig,
    /// HTTP server
    pub server: ServerSection,
}

/// `[ledger]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Chain id; fetched from the node when absent
    #[serde(default)]
    pub chain_id: Option<u64>,
    /// Per-request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            chain_id: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// `[operator]`
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// Hex private key of the signing account
    #[serde(default)]
    pub private_key: Option<String>,
}

impl fmt::Debug for OperatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorConfig")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// `[contracts]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractsConfig {
    /// NFT contract address
    #[serde(default)]
    pub nft_address: Option<String>,
    /// Auction contract address
    #[serde(default)]
    pub auction_address: Option<String>,
}

/// `[gas]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasConfig {
    /// Gas price multiplier numerator
    #[serde(default = "default_multiplier_num")]
    pub price_multiplier_num: u64,
    /// Gas price multiplier denominator
    #[serde(default = "default_multiplier_den")]
    pub price_multiplier_den: u64,
    /// Gas limit buffer numerator
    #[serde(default = "default_multiplier_num")]
    pub limit_buffer_num: u64,
    /// Gas limit buffer denominator
    #[serde(default = "default_multiplier_den")]
    pub limit_buffer_den: u64,
}

fn default_multiplier_num() -> u64 {
    12
}

fn default_multiplier_den() -> u64 {
    10
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            price_multiplier_num: default_multiplier_num(),
            price_multiplier_den: default_multiplier_den(),
            limit_buffer_num: default_multiplier_num(),
            limit_buffer_den: default_multiplier_den(),
        }
    }
}

impl From<&GasConfig> for GasPolicy {
    fn from(gas: &GasConfig) -> Self {
        GasPolicy {
            price_num: gas.price_multiplier_num,
            price_den: gas.price_multiplier_den,
            limit_num: gas.limit_buffer_num,
            limit_den: gas.limit_buffer_den,
        }
    }
}

/// `[broadcast]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastSection {
    /// Give up waiting for a receipt after this long
    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,
    /// Receipt polling interval
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,
}

fn default_receipt_timeout_secs() -> u64 {
    60
}

fn default_receipt_poll_interval_ms() -> u64 {
    2000
}

impl Default for BroadcastSection {
    fn default() -> Self {
        Self {
            receipt_timeout_secs: default_receipt_timeout_secs(),
            receipt_poll_interval_ms: default_receipt_poll_interval_ms(),
        }
    }
}

/// `[auctions]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionsConfig {
    /// Blocks behind the head to scan
    #[serde(default = "default_lookback_blocks")]
    pub lookback_blocks: u64,
    /// Fixed scan start; takes precedence over `lookback_blocks`
    #[serde(default)]
    pub from_block: Option<u64>,
    /// Largest block span per `eth_getLogs`
    #[serde(default = "default_log_chunk_size")]
    pub log_chunk_size: u64,
}

fn default_lookback_blocks() -> u64 {
    mintbridge_core::auctions::DEFAULT_LOOKBACK_BLOCKS
}

fn default_log_chunk_size() -> u64 {
    mintbridge_core::auctions::DEFAULT_LOG_CHUNK_SIZE
}

impl Default for AuctionsConfig {
    fn default() -> Self {
        Self {
            lookback_blocks: default_lookback_blocks(),
            from_block: None,
            log_chunk_size: default_log_chunk_size(),
        }
    }
}

impl AuctionsConfig {
    fn scan_config(&self) -> AuctionScanConfig {
        let window = match self.from_block {
            Some(block) => LookbackWindow::FromBlock(block),
            None => LookbackWindow::Blocks(self.lookback_blocks),
        };
        AuctionScanConfig {
            window,
            log_chunk_size: self.log_chunk_size,
        }
    }
}

/// `[events]`: hashes the deployed contracts are known to emit.
/// Unset entries fall back to the built-in expectations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventsConfig {
    /// `EditionCreated` topic
    #[serde(default)]
    pub edition_created: Option<String>,
    /// `NFTMinted` topic
    #[serde(default)]
    pub nft_minted: Option<String>,
    /// `AuctionCreated` topic
    #[serde(default)]
    pub auction_created: Option<String>,
    /// `AuctionEnded` topic
    #[serde(default)]
    pub auction_ended: Option<String>,
}

impl EventsConfig {
    fn expectations(&self) -> Result<Vec<(EventKind, H256)>, ConfigError> {
        let mut expected = EventRegistry::default_expectations()?;
        let configured = [
            (EventKind::EditionCreated, "events.edition_created", &self.edition_created),
            (EventKind::NftMinted, "events.nft_minted", &self.nft_minted),
            (EventKind::AuctionCreated, "events.auction_created", &self.auction_created),
            (EventKind::AuctionEnded, "events.auction_ended", &self.auction_ended),
        ];

        for (kind, field, value) in configured {
            let Some(value) = value else { continue };
            let hash = H256::from_hex(value).map_err(|e| ConfigError::Invalid {
                field,
                reason: e.to_string(),
            })?;
            expected.retain(|(k, _)| *k != kind);
            expected.push((kind, hash));
        }
        Ok(expected)
    }
}

/// `[server]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    /// Allow cross-origin requests from any origin
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 4000))
}

fn default_max_body_size() -> usize {
    1024 * 1024
}

fn default_enable_cors() -> bool {
    true
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            max_body_size: default_max_body_size(),
            enable_cors: default_enable_cors(),
        }
    }
}

impl From<&ServerSection> for ServerConfig {
    fn from(server: &ServerSection) -> Self {
        ServerConfig {
            listen_addr: server.listen_addr,
            max_body_size: server.max_body_size,
            enable_cors: server.enable_cors,
        }
    }
}

impl Config {
    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        tracing::info!("Loading config from {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment overrides; `lookup` is usually `std::env::var(..).ok()`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(PORT_ENV) {
            let port: u16 = port.trim().parse().map_err(|_| ConfigError::Invalid {
                field: "PORT",
                reason: format!("not a port number: {}", port),
            })?;
            self.server.listen_addr.set_port(port);
        }
        if let Some(key) = lookup(PRIVATE_KEY_ENV) {
            self.operator.private_key = Some(key);
        }
        Ok(())
    }

    /// Apply command line overrides
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(addr) = cli.listen_addr {
            self.server.listen_addr = addr;
        }
        if let Some(url) = &cli.rpc_url {
            self.ledger.rpc_url = url.clone();
        }
    }

    /// Operator private key
    pub fn private_key(&self) -> Result<&str, ConfigError> {
        self.operator
            .private_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::Missing("operator.private_key (or MINTBRIDGE_PRIVATE_KEY)"))
    }

    /// Ledger request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.ledger.request_timeout_secs)
    }

    /// Build the engine settings
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let nft_address = parse_address("contracts.nft_address", &self.contracts.nft_address)?;
        let auction_address =
            parse_address("contracts.auction_address", &self.contracts.auction_address)?;

        let mut engine = EngineConfig::new(nft_address, auction_address)?;
        engine.gas = GasPolicy::from(&self.gas);
        engine.broadcast = BroadcastConfig {
            receipt_timeout: Duration::from_secs(self.broadcast.receipt_timeout_secs),
            poll_interval: Duration::from_millis(self.broadcast.receipt_poll_interval_ms),
        };
        engine.scan = self.auctions.scan_config();
        engine.expected_events = self.events.expectations()?;
        EventRegistry::new().validate(&engine.expected_events)?;
        Ok(engine)
    }
}

fn parse_address(field: &'static str, value: &Option<String>) -> Result<Address, ConfigError> {
    let value = value.as_deref().ok_or(ConfigError::Missing(field))?;
    Address::from_hex(value.trim()).map_err(|e| ConfigError::Invalid {
        field,
        reason: e.to_string(),
    })
}
