//! CLI argument parsing for the mintbridge server

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// NFT mint, edition and auction API server
#[derive(Parser, Debug, Clone)]
#[command(name = "mintbridge")]
#[command(about = "NFT mint, edition and auction API server")]
#[command(version)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// HTTP listen address (overrides [server].listen_addr and PORT)
    #[arg(long)]
    pub listen_addr: Option<SocketAddr>,

    /// Ledger JSON-RPC endpoint (overrides [ledger].rpc_url)
    #[arg(long)]
    pub rpc_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
