//! mintbridge server binary
//!
//! Loads configuration, connects to the ledger, verifies the deployed
//! contracts and serves the HTTP API.

use std::sync::Arc;

use anyhow::{Context, Result};
use mintbridge_core::Engine;
use mintbridge_sdk::{HttpTransport, LedgerClient, Wallet};
use mintbridge_server::{ApiServer, Cli, Config, ServerConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    init_tracing(&cli);

    tracing::info!("mintbridge starting...");

    // File, then environment, then flags
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.apply_env(|key| std::env::var(key).ok())?;
    config.apply_cli(&cli);

    let wallet = Wallet::from_private_key_hex(config.private_key()?)
        .context("invalid operator private key")?;
    let engine_config = config.engine_config()?;

    let transport = HttpTransport::with_timeout(&config.ledger.rpc_url, config.request_timeout())?;
    let client = LedgerClient::connect_with(transport, config.ledger.chain_id)
        .await
        .with_context(|| format!("cannot reach ledger at {}", config.ledger.rpc_url))?;

    let engine = Arc::new(Engine::new(client, wallet, engine_config)?);
    let report = engine.startup_checks().await.context("startup checks failed")?;
    tracing::info!(
        chain_id = report.chain_id,
        operator = %report.operator,
        "ledger connected"
    );

    let server = ApiServer::new(ServerConfig::from(&config.server), engine);
    server.run(shutdown_signal()).await?;

    tracing::info!("mintbridge stopped");

    Ok(())
}

/// `RUST_LOG` wins over `--log-level`
fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.log_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    tracing::info!("Shutdown signal received");
}
