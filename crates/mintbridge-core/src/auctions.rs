//! Active auction reconstruction from historical logs.
//!
//! The auction contract has no "list active" query, so the set is rebuilt
//! per request: scan `AuctionCreated` and `AuctionEnded` logs over a
//! lookback window, drop every NFT that has an ending, then confirm the
//! rest against the live `auctions(nftId)` record.

use std::collections::HashSet;

use mintbridge_primitives::{H256, U256};
use mintbridge_sdk::quantity::u256_dec;
use mintbridge_sdk::types::{Log, LogFilter};
use mintbridge_sdk::LedgerClient;
use serde::{Deserialize, Serialize};

use crate::contracts::{Auction, AuctionContract};
use crate::error::{CoreError, CoreResult};
use crate::events::{EventKind, EventRegistry};

/// About one week of blocks at 12 s
pub const DEFAULT_LOOKBACK_BLOCKS: u64 = 50_400;

/// Largest block span per `eth_getLogs` request
pub const DEFAULT_LOG_CHUNK_SIZE: u64 = 10_000;

/// Where the scan starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookbackWindow {
    /// The last `n` blocks before the head
    Blocks(u64),
    /// A fixed block, typically the contract's deployment block
    FromBlock(u64),
}

impl Default for LookbackWindow {
    fn default() -> Self {
        LookbackWindow::Blocks(DEFAULT_LOOKBACK_BLOCKS)
    }
}

impl LookbackWindow {
    /// First block to scan when the chain head is `head`
    pub fn start(&self, head: u64) -> u64 {
        match *self {
            LookbackWindow::Blocks(n) => head.saturating_sub(n),
            LookbackWindow::FromBlock(b) => b.min(head),
        }
    }
}

/// Scan settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuctionScanConfig {
    /// Lookback window
    pub window: LookbackWindow,
    /// Largest block span per log request
    pub log_chunk_size: u64,
}

impl Default for AuctionScanConfig {
    fn default() -> Self {
        Self {
            window: LookbackWindow::default(),
            log_chunk_size: DEFAULT_LOG_CHUNK_SIZE,
        }
    }
}

/// An auction confirmed active, with the transaction that opened it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveAuction {
    /// Live record
    #[serde(flatten)]
    pub auction: Auction,
    /// Hash of the creating transaction
    pub transaction_hash: Option<H256>,
}

/// A candidate whose live record could not be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanFailure {
    /// NFT id
    #[serde(with = "u256_dec")]
    pub nft_id: U256,
    /// Error message
    pub error: String,
}

/// Best-effort scan result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveAuctions {
    /// Confirmed active auctions, in creation order
    pub auctions: Vec<ActiveAuction>,
    /// Candidates skipped because their record read failed
    pub failures: Vec<ScanFailure>,
}

/// Rebuilds the active auction set for one auction contract
#[derive(Debug, Clone, Copy)]
pub struct AuctionScanner {
    contract: AuctionContract,
    config: AuctionScanConfig,
}

impl AuctionScanner {
    /// Create a scanner
    pub fn new(contract: AuctionContract, config: AuctionScanConfig) -> CoreResult<Self> {
        if config.log_chunk_size == 0 {
            return Err(CoreError::Configuration("log_chunk_size must be positive".into()));
        }
        Ok(Self { contract, config })
    }

    /// Scan settings
    pub fn config(&self) -> &AuctionScanConfig {
        &self.config
    }

    /// Run the scan against the current chain head
    pub async fn scan(&self, client: &LedgerClient, registry: &EventRegistry) -> CoreResult<ActiveAuctions> {
        let head = client.block_number().await?;
        let from = self.config.window.start(head);
        tracing::debug!(from, head, "scanning auction logs");

        let created = self
            .fetch_logs(client, registry.hash(EventKind::AuctionCreated), from, head)
            .await?;
        let ended = self
            .fetch_logs(client, registry.hash(EventKind::AuctionEnded), from, head)
            .await?;
        tracing::debug!(created = created.len(), ended = ended.len(), "auction logs fetched");

        let mut ended_ids = HashSet::new();
        for log in &ended {
            match registry.decode_log(EventKind::AuctionEnded, log).and_then(|e| e.uint("nftId")) {
                Ok(id) => {
                    ended_ids.insert(id);
                }
                Err(e) => tracing::warn!(tx_hash = ?log.transaction_hash, error = %e, "skipping malformed AuctionEnded log"),
            }
        }

        let mut seen = HashSet::new();
        let mut result = ActiveAuctions::default();
        for log in &created {
            let nft_id = match registry.decode_log(EventKind::AuctionCreated, log).and_then(|e| e.uint("nftId")) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(tx_hash = ?log.transaction_hash, error = %e, "skipping malformed AuctionCreated log");
                    continue;
                }
            };
            if !seen.insert(nft_id) {
                continue;
            }
            if ended_ids.contains(&nft_id) {
                tracing::debug!(nft_id = %nft_id, "auction ended in window");
                continue;
            }

            match self.contract.auction(client, nft_id).await {
                Ok(auction) if auction.is_active => result.auctions.push(ActiveAuction {
                    auction,
                    transaction_hash: log.transaction_hash,
                }),
                Ok(_) => tracing::debug!(nft_id = %nft_id, "auction no longer active"),
                Err(e) => {
                    tracing::warn!(nft_id = %nft_id, error = %e, "failed to read auction record");
                    result.failures.push(ScanFailure {
                        nft_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            active = result.auctions.len(),
            failures = result.failures.len(),
            "active auction scan complete"
        );
        Ok(result)
    }

    /// `eth_getLogs` over `[from, to]` in spans of at most `log_chunk_size` blocks
    async fn fetch_logs(&self, client: &LedgerClient, topic0: H256, from: u64, to: u64) -> CoreResult<Vec<Log>> {
        let mut logs = Vec::new();
        let mut start = from;
        loop {
            let end = start.saturating_add(self.config.log_chunk_size - 1).min(to);
            let filter = LogFilter::event(self.contract.address(), topic0).range(start, end);
            logs.extend(client.get_logs(&filter).await?);
            if end >= to {
                break;
            }
            start = end + 1;
        }
        Ok(logs)
    }
}
