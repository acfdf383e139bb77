//! Domain operations.
//!
//! [`Engine`] owns the ledger client, the operator's broadcaster, the two
//! contract bindings and the event registry. Inputs arrive as strings the
//! way a request body carries them and are validated before any I/O.

use std::future::Future;
use std::sync::Arc;

use mintbridge_primitives::{format_ether, parse_ether, Address, H256, U256};
use mintbridge_sdk::quantity::u256_dec;
use mintbridge_sdk::types::{BlockId, TransactionReceipt};
use mintbridge_sdk::{LedgerClient, Wallet};
use serde::{Deserialize, Serialize};
use tracing::{Instrument, Span};

use crate::auctions::{ActiveAuctions, AuctionScanConfig, AuctionScanner};
use crate::broadcast::{BroadcastConfig, Broadcaster, WriteRequest};
use crate::contracts::{Auction, AuctionContract, BidHistory, Edition, NftContract, TokenEdition};
use crate::error::{CoreError, CoreResult};
use crate::events::{EventKind, EventRegistry};
use crate::gas::GasPolicy;

/// Engine settings
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// NFT contract address
    pub nft_address: Address,
    /// Auction contract address
    pub auction_address: Address,
    /// Gas price and limit multipliers
    pub gas: GasPolicy,
    /// Receipt wait
    pub broadcast: BroadcastConfig,
    /// Active auction scan
    pub scan: AuctionScanConfig,
    /// Event hashes the deployed ABI is known to use
    pub expected_events: Vec<(EventKind, H256)>,
}

impl EngineConfig {
    /// Defaults for everything but the contract addresses
    pub fn new(nft_address: Address, auction_address: Address) -> CoreResult<Self> {
        Ok(Self {
            nft_address,
            auction_address,
            gas: GasPolicy::default(),
            broadcast: BroadcastConfig::default(),
            scan: AuctionScanConfig::default(),
            expected_events: EventRegistry::default_expectations()?,
        })
    }
}

/// Result of `create_edition`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEdition {
    /// Creating transaction
    pub transaction_hash: H256,
    /// New edition id
    #[serde(with = "u256_dec")]
    pub edition_id: U256,
    /// Mintable tokens reported by the event
    #[serde(with = "u256_dec")]
    pub available_tokens: U256,
}

/// Result of `mint_edition`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintedToken {
    /// Minting transaction
    pub transaction_hash: H256,
    /// New token id
    #[serde(with = "u256_dec")]
    pub token_id: U256,
    /// Edition the token belongs to
    #[serde(with = "u256_dec")]
    pub edition_id: U256,
    /// 1-based position within the edition
    #[serde(with = "u256_dec")]
    pub edition_number: U256,
}

/// Result of `create_auction`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenedAuction {
    /// Creating transaction receipt
    pub receipt: TransactionReceipt,
    /// Record read back after confirmation, if the read succeeded
    pub auction: Option<Auction>,
}

/// What the startup checks saw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupReport {
    /// Chain id used for signing
    pub chain_id: u64,
    /// Operator account
    pub operator: Address,
    /// Operator balance in wei
    pub balance: U256,
}

impl StartupReport {
    /// Balance as a decimal ether string
    pub fn balance_ether(&self) -> String {
        format_ether(self.balance)
    }
}

/// The orchestrated use cases, shared across request handlers via `Arc`
pub struct Engine {
    client: Arc<LedgerClient>,
    broadcaster: Broadcaster,
    nft: NftContract,
    auction: AuctionContract,
    registry: EventRegistry,
    scanner: AuctionScanner,
}

impl Engine {
    /// Build the engine and validate the event registry against the
    /// expected hashes. Any mismatch is fatal.
    pub fn new(client: LedgerClient, wallet: Wallet, config: EngineConfig) -> CoreResult<Self> {
        config.gas.validate()?;

        let registry = EventRegistry::new();
        registry.validate(&config.expected_events)?;

        let client = Arc::new(client);
        let auction = AuctionContract::new(config.auction_address);
        let scanner = AuctionScanner::new(auction, config.scan)?;
        let broadcaster = Broadcaster::new(client.clone(), wallet, config.gas, config.broadcast);

        Ok(Self {
            client,
            broadcaster,
            nft: NftContract::new(config.nft_address),
            auction,
            registry,
            scanner,
        })
    }

    /// Ledger client
    pub fn client(&self) -> &LedgerClient {
        &self.client
    }

    /// Operator account
    pub fn operator(&self) -> &Address {
        self.broadcaster.operator()
    }

    /// Event registry
    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    /// Verify both contracts have code and report the operator balance
    pub async fn startup_checks(&self) -> CoreResult<StartupReport> {
        for (name, address) in [("nft", self.nft.address()), ("auction", self.auction.address())] {
            let code = self.client.get_code(&address, BlockId::Latest).await?;
            if code.is_empty() {
                return Err(CoreError::Configuration(format!(
                    "no contract code at {} address {}",
                    name, address
                )));
            }
            tracing::info!(contract = name, %address, code_len = code.len(), "contract found");
        }

        let chain_id = self.client.chain_id().await?;
        let operator = *self.operator();
        let balance = self.client.get_balance(&operator, BlockId::Latest).await?;
        let report = StartupReport {
            chain_id,
            operator,
            balance,
        };
        tracing::info!(chain_id, %operator, balance_eth = %report.balance_ether(), "operator ready");
        if balance.is_zero() {
            tracing::warn!(%operator, "operator balance is zero; writes will fail");
        }

        Ok(report)
    }

    // ==================== Writes ====================

    /// Mint a standalone token with `uri` to the operator
    pub async fn mint_nft(&self, uri: &str) -> CoreResult<TransactionReceipt> {
        traced(tracing::info_span!("mint_nft"), async {
            let uri = uri.trim();
            if uri.is_empty() {
                return Err(CoreError::Validation("tokenURI is required".into()));
            }
            let data = self.nft.encode_mint_nft(*self.operator(), uri)?;
            self.broadcaster
                .send(WriteRequest::new("mint_nft", self.nft.address(), data))
                .await
        })
        .await
    }

    /// Open an edition of `max_supply` tokens
    pub async fn create_edition(&self, max_supply: &str, rarity: &str, base_uri: &str) -> CoreResult<CreatedEdition> {
        traced(tracing::info_span!("create_edition"), async {
            let max_supply = parse_uint("maxSupply", max_supply)?;
            if max_supply.is_zero() {
                return Err(CoreError::Validation("maxSupply must be greater than 0".into()));
            }
            let rarity = parse_rarity(rarity)?;
            let base_uri = base_uri.trim();
            if base_uri.is_empty() {
                return Err(CoreError::Validation("baseURI is required".into()));
            }

            let data = self.nft.encode_create_edition(max_supply, rarity, base_uri)?;
            let receipt = self
                .broadcaster
                .send(WriteRequest::new("create_edition", self.nft.address(), data))
                .await?;

            let event = self.registry.decode_from_receipt(EventKind::EditionCreated, &receipt)?;
            let created = CreatedEdition {
                transaction_hash: receipt.transaction_hash,
                edition_id: event.uint("editionId")?,
                available_tokens: event.uint("availableTokens")?,
            };
            tracing::info!(
                edition_id = %created.edition_id,
                available_tokens = %created.available_tokens,
                "edition created"
            );
            Ok(created)
        })
        .await
    }

    /// Mint the next token of an edition
    pub async fn mint_edition(&self, edition_id: &str) -> CoreResult<MintedToken> {
        traced(tracing::info_span!("mint_edition", edition_id = %edition_id.trim()), async {
            let edition_id = parse_id("editionId", edition_id)?;
            let data = self.nft.encode_mint_edition(edition_id)?;
            let receipt = self
                .broadcaster
                .send(WriteRequest::new("mint_edition", self.nft.address(), data))
                .await?;

            let event = self.registry.decode_from_receipt(EventKind::NftMinted, &receipt)?;
            let minted = MintedToken {
                transaction_hash: receipt.transaction_hash,
                token_id: event.uint("tokenId")?,
                edition_id: event.uint("editionId")?,
                edition_number: event.uint("editionNumber")?,
            };
            tracing::info!(
                token_id = %minted.token_id,
                edition_number = %minted.edition_number,
                "edition token minted"
            );
            Ok(minted)
        })
        .await
    }

    /// Open an auction lasting `duration_hours`.
    ///
    /// Fails with [`CoreError::PreconditionConflict`] before anything is
    /// broadcast when the NFT is already in an active auction. `min_bid` is
    /// validated and logged; the deployed contract takes no reserve price.
    pub async fn create_auction(
        &self,
        nft_id: &str,
        min_bid: Option<&str>,
        duration_hours: &str,
    ) -> CoreResult<OpenedAuction> {
        traced(tracing::info_span!("create_auction", nft_id = %nft_id.trim()), async {
            let nft_id = parse_id("nftId", nft_id)?;
            let duration_secs = parse_duration_hours(duration_hours)?;
            let min_bid = min_bid
                .filter(|s| !s.trim().is_empty())
                .map(parse_amount)
                .transpose()?;
            tracing::debug!(duration_secs, min_bid = ?min_bid, "auction parameters");

            if self.auction.is_in_active_auction(&self.client, nft_id).await? {
                return Err(CoreError::PreconditionConflict(
                    "This NFT is already in an active auction. Please wait for the current auction to end."
                        .into(),
                ));
            }

            let data = self.auction.encode_create_auction(nft_id, duration_secs)?;
            let receipt = self
                .broadcaster
                .send(WriteRequest::new("create_auction", self.auction.address(), data).buffered())
                .await?;

            let auction = match self.auction.auction(&self.client, nft_id).await {
                Ok(auction) => {
                    tracing::info!(
                        start_time = %auction.start_time,
                        end_time = %auction.end_time,
                        "auction created"
                    );
                    Some(auction)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "auction created but record read failed");
                    None
                }
            };
            Ok(OpenedAuction { receipt, auction })
        })
        .await
    }

    /// Bid `amount_eth` (decimal ether) on an auction
    pub async fn place_bid(&self, nft_id: &str, amount_eth: &str) -> CoreResult<TransactionReceipt> {
        traced(tracing::info_span!("place_bid", nft_id = %nft_id.trim()), async {
            let nft_id = parse_id("nftId", nft_id)?;
            let wei = parse_amount(amount_eth)?;
            if wei.is_zero() {
                return Err(CoreError::Validation("Bid amount must be greater than 0".into()));
            }
            tracing::debug!(wei = %wei, amount_eth = %format_ether(wei), "placing bid");

            let data = self.auction.encode_place_bid(nft_id)?;
            self.broadcaster
                .send(WriteRequest::new("place_bid", self.auction.address(), data).with_value(wei))
                .await
        })
        .await
    }

    /// Settle an auction
    pub async fn end_auction(&self, nft_id: &str) -> CoreResult<TransactionReceipt> {
        traced(tracing::info_span!("end_auction", nft_id = %nft_id.trim()), async {
            let nft_id = parse_id("nftId", nft_id)?;
            let data = self.auction.encode_end_auction(nft_id)?;
            self.broadcaster
                .send(WriteRequest::new("end_auction", self.auction.address(), data))
                .await
        })
        .await
    }

    // ==================== Reads ====================

    /// Edition record
    pub async fn edition_details(&self, edition_id: &str) -> CoreResult<Edition> {
        traced(tracing::info_span!("edition_details", edition_id = %edition_id.trim()), async {
            let edition_id = parse_id("editionId", edition_id)?;
            self.nft.edition_details(&self.client, edition_id).await
        })
        .await
    }

    /// Edition id and number of a token
    pub async fn token_edition(&self, token_id: &str) -> CoreResult<TokenEdition> {
        traced(tracing::info_span!("token_edition", token_id = %token_id.trim()), async {
            let token_id = parse_id("tokenId", token_id)?;
            self.nft.token_edition(&self.client, token_id).await
        })
        .await
    }

    /// Metadata URI of a token
    pub async fn token_uri(&self, token_id: &str) -> CoreResult<String> {
        traced(tracing::info_span!("token_uri", token_id = %token_id.trim()), async {
            let token_id = parse_id("tokenId", token_id)?;
            self.nft.token_uri(&self.client, token_id).await
        })
        .await
    }

    /// Whether the NFT is in an active auction
    pub async fn is_in_active_auction(&self, nft_id: &str) -> CoreResult<bool> {
        traced(tracing::info_span!("is_in_active_auction", nft_id = %nft_id.trim()), async {
            let nft_id = parse_id("nftId", nft_id)?;
            self.auction.is_in_active_auction(&self.client, nft_id).await
        })
        .await
    }

    /// Auction record, `None` unless the NFT is in an active auction
    pub async fn auction_details(&self, nft_id: &str) -> CoreResult<Option<Auction>> {
        traced(tracing::info_span!("auction_details", nft_id = %nft_id.trim()), async {
            let nft_id = parse_id("nftId", nft_id)?;
            if !self.auction.is_in_active_auction(&self.client, nft_id).await? {
                return Ok(None);
            }
            let mut details = self.auction.auction_details(&self.client, nft_id).await?;
            details.is_active = true;
            Ok(Some(details))
        })
        .await
    }

    /// Bids on the active auction, empty when there is none
    pub async fn bid_history(&self, nft_id: &str) -> CoreResult<BidHistory> {
        traced(tracing::info_span!("bid_history", nft_id = %nft_id.trim()), async {
            let nft_id = parse_id("nftId", nft_id)?;
            if !self.auction.is_in_active_auction(&self.client, nft_id).await? {
                tracing::debug!("no active auction");
                return Ok(BidHistory::default());
            }
            self.auction.bid_history(&self.client, nft_id).await
        })
        .await
    }

    /// Rebuild the active auction set from recent logs
    pub async fn active_auctions(&self) -> CoreResult<ActiveAuctions> {
        traced(tracing::info_span!("active_auctions"), async {
            self.scanner.scan(&self.client, &self.registry).await
        })
        .await
    }
}

/// Run `fut` inside `span` and log its failure there
async fn traced<T, F>(span: Span, fut: F) -> CoreResult<T>
where
    F: Future<Output = CoreResult<T>>,
{
    let result = fut.instrument(span.clone()).await;
    if let Err(e) = &result {
        span.in_scope(|| {
            if e.is_client_error() {
                tracing::warn!(error = %e, "operation rejected");
            } else {
                tracing::error!(error = %e, "operation failed");
            }
        });
    }
    result
}

/// Decimal id: trimmed, non-empty, no inner whitespace
fn parse_id(field: &str, raw: &str) -> CoreResult<U256> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{} is required", field)));
    }
    if trimmed.contains(char::is_whitespace) {
        return Err(CoreError::Validation(format!("Invalid {} format", field)));
    }
    parse_uint(field, trimmed)
}

fn parse_uint(field: &str, raw: &str) -> CoreResult<U256> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::Validation(format!(
            "{} must be a non-negative integer, got {:?}",
            field, raw
        )));
    }
    U256::from_dec_str(trimmed).map_err(|_| CoreError::Validation(format!("{} is out of range", field)))
}

fn parse_rarity(raw: &str) -> CoreResult<u8> {
    let rarity = parse_uint("rarity", raw)?;
    if rarity > U256::from(u8::MAX) {
        return Err(CoreError::Validation(format!("rarity must be at most 255, got {}", rarity)));
    }
    Ok(rarity.low_u64() as u8)
}

/// Decimal ether to wei
fn parse_amount(raw: &str) -> CoreResult<U256> {
    parse_ether(raw).map_err(|e| CoreError::Validation(format!("invalid amount {:?}: {}", raw, e)))
}

/// `floor(hours * 3600)`, which must be positive
fn parse_duration_hours(raw: &str) -> CoreResult<u64> {
    let hours: f64 = raw
        .trim()
        .parse()
        .map_err(|_| CoreError::Validation(format!("invalid duration {:?}", raw)))?;
    if !hours.is_finite() {
        return Err(CoreError::Validation(format!("invalid duration {:?}", raw)));
    }
    let secs = (hours * 3600.0).floor();
    if secs <= 0.0 {
        return Err(CoreError::Validation("Duration must be greater than 0".into()));
    }
    if secs >= u64::MAX as f64 {
        return Err(CoreError::Validation("Duration is too large".into()));
    }
    Ok(secs as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("nftId", " 7 ").unwrap(), U256::from(7));
        assert!(matches!(parse_id("nftId", ""), Err(CoreError::Validation(m)) if m.contains("required")));
        assert!(matches!(parse_id("nftId", "1 2"), Err(CoreError::Validation(m)) if m.contains("format")));
        assert!(parse_id("nftId", "-1").is_err());
        assert!(parse_id("nftId", "0x10").is_err());
    }

    #[test]
    fn test_parse_duration_hours() {
        assert_eq!(parse_duration_hours("1").unwrap(), 3600);
        assert_eq!(parse_duration_hours("0.0003").unwrap(), 1);
        assert_eq!(parse_duration_hours("1.5").unwrap(), 5400);
        assert!(parse_duration_hours("0").is_err());
        assert!(parse_duration_hours("0.0002").is_err());
        assert!(parse_duration_hours("-2").is_err());
        assert!(parse_duration_hours("abc").is_err());
        assert!(parse_duration_hours("inf").is_err());
    }

    #[test]
    fn test_startup_report_balance_in_ether() {
        let report = StartupReport {
            chain_id: 1,
            operator: Address::ZERO,
            balance: U256::from(1_500_000_000_000_000_000u64),
        };
        assert_eq!(report.balance_ether(), "1.5");
    }

    #[test]
    fn test_parse_rarity() {
        assert_eq!(parse_rarity("0").unwrap(), 0);
        assert_eq!(parse_rarity("255").unwrap(), 255);
        assert!(parse_rarity("256").is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("0.1").unwrap(), U256::from(100_000_000_000_000_000u64));
        assert!(parse_amount("0.0000000000000000001").is_err());
        assert!(parse_amount("ten").is_err());
    }
}
