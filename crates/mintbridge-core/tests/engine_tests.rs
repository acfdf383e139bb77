//! Engine integration tests for mintbridge-core
//!
//! A small in-memory ledger answers the JSON-RPC methods the engine uses.
//! It decodes each submitted raw transaction, applies it to fake NFT and
//! auction contracts, and serves receipts, logs and `eth_call` results.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mintbridge_core::contracts::methods;
use mintbridge_core::{
    BroadcastConfig, CoreError, Engine, EngineConfig, EventKind, EventRegistry,
};
use mintbridge_crypto::{function_selector, keccak256};
use mintbridge_sdk::abi::{decode, encode, ParamType, Token};
use mintbridge_sdk::quantity::to_hex_data;
use mintbridge_sdk::{Address, LedgerClient, MockTransport, SdkError, Wallet, H256, U256};
use serde_json::{json, Value};

const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const OPERATOR: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
const START_TIME: u64 = 1_700_000_000;

fn nft_address() -> Address {
    Address::from_bytes([0x11; 20])
}

fn auction_address() -> Address {
    Address::from_bytes([0x22; 20])
}

fn word(value: U256) -> Vec<u8> {
    let mut w = [0u8; 32];
    value.to_big_endian(&mut w);
    w.to_vec()
}

// ==================== Fake ledger ====================

struct Edition {
    max_supply: U256,
    current_supply: U256,
    rarity: u8,
    base_uri: String,
}

#[derive(Clone)]
struct AuctionState {
    creator: Address,
    start: U256,
    end: U256,
    active: bool,
    bidders: Vec<Address>,
    amounts: Vec<U256>,
    timestamps: Vec<U256>,
}

#[derive(Default)]
struct Ledger {
    editions: Vec<Edition>,
    tokens: HashMap<U256, (U256, U256, String)>,
    next_token: u64,
    auctions: HashMap<U256, AuctionState>,
    receipts: HashMap<String, Value>,
    logs: Vec<Value>,
    block: u64,
    /// Applied transactions as (selector, args, value)
    applied: Vec<([u8; 4], Vec<Token>, U256)>,
}

struct Emitted {
    address: Address,
    topics: Vec<H256>,
    data: Vec<u8>,
}

impl Ledger {
    fn auction_record(&self, nft_id: U256) -> Vec<u8> {
        let a = self.auctions.get(&nft_id).cloned().unwrap_or(AuctionState {
            creator: Address::ZERO,
            start: U256::zero(),
            end: U256::zero(),
            active: false,
            bidders: vec![],
            amounts: vec![],
            timestamps: vec![],
        });
        let (bidder, bid) = match a.amounts.iter().enumerate().max_by_key(|(_, v)| **v) {
            Some((i, v)) => (a.bidders[i], *v),
            None => (Address::ZERO, U256::zero()),
        };
        encode(
            &[
                ParamType::Uint(256),
                ParamType::Address,
                ParamType::Uint(256),
                ParamType::Uint(256),
                ParamType::Address,
                ParamType::Uint(256),
                ParamType::Bool,
            ],
            &[
                Token::Uint(nft_id),
                Token::Address(a.creator),
                Token::Uint(a.start),
                Token::Uint(a.end),
                Token::Address(bidder),
                Token::Uint(bid),
                Token::Bool(a.active),
            ],
        )
        .unwrap()
    }

    fn call(&self, data: &[u8]) -> Result<Vec<u8>, SdkError> {
        let selector: [u8; 4] = data[..4].try_into().unwrap();
        let id = U256::from_big_endian(&data[4..36]);
        let reverted = || SdkError::Rpc {
            code: 3,
            message: "execution reverted".into(),
        };

        if selector == function_selector(methods::IS_NFT_IN_ACTIVE_AUCTION) {
            let active = self.auctions.get(&id).map(|a| a.active).unwrap_or(false);
            return Ok(encode(&[ParamType::Bool], &[Token::Bool(active)]).unwrap());
        }
        if selector == function_selector(methods::AUCTIONS)
            || selector == function_selector(methods::GET_AUCTION_DETAILS)
        {
            return Ok(self.auction_record(id));
        }
        if selector == function_selector(methods::GET_BID_HISTORY) {
            let a = self.auctions.get(&id).ok_or_else(reverted)?;
            let addrs = a.bidders.iter().map(|b| Token::Address(*b)).collect();
            let amounts = a.amounts.iter().map(|v| Token::Uint(*v)).collect();
            let times = a.timestamps.iter().map(|v| Token::Uint(*v)).collect();
            return Ok(encode(
                &[
                    ParamType::Array(Box::new(ParamType::Address)),
                    ParamType::Array(Box::new(ParamType::Uint(256))),
                    ParamType::Array(Box::new(ParamType::Uint(256))),
                ],
                &[Token::Array(addrs), Token::Array(amounts), Token::Array(times)],
            )
            .unwrap());
        }
        if selector == function_selector(methods::GET_EDITION_DETAILS) {
            let index = id.low_u64() as usize;
            let e = index
                .checked_sub(1)
                .and_then(|i| self.editions.get(i))
                .ok_or_else(reverted)?;
            return Ok(encode(
                &[
                    ParamType::Uint(256),
                    ParamType::Uint(256),
                    ParamType::Uint(256),
                    ParamType::Bool,
                    ParamType::String,
                ],
                &[
                    Token::Uint(e.max_supply),
                    Token::Uint(e.current_supply),
                    Token::Uint(U256::from(e.rarity)),
                    Token::Bool(index == 1),
                    Token::String(e.base_uri.clone()),
                ],
            )
            .unwrap());
        }
        if selector == function_selector(methods::GET_TOKEN_EDITION_NUMBER) {
            let (edition, number, _) = self.tokens.get(&id).ok_or_else(reverted)?;
            return Ok(encode(
                &[ParamType::Uint(256), ParamType::Uint(256)],
                &[Token::Uint(*edition), Token::Uint(*number)],
            )
            .unwrap());
        }
        if selector == function_selector(methods::TOKEN_URI) {
            let (_, _, uri) = self.tokens.get(&id).ok_or_else(reverted)?;
            return Ok(encode(&[ParamType::String], &[Token::String(uri.clone())]).unwrap());
        }
        Err(reverted())
    }

    /// Apply a transaction; `None` means it reverted
    fn execute(&mut self, from: Address, data: &[u8], value: U256) -> Option<Vec<Emitted>> {
        let selector: [u8; 4] = data[..4].try_into().ok()?;
        let registry = EventRegistry::new();

        if selector == function_selector(methods::CREATE_EDITION) {
            let args = decode(
                &[ParamType::Uint(256), ParamType::Uint(8), ParamType::String],
                &data[4..],
            )
            .ok()?;
            self.applied.push((selector, args.clone(), value));
            let mut args = args.into_iter();
            let max_supply = args.next()?.into_uint()?;
            let rarity = args.next()?.into_uint()?.low_u64() as u8;
            let base_uri = args.next()?.into_string()?;
            self.editions.push(Edition {
                max_supply,
                current_supply: U256::zero(),
                rarity,
                base_uri,
            });
            let id = U256::from(self.editions.len());
            return Some(vec![
                // an unrelated log first
                Emitted {
                    address: nft_address(),
                    topics: vec![H256::from_bytes([0x99; 32])],
                    data: word(U256::one()),
                },
                Emitted {
                    address: nft_address(),
                    topics: vec![registry.hash(EventKind::EditionCreated)],
                    data: [word(id), word(max_supply), word(U256::from(rarity))].concat(),
                },
            ]);
        }

        let id = U256::from_big_endian(data.get(4..36)?);
        self.applied.push((selector, vec![Token::Uint(id)], value));

        if selector == function_selector(methods::MINT_EDITION) {
            let index = (id.low_u64() as usize).checked_sub(1)?;
            let edition = self.editions.get_mut(index)?;
            if edition.current_supply >= edition.max_supply {
                return None;
            }
            edition.current_supply = edition.current_supply + 1;
            let number = edition.current_supply;
            let uri = format!("{}{}", edition.base_uri, number);
            self.next_token += 1;
            let token_id = U256::from(self.next_token);
            self.tokens.insert(token_id, (id, number, uri));
            return Some(vec![Emitted {
                address: nft_address(),
                topics: vec![registry.hash(EventKind::NftMinted)],
                data: [word(token_id), word(id), word(number)].concat(),
            }]);
        }
        if selector == function_selector(methods::CREATE_AUCTION) {
            if self.auctions.get(&id).map(|a| a.active).unwrap_or(false) {
                return None;
            }
            let secs = U256::from_big_endian(data.get(36..68)?);
            let start = U256::from(START_TIME);
            self.auctions.insert(
                id,
                AuctionState {
                    creator: from,
                    start,
                    end: start + secs,
                    active: true,
                    bidders: vec![],
                    amounts: vec![],
                    timestamps: vec![],
                },
            );
            return Some(vec![Emitted {
                address: auction_address(),
                topics: vec![
                    registry.hash(EventKind::AuctionCreated),
                    H256::from_bytes(word(id).try_into().ok()?),
                    H256::from_bytes(from.to_word()),
                ],
                data: [word(start), word(start + secs)].concat(),
            }]);
        }
        if selector == function_selector(methods::PLACE_BID) {
            let a = self.auctions.get_mut(&id).filter(|a| a.active)?;
            a.bidders.push(from);
            a.amounts.push(value);
            a.timestamps.push(U256::from(START_TIME + a.amounts.len() as u64));
            return Some(vec![]);
        }
        if selector == function_selector(methods::END_AUCTION) {
            let a = self.auctions.get_mut(&id).filter(|a| a.active)?;
            a.active = false;
            let winner = a.bidders.last().copied().unwrap_or(Address::ZERO);
            let amount = a.amounts.last().copied().unwrap_or_default();
            return Some(vec![Emitted {
                address: auction_address(),
                topics: vec![
                    registry.hash(EventKind::AuctionEnded),
                    H256::from_bytes(word(id).try_into().ok()?),
                ],
                data: [winner.to_word().to_vec(), word(amount)].concat(),
            }]);
        }
        if selector == function_selector(methods::MINT_NFT) {
            self.next_token += 1;
            return Some(vec![]);
        }
        None
    }

    fn submit(&mut self, raw: &[u8]) -> H256 {
        let rlp = rlp::Rlp::new(raw);
        let value_bytes: Vec<u8> = rlp.val_at(4).unwrap();
        let data: Vec<u8> = rlp.val_at(5).unwrap();
        let value = U256::from_big_endian(&value_bytes);
        let hash = keccak256(raw);
        let from = Address::from_hex(OPERATOR).unwrap();

        self.block += 1;
        let (status, emitted) = match self.execute(from, &data, value) {
            Some(emitted) => ("0x1", emitted),
            None => ("0x0", vec![]),
        };
        let logs: Vec<Value> = emitted
            .into_iter()
            .enumerate()
            .map(|(i, e)| {
                json!({
                    "address": e.address.to_hex(),
                    "topics": e.topics.iter().map(H256::to_hex).collect::<Vec<_>>(),
                    "data": to_hex_data(&e.data),
                    "blockNumber": format!("0x{:x}", self.block),
                    "transactionHash": hash.to_hex(),
                    "logIndex": format!("0x{:x}", i),
                })
            })
            .collect();
        self.logs.extend(logs.iter().cloned());
        self.receipts.insert(
            hash.to_hex(),
            json!({
                "transactionHash": hash.to_hex(),
                "status": status,
                "blockNumber": format!("0x{:x}", self.block),
                "gasUsed": "0x5208",
                "logs": logs,
            }),
        );
        hash
    }
}

fn install(mock: &MockTransport, ledger: Arc<Mutex<Ledger>>) {
    let l = ledger.clone();
    mock.set_handler("eth_call", move |params| {
        let data = params[0]["data"].as_str().unwrap_or("0x");
        let bytes = hex::decode(data.trim_start_matches("0x")).unwrap();
        let out = l.lock().unwrap().call(&bytes)?;
        Ok(json!(to_hex_data(&out)))
    });

    let l = ledger.clone();
    mock.set_handler("eth_sendRawTransaction", move |params| {
        let raw = hex::decode(params[0].as_str().unwrap().trim_start_matches("0x")).unwrap();
        Ok(json!(l.lock().unwrap().submit(&raw).to_hex()))
    });

    let l = ledger.clone();
    mock.set_handler("eth_getTransactionReceipt", move |params| {
        let hash = params[0].as_str().unwrap();
        Ok(l.lock().unwrap().receipts.get(hash).cloned().unwrap_or(Value::Null))
    });

    let l = ledger.clone();
    mock.set_handler("eth_getLogs", move |params| {
        let topic = params[0]["topics"][0].clone();
        let logs: Vec<Value> = l
            .lock()
            .unwrap()
            .logs
            .iter()
            .filter(|log| log["topics"][0] == topic)
            .cloned()
            .collect();
        Ok(Value::Array(logs))
    });

    let l = ledger;
    mock.set_handler("eth_blockNumber", move |_| {
        Ok(json!(format!("0x{:x}", l.lock().unwrap().block)))
    });

    mock.set_response("eth_getCode", json!("0x6080604052"));
}

async fn setup() -> (Engine, MockTransport, Arc<Mutex<Ledger>>) {
    let mock = MockTransport::new();
    let ledger = Arc::new(Mutex::new(Ledger::default()));
    install(&mock, ledger.clone());

    let client = LedgerClient::connect_with(mock.clone(), Some(31337)).await.unwrap();
    let wallet = Wallet::from_private_key_hex(KEY).unwrap();
    let mut config = EngineConfig::new(nft_address(), auction_address()).unwrap();
    config.broadcast = BroadcastConfig {
        receipt_timeout: Duration::from_millis(200),
        poll_interval: Duration::from_millis(5),
    };
    let engine = Engine::new(client, wallet, config).unwrap();
    (engine, mock, ledger)
}

// ==================== Construction ====================

#[tokio::test]
async fn test_engine_rejects_mismatched_event_hash() {
    let client = LedgerClient::new_mock();
    let wallet = Wallet::from_private_key_hex(KEY).unwrap();
    let mut config = EngineConfig::new(nft_address(), auction_address()).unwrap();
    config.expected_events = vec![(EventKind::EditionCreated, H256::from_bytes([0x01; 32]))];

    let result = Engine::new(client, wallet, config);
    assert!(matches!(result, Err(CoreError::Configuration(_))));
}

#[tokio::test]
async fn test_startup_checks_report_operator() {
    let (engine, _, _) = setup().await;
    let report = engine.startup_checks().await.unwrap();
    assert_eq!(report.chain_id, 31337);
    assert_eq!(report.operator.to_hex(), OPERATOR);
    assert_eq!(report.balance, U256::from(1_000_000_000_000_000_000u64));
    assert_eq!(report.balance_ether(), "1");
}

#[tokio::test]
async fn test_startup_checks_require_contract_code() {
    let (engine, mock, _) = setup().await;
    mock.set_response("eth_getCode", json!("0x"));
    let err = engine.startup_checks().await.unwrap_err();
    assert!(matches!(err, CoreError::Configuration(m) if m.contains("no contract code")));
}

// ==================== Editions ====================

#[tokio::test]
async fn test_create_edition_reports_event_and_fresh_details() {
    let (engine, _, _) = setup().await;

    let created = engine.create_edition("25", "3", "ipfs://base/").await.unwrap();
    assert_eq!(created.edition_id, U256::one());
    assert_eq!(created.available_tokens, U256::from(25));

    let details = engine.edition_details("1").await.unwrap();
    assert_eq!(details.current_supply, U256::zero());
    assert_eq!(details.max_supply, created.available_tokens);
    assert_eq!(details.rarity, U256::from(3));
    assert_eq!(details.base_uri, "ipfs://base/");
}

#[tokio::test]
async fn test_create_edition_validation_makes_no_calls() {
    let (engine, mock, _) = setup().await;

    for (max, rarity, uri) in [("0", "1", "u"), ("10", "256", "u"), ("10", "1", "  "), ("ten", "1", "u")] {
        let err = engine.create_edition(max, rarity, uri).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)), "{} {} {:?}", max, rarity, uri);
    }
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_edition_numbers_increase_from_one() {
    let (engine, _, _) = setup().await;
    engine.create_edition("3", "1", "ipfs://e/").await.unwrap();

    let mut numbers = Vec::new();
    for _ in 0..3 {
        let minted = engine.mint_edition("1").await.unwrap();
        assert_eq!(minted.edition_id, U256::one());
        numbers.push(minted.edition_number.low_u64());

        let info = engine.token_edition(&minted.token_id.to_string()).await.unwrap();
        assert_eq!(info.edition_number, minted.edition_number);
    }
    assert_eq!(numbers, vec![1, 2, 3]);

    let uri = engine.token_uri("2").await.unwrap();
    assert_eq!(uri, "ipfs://e/2");
}

#[tokio::test]
async fn test_mint_past_supply_reverts() {
    let (engine, mock, _) = setup().await;
    engine.create_edition("1", "1", "ipfs://e/").await.unwrap();
    engine.mint_edition("1").await.unwrap();

    let err = engine.mint_edition("1").await.unwrap_err();
    assert!(matches!(err, CoreError::TransactionReverted { .. }));
    // the reverted mint was mined, so the next write takes the following nonce
    engine.mint_nft("ipfs://standalone").await.unwrap();
    let nonces: Vec<u64> = mock
        .requests_for("eth_sendRawTransaction")
        .iter()
        .map(|r| {
            let bytes = hex::decode(r.params[0].as_str().unwrap().trim_start_matches("0x")).unwrap();
            rlp::Rlp::new(&bytes).val_at(0).unwrap()
        })
        .collect();
    assert_eq!(nonces, vec![0, 1, 2, 3]);
    assert_eq!(mock.count("eth_getTransactionCount"), 1);
}

#[tokio::test]
async fn test_mint_nft_targets_operator() {
    let (engine, _, ledger) = setup().await;
    let receipt = engine.mint_nft("ipfs://token").await.unwrap();
    assert!(receipt.is_success());
    assert!(engine.mint_nft("   ").await.is_err());
    assert_eq!(ledger.lock().unwrap().next_token, 1);
}

// ==================== Auctions ====================

#[tokio::test]
async fn test_create_auction_duration_and_read_back() {
    let (engine, mock, _) = setup().await;

    let opened = engine.create_auction(" 7 ", Some("0.5"), "0.0003").await.unwrap();
    let auction = opened.auction.unwrap();
    assert!(auction.is_active);
    assert_eq!(auction.end_time - auction.start_time, U256::one());

    // buffered gas limit: 21000 * 1.2
    let raw = &mock.requests_for("eth_sendRawTransaction")[0].params[0];
    let bytes = hex::decode(raw.as_str().unwrap().trim_start_matches("0x")).unwrap();
    let gas_limit: u64 = rlp::Rlp::new(&bytes).val_at(2).unwrap();
    assert_eq!(gas_limit, 25_200);
}

#[tokio::test]
async fn test_zero_duration_fails_validation() {
    let (engine, mock, _) = setup().await;
    for duration in ["0", "0.0001", "-1", "soon"] {
        let err = engine.create_auction("7", None, duration).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
    let err = engine.create_auction("7 8", None, "1").await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_create_auction_on_active_nft_conflicts_without_broadcast() {
    let (engine, mock, _) = setup().await;
    engine.create_auction("7", None, "1").await.unwrap();
    let sent = mock.count("eth_sendRawTransaction");

    let err = engine.create_auction("7", None, "1").await.unwrap_err();
    assert!(matches!(err, CoreError::PreconditionConflict(_)));
    assert!(err.is_client_error());
    assert_eq!(mock.count("eth_sendRawTransaction"), sent);
}

#[tokio::test]
async fn test_auction_details_is_stable_without_writes() {
    let (engine, _, _) = setup().await;
    engine.create_auction("9", None, "2").await.unwrap();

    let first = engine.auction_details("9").await.unwrap();
    let second = engine.auction_details("9").await.unwrap();
    assert!(first.is_some());
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_inactive_auction_reads_are_empty() {
    let (engine, _, _) = setup().await;
    assert_eq!(engine.auction_details("3").await.unwrap(), None);
    assert!(engine.bid_history("3").await.unwrap().bidders.is_empty());
    assert!(!engine.is_in_active_auction("3").await.unwrap());
}

#[tokio::test]
async fn test_place_bid_sends_wei_value() {
    let (engine, _, ledger) = setup().await;
    engine.create_auction("5", None, "1").await.unwrap();

    engine.place_bid("5", "0.25").await.unwrap();

    let history = engine.bid_history("5").await.unwrap();
    assert_eq!(history.amounts, vec![U256::from(250_000_000_000_000_000u64)]);
    assert_eq!(history.bidders[0].to_hex(), OPERATOR);
    assert_eq!(history.timestamps.len(), 1);

    let details = engine.auction_details("5").await.unwrap().unwrap();
    assert_eq!(details.highest_bid, U256::from(250_000_000_000_000_000u64));

    let applied = &ledger.lock().unwrap().applied;
    let (_, _, value) = applied.last().unwrap();
    assert_eq!(*value, U256::from(250_000_000_000_000_000u64));
}

#[tokio::test]
async fn test_place_bid_rejects_zero_and_bad_amounts() {
    let (engine, mock, _) = setup().await;
    for amount in ["0", "0.0", "", "abc", "1.0000000000000000001"] {
        let err = engine.place_bid("5", amount).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)), "{:?}", amount);
    }
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_active_auctions_tracks_creation_and_ending() {
    let (engine, _, _) = setup().await;
    engine.create_auction("7", None, "1").await.unwrap();
    engine.create_auction("8", None, "1").await.unwrap();
    engine.end_auction("8").await.unwrap();

    let result = engine.active_auctions().await.unwrap();
    let ids: Vec<U256> = result.auctions.iter().map(|a| a.auction.nft_id).collect();
    assert_eq!(ids, vec![U256::from(7)]);
    assert!(result.auctions[0].transaction_hash.is_some());
    assert!(result.failures.is_empty());
}

#[tokio::test]
async fn test_writes_use_consecutive_nonces() {
    let (engine, mock, _) = setup().await;
    engine.create_edition("5", "1", "ipfs://e/").await.unwrap();
    engine.mint_edition("1").await.unwrap();
    engine.mint_edition("1").await.unwrap();

    let nonces: Vec<u64> = mock
        .requests_for("eth_sendRawTransaction")
        .iter()
        .map(|r| {
            let bytes = hex::decode(r.params[0].as_str().unwrap().trim_start_matches("0x")).unwrap();
            rlp::Rlp::new(&bytes).val_at(0).unwrap()
        })
        .collect();
    assert_eq!(nonces, vec![0, 1, 2]);
    assert_eq!(mock.count("eth_getTransactionCount"), 1);
}
