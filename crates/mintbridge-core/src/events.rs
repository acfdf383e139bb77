//! Event registry and receipt log decoding

use std::fmt;

use mintbridge_crypto::event_topic;
use mintbridge_primitives::{Address, H256, U256};
use mintbridge_sdk::abi::{decode_event_log, event_signature, EventParam, ParamType, Token};
use mintbridge_sdk::types::{Log, TransactionReceipt};

use crate::error::{CoreError, CoreResult};

/// `keccak256("EditionCreated(uint256,uint256,uint8)")`
pub const EDITION_CREATED_HASH: &str =
    "0x0de8cb2d5d75008bccc5e896b39081f8003620e1ab1d6b42196e2ba4dfbdba59";

/// `keccak256("NFTMinted(uint256,uint256,uint256)")`
pub const NFT_MINTED_HASH: &str =
    "0xe5177288d661448b7d383a5e5f1be3886695859c8c327562a87df71d65e21ac2";

/// Events the engine decodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// New edition on the NFT contract
    EditionCreated,
    /// Token minted from an edition
    NftMinted,
    /// Auction opened
    AuctionCreated,
    /// Auction settled
    AuctionEnded,
}

impl EventKind {
    /// Every kind, in registry order
    pub const ALL: [EventKind; 4] = [
        EventKind::EditionCreated,
        EventKind::NftMinted,
        EventKind::AuctionCreated,
        EventKind::AuctionEnded,
    ];

    /// Solidity event name
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::EditionCreated => "EditionCreated",
            EventKind::NftMinted => "NFTMinted",
            EventKind::AuctionCreated => "AuctionCreated",
            EventKind::AuctionEnded => "AuctionEnded",
        }
    }

    /// Field schema in declaration order
    pub fn params(&self) -> Vec<EventParam> {
        match self {
            EventKind::EditionCreated => vec![
                EventParam::data("editionId", ParamType::Uint(256)),
                EventParam::data("availableTokens", ParamType::Uint(256)),
                EventParam::data("rarity", ParamType::Uint(8)),
            ],
            EventKind::NftMinted => vec![
                EventParam::data("tokenId", ParamType::Uint(256)),
                EventParam::data("editionId", ParamType::Uint(256)),
                EventParam::data("editionNumber", ParamType::Uint(256)),
            ],
            EventKind::AuctionCreated => vec![
                EventParam::indexed("nftId", ParamType::Uint(256)),
                EventParam::indexed("creator", ParamType::Address),
                EventParam::data("startTime", ParamType::Uint(256)),
                EventParam::data("endTime", ParamType::Uint(256)),
            ],
            EventKind::AuctionEnded => vec![
                EventParam::indexed("nftId", ParamType::Uint(256)),
                EventParam::data("winner", ParamType::Address),
                EventParam::data("amount", ParamType::Uint(256)),
            ],
        }
    }

    fn index(&self) -> usize {
        match self {
            EventKind::EditionCreated => 0,
            EventKind::NftMinted => 1,
            EventKind::AuctionCreated => 2,
            EventKind::AuctionEnded => 3,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Signature, topic hash and schema of one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDescriptor {
    /// Event kind
    pub kind: EventKind,
    /// Canonical signature, e.g. `NFTMinted(uint256,uint256,uint256)`
    pub signature: String,
    /// keccak256 of the signature (topic 0)
    pub hash: H256,
    /// Field schema
    pub params: Vec<EventParam>,
}

impl EventDescriptor {
    fn new(kind: EventKind) -> Self {
        let params = kind.params();
        let signature = event_signature(kind.name(), &params);
        let hash = event_topic(&signature);
        Self {
            kind,
            signature,
            hash,
            params,
        }
    }
}

/// Registry of every event the engine decodes. Built once at startup.
#[derive(Debug, Clone)]
pub struct EventRegistry {
    events: [EventDescriptor; 4],
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRegistry {
    /// Build descriptors from the fixed schemas
    pub fn new() -> Self {
        Self {
            events: EventKind::ALL.map(EventDescriptor::new),
        }
    }

    /// Hashes pinned to the deployed NFT contract's ABI
    pub fn default_expectations() -> CoreResult<Vec<(EventKind, H256)>> {
        let parse = |s: &str| {
            H256::from_hex(s).map_err(|e| CoreError::Configuration(format!("bad pinned hash: {}", e)))
        };
        Ok(vec![
            (EventKind::EditionCreated, parse(EDITION_CREATED_HASH)?),
            (EventKind::NftMinted, parse(NFT_MINTED_HASH)?),
        ])
    }

    /// Check computed hashes against the deployed ABI's. Any mismatch is fatal.
    pub fn validate(&self, expected: &[(EventKind, H256)]) -> CoreResult<()> {
        for (kind, hash) in expected {
            let descriptor = self.get(*kind);
            if descriptor.hash != *hash {
                return Err(CoreError::Configuration(format!(
                    "{} hash mismatch: computed {} from {}, expected {}",
                    kind, descriptor.hash, descriptor.signature, hash
                )));
            }
            tracing::debug!(event = %kind, hash = %hash, "event hash verified");
        }
        Ok(())
    }

    /// Descriptor for `kind`
    pub fn get(&self, kind: EventKind) -> &EventDescriptor {
        &self.events[kind.index()]
    }

    /// topic[0] for `kind`
    pub fn hash(&self, kind: EventKind) -> H256 {
        self.get(kind).hash
    }

    /// Decode the first log in `receipt` whose topic 0 matches `kind`
    pub fn decode_from_receipt(
        &self,
        kind: EventKind,
        receipt: &TransactionReceipt,
    ) -> CoreResult<DecodedEvent> {
        let hash = self.hash(kind);
        let log = receipt
            .logs
            .iter()
            .find(|log| log.topic0() == Some(&hash))
            .ok_or_else(|| {
                let available_topics: Vec<H256> =
                    receipt.logs.iter().filter_map(|l| l.topic0().copied()).collect();
                tracing::error!(
                    event = %kind,
                    tx_hash = %receipt.transaction_hash,
                    ?available_topics,
                    "event not found in receipt"
                );
                CoreError::EventNotFound {
                    event: kind.name().to_string(),
                    available_topics,
                }
            })?;
        self.decode_log(kind, log)
    }

    /// Decode a single log against the schema of `kind`
    pub fn decode_log(&self, kind: EventKind, log: &Log) -> CoreResult<DecodedEvent> {
        let fields = decode_event_log(&self.get(kind).params, log)?;
        Ok(DecodedEvent { kind, fields })
    }
}

/// Named fields of a decoded event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEvent {
    /// Event kind
    pub kind: EventKind,
    /// `(name, value)` in declaration order
    pub fields: Vec<(String, Token)>,
}

impl DecodedEvent {
    fn field(&self, name: &str) -> CoreResult<&Token> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
            .ok_or_else(|| CoreError::AbiDecode(format!("{} has no field {}", self.kind, name)))
    }

    /// Unsigned integer field
    pub fn uint(&self, name: &str) -> CoreResult<U256> {
        self.field(name)?
            .clone()
            .into_uint()
            .ok_or_else(|| CoreError::AbiDecode(format!("{}.{} is not a uint", self.kind, name)))
    }

    /// Address field
    pub fn address(&self, name: &str) -> CoreResult<Address> {
        self.field(name)?
            .clone()
            .into_address()
            .ok_or_else(|| CoreError::AbiDecode(format!("{}.{} is not an address", self.kind, name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn word(n: u64) -> Vec<u8> {
        let mut w = [0u8; 32];
        U256::from(n).to_big_endian(&mut w);
        w.to_vec()
    }

    fn log(topics: Vec<H256>, data: Vec<u8>) -> Log {
        Log {
            address: Address::from_bytes([0x10; 20]),
            topics,
            data: Bytes::from(data),
            block_number: None,
            transaction_hash: None,
            log_index: None,
        }
    }

    fn receipt(logs: Vec<Log>) -> TransactionReceipt {
        TransactionReceipt {
            transaction_hash: H256::from_bytes([0xaa; 32]),
            status: Some(1),
            block_number: 1,
            from: None,
            to: None,
            gas_used: U256::zero(),
            effective_gas_price: None,
            logs,
        }
    }

    #[test]
    fn test_signatures_and_pinned_hashes() {
        let registry = EventRegistry::new();
        assert_eq!(
            registry.get(EventKind::EditionCreated).signature,
            "EditionCreated(uint256,uint256,uint8)"
        );
        assert_eq!(
            registry.get(EventKind::AuctionCreated).signature,
            "AuctionCreated(uint256,address,uint256,uint256)"
        );
        assert_eq!(registry.hash(EventKind::EditionCreated).to_hex(), EDITION_CREATED_HASH);
        assert_eq!(registry.hash(EventKind::NftMinted).to_hex(), NFT_MINTED_HASH);
    }

    #[test]
    fn test_validate_default_expectations() {
        let registry = EventRegistry::new();
        let expected = EventRegistry::default_expectations().unwrap();
        assert!(registry.validate(&expected).is_ok());
    }

    #[test]
    fn test_validate_mismatch_is_fatal() {
        let registry = EventRegistry::new();
        let err = registry
            .validate(&[(EventKind::NftMinted, H256::from_bytes([1; 32]))])
            .unwrap_err();
        assert!(matches!(err, CoreError::Configuration(m) if m.contains("NFTMinted")));
    }

    #[test]
    fn test_second_log_selected_when_first_does_not_match() {
        let registry = EventRegistry::new();
        let transfer = log(vec![H256::from_bytes([0x77; 32])], word(999));
        let minted = log(
            vec![registry.hash(EventKind::NftMinted)],
            [word(12), word(3), word(2)].concat(),
        );

        let event = registry
            .decode_from_receipt(EventKind::NftMinted, &receipt(vec![transfer, minted]))
            .unwrap();
        assert_eq!(event.uint("tokenId").unwrap(), U256::from(12));
        assert_eq!(event.uint("editionNumber").unwrap(), U256::from(2));
    }

    #[test]
    fn test_first_matching_log_wins() {
        let registry = EventRegistry::new();
        let topic = registry.hash(EventKind::EditionCreated);
        let first = log(vec![topic], [word(1), word(10), word(2)].concat());
        let second = log(vec![topic], [word(2), word(20), word(2)].concat());

        let event = registry
            .decode_from_receipt(EventKind::EditionCreated, &receipt(vec![first, second]))
            .unwrap();
        assert_eq!(event.uint("editionId").unwrap(), U256::from(1));
    }

    #[test]
    fn test_event_not_found_lists_topics() {
        let registry = EventRegistry::new();
        let other = H256::from_bytes([0x55; 32]);
        let err = registry
            .decode_from_receipt(EventKind::EditionCreated, &receipt(vec![log(vec![other], vec![])]))
            .unwrap_err();
        match err {
            CoreError::EventNotFound { event, available_topics } => {
                assert_eq!(event, "EditionCreated");
                assert_eq!(available_topics, vec![other]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_ragged_payload_is_decode_error() {
        let registry = EventRegistry::new();
        let bad = log(vec![registry.hash(EventKind::NftMinted)], vec![0u8; 70]);
        let err = registry
            .decode_from_receipt(EventKind::NftMinted, &receipt(vec![bad]))
            .unwrap_err();
        assert!(matches!(err, CoreError::AbiDecode(_)));
    }

    #[test]
    fn test_auction_ended_indexed_and_data_fields() {
        let registry = EventRegistry::new();
        let winner = Address::from_bytes([0x22; 20]);
        let mut nft_topic = [0u8; 32];
        nft_topic[31] = 7;
        let ended = log(
            vec![registry.hash(EventKind::AuctionEnded), H256::from_bytes(nft_topic)],
            [winner.to_word().to_vec(), word(5)].concat(),
        );
        let event = registry.decode_log(EventKind::AuctionEnded, &ended).unwrap();
        assert_eq!(event.uint("nftId").unwrap(), U256::from(7));
        assert_eq!(event.address("winner").unwrap(), winner);
        assert!(event.uint("missing").is_err());
    }
}
