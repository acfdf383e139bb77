//! RPC request and response types

use bytes::Bytes;
use mintbridge_primitives::{Address, H256, U256};
use serde::{Deserialize, Serialize};

use crate::quantity::{
    hex_bytes, opt_u256_quantity, opt_u64_quantity, to_hex_data, to_hex_quantity,
    u256_quantity, u256_to_hex_quantity, u64_quantity,
};

/// Block identifier for RPC queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockId {
    /// Block number
    Number(u64),
    /// Latest block
    #[default]
    Latest,
    /// Pending block (includes pending transactions)
    Pending,
    /// Earliest block (genesis)
    Earliest,
}

impl Serialize for BlockId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            BlockId::Number(n) => serializer.serialize_str(&format!("0x{:x}", n)),
            BlockId::Latest => serializer.serialize_str("latest"),
            BlockId::Pending => serializer.serialize_str("pending"),
            BlockId::Earliest => serializer.serialize_str("earliest"),
        }
    }
}

/// Call request for eth_call and eth_estimateGas
#[derive(Debug, Clone, Default)]
pub struct CallRequest {
    /// Sender address
    pub from: Option<Address>,
    /// Recipient address
    pub to: Option<Address>,
    /// Gas limit
    pub gas: Option<u64>,
    /// Gas price (legacy)
    pub gas_price: Option<u128>,
    /// Value to transfer
    pub value: Option<U256>,
    /// Input data
    pub data: Option<Bytes>,
}

impl CallRequest {
    /// Call `data` on contract `to`
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to: Some(to),
            data: Some(data.into()),
            ..Default::default()
        }
    }

    /// Set the sender
    pub fn from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    /// Attach value (wei)
    pub fn value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }
}

impl Serialize for CallRequest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let count = [
            self.from.is_some(),
            self.to.is_some(),
            self.gas.is_some(),
            self.gas_price.is_some(),
            self.value.is_some(),
            self.data.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count();

        let mut map = serializer.serialize_map(Some(count))?;

        if let Some(from) = &self.from {
            map.serialize_entry("from", &from.to_hex())?;
        }
        if let Some(to) = &self.to {
            map.serialize_entry("to", &to.to_hex())?;
        }
        if let Some(gas) = &self.gas {
            map.serialize_entry("gas", &to_hex_quantity(*gas as u128))?;
        }
        if let Some(gas_price) = &self.gas_price {
            map.serialize_entry("gasPrice", &to_hex_quantity(*gas_price))?;
        }
        if let Some(value) = &self.value {
            map.serialize_entry("value", &u256_to_hex_quantity(value))?;
        }
        if let Some(data) = &self.data {
            map.serialize_entry("data", &to_hex_data(data))?;
        }

        map.end()
    }
}

/// Filter for `eth_getLogs`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    /// Emitting contract
    pub address: Option<Address>,
    /// Topic constraints by position; `None` matches anything
    pub topics: Vec<Option<H256>>,
    /// First block (inclusive)
    pub from_block: BlockId,
    /// Last block (inclusive)
    pub to_block: BlockId,
}

impl LogFilter {
    /// Logs from `address` whose topic 0 is `topic0`
    pub fn event(address: Address, topic0: H256) -> Self {
        Self {
            address: Some(address),
            topics: vec![Some(topic0)],
            ..Default::default()
        }
    }

    /// Restrict to the inclusive block range `[from, to]`
    pub fn range(mut self, from: u64, to: u64) -> Self {
        self.from_block = BlockId::Number(from);
        self.to_block = BlockId::Number(to);
        self
    }
}

impl Serialize for LogFilter {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("fromBlock", &self.from_block)?;
        map.serialize_entry("toBlock", &self.to_block)?;
        if let Some(address) = &self.address {
            map.serialize_entry("address", &address.to_hex())?;
        }
        if !self.topics.is_empty() {
            let topics: Vec<Option<String>> = self
                .topics
                .iter()
                .map(|t| t.as_ref().map(H256::to_hex))
                .collect();
            map.serialize_entry("topics", &topics)?;
        }
        map.end()
    }
}

/// Event log, as found in a receipt or returned by `eth_getLogs`.
///
/// Reads `blockNumber` and `logIndex` as hex quantities but writes them as
/// decimal strings for API responses. Serializing a `Log` does not produce
/// node-shaped JSON, so build node fixtures with hex quantities directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    /// Emitting contract
    pub address: Address,
    /// Indexed topics; topic 0 is the event signature hash
    pub topics: Vec<H256>,
    /// Non-indexed payload
    #[serde(with = "hex_bytes")]
    pub data: Bytes,
    /// Block containing the log
    #[serde(with = "opt_u64_quantity", default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Transaction that emitted the log
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<H256>,
    /// Position in the block
    #[serde(with = "opt_u64_quantity", default, skip_serializing_if = "Option::is_none")]
    pub log_index: Option<u64>,
}

impl Log {
    /// Event signature hash (topic 0)
    pub fn topic0(&self) -> Option<&H256> {
        self.topics.first()
    }
}

/// Transaction receipt.
///
/// Deserializes from the node's hex encoding; serializes every integer as a
/// decimal string. The two forms are not interchangeable: serialized output
/// cannot be read back as a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    /// Transaction hash
    pub transaction_hash: H256,
    /// 1 for success, 0 for revert
    #[serde(with = "opt_u64_quantity", default)]
    pub status: Option<u64>,
    /// Including block
    #[serde(with = "u64_quantity")]
    pub block_number: u64,
    /// Sender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// Recipient
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    /// Gas consumed by this transaction
    #[serde(with = "u256_quantity", default)]
    pub gas_used: U256,
    /// Price actually paid per gas
    #[serde(with = "opt_u256_quantity", default, skip_serializing_if = "Option::is_none")]
    pub effective_gas_price: Option<U256>,
    /// Emitted logs
    #[serde(default)]
    pub logs: Vec<Log>,
}

impl TransactionReceipt {
    /// Whether execution succeeded
    pub fn is_success(&self) -> bool {
        self.status == Some(1)
    }
}
