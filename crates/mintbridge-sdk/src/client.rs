//! LedgerClient - JSON-RPC client for the ledger node

use bytes::Bytes;
use mintbridge_primitives::{Address, H256, U256};
use serde_json::Value;

use crate::quantity::{parse_hex_bytes, parse_hex_u128, parse_hex_u256, parse_hex_u64, to_hex_data};
use crate::transport::{deserialize_response, MockTransport, Transport};
use crate::types::{BlockId, CallRequest, Log, LogFilter, TransactionReceipt};
use crate::SdkError;

#[cfg(feature = "http")]
use crate::transport::HttpTransport;

/// Ledger client for RPC communication.
///
/// Every method is a single request with no retries; failures surface as
/// [`SdkError::Transport`] or [`SdkError::Rpc`].
pub struct LedgerClient {
    transport: Box<dyn Transport>,
    chain_id: Option<u64>,
}

impl LedgerClient {
    /// Create a new client with HTTP transport and cache the chain id
    #[cfg(feature = "http")]
    pub async fn connect(url: &str) -> Result<Self, SdkError> {
        Self::connect_with(HttpTransport::new(url), None).await
    }

    /// Create a client over `transport`. When `chain_id` is `None` it is
    /// fetched once and cached.
    pub async fn connect_with(
        transport: impl Transport + 'static,
        chain_id: Option<u64>,
    ) -> Result<Self, SdkError> {
        let mut client = Self::with_transport(transport);
        let chain_id = match chain_id {
            Some(id) => id,
            None => client.fetch_chain_id().await?,
        };
        client.chain_id = Some(chain_id);
        Ok(client)
    }

    /// Create a new client with mock transport (for testing)
    pub fn new_mock() -> Self {
        Self {
            transport: Box::new(MockTransport::new()),
            chain_id: Some(1),
        }
    }

    /// Create a client with a custom transport
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            chain_id: None,
        }
    }

    /// Helper method to make RPC request and deserialize
    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, SdkError> {
        let value = self.transport.request_json(method, params).await?;
        deserialize_response(value)
    }

    // ==================== Chain Info ====================

    /// Get the chain ID
    pub async fn chain_id(&self) -> Result<u64, SdkError> {
        if let Some(id) = self.chain_id {
            return Ok(id);
        }
        self.fetch_chain_id().await
    }

    async fn fetch_chain_id(&self) -> Result<u64, SdkError> {
        let result: String = self.request("eth_chainId", vec![]).await?;
        parse_hex_u64(&result)
    }

    /// Get the current gas price
    pub async fn gas_price(&self) -> Result<u128, SdkError> {
        let result: String = self.request("eth_gasPrice", vec![]).await?;
        parse_hex_u128(&result)
    }

    /// Get the current block number
    pub async fn block_number(&self) -> Result<u64, SdkError> {
        let result: String = self.request("eth_blockNumber", vec![]).await?;
        parse_hex_u64(&result)
    }

    // ==================== Account Queries ====================

    /// Get the balance of an address
    pub async fn get_balance(&self, address: &Address, block: BlockId) -> Result<U256, SdkError> {
        let result: String = self
            .request(
                "eth_getBalance",
                vec![
                    Value::String(address.to_hex()),
                    serde_json::to_value(block)?,
                ],
            )
            .await?;
        parse_hex_u256(&result)
    }

    /// Get the nonce (transaction count) of an address
    pub async fn get_nonce(&self, address: &Address, block: BlockId) -> Result<u64, SdkError> {
        let result: String = self
            .request(
                "eth_getTransactionCount",
                vec![
                    Value::String(address.to_hex()),
                    serde_json::to_value(block)?,
                ],
            )
            .await?;
        parse_hex_u64(&result)
    }

    /// Next unused sequence number for `address`, read from the latest
    /// confirmed state rather than the pending pool.
    pub async fn next_nonce(&self, address: &Address) -> Result<u64, SdkError> {
        self.get_nonce(address, BlockId::Latest).await
    }

    /// Get the code at an address
    pub async fn get_code(&self, address: &Address, block: BlockId) -> Result<Bytes, SdkError> {
        let result: String = self
            .request(
                "eth_getCode",
                vec![
                    Value::String(address.to_hex()),
                    serde_json::to_value(block)?,
                ],
            )
            .await?;
        parse_hex_bytes(&result)
    }

    // ==================== Transactions ====================

    /// Send a raw signed transaction and return its hash
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> Result<H256, SdkError> {
        let result: String = self
            .request("eth_sendRawTransaction", vec![Value::String(to_hex_data(raw))])
            .await?;
        Ok(H256::from_hex(&result)?)
    }

    /// Get a transaction receipt; `None` while the transaction is unmined
    pub async fn get_receipt(&self, hash: &H256) -> Result<Option<TransactionReceipt>, SdkError> {
        self.request(
            "eth_getTransactionReceipt",
            vec![Value::String(hash.to_hex())],
        )
        .await
    }

    /// Query historical logs
    pub async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<Log>, SdkError> {
        self.request("eth_getLogs", vec![serde_json::to_value(filter)?])
            .await
    }

    // ==================== Call & Estimation ====================

    /// Execute a call (read-only, does not create transaction)
    pub async fn call(&self, request: &CallRequest, block: BlockId) -> Result<Bytes, SdkError> {
        let result: String = self
            .request(
                "eth_call",
                vec![serde_json::to_value(request)?, serde_json::to_value(block)?],
            )
            .await?;
        parse_hex_bytes(&result)
    }

    /// Estimate gas for a transaction
    pub async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, SdkError> {
        let result: String = self
            .request("eth_estimateGas", vec![serde_json::to_value(request)?])
            .await?;
        parse_hex_u64(&result)
    }
}
