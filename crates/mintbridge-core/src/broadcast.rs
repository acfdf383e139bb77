//! Write path for the operator account.
//!
//! Every state-changing call goes through [`Broadcaster::send`]:
//!
//! 1. resolve the nonce (local cache, else `eth_getTransactionCount` at `latest`)
//! 2. price gas from `eth_gasPrice` scaled by the [`GasPolicy`]
//! 3. estimate gas, buffered when the request asks for it
//! 4. sign (EIP-155), submit, poll for the receipt until the timeout
//! 5. reject a failed status
//!
//! The nonce lock is held from step 1 until the receipt arrives or the
//! write fails, so at most one operator transaction is in flight. The cached
//! nonce is cleared only when a write fails before the node accepts it; once
//! accepted, the next write moves on to the following nonce.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use mintbridge_primitives::{Address, H256, U256};
use mintbridge_sdk::types::{CallRequest, TransactionReceipt};
use mintbridge_sdk::{LedgerClient, SdkError, TxBuilder, Wallet};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::{CoreError, CoreResult};
use crate::gas::GasPolicy;

/// Receipt wait settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastConfig {
    /// Give up waiting for a receipt after this long
    pub receipt_timeout: Duration,
    /// Delay between receipt lookups
    pub poll_interval: Duration,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            receipt_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(2000),
        }
    }
}

/// A contract call to sign and submit
#[derive(Debug, Clone)]
pub struct WriteRequest {
    /// Target contract
    pub to: Address,
    /// ABI-encoded calldata
    pub data: Bytes,
    /// Attached value in wei
    pub value: U256,
    /// Apply the gas limit safety buffer
    pub buffered: bool,
    /// Operation name for logs
    pub label: &'static str,
}

impl WriteRequest {
    /// Zero-value call with the plain estimate as gas limit
    pub fn new(label: &'static str, to: Address, data: Bytes) -> Self {
        Self {
            to,
            data,
            value: U256::zero(),
            buffered: false,
            label,
        }
    }

    /// Attach value; value-carrying calls are always buffered
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self.buffered = true;
        self
    }

    /// Scale the gas estimate by the policy buffer
    pub fn buffered(mut self) -> Self {
        self.buffered = true;
        self
    }
}

#[derive(Debug, Default)]
struct NonceState {
    cached: Option<u64>,
}

/// Serializes operator writes and tracks the next nonce
pub struct Broadcaster {
    client: Arc<LedgerClient>,
    wallet: Wallet,
    gas: GasPolicy,
    config: BroadcastConfig,
    nonce: Mutex<NonceState>,
}

impl Broadcaster {
    /// Create a broadcaster for `wallet`
    pub fn new(client: Arc<LedgerClient>, wallet: Wallet, gas: GasPolicy, config: BroadcastConfig) -> Self {
        Self {
            client,
            wallet,
            gas,
            config,
            nonce: Mutex::new(NonceState::default()),
        }
    }

    /// Operator address
    pub fn operator(&self) -> &Address {
        self.wallet.address()
    }

    /// Nonce the next write will use without asking the node, if known
    pub async fn cached_nonce(&self) -> Option<u64> {
        self.nonce.lock().await.cached
    }

    /// Sign, submit and wait for `request`. Returns the successful receipt.
    pub async fn send(&self, request: WriteRequest) -> CoreResult<TransactionReceipt> {
        tracing::debug!(operation = request.label, "acquiring operator nonce lock");
        let mut state = self.nonce.lock().await;

        let nonce = match state.cached {
            Some(nonce) => nonce,
            None => self.client.next_nonce(self.wallet.address()).await?,
        };

        let hash = match self.submit(nonce, &request).await {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(
                    operation = request.label,
                    nonce,
                    error = %e,
                    "write not accepted, clearing cached nonce"
                );
                state.cached = None;
                return Err(e);
            }
        };

        // accepted by the node: the nonce is spent even if no receipt follows
        state.cached = Some(nonce + 1);
        self.confirm(&request, hash).await
    }

    /// Price, estimate, sign and send. Nothing reaches the mempool on error.
    async fn submit(&self, nonce: u64, request: &WriteRequest) -> CoreResult<H256> {
        let from = *self.wallet.address();

        let base_price = self.client.gas_price().await?;
        let gas_price = self.gas.gas_price(base_price);

        let mut call = CallRequest::new(request.to, request.data.clone()).from(from);
        if !request.value.is_zero() {
            call = call.value(request.value);
        }
        let estimate = self.client.estimate_gas(&call).await.map_err(|e| match e {
            SdkError::Rpc { message, .. } => CoreError::GasEstimation(message),
            other => CoreError::from(other),
        })?;
        let gas_limit = if request.buffered {
            self.gas.buffered_limit(estimate)
        } else {
            estimate
        };

        tracing::debug!(
            operation = request.label,
            nonce,
            base_price,
            gas_price,
            estimate,
            gas_limit,
            "prepared transaction"
        );

        let chain_id = self.client.chain_id().await?;
        let signed = TxBuilder::new(chain_id)
            .nonce(nonce)
            .gas_price(gas_price)
            .gas_limit(gas_limit)
            .to(request.to)
            .value(request.value)
            .data(request.data.clone())
            .sign_legacy(&self.wallet)?;

        let hash = self.client.send_raw_transaction(&signed.raw).await?;
        if hash != signed.hash {
            tracing::warn!(local = %signed.hash, node = %hash, "node returned a different transaction hash");
        }
        tracing::info!(
            operation = request.label,
            tx_hash = %hash,
            nonce,
            gas_price,
            "transaction submitted"
        );
        Ok(hash)
    }

    async fn confirm(&self, request: &WriteRequest, hash: H256) -> CoreResult<TransactionReceipt> {
        let receipt = self.wait_for_receipt(hash).await.map_err(|e| {
            tracing::warn!(operation = request.label, tx_hash = %hash, error = %e, "no receipt for submitted transaction");
            e
        })?;
        if !receipt.is_success() {
            tracing::error!(operation = request.label, tx_hash = %hash, "transaction reverted");
            return Err(CoreError::TransactionReverted { hash });
        }

        tracing::info!(
            operation = request.label,
            tx_hash = %hash,
            block = receipt.block_number,
            "transaction confirmed"
        );
        Ok(receipt)
    }

    async fn wait_for_receipt(&self, hash: H256) -> CoreResult<TransactionReceipt> {
        let started = Instant::now();
        loop {
            if let Some(receipt) = self.client.get_receipt(&hash).await? {
                return Ok(receipt);
            }
            let waited = started.elapsed();
            if waited >= self.config.receipt_timeout {
                return Err(CoreError::Timeout { hash, waited });
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}
