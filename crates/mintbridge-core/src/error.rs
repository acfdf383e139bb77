//! Domain error types

use std::time::Duration;

use mintbridge_primitives::H256;
use mintbridge_sdk::SdkError;
use thiserror::Error;

/// Errors surfaced by domain operations
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input rejected before any ledger I/O
    #[error("validation failed: {0}")]
    Validation(String),

    /// A read-only pre-flight check failed; nothing was broadcast
    #[error("precondition failed: {0}")]
    PreconditionConflict(String),

    /// The node answered with a JSON-RPC error
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// Node message
        message: String,
    },

    /// The node could not be reached or returned something unparseable
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),

    /// The node predicted the transaction would fail
    #[error("gas estimation failed: {0}")]
    GasEstimation(String),

    /// Mined with a failed status
    #[error("transaction {hash} reverted")]
    TransactionReverted {
        /// Transaction hash
        hash: H256,
    },

    /// No receipt within the configured wait
    #[error("no receipt for {hash} after {waited:?}")]
    Timeout {
        /// Transaction hash
        hash: H256,
        /// Time spent polling
        waited: Duration,
    },

    /// Receipt carried no log for the expected event
    #[error("{event} event not found in transaction logs (topics: {available_topics:?})")]
    EventNotFound {
        /// Event name
        event: String,
        /// topic[0] of every log in the receipt
        available_topics: Vec<H256>,
    },

    /// Return data or log payload did not match the expected schema
    #[error("ABI decode error: {0}")]
    AbiDecode(String),

    /// Local key or signing failure
    #[error("signing error: {0}")]
    Signing(String),

    /// Deployed contract or event setup does not match what the engine expects
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl CoreError {
    /// Whether the caller is at fault (bad input or a failed precondition)
    pub fn is_client_error(&self) -> bool {
        matches!(self, CoreError::Validation(_) | CoreError::PreconditionConflict(_))
    }
}

impl From<SdkError> for CoreError {
    fn from(e: SdkError) -> Self {
        match e {
            SdkError::Transport(msg) => CoreError::LedgerUnavailable(msg),
            SdkError::Rpc { code, message } => CoreError::Rpc { code, message },
            SdkError::Serialization(msg) | SdkError::InvalidHex(msg) | SdkError::MissingField(msg) => {
                CoreError::LedgerUnavailable(format!("malformed response: {}", msg))
            }
            SdkError::AbiDecode(msg) => CoreError::AbiDecode(msg),
            SdkError::AbiEncode(msg) | SdkError::InvalidAddress(msg) => CoreError::Validation(msg),
            SdkError::InvalidPrivateKey(msg)
            | SdkError::SigningFailed(msg)
            | SdkError::InvalidChainId(msg) => CoreError::Signing(msg),
        }
    }
}

/// Result type for domain operations
pub type CoreResult<T> = Result<T, CoreError>;
