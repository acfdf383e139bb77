//! Transport layer for RPC communication

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::SdkError;

/// Transport trait for RPC communication (object-safe)
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send an RPC request and get JSON response
    async fn request_json(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Value, SdkError>;
}

/// Helper to deserialize response
pub fn deserialize_response<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, SdkError> {
    serde_json::from_value(value).map_err(|e| SdkError::Serialization(e.to_string()))
}

/// Programmable response for one RPC method
pub type MockHandler = Arc<dyn Fn(&[Value]) -> Result<Value, SdkError> + Send + Sync>;

/// One request seen by [`MockTransport`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// RPC method name
    pub method: String,
    /// Positional params
    pub params: Vec<Value>,
}

/// Mock transport for testing.
///
/// Lookup order per method: handler, fixed response, built-in default.
/// Every request is recorded. Clones share state, so a test can keep a
/// handle after moving one into a client.
#[derive(Clone)]
pub struct MockTransport {
    handlers: Arc<Mutex<HashMap<String, MockHandler>>>,
    responses: Arc<Mutex<HashMap<String, Value>>>,
    default_responses: Arc<HashMap<String, Value>>,
    log: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        let mut defaults = HashMap::new();

        defaults.insert("eth_chainId".to_string(), Value::String("0x1".to_string()));
        defaults.insert("eth_gasPrice".to_string(), Value::String("0x3b9aca00".to_string())); // 1 gwei
        defaults.insert("eth_blockNumber".to_string(), Value::String("0x100".to_string())); // Block 256
        defaults.insert("eth_getBalance".to_string(), Value::String("0xde0b6b3a7640000".to_string())); // 1 ETH
        defaults.insert("eth_getTransactionCount".to_string(), Value::String("0x0".to_string()));
        defaults.insert("eth_estimateGas".to_string(), Value::String("0x5208".to_string())); // 21000
        defaults.insert("eth_sendRawTransaction".to_string(), Value::String(
            "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b".to_string()
        ));
        defaults.insert("eth_getTransactionReceipt".to_string(), Value::Null);
        defaults.insert("eth_getLogs".to_string(), Value::Array(vec![]));
        defaults.insert("eth_call".to_string(), Value::String("0x".to_string()));
        defaults.insert("eth_getCode".to_string(), Value::String("0x".to_string()));

        Self {
            handlers: Arc::new(Mutex::new(HashMap::new())),
            responses: Arc::new(Mutex::new(HashMap::new())),
            default_responses: Arc::new(defaults),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set a fixed response for a specific method
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned (only possible if another thread panicked while holding the lock).
    pub fn set_response(&self, method: &str, response: Value) {
        self.responses
            .lock()
            .expect("MockTransport mutex poisoned")
            .insert(method.to_string(), response);
    }

    /// Answer `method` by calling `handler` with the request params
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn set_handler<F>(&self, method: &str, handler: F)
    where
        F: Fn(&[Value]) -> Result<Value, SdkError> + Send + Sync + 'static,
    {
        self.handlers
            .lock()
            .expect("MockTransport mutex poisoned")
            .insert(method.to_string(), Arc::new(handler));
    }

    /// Make `method` fail with a node error
    pub fn set_error(&self, method: &str, code: i64, message: &str) {
        let message = message.to_string();
        self.set_handler(method, move |_| {
            Err(SdkError::Rpc {
                code,
                message: message.clone(),
            })
        });
    }

    /// Clear custom responses and handlers
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn clear_responses(&self) {
        self.responses
            .lock()
            .expect("MockTransport mutex poisoned")
            .clear();
        self.handlers
            .lock()
            .expect("MockTransport mutex poisoned")
            .clear();
    }

    /// All requests seen so far, in order
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log.lock().expect("MockTransport mutex poisoned").clone()
    }

    /// Requests seen for one method
    pub fn requests_for(&self, method: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }

    /// Number of requests seen for one method
    pub fn count(&self, method: &str) -> usize {
        self.requests_for(method).len()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request_json(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Value, SdkError> {
        let poisoned = || SdkError::Transport("MockTransport mutex poisoned".to_string());

        self.log.lock().map_err(|_| poisoned())?.push(RecordedRequest {
            method: method.to_string(),
            params: params.clone(),
        });

        let handler = self
            .handlers
            .lock()
            .map_err(|_| poisoned())?
            .get(method)
            .cloned();
        if let Some(handler) = handler {
            return handler(&params);
        }

        let custom_response = self
            .responses
            .lock()
            .map_err(|_| poisoned())?
            .get(method)
            .cloned();
        if let Some(response) = custom_response {
            return Ok(response);
        }

        if let Some(response) = self.default_responses.get(method) {
            return Ok(response.clone());
        }

        Err(SdkError::Rpc {
            code: -32601,
            message: format!("Method not found: {}", method),
        })
    }
}

/// HTTP transport for real RPC communication
#[cfg(feature = "http")]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    request_id: std::sync::atomic::AtomicU64,
}

#[cfg(feature = "http")]
impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            request_id: std::sync::atomic::AtomicU64::new(1),
        }
    }

    /// Create a transport whose requests give up after `timeout`
    pub fn with_timeout(url: &str, timeout: std::time::Duration) -> Result<Self, SdkError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SdkError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
            request_id: std::sync::atomic::AtomicU64::new(1),
        })
    }

    fn next_id(&self) -> u64 {
        self.request_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Transport for HttpTransport {
    async fn request_json(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Value, SdkError> {
        let id = self.next_id();
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        tracing::trace!(id, method, "rpc request");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SdkError::Transport(e.to_string()))?;

        let response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| SdkError::Transport(e.to_string()))?;

        if let Some(error) = response.error {
            tracing::debug!(id, method, code = error.code, message = %error.message, "rpc error");
            return Err(SdkError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        // A present-but-null result (e.g. a receipt not yet mined) is valid.
        Ok(response.result.unwrap_or(Value::Null))
    }
}

#[cfg(feature = "http")]
#[derive(serde::Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[cfg(feature = "http")]
#[derive(serde::Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_transport_default_responses() {
        let transport = MockTransport::new();

        let result = transport
            .request_json("eth_chainId", vec![])
            .await
            .unwrap();
        assert_eq!(result, Value::String("0x1".to_string()));

        let result = transport
            .request_json("eth_getTransactionReceipt", vec![])
            .await
            .unwrap();
        assert!(result.is_null());
    }

    #[tokio::test]
    async fn test_mock_transport_custom_response() {
        let transport = MockTransport::new();
        transport.set_response("eth_chainId", Value::String("0x5".to_string()));

        let result = transport
            .request_json("eth_chainId", vec![])
            .await
            .unwrap();
        assert_eq!(result, Value::String("0x5".to_string()));
    }

    #[tokio::test]
    async fn test_mock_transport_handler_sees_params() {
        let transport = MockTransport::new();
        transport.set_handler("eth_getCode", |params| {
            Ok(Value::String(format!("0x{}", params.len())))
        });

        let result = transport
            .request_json("eth_getCode", vec![Value::Null, Value::Null])
            .await
            .unwrap();
        assert_eq!(result, Value::String("0x2".to_string()));
    }

    #[tokio::test]
    async fn test_mock_transport_records_requests() {
        let transport = MockTransport::new();
        let shared = transport.clone();

        transport.request_json("eth_blockNumber", vec![]).await.unwrap();
        transport
            .request_json("eth_getBalance", vec![Value::from("0x00")])
            .await
            .unwrap();

        assert_eq!(shared.count("eth_blockNumber"), 1);
        assert_eq!(shared.requests().len(), 2);
        assert_eq!(shared.requests_for("eth_getBalance")[0].params[0], "0x00");
    }

    #[tokio::test]
    async fn test_mock_transport_set_error() {
        let transport = MockTransport::new();
        transport.set_error("eth_estimateGas", 3, "execution reverted");

        match transport.request_json("eth_estimateGas", vec![]).await {
            Err(SdkError::Rpc { code: 3, message }) => assert_eq!(message, "execution reverted"),
            other => panic!("Expected Rpc error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mock_transport_unknown_method() {
        let transport = MockTransport::new();
        let result = transport
            .request_json("unknown_method", vec![])
            .await;
        assert!(matches!(result, Err(SdkError::Rpc { code: -32601, .. })));
    }
}
