//! # mintbridge-sdk
//!
//! Client side of the ledger: JSON-RPC access, the Solidity ABI codec and
//! EIP-155 transaction signing for the operator account.
//!
//! ## Features
//!
//! - **LedgerClient**: typed wrappers over the `eth_*` JSON-RPC methods
//! - **Wallet**: the operator keypair
//! - **TxBuilder**: fluent builder producing signed, RLP-encoded legacy transactions
//! - **ABI**: call encoding, return decoding and event log decoding
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mintbridge_sdk::{LedgerClient, Wallet, TxBuilder};
//! use mintbridge_sdk::abi::{encode_call, Token};
//! use mintbridge_primitives::{Address, U256};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = LedgerClient::connect("http://127.0.0.1:8545").await?;
//!     let wallet = Wallet::from_private_key_hex(
//!         "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
//!     )?;
//!
//!     let nft = Address::from_hex("0x5FbDB2315678afecb367f032d93F642f64180aa3")?;
//!     let data = encode_call("mintEdition(uint256)", &[Token::Uint(U256::from(1))])?;
//!
//!     let signed = TxBuilder::new(client.chain_id().await?)
//!         .nonce(client.next_nonce(wallet.address()).await?)
//!         .gas_limit(200_000)
//!         .gas_price(client.gas_price().await?)
//!         .to(nft)
//!         .data(data)
//!         .sign_legacy(&wallet)?;
//!
//!     let hash = client.send_raw_transaction(&signed.raw).await?;
//!     println!("submitted {}", hash);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod abi;
mod client;
mod error;
pub mod quantity;
mod transport;
mod tx_builder;
pub mod types;
mod wallet;

pub use client::LedgerClient;
pub use error::SdkError;
pub use transport::{MockHandler, MockTransport, RecordedRequest};

/// Re-export Transport trait for custom implementations
pub use transport::Transport;
pub use tx_builder::{SignedTransaction, TxBuilder, UnsignedTransaction};
pub use wallet::Wallet;

#[cfg(feature = "http")]
pub use transport::HttpTransport;

pub use mintbridge_primitives::{Address, BlockHeight, Gas, Nonce, H256, U256};
