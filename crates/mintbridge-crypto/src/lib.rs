//! # mintbridge-crypto
//!
//! Hashing and signing used when talking to the ledger.
//!
//! - Keccak-256 hashing, function selectors and event topics
//! - secp256k1 recoverable signing with low-s normalization
//! - Sender recovery and address derivation

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod hash;
mod signature;

pub use error::CryptoError;
pub use hash::{event_topic, function_selector, keccak256};
pub use signature::{
    public_key_to_address, recover_address, sign, PrivateKey, PublicKey, Signature,
};
