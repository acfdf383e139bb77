//! Keccak-256 hashing

use mintbridge_primitives::H256;
use sha3::{Digest, Keccak256};

/// Compute Keccak-256 hash of the input data
pub fn keccak256(data: &[u8]) -> H256 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    H256::from_bytes(hasher.finalize().into())
}

/// First four bytes of `keccak256(signature)`, e.g. `"placeBid(uint256)"`.
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash.as_bytes()[..4]);
    selector
}

/// Topic 0 of an event, i.e. `keccak256` of its canonical signature.
pub fn event_topic(signature: &str) -> H256 {
    keccak256(signature.as_bytes())
}
