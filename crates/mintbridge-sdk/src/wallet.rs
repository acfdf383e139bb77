//! Operator wallet

use mintbridge_crypto::{public_key_to_address, sign, PrivateKey, Signature};
use mintbridge_primitives::{strip_hex_prefix, Address, H256};
use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::SdkError;

/// Holds the operator's signing key.
///
/// Not `Clone`: the key lives in exactly one place for the process lifetime.
pub struct Wallet {
    private_key: PrivateKey,
    address: Address,
}

impl Wallet {
    /// Create a new random wallet
    pub fn new_random() -> Self {
        let private_key = SigningKey::random(&mut OsRng);
        let address = public_key_to_address(private_key.verifying_key());
        Self {
            private_key,
            address,
        }
    }

    /// Create a wallet from a 32-byte private key
    pub fn from_private_key(key: &[u8; 32]) -> Result<Self, SdkError> {
        let private_key = SigningKey::from_slice(key)
            .map_err(|e| SdkError::InvalidPrivateKey(e.to_string()))?;
        let address = public_key_to_address(private_key.verifying_key());
        Ok(Self {
            private_key,
            address,
        })
    }

    /// Create a wallet from a hex-encoded private key, with or without `0x`.
    /// Intermediate buffers are zeroed.
    pub fn from_private_key_hex(hex: &str) -> Result<Self, SdkError> {
        let mut bytes = hex::decode(strip_hex_prefix(hex.trim()))
            .map_err(|_| SdkError::InvalidPrivateKey("not valid hex".to_string()))?;
        if bytes.len() != 32 {
            let len = bytes.len();
            bytes.zeroize();
            return Err(SdkError::InvalidPrivateKey(format!(
                "Expected 32 bytes, got {}",
                len
            )));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes);
        bytes.zeroize();

        let result = Self::from_private_key(&key);
        key.zeroize();
        result
    }

    /// Get the wallet's address
    pub fn address(&self) -> &Address {
        &self.address
    }

    pub(crate) fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Sign a 32-byte digest
    pub fn sign_hash(&self, hash: &H256) -> Result<Signature, SdkError> {
        Ok(sign(hash, &self.private_key)?)
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
