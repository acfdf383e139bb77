//! Recoverable secp256k1 signatures

use k256::ecdsa::{RecoveryId, Signature as K256Signature, SigningKey, VerifyingKey};
use mintbridge_primitives::{Address, H256};

use crate::{keccak256, CryptoError};

/// Public key
pub type PublicKey = VerifyingKey;

/// Private key (32 bytes)
pub type PrivateKey = SigningKey;

/// ECDSA signature with y-parity, always in low-s form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    /// r component (32 bytes)
    pub r: [u8; 32],
    /// s component (32 bytes)
    pub s: [u8; 32],
    /// y-parity of the ephemeral point (0 or 1)
    pub y_parity: u8,
}

impl Signature {
    /// Legacy `v` value for a chain (`parity + 2 * chain_id + 35`).
    pub fn eip155_v(&self, chain_id: u64) -> u64 {
        self.y_parity as u64 + chain_id * 2 + 35
    }

    /// Recover the y-parity from an EIP-155 `v` value.
    pub fn parity_from_eip155_v(v: u64, chain_id: u64) -> Result<u8, CryptoError> {
        let parity = v
            .checked_sub(chain_id * 2 + 35)
            .filter(|p| *p <= 1)
            .ok_or(CryptoError::InvalidRecoveryId(v.min(u8::MAX as u64) as u8))?;
        Ok(parity as u8)
    }

    fn to_k256(&self) -> Result<K256Signature, CryptoError> {
        let r: k256::FieldBytes = self.r.into();
        let s: k256::FieldBytes = self.s.into();
        K256Signature::from_scalars(r, s).map_err(|e| CryptoError::InvalidSignature(e.to_string()))
    }
}

/// Sign a 32-byte digest. High-s results are flipped to low-s.
pub fn sign(digest: &H256, private_key: &PrivateKey) -> Result<Signature, CryptoError> {
    let (mut signature, mut recovery_id) = private_key
        .sign_prehash_recoverable(digest.as_bytes())
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

    if let Some(normalized) = signature.normalize_s() {
        signature = normalized;
        recovery_id = RecoveryId::from_byte(recovery_id.to_byte() ^ 1)
            .ok_or_else(|| CryptoError::SigningFailed("recovery id out of range".into()))?;
    }

    Ok(Signature {
        r: signature.r().to_bytes().into(),
        s: signature.s().to_bytes().into(),
        y_parity: recovery_id.to_byte() & 1,
    })
}

/// Recover the signer's address from a digest and signature
pub fn recover_address(digest: &H256, signature: &Signature) -> Result<Address, CryptoError> {
    let recovery_id = RecoveryId::from_byte(signature.y_parity)
        .ok_or(CryptoError::InvalidRecoveryId(signature.y_parity))?;
    let key = VerifyingKey::recover_from_prehash(
        digest.as_bytes(),
        &signature.to_k256()?,
        recovery_id,
    )
    .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))?;
    Ok(public_key_to_address(&key))
}

/// Derive the ledger address from a public key: last 20 bytes of the
/// keccak of the uncompressed point without its `0x04` tag.
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    let encoded = public_key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);
    Address::from_word(hash.as_bytes())
}
