//! Transaction builder

use bytes::Bytes;
use mintbridge_crypto::keccak256;
use mintbridge_primitives::{Address, H256, U256};
use rlp::RlpStream;

use crate::{SdkError, Wallet};

/// Unsigned legacy transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    /// Replay-protection chain id
    pub chain_id: u64,
    /// Sender sequence number
    pub nonce: u64,
    /// Price per gas unit (wei)
    pub gas_price: u128,
    /// Gas limit
    pub gas_limit: u64,
    /// Recipient; `None` for contract creation
    pub to: Option<Address>,
    /// Attached value (wei)
    pub value: U256,
    /// Call data
    pub data: Bytes,
}

impl UnsignedTransaction {
    /// EIP-155 signing digest:
    /// `keccak256(rlp([nonce, gasPrice, gasLimit, to, value, data, chainId, 0, 0]))`
    pub fn signing_hash(&self) -> H256 {
        let mut stream = RlpStream::new_list(9);
        self.append_fields(&mut stream);
        stream.append(&self.chain_id);
        stream.append(&0u8);
        stream.append(&0u8);
        keccak256(&stream.out())
    }

    fn append_fields(&self, stream: &mut RlpStream) {
        stream.append(&self.nonce);
        stream.append(&self.gas_price);
        stream.append(&self.gas_limit);
        match &self.to {
            Some(to) => stream.append(to),
            None => stream.append_empty_data(),
        };
        stream.append(&self.value);
        stream.append(&self.data.to_vec());
    }
}

/// Signed, RLP-encoded transaction ready for `eth_sendRawTransaction`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// The signed payload
    pub tx: UnsignedTransaction,
    /// EIP-155 `v`
    pub v: u64,
    /// Signature `r`
    pub r: H256,
    /// Signature `s`
    pub s: H256,
    /// `rlp([nonce, gasPrice, gasLimit, to, value, data, v, r, s])`
    pub raw: Bytes,
    /// `keccak256(raw)`
    pub hash: H256,
}

/// Transaction builder with fluent API
#[derive(Debug, Clone, Default)]
pub struct TxBuilder {
    chain_id: u64,
    nonce: Option<u64>,
    gas_limit: Option<u64>,
    gas_price: Option<u128>,
    to: Option<Address>,
    value: U256,
    data: Bytes,
}

impl TxBuilder {
    /// Create a new transaction builder
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            ..Default::default()
        }
    }

    /// Set the nonce
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Set the gas limit
    pub fn gas_limit(mut self, limit: u64) -> Self {
        self.gas_limit = Some(limit);
        self
    }

    /// Set the gas price
    pub fn gas_price(mut self, price: u128) -> Self {
        self.gas_price = Some(price);
        self
    }

    /// Set the recipient address
    pub fn to(mut self, address: Address) -> Self {
        self.to = Some(address);
        self
    }

    /// Set the value to transfer (in wei)
    pub fn value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Set the input data
    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }

    /// Build the unsigned transaction
    pub fn build_legacy(&self) -> Result<UnsignedTransaction, SdkError> {
        let nonce = self.nonce.ok_or(SdkError::MissingField("nonce".to_string()))?;
        let gas_limit = self.gas_limit.ok_or(SdkError::MissingField("gas_limit".to_string()))?;
        let gas_price = self.gas_price.ok_or(SdkError::MissingField("gas_price".to_string()))?;

        Ok(UnsignedTransaction {
            chain_id: self.chain_id,
            nonce,
            gas_price,
            gas_limit,
            to: self.to,
            value: self.value,
            data: self.data.clone(),
        })
    }

    /// Sign and encode a legacy transaction
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required fields are missing (nonce, gas_limit, gas_price)
    /// - Chain ID is 0 (replay protection requires valid chain ID)
    pub fn sign_legacy(&self, wallet: &Wallet) -> Result<SignedTransaction, SdkError> {
        if self.chain_id == 0 {
            return Err(SdkError::InvalidChainId(
                "Chain ID cannot be 0 - replay protection requires a valid chain ID".to_string(),
            ));
        }
        let tx = self.build_legacy()?;
        sign_legacy_tx(tx, wallet)
    }
}

fn sign_legacy_tx(tx: UnsignedTransaction, wallet: &Wallet) -> Result<SignedTransaction, SdkError> {
    let digest = tx.signing_hash();
    let signature = mintbridge_crypto::sign(&digest, wallet.private_key())?;

    let v = signature.eip155_v(tx.chain_id);
    let r = H256::from_bytes(signature.r);
    let s = H256::from_bytes(signature.s);

    let mut stream = RlpStream::new_list(9);
    tx.append_fields(&mut stream);
    stream.append(&v);
    stream.append(&U256::from_big_endian(r.as_bytes()));
    stream.append(&U256::from_big_endian(s.as_bytes()));
    let raw = Bytes::from(stream.out().to_vec());
    let hash = keccak256(&raw);

    Ok(SignedTransaction {
        tx,
        v,
        r,
        s,
        raw,
        hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mintbridge_crypto::{recover_address, Signature};
    use rlp::Rlp;

    fn test_wallet() -> Wallet {
        Wallet::from_private_key_hex(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap()
    }

    fn contract() -> Address {
        Address::from_hex("0x5FbDB2315678afecb367f032d93F642f64180aa3").unwrap()
    }

    #[test]
    fn test_tx_builder_legacy() {
        let tx = TxBuilder::new(31337)
            .nonce(3)
            .gas_limit(120_000)
            .gas_price(1_200_000_000)
            .to(contract())
            .value(U256::from(10u64).pow(U256::from(17)))
            .build_legacy()
            .unwrap();

        assert_eq!(tx.nonce, 3);
        assert_eq!(tx.gas_limit, 120_000);
        assert_eq!(tx.gas_price, 1_200_000_000);
        assert_eq!(tx.to, Some(contract()));
        assert_eq!(tx.chain_id, 31337);
    }

    #[test]
    fn test_tx_builder_missing_nonce() {
        let result = TxBuilder::new(1)
            .gas_limit(21000)
            .gas_price(1_000_000_000)
            .build_legacy();

        assert!(matches!(result, Err(SdkError::MissingField(f)) if f == "nonce"));
    }

    #[test]
    fn test_tx_builder_rejects_zero_chain_id() {
        let result = TxBuilder::new(0)
            .nonce(0)
            .gas_limit(21000)
            .gas_price(1_000_000_000)
            .to(contract())
            .sign_legacy(&test_wallet());

        let err = result.unwrap_err();
        assert!(err.to_string().contains("Chain ID"));
    }

    #[test]
    fn test_raw_is_nine_item_list_and_hash_matches() {
        let data = Bytes::from(vec![0x05, 0x32, 0x2b, 0x74]);
        let signed = TxBuilder::new(31337)
            .nonce(9)
            .gas_limit(100_000)
            .gas_price(1_000_000_000)
            .to(contract())
            .data(data.clone())
            .sign_legacy(&test_wallet())
            .unwrap();

        assert_eq!(signed.hash, keccak256(&signed.raw));

        let rlp = Rlp::new(&signed.raw);
        assert!(rlp.is_list());
        assert_eq!(rlp.item_count().unwrap(), 9);
        assert_eq!(rlp.val_at::<u64>(0).unwrap(), 9);
        assert_eq!(rlp.val_at::<u64>(2).unwrap(), 100_000);
        assert_eq!(rlp.val_at::<Address>(3).unwrap(), contract());
        assert_eq!(rlp.val_at::<Vec<u8>>(5).unwrap(), data.to_vec());
        assert_eq!(rlp.val_at::<u64>(6).unwrap(), signed.v);
    }

    #[test]
    fn test_signature_recovers_operator() {
        let wallet = test_wallet();
        let signed = TxBuilder::new(1)
            .nonce(0)
            .gas_limit(21000)
            .gas_price(1_000_000_000)
            .to(contract())
            .value(U256::from(1u64))
            .sign_legacy(&wallet)
            .unwrap();

        assert!(signed.v == 37 || signed.v == 38);
        let signature = Signature {
            r: *signed.r.as_bytes(),
            s: *signed.s.as_bytes(),
            y_parity: Signature::parity_from_eip155_v(signed.v, 1).unwrap(),
        };
        let sender = recover_address(&signed.tx.signing_hash(), &signature).unwrap();
        assert_eq!(&sender, wallet.address());
    }

    #[test]
    fn test_contract_creation_has_empty_to() {
        let signed = TxBuilder::new(1)
            .nonce(0)
            .gas_limit(1_000_000)
            .gas_price(1_000_000_000)
            .data(vec![0x60, 0x80, 0x60, 0x40])
            .sign_legacy(&test_wallet())
            .unwrap();

        let rlp = Rlp::new(&signed.raw);
        assert!(rlp.at(3).unwrap().is_empty());
    }

    #[test]
    fn test_signing_hash_depends_on_chain_id() {
        let base = TxBuilder::new(1)
            .nonce(0)
            .gas_limit(21000)
            .gas_price(1)
            .to(contract());
        let a = base.build_legacy().unwrap().signing_hash();
        let mut other = base.build_legacy().unwrap();
        other.chain_id = 2;
        assert_ne!(a, other.signing_hash());
    }
}
