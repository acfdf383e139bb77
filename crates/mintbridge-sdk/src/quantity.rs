//! Hex quantity parsing and serde adapters.
//!
//! The ledger speaks `0x`-prefixed hex for every integer and byte string.
//! Values that leave this process (HTTP responses) use decimal strings
//! instead, so the adapters below deserialize hex and serialize decimal.

use bytes::Bytes;
use mintbridge_primitives::{strip_hex_prefix, U256};
use serde::{Deserialize, Deserializer, Serializer};

use crate::SdkError;

/// Parse a hex quantity into a `u64`
pub fn parse_hex_u64(s: &str) -> Result<u64, SdkError> {
    let s = strip_hex_prefix(s);
    if s.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(s, 16).map_err(|e| SdkError::InvalidHex(format!("{}: {}", s, e)))
}

/// Parse a hex quantity into a `u128`
pub fn parse_hex_u128(s: &str) -> Result<u128, SdkError> {
    let s = strip_hex_prefix(s);
    if s.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(s, 16).map_err(|e| SdkError::InvalidHex(format!("{}: {}", s, e)))
}

/// Parse a hex quantity into a `U256`
pub fn parse_hex_u256(s: &str) -> Result<U256, SdkError> {
    let s = strip_hex_prefix(s);
    if s.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_str_radix(s, 16).map_err(|e| SdkError::InvalidHex(format!("{}: {:?}", s, e)))
}

/// Parse hex data. `0x` is zero bytes.
pub fn parse_hex_bytes(s: &str) -> Result<Bytes, SdkError> {
    let s = strip_hex_prefix(s);
    if s.is_empty() {
        return Ok(Bytes::new());
    }
    Ok(Bytes::from(hex::decode(s)?))
}

/// Format bytes as `0x` hex
pub fn to_hex_data(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

/// Format an integer as a minimal hex quantity (`0x0`, `0x1a`)
pub fn to_hex_quantity(value: u128) -> String {
    format!("0x{:x}", value)
}

/// Format a `U256` as a minimal hex quantity
pub fn u256_to_hex_quantity(value: &U256) -> String {
    format!("0x{:x}", value)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawQuantity {
    Str(String),
    Num(u64),
}

/// `Bytes` as `0x` hex in both directions
pub mod hex_bytes {
    use super::*;

    /// Serialize as `0x` hex
    pub fn serialize<S: Serializer>(value: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_hex_data(value))
    }

    /// Deserialize from `0x` hex
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_hex_bytes(&s).map_err(serde::de::Error::custom)
    }
}

/// `u64` read as hex quantity, written as decimal string
pub mod u64_quantity {
    use super::*;

    /// Serialize as decimal string
    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    /// Deserialize from hex string or JSON number
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match RawQuantity::deserialize(deserializer)? {
            RawQuantity::Str(s) => parse_hex_u64(&s).map_err(serde::de::Error::custom),
            RawQuantity::Num(n) => Ok(n),
        }
    }
}

/// `Option<u64>` read as hex quantity, written as decimal string
pub mod opt_u64_quantity {
    use super::*;

    /// Serialize as decimal string or null
    pub fn serialize<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize from hex string, number or null
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u64>, D::Error> {
        match Option::<RawQuantity>::deserialize(deserializer)? {
            Some(RawQuantity::Str(s)) => parse_hex_u64(&s).map(Some).map_err(serde::de::Error::custom),
            Some(RawQuantity::Num(n)) => Ok(Some(n)),
            None => Ok(None),
        }
    }
}

/// `U256` read as hex quantity, written as decimal string
pub mod u256_quantity {
    use super::*;

    /// Serialize as decimal string
    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    /// Deserialize from hex string or JSON number
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        match RawQuantity::deserialize(deserializer)? {
            RawQuantity::Str(s) => parse_hex_u256(&s).map_err(serde::de::Error::custom),
            RawQuantity::Num(n) => Ok(U256::from(n)),
        }
    }
}

/// `Option<U256>` read as hex quantity, written as decimal string
pub mod opt_u256_quantity {
    use super::*;

    /// Serialize as decimal string or null
    pub fn serialize<S: Serializer>(
        value: &Option<U256>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize from hex string, number or null
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<U256>, D::Error> {
        match Option::<RawQuantity>::deserialize(deserializer)? {
            Some(RawQuantity::Str(s)) => {
                parse_hex_u256(&s).map(Some).map_err(serde::de::Error::custom)
            }
            Some(RawQuantity::Num(n)) => Ok(Some(U256::from(n))),
            None => Ok(None),
        }
    }
}

/// `U256` as a decimal string in both directions. Used for values that
/// cross the HTTP boundary.
pub mod u256_dec {
    use super::*;

    /// Serialize as decimal string
    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    /// Deserialize from decimal string or JSON number
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        match RawQuantity::deserialize(deserializer)? {
            RawQuantity::Str(s) => {
                U256::from_dec_str(s.trim()).map_err(|e| serde::de::Error::custom(format!("{:?}", e)))
            }
            RawQuantity::Num(n) => Ok(U256::from(n)),
        }
    }
}

/// `Vec<U256>` as decimal strings
pub mod u256_dec_vec {
    use super::*;
    use serde::ser::SerializeSeq;

    /// Serialize as an array of decimal strings
    pub fn serialize<S: Serializer>(values: &[U256], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for v in values {
            seq.serialize_element(&v.to_string())?;
        }
        seq.end()
    }

    /// Deserialize from an array of decimal strings
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<U256>, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|s| U256::from_dec_str(s).map_err(|e| serde::de::Error::custom(format!("{:?}", e))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[test]
    fn test_parse_hex_u64() {
        assert_eq!(parse_hex_u64("0x1").unwrap(), 1);
        assert_eq!(parse_hex_u64("0x100").unwrap(), 256);
        assert_eq!(parse_hex_u64("100").unwrap(), 256);
        assert_eq!(parse_hex_u64("0x").unwrap(), 0);
        assert!(parse_hex_u64("0xzz").is_err());
    }

    #[test]
    fn test_parse_hex_u128() {
        assert_eq!(parse_hex_u128("0x3b9aca00").unwrap(), 1_000_000_000);
    }

    #[test]
    fn test_parse_hex_u256() {
        let result = parse_hex_u256("0xde0b6b3a7640000").unwrap();
        assert_eq!(result, U256::from(1_000_000_000_000_000_000u128));
    }

    #[test]
    fn test_parse_hex_bytes() {
        assert_eq!(parse_hex_bytes("0x1234").unwrap().as_ref(), &[0x12, 0x34]);
        assert!(parse_hex_bytes("0x").unwrap().is_empty());
    }

    #[test]
    fn test_hex_quantity_formatting() {
        assert_eq!(to_hex_quantity(0), "0x0");
        assert_eq!(to_hex_quantity(26), "0x1a");
        assert_eq!(u256_to_hex_quantity(&U256::from(255)), "0xff");
        assert_eq!(to_hex_data(&[]), "0x");
    }

    #[derive(Serialize, Deserialize)]
    struct Sample {
        #[serde(with = "u64_quantity")]
        block: u64,
        #[serde(with = "u256_quantity")]
        amount: U256,
        #[serde(with = "opt_u64_quantity", default)]
        index: Option<u64>,
    }

    #[test]
    fn test_hex_in_decimal_out() {
        let sample: Sample =
            serde_json::from_str(r#"{"block":"0x10","amount":"0xde0b6b3a7640000","index":null}"#)
                .unwrap();
        assert_eq!(sample.block, 16);
        assert_eq!(sample.index, None);

        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["block"], "16");
        assert_eq!(json["amount"], "1000000000000000000");
    }
}
