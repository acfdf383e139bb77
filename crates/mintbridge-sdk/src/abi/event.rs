//! Event log decoding

use mintbridge_primitives::H256;

use super::decode::decode;
use super::types::{ParamType, Token};
use crate::types::Log;
use crate::SdkError;

/// One field of an event schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventParam {
    /// Field name
    pub name: String,
    /// Solidity type
    pub kind: ParamType,
    /// Whether the field is carried in a topic rather than the data
    pub indexed: bool,
}

impl EventParam {
    /// Non-indexed field
    pub fn data(name: &str, kind: ParamType) -> Self {
        Self {
            name: name.to_string(),
            kind,
            indexed: false,
        }
    }

    /// Indexed field
    pub fn indexed(name: &str, kind: ParamType) -> Self {
        Self {
            name: name.to_string(),
            kind,
            indexed: true,
        }
    }
}

/// Canonical signature `Name(type,...)` for an event schema
pub fn event_signature(name: &str, params: &[EventParam]) -> String {
    let types: Vec<String> = params.iter().map(|p| p.kind.to_string()).collect();
    format!("{}({})", name, types.join(","))
}

/// Decode a log against an event schema, returning `(name, value)` pairs in
/// declaration order.
///
/// Non-indexed fields are consecutive 32-byte words of `data`; indexed
/// fields come from `topics[1..]` in order. Indexed dynamic values are only
/// available as their hash and come back as `FixedBytes(32)`.
pub fn decode_event_log(params: &[EventParam], log: &Log) -> Result<Vec<(String, Token)>, SdkError> {
    if log.data.len() % 32 != 0 {
        return Err(SdkError::AbiDecode(format!(
            "log data length {} is not a multiple of 32",
            log.data.len()
        )));
    }

    let words = log.data.len() / 32;
    let data_fields = params.iter().filter(|p| !p.indexed).count();
    if words < data_fields {
        return Err(SdkError::AbiDecode(format!(
            "log data has {} words, event needs {}",
            words, data_fields
        )));
    }

    let topics = log.topics.get(1..).unwrap_or_default();
    let indexed_fields = params.len() - data_fields;
    if topics.len() < indexed_fields {
        return Err(SdkError::AbiDecode(format!(
            "log has {} indexed topics, event needs {}",
            topics.len(),
            indexed_fields
        )));
    }

    let mut out = Vec::with_capacity(params.len());
    let mut word = 0;
    let mut topic = 0;
    for param in params {
        let value = if param.indexed {
            let t = &topics[topic];
            topic += 1;
            decode_topic(&param.kind, t)?
        } else {
            if param.kind.is_dynamic() {
                return Err(SdkError::AbiDecode(format!(
                    "non-indexed field {} has dynamic type {}",
                    param.name, param.kind
                )));
            }
            let chunk = &log.data[word * 32..(word + 1) * 32];
            word += 1;
            decode_word(&param.kind, chunk)?
        };
        out.push((param.name.clone(), value));
    }

    Ok(out)
}

fn decode_topic(kind: &ParamType, topic: &H256) -> Result<Token, SdkError> {
    if kind.is_dynamic() {
        return Ok(Token::FixedBytes(topic.as_bytes().to_vec()));
    }
    decode_word(kind, topic.as_bytes())
}

fn decode_word(kind: &ParamType, word: &[u8]) -> Result<Token, SdkError> {
    decode(std::slice::from_ref(kind), word)?
        .pop()
        .ok_or_else(|| SdkError::AbiDecode("empty decode".to_string()))
}
