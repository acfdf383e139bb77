//! ABI decoding

use mintbridge_primitives::{Address, U256};

use super::types::{I256, ParamType, Token};
use crate::SdkError;

/// Decode a parameter list from ABI-encoded data
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, SdkError> {
    decode_params(types, data, 0)
}

/// Decode the return data of a call. An empty payload for a non-empty type
/// list usually means the target has no code or the call reverted silently.
pub fn decode_return(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, SdkError> {
    if data.is_empty() && !types.is_empty() {
        return Err(SdkError::AbiDecode(
            "empty return data (no contract at address or call reverted)".to_string(),
        ));
    }
    decode(types, data)
}

/// Decode a parameter list whose encoding starts at `base`. Dynamic offsets
/// are relative to `base`.
fn decode_params(types: &[ParamType], data: &[u8], base: usize) -> Result<Vec<Token>, SdkError> {
    let mut tokens = Vec::with_capacity(types.len());
    let mut head = base;

    for param_type in types {
        let token = if param_type.is_dynamic() {
            let offset = read_usize(data, head)?;
            let at = base
                .checked_add(offset)
                .ok_or_else(|| SdkError::AbiDecode("offset overflow".to_string()))?;
            decode_value(param_type, data, at)?
        } else {
            decode_value(param_type, data, head)?
        };
        tokens.push(token);
        head += param_type.head_length();
    }

    Ok(tokens)
}

/// Decode one value whose encoding starts at `at`
fn decode_value(param_type: &ParamType, data: &[u8], at: usize) -> Result<Token, SdkError> {
    match param_type {
        ParamType::Address => {
            let word = read_word(data, at)?;
            Ok(Token::Address(Address::from_word(&word)))
        }
        ParamType::Uint(_) => Ok(Token::Uint(U256::from_big_endian(&read_word(data, at)?))),
        ParamType::Int(_) => {
            let word = U256::from_big_endian(&read_word(data, at)?);
            Ok(Token::Int(I256::from_twos_complement(word)))
        }
        ParamType::Bool => {
            let word = read_word(data, at)?;
            Ok(Token::Bool(word[31] != 0))
        }
        ParamType::FixedBytes(size) => {
            let word = read_word(data, at)?;
            Ok(Token::FixedBytes(word[..*size].to_vec()))
        }
        ParamType::Bytes => Ok(Token::Bytes(decode_bytes(data, at)?)),
        ParamType::String => {
            let bytes = decode_bytes(data, at)?;
            let s = String::from_utf8(bytes)
                .map_err(|e| SdkError::AbiDecode(format!("Invalid UTF-8: {}", e)))?;
            Ok(Token::String(s))
        }
        ParamType::Array(inner) => {
            let len = read_usize(data, at)?;
            // Every element occupies at least one word
            check_length(data, at + 32 + len.saturating_mul(32))?;
            let inner_types = vec![(**inner).clone(); len];
            Ok(Token::Array(decode_params(&inner_types, data, at + 32)?))
        }
        ParamType::FixedArray(inner, size) => {
            let inner_types = vec![(**inner).clone(); *size];
            Ok(Token::FixedArray(decode_params(&inner_types, data, at)?))
        }
        ParamType::Tuple(types) => Ok(Token::Tuple(decode_params(types, data, at)?)),
    }
}

fn decode_bytes(data: &[u8], at: usize) -> Result<Vec<u8>, SdkError> {
    let len = read_usize(data, at)?;
    let start = at + 32;
    let end = start
        .checked_add(len)
        .ok_or_else(|| SdkError::AbiDecode("length overflow".to_string()))?;
    check_length(data, end)?;
    Ok(data[start..end].to_vec())
}

fn read_word(data: &[u8], at: usize) -> Result<[u8; 32], SdkError> {
    let end = at
        .checked_add(32)
        .ok_or_else(|| SdkError::AbiDecode("offset overflow".to_string()))?;
    check_length(data, end)?;
    let mut word = [0u8; 32];
    word.copy_from_slice(&data[at..end]);
    Ok(word)
}

/// Read a word used as an offset or length
fn read_usize(data: &[u8], at: usize) -> Result<usize, SdkError> {
    let value = U256::from_big_endian(&read_word(data, at)?);
    if value > U256::from(u32::MAX) {
        return Err(SdkError::AbiDecode(format!("offset or length too large: {}", value)));
    }
    Ok(value.low_u64() as usize)
}

/// Check that data has at least `required` bytes
fn check_length(data: &[u8], required: usize) -> Result<(), SdkError> {
    if data.len() < required {
        return Err(SdkError::AbiDecode(format!(
            "Insufficient data: need {} bytes, have {}",
            required,
            data.len()
        )));
    }
    Ok(())
}
