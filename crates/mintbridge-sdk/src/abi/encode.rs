//! ABI encoding

use mintbridge_crypto::function_selector;
use mintbridge_primitives::U256;

use super::types::{ParamType, Token};
use crate::SdkError;

/// Encode `tokens` as the parameter list `types`
pub fn encode(types: &[ParamType], tokens: &[Token]) -> Result<Vec<u8>, SdkError> {
    if types.len() != tokens.len() {
        return Err(SdkError::AbiEncode(format!(
            "expected {} arguments, got {}",
            types.len(),
            tokens.len()
        )));
    }
    for (i, (ty, token)) in types.iter().zip(tokens).enumerate() {
        if !ty.matches(token) {
            return Err(SdkError::AbiEncode(format!(
                "argument {} is not a valid {}: {:?}",
                i, ty, token
            )));
        }
    }
    Ok(encode_params(types, tokens))
}

/// Encode a call from its canonical signature, e.g.
/// `encode_call("createEdition(uint256,uint8,string)", &args)`.
pub fn encode_call(signature: &str, args: &[Token]) -> Result<Vec<u8>, SdkError> {
    let (_, types) = parse_signature(signature)?;
    let mut out = function_selector(signature).to_vec();
    out.extend(encode(&types, args)?);
    Ok(out)
}

/// Split a canonical signature `name(t1,t2,...)` into its name and types
pub fn parse_signature(signature: &str) -> Result<(String, Vec<ParamType>), SdkError> {
    let signature = signature.trim();
    let open = signature
        .find('(')
        .ok_or_else(|| SdkError::AbiEncode(format!("missing '(' in {}", signature)))?;
    if !signature.ends_with(')') {
        return Err(SdkError::AbiEncode(format!("missing ')' in {}", signature)));
    }
    let name = &signature[..open];
    if name.is_empty() {
        return Err(SdkError::AbiEncode(format!("missing name in {}", signature)));
    }
    let inner = &signature[open + 1..signature.len() - 1];
    let types = split_top_level(inner)?
        .into_iter()
        .map(parse_type)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((name.to_string(), types))
}

/// Parse a type string: `uint256`, `address`, `string[]`, `(uint256,bool)`, `bytes32[4]`.
pub fn parse_type(s: &str) -> Result<ParamType, SdkError> {
    let s = s.trim();

    if let Some(stripped) = s.strip_suffix(']') {
        let open = stripped
            .rfind('[')
            .ok_or_else(|| SdkError::AbiEncode(format!("Unknown type: {}", s)))?;
        let inner = parse_type(&stripped[..open])?;
        let size = &stripped[open + 1..];
        return if size.is_empty() {
            Ok(ParamType::Array(Box::new(inner)))
        } else {
            let n = size
                .parse()
                .map_err(|_| SdkError::AbiEncode(format!("Invalid array size: {}", size)))?;
            Ok(ParamType::FixedArray(Box::new(inner), n))
        };
    }

    if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        let types = split_top_level(inner)?
            .into_iter()
            .map(parse_type)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(ParamType::Tuple(types));
    }

    match s {
        "address" => return Ok(ParamType::Address),
        "bool" => return Ok(ParamType::Bool),
        "string" => return Ok(ParamType::String),
        "bytes" => return Ok(ParamType::Bytes),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("uint") {
        return Ok(ParamType::Uint(parse_bits(rest, s)?));
    }
    if let Some(rest) = s.strip_prefix("int") {
        return Ok(ParamType::Int(parse_bits(rest, s)?));
    }
    if let Some(rest) = s.strip_prefix("bytes") {
        let size: usize = rest
            .parse()
            .map_err(|_| SdkError::AbiEncode(format!("Invalid bytes size: {}", rest)))?;
        if size == 0 || size > 32 {
            return Err(SdkError::AbiEncode(format!("Invalid bytes size: {}", size)));
        }
        return Ok(ParamType::FixedBytes(size));
    }

    Err(SdkError::AbiEncode(format!("Unknown type: {}", s)))
}

fn parse_bits(rest: &str, full: &str) -> Result<usize, SdkError> {
    if rest.is_empty() {
        return Ok(256);
    }
    let bits: usize = rest
        .parse()
        .map_err(|_| SdkError::AbiEncode(format!("Invalid integer type: {}", full)))?;
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(SdkError::AbiEncode(format!("Invalid integer type: {}", full)));
    }
    Ok(bits)
}

/// Split on commas not nested inside parentheses
fn split_top_level(s: &str) -> Result<Vec<&str>, SdkError> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        if depth < 0 {
            return Err(SdkError::AbiEncode(format!("Unbalanced parentheses: {}", s)));
        }
    }
    if depth != 0 {
        return Err(SdkError::AbiEncode(format!("Unbalanced parentheses: {}", s)));
    }
    parts.push(&s[start..]);
    Ok(parts)
}

/// Head/tail encoding of a parameter list. Types must already match tokens.
fn encode_params(types: &[ParamType], tokens: &[Token]) -> Vec<u8> {
    let head_size: usize = types.iter().map(ParamType::head_length).sum();

    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();

    for (param_type, token) in types.iter().zip(tokens) {
        if param_type.is_dynamic() {
            let offset = head_size + tail.len();
            head.extend(encode_u256(&U256::from(offset)));
            tail.extend(encode_token(param_type, token));
        } else {
            head.extend(encode_token(param_type, token));
        }
    }

    head.extend(tail);
    head
}

fn encode_token(param_type: &ParamType, token: &Token) -> Vec<u8> {
    match (param_type, token) {
        (ParamType::Address, Token::Address(addr)) => addr.to_word().to_vec(),
        (ParamType::Uint(_), Token::Uint(value)) => encode_u256(value),
        (ParamType::Int(_), Token::Int(value)) => encode_u256(&value.to_twos_complement()),
        (ParamType::Bool, Token::Bool(b)) => encode_u256(&U256::from(*b as u8)),
        (ParamType::FixedBytes(_), Token::FixedBytes(data)) => {
            let mut buf = [0u8; 32];
            buf[..data.len()].copy_from_slice(data);
            buf.to_vec()
        }
        (ParamType::Bytes, Token::Bytes(data)) => encode_bytes(data),
        (ParamType::String, Token::String(s)) => encode_bytes(s.as_bytes()),
        (ParamType::Array(inner), Token::Array(tokens)) => {
            let mut result = encode_u256(&U256::from(tokens.len()));
            let inner_types = vec![(**inner).clone(); tokens.len()];
            result.extend(encode_params(&inner_types, tokens));
            result
        }
        (ParamType::FixedArray(inner, _), Token::FixedArray(tokens)) => {
            let inner_types = vec![(**inner).clone(); tokens.len()];
            encode_params(&inner_types, tokens)
        }
        (ParamType::Tuple(types), Token::Tuple(tokens)) => encode_params(types, tokens),
        // `encode` rejects mismatches before reaching here.
        _ => vec![0u8; 32],
    }
}

fn encode_u256(value: &U256) -> Vec<u8> {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    bytes.to_vec()
}

/// Length word followed by data right-padded to a multiple of 32
fn encode_bytes(data: &[u8]) -> Vec<u8> {
    let mut result = encode_u256(&U256::from(data.len()));
    let padded_len = data.len().div_ceil(32) * 32;
    let mut padded = vec![0u8; padded_len];
    padded[..data.len()].copy_from_slice(data);
    result.extend(padded);
    result
}
