//! ABI encoding and decoding for Solidity contracts
//!
//! This module provides functionality for:
//! - Encoding function calls from their canonical signature
//! - Decoding function return values
//! - Decoding event logs against a field schema
//!
//! # Example
//!
//! ```rust
//! use mintbridge_sdk::abi::{decode_return, encode_call, ParamType, Token};
//! use mintbridge_primitives::U256;
//!
//! let data = encode_call("placeBid(uint256)", &[Token::Uint(U256::from(7))]).unwrap();
//! assert_eq!(data.len(), 4 + 32);
//!
//! let mut ret = [0u8; 32];
//! ret[31] = 1;
//! let active = decode_return(&[ParamType::Bool], &ret).unwrap();
//! assert_eq!(active, vec![Token::Bool(true)]);
//! ```

mod decode;
mod encode;
mod event;
mod types;

pub use decode::{decode, decode_return};
pub use encode::{encode, encode_call, parse_signature, parse_type};
pub use event::{decode_event_log, event_signature, EventParam};
pub use types::{I256, ParamType, Token};
