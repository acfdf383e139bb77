//! Bindings for the two deployed contracts.
//!
//! Writes are exposed as calldata encoders (the broadcaster submits them);
//! reads go straight through `eth_call` at the latest block.

use bytes::Bytes;
use mintbridge_primitives::{Address, U256};
use mintbridge_sdk::abi::{decode_return, encode_call, ParamType, Token};
use mintbridge_sdk::quantity::{u256_dec, u256_dec_vec};
use mintbridge_sdk::types::{BlockId, CallRequest};
use mintbridge_sdk::LedgerClient;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Canonical method signatures
pub mod methods {
    /// NFT contract: mint a standalone token to an address
    pub const MINT_NFT: &str = "mintNFT(address,string)";
    /// NFT contract: open a new edition
    pub const CREATE_EDITION: &str = "createEdition(uint256,uint8,string)";
    /// NFT contract: mint the next token of an edition
    pub const MINT_EDITION: &str = "mintEdition(uint256)";
    /// NFT contract: edition record
    pub const GET_EDITION_DETAILS: &str = "getEditionDetails(uint256)";
    /// NFT contract: edition id and number of a token
    pub const GET_TOKEN_EDITION_NUMBER: &str = "getTokenEditionNumber(uint256)";
    /// NFT contract: metadata URI
    pub const TOKEN_URI: &str = "tokenURI(uint256)";

    /// Auction contract: open an auction for `duration` seconds
    pub const CREATE_AUCTION: &str = "createAuction(uint256,uint256)";
    /// Auction contract: bid with attached value
    pub const PLACE_BID: &str = "placeBid(uint256)";
    /// Auction contract: settle
    pub const END_AUCTION: &str = "endAuction(uint256)";
    /// Auction contract: whether an auction for the NFT is live
    pub const IS_NFT_IN_ACTIVE_AUCTION: &str = "isNFTInActiveAuction(uint256)";
    /// Auction contract: public mapping getter
    pub const AUCTIONS: &str = "auctions(uint256)";
    /// Auction contract: auction record
    pub const GET_AUCTION_DETAILS: &str = "getAuctionDetails(uint256)";
    /// Auction contract: index-aligned bid arrays
    pub const GET_BID_HISTORY: &str = "getBidHistory(uint256)";
}

/// Edition record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edition {
    /// Tokens the edition may ever hold
    #[serde(with = "u256_dec")]
    pub max_supply: U256,
    /// Tokens minted so far
    #[serde(with = "u256_dec")]
    pub current_supply: U256,
    /// Rarity tier
    #[serde(with = "u256_dec")]
    pub rarity: U256,
    /// First edition flag
    pub is_first_edition: bool,
    /// Base metadata URI
    #[serde(rename = "baseURI")]
    pub base_uri: String,
}

/// Edition membership of a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenEdition {
    /// Edition id
    #[serde(with = "u256_dec")]
    pub edition_id: U256,
    /// 1-based position within the edition
    #[serde(with = "u256_dec")]
    pub edition_number: U256,
}

/// Auction record as stored by the auction contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    /// Auctioned token
    #[serde(with = "u256_dec")]
    pub nft_id: U256,
    /// Account that opened the auction
    pub creator: Address,
    /// Unix seconds
    #[serde(with = "u256_dec")]
    pub start_time: U256,
    /// Unix seconds
    #[serde(with = "u256_dec")]
    pub end_time: U256,
    /// Zero address when there are no bids
    pub highest_bidder: Address,
    /// Wei
    #[serde(with = "u256_dec")]
    pub highest_bid: U256,
    /// Maintained by the contract
    pub is_active: bool,
}

/// Bids on an auction, index-aligned
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidHistory {
    /// Bidder per bid
    pub bidders: Vec<Address>,
    /// Wei per bid
    #[serde(with = "u256_dec_vec")]
    pub amounts: Vec<U256>,
    /// Unix seconds per bid
    #[serde(with = "u256_dec_vec")]
    pub timestamps: Vec<U256>,
}

/// Sequential reader over decoded return values
struct Returned {
    method: &'static str,
    tokens: std::vec::IntoIter<Token>,
}

impl Returned {
    fn next(&mut self) -> CoreResult<Token> {
        self.tokens
            .next()
            .ok_or_else(|| CoreError::AbiDecode(format!("{}: missing return value", self.method)))
    }

    fn mismatch(&self, want: &str) -> CoreError {
        CoreError::AbiDecode(format!("{}: expected {}", self.method, want))
    }

    fn uint(&mut self) -> CoreResult<U256> {
        let token = self.next()?;
        token.into_uint().ok_or_else(|| self.mismatch("uint"))
    }

    fn address(&mut self) -> CoreResult<Address> {
        let token = self.next()?;
        token.into_address().ok_or_else(|| self.mismatch("address"))
    }

    fn boolean(&mut self) -> CoreResult<bool> {
        let token = self.next()?;
        token.into_bool().ok_or_else(|| self.mismatch("bool"))
    }

    fn string(&mut self) -> CoreResult<String> {
        let token = self.next()?;
        token.into_string().ok_or_else(|| self.mismatch("string"))
    }

    fn array<T>(&mut self, f: fn(Token) -> Option<T>, want: &str) -> CoreResult<Vec<T>> {
        let items = self.next()?.into_array().ok_or_else(|| self.mismatch(want))?;
        items
            .into_iter()
            .map(|t| f(t).ok_or_else(|| self.mismatch(want)))
            .collect()
    }
}

async fn read(
    client: &LedgerClient,
    to: Address,
    method: &'static str,
    args: &[Token],
    types: &[ParamType],
) -> CoreResult<Returned> {
    let data = encode_call(method, args)?;
    let ret = client.call(&CallRequest::new(to, data), BlockId::Latest).await?;
    let tokens = decode_return(types, &ret)?;
    Ok(Returned {
        method,
        tokens: tokens.into_iter(),
    })
}

fn uint_arg(value: U256) -> Token {
    Token::Uint(value)
}

fn auction_record_types() -> Vec<ParamType> {
    vec![
        ParamType::Uint(256),
        ParamType::Address,
        ParamType::Uint(256),
        ParamType::Uint(256),
        ParamType::Address,
        ParamType::Uint(256),
        ParamType::Bool,
    ]
}

fn read_auction(mut ret: Returned) -> CoreResult<Auction> {
    Ok(Auction {
        nft_id: ret.uint()?,
        creator: ret.address()?,
        start_time: ret.uint()?,
        end_time: ret.uint()?,
        highest_bidder: ret.address()?,
        highest_bid: ret.uint()?,
        is_active: ret.boolean()?,
    })
}

/// Edition-capable ERC-721 contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NftContract {
    address: Address,
}

impl NftContract {
    /// Bind to a deployed address
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    /// Deployed address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Calldata for `mintNFT(to, uri)`
    pub fn encode_mint_nft(&self, to: Address, uri: &str) -> CoreResult<Bytes> {
        let data = encode_call(methods::MINT_NFT, &[Token::Address(to), Token::String(uri.to_string())])?;
        Ok(Bytes::from(data))
    }

    /// Calldata for `createEdition(maxSupply, rarity, baseURI)`
    pub fn encode_create_edition(&self, max_supply: U256, rarity: u8, base_uri: &str) -> CoreResult<Bytes> {
        let data = encode_call(
            methods::CREATE_EDITION,
            &[
                uint_arg(max_supply),
                uint_arg(U256::from(rarity)),
                Token::String(base_uri.to_string()),
            ],
        )?;
        Ok(Bytes::from(data))
    }

    /// Calldata for `mintEdition(editionId)`
    pub fn encode_mint_edition(&self, edition_id: U256) -> CoreResult<Bytes> {
        Ok(Bytes::from(encode_call(methods::MINT_EDITION, &[uint_arg(edition_id)])?))
    }

    /// `getEditionDetails(editionId)`
    pub async fn edition_details(&self, client: &LedgerClient, edition_id: U256) -> CoreResult<Edition> {
        let types = [
            ParamType::Uint(256),
            ParamType::Uint(256),
            ParamType::Uint(256),
            ParamType::Bool,
            ParamType::String,
        ];
        let mut ret = read(client, self.address, methods::GET_EDITION_DETAILS, &[uint_arg(edition_id)], &types).await?;
        Ok(Edition {
            max_supply: ret.uint()?,
            current_supply: ret.uint()?,
            rarity: ret.uint()?,
            is_first_edition: ret.boolean()?,
            base_uri: ret.string()?,
        })
    }

    /// `getTokenEditionNumber(tokenId)`
    pub async fn token_edition(&self, client: &LedgerClient, token_id: U256) -> CoreResult<TokenEdition> {
        let types = [ParamType::Uint(256), ParamType::Uint(256)];
        let mut ret = read(
            client,
            self.address,
            methods::GET_TOKEN_EDITION_NUMBER,
            &[uint_arg(token_id)],
            &types,
        )
        .await?;
        Ok(TokenEdition {
            edition_id: ret.uint()?,
            edition_number: ret.uint()?,
        })
    }

    /// `tokenURI(tokenId)`
    pub async fn token_uri(&self, client: &LedgerClient, token_id: U256) -> CoreResult<String> {
        let mut ret = read(client, self.address, methods::TOKEN_URI, &[uint_arg(token_id)], &[ParamType::String]).await?;
        ret.string()
    }
}

/// Timed auction contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuctionContract {
    address: Address,
}

impl AuctionContract {
    /// Bind to a deployed address
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    /// Deployed address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Calldata for `createAuction(nftId, durationSeconds)`
    pub fn encode_create_auction(&self, nft_id: U256, duration_secs: u64) -> CoreResult<Bytes> {
        let data = encode_call(
            methods::CREATE_AUCTION,
            &[uint_arg(nft_id), uint_arg(U256::from(duration_secs))],
        )?;
        Ok(Bytes::from(data))
    }

    /// Calldata for `placeBid(nftId)`; the bid travels as transaction value
    pub fn encode_place_bid(&self, nft_id: U256) -> CoreResult<Bytes> {
        Ok(Bytes::from(encode_call(methods::PLACE_BID, &[uint_arg(nft_id)])?))
    }

    /// Calldata for `endAuction(nftId)`
    pub fn encode_end_auction(&self, nft_id: U256) -> CoreResult<Bytes> {
        Ok(Bytes::from(encode_call(methods::END_AUCTION, &[uint_arg(nft_id)])?))
    }

    /// `isNFTInActiveAuction(nftId)`
    pub async fn is_in_active_auction(&self, client: &LedgerClient, nft_id: U256) -> CoreResult<bool> {
        let mut ret = read(
            client,
            self.address,
            methods::IS_NFT_IN_ACTIVE_AUCTION,
            &[uint_arg(nft_id)],
            &[ParamType::Bool],
        )
        .await?;
        ret.boolean()
    }

    /// `auctions(nftId)` mapping getter
    pub async fn auction(&self, client: &LedgerClient, nft_id: U256) -> CoreResult<Auction> {
        let ret = read(client, self.address, methods::AUCTIONS, &[uint_arg(nft_id)], &auction_record_types()).await?;
        read_auction(ret)
    }

    /// `getAuctionDetails(nftId)`
    pub async fn auction_details(&self, client: &LedgerClient, nft_id: U256) -> CoreResult<Auction> {
        let ret = read(
            client,
            self.address,
            methods::GET_AUCTION_DETAILS,
            &[uint_arg(nft_id)],
            &auction_record_types(),
        )
        .await?;
        read_auction(ret)
    }

    /// `getBidHistory(nftId)`
    pub async fn bid_history(&self, client: &LedgerClient, nft_id: U256) -> CoreResult<BidHistory> {
        let types = [
            ParamType::Array(Box::new(ParamType::Address)),
            ParamType::Array(Box::new(ParamType::Uint(256))),
            ParamType::Array(Box::new(ParamType::Uint(256))),
        ];
        let mut ret = read(client, self.address, methods::GET_BID_HISTORY, &[uint_arg(nft_id)], &types).await?;
        let history = BidHistory {
            bidders: ret.array(Token::into_address, "address[]")?,
            amounts: ret.array(Token::into_uint, "uint256[]")?,
            timestamps: ret.array(Token::into_uint, "uint256[]")?,
        };
        if history.amounts.len() != history.bidders.len() || history.timestamps.len() != history.bidders.len() {
            return Err(CoreError::AbiDecode(format!(
                "{}: arrays are not index-aligned",
                methods::GET_BID_HISTORY
            )));
        }
        Ok(history)
    }
}
