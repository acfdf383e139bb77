//! # mintbridge-core
//!
//! Transaction submission and on-chain state reconstruction.
//!
//! This crate turns domain intents into ledger writes and ledger data back
//! into domain facts:
//! - Serialized, nonce-tracked writes for the operator account ([`broadcast`])
//! - Event registry and receipt log decoding ([`events`])
//! - Typed bindings for the NFT and auction contracts ([`contracts`])
//! - Active auction reconstruction from historical logs ([`auctions`])
//! - The use cases the server exposes ([`Engine`])

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auctions;
pub mod broadcast;
pub mod contracts;
mod error;
pub mod events;
pub mod gas;
mod ops;

pub use auctions::{ActiveAuction, ActiveAuctions, AuctionScanConfig, AuctionScanner, LookbackWindow, ScanFailure};
pub use broadcast::{BroadcastConfig, Broadcaster, WriteRequest};
pub use contracts::{Auction, AuctionContract, BidHistory, Edition, NftContract, TokenEdition};
pub use error::{CoreError, CoreResult};
pub use events::{DecodedEvent, EventKind, EventRegistry};
pub use gas::GasPolicy;
pub use ops::{CreatedEdition, Engine, EngineConfig, MintedToken, OpenedAuction, StartupReport};
