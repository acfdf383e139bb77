//! # mintbridge-server
//!
//! HTTP front end for the mintbridge engine: configuration loading, the
//! axum route table and the response envelope.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod config;
mod error;
pub mod http;

pub use cli::Cli;
pub use config::{Config, ConfigError};
pub use error::{ServerError, ServerResult};
pub use http::{routes, ApiServer, ServerConfig};
