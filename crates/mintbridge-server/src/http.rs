//! HTTP API
//!
//! Every response is a JSON object with a `success` flag. Successful
//! responses add their payload fields next to it; failures carry `error`.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use mintbridge_core::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::error::{ServerError, ServerResult};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: SocketAddr,
    /// Maximum request body size (default: 1MB)
    pub max_body_size: usize,
    /// Enable CORS (default: true)
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 4000)),
            max_body_size: 1024 * 1024,
            enable_cors: true,
        }
    }
}

impl ServerConfig {
    /// Create a new server config with the given address
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            ..Default::default()
        }
    }
}

/// API HTTP server
pub struct ApiServer {
    config: ServerConfig,
    engine: Arc<Engine>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: ServerConfig, engine: Arc<Engine>) -> Self {
        Self { config, engine }
    }

    /// Routes plus tracing, body limit and CORS layers
    pub fn build_router(&self) -> Router {
        let mut router = routes(self.engine.clone()).layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(self.config.max_body_size)),
        );

        if self.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        router
    }

    /// Serve until `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.build_router();

        let listener = TcpListener::bind(self.config.listen_addr).await?;
        tracing::info!("API server listening on {}", self.config.listen_addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }

    /// Get the server listen address
    pub fn listen_addr(&self) -> SocketAddr {
        self.config.listen_addr
    }
}

/// Route table without middleware
pub fn routes(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/api/mint", post(mint_nft))
        .route("/mint", post(mint_edition))
        .route("/editions", post(create_edition))
        .route("/editions/:edition_id", get(edition_details))
        .route("/editions/:edition_id/mint", post(mint_from_edition))
        .route("/token/:token_id/edition", get(token_edition))
        .route("/token/:token_id/uri", get(token_uri))
        .route("/create-auction", post(create_auction))
        .route("/auctions/:nft_id", get(auction_details))
        .route("/auctions/:nft_id/active", get(auction_active))
        .route("/auctions/:nft_id/bids", get(bid_history))
        .route("/auctions/:nft_id/bid", post(place_bid))
        .route("/auctions/:nft_id/end", post(end_auction))
        .route("/active-auctions", get(active_auctions))
        .with_state(engine)
}

type ApiResult = ServerResult<Json<Value>>;

/// A request value sent either as a JSON string or a JSON number
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// `"12"`
    Text(String),
    /// `12`, `0.5`
    Number(serde_json::Number),
}

impl Scalar {
    /// The value as text for domain parsing
    pub fn as_text(&self) -> String {
        match self {
            Scalar::Text(s) => s.clone(),
            Scalar::Number(n) => n.to_string(),
        }
    }
}

/// Missing fields become empty strings, which the engine rejects by name
fn text(value: &Option<Scalar>) -> String {
    value.as_ref().map(Scalar::as_text).unwrap_or_default()
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ServerResult<T> {
    payload.map(|Json(body)| body).map_err(ServerError::from)
}

/// `{"success": true}` merged with the fields of `payload`
fn success(payload: Value) -> Json<Value> {
    let mut out = serde_json::Map::new();
    out.insert("success".into(), Value::Bool(true));
    if let Value::Object(fields) = payload {
        out.extend(fields);
    }
    Json(Value::Object(out))
}

// ==================== Writes ====================

#[derive(Debug, Deserialize)]
struct MintNftBody {
    #[serde(rename = "tokenURI")]
    token_uri: Option<String>,
}

async fn mint_nft(
    State(engine): State<Arc<Engine>>,
    payload: Result<Json<MintNftBody>, JsonRejection>,
) -> ApiResult {
    let req = body(payload)?;
    let receipt = engine.mint_nft(req.token_uri.as_deref().unwrap_or_default()).await?;
    Ok(success(json!({ "receipt": receipt })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MintEditionBody {
    edition_id: Option<Scalar>,
}

async fn mint_edition(
    State(engine): State<Arc<Engine>>,
    payload: Result<Json<MintEditionBody>, JsonRejection>,
) -> ApiResult {
    let req = body(payload)?;
    let minted = engine.mint_edition(&text(&req.edition_id)).await?;
    Ok(success(json!(minted)))
}

async fn mint_from_edition(
    State(engine): State<Arc<Engine>>,
    Path(edition_id): Path<String>,
) -> ApiResult {
    let minted = engine.mint_edition(&edition_id).await?;
    Ok(success(json!({ "tokenId": minted })))
}

#[derive(Debug, Deserialize)]
struct CreateEditionBody {
    #[serde(rename = "maxSupply")]
    max_supply: Option<Scalar>,
    rarity: Option<Scalar>,
    #[serde(rename = "baseURI")]
    base_uri: Option<String>,
}

async fn create_edition(
    State(engine): State<Arc<Engine>>,
    payload: Result<Json<CreateEditionBody>, JsonRejection>,
) -> ApiResult {
    let req = body(payload)?;
    let created = engine
        .create_edition(
            &text(&req.max_supply),
            &text(&req.rarity),
            req.base_uri.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(success(json!({
        "transactionHash": created.transaction_hash,
        "data": {
            "editionId": created.edition_id.to_string(),
            "availableTokens": created.available_tokens.to_string(),
        },
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAuctionBody {
    nft_id: Option<Scalar>,
    min_bid: Option<Scalar>,
    duration: Option<Scalar>,
}

async fn create_auction(
    State(engine): State<Arc<Engine>>,
    payload: Result<Json<CreateAuctionBody>, JsonRejection>,
) -> ApiResult {
    let req = body(payload)?;
    let min_bid = req.min_bid.as_ref().map(Scalar::as_text);
    let opened = engine
        .create_auction(&text(&req.nft_id), min_bid.as_deref(), &text(&req.duration))
        .await?;
    Ok(success(json!({
        "receipt": opened.receipt,
        "auction": opened.auction,
    })))
}

#[derive(Debug, Deserialize)]
struct BidBody {
    amount: Option<Scalar>,
}

async fn place_bid(
    State(engine): State<Arc<Engine>>,
    Path(nft_id): Path<String>,
    payload: Result<Json<BidBody>, JsonRejection>,
) -> ApiResult {
    let req = body(payload)?;
    let receipt = engine.place_bid(&nft_id, &text(&req.amount)).await?;
    Ok(success(json!({ "receipt": receipt })))
}

async fn end_auction(State(engine): State<Arc<Engine>>, Path(nft_id): Path<String>) -> ApiResult {
    let receipt = engine.end_auction(&nft_id).await?;
    Ok(success(json!({ "receipt": receipt })))
}

// ==================== Reads ====================

async fn edition_details(
    State(engine): State<Arc<Engine>>,
    Path(edition_id): Path<String>,
) -> ApiResult {
    let details = engine.edition_details(&edition_id).await?;
    Ok(success(json!({ "details": details })))
}

async fn token_edition(State(engine): State<Arc<Engine>>, Path(token_id): Path<String>) -> ApiResult {
    let edition_info = engine.token_edition(&token_id).await?;
    Ok(success(json!({ "editionInfo": edition_info })))
}

async fn token_uri(State(engine): State<Arc<Engine>>, Path(token_id): Path<String>) -> ApiResult {
    let uri = engine.token_uri(&token_id).await?;
    Ok(success(json!({ "uri": uri })))
}

async fn auction_details(State(engine): State<Arc<Engine>>, Path(nft_id): Path<String>) -> ApiResult {
    let details = engine.auction_details(&nft_id).await?;
    Ok(success(json!({ "details": details })))
}

async fn auction_active(State(engine): State<Arc<Engine>>, Path(nft_id): Path<String>) -> ApiResult {
    let is_active = engine.is_in_active_auction(&nft_id).await?;
    Ok(success(json!({ "isActive": is_active })))
}

async fn bid_history(State(engine): State<Arc<Engine>>, Path(nft_id): Path<String>) -> ApiResult {
    let history = engine.bid_history(&nft_id).await?;
    Ok(success(json!({ "history": history })))
}

async fn active_auctions(State(engine): State<Arc<Engine>>) -> ApiResult {
    let active = engine.active_auctions().await?;
    Ok(success(json!({
        "auctions": active.auctions,
        "failures": active.failures,
    })))
}
