use crate::models::{CandleRequest, OrderFilter, ProductFilter, TickerFilter};
use async_trait::async_trait;
use serde_json::Value;

// ---------------------------------------------------------------------------
// Exchange API
// ---------------------------------------------------------------------------

/// Errors raised by an exchange REST collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Transport(String),
    #[error("Exchange returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Failed to decode response: {0}")]
    Decode(String),
    #[error("Delta API key and secret required")]
    MissingCredentials,
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// The REST surface the probe needs from an exchange client.
///
/// Responses are returned as raw JSON so callers decide how to interpret
/// them; Delta wraps most payloads as `{"success": .., "result": ..}`.
#[async_trait]
pub trait ExchangeApi: Send + Sync {
    /// Whether signed endpoints can be called.
    fn authenticated(&self) -> bool;

    /// `GET /v2/tickers/{symbol}`.
    async fn ticker(&self, symbol: &str) -> Result<Value, ApiError>;

    /// `GET /v2/tickers`.
    async fn tickers(&self, filter: &TickerFilter) -> Result<Value, ApiError>;

    /// `GET /v2/products`, one page per call.
    async fn products(&self, filter: &ProductFilter) -> Result<Value, ApiError>;

    /// `GET /v2/products/{symbol}`.
    async fn product(&self, symbol: &str) -> Result<Value, ApiError>;

    /// `GET /v2/l2orderbook/{symbol}`.
    async fn orderbook(&self, symbol: &str, depth: Option<u32>) -> Result<Value, ApiError>;

    /// `GET /v2/history/candles`.
    async fn candles(&self, request: &CandleRequest) -> Result<Value, ApiError>;

    /// `GET /v2/wallet/balances` (signed).
    async fn wallet_balances(&self) -> Result<Value, ApiError>;

    /// `GET /v2/orders` (signed).
    async fn open_orders(&self, filter: &OrderFilter) -> Result<Value, ApiError>;
}
