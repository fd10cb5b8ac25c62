//! Delta Exchange broker adapter.
//!
//! REST client for the Delta Exchange (India) v2 API. Public market data
//! needs no credentials; wallet and order queries are signed.

pub mod signing;

use async_trait::async_trait;
use deltaprobe_core::{
    ApiError, CandleRequest, ClientConfig, ExchangeApi, OrderFilter, ProductFilter, TickerFilter,
};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Url};
use serde_json::{Map, Value};

const USER_AGENT: &str = concat!("deltaprobe/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an unparseable body echoed back in errors.
const BODY_SNIPPET_LEN: usize = 200;

/// REST client for Delta Exchange.
#[derive(Debug, Clone)]
pub struct DeltaRestClient {
    config: ClientConfig,
    http: Client,
}

impl DeltaRestClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self { config, http })
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}{}", self.config.base_url, path))
            .map_err(|e| ApiError::InvalidRequest(format!("Bad URL for {}: {}", path, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    async fn get_public(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        let url = self.url(path, query)?;
        let request = self.http.get(url).header(ACCEPT, "application/json");
        self.execute(path, request).await
    }

    async fn get_signed(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        if !self.authenticated() {
            return Err(ApiError::MissingCredentials);
        }

        let url = self.url(path, query)?;
        // Sign exactly the query string that goes on the wire.
        let query_string = url.query().map(|q| format!("?{}", q)).unwrap_or_default();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = signing::sign(
            &self.config.api_secret,
            "GET",
            &timestamp,
            path,
            &query_string,
            "",
        )?;

        let request = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .header("api-key", &self.config.api_key)
            .header("timestamp", timestamp)
            .header("signature", signature);
        self.execute(path, request).await
    }

    async fn execute(&self, path: &str, request: RequestBuilder) -> Result<Value, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        tracing::debug!(
            path,
            status = status.as_u16(),
            bytes = body.len(),
            "Delta response"
        );

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        parse_body(&body)
    }
}

#[async_trait]
impl ExchangeApi for DeltaRestClient {
    fn authenticated(&self) -> bool {
        self.config.has_credentials()
    }

    async fn ticker(&self, symbol: &str) -> Result<Value, ApiError> {
        let path = format!("/v2/tickers/{}", checked_symbol(symbol)?);
        self.get_public(&path, &[]).await
    }

    async fn tickers(&self, filter: &TickerFilter) -> Result<Value, ApiError> {
        self.get_public("/v2/tickers", &filter.query_pairs()).await
    }

    async fn products(&self, filter: &ProductFilter) -> Result<Value, ApiError> {
        self.get_public("/v2/products", &filter.query_pairs()).await
    }

    async fn product(&self, symbol: &str) -> Result<Value, ApiError> {
        let path = format!("/v2/products/{}", checked_symbol(symbol)?);
        self.get_public(&path, &[]).await
    }

    async fn orderbook(&self, symbol: &str, depth: Option<u32>) -> Result<Value, ApiError> {
        let path = format!("/v2/l2orderbook/{}", checked_symbol(symbol)?);
        let query: Vec<(&str, String)> = depth.map(|d| ("depth", d.to_string())).into_iter().collect();
        self.get_public(&path, &query).await
    }

    async fn candles(&self, request: &CandleRequest) -> Result<Value, ApiError> {
        checked_symbol(&request.symbol)?;
        if request.start > request.end {
            return Err(ApiError::InvalidRequest(format!(
                "Candle window starts after it ends ({} > {})",
                request.start, request.end
            )));
        }
        self.get_public("/v2/history/candles", &request.query_pairs()).await
    }

    async fn wallet_balances(&self) -> Result<Value, ApiError> {
        self.get_signed("/v2/wallet/balances", &[]).await
    }

    async fn open_orders(&self, filter: &OrderFilter) -> Result<Value, ApiError> {
        self.get_signed("/v2/orders", &filter.query_pairs()).await
    }
}

/// Symbols are interpolated into the path, so only plain product codes
/// (`BTCUSD`, `C-BTC-65000-280624`) are accepted.
fn checked_symbol(symbol: &str) -> Result<&str, ApiError> {
    let valid = !symbol.is_empty()
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(symbol)
    } else {
        Err(ApiError::InvalidRequest(format!("Invalid symbol: {:?}", symbol)))
    }
}

/// An empty body decodes to `{}`.
fn parse_body(body: &str) -> Result<Value, ApiError> {
    if body.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(body).map_err(|e| {
        let snippet: String = body.chars().take(BODY_SNIPPET_LEN).collect();
        ApiError::Decode(format!("{} (body: {})", e, snippet))
    })
}
