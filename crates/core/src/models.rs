use crate::payload::result_of;
use crate::traits::ApiError;
use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

/// One asset row of `GET /v2/wallet/balances`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WalletBalance {
    pub asset_symbol: String,
    #[serde(default)]
    pub balance: Decimal,
    #[serde(default)]
    pub available_balance: Decimal,
}

impl fmt::Display for WalletBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<8} balance={} available={}",
            self.asset_symbol, self.balance, self.available_balance
        )
    }
}

// ---------------------------------------------------------------------------
// Candles
// ---------------------------------------------------------------------------

/// One OHLCV row of `GET /v2/history/candles`. `time` is Unix seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    #[serde(default)]
    pub volume: Decimal,
}

impl Candle {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.time, 0)
    }
}

impl fmt::Display for Candle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.timestamp() {
            Some(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M"))?,
            None => write!(f, "{}", self.time)?,
        }
        write!(
            f,
            " O={} H={} L={} C={} V={}",
            self.open, self.high, self.low, self.close, self.volume
        )
    }
}

/// Candle resolutions accepted by the history endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    M1,
    M5,
    M15,
    H1,
    D1,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::M1 => "1m",
            Resolution::M5 => "5m",
            Resolution::M15 => "15m",
            Resolution::H1 => "1h",
            Resolution::D1 => "1d",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1m" => Ok(Resolution::M1),
            "5m" => Ok(Resolution::M5),
            "15m" => Ok(Resolution::M15),
            "1h" => Ok(Resolution::H1),
            "1d" => Ok(Resolution::D1),
            other => Err(format!(
                "unsupported resolution '{}' (expected 1m, 5m, 15m, 1h or 1d)",
                other
            )),
        }
    }
}

/// Parameters for `GET /v2/history/candles`. `start`/`end` are Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandleRequest {
    pub symbol: String,
    pub resolution: Resolution,
    pub start: i64,
    pub end: i64,
}

impl CandleRequest {
    /// The window ending at `end` and spanning `hours`.
    ///
    /// Fails with `InvalidRequest` for a negative span or one that reaches
    /// past the representable date range.
    pub fn ending_at(
        symbol: &str,
        resolution: Resolution,
        end: DateTime<Utc>,
        hours: i64,
    ) -> Result<Self, ApiError> {
        if hours < 0 {
            return Err(ApiError::InvalidRequest(format!(
                "Candle window must not be negative ({} hours)",
                hours
            )));
        }
        let start = TimeDelta::try_hours(hours)
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or_else(|| {
                ApiError::InvalidRequest(format!("Candle window of {} hours is out of range", hours))
            })?;
        Ok(Self {
            symbol: symbol.to_string(),
            resolution,
            start: start.timestamp(),
            end: end.timestamp(),
        })
    }

    /// The window ending now and spanning `hours`.
    pub fn last_hours(symbol: &str, resolution: Resolution, hours: i64) -> Result<Self, ApiError> {
        Self::ending_at(symbol, resolution, Utc::now(), hours)
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("resolution", self.resolution.as_str().to_string()),
            ("symbol", self.symbol.clone()),
            ("start", self.start.to_string()),
            ("end", self.end.to_string()),
        ]
    }
}

// ---------------------------------------------------------------------------
// Query filters
// ---------------------------------------------------------------------------

/// Optional filters for `GET /v2/tickers`. Values are comma-separated lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickerFilter {
    pub contract_types: Option<String>,
    pub underlying_asset_symbols: Option<String>,
}

impl TickerFilter {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(types) = &self.contract_types {
            pairs.push(("contract_types", types.clone()));
        }
        if let Some(symbols) = &self.underlying_asset_symbols {
            pairs.push(("underlying_asset_symbols", symbols.clone()));
        }
        pairs
    }
}

/// Optional filters and cursor for `GET /v2/products`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub contract_types: Option<String>,
    pub states: Option<String>,
    pub page_size: Option<u32>,
    /// Pagination cursor from the previous page's `meta.after`.
    pub after: Option<String>,
}

impl ProductFilter {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(types) = &self.contract_types {
            pairs.push(("contract_types", types.clone()));
        }
        if let Some(states) = &self.states {
            pairs.push(("states", states.clone()));
        }
        if let Some(size) = self.page_size {
            pairs.push(("page_size", size.to_string()));
        }
        if let Some(after) = &self.after {
            pairs.push(("after", after.clone()));
        }
        pairs
    }
}

/// Optional filters for `GET /v2/orders`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub product_ids: Option<String>,
    pub states: Option<String>,
}

impl OrderFilter {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(ids) = &self.product_ids {
            pairs.push(("product_ids", ids.clone()));
        }
        if let Some(states) = &self.states {
            pairs.push(("states", states.clone()));
        }
        pairs
    }
}

// ---------------------------------------------------------------------------
// Orderbook
// ---------------------------------------------------------------------------

/// Resting size on each side of an L2 book and the bid share of the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderbookImbalance {
    pub bid_volume: Decimal,
    pub ask_volume: Decimal,
    /// `bid / (bid + ask)` rounded to 3 places; 0.5 for an empty book.
    pub ratio: Decimal,
}

impl OrderbookImbalance {
    /// Compute from a `GET /v2/l2orderbook` payload (enveloped or bare).
    ///
    /// Returns `None` when the payload has no `buy`/`sell` object to read.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let book = result_of(payload).as_object()?;
        if !book.contains_key("buy") && !book.contains_key("sell") {
            return None;
        }

        let bid_volume = side_volume(book.get("buy"));
        let ask_volume = side_volume(book.get("sell"));
        let total = bid_volume + ask_volume;
        let ratio = if total.is_zero() {
            Decimal::new(5, 1)
        } else {
            (bid_volume / total).round_dp(3)
        };

        Some(Self {
            bid_volume,
            ask_volume,
            ratio,
        })
    }
}

impl fmt::Display for OrderbookImbalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bid_vol={} ask_vol={} imbalance_ratio={}",
            self.bid_volume.round_dp(2),
            self.ask_volume.round_dp(2),
            self.ratio
        )
    }
}

fn side_volume(levels: Option<&Value>) -> Decimal {
    levels
        .and_then(Value::as_array)
        .map(|levels| {
            levels
                .iter()
                .filter_map(|level| level.get("size").and_then(decimal_from_value))
                .sum()
        })
        .unwrap_or(Decimal::ZERO)
}

/// Read a decimal from a JSON number or numeric string.
pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Some(Decimal::from(u))
            } else {
                n.as_f64().and_then(Decimal::from_f64)
            }
        }
        _ => None,
    }
}
