//! Ticker response normalization.
//!
//! Delta endpoints wrap their data as `{"success": true, "result": {...}}`,
//! while some client libraries hand back the inner object directly. The
//! normalizer accepts either, picks the authoritative ticker object and turns
//! it into a one-line summary. Anything it does not recognize is passed
//! through untouched so the caller can print it verbatim.

use crate::traits::ApiError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;

/// Symbol shown when a displayable ticker carries no `symbol` of its own.
pub const DEFAULT_SYMBOL: &str = "BTCUSD";

/// Rendered in place of a missing or null price field.
pub const ABSENT_MARKER: &str = "<absent>";

const RESULT_KEY: &str = "result";
const SYMBOL_KEY: &str = "symbol";
const MARK_PRICE_KEY: &str = "mark_price";
const SPOT_PRICE_KEY: &str = "spot_price";

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

/// Structural classification of a raw ticker payload, decided once up front.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PayloadShape<'a> {
    /// An object with a `result` key. Holds the value found under `result`,
    /// which is not guaranteed to be an object itself.
    Enveloped(&'a Value),
    /// An object without a `result` key: the ticker itself.
    Bare(&'a Map<String, Value>),
    /// Anything that is not a JSON object.
    Unstructured(&'a Value),
}

impl<'a> PayloadShape<'a> {
    pub fn classify(payload: &'a Value) -> Self {
        match payload {
            Value::Object(map) => match map.get(RESULT_KEY) {
                Some(inner) => PayloadShape::Enveloped(inner),
                None => PayloadShape::Bare(map),
            },
            other => PayloadShape::Unstructured(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// The displayable fields of a ticker, already rendered to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerSummary {
    pub symbol: String,
    pub mark_price: Option<String>,
    pub spot_price: Option<String>,
}

impl fmt::Display for TickerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} mark_price={} spot_price={}",
            self.symbol,
            self.mark_price.as_deref().unwrap_or(ABSENT_MARKER),
            self.spot_price.as_deref().unwrap_or(ABSENT_MARKER),
        )
    }
}

/// Result of normalizing a payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized<'a> {
    /// The payload held a recognizable ticker.
    Summary(TickerSummary),
    /// Not displayable; the value to print verbatim. For enveloped payloads
    /// this is the unwrapped `result`, not the envelope.
    PassThrough(&'a Value),
}

impl<'a> Normalized<'a> {
    pub fn is_displayable(&self) -> bool {
        matches!(self, Normalized::Summary(_))
    }

    pub fn summary(&self) -> Option<&TickerSummary> {
        match self {
            Normalized::Summary(summary) => Some(summary),
            Normalized::PassThrough(_) => None,
        }
    }

    pub fn pass_through(&self) -> Option<&'a Value> {
        match self {
            Normalized::Summary(_) => None,
            Normalized::PassThrough(value) => Some(value),
        }
    }
}

impl fmt::Display for Normalized<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Normalized::Summary(summary) => fmt::Display::fmt(summary, f),
            Normalized::PassThrough(value) => f.write_str(&render_raw(value)),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Turns raw ticker payloads into [`Normalized`] values.
#[derive(Debug, Clone)]
pub struct Normalizer {
    fallback_symbol: String,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::with_fallback_symbol(DEFAULT_SYMBOL)
    }

    /// Use `symbol` (typically the one that was requested) when the ticker
    /// does not name itself.
    pub fn with_fallback_symbol(symbol: impl Into<String>) -> Self {
        Self {
            fallback_symbol: symbol.into(),
        }
    }

    /// Normalize a payload. Total and side-effect free.
    pub fn normalize<'a>(&self, payload: &'a Value) -> Normalized<'a> {
        match PayloadShape::classify(payload) {
            PayloadShape::Unstructured(value) => Normalized::PassThrough(value),
            PayloadShape::Bare(ticker) => self
                .summarize(ticker)
                .map_or(Normalized::PassThrough(payload), Normalized::Summary),
            PayloadShape::Enveloped(inner) => inner
                .as_object()
                .and_then(|ticker| self.summarize(ticker))
                .map_or(Normalized::PassThrough(inner), Normalized::Summary),
        }
    }

    /// Build a summary if the ticker has a non-empty `symbol` or a non-null
    /// `mark_price`.
    fn summarize(&self, ticker: &Map<String, Value>) -> Option<TickerSummary> {
        let symbol = ticker
            .get(SYMBOL_KEY)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty());
        let mark_price = render_field(ticker.get(MARK_PRICE_KEY));

        if symbol.is_none() && mark_price.is_none() {
            return None;
        }

        Some(TickerSummary {
            symbol: symbol.unwrap_or(self.fallback_symbol.as_str()).to_string(),
            mark_price,
            spot_price: render_field(ticker.get(SPOT_PRICE_KEY)),
        })
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize with the default fallback symbol.
pub fn normalize(payload: &Value) -> Normalized<'_> {
    Normalizer::new().normalize(payload)
}

/// The authoritative part of a payload: the `result` of an envelope, or the
/// payload itself.
pub fn result_of(payload: &Value) -> &Value {
    match PayloadShape::classify(payload) {
        PayloadShape::Enveloped(inner) => inner,
        PayloadShape::Bare(_) | PayloadShape::Unstructured(_) => payload,
    }
}

/// Decode the authoritative part of a payload into a typed view.
pub fn decode_result<T: DeserializeOwned>(payload: &Value) -> Result<T, ApiError> {
    T::deserialize(result_of(payload)).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Render a scalar field: strings without quotes, numbers in their JSON form.
/// `None` for missing or null.
fn render_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        other => Some(render_raw(other)),
    }
}

/// Render any value for printing: bare text for strings, compact JSON
/// otherwise.
pub fn render_raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_enveloped_ticker_summary() {
        let payload = json!({
            "result": {"symbol": "BTCUSD", "mark_price": 65000.5, "spot_price": 64990.0}
        });
        let normalized = normalize(&payload);
        assert!(normalized.is_displayable());
        assert_eq!(
            normalized.to_string(),
            "BTCUSD mark_price=65000.5 spot_price=64990.0"
        );
    }

    #[test]
    fn test_bare_ticker_renders_absent_spot() {
        let payload = json!({"symbol": "ETHUSD", "mark_price": 3200});
        let normalized = normalize(&payload);
        assert_eq!(
            normalized.to_string(),
            "ETHUSD mark_price=3200 spot_price=<absent>"
        );
    }

    #[test]
    fn test_enveloped_without_ticker_fields_unwraps() {
        let payload = json!({"result": {"foo": "bar"}});
        let normalized = normalize(&payload);
        assert!(!normalized.is_displayable());
        // The unwrapped candidate, not the envelope.
        assert_eq!(normalized.pass_through(), Some(&json!({"foo": "bar"})));
    }

    #[test]
    fn test_non_object_passes_through_unchanged() {
        let payload = json!("unexpected string");
        let normalized = normalize(&payload);
        assert!(!normalized.is_displayable());
        assert!(std::ptr::eq(normalized.pass_through().unwrap(), &payload));
        assert_eq!(normalized.to_string(), "unexpected string");

        for payload in [json!(null), json!(42), json!([1, 2, 3]), json!(true)] {
            assert_eq!(normalize(&payload).pass_through(), Some(&payload));
        }
    }

    #[test]
    fn test_bare_without_ticker_fields_passes_through() {
        let payload = json!({"success": false, "error": {"code": "not_found"}});
        let normalized = normalize(&payload);
        assert_eq!(normalized.pass_through(), Some(&payload));
    }

    #[test]
    fn test_enveloped_non_object_result() {
        let payload = json!({"success": true, "result": [1, 2]});
        assert_eq!(normalize(&payload).pass_through(), Some(&json!([1, 2])));

        let payload = json!({"result": null});
        assert_eq!(normalize(&payload).pass_through(), Some(&Value::Null));
    }

    #[test]
    fn test_symbol_alone_is_displayable() {
        let payload = json!({"result": {"symbol": "SOLUSD"}});
        assert_eq!(
            normalize(&payload).to_string(),
            "SOLUSD mark_price=<absent> spot_price=<absent>"
        );
    }

    #[test]
    fn test_null_mark_price_is_not_enough() {
        let payload = json!({"symbol": "", "mark_price": null, "spot_price": 1.5});
        assert!(!normalize(&payload).is_displayable());
    }

    #[test]
    fn test_fallback_symbol_when_missing_or_empty() {
        let payload = json!({"mark_price": "65010.25"});
        assert_eq!(
            normalize(&payload).to_string(),
            "BTCUSD mark_price=65010.25 spot_price=<absent>"
        );

        let normalizer = Normalizer::with_fallback_symbol("ETHUSD");
        let payload = json!({"result": {"symbol": "", "mark_price": 0}});
        assert_eq!(
            normalizer.normalize(&payload).summary().map(|s| s.symbol.as_str()),
            Some("ETHUSD")
        );
    }

    #[test]
    fn test_string_prices_render_without_quotes() {
        let payload = json!({
            "success": true,
            "result": {"symbol": "BTCUSD", "mark_price": "65000.5", "spot_price": "64990.12"}
        });
        assert_eq!(
            normalize(&payload).to_string(),
            "BTCUSD mark_price=65000.5 spot_price=64990.12"
        );
    }

    #[test]
    fn test_classify() {
        let enveloped = json!({"result": {"symbol": "BTCUSD"}});
        assert_eq!(
            PayloadShape::classify(&enveloped),
            PayloadShape::Enveloped(&enveloped["result"])
        );

        let bare = json!({"symbol": "BTCUSD"});
        assert!(matches!(PayloadShape::classify(&bare), PayloadShape::Bare(_)));

        let text = json!("oops");
        assert_eq!(PayloadShape::classify(&text), PayloadShape::Unstructured(&text));
    }

    #[test]
    fn test_result_of() {
        let enveloped = json!({"success": true, "result": [1, 2]});
        assert_eq!(result_of(&enveloped), &json!([1, 2]));
        let bare = json!([3]);
        assert_eq!(result_of(&bare), &bare);
    }

    #[test]
    fn test_decode_result() {
        let payload = json!({"result": {"symbol": "BTCUSD"}});
        let decoded: std::collections::HashMap<String, String> = decode_result(&payload).unwrap();
        assert_eq!(decoded["symbol"], "BTCUSD");

        let err = decode_result::<Vec<u32>>(&payload).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn test_normalize_does_not_mutate() {
        let payload = json!({"result": {"symbol": "BTCUSD", "mark_price": 1}});
        let before = payload.clone();
        let _ = normalize(&payload);
        assert_eq!(payload, before);
    }
}
