use anyhow::{bail, Result};
use deltaprobe_core::{
    decode_result, parse_balances, render_raw, result_of, Candle, CandleRequest, ExchangeApi,
    Normalizer, OrderFilter, OrderbookImbalance, ProductFilter, TickerFilter, ABSENT_MARKER,
};
use serde_json::Value;
use std::io::Write;

use crate::probe::MISSING_CREDENTIALS_HINT;

/// One summary line per ticker in `GET /v2/tickers`.
///
/// Rows without a symbol of their own are labelled `<absent>`, never with a
/// default instrument.
pub async fn print_tickers<W: Write>(
    api: &dyn ExchangeApi,
    filter: &TickerFilter,
    out: &mut W,
) -> Result<()> {
    let payload = api.tickers(filter).await?;
    let Some(tickers) = result_of(&payload).as_array() else {
        writeln!(out, "{}", render_raw(&payload))?;
        return Ok(());
    };

    tracing::info!(count = tickers.len(), "Fetched tickers");
    let normalizer = Normalizer::with_fallback_symbol(ABSENT_MARKER);
    for ticker in tickers {
        writeln!(out, "{}", normalizer.normalize(ticker))?;
    }
    Ok(())
}

/// Full contract specification of one product.
pub async fn print_product<W: Write>(api: &dyn ExchangeApi, symbol: &str, out: &mut W) -> Result<()> {
    let payload = api.product(symbol).await?;
    writeln!(out, "{}", serde_json::to_string_pretty(result_of(&payload))?)?;
    Ok(())
}

/// One line per listed product, then the cursor for the next page if any.
pub async fn print_products<W: Write>(
    api: &dyn ExchangeApi,
    filter: &ProductFilter,
    out: &mut W,
) -> Result<()> {
    let payload = api.products(filter).await?;
    let Some(products) = result_of(&payload).as_array() else {
        writeln!(out, "{}", render_raw(&payload))?;
        return Ok(());
    };

    tracing::info!(count = products.len(), "Fetched products");
    for product in products {
        writeln!(
            out,
            "{} id={} contract_type={} state={}",
            product_field(product, "symbol"),
            product_field(product, "id"),
            product_field(product, "contract_type"),
            product_field(product, "state"),
        )?;
    }
    if let Some(after) = payload.pointer("/meta/after").and_then(Value::as_str) {
        writeln!(out, "Next page: --after {}", after)?;
    }
    Ok(())
}

fn product_field(product: &Value, key: &str) -> String {
    match product.get(key) {
        None | Some(Value::Null) => ABSENT_MARKER.to_string(),
        Some(value) => render_raw(value),
    }
}

/// Bid/ask imbalance line followed by the raw book.
pub async fn print_orderbook<W: Write>(
    api: &dyn ExchangeApi,
    symbol: &str,
    depth: Option<u32>,
    out: &mut W,
) -> Result<()> {
    let payload = api.orderbook(symbol, depth).await?;
    match OrderbookImbalance::from_payload(&payload) {
        Some(imbalance) => writeln!(out, "{} {}", symbol, imbalance)?,
        None => tracing::warn!(symbol, "Orderbook payload has no buy/sell sides"),
    }
    writeln!(out, "{}", serde_json::to_string_pretty(result_of(&payload))?)?;
    Ok(())
}

pub async fn print_candles<W: Write>(
    api: &dyn ExchangeApi,
    request: &CandleRequest,
    out: &mut W,
) -> Result<()> {
    tracing::info!(
        symbol = %request.symbol,
        resolution = %request.resolution,
        start = request.start,
        end = request.end,
        "Fetching candles"
    );
    let payload = api.candles(request).await?;
    let mut candles: Vec<Candle> = decode_result(&payload)?;
    candles.sort_by_key(|c| c.time);

    if candles.is_empty() {
        writeln!(out, "No candles for {} in the requested window", request.symbol)?;
    }
    for candle in &candles {
        writeln!(out, "{}", candle)?;
    }
    Ok(())
}

pub async fn print_wallet<W: Write>(api: &dyn ExchangeApi, out: &mut W) -> Result<()> {
    if !api.authenticated() {
        bail!(MISSING_CREDENTIALS_HINT);
    }
    let payload = api.wallet_balances().await?;
    for balance in parse_balances(&payload)? {
        writeln!(out, "{}", balance)?;
    }
    Ok(())
}

/// One compact JSON line per open order.
pub async fn print_orders<W: Write>(
    api: &dyn ExchangeApi,
    filter: &OrderFilter,
    out: &mut W,
) -> Result<()> {
    if !api.authenticated() {
        bail!(MISSING_CREDENTIALS_HINT);
    }
    let payload = api.open_orders(filter).await?;
    match result_of(&payload).as_array() {
        Some(orders) if orders.is_empty() => writeln!(out, "No open orders")?,
        Some(orders) => {
            for order in orders {
                writeln!(out, "{}", order)?;
            }
        }
        None => writeln!(out, "{}", render_raw(&payload))?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::tests::{output, StubApi};
    use deltaprobe_core::Resolution;
    use serde_json::json;

    #[tokio::test]
    async fn test_tickers_one_line_each() {
        let api = StubApi {
            tickers: json!({
                "success": true,
                "result": [
                    {"symbol": "BTCUSD", "mark_price": "65000", "spot_price": "64990"},
                    {"symbol": "ETHUSD", "mark_price": "3200"},
                    {"contract_type": "spot"}
                ]
            }),
            ..Default::default()
        };
        let mut buf = Vec::new();
        print_tickers(&api, &TickerFilter::default(), &mut buf).await.unwrap();

        assert_eq!(
            output(buf),
            "BTCUSD mark_price=65000 spot_price=64990\n\
             ETHUSD mark_price=3200 spot_price=<absent>\n\
             {\"contract_type\":\"spot\"}\n"
        );
    }

    #[tokio::test]
    async fn test_tickers_never_borrow_a_symbol() {
        let api = StubApi {
            tickers: json!({"result": [{"mark_price": "3200", "contract_type": "spot"}]}),
            ..Default::default()
        };
        let mut buf = Vec::new();
        print_tickers(&api, &TickerFilter::default(), &mut buf).await.unwrap();

        let text = output(buf);
        assert_eq!(text, "<absent> mark_price=3200 spot_price=<absent>\n");
        assert!(!text.contains("BTCUSD"));
    }

    #[tokio::test]
    async fn test_product_prints_result() {
        let api = StubApi {
            product: json!({"success": true, "result": {"id": 27, "symbol": "BTCUSD", "tick_size": "0.5"}}),
            ..Default::default()
        };
        let mut buf = Vec::new();
        print_product(&api, "BTCUSD", &mut buf).await.unwrap();

        let text = output(buf);
        assert!(text.contains("\"symbol\": \"BTCUSD\""));
        assert!(text.contains("\"tick_size\": \"0.5\""));
        assert!(!text.contains("success"));
    }

    #[tokio::test]
    async fn test_product_error_propagates() {
        let api = StubApi::default();
        let mut buf = Vec::new();
        let err = print_product(&api, "FAIL", &mut buf).await.unwrap_err();
        assert!(err.to_string().contains("404"));
        assert!(buf.is_empty());
    }

    #[tokio::test]
    async fn test_products_lines_and_cursor() {
        let api = StubApi {
            products: json!({
                "success": true,
                "result": [
                    {"id": 27, "symbol": "BTCUSD", "contract_type": "perpetual_futures", "state": "live"},
                    {"id": 3136, "symbol": "ETHUSD", "contract_type": "perpetual_futures"}
                ],
                "meta": {"after": "g3QAAAAC", "before": null}
            }),
            ..Default::default()
        };
        let filter = ProductFilter {
            page_size: Some(2),
            ..Default::default()
        };
        let mut buf = Vec::new();
        print_products(&api, &filter, &mut buf).await.unwrap();

        assert_eq!(
            output(buf),
            "BTCUSD id=27 contract_type=perpetual_futures state=live\n\
             ETHUSD id=3136 contract_type=perpetual_futures state=<absent>\n\
             Next page: --after g3QAAAAC\n"
        );
        assert_eq!(*api.last_product_filter.lock().unwrap(), Some(filter));
    }

    #[tokio::test]
    async fn test_products_last_page_has_no_cursor() {
        let api = StubApi {
            products: json!({"result": [], "meta": {"after": null}}),
            ..Default::default()
        };
        let mut buf = Vec::new();
        print_products(&api, &ProductFilter::default(), &mut buf).await.unwrap();
        assert_eq!(output(buf), "");
    }

    #[tokio::test]
    async fn test_orderbook_prints_imbalance() {
        let api = StubApi {
            orderbook: json!({"result": {"buy": [{"size": 3}], "sell": [{"size": 1}]}}),
            ..Default::default()
        };
        let mut buf = Vec::new();
        print_orderbook(&api, "BTCUSD", None, &mut buf).await.unwrap();

        let text = output(buf);
        assert!(text.starts_with("BTCUSD bid_vol=3 ask_vol=1 imbalance_ratio=0.75\n"));
        assert!(text.contains("\"buy\""));
    }

    #[tokio::test]
    async fn test_candles_sorted() {
        let api = StubApi {
            candles: json!({"result": [
                {"time": 1_700_000_300, "open": 2, "high": 2, "low": 2, "close": 2, "volume": 1},
                {"time": 1_700_000_000, "open": 1, "high": 1, "low": 1, "close": 1, "volume": 1}
            ]}),
            ..Default::default()
        };
        let request = CandleRequest {
            symbol: "BTCUSD".to_string(),
            resolution: Resolution::M5,
            start: 1_700_000_000,
            end: 1_700_000_600,
        };
        let mut buf = Vec::new();
        print_candles(&api, &request, &mut buf).await.unwrap();

        let text = output(buf);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("O=1"));
        assert!(lines[1].contains("O=2"));
    }

    #[tokio::test]
    async fn test_wallet_requires_credentials() {
        let api = StubApi::default();
        let mut buf = Vec::new();
        let err = print_wallet(&api, &mut buf).await.unwrap_err();
        assert_eq!(err.to_string(), MISSING_CREDENTIALS_HINT);
    }

    #[tokio::test]
    async fn test_wallet_lists_balances() {
        let api = StubApi {
            wallet: Some(json!({"success": true, "result": [
                {"asset_symbol": "USDT", "balance": "12.5", "available_balance": "10"}
            ]})),
            ..Default::default()
        };
        let mut buf = Vec::new();
        print_wallet(&api, &mut buf).await.unwrap();
        assert_eq!(output(buf), "USDT     balance=12.5 available=10\n");
    }

    #[tokio::test]
    async fn test_orders_empty() {
        let api = StubApi {
            wallet: Some(json!({"success": true})),
            orders: json!({"success": true, "result": []}),
            ..Default::default()
        };
        let mut buf = Vec::new();
        print_orders(&api, &OrderFilter::default(), &mut buf).await.unwrap();
        assert_eq!(output(buf), "No open orders\n");
    }
}
