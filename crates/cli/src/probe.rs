use anyhow::Result;
use deltaprobe_core::{ExchangeApi, Normalizer, WalletCheck};
use std::io::Write;

/// Printed instead of the wallet check when credentials are missing.
pub const MISSING_CREDENTIALS_HINT: &str =
    "Set DELTA_API_KEY and DELTA_API_SECRET for wallet/orders.";

/// Fetch one ticker and print its summary line (or the raw payload).
pub async fn print_ticker<W: Write>(api: &dyn ExchangeApi, symbol: &str, out: &mut W) -> Result<()> {
    tracing::info!(symbol, "Fetching ticker");
    let payload = api.ticker(symbol).await?;
    let normalized = Normalizer::with_fallback_symbol(symbol).normalize(&payload);
    if !normalized.is_displayable() {
        tracing::debug!(symbol, "Ticker payload not recognized, printing raw");
    }
    writeln!(out, "{}", normalized)?;
    Ok(())
}

/// Run the wallet check if credentials are configured.
pub async fn check_wallet<W: Write>(api: &dyn ExchangeApi, out: &mut W) -> Result<Option<WalletCheck>> {
    if !api.authenticated() {
        tracing::warn!("No API credentials configured, skipping wallet check");
        writeln!(out, "{}", MISSING_CREDENTIALS_HINT)?;
        return Ok(None);
    }

    let check = WalletCheck::evaluate(api.wallet_balances().await?);
    if !check.is_ok() {
        tracing::warn!("Wallet balance request did not report success");
    }
    writeln!(out, "Wallet: {}", check)?;
    Ok(Some(check))
}

/// The default flow: ticker summary, then the auth-gated wallet check.
pub async fn run<W: Write>(api: &dyn ExchangeApi, symbol: &str, out: &mut W) -> Result<()> {
    print_ticker(api, symbol, out).await?;
    check_wallet(api, out).await?;
    Ok(())
}
