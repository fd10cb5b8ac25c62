mod commands;
mod probe;

use anyhow::Result;
use clap::{Parser, Subcommand};
use deltaprobe_brokers_delta::DeltaRestClient;
use deltaprobe_core::{
    CandleRequest, ClientConfig, OrderFilter, ProductFilter, Resolution, TickerFilter,
    DEFAULT_BASE_URL, DEFAULT_SYMBOL, ENV_API_KEY, ENV_API_SECRET, ENV_BASE_URL,
};
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

/// Upper bound for `candles --hours` (one year).
const MAX_CANDLE_HOURS: i64 = 24 * 366;

#[derive(Parser)]
#[command(name = "deltaprobe")]
#[command(about = "Delta Exchange REST probe: ticker summary plus an optional wallet check")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// REST API base URL
    #[arg(long, env = ENV_BASE_URL, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// API key for signed endpoints
    #[arg(long, env = ENV_API_KEY, default_value = "", hide_env_values = true)]
    api_key: String,

    /// API secret for signed endpoints
    #[arg(long, env = ENV_API_SECRET, default_value = "", hide_env_values = true)]
    api_secret: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: u64,

    /// Ticker symbol for the default probe
    #[arg(short, long, default_value = DEFAULT_SYMBOL)]
    symbol: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the ticker summary, then check the wallet if credentials are set (default)
    Probe,

    /// Print a single ticker summary
    Ticker {
        /// Product symbol (e.g. "BTCUSD", "ETHUSD")
        symbol: String,
    },

    /// Print a summary line for every listed ticker
    Tickers {
        /// Comma-separated contract types (e.g. "perpetual_futures,spot")
        #[arg(long)]
        contract_types: Option<String>,

        /// Comma-separated underlying assets (e.g. "BTC,ETH")
        #[arg(long)]
        underlying: Option<String>,
    },

    /// Print the contract specification of one product
    Product {
        /// Product symbol (e.g. "BTCUSD")
        symbol: String,
    },

    /// List products, one page at a time
    Products {
        /// Comma-separated contract types (e.g. "perpetual_futures,call_options")
        #[arg(long)]
        contract_types: Option<String>,

        /// Comma-separated product states (e.g. "live,expired")
        #[arg(long)]
        states: Option<String>,

        /// Products per page
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        page_size: Option<u32>,

        /// Cursor printed by the previous page
        #[arg(long)]
        after: Option<String>,
    },

    /// Print the L2 orderbook with its bid/ask imbalance
    Orderbook {
        symbol: String,

        /// Number of levels per side
        #[arg(long)]
        depth: Option<u32>,
    },

    /// Print historical OHLCV candles
    Candles {
        symbol: String,

        /// Candle resolution (1m, 5m, 15m, 1h, 1d)
        #[arg(short, long, default_value = "5m")]
        resolution: Resolution,

        /// How many hours back from now
        #[arg(long, default_value = "24", value_parser = clap::value_parser!(i64).range(1..=MAX_CANDLE_HOURS))]
        hours: i64,
    },

    /// List wallet balances (requires credentials)
    Wallet,

    /// List open orders (requires credentials)
    Orders {
        /// Comma-separated product ids
        #[arg(long)]
        product_ids: Option<String>,

        /// Comma-separated order states (e.g. "open,pending")
        #[arg(long)]
        states: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the probe output.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::new(cli.base_url, cli.api_key, cli.api_secret)
        .with_timeout(Duration::from_secs(cli.timeout_secs));
    tracing::debug!(?config, "Client configuration");

    let client = DeltaRestClient::new(config)?;
    let mut out = std::io::stdout().lock();

    match cli.command.unwrap_or(Commands::Probe) {
        Commands::Probe => probe::run(&client, &cli.symbol, &mut out).await?,
        Commands::Ticker { symbol } => probe::print_ticker(&client, &symbol, &mut out).await?,
        Commands::Tickers {
            contract_types,
            underlying,
        } => {
            let filter = TickerFilter {
                contract_types,
                underlying_asset_symbols: underlying,
            };
            commands::print_tickers(&client, &filter, &mut out).await?;
        }
        Commands::Product { symbol } => commands::print_product(&client, &symbol, &mut out).await?,
        Commands::Products {
            contract_types,
            states,
            page_size,
            after,
        } => {
            let filter = ProductFilter {
                contract_types,
                states,
                page_size,
                after,
            };
            commands::print_products(&client, &filter, &mut out).await?;
        }
        Commands::Orderbook { symbol, depth } => {
            commands::print_orderbook(&client, &symbol, depth, &mut out).await?;
        }
        Commands::Candles {
            symbol,
            resolution,
            hours,
        } => {
            let request = CandleRequest::last_hours(&symbol, resolution, hours)?;
            commands::print_candles(&client, &request, &mut out).await?;
        }
        Commands::Wallet => commands::print_wallet(&client, &mut out).await?,
        Commands::Orders {
            product_ids,
            states,
        } => {
            let filter = OrderFilter {
                product_ids,
                states,
            };
            commands::print_orders(&client, &filter, &mut out).await?;
        }
    }

    Ok(())
}
