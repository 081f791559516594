//! CLI argument definitions for ferrofetch.
//!
//! | Command | Description |
//! |---------|-------------|
//! | *(none)* | Metadata for `AAPL` |
//! | `metadata` | Ticker metadata |
//! | `latest` | Latest end-of-day price |
//! | `history` | Daily prices over a date range |
//! | `current` | Current traded price |
//! | `options` | Option chain for one expiration |
//! | `option-dates` | Listed option expirations |
//! | `recommendations` | Analyst recommendation trend |
//! | `holders` | Major holder breakdown |
//! | `institutions` | Institutional holders |
//! | `sustainability` | ESG scores |
//! | `isin` | ISIN lookup |
//! | `usage` | Token usage report |
//! | `catalog` | Supported ticker catalog |
//!
//! ```bash
//! ferrofetch history AAPL --start 2024-01-02 --end 2024-01-31 --pretty
//! ferrofetch catalog --asset-type ETF --asset-type "Mutual Fund"
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use ferrofetch_core::ResponseFormat;

/// Quota-aware end-of-day market data client.
#[derive(Debug, Parser)]
#[command(name = "ferrofetch", author, version, about)]
pub struct Cli {
    /// Payload format requested from the token-gated endpoints.
    #[arg(long, global = true, value_enum, default_value_t = FormatArg::Json)]
    pub format: FormatArg,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Per-request timeout in milliseconds, overriding FERROFETCH_TIMEOUT_MS.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Json,
    Csv,
}

impl From<FormatArg> for ResponseFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Json => ResponseFormat::Json,
            FormatArg::Csv => ResponseFormat::Csv,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch ticker metadata (name, exchange, listing dates).
    Metadata(TickerArgs),

    /// Fetch the latest end-of-day price.
    Latest(TickerArgs),

    /// Fetch daily prices over a date range.
    ///
    ///   ferrofetch history AAPL
    ///   ferrofetch history AAPL --start 2024-01-02 --end 2024-01-31
    History(HistoryArgs),

    /// Fetch the current traded price.
    Current(TickerArgs),

    /// Fetch calls and puts for one expiration (nearest when omitted).
    Options(OptionsArgs),

    /// List option expiration dates.
    OptionDates(TickerArgs),

    /// Fetch the analyst recommendation trend.
    Recommendations(TickerArgs),

    /// Fetch the major holder breakdown.
    Holders(TickerArgs),

    /// Fetch institutional holders.
    Institutions(TickerArgs),

    /// Fetch ESG sustainability scores.
    Sustainability(TickerArgs),

    /// Look up the ISIN for a ticker.
    Isin(TickerArgs),

    /// Show per-token API usage.
    Usage,

    /// List supported tickers, optionally restricted to asset types.
    ///
    ///   ferrofetch catalog --asset-type ETF
    Catalog(CatalogArgs),
}

#[derive(Debug, Args)]
pub struct TickerArgs {
    /// Ticker symbol, forwarded as given (e.g. AAPL, brk-b).
    pub ticker: String,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    pub ticker: String,

    /// First day, YYYY-MM-DD.
    #[arg(long)]
    pub start: Option<String>,

    /// Last day, YYYY-MM-DD.
    #[arg(long)]
    pub end: Option<String>,
}

#[derive(Debug, Args)]
pub struct OptionsArgs {
    pub ticker: String,

    /// Expiration date, YYYY-MM-DD.
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Debug, Args)]
pub struct CatalogArgs {
    /// Asset type to keep (Stock, ETF, Mutual Fund); repeatable.
    #[arg(long = "asset-type")]
    pub asset_types: Vec<String>,
}
