use ferrofetch_core::{CatalogFilter, DataFetcher, DateRange, ResponseFormat, Ticker};
use serde_json::Value;

use crate::cli::{Cli, Command, HistoryArgs, TickerArgs};
use crate::error::CliError;

/// Ticker used when the binary is invoked without a subcommand.
pub const DEFAULT_TICKER: &str = "AAPL";

pub fn run(cli: &Cli, fetcher: &DataFetcher) -> Result<Value, CliError> {
    let format = ResponseFormat::from(cli.format);

    match &cli.command {
        None => guarded(fetcher.fetch_metadata(&Ticker::new(DEFAULT_TICKER), format)),
        Some(Command::Metadata(args)) => guarded(fetcher.fetch_metadata(&ticker(args), format)),
        Some(Command::Latest(args)) => guarded(fetcher.fetch_latest_price(&ticker(args), format)),
        Some(Command::History(args)) => guarded(fetcher.fetch_historic_prices(
            &Ticker::new(args.ticker.as_str()),
            &date_range(args),
            format,
        )),
        Some(Command::Current(args)) => Ok(fetcher
            .fetch_current_price(&ticker(args))?
            .map_or(Value::Null, Value::from)),
        Some(Command::Options(args)) => Ok(fetcher.fetch_option_chain(
            &Ticker::new(args.ticker.as_str()),
            args.date.as_deref(),
        )?),
        Some(Command::OptionDates(args)) => {
            Ok(serde_json::to_value(fetcher.fetch_option_dates(&ticker(args))?)?)
        }
        Some(Command::Recommendations(args)) => Ok(fetcher.fetch_recommendations(&ticker(args))?),
        Some(Command::Holders(args)) => Ok(fetcher.fetch_holder_info(&ticker(args))?),
        Some(Command::Institutions(args)) => {
            Ok(fetcher.fetch_institutional_holders(&ticker(args))?)
        }
        Some(Command::Sustainability(args)) => {
            Ok(fetcher.fetch_sustainability_info(&ticker(args))?)
        }
        Some(Command::Isin(args)) => Ok(fetcher
            .fetch_isin(&ticker(args))?
            .map_or(Value::Null, Value::from)),
        Some(Command::Usage) => Ok(serde_json::to_value(fetcher.api_usage_info())?),
        Some(Command::Catalog(args)) => {
            let filter = CatalogFilter::asset_types(args.asset_types.iter().cloned());
            Ok(serde_json::to_value(fetcher.fetch_catalog_rows(&filter)?)?)
        }
    }
}

fn ticker(args: &TickerArgs) -> Ticker {
    Ticker::new(args.ticker.as_str())
}

fn date_range(args: &HistoryArgs) -> DateRange {
    let mut range = DateRange::default();
    if let Some(start) = &args.start {
        range = range.with_start(start.as_str());
    }
    if let Some(end) = &args.end {
        range = range.with_end(end.as_str());
    }
    range
}

/// The quota sentinel becomes a dedicated exit status.
fn guarded(result: ferrofetch_core::FetchResult) -> Result<Value, CliError> {
    result?.ok_or(CliError::TokensExhausted)
}
