use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::domain::{DateRange, Ticker};

/// Data kinds that go through the token-gated request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Metadata,
    LatestPrice,
    HistoricPrices,
}

impl Endpoint {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Metadata => "metadata",
            Self::LatestPrice => "latest_price",
            Self::HistoricPrices => "historic_prices",
        }
    }

    /// Request path relative to the API base URL.
    pub fn path(self, ticker: &Ticker, range: &DateRange) -> String {
        match self {
            Self::Metadata => format!("daily/{ticker}"),
            Self::LatestPrice => format!("daily/{ticker}/prices"),
            Self::HistoricPrices => format!(
                "daily/{ticker}/prices?startDate={}&endDate={}",
                range.start(),
                range.end()
            ),
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_embed_ticker_verbatim() {
        let ticker = Ticker::new("aapl");
        let range = DateRange::default();
        assert_eq!(Endpoint::Metadata.path(&ticker, &range), "daily/aapl");
        assert_eq!(
            Endpoint::LatestPrice.path(&ticker, &range),
            "daily/aapl/prices"
        );
        assert_eq!(
            Endpoint::HistoricPrices.path(&ticker, &range),
            "daily/aapl/prices?startDate=1900-1-1&endDate=2100-1-1"
        );
    }
}
