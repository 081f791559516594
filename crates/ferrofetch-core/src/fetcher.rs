//! The fetch component.
//!
//! Guarded operations (metadata, latest price, historic prices) go through
//! the token-gated [`ApiRequester`]. When its quota is spent they emit one
//! [`Notice`] and return `Ok(None)` so the caller can switch to another data
//! source. Every other failure is returned unchanged.
//!
//! Pass-through operations delegate to the [`SupplementalSource`], and the
//! catalog listing downloads an unauthenticated archive.
//!
//! ```rust,ignore
//! use ferrofetch_core::{ClientConfig, DataFetcher, DateRange, ResponseFormat, Ticker};
//!
//! let fetcher = DataFetcher::from_config(&ClientConfig::from_env()?)?;
//! let range = DateRange::default();
//! match fetcher.fetch_historic_prices(&Ticker::new("AAPL"), &range, ResponseFormat::Json)? {
//!     Some(prices) => println!("{prices}"),
//!     None => println!("tiingo quota spent, use the fallback provider"),
//! }
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::catalog::{decode_catalog, CatalogFilter, CatalogRow, CATALOG_MEMBER};
use crate::config::ClientConfig;
use crate::diagnostics::{Notice, NoticeSink, TracingNoticeSink};
use crate::domain::{DateRange, Endpoint, ResponseFormat, Ticker};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::quota::UsageReport;
use crate::request::{ApiRequester, RequestOutcome, TiingoClient};
use crate::supplemental::{SupplementalSource, YahooSource};
use crate::SourceError;

/// Outcome of a guarded fetch: `Ok(None)` is the quota-exhaustion sentinel.
pub type FetchResult = Result<Option<Value>, SourceError>;

/// Quota-aware facade over the request collaborators.
pub struct DataFetcher {
    requester: Arc<dyn ApiRequester>,
    supplemental: Arc<dyn SupplementalSource>,
    transport: Arc<dyn HttpClient>,
    notices: Arc<dyn NoticeSink>,
    catalog_url: String,
    timeout_ms: u64,
}

impl DataFetcher {
    pub fn new(
        requester: Arc<dyn ApiRequester>,
        supplemental: Arc<dyn SupplementalSource>,
        transport: Arc<dyn HttpClient>,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        Self {
            requester,
            supplemental,
            transport,
            notices,
            catalog_url: String::from(crate::config::DEFAULT_CATALOG_URL),
            timeout_ms: crate::config::DEFAULT_TIMEOUT_MS,
        }
    }

    /// Wires the production collaborators over one shared reqwest client.
    ///
    /// # Errors
    ///
    /// [`SourceErrorKind::Configuration`](crate::SourceErrorKind::Configuration)
    /// when the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, SourceError> {
        let transport = ReqwestHttpClient::new()
            .map_err(|e| SourceError::configuration(e.message().to_owned()))?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Same wiring as [`from_config`](Self::from_config) over a caller-supplied transport.
    pub fn with_transport(config: &ClientConfig, transport: Arc<dyn HttpClient>) -> Self {
        let requester = Arc::new(TiingoClient::new(transport.clone(), config));
        let supplemental =
            Arc::new(YahooSource::new(transport.clone()).with_timeout_ms(config.timeout_ms()));

        Self {
            requester,
            supplemental,
            transport,
            notices: Arc::new(TracingNoticeSink),
            catalog_url: config.catalog_url().to_owned(),
            timeout_ms: config.timeout_ms(),
        }
    }

    pub fn with_notice_sink(mut self, notices: Arc<dyn NoticeSink>) -> Self {
        self.notices = notices;
        self
    }

    pub fn with_catalog_url(mut self, catalog_url: impl Into<String>) -> Self {
        self.catalog_url = catalog_url.into();
        self
    }

    /// Current token usage of the request collaborator.
    pub fn api_usage_info(&self) -> UsageReport {
        self.requester.usage()
    }

    pub fn fetch_metadata(&self, ticker: &Ticker, format: ResponseFormat) -> FetchResult {
        self.guarded(Endpoint::Metadata, ticker, &DateRange::default(), format)
    }

    pub fn fetch_latest_price(&self, ticker: &Ticker, format: ResponseFormat) -> FetchResult {
        self.guarded(Endpoint::LatestPrice, ticker, &DateRange::default(), format)
    }

    /// Daily prices between `range.start()` and `range.end()`; use
    /// `DateRange::default()` for the listing's whole history.
    pub fn fetch_historic_prices(
        &self,
        ticker: &Ticker,
        range: &DateRange,
        format: ResponseFormat,
    ) -> FetchResult {
        self.guarded(Endpoint::HistoricPrices, ticker, range, format)
    }

    pub fn fetch_current_price(&self, ticker: &Ticker) -> Result<Option<f64>, SourceError> {
        self.supplemental.current_price(ticker)
    }

    pub fn fetch_option_chain(
        &self,
        ticker: &Ticker,
        date: Option<&str>,
    ) -> Result<Value, SourceError> {
        self.supplemental.option_chain(ticker, date)
    }

    pub fn fetch_option_dates(&self, ticker: &Ticker) -> Result<Vec<String>, SourceError> {
        self.supplemental.option_dates(ticker)
    }

    pub fn fetch_recommendations(&self, ticker: &Ticker) -> Result<Value, SourceError> {
        self.supplemental.recommendations(ticker)
    }

    pub fn fetch_holder_info(&self, ticker: &Ticker) -> Result<Value, SourceError> {
        self.supplemental.holder_info(ticker)
    }

    pub fn fetch_institutional_holders(&self, ticker: &Ticker) -> Result<Value, SourceError> {
        self.supplemental.institutional_holders(ticker)
    }

    pub fn fetch_sustainability_info(&self, ticker: &Ticker) -> Result<Value, SourceError> {
        self.supplemental.sustainability_info(ticker)
    }

    pub fn fetch_isin(&self, ticker: &Ticker) -> Result<Option<String>, SourceError> {
        self.supplemental.isin(ticker)
    }

    /// Every supported ticker matching `filter`, one JSON object per row in
    /// the order the catalog lists them.
    pub fn fetch_ticker_catalog(
        &self,
        filter: &CatalogFilter,
    ) -> Result<Vec<String>, SourceError> {
        self.fetch_catalog_rows(filter)?
            .iter()
            .map(CatalogRow::to_json)
            .collect()
    }

    /// Typed form of [`fetch_ticker_catalog`](Self::fetch_ticker_catalog).
    pub fn fetch_catalog_rows(
        &self,
        filter: &CatalogFilter,
    ) -> Result<Vec<CatalogRow>, SourceError> {
        let request = HttpRequest::get(&self.catalog_url).with_timeout_ms(self.timeout_ms);
        let response = self.transport.execute(request).map_err(|e| {
            SourceError::unavailable(format!("catalog download failed: {}", e.message()))
        })?;

        if !response.is_success() {
            return Err(SourceError::upstream_status(
                response.status,
                format!("catalog download returned status {}", response.status),
            ));
        }

        let mut rows = decode_catalog(&response.body, CATALOG_MEMBER)?;
        rows.retain(|row| filter.matches(row));
        tracing::debug!(rows = rows.len(), "decoded ticker catalog");
        Ok(rows)
    }

    fn guarded(
        &self,
        endpoint: Endpoint,
        ticker: &Ticker,
        range: &DateRange,
        format: ResponseFormat,
    ) -> FetchResult {
        if !format.is_supported() {
            return Err(SourceError::unsupported_format(format));
        }

        let path = endpoint.path(ticker, range);
        match self.requester.issue_request(&path)? {
            RequestOutcome::Response(response) => response.json().map(Some).map_err(|e| {
                SourceError::invalid_response(format!("failed to parse {endpoint} payload: {e}"))
            }),
            RequestOutcome::QuotaExhausted => {
                self.notices.notice(&Notice::tokens_exhausted(endpoint, path));
                Ok(None)
            }
        }
    }
}
