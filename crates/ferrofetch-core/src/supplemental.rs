//! Supplemental retrieval path for data the token-gated API does not serve.
//!
//! The fetcher passes these calls straight through: no quota handling, no
//! reshaping beyond what the source itself does.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::{json, Map, Value};
use time::OffsetDateTime;

use crate::domain::{format_iso_date, parse_iso_date, Ticker};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::SourceError;

pub const DEFAULT_YAHOO_QUERY_URL: &str = "https://query2.finance.yahoo.com";
pub const DEFAULT_YAHOO_COOKIE_URL: &str = "https://fc.yahoo.com";
pub const DEFAULT_ISIN_SEARCH_URL: &str =
    "https://markets.businessinsider.com/ajax/SearchController_Suggest";

const CRUMB_TTL: Duration = Duration::from_secs(3600);

/// Contract for the non-gated data kinds.
pub trait SupplementalSource: Send + Sync {
    /// Last traded price, `None` when the source has no price for the ticker.
    fn current_price(&self, ticker: &Ticker) -> Result<Option<f64>, SourceError>;

    /// Calls and puts for one expiration (`YYYY-MM-DD`), or the nearest one.
    fn option_chain(&self, ticker: &Ticker, date: Option<&str>) -> Result<Value, SourceError>;

    /// Listed option expirations as `YYYY-MM-DD`, ascending.
    fn option_dates(&self, ticker: &Ticker) -> Result<Vec<String>, SourceError>;

    fn recommendations(&self, ticker: &Ticker) -> Result<Value, SourceError>;

    fn holder_info(&self, ticker: &Ticker) -> Result<Value, SourceError>;

    fn institutional_holders(&self, ticker: &Ticker) -> Result<Value, SourceError>;

    fn sustainability_info(&self, ticker: &Ticker) -> Result<Value, SourceError>;

    fn isin(&self, ticker: &Ticker) -> Result<Option<String>, SourceError>;
}

/// Cached Yahoo crumb. Yahoo's unofficial API requires a session cookie
/// (kept by the transport's cookie store) plus a crumb query parameter.
#[derive(Debug, Default)]
struct YahooSession {
    crumb: Mutex<Option<(String, Instant)>>,
}

impl YahooSession {
    fn cached(&self) -> Option<String> {
        let guard = self.crumb.lock().ok()?;
        guard
            .as_ref()
            .filter(|(_, fetched_at)| fetched_at.elapsed() < CRUMB_TTL)
            .map(|(crumb, _)| crumb.clone())
    }

    fn store(&self, crumb: String) {
        if let Ok(mut guard) = self.crumb.lock() {
            *guard = Some((crumb, Instant::now()));
        }
    }

    fn invalidate(&self) {
        if let Ok(mut guard) = self.crumb.lock() {
            *guard = None;
        }
    }
}

/// Yahoo Finance backed [`SupplementalSource`].
pub struct YahooSource {
    http_client: Arc<dyn HttpClient>,
    session: YahooSession,
    query_url: String,
    cookie_url: String,
    isin_search_url: String,
    timeout_ms: u64,
}

impl YahooSource {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            session: YahooSession::default(),
            query_url: String::from(DEFAULT_YAHOO_QUERY_URL),
            cookie_url: String::from(DEFAULT_YAHOO_COOKIE_URL),
            isin_search_url: String::from(DEFAULT_ISIN_SEARCH_URL),
            timeout_ms: 10_000,
        }
    }

    pub fn with_query_url(mut self, query_url: impl Into<String>) -> Self {
        self.query_url = query_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_cookie_url(mut self, cookie_url: impl Into<String>) -> Self {
        self.cookie_url = cookie_url.into();
        self
    }

    pub fn with_isin_search_url(mut self, isin_search_url: impl Into<String>) -> Self {
        self.isin_search_url = isin_search_url.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Seeds the session with a known crumb, skipping the handshake.
    pub fn with_crumb(self, crumb: impl Into<String>) -> Self {
        self.session.store(crumb.into());
        self
    }

    fn get(&self, url: String) -> Result<HttpResponse, SourceError> {
        let request = HttpRequest::get(url)
            .with_header("referer", "https://finance.yahoo.com/")
            .with_timeout_ms(self.timeout_ms);
        self.http_client
            .execute(request)
            .map_err(|e| {
                SourceError::unavailable(format!("yahoo transport error: {}", e.message()))
            })
    }

    fn crumb(&self) -> Result<String, SourceError> {
        if let Some(crumb) = self.session.cached() {
            return Ok(crumb);
        }

        // fc.yahoo.com answers 404 but sets the session cookie we need.
        self.get(self.cookie_url.clone())?;

        let response = self.get(format!("{}/v1/test/getcrumb", self.query_url))?;
        let body = response.text();
        let crumb = body.trim();

        if !response.is_success() || crumb.to_ascii_lowercase().contains("too many requests") {
            return Err(SourceError::upstream_status(
                response.status,
                format!("yahoo refused crumb request with status {}", response.status),
            ));
        }
        if crumb.is_empty() || crumb.len() >= 100 || crumb.contains(' ') || crumb.contains('<') {
            return Err(SourceError::invalid_response("yahoo returned an unusable crumb"));
        }

        self.session.store(crumb.to_owned());
        Ok(crumb.to_owned())
    }

    fn get_authenticated(&self, url: String) -> Result<Value, SourceError> {
        let crumb = self.crumb()?;
        let separator = if url.contains('?') { '&' } else { '?' };
        let response = self.get(format!(
            "{url}{separator}crumb={}",
            urlencoding::encode(&crumb)
        ))?;

        if response.status == 401 {
            self.session.invalidate();
        }
        decode_json(&response)
    }

    fn quote_summary(&self, ticker: &Ticker, module: &str) -> Result<Value, SourceError> {
        let body = self.get_authenticated(format!(
            "{}/v10/finance/quoteSummary/{}?modules={module}",
            self.query_url,
            urlencoding::encode(ticker.as_str())
        ))?;

        let result = first_result(&body, "quoteSummary")?;
        Ok(result.get(module).map(flatten_raw).unwrap_or(Value::Null))
    }

    fn options(
        &self,
        ticker: &Ticker,
        expiration: Option<i64>,
    ) -> Result<OptionResult, SourceError> {
        let mut url = format!(
            "{}/v7/finance/options/{}",
            self.query_url,
            urlencoding::encode(ticker.as_str())
        );
        if let Some(expiration) = expiration {
            url.push_str(&format!("?date={expiration}"));
        }

        let body = self.get_authenticated(url)?;
        let result = first_result(&body, "optionChain")?;
        serde_json::from_value(result.clone()).map_err(|e| {
            SourceError::invalid_response(format!("failed to parse yahoo option chain: {e}"))
        })
    }
}

impl SupplementalSource for YahooSource {
    fn current_price(&self, ticker: &Ticker) -> Result<Option<f64>, SourceError> {
        let response = self.get(format!(
            "{}/v8/finance/chart/{}?range=1d&interval=1d",
            self.query_url,
            urlencoding::encode(ticker.as_str())
        ))?;
        let body = decode_json(&response)?;
        let result = first_result(&body, "chart")?;
        Ok(result
            .pointer("/meta/regularMarketPrice")
            .and_then(Value::as_f64))
    }

    fn option_chain(&self, ticker: &Ticker, date: Option<&str>) -> Result<Value, SourceError> {
        let expiration = date
            .map(|date| parse_iso_date(date).map(|d| d.midnight().assume_utc().unix_timestamp()))
            .transpose()?;

        let result = self.options(ticker, expiration)?;
        let Some(chain) = result.options.into_iter().next() else {
            return Err(SourceError::invalid_request(match date {
                Some(date) => format!("expiration '{date}' cannot be found for {ticker}"),
                None => format!("no option chain listed for {ticker}"),
            }));
        };

        Ok(json!({
            "expiration": epoch_to_iso_date(chain.expiration_date)?,
            "calls": chain.calls,
            "puts": chain.puts,
        }))
    }

    fn option_dates(&self, ticker: &Ticker) -> Result<Vec<String>, SourceError> {
        let mut epochs = self.options(ticker, None)?.expiration_dates;
        epochs.sort_unstable();
        epochs.into_iter().map(epoch_to_iso_date).collect()
    }

    fn recommendations(&self, ticker: &Ticker) -> Result<Value, SourceError> {
        let trend = self.quote_summary(ticker, "recommendationTrend")?;
        Ok(trend.get("trend").cloned().unwrap_or(trend))
    }

    fn holder_info(&self, ticker: &Ticker) -> Result<Value, SourceError> {
        self.quote_summary(ticker, "majorHoldersBreakdown")
    }

    fn institutional_holders(&self, ticker: &Ticker) -> Result<Value, SourceError> {
        let ownership = self.quote_summary(ticker, "institutionOwnership")?;
        Ok(ownership
            .get("ownershipList")
            .cloned()
            .unwrap_or(ownership))
    }

    fn sustainability_info(&self, ticker: &Ticker) -> Result<Value, SourceError> {
        self.quote_summary(ticker, "esgScores")
    }

    fn isin(&self, ticker: &Ticker) -> Result<Option<String>, SourceError> {
        let symbol = ticker.as_str().trim().to_ascii_uppercase();
        // Indices and share-class tickers have no ISIN on the search endpoint.
        if symbol.is_empty() || symbol.contains('-') || symbol.contains('^') {
            return Ok(None);
        }

        let response = self.get(format!(
            "{}?max_results=25&query={}",
            self.isin_search_url,
            urlencoding::encode(&symbol)
        ))?;
        if !response.is_success() {
            return Err(SourceError::upstream_status(
                response.status,
                format!("isin search returned status {}", response.status),
            ));
        }

        Ok(find_isin(&response.text(), &symbol))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionResult {
    #[serde(default)]
    expiration_dates: Vec<i64>,
    #[serde(default)]
    options: Vec<OptionChainPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionChainPayload {
    expiration_date: i64,
    #[serde(default)]
    calls: Vec<Value>,
    #[serde(default)]
    puts: Vec<Value>,
}

fn decode_json(response: &HttpResponse) -> Result<Value, SourceError> {
    if !response.is_success() {
        return Err(SourceError::upstream_status(
            response.status,
            format!("yahoo returned status {}", response.status),
        ));
    }
    response
        .json()
        .map_err(|e| SourceError::invalid_response(format!("failed to parse yahoo response: {e}")))
}

/// Pulls `body[root].result[0]`, surfacing Yahoo's in-band error object.
fn first_result<'a>(body: &'a Value, root: &str) -> Result<&'a Value, SourceError> {
    let envelope = body
        .get(root)
        .ok_or_else(|| SourceError::invalid_response(format!("yahoo response has no '{root}'")))?;

    if let Some(error) = envelope.get("error").filter(|error| !error.is_null()) {
        let description = error
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(SourceError::invalid_request(format!(
            "yahoo {root} error: {description}"
        )));
    }

    envelope
        .pointer("/result/0")
        .ok_or_else(|| SourceError::invalid_response(format!("yahoo {root} returned no result")))
}

/// Replaces Yahoo's `{"raw": .., "fmt": ..}` wrappers with the raw value.
fn flatten_raw(value: &Value) -> Value {
    match value {
        Value::Object(map) if map.contains_key("raw") => map["raw"].clone(),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), flatten_raw(value)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(flatten_raw).collect()),
        other => other.clone(),
    }
}

fn epoch_to_iso_date(epoch: i64) -> Result<String, SourceError> {
    let date = OffsetDateTime::from_unix_timestamp(epoch)
        .map_err(|e| SourceError::invalid_response(format!("invalid expiration {epoch}: {e}")))?
        .date();
    Ok(format_iso_date(date))
}

/// Finds `"SYMBOL|ISIN|...` in the suggest payload and returns the ISIN.
fn find_isin(payload: &str, symbol: &str) -> Option<String> {
    let needle = format!("\"{symbol}|");
    let (_, rest) = payload.split_once(&needle)?;
    let isin = rest.split('"').next()?.split('|').next()?.trim();
    (!isin.is_empty() && isin != "-").then(|| isin.to_owned())
}
