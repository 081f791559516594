//! Behavior tests for the quota-exhaustion fallback contract.
//!
//! Guarded fetches must never fail because the token quota is spent: they
//! return `Ok(None)` and emit exactly one notice per call.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use ferrofetch_core::{
    ApiRequester, ClientConfig, DataFetcher, DateRange, Endpoint, FetchResult, HttpResponse,
    MemoryNoticeSink, RequestOutcome, ResponseFormat, ScriptedHttpClient, SourceError,
    SourceErrorKind, SupplementalSource, Ticker, TokenPool, UsageReport, YahooSource,
};
use serde_json::{json, Value};
use tracing_subscriber::fmt::MakeWriter;

/// Requester that replays scripted outcomes and records requested paths.
struct ScriptedRequester {
    outcomes: Mutex<VecDeque<Result<RequestOutcome, SourceError>>>,
    paths: Mutex<Vec<String>>,
}

impl ScriptedRequester {
    fn new(outcomes: Vec<Result<RequestOutcome, SourceError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            paths: Mutex::new(Vec::new()),
        }
    }

    fn always_exhausted(calls: usize) -> Self {
        Self::new(
            (0..calls)
                .map(|_| Ok(RequestOutcome::QuotaExhausted))
                .collect(),
        )
    }

    fn paths(&self) -> Vec<String> {
        self.paths.lock().expect("paths lock").clone()
    }
}

impl ApiRequester for ScriptedRequester {
    fn issue_request(&self, path: &str) -> Result<RequestOutcome, SourceError> {
        self.paths.lock().expect("paths lock").push(path.to_owned());
        self.outcomes
            .lock()
            .expect("outcomes lock")
            .pop_front()
            .expect("test scripted too few outcomes")
    }

    fn usage(&self) -> UsageReport {
        TokenPool::new(["unused"], None).report()
    }
}

fn fetcher_over(requester: Arc<ScriptedRequester>) -> (Arc<MemoryNoticeSink>, DataFetcher) {
    let transport = Arc::new(ScriptedHttpClient::default());
    let supplemental: Arc<dyn SupplementalSource> = Arc::new(YahooSource::new(transport.clone()));
    let notices = Arc::new(MemoryNoticeSink::new());
    let fetcher = DataFetcher::new(requester, supplemental, transport, notices.clone());
    (notices, fetcher)
}

/// Log sink shared between a `tracing` subscriber and the test body.
#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl CapturedLog {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("log lock")).into_owned()
    }
}

impl io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLog {
    type Writer = CapturedLog;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

type GuardedOp = fn(&DataFetcher, &Ticker, ResponseFormat) -> FetchResult;

fn metadata(fetcher: &DataFetcher, ticker: &Ticker, format: ResponseFormat) -> FetchResult {
    fetcher.fetch_metadata(ticker, format)
}

fn latest_price(fetcher: &DataFetcher, ticker: &Ticker, format: ResponseFormat) -> FetchResult {
    fetcher.fetch_latest_price(ticker, format)
}

fn historic_prices(fetcher: &DataFetcher, ticker: &Ticker, format: ResponseFormat) -> FetchResult {
    fetcher.fetch_historic_prices(ticker, &DateRange::default(), format)
}

fn guarded_operations() -> [(Endpoint, GuardedOp); 3] {
    [
        (Endpoint::Metadata, metadata as GuardedOp),
        (Endpoint::LatestPrice, latest_price as GuardedOp),
        (Endpoint::HistoricPrices, historic_prices as GuardedOp),
    ]
}

// =============================================================================
// Quota exhaustion
// =============================================================================

#[test]
fn when_quota_is_exhausted_every_guarded_operation_returns_the_sentinel() {
    for (endpoint, op) in guarded_operations() {
        // Given: a request collaborator whose quota is spent
        let requester = Arc::new(ScriptedRequester::always_exhausted(1));
        let (notices, fetcher) = fetcher_over(requester);

        // When: the operation runs
        let result = op(&fetcher, &Ticker::new("AAPL"), ResponseFormat::Json);

        // Then: no error escapes, the sentinel comes back, one notice is emitted
        assert_eq!(
            result.expect("quota exhaustion must not be an error"),
            None,
            "{endpoint}: sentinel"
        );
        let recorded = notices.notices();
        assert_eq!(recorded.len(), 1, "{endpoint}: notice count");
        assert_eq!(recorded[0].endpoint, endpoint);
        assert_eq!(recorded[0].message, "tokens exhausted");
    }
}

#[test]
fn exhausted_historic_prices_for_aapl_emits_exactly_one_message() {
    // Given: the production Tiingo collaborator with a spent token pool
    let config = ClientConfig::new(["demo"])
        .expect("valid config")
        .with_token_allowance(0);
    let transport = Arc::new(ScriptedHttpClient::default());
    let notices = Arc::new(MemoryNoticeSink::new());
    let fetcher =
        DataFetcher::with_transport(&config, transport.clone()).with_notice_sink(notices.clone());

    // When: historic prices are requested with the default range
    let result = fetcher.fetch_historic_prices(
        &Ticker::new("AAPL"),
        &DateRange::default(),
        ResponseFormat::Json,
    );

    // Then: sentinel, one notice, and no network traffic
    assert_eq!(result.expect("no error"), None);
    assert_eq!(notices.len(), 1);
    assert_eq!(
        notices.notices()[0].path,
        "daily/AAPL/prices?startDate=1900-1-1&endDate=2100-1-1"
    );
    assert_eq!(transport.request_count(), 0);
}

#[test]
fn default_sink_logs_one_warning_per_exhausted_call() {
    // Given: production wiring with its tracing-backed sink and no tokens
    let config = ClientConfig::new(Vec::<String>::new()).expect("valid config");
    let fetcher = DataFetcher::with_transport(&config, Arc::new(ScriptedHttpClient::default()));
    let log = CapturedLog::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(log.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();

    // When: two guarded calls run under the subscriber
    let (first, second) = tracing::subscriber::with_default(subscriber, || {
        (
            fetcher.fetch_historic_prices(
                &Ticker::new("AAPL"),
                &DateRange::default(),
                ResponseFormat::Json,
            ),
            fetcher.fetch_metadata(&Ticker::new("AAPL"), ResponseFormat::Json),
        )
    });

    // Then: each call logged exactly one warning on the quota target
    assert_eq!(first.expect("no error"), None);
    assert_eq!(second.expect("no error"), None);

    let output = log.contents();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 2, "unexpected log output: {output}");
    assert!(lines.iter().all(|line| line.contains("WARN")));
    assert!(lines.iter().all(|line| line.contains("ferrofetch::quota")));
    assert!(lines.iter().all(|line| line.contains("tokens exhausted")));
    assert!(lines[0].contains("endpoint=historic_prices"));
    assert!(lines[1].contains("endpoint=metadata"));
}

#[test]
fn exhaustion_fails_only_the_current_call() {
    // Given: one exhausted outcome followed by a normal response
    let requester = Arc::new(ScriptedRequester::new(vec![
        Ok(RequestOutcome::QuotaExhausted),
        Ok(RequestOutcome::Response(HttpResponse::ok_json(
            r#"{"ticker":"AAPL"}"#,
        ))),
    ]));
    let (notices, fetcher) = fetcher_over(requester);
    let ticker = Ticker::new("AAPL");

    // When: the same operation is called twice
    let first = fetcher
        .fetch_metadata(&ticker, ResponseFormat::Json)
        .expect("no error");
    let second = fetcher
        .fetch_metadata(&ticker, ResponseFormat::Json)
        .expect("no error");

    // Then: the fetcher did not disable itself after the first exhaustion
    assert_eq!(first, None);
    assert_eq!(second, Some(json!({"ticker": "AAPL"})));
    assert_eq!(notices.len(), 1);
}

#[test]
fn upstream_429_is_treated_as_quota_exhaustion() {
    // Given: Tiingo answers with Too Many Requests
    let config = ClientConfig::new(["demo"]).expect("valid config");
    let transport = Arc::new(ScriptedHttpClient::new(vec![Ok(HttpResponse::new(
        429,
        r#"{"detail":"Error: You have run over your hourly request allocation."}"#,
    ))]));
    let notices = Arc::new(MemoryNoticeSink::new());
    let fetcher =
        DataFetcher::with_transport(&config, transport.clone()).with_notice_sink(notices.clone());

    // When: the latest price is fetched
    let result = fetcher.fetch_latest_price(&Ticker::new("AAPL"), ResponseFormat::Json);

    // Then: the sentinel is returned and the usage report shows the spent token
    assert_eq!(result.expect("no error"), None);
    assert_eq!(notices.len(), 1);
    let usage = fetcher.api_usage_info();
    assert!(usage.exhausted);
    assert_eq!(transport.request_count(), 1, "no retry was attempted");
}

// =============================================================================
// Pass-through and other failures
// =============================================================================

#[test]
fn successful_json_payload_is_returned_unchanged() {
    for (endpoint, op) in guarded_operations() {
        let payload = json!([
            {"date": "2024-05-01T00:00:00.000Z", "close": 169.3, "adjClose": 168.8, "volume": 50383147},
            {"date": "2024-05-02T00:00:00.000Z", "close": 173.03, "adjClose": 172.52, "volume": 94214915}
        ]);
        let requester = Arc::new(ScriptedRequester::new(vec![Ok(RequestOutcome::Response(
            HttpResponse::ok_json(payload.to_string()),
        ))]));
        let (notices, fetcher) = fetcher_over(requester);

        let result = op(&fetcher, &Ticker::new("AAPL"), ResponseFormat::Json)
            .expect("fetch succeeds");

        assert_eq!(result, Some(payload), "{endpoint}: payload identity");
        assert!(notices.is_empty());
    }
}

#[test]
fn csv_format_fails_explicitly_without_touching_the_collaborator() {
    for (endpoint, op) in guarded_operations() {
        let requester = Arc::new(ScriptedRequester::new(Vec::new()));
        let (notices, fetcher) = fetcher_over(requester.clone());

        let error = op(&fetcher, &Ticker::new("AAPL"), ResponseFormat::Csv)
            .expect_err("csv is not implemented");

        assert_eq!(error.kind(), SourceErrorKind::UnsupportedFormat, "{endpoint}");
        assert!(requester.paths().is_empty());
        assert!(notices.is_empty());
    }
}

#[test]
fn non_quota_failures_propagate_unmodified() {
    let original = SourceError::upstream_status(404, "tiingo returned status 404 for 'daily/zzzz'");
    let requester = Arc::new(ScriptedRequester::new(vec![Err(original.clone())]));
    let (notices, fetcher) = fetcher_over(requester);

    let error = fetcher
        .fetch_metadata(&Ticker::new("zzzz"), ResponseFormat::Json)
        .expect_err("404 propagates");

    assert_eq!(error, original);
    assert!(notices.is_empty());
}

#[test]
fn tickers_are_forwarded_verbatim_into_paths() {
    let requester = Arc::new(ScriptedRequester::new(vec![
        Ok(RequestOutcome::Response(HttpResponse::ok_json("{}"))),
        Ok(RequestOutcome::Response(HttpResponse::ok_json("[]"))),
    ]));
    let (_, fetcher) = fetcher_over(requester.clone());

    let metadata = fetcher
        .fetch_metadata(&Ticker::new("brk-b"), ResponseFormat::Json)
        .expect("metadata fetch succeeds");
    let prices = fetcher
        .fetch_historic_prices(
            &Ticker::new("brk-b"),
            &DateRange::new("2020-1-1", "2020-12-31"),
            ResponseFormat::Json,
        )
        .expect("historic fetch succeeds");

    assert_eq!(metadata, Some(json!({})));
    assert_eq!(prices, Some(json!([])));

    assert_eq!(
        requester.paths(),
        vec![
            "daily/brk-b",
            "daily/brk-b/prices?startDate=2020-1-1&endDate=2020-12-31"
        ]
    );
}

#[test]
fn independently_configured_fetchers_do_not_share_quota() {
    let spent = ClientConfig::new(["a"])
        .expect("valid config")
        .with_token_allowance(0);
    let fresh = ClientConfig::new(["b"]).expect("valid config");

    let spent_fetcher = DataFetcher::with_transport(&spent, Arc::new(ScriptedHttpClient::default()))
        .with_notice_sink(Arc::new(MemoryNoticeSink::new()));
    let fresh_fetcher = DataFetcher::with_transport(
        &fresh,
        Arc::new(ScriptedHttpClient::new(vec![Ok(HttpResponse::ok_json(
            r#"{"ticker":"SPY"}"#,
        ))])),
    );

    let ticker = Ticker::new("SPY");
    assert_eq!(
        spent_fetcher
            .fetch_metadata(&ticker, ResponseFormat::Json)
            .expect("no error"),
        None
    );
    let value: Option<Value> = fresh_fetcher
        .fetch_metadata(&ticker, ResponseFormat::Json)
        .expect("no error");
    assert_eq!(value, Some(json!({"ticker": "SPY"})));
}
