//! Behavior tests for the ticker catalog listing.

use std::io::{Cursor, Write};
use std::sync::Arc;

use ferrofetch_core::{
    CatalogFilter, ClientConfig, DataFetcher, HttpError, HttpResponse, ScriptedHttpClient,
    SourceErrorKind,
};
use serde_json::Value;
use zip::write::FileOptions;

const CATALOG_URL: &str = "https://catalog.test/supported_tickers.zip";

fn zip_archive(member: &str, contents: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file(member, FileOptions::<'_, ()>::default())
        .expect("start zip member");
    writer
        .write_all(contents.as_bytes())
        .expect("write zip member");
    writer.finish().expect("finish zip").into_inner()
}

fn fetcher_serving(
    responses: Vec<Result<HttpResponse, HttpError>>,
) -> (Arc<ScriptedHttpClient>, DataFetcher) {
    let transport = Arc::new(ScriptedHttpClient::new(responses));
    let config = ClientConfig::new(["unused"])
        .expect("valid config")
        .with_catalog_url(CATALOG_URL);
    let fetcher = DataFetcher::with_transport(&config, transport.clone());
    (transport, fetcher)
}

fn catalog_response(table: &str) -> Result<HttpResponse, HttpError> {
    Ok(HttpResponse::new(
        200,
        zip_archive("supported_tickers.csv", table),
    ))
}

fn symbols(records: &[String]) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            let value: Value = serde_json::from_str(record).expect("record is json");
            value["symbol"].as_str().expect("symbol field").to_owned()
        })
        .collect()
}

const TWO_ROWS: &str = "symbol,assetType\nAAPL,Stock\nSPY,ETF\n";

// =============================================================================
// Filtering and ordering
// =============================================================================

#[test]
fn empty_filter_returns_every_row_in_source_order() {
    let (transport, fetcher) = fetcher_serving(vec![catalog_response(TWO_ROWS)]);

    let records = fetcher
        .fetch_ticker_catalog(&CatalogFilter::all())
        .expect("catalog decodes");

    assert_eq!(
        records,
        vec![
            r#"{"symbol":"AAPL","assetType":"Stock"}"#,
            r#"{"symbol":"SPY","assetType":"ETF"}"#
        ]
    );

    let request = &transport.requests()[0];
    assert_eq!(request.url, CATALOG_URL);
    assert!(
        !request.headers.contains_key("authorization"),
        "catalog download is unauthenticated"
    );
}

#[test]
fn etf_filter_returns_only_etf_rows() {
    let (_, fetcher) = fetcher_serving(vec![catalog_response(TWO_ROWS)]);

    let records = fetcher
        .fetch_ticker_catalog(&CatalogFilter::asset_types(["ETF"]))
        .expect("catalog decodes");

    assert_eq!(records, vec![r#"{"symbol":"SPY","assetType":"ETF"}"#]);
}

#[test]
fn filtered_subset_preserves_relative_order() {
    let table = "symbol,exchange,assetType\n\
        QQQ,NASDAQ,ETF\n\
        AAPL,NASDAQ,Stock\n\
        IVV,NYSE ARCA,ETF\n\
        VTSAX,NMFQS,Mutual Fund\n\
        DIA,NYSE ARCA,ETF\n";
    let (_, fetcher) = fetcher_serving(vec![catalog_response(table), catalog_response(table)]);

    let all = fetcher
        .fetch_ticker_catalog(&CatalogFilter::all())
        .expect("catalog decodes");
    let etfs = fetcher
        .fetch_ticker_catalog(&CatalogFilter::asset_types(["ETF"]))
        .expect("catalog decodes");

    assert_eq!(symbols(&all), ["QQQ", "AAPL", "IVV", "VTSAX", "DIA"]);
    assert_eq!(symbols(&etfs), ["QQQ", "IVV", "DIA"]);
    assert!(etfs.iter().all(|record| all.contains(record)));
}

#[test]
fn filter_without_matches_yields_empty_list() {
    let (_, fetcher) = fetcher_serving(vec![catalog_response(TWO_ROWS)]);

    let records = fetcher
        .fetch_ticker_catalog(&CatalogFilter::asset_types(["Mutual Fund"]))
        .expect("catalog decodes");

    assert!(records.is_empty());
}

#[test]
fn repeated_listing_of_the_same_archive_is_identical() {
    let (_, fetcher) =
        fetcher_serving(vec![catalog_response(TWO_ROWS), catalog_response(TWO_ROWS)]);
    let filter = CatalogFilter::asset_types(["ETF"]);

    let first = fetcher.fetch_ticker_catalog(&filter).expect("first listing");
    let second = fetcher.fetch_ticker_catalog(&filter).expect("second listing");

    assert_eq!(first, second);
}

#[test]
fn typed_rows_expose_fields_by_name() {
    let (_, fetcher) = fetcher_serving(vec![catalog_response(TWO_ROWS)]);

    let rows = fetcher
        .fetch_catalog_rows(&CatalogFilter::all())
        .expect("catalog decodes");

    assert_eq!(rows[1].get("symbol"), Some("SPY"));
    assert_eq!(rows[1].asset_type(), Some("ETF"));
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn archive_without_the_table_is_an_invalid_response() {
    let archive = zip_archive("README.txt", "nothing here");
    let (_, fetcher) = fetcher_serving(vec![Ok(HttpResponse::new(200, archive))]);

    let error = fetcher
        .fetch_ticker_catalog(&CatalogFilter::all())
        .expect_err("missing member");

    assert_eq!(error.kind(), SourceErrorKind::InvalidResponse);
    assert!(error.message().contains("supported_tickers.csv"));
}

#[test]
fn download_failures_propagate() {
    let (_, fetcher) = fetcher_serving(vec![
        Ok(HttpResponse::new(503, "unavailable")),
        Err(HttpError::new("dns failure")),
    ]);

    let status = fetcher
        .fetch_ticker_catalog(&CatalogFilter::all())
        .expect_err("503 fails");
    assert_eq!(status.kind(), SourceErrorKind::UpstreamStatus);

    let transport = fetcher
        .fetch_ticker_catalog(&CatalogFilter::all())
        .expect_err("transport fails");
    assert_eq!(transport.kind(), SourceErrorKind::Unavailable);
}
