//! # Ferrofetch Core
//!
//! Quota-aware client layer over the Tiingo end-of-day API, with Yahoo
//! Finance as the supplemental source for option and ownership data.
//!
//! ## Overview
//!
//! Every call is a single blocking request/response round trip. The one
//! condition handled locally is quota exhaustion on the token-gated path:
//! it is reported to a [`NoticeSink`] and surfaces as `Ok(None)`, leaving the
//! caller to decide where to fetch from instead. There is no retry, cache or
//! rate limiting.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`catalog`] | Zip/CSV decoding and filtering of the ticker catalog |
//! | [`config`] | Explicit credentials and endpoint configuration |
//! | [`diagnostics`] | Operator-visible notices |
//! | [`domain`] | Ticker, date range, response format, endpoints |
//! | [`error`] | Error types |
//! | [`fetcher`] | [`DataFetcher`], one operation per data kind |
//! | [`http_client`] | Blocking HTTP transport abstraction |
//! | [`quota`] | Token pool accounting |
//! | [`request`] | Token-gated request collaborator |
//! | [`supplemental`] | Yahoo Finance backed pass-through source |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ferrofetch_core::{ClientConfig, DataFetcher, ResponseFormat, Ticker};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new(["my-tiingo-token"])?;
//!     let fetcher = DataFetcher::from_config(&config)?;
//!
//!     let ticker = Ticker::new("AAPL");
//!     if let Some(metadata) = fetcher.fetch_metadata(&ticker, ResponseFormat::Json)? {
//!         println!("{metadata}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Security
//!
//! API tokens are redacted from `Debug` output and usage reports.

pub mod catalog;
pub mod config;
pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod http_client;
pub mod quota;
pub mod request;
pub mod supplemental;

pub use catalog::{CatalogFilter, CatalogRow};
pub use config::ClientConfig;
pub use diagnostics::{MemoryNoticeSink, Notice, NoticeSink, TracingNoticeSink};
pub use domain::{DateRange, Endpoint, ResponseFormat, Ticker};
pub use error::{SourceError, SourceErrorKind, ValidationError};
pub use fetcher::{DataFetcher, FetchResult};
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient, ScriptedHttpClient,
};
pub use quota::{TokenPool, TokenUsage, UsageReport};
pub use request::{ApiRequester, RequestOutcome, TiingoClient};
pub use supplemental::{SupplementalSource, YahooSource};
