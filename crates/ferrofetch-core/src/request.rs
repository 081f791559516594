//! Token-gated request path.
//!
//! [`ApiRequester`] is the collaborator every guarded fetch goes through. It
//! reports quota exhaustion as [`RequestOutcome::QuotaExhausted`] rather than
//! as an error so call sites can branch on it directly.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::quota::{TokenPool, UsageReport};
use crate::SourceError;

const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Result of a request that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    Response(HttpResponse),
    QuotaExhausted,
}

/// Request collaborator contract.
pub trait ApiRequester: Send + Sync {
    /// Issues one request for `path`, relative to the API base URL.
    ///
    /// # Errors
    ///
    /// Transport failures and non-success statuses other than quota
    /// exhaustion.
    fn issue_request(&self, path: &str) -> Result<RequestOutcome, SourceError>;

    /// Current token usage.
    fn usage(&self) -> UsageReport;
}

/// Tiingo REST client with token rotation.
pub struct TiingoClient {
    http_client: Arc<dyn HttpClient>,
    tokens: TokenPool,
    base_url: String,
    timeout_ms: u64,
}

impl TiingoClient {
    pub fn new(http_client: Arc<dyn HttpClient>, config: &ClientConfig) -> Self {
        Self {
            http_client,
            tokens: TokenPool::new(config.tokens().iter().cloned(), config.token_allowance()),
            base_url: config.base_url().to_owned(),
            timeout_ms: config.timeout_ms(),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl ApiRequester for TiingoClient {
    fn issue_request(&self, path: &str) -> Result<RequestOutcome, SourceError> {
        let Some(lease) = self.tokens.acquire() else {
            tracing::debug!(path, "token pool spent; skipping upstream call");
            return Ok(RequestOutcome::QuotaExhausted);
        };

        let request = HttpRequest::get(self.url_for(path))
            .with_header("content-type", "application/json")
            .with_header("authorization", format!("Token {}", lease.token))
            .with_timeout_ms(self.timeout_ms);

        let response = self.http_client.execute(request).map_err(|error| {
            self.tokens.release(&lease);
            SourceError::unavailable(format!("tiingo transport error: {}", error.message()))
        })?;

        if response.status == STATUS_TOO_MANY_REQUESTS {
            tracing::debug!(path, token = lease.index + 1, "tiingo reported token over quota");
            self.tokens.mark_exhausted(&lease);
            return Ok(RequestOutcome::QuotaExhausted);
        }

        if !response.is_success() {
            return Err(SourceError::upstream_status(
                response.status,
                format!("tiingo returned status {} for '{path}'", response.status),
            ));
        }

        Ok(RequestOutcome::Response(response))
    }

    fn usage(&self) -> UsageReport {
        self.tokens.report()
    }
}
