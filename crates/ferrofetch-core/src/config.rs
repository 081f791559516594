//! Explicit client configuration.
//!
//! Credentials and endpoints are carried by a [`ClientConfig`] value that the
//! caller builds and hands to [`DataFetcher::from_config`]. Nothing is read
//! from process state after construction, so differently configured fetchers
//! can live side by side.
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `FERROFETCH_TIINGO_TOKENS` | Comma-separated API tokens | none |
//! | `FERROFETCH_TIINGO_BASE_URL` | Tiingo REST base URL | `https://api.tiingo.com/tiingo/` |
//! | `FERROFETCH_TOKEN_ALLOWANCE` | Requests allowed per token | unmetered |
//! | `FERROFETCH_TIMEOUT_MS` | Per-request timeout | `10000` |
//!
//! Without tokens the guarded fetches report quota exhaustion on every call;
//! the catalog listing and the supplemental source still work.
//!
//! [`DataFetcher::from_config`]: crate::DataFetcher::from_config

use crate::ValidationError;

pub const DEFAULT_TIINGO_BASE_URL: &str = "https://api.tiingo.com/tiingo/";
pub const DEFAULT_CATALOG_URL: &str =
    "https://apimedia.tiingo.com/docs/tiingo/daily/supported_tickers.zip";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

pub const ENV_TOKENS: &str = "FERROFETCH_TIINGO_TOKENS";
pub const ENV_BASE_URL: &str = "FERROFETCH_TIINGO_BASE_URL";
pub const ENV_TOKEN_ALLOWANCE: &str = "FERROFETCH_TOKEN_ALLOWANCE";
pub const ENV_TIMEOUT_MS: &str = "FERROFETCH_TIMEOUT_MS";

/// Credentials and endpoints for one fetcher instance.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    tokens: Vec<String>,
    token_allowance: Option<u32>,
    base_url: String,
    catalog_url: String,
    timeout_ms: u64,
}

impl ClientConfig {
    /// Creates a configuration for the given API tokens, tried in order. An
    /// empty list is allowed.
    pub fn new<I, S>(tokens: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        if let Some(index) = tokens.iter().position(|token| token.trim().is_empty()) {
            return Err(ValidationError::BlankToken { index });
        }

        Ok(Self {
            tokens,
            token_allowance: None,
            base_url: String::from(DEFAULT_TIINGO_BASE_URL),
            catalog_url: String::from(DEFAULT_CATALOG_URL),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        })
    }

    /// Loads the configuration from `FERROFETCH_*` environment variables.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_tokens = lookup(ENV_TOKENS).unwrap_or_default();
        let tokens = raw_tokens
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(String::from)
            .collect::<Vec<_>>();
        let mut config = Self::new(tokens)?;

        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            config = config.with_base_url(base_url.trim());
        }

        if let Some(raw) = lookup(ENV_TOKEN_ALLOWANCE).filter(|v| !v.trim().is_empty()) {
            let allowance = raw.trim().parse::<u32>().map_err(|_| {
                ValidationError::InvalidEnvValue {
                    name: ENV_TOKEN_ALLOWANCE,
                    value: raw.clone(),
                }
            })?;
            config = config.with_token_allowance(allowance);
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_MS).filter(|v| !v.trim().is_empty()) {
            let timeout_ms = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ValidationError::InvalidEnvValue {
                    name: ENV_TIMEOUT_MS,
                    value: raw.clone(),
                })?;
            config = config.with_timeout_ms(timeout_ms);
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        self.base_url = base_url;
        self
    }

    pub fn with_catalog_url(mut self, catalog_url: impl Into<String>) -> Self {
        self.catalog_url = catalog_url.into();
        self
    }

    /// Caps every token at `allowance` successful requests.
    pub fn with_token_allowance(mut self, allowance: u32) -> Self {
        self.token_allowance = Some(allowance);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub const fn token_allowance(&self) -> Option<u32> {
        self.token_allowance
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn catalog_url(&self) -> &str {
        &self.catalog_url
    }

    pub const fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }
}

// Tokens are secrets and never end up in logs.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("tokens", &format_args!("[{} redacted]", self.tokens.len()))
            .field("token_allowance", &self.token_allowance)
            .field("base_url", &self.base_url)
            .field("catalog_url", &self.catalog_url)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}
