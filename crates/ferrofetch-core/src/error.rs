use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::domain::ResponseFormat;

/// Validation errors raised while building configuration and request values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid response format '{value}', expected one of json, csv")]
    InvalidFormat { value: String },

    #[error("invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("API token at position {index} is blank")]
    BlankToken { index: usize },

    #[error("environment variable '{name}' has invalid value '{value}'")]
    InvalidEnvValue { name: &'static str, value: String },
}

/// Failure classification for every error that crosses the fetch boundary.
///
/// Quota exhaustion has no kind here; it is reported as a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    UpstreamStatus,
    InvalidResponse,
    InvalidRequest,
    UnsupportedFormat,
    Configuration,
}

/// Structured error returned by the request collaborators and the fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    status: Option<u16>,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            status: None,
        }
    }

    pub fn upstream_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::UpstreamStatus,
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidResponse,
            message: message.into(),
            status: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            status: None,
        }
    }

    pub fn unsupported_format(format: ResponseFormat) -> Self {
        Self {
            kind: SourceErrorKind::UnsupportedFormat,
            message: format!("response format '{format}' is not implemented"),
            status: None,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Configuration,
            message: message.into(),
            status: None,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status reported by the upstream, when the failure carried one.
    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::UpstreamStatus => "source.upstream_status",
            SourceErrorKind::InvalidResponse => "source.invalid_response",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::UnsupportedFormat => "source.unsupported_format",
            SourceErrorKind::Configuration => "source.configuration",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

impl From<ValidationError> for SourceError {
    fn from(value: ValidationError) -> Self {
        Self::invalid_request(value.to_string())
    }
}
