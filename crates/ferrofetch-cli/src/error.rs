use ferrofetch_core::{SourceError, SourceErrorKind};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ferrofetch_core::ValidationError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("{}", ferrofetch_core::diagnostics::TOKENS_EXHAUSTED)]
    TokensExhausted,

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Source(error) => match error.kind() {
                SourceErrorKind::InvalidRequest
                | SourceErrorKind::UnsupportedFormat
                | SourceErrorKind::Configuration => 2,
                SourceErrorKind::Unavailable
                | SourceErrorKind::UpstreamStatus
                | SourceErrorKind::InvalidResponse => 6,
            },
            Self::TokensExhausted => 3,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}
