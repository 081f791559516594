//! Operator-visible diagnostic channel.
//!
//! The fetcher reports conditions it absorbs (today only quota exhaustion)
//! through a [`NoticeSink`] instead of failing the call.

use std::sync::Mutex;

use crate::domain::Endpoint;

/// Message emitted when the token pool has no budget left.
pub const TOKENS_EXHAUSTED: &str = "tokens exhausted";

/// A single diagnostic emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub endpoint: Endpoint,
    pub path: String,
    pub message: &'static str,
}

impl Notice {
    pub fn tokens_exhausted(endpoint: Endpoint, path: impl Into<String>) -> Self {
        Self {
            endpoint,
            path: path.into(),
            message: TOKENS_EXHAUSTED,
        }
    }
}

pub trait NoticeSink: Send + Sync {
    fn notice(&self, notice: &Notice);
}

/// Default sink: a `warn` event on the `ferrofetch::quota` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNoticeSink;

impl NoticeSink for TracingNoticeSink {
    fn notice(&self, notice: &Notice) {
        tracing::warn!(
            target: "ferrofetch::quota",
            endpoint = %notice.endpoint,
            path = %notice.path,
            "{}",
            notice.message
        );
    }
}

/// Sink that keeps every notice in memory.
#[derive(Debug, Default)]
pub struct MemoryNoticeSink {
    notices: Mutex<Vec<Notice>>,
}

impl MemoryNoticeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|notices| notices.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.notices.lock().map(|notices| notices.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NoticeSink for MemoryNoticeSink {
    fn notice(&self, notice: &Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice.clone());
        }
    }
}
