use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// In-memory accounting of the API tokens owned by a request collaborator.
///
/// Tokens are handed out in configuration order; a token stays in use until
/// its allowance is spent or the upstream reports it as over quota.
#[derive(Debug)]
pub struct TokenPool {
    slots: Mutex<Vec<TokenSlot>>,
}

#[derive(Debug, Clone)]
struct TokenSlot {
    token: String,
    allowance: Option<u32>,
    used: u32,
    exhausted: bool,
}

impl TokenSlot {
    fn remaining(&self) -> Option<u32> {
        self.allowance
            .map(|allowance| allowance.saturating_sub(self.used))
    }

    fn is_available(&self) -> bool {
        !self.exhausted && self.remaining().map_or(true, |remaining| remaining > 0)
    }
}

/// Token selected for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenLease {
    pub index: usize,
    pub token: String,
}

/// Usage of a single token, safe to print.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub label: String,
    pub used: u32,
    pub allowance: Option<u32>,
    pub remaining: Option<u32>,
    pub exhausted: bool,
}

/// Snapshot of the whole pool returned by `api_usage_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageReport {
    pub tokens: Vec<TokenUsage>,
    pub total_used: u32,
    pub exhausted: bool,
}

impl TokenPool {
    pub fn new<I, S>(tokens: I, allowance: Option<u32>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let slots = tokens
            .into_iter()
            .map(|token| TokenSlot {
                token: token.into(),
                allowance,
                used: 0,
                exhausted: false,
            })
            .collect();
        Self {
            slots: Mutex::new(slots),
        }
    }

    /// Reserves one request on the first token that still has budget, or
    /// returns `None` when the pool is spent.
    ///
    /// Selection and reservation happen under one lock, so concurrent callers
    /// never share the last unit of an allowance.
    pub fn acquire(&self) -> Option<TokenLease> {
        let mut slots = self.slots.lock().ok()?;
        let (index, slot) = slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.is_available())?;
        slot.used = slot.used.saturating_add(1);
        Some(TokenLease {
            index,
            token: slot.token.clone(),
        })
    }

    /// Returns the reserved unit of a request that never reached the upstream.
    pub fn release(&self, lease: &TokenLease) {
        if let Ok(mut slots) = self.slots.lock() {
            if let Some(slot) = slots.get_mut(lease.index) {
                slot.used = slot.used.saturating_sub(1);
            }
        }
    }

    /// Marks the leased token as over quota regardless of local accounting.
    pub fn mark_exhausted(&self, lease: &TokenLease) {
        if let Ok(mut slots) = self.slots.lock() {
            if let Some(slot) = slots.get_mut(lease.index) {
                slot.exhausted = true;
            }
        }
    }

    pub fn report(&self) -> UsageReport {
        let slots = match self.slots.lock() {
            Ok(slots) => slots.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };

        let tokens: Vec<TokenUsage> = slots
            .iter()
            .enumerate()
            .map(|(index, slot)| TokenUsage {
                label: format!("token-{}", index + 1),
                used: slot.used,
                allowance: slot.allowance,
                remaining: slot.remaining(),
                exhausted: !slot.is_available(),
            })
            .collect();

        UsageReport {
            total_used: tokens.iter().map(|usage| usage.used).sum(),
            exhausted: tokens.iter().all(|usage| usage.exhausted),
            tokens,
        }
    }
}
