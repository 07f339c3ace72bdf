//! Self-throttling for periodic handlers.
//!
//! The view and hatchery loops re-post themselves after every invocation; a
//! [`Pacer`] stretches each invocation to roughly one period of wall time.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    period_ms: u64,
}

impl Pacer {
    pub fn new(period_ms: u64) -> Self {
        Self { period_ms }
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Pause needed after work that began at `started_ms` and is finishing at
    /// `now_ms`.
    ///
    /// - Work that took less than a period pauses for the remainder.
    /// - Late work (or a clock that went backwards) does not pause at all.
    pub fn remaining(&self, started_ms: u64, now_ms: u64) -> Duration {
        if now_ms < started_ms {
            return Duration::ZERO;
        }
        let elapsed = now_ms - started_ms;
        Duration::from_millis(self.period_ms.saturating_sub(elapsed))
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(crate::types::PACE_MS)
    }
}
