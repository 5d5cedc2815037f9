//! Client-side admission control for generation requests.
//!
//! A sliding-window approximation: the call count is never zeroed on a timer.
//! Once a full window has passed since the last recorded call the time check
//! admits regardless of the count, which keeps accumulating until `reset`.

use chrono::{DateTime, Utc};

pub const RATE_WINDOW_MS: i64 = 60_000;
pub const MAX_CALLS_PER_WINDOW: u32 = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateState {
    pub call_count: u32,
    pub last_call: Option<DateTime<Utc>>,
}

impl RateState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_submit(&self, now: DateTime<Utc>) -> bool {
        let Some(last_call) = self.last_call else {
            return true;
        };

        let elapsed_ms = (now - last_call).num_milliseconds();
        elapsed_ms > RATE_WINDOW_MS || self.call_count < MAX_CALLS_PER_WINDOW
    }

    /// Count a submission up front, before any network call.
    pub fn record_call(&mut self, now: DateTime<Utc>) {
        self.call_count = self.call_count.saturating_add(1);
        self.last_call = Some(now);
    }

    /// Undo `record_call` after a failed submission.
    pub fn rollback(&mut self) {
        self.call_count = self.call_count.saturating_sub(1);
        self.last_call = None;
    }

    pub fn reset(&mut self) {
        self.call_count = 0;
        self.last_call = None;
    }
}
