//! Call budget enforcement for the inference service
//!
//! Two budgets gate every classification call: a one-minute window capped
//! at 14 calls (one below the external 15-per-minute ceiling, so clock
//! skew and request latency never push a burst over the real limit) and a
//! per-run daily cap. The window wait blocks the caller for the remainder
//! of the current minute; the daily cap is a terminal stop signal, not an
//! error.
//!
//! Built on `tokio::time` so tests drive a paused clock instead of
//! sleeping for real.

use std::time::Duration;
use tokio::time::Instant;

/// Length of the rolling rate window
pub const WINDOW: Duration = Duration::from_secs(60);
/// Calls allowed per window; safety margin below the external 15/min quota
pub const CALLS_PER_WINDOW: u32 = 14;
/// Daily cap applied when neither CLI nor config overrides it
pub const DEFAULT_DAILY_LIMIT: u32 = 1000;

/// Outcome of gating one candidate call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Budget available; the caller may issue the call now
    Proceed,
    /// Daily budget spent; stop the run
    DailyLimitReached,
}

/// Owned rate-limit state, one per run, held by the batch driver
#[derive(Debug)]
pub struct RateGovernor {
    window_start: Instant,
    calls_this_window: u32,
    calls_today: u32,
    daily_limit: u32,
}

impl RateGovernor {
    pub fn new(daily_limit: u32) -> Self {
        Self {
            window_start: Instant::now(),
            calls_this_window: 0,
            calls_today: 0,
            daily_limit,
        }
    }

    /// Gate one candidate call
    ///
    /// Checks the daily budget, rolls the window forward if a minute has
    /// passed, and when the window budget is spent sleeps out the window
    /// remainder before allowing the call.
    pub async fn acquire(&mut self) -> RateDecision {
        if self.calls_today >= self.daily_limit {
            return RateDecision::DailyLimitReached;
        }

        let now = Instant::now();
        if now.duration_since(self.window_start) >= WINDOW {
            self.window_start = now;
            self.calls_this_window = 0;
        }

        if self.calls_this_window >= CALLS_PER_WINDOW {
            let wait = WINDOW - now.duration_since(self.window_start);
            tracing::info!(
                "Rate limit approaching. Waiting {:.1} seconds...",
                wait.as_secs_f64()
            );
            tokio::time::sleep(wait).await;
            self.window_start = Instant::now();
            self.calls_this_window = 0;
        }

        RateDecision::Proceed
    }

    /// Record one completed call against both budgets
    pub fn record_call(&mut self) {
        self.calls_this_window += 1;
        self.calls_today += 1;
    }

    pub fn calls_today(&self) -> u32 {
        self.calls_today
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }
}
