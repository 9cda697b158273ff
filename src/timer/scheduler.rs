//! Countdown tick scheduling
//!
//! A [`TickTimer`] is either armed (yielding one tick per period) or
//! cancelled. A cancelled timer never completes, so it can sit in a
//! `select!` branch without firing against a stale attempt.

use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Cancellable fixed-period tick source
#[derive(Debug)]
pub struct TickTimer {
    period: Duration,
    interval: Option<Interval>,
}

impl TickTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    /// Start ticking; the first tick lands one full period from now
    ///
    /// Arming an armed timer restarts its phase.
    pub fn arm(&mut self) {
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    /// Drop any pending tick
    pub fn cancel(&mut self) {
        self.interval = None;
    }

    pub fn is_armed(&self) -> bool {
        self.interval.is_some()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait for the next tick
    ///
    /// Pends forever while cancelled. Cancel-safe.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
