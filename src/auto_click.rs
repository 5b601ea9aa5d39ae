//! Randomized auto-click cadence
//!
//! Each gap between synthesized clicks is drawn uniformly from
//! `[interval - jitter, interval + jitter]` so the output never settles into a
//! fixed period. A draw that repeats the previous gap is redrawn.

use std::time::{Duration, Instant};

use crate::config::Config;

/// Decides when the next synthetic click is due
#[derive(Debug)]
pub struct AutoClickDriver {
    min_ms: u64,
    max_ms: u64,
    rng: fastrand::Rng,
    next_delay: Duration,
    last_click: Option<Instant>,
    clicks: u64,
}

impl AutoClickDriver {
    /// Create a driver from the cadence settings.
    ///
    /// `config` is expected to have passed [`Config::validate`], which keeps
    /// the lower bound positive.
    pub fn new(config: &Config) -> Self {
        let interval = config.auto_click_interval.as_millis() as u64;
        let jitter = config.auto_click_jitter.as_millis() as u64;

        let mut driver = Self {
            min_ms: interval.saturating_sub(jitter),
            max_ms: interval.saturating_add(jitter),
            rng: fastrand::Rng::with_seed(config.rng_seed),
            next_delay: Duration::ZERO,
            last_click: None,
            clicks: 0,
        };
        driver.next_delay = driver.draw_delay(None);
        driver
    }

    /// Inclusive bounds of every gap
    pub fn bounds(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.min_ms),
            Duration::from_millis(self.max_ms),
        )
    }

    /// True when no click has been sent yet or the drawn gap has elapsed
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_click {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.next_delay,
        }
    }

    /// Note that a click was synthesized at `now` and draw the next gap
    pub fn record_click(&mut self, now: Instant) {
        self.last_click = Some(now);
        self.clicks += 1;
        self.next_delay = self.draw_delay(Some(self.next_delay));
    }

    /// Gap the driver is currently waiting for
    pub fn next_delay(&self) -> Duration {
        self.next_delay
    }

    /// When the last synthetic click was sent, if any
    pub fn last_click(&self) -> Option<Instant> {
        self.last_click
    }

    /// Clicks synthesized so far
    pub fn clicks(&self) -> u64 {
        self.clicks
    }

    fn draw_delay(&mut self, previous: Option<Duration>) -> Duration {
        let previous_ms = previous.map(|d| d.as_millis() as u64);
        let mut ms = self.rng.u64(self.min_ms..=self.max_ms);
        while self.min_ms < self.max_ms && Some(ms) == previous_ms {
            ms = self.rng.u64(self.min_ms..=self.max_ms);
        }
        Duration::from_millis(ms)
    }
}
