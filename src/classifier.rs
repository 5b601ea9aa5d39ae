//! Rapid-click detection over the press history

use std::time::{Duration, Instant};

use crate::config::Config;
use crate::ring_buffer::ClickRingBuffer;

/// Decides when a burst of presses means the user wants rapid clicking
#[derive(Debug, Clone)]
pub struct RapidClickClassifier {
    window: Duration,
    threshold: usize,
    inactivity_timeout: Duration,
}

impl RapidClickClassifier {
    pub fn new(window: Duration, threshold: usize, inactivity_timeout: Duration) -> Self {
        Self {
            window,
            threshold,
            inactivity_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.rapid_click_window,
            config.rapid_click_threshold,
            config.inactivity_timeout,
        )
    }

    /// True when at least `threshold` presses fall inside the window ending at `now`.
    ///
    /// The history is chronological, so the scan stops at the first entry
    /// older than the cutoff, or as soon as enough presses have matched.
    pub fn is_rapid_clicking(&self, history: &ClickRingBuffer, now: Instant) -> bool {
        let cutoff = now.checked_sub(self.window);

        let matched = history
            .iter_newest_first()
            .take_while(|event| cutoff.map_or(true, |cutoff| event.timestamp >= cutoff))
            .take(self.threshold)
            .count();

        matched >= self.threshold
    }

    /// True when there is no history or the latest press is older than the
    /// inactivity timeout.
    pub fn should_stop_rapid_mode(&self, history: &ClickRingBuffer, now: Instant) -> bool {
        match history.latest() {
            None => true,
            Some(last) => now.saturating_duration_since(last.timestamp) > self.inactivity_timeout,
        }
    }
}
