//! Configuration management for click-assist
//!
//! Every tunable is fixed at build time. The two presets correspond to the
//! cadence/inactivity pairs the tool has shipped with.

use std::time::Duration;

use crate::ClickAssistError;

/// Mouse button that is monitored and synthesized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Named constant presets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// 90ms cadence, ±30ms jitter, 350ms inactivity timeout
    Standard,
    /// 100ms cadence, ±50ms jitter, 500ms inactivity timeout
    Relaxed,
}

/// Configuration for the click assist engine
#[derive(Debug, Clone)]
pub struct Config {
    /// Hold duration after which a press counts as a long press
    pub long_press_threshold: Duration,

    /// Number of presses inside `rapid_click_window` that enables rapid mode
    pub rapid_click_threshold: usize,

    /// Sliding window used to count recent presses
    pub rapid_click_window: Duration,

    /// Target cadence of synthesized clicks
    pub auto_click_interval: Duration,

    /// Maximum deviation from the cadence, in either direction
    pub auto_click_jitter: Duration,

    /// Rapid mode ends when no press has been seen for longer than this
    pub inactivity_timeout: Duration,

    /// Base sleep between polling ticks
    pub tick_interval: Duration,

    /// Every Nth tick sleeps twice as long
    pub sleep_stretch_every: u32,

    /// Seed for the jitter generator
    pub rng_seed: u64,

    /// Button to watch and to click
    pub button: MouseButton,

    /// Enable verbose logging
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_profile(Profile::Standard)
    }
}

impl Config {
    /// Build the configuration for a named preset
    pub fn from_profile(profile: Profile) -> Self {
        let (interval_ms, jitter_ms, inactivity_ms) = match profile {
            Profile::Standard => (90, 30, 350),
            Profile::Relaxed => (100, 50, 500),
        };

        Self {
            long_press_threshold: Duration::from_millis(150),
            rapid_click_threshold: 5,
            rapid_click_window: Duration::from_millis(1000),
            auto_click_interval: Duration::from_millis(interval_ms),
            auto_click_jitter: Duration::from_millis(jitter_ms),
            inactivity_timeout: Duration::from_millis(inactivity_ms),
            tick_interval: Duration::from_millis(1),
            sleep_stretch_every: 10,
            rng_seed: 0,
            button: MouseButton::Left,
            verbose: false,
        }
    }

    /// Use a different button
    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    /// Override the auto-click cadence and jitter
    pub fn with_cadence(mut self, interval: Duration, jitter: Duration) -> Self {
        self.auto_click_interval = interval;
        self.auto_click_jitter = jitter;
        self
    }

    /// Override the jitter seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Enable verbose logging
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Check the invariants the engine relies on.
    ///
    /// Jitter must stay below the cadence so `cadence - jitter` is a positive
    /// lower bound for every randomized delay.
    pub fn validate(&self) -> Result<(), ClickAssistError> {
        if self.auto_click_jitter >= self.auto_click_interval {
            return Err(ClickAssistError::InvalidConfig(format!(
                "jitter ({:?}) must be smaller than the auto-click interval ({:?})",
                self.auto_click_jitter, self.auto_click_interval
            )));
        }
        if self.tick_interval.is_zero() {
            return Err(ClickAssistError::InvalidConfig(
                "tick interval must be non-zero".to_string(),
            ));
        }
        if self.rapid_click_threshold == 0 {
            return Err(ClickAssistError::InvalidConfig(
                "rapid click threshold must be at least 1".to_string(),
            ));
        }
        if self.rapid_click_threshold > crate::ring_buffer::CAPACITY {
            return Err(ClickAssistError::InvalidConfig(format!(
                "rapid click threshold ({}) exceeds the click history size ({})",
                self.rapid_click_threshold,
                crate::ring_buffer::CAPACITY
            )));
        }
        if self.sleep_stretch_every == 0 {
            return Err(ClickAssistError::InvalidConfig(
                "sleep stretch period must be at least 1 tick".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_standard_profile() {
        let config = Config::default();
        assert_eq!(config.auto_click_interval, Duration::from_millis(90));
        assert_eq!(config.auto_click_jitter, Duration::from_millis(30));
        assert_eq!(config.inactivity_timeout, Duration::from_millis(350));
        assert_eq!(config.long_press_threshold, Duration::from_millis(150));
        assert_eq!(config.rapid_click_threshold, 5);
        assert_eq!(config.button, MouseButton::Left);
    }

    #[test]
    fn relaxed_profile_values() {
        let config = Config::from_profile(Profile::Relaxed);
        assert_eq!(config.auto_click_interval, Duration::from_millis(100));
        assert_eq!(config.auto_click_jitter, Duration::from_millis(50));
        assert_eq!(config.inactivity_timeout, Duration::from_millis(500));
    }

    #[test]
    fn presets_validate() {
        assert!(Config::from_profile(Profile::Standard).validate().is_ok());
        assert!(Config::from_profile(Profile::Relaxed).validate().is_ok());
    }

    #[test]
    fn rejects_jitter_not_below_cadence() {
        let config = Config::default()
            .with_cadence(Duration::from_millis(40), Duration::from_millis(40));
        assert!(matches!(
            config.validate(),
            Err(ClickAssistError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_zero_tick() {
        let mut config = Config::default();
        config.tick_interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_threshold_larger_than_history() {
        let mut config = Config::default();
        config.rapid_click_threshold = 9;
        assert!(config.validate().is_err());
    }
}
