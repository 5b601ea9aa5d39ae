//! Press tracking and mode transitions
//!
//! Fed one sample of the physical button per tick. Press edges go into the
//! click history, long holds cancel rapid mode, and release edges ask the
//! classifier whether the recent pattern is a rapid-click burst.

use std::time::{Duration, Instant};

use crate::classifier::RapidClickClassifier;
use crate::config::Config;
use crate::ring_buffer::ClickRingBuffer;

/// Physical state of the monitored button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressState {
    Released,
    Pressed,
}

impl PressState {
    pub fn from_pressed(pressed: bool) -> Self {
        if pressed {
            Self::Pressed
        } else {
            Self::Released
        }
    }
}

/// Current assist mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    /// Button is held past the long-press threshold
    LongPress,
    /// Clicks are being synthesized while the button is up
    RapidClick,
}

/// Why rapid mode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// A hold crossed the long-press threshold
    LongPress,
    /// A release no longer matched the rapid-click pattern
    PatternBroken,
    /// No press for longer than the inactivity timeout
    Inactivity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    RapidStarted,
    RapidEnded(ExitReason),
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    pub change: Option<ModeChange>,
    /// Rapid mode is active and the button is up, so the auto-clicker may fire
    pub auto_click: bool,
}

/// Tracks press/release edges and owns the click history.
///
/// All state is mutated by the polling thread only.
#[derive(Debug)]
pub struct PressStateMachine {
    history: ClickRingBuffer,
    classifier: RapidClickClassifier,
    long_press_threshold: Duration,
    previous: PressState,
    press_start: Option<Instant>,
    long_press_detected: bool,
    rapid_mode: bool,
}

impl PressStateMachine {
    pub fn new(config: &Config, epoch: Instant) -> Self {
        Self {
            history: ClickRingBuffer::new(epoch),
            classifier: RapidClickClassifier::from_config(config),
            long_press_threshold: config.long_press_threshold,
            previous: PressState::Released,
            press_start: None,
            long_press_detected: false,
            rapid_mode: false,
        }
    }

    /// Advance by one sample taken at `now`
    pub fn step(&mut self, current: PressState, now: Instant) -> TickOutcome {
        let previous = std::mem::replace(&mut self.previous, current);

        match (previous, current) {
            (PressState::Released, PressState::Pressed) => {
                self.on_press(now);
                TickOutcome::default()
            }
            (PressState::Pressed, PressState::Pressed) => TickOutcome {
                change: self.on_hold(now),
                auto_click: false,
            },
            (PressState::Pressed, PressState::Released) => TickOutcome {
                change: self.on_release(now),
                auto_click: false,
            },
            (PressState::Released, PressState::Released) => self.on_idle(now),
        }
    }

    pub fn mode(&self) -> Mode {
        if self.rapid_mode {
            Mode::RapidClick
        } else if self.previous == PressState::Pressed && self.long_press_detected {
            Mode::LongPress
        } else {
            Mode::Idle
        }
    }

    /// Whether the current (or most recent) hold crossed the long-press threshold
    pub fn long_press_detected(&self) -> bool {
        self.long_press_detected
    }

    pub fn history(&self) -> &ClickRingBuffer {
        &self.history
    }

    fn on_press(&mut self, now: Instant) {
        self.press_start = Some(now);
        self.long_press_detected = false;
        self.history.record(now);
    }

    fn on_hold(&mut self, now: Instant) -> Option<ModeChange> {
        if self.long_press_detected {
            return None;
        }
        let start = self.press_start?;
        if now.saturating_duration_since(start) < self.long_press_threshold {
            return None;
        }

        self.long_press_detected = true;
        if self.rapid_mode {
            self.rapid_mode = false;
            return Some(ModeChange::RapidEnded(ExitReason::LongPress));
        }
        None
    }

    fn on_release(&mut self, now: Instant) -> Option<ModeChange> {
        if self.long_press_detected {
            return None;
        }

        let rapid = self.classifier.is_rapid_clicking(&self.history, now);
        match (rapid, self.rapid_mode) {
            (true, false) => {
                self.rapid_mode = true;
                Some(ModeChange::RapidStarted)
            }
            (false, true) => {
                self.rapid_mode = false;
                Some(ModeChange::RapidEnded(ExitReason::PatternBroken))
            }
            _ => None,
        }
    }

    fn on_idle(&mut self, now: Instant) -> TickOutcome {
        if !self.rapid_mode {
            return TickOutcome::default();
        }

        // A click due on this tick still fires even when inactivity ends
        // rapid mode here
        let change = if self.classifier.should_stop_rapid_mode(&self.history, now) {
            self.rapid_mode = false;
            Some(ModeChange::RapidEnded(ExitReason::Inactivity))
        } else {
            None
        };

        TickOutcome {
            change,
            auto_click: true,
        }
    }
}
