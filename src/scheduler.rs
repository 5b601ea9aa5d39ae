//! Polling loop and cooperative shutdown
//!
//! The engine samples the button once per tick, runs the state machine, fires
//! due auto-clicks and sleeps. Every `sleep_stretch_every` ticks the sleep is
//! doubled to cut timer overhead, which adds at most one base tick of
//! detection latency on those ticks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::auto_click::AutoClickDriver;
use crate::config::Config;
use crate::input_listener::ButtonSampler;
use crate::input_simulator::InputSynthesizer;
use crate::state_machine::{
    ExitReason, Mode, ModeChange, PressState, PressStateMachine, TickOutcome,
};
use crate::ClickAssistError;

/// Cloneable stop signal shared between the engine and whoever owns shutdown
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the engine to exit after its current tick. Safe to call repeatedly.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}

/// Per-tick sleep with periodic doubling
#[derive(Debug, Clone)]
pub struct TickPacer {
    base: Duration,
    stretch_every: u32,
    counter: u32,
}

impl TickPacer {
    pub fn new(base: Duration, stretch_every: u32) -> Self {
        Self {
            base,
            stretch_every: stretch_every.max(1),
            counter: 0,
        }
    }

    /// Sleep to take after the current tick
    pub fn next_sleep(&mut self) -> Duration {
        self.counter += 1;
        if self.counter >= self.stretch_every {
            self.counter = 0;
            self.base * 2
        } else {
            self.base
        }
    }
}

/// Counters reported when the loop exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub synthesized_clicks: u64,
    pub rapid_sessions: u64,
}

/// The click assist engine
pub struct ClickAssist<S, Y> {
    config: Config,
    machine: PressStateMachine,
    driver: AutoClickDriver,
    sampler: S,
    synthesizer: Y,
    stop: StopHandle,
    pacer: TickPacer,
    summary: RunSummary,
}

impl<S: ButtonSampler, Y: InputSynthesizer> ClickAssist<S, Y> {
    pub fn new(
        config: Config,
        sampler: S,
        synthesizer: Y,
        stop: StopHandle,
    ) -> Result<Self, ClickAssistError> {
        config.validate()?;

        info!("- Long press: {}ms", config.long_press_threshold.as_millis());
        info!(
            "- Rapid click: {} presses within {}ms",
            config.rapid_click_threshold,
            config.rapid_click_window.as_millis()
        );
        info!(
            "- Auto-click interval: {}ms ±{}ms",
            config.auto_click_interval.as_millis(),
            config.auto_click_jitter.as_millis()
        );
        info!("- Inactivity timeout: {}ms", config.inactivity_timeout.as_millis());
        info!("- Tick interval: {}ms", config.tick_interval.as_millis());

        Ok(Self {
            machine: PressStateMachine::new(&config, Instant::now()),
            driver: AutoClickDriver::new(&config),
            pacer: TickPacer::new(config.tick_interval, config.sleep_stretch_every),
            config,
            sampler,
            synthesizer,
            stop,
            summary: RunSummary::default(),
        })
    }

    /// Run one iteration of the loop as of `now`
    pub fn tick(&mut self, now: Instant) -> Result<TickOutcome, ClickAssistError> {
        let pressed = self.sampler.is_pressed()?;
        let outcome = self.machine.step(PressState::from_pressed(pressed), now);
        self.summary.ticks += 1;

        if let Some(change) = outcome.change {
            self.log_change(change);
        }

        if outcome.auto_click && self.driver.is_due(now) {
            self.sampler.expect_synthetic_click();
            self.synthesizer.click(self.config.button)?;
            self.driver.record_click(now);
            self.summary.synthesized_clicks += 1;
            debug!(
                "Auto-click #{} sent, next in {:?}",
                self.driver.clicks(),
                self.driver.next_delay()
            );
        }

        Ok(outcome)
    }

    /// Poll until the stop handle fires or a collaborator fails
    pub fn run(mut self) -> Result<RunSummary, ClickAssistError> {
        info!("Click assist running");

        while !self.stop.is_stopped() {
            self.tick(Instant::now())?;
            thread::sleep(self.pacer.next_sleep());
        }

        info!(
            "Click assist stopped after {} ticks ({} auto-clicks, {} rapid sessions)",
            self.summary.ticks, self.summary.synthesized_clicks, self.summary.rapid_sessions
        );
        Ok(self.summary)
    }

    pub fn mode(&self) -> Mode {
        self.machine.mode()
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    fn log_change(&mut self, change: ModeChange) {
        match change {
            ModeChange::RapidStarted => {
                self.summary.rapid_sessions += 1;
                info!("*** Rapid click mode started ***");
            }
            ModeChange::RapidEnded(ExitReason::LongPress) => {
                info!("*** Rapid click mode ended (long press) ***");
            }
            ModeChange::RapidEnded(ExitReason::PatternBroken) => {
                info!("*** Rapid click mode ended ***");
            }
            ModeChange::RapidEnded(ExitReason::Inactivity) => {
                info!("*** Rapid click mode ended (inactive) ***");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pacer_doubles_every_nth_tick() {
        let base = Duration::from_millis(1);
        let mut pacer = TickPacer::new(base, 10);
        let sleeps: Vec<Duration> = (0..20).map(|_| pacer.next_sleep()).collect();

        for (i, sleep) in sleeps.iter().enumerate() {
            if (i + 1) % 10 == 0 {
                assert_eq!(*sleep, base * 2, "tick {}", i);
            } else {
                assert_eq!(*sleep, base, "tick {}", i);
            }
        }
    }

    #[test]
    fn pacer_with_period_one_always_doubles() {
        let base = Duration::from_millis(1);
        let mut pacer = TickPacer::new(base, 1);
        assert_eq!(pacer.next_sleep(), base * 2);
        assert_eq!(pacer.next_sleep(), base * 2);
    }

    #[test]
    fn stop_is_idempotent_and_shared() {
        let handle = StopHandle::new();
        let clone = handle.clone();
        assert!(!clone.is_stopped());

        handle.stop();
        handle.stop();
        clone.stop();
        assert!(handle.is_stopped());
        assert!(clone.is_stopped());
    }
}
