//! Raw button sampling using rdev
//!
//! A background thread mirrors the physical state of one mouse button into an
//! atomic flag. The polling loop reads the flag once per tick.

use rdev::{listen, Button, Event, EventType};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::config::MouseButton;
use crate::ClickAssistError;

/// Reads whether the monitored button is currently held down
pub trait ButtonSampler {
    /// Must not block
    fn is_pressed(&self) -> Result<bool, ClickAssistError>;

    /// Called right before a synthetic click is injected so the sampler can
    /// ignore the echo of that click
    fn expect_synthetic_click(&self) {}
}

/// How long a synthetic click may take to come back through the listener.
/// Expectations older than this are dropped so a lost echo cannot swallow a
/// later physical press.
pub const ECHO_WINDOW: Duration = Duration::from_millis(20);

fn to_rdev(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
        MouseButton::Middle => Button::Middle,
    }
}

#[derive(Debug, Default)]
struct Shared {
    pressed: AtomicBool,
    /// When each still-unmatched synthetic click was sent
    pending_echoes: Mutex<VecDeque<Instant>>,
    /// Set while the release of a swallowed synthetic press is outstanding
    swallow_release: AtomicBool,
    failure: OnceLock<String>,
}

impl Shared {
    fn expect_echo(&self, sent_at: Instant) {
        let mut pending = self.pending_echoes.lock().unwrap_or_else(|e| e.into_inner());
        Self::expire(&mut pending, sent_at);
        pending.push_back(sent_at);
    }

    /// Consume the oldest unexpired expectation, if any
    fn take_echo(&self, now: Instant) -> bool {
        let mut pending = self.pending_echoes.lock().unwrap_or_else(|e| e.into_inner());
        Self::expire(&mut pending, now);
        pending.pop_front().is_some()
    }

    fn expire(pending: &mut VecDeque<Instant>, now: Instant) {
        while let Some(sent_at) = pending.front() {
            if now.saturating_duration_since(*sent_at) <= ECHO_WINDOW {
                break;
            }
            debug!("Synthetic click echo never arrived, dropping expectation");
            pending.pop_front();
        }
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.pending_echoes.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn on_event(&self, event_type: EventType, target: Button, now: Instant) {
        match event_type {
            EventType::ButtonPress(button) if button == target => {
                if self.take_echo(now) {
                    self.swallow_release.store(true, Ordering::Release);
                    return;
                }
                debug!("{:?} button down", target);
                self.pressed.store(true, Ordering::Release);
            }
            EventType::ButtonRelease(button) if button == target => {
                if self.swallow_release.swap(false, Ordering::AcqRel) {
                    return;
                }
                debug!("{:?} button up", target);
                self.pressed.store(false, Ordering::Release);
            }
            _ => {}
        }
    }
}

/// Global listener that tracks one mouse button
pub struct ButtonMonitor {
    shared: Arc<Shared>,
    _handle: thread::JoinHandle<()>,
}

impl ButtonMonitor {
    /// Start listening for events of `button` in a background thread.
    ///
    /// The listener thread lives for the rest of the process; rdev offers no
    /// way to stop it.
    pub fn start(button: MouseButton) -> Self {
        let shared = Arc::new(Shared::default());
        let target = to_rdev(button);

        let handle = {
            let shared = shared.clone();
            thread::spawn(move || {
                info!("Input listener started for {:?} button", button);

                let callback = {
                    let shared = shared.clone();
                    move |event: Event| shared.on_event(event.event_type, target, Instant::now())
                };

                if let Err(e) = listen(callback) {
                    error!("Error in input listener: {:?}", e);
                    let _ = shared.failure.set(format!("{:?}", e));
                }
            })
        };

        Self {
            shared,
            _handle: handle,
        }
    }
}

impl ButtonSampler for ButtonMonitor {
    fn is_pressed(&self) -> Result<bool, ClickAssistError> {
        if let Some(reason) = self.shared.failure.get() {
            return Err(ClickAssistError::InputAccess(reason.clone()));
        }
        Ok(self.shared.pressed.load(Ordering::Acquire))
    }

    fn expect_synthetic_click(&self) {
        self.shared.expect_echo(Instant::now());
    }
}
