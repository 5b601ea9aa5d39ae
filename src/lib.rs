//! click-assist - takes over rapid clicking once a burst is detected
//!
//! This library provides components for:
//! - Press history and rapid-click classification
//! - The press state machine (idle, long press, rapid click)
//! - Randomized auto-click timing
//! - The polling loop and its stop handle
//! - Global button sampling and click synthesis

pub mod auto_click;
pub mod classifier;
pub mod config;
pub mod input_listener;
pub mod input_simulator;
pub mod ring_buffer;
pub mod scheduler;
pub mod state_machine;

pub use auto_click::AutoClickDriver;
pub use classifier::RapidClickClassifier;
pub use config::{Config, MouseButton, Profile};
pub use input_listener::{ButtonMonitor, ButtonSampler};
pub use input_simulator::{
    create_synthesizer, InputSynthesizer, XTestSynthesizer, YdotoolSynthesizer,
};
pub use ring_buffer::{ClickEvent, ClickRingBuffer};
pub use scheduler::{ClickAssist, RunSummary, StopHandle, TickPacer};
pub use state_machine::{
    ExitReason, Mode, ModeChange, PressState, PressStateMachine, TickOutcome,
};

use thiserror::Error;

/// Main error type for click-assist
#[derive(Error, Debug)]
pub enum ClickAssistError {
    #[error("Failed to read input state: {0}")]
    InputAccess(String),

    #[error("Failed to open input synthesizer: {0}")]
    VirtualDevice(String),

    #[error("Failed to send input event: {0}")]
    SendEvent(String),

    #[error("Permission denied - add user to 'input' group")]
    PermissionDenied,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to install stop signal handler: {0}")]
    Signal(String),
}
