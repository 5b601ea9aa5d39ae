//! click-assist - keeps clicking for you once you start hammering the button
//!
//! Watches the left mouse button. Five quick clicks inside a second switch on
//! rapid mode, which keeps clicking at a jittered cadence while the button is
//! up. Holding the button cancels it; so does pausing.

use click_assist::{
    create_synthesizer, ButtonMonitor, ClickAssist, ClickAssistError, Config, Profile, StopHandle,
};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

fn profile() -> Profile {
    if cfg!(feature = "relaxed-profile") {
        Profile::Relaxed
    } else {
        Profile::Standard
    }
}

fn main() -> Result<(), ClickAssistError> {
    let config = Config::from_profile(profile()).with_verbose(cfg!(debug_assertions));

    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(if config.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .compact()
        .init();

    info!("click-assist starting ({:?} profile)...", profile());

    // Ctrl+C is the only exit affordance
    let stop = StopHandle::new();
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            info!("Shutdown signal received");
            stop.stop();
        })
        .map_err(|e| ClickAssistError::Signal(e.to_string()))?;
    }

    let synthesizer = match create_synthesizer() {
        Ok(synth) => synth,
        Err(ClickAssistError::PermissionDenied) => {
            error!("Permission denied. Please add your user to the 'input' group:");
            error!("  sudo usermod -aG input $USER");
            error!("Then logout and login again.");
            return Err(ClickAssistError::PermissionDenied);
        }
        Err(e) => {
            error!("No input synthesizer available: {}", e);
            return Err(e);
        }
    };

    let monitor = ButtonMonitor::start(config.button);
    info!("Listening for {:?} button - press Ctrl+C to exit", config.button);

    let engine = ClickAssist::new(config, monitor, synthesizer, stop)?;
    match engine.run() {
        Ok(_) => {
            info!("click-assist shutting down...");
            Ok(())
        }
        Err(e) => {
            error!("Click assist failed: {}", e);
            Err(e)
        }
    }
}
