//! Input synthesis
//!
//! Two backends inject a full press+release pair:
//! - XTEST through x11rb, for X11 and XWayland sessions
//! - ydotool, which goes through uinput at the kernel level and also works on
//!   Wayland. Requires the ydotoold daemon: sudo systemctl enable --now ydotoold

use std::io;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info, warn};
use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::xproto::{Window, BUTTON_PRESS_EVENT, BUTTON_RELEASE_EVENT};
use x11rb::protocol::xtest::{self, ConnectionExt as _};
use x11rb::rust_connection::RustConnection;

use crate::config::MouseButton;
use crate::ClickAssistError;

/// Injects synthetic clicks
pub trait InputSynthesizer {
    /// Send one press followed by one release of `button`
    fn click(&mut self, button: MouseButton) -> Result<(), ClickAssistError>;
}

impl<T: InputSynthesizer + ?Sized> InputSynthesizer for Box<T> {
    fn click(&mut self, button: MouseButton) -> Result<(), ClickAssistError> {
        (**self).click(button)
    }
}

/// Synthesizer backed by the X11 XTEST extension
pub struct XTestSynthesizer {
    conn: RustConnection,
    root: Window,
}

impl XTestSynthesizer {
    pub fn new() -> Result<Self, ClickAssistError> {
        let (conn, screen_num) = x11rb::connect(None).map_err(|e| {
            ClickAssistError::VirtualDevice(format!("Failed to connect to X11: {}", e))
        })?;

        let extension = conn
            .extension_information(xtest::X11_EXTENSION_NAME)
            .map_err(|e| ClickAssistError::VirtualDevice(format!("X11 query failed: {}", e)))?;
        if extension.is_none() {
            return Err(ClickAssistError::VirtualDevice(
                "X server does not support XTEST".to_string(),
            ));
        }

        let root = conn.setup().roots[screen_num].root;
        info!("XTEST input synthesizer ready");
        Ok(Self { conn, root })
    }

    fn detail(button: MouseButton) -> u8 {
        match button {
            MouseButton::Left => 1,
            MouseButton::Middle => 2,
            MouseButton::Right => 3,
        }
    }
}

impl InputSynthesizer for XTestSynthesizer {
    fn click(&mut self, button: MouseButton) -> Result<(), ClickAssistError> {
        let detail = Self::detail(button);
        for event_type in [BUTTON_PRESS_EVENT, BUTTON_RELEASE_EVENT] {
            self.conn
                .xtest_fake_input(event_type, detail, x11rb::CURRENT_TIME, self.root, 0, 0, 0)
                .map_err(|e| ClickAssistError::SendEvent(format!("XTEST fake input: {}", e)))?;
        }
        self.conn
            .flush()
            .map_err(|e| ClickAssistError::SendEvent(format!("X11 flush: {}", e)))?;
        debug!("Sent {:?} click via XTEST", button);
        Ok(())
    }
}

/// Get the ydotool socket path
fn socket_path() -> PathBuf {
    let uid = unsafe { libc::getuid() };
    PathBuf::from(format!("/run/user/{}/.ydotool_socket", uid))
}

/// Synthesizer that shells out to ydotool
pub struct YdotoolSynthesizer {
    socket_path: PathBuf,
}

impl YdotoolSynthesizer {
    /// Requires ydotool to be installed and the ydotoold daemon running.
    pub fn new() -> Result<Self, ClickAssistError> {
        let socket_path = socket_path();

        match std::fs::metadata(&socket_path) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Err(ClickAssistError::PermissionDenied);
            }
            Err(_) => {
                return Err(ClickAssistError::VirtualDevice(format!(
                    "ydotoold socket {} not found. Start it: sudo systemctl enable --now ydotoold",
                    socket_path.display()
                )));
            }
        }

        let probe = Command::new("ydotool").arg("help").output();
        if let Err(e) = probe {
            return Err(ClickAssistError::VirtualDevice(format!(
                "ydotool not found ({}). Install it: sudo pacman -S ydotool",
                e
            )));
        }

        info!("ydotool input synthesizer ready");
        Ok(Self { socket_path })
    }

    /// ydotool click codes: low nibble is the button, 0xC0 means down then up
    fn click_code(button: MouseButton) -> &'static str {
        match button {
            MouseButton::Left => "0xC0",
            MouseButton::Right => "0xC1",
            MouseButton::Middle => "0xC2",
        }
    }
}

impl InputSynthesizer for YdotoolSynthesizer {
    fn click(&mut self, button: MouseButton) -> Result<(), ClickAssistError> {
        let output = Command::new("ydotool")
            .env("YDOTOOL_SOCKET", &self.socket_path)
            .args(["click", Self::click_code(button)])
            .output()
            .map_err(|e| ClickAssistError::SendEvent(format!("Failed to run ydotool: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClickAssistError::SendEvent(format!("ydotool failed: {}", stderr)));
        }

        debug!("Sent {:?} click via ydotool", button);
        Ok(())
    }
}

/// Open the first synthesizer backend that is available
pub fn create_synthesizer() -> Result<Box<dyn InputSynthesizer + Send>, ClickAssistError> {
    match XTestSynthesizer::new() {
        Ok(synth) => return Ok(Box::new(synth)),
        Err(e) => warn!("XTEST unavailable ({}), falling back to ydotool", e),
    }
    Ok(Box::new(YdotoolSynthesizer::new()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ydotool_codes_match_buttons() {
        assert_eq!(YdotoolSynthesizer::click_code(MouseButton::Left), "0xC0");
        assert_eq!(YdotoolSynthesizer::click_code(MouseButton::Right), "0xC1");
        assert_eq!(YdotoolSynthesizer::click_code(MouseButton::Middle), "0xC2");
    }

    #[test]
    fn xtest_button_numbers() {
        assert_eq!(XTestSynthesizer::detail(MouseButton::Left), 1);
        assert_eq!(XTestSynthesizer::detail(MouseButton::Middle), 2);
        assert_eq!(XTestSynthesizer::detail(MouseButton::Right), 3);
    }

    #[test]
    fn socket_path_is_per_user() {
        let uid = unsafe { libc::getuid() };
        assert!(socket_path().ends_with(".ydotool_socket"));
        assert!(socket_path().to_string_lossy().contains(&format!("/{}/", uid)));
    }
}
