//! # Status Indicator
//!
//! Feedback LED driven during boot calibration and pulsed on every click.
//! The LED is a side effect only; a missing or failing LED never stops the
//! engine.

use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::error::{Result, SipPuffError};

/// Root of the Linux LED class in sysfs.
const SYSFS_LEDS: &str = "/sys/class/leds";

/// On/off status output.
pub trait StatusIndicator {
    fn set(&mut self, on: bool);
}

/// Indicator that does nothing, used when no LED is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullIndicator;

impl StatusIndicator for NullIndicator {
    fn set(&mut self, _on: bool) {}
}

/// LED exposed through `/sys/class/leds/<name>/brightness`.
#[derive(Debug)]
pub struct SysfsLed {
    brightness: PathBuf,
}

impl SysfsLed {
    /// Open a named LED under `/sys/class/leds`.
    ///
    /// # Errors
    ///
    /// Returns `Io` error if the LED has no brightness attribute.
    pub fn open(name: &str) -> Result<Self> {
        Self::open_at(PathBuf::from(SYSFS_LEDS).join(name))
    }

    fn open_at(dir: PathBuf) -> Result<Self> {
        let brightness = dir.join("brightness");
        if !brightness.exists() {
            return Err(SipPuffError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", brightness.display()),
            )));
        }
        info!("Using status LED at {}", dir.display());
        Ok(Self { brightness })
    }
}

impl StatusIndicator for SysfsLed {
    fn set(&mut self, on: bool) {
        let value = if on { "1" } else { "0" };
        if let Err(e) = fs::write(&self.brightness, value) {
            warn!("Failed to drive status LED: {}", e);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sysfs_led_writes_brightness() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("brightness"), "0").unwrap();

        let mut led = SysfsLed::open_at(dir.path().to_path_buf()).unwrap();
        led.set(true);
        assert_eq!(fs::read_to_string(dir.path().join("brightness")).unwrap(), "1");
        led.set(false);
        assert_eq!(fs::read_to_string(dir.path().join("brightness")).unwrap(), "0");
    }

    #[test]
    fn test_sysfs_led_missing() {
        let dir = TempDir::new().unwrap();
        assert!(SysfsLed::open_at(dir.path().to_path_buf()).is_err());
    }

    #[test]
    fn test_null_indicator_accepts_anything() {
        let mut led = NullIndicator;
        led.set(true);
        led.set(false);
    }
}
