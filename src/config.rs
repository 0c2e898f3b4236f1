//! # Configuration Module
//!
//! Handles loading and validating the deployment configuration from TOML files.
//!
//! The deployment file only describes the hardware around the engine (serial
//! port, ADC channels, pointer device, status LED) and the breath polarity.
//! Tunable click/joystick parameters always start from compiled defaults and
//! are changed at runtime through the command protocol.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::engine::settings::Polarity;
use crate::error::{Result, SipPuffError};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub serial: SerialConfig,
    pub sensors: SensorConfig,
    pub pointer: PointerConfig,
    pub engine: EngineConfig,
    #[serde(default)]
    pub indicator: IndicatorConfig,
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Command port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Number of received chunks buffered while the engine is blocked
    #[serde(default = "default_transport_queue")]
    pub transport_queue: usize,

    /// Pause before reopening the port after a disconnect
    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,
}

/// Analog sensor configuration (Linux IIO ADC)
#[derive(Debug, Deserialize, Clone)]
pub struct SensorConfig {
    #[serde(default = "default_iio_device")]
    pub iio_device: String,

    #[serde(default = "default_pressure_channel")]
    pub pressure_channel: u8,

    #[serde(default = "default_joystick_x_channel")]
    pub joystick_x_channel: u8,

    #[serde(default = "default_joystick_y_channel")]
    pub joystick_y_channel: u8,

    /// Native converter resolution, rescaled to 10 bits on read
    #[serde(default = "default_adc_bits")]
    pub adc_bits: u8,
}

/// Virtual pointer configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PointerConfig {
    #[serde(default = "default_device_name")]
    pub device_name: String,
}

/// Engine scheduling configuration
#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    #[serde(default)]
    pub polarity: Polarity,

    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Status LED configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct IndicatorConfig {
    /// sysfs LED name under `/sys/class/leds`; empty disables the indicator
    #[serde(default)]
    pub led: String,
}

/// Action journal configuration
#[derive(Debug, Deserialize, Clone)]
pub struct JournalConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_journal_path")]
    pub path: String,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_journal_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily rolling log files; empty logs to stdout only
    #[serde(default)]
    pub dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: String::new(),
        }
    }
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyGS0".to_string() }
fn default_baud_rate() -> u32 { 115200 }
fn default_transport_queue() -> usize { 64 }
fn default_reconnect_interval_ms() -> u64 { 1000 }

fn default_iio_device() -> String { "/sys/bus/iio/devices/iio:device0".to_string() }
fn default_pressure_channel() -> u8 { 0 }
fn default_joystick_x_channel() -> u8 { 2 }
fn default_joystick_y_channel() -> u8 { 1 }
fn default_adc_bits() -> u8 { 10 }

fn default_device_name() -> String { "Sip & Puff Pointer".to_string() }

fn default_tick_interval_ms() -> u64 { 10 }

fn default_journal_path() -> String { "./logs/actions.jsonl".to_string() }

fn default_log_level() -> String { "info".to_string() }

const VALID_BAUD_RATES: [u32; 6] = [9600, 19200, 38400, 57600, 115200, 230400];
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn invalid(msg: impl std::fmt::Display) -> SipPuffError {
    SipPuffError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sippuff::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if !VALID_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(invalid(
                "baud_rate must be one of: 9600, 19200, 38400, 57600, 115200, 230400",
            ));
        }

        if self.serial.transport_queue == 0 || self.serial.transport_queue > 4096 {
            return Err(invalid("transport_queue must be between 1 and 4096"));
        }

        if self.serial.reconnect_interval_ms == 0 || self.serial.reconnect_interval_ms > 60000 {
            return Err(invalid("reconnect_interval_ms must be between 1 and 60000"));
        }

        if self.sensors.iio_device.is_empty() {
            return Err(invalid("sensors iio_device cannot be empty"));
        }

        if self.sensors.adc_bits < 8 || self.sensors.adc_bits > 16 {
            return Err(invalid("adc_bits must be between 8 and 16"));
        }

        let channels = [
            self.sensors.pressure_channel,
            self.sensors.joystick_x_channel,
            self.sensors.joystick_y_channel,
        ];
        if channels[0] == channels[1] || channels[0] == channels[2] || channels[1] == channels[2] {
            return Err(invalid(
                "pressure_channel, joystick_x_channel and joystick_y_channel must be distinct",
            ));
        }

        if self.pointer.device_name.is_empty() {
            return Err(invalid("pointer device_name cannot be empty"));
        }

        if self.engine.tick_interval_ms == 0 || self.engine.tick_interval_ms > 1000 {
            return Err(invalid("tick_interval_ms must be between 1 and 1000"));
        }

        if self.journal.enabled && self.journal.path.is_empty() {
            return Err(invalid("journal path cannot be empty when enabled"));
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(invalid(format!(
                "log level '{}' must be one of: trace, debug, info, warn, error",
                self.logging.level
            )));
        }

        Ok(())
    }
}
