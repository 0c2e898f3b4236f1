//! # Error Types
//!
//! Custom error types for the sip & puff engine using `thiserror`.

use thiserror::Error;

/// Main error type for the sip & puff engine
#[derive(Debug, Error)]
pub enum SipPuffError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// Configured serial device does not exist
    #[error("Serial device {0} not found")]
    SerialPortNotFound(String),

    /// Analog sensor source errors
    #[error("Sensor error: {0}")]
    Sensor(String),

    /// Pointer device errors
    #[error("Pointer device error: {0}")]
    Pointer(String),
}

/// Result type alias for the sip & puff engine
pub type Result<T> = std::result::Result<T, SipPuffError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_port_not_found_names_device() {
        let err = SipPuffError::SerialPortNotFound("/dev/ttyGS0".to_string());
        assert_eq!(err.to_string(), "Serial device /dev/ttyGS0 not found");
    }
}
