//! # Response Encoder
//!
//! Every line the engine sends back to the configuration tool.

use std::fmt;

use crate::engine::classifier::ClickAction;
use crate::engine::settings::SettingKey;

/// One outgoing protocol line (terminator not included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `OK:<KEY>`
    Ack(SettingKey),
    /// `OK:<KEY>:ON|OFF` for toggle keys
    ToggleAck(SettingKey, bool),
    /// `OK:RECALIBRATE`
    RecalibrateAck,
    /// `OK:PRESSURE_TEST:START|STOP`
    PressureTestAck(bool),
    /// `SETTINGS:START`
    SettingsStart,
    /// `<KEY>:<value>` inside a settings dump
    SettingValue(SettingKey, i32),
    /// `BASELINE:<value>` inside a settings dump
    Baseline(i32),
    /// `SETTINGS:END`
    SettingsEnd,
    /// `INFO:<text>`
    Info(String),
    /// `ACTION:LEFT_CLICK|DOUBLE_CLICK|RIGHT_CLICK`
    Action(ClickAction),
    /// Bare signed pressure differential (pressure-test stream)
    Differential(i32),
}

fn on_off(on: bool) -> &'static str {
    if on {
        "ON"
    } else {
        "OFF"
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Ack(key) => write!(f, "OK:{}", key.name()),
            Response::ToggleAck(key, on) => write!(f, "OK:{}:{}", key.name(), on_off(*on)),
            Response::RecalibrateAck => f.write_str("OK:RECALIBRATE"),
            Response::PressureTestAck(true) => f.write_str("OK:PRESSURE_TEST:START"),
            Response::PressureTestAck(false) => f.write_str("OK:PRESSURE_TEST:STOP"),
            Response::SettingsStart => f.write_str("SETTINGS:START"),
            Response::SettingValue(key, value) => write!(f, "{}:{}", key.name(), value),
            Response::Baseline(value) => write!(f, "BASELINE:{}", value),
            Response::SettingsEnd => f.write_str("SETTINGS:END"),
            Response::Info(text) => write!(f, "INFO:{}", text),
            Response::Action(action) => write!(f, "ACTION:{}", action.wire_name()),
            Response::Differential(diff) => write!(f, "{}", diff),
        }
    }
}

/// Destination for outgoing lines.
pub trait ResponseSink {
    fn send(&mut self, response: Response);
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Response sink that keeps the encoded lines.
    #[derive(Clone, Default)]
    pub struct RecordingResponder {
        pub lines: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingResponder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get_lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }

        pub fn take_lines(&self) -> Vec<String> {
            std::mem::take(&mut *self.lines.lock().unwrap())
        }
    }

    impl ResponseSink for RecordingResponder {
        fn send(&mut self, response: Response) {
            self.lines.lock().unwrap().push(response.to_string());
        }
    }
}
