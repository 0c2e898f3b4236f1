//! # Command Handler
//!
//! Accumulates received bytes into a line buffer and applies exactly one
//! command per call.
//!
//! Bytes are pulled one at a time from a [`ByteSource`]. Consumption stops at
//! the first line terminator, so a second command that arrived in the same
//! read stays queued until the next tick.
//!
//! ## Usage
//!
//! ```ignore
//! let mut handler = CommandHandler::new();
//! loop {
//!     handler.service(&mut source, &mut engine_state, &mut responses);
//!     // classify pressure, move pointer...
//! }
//! ```

use tracing::{debug, info, warn};

use super::command::{parse_command, Command};
use super::response::{Response, ResponseSink};
use super::{LINE_TERMINATOR, MAX_LINE_LEN};
use crate::engine::settings::{SettingKey, Settings};

/// Pending received bytes.
pub trait ByteSource {
    /// Next byte if one is already available; never waits.
    fn next_byte(&mut self) -> Option<u8>;
}

/// State a command can read or change.
pub trait CommandTarget {
    fn settings(&self) -> &Settings;
    fn settings_mut(&mut self) -> &mut Settings;
    fn baseline(&self) -> i32;
    /// Re-run pressure calibration synchronously and return the new baseline.
    fn recalibrate(&mut self) -> i32;
    fn set_pressure_test(&mut self, active: bool);
}

/// Line buffer for the command channel.
#[derive(Debug, Default)]
pub struct CommandHandler {
    buffer: Vec<u8>,
    /// Current line exceeded [`MAX_LINE_LEN`] and is being skipped
    overflowed: bool,
}

impl CommandHandler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(MAX_LINE_LEN),
            overflowed: false,
        }
    }

    /// Bytes of the line accumulated so far.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Read available bytes up to the next terminator and decode that line.
    ///
    /// Returns `None` when no line is complete yet or when the completed
    /// line is not a recognised command.
    pub fn poll(&mut self, source: &mut dyn ByteSource) -> Option<Command> {
        while let Some(byte) = source.next_byte() {
            if byte == LINE_TERMINATOR {
                return self.finish_line();
            }

            if self.buffer.len() >= MAX_LINE_LEN {
                if !self.overflowed {
                    warn!("Command line longer than {} bytes, discarding", MAX_LINE_LEN);
                }
                self.overflowed = true;
                self.buffer.clear();
            }

            if !self.overflowed {
                self.buffer.push(byte);
            }
        }
        None
    }

    fn finish_line(&mut self) -> Option<Command> {
        let overflowed = std::mem::replace(&mut self.overflowed, false);
        let line = std::mem::take(&mut self.buffer);

        if overflowed {
            return None;
        }

        let Ok(text) = std::str::from_utf8(&line) else {
            debug!("Ignoring non-UTF-8 command line ({} bytes)", line.len());
            return None;
        };

        let command = parse_command(text);
        if command.is_none() && !text.trim().is_empty() {
            debug!("Ignoring unrecognised command: {:?}", text.trim());
        }
        command
    }

    /// Poll for one command and apply it.
    ///
    /// Returns the command that was applied, if any.
    pub fn service(
        &mut self,
        source: &mut dyn ByteSource,
        target: &mut dyn CommandTarget,
        responses: &mut dyn ResponseSink,
    ) -> Option<Command> {
        let command = self.poll(source)?;
        apply_command(command, target, responses);
        Some(command)
    }
}

/// Apply one command and send its acknowledgement lines.
pub fn apply_command(
    command: Command,
    target: &mut dyn CommandTarget,
    responses: &mut dyn ResponseSink,
) {
    match command {
        Command::Set(key, value) => {
            target.settings_mut().set(key, value);
            debug!("{} set to {}", key.name(), value);
            if key.is_toggle() {
                let on = target.settings().get(key) == 1;
                responses.send(Response::ToggleAck(key, on));
            } else {
                responses.send(Response::Ack(key));
            }
        }
        Command::GetSettings => send_settings(target.settings(), target.baseline(), responses),
        Command::Recalibrate => {
            responses.send(Response::Info("Recalibrating pressure sensor".to_string()));
            let baseline = target.recalibrate();
            responses.send(Response::Info(format!("BASELINE:{}", baseline)));
            responses.send(Response::RecalibrateAck);
        }
        Command::PressureTest(active) => {
            target.set_pressure_test(active);
            info!("Pressure test {}", if active { "started" } else { "stopped" });
            responses.send(Response::PressureTestAck(active));
        }
    }
}

/// Send the full settings dump, framed by `SETTINGS:START` / `SETTINGS:END`.
pub fn send_settings(settings: &Settings, baseline: i32, responses: &mut dyn ResponseSink) {
    responses.send(Response::SettingsStart);
    for key in SettingKey::ALL {
        responses.send(Response::SettingValue(key, settings.get(key)));
    }
    responses.send(Response::Baseline(baseline));
    responses.send(Response::SettingsEnd);
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::collections::VecDeque;

    /// Byte source fed from test data.
    #[derive(Default)]
    pub struct QueuedBytes {
        pub bytes: VecDeque<u8>,
    }

    impl QueuedBytes {
        pub fn from_str(data: &str) -> Self {
            Self {
                bytes: data.bytes().collect(),
            }
        }

        pub fn extend(&mut self, data: &[u8]) {
            self.bytes.extend(data.iter().copied());
        }
    }

    impl ByteSource for QueuedBytes {
        fn next_byte(&mut self) -> Option<u8> {
            self.bytes.pop_front()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::QueuedBytes;
    use super::*;
    use crate::protocol::response::mocks::RecordingResponder;

    #[derive(Default)]
    struct FakeTarget {
        settings: Settings,
        baseline: i32,
        recalibrations: usize,
        pressure_test: bool,
    }

    impl CommandTarget for FakeTarget {
        fn settings(&self) -> &Settings {
            &self.settings
        }

        fn settings_mut(&mut self) -> &mut Settings {
            &mut self.settings
        }

        fn baseline(&self) -> i32 {
            self.baseline
        }

        fn recalibrate(&mut self) -> i32 {
            self.recalibrations += 1;
            self.baseline = 505;
            self.baseline
        }

        fn set_pressure_test(&mut self, active: bool) {
            self.pressure_test = active;
        }
    }

    fn run(handler: &mut CommandHandler, source: &mut QueuedBytes, target: &mut FakeTarget) -> Vec<String> {
        let mut responses = RecordingResponder::new();
        handler.service(source, target, &mut responses);
        responses.get_lines()
    }

    #[test]
    fn test_partial_line_waits_for_terminator() {
        let mut handler = CommandHandler::new();
        let mut source = QueuedBytes::from_str("SET:DEAD");
        assert_eq!(handler.poll(&mut source), None);
        assert_eq!(handler.pending(), b"SET:DEAD");

        source.extend(b"ZONE:30\n");
        assert_eq!(handler.poll(&mut source), Some(Command::Set(SettingKey::Deadzone, 30)));
        assert!(handler.pending().is_empty());
    }

    #[test]
    fn test_one_command_per_call() {
        let mut handler = CommandHandler::new();
        let mut source = QueuedBytes::from_str("SET:PERIOD:40\nSET:DEADZONE:30\n");

        assert_eq!(handler.poll(&mut source), Some(Command::Set(SettingKey::Period, 40)));
        assert_eq!(source.bytes.len(), "SET:DEADZONE:30\n".len());
        assert_eq!(handler.poll(&mut source), Some(Command::Set(SettingKey::Deadzone, 30)));
        assert_eq!(handler.poll(&mut source), None);
    }

    #[test]
    fn test_crlf_terminated_line() {
        let mut handler = CommandHandler::new();
        let mut source = QueuedBytes::from_str("GET:SETTINGS\r\n");
        assert_eq!(handler.poll(&mut source), Some(Command::GetSettings));
    }

    #[test]
    fn test_overlong_line_is_discarded() {
        let mut handler = CommandHandler::new();
        let mut data = vec![b'X'; MAX_LINE_LEN + 10];
        data.extend_from_slice(b"RECALIBRATE\n");
        let mut source = QueuedBytes::default();
        source.extend(&data);

        assert_eq!(handler.poll(&mut source), None);
        assert!(handler.pending().is_empty());

        // The next line is unaffected
        source.extend(b"RECALIBRATE\n");
        assert_eq!(handler.poll(&mut source), Some(Command::Recalibrate));
    }

    #[test]
    fn test_line_at_max_length_is_kept() {
        let mut handler = CommandHandler::new();
        let padding = " ".repeat(MAX_LINE_LEN - "RECALIBRATE".len());
        let mut source = QueuedBytes::from_str(&format!("RECALIBRATE{}\n", padding));
        assert_eq!(handler.poll(&mut source), Some(Command::Recalibrate));
    }

    #[test]
    fn test_non_utf8_line_is_ignored() {
        let mut handler = CommandHandler::new();
        let mut source = QueuedBytes::default();
        source.extend(&[0xFF, 0xFE, b'\n']);
        assert_eq!(handler.poll(&mut source), None);
    }

    #[test]
    fn test_set_acknowledges_key() {
        let mut handler = CommandHandler::new();
        let mut target = FakeTarget::default();
        let mut source = QueuedBytes::from_str("SET:CLICK_DOUBLE:25\n");

        let lines = run(&mut handler, &mut source, &mut target);
        assert_eq!(lines, vec!["OK:CLICK_DOUBLE"]);
        assert_eq!(target.settings.click_double, 25);
    }

    #[test]
    fn test_toggle_acknowledges_state() {
        let mut handler = CommandHandler::new();
        let mut target = FakeTarget::default();

        let mut source = QueuedBytes::from_str("SET:JOYSTICK:0\n");
        assert_eq!(run(&mut handler, &mut source, &mut target), vec!["OK:JOYSTICK:OFF"]);
        assert!(!target.settings.joystick_enabled);

        let mut source = QueuedBytes::from_str("SET:JOYSTICK:1\n");
        assert_eq!(run(&mut handler, &mut source, &mut target), vec!["OK:JOYSTICK:ON"]);
        assert!(target.settings.joystick_enabled);

        let mut source = QueuedBytes::from_str("SET:SCROLL:7\n");
        assert_eq!(run(&mut handler, &mut source, &mut target), vec!["OK:SCROLL:OFF"]);
        assert!(!target.settings.scroll_enabled);
    }

    #[test]
    fn test_unknown_input_is_silent() {
        let mut handler = CommandHandler::new();
        let mut target = FakeTarget::default();
        let before = target.settings.clone();

        for line in ["SET:FOO:1\n", "SET:CLICK_LEFT\n", "SET:CLICK_LEFT:x\n", "HELLO\n", "\n"] {
            let mut source = QueuedBytes::from_str(line);
            assert!(run(&mut handler, &mut source, &mut target).is_empty(), "{:?}", line);
        }
        assert_eq!(target.settings, before);
    }

    #[test]
    fn test_same_set_twice_is_idempotent() {
        let mut handler = CommandHandler::new();
        let mut target = FakeTarget::default();
        let mut source = QueuedBytes::from_str("SET:WAVELENGTH:20\nSET:WAVELENGTH:20\n");

        let mut lines = run(&mut handler, &mut source, &mut target);
        let first = target.settings.clone();
        lines.extend(run(&mut handler, &mut source, &mut target));

        assert_eq!(lines, vec!["OK:WAVELENGTH", "OK:WAVELENGTH"]);
        assert_eq!(target.settings, first);
    }

    #[test]
    fn test_get_settings_dump() {
        let mut handler = CommandHandler::new();
        let mut target = FakeTarget {
            baseline: 498,
            ..FakeTarget::default()
        };
        let mut source = QueuedBytes::from_str("GET:SETTINGS\n");

        let lines = run(&mut handler, &mut source, &mut target);
        assert_eq!(
            lines,
            vec![
                "SETTINGS:START",
                "CLICK_LEFT:10",
                "CLICK_DOUBLE:15",
                "CLICK_RIGHT:-10",
                "SCROLL_UP:-5",
                "SCROLL_DOWN:5",
                "SCROLL_SPEED:1",
                "SCROLL:1",
                "WAVELENGTH:15",
                "PERIOD:35",
                "DEADZONE:25",
                "DEBOUNCE:500",
                "JOYSTICK:1",
                "BASELINE:498",
                "SETTINGS:END",
            ]
        );
    }

    #[test]
    fn test_set_then_get_round_trip_for_every_key() {
        for key in SettingKey::ALL {
            let mut handler = CommandHandler::new();
            let mut target = FakeTarget::default();
            let value = if key.is_toggle() { 0 } else { 77 };
            let mut source =
                QueuedBytes::from_str(&format!("SET:{}:{}\nGET:SETTINGS\n", key.name(), value));

            run(&mut handler, &mut source, &mut target);
            let dump = run(&mut handler, &mut source, &mut target);
            let expected = format!("{}:{}", key.name(), value);
            assert!(dump.contains(&expected), "missing {} in {:?}", expected, dump);
        }
    }

    #[test]
    fn test_recalibrate() {
        let mut handler = CommandHandler::new();
        let mut target = FakeTarget::default();
        let mut source = QueuedBytes::from_str("RECALIBRATE\n");

        let lines = run(&mut handler, &mut source, &mut target);
        assert_eq!(target.recalibrations, 1);
        assert_eq!(
            lines,
            vec!["INFO:Recalibrating pressure sensor", "INFO:BASELINE:505", "OK:RECALIBRATE"]
        );
    }

    #[test]
    fn test_pressure_test_toggle() {
        let mut handler = CommandHandler::new();
        let mut target = FakeTarget::default();

        let mut source = QueuedBytes::from_str("PRESSURE_TEST:START\n");
        assert_eq!(run(&mut handler, &mut source, &mut target), vec!["OK:PRESSURE_TEST:START"]);
        assert!(target.pressure_test);

        let mut source = QueuedBytes::from_str("PRESSURE_TEST:STOP\n");
        assert_eq!(run(&mut handler, &mut source, &mut target), vec!["OK:PRESSURE_TEST:STOP"]);
        assert!(!target.pressure_test);
    }
}
