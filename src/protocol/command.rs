//! # Command Decoder
//!
//! Turns one received line into a [`Command`].

use crate::engine::settings::SettingKey;

/// A recognised request from the configuration tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `SET:<KEY>:<value>`
    Set(SettingKey, i32),
    /// `GET:SETTINGS`
    GetSettings,
    /// `RECALIBRATE`
    Recalibrate,
    /// `PRESSURE_TEST:START` (true) / `PRESSURE_TEST:STOP` (false)
    PressureTest(bool),
}

/// Parse a command line
///
/// Surrounding whitespace (including a trailing `\r`) is ignored. Keys are
/// matched case-sensitively. Returns `None` for anything that is not a
/// well-formed, recognised command.
///
/// # Examples
///
/// ```
/// use sippuff::engine::settings::SettingKey;
/// use sippuff::protocol::{parse_command, Command};
///
/// assert_eq!(
///     parse_command("SET:DEADZONE:30\r"),
///     Some(Command::Set(SettingKey::Deadzone, 30))
/// );
/// assert_eq!(parse_command("SET:DEADZONE:abc"), None);
/// assert_eq!(parse_command("get:settings"), None);
/// ```
#[must_use]
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();

    if let Some(param) = line.strip_prefix("SET:") {
        let (key, value) = param.split_once(':')?;
        let key = SettingKey::from_name(key)?;
        let value = value.trim().parse::<i32>().ok()?;
        return Some(Command::Set(key, value));
    }

    match line {
        "GET:SETTINGS" => Some(Command::GetSettings),
        "RECALIBRATE" => Some(Command::Recalibrate),
        "PRESSURE_TEST:START" => Some(Command::PressureTest(true)),
        "PRESSURE_TEST:STOP" => Some(Command::PressureTest(false)),
        _ => None,
    }
}
