//! # Command Protocol Module
//!
//! Line-based text protocol used by the configuration tool to read and
//! rewrite the engine's tunables while it runs.
//!
//! This module handles:
//! - Accumulating received bytes into newline-terminated lines
//! - Parsing `SET:<KEY>:<int>`, `GET:SETTINGS`, `RECALIBRATE`,
//!   `PRESSURE_TEST:START` and `PRESSURE_TEST:STOP`
//! - Applying a command and producing its acknowledgement lines
//! - Formatting unsolicited `ACTION:` and diagnostic lines
//!
//! Unknown commands, unknown keys and malformed values are dropped without
//! any response; the configuration tool relies on never seeing error lines.

pub mod command;
pub mod handler;
pub mod response;

pub use command::{parse_command, Command};
pub use handler::{apply_command, ByteSource, CommandHandler, CommandTarget};
pub use response::{Response, ResponseSink};

/// Line terminator.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Longest accepted command line, terminator excluded.
pub const MAX_LINE_LEN: usize = 128;
