//! # Pointer Module
//!
//! The action sink the classifier and the motion mapper talk to.
//!
//! This module handles:
//! - The abstract pointer operations (`click`, relative `move_by`)
//! - A uinput virtual mouse that turns them into real input events

pub mod uinput;

/// Mouse buttons the engine can click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Left,
    Right,
}

/// Abstract pointer device.
///
/// Implementations must not fail the engine tick: transport errors are
/// logged and the event is dropped.
#[cfg_attr(test, mockall::automock)]
pub trait PointerSink {
    /// Press and release a button.
    fn click(&mut self, button: Button);

    /// Relative motion in pixels plus wheel steps (positive wheel scrolls up).
    fn move_by(&mut self, dx: i32, dy: i32, wheel: i32);
}
