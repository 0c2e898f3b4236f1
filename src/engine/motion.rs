//! # Joystick Motion Mapper
//!
//! Converts raw joystick samples into relative pointer moves, throttled to
//! one update per `period_ms`.
//!
//! Per axis the offset from [`CENTER`] is collapsed to zero inside the
//! deadzone and shrunk toward zero by the deadzone outside it, so movement
//! starts from zero at the deadzone edge instead of jumping. The result is
//! scaled by `AXIS_RANGE / (2 * wavelength)` and negated to match the stick
//! mounting.

use tracing::trace;

use crate::pointer::PointerSink;
use super::settings::Settings;

/// Joystick rest position.
pub const CENTER: i32 = 512;

/// Full-scale joystick reading.
pub const AXIS_RANGE: i32 = 1023;

/// Velocity for one axis
///
/// Returns the (not yet negated) movement for one raw sample. A
/// non-positive `wavelength` disables the axis.
///
/// # Examples
///
/// ```
/// use sippuff::engine::motion::axis_velocity;
///
/// assert_eq!(axis_velocity(600, 25, 15), 1);
/// assert_eq!(axis_velocity(530, 25, 15), 0);
/// assert_eq!(axis_velocity(512 - 200, 25, 15), -5);
/// ```
#[must_use]
pub fn axis_velocity(raw: i32, deadzone: i32, wavelength: i32) -> i32 {
    if wavelength <= 0 {
        return 0;
    }

    let deadzone = i64::from(deadzone.max(0));
    let delta = i64::from(raw) - i64::from(CENTER);

    let reduced = if delta.abs() < deadzone {
        0
    } else {
        delta - delta.signum() * deadzone
    };

    let divisor = (i64::from(AXIS_RANGE) / (2 * i64::from(wavelength))).max(1);
    (reduced / divisor).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Movement throttle and axis mapping.
#[derive(Debug, Default)]
pub struct JoystickMotionMapper {
    next_due_ms: u64,
}

impl JoystickMotionMapper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule the next update `period_ms` after `now`.
    pub fn arm(&mut self, now: u64, period_ms: i32) {
        self.next_due_ms = now.saturating_add(u64::try_from(period_ms).unwrap_or(0));
    }

    /// Whether a move is due at `now` under the current settings.
    #[must_use]
    pub fn is_due(&self, now: u64, settings: &Settings) -> bool {
        settings.joystick_enabled && now >= self.next_due_ms
    }

    #[must_use]
    pub fn next_due_ms(&self) -> u64 {
        self.next_due_ms
    }

    /// Map one joystick sample and dispatch it
    ///
    /// Callers check [`is_due`](Self::is_due) first so the stick is only
    /// sampled when an update will actually run. Always re-arms the throttle;
    /// returns the dispatched move, or `None` when both axes are zero.
    pub fn apply(
        &mut self,
        now: u64,
        raw_x: i32,
        raw_y: i32,
        settings: &Settings,
        pointer: &mut dyn PointerSink,
    ) -> Option<(i32, i32)> {
        self.arm(now, settings.period_ms);

        let dx = axis_velocity(raw_x, settings.joystick_deadzone, settings.wavelength).saturating_neg();
        let dy = axis_velocity(raw_y, settings.joystick_deadzone, settings.wavelength).saturating_neg();

        if dx == 0 && dy == 0 {
            return None;
        }

        trace!("Move {},{} from raw {},{}", dx, dy, raw_x, raw_y);
        pointer.move_by(dx, dy, 0);
        Some((dx, dy))
    }

    /// Gate, map and dispatch in one call.
    ///
    /// `sample` is only invoked when a move is due.
    pub fn maybe_move(
        &mut self,
        now: u64,
        settings: &Settings,
        sample: impl FnOnce() -> (i32, i32),
        pointer: &mut dyn PointerSink,
    ) -> Option<(i32, i32)> {
        if !self.is_due(now, settings) {
            return None;
        }
        let (raw_x, raw_y) = sample();
        self.apply(now, raw_x, raw_y, settings, pointer)
    }
}
