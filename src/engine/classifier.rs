//! # Pressure Classifier
//!
//! Classifies the signed pressure differential into at most one discrete
//! action per tick.
//!
//! ## Zones
//!
//! With `o(x) = polarity.sign() * x` (primary breath direction positive):
//!
//! | Priority | Zone | Condition | Action |
//! |----------|------|-----------|--------|
//! | 1 | Double click | `o(d) > o(click_double)` | two left clicks, 50 ms apart |
//! | 2 | Left click | `o(d) > o(click_left)` | left click |
//! | 3 | Right click | `o(d) < o(click_right)` | right click |
//! | 4 | Scroll up | `o(click_right) <= o(d) < o(scroll_up)` | wheel `+scroll_speed` |
//! | 5 | Scroll down | `o(scroll_down) < o(d) <= o(click_left)` | wheel `-scroll_speed` |
//!
//! The first matching zone wins, so overlapping zones resolve click before
//! scroll. Zones are never checked for consistency.
//!
//! ## Debounce
//!
//! A single window gates every discrete action. Only clicks re-arm it;
//! scroll is gated by it but repeats every tick once the window is open.

use serde::Serialize;
use tracing::{debug, trace};

use super::clock::Clock;
use super::settings::{Polarity, Settings};
use crate::indicator::StatusIndicator;
use crate::pointer::{Button, PointerSink};
use crate::protocol::{Response, ResponseSink};

/// Gap between the two clicks of a double click.
pub const DOUBLE_CLICK_GAP_MS: u64 = 50;

/// On and off time of one feedback pulse.
pub const PULSE_MS: u64 = 50;

/// Discrete click actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClickAction {
    #[serde(rename = "left_click")]
    Left,
    #[serde(rename = "double_click")]
    Double,
    #[serde(rename = "right_click")]
    Right,
}

impl ClickAction {
    /// Name used in `ACTION:` lines.
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            ClickAction::Left => "LEFT_CLICK",
            ClickAction::Double => "DOUBLE_CLICK",
            ClickAction::Right => "RIGHT_CLICK",
        }
    }

    /// Feedback pulses for this action.
    #[must_use]
    pub fn pulses(self) -> u32 {
        match self {
            ClickAction::Double => 2,
            ClickAction::Left | ClickAction::Right => 1,
        }
    }
}

/// Outcome of classifying one differential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Debounce window still closed.
    Suppressed,
    /// No zone matched.
    Idle,
    Click(ClickAction),
    /// Wheel steps (positive scrolls up).
    Scroll(i32),
}

/// Collaborators touched when an action fires.
pub struct Feedback<'a> {
    pub pointer: &'a mut dyn PointerSink,
    pub indicator: &'a mut dyn StatusIndicator,
    pub clock: &'a mut dyn Clock,
    pub responses: &'a mut dyn ResponseSink,
}

/// Zone classifier with the shared debounce clock.
#[derive(Debug, Default)]
pub struct PressureClassifier {
    last_action_ms: Option<u64>,
}

impl PressureClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Time of the last accepted click.
    #[must_use]
    pub fn last_action_ms(&self) -> Option<u64> {
        self.last_action_ms
    }

    /// Classify without side effects.
    #[must_use]
    pub fn classify(&self, diff: i32, now: u64, settings: &Settings, polarity: Polarity) -> Decision {
        if let Some(last) = self.last_action_ms {
            let elapsed = i64::try_from(now.saturating_sub(last)).unwrap_or(i64::MAX);
            if elapsed < i64::from(settings.click_debounce_ms) {
                return Decision::Suppressed;
            }
        }

        let sign = i64::from(polarity.sign());
        let o = |x: i32| i64::from(x) * sign;
        let d = o(diff);

        if d > o(settings.click_double) {
            return Decision::Click(ClickAction::Double);
        }
        if d > o(settings.click_left) {
            return Decision::Click(ClickAction::Left);
        }
        if d < o(settings.click_right) {
            return Decision::Click(ClickAction::Right);
        }

        if settings.scroll_enabled {
            if o(settings.click_right) <= d && d < o(settings.scroll_up) {
                return Decision::Scroll(settings.scroll_speed);
            }
            if o(settings.scroll_down) < d && d <= o(settings.click_left) {
                return Decision::Scroll(settings.scroll_speed.saturating_neg());
            }
        }

        Decision::Idle
    }

    /// Classify one differential and perform the resulting action.
    ///
    /// Clicks block the engine thread for the double click gap and the
    /// feedback pulses.
    pub fn classify_and_dispatch(
        &mut self,
        diff: i32,
        now: u64,
        settings: &Settings,
        polarity: Polarity,
        out: &mut Feedback<'_>,
    ) -> Decision {
        let decision = self.classify(diff, now, settings, polarity);

        match decision {
            Decision::Click(action) => {
                debug!("{} at differential {}", action.wire_name(), diff);
                out.responses.send(Response::Action(action));
                match action {
                    ClickAction::Double => {
                        out.pointer.click(Button::Left);
                        out.clock.delay_ms(DOUBLE_CLICK_GAP_MS);
                        out.pointer.click(Button::Left);
                    }
                    ClickAction::Left => out.pointer.click(Button::Left),
                    ClickAction::Right => out.pointer.click(Button::Right),
                }
                self.last_action_ms = Some(now);
                pulse(out.indicator, out.clock, action.pulses());
            }
            Decision::Scroll(wheel) => {
                trace!("Scroll {} at differential {}", wheel, diff);
                out.pointer.move_by(0, 0, wheel);
            }
            Decision::Suppressed | Decision::Idle => {}
        }

        decision
    }
}

/// Blink the indicator `times` times.
pub fn pulse(indicator: &mut dyn StatusIndicator, clock: &mut dyn Clock, times: u32) {
    for _ in 0..times {
        indicator.set(true);
        clock.delay_ms(PULSE_MS);
        indicator.set(false);
        clock.delay_ms(PULSE_MS);
    }
}
