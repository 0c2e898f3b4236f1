//! # Settings Module
//!
//! The live-tunable parameter record read by the classifier and the motion
//! mapper on every tick and written only by the command protocol.
//!
//! No cross-field validation is performed: the configuration tool owns the
//! job of keeping zones sensible. Every field is independently settable.

use serde::Deserialize;

/// Which breath direction drives the left and double click.
///
/// The classifier compares `sign * differential` against `sign * threshold`,
/// so both deployment variants share one code path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Puff (positive differential) clicks left, sip clicks right.
    #[default]
    PuffPrimary,
    /// Sip (negative differential) clicks left, puff clicks right.
    SipPrimary,
}

impl Polarity {
    /// Sign that maps a raw differential into the primary-positive orientation.
    #[must_use]
    pub fn sign(self) -> i32 {
        match self {
            Polarity::PuffPrimary => 1,
            Polarity::SipPrimary => -1,
        }
    }
}

/// Tunable parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Single left click threshold on the pressure differential.
    pub click_left: i32,
    /// Double click threshold (stronger than `click_left`).
    pub click_double: i32,
    /// Right click threshold (opposite breath direction).
    pub click_right: i32,
    /// Outer edge of the scroll-up zone, next to the right click zone.
    pub scroll_up: i32,
    /// Outer edge of the scroll-down zone, next to the left click zone.
    pub scroll_down: i32,
    /// Wheel steps per scrolling tick.
    pub scroll_speed: i32,
    pub scroll_enabled: bool,
    /// Minimum time between two accepted clicks, also gating scroll.
    pub click_debounce_ms: i32,
    pub joystick_enabled: bool,
    pub joystick_deadzone: i32,
    /// Maximum pixel step per movement tick.
    pub wavelength: i32,
    /// Movement tick interval.
    pub period_ms: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self::defaults_for(Polarity::default())
    }
}

impl Settings {
    /// Compiled defaults for a deployment polarity.
    ///
    /// Thresholds are defined in the primary-positive orientation and flipped
    /// for sip-primary devices, which reproduces the classic sip-to-click
    /// firmware zones (`-10`, `-15`, `+10`).
    ///
    /// # Examples
    ///
    /// ```
    /// use sippuff::engine::settings::{Polarity, Settings};
    ///
    /// let sip = Settings::defaults_for(Polarity::SipPrimary);
    /// assert_eq!(sip.click_left, -10);
    /// assert_eq!(sip.click_right, 10);
    /// ```
    #[must_use]
    pub fn defaults_for(polarity: Polarity) -> Self {
        let sign = polarity.sign();
        Self {
            click_left: 10 * sign,
            click_double: 15 * sign,
            click_right: -10 * sign,
            scroll_up: -5 * sign,
            scroll_down: 5 * sign,
            scroll_speed: 1,
            scroll_enabled: true,
            click_debounce_ms: 500,
            joystick_enabled: true,
            joystick_deadzone: 25,
            wavelength: 15,
            period_ms: 35,
        }
    }

    /// Write one field. Toggles treat `1` as on and anything else as off.
    pub fn set(&mut self, key: SettingKey, value: i32) {
        match key {
            SettingKey::ClickLeft => self.click_left = value,
            SettingKey::ClickDouble => self.click_double = value,
            SettingKey::ClickRight => self.click_right = value,
            SettingKey::ScrollUp => self.scroll_up = value,
            SettingKey::ScrollDown => self.scroll_down = value,
            SettingKey::ScrollSpeed => self.scroll_speed = value,
            SettingKey::Scroll => self.scroll_enabled = value == 1,
            SettingKey::Wavelength => self.wavelength = value,
            SettingKey::Period => self.period_ms = value,
            SettingKey::Deadzone => self.joystick_deadzone = value,
            SettingKey::Debounce => self.click_debounce_ms = value,
            SettingKey::Joystick => self.joystick_enabled = value == 1,
        }
    }

    /// Read one field as it appears on the wire (toggles as `1`/`0`).
    #[must_use]
    pub fn get(&self, key: SettingKey) -> i32 {
        match key {
            SettingKey::ClickLeft => self.click_left,
            SettingKey::ClickDouble => self.click_double,
            SettingKey::ClickRight => self.click_right,
            SettingKey::ScrollUp => self.scroll_up,
            SettingKey::ScrollDown => self.scroll_down,
            SettingKey::ScrollSpeed => self.scroll_speed,
            SettingKey::Scroll => i32::from(self.scroll_enabled),
            SettingKey::Wavelength => self.wavelength,
            SettingKey::Period => self.period_ms,
            SettingKey::Deadzone => self.joystick_deadzone,
            SettingKey::Debounce => self.click_debounce_ms,
            SettingKey::Joystick => i32::from(self.joystick_enabled),
        }
    }
}

/// The fixed set of keys accepted by `SET:<KEY>:<value>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    ClickLeft,
    ClickDouble,
    ClickRight,
    ScrollUp,
    ScrollDown,
    ScrollSpeed,
    Scroll,
    Wavelength,
    Period,
    Deadzone,
    Debounce,
    Joystick,
}

impl SettingKey {
    /// All keys in settings-dump order.
    pub const ALL: [SettingKey; 12] = [
        SettingKey::ClickLeft,
        SettingKey::ClickDouble,
        SettingKey::ClickRight,
        SettingKey::ScrollUp,
        SettingKey::ScrollDown,
        SettingKey::ScrollSpeed,
        SettingKey::Scroll,
        SettingKey::Wavelength,
        SettingKey::Period,
        SettingKey::Deadzone,
        SettingKey::Debounce,
        SettingKey::Joystick,
    ];

    /// Wire name of the key.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            SettingKey::ClickLeft => "CLICK_LEFT",
            SettingKey::ClickDouble => "CLICK_DOUBLE",
            SettingKey::ClickRight => "CLICK_RIGHT",
            SettingKey::ScrollUp => "SCROLL_UP",
            SettingKey::ScrollDown => "SCROLL_DOWN",
            SettingKey::ScrollSpeed => "SCROLL_SPEED",
            SettingKey::Scroll => "SCROLL",
            SettingKey::Wavelength => "WAVELENGTH",
            SettingKey::Period => "PERIOD",
            SettingKey::Deadzone => "DEADZONE",
            SettingKey::Debounce => "DEBOUNCE",
            SettingKey::Joystick => "JOYSTICK",
        }
    }

    /// Case-sensitive lookup by wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.name() == name)
    }

    /// On/off keys acknowledge with their resulting state.
    #[must_use]
    pub fn is_toggle(self) -> bool {
        matches!(self, SettingKey::Scroll | SettingKey::Joystick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarity_sign() {
        assert_eq!(Polarity::PuffPrimary.sign(), 1);
        assert_eq!(Polarity::SipPrimary.sign(), -1);
        assert_eq!(Polarity::default(), Polarity::PuffPrimary);
    }

    #[test]
    fn test_puff_primary_defaults() {
        let s = Settings::defaults_for(Polarity::PuffPrimary);
        assert_eq!(s.click_left, 10);
        assert_eq!(s.click_double, 15);
        assert_eq!(s.click_right, -10);
        assert_eq!(s.scroll_up, -5);
        assert_eq!(s.scroll_down, 5);
        assert_eq!(s.scroll_speed, 1);
        assert!(s.scroll_enabled);
        assert_eq!(s.click_debounce_ms, 500);
        assert!(s.joystick_enabled);
        assert_eq!(s.joystick_deadzone, 25);
        assert_eq!(s.wavelength, 15);
        assert_eq!(s.period_ms, 35);
        assert_eq!(Settings::default(), s);
    }

    #[test]
    fn test_sip_primary_defaults_mirror_thresholds() {
        let puff = Settings::defaults_for(Polarity::PuffPrimary);
        let sip = Settings::defaults_for(Polarity::SipPrimary);
        assert_eq!(sip.click_left, -puff.click_left);
        assert_eq!(sip.click_double, -puff.click_double);
        assert_eq!(sip.click_right, -puff.click_right);
        assert_eq!(sip.scroll_up, -puff.scroll_up);
        assert_eq!(sip.scroll_down, -puff.scroll_down);
        // Non-directional fields are shared
        assert_eq!(sip.click_debounce_ms, puff.click_debounce_ms);
        assert_eq!(sip.wavelength, puff.wavelength);
    }

    #[test]
    fn test_set_then_get_every_key() {
        for key in SettingKey::ALL {
            let mut s = Settings::default();
            let value = if key.is_toggle() { 0 } else { -42 };
            s.set(key, value);
            assert_eq!(s.get(key), value, "key {}", key.name());
        }
    }

    #[test]
    fn test_toggle_only_one_enables() {
        let mut s = Settings::default();
        s.set(SettingKey::Joystick, 2);
        assert!(!s.joystick_enabled);
        s.set(SettingKey::Joystick, 1);
        assert!(s.joystick_enabled);
        s.set(SettingKey::Scroll, -1);
        assert!(!s.scroll_enabled);
        assert_eq!(s.get(SettingKey::Scroll), 0);
    }

    #[test]
    fn test_set_touches_single_field() {
        let mut s = Settings::default();
        s.set(SettingKey::Deadzone, 40);
        let expected = Settings {
            joystick_deadzone: 40,
            ..Settings::default()
        };
        assert_eq!(s, expected);
    }

    #[test]
    fn test_key_names_round_trip() {
        for key in SettingKey::ALL {
            assert_eq!(SettingKey::from_name(key.name()), Some(key));
        }
    }

    #[test]
    fn test_key_lookup_is_case_sensitive() {
        assert_eq!(SettingKey::from_name("click_left"), None);
        assert_eq!(SettingKey::from_name("Joystick"), None);
        assert_eq!(SettingKey::from_name(""), None);
        assert_eq!(SettingKey::from_name("BASELINE"), None);
    }

    #[test]
    fn test_toggle_keys() {
        let toggles: Vec<_> = SettingKey::ALL.into_iter().filter(|k| k.is_toggle()).collect();
        assert_eq!(toggles, vec![SettingKey::Scroll, SettingKey::Joystick]);
    }
}
