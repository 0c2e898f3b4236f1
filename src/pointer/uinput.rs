//! # uinput Virtual Mouse
//!
//! Creates a virtual relative pointer through `/dev/uinput` using evdev, so
//! the host sees the sip & puff device as an ordinary USB mouse.
//!
//! ## Emitted Events
//!
//! | Action | evdev Events |
//! |--------|--------------|
//! | Click | `BTN_LEFT`/`BTN_RIGHT` 1, SYN, 0, SYN |
//! | Move | `REL_X`, `REL_Y` (non-zero axes only), SYN |
//! | Scroll | `REL_WHEEL`, SYN |

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key, RelativeAxisType};
use tracing::{debug, info, warn};

use super::{Button, PointerSink};
use crate::error::{Result, SipPuffError};

/// Virtual mouse backed by a uinput device
pub struct VirtualPointer {
    device: VirtualDevice,
    name: String,
}

impl std::fmt::Debug for VirtualPointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualPointer")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl VirtualPointer {
    /// Create the virtual mouse
    ///
    /// # Arguments
    ///
    /// * `name` - Device name shown to the host (e.g. in `libinput list-devices`)
    ///
    /// # Errors
    ///
    /// Returns `Pointer` error if `/dev/uinput` cannot be opened (missing
    /// module or insufficient permissions)
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sippuff::pointer::uinput::VirtualPointer;
    ///
    /// let pointer = VirtualPointer::create("Sip & Puff Pointer")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn create(name: &str) -> Result<Self> {
        let mut keys = AttributeSet::<Key>::new();
        keys.insert(Key::BTN_LEFT);
        keys.insert(Key::BTN_RIGHT);

        let mut axes = AttributeSet::<RelativeAxisType>::new();
        axes.insert(RelativeAxisType::REL_X);
        axes.insert(RelativeAxisType::REL_Y);
        axes.insert(RelativeAxisType::REL_WHEEL);

        let device = VirtualDeviceBuilder::new()
            .and_then(|builder| builder.name(name).with_keys(&keys))
            .and_then(|builder| builder.with_relative_axes(&axes))
            .and_then(|builder| builder.build())
            .map_err(|e| SipPuffError::Pointer(format!("Failed to create uinput device: {}", e)))?;

        info!("Created virtual pointer '{}'", name);

        Ok(Self {
            device,
            name: name.to_string(),
        })
    }

    /// Device name given at creation
    pub fn name(&self) -> &str {
        &self.name
    }

    fn emit(&mut self, events: &[InputEvent]) {
        if let Err(e) = self.device.emit(events) {
            warn!("Failed to emit pointer events: {}", e);
        }
    }
}

impl PointerSink for VirtualPointer {
    fn click(&mut self, button: Button) {
        let code = button_key(button).code();
        self.emit(&[InputEvent::new(EventType::KEY, code, 1)]);
        self.emit(&[InputEvent::new(EventType::KEY, code, 0)]);
        debug!("Clicked {:?}", button);
    }

    fn move_by(&mut self, dx: i32, dy: i32, wheel: i32) {
        let events = relative_events(dx, dy, wheel);
        if !events.is_empty() {
            self.emit(&events);
        }
    }
}

fn button_key(button: Button) -> Key {
    match button {
        Button::Left => Key::BTN_LEFT,
        Button::Right => Key::BTN_RIGHT,
    }
}

/// Relative events for a move, skipping zero axes.
fn relative_events(dx: i32, dy: i32, wheel: i32) -> Vec<InputEvent> {
    [
        (RelativeAxisType::REL_X, dx),
        (RelativeAxisType::REL_Y, dy),
        (RelativeAxisType::REL_WHEEL, wheel),
    ]
    .into_iter()
    .filter(|(_, value)| *value != 0)
    .map(|(axis, value)| InputEvent::new(EventType::RELATIVE, axis.0, value))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_key_mapping() {
        assert_eq!(button_key(Button::Left), Key::BTN_LEFT);
        assert_eq!(button_key(Button::Right), Key::BTN_RIGHT);
    }

    #[test]
    fn test_relative_events_skip_zero_axes() {
        let events = relative_events(-3, 0, 0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), EventType::RELATIVE);
        assert_eq!(events[0].code(), RelativeAxisType::REL_X.0);
        assert_eq!(events[0].value(), -3);
    }

    #[test]
    fn test_relative_events_wheel() {
        let events = relative_events(0, 0, 2);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].code(), RelativeAxisType::REL_WHEEL.0);
        assert_eq!(events[0].value(), 2);
    }

    #[test]
    fn test_relative_events_all_zero() {
        assert!(relative_events(0, 0, 0).is_empty());
    }

    // Integration test - needs write access to /dev/uinput
    #[test]
    #[ignore]
    fn test_create_with_real_uinput() {
        let mut pointer = VirtualPointer::create("sippuff test pointer").expect("uinput unavailable");
        assert_eq!(pointer.name(), "sippuff test pointer");
        pointer.move_by(1, 1, 0);
    }
}
