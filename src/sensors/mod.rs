//! # Sensors Module
//!
//! Raw analog sampling for the pressure transducer and the two joystick axes.
//!
//! The engine only ever asks "read channel X" and gets back an integer in
//! `0..=ADC_MAX`. Out-of-range or stuck readings are not detected here; the
//! thresholds and the deadzone are expected to absorb noise.

pub mod iio;

/// Largest value returned by [`AnalogInput::read`] (10-bit full scale).
pub const ADC_MAX: i32 = 1023;

/// Logical analog inputs wired to the ADC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorChannel {
    /// Differential pressure transducer on the sip/puff tube.
    Pressure,
    /// Joystick horizontal axis.
    JoystickX,
    /// Joystick vertical axis.
    JoystickY,
}

impl SensorChannel {
    pub(crate) fn index(self) -> usize {
        match self {
            SensorChannel::Pressure => 0,
            SensorChannel::JoystickX => 1,
            SensorChannel::JoystickY => 2,
        }
    }
}

/// Source of raw analog samples.
///
/// Reads never fail from the engine's point of view: adapters that can fail
/// are expected to log and return their last good sample.
pub trait AnalogInput {
    fn read(&mut self, channel: SensorChannel) -> i32;
}
