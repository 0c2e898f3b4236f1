//! # Pressure Calibration
//!
//! Establishes the pressure zero point by averaging consecutive samples taken
//! with the tube at rest.
//!
//! There is no error path: a stuck or saturated sensor simply produces a bad
//! but valid baseline. The user has to keep the tube neutral while this runs.

use tracing::{debug, info};

use super::clock::Clock;
use crate::sensors::{AnalogInput, SensorChannel};

/// Number of samples averaged into the baseline.
pub const SAMPLES: i64 = 50;

/// Pause between two calibration samples.
pub const SAMPLE_DELAY_MS: u64 = 20;

/// Progress is reported every this many samples.
const PROGRESS_EVERY: i64 = 10;

/// Measure the pressure baseline
///
/// Takes [`SAMPLES`] readings [`SAMPLE_DELAY_MS`] apart and returns their
/// integer mean. Blocks the engine for roughly one second.
///
/// # Examples
///
/// ```ignore
/// let baseline = calibrate(&mut adc, &mut clock);
/// let diff = adc.read(SensorChannel::Pressure) - baseline;
/// ```
pub fn calibrate(input: &mut dyn AnalogInput, clock: &mut dyn Clock) -> i32 {
    info!("Calibrating pressure sensor, keep the tube neutral");

    let mut sum: i64 = 0;
    for i in 0..SAMPLES {
        sum += i64::from(input.read(SensorChannel::Pressure));
        if i % PROGRESS_EVERY == 0 {
            debug!("Calibration sample {}/{}", i + 1, SAMPLES);
        }
        clock.delay_ms(SAMPLE_DELAY_MS);
    }

    let baseline = (sum / SAMPLES) as i32;
    info!("Calibration complete, baseline {}", baseline);
    baseline
}
