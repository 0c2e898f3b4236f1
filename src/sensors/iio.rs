//! # Linux IIO ADC Adapter
//!
//! Reads raw samples from an Industrial I/O ADC through sysfs, e.g.
//! `/sys/bus/iio/devices/iio:device0/in_voltage0_raw`.
//!
//! Samples are rescaled from the converter's native resolution to the 10-bit
//! range the engine works in (`0..=1023`).

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{AnalogInput, SensorChannel, ADC_MAX};
use crate::config::SensorConfig;
use crate::error::{Result, SipPuffError};

/// Resolution the engine expects from every sample.
const ENGINE_BITS: u8 = 10;

/// IIO sysfs ADC handle
#[derive(Debug)]
pub struct IioAdc {
    /// `in_voltageN_raw` paths indexed by [`SensorChannel::index`]
    paths: [PathBuf; 3],
    /// Native converter resolution
    adc_bits: u8,
    /// Last good sample per channel, returned when a read fails
    last: [i32; 3],
}

impl IioAdc {
    /// Open the ADC channels named in the sensor configuration
    ///
    /// # Errors
    ///
    /// Returns `Sensor` error if any channel file does not exist
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sippuff::config::Config;
    /// use sippuff::sensors::iio::IioAdc;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// let adc = IioAdc::open(&config.sensors)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(config: &SensorConfig) -> Result<Self> {
        let device = Path::new(&config.iio_device);
        let paths = [
            channel_path(device, config.pressure_channel),
            channel_path(device, config.joystick_x_channel),
            channel_path(device, config.joystick_y_channel),
        ];

        for path in &paths {
            if !path.exists() {
                return Err(SipPuffError::Sensor(format!(
                    "ADC channel {} not found",
                    path.display()
                )));
            }
            debug!("Using ADC channel {}", path.display());
        }

        info!(
            "Opened IIO ADC at {} ({}-bit)",
            config.iio_device, config.adc_bits
        );

        Ok(Self {
            paths,
            adc_bits: config.adc_bits,
            last: [ADC_MAX / 2 + 1; 3],
        })
    }

    fn read_raw(path: &Path) -> Result<i32> {
        let text = fs::read_to_string(path)?;
        text.trim()
            .parse::<i32>()
            .map_err(|e| SipPuffError::Sensor(format!("{}: {}", path.display(), e)))
    }
}

impl AnalogInput for IioAdc {
    fn read(&mut self, channel: SensorChannel) -> i32 {
        let index = channel.index();
        match Self::read_raw(&self.paths[index]) {
            Ok(raw) => {
                let sample = rescale(raw, self.adc_bits);
                self.last[index] = sample;
                sample
            }
            Err(e) => {
                warn!("ADC read failed on {:?}: {}", channel, e);
                self.last[index]
            }
        }
    }
}

fn channel_path(device: &Path, channel: u8) -> PathBuf {
    device.join(format!("in_voltage{}_raw", channel))
}

/// Rescale a native sample to the engine's 10-bit range.
fn rescale(raw: i32, adc_bits: u8) -> i32 {
    let scaled = if adc_bits > ENGINE_BITS {
        raw >> (adc_bits - ENGINE_BITS)
    } else {
        raw << (ENGINE_BITS - adc_bits)
    };
    scaled.clamp(0, ADC_MAX)
}
