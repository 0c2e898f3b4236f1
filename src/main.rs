//! # Sip & Puff Pointer
//!
//! Turn a breath pressure sensor and an analog joystick into a mouse, tunable
//! live from a configuration tool over a serial line.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Load the deployment configuration (first argument, default
//!      `config/default.toml`)
//!    - Set up logging with tracing subscriber (and a daily log file)
//!    - Open the ADC, the virtual mouse, the status LED and the command port
//!
//! 2. **Main Loop**
//!    - A serial transport task moves bytes on the tokio runtime and
//!      reopens the port after a disconnect
//!    - The engine ticks on a blocking thread until shutdown
//!
//! 3. **Graceful Shutdown**
//!    - Ctrl+C sets the shutdown flag
//!    - The engine finishes its current tick and returns
//!
//! ```text
//! INFO sippuff: Sip & Puff Pointer v0.1.0 starting...
//! INFO sippuff::serial: Command port opened at /dev/ttyGS0
//! INFO sippuff::engine: Engine ready (PuffPrimary, baseline 503)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use sippuff::config::{Config, LoggingConfig};
use sippuff::engine::clock::SystemClock;
use sippuff::engine::{Engine, Peripherals};
use sippuff::indicator::{NullIndicator, StatusIndicator, SysfsLed};
use sippuff::pointer::uinput::VirtualPointer;
use sippuff::sensors::iio::IioAdc;
use sippuff::serial::CommandPort;
use sippuff::telemetry::ActionJournal;

/// Configuration file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// File name prefix of the rolling log files
const LOG_FILE_PREFIX: &str = "sippuff.log";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    let _log_guard = init_logging(&config.logging);
    info!("Sip & Puff Pointer v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from {}", config_path);

    let input = IioAdc::open(&config.sensors).context("Failed to open ADC")?;
    let pointer = VirtualPointer::create(&config.pointer.device_name)
        .context("Failed to create virtual pointer")?;
    let indicator = open_indicator(&config.indicator.led);
    let journal = if config.journal.enabled {
        Some(ActionJournal::open(&config.journal.path).context("Failed to open action journal")?)
    } else {
        None
    };

    let port = CommandPort::open(&config.serial).context("Failed to open command port")?;
    info!("Command port: {}", port.device_path());
    let (commands, responses, transport) = port.spawn();

    let peripherals = Peripherals {
        input: Box::new(input),
        pointer: Box::new(pointer),
        indicator,
        clock: Box::new(SystemClock::new()),
        commands: Box::new(commands),
        responses: Box::new(responses),
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    let polarity = config.engine.polarity;
    let tick_interval_ms = config.engine.tick_interval_ms;

    let engine_shutdown = Arc::clone(&shutdown);
    let mut engine_task = tokio::task::spawn_blocking(move || {
        let mut engine = Engine::new(peripherals, polarity, journal);
        engine.boot();
        engine.run(&engine_shutdown, tick_interval_ms);
    });

    info!("Press Ctrl+C to exit");

    tokio::select! {
        result = &mut engine_task => {
            result.context("Engine thread panicked")?;
            warn!("Engine stopped unexpectedly");
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!("Failed to listen for Ctrl+C: {}", e);
            }
            info!("Received Ctrl+C, shutting down...");
            shutdown.store(true, Ordering::Relaxed);
            engine_task.await.context("Engine thread panicked")?;
        }
    }

    transport.abort();
    info!("Shutdown complete");
    Ok(())
}

/// Install the tracing subscriber
///
/// `RUST_LOG` overrides the configured level. The returned guard must stay
/// alive for the file writer to flush.
fn init_logging(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.dir.is_empty() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
        return None;
    }

    let appender = tracing_appender::rolling::daily(&logging.dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();
    Some(guard)
}

/// Open the configured status LED, falling back to no indicator.
fn open_indicator(led: &str) -> Box<dyn StatusIndicator + Send> {
    if led.is_empty() {
        return Box::new(NullIndicator);
    }
    match SysfsLed::open(led) {
        Ok(led) => Box::new(led),
        Err(e) => {
            warn!("Status LED {} unavailable, continuing without: {}", led, e);
            Box::new(NullIndicator)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path_loads() {
        let config = Config::load(DEFAULT_CONFIG_PATH).unwrap();
        assert!(!config.serial.port.is_empty());
    }

    #[test]
    fn test_missing_led_falls_back() {
        // No LED by this name exists on a build machine
        let mut indicator = open_indicator("sippuff-test-led-does-not-exist");
        indicator.set(true);
        indicator.set(false);
    }

    #[test]
    fn test_empty_led_name_means_no_indicator() {
        let mut indicator = open_indicator("");
        indicator.set(true);
    }
}
