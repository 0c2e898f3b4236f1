//! # Engine Module
//!
//! The cooperative scheduler that turns sensor samples into pointer actions.
//!
//! This module handles:
//! - Owning the tunables, the pressure baseline and the diagnostic mode flag
//! - Servicing at most one protocol command per tick
//! - Classifying the pressure differential into clicks and scroll
//! - Throttled joystick movement
//!
//! Everything runs on one thread. Every blocking delay (calibration, the
//! double click gap, feedback pulses, the pressure-test interval, the tick
//! interval) stalls the whole engine; received command bytes queue up in the
//! transport meanwhile.

pub mod calibration;
pub mod classifier;
pub mod clock;
pub mod motion;
pub mod settings;

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, trace};

use self::calibration::calibrate;
use self::classifier::{Decision, Feedback, PressureClassifier};
use self::clock::Clock;
use self::motion::JoystickMotionMapper;
use self::settings::{Polarity, Settings};
use crate::indicator::StatusIndicator;
use crate::pointer::PointerSink;
use crate::protocol::handler::send_settings;
use crate::protocol::{ByteSource, CommandHandler, CommandTarget, Response, ResponseSink};
use crate::sensors::{AnalogInput, SensorChannel};
use crate::telemetry::ActionJournal;

/// Pause after each differential sample while pressure-test mode is active.
pub const PRESSURE_TEST_INTERVAL_MS: u64 = 100;

/// Everything the engine talks to.
pub struct Peripherals {
    pub input: Box<dyn AnalogInput + Send>,
    pub pointer: Box<dyn PointerSink + Send>,
    pub indicator: Box<dyn StatusIndicator + Send>,
    pub clock: Box<dyn Clock + Send>,
    pub commands: Box<dyn ByteSource + Send>,
    pub responses: Box<dyn ResponseSink + Send>,
}

/// Sip & puff pointer engine.
pub struct Engine {
    io: Peripherals,
    polarity: Polarity,
    settings: Settings,
    baseline: i32,
    pressure_test: bool,
    handler: CommandHandler,
    classifier: PressureClassifier,
    motion: JoystickMotionMapper,
    journal: Option<ActionJournal>,
}

/// Disjoint borrow of the engine state a command may touch.
struct CommandContext<'a> {
    settings: &'a mut Settings,
    baseline: &'a mut i32,
    pressure_test: &'a mut bool,
    input: &'a mut dyn AnalogInput,
    clock: &'a mut dyn Clock,
}

impl CommandTarget for CommandContext<'_> {
    fn settings(&self) -> &Settings {
        &*self.settings
    }

    fn settings_mut(&mut self) -> &mut Settings {
        &mut *self.settings
    }

    fn baseline(&self) -> i32 {
        *self.baseline
    }

    fn recalibrate(&mut self) -> i32 {
        *self.baseline = calibrate(&mut *self.input, &mut *self.clock);
        *self.baseline
    }

    fn set_pressure_test(&mut self, active: bool) {
        *self.pressure_test = active;
    }
}

impl Engine {
    /// Build an engine with the compiled defaults for `polarity`.
    ///
    /// Call [`boot`](Self::boot) before the first tick.
    pub fn new(io: Peripherals, polarity: Polarity, journal: Option<ActionJournal>) -> Self {
        Self {
            io,
            polarity,
            settings: Settings::defaults_for(polarity),
            baseline: 0,
            pressure_test: false,
            handler: CommandHandler::new(),
            classifier: PressureClassifier::new(),
            motion: JoystickMotionMapper::new(),
            journal,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn baseline(&self) -> i32 {
        self.baseline
    }

    #[must_use]
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    #[must_use]
    pub fn pressure_test(&self) -> bool {
        self.pressure_test
    }

    /// Start-up sequence
    ///
    /// Holds the indicator on while calibrating, announces the device and
    /// sends an unsolicited settings dump so an already connected tool
    /// syncs without asking.
    pub fn boot(&mut self) {
        self.io.indicator.set(true);
        self.io.responses.send(Response::Info(format!(
            "Sip & Puff Pointer v{}",
            env!("CARGO_PKG_VERSION")
        )));
        self.io
            .responses
            .send(Response::Info("Calibrating pressure sensor".to_string()));

        self.baseline = calibrate(&mut *self.io.input, &mut *self.io.clock);
        self.io.indicator.set(false);
        self.io
            .responses
            .send(Response::Info(format!("BASELINE:{}", self.baseline)));

        let now = self.io.clock.now_ms();
        self.motion.arm(now, self.settings.period_ms);

        self.io.responses.send(Response::Info("Ready".to_string()));
        send_settings(&self.settings, self.baseline, &mut *self.io.responses);
        info!(
            "Engine ready ({:?}, baseline {})",
            self.polarity, self.baseline
        );
    }

    /// One polling pass
    pub fn tick(&mut self) {
        self.service_command();

        let now = self.io.clock.now_ms();
        let raw = self.io.input.read(SensorChannel::Pressure);
        let diff = raw.saturating_sub(self.baseline);

        if self.pressure_test {
            self.io.responses.send(Response::Differential(diff));
            self.io.clock.delay_ms(PRESSURE_TEST_INTERVAL_MS);
            return;
        }

        trace!("Pressure raw {} differential {}", raw, diff);
        let mut out = Feedback {
            pointer: &mut *self.io.pointer,
            indicator: &mut *self.io.indicator,
            clock: &mut *self.io.clock,
            responses: &mut *self.io.responses,
        };
        let decision =
            self.classifier
                .classify_and_dispatch(diff, now, &self.settings, self.polarity, &mut out);

        if let (Decision::Click(action), Some(journal)) = (decision, self.journal.as_mut()) {
            journal.record(action, diff);
        }

        self.move_pointer();
    }

    /// Tick until `shutdown` is set, sleeping `tick_interval_ms` between
    /// passes.
    pub fn run(&mut self, shutdown: &AtomicBool, tick_interval_ms: u64) {
        info!("Engine running, tick every {} ms", tick_interval_ms);
        while !shutdown.load(Ordering::Relaxed) {
            self.tick();
            self.io.clock.delay_ms(tick_interval_ms);
        }
        info!("Engine stopped");
    }

    fn service_command(&mut self) {
        let mut target = CommandContext {
            settings: &mut self.settings,
            baseline: &mut self.baseline,
            pressure_test: &mut self.pressure_test,
            input: &mut *self.io.input,
            clock: &mut *self.io.clock,
        };
        if let Some(command) =
            self.handler
                .service(&mut *self.io.commands, &mut target, &mut *self.io.responses)
        {
            debug!("Applied {:?}", command);
        }
    }

    fn move_pointer(&mut self) {
        let now = self.io.clock.now_ms();
        let input = &mut self.io.input;
        self.motion.maybe_move(
            now,
            &self.settings,
            || {
                (
                    input.read(SensorChannel::JoystickX),
                    input.read(SensorChannel::JoystickY),
                )
            },
            &mut *self.io.pointer,
        );
    }
}
