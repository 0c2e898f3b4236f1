//! # Sip & Puff Pointer Library
//!
//! Turn a breath pressure sensor and an analog joystick into a mouse.
//!
//! This library provides the pointer engine (pressure zone classification,
//! joystick motion mapping, live reconfiguration over a text protocol) and
//! the Linux adapters around it: IIO ADC input, a uinput virtual mouse, a
//! sysfs status LED and a serial command port.

pub mod config;
pub mod engine;
pub mod error;
pub mod indicator;
pub mod pointer;
pub mod protocol;
pub mod sensors;
pub mod serial;
pub mod telemetry;
