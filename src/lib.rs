//! # tilt-stepper
//!
//! Tilt-axis motion control for a rotating LIDAR head: a TMC260 stepper driver
//! on SPI plus STEP/DIR lines, a home flag sensor and two hardware timers.
//!
//! ## Features
//!
//! - **TMC260 protocol**: 20-bit register datagrams, checked field packing,
//!   two-phase status reads with a register shadow
//! - **Interrupt-driven**: step generator, home sensor and state machine run
//!   in separate handlers sharing lock-free state
//! - **Homing and sweeps**: flag-based homing, trapezoidal back-and-forth
//!   sweeps with an over-rotation guard
//! - **embedded-hal 1.0**: `OutputPin`/`InputPin`, `SpiBus`, `DelayNs`
//! - **no_std compatible**: core library works without standard library
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tilt_stepper::{AxisShared, TiltAxisBuilder, Tmc260, BusPort, NoIndicators};
//!
//! static SHARED: AxisShared = AxisShared::new();
//! // `profile` below is a `&'static mut SweepProfile` from a static cell
//!
//! let config = tilt_stepper::load_config("tilt.toml")?;
//! let axis = TiltAxisBuilder::new()
//!     .config(config)
//!     .pins(step, dir, enable)
//!     .home_pin(home)
//!     .driver(Tmc260::new(BusPort::new(spi), cs, delay, config.transport))
//!     .step_timer(tim2)
//!     .state_timer(tim3)
//!     .telemetry(())
//!     .indicators(NoIndicators)
//!     .profile_slot(profile)
//!     .build(&SHARED)?;
//!
//! // Move axis.step_generator, axis.home_sensor, axis.stall_monitor and
//! // axis.controller into their interrupt handlers, then poll for angle
//! // reports:
//! if let Some(position) = SHARED.take_angle_report() {
//!     // ...
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O and TOML parsing
//! - `defmt`: Enables defmt logging for embedded targets
//! - `critical-section`: 64-bit atomics on targets without them

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

// Must come first so the logging macros are visible everywhere
#[macro_use]
mod fmt;

// Core modules
pub mod axis;
pub mod config;
pub mod driver;
pub mod error;
pub mod motion;

// Re-exports for ergonomic API
pub use axis::{
    AxisShared, DebugIndicators, FaultCause, Indicator, MotorPhase, NoIndicators, PeriodicTimer,
    PhaseTag, TelemetryReport, TelemetrySink, TiltAxis, TiltAxisBuilder,
};
pub use config::{validate_config, AxisConfig};
pub use driver::{BusPort, SpiPort, StatusKind, StatusReading, Tmc260};
pub use error::{Error, Result};
pub use motion::{Direction, PositionState, SweepProfile};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::{Hertz, Microsteps, Radians};
