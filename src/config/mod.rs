//! Configuration module for tilt-stepper.
//!
//! Provides the axis configuration with firmware defaults, loadable from TOML
//! files (with `std` feature) or constructed in code.

mod limits;
mod mechanical;
mod system;
pub mod units;
#[cfg(feature = "std")]
mod loader;
mod validation;

pub use limits::TiltLimits;
pub use mechanical::TiltMechanics;
pub use system::{
    AxisConfig, DriverSettings, HomeConfig, PinLevel, SequenceConfig, SweepConfig, TimerClock,
    TimingConfig, TransportConfig,
};
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{Hertz, Microsteps, Radians};
