//! The tilt axis: three interrupt handlers around one shared state block.
//!
//! | Handler | Runs on | Owns | Writes in [`AxisShared`] |
//! |---|---|---|---|
//! | [`StepGenerator`] | step timer update | STEP/DIR/EN, step timer | position, sweep-complete |
//! | [`HomeSensor`] | home sensor edge | home input | position, flag, home-reached |
//! | [`StallMonitor`] | TMC260 SG edge | nothing | stall latch |
//! | [`TiltController`] | state timer update | TMC260, state timer, telemetry | phase, direction, cadence, restart/disable requests, angle report |
//!
//! Handlers never call each other. Everything crossing a context boundary goes
//! through [`AxisShared`], which is meant to live in a `static`.

mod builder;
mod controller;
mod home;
mod phase;
mod ports;
mod shared;
mod stall;
mod step_generator;

pub use builder::{TiltAxis, TiltAxisBuilder};
pub use controller::TiltController;
pub use home::{classify_edge, EdgeKind, FlagState, HomeSensor};
pub use phase::{FaultCause, MotorPhase, PhaseTag};
pub use ports::{
    DebugIndicators, Indicator, NoIndicators, PeriodicTimer, TelemetryReport, TelemetrySink,
};
pub use shared::AxisShared;
pub use stall::StallMonitor;
pub use step_generator::StepGenerator;
