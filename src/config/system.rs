//! Axis configuration - root configuration structure.

use serde::Deserialize;

use crate::driver::{ChopConf, DrvConf, DrvCtrlStepDir, SgcsConf, SmartEn};

use super::limits::TiltLimits;
use super::mechanical::TiltMechanics;
use super::units::{Hertz, Microsteps, Radians};

/// Input clock and prescaler of a hardware timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimerClock {
    /// Timer input clock in Hz.
    pub clock_hz: u32,

    /// Prescaler register value (divides by `prescaler + 1`).
    #[serde(default)]
    pub prescaler: u16,
}

impl TimerClock {
    /// Create a timer clock description.
    pub const fn new(clock_hz: u32, prescaler: u16) -> Self {
        Self { clock_hz, prescaler }
    }

    /// Auto-reload value for an update rate of `rate`.
    ///
    /// `clock / (rate * (prescaler + 1)) - 1`. Returns `None` when the rate is
    /// zero or too fast for the clock.
    pub fn reload(&self, rate: Hertz) -> Option<u32> {
        let divisor = (rate.0 as u64) * (self.prescaler as u64 + 1);
        if divisor == 0 {
            return None;
        }
        let ticks = self.clock_hz as u64 / divisor;
        if ticks == 0 {
            return None;
        }
        Some((ticks - 1) as u32)
    }

    /// Auto-reload value for a fractional step rate.
    pub fn reload_for_rate(&self, steps_per_sec: f32) -> Option<u32> {
        if steps_per_sec.is_nan() || steps_per_sec <= 0.0 {
            return None;
        }
        let ticks = self.clock_hz as f32 / (steps_per_sec * (self.prescaler as f32 + 1.0));
        if ticks < 1.0 || ticks > u32::MAX as f32 {
            return None;
        }
        Some(ticks as u32 - 1)
    }
}

/// Timer clocks and step rates.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Step timer clock (84 MHz APB1 timer clock).
    pub step_timer: TimerClock,

    /// State-machine timer clock (168 MHz, prescaler 2).
    pub state_timer: TimerClock,

    /// State-machine tick rate.
    pub state_machine_hz: Hertz,

    /// Step rate used at start-up and in the test rotations.
    pub default_step_hz: Hertz,

    /// Step rate while homing.
    pub home_step_hz: Hertz,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            step_timer: TimerClock::new(84_000_000, 0),
            state_timer: TimerClock::new(168_000_000, 2),
            state_machine_hz: Hertz(100),
            default_step_hz: Hertz(1000),
            home_step_hz: Hertz(400),
        }
    }
}

/// Tick counts driving the phase sequence (in state-machine ticks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Pause between homing and the first sweep.
    pub settle_ticks: u32,

    /// Length of each test rotation.
    pub test_phase_ticks: u32,

    /// Angle report period.
    pub report_interval_ticks: u32,

    /// Homing gives up after this many ticks.
    pub home_timeout_ticks: u32,

    /// A single sweep gives up after this many ticks.
    pub sweep_timeout_ticks: u32,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            settle_ticks: 200,
            test_phase_ticks: 80_000,
            report_interval_ticks: 25,
            home_timeout_ticks: 6_000,
            sweep_timeout_ticks: 3_000,
        }
    }
}

/// SPI datagram timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Settle delay around chip-select edges, in microseconds.
    pub settle_delay_us: u32,

    /// Status-flag polls before a transport wait times out.
    pub poll_limit: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            settle_delay_us: 10,
            poll_limit: 10_000,
        }
    }
}

/// Electrical level of a digital input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum PinLevel {
    /// Logic low
    #[default]
    Low,
    /// Logic high
    High,
}

/// Home flag sensor wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct HomeConfig {
    /// Level read while the flag covers the sensor.
    pub covered_level: PinLevel,
}

/// Register values written during driver bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct DriverSettings {
    /// Interpolate each step to 256 microsteps.
    pub interpolate: bool,

    /// Step on both STEP edges. Required: pulses toggle the line.
    pub double_edge: bool,

    /// Driver configuration.
    pub drvconf: DrvConf,

    /// Chopper configuration.
    pub chopconf: ChopConf,

    /// coolStep configuration.
    pub smarten: SmartEn,

    /// stallGuard2 and current scale.
    pub sgcsconf: SgcsConf,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            interpolate: false,
            double_edge: true,
            drvconf: DrvConf::default(),
            chopconf: ChopConf::default(),
            smarten: SmartEn::default(),
            sgcsconf: SgcsConf::default(),
        }
    }
}

impl DriverSettings {
    /// DRVCTRL value in step/dir mode for the given resolution.
    pub fn drvctrl(&self, microsteps: Microsteps) -> DrvCtrlStepDir {
        DrvCtrlStepDir {
            intpol: self.interpolate as u8,
            dedge: self.double_edge as u8,
            mres: microsteps.mres(),
        }
    }
}

/// Trapezoidal tilt sweep.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Angle covered by one sweep.
    pub angle_rad: Radians,

    /// Step rate at both ends of the sweep.
    pub start_hz: Hertz,

    /// Step rate in the middle of the sweep.
    pub cruise_hz: Hertz,

    /// Ramp acceleration in steps per second squared.
    pub acceleration: f32,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            angle_rad: Radians(3.0),
            start_hz: Hertz(400),
            cruise_hz: Hertz(2000),
            acceleration: 4000.0,
        }
    }
}

/// Root configuration of the tilt axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct AxisConfig {
    /// Drive train.
    pub mechanics: TiltMechanics,

    /// Timer clocks and rates.
    pub timing: TimingConfig,

    /// Over-rotation guard.
    pub limits: TiltLimits,

    /// Phase sequencing.
    pub sequence: SequenceConfig,

    /// SPI datagram timing.
    pub transport: TransportConfig,

    /// Home flag wiring.
    pub home: HomeConfig,

    /// TMC260 bring-up registers.
    pub driver: DriverSettings,

    /// Tilt sweep shape.
    pub sweep: SweepConfig,
}

impl AxisConfig {
    /// Step-timer reload for the default step rate.
    pub fn default_step_reload(&self) -> Option<u32> {
        self.timing.step_timer.reload(self.timing.default_step_hz)
    }

    /// Step-timer reload for the homing step rate.
    pub fn home_step_reload(&self) -> Option<u32> {
        self.timing.step_timer.reload(self.timing.home_step_hz)
    }

    /// State-timer reload for the state-machine rate.
    pub fn state_reload(&self) -> Option<u32> {
        self.timing.state_timer.reload(self.timing.state_machine_hz)
    }
}
