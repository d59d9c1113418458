//! Sweep profile calculation.
//!
//! A sweep is a table of step-timer reload values, one per step interval.
//! Tables are either supplied directly or generated from a constant
//! acceleration trapezoid.

use heapless::Vec;
use libm::sqrtf;

use crate::config::{AxisConfig, SweepConfig, TiltMechanics, TimerClock};
use crate::error::ConfigError;

/// Capacity of the sweep profile table.
pub const MAX_PROFILE_LEN: usize = 8192;

/// Ramp segment of a trapezoidal sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampPhase {
    /// Speeding up from the start rate.
    Accelerating,
    /// Holding the cruise rate.
    Cruising,
    /// Slowing back to the start rate.
    Decelerating,
    /// Past the last step.
    Complete,
}

/// Symmetric trapezoidal step-rate plan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrapezoidPlan {
    /// Steps in the sweep.
    pub total_steps: u32,

    /// Steps spent accelerating.
    pub accel_steps: u32,

    /// Steps at cruise rate.
    pub cruise_steps: u32,

    /// Steps spent decelerating.
    pub decel_steps: u32,

    /// Step rate at both ends, in steps/sec.
    pub start_rate: f32,

    /// Step rate at cruise, in steps/sec.
    pub cruise_rate: f32,

    /// Acceleration in steps/sec².
    pub acceleration: f32,
}

impl TrapezoidPlan {
    /// Plan `total_steps` steps ramping between `start_rate` and `cruise_rate`.
    pub fn new(total_steps: u32, start_rate: f32, cruise_rate: f32, acceleration: f32) -> Self {
        if total_steps == 0 || !(start_rate > 0.0) || !(acceleration > 0.0) {
            return Self::zero();
        }

        let cruise_rate = if cruise_rate > start_rate { cruise_rate } else { start_rate };

        // Distance to reach cruise: (vc² - v0²) / 2a
        let ramp_steps = ((cruise_rate * cruise_rate - start_rate * start_rate)
            / (2.0 * acceleration)) as u32;
        let ramp_steps = ramp_steps.min(total_steps);

        let ramp_total = ramp_steps.saturating_mul(2);
        let (accel_steps, cruise_steps, decel_steps) = if ramp_total >= total_steps {
            // Triangle profile: cruise rate never reached
            let accel_steps = total_steps / 2;
            (accel_steps, 0, total_steps - accel_steps)
        } else {
            (ramp_steps, total_steps - ramp_total, ramp_steps)
        };

        Self {
            total_steps,
            accel_steps,
            cruise_steps,
            decel_steps,
            start_rate,
            cruise_rate,
            acceleration,
        }
    }

    /// Plan for a configured sweep.
    pub fn from_sweep(sweep: &SweepConfig, mechanics: &TiltMechanics) -> Self {
        let steps = mechanics.radians_to_steps(sweep.angle_rad).unsigned_abs();
        Self::new(
            steps,
            sweep.start_hz.0 as f32,
            sweep.cruise_hz.0 as f32,
            sweep.acceleration,
        )
    }

    /// Plan with no steps.
    pub fn zero() -> Self {
        Self {
            total_steps: 0,
            accel_steps: 0,
            cruise_steps: 0,
            decel_steps: 0,
            start_rate: 0.0,
            cruise_rate: 0.0,
            acceleration: 0.0,
        }
    }

    /// Get the phase at a given step number.
    pub fn phase_at(&self, step: u32) -> RampPhase {
        if step >= self.total_steps {
            RampPhase::Complete
        } else if step < self.accel_steps {
            RampPhase::Accelerating
        } else if step < self.accel_steps + self.cruise_steps {
            RampPhase::Cruising
        } else {
            RampPhase::Decelerating
        }
    }

    /// Step rate at a given step number, from v² = v0² + 2as.
    pub fn rate_at(&self, step: u32) -> f32 {
        let ramp = |distance: u32| {
            let v = sqrtf(self.start_rate * self.start_rate + 2.0 * self.acceleration * distance as f32);
            if v < self.cruise_rate {
                v
            } else {
                self.cruise_rate
            }
        };

        match self.phase_at(step) {
            RampPhase::Complete => 0.0,
            RampPhase::Cruising => self.cruise_rate,
            RampPhase::Accelerating => ramp(step),
            RampPhase::Decelerating => ramp(self.total_steps - 1 - step),
        }
    }
}

/// Table of step-timer reload values for one sweep.
///
/// Entry 0 is the wait before the first step; each later entry is loaded
/// after the step it follows. A zero entry terminates the table early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepProfile {
    reloads: Vec<u32, MAX_PROFILE_LEN>,
}

impl SweepProfile {
    /// Empty table, for use as a `static` slot.
    pub const fn new() -> Self {
        Self { reloads: Vec::new() }
    }

    /// Build from explicit reload values.
    ///
    /// # Errors
    ///
    /// `EmptyProfile` if there is no leading non-zero entry,
    /// `ProfileTooLong` if the table does not fit.
    pub fn from_reloads(reloads: &[u32]) -> Result<Self, ConfigError> {
        match reloads.first() {
            None | Some(0) => return Err(ConfigError::EmptyProfile),
            Some(_) => {}
        }

        let reloads =
            Vec::from_slice(reloads).map_err(|_| ConfigError::ProfileTooLong(reloads.len() as u32))?;
        Ok(Self { reloads })
    }

    /// Generate from a trapezoid plan for the given step timer.
    ///
    /// The table holds `total_steps + 1` entries.
    pub fn from_plan(plan: &TrapezoidPlan, timer: &TimerClock) -> Result<Self, ConfigError> {
        let mut profile = Self::new();
        profile.fill_from_plan(plan, timer)?;
        Ok(profile)
    }

    /// Generate the configured sweep.
    pub fn from_config(config: &AxisConfig) -> Result<Self, ConfigError> {
        let mut profile = Self::new();
        profile.fill_from_config(config)?;
        Ok(profile)
    }

    /// Regenerate in place from a trapezoid plan.
    ///
    /// The table is left empty on error.
    pub fn fill_from_plan(
        &mut self,
        plan: &TrapezoidPlan,
        timer: &TimerClock,
    ) -> Result<(), ConfigError> {
        self.reloads.clear();
        if plan.total_steps == 0 {
            return Err(ConfigError::EmptyProfile);
        }
        if plan.total_steps as usize >= MAX_PROFILE_LEN {
            return Err(ConfigError::ProfileTooLong(plan.total_steps));
        }

        let last = plan.total_steps - 1;
        for index in 0..=plan.total_steps {
            let rate = plan.rate_at(index.min(last));
            let pushed = timer
                .reload_for_rate(rate)
                .filter(|&r| r > 0)
                .ok_or(ConfigError::InvalidFrequency(rate as u32))
                .and_then(|reload| {
                    self.reloads
                        .push(reload)
                        .map_err(|_| ConfigError::ProfileTooLong(plan.total_steps))
                });
            if let Err(e) = pushed {
                self.reloads.clear();
                return Err(e);
            }
        }

        Ok(())
    }

    /// Regenerate the configured sweep in place.
    pub fn fill_from_config(&mut self, config: &AxisConfig) -> Result<(), ConfigError> {
        let plan = TrapezoidPlan::from_sweep(&config.sweep, &config.mechanics);
        self.fill_from_plan(&plan, &config.timing.step_timer)
    }

    /// Reload applied when a sweep restarts.
    #[inline]
    pub fn first(&self) -> u32 {
        self.reloads.first().copied().unwrap_or(0)
    }

    /// Entry at `index`, if inside the table.
    #[inline]
    pub fn get(&self, index: usize) -> Option<u32> {
        self.reloads.get(index).copied()
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.reloads.len()
    }

    /// Table has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.reloads.is_empty()
    }

    /// Raw reload values.
    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.reloads
    }
}

impl Default for SweepProfile {
    fn default() -> Self {
        Self::new()
    }
}

/// Position inside a [`SweepProfile`] during a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfileCursor {
    index: usize,
}

impl ProfileCursor {
    /// Cursor at the table start.
    pub const fn new() -> Self {
        Self { index: 0 }
    }

    /// Rewind and return the first reload.
    #[inline]
    pub fn restart(&mut self, profile: &SweepProfile) -> u32 {
        self.index = 0;
        profile.first()
    }

    /// Move to the next entry.
    ///
    /// Returns the reload to apply after stepping, or `None` once the table
    /// end or a zero entry is reached.
    #[inline]
    pub fn advance(&mut self, profile: &SweepProfile) -> Option<u32> {
        self.index = self.index.saturating_add(1);
        profile.get(self.index).filter(|&reload| reload > 0)
    }

    /// Current entry index.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }
}
