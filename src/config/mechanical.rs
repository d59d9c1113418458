//! Tilt drive mechanics: step count to angle conversion.

use core::f32::consts::TAU;

use serde::Deserialize;

use super::units::{Microsteps, Radians};

/// Mechanical constants of the tilt drive train.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TiltMechanics {
    /// Full steps per motor revolution.
    pub full_steps_per_revolution: u16,

    /// Microstep divisor programmed into DRVCTRL.MRES.
    pub microsteps: Microsteps,

    /// Gear ratio numerator (motor side).
    pub gear_ratio_num: f32,

    /// Gear ratio denominator (output side).
    pub gear_ratio_den: f32,
}

impl Default for TiltMechanics {
    fn default() -> Self {
        Self {
            full_steps_per_revolution: 200,
            microsteps: Microsteps::SIXTY_FOURTH,
            gear_ratio_num: 1.0,
            gear_ratio_den: 1.0,
        }
    }
}

impl TiltMechanics {
    /// Microsteps per motor revolution.
    #[inline]
    pub fn micro_steps_per_revolution(&self) -> u32 {
        self.full_steps_per_revolution as u32 * self.microsteps.value() as u32
    }

    /// Angle reached after `steps` microsteps from home.
    #[inline]
    pub fn steps_to_radians(&self, steps: i32) -> f32 {
        (steps as f32 / self.micro_steps_per_revolution() as f32)
            * (self.gear_ratio_den / self.gear_ratio_num)
            * TAU
    }

    /// Microsteps from home for `radians`, truncated toward zero.
    #[inline]
    pub fn radians_to_steps(&self, radians: Radians) -> i32 {
        ((radians.0 * self.micro_steps_per_revolution() as f32 * self.gear_ratio_num)
            / (self.gear_ratio_den * TAU)) as i32
    }
}
