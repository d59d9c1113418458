//! Tilt over-rotation guard bounds.

use serde::Deserialize;

use super::units::Radians;

/// Angular window the tilt axis may occupy outside of homing.
///
/// Leaving the window sends the controller back to `Home`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TiltLimits {
    /// Lower bound.
    pub min_rad: Radians,

    /// Upper bound.
    pub max_rad: Radians,
}

impl Default for TiltLimits {
    fn default() -> Self {
        Self {
            min_rad: Radians(-0.5),
            max_rad: Radians(3.5),
        }
    }
}

impl TiltLimits {
    /// Create new limits.
    pub fn new(min_rad: Radians, max_rad: Radians) -> Self {
        Self { min_rad, max_rad }
    }

    /// Home (zero) must lie strictly inside the window.
    pub fn is_valid(&self) -> bool {
        self.min_rad.0 < 0.0 && self.max_rad.0 > 0.0
    }

    /// Check if an angle is within the window (bounds inclusive).
    pub fn contains(&self, position_rad: f32) -> bool {
        position_rad >= self.min_rad.0 && position_rad <= self.max_rad.0
    }
}
