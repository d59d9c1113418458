//! Motion module for tilt-stepper.
//!
//! Provides the commanded direction, the shared position tracker and the
//! sweep profile table.

mod position;
mod profile;

pub use position::{PositionCell, PositionState};
pub use profile::{ProfileCursor, RampPhase, SweepProfile, TrapezoidPlan, MAX_PROFILE_LEN};

/// Commanded rotation direction of the tilt axis.
///
/// `Cw` increases the tilt angle, `Ccw` decreases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// No direction commanded. Never written to the DIR line.
    #[default]
    Stopped,
    /// Clockwise (positive step count).
    Cw,
    /// Counter-clockwise (negative step count).
    Ccw,
}

impl Direction {
    /// Get the sign multiplier.
    #[inline]
    pub const fn sign(self) -> i32 {
        match self {
            Direction::Stopped => 0,
            Direction::Cw => 1,
            Direction::Ccw => -1,
        }
    }

    /// Opposite direction. `Stopped` stays stopped.
    #[inline]
    pub const fn reversed(self) -> Self {
        match self {
            Direction::Stopped => Direction::Stopped,
            Direction::Cw => Direction::Ccw,
            Direction::Ccw => Direction::Cw,
        }
    }

    /// Encoding used in atomics.
    #[inline]
    pub const fn to_u8(self) -> u8 {
        match self {
            Direction::Stopped => 0,
            Direction::Cw => 1,
            Direction::Ccw => 2,
        }
    }

    /// Decode from an atomic. Unknown values read as `Stopped`.
    #[inline]
    pub const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Direction::Cw,
            2 => Direction::Ccw,
            _ => Direction::Stopped,
        }
    }
}
