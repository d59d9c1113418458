//! Absolute tilt position tracking.
//!
//! The step count and the derived angle live in one 64-bit word so that every
//! reader sees a matching pair, even when a home edge interrupts a step.

use portable_atomic::{AtomicU64, Ordering};

use crate::config::TiltMechanics;

use super::Direction;

/// Position of the tilt axis relative to the home flag.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PositionState {
    /// Signed microsteps from home.
    pub steps_from_home: i32,

    /// Tilt angle derived from `steps_from_home`.
    pub position_rad: f32,
}

impl PositionState {
    /// The home reference.
    pub const HOME: Self = Self {
        steps_from_home: 0,
        position_rad: 0.0,
    };

    /// Position at `steps` from home, with the angle recomputed.
    #[inline]
    pub fn at_steps(steps: i32, mechanics: &TiltMechanics) -> Self {
        Self {
            steps_from_home: steps,
            position_rad: mechanics.steps_to_radians(steps),
        }
    }

    /// Position after one step in `direction`. `Stopped` leaves it unchanged.
    #[inline]
    pub fn advanced(self, direction: Direction, mechanics: &TiltMechanics) -> Self {
        match direction {
            Direction::Stopped => self,
            _ => Self::at_steps(self.steps_from_home.saturating_add(direction.sign()), mechanics),
        }
    }

    #[inline]
    fn pack(self) -> u64 {
        ((self.steps_from_home as u32 as u64) << 32) | self.position_rad.to_bits() as u64
    }

    #[inline]
    fn unpack(word: u64) -> Self {
        Self {
            steps_from_home: (word >> 32) as u32 as i32,
            position_rad: f32::from_bits(word as u32),
        }
    }
}

/// Lock-free cell holding a [`PositionState`].
///
/// Written by the step generator (one step at a time) and the home handler
/// (absolute reset); read from every context.
pub struct PositionCell {
    word: AtomicU64,
}

impl PositionCell {
    /// Cell at the home reference.
    pub const fn new() -> Self {
        Self {
            word: AtomicU64::new(0),
        }
    }

    /// Consistent snapshot.
    #[inline]
    pub fn load(&self) -> PositionState {
        PositionState::unpack(self.word.load(Ordering::Acquire))
    }

    /// Overwrite with an absolute position.
    #[inline]
    pub fn store(&self, state: PositionState) {
        self.word.store(state.pack(), Ordering::Release);
    }

    /// Apply one step and return the new position.
    pub fn advance(&self, direction: Direction, mechanics: &TiltMechanics) -> PositionState {
        let mut current = self.word.load(Ordering::Acquire);
        loop {
            let next = PositionState::unpack(current).advanced(direction, mechanics);
            match self.word.compare_exchange_weak(
                current,
                next.pack(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for PositionCell {
    fn default() -> Self {
        Self::new()
    }
}
