//! Home flag edge handler.
//!
//! The flag covers the sensor over half the tilt range. An edge seen while
//! moving into the covered half is the home reference; any other edge only
//! tells us we are near the far end, so the position is parked at a half turn
//! until homing finds the real crossing.

use embedded_hal::digital::InputPin;

use crate::config::{PinLevel, Radians, TiltMechanics};
use crate::error::MotionError;
use crate::motion::{Direction, PositionState};

use super::phase::PhaseTag;
use super::ports::{DebugIndicators, Indicator};
use super::shared::AxisShared;

/// Home flag sensor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlagState {
    /// Sensor clear
    Uncovered,
    /// Flag in the sensor
    Covered,
}

impl FlagState {
    /// Map a pin level through the configured covered level.
    #[inline]
    pub fn from_level(is_high: bool, covered_level: PinLevel) -> Self {
        let covered = match covered_level {
            PinLevel::High => is_high,
            PinLevel::Low => !is_high,
        };
        if covered {
            FlagState::Covered
        } else {
            FlagState::Uncovered
        }
    }

    pub(crate) const fn to_u8(self) -> u8 {
        match self {
            FlagState::Uncovered => 0,
            FlagState::Covered => 1,
        }
    }

    pub(crate) const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => FlagState::Covered,
            _ => FlagState::Uncovered,
        }
    }
}

/// How an edge was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgeKind {
    /// Axis is exactly at home
    Crossing,
    /// Axis is near the far end of travel
    Provisional,
}

/// Interpret a flag edge given the direction of travel.
#[inline]
pub fn classify_edge(direction: Direction, flag: FlagState) -> EdgeKind {
    match (direction, flag) {
        (Direction::Cw, FlagState::Covered) | (Direction::Ccw, FlagState::Uncovered) => {
            EdgeKind::Crossing
        }
        _ => EdgeKind::Provisional,
    }
}

/// Handles home sensor edges. Owns the sensor input.
pub struct HomeSensor<'a, PIN, I> {
    shared: &'a AxisShared,
    pin: PIN,
    covered_level: PinLevel,
    mechanics: TiltMechanics,
    indicators: I,
}

impl<'a, PIN, I> HomeSensor<'a, PIN, I>
where
    PIN: InputPin,
    I: DebugIndicators,
{
    pub(crate) fn new(
        shared: &'a AxisShared,
        pin: PIN,
        covered_level: PinLevel,
        mechanics: TiltMechanics,
        indicators: I,
    ) -> Self {
        Self {
            shared,
            pin,
            covered_level,
            mechanics,
            indicators,
        }
    }

    /// Sample the sensor and publish the result.
    pub fn sample(&mut self) -> Result<FlagState, MotionError> {
        let is_high = self.pin.is_high().map_err(|_| MotionError::PinError)?;
        let flag = FlagState::from_level(is_high, self.covered_level);
        self.shared.publish_flag(flag);
        Ok(flag)
    }

    /// Sensor edge interrupt entry point.
    pub fn on_edge(&mut self) -> Result<EdgeKind, MotionError> {
        let flag = self.sample()?;
        let direction = self.shared.direction();
        let kind = classify_edge(direction, flag);

        let indicator = match direction {
            Direction::Cw => Indicator::Red,
            _ => Indicator::Orange,
        };

        let position = self.shared.position_cell();
        match kind {
            EdgeKind::Crossing => {
                position.store(PositionState::HOME);
                self.indicators.set(indicator);
            }
            EdgeKind::Provisional => {
                let steps = self.mechanics.radians_to_steps(Radians::HALF_TURN);
                position.store(PositionState::at_steps(steps, &self.mechanics));
                self.indicators.clear(indicator);
            }
        }

        if position.load().steps_from_home == 0 && self.shared.phase() == PhaseTag::Home {
            self.shared.signal_home_reached();
            debug!("home reached");
        }

        Ok(kind)
    }

    /// Release the sensor pin.
    pub fn release(self) -> PIN {
        self.pin
    }
}
