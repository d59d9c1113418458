//! STEP/DIR/EN control lines.

use embedded_hal::digital::OutputPin;

use crate::error::MotionError;
use crate::motion::Direction;

/// Step/dir interface of the TMC260.
///
/// DEDGE is set at bring-up, so every STEP transition is a step and a pulse is
/// a single toggle. CW drives DIR low, CCW drives DIR high. EN is active low.
pub struct StepDirInterface<STEP, DIR, EN> {
    step: STEP,
    dir: DIR,
    enable: EN,
    step_high: bool,
    direction: Option<Direction>,
    enabled: Option<bool>,
}

impl<STEP, DIR, EN> StepDirInterface<STEP, DIR, EN>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
{
    /// Wrap the control lines. STEP is assumed low.
    pub fn new(step: STEP, dir: DIR, enable: EN) -> Self {
        Self {
            step,
            dir,
            enable,
            step_high: false,
            direction: None,
            enabled: None,
        }
    }

    /// Toggle STEP.
    pub fn step_pulse(&mut self) -> Result<(), MotionError> {
        if self.step_high {
            self.step.set_low().map_err(|_| MotionError::PinError)?;
        } else {
            self.step.set_high().map_err(|_| MotionError::PinError)?;
        }
        self.step_high = !self.step_high;
        Ok(())
    }

    /// Drive DIR for `direction`. Unchanged directions and `Stopped` are not written.
    pub fn set_direction(&mut self, direction: Direction) -> Result<(), MotionError> {
        if direction == Direction::Stopped || self.direction == Some(direction) {
            return Ok(());
        }

        match direction {
            Direction::Cw => self.dir.set_low(),
            _ => self.dir.set_high(),
        }
        .map_err(|_| MotionError::PinError)?;

        self.direction = Some(direction);
        Ok(())
    }

    /// Enable the driver outputs.
    pub fn enable(&mut self) -> Result<(), MotionError> {
        if self.enabled == Some(true) {
            return Ok(());
        }
        self.enable.set_low().map_err(|_| MotionError::PinError)?;
        self.enabled = Some(true);
        Ok(())
    }

    /// Disable the driver outputs.
    pub fn disable(&mut self) -> Result<(), MotionError> {
        if self.enabled == Some(false) {
            return Ok(());
        }
        self.enable.set_high().map_err(|_| MotionError::PinError)?;
        self.enabled = Some(false);
        Ok(())
    }

    /// Direction last written to DIR.
    #[inline]
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Release the pins.
    pub fn release(self) -> (STEP, DIR, EN) {
        (self.step, self.dir, self.enable)
    }
}
