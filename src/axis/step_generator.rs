//! Step-timer interrupt handler.

use embedded_hal::digital::OutputPin;

use crate::config::TiltMechanics;
use crate::driver::StepDirInterface;
use crate::error::MotionError;
use crate::motion::{Direction, ProfileCursor, SweepProfile};

use super::phase::PhaseTag;
use super::ports::{DebugIndicators, Indicator, PeriodicTimer};
use super::shared::AxisShared;

/// Emits step pulses at the cadence requested by the controller.
///
/// Owns the STEP/DIR/EN lines and the step timer. The sweep profile is
/// borrowed from storage that outlives the handler.
pub struct StepGenerator<'a, STEP, DIR, EN, T, I> {
    shared: &'a AxisShared,
    pins: StepDirInterface<STEP, DIR, EN>,
    timer: T,
    profile: &'a SweepProfile,
    cursor: ProfileCursor,
    sweep_active: bool,
    mechanics: TiltMechanics,
    indicators: I,
}

impl<'a, STEP, DIR, EN, T, I> StepGenerator<'a, STEP, DIR, EN, T, I>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    T: PeriodicTimer,
    I: DebugIndicators,
{
    pub(crate) fn new(
        shared: &'a AxisShared,
        pins: StepDirInterface<STEP, DIR, EN>,
        timer: T,
        profile: &'a SweepProfile,
        mechanics: TiltMechanics,
        indicators: I,
    ) -> Self {
        Self {
            shared,
            pins,
            timer,
            profile,
            cursor: ProfileCursor::new(),
            sweep_active: false,
            mechanics,
            indicators,
        }
    }

    /// Step-timer interrupt entry point.
    ///
    /// The interrupt is acknowledged even when a pin write fails.
    pub fn on_tick(&mut self) -> Result<(), MotionError> {
        self.indicators.toggle(Indicator::Green);
        let result = self.service();
        self.timer.clear_interrupt();
        result
    }

    fn service(&mut self) -> Result<(), MotionError> {
        if self.shared.take_disable() {
            self.pins.disable()?;
        }

        let direction = self.shared.direction();
        self.pins.set_direction(direction)?;

        if let Some(reload) = self.shared.take_cadence() {
            self.timer.set_reload(reload);
        }

        if self.shared.take_sweep_restart() {
            let reload = self.cursor.restart(self.profile);
            self.timer.set_reload(reload);
            self.sweep_active = true;
            return Ok(());
        }

        match self.shared.phase() {
            PhaseTag::TestCw | PhaseTag::TestCcw => {
                self.sweep_active = false;
                self.step(direction)?;
            }
            PhaseTag::Home => {
                self.sweep_active = false;
                if !self.shared.home_reached_pending() {
                    self.step(direction)?;
                }
            }
            PhaseTag::TiltSweep => {
                if !self.sweep_active {
                    return Ok(());
                }
                match self.cursor.advance(self.profile) {
                    Some(reload) => {
                        self.step(direction)?;
                        self.timer.set_reload(reload);
                    }
                    None => {
                        self.sweep_active = false;
                        self.shared.signal_sweep_complete();
                        trace!("sweep finished at entry {}", self.cursor.index());
                    }
                }
            }
            _ => self.sweep_active = false,
        }

        Ok(())
    }

    fn step(&mut self, direction: Direction) -> Result<(), MotionError> {
        if direction == Direction::Stopped {
            return Ok(());
        }
        self.pins.enable()?;
        self.pins.step_pulse()?;
        self.shared.position_cell().advance(direction, &self.mechanics);
        Ok(())
    }

    /// Sweep profile in use.
    pub fn profile(&self) -> &'a SweepProfile {
        self.profile
    }

    /// Profile entry the sweep is at.
    pub fn cursor(&self) -> usize {
        self.cursor.index()
    }

    /// Release the owned hardware.
    pub fn release(self) -> (StepDirInterface<STEP, DIR, EN>, T) {
        (self.pins, self.timer)
    }
}
