//! State-machine timer interrupt handler.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::config::AxisConfig;
use crate::driver::{SpiPort, StatusKind, StatusReading, Tmc260};
use crate::error::MotionError;
use crate::motion::Direction;

use super::home::FlagState;
use super::phase::{FaultCause, MotorPhase};
use super::ports::{DebugIndicators, Indicator, PeriodicTimer, TelemetryReport, TelemetrySink};
use super::shared::AxisShared;

/// Sequences the tilt axis: bring-up, homing, settle, back-and-forth sweeps.
///
/// Ticks at the state-machine rate. Owns the TMC260 and the state timer and
/// drives the step generator only through [`AxisShared`].
pub struct TiltController<'a, P, CS, D, T, S, I> {
    shared: &'a AxisShared,
    driver: Tmc260<P, CS, D>,
    timer: T,
    telemetry: S,
    indicators: I,
    config: AxisConfig,
    default_reload: u32,
    home_reload: u32,
    phase: MotorPhase,
    ticks: u32,
    last_status: Option<StatusReading>,
}

impl<'a, P, CS, D, T, S, I> TiltController<'a, P, CS, D, T, S, I>
where
    P: SpiPort,
    CS: OutputPin,
    D: DelayNs,
    T: PeriodicTimer,
    S: TelemetrySink,
    I: DebugIndicators,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        shared: &'a AxisShared,
        driver: Tmc260<P, CS, D>,
        timer: T,
        telemetry: S,
        indicators: I,
        config: AxisConfig,
        default_reload: u32,
        home_reload: u32,
    ) -> Self {
        Self {
            shared,
            driver,
            timer,
            telemetry,
            indicators,
            config,
            default_reload,
            home_reload,
            phase: MotorPhase::Initialize,
            ticks: 0,
            last_status: None,
        }
    }

    /// State-machine timer interrupt entry point.
    pub fn on_tick(&mut self) {
        self.indicators.toggle(Indicator::Blue);

        self.consume_mailboxes();

        self.ticks = self.ticks.saturating_add(1);
        if self.ticks % self.config.sequence.report_interval_ticks == 0 {
            self.shared.raise_angle_report();
        }

        if self.phase.is_guarded() && !self.config.limits.contains(self.shared.current_position()) {
            warn!("tilt out of bounds: {} rad", self.shared.current_position());
            self.transition(MotorPhase::Home);
        }

        self.run_phase();

        self.timer.clear_interrupt();
    }

    /// Switch to the debug rotation (`TestCW`, then alternating).
    pub fn start_test_rotation(&mut self) {
        self.transition(MotorPhase::TestCw);
    }

    /// Stop the axis in the terminal `Error` phase.
    pub fn fault(&mut self, cause: FaultCause) {
        error!("tilt axis fault: {}", cause);
        self.transition(MotorPhase::Error(cause));
        self.shared.command_direction(Direction::Stopped);
        self.shared.request_disable();
    }

    /// Current phase.
    #[inline]
    pub fn phase(&self) -> MotorPhase {
        self.phase
    }

    /// Ticks since the last transition.
    #[inline]
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Last status read in `TestDelay`.
    #[inline]
    pub fn last_status(&self) -> Option<&StatusReading> {
        self.last_status.as_ref()
    }

    /// The driver.
    #[inline]
    pub fn driver(&self) -> &Tmc260<P, CS, D> {
        &self.driver
    }

    /// Release the owned hardware.
    pub fn release(self) -> (Tmc260<P, CS, D>, T, S) {
        (self.driver, self.timer, self.telemetry)
    }

    fn transition(&mut self, next: MotorPhase) {
        debug!("tilt phase {} -> {}", self.phase.tag().name(), next.tag().name());
        self.phase = next;
        self.ticks = 0;
        self.shared.publish_phase(next.tag());
    }

    fn consume_mailboxes(&mut self) {
        if self.shared.take_home_reached() && self.phase == MotorPhase::Home {
            self.transition(MotorPhase::TestDelay {
                next_sweep: Direction::Cw,
            });
        }

        if self.shared.take_sweep_complete() {
            if let MotorPhase::TiltSweep { direction } = self.phase {
                self.transition(MotorPhase::TiltSweep {
                    direction: direction.reversed(),
                });
            }
        }
    }

    fn run_phase(&mut self) {
        let t = self.ticks;
        let sequence = self.config.sequence;

        match self.phase {
            MotorPhase::Initialize => {
                let settings = self.config.driver;
                match self.driver.bring_up(&settings, self.config.mechanics.microsteps) {
                    Ok(()) => {
                        info!("TMC260 ready, homing");
                        self.transition(MotorPhase::Home);
                    }
                    Err(e) => self.fault(e.into()),
                }
            }
            MotorPhase::Home => {
                if t == 1 {
                    self.shared.post_cadence(self.home_reload);
                    let direction = self.homing_direction();
                    self.shared.command_direction(direction);
                }
                if t > sequence.home_timeout_ticks {
                    self.fault(MotionError::HomeTimeout { ticks: t }.into());
                }
            }
            MotorPhase::TestDelay { next_sweep } => {
                if t == 1 {
                    if let Err(e) = self.report_status() {
                        self.fault(e.into());
                        return;
                    }
                }
                if t > sequence.settle_ticks {
                    self.transition(MotorPhase::TiltSweep {
                        direction: next_sweep,
                    });
                }
            }
            MotorPhase::TiltSweep { direction } => {
                if t == 1 {
                    self.shared.command_direction(direction);
                    self.shared.request_sweep_restart();
                }
                if t > sequence.sweep_timeout_ticks {
                    self.fault(MotionError::SweepTimeout { ticks: t }.into());
                }
            }
            MotorPhase::TestCw | MotorPhase::TestCcw => {
                let (direction, next) = match self.phase {
                    MotorPhase::TestCw => (Direction::Cw, MotorPhase::TestCcw),
                    _ => (Direction::Ccw, MotorPhase::TestCw),
                };
                if t == 1 {
                    self.shared.post_cadence(self.default_reload);
                    self.shared.command_direction(direction);
                }
                if t > sequence.test_phase_ticks {
                    self.shared.request_disable();
                    self.transition(next);
                }
            }
            MotorPhase::Error(_) => {}
        }
    }

    /// Direction for the homing run starting this tick.
    ///
    /// At home the flag decides: uncovered means home lies counter-clockwise.
    /// The sensor pin belongs to [`HomeSensor`](super::home::HomeSensor), which
    /// republishes the level at build time and on every edge. Between edges the
    /// level cannot change, so the published flag is the current sensor
    /// reading.
    fn homing_direction(&self) -> Direction {
        let position = self.shared.position();
        if position.steps_from_home == 0 {
            match self.shared.flag() {
                FlagState::Uncovered => Direction::Ccw,
                FlagState::Covered => Direction::Cw,
            }
        } else if position.position_rad > 0.0 {
            Direction::Ccw
        } else {
            Direction::Cw
        }
    }

    fn report_status(&mut self) -> Result<(), crate::error::ProtocolError> {
        let status = self.driver.read_status(StatusKind::Position)?;

        if status.flags.has_fault() {
            warn!("TMC260 fault flags {=u8:#x}", status.flags.bits());
        }

        self.telemetry.send(&TelemetryReport {
            status,
            position: self.shared.position(),
        });
        self.last_status = Some(status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::axis::phase::PhaseTag;
    use crate::axis::ports::NoIndicators;
    use crate::config::TransportConfig;
    use crate::error::ProtocolError;
    use crate::motion::PositionState;

    /// Port that echoes zeros and never stalls.
    struct IdlePort(Option<u8>);

    impl SpiPort for IdlePort {
        fn tx_ready(&mut self) -> bool {
            self.0.is_none()
        }
        fn rx_ready(&mut self) -> bool {
            self.0.is_some()
        }
        fn busy(&mut self) -> bool {
            false
        }
        fn send(&mut self, _byte: u8) -> Result<(), ProtocolError> {
            self.0 = Some(0);
            Ok(())
        }
        fn receive(&mut self) -> Result<u8, ProtocolError> {
            self.0.take().ok_or(ProtocolError::Transport)
        }
    }

    struct NullPin;

    impl embedded_hal::digital::ErrorType for NullPin {
        type Error = core::convert::Infallible;
    }

    impl OutputPin for NullPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    struct NullDelay;

    impl DelayNs for NullDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    #[derive(Default)]
    struct NullTimer;

    impl PeriodicTimer for NullTimer {
        fn set_reload(&mut self, _reload: u32) {}
        fn start(&mut self) {}
        fn stop(&mut self) {}
        fn clear_interrupt(&mut self) {}
    }

    type TestController<'a> =
        TiltController<'a, IdlePort, NullPin, NullDelay, NullTimer, (), NoIndicators>;

    fn controller(shared: &AxisShared) -> TestController<'_> {
        let config = AxisConfig::default();
        let driver = Tmc260::new(IdlePort(None), NullPin, NullDelay, TransportConfig::default());
        TiltController::new(
            shared,
            driver,
            NullTimer,
            (),
            NoIndicators,
            config,
            83_999,
            209_999,
        )
    }

    #[test]
    fn test_over_rotation_sends_sweep_home() {
        let shared = AxisShared::new();
        let mut ctrl = controller(&shared);
        ctrl.transition(MotorPhase::TiltSweep { direction: Direction::Cw });

        shared.position_cell().store(PositionState {
            steps_from_home: 7333,
            position_rad: 3.6,
        });
        ctrl.on_tick();

        assert_eq!(ctrl.phase(), MotorPhase::Home);
        assert_eq!(shared.phase(), PhaseTag::Home);
        assert_eq!(ctrl.ticks(), 0);
    }

    #[test]
    fn test_under_rotation_sends_delay_home() {
        let shared = AxisShared::new();
        let mut ctrl = controller(&shared);
        ctrl.transition(MotorPhase::TestDelay { next_sweep: Direction::Cw });

        shared.position_cell().store(PositionState {
            steps_from_home: -1100,
            position_rad: -0.54,
        });
        ctrl.on_tick();

        assert_eq!(ctrl.phase(), MotorPhase::Home);
    }

    #[test]
    fn test_guard_ignored_while_homing() {
        let shared = AxisShared::new();
        let mut ctrl = controller(&shared);
        ctrl.transition(MotorPhase::Home);

        shared.position_cell().store(PositionState {
            steps_from_home: 8000,
            position_rad: 3.9,
        });
        ctrl.on_tick();

        assert_eq!(ctrl.phase(), MotorPhase::Home);
        assert_eq!(ctrl.ticks(), 1);
        // Positive angle homes counter-clockwise
        assert_eq!(shared.direction(), Direction::Ccw);
        assert_eq!(shared.take_cadence(), Some(209_999));
    }

    #[test]
    fn test_homing_direction_from_flag() {
        let shared = AxisShared::new();
        let mut ctrl = controller(&shared);
        shared.publish_flag(FlagState::Covered);
        ctrl.transition(MotorPhase::Home);
        ctrl.on_tick();

        assert_eq!(shared.direction(), Direction::Cw);
    }

    #[test]
    fn test_sweep_complete_reverses() {
        let shared = AxisShared::new();
        let mut ctrl = controller(&shared);
        ctrl.transition(MotorPhase::TiltSweep { direction: Direction::Cw });
        ctrl.on_tick();
        assert!(shared.take_sweep_restart());

        shared.signal_sweep_complete();
        ctrl.on_tick();

        assert_eq!(ctrl.phase(), MotorPhase::TiltSweep { direction: Direction::Ccw });
        assert_eq!(shared.direction(), Direction::Ccw);
        assert!(shared.take_sweep_restart());
    }

    #[test]
    fn test_test_rotation_alternates() {
        let shared = AxisShared::new();
        let mut ctrl = controller(&shared);
        ctrl.config.sequence.test_phase_ticks = 3;
        ctrl.start_test_rotation();

        ctrl.on_tick();
        assert_eq!(shared.direction(), Direction::Cw);
        assert_eq!(shared.take_cadence(), Some(83_999));

        for _ in 0..3 {
            ctrl.on_tick();
        }
        assert_eq!(ctrl.phase(), MotorPhase::TestCcw);
        assert!(shared.take_disable());

        ctrl.on_tick();
        assert_eq!(shared.direction(), Direction::Ccw);
    }

    #[test]
    fn test_fault_is_terminal() {
        let shared = AxisShared::new();
        let mut ctrl = controller(&shared);
        ctrl.transition(MotorPhase::TiltSweep { direction: Direction::Cw });
        ctrl.fault(FaultCause::Requested);

        assert_eq!(shared.direction(), Direction::Stopped);
        assert!(shared.take_disable());

        shared.position_cell().store(PositionState {
            steps_from_home: 9000,
            position_rad: 4.4,
        });
        for _ in 0..10 {
            ctrl.on_tick();
        }
        assert_eq!(ctrl.phase(), MotorPhase::Error(FaultCause::Requested));
    }

    #[test]
    fn test_angle_report_cadence() {
        let shared = AxisShared::new();
        let mut ctrl = controller(&shared);
        ctrl.fault(FaultCause::Requested);

        for _ in 0..24 {
            ctrl.on_tick();
        }
        assert_eq!(shared.take_angle_report(), None);
        ctrl.on_tick();
        assert!(shared.take_angle_report().is_some());
    }
}
