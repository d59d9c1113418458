//! Controller phases.

use crate::error::{Error, MotionError, ProtocolError};
use crate::motion::Direction;

/// Why the controller stopped in [`MotorPhase::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultCause {
    /// Driver transfer failed
    Protocol(ProtocolError),
    /// Homing or a sweep overran its deadline
    Motion(MotionError),
    /// Raised from outside the controller
    Requested,
}

impl From<ProtocolError> for FaultCause {
    fn from(e: ProtocolError) -> Self {
        FaultCause::Protocol(e)
    }
}

impl From<MotionError> for FaultCause {
    fn from(e: MotionError) -> Self {
        FaultCause::Motion(e)
    }
}

impl FaultCause {
    /// Library error equivalent, if the fault came from one.
    pub fn error(&self) -> Option<Error> {
        match *self {
            FaultCause::Protocol(e) => Some(e.into()),
            FaultCause::Motion(e) => Some(e.into()),
            FaultCause::Requested => None,
        }
    }
}

/// Phase of the tilt state machine, with the data local to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorPhase {
    /// Driver bring-up pending
    Initialize,
    /// Seeking the home flag
    Home,
    /// Pause before the next sweep
    TestDelay {
        /// Direction of the sweep that follows
        next_sweep: Direction,
    },
    /// Stepping through the sweep profile
    TiltSweep {
        /// Direction of the sweep in progress
        direction: Direction,
    },
    /// Debug rotation, clockwise
    TestCw,
    /// Debug rotation, counter-clockwise
    TestCcw,
    /// Terminal fault
    Error(FaultCause),
}

impl MotorPhase {
    /// Data-free tag published to the other handlers.
    pub const fn tag(&self) -> PhaseTag {
        match self {
            MotorPhase::Initialize => PhaseTag::Initialize,
            MotorPhase::Home => PhaseTag::Home,
            MotorPhase::TestDelay { .. } => PhaseTag::TestDelay,
            MotorPhase::TiltSweep { .. } => PhaseTag::TiltSweep,
            MotorPhase::TestCw => PhaseTag::TestCw,
            MotorPhase::TestCcw => PhaseTag::TestCcw,
            MotorPhase::Error(_) => PhaseTag::Error,
        }
    }

    /// Over-rotation guard is evaluated in this phase.
    pub const fn is_guarded(&self) -> bool {
        !matches!(
            self,
            MotorPhase::Initialize | MotorPhase::Home | MotorPhase::Error(_)
        )
    }
}

/// [`MotorPhase`] without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PhaseTag {
    /// Driver bring-up pending
    Initialize = 0,
    /// Seeking the home flag
    Home = 1,
    /// Pause before the next sweep
    TestDelay = 2,
    /// Stepping through the sweep profile
    TiltSweep = 3,
    /// Debug rotation, clockwise
    TestCw = 4,
    /// Debug rotation, counter-clockwise
    TestCcw = 5,
    /// Terminal fault
    Error = 6,
}

impl PhaseTag {
    /// Decode from an atomic. Unknown values read as `Error`.
    pub const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => PhaseTag::Initialize,
            1 => PhaseTag::Home,
            2 => PhaseTag::TestDelay,
            3 => PhaseTag::TiltSweep,
            4 => PhaseTag::TestCw,
            5 => PhaseTag::TestCcw,
            _ => PhaseTag::Error,
        }
    }

    /// Phase name.
    pub const fn name(self) -> &'static str {
        match self {
            PhaseTag::Initialize => "Initialize",
            PhaseTag::Home => "Home",
            PhaseTag::TestDelay => "TestDelay",
            PhaseTag::TiltSweep => "TiltSweep",
            PhaseTag::TestCw => "TestCW",
            PhaseTag::TestCcw => "TestCCW",
            PhaseTag::Error => "Error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_roundtrip() {
        for raw in 0..=6u8 {
            assert_eq!(PhaseTag::from_u8(raw) as u8, raw);
        }
        assert_eq!(PhaseTag::from_u8(42), PhaseTag::Error);
    }

    #[test]
    fn test_guarded_phases() {
        assert!(!MotorPhase::Initialize.is_guarded());
        assert!(!MotorPhase::Home.is_guarded());
        assert!(!MotorPhase::Error(FaultCause::Requested).is_guarded());
        assert!(MotorPhase::TiltSweep { direction: Direction::Cw }.is_guarded());
        assert!(MotorPhase::TestDelay { next_sweep: Direction::Cw }.is_guarded());
        assert!(MotorPhase::TestCcw.is_guarded());
    }

    #[test]
    fn test_fault_cause_error() {
        let cause = FaultCause::from(MotionError::HomeTimeout { ticks: 10 });
        assert_eq!(
            cause.error(),
            Some(Error::Motion(MotionError::HomeTimeout { ticks: 10 }))
        );
        assert_eq!(FaultCause::Requested.error(), None);
    }
}
