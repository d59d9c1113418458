//! State shared between the three interrupt handlers.
//!
//! Every field has a single writer (see the table in the module docs of
//! [`crate::axis`]). Requests between handlers are single-slot mailboxes:
//! the writer raises them, the reader takes them with a swap.

use portable_atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use crate::motion::{Direction, PositionCell, PositionState};

use super::home::FlagState;
use super::phase::PhaseTag;

/// Cross-context state of one tilt axis.
///
/// Intended to live in a `static`; all methods take `&self`.
pub struct AxisShared {
    position: PositionCell,
    phase: AtomicU8,
    direction: AtomicU8,
    flag: AtomicU8,
    cadence: AtomicU32,
    sweep_restart: AtomicBool,
    disable: AtomicBool,
    sweep_complete: AtomicBool,
    home_reached: AtomicBool,
    angle_report: AtomicBool,
    stall: AtomicBool,
}

impl AxisShared {
    /// Axis at home, phase `Initialize`, direction `Stopped`, no requests.
    pub const fn new() -> Self {
        Self {
            position: PositionCell::new(),
            phase: AtomicU8::new(PhaseTag::Initialize as u8),
            direction: AtomicU8::new(0),
            flag: AtomicU8::new(0),
            cadence: AtomicU32::new(0),
            sweep_restart: AtomicBool::new(false),
            disable: AtomicBool::new(false),
            sweep_complete: AtomicBool::new(false),
            home_reached: AtomicBool::new(false),
            angle_report: AtomicBool::new(false),
            stall: AtomicBool::new(false),
        }
    }

    /// Consistent position snapshot.
    #[inline]
    pub fn position(&self) -> PositionState {
        self.position.load()
    }

    /// Current tilt angle in radians.
    #[inline]
    pub fn current_position(&self) -> f32 {
        self.position.load().position_rad
    }

    /// Take a pending angle report, if the controller raised one.
    pub fn take_angle_report(&self) -> Option<PositionState> {
        if self.angle_report.swap(false, Ordering::AcqRel) {
            Some(self.position())
        } else {
            None
        }
    }

    /// A stallGuard2 edge has been seen since the last [`take_stall`](Self::take_stall).
    #[inline]
    pub fn stall_latched(&self) -> bool {
        self.stall.load(Ordering::Acquire)
    }

    /// Take and clear the stall latch.
    pub fn take_stall(&self) -> bool {
        self.stall.swap(false, Ordering::AcqRel)
    }

    /// Published controller phase.
    #[inline]
    pub fn phase(&self) -> PhaseTag {
        PhaseTag::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Commanded direction.
    #[inline]
    pub fn direction(&self) -> Direction {
        Direction::from_u8(self.direction.load(Ordering::Acquire))
    }

    /// Last home flag state seen by the home sensor.
    #[inline]
    pub fn flag(&self) -> FlagState {
        FlagState::from_u8(self.flag.load(Ordering::Acquire))
    }

    pub(crate) fn position_cell(&self) -> &PositionCell {
        &self.position
    }

    pub(crate) fn publish_phase(&self, tag: PhaseTag) {
        self.phase.store(tag as u8, Ordering::Release);
    }

    pub(crate) fn command_direction(&self, direction: Direction) {
        self.direction.store(direction.to_u8(), Ordering::Release);
    }

    pub(crate) fn publish_flag(&self, flag: FlagState) {
        self.flag.store(flag.to_u8(), Ordering::Release);
    }

    /// Request a step-timer reload. Zero is reserved for "empty".
    pub(crate) fn post_cadence(&self, reload: u32) {
        self.cadence.store(reload.max(1), Ordering::Release);
    }

    pub(crate) fn take_cadence(&self) -> Option<u32> {
        match self.cadence.swap(0, Ordering::AcqRel) {
            0 => None,
            reload => Some(reload),
        }
    }

    pub(crate) fn request_sweep_restart(&self) {
        self.sweep_restart.store(true, Ordering::Release);
    }

    pub(crate) fn take_sweep_restart(&self) -> bool {
        self.sweep_restart.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn request_disable(&self) {
        self.disable.store(true, Ordering::Release);
    }

    pub(crate) fn take_disable(&self) -> bool {
        self.disable.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn signal_sweep_complete(&self) {
        self.sweep_complete.store(true, Ordering::Release);
    }

    pub(crate) fn take_sweep_complete(&self) -> bool {
        self.sweep_complete.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn signal_home_reached(&self) {
        self.home_reached.store(true, Ordering::Release);
    }

    pub(crate) fn home_reached_pending(&self) -> bool {
        self.home_reached.load(Ordering::Acquire)
    }

    pub(crate) fn take_home_reached(&self) -> bool {
        self.home_reached.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn raise_angle_report(&self) {
        self.angle_report.store(true, Ordering::Release);
    }

    pub(crate) fn latch_stall(&self) {
        self.stall.store(true, Ordering::Release);
    }
}

impl Default for AxisShared {
    fn default() -> Self {
        Self::new()
    }
}
