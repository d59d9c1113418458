//! stallGuard2 output handler.
//!
//! The TMC260 raises its SG pin when the load exceeds the stallGuard2
//! threshold. The edge is only latched for the application to inspect; the
//! state machine keeps running.

use super::ports::{DebugIndicators, Indicator};
use super::shared::AxisShared;

/// Handles rising edges on the TMC260 SG output.
pub struct StallMonitor<'a, I> {
    shared: &'a AxisShared,
    indicators: I,
    edges: u32,
}

impl<'a, I: DebugIndicators> StallMonitor<'a, I> {
    pub(crate) fn new(shared: &'a AxisShared, indicators: I) -> Self {
        Self {
            shared,
            indicators,
            edges: 0,
        }
    }

    /// SG edge interrupt entry point.
    pub fn on_stall_edge(&mut self) {
        self.edges = self.edges.wrapping_add(1);
        self.shared.latch_stall();
        self.indicators.toggle(Indicator::Red);
        warn!("stallGuard2 edge at step {}", self.shared.position().steps_from_home);
    }

    /// Edges handled so far.
    #[inline]
    pub fn edges(&self) -> u32 {
        self.edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use core::cell::Cell;

    #[derive(Default)]
    struct RedToggles(Cell<u32>);

    impl DebugIndicators for RedToggles {
        fn set(&self, _indicator: Indicator) {}
        fn clear(&self, _indicator: Indicator) {}
        fn toggle(&self, indicator: Indicator) {
            if indicator == Indicator::Red {
                self.0.set(self.0.get() + 1);
            }
        }
    }

    #[test]
    fn test_edge_latches_stall_and_toggles_red() {
        let shared = AxisShared::new();
        let indicators = RedToggles::default();
        let mut monitor = StallMonitor::new(&shared, &indicators);

        monitor.on_stall_edge();
        monitor.on_stall_edge();

        assert_eq!(monitor.edges(), 2);
        assert_eq!(indicators.0.get(), 2);
        assert!(shared.stall_latched());
        assert!(shared.take_stall());
        assert!(!shared.stall_latched());
    }

    #[test]
    fn test_stall_does_not_touch_motion_state() {
        let shared = AxisShared::new();
        let mut monitor = StallMonitor::new(&shared, crate::axis::ports::NoIndicators);

        monitor.on_stall_edge();

        assert_eq!(shared.phase(), crate::axis::phase::PhaseTag::Initialize);
        assert_eq!(shared.direction(), crate::motion::Direction::Stopped);
    }
}
