//! Board-side collaborators of the axis handlers.

use crate::driver::StatusReading;
use crate::motion::PositionState;

/// Auto-reloading hardware timer driving one interrupt.
pub trait PeriodicTimer {
    /// Set the auto-reload value used from the next update on.
    fn set_reload(&mut self, reload: u32);

    /// Start counting.
    fn start(&mut self);

    /// Stop counting.
    fn stop(&mut self);

    /// Acknowledge the update interrupt.
    fn clear_interrupt(&mut self);
}

/// Driver status snapshot sent to the host.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryReport {
    /// Decoded driver reply
    pub status: StatusReading,
    /// Axis position when the status was read
    pub position: PositionState,
}

/// Fire-and-forget telemetry output.
pub trait TelemetrySink {
    /// Queue a report. Must not block.
    fn send(&mut self, report: &TelemetryReport);
}

impl TelemetrySink for () {
    #[inline]
    fn send(&mut self, _report: &TelemetryReport) {}
}

/// Debug LEDs on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Indicator {
    /// Toggled on every step-timer tick
    Green,
    /// Toggled on every state-machine tick
    Blue,
    /// Home edge while moving clockwise, and stallGuard2 edges
    Red,
    /// Home edge while moving counter-clockwise
    Orange,
}

/// Indicator outputs, callable from any handler.
pub trait DebugIndicators {
    /// Turn on.
    fn set(&self, indicator: Indicator);

    /// Turn off.
    fn clear(&self, indicator: Indicator);

    /// Invert.
    fn toggle(&self, indicator: Indicator);
}

/// Indicators that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIndicators;

impl DebugIndicators for NoIndicators {
    #[inline]
    fn set(&self, _indicator: Indicator) {}

    #[inline]
    fn clear(&self, _indicator: Indicator) {}

    #[inline]
    fn toggle(&self, _indicator: Indicator) {}
}

impl<T: DebugIndicators + ?Sized> DebugIndicators for &T {
    #[inline]
    fn set(&self, indicator: Indicator) {
        (**self).set(indicator)
    }

    #[inline]
    fn clear(&self, indicator: Indicator) {
        (**self).clear(indicator)
    }

    #[inline]
    fn toggle(&self, indicator: Indicator) {
        (**self).toggle(indicator)
    }
}
