//! Hardware fakes shared by the integration tests.
//!
//! Every fake hands out a cloneable handle so tests can inspect it after it has
//! been moved into a handler.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use tilt_stepper::driver::{fields, Register};
use tilt_stepper::error::ProtocolError;
use tilt_stepper::{PeriodicTimer, TelemetryReport, TelemetrySink};

// =============================================================================
// TMC260
// =============================================================================

/// Simulated chip contents.
#[derive(Debug, Default)]
pub struct ChipState {
    /// Every datagram received, in order.
    pub datagrams: Vec<u32>,
    /// RDSEL latched by the last DRVCONF write.
    pub rdsel: u32,
    /// Status flag byte returned in every reply.
    pub flags: u8,
    /// Microstep counter (10 bits).
    pub microstep: u16,
    /// stallGuard2 value (10 bits).
    pub stall_guard: u16,
    /// coolStep current scale (5 bits).
    pub current: u16,
    /// Refuse to accept bytes.
    pub stalled: bool,
    rx: [u8; 3],
    tx: [u8; 3],
    index: usize,
    pending: Option<u8>,
}

impl ChipState {
    fn reply(&self) -> u32 {
        let flags = self.flags as u32;
        match self.rdsel {
            0 => ((self.microstep as u32 & 0x3FF) << 10) | flags,
            1 => ((self.stall_guard as u32 & 0x3FF) << 10) | flags,
            _ => {
                let sg_high = (self.stall_guard as u32 >> 5) & 0x1F;
                (sg_high << 15) | ((self.current as u32 & 0x1F) << 10) | flags
            }
        }
    }

    /// Datagrams addressed to `register`.
    pub fn writes_to(&self, register: Register) -> Vec<u32> {
        self.datagrams
            .iter()
            .copied()
            .filter(|&d| Register::from_datagram(d) == register)
            .collect()
    }
}

/// A TMC260 behind a byte-level SPI port.
///
/// Replies follow the RDSEL of the previous DRVCONF write, like the chip.
#[derive(Clone, Default)]
pub struct FakeTmc260 {
    pub state: Rc<RefCell<ChipState>>,
}

impl FakeTmc260 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn datagrams(&self) -> Vec<u32> {
        self.state.borrow().datagrams.clone()
    }
}

impl tilt_stepper::SpiPort for FakeTmc260 {
    fn tx_ready(&mut self) -> bool {
        let state = self.state.borrow();
        !state.stalled && state.pending.is_none()
    }

    fn rx_ready(&mut self) -> bool {
        self.state.borrow().pending.is_some()
    }

    fn busy(&mut self) -> bool {
        false
    }

    fn send(&mut self, byte: u8) -> Result<(), ProtocolError> {
        let mut state = self.state.borrow_mut();
        let index = state.index;

        if index == 0 {
            // Reply is left-aligned in the 24 clocked bits
            let word = state.reply() << 4;
            state.tx = [(word >> 16) as u8, (word >> 8) as u8, word as u8];
        }

        state.rx[index] = byte;
        state.pending = Some(state.tx[index]);
        state.index += 1;

        if state.index == 3 {
            state.index = 0;
            let datagram =
                ((state.rx[0] as u32) << 16) | ((state.rx[1] as u32) << 8) | state.rx[2] as u32;
            state.datagrams.push(datagram);
            if Register::from_datagram(datagram) == Register::DrvConf {
                state.rdsel = fields::RDSEL.extract(datagram);
            }
        }

        Ok(())
    }

    fn receive(&mut self) -> Result<u8, ProtocolError> {
        self.state
            .borrow_mut()
            .pending
            .take()
            .ok_or(ProtocolError::Transport)
    }
}

// =============================================================================
// GPIO
// =============================================================================

/// Output pin recording its level and every write.
#[derive(Clone, Default)]
pub struct FakeOutput {
    pub high: Rc<Cell<bool>>,
    pub writes: Rc<Cell<u32>>,
}

impl FakeOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_high(&self) -> bool {
        self.high.get()
    }
}

impl ErrorType for FakeOutput {
    type Error = Infallible;
}

impl OutputPin for FakeOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high.set(false);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high.set(true);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

/// Input pin driven by the test.
#[derive(Clone, Default)]
pub struct FakeInput {
    pub high: Rc<Cell<bool>>,
}

impl FakeInput {
    pub fn new(high: bool) -> Self {
        Self {
            high: Rc::new(Cell::new(high)),
        }
    }

    pub fn set(&self, high: bool) {
        self.high.set(high);
    }
}

impl ErrorType for FakeInput {
    type Error = Infallible;
}

impl InputPin for FakeInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.high.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.high.get())
    }
}

pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

// =============================================================================
// Timers and telemetry
// =============================================================================

#[derive(Debug, Default)]
pub struct TimerLog {
    pub reloads: Vec<u32>,
    pub running: bool,
    pub acks: u32,
}

#[derive(Clone, Default)]
pub struct FakeTimer {
    pub log: Rc<RefCell<TimerLog>>,
}

impl FakeTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_reload(&self) -> Option<u32> {
        self.log.borrow().reloads.last().copied()
    }
}

impl PeriodicTimer for FakeTimer {
    fn set_reload(&mut self, reload: u32) {
        self.log.borrow_mut().reloads.push(reload);
    }

    fn start(&mut self) {
        self.log.borrow_mut().running = true;
    }

    fn stop(&mut self) {
        self.log.borrow_mut().running = false;
    }

    fn clear_interrupt(&mut self) {
        self.log.borrow_mut().acks += 1;
    }
}

#[derive(Clone, Default)]
pub struct RecordingSink {
    pub reports: Rc<RefCell<Vec<TelemetryReport>>>,
}

impl TelemetrySink for RecordingSink {
    fn send(&mut self, report: &TelemetryReport) {
        self.reports.borrow_mut().push(*report);
    }
}
