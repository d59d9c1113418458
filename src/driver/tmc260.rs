//! TMC260 protocol engine.
//!
//! Owns the SPI port, the chip-select line and the register shadow. The chip
//! cannot read configuration back, so the shadow is the only record of what
//! was written.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::config::{DriverSettings, Microsteps, TransportConfig};
use crate::error::ProtocolError;

use super::registers::{fields, Register, RegisterValue, DATAGRAM_MASK, DEFAULT_STATUS_DRVCONF};
use super::status::{StatusKind, StatusReading};
use super::transport::{exchange, SpiPort};

/// Last value successfully written to each configuration register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterShadow {
    /// DRVCTRL
    pub drvctrl: u32,
    /// CHOPCONF
    pub chopconf: u32,
    /// SMARTEN
    pub smarten: u32,
    /// SGCSCONF
    pub sgcsconf: u32,
    /// DRVCONF
    pub drvconf: u32,
}

impl RegisterShadow {
    /// Shadowed value of `register` (0 if never written).
    pub fn get(&self, register: Register) -> u32 {
        match register {
            Register::DrvCtrl => self.drvctrl,
            Register::ChopConf => self.chopconf,
            Register::SmartEn => self.smarten,
            Register::SgcsConf => self.sgcsconf,
            Register::DrvConf => self.drvconf,
        }
    }

    fn set(&mut self, register: Register, value: u32) {
        let slot = match register {
            Register::DrvCtrl => &mut self.drvctrl,
            Register::ChopConf => &mut self.chopconf,
            Register::SmartEn => &mut self.smarten,
            Register::SgcsConf => &mut self.sgcsconf,
            Register::DrvConf => &mut self.drvconf,
        };
        *slot = value;
    }
}

/// TMC260 stepper driver on an SPI port.
///
/// Generic over:
/// - `P`: byte-level SPI port
/// - `CS`: chip-select pin (active low)
/// - `D`: delay provider for the settle delays
pub struct Tmc260<P, CS, D> {
    port: P,
    cs: CS,
    delay: D,
    transport: TransportConfig,
    shadow: RegisterShadow,
}

impl<P, CS, D> Tmc260<P, CS, D>
where
    P: SpiPort,
    CS: OutputPin,
    D: DelayNs,
{
    /// Create a driver with an empty shadow.
    pub fn new(port: P, cs: CS, delay: D, transport: TransportConfig) -> Self {
        Self {
            port,
            cs,
            delay,
            transport,
            shadow: RegisterShadow::default(),
        }
    }

    /// Write a raw 20-bit datagram to `register`.
    ///
    /// The shadow is updated only after the transfer completed.
    pub fn write_register(&mut self, register: Register, value: u32) -> Result<(), ProtocolError> {
        self.transfer(register, value).map(|_| ())
    }

    /// Validate, pack and write a typed register value.
    ///
    /// Field overflow is reported before any bus traffic.
    pub fn write_fields<R: RegisterValue>(&mut self, value: &R) -> Result<(), ProtocolError> {
        let raw = value.pack()?;
        self.write_register(R::REGISTER, raw)
    }

    /// Read a status reply.
    ///
    /// Replies reflect the RDSEL of the previous write, so DRVCONF is written
    /// twice: once to select `kind`, then again to clock out the reply.
    pub fn read_status(&mut self, kind: StatusKind) -> Result<StatusReading, ProtocolError> {
        let base = match self.shadow.drvconf {
            0 => DEFAULT_STATUS_DRVCONF,
            configured => configured,
        };
        let value = fields::RDSEL.insert(base, kind.rdsel() as u32);

        self.transfer(Register::DrvConf, value)?;
        let reply = self.transfer(Register::DrvConf, value)?;

        Ok(StatusReading::decode(kind, reply))
    }

    /// Program every configuration register.
    ///
    /// Order: DRVCONF, DRVCTRL (step/dir), CHOPCONF, SMARTEN, SGCSCONF.
    pub fn bring_up(
        &mut self,
        settings: &DriverSettings,
        microsteps: Microsteps,
    ) -> Result<(), ProtocolError> {
        self.write_fields(&settings.drvconf)?;
        self.write_fields(&settings.drvctrl(microsteps))?;
        self.write_fields(&settings.chopconf)?;
        self.write_fields(&settings.smarten)?;
        self.write_fields(&settings.sgcsconf)?;

        debug!("TMC260 configured, MRES = {}", microsteps.mres());
        Ok(())
    }

    /// Register shadow.
    #[inline]
    pub fn shadow(&self) -> &RegisterShadow {
        &self.shadow
    }

    /// Release the owned peripherals.
    pub fn release(self) -> (P, CS, D) {
        (self.port, self.cs, self.delay)
    }

    fn transfer(&mut self, register: Register, value: u32) -> Result<u32, ProtocolError> {
        let value = value & DATAGRAM_MASK;
        let reply = exchange(&mut self.port, &mut self.cs, &mut self.delay, &self.transport, value)?;
        self.shadow.set(register, value);
        trace!("TMC260 wrote {=u32:#x}, reply {=u32:#x}", value, reply);
        Ok(reply)
    }
}
