//! TMC260 register model.
//!
//! Every configuration register is a 20-bit datagram whose top bits select the
//! register. Fields are described by a shift/width table so that packing and
//! unpacking share one source of truth.

use serde::Deserialize;

use crate::error::ProtocolError;

/// Width of a TMC260 datagram in bits.
pub const DATAGRAM_BITS: u32 = 20;

/// Mask covering the 20 datagram bits.
pub const DATAGRAM_MASK: u32 = (1 << DATAGRAM_BITS) - 1;

/// DRVCONF value used for status reads before DRVCONF was ever configured
/// (SLPH = SLPL = 3, everything else zero).
pub const DEFAULT_STATUS_DRVCONF: u32 = 0xEF000;

/// Write-only configuration registers of the TMC260.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// Driver control (step/dir or direct phase current mode)
    DrvCtrl,
    /// Chopper configuration
    ChopConf,
    /// coolStep control
    SmartEn,
    /// stallGuard2 and current scale
    SgcsConf,
    /// Driver configuration, including RDSEL
    DrvConf,
}

impl Register {
    /// All registers in bring-up order.
    pub const ALL: [Register; 5] = [
        Register::DrvConf,
        Register::DrvCtrl,
        Register::ChopConf,
        Register::SmartEn,
        Register::SgcsConf,
    ];

    /// Address bits of the register, already in datagram position.
    #[inline]
    pub const fn base(self) -> u32 {
        match self {
            Register::DrvCtrl => 0x00000,
            Register::ChopConf => 0x80000,
            Register::SmartEn => 0xA0000,
            Register::SgcsConf => 0xC0000,
            Register::DrvConf => 0xE0000,
        }
    }

    /// Decode which register a datagram addresses.
    ///
    /// DRVCTRL only decodes bit 19; the other registers use bits 19..17.
    pub fn from_datagram(raw: u32) -> Self {
        let raw = raw & DATAGRAM_MASK;
        if raw & 0x80000 == 0 {
            return Register::DrvCtrl;
        }
        match (raw >> 17) & 0b111 {
            0b100 => Register::ChopConf,
            0b101 => Register::SmartEn,
            0b110 => Register::SgcsConf,
            _ => Register::DrvConf,
        }
    }

    /// Datasheet name.
    pub const fn name(self) -> &'static str {
        match self {
            Register::DrvCtrl => "DRVCTRL",
            Register::ChopConf => "CHOPCONF",
            Register::SmartEn => "SMARTEN",
            Register::SgcsConf => "SGCSCONF",
            Register::DrvConf => "DRVCONF",
        }
    }
}

/// A bit field inside a datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Datasheet name.
    pub name: &'static str,
    /// Position of the least significant bit.
    pub shift: u8,
    /// Width in bits.
    pub width: u8,
}

impl Field {
    /// Describe a field.
    pub const fn new(name: &'static str, shift: u8, width: u8) -> Self {
        Self { name, shift, width }
    }

    /// Largest value the field can hold.
    #[inline]
    pub const fn max(self) -> u32 {
        (1 << self.width) - 1
    }

    /// Field mask in datagram position.
    #[inline]
    pub const fn mask(self) -> u32 {
        self.max() << self.shift
    }

    /// Read the field out of a raw datagram.
    #[inline]
    pub const fn extract(self, raw: u32) -> u32 {
        (raw & self.mask()) >> self.shift
    }

    /// Replace the field in `raw`. Out-of-range bits of `value` are dropped.
    #[inline]
    pub const fn insert(self, raw: u32, value: u32) -> u32 {
        (raw & !self.mask()) | ((value << self.shift) & self.mask())
    }

    /// Check `value` against the field width.
    pub fn check(self, register: Register, value: u32) -> Result<u32, ProtocolError> {
        if value > self.max() {
            return Err(ProtocolError::InvalidField {
                register,
                field: self.name,
                value,
                width: self.width,
            });
        }
        Ok(value)
    }
}

/// Shift/width table for every configuration field.
pub mod fields {
    use super::Field;

    // DRVCTRL, step/dir mode (SDOFF = 0)
    pub const INTPOL: Field = Field::new("INTPOL", 9, 1);
    pub const DEDGE: Field = Field::new("DEDGE", 8, 1);
    pub const MRES: Field = Field::new("MRES", 0, 4);

    // DRVCTRL, direct phase mode (SDOFF = 1)
    pub const PHA: Field = Field::new("PHA", 17, 1);
    pub const CA: Field = Field::new("CA", 9, 8);
    pub const PHB: Field = Field::new("PHB", 8, 1);
    pub const CB: Field = Field::new("CB", 0, 8);

    // CHOPCONF
    pub const TBL: Field = Field::new("TBL", 15, 2);
    pub const CHM: Field = Field::new("CHM", 14, 1);
    pub const RNDTF: Field = Field::new("RNDTF", 13, 1);
    pub const HDEC: Field = Field::new("HDEC", 11, 2);
    pub const HEND: Field = Field::new("HEND", 7, 4);
    pub const HSTRT: Field = Field::new("HSTRT", 4, 3);
    pub const TOFF: Field = Field::new("TOFF", 0, 4);

    // SMARTEN
    pub const SEIMIN: Field = Field::new("SEIMIN", 15, 1);
    pub const SEDN: Field = Field::new("SEDN", 13, 2);
    pub const SEMAX: Field = Field::new("SEMAX", 8, 4);
    pub const SEUP: Field = Field::new("SEUP", 5, 2);
    pub const SEMIN: Field = Field::new("SEMIN", 0, 4);

    // SGCSCONF
    pub const SFILT: Field = Field::new("SFILT", 16, 1);
    pub const SGT: Field = Field::new("SGT", 8, 7);
    pub const CS: Field = Field::new("CS", 0, 5);

    // DRVCONF
    pub const TST: Field = Field::new("TST", 16, 1);
    pub const SLPH: Field = Field::new("SLPH", 14, 2);
    pub const SLPL: Field = Field::new("SLPL", 12, 2);
    pub const DISS2G: Field = Field::new("DISS2G", 10, 1);
    pub const TS2G: Field = Field::new("TS2G", 8, 2);
    pub const SDOFF: Field = Field::new("SDOFF", 7, 1);
    pub const VSENSE: Field = Field::new("VSENSE", 6, 1);
    pub const RDSEL: Field = Field::new("RDSEL", 4, 2);
}

/// Pack `values` onto the register base, rejecting any value wider than its
/// field before touching the result.
pub fn pack_fields(register: Register, values: &[(Field, u32)]) -> Result<u32, ProtocolError> {
    let mut raw = register.base();
    for &(field, value) in values {
        raw = field.insert(raw, field.check(register, value)?);
    }
    Ok(raw)
}

/// A typed configuration register value.
pub trait RegisterValue: Sized {
    /// Register this value is written to.
    const REGISTER: Register;

    /// Validate and pack into a 20-bit datagram.
    fn pack(&self) -> Result<u32, ProtocolError>;

    /// Recover field values from a datagram.
    fn unpack(raw: u32) -> Self;
}

/// DRVCTRL in step/dir mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DrvCtrlStepDir {
    /// Interpolate each step to 256 microsteps.
    pub intpol: u8,
    /// Step on both edges of STEP.
    pub dedge: u8,
    /// Microstep resolution (0 = 256, 8 = full step).
    pub mres: u8,
}

impl Default for DrvCtrlStepDir {
    fn default() -> Self {
        Self { intpol: 0, dedge: 1, mres: 2 }
    }
}

impl RegisterValue for DrvCtrlStepDir {
    const REGISTER: Register = Register::DrvCtrl;

    fn pack(&self) -> Result<u32, ProtocolError> {
        pack_fields(
            Self::REGISTER,
            &[
                (fields::INTPOL, self.intpol as u32),
                (fields::DEDGE, self.dedge as u32),
                (fields::MRES, self.mres as u32),
            ],
        )
    }

    fn unpack(raw: u32) -> Self {
        Self {
            intpol: fields::INTPOL.extract(raw) as u8,
            dedge: fields::DEDGE.extract(raw) as u8,
            mres: fields::MRES.extract(raw) as u8,
        }
    }
}

/// DRVCTRL in direct phase-current mode (SDOFF = 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct DrvCtrlDirect {
    /// Phase A current polarity.
    pub pha_dir: u8,
    /// Phase A current magnitude.
    pub pha_cur: u8,
    /// Phase B current polarity.
    pub phb_dir: u8,
    /// Phase B current magnitude.
    pub phb_cur: u8,
}

impl RegisterValue for DrvCtrlDirect {
    const REGISTER: Register = Register::DrvCtrl;

    fn pack(&self) -> Result<u32, ProtocolError> {
        pack_fields(
            Self::REGISTER,
            &[
                (fields::PHA, self.pha_dir as u32),
                (fields::CA, self.pha_cur as u32),
                (fields::PHB, self.phb_dir as u32),
                (fields::CB, self.phb_cur as u32),
            ],
        )
    }

    fn unpack(raw: u32) -> Self {
        Self {
            pha_dir: fields::PHA.extract(raw) as u8,
            pha_cur: fields::CA.extract(raw) as u8,
            phb_dir: fields::PHB.extract(raw) as u8,
            phb_cur: fields::CB.extract(raw) as u8,
        }
    }
}

/// CHOPCONF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChopConf {
    /// Blanking time.
    pub tbl: u8,
    /// Chopper mode: 1 = constant toff, 0 = spreadCycle.
    pub chm: u8,
    /// Random toff time.
    pub rndtf: u8,
    /// Hysteresis decrement interval or fast decay mode.
    pub hdec: u8,
    /// Hysteresis end value or sine wave offset.
    pub hend: u8,
    /// Hysteresis start value or fast decay time.
    pub hstrt: u8,
    /// Slow decay duration.
    pub toff: u8,
}

impl Default for ChopConf {
    fn default() -> Self {
        Self { tbl: 0, chm: 1, rndtf: 0, hdec: 0, hend: 0, hstrt: 4, toff: 4 }
    }
}

impl RegisterValue for ChopConf {
    const REGISTER: Register = Register::ChopConf;

    fn pack(&self) -> Result<u32, ProtocolError> {
        pack_fields(
            Self::REGISTER,
            &[
                (fields::TBL, self.tbl as u32),
                (fields::CHM, self.chm as u32),
                (fields::RNDTF, self.rndtf as u32),
                (fields::HDEC, self.hdec as u32),
                (fields::HEND, self.hend as u32),
                (fields::HSTRT, self.hstrt as u32),
                (fields::TOFF, self.toff as u32),
            ],
        )
    }

    fn unpack(raw: u32) -> Self {
        Self {
            tbl: fields::TBL.extract(raw) as u8,
            chm: fields::CHM.extract(raw) as u8,
            rndtf: fields::RNDTF.extract(raw) as u8,
            hdec: fields::HDEC.extract(raw) as u8,
            hend: fields::HEND.extract(raw) as u8,
            hstrt: fields::HSTRT.extract(raw) as u8,
            toff: fields::TOFF.extract(raw) as u8,
        }
    }
}

/// SMARTEN (coolStep).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SmartEn {
    /// Minimum coolStep current.
    pub seimin: u8,
    /// Current decrement speed.
    pub sedn: u8,
    /// Upper coolStep threshold offset.
    pub semax: u8,
    /// Current increment size.
    pub seup: u8,
    /// Lower coolStep threshold (0 disables coolStep).
    pub semin: u8,
}

impl Default for SmartEn {
    fn default() -> Self {
        Self { seimin: 0, sedn: 0, semax: 2, seup: 0, semin: 0 }
    }
}

impl RegisterValue for SmartEn {
    const REGISTER: Register = Register::SmartEn;

    fn pack(&self) -> Result<u32, ProtocolError> {
        pack_fields(
            Self::REGISTER,
            &[
                (fields::SEIMIN, self.seimin as u32),
                (fields::SEDN, self.sedn as u32),
                (fields::SEMAX, self.semax as u32),
                (fields::SEUP, self.seup as u32),
                (fields::SEMIN, self.semin as u32),
            ],
        )
    }

    fn unpack(raw: u32) -> Self {
        Self {
            seimin: fields::SEIMIN.extract(raw) as u8,
            sedn: fields::SEDN.extract(raw) as u8,
            semax: fields::SEMAX.extract(raw) as u8,
            seup: fields::SEUP.extract(raw) as u8,
            semin: fields::SEMIN.extract(raw) as u8,
        }
    }
}

/// SGCSCONF (stallGuard2 and current scale).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SgcsConf {
    /// stallGuard2 filter: 0 = none, 1 = four full steps.
    pub sfilt: u8,
    /// stallGuard2 threshold (7-bit two's complement).
    pub sgt: u8,
    /// Current scale, 1/32 .. 32/32.
    pub cs: u8,
}

impl Default for SgcsConf {
    fn default() -> Self {
        Self { sfilt: 1, sgt: 0x3F, cs: 5 }
    }
}

impl RegisterValue for SgcsConf {
    const REGISTER: Register = Register::SgcsConf;

    fn pack(&self) -> Result<u32, ProtocolError> {
        pack_fields(
            Self::REGISTER,
            &[
                (fields::SFILT, self.sfilt as u32),
                (fields::SGT, self.sgt as u32),
                (fields::CS, self.cs as u32),
            ],
        )
    }

    fn unpack(raw: u32) -> Self {
        Self {
            sfilt: fields::SFILT.extract(raw) as u8,
            sgt: fields::SGT.extract(raw) as u8,
            cs: fields::CS.extract(raw) as u8,
        }
    }
}

/// DRVCONF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct DrvConf {
    /// Reserved test mode, must be 0 in normal operation.
    pub tst: u8,
    /// High-side slope control.
    pub slph: u8,
    /// Low-side slope control.
    pub slpl: u8,
    /// 1 disables short-to-ground protection.
    pub diss2g: u8,
    /// Short-to-ground detection timer.
    pub ts2g: u8,
    /// 1 disables the step/dir interface.
    pub sdoff: u8,
    /// Sense resistor full-scale voltage.
    pub vsense: u8,
    /// Status payload selected for the next reply.
    pub rdsel: u8,
}

impl RegisterValue for DrvConf {
    const REGISTER: Register = Register::DrvConf;

    fn pack(&self) -> Result<u32, ProtocolError> {
        pack_fields(
            Self::REGISTER,
            &[
                (fields::TST, self.tst as u32),
                (fields::SLPH, self.slph as u32),
                (fields::SLPL, self.slpl as u32),
                (fields::DISS2G, self.diss2g as u32),
                (fields::TS2G, self.ts2g as u32),
                (fields::SDOFF, self.sdoff as u32),
                (fields::VSENSE, self.vsense as u32),
                (fields::RDSEL, self.rdsel as u32),
            ],
        )
    }

    fn unpack(raw: u32) -> Self {
        Self {
            tst: fields::TST.extract(raw) as u8,
            slph: fields::SLPH.extract(raw) as u8,
            slpl: fields::SLPL.extract(raw) as u8,
            diss2g: fields::DISS2G.extract(raw) as u8,
            ts2g: fields::TS2G.extract(raw) as u8,
            sdoff: fields::SDOFF.extract(raw) as u8,
            vsense: fields::VSENSE.extract(raw) as u8,
            rdsel: fields::RDSEL.extract(raw) as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bring_up_values() {
        assert_eq!(DrvConf::default().pack().unwrap(), 0xE0000);
        assert_eq!(DrvCtrlStepDir::default().pack().unwrap(), 0x00102);
        assert_eq!(ChopConf::default().pack().unwrap(), 0x84044);
        assert_eq!(SmartEn::default().pack().unwrap(), 0xA0200);
        assert_eq!(SgcsConf::default().pack().unwrap(), 0xD3F05);
    }

    #[test]
    fn test_invalid_field_rejected() {
        let value = DrvCtrlStepDir { intpol: 2, dedge: 1, mres: 2 };
        assert_eq!(
            value.pack(),
            Err(ProtocolError::InvalidField {
                register: Register::DrvCtrl,
                field: "INTPOL",
                value: 2,
                width: 1,
            })
        );
    }

    #[test]
    fn test_register_decoding() {
        for register in Register::ALL {
            assert_eq!(Register::from_datagram(register.base() | 0x1), register);
        }
        // Direct-phase DRVCTRL sets bit 17 but is still DRVCTRL
        assert_eq!(Register::from_datagram(0x20000), Register::DrvCtrl);
    }

    #[test]
    fn test_default_status_drvconf() {
        let conf = DrvConf::unpack(DEFAULT_STATUS_DRVCONF);
        assert_eq!(conf.slph, 3);
        assert_eq!(conf.slpl, 3);
        assert_eq!(conf.rdsel, 0);
        assert_eq!(conf.pack().unwrap(), DEFAULT_STATUS_DRVCONF);
    }
}
