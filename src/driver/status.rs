//! Decoding of TMC260 reply datagrams.

use serde::Deserialize;

/// Status payload selected through DRVCONF.RDSEL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// Microstep counter (RDSEL = 0)
    Position,
    /// stallGuard2 load value (RDSEL = 1)
    StallGuard,
    /// stallGuard2 upper bits and coolStep current (RDSEL = 2)
    Current,
}

impl StatusKind {
    /// RDSEL field value for this kind.
    #[inline]
    pub const fn rdsel(self) -> u8 {
        match self {
            StatusKind::Position => 0,
            StatusKind::StallGuard => 1,
            StatusKind::Current => 2,
        }
    }
}

/// The eight status flags present in every reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusFlags {
    /// Standstill
    pub stst: bool,
    /// Open load, phase B
    pub olb: bool,
    /// Open load, phase A
    pub ola: bool,
    /// Short to ground, phase B
    pub s2gb: bool,
    /// Short to ground, phase A
    pub s2ga: bool,
    /// Overtemperature pre-warning
    pub otpw: bool,
    /// Overtemperature shutdown
    pub ot: bool,
    /// stallGuard2 threshold reached
    pub sg: bool,
}

impl StatusFlags {
    /// Decode from the low byte of a reply.
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            sg: bits & (1 << 0) != 0,
            ot: bits & (1 << 1) != 0,
            otpw: bits & (1 << 2) != 0,
            s2ga: bits & (1 << 3) != 0,
            s2gb: bits & (1 << 4) != 0,
            ola: bits & (1 << 5) != 0,
            olb: bits & (1 << 6) != 0,
            stst: bits & (1 << 7) != 0,
        }
    }

    /// Encode back into the reply byte layout.
    pub const fn bits(&self) -> u8 {
        (self.sg as u8)
            | (self.ot as u8) << 1
            | (self.otpw as u8) << 2
            | (self.s2ga as u8) << 3
            | (self.s2gb as u8) << 4
            | (self.ola as u8) << 5
            | (self.olb as u8) << 6
            | (self.stst as u8) << 7
    }

    /// Any thermal, short or open-load condition is flagged.
    pub const fn has_fault(&self) -> bool {
        self.ot || self.otpw || self.s2ga || self.s2gb || self.ola || self.olb
    }
}

/// Kind-specific part of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusPayload {
    /// Position in the microstep table (0..=1023)
    Position {
        /// MSTEP value
        microstep: u16,
    },
    /// Full 10-bit stallGuard2 value
    StallGuard {
        /// SG value
        stall_guard: u16,
    },
    /// Upper stallGuard2 bits with the coolStep current
    Current {
        /// SG bits 9..5
        stall_guard: u16,
        /// Actual current scaling (SE)
        current: u16,
    },
}

/// One decoded reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReading {
    /// Payload kind that was requested
    pub kind: StatusKind,
    /// Status flags
    pub flags: StatusFlags,
    /// Kind-specific value
    pub payload: StatusPayload,
    /// Raw 20-bit reply
    pub raw: u32,
}

impl StatusReading {
    /// Decode a 20-bit reply received while `kind` was selected.
    pub fn decode(kind: StatusKind, raw: u32) -> Self {
        let high10 = ((raw >> 10) & 0x3FF) as u16;
        let payload = match kind {
            StatusKind::Position => StatusPayload::Position { microstep: high10 },
            StatusKind::StallGuard => StatusPayload::StallGuard { stall_guard: high10 },
            StatusKind::Current => StatusPayload::Current {
                stall_guard: ((raw >> 15) & 0x1F) as u16,
                current: ((raw >> 10) & 0x1F) as u16,
            },
        };

        Self {
            kind,
            flags: StatusFlags::from_bits((raw & 0xFF) as u8),
            payload,
            raw,
        }
    }

    /// Microstep position if this is a position reading.
    pub fn microstep(&self) -> Option<u16> {
        match self.payload {
            StatusPayload::Position { microstep } => Some(microstep),
            _ => None,
        }
    }
}
