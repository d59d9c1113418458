//! Unit types for physical quantities.
//!
//! Keeps radians, step rates and microstep divisors apart at compile time.

use serde::Deserialize;

use crate::error::ConfigError;

/// Tilt angle in radians.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(transparent)]
pub struct Radians(pub f32);

impl Radians {
    /// Half a revolution.
    pub const HALF_TURN: Self = Self(core::f32::consts::PI);
}

/// Step rate in steps per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(transparent)]
pub struct Hertz(pub u32);

/// Microstep divisor (1, 2, 4, 8, 16, 32, 64, 128, 256).
///
/// Validated at construction to be a power of 2 within the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Microsteps(u16);

impl Microsteps {
    /// Full step (no microstepping).
    pub const FULL: Self = Self(1);
    /// Sixteenth step.
    pub const SIXTEENTH: Self = Self(16);
    /// Sixty-fourth step.
    pub const SIXTY_FOURTH: Self = Self(64);
    /// 256th step (maximum resolution).
    pub const TWO_FIFTY_SIXTH: Self = Self(256);

    /// Valid microstep values.
    const VALID_VALUES: [u16; 9] = [1, 2, 4, 8, 16, 32, 64, 128, 256];

    /// Create a new Microsteps value with validation.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidMicrosteps` if the value is not a valid power of 2.
    pub fn new(value: u16) -> Result<Self, ConfigError> {
        if Self::VALID_VALUES.contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConfigError::InvalidMicrosteps(value))
        }
    }

    /// Get the raw divisor value.
    #[inline]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// DRVCTRL.MRES encoding: 256 maps to 0, full step maps to 8.
    #[inline]
    pub const fn mres(self) -> u8 {
        8 - self.0.trailing_zeros() as u8
    }
}

impl Default for Microsteps {
    fn default() -> Self {
        Self::SIXTY_FOURTH
    }
}

impl TryFrom<u16> for Microsteps {
    type Error = ConfigError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for Microsteps {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use core::fmt::Write;
        let value = u16::deserialize(deserializer)?;
        Microsteps::new(value).map_err(|e| {
            let mut buf = heapless::String::<128>::new();
            let _ = write!(buf, "{}", e);
            serde::de::Error::custom(buf.as_str())
        })
    }
}
