//! Error types for tilt-stepper.
//!
//! Provides unified error handling across configuration, the driver protocol
//! engine and axis motion.

use core::fmt;

use crate::driver::Register;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all tilt-stepper operations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Driver protocol (register packing or SPI transport) error
    Protocol(ProtocolError),
    /// Axis motion error
    Motion(MotionError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Invalid microstep value (must be power of 2: 1, 2, 4, 8, 16, 32, 64, 128, 256)
    InvalidMicrosteps(u16),
    /// Invalid gear ratio (numerator and denominator must be > 0)
    InvalidGearRatio {
        /// Gear ratio numerator
        num: f32,
        /// Gear ratio denominator
        den: f32,
    },
    /// A frequency or clock setting is zero or yields an unusable timer reload
    InvalidFrequency(u32),
    /// Invalid tilt bounds (min must be < 0 < max)
    InvalidBounds {
        /// Lower bound in radians
        min: f32,
        /// Upper bound in radians
        max: f32,
    },
    /// Sweep profile has no usable entries
    EmptyProfile,
    /// Sweep profile does not fit the profile table
    ProfileTooLong(u32),
    /// Step pulses toggle the STEP line, which needs DEDGE = 1
    SingleEdgeStepping,
    /// A tick count that must be non-zero is zero
    InvalidTickCount(&'static str),
    /// Builder is missing a hardware resource
    MissingHardware(&'static str),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Which transport condition a bounded wait was polling for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportWait {
    /// Transmit buffer empty
    TxReady,
    /// Receive buffer not empty
    RxReady,
    /// Bus no longer busy
    NotBusy,
}

/// Driver protocol errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    /// A packed register field exceeds its declared bit width
    InvalidField {
        /// Register being packed
        register: Register,
        /// Field name as in the datasheet
        field: &'static str,
        /// Offending value
        value: u32,
        /// Declared field width in bits
        width: u8,
    },
    /// A transport wait exceeded its poll budget
    Timeout(TransportWait),
    /// The SPI peripheral reported a fault
    Transport,
    /// Driving the chip-select line failed
    ChipSelect,
}

/// Axis motion errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionError {
    /// Homing did not see the flag in time
    HomeTimeout {
        /// State-machine ticks spent homing
        ticks: u32,
    },
    /// A tilt sweep never reported completion
    SweepTimeout {
        /// State-machine ticks spent in the sweep
        ticks: u32,
    },
    /// STEP/DIR/EN or home pin operation failed
    PinError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Protocol(e) => write!(f, "Driver protocol error: {}", e),
            Error::Motion(e) => write!(f, "Motion error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidMicrosteps(v) => {
                write!(f, "Invalid microsteps: {}. Valid values: 1, 2, 4, 8, 16, 32, 64, 128, 256", v)
            }
            ConfigError::InvalidGearRatio { num, den } => {
                write!(f, "Invalid gear ratio {}:{}. Both terms must be > 0", num, den)
            }
            ConfigError::InvalidFrequency(hz) => write!(f, "Invalid frequency: {} Hz", hz),
            ConfigError::InvalidBounds { min, max } => {
                write!(f, "Invalid tilt bounds: expected min ({}) < 0 < max ({})", min, max)
            }
            ConfigError::EmptyProfile => write!(f, "Sweep profile is empty"),
            ConfigError::ProfileTooLong(len) => {
                write!(f, "Sweep profile of {} steps exceeds the profile table", len)
            }
            ConfigError::SingleEdgeStepping => {
                write!(f, "double_edge must be enabled: step pulses toggle the STEP line")
            }
            ConfigError::InvalidTickCount(name) => write!(f, "{} must be > 0", name),
            ConfigError::MissingHardware(name) => write!(f, "{} is required", name),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for TransportWait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportWait::TxReady => write!(f, "transmit ready"),
            TransportWait::RxReady => write!(f, "receive ready"),
            TransportWait::NotBusy => write!(f, "bus idle"),
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::InvalidField { register, field, value, width } => write!(
                f,
                "{:?}.{} = {} does not fit in {} bit(s)",
                register, field, value, width
            ),
            ProtocolError::Timeout(wait) => write!(f, "Timed out waiting for {}", wait),
            ProtocolError::Transport => write!(f, "SPI transport fault"),
            ProtocolError::ChipSelect => write!(f, "Chip-select pin operation failed"),
        }
    }
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionError::HomeTimeout { ticks } => {
                write!(f, "Home flag not found after {} ticks", ticks)
            }
            MotionError::SweepTimeout { ticks } => {
                write!(f, "Tilt sweep did not complete after {} ticks", ticks)
            }
            MotionError::PinError => write!(f, "GPIO pin operation failed"),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

impl From<MotionError> for Error {
    fn from(e: MotionError) -> Self {
        Error::Motion(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for ProtocolError {}

#[cfg(feature = "std")]
impl std::error::Error for MotionError {}
