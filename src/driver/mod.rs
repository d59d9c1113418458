//! TMC260 stepper driver.
//!
//! Register model, SPI datagram transport, status decoding and the
//! step/dir control lines.

mod pins;
mod registers;
mod status;
mod tmc260;
pub mod transport;

pub use pins::StepDirInterface;
pub use registers::{
    fields, pack_fields, ChopConf, DrvConf, DrvCtrlDirect, DrvCtrlStepDir, Field, Register,
    RegisterValue, SgcsConf, SmartEn, DATAGRAM_BITS, DATAGRAM_MASK, DEFAULT_STATUS_DRVCONF,
};
pub use status::{StatusFlags, StatusKind, StatusPayload, StatusReading};
pub use tmc260::{RegisterShadow, Tmc260};
pub use transport::{BusPort, SpiPort};
