//! SPI datagram transport.
//!
//! A TMC260 datagram is 20 bits clocked MSB first inside three bytes. The chip
//! answers every write with a 20-bit reply selected by the RDSEL field of the
//! previous DRVCONF write.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::config::TransportConfig;
use crate::error::{ProtocolError, TransportWait};

use super::registers::DATAGRAM_MASK;

/// Byte-level SPI peripheral as seen by the datagram engine.
///
/// Mirrors a register-level SPI block: status flags are polled and bytes are
/// moved one at a time.
pub trait SpiPort {
    /// Transmit buffer can accept a byte.
    fn tx_ready(&mut self) -> bool;

    /// A received byte is waiting.
    fn rx_ready(&mut self) -> bool;

    /// A transfer is still shifting.
    fn busy(&mut self) -> bool;

    /// Queue one byte for transmission.
    fn send(&mut self, byte: u8) -> Result<(), ProtocolError>;

    /// Take the byte received during the last transmission.
    fn receive(&mut self) -> Result<u8, ProtocolError>;
}

/// Adapts a blocking [`SpiBus`] to [`SpiPort`].
///
/// Each `send` performs a full-duplex single-byte transfer and parks the
/// received byte until `receive` collects it.
pub struct BusPort<B> {
    bus: B,
    pending: Option<u8>,
}

impl<B: SpiBus<u8>> BusPort<B> {
    /// Wrap a bus.
    pub fn new(bus: B) -> Self {
        Self { bus, pending: None }
    }

    /// Release the wrapped bus.
    pub fn release(self) -> B {
        self.bus
    }
}

impl<B: SpiBus<u8>> SpiPort for BusPort<B> {
    #[inline]
    fn tx_ready(&mut self) -> bool {
        self.pending.is_none()
    }

    #[inline]
    fn rx_ready(&mut self) -> bool {
        self.pending.is_some()
    }

    #[inline]
    fn busy(&mut self) -> bool {
        false
    }

    fn send(&mut self, byte: u8) -> Result<(), ProtocolError> {
        let mut buf = [byte];
        self.bus
            .transfer_in_place(&mut buf)
            .map_err(|_| ProtocolError::Transport)?;
        self.bus.flush().map_err(|_| ProtocolError::Transport)?;
        self.pending = Some(buf[0]);
        Ok(())
    }

    fn receive(&mut self) -> Result<u8, ProtocolError> {
        self.pending.take().ok_or(ProtocolError::Transport)
    }
}

/// Split a 20-bit datagram into the three bytes sent on the wire.
#[inline]
pub const fn encode_datagram(value: u32) -> [u8; 3] {
    let shifted = (value & DATAGRAM_MASK) << 8;
    [(shifted >> 24) as u8, (shifted >> 16) as u8, (shifted >> 8) as u8]
}

/// Reassemble the 20-bit reply from the three received bytes.
#[inline]
pub const fn decode_reply(bytes: [u8; 3]) -> u32 {
    let raw = ((bytes[0] as u32) << 24) | ((bytes[1] as u32) << 16) | ((bytes[2] as u32) << 8);
    raw >> 12
}

/// Poll `ready` up to `limit` times.
fn wait_for<P, F>(port: &mut P, limit: u32, wait: TransportWait, mut ready: F) -> Result<(), ProtocolError>
where
    P: SpiPort,
    F: FnMut(&mut P) -> bool,
{
    for _ in 0..limit {
        if ready(port) {
            return Ok(());
        }
    }
    Err(ProtocolError::Timeout(wait))
}

/// Run one chip-select bracketed datagram exchange and return the reply.
///
/// Sequence: settle, CS low, settle, three bytes, wait idle, 8x settle,
/// CS high, 8x settle. On error CS is still released.
pub fn exchange<P, CS, D>(
    port: &mut P,
    cs: &mut CS,
    delay: &mut D,
    settings: &TransportConfig,
    value: u32,
) -> Result<u32, ProtocolError>
where
    P: SpiPort,
    CS: OutputPin,
    D: DelayNs,
{
    let settle = settings.settle_delay_us;

    delay.delay_us(settle);
    cs.set_low().map_err(|_| ProtocolError::ChipSelect)?;
    delay.delay_us(settle);

    let result = shift_bytes(port, settings.poll_limit, encode_datagram(value));

    if result.is_ok() {
        for _ in 0..8 {
            delay.delay_us(settle);
        }
    }
    let released = cs.set_high().map_err(|_| ProtocolError::ChipSelect);
    let reply = result?;
    released?;

    for _ in 0..8 {
        delay.delay_us(settle);
    }
    Ok(reply)
}

fn shift_bytes<P: SpiPort>(port: &mut P, limit: u32, bytes: [u8; 3]) -> Result<u32, ProtocolError> {
    let mut received = [0u8; 3];
    for (tx, rx) in bytes.iter().zip(received.iter_mut()) {
        wait_for(port, limit, TransportWait::TxReady, |p| p.tx_ready())?;
        port.send(*tx)?;
        wait_for(port, limit, TransportWait::RxReady, |p| p.rx_ready())?;
        *rx = port.receive()?;
    }
    wait_for(port, limit, TransportWait::NotBusy, |p| !p.busy())?;
    Ok(decode_reply(received))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_msb_first() {
        assert_eq!(encode_datagram(0xE0010), [0x0E, 0x00, 0x10]);
        assert_eq!(encode_datagram(0x84044), [0x08, 0x40, 0x44]);
    }

    #[test]
    fn test_encode_drops_bits_above_datagram() {
        assert_eq!(encode_datagram(0xF0_0001), encode_datagram(0x0_0001));
    }

    #[test]
    fn test_decode_reply() {
        // Reply is left-aligned in the 24 clocked bits
        assert_eq!(decode_reply([0xAB, 0xCD, 0xE0]), 0xABCDE);
        assert_eq!(decode_reply([0x00, 0x00, 0x8F]), 0x00008);
    }

    struct StuckPort;

    impl SpiPort for StuckPort {
        fn tx_ready(&mut self) -> bool {
            false
        }
        fn rx_ready(&mut self) -> bool {
            false
        }
        fn busy(&mut self) -> bool {
            true
        }
        fn send(&mut self, _byte: u8) -> Result<(), ProtocolError> {
            Ok(())
        }
        fn receive(&mut self) -> Result<u8, ProtocolError> {
            Ok(0)
        }
    }

    #[test]
    fn test_wait_is_bounded() {
        let mut port = StuckPort;
        assert_eq!(
            shift_bytes(&mut port, 16, [0, 0, 0]),
            Err(ProtocolError::Timeout(TransportWait::TxReady))
        );
    }
}
