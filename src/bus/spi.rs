//! Half-duplex single-byte SPI exchange for the trackpad.

use embedded_hal::spi::{Operation, SpiDevice};

use super::CommandBus;
use crate::error::BusError;

/// Wraps an `embedded-hal` [`SpiDevice`]; chip select is owned by the device.
pub struct SpiCommandBus<SPI> {
    spi: SPI,
}

impl<SPI: SpiDevice> SpiCommandBus<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI: SpiDevice> CommandBus for SpiCommandBus<SPI> {
    /// Clocks out `command`, then clocks in one response byte, all under a
    /// single chip-select assertion.
    fn transact(&mut self, command: u8) -> Result<u8, BusError> {
        let mut rx = [0u8; 1];
        self.spi
            .transaction(&mut [Operation::Write(&[command]), Operation::Read(&mut rx)])
            .map_err(|e| BusError::spi(&e))?;
        Ok(rx[0])
    }
}
