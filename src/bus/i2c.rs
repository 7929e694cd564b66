//! Byte-wide register access over I2C for the DRV2605.

use embedded_hal::i2c::I2c;

use super::RegisterBus;
use crate::error::BusError;

/// Fixed 7-bit address of the DRV2605.
pub const DRV2605_ADDRESS: u8 = 0x5A;

/// Wraps an `embedded-hal` [`I2c`] bus and a device address.
pub struct I2cRegisterBus<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> I2cRegisterBus<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> RegisterBus for I2cRegisterBus<I2C> {
    fn read_register(&mut self, reg: u8) -> Result<u8, BusError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(|e| BusError::i2c(&e))?;
        Ok(buf[0])
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), BusError> {
        self.i2c
            .write(self.address, &[reg, value])
            .map_err(|e| BusError::i2c(&e))
    }
}
