//! Bus transports: the synchronous request/response seam under both drivers.
//!
//! ```text
//!   Trackpad ──▶ CommandBus  ──▶ SpiCommandBus<SpiDevice>
//!   Drv2605  ──▶ RegisterBus ──▶ I2cRegisterBus<I2c>
//! ```
//!
//! Transports own no policy: every failure is surfaced once as a
//! [`BusError`] carrying the HAL's error kind, and nothing is retried.
//! Tests substitute recording mocks at this boundary.

pub mod i2c;
pub mod spi;

pub use i2c::I2cRegisterBus;
pub use spi::SpiCommandBus;

use crate::error::BusError;

/// One command byte out, one response byte in.
pub trait CommandBus {
    /// `false` if the bus cannot be used (checked once at init).
    fn is_ready(&mut self) -> bool {
        true
    }

    fn transact(&mut self, command: u8) -> Result<u8, BusError>;
}

/// Addressed 8-bit register access.
pub trait RegisterBus {
    /// `false` if the bus cannot be used (checked once at init).
    fn is_ready(&mut self) -> bool {
        true
    }

    fn read_register(&mut self, reg: u8) -> Result<u8, BusError>;

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), BusError>;
}

impl<T: CommandBus + ?Sized> CommandBus for &mut T {
    fn is_ready(&mut self) -> bool {
        (**self).is_ready()
    }

    fn transact(&mut self, command: u8) -> Result<u8, BusError> {
        (**self).transact(command)
    }
}

impl<T: RegisterBus + ?Sized> RegisterBus for &mut T {
    fn is_ready(&mut self) -> bool {
        (**self).is_ready()
    }

    fn read_register(&mut self, reg: u8) -> Result<u8, BusError> {
        (**self).read_register(reg)
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), BusError> {
        (**self).write_register(reg, value)
    }
}
