//! Unified error types for the trackpad and haptic drivers.
//!
//! A single `Error` enum that both drivers return, with a nested
//! [`BusError`] carrying the transport's `embedded-hal` error kind
//! unchanged.  All variants are `Copy` so they can be logged and passed
//! back across the worker boundary without allocation.

use core::fmt;

use embedded_hal::{digital, i2c, spi};

// ---------------------------------------------------------------------------
// Top-level driver error
// ---------------------------------------------------------------------------

/// Every fallible driver operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A bus or control line was not available at init.
    DeviceNotReady(&'static str),
    /// A transport-level read or write failed.
    Bus(BusError),
    /// Calibration polling exceeded its bound.
    Timeout,
    /// The diagnostic bit was set after calibration.
    CalibrationFailed,
    /// Playback was requested on a disabled actuator.
    NotEnabled,
    /// An argument or configuration value is out of range.
    InvalidArgument(&'static str),
    /// Unrecognised power-management action.
    Unsupported,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceNotReady(what) => write!(f, "device not ready: {what}"),
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Timeout => write!(f, "calibration timed out"),
            Self::CalibrationFailed => write!(f, "calibration failed"),
            Self::NotEnabled => write!(f, "device not enabled"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Unsupported => write!(f, "unsupported action"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

/// Transport failure, tagged with the bus it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    Spi(spi::ErrorKind),
    I2c(i2c::ErrorKind),
    Gpio(digital::ErrorKind),
}

impl BusError {
    pub fn spi(e: &impl spi::Error) -> Self {
        Self::Spi(e.kind())
    }

    pub fn i2c(e: &impl i2c::Error) -> Self {
        Self::I2c(e.kind())
    }

    pub fn gpio(e: &impl digital::Error) -> Self {
        Self::Gpio(e.kind())
    }
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spi(kind) => write!(f, "SPI {kind}"),
            Self::I2c(kind) => write!(f, "I2C {kind}"),
            Self::Gpio(kind) => write!(f, "GPIO {kind}"),
        }
    }
}

impl core::error::Error for BusError {}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
