//! Haptic trackpad driver library.
//!
//! Exposes the trackpad and DRV2605 drivers over `embedded-hal` 1.0 traits
//! so they run unchanged on the ESP32-S3 and under host integration tests.
//! All ESP-IDF-specific wiring lives in the `espidf`-gated binary.

#![deny(unused_must_use)]

pub mod bus;
pub mod config;
pub mod drivers;
pub mod error;
pub mod input;
pub mod pins;

pub use drivers::drv2605::Drv2605;
pub use drivers::trackpad::Trackpad;
pub use error::{BusError, Error, Result};
