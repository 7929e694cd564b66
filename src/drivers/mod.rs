//! Peripheral drivers and the interrupt hand-off they rely on.

pub mod drv2605;
pub mod gpio;
pub mod trackpad;
pub mod work;
