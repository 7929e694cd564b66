//! GPIO / bus assignments for the haptic trackpad board (ESP32-S3).
//!
//! Single source of truth for the board bring-up in `main.rs`.  Typed
//! `esp-idf-hal` pins there must match the numbers here.

// ---------------------------------------------------------------------------
// Trackpad (SPI2, mode 3)
// ---------------------------------------------------------------------------

pub const TRACKPAD_SCLK_GPIO: i32 = 12;
pub const TRACKPAD_MOSI_GPIO: i32 = 11;
pub const TRACKPAD_MISO_GPIO: i32 = 13;
pub const TRACKPAD_CS_GPIO: i32 = 10;
/// Motion line, active-high; interrupts on the rising edge.
pub const TRACKPAD_IRQ_GPIO: i32 = 9;
/// Sensor power gate, HIGH = powered.
pub const TRACKPAD_SHUTDOWN_GPIO: i32 = 8;

/// SPI clock for the trackpad.
pub const TRACKPAD_SPI_HZ: u32 = 1_000_000;

// ---------------------------------------------------------------------------
// DRV2605 haptic driver (I2C0)
// ---------------------------------------------------------------------------

pub const HAPTIC_SDA_GPIO: i32 = 14;
pub const HAPTIC_SCL_GPIO: i32 = 15;
/// DRV2605 EN pin, HIGH = active.
pub const HAPTIC_ENABLE_GPIO: i32 = 4;

/// I2C clock for the DRV2605 (fast mode).
pub const HAPTIC_I2C_HZ: u32 = 400_000;
