//! Static device configuration.
//!
//! Resolved once by the board layer and handed to the driver constructors.
//! Bus handles and pins are not part of these structs; they are passed to
//! the drivers as owned `embedded-hal` values.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Highest supply voltage the DRV2605 voltage registers can express.
pub const MAX_DRIVE_MV: u16 = 5500;

/// Coordinate transform applied to raw trackpad deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisTransform {
    /// Exchange X and Y before any other step.
    pub swap_xy: bool,
    /// Negate X (after swap).
    pub invert_x: bool,
    /// Negate Y (after swap).
    pub invert_y: bool,
    /// Integer multiplier for X (>= 1).
    pub scale_x: u16,
    /// Integer multiplier for Y (>= 1).
    pub scale_y: u16,
}

impl Default for AxisTransform {
    fn default() -> Self {
        Self {
            swap_xy: false,
            invert_x: false,
            invert_y: false,
            scale_x: 1,
            scale_y: 1,
        }
    }
}

/// Trackpad (motion sensor) configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrackpadConfig {
    /// Device instance tag attached to every emitted input event.
    pub id: u8,
    pub axes: AxisTransform,
}

impl TrackpadConfig {
    pub fn validate(&self) -> Result<()> {
        if self.axes.scale_x == 0 {
            return Err(Error::InvalidArgument("scale_x must be >= 1"));
        }
        if self.axes.scale_y == 0 {
            return Err(Error::InvalidArgument("scale_y must be >= 1"));
        }
        Ok(())
    }
}

/// Haptic actuator technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActuatorType {
    /// Eccentric rotating mass.
    Erm,
    /// Linear resonant actuator.
    Lra,
}

/// DRV2605 haptic driver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HapticConfig {
    pub id: u8,
    /// Waveform library id written to LIBRARY_SELECTION.
    pub library: u8,
    pub actuator: ActuatorType,
    /// Rated actuator voltage in millivolts.
    pub rated_voltage_mv: u16,
    /// Overdrive clamp voltage in millivolts.
    pub overdrive_voltage_mv: u16,
    /// Run the auto-calibration routine during init.
    pub auto_calibration: bool,
}

impl Default for HapticConfig {
    fn default() -> Self {
        Self {
            id: 0,
            library: crate::drivers::drv2605::library::LRA,
            actuator: ActuatorType::Lra,
            rated_voltage_mv: 2000,
            overdrive_voltage_mv: 2500,
            auto_calibration: false,
        }
    }
}

impl HapticConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rated_voltage_mv > MAX_DRIVE_MV {
            return Err(Error::InvalidArgument("rated voltage above 5500 mV"));
        }
        if self.overdrive_voltage_mv > MAX_DRIVE_MV {
            return Err(Error::InvalidArgument("overdrive voltage above 5500 mV"));
        }
        Ok(())
    }
}

/// Both peripherals of one board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoardConfig {
    pub trackpad: TrackpadConfig,
    pub haptic: HapticConfig,
}

impl BoardConfig {
    pub fn validate(&self) -> Result<()> {
        self.trackpad.validate()?;
        self.haptic.validate()
    }
}
