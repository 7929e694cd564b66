//! Control-line helpers shared by both drivers.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};

use crate::error::BusError;

/// Stand-in type for an optional line that is not wired on this board.
///
/// Drivers take `Option<P>`; pass `None::<NoPin>` when the line is absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

/// Drive an optional line, mapping pin errors into [`BusError::Gpio`].
/// Returns `Ok(false)` when no line is configured.
pub(crate) fn drive<P: OutputPin>(pin: &mut Option<P>, active: bool) -> Result<bool, BusError> {
    let Some(pin) = pin.as_mut() else {
        return Ok(false);
    };
    let res = if active { pin.set_high() } else { pin.set_low() };
    res.map_err(|e| BusError::gpio(&e))?;
    Ok(true)
}
