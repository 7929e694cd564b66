//! TI DRV2605 haptic driver (I2C).
//!
//! ## States
//!
//! ```text
//!  new() ──▶ Active/Idle ◀──▶ Active/Calibrating
//!               │    ▲
//!   set_enabled │    │ set_enabled(true)
//!      (false)  ▼    │
//!              Standby
//! ```
//!
//! Every operation after construction takes the instance lock for its full
//! duration, calibration included (up to ~1 s of polling).  Playback and
//! calibration require the enabled state and fail with
//! [`Error::NotEnabled`] otherwise, without touching the bus.
//!
//! ## Enable line
//!
//! Optional.  Asserted and given a settle delay before the chip is spoken
//! to; released after the chip is put in standby.

use std::sync::{Mutex, MutexGuard, PoisonError};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use heapless::Vec;
use log::{error, info, warn};

use crate::bus::RegisterBus;
use crate::config::{ActuatorType, HapticConfig, MAX_DRIVE_MV};
use crate::drivers::gpio;
use crate::error::{Error, Result};

/// Register map (subset used by this driver).
pub mod reg {
    pub const STATUS: u8 = 0x00;
    pub const MODE: u8 = 0x01;
    pub const LIBRARY_SELECTION: u8 = 0x03;
    pub const WAVEFORM_SEQ1: u8 = 0x04;
    pub const WAVEFORM_SEQ2: u8 = 0x05;
    pub const WAVEFORM_SEQ8: u8 = 0x0B;
    pub const GO: u8 = 0x0C;
    pub const RATED_VOLTAGE: u8 = 0x16;
    pub const OVERDRIVE_CLAMP: u8 = 0x17;
    pub const AUTOCAL_COMP: u8 = 0x18;
    pub const AUTOCAL_BEMF: u8 = 0x19;
    pub const FEEDBACK_CONTROL: u8 = 0x1A;
}

/// MODE register values.
pub mod mode {
    pub const INTERNAL_TRIGGER: u8 = 0x00;
    pub const AUTO_CALIBRATE: u8 = 0x07;
    pub const STANDBY: u8 = 0x40;
}

/// STATUS register bits.
pub mod status {
    pub const DIAG_RESULT: u8 = 0x08;
    pub const OVER_TEMP: u8 = 0x02;
    pub const OC_DETECT: u8 = 0x01;
}

/// Common waveform ids from the ROM libraries.
pub mod waveform {
    /// Ends a sequence; the chip stops at the first zero slot.
    pub const STOP: u8 = 0;
    pub const CLICK: u8 = 1;
    pub const TICK: u8 = 2;
    pub const DOUBLE_CLICK: u8 = 10;
}

/// LIBRARY_SELECTION values.
pub mod library {
    pub const EMPTY: u8 = 0;
    pub const TS2200_A: u8 = 1;
    pub const TS2200_B: u8 = 2;
    pub const TS2200_C: u8 = 3;
    pub const TS2200_D: u8 = 4;
    pub const TS2200_E: u8 = 5;
    pub const LRA: u8 = 6;
    pub const TS2200_F: u8 = 7;
}

/// Number of waveform sequencer slots.
pub const SEQUENCE_SLOTS: usize = 8;

const GO_BIT: u8 = 0x01;
const FEEDBACK_LRA: u8 = 0x80;
const FEEDBACK_ERM: u8 = 0x00;

const SETTLE_DELAY_MS: u32 = 1;
const CALIBRATION_POLL_MS: u32 = 10;
const CALIBRATION_TIMEOUT_MS: u32 = 1000;

/// Scale a drive voltage onto the 8-bit RATED_VOLTAGE / OVERDRIVE_CLAMP range.
pub fn millivolts_to_register(mv: u16) -> u8 {
    let mv = u32::from(mv.min(MAX_DRIVE_MV));
    (mv * 255 / u32::from(MAX_DRIVE_MV)) as u8
}

fn feedback_control(actuator: ActuatorType) -> u8 {
    match actuator {
        ActuatorType::Lra => FEEDBACK_LRA,
        ActuatorType::Erm => FEEDBACK_ERM,
    }
}

// ───────────────────────────────────────────────────────────────
// Value types
// ───────────────────────────────────────────────────────────────

/// One to eight waveform ids, played back in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveformSequence(Vec<u8, SEQUENCE_SLOTS>);

impl WaveformSequence {
    pub fn new(ids: &[u8]) -> Result<Self> {
        if ids.is_empty() {
            return Err(Error::InvalidArgument("waveform sequence is empty"));
        }
        Vec::from_slice(ids)
            .map(Self)
            .map_err(|()| Error::InvalidArgument("waveform sequence longer than 8"))
    }

    pub fn single(id: u8) -> Self {
        Self(core::iter::once(id).collect())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All eight slot values, unused trailing slots set to [`waveform::STOP`].
    pub fn slots(&self) -> [u8; SEQUENCE_SLOTS] {
        let mut slots = [waveform::STOP; SEQUENCE_SLOTS];
        slots[..self.0.len()].copy_from_slice(&self.0);
        slots
    }
}

impl TryFrom<&[u8]> for WaveformSequence {
    type Error = Error;

    fn try_from(ids: &[u8]) -> Result<Self> {
        Self::new(ids)
    }
}

/// Power-management requests forwarded by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PmAction {
    Suspend,
    Resume,
    TurnOff,
    TurnOn,
}

/// Decoded STATUS register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStatus(pub u8);

impl DeviceStatus {
    pub fn diagnostic_failed(self) -> bool {
        self.0 & status::DIAG_RESULT != 0
    }

    pub fn over_temperature(self) -> bool {
        self.0 & status::OVER_TEMP != 0
    }

    pub fn over_current(self) -> bool {
        self.0 & status::OC_DETECT != 0
    }
}

/// Values the chip derived during a successful auto-calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationResult {
    pub compensation: u8,
    pub back_emf: u8,
    pub feedback: u8,
}

// ───────────────────────────────────────────────────────────────
// Driver
// ───────────────────────────────────────────────────────────────

struct State<B, EN, D> {
    bus: B,
    enable: Option<EN>,
    delay: D,
    enabled: bool,
}

pub struct Drv2605<B, EN, D> {
    state: Mutex<State<B, EN, D>>,
    config: HapticConfig,
}

impl<B, EN, D> Drv2605<B, EN, D>
where
    B: RegisterBus,
    EN: OutputPin,
    D: DelayNs,
{
    /// Probe and configure the chip, optionally auto-calibrating.
    ///
    /// Calibration failure is logged, not returned: the chip is put back in
    /// internal-trigger mode and comes up enabled either way.
    pub fn new(bus: B, enable: Option<EN>, delay: D, config: HapticConfig) -> Result<Self> {
        config.validate()?;

        let mut st = State {
            bus,
            enable,
            delay,
            enabled: false,
        };

        if !st.bus.is_ready() {
            error!("drv2605: I2C bus not ready");
            return Err(Error::DeviceNotReady("I2C bus"));
        }

        let powered = gpio::drive(&mut st.enable, true).map_err(|e| {
            error!("drv2605: failed to configure enable line: {}", e);
            Error::from(e)
        })?;
        if powered {
            st.delay.delay_ms(SETTLE_DELAY_MS);
        }

        let presence = st.read(reg::STATUS).inspect_err(|e| {
            error!("drv2605: failed to read status: {}", e);
        })?;
        info!("drv2605[{}]: status 0x{:02x}", config.id, presence);

        st.write(reg::MODE, mode::INTERNAL_TRIGGER)?;
        st.write(reg::LIBRARY_SELECTION, config.library)?;
        st.write(reg::FEEDBACK_CONTROL, feedback_control(config.actuator))?;
        st.write(
            reg::RATED_VOLTAGE,
            millivolts_to_register(config.rated_voltage_mv),
        )?;
        st.write(
            reg::OVERDRIVE_CLAMP,
            millivolts_to_register(config.overdrive_voltage_mv),
        )?;

        if config.auto_calibration {
            match st.auto_calibrate() {
                Ok(cal) => info!("drv2605[{}]: calibrated {:?}", config.id, cal),
                Err(e) => warn!("drv2605[{}]: auto calibration failed: {}", config.id, e),
            }
            st.write(reg::MODE, mode::INTERNAL_TRIGGER)?;
        }

        st.enabled = true;
        info!("drv2605[{}]: initialised ({:?})", config.id, config.actuator);

        Ok(Self {
            state: Mutex::new(st),
            config,
        })
    }

    // ── Power ─────────────────────────────────────────────────

    /// Switch between standby and active.  Requesting the current state is
    /// a no-op with no bus traffic.
    pub fn set_enabled(&self, on: bool) -> Result<()> {
        let mut st = self.lock();
        if st.set_enabled(on)? {
            info!(
                "drv2605[{}]: {}",
                self.config.id,
                if on { "enabled" } else { "standby" }
            );
        }
        Ok(())
    }

    /// Platform power-management hook.
    pub fn pm_action(&self, action: PmAction) -> Result<()> {
        match action {
            PmAction::Suspend => self.set_enabled(false),
            PmAction::Resume => self.set_enabled(true),
            PmAction::TurnOff | PmAction::TurnOn => Err(Error::Unsupported),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    // ── Playback ──────────────────────────────────────────────

    /// Play one library waveform.  Slot 2 is cleared so a previous
    /// multi-step sequence cannot continue after it.
    pub fn play_waveform(&self, id: u8) -> Result<()> {
        let mut st = self.lock();
        st.require_enabled()?;
        st.write(reg::WAVEFORM_SEQ1, id)?;
        st.write(reg::WAVEFORM_SEQ2, waveform::STOP)?;
        st.write(reg::GO, GO_BIT)
    }

    /// Play up to eight waveforms back to back.
    pub fn play_sequence(&self, ids: &[u8]) -> Result<()> {
        let mut st = self.lock();
        st.require_enabled()?;
        let sequence = WaveformSequence::new(ids)?;
        st.load_and_go(&sequence)
    }

    /// Play an already validated sequence.
    pub fn play(&self, sequence: &WaveformSequence) -> Result<()> {
        let mut st = self.lock();
        st.require_enabled()?;
        st.load_and_go(sequence)
    }

    /// Cancel playback.  Succeeds without bus traffic when disabled.
    pub fn stop(&self) -> Result<()> {
        let mut st = self.lock();
        if !st.enabled {
            return Ok(());
        }
        st.write(reg::GO, 0)
    }

    // ── Diagnostics ───────────────────────────────────────────

    /// Re-run auto-calibration.  Mode is restored to internal trigger
    /// whatever the outcome.
    pub fn calibrate(&self) -> Result<CalibrationResult> {
        let mut st = self.lock();
        st.require_enabled()?;
        let result = st.auto_calibrate();
        let restore = st.write(reg::MODE, mode::INTERNAL_TRIGGER);
        let cal = result?;
        restore?;
        info!("drv2605[{}]: calibrated {:?}", self.config.id, cal);
        Ok(cal)
    }

    pub fn status(&self) -> Result<DeviceStatus> {
        let mut st = self.lock();
        st.require_enabled()?;
        st.read(reg::STATUS).map(DeviceStatus)
    }

    pub fn config(&self) -> &HapticConfig {
        &self.config
    }

    /// Tear down and hand back the bus, enable line and delay.
    pub fn release(self) -> (B, Option<EN>, D) {
        let st = self
            .state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        (st.bus, st.enable, st.delay)
    }

    /// The guarded state is a bool plus owned peripherals; a panic in one
    /// caller cannot leave it half-written, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, State<B, EN, D>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<B, EN, D> State<B, EN, D>
where
    B: RegisterBus,
    EN: OutputPin,
    D: DelayNs,
{
    fn read(&mut self, reg: u8) -> Result<u8> {
        Ok(self.bus.read_register(reg)?)
    }

    fn write(&mut self, reg: u8, value: u8) -> Result<()> {
        Ok(self.bus.write_register(reg, value)?)
    }

    fn require_enabled(&self) -> Result<()> {
        if self.enabled {
            Ok(())
        } else {
            Err(Error::NotEnabled)
        }
    }

    /// Returns whether the state changed.
    fn set_enabled(&mut self, on: bool) -> Result<bool> {
        if on == self.enabled {
            return Ok(false);
        }
        if on {
            if gpio::drive(&mut self.enable, true)? {
                self.delay.delay_ms(SETTLE_DELAY_MS);
            }
            self.write(reg::MODE, mode::INTERNAL_TRIGGER)?;
            self.enabled = true;
        } else {
            let standby = self.write(reg::MODE, mode::STANDBY);
            let line = gpio::drive(&mut self.enable, false);
            standby?;
            self.enabled = false;
            line?;
        }
        Ok(true)
    }

    /// Write all eight slots, then trigger.
    fn load_and_go(&mut self, sequence: &WaveformSequence) -> Result<()> {
        for (slot, id) in (reg::WAVEFORM_SEQ1..=reg::WAVEFORM_SEQ8).zip(sequence.slots()) {
            self.write(slot, id)?;
        }
        self.write(reg::GO, GO_BIT)
    }

    /// Start calibration and busy-poll GO until the chip clears it.
    /// Leaves the chip in auto-calibrate mode; callers restore the mode.
    fn auto_calibrate(&mut self) -> Result<CalibrationResult> {
        self.write(reg::MODE, mode::AUTO_CALIBRATE)?;
        self.write(reg::GO, GO_BIT)?;

        let mut waited_ms = 0;
        loop {
            self.delay.delay_ms(CALIBRATION_POLL_MS);
            waited_ms += CALIBRATION_POLL_MS;
            if self.read(reg::GO)? & GO_BIT == 0 {
                break;
            }
            if waited_ms >= CALIBRATION_TIMEOUT_MS {
                return Err(Error::Timeout);
            }
        }

        let st = DeviceStatus(self.read(reg::STATUS)?);
        if st.diagnostic_failed() {
            return Err(Error::CalibrationFailed);
        }

        Ok(CalibrationResult {
            compensation: self.read(reg::AUTOCAL_COMP)?,
            back_emf: self.read(reg::AUTOCAL_BEMF)?,
            feedback: self.read(reg::FEEDBACK_CONTROL)?,
        })
    }
}
