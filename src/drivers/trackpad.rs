//! BlackBerry-style optical trackpad driver (SPI, interrupt-driven).
//!
//! ## Hardware
//!
//! One-byte command / one-byte response over SPI.  The sensor pulls its
//! motion line active whenever it has accumulated a displacement; an
//! optional shutdown line gates its power.
//!
//! ## Execution model
//!
//! The GPIO ISR only calls [`MotionTrigger::fire`].  A worker thread
//! ([`Trackpad::run`] / [`Trackpad::service`]) does the bus I/O:
//!
//! 1. `READ_MOTION`; bit 7 clear means nothing moved, the run ends quietly.
//! 2. `READ_DELTA_X`, `READ_DELTA_Y`, each an 8-bit two's-complement count.
//! 3. swap → invert → scale, in that order.
//! 4. Report `RelX`, `RelY`, `Sync`.
//!
//! A bus failure ends the run after logging; the next edge retries.

use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{debug, error, info};

use crate::bus::CommandBus;
use crate::config::{AxisTransform, TrackpadConfig};
use crate::drivers::gpio;
use crate::drivers::work::{IrqLine, MotionTrigger, MotionWork};
use crate::error::{Error, Result};
use crate::input::{DeviceId, InputEvent, InputKind, InputSink};

/// SPI command bytes.
pub mod cmd {
    pub const READ_MOTION: u8 = 0x02;
    pub const READ_DELTA_X: u8 = 0x03;
    pub const READ_DELTA_Y: u8 = 0x04;
    pub const CONFIG_1: u8 = 0x0A;
    pub const CONFIG_2: u8 = 0x0B;
    pub const POWER_DOWN: u8 = 0x0F;
    pub const POWER_UP: u8 = 0x10;
}

/// Motion-status bit: a displacement is waiting in the delta registers.
pub const MOTION_FLAG: u8 = 0x80;

/// Wait after power-on before the first command.
const STARTUP_DELAY_MS: u32 = 10;

/// Reinterpret a raw delta register as an 8-bit two's-complement count.
pub const fn decode_delta(raw: u8) -> i16 {
    raw as i8 as i16
}

impl AxisTransform {
    /// Apply swap, then per-axis inversion, then per-axis scaling.
    /// Inverted and scaled values saturate at the `i16` range.
    pub fn apply(&self, dx: i16, dy: i16) -> (i16, i16) {
        let (mut x, mut y) = if self.swap_xy { (dy, dx) } else { (dx, dy) };
        if self.invert_x {
            x = x.saturating_neg();
        }
        if self.invert_y {
            y = y.saturating_neg();
        }
        (scale(x, self.scale_x), scale(y, self.scale_y))
    }
}

fn scale(value: i16, factor: u16) -> i16 {
    if factor <= 1 {
        return value;
    }
    let scaled = i32::from(value) * i32::from(factor);
    scaled.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

/// Transformed deltas of one worker run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionReport {
    pub dx: i16,
    pub dy: i16,
}

pub struct Trackpad<B, IRQ, SD, D> {
    bus: B,
    /// Held so the installed ISR stays registered for the driver's lifetime.
    _irq: IRQ,
    shutdown: Option<SD>,
    delay: D,
    config: TrackpadConfig,
    work: Arc<MotionWork>,
    last_x: i16,
    last_y: i16,
}

impl<B, IRQ, SD, D> Trackpad<B, IRQ, SD, D>
where
    B: CommandBus,
    IRQ: IrqLine,
    SD: OutputPin,
    D: DelayNs,
{
    /// Bring the trackpad up and arm its motion interrupt.
    ///
    /// Any failure aborts bring-up and is returned unchanged.
    pub fn new(
        mut bus: B,
        mut irq: IRQ,
        mut shutdown: Option<SD>,
        mut delay: D,
        config: TrackpadConfig,
    ) -> Result<Self> {
        config.validate()?;

        if !bus.is_ready() {
            error!("trackpad: SPI bus not ready");
            return Err(Error::DeviceNotReady("SPI bus"));
        }
        if !irq.is_ready() {
            error!("trackpad: IRQ line not ready");
            return Err(Error::DeviceNotReady("IRQ line"));
        }

        gpio::drive(&mut shutdown, true).map_err(|e| {
            error!("trackpad: failed to configure shutdown line: {}", e);
            Error::from(e)
        })?;

        let work = Arc::new(MotionWork::new());
        irq.enable_edge_interrupt(MotionTrigger::new(work.clone()))
            .map_err(|e| {
                error!("trackpad: failed to configure IRQ: {}", e);
                Error::from(e)
            })?;

        delay.delay_ms(STARTUP_DELAY_MS);

        let mut pad = Self {
            bus,
            _irq: irq,
            shutdown,
            delay,
            config,
            work,
            last_x: 0,
            last_y: 0,
        };
        pad.command(cmd::CONFIG_1, "write config 1")?;
        pad.command(cmd::CONFIG_2, "write config 2")?;
        pad.command(cmd::POWER_UP, "power up")?;

        info!("trackpad[{}]: initialised ({:?})", config.id, config.axes);
        Ok(pad)
    }

    // ── Worker side ───────────────────────────────────────────

    /// One worker run: read status and deltas, transform, report.
    ///
    /// `Ok(None)` when the status register shows no motion.
    pub fn poll_motion(&mut self, sink: &mut impl InputSink) -> Result<Option<MotionReport>> {
        let status = self.command(cmd::READ_MOTION, "read motion status")?;
        if status & MOTION_FLAG == 0 {
            debug!("trackpad: no motion (status=0x{:02x})", status);
            return Ok(None);
        }

        let raw_x = self.command(cmd::READ_DELTA_X, "read delta X")?;
        let raw_y = self.command(cmd::READ_DELTA_Y, "read delta Y")?;
        let (dx, dy) = self
            .config
            .axes
            .apply(decode_delta(raw_x), decode_delta(raw_y));

        self.last_x = self.last_x.wrapping_add(dx);
        self.last_y = self.last_y.wrapping_add(dy);
        debug!("trackpad: dx={} dy={}", dx, dy);

        let device = self.device();
        sink.report(InputEvent::new(device, InputKind::RelX(dx)));
        sink.report(InputEvent::new(device, InputKind::RelY(dy)));
        sink.report(InputEvent::new(device, InputKind::Sync));

        Ok(Some(MotionReport { dx, dy }))
    }

    /// Run the worker once if an interrupt has scheduled it.  Never blocks.
    pub fn process_pending(&mut self, sink: &mut impl InputSink) -> Option<MotionReport> {
        if !self.work.take() {
            return None;
        }
        self.run_once(sink)
    }

    /// Block until an interrupt schedules the worker, then run it once.
    pub fn service(&mut self, sink: &mut impl InputSink) -> Option<MotionReport> {
        futures_lite::future::block_on(self.work.wait());
        self.run_once(sink)
    }

    /// Worker thread body.
    pub fn run(&mut self, mut sink: impl InputSink) -> ! {
        loop {
            self.service(&mut sink);
        }
    }

    /// Errors were already logged by `command`; the run just ends.
    fn run_once(&mut self, sink: &mut impl InputSink) -> Option<MotionReport> {
        self.poll_motion(sink).ok().flatten()
    }

    // ── Power ─────────────────────────────────────────────────

    /// Put the sensor to sleep and release its power line.
    pub fn power_down(&mut self) -> Result<()> {
        self.command(cmd::POWER_DOWN, "power down")?;
        gpio::drive(&mut self.shutdown, false)?;
        info!("trackpad[{}]: powered down", self.config.id);
        Ok(())
    }

    /// Re-power the sensor after [`power_down`](Self::power_down).
    pub fn power_up(&mut self) -> Result<()> {
        if gpio::drive(&mut self.shutdown, true)? {
            self.delay.delay_ms(STARTUP_DELAY_MS);
        }
        self.command(cmd::POWER_UP, "power up")?;
        info!("trackpad[{}]: powered up", self.config.id);
        Ok(())
    }

    // ── Accessors ─────────────────────────────────────────────

    /// ISR handle; clone it into any additional interrupt source.
    pub fn trigger(&self) -> MotionTrigger {
        MotionTrigger::new(self.work.clone())
    }

    pub fn work(&self) -> &MotionWork {
        &self.work
    }

    pub fn device(&self) -> DeviceId {
        DeviceId(self.config.id)
    }

    /// Sum of all reported deltas since init (wrapping).  Bookkeeping only;
    /// emitted events stay relative.
    pub fn position(&self) -> (i16, i16) {
        (self.last_x, self.last_y)
    }

    pub fn config(&self) -> &TrackpadConfig {
        &self.config
    }

    fn command(&mut self, command: u8, what: &str) -> Result<u8> {
        self.bus.transact(command).map_err(|e| {
            error!("trackpad: failed to {}: {}", what, e);
            Error::from(e)
        })
    }
}
