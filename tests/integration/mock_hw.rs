//! Mock transports and control lines for integration tests.
//!
//! Every mock is a cheap `Clone` handle over shared state, so a test can
//! hand one copy to a driver and keep another to inspect the traffic.

use std::collections::{HashMap, HashSet, VecDeque};
use std::convert::Infallible;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal::i2c::{ErrorKind as I2cErrorKind, NoAcknowledgeSource};
use embedded_hal::spi::ErrorKind as SpiErrorKind;

use haptic_trackpad::bus::{CommandBus, RegisterBus};
use haptic_trackpad::drivers::drv2605::{mode, reg};
use haptic_trackpad::drivers::work::{IrqLine, MotionTrigger};
use haptic_trackpad::error::BusError;
use haptic_trackpad::input::{InputEvent, InputKind, InputSink};

pub const SPI_FAULT: BusError = BusError::Spi(SpiErrorKind::Overrun);
pub const I2C_FAULT: BusError = BusError::I2c(I2cErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));

// ── MockSpi (CommandBus) ──────────────────────────────────────

#[derive(Default)]
struct SpiState {
    ready: bool,
    /// Scripted responses; an empty script answers `0x00`.
    script: VecDeque<Result<u8, BusError>>,
    commands: Vec<u8>,
}

#[derive(Clone)]
pub struct MockSpi {
    state: Arc<Mutex<SpiState>>,
}

#[allow(dead_code)]
impl MockSpi {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SpiState {
                ready: true,
                ..SpiState::default()
            })),
        }
    }

    pub fn not_ready() -> Self {
        let spi = Self::new();
        spi.state.lock().unwrap().ready = false;
        spi
    }

    pub fn respond(&self, bytes: &[u8]) {
        let mut st = self.state.lock().unwrap();
        st.script.extend(bytes.iter().copied().map(Ok));
    }

    pub fn fail_next(&self) {
        self.state.lock().unwrap().script.push_back(Err(SPI_FAULT));
    }

    /// Every command byte sent so far.
    pub fn commands(&self) -> Vec<u8> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn clear(&self) {
        self.state.lock().unwrap().commands.clear();
    }
}

impl CommandBus for MockSpi {
    fn is_ready(&mut self) -> bool {
        self.state.lock().unwrap().ready
    }

    fn transact(&mut self, command: u8) -> Result<u8, BusError> {
        let mut st = self.state.lock().unwrap();
        st.commands.push(command);
        st.script.pop_front().unwrap_or(Ok(0x00))
    }
}

// ── MockRegs (RegisterBus) ────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegAccess {
    Read(u8),
    Write(u8, u8),
}

#[derive(Default)]
struct RegState {
    ready: bool,
    regs: HashMap<u8, u8>,
    log: Vec<RegAccess>,
    fail_reads: HashSet<u8>,
    fail_writes: HashSet<u8>,
    /// GO reads that still return busy after calibration is started.
    /// `None` means calibration never completes.
    calibration_busy_reads: Option<u32>,
    busy_remaining: Option<u32>,
}

/// DRV2605 register file.
#[derive(Clone)]
pub struct MockRegs {
    state: Arc<Mutex<RegState>>,
}

#[allow(dead_code)]
impl MockRegs {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RegState {
                ready: true,
                calibration_busy_reads: Some(0),
                busy_remaining: Some(0),
                ..RegState::default()
            })),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.state.lock().unwrap().ready = ready;
    }

    pub fn preset(&self, reg: u8, value: u8) {
        self.state.lock().unwrap().regs.insert(reg, value);
    }

    pub fn fail_read(&self, reg: u8) {
        self.state.lock().unwrap().fail_reads.insert(reg);
    }

    pub fn fail_write(&self, reg: u8) {
        self.state.lock().unwrap().fail_writes.insert(reg);
    }

    /// GO stays set for `reads` polls once calibration starts.
    pub fn calibration_completes_after(&self, reads: u32) {
        self.state.lock().unwrap().calibration_busy_reads = Some(reads);
    }

    pub fn calibration_never_completes(&self) {
        self.state.lock().unwrap().calibration_busy_reads = None;
    }

    pub fn log(&self) -> Vec<RegAccess> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.log()
            .into_iter()
            .filter_map(|a| match a {
                RegAccess::Write(r, v) => Some((r, v)),
                RegAccess::Read(_) => None,
            })
            .collect()
    }

    pub fn reads_of(&self, reg: u8) -> usize {
        self.log()
            .iter()
            .filter(|a| **a == RegAccess::Read(reg))
            .count()
    }

    pub fn value(&self, reg: u8) -> u8 {
        self.state.lock().unwrap().regs.get(&reg).copied().unwrap_or(0)
    }

    pub fn clear(&self) {
        self.state.lock().unwrap().log.clear();
    }
}

impl RegisterBus for MockRegs {
    fn is_ready(&mut self) -> bool {
        self.state.lock().unwrap().ready
    }

    fn read_register(&mut self, r: u8) -> Result<u8, BusError> {
        let mut st = self.state.lock().unwrap();
        st.log.push(RegAccess::Read(r));
        if st.fail_reads.contains(&r) {
            return Err(I2C_FAULT);
        }
        if r == reg::GO {
            match st.busy_remaining {
                None => return Ok(0x01),
                Some(0) => {}
                Some(n) => {
                    st.busy_remaining = Some(n - 1);
                    return Ok(0x01);
                }
            }
        }
        Ok(st.regs.get(&r).copied().unwrap_or(0))
    }

    fn write_register(&mut self, r: u8, value: u8) -> Result<(), BusError> {
        let mut st = self.state.lock().unwrap();
        st.log.push(RegAccess::Write(r, value));
        if st.fail_writes.contains(&r) {
            return Err(I2C_FAULT);
        }
        let calibrating = st.regs.get(&reg::MODE) == Some(&mode::AUTO_CALIBRATE);
        if r == reg::GO && value == 0x01 && calibrating {
            // The chip clears GO itself when calibration finishes.
            st.busy_remaining = st.calibration_busy_reads;
            st.regs.insert(r, 0);
        } else {
            st.regs.insert(r, value);
        }
        Ok(())
    }
}

// ── MockPin ───────────────────────────────────────────────────

/// Output line recording every level it was driven to.
#[derive(Clone, Default)]
pub struct MockPin {
    levels: Arc<Mutex<Vec<bool>>>,
}

#[allow(dead_code)]
impl MockPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn levels(&self) -> Vec<bool> {
        self.levels.lock().unwrap().clone()
    }

    pub fn is_high(&self) -> bool {
        self.levels.lock().unwrap().last().copied().unwrap_or(false)
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.levels.lock().unwrap().push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.levels.lock().unwrap().push(true);
        Ok(())
    }
}

// ── MockDelay ─────────────────────────────────────────────────

struct Park {
    parked: Sender<()>,
    release: Receiver<()>,
}

/// Sums requested delays instead of sleeping.  [`park_next`](Self::park_next)
/// can hold the caller inside its next `delay_ms`.
#[derive(Clone, Default)]
pub struct MockDelay {
    total_us: Arc<AtomicU32>,
    park: Arc<Mutex<Option<Park>>>,
}

#[allow(dead_code)]
impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_ms(&self) -> u32 {
        self.total_us.load(Ordering::Relaxed) / 1000
    }

    /// The next `delay_ms` caller reports on the first channel, then
    /// blocks until the second one is sent to.
    pub fn park_next(&self) -> (Receiver<()>, Sender<()>) {
        let (parked_tx, parked_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        *self.park.lock().unwrap() = Some(Park {
            parked: parked_tx,
            release: release_rx,
        });
        (parked_rx, release_tx)
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_us.fetch_add(ns / 1000, Ordering::Relaxed);
    }

    fn delay_us(&mut self, us: u32) {
        self.total_us.fetch_add(us, Ordering::Relaxed);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_us.fetch_add(ms * 1000, Ordering::Relaxed);
        let park = self.park.lock().unwrap().take();
        if let Some(park) = park {
            park.parked.send(()).unwrap();
            park.release.recv().unwrap();
        }
    }
}

// ── MockIrq ───────────────────────────────────────────────────

#[derive(Default)]
struct IrqState {
    not_ready: bool,
    fail: bool,
    trigger: Option<MotionTrigger>,
}

/// Captures the trigger the driver installs; tests call `fire()` as the ISR.
#[derive(Clone, Default)]
pub struct MockIrq {
    state: Arc<Mutex<IrqState>>,
}

#[allow(dead_code)]
impl MockIrq {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn not_ready() -> Self {
        let irq = Self::default();
        irq.state.lock().unwrap().not_ready = true;
        irq
    }

    pub fn failing() -> Self {
        let irq = Self::default();
        irq.state.lock().unwrap().fail = true;
        irq
    }

    pub fn is_armed(&self) -> bool {
        self.state.lock().unwrap().trigger.is_some()
    }

    fn trigger(&self) -> MotionTrigger {
        let trigger = self.state.lock().unwrap().trigger.clone();
        trigger.expect("IRQ not armed")
    }

    /// Simulate one motion edge.  Returns `false` if it coalesced.
    pub fn fire(&self) -> bool {
        self.trigger().fire()
    }

    /// Simulate one edge through the raw-ISR path (no wake-up).
    pub fn fire_from_isr(&self) -> bool {
        self.trigger().fire_from_isr()
    }
}

impl IrqLine for MockIrq {
    fn is_ready(&mut self) -> bool {
        !self.state.lock().unwrap().not_ready
    }

    fn enable_edge_interrupt(&mut self, trigger: MotionTrigger) -> Result<(), BusError> {
        let mut st = self.state.lock().unwrap();
        if st.fail {
            return Err(BusError::Gpio(embedded_hal::digital::ErrorKind::Other));
        }
        st.trigger = Some(trigger);
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<InputEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kinds(&self) -> Vec<InputKind> {
        self.events.iter().map(|e| e.kind).collect()
    }
}

impl InputSink for RecordingSink {
    fn report(&mut self, event: InputEvent) {
        self.events.push(event);
    }
}
