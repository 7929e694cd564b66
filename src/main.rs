//! Haptic trackpad firmware: board bring-up.
//!
//! ```text
//!  GPIO edge ──▶ trackpad_isr ──▶ fire_from_isr + task notify
//!                                          │
//!  "trackpad" thread: notification.wait ──▶ Trackpad::process_pending
//!                                          │ InputEvent
//!                                          ▼
//!  main thread: INPUT_CHANNEL.receive ──▶ Drv2605::play_waveform(TICK)
//! ```
//!
//! The raw ISR touches atomics only and cannot wake a std thread, so it
//! pairs the pending flag with a FreeRTOS task notification and the worker
//! polls the flag.
#![deny(unused_must_use)]

use core::num::NonZeroU32;
use std::sync::Arc;

use anyhow::Result;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use esp_idf_hal::delay::{BLOCK, FreeRtos};
use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::spi::config::Config as SpiConfig;
use esp_idf_hal::spi::{SpiDeviceDriver, SpiDriver, SpiDriverConfig};
use esp_idf_hal::task::notification::{Notification, Notifier};
use esp_idf_hal::units::Hertz;
use esp_idf_svc::sys::*;
use log::{error, info, warn};

use haptic_trackpad::bus::i2c::DRV2605_ADDRESS;
use haptic_trackpad::bus::{I2cRegisterBus, SpiCommandBus};
use haptic_trackpad::config::BoardConfig;
use haptic_trackpad::drivers::drv2605::waveform;
use haptic_trackpad::drivers::work::{IrqLine, MotionTrigger};
use haptic_trackpad::error::BusError;
use haptic_trackpad::input::{ChannelSink, InputEvent, InputKind};
use haptic_trackpad::pins;
use haptic_trackpad::{Drv2605, Trackpad};

/// Trackpad worker → main loop.
static INPUT_CHANNEL: Channel<CriticalSectionRawMutex, InputEvent, 16> = Channel::new();

/// Accumulated motion (counts) between two haptic ticks.
const TICK_TRAVEL: u32 = 24;

// ── Motion interrupt ──────────────────────────────────────────

/// Handed to the raw GPIO ISR; leaked once at boot.
struct IsrContext {
    trigger: MotionTrigger,
    notifier: Arc<Notifier>,
}

unsafe extern "C" fn trackpad_isr(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the leaked `IsrContext` registered below and is
    // never freed.
    let ctx = unsafe { &*(arg as *const IsrContext) };
    if ctx.trigger.fire_from_isr() {
        // SAFETY: FromISR notification; the worker task outlives the ISR.
        unsafe {
            let _ = ctx.notifier.notify_and_yield(NonZeroU32::MIN);
        }
    }
}

/// Rising-edge motion line wired through the GPIO ISR service.
struct EspIrqLine {
    gpio: i32,
    notifier: Arc<Notifier>,
}

fn gpio_fault(rc: esp_err_t) -> BusError {
    error!("GPIO call failed (rc={})", rc);
    BusError::Gpio(embedded_hal::digital::ErrorKind::Other)
}

impl IrqLine for EspIrqLine {
    fn enable_edge_interrupt(&mut self, trigger: MotionTrigger) -> core::result::Result<(), BusError> {
        let ctx: &'static mut IsrContext = Box::leak(Box::new(IsrContext {
            trigger,
            notifier: self.notifier.clone(),
        }));

        // SAFETY: called once from the worker thread during bring-up; the
        // ISR argument is 'static.
        unsafe {
            let cfg = gpio_config_t {
                pin_bit_mask: 1u64 << self.gpio,
                mode: gpio_mode_t_GPIO_MODE_INPUT,
                pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
                pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
                intr_type: gpio_int_type_t_GPIO_INTR_POSEDGE,
            };
            let ret = gpio_config(&cfg);
            if ret != ESP_OK as i32 {
                return Err(gpio_fault(ret));
            }

            let ret = gpio_install_isr_service(0);
            if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
                return Err(gpio_fault(ret));
            }

            let arg = (ctx as *mut IsrContext).cast::<core::ffi::c_void>();
            let ret = gpio_isr_handler_add(self.gpio, Some(trackpad_isr), arg);
            if ret != ESP_OK as i32 {
                return Err(gpio_fault(ret));
            }
            let ret = gpio_intr_enable(self.gpio);
            if ret != ESP_OK as i32 {
                return Err(gpio_fault(ret));
            }
        }
        info!("trackpad: IRQ armed on GPIO{}", self.gpio);
        Ok(())
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("haptic-trackpad v{}", env!("CARGO_PKG_VERSION"));

    let config = BoardConfig::default();
    config.validate()?;
    let p = Peripherals::take()?;

    // ── 2. Haptic driver (I2C0) ───────────────────────────────
    let i2c = I2cDriver::new(
        p.i2c0,
        p.pins.gpio14,
        p.pins.gpio15,
        &I2cConfig::new().baudrate(Hertz(pins::HAPTIC_I2C_HZ)),
    )?;
    let haptic_en = PinDriver::output(p.pins.gpio4)?;
    let haptic = Drv2605::new(
        I2cRegisterBus::new(i2c, DRV2605_ADDRESS),
        Some(haptic_en),
        FreeRtos,
        config.haptic,
    )?;

    // ── 3. Trackpad (SPI2) on its own worker thread ───────────
    let spi = SpiDriver::new(
        p.spi2,
        p.pins.gpio12,
        p.pins.gpio11,
        Some(p.pins.gpio13),
        &SpiDriverConfig::new(),
    )?;
    let spi = SpiDeviceDriver::new(
        spi,
        Some(p.pins.gpio10),
        &SpiConfig::new()
            .baudrate(Hertz(pins::TRACKPAD_SPI_HZ))
            .data_mode(embedded_hal::spi::MODE_3),
    )?;
    let shutdown = PinDriver::output(p.pins.gpio8)?;
    let pad_config = config.trackpad;

    let _worker = std::thread::Builder::new()
        .name("trackpad".into())
        .stack_size(6 * 1024)
        .spawn(move || {
            // Task notifications bind to the creating task.
            let notification = Notification::new();
            let irq = EspIrqLine {
                gpio: pins::TRACKPAD_IRQ_GPIO,
                notifier: notification.notifier(),
            };
            let mut pad = match Trackpad::new(
                SpiCommandBus::new(spi),
                irq,
                Some(shutdown),
                FreeRtos,
                pad_config,
            ) {
                Ok(pad) => pad,
                Err(e) => {
                    error!("trackpad bring-up failed: {}, input disabled", e);
                    return;
                }
            };
            let mut sink = ChannelSink::new(&INPUT_CHANNEL);
            loop {
                notification.wait(BLOCK);
                pad.process_pending(&mut sink);
            }
        })?;

    // ── 4. Input → haptic feedback loop ───────────────────────
    let mut travel: u32 = 0;
    loop {
        let event = futures_lite::future::block_on(INPUT_CHANNEL.receive());
        match event.kind {
            InputKind::RelX(d) | InputKind::RelY(d) => {
                travel = travel.saturating_add(u32::from(d.unsigned_abs()));
            }
            InputKind::Sync => {
                if travel >= TICK_TRAVEL {
                    travel = 0;
                    if let Err(e) = haptic.play_waveform(waveform::TICK) {
                        warn!("haptic tick failed: {}", e);
                    }
                }
            }
        }
    }
}
