//! Fuzz target: `Trackpad` worker runs
//!
//! The first four bytes pick an axis transform; the rest is replayed as
//! the sensor's SPI responses while interrupts are fired at the worker.
//! The worker must never panic, must report events in complete
//! `RelX, RelY, Sync` triples, and must never run more often than it was
//! interrupted.
//!
//! cargo fuzz run fuzz_motion_worker

#![no_main]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use haptic_trackpad::bus::CommandBus;
use haptic_trackpad::config::{AxisTransform, TrackpadConfig};
use haptic_trackpad::drivers::gpio::NoPin;
use haptic_trackpad::drivers::work::{IrqLine, MotionTrigger};
use haptic_trackpad::error::BusError;
use haptic_trackpad::input::{InputEvent, InputKind, InputSink};
use haptic_trackpad::Trackpad;
use libfuzzer_sys::fuzz_target;

struct ScriptedSpi(VecDeque<u8>);

impl CommandBus for ScriptedSpi {
    fn transact(&mut self, _command: u8) -> Result<u8, BusError> {
        // 0xEE stands in for a transfer fault.
        match self.0.pop_front() {
            Some(0xEE) => Err(BusError::Spi(embedded_hal::spi::ErrorKind::Other)),
            Some(b) => Ok(b),
            None => Ok(0),
        }
    }
}

#[derive(Clone, Default)]
struct Irq(Arc<Mutex<Option<MotionTrigger>>>);

impl IrqLine for Irq {
    fn enable_edge_interrupt(&mut self, trigger: MotionTrigger) -> Result<(), BusError> {
        *self.0.lock().unwrap() = Some(trigger);
        Ok(())
    }
}

struct NoDelay;

impl embedded_hal::delay::DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

#[derive(Default)]
struct Collect(Vec<InputEvent>);

impl InputSink for Collect {
    fn report(&mut self, event: InputEvent) {
        self.0.push(event);
    }
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let flags = data[0];
    let axes = AxisTransform {
        swap_xy: flags & 1 != 0,
        invert_x: flags & 2 != 0,
        invert_y: flags & 4 != 0,
        scale_x: u16::from(data[1]).max(1),
        scale_y: u16::from(data[2]).max(1),
    };
    let bursts = data[3];

    // Bring-up consumes three responses; feed it clean ones.
    let mut script: VecDeque<u8> = VecDeque::from([0, 0, 0]);
    script.extend(&data[4..]);

    let irq = Irq::default();
    let Ok(mut pad) = Trackpad::new(
        ScriptedSpi(script),
        irq.clone(),
        None::<NoPin>,
        NoDelay,
        TrackpadConfig { id: 0, axes },
    ) else {
        return;
    };
    let trigger = irq.0.lock().unwrap().clone().expect("armed during init");

    let mut sink = Collect::default();
    for i in 0..data.len() {
        for _ in 0..=(bursts >> (i % 8) & 0x03) {
            trigger.fire();
        }
        pad.process_pending(&mut sink);
    }

    assert!(pad.work().runs() <= pad.work().interrupts());
    assert_eq!(sink.0.len() % 3, 0, "partial report emitted");
    for report in sink.0.chunks_exact(3) {
        assert!(matches!(report[0].kind, InputKind::RelX(_)));
        assert!(matches!(report[1].kind, InputKind::RelY(_)));
        assert_eq!(report[2].kind, InputKind::Sync);
    }
});
