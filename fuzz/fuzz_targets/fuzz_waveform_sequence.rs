//! Fuzz target: `WaveformSequence::new` and `Drv2605::play_sequence`
//!
//! Arbitrary id lists must either be rejected up front or land in the
//! sequencer as exactly eight slot writes followed by GO.
//!
//! cargo fuzz run fuzz_waveform_sequence

#![no_main]

use haptic_trackpad::bus::RegisterBus;
use haptic_trackpad::config::HapticConfig;
use haptic_trackpad::drivers::drv2605::{reg, WaveformSequence, SEQUENCE_SLOTS};
use haptic_trackpad::drivers::gpio::NoPin;
use haptic_trackpad::error::BusError;
use haptic_trackpad::Drv2605;
use libfuzzer_sys::fuzz_target;

#[derive(Default)]
struct WriteLog(Vec<(u8, u8)>);

impl RegisterBus for WriteLog {
    fn read_register(&mut self, _reg: u8) -> Result<u8, BusError> {
        Ok(0)
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), BusError> {
        self.0.push((reg, value));
        Ok(())
    }
}

struct NoDelay;

impl embedded_hal::delay::DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

fuzz_target!(|ids: &[u8]| {
    let parsed = WaveformSequence::new(ids);
    let valid = (1..=SEQUENCE_SLOTS).contains(&ids.len());
    assert_eq!(parsed.is_ok(), valid);

    let Ok(drv) = Drv2605::new(WriteLog::default(), None::<NoPin>, NoDelay, HapticConfig::default()) else {
        return;
    };
    let result = drv.play_sequence(ids);
    let (log, _, _) = drv.release();
    // Skip the bring-up writes.
    let writes = &log.0[5..];

    if valid {
        assert!(result.is_ok());
        assert_eq!(writes.len(), SEQUENCE_SLOTS + 1);
        assert_eq!(writes[SEQUENCE_SLOTS], (reg::GO, 1));
        for (i, (r, v)) in writes[..SEQUENCE_SLOTS].iter().enumerate() {
            assert_eq!(*r, reg::WAVEFORM_SEQ1 + i as u8);
            assert_eq!(*v, ids.get(i).copied().unwrap_or(0));
        }
    } else {
        assert!(result.is_err());
        assert!(writes.is_empty());
    }
});
