//! Relative-motion input events and the sink they are reported into.
//!
//! The trackpad worker emits `RelX`, `RelY`, then `Sync` for every motion
//! run.  Consumers decide where events go: a test recorder, or the
//! [`ChannelSink`] that hands them to another task.
//!
//! ```text
//! ┌──────────────┐  InputEvent  ┌─────────────┐  recv  ┌──────────────┐
//! │ Trackpad     │─────────────▶│ ChannelSink │───────▶│ Input router │
//! │ worker       │              │ (embassy)   │        │ (consumer)   │
//! └──────────────┘              └─────────────┘        └──────────────┘
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use log::warn;

/// Tag identifying the device instance that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Relative X motion in counts.
    RelX(i16),
    /// Relative Y motion in counts.
    RelY(i16),
    /// End of one coherent report.
    Sync,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub device: DeviceId,
    pub kind: InputKind,
}

impl InputEvent {
    pub const fn new(device: DeviceId, kind: InputKind) -> Self {
        Self { device, kind }
    }
}

/// Destination for input events.  Reporting never blocks.
pub trait InputSink {
    fn report(&mut self, event: InputEvent);
}

impl<T: InputSink + ?Sized> InputSink for &mut T {
    fn report(&mut self, event: InputEvent) {
        (**self).report(event);
    }
}

/// Forwards events into a bounded `embassy-sync` channel.
///
/// A full channel drops the event and bumps [`dropped`](Self::dropped).
pub struct ChannelSink<'a, M: RawMutex, const N: usize> {
    channel: &'a Channel<M, InputEvent, N>,
    dropped: AtomicU32,
}

impl<'a, M: RawMutex, const N: usize> ChannelSink<'a, M, N> {
    pub fn new(channel: &'a Channel<M, InputEvent, N>) -> Self {
        Self {
            channel,
            dropped: AtomicU32::new(0),
        }
    }

    /// Events lost to a full channel since construction.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<M: RawMutex, const N: usize> InputSink for ChannelSink<'_, M, N> {
    fn report(&mut self, event: InputEvent) {
        if self.channel.try_send(event).is_err() {
            let n = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            warn!("input: channel full, dropped {:?} ({} total)", event.kind, n);
        }
    }
}
