//! Interrupt-to-worker hand-off for the trackpad.
//!
//! The motion GPIO ISR may not touch the SPI bus, so it only marks work as
//! pending.  Scheduling is idempotent: any number of interrupts between two
//! worker runs collapse into one pending run.
//!
//! A raw ISR uses [`MotionTrigger::fire_from_isr`], which touches atomics
//! only and leaves the wake-up to the platform (a task notification that
//! ends in `process_pending`).  Thread-context triggers use
//! [`MotionTrigger::fire`], which also wakes [`MotionWork::wait`] through a
//! `Signal` and therefore takes a critical section.
//!
//! ```text
//!  GPIO ISR ──▶ fire_from_isr() ──▶ pending = true ──▶ platform wake-up
//!  thread   ──▶ fire()          ──▶ pending = true ──▶ Signal
//!                                                          │
//!                                                          ▼
//!               worker: take() / wait() ──▶ bus I/O
//! ```
//!
//! The worker clears `pending` when it claims a run, before reading any
//! register, so an edge that lands mid-run schedules exactly one more run.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::error::BusError;

/// Pending flag plus wake-up signal shared between ISR and worker.
pub struct MotionWork {
    pending: AtomicBool,
    wake: Signal<CriticalSectionRawMutex, ()>,
    interrupts: AtomicU32,
    runs: AtomicU32,
}

impl Default for MotionWork {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionWork {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            wake: Signal::new(),
            interrupts: AtomicU32::new(0),
            runs: AtomicU32::new(0),
        }
    }

    /// Schedule a worker run and wake [`wait`](Self::wait).  Thread context
    /// only: the wake-up takes a critical section.
    /// Returns `false` if a run was already pending (coalesced).
    pub fn submit(&self) -> bool {
        if !self.submit_from_isr() {
            return false;
        }
        self.wake.signal(());
        true
    }

    /// Mark a run pending without waking anyone.  Atomics only, so it is
    /// safe from a raw ISR; the caller owns the wake-up.
    /// Returns `false` if a run was already pending (coalesced).
    pub fn submit_from_isr(&self) -> bool {
        self.interrupts.fetch_add(1, Ordering::Relaxed);
        !self.pending.swap(true, Ordering::AcqRel)
    }

    /// Claim the pending run, if any.  Called by the worker only.
    pub fn take(&self) -> bool {
        let claimed = self.pending.swap(false, Ordering::AcqRel);
        if claimed {
            self.runs.fetch_add(1, Ordering::Relaxed);
        }
        claimed
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Resolve once a run has been claimed.
    pub async fn wait(&self) {
        loop {
            if self.take() {
                return;
            }
            // A stale wake-up (run already claimed by `take`) just loops.
            self.wake.wait().await;
        }
    }

    /// Raw interrupts seen so far.
    pub fn interrupts(&self) -> u32 {
        self.interrupts.load(Ordering::Relaxed)
    }

    /// Worker runs claimed so far.
    pub fn runs(&self) -> u32 {
        self.runs.load(Ordering::Relaxed)
    }
}

/// Cloneable, ISR-safe handle that schedules the trackpad worker.
#[derive(Clone)]
pub struct MotionTrigger {
    work: Arc<MotionWork>,
}

impl MotionTrigger {
    pub(crate) fn new(work: Arc<MotionWork>) -> Self {
        Self { work }
    }

    /// Schedule the worker and wake a thread blocked in
    /// [`MotionWork::wait`].  Not for raw interrupt handlers.
    pub fn fire(&self) -> bool {
        self.work.submit()
    }

    /// ISR body: mark the worker pending and return.  Pair it with a
    /// platform wake-up that ends in `Trackpad::process_pending`.
    pub fn fire_from_isr(&self) -> bool {
        self.work.submit_from_isr()
    }
}

/// Edge-triggered interrupt input.
///
/// Implemented by the board layer over its GPIO driver; the trackpad calls
/// these once during init.
pub trait IrqLine {
    fn is_ready(&mut self) -> bool {
        true
    }

    /// Configure the pin as an input interrupting on the inactive-to-active
    /// edge, and arrange for `trigger.fire()` to run from the ISR.
    fn enable_edge_interrupt(&mut self, trigger: MotionTrigger) -> Result<(), BusError>;
}
