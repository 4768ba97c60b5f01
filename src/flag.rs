//! One-shot flags handed from interrupt context to the foreground loop.
//!
//! These are the only state shared between contexts. An interrupt handler
//! raises a flag; the foreground loop drains it with a single atomic swap.
//! On Cortex-M0+ there is no native compare-and-swap, so `portable-atomic`
//! implements the swap with interrupts masked for its duration.

use portable_atomic::{AtomicBool, Ordering};

/// A boolean set by an interrupt handler and cleared only by the read
/// that consumes it.
#[derive(Debug, Default)]
pub struct OneShot(AtomicBool);

impl OneShot {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Sets the flag. Raising an already raised flag is a no-op, so a
    /// handler that fires twice before the foreground drains it is
    /// observed once.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Atomically reads and clears the flag.
    ///
    /// Returns `true` at most once per [`raise`](Self::raise).
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    /// Reads the flag without consuming it.
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// The pair of wake flags, one per interrupt source.
///
/// Intended to live in a `static` so both the handlers and the foreground
/// loop can reach it.
#[derive(Debug, Default)]
pub struct WakeFlags {
    /// Raised by the wake-up timer handler once per base period
    pub timer: OneShot,
    /// Raised by the sensor line handler when an event is latched
    pub event: OneShot,
}

impl WakeFlags {
    pub const fn new() -> Self {
        Self {
            timer: OneShot::new(),
            event: OneShot::new(),
        }
    }
}
