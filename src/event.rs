//! External sensor line.
//!
//! The line is armed from the foreground and disarmed by its own interrupt
//! handler, so an asserted line cannot re-enter the handler. Between that
//! implicit disarm and the next explicit [`EventLatch::arm`] the line is
//! dead: further assertions are dropped, not queued. This is the only
//! debouncing the device does.

use crate::config::{Edge, Polarity};
use crate::flag::OneShot;
use crate::log;

/// Interrupt-capable input line.
///
/// Implementations must be usable from both the foreground loop and the
/// line's interrupt handler.
pub trait EventLine {
    /// Enables the line interrupt on `edge`.
    fn enable(&mut self, edge: Edge);

    fn disable(&mut self);

    fn is_enabled(&self) -> bool;

    /// Clears interrupt state latched while the line was not listening.
    fn clear_pending(&mut self);

    /// Current electrical level of the line.
    fn is_high(&self) -> bool;
}

/// Foreground side of the sensor line.
pub struct EventLatch<'a, L> {
    line: L,
    polarity: Polarity,
    occurred: &'a OneShot,
}

impl<'a, L: EventLine> EventLatch<'a, L> {
    pub fn new(line: L, polarity: Polarity, occurred: &'a OneShot) -> Self {
        Self {
            line,
            polarity,
            occurred,
        }
    }

    /// Enables the line for the configured polarity.
    ///
    /// Residual pending state is cleared first so noise picked up while
    /// disarmed cannot fire immediately.
    pub fn arm(&mut self) {
        self.line.disable();
        self.line.clear_pending();
        self.line.enable(self.polarity.edge());
    }

    /// Disables the line until the next [`arm`](Self::arm).
    pub fn disarm(&mut self) {
        self.line.disable();
    }

    /// Atomically drains the event flag.
    pub fn consume_flag(&self) -> bool {
        self.occurred.take()
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }
}

/// Interrupt side of the sensor line. Call from the line's handler.
///
/// A fire while the line is disarmed is ignored. Otherwise the level is
/// re-read: an asserted line is disarmed and latched, anything else (the
/// release edge of a pin-change line, a glitch) only clears the pending
/// state and leaves the line armed.
///
/// Returns `true` when an event was latched and the foreground should wake.
pub fn on_interrupt<L: EventLine>(line: &mut L, polarity: Polarity, occurred: &OneShot) -> bool {
    if !line.is_enabled() {
        line.clear_pending();
        return false;
    }

    if !polarity.is_asserted(line.is_high()) {
        line.clear_pending();
        log::debug!("sensor edge without assertion ignored");
        return false;
    }

    line.disable();
    line.clear_pending();
    occurred.raise();
    true
}
