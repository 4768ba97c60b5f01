//! Collaborator ports.
//!
//! The state machine reaches the outside world only through these traits.
//! Implementations are fire-and-forget: nothing here returns a value the
//! controller could branch on.

use crate::config::SwitchCode;

/// Number of blinks the catch-all interrupt handler shows.
pub const FAULT_BLINKS: u8 = 20;

/// Transmits a fixed remote-switch code over the air.
pub trait RadioTransmitter {
    fn emit_on(&mut self, code: &SwitchCode);

    fn emit_off(&mut self, code: &SwitchCode);
}

/// Best-effort text trace.
pub trait Diagnostics {
    fn log_line(&mut self, line: &str);
}

/// Visible status output, typically a single LED.
pub trait Indicator {
    /// Blinks `count` times.
    fn blink(&mut self, count: u8);

    /// A very short flash shown once per wake while the battery is low.
    fn low_battery_pulse(&mut self);
}
