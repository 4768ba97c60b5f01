//! Wake-up timer and the low-power sleep primitive.
//!
//! The hardware timer fires once per base period. Its handler only raises
//! the timer [`OneShot`]; the foreground loop drains the flag and feeds a
//! [`TickCounter`], turning the base period into a long-interval clock:
//!
//! ```text
//! base ticks:  |  |  |  |  |  |  |  |  |
//! counter:     1  2  3  0  1  2  3  0  1     (threshold 4)
//! crossing:             ^           ^
//! ```
//!
//! The same counter doubles as the double-trigger timeout clock: while a
//! confirmation is pending the controller swaps in a short window, and
//! swaps the long one back when the sequence ends.
//!
//! A timer that never fires leaves the device asleep forever. There is no
//! independent watchdog to catch that.

use core::future::Future;

use crate::config::Window;
use crate::flag::OneShot;
use crate::log;

/// Hardware behind the wake-up clock.
pub trait WakeTimer {
    /// (Re)starts the periodic timer with the given base period.
    fn start(&mut self, period_ms: u32);

    /// Suspends until an enabled interrupt has been serviced.
    fn sleep(&mut self) -> impl Future<Output = ()>;
}

/// Counts base periods and signals each time a threshold is reached.
///
/// Edge-triggered: reaching the threshold signals once and wraps to zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickCounter {
    count: u16,
    threshold: u16,
}

impl TickCounter {
    pub const fn new(threshold: u16) -> Self {
        Self {
            count: 0,
            threshold: if threshold == 0 { 1 } else { threshold },
        }
    }

    /// Counts one base period. Returns `true` on a threshold crossing.
    pub fn advance(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.threshold {
            self.count = 0;
            true
        } else {
            false
        }
    }

    /// Replaces the threshold and starts counting from zero.
    pub fn restart(&mut self, threshold: u16) {
        *self = Self::new(threshold);
    }

    pub fn count(&self) -> u16 {
        self.count
    }

    pub fn threshold(&self) -> u16 {
        self.threshold
    }
}

/// Owns the wake-up timer, its one-shot flag and the tick counter.
pub struct WakeSource<'a, T> {
    timer: T,
    fired: &'a OneShot,
    ticks: TickCounter,
    window: Option<Window>,
    counted: bool,
}

impl<'a, T: WakeTimer> WakeSource<'a, T> {
    pub fn new(timer: T, fired: &'a OneShot) -> Self {
        Self {
            timer,
            fired,
            ticks: TickCounter::new(1),
            window: None,
            counted: true,
        }
    }

    /// Starts the timer for `window` and drops any pending fire.
    pub fn arm(&mut self, window: Window) {
        self.fired.take();
        self.counted = true;
        self.program(window);
    }

    /// Keeps the timer running for `window`.
    ///
    /// The timer and counter restart only when the window changes. A
    /// pending fire is never dropped here, so a tick that lost the race
    /// against an external event is still counted on the next wake.
    pub fn rearm(&mut self, window: Window) {
        if self.window != Some(window) {
            self.program(window);
        }
    }

    /// Suspends until the timer or another enabled interrupt fires.
    pub async fn enter_low_power_sleep(&mut self) {
        self.timer.sleep().await;
    }

    /// Atomically drains the timer flag.
    ///
    /// A drained fire opens the next base period for [`tick`](Self::tick).
    pub fn consume_timer_flag(&mut self) -> bool {
        let fired = self.fired.take();
        if fired {
            self.counted = false;
        }
        fired
    }

    /// Counts the current base period at most once.
    ///
    /// Returns `true` exactly when the window's tick threshold is crossed.
    /// Repeated calls for the same period return `false` until the next
    /// fire has been consumed.
    pub fn tick(&mut self) -> bool {
        if self.counted {
            return false;
        }
        self.counted = true;
        self.ticks.advance()
    }

    pub fn window(&self) -> Option<Window> {
        self.window
    }

    pub fn ticks(&self) -> TickCounter {
        self.ticks
    }

    fn program(&mut self, window: Window) {
        log::debug!(
            "wake timer: {=u32} ms x {=u16}",
            window.period_ms,
            window.ticks
        );
        self.timer.start(window.period_ms);
        self.ticks.restart(window.ticks);
        self.window = Some(window);
    }
}
