//! The per-wake state machine.
//!
//! Every wake is resolved into exactly one [`WakeReason`], external events
//! first:
//!
//! ```text
//! event flag? ──yes──▶ ExternalEvent
//!     │no
//! timer flag and long-interval crossing? ──yes──▶ Timer
//!     │no
//!     ▼
//!   None (spurious wake)
//! ```
//!
//! A timer fire that loses the race against an event stays pending and is
//! resolved on the next wake.
//!
//! # Double trigger
//!
//! ```text
//!                   event / none
//!        ┌──────┐ ─────────────────▶ ┌────────────────────┐
//!        │ Idle │                    │ ArmedWaitingSecond │
//!        └──────┘ ◀───────────────── └────────────────────┘
//!           ▲      event / emit off            │
//!           └──────────────────────────────────┘
//!                  window expired / emit on
//! ```
//!
//! While armed, the tick counter runs on the short window instead of the
//! long sampling window, so a Timer crossing in that state means the
//! confirmation window has expired. Battery sampling resumes once the
//! sequence ends.

use core::fmt::{self, Write};

use heapless::String;

use crate::config::{Config, ConfigError, TriggerMode, Window};
use crate::event::{EventLatch, EventLine};
use crate::flag::WakeFlags;
use crate::log;
use crate::ports::{Diagnostics, Indicator, RadioTransmitter};
use crate::power::{AdcPort, BatteryState, PowerMonitor};
use crate::wake::{WakeSource, WakeTimer};

const FIRMWARE_NAME: &str = "REMOTE-TRIGGER";
const VERSION: &str = env!("CARGO_PKG_VERSION");
const GIT_REV: &str = match option_env!("FIRMWARE_GIT_REV") {
    Some(rev) => rev,
    None => "unknown",
};

/// Capacity of one diagnostic line.
const LINE_CAPACITY: usize = 48;

/// Why the device woke up, resolved once per wake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WakeReason {
    None,
    Timer,
    ExternalEvent,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerPhase {
    /// The next external event is the first of a pair
    #[default]
    Idle,
    /// A first event occurred and the confirmation window is open
    ArmedWaitingSecond,
}

/// Transmit action dispatched for one wake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    None,
    EmitOn,
    EmitOff,
}

/// Outcome of one pass through the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cycle {
    pub reason: WakeReason,
    pub action: Action,
}

/// Drives the device from wake to wake.
pub struct TriggerController<'a, A, T, L, R, D, I> {
    config: Config,
    power: PowerMonitor<A>,
    wake: WakeSource<'a, T>,
    event: EventLatch<'a, L>,
    radio: R,
    diagnostics: D,
    indicator: I,
    phase: TriggerPhase,
}

impl<'a, A, T, L, R, D, I> TriggerController<'a, A, T, L, R, D, I>
where
    A: AdcPort,
    T: WakeTimer,
    L: EventLine,
    R: RadioTransmitter,
    D: Diagnostics,
    I: Indicator,
{
    /// Validates `config` and assembles the controller around the raw
    /// ports. The power monitor and the sensor latch take their settings
    /// from the validated config, never from the caller.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        flags: &'a WakeFlags,
        adc: A,
        timer: T,
        line: L,
        radio: R,
        diagnostics: D,
        indicator: I,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            config,
            power: PowerMonitor::new(adc, config.power),
            wake: WakeSource::new(timer, &flags.timer),
            event: EventLatch::new(line, config.polarity, &flags.event),
            radio,
            diagnostics,
            indicator,
            phase: TriggerPhase::Idle,
        })
    }

    /// Announces the device, takes the initial battery sample and arms
    /// both wake sources.
    pub fn start(&mut self) {
        self.trace(format_args!("{FIRMWARE_NAME}"));
        self.trace(format_args!("VERSION: {VERSION}"));
        self.trace(format_args!("GIT: {GIT_REV}"));
        let code = self.config.code;
        self.trace(format_args!("SWITCH_FAMILY: {}", code.family));
        self.trace(format_args!("SWITCH_GROUP: {}", code.group));
        self.trace(format_args!("SWITCH_NUMBER: {}", code.number));

        self.sample_battery();

        if self.config.announce_on_boot {
            self.trace(format_args!("Announce"));
            self.radio.emit_on(&self.config.code);
        }

        self.indicator.blink(2);
        self.wake.arm(self.config.long_window);
        self.event.arm();
        log::info!("armed, {}", self.config.trigger);
    }

    /// Sleeps and handles wakes forever.
    pub async fn run(&mut self) {
        loop {
            self.wake.enter_low_power_sleep().await;
            self.trace(format_args!("Wake up"));
            self.step();
        }
    }

    /// Handles one wake: resolves its reason, dispatches at most one
    /// action and re-arms both sources.
    pub fn step(&mut self) -> Cycle {
        if self.power.state() == BatteryState::Low {
            self.indicator.low_battery_pulse();
            self.trace(format_args!("Low battery"));
        }

        let reason = self.resolve();
        let action = match reason {
            WakeReason::ExternalEvent => self.on_external_event(),
            WakeReason::Timer => self.on_long_interval(),
            WakeReason::None => Action::None,
        };

        self.dispatch(action);
        self.rearm();

        log::debug!("wake {} -> {}, {}", reason, action, self.phase);
        Cycle { reason, action }
    }

    pub fn phase(&self) -> TriggerPhase {
        self.phase
    }

    pub fn battery(&self) -> BatteryState {
        self.power.state()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Window the wake-up timer should be running for the current phase.
    pub fn window(&self) -> Window {
        match (self.phase, self.config.trigger) {
            (TriggerPhase::ArmedWaitingSecond, TriggerMode::Double { window }) => window,
            _ => self.config.long_window,
        }
    }

    fn resolve(&mut self) -> WakeReason {
        if self.event.consume_flag() {
            WakeReason::ExternalEvent
        } else if self.wake.consume_timer_flag() && self.wake.tick() {
            WakeReason::Timer
        } else {
            WakeReason::None
        }
    }

    fn on_external_event(&mut self) -> Action {
        match (self.config.trigger, self.phase) {
            (TriggerMode::Single, _) => Action::EmitOn,
            (TriggerMode::Double { .. }, TriggerPhase::Idle) => {
                self.phase = TriggerPhase::ArmedWaitingSecond;
                Action::None
            }
            (TriggerMode::Double { .. }, TriggerPhase::ArmedWaitingSecond) => {
                self.phase = TriggerPhase::Idle;
                Action::EmitOff
            }
        }
    }

    fn on_long_interval(&mut self) -> Action {
        match self.phase {
            // The confirming event never came: a lone assertion is an on.
            TriggerPhase::ArmedWaitingSecond => {
                self.phase = TriggerPhase::Idle;
                Action::EmitOn
            }
            TriggerPhase::Idle => {
                self.trace(format_args!("Battery sensing"));
                self.sample_battery();
                Action::None
            }
        }
    }

    fn dispatch(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::EmitOn => {
                self.trace(format_args!("Emit on"));
                self.indicator.blink(1);
                self.radio.emit_on(&self.config.code);
            }
            Action::EmitOff => {
                self.trace(format_args!("Emit off"));
                self.indicator.blink(1);
                self.radio.emit_off(&self.config.code);
            }
        }
    }

    fn rearm(&mut self) {
        self.event.arm();
        let window = self.window();
        self.wake.rearm(window);
    }

    fn sample_battery(&mut self) {
        self.power.sample();
        match self.power.last_measurement() {
            Some(Ok(mv)) => self.trace(format_args!("Current voltage: {mv}mV")),
            Some(Err(e)) => self.trace(format_args!("Voltage unavailable: {e}")),
            None => {}
        }
    }

    fn trace(&mut self, args: fmt::Arguments<'_>) {
        let mut line: String<LINE_CAPACITY> = String::new();
        if line.write_fmt(args).is_err() {
            log::warning!("diagnostic line truncated");
        }
        self.diagnostics.log_line(&line);
    }
}
