//! Core logic for a battery-powered, event-triggered 433 MHz remote.
//!
//! # Overview
//!
//! The device spends nearly all of its life in low-power sleep. Two
//! interrupt sources can wake it:
//!
//! - a periodic wake-up timer, used as a heartbeat and, by counting ticks,
//!   as a long-interval clock for battery sampling
//! - an external sensor line, which makes the device transmit a fixed
//!   on/off remote-switch code
//!
//! Each wake is resolved into exactly one [`WakeReason`] by the
//! [`TriggerController`], which dispatches at most one transmit action and
//! goes back to sleep.
//!
//! ```text
//!          ┌──────────────┐   one-shot    ┌──────────────────────┐
//!  timer ─▶│  WakeSource  │──── flag ────▶│                      │──▶ RadioTransmitter
//!   ISR    └──────────────┘               │  TriggerController   │──▶ Indicator
//!          ┌──────────────┐   one-shot    │                      │──▶ Diagnostics
//! sensor ─▶│  EventLatch  │──── flag ────▶│                      │
//!   ISR    └──────────────┘               └──────────┬───────────┘
//!                                                    │ sample()
//!                                         ┌──────────▼───────────┐
//!                                         │     PowerMonitor     │
//!                                         └──────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! - [`config`] - Device configuration constants and validation
//! - [`flag`] - Interrupt-to-foreground one-shot flags
//! - [`power`] - Averaged supply voltage sampling and battery state
//! - [`wake`] - Wake-up timer, tick counting and the sleep primitive
//! - [`event`] - External sensor line arming and latching
//! - [`ports`] - Collaborator traits (radio, diagnostics, indicator)
//! - [`radio`] - OOK remote-switch encoder implementing the radio port
//! - [`trigger`] - The per-wake state machine

#![cfg_attr(not(test), no_std)]

mod log;

pub mod config;
pub mod event;
pub mod flag;
pub mod ports;
pub mod power;
pub mod radio;
pub mod trigger;
pub mod wake;

pub use config::{Config, ConfigError, Polarity, SwitchCode, TriggerMode, Window};
pub use event::{EventLatch, EventLine};
pub use flag::{OneShot, WakeFlags};
pub use ports::{Diagnostics, Indicator, RadioTransmitter};
pub use power::{AdcPort, BatteryState, PowerError, PowerMonitor};
pub use radio::OokTransmitter;
pub use trigger::{Action, Cycle, TriggerController, TriggerPhase, WakeReason};
pub use wake::{TickCounter, WakeSource, WakeTimer};
