//! Battery monitoring.
//!
//! The supply voltage is never measured directly. The ADC converts a known
//! internal reference against the supply rail, so the raw reading falls as
//! the battery drains:
//!
//! ```text
//! supply_mv = reference_mv * full_scale / raw
//! ```
//!
//! One measurement powers the ADC up, discards a warm-up run of conversions
//! while the reference settles, averages a fixed window of conversions and
//! powers the ADC back down. A single measurement is authoritative: noise is
//! absorbed by averaging, never by retrying.

use core::convert::Infallible;
use core::fmt;

use crate::config::{PowerConfig, Sampling};
use crate::log;

/// Battery condition as of the last successful sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BatteryState {
    Low,
    #[default]
    Normal,
}

/// Reference-voltage calibration used to turn an averaged reading into
/// millivolts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    /// Supply voltage at which `full_scale` was captured
    pub reference_mv: u32,
    /// Raw reading of the internal reference at `reference_mv`
    pub full_scale: u32,
}

impl Calibration {
    /// Nominal STM32L0 VREFINT (1.224 V) read with a 12-bit ADC at 3.0 V.
    pub const VREFINT_TYPICAL: Self = Self::vrefint_factory(1671);

    /// Calibration from the factory `VREFINT_CAL` word, captured at 3.0 V.
    pub const fn vrefint_factory(vrefint_cal: u16) -> Self {
        Self {
            reference_mv: 3000,
            full_scale: vrefint_cal as u32,
        }
    }

    /// Converts an averaged raw reading into supply millivolts.
    pub fn millivolts(&self, raw: u16) -> Result<u16, PowerError> {
        if raw == 0 {
            return Err(PowerError::InvalidReading);
        }
        let mv = self.reference_mv * self.full_scale / u32::from(raw);
        Ok(mv.min(u32::from(u16::MAX)) as u16)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerError {
    /// The converter or its reference did not settle after power-up
    NotReady,
    /// A conversion never completed within the polling bound
    Unresponsive,
    /// The averaged reading cannot be converted to a voltage
    InvalidReading,
}

impl fmt::Display for PowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => write!(f, "reference not ready"),
            Self::Unresponsive => write!(f, "ADC unresponsive"),
            Self::InvalidReading => write!(f, "invalid ADC reading"),
        }
    }
}

/// Analog front end used for battery measurement.
///
/// `read` follows the `nb` protocol: it returns `WouldBlock` until the
/// conversion started by `start_conversion` has completed.
pub trait AdcPort {
    /// Powers the converter and its reference up and waits, bounded, for
    /// both to settle.
    fn power_up(&mut self) -> Result<(), PowerError>;

    /// Powers the converter and its reference down.
    fn power_down(&mut self);

    fn start_conversion(&mut self);

    fn read(&mut self) -> nb::Result<u16, Infallible>;
}

/// Samples the supply voltage and reduces it to a [`BatteryState`].
pub struct PowerMonitor<A> {
    adc: A,
    config: PowerConfig,
    state: BatteryState,
    last: Option<Result<u16, PowerError>>,
}

impl<A: AdcPort> PowerMonitor<A> {
    pub fn new(adc: A, config: PowerConfig) -> Self {
        Self {
            adc,
            config,
            state: BatteryState::default(),
            last: None,
        }
    }

    /// Takes one averaged measurement and updates the battery state.
    ///
    /// Low if the voltage is at or below the configured threshold. When the
    /// measurement fails the previous state is kept.
    pub fn sample(&mut self) -> BatteryState {
        let measurement = self.measure();
        self.last = Some(measurement);

        match measurement {
            Ok(mv) => {
                self.state = if mv <= self.config.low_battery_mv {
                    BatteryState::Low
                } else {
                    BatteryState::Normal
                };
                log::debug!("supply {=u16} mV, battery {}", mv, self.state);
            }
            Err(_e) => {
                log::warning!("battery sample failed: {}, keeping {}", _e, self.state);
            }
        }

        self.state
    }

    /// Measures the supply voltage in millivolts.
    ///
    /// The ADC is powered down on return, whatever the outcome.
    pub fn measure(&mut self) -> Result<u16, PowerError> {
        let average = self.adc.power_up().and_then(|()| self.average());
        self.adc.power_down();
        self.config.calibration.millivolts(average?)
    }

    pub fn state(&self) -> BatteryState {
        self.state
    }

    /// Outcome of the most recent measurement, `None` before the first.
    pub fn last_measurement(&self) -> Option<Result<u16, PowerError>> {
        self.last
    }

    fn average(&mut self) -> Result<u16, PowerError> {
        let Sampling { warmup, window, .. } = self.config.sampling;
        let mut accumulator: u32 = 0;

        for _ in 0..warmup {
            self.convert()?;
        }
        for _ in 0..window {
            accumulator += u32::from(self.convert()?);
        }

        accumulator
            .checked_div(u32::from(window))
            .map(|average| average as u16)
            .ok_or(PowerError::InvalidReading)
    }

    fn convert(&mut self) -> Result<u16, PowerError> {
        self.adc.start_conversion();
        for _ in 0..self.config.sampling.max_polls {
            match self.adc.read() {
                Ok(raw) => return Ok(raw),
                Err(nb::Error::WouldBlock) => continue,
                Err(nb::Error::Other(never)) => match never {},
            }
        }
        Err(PowerError::Unresponsive)
    }
}
