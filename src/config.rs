//! Device configuration.
//!
//! Every device variant is a [`Config`] value built from `const fn`
//! constructors. The firmware picks one as a constant, validates it at
//! compile time, and the controller reads it once at startup.

use core::fmt;

use crate::power::Calibration;

/// Remote-switch address transmitted on every action.
///
/// Family is a letter `'a'..='p'`, group and number are `1..=4`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SwitchCode {
    pub family: char,
    pub group: u8,
    pub number: u8,
}

impl SwitchCode {
    pub const fn new(family: char, group: u8, number: u8) -> Self {
        Self {
            family,
            group,
            number,
        }
    }

    /// Zero-based family index, `'a'` being 0.
    pub const fn family_index(&self) -> u8 {
        (self.family as u32).wrapping_sub('a' as u32) as u8
    }

    const fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.family, 'a'..='p') {
            return Err(ConfigError::InvalidFamily(self.family));
        }
        if self.group < 1 || self.group > 4 {
            return Err(ConfigError::InvalidGroup(self.group));
        }
        if self.number < 1 || self.number > 4 {
            return Err(ConfigError::InvalidNumber(self.number));
        }
        Ok(())
    }
}

/// Electrical polarity of the sensor line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// The sensor asserts by driving the line high (rising edge)
    ActiveHigh,
    /// The sensor asserts by pulling the line low (falling edge)
    ActiveLow,
}

/// Interrupt edge used to wake on a sensor assertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Rising,
    Falling,
}

impl Polarity {
    pub const fn edge(self) -> Edge {
        match self {
            Polarity::ActiveHigh => Edge::Rising,
            Polarity::ActiveLow => Edge::Falling,
        }
    }

    /// Whether a line reading `high` counts as asserted.
    pub const fn is_asserted(self, high: bool) -> bool {
        match self {
            Polarity::ActiveHigh => high,
            Polarity::ActiveLow => !high,
        }
    }
}

/// A wake-up timer base period and the number of periods that make up
/// one logical interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Window {
    pub period_ms: u32,
    pub ticks: u16,
}

impl Window {
    pub const fn new(period_ms: u32, ticks: u16) -> Self {
        Self { period_ms, ticks }
    }

    pub const fn duration_ms(&self) -> u64 {
        self.period_ms as u64 * self.ticks as u64
    }

    const fn is_empty(&self) -> bool {
        self.period_ms == 0 || self.ticks == 0
    }
}

/// How sensor events map onto transmit actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerMode {
    /// Every event transmits the on code.
    Single,
    /// Two events within `window` transmit the off code; a single event
    /// followed by silence transmits the on code when the window expires.
    Double { window: Window },
}

/// Averaging parameters for one battery measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sampling {
    /// Conversions taken and discarded while the reference settles
    pub warmup: u8,
    /// Conversions averaged into the result
    pub window: u8,
    /// Upper bound on ready polls per conversion before giving up
    pub max_polls: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerConfig {
    /// At or below this supply voltage the battery is reported low
    pub low_battery_mv: u16,
    pub sampling: Sampling,
    pub calibration: Calibration,
}

/// Complete description of one device variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub code: SwitchCode,
    pub polarity: Polarity,
    pub trigger: TriggerMode,
    /// Battery sampling interval, also the idle wake-up period
    pub long_window: Window,
    pub power: PowerConfig,
    /// Transmit the on code once at startup as a link test
    pub announce_on_boot: bool,
}

/// Longest standard wake-up period the timer offers in deep sleep.
pub const BASE_PERIOD_MS: u32 = 8_000;

/// One hour of base periods between battery samples.
pub const LONG_WINDOW: Window = Window::new(BASE_PERIOD_MS, 3600 / 8);

/// Double-trigger confirmation window: four quarter-second periods.
pub const SHORT_WINDOW: Window = Window::new(250, 4);

pub const DEFAULT_LOW_BATTERY_MV: u16 = 2 * 1150;

pub const DEFAULT_SAMPLING: Sampling = Sampling {
    warmup: 10,
    window: 16,
    max_polls: 1_000,
};

impl Config {
    /// Every sensor event transmits the on code.
    pub const fn single_trigger(polarity: Polarity) -> Self {
        Self {
            code: SwitchCode::new('e', 3, 2),
            polarity,
            trigger: TriggerMode::Single,
            long_window: LONG_WINDOW,
            power: PowerConfig {
                low_battery_mv: DEFAULT_LOW_BATTERY_MV,
                sampling: DEFAULT_SAMPLING,
                calibration: Calibration::VREFINT_TYPICAL,
            },
            announce_on_boot: false,
        }
    }

    /// A pair of events is an off, a lone event is an on.
    pub const fn double_trigger(polarity: Polarity) -> Self {
        Self {
            trigger: TriggerMode::Double {
                window: SHORT_WINDOW,
            },
            ..Self::single_trigger(polarity)
        }
    }

    pub const fn with_code(self, code: SwitchCode) -> Self {
        Self { code, ..self }
    }

    pub const fn with_announce_on_boot(self, announce_on_boot: bool) -> Self {
        Self {
            announce_on_boot,
            ..self
        }
    }

    pub const fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.power.calibration = calibration;
        self
    }

    /// Checks the configuration for values the device cannot act on.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if let Err(e) = self.code.validate() {
            return Err(e);
        }
        if self.long_window.is_empty() {
            return Err(ConfigError::EmptyWindow);
        }
        if let TriggerMode::Double { window } = self.trigger {
            if window.is_empty() {
                return Err(ConfigError::EmptyWindow);
            }
            if window.duration_ms() >= self.long_window.duration_ms() {
                return Err(ConfigError::ShortWindowTooLong);
            }
        }
        if self.power.sampling.window == 0 {
            return Err(ConfigError::EmptySampleWindow);
        }
        if self.power.sampling.max_polls == 0 {
            return Err(ConfigError::ZeroPollBound);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::single_trigger(Polarity::ActiveLow)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    InvalidFamily(char),
    InvalidGroup(u8),
    InvalidNumber(u8),
    EmptyWindow,
    ShortWindowTooLong,
    EmptySampleWindow,
    ZeroPollBound,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFamily(c) => write!(f, "switch family {c:?} is outside 'a'..='p'"),
            Self::InvalidGroup(g) => write!(f, "switch group {g} is outside 1..=4"),
            Self::InvalidNumber(n) => write!(f, "switch number {n} is outside 1..=4"),
            Self::EmptyWindow => write!(f, "timer window has a zero period or tick count"),
            Self::ShortWindowTooLong => {
                write!(f, "double-trigger window is not shorter than the sampling window")
            }
            Self::EmptySampleWindow => write!(f, "battery averaging window is empty"),
            Self::ZeroPollBound => write!(f, "conversion poll bound is zero"),
        }
    }
}
