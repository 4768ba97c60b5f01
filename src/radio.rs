//! 433 MHz OOK remote-switch encoder.
//!
//! Encodes "type C" (Intertechno-style) switch codes and bit-bangs them on
//! a transmitter data pin.
//!
//! # Code word
//!
//! Twelve tri-state symbols:
//!
//! ```text
//! | family (4) | number-1 (2) | group-1 (2) | 0 F F | on: F / off: 0 |
//! ```
//!
//! Each address field is sent least significant bit first, `F` for a set
//! bit and `0` for a clear one.
//!
//! # Line coding
//!
//! All timings are multiples of a 350 µs base pulse:
//!
//! | Bit  | High | Low |
//! |------|------|-----|
//! | 0    | 1    | 3   |
//! | 1    | 3    | 1   |
//! | sync | 1    | 31  |
//!
//! A tri-state `0` is sent as bits `00`, `F` as `01` and `1` as `11`. Every
//! frame ends with a sync pulse and is repeated ten times.

use core::convert::Infallible;

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::OutputPin;

use crate::config::SwitchCode;
use crate::ports::RadioTransmitter;

pub const PULSE_US: u32 = 350;
pub const REPEATS: u8 = 10;
pub const CODE_WORD_LEN: usize = 12;

const ZERO: (u32, u32) = (1, 3);
const ONE: (u32, u32) = (3, 1);
const SYNC: (u32, u32) = (1, 31);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriState {
    Zero,
    One,
    Float,
}

impl TriState {
    const fn from_bit(set: bool) -> Self {
        if set { TriState::Float } else { TriState::Zero }
    }

    const fn bits(self) -> [(u32, u32); 2] {
        match self {
            TriState::Zero => [ZERO, ZERO],
            TriState::Float => [ZERO, ONE],
            TriState::One => [ONE, ONE],
        }
    }

    pub const fn as_char(self) -> char {
        match self {
            TriState::Zero => '0',
            TriState::One => '1',
            TriState::Float => 'F',
        }
    }
}

/// Builds the code word switching `code` on or off.
///
/// `code` is expected to have passed configuration validation.
pub fn code_word(code: &SwitchCode, on: bool) -> [TriState; CODE_WORD_LEN] {
    let family = code.family_index();
    let number = code.number.wrapping_sub(1);
    let group = code.group.wrapping_sub(1);

    [
        TriState::from_bit(family & 1 != 0),
        TriState::from_bit(family & 2 != 0),
        TriState::from_bit(family & 4 != 0),
        TriState::from_bit(family & 8 != 0),
        TriState::from_bit(number & 1 != 0),
        TriState::from_bit(number & 2 != 0),
        TriState::from_bit(group & 1 != 0),
        TriState::from_bit(group & 2 != 0),
        TriState::Zero,
        TriState::Float,
        TriState::Float,
        TriState::from_bit(on),
    ]
}

/// Transmitter driven by a data pin and a blocking microsecond delay.
///
/// The pin must be infallible: a failed edge would corrupt the frame with
/// no way to report it.
pub struct OokTransmitter<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> OokTransmitter<P, D>
where
    P: OutputPin<Error = Infallible>,
    D: DelayUs<u32>,
{
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    /// Sends a code word `REPEATS` times and leaves the pin low.
    pub fn send(&mut self, word: &[TriState; CODE_WORD_LEN]) {
        for _ in 0..REPEATS {
            for symbol in word {
                for (high, low) in symbol.bits() {
                    self.pulse(high, low);
                }
            }
            self.pulse(SYNC.0, SYNC.1);
        }
        let Ok(()) = self.pin.set_low();
    }

    fn pulse(&mut self, high: u32, low: u32) {
        let Ok(()) = self.pin.set_high();
        self.delay.delay_us(high * PULSE_US);
        let Ok(()) = self.pin.set_low();
        self.delay.delay_us(low * PULSE_US);
    }
}

impl<P, D> RadioTransmitter for OokTransmitter<P, D>
where
    P: OutputPin<Error = Infallible>,
    D: DelayUs<u32>,
{
    fn emit_on(&mut self, code: &SwitchCode) {
        self.send(&code_word(code, true));
    }

    fn emit_off(&mut self, code: &SwitchCode) {
        self.send(&code_word(code, false));
    }
}
