//! Status LED on PB3.

use embassy_stm32::gpio::{Flex, Speed};
use embassy_time::{Delay, Duration};
use embedded_hal::blocking::delay::DelayMs;
use remote_trigger::Indicator;

const BLINK_HALF_PERIOD: Duration = Duration::from_millis(100);
const LOW_BATTERY_FLASH: Duration = Duration::from_millis(10);

/// Status LED. The pin is an output only while it is flashing and sits in
/// analog mode otherwise.
pub struct LedIndicator {
    pin: Flex<'static>,
    delay: Delay,
}

impl LedIndicator {
    pub fn new(pin: Flex<'static>) -> Self {
        Self { pin, delay: Delay }
    }

    fn flash(&mut self, on: Duration, off: Duration) {
        self.pin.set_high();
        self.delay.delay_ms(on.as_millis() as u32);
        self.pin.set_low();
        self.delay.delay_ms(off.as_millis() as u32);
    }
}

impl Indicator for LedIndicator {
    fn blink(&mut self, count: u8) {
        self.pin.set_low();
        self.pin.set_as_output(Speed::Low);
        for _ in 0..count {
            self.flash(BLINK_HALF_PERIOD, BLINK_HALF_PERIOD);
        }
        self.pin.set_as_analog();
    }

    fn low_battery_pulse(&mut self) {
        self.pin.set_low();
        self.pin.set_as_output(Speed::Low);
        self.flash(LOW_BATTERY_FLASH, Duration::from_ticks(0));
        self.pin.set_as_analog();
    }
}
