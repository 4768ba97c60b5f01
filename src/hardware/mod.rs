//! Hardware abstraction and peripheral initialization.
//!
//! This module defines the pin mappings and the board implementations of
//! the controller's ports.
//!
//! # Pin Assignments
//!
//! ## Sensor
//! - **PA0**: SENSE - Sensor output, EXTI line 0. Pulled up for active-low
//!   sensors, pulled down for active-high ones.
//!
//! ## Radio
//! - **PA8**: RF_DATA - Data input of the 433 MHz OOK transmitter
//!
//! ## Status
//! - **PB3**: LED - Status LED, driven only while blinking
//!
//! ## Low Power & RTC
//! - **PC14**: OSC32_IN - 32.768 kHz crystal input
//! - **PC15**: OSC32_OUT - 32.768 kHz crystal output
//!
//! ## Debug (SWD)
//! - **PA13**: SWDIO
//! - **PA14**: SWCLK
//!
//! # Interrupts
//!
//! Two handlers feed the foreground loop. Both raise a one-shot in
//! [`WAKE_FLAGS`] and signal [`WAKE_SIGNAL`]:
//!
//! - `RTC` (EXTI line 20) - wake-up timer, see [`rtc`]
//! - `EXTI0_1` (EXTI line 0) - sensor line, see [`sensor`]

pub mod adc;
pub mod led;
pub mod rtc;
pub mod sensor;

use embassy_stm32::gpio::{Flex, Level, Output, Pull, Speed};
use embassy_stm32::pac;
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
use embassy_time::Delay;
use remote_trigger::{Diagnostics, OokTransmitter, Polarity, WakeFlags};

use adc::VrefintAdc;
use led::LedIndicator;
use rtc::RtcWakeTimer;
use sensor::SensorLine;

/// EXTI register index for lines 0-31.
const EXTI_REG_IDX: usize = 0;

/// One-shot flags raised by the interrupt handlers.
pub static WAKE_FLAGS: WakeFlags = WakeFlags::new();

/// Wakes the foreground loop after a handler raised a flag.
pub static WAKE_SIGNAL: Signal<CriticalSectionRawMutex, ()> = Signal::new();

pub type Radio = OokTransmitter<Output<'static>, Delay>;

/// Top-level peripheral container for the trigger.
pub struct Peripherals {
    pub adc: VrefintAdc,
    pub timer: RtcWakeTimer,
    pub sensor: SensorLine,
    pub radio: Radio,
    pub led: LedIndicator,
}

impl Peripherals {
    /// Initializes all peripherals from STM32 peripheral singleton.
    ///
    /// # Initial GPIO States
    ///
    /// - PA0 (SENSE): input, pulled towards the idle level
    /// - PA8 (RF_DATA): Low (transmitter silent)
    /// - PB3 (LED): analog, off
    pub fn new(p: embassy_stm32::Peripherals, polarity: Polarity) -> Self {
        let pull = match polarity {
            Polarity::ActiveLow => Pull::Up,
            Polarity::ActiveHigh => Pull::Down,
        };

        let mut led = Flex::new(p.PB3);
        led.set_as_analog();

        Self {
            adc: VrefintAdc::new(p.ADC1),
            timer: RtcWakeTimer::new(p.RTC),
            sensor: SensorLine::new(p.PA0, pull),
            radio: OokTransmitter::new(Output::new(p.PA8, Level::Low, Speed::Low), Delay),
            led: LedIndicator::new(led),
        }
    }
}

/// Forwards trace lines to the defmt logger.
pub struct DefmtDiagnostics;

impl Diagnostics for DefmtDiagnostics {
    fn log_line(&mut self, line: &str) {
        defmt::info!("{=str}", line);
    }
}

/// Lets the executor's idle `WFE` enter STOP mode with the low-power
/// regulator. The RTC and EXTI keep running and wake the core.
pub fn enable_stop_mode() {
    pac::RCC.apb1enr().modify(|w| w.set_pwren(true));
    pac::PWR.cr().modify(|w| {
        w.set_pdds(pac::pwr::vals::Pdds::STOP_MODE);
        w.set_lpsdsr(pac::pwr::vals::Mode::LOW_POWER_MODE);
        w.set_ulp(true);
    });

    // SAFETY: only SCR.SLEEPDEEP is touched, nothing else owns the SCB.
    let mut core = unsafe { cortex_m::Peripherals::steal() };
    core.SCB.set_sleepdeep();
}

/// Catch-all for interrupts nobody claimed.
///
/// Blinks the status LED through raw register writes, since the LED may be
/// borrowed by the interrupted code, then returns.
#[cortex_m_rt::exception]
unsafe fn DefaultHandler(_irqn: i16) {
    use pac::gpio::vals::Moder;

    const LED_PIN: usize = 3;
    // ~100 ms at 2.097 MHz
    const HALF_PERIOD_CYCLES: u32 = 209_700;

    let gpio = pac::GPIOB;
    let mode = gpio.moder().read().moder(LED_PIN);
    gpio.moder().modify(|w| w.set_moder(LED_PIN, Moder::OUTPUT));

    for _ in 0..remote_trigger::ports::FAULT_BLINKS {
        gpio.bsrr().write(|w| w.set_bs(LED_PIN, true));
        cortex_m::asm::delay(HALF_PERIOD_CYCLES);
        gpio.bsrr().write(|w| w.set_br(LED_PIN, true));
        cortex_m::asm::delay(HALF_PERIOD_CYCLES);
    }

    gpio.moder().modify(|w| w.set_moder(LED_PIN, mode));
}
