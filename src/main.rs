//! Firmware for a battery-powered, event-triggered 433 MHz remote.
//!
//! # Overview
//!
//! The device sleeps until a sensor asserts its output line, then sends a
//! fixed remote-switch code to a 433 MHz mains socket. In double-trigger
//! builds two assertions close together send the off code, a lone one
//! sends the on code once the confirmation window has passed.
//!
//! # Hardware
//!
//! - **MCU**: STM32L031G6U6 (Cortex-M0+, ultra-low-power)
//! - **Radio**: 433 MHz OOK transmitter module on PA8
//! - **Sensor**: open-drain or push-pull output on PA0
//! - **LED**: status LED on PB3
//! - **RTC**: 32.768 kHz crystal for the wake-up timer in STOP mode
//!
//! # Low Power Operation
//!
//! - MSI oscillator at 2.097 MHz, enough for the 350 µs OOK pulses
//! - The executor idles in STOP mode with the low-power regulator
//! - The RTC wake-up timer wakes the MCU every 8 seconds, or every 250 ms
//!   while a double trigger is pending
//! - The sensor line wakes the MCU through EXTI line 0
//! - The supply is measured through VREFINT once an hour
//!
//! # Module Organization
//!
//! - [`hardware`] - Pin mappings, interrupt handlers and port implementations

#![no_std]
#![no_main]

mod hardware;

use embassy_executor::Spawner;
use embassy_stm32::rcc::{LsConfig, LseConfig, mux::ClockMux};
use embassy_stm32::time::Hertz;
use remote_trigger::power::Calibration;
use remote_trigger::{Config, TriggerController};
use {defmt_rtt as _, panic_probe as _};

use hardware::adc::VrefintAdc;
use hardware::{DefmtDiagnostics, Peripherals, WAKE_FLAGS};

/// The device variant this firmware is built for.
#[cfg(not(feature = "double-trigger"))]
pub const DEVICE: Config = Config::single_trigger(remote_trigger::Polarity::ActiveLow);
#[cfg(feature = "double-trigger")]
pub const DEVICE: Config =
    Config::double_trigger(remote_trigger::Polarity::ActiveHigh).with_announce_on_boot(true);

const _: () = assert!(DEVICE.validate().is_ok());

/// Creates a low-power clock configuration for STM32L031.
///
/// # Clock Settings
///
/// - **MSI**: 2.097 MHz
/// - **System clock**: MSI (no PLL)
/// - **LSE**: 32.768 kHz external crystal for RTC
/// - **Voltage scale**: Range 1
fn create_low_power_config() -> embassy_stm32::rcc::Config {
    embassy_stm32::rcc::Config {
        msi: Some(embassy_stm32::rcc::MSIRange::RANGE2M),
        hsi: false,
        hse: None,
        pll: None,
        sys: embassy_stm32::rcc::Sysclk::MSI,
        ahb_pre: embassy_stm32::rcc::AHBPrescaler::DIV1,
        apb1_pre: embassy_stm32::rcc::APBPrescaler::DIV1,
        apb2_pre: embassy_stm32::rcc::APBPrescaler::DIV1,
        ls: LsConfig {
            rtc: embassy_stm32::rcc::RtcClockSource::LSE,
            lsi: false,
            lse: Some(LseConfig {
                frequency: Hertz::hz(32768),
                mode: embassy_stm32::rcc::LseMode::Oscillator(embassy_stm32::rcc::LseDrive::Low),
            }),
        },
        voltage_scale: embassy_stm32::rcc::VoltageScale::RANGE1,
        mux: ClockMux::default(),
    }
}

/// Main entry point.
///
/// # Initialization Sequence
///
/// 1. Configure clocks (2.097 MHz MSI, LSE for the RTC)
/// 2. Initialize STM32 peripherals and the board ports
/// 3. Build the controller with the factory VREFINT calibration
/// 4. Announce, sample the battery and arm both wake sources
/// 5. Enable STOP mode and hand over to the wake loop
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let mut config = embassy_stm32::Config::default();
    config.rcc = create_low_power_config();

    let p = embassy_stm32::init(config);

    // Give a debug probe time to attach before the core stops.
    #[cfg(feature = "debug-mode")]
    {
        defmt::info!("Waiting 3 seconds for debugger connection...");
        embassy_time::Timer::after_secs(3).await;
    }

    let device = DEVICE.with_calibration(Calibration::vrefint_factory(VrefintAdc::vrefint_cal()));
    let peripherals = Peripherals::new(p, device.polarity);

    let controller = TriggerController::new(
        device,
        &WAKE_FLAGS,
        peripherals.adc,
        peripherals.timer,
        peripherals.sensor,
        peripherals.radio,
        DefmtDiagnostics,
        peripherals.led,
    );
    let mut controller = match controller {
        Ok(controller) => controller,
        Err(e) => defmt::panic!("invalid device configuration: {}", e),
    };

    controller.start();

    #[cfg(not(feature = "debug-mode"))]
    hardware::enable_stop_mode();

    controller.run().await;
}
